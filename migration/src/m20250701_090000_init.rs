use sea_orm_migration::{prelude::{extension::postgres::TypeDropStatement, *}, sea_orm::{ActiveEnum, DbBackend, DeriveActiveEnum, EnumIter, Schema}};

use crate::{owned_by, setup_staff_table_fk, util::{default_staff_table_statement, default_table_statement, id_table_statement}};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(DbBackend::Postgres);

        manager.create_type(schema.create_enum_from_active_enum::<RoleType>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<SubjectType>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<AttendanceStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<ShiftCategory>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<PayrollStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<ChildPaymentStatus>()).await?;

        manager
            .create_table(default_table_statement()
                .table(Staff::Table)
                .col(ColumnDef::new(Staff::Username)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(Staff::Password)
                    .binary()
                    .not_null()) // SHA-256 of `{password}:{username}`
                .col(ColumnDef::new(Staff::DisplayName)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Staff::Role)
                    .custom(RoleType::name())
                    .not_null())
                .col(ColumnDef::new(Staff::Salary)
                    .big_integer()) // Missing salary accrues nothing
                .col(ColumnDef::new(Staff::Active)
                    .boolean()
                    .not_null()
                    .default(true))
                .take()
            ).await?;

        manager
            .create_table(id_table_statement()
                .table(Fine::Table)
                .col(ColumnDef::new(Fine::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null())
                .col(ColumnDef::new(Fine::StaffId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Fine::Amount)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(Fine::Reason)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Fine::Category)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Fine::Date)
                    .date()
                    .not_null())
                .col(ColumnDef::new(Fine::Approver)
                    .uuid())
                .col(ColumnDef::new(Fine::Approved)
                    .boolean()
                    .not_null()
                    .default(false))
                .take()
            ).await?;
        owned_by!(manager, Fine::Table, Fine::StaffId, Staff::Table);

        manager
            .create_table(id_table_statement()
                .table(ShiftSchedule::Table)
                .col(ColumnDef::new(ShiftSchedule::StaffId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(ShiftSchedule::Date)
                    .date()
                    .not_null())
                .col(ColumnDef::new(ShiftSchedule::StartTime)
                    .time()
                    .not_null())
                .col(ColumnDef::new(ShiftSchedule::EndTime)
                    .time()
                    .not_null())
                .col(ColumnDef::new(ShiftSchedule::Category)
                    .custom(ShiftCategory::name())
                    .not_null())
                .take()
            ).await?;
        owned_by!(manager, ShiftSchedule::Table, ShiftSchedule::StaffId, Staff::Table);

        manager
            .create_index(Index::create()
                .name("shift_schedule_staff_date_key")
                .table(ShiftSchedule::Table)
                .col(ShiftSchedule::StaffId)
                .col(ShiftSchedule::Date)
                .unique()
                .take()
            ).await?;

        manager
            .create_table(default_staff_table_statement()
                .table(AttendanceRecord::Table)
                .col(ColumnDef::new(AttendanceRecord::SubjectType)
                    .custom(SubjectType::name())
                    .not_null())
                .col(ColumnDef::new(AttendanceRecord::SubjectId)
                    .uuid()
                    .not_null()) // Staff or child, depending on `subject_type`
                .col(ColumnDef::new(AttendanceRecord::Date)
                    .date()
                    .not_null())
                .col(ColumnDef::new(AttendanceRecord::ScheduledStart)
                    .time()
                    .not_null())
                .col(ColumnDef::new(AttendanceRecord::ScheduledEnd)
                    .time()
                    .not_null())
                .col(ColumnDef::new(AttendanceRecord::ActualStart)
                    .time())
                .col(ColumnDef::new(AttendanceRecord::ActualEnd)
                    .time())
                .col(ColumnDef::new(AttendanceRecord::BreakMinutes)
                    .integer()
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(AttendanceRecord::Status)
                    .custom(AttendanceStatus::name())
                    .not_null())
                .col(ColumnDef::new(AttendanceRecord::Late)
                    .boolean()
                    .not_null()
                    .default(false))
                .col(ColumnDef::new(AttendanceRecord::LateMinutes)
                    .integer()
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(AttendanceRecord::EarlyLeaveMinutes)
                    .integer()
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(AttendanceRecord::OvertimeMinutes)
                    .integer()
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(AttendanceRecord::ClockInLatitude)
                    .double())
                .col(ColumnDef::new(AttendanceRecord::ClockInLongitude)
                    .double())
                .col(ColumnDef::new(AttendanceRecord::ClockOutLatitude)
                    .double())
                .col(ColumnDef::new(AttendanceRecord::ClockOutLongitude)
                    .double())
                .col(ColumnDef::new(AttendanceRecord::Notes)
                    .text())
                .check(Expr::col(AttendanceRecord::LateMinutes).gte(0)
                    .and(Expr::col(AttendanceRecord::EarlyLeaveMinutes).gte(0))
                    .and(Expr::col(AttendanceRecord::OvertimeMinutes).gte(0)))
                .take()
            ).await?;
        setup_staff_table_fk!(manager, AttendanceRecord::Table);

        // At most one record per subject and day; concurrent first clock-ins race on this
        manager
            .create_index(Index::create()
                .name("attendance_record_subject_date_key")
                .table(AttendanceRecord::Table)
                .col(AttendanceRecord::SubjectType)
                .col(AttendanceRecord::SubjectId)
                .col(AttendanceRecord::Date)
                .unique()
                .take()
            ).await?;

        manager
            .create_table(default_staff_table_statement()
                .table(Payroll::Table)
                .col(ColumnDef::new(Payroll::StaffId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Payroll::Month)
                    .text()
                    .not_null()) // `YYYY-MM`
                .col(ColumnDef::new(Payroll::Accrual)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(Payroll::Bonuses)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(Payroll::Penalties)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(Payroll::Total)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(Payroll::Status)
                    .custom(PayrollStatus::name())
                    .not_null())
                .take()
            ).await?;
        setup_staff_table_fk!(manager, Payroll::Table);
        owned_by!(manager, Payroll::Table, Payroll::StaffId, Staff::Table);

        manager
            .create_index(Index::create()
                .name("payroll_staff_month_key")
                .table(Payroll::Table)
                .col(Payroll::StaffId)
                .col(Payroll::Month)
                .unique()
                .take()
            ).await?;

        manager
            .create_table(id_table_statement()
                .table(PayrollHistory::Table)
                .col(ColumnDef::new(PayrollHistory::PayrollId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(PayrollHistory::Timestamp)
                    .timestamp_with_time_zone()
                    .not_null())
                .col(ColumnDef::new(PayrollHistory::Action)
                    .text()
                    .not_null())
                .col(ColumnDef::new(PayrollHistory::Amount)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(PayrollHistory::Comment)
                    .text())
                .col(ColumnDef::new(PayrollHistory::ActorId)
                    .uuid())
                .take()
            ).await?;
        owned_by!(manager, PayrollHistory::Table, PayrollHistory::PayrollId, Payroll::Table);

        manager
            .create_table(default_table_statement()
                .table(Child::Table)
                .col(ColumnDef::new(Child::FullName)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Child::Active)
                    .boolean()
                    .not_null()
                    .default(true))
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(ChildPayment::Table)
                .col(ColumnDef::new(ChildPayment::ChildId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(ChildPayment::Month)
                    .text()
                    .not_null())
                .col(ColumnDef::new(ChildPayment::PeriodStart)
                    .date()
                    .not_null())
                .col(ColumnDef::new(ChildPayment::PeriodEnd)
                    .date()
                    .not_null())
                .col(ColumnDef::new(ChildPayment::Amount)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(ChildPayment::Total)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(ChildPayment::Status)
                    .custom(ChildPaymentStatus::name())
                    .not_null())
                .col(ColumnDef::new(ChildPayment::Comments)
                    .text())
                .take()
            ).await?;
        owned_by!(manager, ChildPayment::Table, ChildPayment::ChildId, Child::Table);

        manager
            .create_index(Index::create()
                .name("child_payment_child_month_key")
                .table(ChildPayment::Table)
                .col(ChildPayment::ChildId)
                .col(ChildPayment::Month)
                .unique()
                .take()
            ).await?;

        manager
            .create_table(TableCreateStatement::new()
                .if_not_exists()
                .table(Setting::Table)
                .col(ColumnDef::new(Setting::Key)
                    .text()
                    .primary_key())
                .col(ColumnDef::new(Setting::Value)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Setting::UpdatedAt)
                    .timestamp_with_time_zone()
                    .not_null())
                .take()
            ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let tables = [
            Setting::Table.into_iden(),
            ChildPayment::Table.into_iden(),
            Child::Table.into_iden(),
            PayrollHistory::Table.into_iden(),
            Payroll::Table.into_iden(),
            AttendanceRecord::Table.into_iden(),
            ShiftSchedule::Table.into_iden(),
            Fine::Table.into_iden(),
            Staff::Table.into_iden(),
        ];

        for table in tables {
            manager
                .drop_table(
                    TableDropStatement::new()
                        .table(table)
                        .take()
                ).await?;
        }

        let types = [
            ChildPaymentStatus::name(),
            PayrollStatus::name(),
            ShiftCategory::name(),
            AttendanceStatus::name(),
            SubjectType::name(),
            RoleType::name(),
        ];

        for name in types {
            manager
                .drop_type(
                    TypeDropStatement::new()
                        .name(name)
                        .to_owned()
                ).await?;
        }

        Ok(())
    }
}

#[derive(Iden)]
pub(crate) enum Staff {
    Table,
    Username,
    Password,
    DisplayName,
    Role,
    Salary,
    Active,
}

#[derive(Iden)]
enum Fine {
    Table,
    CreatedAt,
    StaffId,
    Amount,
    Reason,
    Category,
    Date,
    Approver,
    Approved,
}

#[derive(Iden)]
enum ShiftSchedule {
    Table,
    StaffId,
    Date,
    StartTime,
    EndTime,
    Category,
}

#[derive(Iden)]
enum AttendanceRecord {
    Table,
    SubjectType,
    SubjectId,
    Date,
    ScheduledStart,
    ScheduledEnd,
    ActualStart,
    ActualEnd,
    BreakMinutes,
    Status,
    Late,
    LateMinutes,
    EarlyLeaveMinutes,
    OvertimeMinutes,
    ClockInLatitude,
    ClockInLongitude,
    ClockOutLatitude,
    ClockOutLongitude,
    Notes,
}

#[derive(Iden)]
enum Payroll {
    Table,
    StaffId,
    Month,
    Accrual,
    Bonuses,
    Penalties,
    Total,
    Status,
}

#[derive(Iden)]
enum PayrollHistory {
    Table,
    PayrollId,
    Timestamp,
    Action,
    Amount,
    Comment,
    ActorId,
}

#[derive(Iden)]
pub(crate) enum Child {
    Table,
    FullName,
    Active,
}

#[derive(Iden)]
enum ChildPayment {
    Table,
    ChildId,
    Month,
    PeriodStart,
    PeriodEnd,
    Amount,
    Total,
    Status,
    Comments,
}

#[derive(Iden)]
pub(crate) enum Setting {
    Table,
    Key,
    Value,
    UpdatedAt,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "role_type")]
enum RoleType {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "staff")]
    Staff,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "subject_type")]
enum SubjectType {
    #[sea_orm(string_value = "staff")]
    Staff,
    #[sea_orm(string_value = "child")]
    Child,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status")]
enum AttendanceStatus {
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "no_show")]
    NoShow,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "shift_category")]
enum ShiftCategory {
    #[sea_orm(string_value = "morning")]
    Morning,
    #[sea_orm(string_value = "evening")]
    Evening,
    #[sea_orm(string_value = "night")]
    Night,
    #[sea_orm(string_value = "full")]
    Full,
    #[sea_orm(string_value = "overtime")]
    Overtime,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payroll_status")]
enum PayrollStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "paid")]
    Paid,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "child_payment_status")]
enum ChildPaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
}
