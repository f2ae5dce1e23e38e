use sea_orm_migration::prelude::*;

/// Table with only the uuid primary key
pub(crate) fn id_table_statement() -> TableCreateStatement {
    TableCreateStatement::new()
        .if_not_exists()
        .col(ColumnDef::new(DefaultColumn::Id)
            .uuid()
            .primary_key()
            .default(Expr::cust("GEN_RANDOM_UUID()"))
            .take())
        .take()
}

pub(crate) fn default_table_statement() -> TableCreateStatement {
    id_table_statement()
        .col(ColumnDef::new(DefaultColumn::CreatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .take())
        .col(ColumnDef::new(DefaultColumn::UpdatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .take())
        .take()
}

#[derive(DeriveIden)]
pub(crate) enum DefaultColumn {
    Id,
    CreatedAt,
    UpdatedAt,
}

/// Must run `setup_staff_table_fk` macro on the table afterwards
///
/// # Example
///
/// ```rs
/// manager
///     .create_table(default_staff_table_statement()
///         .table(Payroll::Table)
///         .col(ColumnDef::new(Payroll::Month)
///             .text()
///             .not_null())
///         .take()
///     ).await?;
/// setup_staff_table_fk!(manager, Payroll::Table);
/// ```
pub(crate) fn default_staff_table_statement() -> TableCreateStatement {
    default_table_statement()
        .col(ColumnDef::new(DefaultStaffColumn::CreatedBy)
            .uuid())
        .col(ColumnDef::new(DefaultStaffColumn::UpdatedBy)
            .uuid())
        .take()
}

#[macro_export]
macro_rules! setup_staff_table_fk {
    ($m:expr,$t:expr) => {{
        use crate::util::*;
        use crate::m20250701_090000_init::Staff;

        $m.create_foreign_key(ForeignKeyCreateStatement::new()
                .from($t, DefaultStaffColumn::CreatedBy)
                .to(Staff::Table, DefaultColumn::Id)
                .on_delete(ForeignKeyAction::SetNull)
                .on_update(ForeignKeyAction::Cascade)
                .take()
        ).await?;

        $m.create_foreign_key(ForeignKeyCreateStatement::new()
                .from($t, DefaultStaffColumn::UpdatedBy)
                .to(Staff::Table, DefaultColumn::Id)
                .on_delete(ForeignKeyAction::SetNull)
                .on_update(ForeignKeyAction::Cascade)
                .take()
        ).await?;
    }};
}

/// Cascading foreign key from `$t.$c` to the id of `$to`
#[macro_export]
macro_rules! owned_by {
    ($m:expr,$t:expr,$c:expr,$to:expr) => {{
        $m.create_foreign_key(ForeignKeyCreateStatement::new()
                .from($t, $c)
                .to($to, $crate::util::DefaultColumn::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::Cascade)
                .take()
        ).await?;
    }};
}

#[derive(DeriveIden)]
pub(crate) enum DefaultStaffColumn {
    CreatedBy,
    UpdatedBy,
}
