use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait as _, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel as _, QueryFilter, QueryOrder, TransactionTrait as _};
use uuid::Uuid;

use crate::{entity::{attendance_record, child, child_payment, fine, payroll, payroll_history, prelude::*, sea_orm_active_enums::{AttendanceStatus, ChildPaymentStatus, PayrollStatus, SubjectType}, setting, shift_schedule, staff}, utils::Month};

use super::{Store, StoreError, StoreResult};

/// [`Store`] backed by the service's database connection
pub struct DbStore<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DbStore<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }
}

impl Store for DbStore<'_> {
    async fn find_staff(&self, id: Uuid) -> StoreResult<Option<staff::Model>> {
        Ok(Staff::find_by_id(id).one(self.db).await?)
    }

    async fn active_staff(&self) -> StoreResult<Vec<staff::Model>> {
        Ok(Staff::find()
            .filter(staff::Column::Active.eq(true))
            .order_by_asc(staff::Column::Username)
            .all(self.db).await?)
    }

    async fn fines_between(&self, staff_id: Uuid, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<fine::Model>> {
        Ok(Fine::find()
            .filter(fine::Column::StaffId.eq(staff_id))
            .filter(fine::Column::Date.between(from, to))
            .order_by_asc(fine::Column::Date)
            .all(self.db).await?)
    }

    async fn find_shift(&self, id: Uuid) -> StoreResult<Option<shift_schedule::Model>> {
        Ok(ShiftSchedule::find_by_id(id).one(self.db).await?)
    }

    async fn find_shift_for(&self, staff_id: Uuid, date: NaiveDate) -> StoreResult<Option<shift_schedule::Model>> {
        Ok(ShiftSchedule::find()
            .filter(shift_schedule::Column::StaffId.eq(staff_id))
            .filter(shift_schedule::Column::Date.eq(date))
            .order_by_asc(shift_schedule::Column::StartTime)
            .one(self.db).await?)
    }

    async fn shifts_on(&self, date: NaiveDate) -> StoreResult<Vec<shift_schedule::Model>> {
        Ok(ShiftSchedule::find()
            .filter(shift_schedule::Column::Date.eq(date))
            .all(self.db).await?)
    }

    async fn find_attendance(&self, id: Uuid) -> StoreResult<Option<attendance_record::Model>> {
        Ok(AttendanceRecord::find_by_id(id).one(self.db).await?)
    }

    async fn find_attendance_for(&self, subject_type: SubjectType, subject_id: Uuid, date: NaiveDate) -> StoreResult<Option<attendance_record::Model>> {
        Ok(AttendanceRecord::find()
            .filter(attendance_record::Column::SubjectType.eq(subject_type))
            .filter(attendance_record::Column::SubjectId.eq(subject_id))
            .filter(attendance_record::Column::Date.eq(date))
            .one(self.db).await?)
    }

    async fn attendance_between(&self, subject_type: SubjectType, subject_id: Uuid, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<attendance_record::Model>> {
        Ok(AttendanceRecord::find()
            .filter(attendance_record::Column::SubjectType.eq(subject_type))
            .filter(attendance_record::Column::SubjectId.eq(subject_id))
            .filter(attendance_record::Column::Date.between(from, to))
            .order_by_asc(attendance_record::Column::Date)
            .all(self.db).await?)
    }

    async fn attendance_on(&self, date: NaiveDate) -> StoreResult<Vec<attendance_record::Model>> {
        Ok(AttendanceRecord::find()
            .filter(attendance_record::Column::Date.eq(date))
            .all(self.db).await?)
    }

    async fn insert_attendance(&self, record: attendance_record::Model) -> StoreResult<attendance_record::Model> {
        Ok(AttendanceRecord::insert(record.into_active_model().reset_all())
            .exec_with_returning(self.db).await?)
    }

    async fn update_attendance(&self, record: attendance_record::Model, expected: AttendanceStatus) -> StoreResult<attendance_record::Model> {
        let res = AttendanceRecord::update_many()
            .set(record.clone().into_active_model().reset_all())
            .filter(attendance_record::Column::Id.eq(record.id))
            .filter(attendance_record::Column::Status.eq(expected))
            .exec(self.db).await?;

        if res.rows_affected == 0 {
            return Err(StoreError::Stale);
        }

        Ok(record)
    }

    async fn find_payroll(&self, id: Uuid) -> StoreResult<Option<payroll::Model>> {
        Ok(Payroll::find_by_id(id).one(self.db).await?)
    }

    async fn find_payroll_for(&self, staff_id: Uuid, month: &Month) -> StoreResult<Option<payroll::Model>> {
        Ok(Payroll::find()
            .filter(payroll::Column::StaffId.eq(staff_id))
            .filter(payroll::Column::Month.eq(month.label()))
            .one(self.db).await?)
    }

    async fn insert_payroll(&self, payroll: payroll::Model, entry: payroll_history::Model) -> StoreResult<payroll::Model> {
        let txn = self.db.begin().await?;

        let payroll = Payroll::insert(payroll.into_active_model().reset_all())
            .exec_with_returning(&txn).await?;
        PayrollHistory::insert(entry.into_active_model().reset_all())
            .exec(&txn).await?;

        txn.commit().await?;

        Ok(payroll)
    }

    async fn update_payroll(&self, payroll: payroll::Model, expected: PayrollStatus, entry: payroll_history::Model) -> StoreResult<payroll::Model> {
        let txn = self.db.begin().await?;

        let res = Payroll::update_many()
            .set(payroll.clone().into_active_model().reset_all())
            .filter(payroll::Column::Id.eq(payroll.id))
            .filter(payroll::Column::Status.eq(expected))
            .exec(&txn).await?;

        if res.rows_affected == 0 {
            // Dropping the transaction rolls it back
            return Err(StoreError::Stale);
        }

        PayrollHistory::insert(entry.into_active_model().reset_all())
            .exec(&txn).await?;

        txn.commit().await?;

        Ok(payroll)
    }

    async fn payroll_history(&self, payroll_id: Uuid) -> StoreResult<Vec<payroll_history::Model>> {
        Ok(PayrollHistory::find()
            .filter(payroll_history::Column::PayrollId.eq(payroll_id))
            .order_by_asc(payroll_history::Column::Timestamp)
            .all(self.db).await?)
    }

    async fn find_child(&self, id: Uuid) -> StoreResult<Option<child::Model>> {
        Ok(Child::find_by_id(id).one(self.db).await?)
    }

    async fn active_children(&self) -> StoreResult<Vec<child::Model>> {
        Ok(Child::find()
            .filter(child::Column::Active.eq(true))
            .order_by_asc(child::Column::FullName)
            .all(self.db).await?)
    }

    async fn find_child_payment(&self, id: Uuid) -> StoreResult<Option<child_payment::Model>> {
        Ok(ChildPayment::find_by_id(id).one(self.db).await?)
    }

    async fn find_child_payment_for(&self, child_id: Uuid, month: &Month) -> StoreResult<Option<child_payment::Model>> {
        Ok(ChildPayment::find()
            .filter(child_payment::Column::ChildId.eq(child_id))
            .filter(child_payment::Column::Month.eq(month.label()))
            .one(self.db).await?)
    }

    async fn insert_child_payment(&self, payment: child_payment::Model) -> StoreResult<child_payment::Model> {
        Ok(ChildPayment::insert(payment.into_active_model().reset_all())
            .exec_with_returning(self.db).await?)
    }

    async fn update_child_payment(&self, payment: child_payment::Model, expected: ChildPaymentStatus) -> StoreResult<child_payment::Model> {
        let res = ChildPayment::update_many()
            .set(payment.clone().into_active_model().reset_all())
            .filter(child_payment::Column::Id.eq(payment.id))
            .filter(child_payment::Column::Status.eq(expected))
            .exec(self.db).await?;

        if res.rows_affected == 0 {
            return Err(StoreError::Stale);
        }

        Ok(payment)
    }

    async fn settings(&self) -> StoreResult<Vec<setting::Model>> {
        Ok(Setting::find().all(self.db).await?)
    }
}
