//! Persistence port used by the attendance and payroll engine.
//!
//! Every operation is individually atomic; the engine never needs multi-record transactions except
//! where a payroll row and its history entry are written together. Uniqueness of
//! `(subject, date)` attendance, `(staff, month)` payroll and `(child, month)` child payments is the
//! store's responsibility and surfaces as [`StoreError::Duplicate`].

use chrono::NaiveDate;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

use crate::{entity::{attendance_record, child, child_payment, fine, payroll, payroll_history, sea_orm_active_enums::{AttendanceStatus, ChildPaymentStatus, PayrollStatus, SubjectType}, setting, shift_schedule, staff}, utils::Month};

pub use db::DbStore;

mod db;
#[cfg(test)]
pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a record with the same key already exists")]
    Duplicate,

    #[error("record was modified concurrently")]
    Stale,

    #[error("database error")]
    Database(#[source] DbErr),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Duplicate,
            _ => StoreError::Database(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[allow(async_fn_in_trait)]
pub trait Store {
    async fn find_staff(&self, id: Uuid) -> StoreResult<Option<staff::Model>>;

    async fn active_staff(&self) -> StoreResult<Vec<staff::Model>>;

    /// Fines of a staff member dated within `from..=to`, approved or not
    async fn fines_between(&self, staff_id: Uuid, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<fine::Model>>;

    async fn find_shift(&self, id: Uuid) -> StoreResult<Option<shift_schedule::Model>>;

    async fn find_shift_for(&self, staff_id: Uuid, date: NaiveDate) -> StoreResult<Option<shift_schedule::Model>>;

    async fn shifts_on(&self, date: NaiveDate) -> StoreResult<Vec<shift_schedule::Model>>;

    async fn find_attendance(&self, id: Uuid) -> StoreResult<Option<attendance_record::Model>>;

    async fn find_attendance_for(&self, subject_type: SubjectType, subject_id: Uuid, date: NaiveDate) -> StoreResult<Option<attendance_record::Model>>;

    async fn attendance_between(&self, subject_type: SubjectType, subject_id: Uuid, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<attendance_record::Model>>;

    async fn attendance_on(&self, date: NaiveDate) -> StoreResult<Vec<attendance_record::Model>>;

    async fn insert_attendance(&self, record: attendance_record::Model) -> StoreResult<attendance_record::Model>;

    /// Replaces the record only while its stored status still equals `expected`
    async fn update_attendance(&self, record: attendance_record::Model, expected: AttendanceStatus) -> StoreResult<attendance_record::Model>;

    async fn find_payroll(&self, id: Uuid) -> StoreResult<Option<payroll::Model>>;

    async fn find_payroll_for(&self, staff_id: Uuid, month: &Month) -> StoreResult<Option<payroll::Model>>;

    async fn insert_payroll(&self, payroll: payroll::Model, entry: payroll_history::Model) -> StoreResult<payroll::Model>;

    /// Replaces the payroll only while its stored status still equals `expected`, appending `entry`
    async fn update_payroll(&self, payroll: payroll::Model, expected: PayrollStatus, entry: payroll_history::Model) -> StoreResult<payroll::Model>;

    async fn payroll_history(&self, payroll_id: Uuid) -> StoreResult<Vec<payroll_history::Model>>;

    async fn find_child(&self, id: Uuid) -> StoreResult<Option<child::Model>>;

    async fn active_children(&self) -> StoreResult<Vec<child::Model>>;

    async fn find_child_payment(&self, id: Uuid) -> StoreResult<Option<child_payment::Model>>;

    async fn find_child_payment_for(&self, child_id: Uuid, month: &Month) -> StoreResult<Option<child_payment::Model>>;

    async fn insert_child_payment(&self, payment: child_payment::Model) -> StoreResult<child_payment::Model>;

    async fn update_child_payment(&self, payment: child_payment::Model, expected: ChildPaymentStatus) -> StoreResult<child_payment::Model>;

    async fn settings(&self) -> StoreResult<Vec<setting::Model>>;
}
