//! In-memory [`Store`] for engine tests, enforcing the same uniqueness keys as the schema.

use std::{collections::HashSet, sync::Mutex};

use chrono::{Local, NaiveDate};
use sea_orm::DbErr;
use uuid::Uuid;

use crate::{entity::{attendance_record, child, child_payment, fine, payroll, payroll_history, sea_orm_active_enums::{AttendanceStatus, ChildPaymentStatus, PayrollStatus, RoleType, SubjectType}, setting, shift_schedule, staff}, utils::Month};

use super::{Store, StoreError, StoreResult};

#[derive(Default)]
struct State {
    staff: Vec<staff::Model>,
    fines: Vec<fine::Model>,
    shifts: Vec<shift_schedule::Model>,
    attendance: Vec<attendance_record::Model>,
    payrolls: Vec<payroll::Model>,
    history: Vec<payroll_history::Model>,
    children: Vec<child::Model>,
    child_payments: Vec<child_payment::Model>,
    settings: Vec<setting::Model>,
    broken_staff: HashSet<Uuid>,
    broken_settings: bool,
    lost_race: Option<Race>,
}

/// How the next write loses to a concurrent writer
#[derive(Debug, Clone, Copy)]
pub enum Race {
    Duplicate,
    Stale,
}

impl State {
    fn raced(&mut self) -> StoreResult<()> {
        match self.lost_race.take() {
            Some(Race::Duplicate) => Err(StoreError::Duplicate),
            Some(Race::Stale) => Err(StoreError::Stale),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

fn broken() -> StoreError {
    StoreError::Database(DbErr::Custom("storage unavailable".to_owned()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn add_staff(&self, username: &str, salary: Option<i64>) -> staff::Model {
        let member = staff::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            username: username.to_owned(),
            password: Vec::new(),
            display_name: username.to_owned(),
            role: RoleType::Staff,
            salary,
            active: true,
        };

        self.with(|s| s.staff.push(member.clone()));
        member
    }

    pub fn deactivate_staff(&self, id: Uuid) {
        self.with(|s| s.staff.iter_mut().filter(|m| m.id == id).for_each(|m| m.active = false));
    }

    pub fn add_fine(&self, staff_id: Uuid, amount: i64, date: NaiveDate, approved: bool) -> fine::Model {
        let fine = fine::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            staff_id,
            amount,
            reason: "late report".to_owned(),
            category: "discipline".to_owned(),
            date,
            approver: approved.then(Uuid::new_v4),
            approved,
        };

        self.with(|s| s.fines.push(fine.clone()));
        fine
    }

    pub fn add_shift(&self, shift: shift_schedule::Model) {
        self.with(|s| s.shifts.push(shift));
    }

    pub fn add_child(&self, full_name: &str) -> child::Model {
        let child = child::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            full_name: full_name.to_owned(),
            active: true,
        };

        self.with(|s| s.children.push(child.clone()));
        child
    }

    pub fn put_setting(&self, key: &str, value: &str) {
        self.with(|s| {
            s.settings.retain(|row| row.key != key);
            s.settings.push(setting::Model {
                key: key.to_owned(),
                value: value.to_owned(),
                updated_at: Local::now().into(),
            });
        });
    }

    /// Makes every query scoped to this staff member fail
    pub fn break_staff(&self, id: Uuid) {
        self.with(|s| s.broken_staff.insert(id));
    }

    pub fn break_settings(&self) {
        self.with(|s| s.broken_settings = true);
    }

    /// Makes the next attendance, payroll or child payment write fail as if another writer got there first
    pub fn lose_next_write(&self, race: Race) {
        self.with(|s| s.lost_race = Some(race));
    }

    pub fn attendance(&self) -> Vec<attendance_record::Model> {
        self.with(|s| s.attendance.clone())
    }

    pub fn payrolls(&self) -> Vec<payroll::Model> {
        self.with(|s| s.payrolls.clone())
    }

    pub fn child_payments(&self) -> Vec<child_payment::Model> {
        self.with(|s| s.child_payments.clone())
    }
}

impl Store for MemoryStore {
    async fn find_staff(&self, id: Uuid) -> StoreResult<Option<staff::Model>> {
        self.with(|s| Ok(s.staff.iter().find(|m| m.id == id).cloned()))
    }

    async fn active_staff(&self) -> StoreResult<Vec<staff::Model>> {
        self.with(|s| Ok(s.staff.iter().filter(|m| m.active).cloned().collect()))
    }

    async fn fines_between(&self, staff_id: Uuid, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<fine::Model>> {
        self.with(|s| {
            if s.broken_staff.contains(&staff_id) {
                return Err(broken());
            }

            Ok(s.fines.iter()
                .filter(|f| f.staff_id == staff_id && f.date >= from && f.date <= to)
                .cloned()
                .collect())
        })
    }

    async fn find_shift(&self, id: Uuid) -> StoreResult<Option<shift_schedule::Model>> {
        self.with(|s| Ok(s.shifts.iter().find(|shift| shift.id == id).cloned()))
    }

    async fn find_shift_for(&self, staff_id: Uuid, date: NaiveDate) -> StoreResult<Option<shift_schedule::Model>> {
        self.with(|s| Ok(s.shifts.iter().find(|shift| shift.staff_id == staff_id && shift.date == date).cloned()))
    }

    async fn shifts_on(&self, date: NaiveDate) -> StoreResult<Vec<shift_schedule::Model>> {
        self.with(|s| Ok(s.shifts.iter().filter(|shift| shift.date == date).cloned().collect()))
    }

    async fn find_attendance(&self, id: Uuid) -> StoreResult<Option<attendance_record::Model>> {
        self.with(|s| Ok(s.attendance.iter().find(|r| r.id == id).cloned()))
    }

    async fn find_attendance_for(&self, subject_type: SubjectType, subject_id: Uuid, date: NaiveDate) -> StoreResult<Option<attendance_record::Model>> {
        self.with(|s| Ok(s.attendance.iter()
            .find(|r| r.subject_type == subject_type && r.subject_id == subject_id && r.date == date)
            .cloned()))
    }

    async fn attendance_between(&self, subject_type: SubjectType, subject_id: Uuid, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<attendance_record::Model>> {
        self.with(|s| {
            if s.broken_staff.contains(&subject_id) {
                return Err(broken());
            }

            Ok(s.attendance.iter()
                .filter(|r| r.subject_type == subject_type && r.subject_id == subject_id && r.date >= from && r.date <= to)
                .cloned()
                .collect())
        })
    }

    async fn attendance_on(&self, date: NaiveDate) -> StoreResult<Vec<attendance_record::Model>> {
        self.with(|s| Ok(s.attendance.iter().filter(|r| r.date == date).cloned().collect()))
    }

    async fn insert_attendance(&self, record: attendance_record::Model) -> StoreResult<attendance_record::Model> {
        self.with(|s| {
            s.raced()?;
            let taken = s.attendance.iter().any(|r| {
                r.id == record.id
                    || (r.subject_type == record.subject_type && r.subject_id == record.subject_id && r.date == record.date)
            });
            if taken {
                return Err(StoreError::Duplicate);
            }

            s.attendance.push(record.clone());
            Ok(record)
        })
    }

    async fn update_attendance(&self, record: attendance_record::Model, expected: AttendanceStatus) -> StoreResult<attendance_record::Model> {
        self.with(|s| {
            s.raced()?;
            let Some(stored) = s.attendance.iter_mut().find(|r| r.id == record.id && r.status == expected) else {
                return Err(StoreError::Stale);
            };

            *stored = record.clone();
            Ok(record)
        })
    }

    async fn find_payroll(&self, id: Uuid) -> StoreResult<Option<payroll::Model>> {
        self.with(|s| Ok(s.payrolls.iter().find(|p| p.id == id).cloned()))
    }

    async fn find_payroll_for(&self, staff_id: Uuid, month: &Month) -> StoreResult<Option<payroll::Model>> {
        let label = month.label();
        self.with(|s| {
            if s.broken_staff.contains(&staff_id) {
                return Err(broken());
            }

            Ok(s.payrolls.iter().find(|p| p.staff_id == staff_id && p.month == label).cloned())
        })
    }

    async fn insert_payroll(&self, payroll: payroll::Model, entry: payroll_history::Model) -> StoreResult<payroll::Model> {
        self.with(|s| {
            s.raced()?;
            if s.payrolls.iter().any(|p| p.id == payroll.id || (p.staff_id == payroll.staff_id && p.month == payroll.month)) {
                return Err(StoreError::Duplicate);
            }

            s.payrolls.push(payroll.clone());
            s.history.push(entry);
            Ok(payroll)
        })
    }

    async fn update_payroll(&self, payroll: payroll::Model, expected: PayrollStatus, entry: payroll_history::Model) -> StoreResult<payroll::Model> {
        self.with(|s| {
            s.raced()?;
            let Some(stored) = s.payrolls.iter_mut().find(|p| p.id == payroll.id && p.status == expected) else {
                return Err(StoreError::Stale);
            };

            *stored = payroll.clone();
            s.history.push(entry);
            Ok(payroll)
        })
    }

    async fn payroll_history(&self, payroll_id: Uuid) -> StoreResult<Vec<payroll_history::Model>> {
        self.with(|s| Ok(s.history.iter().filter(|h| h.payroll_id == payroll_id).cloned().collect()))
    }

    async fn find_child(&self, id: Uuid) -> StoreResult<Option<child::Model>> {
        self.with(|s| Ok(s.children.iter().find(|c| c.id == id).cloned()))
    }

    async fn active_children(&self) -> StoreResult<Vec<child::Model>> {
        self.with(|s| Ok(s.children.iter().filter(|c| c.active).cloned().collect()))
    }

    async fn find_child_payment(&self, id: Uuid) -> StoreResult<Option<child_payment::Model>> {
        self.with(|s| Ok(s.child_payments.iter().find(|p| p.id == id).cloned()))
    }

    async fn find_child_payment_for(&self, child_id: Uuid, month: &Month) -> StoreResult<Option<child_payment::Model>> {
        let label = month.label();
        self.with(|s| Ok(s.child_payments.iter().find(|p| p.child_id == child_id && p.month == label).cloned()))
    }

    async fn insert_child_payment(&self, payment: child_payment::Model) -> StoreResult<child_payment::Model> {
        self.with(|s| {
            s.raced()?;
            if s.child_payments.iter().any(|p| p.id == payment.id || (p.child_id == payment.child_id && p.month == payment.month)) {
                return Err(StoreError::Duplicate);
            }

            s.child_payments.push(payment.clone());
            Ok(payment)
        })
    }

    async fn update_child_payment(&self, payment: child_payment::Model, expected: ChildPaymentStatus) -> StoreResult<child_payment::Model> {
        self.with(|s| {
            s.raced()?;
            let Some(stored) = s.child_payments.iter_mut().find(|p| p.id == payment.id && p.status == expected) else {
                return Err(StoreError::Stale);
            };

            *stored = payment.clone();
            Ok(payment)
        })
    }

    async fn settings(&self) -> StoreResult<Vec<setting::Model>> {
        self.with(|s| {
            if s.broken_settings {
                return Err(broken());
            }

            Ok(s.settings.clone())
        })
    }
}
