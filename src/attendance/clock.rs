//! Store-backed attendance operations: clock events, administrative actions and the day-end sweep.

use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{audit::{Actor, AuditEvent, AuditSink}, entity::{attendance_record, sea_orm_active_enums::{AttendanceStatus, PayrollStatus, SubjectType}}, error::{CoreError, CoreResult, StateConflict}, geofence::GeoPoint, penalty::{self, Accrual}, settings::Settings, store::{Store, StoreError}, utils::Month};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockEvent {
    pub subject_type: SubjectType,
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correction {
    pub actual_start: Option<NaiveTime>,
    pub actual_end: Option<NaiveTime>,
    #[serde(default)]
    pub break_minutes: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualEntry {
    pub subject_type: SubjectType,
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub actual_start: NaiveTime,
    pub actual_end: NaiveTime,
    #[serde(default)]
    pub break_minutes: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoShowReport {
    pub marked: u64,
    pub created: u64,
}

/// Validates the reported location and, for staff, enforces the geofence when one is configured
fn locate(settings: &Settings, subject_type: SubjectType, latitude: Option<f64>, longitude: Option<f64>) -> CoreResult<Option<GeoPoint>> {
    let point = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint::new(latitude, longitude)?),
        (None, None) => None,
        _ => return Err(CoreError::Validation("latitude and longitude must be sent together".to_owned())),
    };

    if subject_type != SubjectType::Staff {
        return Ok(point);
    }

    let Some(geofence) = settings.geofence else {
        return Ok(point);
    };
    let Some(point) = point else {
        return Err(CoreError::Validation("location is required to clock in or out".to_owned()));
    };

    geofence.authorize(point.latitude, point.longitude)?;

    Ok(Some(point))
}

async fn subject_name<S: Store>(store: &S, subject_type: SubjectType, subject_id: Uuid) -> CoreResult<String> {
    match subject_type {
        SubjectType::Staff => {
            let member = store.find_staff(subject_id).await?.ok_or(CoreError::NotFound("staff member"))?;
            if !member.active {
                return Err(CoreError::Validation(format!("staff member {} is not active", member.username)));
            }
            Ok(member.display_name)
        }
        SubjectType::Child => {
            let child = store.find_child(subject_id).await?.ok_or(CoreError::NotFound("child"))?;
            Ok(child.full_name)
        }
    }
}

/// Attendance of a staff member is frozen once the month's payroll has left `draft`
async fn ensure_unlocked<S: Store>(store: &S, subject_type: SubjectType, subject_id: Uuid, date: NaiveDate) -> CoreResult<()> {
    if subject_type != SubjectType::Staff {
        return Ok(());
    }

    let month = Month::of(date);
    match store.find_payroll_for(subject_id, &month).await? {
        Some(payroll) if payroll.status != PayrollStatus::Draft => Err(StateConflict::PeriodLocked { month, status: payroll.status }.into()),
        _ => Ok(()),
    }
}

async fn scheduled_times<S: Store>(store: &S, settings: &Settings, subject_type: SubjectType, subject_id: Uuid, date: NaiveDate) -> CoreResult<(NaiveTime, NaiveTime)> {
    if subject_type == SubjectType::Staff {
        if let Some(shift) = store.find_shift_for(subject_id, date).await? {
            return Ok((shift.start_time, shift.end_time));
        }
    }

    Ok(settings.default_shift)
}

fn touch(record: &mut attendance_record::Model, actor: &Actor) {
    record.updated_at = Local::now().fixed_offset();
    record.updated_by = Some(actor.id);
}

fn stale(err: StoreError, conflict: StateConflict) -> CoreError {
    match err {
        StoreError::Stale | StoreError::Duplicate => conflict.into(),
        err => err.into(),
    }
}

pub async fn clock_in<S: Store, A: AuditSink>(store: &S, audit: &A, settings: &Settings, actor: &Actor, event: ClockEvent) -> CoreResult<attendance_record::Model> {
    let location = locate(settings, event.subject_type, event.latitude, event.longitude)?;
    let name = subject_name(store, event.subject_type, event.subject_id).await?;
    ensure_unlocked(store, event.subject_type, event.subject_id, event.date).await?;

    let record = match store.find_attendance_for(event.subject_type, event.subject_id, event.date).await? {
        Some(mut record) => {
            let expected = record.status;
            super::clock_in(&mut record, event.time, location, settings.grace_minutes)?;
            touch(&mut record, actor);

            store.update_attendance(record, expected).await
                .map_err(|err| stale(err, StateConflict::AlreadyClockedIn))?
        }
        None => {
            let scheduled = scheduled_times(store, settings, event.subject_type, event.subject_id, event.date).await?;
            let mut record = super::new_record(event.subject_type, event.subject_id, event.date, scheduled, Some(actor.id));
            super::clock_in(&mut record, event.time, location, settings.grace_minutes)?;

            // The (subject, date) unique key decides concurrent first clock-ins
            store.insert_attendance(record).await
                .map_err(|err| stale(err, StateConflict::AlreadyClockedIn))?
        }
    };

    info!(record_id = %record.id, subject_id = %record.subject_id, late_minutes = record.late_minutes, "Clocked in");
    audit.record(
        AuditEvent::new(actor, "clock_in", "attendance_record", record.id, name)
            .with_changes(format!("actual_start={}, late_minutes={}", event.time, record.late_minutes))
    );

    Ok(record)
}

/// The record a clock-out closes: the one of the event's day, or yesterday's overnight shift
/// still in progress when the day has no open record
async fn open_record<S: Store>(store: &S, event: &ClockEvent) -> CoreResult<Option<attendance_record::Model>> {
    let today = store.find_attendance_for(event.subject_type, event.subject_id, event.date).await?;
    if matches!(&today, Some(record) if record.status == AttendanceStatus::InProgress) {
        return Ok(today);
    }

    let Some(yesterday) = event.date.pred_opt() else {
        return Ok(today);
    };
    let previous = store.find_attendance_for(event.subject_type, event.subject_id, yesterday).await?
        .filter(|r| r.status == AttendanceStatus::InProgress && r.scheduled_end <= r.scheduled_start);

    Ok(previous.or(today))
}

pub async fn clock_out<S: Store, A: AuditSink>(store: &S, audit: &A, settings: &Settings, actor: &Actor, event: ClockEvent) -> CoreResult<attendance_record::Model> {
    let location = locate(settings, event.subject_type, event.latitude, event.longitude)?;
    let name = subject_name(store, event.subject_type, event.subject_id).await?;

    let Some(mut record) = open_record(store, &event).await? else {
        return Err(StateConflict::NotClockedIn.into());
    };
    ensure_unlocked(store, record.subject_type, record.subject_id, record.date).await?;

    let expected = record.status;
    super::clock_out(&mut record, event.time, location, settings.grace_minutes)?;
    touch(&mut record, actor);

    let record = store.update_attendance(record, expected).await
        .map_err(|err| stale(err, StateConflict::AlreadyClockedOut))?;

    info!(
        record_id = %record.id,
        subject_id = %record.subject_id,
        overtime_minutes = record.overtime_minutes,
        early_leave_minutes = record.early_leave_minutes,
        "Clocked out"
    );
    audit.record(
        AuditEvent::new(actor, "clock_out", "attendance_record", record.id, name)
            .with_changes(format!(
                "actual_end={}, overtime_minutes={}, early_leave_minutes={}",
                event.time, record.overtime_minutes, record.early_leave_minutes,
            ))
    );

    Ok(record)
}

async fn load_record<S: Store>(store: &S, record_id: Uuid) -> CoreResult<attendance_record::Model> {
    let record = store.find_attendance(record_id).await?.ok_or(CoreError::NotFound("attendance record"))?;
    ensure_unlocked(store, record.subject_type, record.subject_id, record.date).await?;

    Ok(record)
}

pub async fn cancel<S: Store, A: AuditSink>(store: &S, audit: &A, actor: &Actor, record_id: Uuid) -> CoreResult<attendance_record::Model> {
    let mut record = load_record(store, record_id).await?;

    let expected = record.status;
    super::cancel(&mut record)?;
    touch(&mut record, actor);

    let record = store.update_attendance(record, expected).await
        .map_err(|err| stale(err, StateConflict::attendance(expected, "cancel")))?;

    info!(record_id = %record.id, "Attendance cancelled");
    audit.record(
        AuditEvent::new(actor, "cancel", "attendance_record", record.id, record.date.to_string())
            .with_changes(format!("{expected:?} -> Cancelled"))
    );

    Ok(record)
}

pub async fn correct<S: Store, A: AuditSink>(store: &S, audit: &A, settings: &Settings, actor: &Actor, record_id: Uuid, correction: Correction) -> CoreResult<attendance_record::Model> {
    let mut record = load_record(store, record_id).await?;

    let expected = record.status;
    super::correct(&mut record, correction.actual_start, correction.actual_end, correction.break_minutes, settings.grace_minutes)?;
    if correction.notes.is_some() {
        record.notes = correction.notes;
    }
    touch(&mut record, actor);

    let record = store.update_attendance(record, expected).await
        .map_err(|err| stale(err, StateConflict::attendance(expected, "correct")))?;

    info!(record_id = %record.id, status = ?record.status, "Attendance corrected");
    audit.record(
        AuditEvent::new(actor, "correct", "attendance_record", record.id, record.date.to_string())
            .with_changes(format!(
                "actual_start={:?}, actual_end={:?}, break_minutes={}",
                record.actual_start, record.actual_end, record.break_minutes,
            ))
    );

    Ok(record)
}

/// Records a completed day for a subject that has no record yet
pub async fn record_manual<S: Store, A: AuditSink>(store: &S, audit: &A, settings: &Settings, actor: &Actor, entry: ManualEntry) -> CoreResult<attendance_record::Model> {
    let name = subject_name(store, entry.subject_type, entry.subject_id).await?;
    ensure_unlocked(store, entry.subject_type, entry.subject_id, entry.date).await?;

    let scheduled = scheduled_times(store, settings, entry.subject_type, entry.subject_id, entry.date).await?;
    let mut record = super::new_record(entry.subject_type, entry.subject_id, entry.date, scheduled, Some(actor.id));
    super::correct(&mut record, Some(entry.actual_start), Some(entry.actual_end), entry.break_minutes, settings.grace_minutes)?;
    record.notes = entry.notes;

    let record = store.insert_attendance(record).await
        .map_err(|err| stale(err, StateConflict::AlreadyClockedIn))?;

    info!(record_id = %record.id, subject_id = %record.subject_id, "Manual attendance recorded");
    audit.record(AuditEvent::new(actor, "record_manual", "attendance_record", record.id, name));

    Ok(record)
}

/// Creates the `scheduled` record for a shift ahead of the day; an existing record is returned as is
pub async fn schedule<S: Store, A: AuditSink>(store: &S, audit: &A, actor: &Actor, shift_id: Uuid) -> CoreResult<attendance_record::Model> {
    let shift = store.find_shift(shift_id).await?.ok_or(CoreError::NotFound("shift schedule"))?;

    if let Some(existing) = store.find_attendance_for(SubjectType::Staff, shift.staff_id, shift.date).await? {
        return Ok(existing);
    }

    let record = super::new_record(SubjectType::Staff, shift.staff_id, shift.date, (shift.start_time, shift.end_time), Some(actor.id));

    match store.insert_attendance(record).await {
        Ok(record) => {
            audit.record(AuditEvent::new(actor, "schedule", "attendance_record", record.id, shift.date.to_string()));
            Ok(record)
        }
        Err(StoreError::Duplicate) => store.find_attendance_for(SubjectType::Staff, shift.staff_id, shift.date).await?
            .ok_or(CoreError::NotFound("attendance record")),
        Err(err) => Err(err.into()),
    }
}

/// Day-end sweep: `scheduled` records and shifts nobody clocked in for become `no_show`
pub async fn mark_no_shows<S: Store, A: AuditSink>(store: &S, audit: &A, actor: &Actor, date: NaiveDate) -> CoreResult<NoShowReport> {
    let mut report = NoShowReport::default();

    for mut record in store.attendance_on(date).await? {
        if record.status != AttendanceStatus::Scheduled {
            continue;
        }
        if let Err(err) = ensure_unlocked(store, record.subject_type, record.subject_id, date).await {
            warn!(record_id = %record.id, error = %err, "Skipping no-show marking");
            continue;
        }

        super::mark_no_show(&mut record)?;
        touch(&mut record, actor);

        match store.update_attendance(record, AttendanceStatus::Scheduled).await {
            Ok(record) => {
                report.marked += 1;
                audit.record(AuditEvent::new(actor, "no_show", "attendance_record", record.id, date.to_string()));
            }
            Err(StoreError::Stale) => continue,
            Err(err) => return Err(err.into()),
        }
    }

    for shift in store.shifts_on(date).await? {
        if store.find_attendance_for(SubjectType::Staff, shift.staff_id, date).await?.is_some() {
            continue;
        }
        if let Err(err) = ensure_unlocked(store, SubjectType::Staff, shift.staff_id, date).await {
            warn!(staff_id = %shift.staff_id, error = %err, "Skipping no-show creation");
            continue;
        }

        let mut record = super::new_record(SubjectType::Staff, shift.staff_id, date, (shift.start_time, shift.end_time), Some(actor.id));
        super::mark_no_show(&mut record)?;

        match store.insert_attendance(record).await {
            Ok(record) => {
                report.created += 1;
                audit.record(AuditEvent::new(actor, "no_show", "attendance_record", record.id, date.to_string()));
            }
            Err(StoreError::Duplicate) => continue,
            Err(err) => return Err(err.into()),
        }
    }

    info!(%date, marked = report.marked, created = report.created, "No-show sweep finished");

    Ok(report)
}

pub async fn accrual<S: Store>(store: &S, settings: &Settings, record_id: Uuid) -> CoreResult<Accrual> {
    let record = store.find_attendance(record_id).await?.ok_or(CoreError::NotFound("attendance record"))?;

    Ok(penalty::calculate(&record, &settings.rates))
}
