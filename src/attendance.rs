//! Attendance state machine and the minute arithmetic derived from clock times.
//!
//! A record starts `Scheduled`, moves to `InProgress` on clock-in and to `Completed` on clock-out.
//! `NoShow` and `Cancelled` are terminal. Lateness is an attribute of the record (`late`,
//! `late_minutes`), never a status of its own, so a completed record keeps that information.

use chrono::{Local, NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use crate::{consts::MINUTES_PER_DAY, entity::{attendance_record, sea_orm_active_enums::{AttendanceStatus, SubjectType}}, error::{CoreError, CoreResult, StateConflict}, geofence::GeoPoint, utils::{minutes_of_day, signed_offset_minutes, span_minutes}};

pub mod clock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Derived {
    pub late_minutes: i64,
    pub early_leave_minutes: i64,
    pub overtime_minutes: i64,
    pub worked_minutes: i64,
}

/// Derives the minute fields of a day from its scheduled and actual times.
///
/// On a shift crossing midnight the actual start is compared with the scheduled start on a ±12h
/// window, so a clock-in at 00:10 for a 23:50 shift is 20 minutes late. On a day shift lateness is
/// the plain difference. An actual end earlier than the actual start is an overnight stay and gets
/// 24h added; a day never spans more than 24h. Early leave never exceeds the scheduled span.
pub fn derive(
    scheduled_start: NaiveTime,
    scheduled_end: NaiveTime,
    actual_start: Option<NaiveTime>,
    actual_end: Option<NaiveTime>,
    break_minutes: i64,
) -> CoreResult<Derived> {
    if break_minutes < 0 {
        return Err(CoreError::Validation("break minutes cannot be negative".to_owned()));
    }

    let Some(actual_start) = actual_start else {
        if actual_end.is_some() {
            return Err(CoreError::Validation("actual end requires an actual start".to_owned()));
        }
        return Ok(Derived::default());
    };

    let overnight = scheduled_end <= scheduled_start;
    let start_offset = if overnight {
        signed_offset_minutes(scheduled_start, actual_start)
    } else {
        minutes_of_day(actual_start) - minutes_of_day(scheduled_start)
    };
    let mut derived = Derived {
        late_minutes: start_offset.max(0),
        ..Default::default()
    };

    let Some(actual_end) = actual_end else {
        return Ok(derived);
    };

    let worked = span_minutes(actual_start, actual_end);
    if worked == 0 {
        return Err(CoreError::Validation("actual end must be after actual start".to_owned()));
    }

    let scheduled = match span_minutes(scheduled_start, scheduled_end) {
        0 => MINUTES_PER_DAY,
        span => span,
    };
    let end_offset = start_offset + worked - scheduled;

    derived.overtime_minutes = end_offset.max(0);
    derived.early_leave_minutes = (-end_offset).clamp(0, scheduled);
    derived.worked_minutes = (worked - break_minutes).max(0);

    Ok(derived)
}

/// Fresh `Scheduled` record for a subject's day
pub fn new_record(
    subject_type: SubjectType,
    subject_id: Uuid,
    date: NaiveDate,
    (scheduled_start, scheduled_end): (NaiveTime, NaiveTime),
    recorded_by: Option<Uuid>,
) -> attendance_record::Model {
    attendance_record::Model {
        id: Uuid::new_v4(),
        created_at: Local::now().fixed_offset(),
        updated_at: Local::now().fixed_offset(),
        created_by: recorded_by,
        updated_by: recorded_by,
        subject_type,
        subject_id,
        date,
        scheduled_start,
        scheduled_end,
        actual_start: None,
        actual_end: None,
        break_minutes: 0,
        status: AttendanceStatus::Scheduled,
        late: false,
        late_minutes: 0,
        early_leave_minutes: 0,
        overtime_minutes: 0,
        clock_in_latitude: None,
        clock_in_longitude: None,
        clock_out_latitude: None,
        clock_out_longitude: None,
        notes: None,
    }
}

fn apply(record: &mut attendance_record::Model, derived: Derived, grace_minutes: i64) {
    record.late_minutes = derived.late_minutes as i32;
    record.early_leave_minutes = derived.early_leave_minutes as i32;
    record.overtime_minutes = derived.overtime_minutes as i32;
    record.late = derived.late_minutes > grace_minutes;
}

fn rederive(record: &mut attendance_record::Model, grace_minutes: i64) -> CoreResult<Derived> {
    let derived = derive(
        record.scheduled_start,
        record.scheduled_end,
        record.actual_start,
        record.actual_end,
        record.break_minutes.into(),
    )?;
    apply(record, derived, grace_minutes);

    Ok(derived)
}

pub fn clock_in(record: &mut attendance_record::Model, at: NaiveTime, location: Option<GeoPoint>, grace_minutes: i64) -> CoreResult<()> {
    if record.actual_start.is_some() {
        return Err(StateConflict::AlreadyClockedIn.into());
    }
    if record.status != AttendanceStatus::Scheduled {
        return Err(StateConflict::attendance(record.status, "clock in").into());
    }

    record.actual_start = Some(at);
    record.clock_in_latitude = location.map(|p| p.latitude);
    record.clock_in_longitude = location.map(|p| p.longitude);
    rederive(record, grace_minutes)?;
    record.status = AttendanceStatus::InProgress;

    Ok(())
}

pub fn clock_out(record: &mut attendance_record::Model, at: NaiveTime, location: Option<GeoPoint>, grace_minutes: i64) -> CoreResult<()> {
    if record.actual_start.is_none() || record.status == AttendanceStatus::Scheduled {
        return Err(StateConflict::NotClockedIn.into());
    }
    if record.actual_end.is_some() {
        return Err(StateConflict::AlreadyClockedOut.into());
    }
    if record.status != AttendanceStatus::InProgress {
        return Err(StateConflict::attendance(record.status, "clock out").into());
    }

    let mut updated = record.clone();
    updated.actual_end = Some(at);
    updated.clock_out_latitude = location.map(|p| p.latitude);
    updated.clock_out_longitude = location.map(|p| p.longitude);
    rederive(&mut updated, grace_minutes)?;
    updated.status = AttendanceStatus::Completed;

    *record = updated;
    Ok(())
}

pub fn is_terminal(status: AttendanceStatus) -> bool {
    matches!(status, AttendanceStatus::Completed | AttendanceStatus::NoShow | AttendanceStatus::Cancelled)
}

pub fn cancel(record: &mut attendance_record::Model) -> Result<(), StateConflict> {
    if is_terminal(record.status) {
        return Err(StateConflict::attendance(record.status, "cancel"));
    }

    record.status = AttendanceStatus::Cancelled;
    Ok(())
}

pub fn mark_no_show(record: &mut attendance_record::Model) -> Result<(), StateConflict> {
    if record.status != AttendanceStatus::Scheduled {
        return Err(StateConflict::attendance(record.status, "mark as no-show"));
    }

    record.status = AttendanceStatus::NoShow;
    Ok(())
}

/// Administrative correction of the actual times. Cancelled records stay frozen.
pub fn correct(
    record: &mut attendance_record::Model,
    actual_start: Option<NaiveTime>,
    actual_end: Option<NaiveTime>,
    break_minutes: i32,
    grace_minutes: i64,
) -> CoreResult<()> {
    if record.status == AttendanceStatus::Cancelled {
        return Err(StateConflict::attendance(record.status, "correct").into());
    }

    let mut updated = record.clone();
    updated.actual_start = actual_start;
    updated.actual_end = actual_end;
    updated.break_minutes = break_minutes;
    rederive(&mut updated, grace_minutes)?;

    updated.status = match (actual_start, actual_end) {
        (Some(_), Some(_)) => AttendanceStatus::Completed,
        (Some(_), None) => AttendanceStatus::InProgress,
        _ if record.status == AttendanceStatus::NoShow => AttendanceStatus::NoShow,
        _ => AttendanceStatus::Scheduled,
    };

    *record = updated;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    pub(crate) fn record_at(date: NaiveDate) -> attendance_record::Model {
        new_record(SubjectType::Staff, Uuid::new_v4(), date, (time(9, 0), time(18, 0)), None)
    }

    fn record() -> attendance_record::Model {
        record_at(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap())
    }

    #[test]
    fn test_late_clock_in() {
        let mut record = record();

        clock_in(&mut record, time(9, 20), None, 15).unwrap();

        assert_eq!(record.status, AttendanceStatus::InProgress);
        assert_eq!(record.late_minutes, 20);
        assert!(record.late);
    }

    #[test]
    fn test_lateness_within_grace() {
        let mut record = record();

        clock_in(&mut record, time(9, 10), None, 15).unwrap();

        assert_eq!(record.late_minutes, 10);
        assert!(!record.late);
    }

    #[test]
    fn test_early_arrival_is_not_negative() {
        let mut record = record();

        clock_in(&mut record, time(8, 30), None, 15).unwrap();

        assert_eq!(record.late_minutes, 0);
    }

    #[test]
    fn test_overtime_clock_out() {
        let mut record = record();

        clock_in(&mut record, time(9, 20), None, 15).unwrap();
        clock_out(&mut record, time(18, 45), None, 15).unwrap();

        assert_eq!(record.status, AttendanceStatus::Completed);
        assert_eq!(record.late_minutes, 20);
        assert_eq!(record.overtime_minutes, 45);
        assert_eq!(record.early_leave_minutes, 0);
        assert!(record.late);
    }

    #[test]
    fn test_early_leave() {
        let mut record = record();

        clock_in(&mut record, time(9, 0), None, 15).unwrap();
        clock_out(&mut record, time(17, 0), None, 15).unwrap();

        assert_eq!(record.early_leave_minutes, 60);
        assert_eq!(record.overtime_minutes, 0);
    }

    #[test]
    fn test_on_time_departure() {
        let mut record = record();

        clock_in(&mut record, time(9, 0), None, 15).unwrap();
        clock_out(&mut record, time(18, 0), None, 15).unwrap();

        assert_eq!((record.early_leave_minutes, record.overtime_minutes), (0, 0));
    }

    #[test]
    fn test_overnight_shift() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let mut record = new_record(SubjectType::Staff, Uuid::new_v4(), date, (time(22, 0), time(6, 0)), None);

        clock_in(&mut record, time(22, 5), None, 15).unwrap();
        clock_out(&mut record, time(6, 30), None, 15).unwrap();

        assert_eq!(record.late_minutes, 5);
        assert_eq!(record.overtime_minutes, 30);
        assert_eq!(record.early_leave_minutes, 0);
    }

    #[test]
    fn test_very_late_arrival_on_day_shift() {
        let d = derive(time(9, 0), time(18, 0), Some(time(22, 0)), Some(time(23, 0)), 0).unwrap();

        assert_eq!(d, Derived { late_minutes: 780, early_leave_minutes: 0, overtime_minutes: 300, worked_minutes: 60 });
    }

    #[test]
    fn test_early_leave_bounded_by_shift() {
        let d = derive(time(9, 0), time(18, 0), Some(time(1, 0)), Some(time(2, 0)), 0).unwrap();

        assert_eq!(d.late_minutes, 0);
        assert_eq!(d.early_leave_minutes, 540);
    }

    #[test]
    fn test_derived_minutes_never_negative() {
        let times = [time(0, 0), time(5, 59), time(8, 59), time(9, 0), time(12, 30), time(18, 1), time(23, 59)];

        for start in times {
            for end in times {
                let Ok(d) = derive(time(9, 0), time(18, 0), Some(start), Some(end), 30) else {
                    assert_eq!(start, end);
                    continue;
                };

                assert!(d.late_minutes >= 0 && d.early_leave_minutes >= 0 && d.overtime_minutes >= 0);
                assert!(d.early_leave_minutes == 0 || d.overtime_minutes == 0);
                assert!(d.early_leave_minutes <= 540);
                assert!(d.worked_minutes <= MINUTES_PER_DAY);
            }
        }
    }

    #[test]
    fn test_worked_minutes_subtract_break() {
        let d = derive(time(9, 0), time(18, 0), Some(time(9, 0)), Some(time(18, 0)), 60).unwrap();
        assert_eq!(d.worked_minutes, 480);

        assert!(matches!(derive(time(9, 0), time(18, 0), Some(time(9, 0)), None, -1), Err(CoreError::Validation(_))));
        assert!(matches!(derive(time(9, 0), time(18, 0), None, Some(time(18, 0)), 0), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_double_clock_in() {
        let mut record = record();
        clock_in(&mut record, time(9, 0), None, 15).unwrap();

        let err = clock_in(&mut record, time(9, 5), None, 15).unwrap_err();
        assert!(matches!(err, CoreError::StateConflict(StateConflict::AlreadyClockedIn)));

        clock_out(&mut record, time(18, 0), None, 15).unwrap();
        let err = clock_in(&mut record, time(18, 5), None, 15).unwrap_err();
        assert!(matches!(err, CoreError::StateConflict(StateConflict::AlreadyClockedIn)));
    }

    #[test]
    fn test_clock_out_without_clock_in() {
        let mut record = record();

        let err = clock_out(&mut record, time(18, 0), None, 15).unwrap_err();
        assert!(matches!(err, CoreError::StateConflict(StateConflict::NotClockedIn)));
        assert_eq!(record.status, AttendanceStatus::Scheduled);
    }

    #[test]
    fn test_double_clock_out() {
        let mut record = record();
        clock_in(&mut record, time(9, 0), None, 15).unwrap();
        clock_out(&mut record, time(18, 0), None, 15).unwrap();

        let err = clock_out(&mut record, time(18, 5), None, 15).unwrap_err();
        assert!(matches!(err, CoreError::StateConflict(StateConflict::AlreadyClockedOut)));
    }

    #[test]
    fn test_clock_out_at_clock_in_time_is_rejected() {
        let mut record = record();
        clock_in(&mut record, time(9, 0), None, 15).unwrap();

        assert!(matches!(clock_out(&mut record, time(9, 0), None, 15), Err(CoreError::Validation(_))));
        assert_eq!(record.status, AttendanceStatus::InProgress);
        assert_eq!(record.actual_end, None);
    }

    #[test]
    fn test_cancel_freezes_record() {
        let mut record = record();
        clock_in(&mut record, time(9, 0), None, 15).unwrap();

        cancel(&mut record).unwrap();
        assert_eq!(record.status, AttendanceStatus::Cancelled);

        assert!(cancel(&mut record).is_err());
        assert!(clock_out(&mut record, time(18, 0), None, 15).is_err());
        assert!(correct(&mut record, Some(time(9, 0)), Some(time(18, 0)), 0, 15).is_err());
    }

    #[test]
    fn test_no_show_is_terminal() {
        let mut record = record();

        mark_no_show(&mut record).unwrap();
        assert_eq!(record.status, AttendanceStatus::NoShow);

        assert!(mark_no_show(&mut record).is_err());
        assert!(clock_in(&mut record, time(9, 0), None, 15).is_err());
        assert!(cancel(&mut record).is_err());
    }

    #[test]
    fn test_correction_recomputes() {
        let mut record = record();
        mark_no_show(&mut record).unwrap();

        correct(&mut record, Some(time(9, 30)), Some(time(17, 30)), 45, 15).unwrap();

        assert_eq!(record.status, AttendanceStatus::Completed);
        assert_eq!(record.late_minutes, 30);
        assert_eq!(record.early_leave_minutes, 30);
        assert_eq!(record.break_minutes, 45);
        assert!(record.late);

        correct(&mut record, Some(time(9, 0)), Some(time(18, 0)), 0, 15).unwrap();
        assert_eq!((record.late_minutes, record.early_leave_minutes), (0, 0));
        assert!(!record.late);
    }
}
