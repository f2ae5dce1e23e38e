use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{attendance::clock::ClockEvent, audit::Actor, entity::sea_orm_active_enums::SubjectType};

/// Clock event as sent by a device; the server clock decides the time
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ClockRequest {
    /// Clocks a child in or out instead of the signed-in staff member
    pub(super) child_id: Option<Uuid>,
    pub(super) latitude: Option<f64>,
    pub(super) longitude: Option<f64>,
}

impl ClockRequest {
    pub(super) fn into_event(self, actor: &Actor, now: NaiveDateTime) -> ClockEvent {
        let (subject_type, subject_id) = match self.child_id {
            Some(child_id) => (SubjectType::Child, child_id),
            None => (SubjectType::Staff, actor.id),
        };

        ClockEvent {
            subject_type,
            subject_id,
            date: now.date(),
            time: now.time(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ScheduleShift {
    pub(super) shift_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct NoShowSweep {
    pub(super) date: NaiveDate,
}
