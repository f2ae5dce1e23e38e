use actix_web::{body, http::{self, header::ContentType, StatusCode}, HttpResponse};
use thiserror::Error;
use uuid::Uuid;

use crate::{entity::sea_orm_active_enums::{AttendanceStatus, PayrollStatus}, store::StoreError, utils::{Month, MonthParseError}};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("location not allowed: {distance_m:.0}m from the reference point, {radius_m:.0}m allowed")]
    LocationNotAllowed { distance_m: f64, radius_m: f64 },

    #[error(transparent)]
    StateConflict(#[from] StateConflict),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{entity} {entity_id} already has a record for {month}")]
    DuplicatePeriod { entity: &'static str, entity_id: Uuid, month: Month },

    #[error("storage error")]
    Storage(#[source] StoreError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateConflict {
    #[error("already clocked in")]
    AlreadyClockedIn,

    #[error("already clocked out")]
    AlreadyClockedOut,

    #[error("not clocked in")]
    NotClockedIn,

    #[error("cannot {action} a record that is {from}")]
    InvalidTransition { from: String, action: &'static str },

    #[error("payroll for {month} is already {status:?}, attendance is locked")]
    PeriodLocked { month: Month, status: PayrollStatus },
}

impl StateConflict {
    pub fn attendance(from: AttendanceStatus, action: &'static str) -> Self {
        Self::InvalidTransition { from: format!("{from:?}"), action }
    }

    pub fn payroll(from: PayrollStatus, action: &'static str) -> Self {
        Self::InvalidTransition { from: format!("{from:?}"), action }
    }
}

impl From<MonthParseError> for CoreError {
    fn from(err: MonthParseError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "Storage operation failed");
        Self::Storage(err)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

impl actix_web::error::ResponseError for CoreError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> http::StatusCode {
        match self {
            CoreError::Validation(_) | CoreError::InvalidCoordinate(_) => StatusCode::BAD_REQUEST,
            CoreError::LocationNotAllowed { .. } => StatusCode::FORBIDDEN,
            CoreError::StateConflict(_) | CoreError::DuplicatePeriod { .. } => StatusCode::CONFLICT,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
