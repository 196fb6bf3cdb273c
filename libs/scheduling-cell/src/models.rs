use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

/// A discrete bookable interval for one doctor on one date.
///
/// `(doctor_id, date, start_time)` is the natural key; the surrogate id is
/// what delete operations address. A slot is either free
/// (`available == true`, no appointment) or bound to exactly one
/// appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub available: bool,
    pub appointment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateSlotsRequest {
    pub start_date: NaiveDate,
    pub days: u32,
    /// When set, existing unbooked slots from `start_date - 1` onward are
    /// deleted before generating.
    pub regenerate: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkDeleteRequest {
    pub slot_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailableSlotsQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

/// Outcome of a generation run, reported back to the caller.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub days_processed: u32,
    pub days_skipped: u32,
    pub slots_created: u32,
    pub slots_deleted: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Time slot not found")]
    SlotNotFound,

    #[error("Not authorized to manage this time slot")]
    NotSlotOwner,

    #[error("Cannot delete a booked time slot")]
    SlotBooked,

    #[error("Invalid availability template: {0}")]
    InvalidTemplate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
            SchedulingError::SlotNotFound => AppError::NotFound("Time slot not found".to_string()),
            SchedulingError::NotSlotOwner => {
                AppError::Forbidden("Not authorized to manage this time slot".to_string())
            }
            SchedulingError::SlotBooked => {
                AppError::Conflict("Cannot delete a booked time slot".to_string())
            }
            SchedulingError::InvalidTemplate(msg) => AppError::BadRequest(msg),
            SchedulingError::Database(msg) => AppError::Database(msg),
        }
    }
}
