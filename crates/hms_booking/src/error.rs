// --- File: crates/hms_booking/src/error.rs ---
use hms_common::HmsError;
use hms_db::DbError;
use thiserror::Error;

/// Why a booking operation was rejected.
///
/// The messages are shown to end users as they are.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("{0}")]
    NotFound(String),
    /// Booked, already started, or otherwise not reservable.
    #[error("This slot is no longer available.")]
    SlotUnavailable,
    #[error("You already have a booking. Cancel it first to book another.")]
    AlreadyReserved,
    #[error("{0}")]
    Validation(String),
    /// The store failed; nothing was written.
    #[error("Storage failure: {0}")]
    TransientStore(String),
    #[error("Cannot delete a booked slot.")]
    SlotInUse,
    #[error("You already have a slot at this date and time.")]
    DuplicateSlot,
}

impl BookingError {
    pub fn slot_not_found() -> Self {
        BookingError::NotFound("Slot not found.".to_string())
    }

    pub fn reservation_not_found() -> Self {
        BookingError::NotFound("No booking found.".to_string())
    }
}

impl From<DbError> for BookingError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(_) => BookingError::NotFound(err.to_string()),
            DbError::Conflict(_) => BookingError::SlotUnavailable,
            other => BookingError::TransientStore(other.to_string()),
        }
    }
}

impl From<BookingError> for HmsError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match err {
            BookingError::NotFound(_) => HmsError::NotFoundError(message),
            BookingError::SlotUnavailable
            | BookingError::AlreadyReserved
            | BookingError::SlotInUse
            | BookingError::DuplicateSlot => HmsError::ConflictError(message),
            BookingError::Validation(_) => HmsError::ValidationError(message),
            BookingError::TransientStore(detail) => HmsError::DatabaseError(detail),
        }
    }
}
