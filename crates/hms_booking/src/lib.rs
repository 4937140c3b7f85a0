// --- File: crates/hms_booking/src/lib.rs ---
//! The slot reservation engine.
//!
//! [`ReservationEngine`] is the only component allowed to move a slot between
//! its booked and unbooked states. The HTTP handlers, the reminder sweep and
//! the `send-reminders` job are thin callers of its operations.

pub mod clock;
pub mod doc;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod lock;
pub mod reminders;
pub mod routes;

#[cfg(test)]
mod engine_proptest;
#[cfg(test)]
mod lock_test;
#[cfg(test)]
mod test_support;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{EngineSettings, ReminderOutcome, ReservationEngine};
pub use error::BookingError;
pub use lock::LockTable;
pub use reminders::{sweep_reminders, SweepReport};
