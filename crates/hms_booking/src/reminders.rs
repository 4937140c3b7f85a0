// --- File: crates/hms_booking/src/reminders.rs ---
//! One pass of the reminder job.
//!
//! The engine never schedules itself. A caller (the `send-reminders` binary,
//! the backend's periodic task or the admin endpoint) runs
//! [`sweep_reminders`] for each lead class.

use crate::engine::{ReminderOutcome, ReservationEngine};
use crate::error::BookingError;
use hms_common::models::ReminderLead;
use hms_db::BookingStore;
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of one sweep.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub lead: ReminderLead,
    /// Reservations that were due.
    pub due: usize,
    /// Reminders delivered and flagged.
    pub sent: usize,
}

/// Sends every due `lead` reminder and flags the ones that were delivered.
///
/// A reminder that could not be delivered keeps its flag unset and is
/// retried on the next sweep. Reservations cancelled while the sweep runs
/// are skipped.
pub async fn sweep_reminders<S: BookingStore>(
    engine: &ReservationEngine<S>,
    lead: ReminderLead,
) -> Result<SweepReport, BookingError> {
    let now = engine.now();
    let mut report = SweepReport {
        lead,
        due: 0,
        sent: 0,
    };

    for reserved in engine.due_reminders(now, lead).await? {
        report.due += 1;
        let reservation_id = reserved.reservation.id;

        match engine.send_reminder(reservation_id, lead).await? {
            ReminderOutcome::Sent => report.sent += 1,
            outcome => debug!("{} reminder for {}: {:?}", lead, reservation_id, outcome),
        }
    }

    info!(
        "Reminder sweep {}: {} due, {} sent",
        lead, report.due, report.sent
    );
    Ok(report)
}
