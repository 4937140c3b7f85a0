// --- File: crates/hms_notify/src/lib.rs ---
//! Notification dispatch for the booking engine.
//!
//! The engine hands every lifecycle event to a [`NotificationDispatcher`],
//! which fans it out to the configured channels. Delivery is best effort:
//! failures and timeouts are logged and never reach the caller.

#[cfg(feature = "gcal")]
pub mod calendar;
pub mod dispatcher;
pub mod email;
pub mod log_channel;

#[cfg(test)]
mod email_test;

pub use dispatcher::NotificationDispatcher;
pub use email::{EmailError, EmailServiceChannel};
pub use log_channel::LogChannel;

#[cfg(feature = "gcal")]
pub use calendar::{create_calendar_hub, CalendarChannel, CalendarError};
