//! Channel that only writes events to the log.

use hms_common::models::NotificationEvent;
use hms_common::services::{BoxFuture, NotificationChannel};
use std::convert::Infallible;
use tracing::info;

/// Fallback used when no outbound channel is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChannel;

impl NotificationChannel for LogChannel {
    type Error = Infallible;

    fn name(&self) -> &'static str {
        "log"
    }

    fn send<'a>(&'a self, event: &'a NotificationEvent) -> BoxFuture<'a, (), Self::Error> {
        let recipient = event.recipient();
        match event.appointment() {
            Some(appointment) => info!(
                "Notification {} for {} <{}>: {} {}",
                event.kind(),
                recipient.name,
                recipient.email,
                appointment.date,
                appointment.start_time
            ),
            None => info!(
                "Notification {} for {} <{}>",
                event.kind(),
                recipient.name,
                recipient.email
            ),
        }
        Box::pin(async { Ok(()) })
    }
}
