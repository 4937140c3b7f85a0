// --- File: crates/hms_notify/src/dispatcher.rs ---
//! Fan-out of notification events to the configured channels.

use crate::email::EmailServiceChannel;
use crate::log_channel::LogChannel;
use hms_common::models::NotificationEvent;
use hms_common::services::{shared_channel, SharedChannel};
use hms_common::{is_email_enabled, is_gcal_enabled};
use hms_config::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Best-effort dispatcher. Never returns an error to its caller.
pub struct NotificationDispatcher {
    channels: Vec<SharedChannel>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<SharedChannel>, timeout: Duration) -> Self {
        Self { channels, timeout }
    }

    /// Builds the channel set from the runtime flags and their sections.
    ///
    /// A channel that cannot be set up is logged and left out. When nothing
    /// is enabled, events go to the log.
    pub async fn from_config(config: &AppConfig) -> Self {
        let timeout_secs = config.notifications.timeout_secs;
        let mut channels: Vec<SharedChannel> = Vec::new();

        if is_email_enabled(config) {
            if let Some(url) = config.notifications.email_service_url.as_deref() {
                match EmailServiceChannel::new(url, timeout_secs) {
                    Ok(channel) => {
                        info!("Email notifications enabled ({})", channel.endpoint());
                        channels.push(shared_channel(channel));
                    }
                    Err(e) => error!("Failed to set up email channel: {}", e),
                }
            }
        }

        if is_gcal_enabled(config) {
            #[cfg(feature = "gcal")]
            if let Some(gcal_config) = config.gcal.as_ref() {
                match crate::calendar::CalendarChannel::from_config(
                    gcal_config,
                    &config.booking.time_zone,
                )
                .await
                {
                    Ok(channel) => {
                        info!("Google Calendar notifications enabled");
                        channels.push(shared_channel(channel));
                    }
                    Err(e) => error!("Failed to set up calendar channel: {}", e),
                }
            }
            #[cfg(not(feature = "gcal"))]
            warn!("use_gcal is set but the gcal feature is not compiled in");
        }

        if channels.is_empty() {
            info!("No outbound notification channel configured, logging events only");
            channels.push(shared_channel(LogChannel));
        }

        Self::new(channels, Duration::from_secs(timeout_secs))
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Sends `event` on a background task and returns immediately.
    ///
    /// Outside a tokio runtime the event is dropped with a warning.
    pub fn dispatch(self: &Arc<Self>, event: NotificationEvent) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime, dropping {} notification", event.kind());
                return;
            }
        };
        let dispatcher = Arc::clone(self);
        handle.spawn(async move {
            dispatcher.deliver(&event).await;
        });
    }

    /// Sends `event` on every channel and waits for the outcome.
    ///
    /// Returns true only if there is at least one channel and each of them
    /// succeeded within the timeout.
    pub async fn deliver(&self, event: &NotificationEvent) -> bool {
        if self.channels.is_empty() {
            warn!("No notification channel for {} event", event.kind());
            return false;
        }

        let mut delivered = true;
        for channel in &self.channels {
            match tokio::time::timeout(self.timeout, channel.send(event)).await {
                Ok(Ok(())) => debug!("{} event sent via {}", event.kind(), channel.name()),
                Ok(Err(e)) => {
                    error!(
                        "{} notification via {} failed: {}",
                        event.kind(),
                        channel.name(),
                        e
                    );
                    delivered = false;
                }
                Err(_) => {
                    warn!(
                        "{} notification via {} timed out after {:?}",
                        event.kind(),
                        channel.name(),
                        self.timeout
                    );
                    delivered = false;
                }
            }
        }
        delivered
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("channels", &self.channel_names())
            .field("timeout", &self.timeout)
            .finish()
    }
}
