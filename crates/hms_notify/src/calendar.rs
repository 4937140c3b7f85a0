// --- File: crates/hms_notify/src/calendar.rs ---
//! Google Calendar channel.
//!
//! Confirmed reservations become "Medical Appointment" events in the
//! configured calendar, with an email reminder a day ahead and a popup half
//! an hour ahead. All other events are ignored.

use google_calendar3::{
    api::{Event, EventDateTime, EventReminder, EventReminders},
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::connect::HttpConnector,
    hyper_util::client::legacy::Client,
    yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator},
    CalendarHub,
};
use hms_common::models::{AppointmentInfo, NotificationEvent};
use hms_common::services::{BoxFuture, NotificationChannel};
use hms_config::GcalConfig;
use std::{error::Error, path::Path};
use thiserror::Error;
use tracing::{debug, info};

type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;

const EVENT_SUMMARY: &str = "Medical Appointment";
const EMAIL_REMINDER_MINUTES: i32 = 24 * 60;
const POPUP_REMINDER_MINUTES: i32 = 30;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Google API Error: {0}")]
    ApiError(#[from] google_calendar3::Error),
    #[error("Calendar setup failed: {0}")]
    Setup(String),
}

pub async fn create_calendar_hub(
    config: &GcalConfig,
) -> Result<HubType, Box<dyn Error + Send + Sync>> {
    let key_path = config
        .key_path
        .as_deref()
        .ok_or("Missing key_path in GcalConfig")?;

    let sa_key = read_service_account_key(Path::new(key_path)).await?;

    let auth = ServiceAccountAuthenticator::builder(sa_key).build().await?;

    let https = HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .build();

    let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https);

    Ok(CalendarHub::new(client, auth))
}

/// Builds the calendar event for a confirmed appointment.
pub fn appointment_event(
    description: String,
    appointment: &AppointmentInfo,
    time_zone: &str,
) -> Event {
    Event {
        summary: Some(EVENT_SUMMARY.to_string()),
        description: Some(description),
        start: Some(EventDateTime {
            date_time: Some(appointment.starts_at),
            time_zone: Some(time_zone.to_string()),
            ..Default::default()
        }),
        end: Some(EventDateTime {
            date_time: Some(appointment.ends_at),
            time_zone: Some(time_zone.to_string()),
            ..Default::default()
        }),
        reminders: Some(EventReminders {
            use_default: Some(false),
            overrides: Some(vec![
                EventReminder {
                    method: Some("email".to_string()),
                    minutes: Some(EMAIL_REMINDER_MINUTES),
                },
                EventReminder {
                    method: Some("popup".to_string()),
                    minutes: Some(POPUP_REMINDER_MINUTES),
                },
            ]),
        }),
        ..Default::default()
    }
}

pub struct CalendarChannel {
    hub: HubType,
    calendar_id: String,
    time_zone: String,
}

impl CalendarChannel {
    pub fn new(hub: HubType, calendar_id: String, time_zone: String) -> Self {
        Self {
            hub,
            calendar_id,
            time_zone,
        }
    }

    pub async fn from_config(
        config: &GcalConfig,
        time_zone: &str,
    ) -> Result<Self, CalendarError> {
        let calendar_id = config.calendar_id.clone().ok_or_else(|| {
            CalendarError::Setup("Missing calendar_id in GcalConfig".to_string())
        })?;
        let hub = create_calendar_hub(config)
            .await
            .map_err(|e| CalendarError::Setup(e.to_string()))?;
        Ok(Self::new(hub, calendar_id, time_zone.to_string()))
    }

    async fn insert(&self, event: &NotificationEvent) -> Result<(), CalendarError> {
        // The clinic calendar holds one entry per appointment, so only the
        // provider side of a confirmation creates an event.
        let NotificationEvent::ProviderReservationConfirmed {
            consumer_name,
            appointment,
            ..
        } = event
        else {
            return Ok(());
        };

        let new_event = appointment_event(
            format!("Appointment with {}", consumer_name),
            appointment,
            &self.time_zone,
        );
        let (_response, created) = self
            .hub
            .events()
            .insert(new_event, &self.calendar_id)
            .doit()
            .await?;

        info!(
            "Created calendar event {:?} for reservation {}",
            created.id, appointment.reservation_id
        );
        debug!("Calendar event status: {:?}", created.status);
        Ok(())
    }
}

impl NotificationChannel for CalendarChannel {
    type Error = CalendarError;

    fn name(&self) -> &'static str {
        "gcal"
    }

    fn send<'a>(&'a self, event: &'a NotificationEvent) -> BoxFuture<'a, (), Self::Error> {
        Box::pin(self.insert(event))
    }
}
