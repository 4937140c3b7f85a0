// --- File: crates/hms_notify/src/email.rs ---
//! Delivery through the external email service.
//!
//! The service exposes a single `POST /send-email` endpoint and picks the
//! template from the `action` field of the JSON body.

use hms_common::models::{AppointmentInfo, NotificationEvent};
use hms_common::services::{BoxFuture, NotificationChannel};
use hms_common::create_client;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("HTTP error calling email service: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Email service returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Request body understood by the email service.
#[derive(Serialize, Debug, PartialEq)]
pub struct EmailRequest<'a> {
    pub action: &'static str,
    pub recipient_email: &'a str,
    pub recipient_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_before: Option<i64>,
}

impl<'a> EmailRequest<'a> {
    fn base(action: &'static str, event: &'a NotificationEvent) -> Self {
        let recipient = event.recipient();
        let appointment = event.appointment();
        Self {
            action,
            recipient_email: &recipient.email,
            recipient_name: &recipient.name,
            role: None,
            doctor_name: None,
            patient_name: None,
            date: appointment.map(|a| a.date.to_string()),
            time: appointment.map(start_time),
            hours_before: None,
        }
    }

    /// Builds the request for `event`.
    pub fn from_event(event: &'a NotificationEvent) -> Self {
        match event {
            NotificationEvent::Welcome { role, .. } => Self {
                role: Some(role.display_name()),
                ..Self::base("SIGNUP_WELCOME", event)
            },
            NotificationEvent::ReservationConfirmed { provider_name, .. } => Self {
                doctor_name: Some(provider_name.as_str()),
                ..Self::base("BOOKING_CONFIRMATION", event)
            },
            NotificationEvent::ProviderReservationConfirmed { consumer_name, .. } => Self {
                patient_name: Some(consumer_name.as_str()),
                ..Self::base("BOOKING_CONFIRMATION_DOCTOR", event)
            },
            NotificationEvent::ReservationCancelled { provider_name, .. } => Self {
                doctor_name: Some(provider_name.as_str()),
                ..Self::base("BOOKING_CANCELLED", event)
            },
            NotificationEvent::Reminder {
                provider_name,
                lead,
                ..
            } => Self {
                doctor_name: Some(provider_name.as_str()),
                hours_before: Some(lead.hours()),
                ..Self::base("APPOINTMENT_REMINDER", event)
            },
        }
    }
}

// Wall clock start as HH:MM:SS
fn start_time(appointment: &AppointmentInfo) -> String {
    appointment.start_time.format("%H:%M:%S").to_string()
}

/// Channel posting events to the email service.
#[derive(Debug, Clone)]
pub struct EmailServiceChannel {
    client: Client,
    endpoint: String,
}

impl EmailServiceChannel {
    /// Create a channel for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, EmailError> {
        let client = create_client(timeout_secs, false)?;
        Ok(Self {
            client,
            endpoint: format!("{}/send-email", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, event: &NotificationEvent) -> Result<(), EmailError> {
        let request = EmailRequest::from_event(event);
        debug!(
            "Sending {} email to {}",
            request.action, request.recipient_email
        );

        let resp = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("Email service returned {}: {}", status, body);
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl NotificationChannel for EmailServiceChannel {
    type Error = EmailError;

    fn name(&self) -> &'static str {
        "email"
    }

    fn send<'a>(&'a self, event: &'a NotificationEvent) -> BoxFuture<'a, (), Self::Error> {
        Box::pin(self.post(event))
    }
}
