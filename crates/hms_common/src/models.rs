// --- File: crates/hms_common/src/models.rs ---
//! Domain data structures shared by the booking, persistence and
//! notification crates.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role of an authenticated user.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Offers slots (a doctor).
    Provider,
    /// Reserves slots (a patient).
    Consumer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Provider => "provider",
            Role::Consumer => "consumer",
        }
    }

    /// Human readable role name used in outgoing messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Provider => "Doctor",
            Role::Consumer => "Patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "provider" | "doctor" => Ok(Role::Provider),
            "consumer" | "patient" => Ok(Role::Consumer),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Identity data needed to address a user in notifications.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

impl UserProfile {
    pub fn recipient(&self) -> Recipient {
        Recipient {
            name: self.full_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Converts a provider-local wall clock date and time to UTC.
///
/// Ambiguous local times (clocks turned back) resolve to the earlier
/// instant. Local times skipped by a DST transition are read as UTC.
pub fn local_to_utc(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

/// A bookable time interval owned by a provider.
///
/// `date`, `start_time` and `end_time` are wall clock values in the clinic
/// time zone.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub booked: bool,
    pub created_at: DateTime<Utc>,
}

impl Slot {
    pub fn new(provider_id: Uuid, new_slot: &NewSlot, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_id,
            date: new_slot.date,
            start_time: new_slot.start_time,
            end_time: new_slot.end_time,
            booked: false,
            created_at,
        }
    }

    pub fn starts_at(&self, tz: Tz) -> DateTime<Utc> {
        local_to_utc(tz, self.date, self.start_time)
    }

    pub fn ends_at(&self, tz: Tz) -> DateTime<Utc> {
        local_to_utc(tz, self.date, self.end_time)
    }

    /// True when the slot starts strictly after `now`.
    pub fn is_future(&self, now: DateTime<Utc>, tz: Tz) -> bool {
        self.starts_at(tz) > now
    }

    pub fn can_be_reserved(&self, now: DateTime<Utc>, tz: Tz) -> bool {
        !self.booked && self.is_future(now, tz)
    }
}

/// Provider input for publishing a slot.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSlot {
    #[cfg_attr(feature = "openapi", schema(example = "2030-01-11"))]
    pub date: NaiveDate,
    #[cfg_attr(feature = "openapi", schema(example = "10:00:00"))]
    pub start_time: NaiveTime,
    #[cfg_attr(feature = "openapi", schema(example = "10:30:00"))]
    pub end_time: NaiveTime,
}

/// Reminder classes, named by their lead time.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReminderLead {
    #[serde(rename = "24h")]
    DayBefore,
    #[serde(rename = "1h")]
    HourBefore,
}

impl ReminderLead {
    pub const ALL: [ReminderLead; 2] = [ReminderLead::DayBefore, ReminderLead::HourBefore];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderLead::DayBefore => "24h",
            ReminderLead::HourBefore => "1h",
        }
    }

    /// Nominal lead time in hours.
    pub fn hours(&self) -> i64 {
        match self {
            ReminderLead::DayBefore => 24,
            ReminderLead::HourBefore => 1,
        }
    }
}

impl fmt::Display for ReminderLead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderLead {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24h" => Ok(ReminderLead::DayBefore),
            "1h" => Ok(ReminderLead::HourBefore),
            other => Err(format!("unknown reminder type: {} (expected 24h or 1h)", other)),
        }
    }
}

/// The binding of one consumer to one slot.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub consumer_id: Uuid,
    pub provider_id: Uuid,
    pub slot_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub reminder_sent_24h: bool,
    pub reminder_sent_1h: bool,
}

impl Reservation {
    /// A fresh reservation of `slot` for `consumer_id`, with no reminders sent.
    pub fn for_slot(consumer_id: Uuid, slot: &Slot, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            consumer_id,
            provider_id: slot.provider_id,
            slot_id: slot.id,
            created_at,
            reminder_sent_24h: false,
            reminder_sent_1h: false,
        }
    }

    pub fn reminder_sent(&self, lead: ReminderLead) -> bool {
        match lead {
            ReminderLead::DayBefore => self.reminder_sent_24h,
            ReminderLead::HourBefore => self.reminder_sent_1h,
        }
    }

    /// Sets the flag for `lead`. Flags are never cleared.
    pub fn set_reminder_sent(&mut self, lead: ReminderLead) {
        match lead {
            ReminderLead::DayBefore => self.reminder_sent_24h = true,
            ReminderLead::HourBefore => self.reminder_sent_1h = true,
        }
    }
}

/// A reservation joined with the slot it holds.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedSlot {
    pub reservation: Reservation,
    pub slot: Slot,
}

/// Provider dashboard counters.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOverview {
    pub slots_count: usize,
    pub booked_slots_count: usize,
    pub available_slots_count: usize,
    pub total_bookings: usize,
    /// Newest first.
    pub recent_bookings: Vec<ReservedSlot>,
}

/// Addressee of a notification.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

/// Appointment details carried by booking related notifications.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentInfo {
    pub reservation_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl AppointmentInfo {
    pub fn new(reservation: &Reservation, slot: &Slot, tz: Tz) -> Self {
        Self {
            reservation_id: reservation.id,
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            starts_at: slot.starts_at(tz),
            ends_at: slot.ends_at(tz),
        }
    }
}

/// The closed set of events the notification dispatcher accepts.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
    Welcome {
        recipient: Recipient,
        role: Role,
    },
    /// Sent to the consumer.
    ReservationConfirmed {
        recipient: Recipient,
        provider_name: String,
        appointment: AppointmentInfo,
    },
    /// Sent to the provider.
    ProviderReservationConfirmed {
        recipient: Recipient,
        consumer_name: String,
        appointment: AppointmentInfo,
    },
    ReservationCancelled {
        recipient: Recipient,
        provider_name: String,
        appointment: AppointmentInfo,
    },
    Reminder {
        recipient: Recipient,
        provider_name: String,
        lead: ReminderLead,
        appointment: AppointmentInfo,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::Welcome { .. } => "welcome",
            NotificationEvent::ReservationConfirmed { .. } => "reservation_confirmed",
            NotificationEvent::ProviderReservationConfirmed { .. } => {
                "provider_reservation_confirmed"
            }
            NotificationEvent::ReservationCancelled { .. } => "reservation_cancelled",
            NotificationEvent::Reminder { .. } => "reminder",
        }
    }

    pub fn recipient(&self) -> &Recipient {
        match self {
            NotificationEvent::Welcome { recipient, .. }
            | NotificationEvent::ReservationConfirmed { recipient, .. }
            | NotificationEvent::ProviderReservationConfirmed { recipient, .. }
            | NotificationEvent::ReservationCancelled { recipient, .. }
            | NotificationEvent::Reminder { recipient, .. } => recipient,
        }
    }

    pub fn appointment(&self) -> Option<&AppointmentInfo> {
        match self {
            NotificationEvent::Welcome { .. } => None,
            NotificationEvent::ReservationConfirmed { appointment, .. }
            | NotificationEvent::ProviderReservationConfirmed { appointment, .. }
            | NotificationEvent::ReservationCancelled { appointment, .. }
            | NotificationEvent::Reminder { appointment, .. } => Some(appointment),
        }
    }
}
