//! Fixtures shared by the unit tests of this crate.

use crate::clock::FixedClock;
use crate::engine::{EngineSettings, ReservationEngine};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use hms_common::models::{
    NewSlot, NotificationEvent, ReminderLead, Reservation, ReservedSlot, Role, Slot, UserProfile,
};
use hms_common::services::{shared_channel, BoxFuture, NotificationChannel};
use hms_db::{DbError, MemoryBookingStore, ReservationLedger, SlotRepository, UserRepository};
use hms_notify::NotificationDispatcher;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

/// 2030-01-10 08:00 UTC, a Thursday.
pub(crate) fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 10, 8, 0, 0).unwrap()
}

pub(crate) fn new_slot(day: u32, hour: u32, minute: u32) -> NewSlot {
    let start = NaiveTime::from_hms_opt(hour, minute, 0).unwrap();
    NewSlot {
        date: NaiveDate::from_ymd_opt(2030, 1, day).unwrap(),
        start_time: start,
        end_time: start + Duration::minutes(30),
    }
}

#[derive(Debug, thiserror::Error)]
#[error("channel offline")]
pub(crate) struct ChannelOffline;

/// Records every event; fails while `offline` is set.
///
/// Each send waits `delay_ms` after recording. While `hold` is set, a send
/// signals `entered` and then waits for `released`.
#[derive(Clone, Default)]
pub(crate) struct RecordingChannel {
    pub events: Arc<Mutex<Vec<NotificationEvent>>>,
    pub offline: Arc<AtomicBool>,
    pub delay_ms: Arc<AtomicU64>,
    pub hold: Arc<AtomicBool>,
    pub entered: Arc<Notify>,
    pub released: Arc<Notify>,
}

impl RecordingChannel {
    pub fn reminders(&self) -> Vec<NotificationEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, NotificationEvent::Reminder { .. }))
            .cloned()
            .collect()
    }
}

impl NotificationChannel for RecordingChannel {
    type Error = ChannelOffline;

    fn name(&self) -> &'static str {
        "recording"
    }

    fn send<'a>(&'a self, event: &'a NotificationEvent) -> BoxFuture<'a, (), Self::Error> {
        Box::pin(async move {
            if self.offline.load(Ordering::SeqCst) {
                return Err(ChannelOffline);
            }
            self.events.lock().unwrap().push(event.clone());

            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }
            if self.hold.load(Ordering::SeqCst) {
                self.entered.notify_one();
                self.released.notified().await;
            }
            Ok(())
        })
    }
}

pub(crate) struct Harness<S: hms_db::BookingStore = MemoryBookingStore> {
    pub engine: ReservationEngine<S>,
    pub clock: Arc<FixedClock>,
    pub channel: RecordingChannel,
}

pub(crate) fn harness() -> Harness<MemoryBookingStore> {
    harness_with(MemoryBookingStore::new())
}

pub(crate) fn harness_with<S: hms_db::BookingStore>(store: S) -> Harness<S> {
    let clock = Arc::new(FixedClock::new(start_time()));
    let channel = RecordingChannel::default();
    let dispatcher = Arc::new(NotificationDispatcher::new(
        vec![shared_channel(channel.clone())],
        std::time::Duration::from_secs(1),
    ));
    let engine =
        ReservationEngine::new(store, dispatcher, clock.clone(), EngineSettings::default());
    Harness {
        engine,
        clock,
        channel,
    }
}

impl<S: hms_db::BookingStore> Harness<S> {
    async fn user(&self, name: &str, role: Role) -> UserProfile {
        let profile = UserProfile {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            role,
        };
        self.engine.store().upsert_user(profile).await.unwrap()
    }

    pub async fn provider(&self, name: &str) -> UserProfile {
        self.user(name, Role::Provider).await
    }

    pub async fn consumer(&self, name: &str) -> UserProfile {
        self.user(name, Role::Consumer).await
    }

    pub async fn slot(&self, provider: &UserProfile, day: u32, hour: u32, minute: u32) -> Slot {
        self.engine
            .create_slot(provider.id, new_slot(day, hour, minute))
            .await
            .unwrap()
    }

    /// Waits until `count` events were recorded and returns them.
    pub async fn events(&self, count: usize) -> Vec<NotificationEvent> {
        for _ in 0..200 {
            if self.channel.events.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        self.channel.events.lock().unwrap().clone()
    }

    pub fn event_kinds(&self) -> Vec<&'static str> {
        self.channel
            .events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.kind())
            .collect()
    }
}

/// Memory store whose dual writes fail while `broken` is set.
#[derive(Clone, Default)]
pub(crate) struct FlakyStore {
    pub inner: MemoryBookingStore,
    pub broken: Arc<AtomicBool>,
}

impl FlakyStore {
    fn check(&self) -> Result<(), DbError> {
        if self.broken.load(Ordering::SeqCst) {
            Err(DbError::QueryError("disk I/O error".to_string()))
        } else {
            Ok(())
        }
    }
}

impl SlotRepository for FlakyStore {
    async fn init_schema(&self) -> Result<(), DbError> {
        self.inner.init_schema().await
    }

    async fn create_slot(&self, slot: Slot) -> Result<Slot, DbError> {
        self.inner.create_slot(slot).await
    }

    async fn get_slot(&self, slot_id: Uuid) -> Result<Option<Slot>, DbError> {
        self.inner.get_slot(slot_id).await
    }

    async fn delete_unbooked_slot(&self, slot_id: Uuid) -> Result<bool, DbError> {
        self.inner.delete_unbooked_slot(slot_id).await
    }

    async fn list_open_slots(
        &self,
        provider_id: Option<Uuid>,
        from_date: NaiveDate,
    ) -> Result<Vec<Slot>, DbError> {
        self.inner.list_open_slots(provider_id, from_date).await
    }

    async fn list_provider_slots(&self, provider_id: Uuid) -> Result<Vec<Slot>, DbError> {
        self.inner.list_provider_slots(provider_id).await
    }
}

impl ReservationLedger for FlakyStore {
    async fn get_reservation(&self, reservation_id: Uuid) -> Result<Option<Reservation>, DbError> {
        self.inner.get_reservation(reservation_id).await
    }

    async fn active_reservation_for_consumer(
        &self,
        consumer_id: Uuid,
    ) -> Result<Option<Reservation>, DbError> {
        self.inner.active_reservation_for_consumer(consumer_id).await
    }

    async fn reservations_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ReservedSlot>, DbError> {
        self.inner.reservations_for_provider(provider_id).await
    }

    async fn reservations_between(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<ReservedSlot>, DbError> {
        self.inner.reservations_between(from_date, to_date).await
    }

    async fn set_reminder_sent(
        &self,
        reservation_id: Uuid,
        lead: ReminderLead,
    ) -> Result<bool, DbError> {
        self.inner.set_reminder_sent(reservation_id, lead).await
    }

    async fn commit_reservation(&self, reservation: &Reservation) -> Result<(), DbError> {
        self.check()?;
        self.inner.commit_reservation(reservation).await
    }

    async fn release_reservation(&self, reservation: &Reservation) -> Result<(), DbError> {
        self.check()?;
        self.inner.release_reservation(reservation).await
    }
}

impl UserRepository for FlakyStore {
    async fn upsert_user(&self, profile: UserProfile) -> Result<UserProfile, DbError> {
        self.inner.upsert_user(profile).await
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserProfile>, DbError> {
        self.inner.get_user(user_id).await
    }
}
