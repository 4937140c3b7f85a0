// --- File: crates/hms_booking/src/engine.rs ---
//! The reservation engine.
//!
//! Every slot state transition goes through [`ReservationEngine::reserve`] or
//! [`ReservationEngine::cancel`]. Both take the consumer lock and then the
//! slot lock, re-read the authoritative state under those locks and apply the
//! slot flag and the ledger entry through one dual write of the store.
//! Notifications are built and dispatched after the locks are released.

use crate::clock::Clock;
use crate::error::BookingError;
use crate::lock::LockTable;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use hms_common::models::{
    AppointmentInfo, NewSlot, NotificationEvent, ProviderOverview, ReminderLead, Reservation,
    ReservedSlot, Slot, UserProfile,
};
use hms_common::HmsError;
use hms_config::BookingConfig;
use hms_db::{BookingStore, DbError};
use hms_notify::NotificationDispatcher;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Bookings listed on the provider overview.
const RECENT_BOOKINGS: usize = 5;

/// What [`ReservationEngine::send_reminder`] did with one due reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderOutcome {
    /// Delivered and flagged.
    Sent,
    /// Flagged by an earlier or concurrent sweep.
    AlreadySent,
    /// The reservation was cancelled before it could be flagged.
    Cancelled,
    /// A party's profile is missing.
    NoProfiles,
    /// Every channel was tried and at least one failed; stays due.
    NotDelivered,
}

/// Engine settings derived from the `[booking]` configuration section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Zone the slot dates and times are expressed in.
    pub time_zone: Tz,
    /// Window of the short reminder class.
    pub hour_reminder_lead: Duration,
}

impl EngineSettings {
    pub fn from_config(config: &BookingConfig) -> Result<Self, HmsError> {
        let time_zone = Tz::from_str(&config.time_zone).map_err(|e| {
            HmsError::ConfigError(format!("Invalid time zone {}: {}", config.time_zone, e))
        })?;
        if config.hour_reminder_lead_hours <= 0 {
            return Err(HmsError::ConfigError(
                "hour_reminder_lead_hours must be positive".to_string(),
            ));
        }
        Ok(Self {
            time_zone,
            hour_reminder_lead: Duration::hours(config.hour_reminder_lead_hours),
        })
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            time_zone: Tz::UTC,
            hour_reminder_lead: Duration::hours(1),
        }
    }
}

pub struct ReservationEngine<S: BookingStore> {
    store: S,
    notifier: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    settings: EngineSettings,
    consumer_locks: LockTable<Uuid>,
    slot_locks: LockTable<Uuid>,
    reminder_locks: LockTable<(Uuid, ReminderLead)>,
}

impl<S: BookingStore> ReservationEngine<S> {
    pub fn new(
        store: S,
        notifier: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            settings,
            consumer_locks: LockTable::new(),
            slot_locks: LockTable::new(),
            reminder_locks: LockTable::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<NotificationDispatcher> {
        &self.notifier
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.settings.time_zone).date_naive()
    }

    fn appointment(&self, reservation: &Reservation, slot: &Slot) -> AppointmentInfo {
        AppointmentInfo::new(reservation, slot, self.settings.time_zone)
    }

    // --- Users ---

    /// Stores `profile` and sends the welcome notice.
    pub async fn register_user(&self, profile: UserProfile) -> Result<UserProfile, BookingError> {
        let profile = self.store.upsert_user(profile).await?;
        info!("Registered {} {}", profile.role, profile.id);

        self.notifier.dispatch(NotificationEvent::Welcome {
            recipient: profile.recipient(),
            role: profile.role,
        });
        Ok(profile)
    }

    // --- Slots ---

    pub async fn create_slot(
        &self,
        provider_id: Uuid,
        new_slot: NewSlot,
    ) -> Result<Slot, BookingError> {
        let now = self.now();
        let slot = Slot::new(provider_id, &new_slot, now);

        if !slot.is_future(now, self.settings.time_zone) {
            return Err(BookingError::Validation(
                "Slot date must be in the future.".to_string(),
            ));
        }
        if slot.start_time >= slot.end_time {
            return Err(BookingError::Validation(
                "Start time must be before end time.".to_string(),
            ));
        }

        match self.store.create_slot(slot).await {
            Ok(slot) => {
                info!(
                    "Provider {} published slot {} ({} {}-{})",
                    provider_id, slot.id, slot.date, slot.start_time, slot.end_time
                );
                Ok(slot)
            }
            Err(DbError::Conflict(_)) => Err(BookingError::DuplicateSlot),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes an unbooked slot owned by `provider_id`.
    pub async fn delete_slot(&self, provider_id: Uuid, slot_id: Uuid) -> Result<(), BookingError> {
        let _slot_guard = self.slot_locks.lock(slot_id).await;

        let slot = self
            .store
            .get_slot(slot_id)
            .await?
            .filter(|slot| slot.provider_id == provider_id)
            .ok_or_else(BookingError::slot_not_found)?;
        if slot.booked {
            return Err(BookingError::SlotInUse);
        }

        match self.store.delete_unbooked_slot(slot_id).await {
            Ok(true) => {
                info!("Provider {} deleted slot {}", provider_id, slot_id);
                Ok(())
            }
            Ok(false) => Err(BookingError::slot_not_found()),
            Err(DbError::Conflict(_)) => Err(BookingError::SlotInUse),
            Err(e) => Err(e.into()),
        }
    }

    /// Unbooked slots that can still be reserved, ordered by date and start.
    pub async fn open_slots(&self, provider_id: Option<Uuid>) -> Result<Vec<Slot>, BookingError> {
        let now = self.now();
        let tz = self.settings.time_zone;
        let mut slots = self.store.list_open_slots(provider_id, self.today()).await?;
        slots.retain(|slot| slot.can_be_reserved(now, tz));
        Ok(slots)
    }

    pub async fn provider_slots(&self, provider_id: Uuid) -> Result<Vec<Slot>, BookingError> {
        Ok(self.store.list_provider_slots(provider_id).await?)
    }

    /// Reservations of `provider_id`, newest first.
    pub async fn provider_reservations(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ReservedSlot>, BookingError> {
        Ok(self.store.reservations_for_provider(provider_id).await?)
    }

    pub async fn provider_overview(
        &self,
        provider_id: Uuid,
    ) -> Result<ProviderOverview, BookingError> {
        let slots = self.store.list_provider_slots(provider_id).await?;
        let mut reservations = self.store.reservations_for_provider(provider_id).await?;

        let booked_slots_count = slots.iter().filter(|slot| slot.booked).count();
        let total_bookings = reservations.len();
        reservations.truncate(RECENT_BOOKINGS);

        Ok(ProviderOverview {
            slots_count: slots.len(),
            booked_slots_count,
            available_slots_count: slots.len() - booked_slots_count,
            total_bookings,
            recent_bookings: reservations,
        })
    }

    pub async fn reservation_for_consumer(
        &self,
        consumer_id: Uuid,
    ) -> Result<Option<ReservedSlot>, BookingError> {
        let Some(reservation) = self.store.active_reservation_for_consumer(consumer_id).await?
        else {
            return Ok(None);
        };
        let slot = self
            .store
            .get_slot(reservation.slot_id)
            .await?
            .ok_or_else(BookingError::slot_not_found)?;
        Ok(Some(ReservedSlot { reservation, slot }))
    }

    // --- Reservations ---

    /// Reserves `slot_id` for `consumer_id`.
    ///
    /// # Errors
    ///
    /// * `AlreadyReserved` when the consumer holds a reservation
    /// * `NotFound` when the slot does not exist
    /// * `SlotUnavailable` when the slot is booked or has already started
    /// * `TransientStore` when the store fails; nothing is written then
    pub async fn reserve(
        &self,
        consumer_id: Uuid,
        slot_id: Uuid,
    ) -> Result<Reservation, BookingError> {
        if self
            .store
            .active_reservation_for_consumer(consumer_id)
            .await?
            .is_some()
        {
            debug!("Consumer {} already holds a reservation", consumer_id);
            return Err(BookingError::AlreadyReserved);
        }
        if self.store.get_slot(slot_id).await?.is_none() {
            return Err(BookingError::slot_not_found());
        }

        let consumer_guard = self.consumer_locks.lock(consumer_id).await;
        let slot_guard = self.slot_locks.lock(slot_id).await;

        let committed = self.reserve_locked(consumer_id, slot_id).await;

        drop(slot_guard);
        drop(consumer_guard);

        let (reservation, slot) = committed?;
        info!(
            "Consumer {} reserved slot {} ({})",
            consumer_id, slot.id, reservation.id
        );
        self.notify_confirmed(&reservation, &slot).await;
        Ok(reservation)
    }

    async fn reserve_locked(
        &self,
        consumer_id: Uuid,
        slot_id: Uuid,
    ) -> Result<(Reservation, Slot), BookingError> {
        if self
            .store
            .active_reservation_for_consumer(consumer_id)
            .await?
            .is_some()
        {
            return Err(BookingError::AlreadyReserved);
        }

        let slot = self
            .store
            .get_slot(slot_id)
            .await?
            .ok_or_else(BookingError::slot_not_found)?;
        let now = self.now();
        if slot.booked {
            debug!("Slot {} rejected for {}: already booked", slot_id, consumer_id);
            return Err(BookingError::SlotUnavailable);
        }
        if !slot.is_future(now, self.settings.time_zone) {
            debug!("Slot {} rejected for {}: already started", slot_id, consumer_id);
            return Err(BookingError::SlotUnavailable);
        }

        let reservation = Reservation::for_slot(consumer_id, &slot, now);
        match self.store.commit_reservation(&reservation).await {
            Ok(()) => Ok((reservation, Slot { booked: true, ..slot })),
            Err(DbError::Conflict(reason)) => {
                // Lost against a writer outside this engine
                debug!("Commit for slot {} rejected: {}", slot_id, reason);
                if self
                    .store
                    .active_reservation_for_consumer(consumer_id)
                    .await?
                    .is_some()
                {
                    Err(BookingError::AlreadyReserved)
                } else {
                    Err(BookingError::SlotUnavailable)
                }
            }
            Err(DbError::NotFound(_)) => Err(BookingError::slot_not_found()),
            Err(e) => {
                error!("Commit for slot {} failed: {}", slot_id, e);
                Err(BookingError::TransientStore(e.to_string()))
            }
        }
    }

    /// Cancels the active reservation of `consumer_id` and frees its slot.
    ///
    /// Returns the removed reservation. Cancelling twice yields `NotFound`.
    pub async fn cancel(&self, consumer_id: Uuid) -> Result<Reservation, BookingError> {
        let consumer_guard = self.consumer_locks.lock(consumer_id).await;

        let reservation = self
            .store
            .active_reservation_for_consumer(consumer_id)
            .await?
            .ok_or_else(BookingError::reservation_not_found)?;
        let slot_guard = self.slot_locks.lock(reservation.slot_id).await;

        // Snapshot the slot for the notice while the reservation still exists
        let slot = self
            .store
            .get_slot(reservation.slot_id)
            .await?
            .ok_or_else(BookingError::slot_not_found)?;

        let released = match self.store.release_reservation(&reservation).await {
            Ok(()) => Ok(()),
            Err(DbError::NotFound(_)) => Err(BookingError::reservation_not_found()),
            Err(e) => {
                error!("Release of reservation {} failed: {}", reservation.id, e);
                Err(BookingError::TransientStore(e.to_string()))
            }
        };

        drop(slot_guard);
        drop(consumer_guard);

        released?;
        info!(
            "Consumer {} cancelled reservation {} (slot {})",
            consumer_id, reservation.id, slot.id
        );
        self.notify_cancelled(&reservation, &slot).await;
        Ok(reservation)
    }

    // --- Reminders ---

    /// Reservations due for a `lead` reminder at `now` whose flag is not set.
    ///
    /// `HourBefore` matches slots starting within `[now, now + lead]`.
    /// `DayBefore` matches slots dated on the local calendar day of
    /// `now + 24h`. The result is computed from the store on every call.
    pub async fn due_reminders(
        &self,
        now: DateTime<Utc>,
        lead: ReminderLead,
    ) -> Result<impl Iterator<Item = ReservedSlot> + Send, BookingError> {
        let tz = self.settings.time_zone;
        let day_before_date = (now + Duration::hours(ReminderLead::DayBefore.hours()))
            .with_timezone(&tz)
            .date_naive();
        let window_end = now + self.settings.hour_reminder_lead;

        let rows = match lead {
            ReminderLead::DayBefore => {
                self.store
                    .reservations_between(day_before_date, day_before_date)
                    .await?
            }
            ReminderLead::HourBefore => {
                self.store
                    .reservations_between(
                        now.with_timezone(&tz).date_naive(),
                        window_end.with_timezone(&tz).date_naive(),
                    )
                    .await?
            }
        };

        Ok(rows.into_iter().filter(move |rs| {
            if rs.reservation.reminder_sent(lead) {
                return false;
            }
            match lead {
                ReminderLead::DayBefore => rs.slot.date == day_before_date,
                ReminderLead::HourBefore => {
                    let starts_at = rs.slot.starts_at(tz);
                    starts_at >= now && starts_at <= window_end
                }
            }
        }))
    }

    /// Sets the `lead` reminder flag. Setting it again is a no-op.
    pub async fn mark_reminder_sent(
        &self,
        reservation_id: Uuid,
        lead: ReminderLead,
    ) -> Result<(), BookingError> {
        if self.store.set_reminder_sent(reservation_id, lead).await? {
            debug!("Marked {} reminder sent for {}", lead, reservation_id);
            Ok(())
        } else {
            Err(BookingError::reservation_not_found())
        }
    }

    /// Delivers the `lead` reminder of one reservation and flags it.
    ///
    /// Runs under a per reservation and lead lock and re-reads the flag
    /// under it, so overlapping sweeps deliver each reminder at most once.
    pub async fn send_reminder(
        &self,
        reservation_id: Uuid,
        lead: ReminderLead,
    ) -> Result<ReminderOutcome, BookingError> {
        let _reminder_guard = self.reminder_locks.lock((reservation_id, lead)).await;

        let Some(reservation) = self.store.get_reservation(reservation_id).await? else {
            debug!("Reservation {} gone before its {} reminder", reservation_id, lead);
            return Ok(ReminderOutcome::Cancelled);
        };
        if reservation.reminder_sent(lead) {
            return Ok(ReminderOutcome::AlreadySent);
        }
        let Some(slot) = self.store.get_slot(reservation.slot_id).await? else {
            return Ok(ReminderOutcome::Cancelled);
        };

        let reserved = ReservedSlot { reservation, slot };
        let Some(event) = self.reminder_event(&reserved, lead).await? else {
            return Ok(ReminderOutcome::NoProfiles);
        };
        if !self.notifier.deliver(&event).await {
            warn!("{} reminder for {} not delivered", lead, reservation_id);
            return Ok(ReminderOutcome::NotDelivered);
        }

        match self.mark_reminder_sent(reservation_id, lead).await {
            Ok(()) => Ok(ReminderOutcome::Sent),
            Err(BookingError::NotFound(_)) => {
                debug!(
                    "Reservation {} cancelled during its {} reminder",
                    reservation_id, lead
                );
                Ok(ReminderOutcome::Cancelled)
            }
            Err(err) => Err(err),
        }
    }

    /// The reminder notice for one due reservation, if both parties are known.
    pub async fn reminder_event(
        &self,
        reserved: &ReservedSlot,
        lead: ReminderLead,
    ) -> Result<Option<NotificationEvent>, BookingError> {
        let reservation = &reserved.reservation;
        let consumer = self.store.get_user(reservation.consumer_id).await?;
        let provider = self.store.get_user(reservation.provider_id).await?;
        let (Some(consumer), Some(provider)) = (consumer, provider) else {
            warn!("No profiles for reservation {}, no reminder", reservation.id);
            return Ok(None);
        };

        Ok(Some(NotificationEvent::Reminder {
            recipient: consumer.recipient(),
            provider_name: provider.full_name,
            lead,
            appointment: self.appointment(reservation, &reserved.slot),
        }))
    }

    // --- Notifications ---

    async fn parties(&self, reservation: &Reservation) -> Option<(UserProfile, UserProfile)> {
        let consumer = self.store.get_user(reservation.consumer_id).await;
        let provider = self.store.get_user(reservation.provider_id).await;
        match (consumer, provider) {
            (Ok(Some(consumer)), Ok(Some(provider))) => Some((consumer, provider)),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Profile lookup for {} failed: {}", reservation.id, e);
                None
            }
            _ => {
                warn!("No profiles for reservation {}, no notice", reservation.id);
                None
            }
        }
    }

    async fn notify_confirmed(&self, reservation: &Reservation, slot: &Slot) {
        let Some((consumer, provider)) = self.parties(reservation).await else {
            return;
        };
        let appointment = self.appointment(reservation, slot);

        self.notifier.dispatch(NotificationEvent::ReservationConfirmed {
            recipient: consumer.recipient(),
            provider_name: provider.full_name.clone(),
            appointment: appointment.clone(),
        });
        self.notifier
            .dispatch(NotificationEvent::ProviderReservationConfirmed {
                recipient: provider.recipient(),
                consumer_name: consumer.full_name,
                appointment,
            });
    }

    async fn notify_cancelled(&self, reservation: &Reservation, slot: &Slot) {
        let Some((consumer, provider)) = self.parties(reservation).await else {
            return;
        };
        self.notifier.dispatch(NotificationEvent::ReservationCancelled {
            recipient: consumer.recipient(),
            provider_name: provider.full_name,
            appointment: self.appointment(reservation, slot),
        });
    }
}
