//! In-memory implementation of the booking store
//!
//! All collections live behind a single lock, so the dual writes are applied
//! under one write guard and are never observable half-done. Used when no
//! database is configured and throughout the test suites.

use crate::error::DbError;
use crate::repositories::{ReservationLedger, SlotRepository, UserRepository};
use chrono::NaiveDate;
use hms_common::models::{ReminderLead, Reservation, ReservedSlot, Slot, UserProfile};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    slots: HashMap<Uuid, Slot>,
    reservations: HashMap<Uuid, Reservation>,
    users: HashMap<Uuid, UserProfile>,
}

impl State {
    fn joined(&self, reservation: &Reservation) -> Option<ReservedSlot> {
        self.slots.get(&reservation.slot_id).map(|slot| ReservedSlot {
            reservation: reservation.clone(),
            slot: slot.clone(),
        })
    }
}

/// Process-local booking store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBookingStore {
    state: Arc<RwLock<State>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, DbError> {
        self.state
            .read()
            .map_err(|_| DbError::Other("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, DbError> {
        self.state
            .write()
            .map_err(|_| DbError::Other("memory store lock poisoned".to_string()))
    }

    /// Every stored slot, in no particular order.
    pub fn all_slots(&self) -> Result<Vec<Slot>, DbError> {
        Ok(self.read()?.slots.values().cloned().collect())
    }

    /// Every active reservation, in no particular order.
    pub fn all_reservations(&self) -> Result<Vec<Reservation>, DbError> {
        Ok(self.read()?.reservations.values().cloned().collect())
    }
}

fn sort_by_schedule(slots: &mut [Slot]) {
    slots.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
}

impl SlotRepository for MemoryBookingStore {
    async fn init_schema(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn create_slot(&self, slot: Slot) -> Result<Slot, DbError> {
        let mut state = self.write()?;
        let duplicate = state.slots.values().any(|existing| {
            existing.provider_id == slot.provider_id
                && existing.date == slot.date
                && existing.start_time == slot.start_time
                && existing.end_time == slot.end_time
        });
        if duplicate || state.slots.contains_key(&slot.id) {
            return Err(DbError::Conflict(format!(
                "slot {} {}-{} already exists for provider {}",
                slot.date, slot.start_time, slot.end_time, slot.provider_id
            )));
        }
        state.slots.insert(slot.id, slot.clone());
        Ok(slot)
    }

    async fn get_slot(&self, slot_id: Uuid) -> Result<Option<Slot>, DbError> {
        Ok(self.read()?.slots.get(&slot_id).cloned())
    }

    async fn delete_unbooked_slot(&self, slot_id: Uuid) -> Result<bool, DbError> {
        let mut state = self.write()?;
        match state.slots.get(&slot_id) {
            None => Ok(false),
            Some(slot) if slot.booked => {
                Err(DbError::Conflict(format!("slot {} is booked", slot_id)))
            }
            Some(_) => {
                state.slots.remove(&slot_id);
                Ok(true)
            }
        }
    }

    async fn list_open_slots(
        &self,
        provider_id: Option<Uuid>,
        from_date: NaiveDate,
    ) -> Result<Vec<Slot>, DbError> {
        let state = self.read()?;
        let mut slots: Vec<Slot> = state
            .slots
            .values()
            .filter(|slot| !slot.booked && slot.date >= from_date)
            .filter(|slot| provider_id.map_or(true, |id| slot.provider_id == id))
            .cloned()
            .collect();
        sort_by_schedule(&mut slots);
        Ok(slots)
    }

    async fn list_provider_slots(&self, provider_id: Uuid) -> Result<Vec<Slot>, DbError> {
        let state = self.read()?;
        let mut slots: Vec<Slot> = state
            .slots
            .values()
            .filter(|slot| slot.provider_id == provider_id)
            .cloned()
            .collect();
        sort_by_schedule(&mut slots);
        Ok(slots)
    }
}

impl ReservationLedger for MemoryBookingStore {
    async fn get_reservation(&self, reservation_id: Uuid) -> Result<Option<Reservation>, DbError> {
        Ok(self.read()?.reservations.get(&reservation_id).cloned())
    }

    async fn active_reservation_for_consumer(
        &self,
        consumer_id: Uuid,
    ) -> Result<Option<Reservation>, DbError> {
        Ok(self
            .read()?
            .reservations
            .values()
            .find(|r| r.consumer_id == consumer_id)
            .cloned())
    }

    async fn reservations_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ReservedSlot>, DbError> {
        let state = self.read()?;
        let mut reserved: Vec<ReservedSlot> = state
            .reservations
            .values()
            .filter(|r| r.provider_id == provider_id)
            .filter_map(|r| state.joined(r))
            .collect();
        reserved.sort_by(|a, b| b.reservation.created_at.cmp(&a.reservation.created_at));
        Ok(reserved)
    }

    async fn reservations_between(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<ReservedSlot>, DbError> {
        let state = self.read()?;
        let mut reserved: Vec<ReservedSlot> = state
            .reservations
            .values()
            .filter_map(|r| state.joined(r))
            .filter(|rs| rs.slot.date >= from_date && rs.slot.date <= to_date)
            .collect();
        reserved.sort_by(|a, b| {
            (a.slot.date, a.slot.start_time).cmp(&(b.slot.date, b.slot.start_time))
        });
        Ok(reserved)
    }

    async fn set_reminder_sent(
        &self,
        reservation_id: Uuid,
        lead: ReminderLead,
    ) -> Result<bool, DbError> {
        let mut state = self.write()?;
        match state.reservations.get_mut(&reservation_id) {
            Some(reservation) => {
                reservation.set_reminder_sent(lead);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit_reservation(&self, reservation: &Reservation) -> Result<(), DbError> {
        let mut state = self.write()?;

        if state
            .reservations
            .values()
            .any(|r| r.consumer_id == reservation.consumer_id || r.slot_id == reservation.slot_id)
        {
            return Err(DbError::Conflict(format!(
                "consumer {} or slot {} already has a reservation",
                reservation.consumer_id, reservation.slot_id
            )));
        }

        let slot = state
            .slots
            .get_mut(&reservation.slot_id)
            .ok_or_else(|| DbError::NotFound(format!("slot {}", reservation.slot_id)))?;
        if slot.booked {
            return Err(DbError::Conflict(format!(
                "slot {} is already booked",
                reservation.slot_id
            )));
        }

        slot.booked = true;
        state.reservations.insert(reservation.id, reservation.clone());
        debug!("Committed reservation {}", reservation.id);
        Ok(())
    }

    async fn release_reservation(&self, reservation: &Reservation) -> Result<(), DbError> {
        let mut state = self.write()?;

        if !state.reservations.contains_key(&reservation.id) {
            return Err(DbError::NotFound(format!("reservation {}", reservation.id)));
        }
        match state.slots.get_mut(&reservation.slot_id) {
            Some(slot) if slot.booked => slot.booked = false,
            _ => {
                return Err(DbError::Conflict(format!(
                    "slot {} is not booked",
                    reservation.slot_id
                )))
            }
        }

        state.reservations.remove(&reservation.id);
        debug!("Released reservation {}", reservation.id);
        Ok(())
    }
}

impl UserRepository for MemoryBookingStore {
    async fn upsert_user(&self, profile: UserProfile) -> Result<UserProfile, DbError> {
        self.write()?.users.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserProfile>, DbError> {
        Ok(self.read()?.users.get(&user_id).cloned())
    }
}
