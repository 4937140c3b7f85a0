//! Slot store
//!
//! Durable record of provider availability. The store applies no business
//! rules of its own beyond the guards documented on each operation.

use crate::error::DbError;
use chrono::NaiveDate;
use hms_common::models::Slot;
use std::future::Future;
use uuid::Uuid;

pub trait SlotRepository {
    /// Create the slot, reservation and user tables if they do not exist.
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Store a new slot.
    ///
    /// Returns [`DbError::Conflict`] when the provider already has a slot with
    /// the same date, start and end time.
    fn create_slot(&self, slot: Slot) -> impl Future<Output = Result<Slot, DbError>> + Send;

    fn get_slot(&self, slot_id: Uuid) -> impl Future<Output = Result<Option<Slot>, DbError>> + Send;

    /// Delete a slot only while it is unbooked.
    ///
    /// Returns `false` when the slot does not exist and
    /// [`DbError::Conflict`] when it is booked.
    fn delete_unbooked_slot(
        &self,
        slot_id: Uuid,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Unbooked slots dated `from_date` or later, optionally restricted to one
    /// provider, ordered by date then start time.
    fn list_open_slots(
        &self,
        provider_id: Option<Uuid>,
        from_date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Slot>, DbError>> + Send;

    /// All slots of a provider, ordered by date then start time.
    fn list_provider_slots(
        &self,
        provider_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Slot>, DbError>> + Send;
}
