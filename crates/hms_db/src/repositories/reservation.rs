//! Reservation ledger
//!
//! Maps each consumer to at most one active reservation. The two dual-write
//! primitives change the slot's `booked` flag and the ledger row as one unit;
//! they are meant to be called by the reservation engine only.

use crate::error::DbError;
use chrono::NaiveDate;
use hms_common::models::{ReminderLead, Reservation, ReservedSlot};
use std::future::Future;
use uuid::Uuid;

pub trait ReservationLedger {
    fn get_reservation(
        &self,
        reservation_id: Uuid,
    ) -> impl Future<Output = Result<Option<Reservation>, DbError>> + Send;

    fn active_reservation_for_consumer(
        &self,
        consumer_id: Uuid,
    ) -> impl Future<Output = Result<Option<Reservation>, DbError>> + Send;

    /// Reservations held on a provider's slots, newest first.
    fn reservations_for_provider(
        &self,
        provider_id: Uuid,
    ) -> impl Future<Output = Result<Vec<ReservedSlot>, DbError>> + Send;

    /// Reservations whose slot date lies in `[from_date, to_date]`, ordered by
    /// slot date then start time.
    fn reservations_between(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<ReservedSlot>, DbError>> + Send;

    /// Set the reminder flag for `lead`. Returns `false` when the reservation
    /// does not exist; setting a flag that is already set succeeds.
    fn set_reminder_sent(
        &self,
        reservation_id: Uuid,
        lead: ReminderLead,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Mark the slot booked and insert the reservation, atomically.
    ///
    /// Fails with [`DbError::NotFound`] when the slot is absent and with
    /// [`DbError::Conflict`] when the slot is already booked or the consumer
    /// already holds a reservation. Nothing is written on failure.
    fn commit_reservation(
        &self,
        reservation: &Reservation,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Delete the reservation and mark its slot unbooked, atomically.
    ///
    /// Fails with [`DbError::NotFound`] when the reservation is absent and
    /// with [`DbError::Conflict`] when its slot is not booked. Nothing is
    /// written on failure.
    fn release_reservation(
        &self,
        reservation: &Reservation,
    ) -> impl Future<Output = Result<(), DbError>> + Send;
}
