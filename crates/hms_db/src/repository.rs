//! Repository traits shared by all store implementations
//!
//! The booking engine is generic over [`BookingStore`], the union of the
//! slot, reservation and user repositories, so the SQL and in-memory stores
//! are interchangeable.

use crate::repositories::{ReservationLedger, SlotRepository, UserRepository};

/// A trait for database repository factories
///
/// Generic over the repository type and the configuration (usually a
/// connected client) it is built from.
pub trait RepositoryFactory<R, C> {
    /// Create a new repository instance
    fn create_repository(&self, config: C) -> R;
}

/// Everything the reservation engine needs from persistence.
pub trait BookingStore:
    SlotRepository + ReservationLedger + UserRepository + Clone + Send + Sync + 'static
{
}

impl<T> BookingStore for T where
    T: SlotRepository + ReservationLedger + UserRepository + Clone + Send + Sync + 'static
{
}
