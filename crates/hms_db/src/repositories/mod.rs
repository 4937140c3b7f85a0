//! Repository modules for the booking store
//!
//! Each concern has its own trait; [`SqlBookingStore`] and
//! [`MemoryBookingStore`] implement all of them.

pub mod factory;
pub mod memory;
pub mod reservation;
pub mod slot;
pub mod sql;
pub mod user;

#[cfg(test)]
mod memory_test;

pub use factory::BookingStoreFactory;
pub use memory::MemoryBookingStore;
pub use reservation::ReservationLedger;
pub use slot::SlotRepository;
pub use sql::SqlBookingStore;
pub use user::UserRepository;
