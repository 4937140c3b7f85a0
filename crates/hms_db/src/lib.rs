//! Persistence for the clinic booking services
//!
//! This crate holds the Slot Store, the Reservation Ledger and the user
//! directory. Each is a repository trait; [`SqlBookingStore`] implements them
//! over SQLx (SQLite, or PostgreSQL through the `postgres` feature) and
//! [`MemoryBookingStore`] keeps everything in process memory.
//!
//! # Example
//!
//! ```rust,no_run
//! use hms_db::{BookingStoreFactory, DbClient, RepositoryFactory, SlotRepository};
//!
//! async fn setup() -> Result<(), hms_db::DbError> {
//!     let client = DbClient::from_url("sqlite://data/hms.db").await?;
//!     let store = BookingStoreFactory::new().create_repository(client);
//!     store.init_schema().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;
pub mod repository;

pub use client::DbClient;
pub use error::DbError;
pub use repository::{BookingStore, RepositoryFactory};

pub use repositories::{
    BookingStoreFactory, MemoryBookingStore, ReservationLedger, SlotRepository,
    SqlBookingStore, UserRepository,
};
