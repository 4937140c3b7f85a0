//! Factory for creating SQL booking stores

use crate::repositories::sql::SqlBookingStore;
use crate::{DbClient, RepositoryFactory};

/// Builds [`SqlBookingStore`]s on top of a connected [`DbClient`].
#[derive(Debug, Clone)]
pub struct BookingStoreFactory;

impl BookingStoreFactory {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BookingStoreFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryFactory<SqlBookingStore, DbClient> for BookingStoreFactory {
    fn create_repository(&self, db_client: DbClient) -> SqlBookingStore {
        SqlBookingStore::new(db_client)
    }
}
