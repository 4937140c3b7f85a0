//! User directory
//!
//! Holds the identity data notifications are addressed with.

use crate::error::DbError;
use hms_common::models::UserProfile;
use std::future::Future;
use uuid::Uuid;

pub trait UserRepository {
    /// Insert the profile or replace the stored one with the same id.
    fn upsert_user(
        &self,
        profile: UserProfile,
    ) -> impl Future<Output = Result<UserProfile, DbError>> + Send;

    fn get_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<UserProfile>, DbError>> + Send;
}
