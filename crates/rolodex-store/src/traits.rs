//! Profile store trait.

use std::sync::Arc;

use async_trait::async_trait;

use rolodex_shared::types::UserId;

use crate::error::Result;
use crate::models::{Profile, ProfilePatch};

/// The authoritative per-user profile record.
///
/// Implementations must be thread-safe (`Send + Sync`) as they are shared
/// by every request handler. A single `put` is atomic; a `get` followed by
/// a `put` is not.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a user's profile. Unknown users get the default zero profile.
    async fn get(&self, user: &UserId) -> Result<Profile>;

    /// Merge `patch` into the stored profile and return the result.
    ///
    /// Rejects patches that would move `last_reset_date` backwards with
    /// [`StoreError::StaleWrite`](crate::StoreError::StaleWrite).
    async fn put(&self, user: &UserId, patch: ProfilePatch) -> Result<Profile>;
}

#[async_trait]
impl<S: ProfileStore + ?Sized> ProfileStore for Arc<S> {
    #[inline]
    async fn get(&self, user: &UserId) -> Result<Profile> {
        (**self).get(user).await
    }

    #[inline]
    async fn put(&self, user: &UserId, patch: ProfilePatch) -> Result<Profile> {
        (**self).put(user, patch).await
    }
}
