//! Ports to the external collaborators of the matching core.
//!
//! The core reads profiles and exclusions through these traits and writes
//! back only `number_of_matches`. Implementations own retries and timeouts.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CandidateQuery, ExclusionSet, Profile};

/// Errors that can occur when talking to the attribute store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Profile attributes, queryable by the hard constraints of a requester
#[async_trait]
pub trait AttributeStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Profile, StoreError>;

    /// Profiles satisfying `query`, most recently active first, at most `query.limit`
    async fn query_candidates(&self, query: &CandidateQuery) -> Result<Vec<Profile>, StoreError>;

    async fn save_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    /// Last writer wins; the count is advisory.
    async fn set_number_of_matches(&self, user_id: &str, number_of_matches: u32) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

/// Users that must never be shown to each other
#[async_trait]
pub trait ExclusionResolver: Send + Sync {
    /// Ids blocked by `user_id` plus ids blocking `user_id`
    async fn excluded_ids(&self, user_id: &str) -> Result<ExclusionSet, StoreError>;
}

/// Write path behind the exclusion resolver
#[async_trait]
pub trait BlockStore: ExclusionResolver {
    /// Returns false when the block already existed.
    async fn insert_block(&self, blocker_id: &str, blocked_id: &str) -> Result<bool, StoreError>;

    /// Returns false when there was nothing to remove.
    async fn delete_block(&self, blocker_id: &str, blocked_id: &str) -> Result<bool, StoreError>;
}
