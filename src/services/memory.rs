use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::core::filters::matches_query;
use crate::models::{CandidateQuery, ExclusionSet, Profile};
use crate::services::store::{AttributeStore, BlockStore, ExclusionResolver, StoreError};

/// Process-local store for tests and single-node runs
///
/// Candidate queries run the same predicate conjunction as the Postgres
/// store, then order by last visit and apply the limit.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    profiles: RwLock<HashMap<String, Profile>>,
    /// (blocker, blocked)
    blocks: RwLock<HashSet<(String, String)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles<I: IntoIterator<Item = Profile>>(profiles: I) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|profile| (profile.user_id.clone(), profile))
            .collect();
        Self {
            profiles: RwLock::new(profiles),
            blocks: RwLock::default(),
        }
    }

    pub async fn insert(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.user_id.clone(), profile);
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

#[async_trait]
impl AttributeStore for InMemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<Profile, StoreError> {
        self.profiles
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", user_id)))
    }

    async fn query_candidates(&self, query: &CandidateQuery) -> Result<Vec<Profile>, StoreError> {
        let profiles = self.profiles.read().await;
        let mut candidates: Vec<Profile> = profiles
            .values()
            .filter(|profile| matches_query(profile, query))
            .cloned()
            .collect();
        drop(profiles);

        candidates.sort_by(|a, b| {
            b.last_visit
                .cmp(&a.last_visit)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        candidates.truncate(query.limit);
        Ok(candidates)
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.insert(profile.clone()).await;
        Ok(())
    }

    async fn set_number_of_matches(&self, user_id: &str, number_of_matches: u32) -> Result<(), StoreError> {
        match self.profiles.write().await.get_mut(user_id) {
            Some(profile) => {
                profile.number_of_matches = number_of_matches;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("profile {}", user_id))),
        }
    }
}

#[async_trait]
impl ExclusionResolver for InMemoryStore {
    async fn excluded_ids(&self, user_id: &str) -> Result<ExclusionSet, StoreError> {
        let blocks = self.blocks.read().await;
        Ok(blocks
            .iter()
            .filter_map(|(blocker, blocked)| {
                if blocker == user_id {
                    Some(blocked.clone())
                } else if blocked == user_id {
                    Some(blocker.clone())
                } else {
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl BlockStore for InMemoryStore {
    async fn insert_block(&self, blocker_id: &str, blocked_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .blocks
            .write()
            .await
            .insert((blocker_id.to_string(), blocked_id.to_string())))
    }

    async fn delete_block(&self, blocker_id: &str, blocked_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .blocks
            .write()
            .await
            .remove(&(blocker_id.to_string(), blocked_id.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exclusions_are_symmetric() {
        let store = InMemoryStore::new();
        assert!(store.insert_block("a", "b").await.unwrap());
        assert!(!store.insert_block("a", "b").await.unwrap());
        store.insert_block("c", "a").await.unwrap();

        let excluded = store.excluded_ids("a").await.unwrap();
        assert_eq!(excluded.len(), 2);
        assert!(excluded.contains("b") && excluded.contains("c"));
        assert!(store.excluded_ids("b").await.unwrap().contains("a"));

        assert!(store.delete_block("a", "b").await.unwrap());
        assert!(!store.delete_block("a", "b").await.unwrap());
        assert!(!store.excluded_ids("b").await.unwrap().contains("a"));
    }

    #[tokio::test]
    async fn test_number_of_matches_requires_profile() {
        let store = InMemoryStore::with_profiles([Profile::new("a")]);
        store.set_number_of_matches("a", 7).await.unwrap();
        assert_eq!(store.get_profile("a").await.unwrap().number_of_matches, 7);
        assert!(matches!(
            store.set_number_of_matches("missing", 1).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
