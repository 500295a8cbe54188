use chrono::NaiveDate;

use crate::config::MatchSettings;
use crate::core::ages::birth_date_range;
use crate::models::{CandidateQuery, Profile};
use crate::services::store::{AttributeStore, StoreError};

/// Build the store query for a requester's hard constraints
///
/// Returns `None` when the requester lacks the data the query needs (date of
/// birth or age window); such a requester has no candidates.
pub fn build_candidate_query(
    requester: &Profile,
    settings: &MatchSettings,
    language_code: &str,
    today: NaiveDate,
) -> Option<CandidateQuery> {
    let requester_age = requester.age_on(today)?;
    let min_age = requester.min_age_to_match?;
    let max_age = requester.max_age_to_match?;
    let (oldest_birth_date, youngest_birth_date) = birth_date_range(min_age, max_age, today);

    Some(CandidateQuery {
        requester_id: requester.user_id.clone(),
        genders: requester.gender_to_match.clone(),
        diets: requester.diet_to_match(),
        smoking_statuses: requester.smoking_status_to_match(),
        marital_statuses: requester.marital_status_to_match(),
        requester_gender: requester.gender,
        requester_diet: requester.diet,
        requester_smoking_status: requester.smoking_status,
        requester_marital_status: requester.marital_status,
        requester_age,
        oldest_birth_date,
        youngest_birth_date,
        min_height: settings.min_height,
        max_height: settings.max_height,
        language_code: language_code.to_string(),
        limit: settings.candidate_limit,
    })
}

/// Fetches the capped, pre-filtered candidate pool for a requester
#[derive(Debug, Clone)]
pub struct CandidateRetriever {
    settings: MatchSettings,
}

impl CandidateRetriever {
    pub fn new(settings: MatchSettings) -> Self {
        Self { settings }
    }

    /// Candidates ordered by last activity, newest first, at most `candidate_limit`
    pub async fn retrieve(
        &self,
        store: &dyn AttributeStore,
        requester: &Profile,
        language_code: &str,
        today: NaiveDate,
    ) -> Result<Vec<Profile>, StoreError> {
        let Some(query) = build_candidate_query(requester, &self.settings, language_code, today) else {
            tracing::debug!(
                "Requester {} has no birth date or age window, skipping candidate query",
                requester.user_id
            );
            return Ok(Vec::new());
        };

        let mut candidates = store.query_candidates(&query).await?;
        // Stores are asked for the cap; enforce it regardless.
        candidates.truncate(self.settings.candidate_limit);

        tracing::debug!("Retrieved {} candidates for {}", candidates.len(), requester.user_id);
        Ok(candidates)
    }
}
