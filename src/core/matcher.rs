use chrono::{NaiveDate, Utc};
use rayon::prelude::*;
use thiserror::Error;

use crate::config::MatchSettings;
use crate::core::retriever::CandidateRetriever;
use crate::core::scoring::Scorer;
use crate::models::{ExclusionSet, Profile, RankedProfile};
use crate::services::store::{AttributeStore, ExclusionResolver, StoreError};

/// Errors surfaced by a match request
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result of the matching process
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<RankedProfile>,
    pub total_candidates: usize,
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Candidate retrieval from the attribute store (capped, newest activity first)
/// 2. Exclusion resolution, once per request
/// 3. Per-candidate scoring, in parallel
/// 4. Ranking: drop unacceptable, sort by rank then recency, truncate
/// 5. Persist the match count on the requester
#[derive(Debug, Clone)]
pub struct Matcher {
    settings: MatchSettings,
    retriever: CandidateRetriever,
}

impl Matcher {
    pub fn new(settings: MatchSettings) -> Self {
        Self {
            retriever: CandidateRetriever::new(settings.clone()),
            settings,
        }
    }

    pub fn with_default_settings() -> Self {
        Self::new(MatchSettings::default())
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Rank an already retrieved candidate pool for `requester`
    ///
    /// Excluded and inactive candidates are skipped, unacceptable ones
    /// dropped. Survivors are sorted by rank, then last visit, both
    /// descending, and truncated to `result_limit`.
    pub fn rank(
        &self,
        requester: &Profile,
        candidates: Vec<Profile>,
        excluded: &ExclusionSet,
        today: NaiveDate,
    ) -> MatchResult {
        let total_candidates = candidates.len();
        let scorer = Scorer::on(&self.settings, today);

        let mut ranked: Vec<RankedProfile> = candidates
            .into_par_iter()
            .filter(|candidate| candidate.is_active && !excluded.contains(&candidate.user_id))
            .filter_map(|candidate| {
                let rank = scorer.score(requester, &candidate, excluded);
                (!rank.is_unacceptable()).then_some(RankedProfile { profile: candidate, rank })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.rank
                .cmp(&a.rank)
                .then_with(|| b.profile.last_visit.cmp(&a.profile.last_visit))
        });
        ranked.truncate(self.settings.result_limit);

        MatchResult {
            matches: ranked,
            total_candidates,
        }
    }

    /// Find, rank and count matches for `requester` in `language_code`
    pub async fn get_matches(
        &self,
        store: &dyn AttributeStore,
        exclusions: &dyn ExclusionResolver,
        requester: &Profile,
        language_code: &str,
    ) -> Result<MatchResult, MatchError> {
        let today = Utc::now().date_naive();
        self.get_matches_on(store, exclusions, requester, language_code, today).await
    }

    /// Same as [`Matcher::get_matches`], deriving ages as of `today`
    pub async fn get_matches_on(
        &self,
        store: &dyn AttributeStore,
        exclusions: &dyn ExclusionResolver,
        requester: &Profile,
        language_code: &str,
        today: NaiveDate,
    ) -> Result<MatchResult, MatchError> {
        // only activated profiles take part in matching, on either side
        if !requester.is_active {
            tracing::debug!(user = %requester.user_id, "Matcher::get_matches: requester is not active");
            return Ok(MatchResult {
                matches: Vec::new(),
                total_candidates: 0,
            });
        }

        let candidates = self
            .retriever
            .retrieve(store, requester, language_code, today)
            .await?;
        let excluded = exclusions.excluded_ids(&requester.user_id).await?;

        let result = self.rank(requester, candidates, &excluded, today);
        let number_of_matches = result.matches.len();

        store
            .set_number_of_matches(&requester.user_id, number_of_matches as u32)
            .await?;

        tracing::debug!(
            user = %requester.user_id,
            language_code,
            number_of_matches,
            "Matcher::get_matches"
        );
        self.log_suspicious_requester(requester, language_code, number_of_matches);

        Ok(result)
    }

    /// Requesters like these should never have reached retrieval
    fn log_suspicious_requester(&self, requester: &Profile, language_code: &str, number_of_matches: usize) {
        let height_suspicious = !self.settings.height_in_range(requester.height)
            || requester.height.map_or(true, |h| h <= self.settings.suspicious_height);

        if height_suspicious || requester.not_allowed_to_use_matching {
            tracing::warn!(
                user = %requester.user_id,
                language_code,
                number_of_matches,
                height = ?requester.height,
                not_allowed_to_use_matching = requester.not_allowed_to_use_matching,
                "Matcher::get_matches: requester outside matching bounds"
            );
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_settings()
    }
}
