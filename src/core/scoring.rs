use chrono::{NaiveDate, Utc};

use crate::config::MatchSettings;
use crate::models::{ExclusionSet, Profile, Rank};

/// Pairwise compatibility scorer
///
/// Each side is judged by its own preferences, so `score(a, b)` and
/// `score(b, a)` may differ. The candidate's preference maps only gate the
/// result; the magnitude is the requester's own rank of the candidate.
///
/// Evaluation order (first unacceptable result wins):
/// 1. no self-match
/// 2. gender, both directions
/// 3. age window, both directions
/// 4. both heights within the configured range
/// 5. neither side barred from matching
/// 6. no block in either direction
/// 7. candidate's view of the requester is above zero
/// 8. requester's view of the candidate is the score
#[derive(Debug, Clone)]
pub struct Scorer {
    min_height: i32,
    max_height: i32,
    today: NaiveDate,
}

impl Scorer {
    /// Scorer deriving ages as of the current UTC date
    pub fn new(settings: &MatchSettings) -> Self {
        Self::on(settings, Utc::now().date_naive())
    }

    /// Scorer deriving ages as of `today`
    pub fn on(settings: &MatchSettings, today: NaiveDate) -> Self {
        Self {
            min_height: settings.min_height,
            max_height: settings.max_height,
            today,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Rank of `candidate` from `requester`'s point of view, in 0..=5
    pub fn score(&self, requester: &Profile, candidate: &Profile, excluded: &ExclusionSet) -> Rank {
        if requester.user_id == candidate.user_id {
            return Rank::UNACCEPTABLE;
        }
        if !requester.accepts_gender(candidate.gender) || !candidate.accepts_gender(requester.gender) {
            return Rank::UNACCEPTABLE;
        }

        let (Some(requester_age), Some(candidate_age)) =
            (requester.age_on(self.today), candidate.age_on(self.today))
        else {
            return Rank::UNACCEPTABLE;
        };
        if !requester.accepts_age(candidate_age) || !candidate.accepts_age(requester_age) {
            return Rank::UNACCEPTABLE;
        }

        if !self.height_allowed(requester.height) || !self.height_allowed(candidate.height) {
            return Rank::UNACCEPTABLE;
        }
        if requester.not_allowed_to_use_matching || candidate.not_allowed_to_use_matching {
            return Rank::UNACCEPTABLE;
        }
        if excluded.contains(&candidate.user_id) {
            return Rank::UNACCEPTABLE;
        }

        if view_of(candidate, requester).is_unacceptable() {
            return Rank::UNACCEPTABLE;
        }
        view_of(requester, candidate)
    }

    #[inline]
    fn height_allowed(&self, height: Option<i32>) -> bool {
        matches!(height, Some(h) if self.min_height <= h && h <= self.max_height)
    }
}

/// How acceptable `other`'s lifestyle is to `viewer`: the weakest of the three ranks
#[inline]
pub fn view_of(viewer: &Profile, other: &Profile) -> Rank {
    viewer
        .diet_match
        .rank_of(other.diet)
        .min(viewer.smoking_status_match.rank_of(other.smoking_status))
        .min(viewer.marital_status_match.rank_of(other.marital_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diet, Gender, MaritalStatus, RankMap, SmokingStatus};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn create_test_profile(id: &str, gender: Gender, gender_to_match: Gender, born: i32) -> Profile {
        let mut profile = Profile::new(id);
        profile.gender = gender;
        profile.gender_to_match = vec![gender_to_match];
        profile.date_of_birth = NaiveDate::from_ymd_opt(born, 1, 15);
        profile.diet = Diet::Vegan;
        profile.smoking_status = SmokingStatus::No;
        profile.marital_status = MaritalStatus::Single;
        profile.height = Some(170);
        profile.min_age_to_match = Some(0);
        profile.max_age_to_match = Some(180);
        profile.is_active = true;
        profile
    }

    fn pair() -> (Profile, Profile) {
        (
            create_test_profile("walter", Gender::Male, Gender::Female, 1958),
            create_test_profile("jesse", Gender::Female, Gender::Male, 1978),
        )
    }

    fn scorer() -> Scorer {
        Scorer::on(&MatchSettings::default(), today())
    }

    #[test]
    fn test_open_gates_score_ideal() {
        let (a, b) = pair();
        assert_eq!(scorer().score(&a, &b, &ExclusionSet::new()), Rank::IDEAL);
        assert_eq!(scorer().score(&b, &a, &ExclusionSet::new()), Rank::IDEAL);
    }

    #[test]
    fn test_missing_birth_date_scores_zero() {
        let (a, mut b) = pair();
        b.date_of_birth = None;
        assert_eq!(scorer().score(&a, &b, &ExclusionSet::new()), Rank::UNACCEPTABLE);
    }

    #[test]
    fn test_missing_height_scores_zero() {
        let (mut a, b) = pair();
        a.height = None;
        assert_eq!(scorer().score(&a, &b, &ExclusionSet::new()), Rank::UNACCEPTABLE);
    }

    #[test]
    fn test_excluded_candidate_scores_zero() {
        let (a, b) = pair();
        let excluded: ExclusionSet = [b.user_id.clone()].into_iter().collect();
        assert_eq!(scorer().score(&a, &b, &excluded), Rank::UNACCEPTABLE);
    }

    #[test]
    fn test_candidate_rejection_gates_requester_view() {
        let (a, mut b) = pair();
        b.marital_status_match.set(MaritalStatus::Single, Rank::UNACCEPTABLE);
        assert_eq!(scorer().score(&a, &b, &ExclusionSet::new()), Rank::UNACCEPTABLE);
        assert_eq!(scorer().score(&b, &a, &ExclusionSet::new()), Rank::UNACCEPTABLE);
    }

    #[test]
    fn test_score_is_weakest_requester_rank() {
        let (mut a, b) = pair();
        a.diet_match = RankMap::from_pairs([(Diet::Vegan, 4), (Diet::Vegetarian, 5), (Diet::Carnist, 0)]);
        a.smoking_status_match = RankMap::from_pairs([(SmokingStatus::No, 3), (SmokingStatus::Sometimes, 5), (SmokingStatus::Yes, 5)]);
        assert_eq!(scorer().score(&a, &b, &ExclusionSet::new()).value(), 3);
        assert_eq!(scorer().score(&b, &a, &ExclusionSet::new()), Rank::IDEAL);
    }

    #[test]
    fn test_view_of_ignores_gates() {
        let (a, b) = pair();
        assert_eq!(view_of(&a, &a), Rank::IDEAL);
        assert_eq!(view_of(&a, &b), Rank::IDEAL);
    }
}
