use crate::models::{CandidateQuery, Profile};

/// Check if a profile satisfies every predicate of a candidate query
///
/// Mirrors the conjunction the Postgres store runs in SQL, so in-memory
/// stores return the same candidate pool.
#[inline]
pub fn matches_query(profile: &Profile, query: &CandidateQuery) -> bool {
    if profile.user_id == query.requester_id {
        return false;
    }

    // Requester's preference sets
    if !query.genders.contains(&profile.gender)
        || !query.diets.contains(&profile.diet)
        || !query.smoking_statuses.contains(&profile.smoking_status)
        || !query.marital_statuses.contains(&profile.marital_status)
    {
        return false;
    }

    // Candidate's preference sets must contain the requester
    if !profile.accepts_gender(query.requester_gender)
        || !profile.diet_to_match().contains(&query.requester_diet)
        || !profile.smoking_status_to_match().contains(&query.requester_smoking_status)
        || !profile.marital_status_to_match().contains(&query.requester_marital_status)
    {
        return false;
    }

    if !matches_age_constraints(profile, query) {
        return false;
    }

    if !matches!(profile.height, Some(h) if query.min_height <= h && h <= query.max_height) {
        return false;
    }

    !profile.not_allowed_to_use_matching && profile.speaks(&query.language_code)
}

/// Birth date inside the requester's window, and requester's age inside the candidate's
#[inline]
pub fn matches_age_constraints(profile: &Profile, query: &CandidateQuery) -> bool {
    let Some(dob) = profile.date_of_birth else {
        return false;
    };
    if dob < query.oldest_birth_date || dob > query.youngest_birth_date {
        return false;
    }
    profile.accepts_age(query.requester_age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Choice, Diet, Gender, MaritalStatus, Rank, SmokingStatus};
    use chrono::NaiveDate;

    fn create_test_profile(gender: Gender, born: i32) -> Profile {
        let mut profile = Profile::new("candidate");
        profile.gender = gender;
        profile.gender_to_match = vec![Gender::Male];
        profile.date_of_birth = NaiveDate::from_ymd_opt(born, 6, 1);
        profile.diet = Diet::Vegan;
        profile.smoking_status = SmokingStatus::No;
        profile.marital_status = MaritalStatus::Single;
        profile.height = Some(165);
        profile.min_age_to_match = Some(20);
        profile.max_age_to_match = Some(60);
        profile.active_languages = vec!["en".to_string()];
        profile
    }

    fn create_test_query() -> CandidateQuery {
        CandidateQuery {
            requester_id: "requester".to_string(),
            genders: vec![Gender::Female],
            diets: Diet::VALID.to_vec(),
            smoking_statuses: vec![SmokingStatus::No, SmokingStatus::Sometimes],
            marital_statuses: vec![MaritalStatus::Single],
            requester_gender: Gender::Male,
            requester_diet: Diet::Vegetarian,
            requester_smoking_status: SmokingStatus::No,
            requester_marital_status: MaritalStatus::Single,
            requester_age: 40,
            oldest_birth_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
            youngest_birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            min_height: 1,
            max_height: 450,
            language_code: "en".to_string(),
            limit: 2000,
        }
    }

    #[test]
    fn test_query_match() {
        assert!(matches_query(&create_test_profile(Gender::Female, 1990), &create_test_query()));
    }

    #[test]
    fn test_query_excludes_requester() {
        let mut profile = create_test_profile(Gender::Female, 1990);
        profile.user_id = "requester".to_string();
        assert!(!matches_query(&profile, &create_test_query()));
    }

    #[test]
    fn test_query_fails_gender() {
        assert!(!matches_query(&create_test_profile(Gender::Male, 1990), &create_test_query()));
    }

    #[test]
    fn test_query_fails_reverse_gender() {
        let mut profile = create_test_profile(Gender::Female, 1990);
        profile.gender_to_match = vec![Gender::Female];
        assert!(!matches_query(&profile, &create_test_query()));
    }

    #[test]
    fn test_query_fails_candidate_diet_preference() {
        let mut profile = create_test_profile(Gender::Female, 1990);
        profile.diet_match.set(Diet::Vegetarian, Rank::UNACCEPTABLE);
        assert!(!matches_query(&profile, &create_test_query()));
    }

    #[test]
    fn test_query_fails_birth_date_window() {
        assert!(!matches_query(&create_test_profile(Gender::Female, 1960), &create_test_query()));
        assert!(!matches_query(&create_test_profile(Gender::Female, 2005), &create_test_query()));
    }

    #[test]
    fn test_query_fails_requester_age() {
        let mut profile = create_test_profile(Gender::Female, 1990);
        profile.max_age_to_match = Some(35);
        assert!(!matches_query(&profile, &create_test_query()));
    }

    #[test]
    fn test_query_fails_language_and_eligibility() {
        let mut profile = create_test_profile(Gender::Female, 1990);
        profile.active_languages = vec!["he".to_string()];
        assert!(!matches_query(&profile, &create_test_query()));

        let mut profile = create_test_profile(Gender::Female, 1990);
        profile.not_allowed_to_use_matching = true;
        assert!(!matches_query(&profile, &create_test_query()));
    }
}
