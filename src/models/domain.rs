use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::ages::age_on;
use crate::models::choices::{Diet, Gender, MaritalStatus, Rank, RankMap, SmokingStatus};

/// User ids that must never appear as candidates for a given user.
pub type ExclusionSet = HashSet<String>;

/// Matching profile with demographic, lifestyle and preference data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub diet: Diet,
    #[serde(default)]
    pub smoking_status: SmokingStatus,
    #[serde(default)]
    pub marital_status: MaritalStatus,
    /// Height in cm.
    #[serde(default)]
    pub height: Option<i32>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub profile_description: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub children: Option<String>,
    #[serde(default)]
    pub more_children: Option<String>,
    #[serde(default)]
    pub match_description: Option<String>,
    #[serde(default)]
    pub gender_to_match: Vec<Gender>,
    #[serde(default)]
    pub min_age_to_match: Option<i32>,
    #[serde(default)]
    pub max_age_to_match: Option<i32>,
    #[serde(default)]
    pub diet_match: RankMap<Diet>,
    #[serde(default)]
    pub smoking_status_match: RankMap<SmokingStatus>,
    #[serde(default)]
    pub marital_status_match: RankMap<MaritalStatus>,
    #[serde(default)]
    pub active_languages: Vec<String>,
    #[serde(default)]
    pub not_allowed_to_use_matching: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub last_visit: DateTime<Utc>,
    #[serde(default)]
    pub number_of_matches: u32,
    /// Step the activation form resumes at; never ahead of the validated step.
    #[serde(default)]
    pub activation_step: usize,
}

impl Profile {
    /// A fresh, inactive and incomplete profile.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            first_name: String::new(),
            gender: Gender::Unknown,
            date_of_birth: None,
            diet: Diet::Unknown,
            smoking_status: SmokingStatus::Unknown,
            marital_status: MaritalStatus::Unknown,
            height: None,
            photo: None,
            profile_description: None,
            city: None,
            children: None,
            more_children: None,
            match_description: None,
            gender_to_match: Vec::new(),
            min_age_to_match: None,
            max_age_to_match: None,
            diet_match: RankMap::default(),
            smoking_status_match: RankMap::default(),
            marital_status_match: RankMap::default(),
            active_languages: Vec::new(),
            not_allowed_to_use_matching: false,
            is_active: false,
            last_visit: Utc::now(),
            number_of_matches: 0,
            activation_step: 0,
        }
    }

    /// Age in whole years on `today`; `None` without a date of birth.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        self.date_of_birth.map(|dob| age_on(dob, today))
    }

    /// True when `age` lies inside this profile's age window.
    pub fn accepts_age(&self, age: i32) -> bool {
        match (self.min_age_to_match, self.max_age_to_match) {
            (Some(min), Some(max)) => min <= age && age <= max,
            _ => false,
        }
    }

    pub fn accepts_gender(&self, gender: Gender) -> bool {
        self.gender_to_match.contains(&gender)
    }

    pub fn diet_to_match(&self) -> Vec<Diet> {
        self.diet_match.acceptable_values()
    }

    pub fn smoking_status_to_match(&self) -> Vec<SmokingStatus> {
        self.smoking_status_match.acceptable_values()
    }

    pub fn marital_status_to_match(&self) -> Vec<MaritalStatus> {
        self.marital_status_match.acceptable_values()
    }

    /// One step back in the activation form, stopping at the first.
    pub fn step_back(&mut self) {
        self.activation_step = self.activation_step.saturating_sub(1);
    }

    pub fn speaks(&self, language_code: &str) -> bool {
        self.active_languages.iter().any(|lang| lang == language_code)
    }
}

/// A candidate profile with the rank it received for one requester
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedProfile {
    pub profile: Profile,
    pub rank: Rank,
}

/// Hard constraints of one requester, as sent to the attribute store
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub requester_id: String,
    pub genders: Vec<Gender>,
    pub diets: Vec<Diet>,
    pub smoking_statuses: Vec<SmokingStatus>,
    pub marital_statuses: Vec<MaritalStatus>,
    /// Requester's own values that candidates' preference sets must contain.
    pub requester_gender: Gender,
    pub requester_diet: Diet,
    pub requester_smoking_status: SmokingStatus,
    pub requester_marital_status: MaritalStatus,
    pub requester_age: i32,
    /// Inclusive date-of-birth window equivalent to the requester's age window.
    pub oldest_birth_date: NaiveDate,
    pub youngest_birth_date: NaiveDate,
    pub min_height: i32,
    pub max_height: i32,
    pub language_code: String,
    pub limit: usize,
}
