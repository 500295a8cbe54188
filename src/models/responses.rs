use serde::{Deserialize, Serialize};

use crate::core::validation::{FieldError, ValidationReport};
use crate::models::choices::{Diet, Gender, MaritalStatus, SmokingStatus};
use crate::models::domain::{Profile, RankedProfile};

/// One ranked candidate, as shown to the requester
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    pub gender: Gender,
    pub age: Option<i32>,
    pub diet: Diet,
    #[serde(rename = "smokingStatus")]
    pub smoking_status: SmokingStatus,
    #[serde(rename = "maritalStatus")]
    pub marital_status: MaritalStatus,
    pub height: Option<i32>,
    pub city: Option<String>,
    pub photo: Option<String>,
    pub rank: u8,
}

impl MatchSummary {
    pub fn from_ranked(ranked: &RankedProfile, today: chrono::NaiveDate) -> Self {
        let profile = &ranked.profile;
        Self {
            user_id: profile.user_id.clone(),
            first_name: profile.first_name.clone(),
            gender: profile.gender,
            age: profile.age_on(today),
            diet: profile.diet,
            smoking_status: profile.smoking_status,
            marital_status: profile.marital_status,
            height: profile.height,
            city: profile.city.clone(),
            photo: profile.photo.clone(),
            rank: ranked.rank.value(),
        }
    }
}

/// Response for find matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindMatchesResponse {
    pub matches: Vec<MatchSummary>,
    pub number_of_matches: usize,
    pub total_candidates: usize,
}

/// Outcome of validating (and possibly activating) a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub step: usize,
    pub total_steps: usize,
    pub errors: Vec<FieldError>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "activationStep")]
    pub activation_step: usize,
}

impl ValidationResponse {
    pub fn new(report: ValidationReport, profile: &Profile) -> Self {
        Self {
            step: report.step,
            total_steps: report.total_steps,
            errors: report.errors,
            is_active: profile.is_active,
            activation_step: profile.activation_step,
        }
    }
}

/// Outcome of a block or unblock request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockResponse {
    /// False when the relation was already in the requested state.
    pub changed: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
