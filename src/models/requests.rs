use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to find matches
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    /// Locale the matches are requested in; defaults to the configured language.
    #[validate(length(min = 2, max = 16))]
    #[serde(default, alias = "language_code", rename = "languageCode")]
    pub language_code: Option<String>,
}

/// Request to create or remove a block between two users
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BlockRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "blocker_id", rename = "blockerId")]
    pub blocker_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "blocked_id", rename = "blockedId")]
    pub blocked_id: String,
}

/// Move the activation form cursor: one step back, or to `step`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivationStepRequest {
    #[serde(default)]
    pub step: Option<usize>,
    #[serde(default)]
    pub back: bool,
}

/// Raw field edits from the profile form, keyed by field name.
///
/// Values stay untyped until `core::fields::assign` coerces them.
pub type ProfileUpdateRequest = serde_json::Map<String, serde_json::Value>;
