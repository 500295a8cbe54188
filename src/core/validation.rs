use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::config::ValidationSettings;
use crate::core::activation::SiteProfile;
use crate::core::fields::Field;
use crate::models::{Choice, Profile, RankMap};

/// Precondition violations around profile editing and activation
///
/// Failing a completion rule is not an error; it is reported through
/// [`ValidationReport`].
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("activate is not implemented.")]
    ActivateNotImplemented,

    #[error("Step configuration is missing: {0}")]
    MissingStepConfiguration(String),

    #[error("Unknown profile field: {0}")]
    UnknownField(String),

    #[error("Field {0} cannot be assigned directly")]
    ReadOnlyField(String),

    #[error("Field {field} must be {expected}")]
    InvalidFieldType { field: String, expected: &'static str },
}

/// One failed rule, attributed to the field it checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Outcome of running the completion steps over a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Last step passed in full; `total_steps` when the profile is complete.
    pub step: usize,
    pub total_steps: usize,
    /// Every failure of the first failing step, in field order.
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_complete(&self) -> bool {
        self.step == self.total_steps && self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }
}

/// Ordered profile-completion state machine
///
/// Steps are checked in order and evaluation stops at the first step with
/// any failing field. Validation never mutates the profile, so running it
/// twice on the same profile yields the same report.
#[derive(Debug, Clone)]
pub struct ProfileValidator {
    steps: Vec<Vec<Field>>,
    settings: ValidationSettings,
}

impl ProfileValidator {
    pub fn new(settings: &ValidationSettings) -> Result<Self, ProfileError> {
        if settings.steps.is_empty() {
            return Err(ProfileError::MissingStepConfiguration("no steps configured".to_string()));
        }

        let steps = settings
            .steps
            .iter()
            .enumerate()
            .map(|(index, names)| {
                if names.is_empty() {
                    return Err(ProfileError::MissingStepConfiguration(format!(
                        "step {} has no fields",
                        index + 1
                    )));
                }
                names.iter().map(|name| name.parse::<Field>()).collect()
            })
            .collect::<Result<Vec<Vec<Field>>, ProfileError>>()?;

        Ok(Self {
            steps,
            settings: settings.clone(),
        })
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn validate(&self, profile: &Profile) -> ValidationReport {
        self.validate_on(profile, Utc::now().date_naive())
    }

    /// Same as [`ProfileValidator::validate`], deriving the age as of `today`
    pub fn validate_on(&self, profile: &Profile, today: NaiveDate) -> ValidationReport {
        let total_steps = self.steps.len();

        for (index, fields) in self.steps.iter().enumerate() {
            let errors: Vec<FieldError> = fields
                .iter()
                .filter_map(|field| {
                    self.check(profile, *field, today).map(|message| FieldError {
                        field: field.name().to_string(),
                        message,
                    })
                })
                .collect();

            if !errors.is_empty() {
                return ValidationReport {
                    step: index,
                    total_steps,
                    errors,
                };
            }
        }

        ValidationReport {
            step: total_steps,
            total_steps,
            errors: Vec::new(),
        }
    }

    /// Validate and, when every step passes, activate
    ///
    /// An incomplete profile is returned untouched. Activation failures
    /// (a profile kind without activation) propagate as errors.
    pub fn validate_and_activate<P: SiteProfile + ?Sized>(
        &self,
        profile: &mut P,
    ) -> Result<ValidationReport, ProfileError> {
        self.validate_and_activate_on(profile, Utc::now().date_naive())
    }

    pub fn validate_and_activate_on<P: SiteProfile + ?Sized>(
        &self,
        profile: &mut P,
        today: NaiveDate,
    ) -> Result<ValidationReport, ProfileError> {
        let report = self.validate_on(profile.profile(), today);
        if report.is_complete() {
            profile.activate()?;
            tracing::debug!(user = %profile.profile().user_id, "profile activated");
        }
        Ok(report)
    }

    /// Point the activation form at `requested`, clamped to the furthest
    /// step that currently validates.
    pub fn go_to_step(&self, profile: &mut Profile, requested: usize) -> ValidationReport {
        self.go_to_step_on(profile, requested, Utc::now().date_naive())
    }

    pub fn go_to_step_on(&self, profile: &mut Profile, requested: usize, today: NaiveDate) -> ValidationReport {
        let report = self.validate_on(profile, today);
        profile.activation_step = requested.min(report.step);
        report
    }

    fn check(&self, profile: &Profile, field: Field, today: NaiveDate) -> Option<String> {
        let s = &self.settings;
        match field {
            Field::FirstName => blank(Some(profile.first_name.as_str()))
                .then(|| "Please enter your first name.".to_string()),
            Field::DateOfBirth => match profile.age_on(today) {
                None => Some("Date of birth cannot be null.".to_string()),
                Some(age) if !(s.min_age..=s.max_age).contains(&age) => Some(format!(
                    "Age must be from {} to {} years.",
                    s.min_age, s.max_age
                )),
                Some(_) => None,
            },
            Field::Gender => required_choice(profile.gender, "gender"),
            Field::Photo => blank(profile.photo.as_deref()).then(|| "A profile picture is required.".to_string()),
            Field::ProfileDescription => blank(profile.profile_description.as_deref())
                .then(|| "Please write some text in this field.".to_string()),
            Field::City => blank(profile.city.as_deref()).then(|| "Please write where you live.".to_string()),
            Field::Height => match profile.height {
                None => Some("Height cannot be null.".to_string()),
                Some(h) if !(s.min_height..=s.max_height).contains(&h) => Some(format!(
                    "Height must be from {} to {} cm.",
                    s.min_height, s.max_height
                )),
                Some(_) => None,
            },
            Field::Children => {
                blank(profile.children.as_deref()).then(|| "Do you have children? How many?".to_string())
            }
            Field::MoreChildren => {
                blank(profile.more_children.as_deref()).then(|| "Do you want (more) children?".to_string())
            }
            Field::Diet => required_choice(profile.diet, "diet"),
            Field::SmokingStatus => required_choice(profile.smoking_status, "smoking status"),
            Field::MaritalStatus => required_choice(profile.marital_status, "marital status"),
            Field::GenderToMatch => (!valid_choice_set(&profile.gender_to_match))
                .then(|| "Gender to match is required.".to_string()),
            Field::MatchDescription => blank(profile.match_description.as_deref())
                .then(|| "Please write some text in this field.".to_string()),
            Field::MinAgeToMatch => self.age_bound(profile.min_age_to_match, "Minimal"),
            Field::MaxAgeToMatch => self.age_bound(profile.max_age_to_match, "Maximal"),
            Field::MinMaxAgeToMatch => {
                // Only meaningful once both bounds pass on their own.
                if self.age_bound(profile.min_age_to_match, "Minimal").is_some()
                    || self.age_bound(profile.max_age_to_match, "Maximal").is_some()
                {
                    return None;
                }
                match (profile.min_age_to_match, profile.max_age_to_match) {
                    (Some(min), Some(max)) if max < min => {
                        Some("Maximal age to match can't be less than minimal age to match.".to_string())
                    }
                    _ => None,
                }
            }
            Field::DietMatch => rank_map(&profile.diet_match, "diet"),
            Field::SmokingStatusMatch => rank_map(&profile.smoking_status_match, "smoking status"),
            Field::MaritalStatusMatch => rank_map(&profile.marital_status_match, "marital status"),
            Field::ActiveLanguages => {
                let mut seen = HashSet::new();
                let valid = !profile.active_languages.is_empty()
                    && profile
                        .active_languages
                        .iter()
                        .all(|code| s.languages.contains(code) && seen.insert(code));
                (!valid).then(|| "Please choose at least one language.".to_string())
            }
        }
    }

    fn age_bound(&self, age: Option<i32>, label: &str) -> Option<String> {
        let s = &self.settings;
        match age {
            None => Some(format!("{} age to match cannot be null.", label)),
            Some(age) if !(s.min_age..=s.max_age).contains(&age) => Some(format!(
                "{} age to match must be from {} to {} years.",
                label, s.min_age, s.max_age
            )),
            Some(_) => None,
        }
    }
}

fn blank(text: Option<&str>) -> bool {
    text.map_or(true, |t| t.trim().is_empty())
}

fn required_choice<C: Choice>(value: C, label: &str) -> Option<String> {
    (!value.is_known()).then(|| format!("Your {} is required.", label))
}

/// Non-empty, no duplicates, no unknown members
fn valid_choice_set<C: Choice>(values: &[C]) -> bool {
    !values.is_empty()
        && values.iter().all(|v| v.is_known())
        && values
            .iter()
            .enumerate()
            .all(|(i, v)| !values[..i].contains(v))
}

fn rank_map<C: Choice>(map: &RankMap<C>, label: &str) -> Option<String> {
    if !map.is_complete() {
        Some(format!("Please select {} match.", label))
    } else if !map.has_ideal() {
        Some(format!("At least one {} match option should be 5 hearts.", label))
    } else {
        None
    }
}
