use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::core::validation::ProfileError;
use crate::models::{Choice, Gender, Profile, RankMap};

/// Profile fields addressable by the completion steps and the edit form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FirstName,
    DateOfBirth,
    Gender,
    Photo,
    ProfileDescription,
    City,
    Height,
    Children,
    MoreChildren,
    Diet,
    SmokingStatus,
    MaritalStatus,
    MatchDescription,
    GenderToMatch,
    MinAgeToMatch,
    MaxAgeToMatch,
    /// Cross-field rule over the two age fields; not assignable.
    MinMaxAgeToMatch,
    DietMatch,
    SmokingStatusMatch,
    MaritalStatusMatch,
    ActiveLanguages,
}

impl Field {
    pub const ALL: [Field; 21] = [
        Field::FirstName,
        Field::DateOfBirth,
        Field::Gender,
        Field::Photo,
        Field::ProfileDescription,
        Field::City,
        Field::Height,
        Field::Children,
        Field::MoreChildren,
        Field::Diet,
        Field::SmokingStatus,
        Field::MaritalStatus,
        Field::MatchDescription,
        Field::GenderToMatch,
        Field::MinAgeToMatch,
        Field::MaxAgeToMatch,
        Field::MinMaxAgeToMatch,
        Field::DietMatch,
        Field::SmokingStatusMatch,
        Field::MaritalStatusMatch,
        Field::ActiveLanguages,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::FirstName => "first_name",
            Field::DateOfBirth => "date_of_birth",
            Field::Gender => "gender",
            Field::Photo => "photo",
            Field::ProfileDescription => "profile_description",
            Field::City => "city",
            Field::Height => "height",
            Field::Children => "children",
            Field::MoreChildren => "more_children",
            Field::Diet => "diet",
            Field::SmokingStatus => "smoking_status",
            Field::MaritalStatus => "marital_status",
            Field::MatchDescription => "match_description",
            Field::GenderToMatch => "gender_to_match",
            Field::MinAgeToMatch => "min_age_to_match",
            Field::MaxAgeToMatch => "max_age_to_match",
            Field::MinMaxAgeToMatch => "min_max_age_to_match",
            Field::DietMatch => "diet_match",
            Field::SmokingStatusMatch => "smoking_status_match",
            Field::MaritalStatusMatch => "marital_status_match",
            Field::ActiveLanguages => "active_languages",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = ProfileError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.name() == name)
            .ok_or_else(|| ProfileError::UnknownField(name.to_string()))
    }
}

/// Coerce a raw form value into `field` on `profile`
///
/// `null` clears the field. A value of the wrong shape (text for a number,
/// an unknown choice, a non-integer rank) is rejected with
/// `ProfileError::InvalidFieldType` and leaves the profile untouched.
/// Values of the right shape are stored even when a completion rule would
/// reject them; validation reports those.
pub fn assign(profile: &mut Profile, field: Field, value: Value) -> Result<(), ProfileError> {
    match field {
        Field::FirstName => profile.first_name = to_text(field, value)?.unwrap_or_default(),
        Field::DateOfBirth => profile.date_of_birth = to_date(field, value)?,
        Field::Gender => profile.gender = to_choice(field, value)?,
        Field::Photo => profile.photo = to_text(field, value)?,
        Field::ProfileDescription => profile.profile_description = to_text(field, value)?,
        Field::City => profile.city = to_text(field, value)?,
        Field::Height => profile.height = to_integer(field, value)?,
        Field::Children => profile.children = to_text(field, value)?,
        Field::MoreChildren => profile.more_children = to_text(field, value)?,
        Field::Diet => profile.diet = to_choice(field, value)?,
        Field::SmokingStatus => profile.smoking_status = to_choice(field, value)?,
        Field::MaritalStatus => profile.marital_status = to_choice(field, value)?,
        Field::MatchDescription => profile.match_description = to_text(field, value)?,
        Field::GenderToMatch => profile.gender_to_match = to_choice_list::<Gender>(field, value)?,
        Field::MinAgeToMatch => profile.min_age_to_match = to_integer(field, value)?,
        Field::MaxAgeToMatch => profile.max_age_to_match = to_integer(field, value)?,
        Field::MinMaxAgeToMatch => return Err(ProfileError::ReadOnlyField(field.name().to_string())),
        Field::DietMatch => profile.diet_match = to_rank_map(field, value)?,
        Field::SmokingStatusMatch => profile.smoking_status_match = to_rank_map(field, value)?,
        Field::MaritalStatusMatch => profile.marital_status_match = to_rank_map(field, value)?,
        Field::ActiveLanguages => profile.active_languages = to_languages(field, value)?,
    }
    Ok(())
}

/// Apply a batch of named edits; stops at the first bad name or value
pub fn assign_all<I>(profile: &mut Profile, edits: I) -> Result<(), ProfileError>
where
    I: IntoIterator<Item = (String, Value)>,
{
    for (name, value) in edits {
        let field = name.parse::<Field>()?;
        assign(profile, field, value)?;
    }
    Ok(())
}

fn invalid(field: Field, expected: &'static str) -> ProfileError {
    ProfileError::InvalidFieldType {
        field: field.name().to_string(),
        expected,
    }
}

fn to_text(field: Field, value: Value) -> Result<Option<String>, ProfileError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        _ => Err(invalid(field, "a string")),
    }
}

fn to_integer(field: Field, value: Value) -> Result<Option<i32>, ProfileError> {
    let number = match value {
        Value::Null => return Ok(None),
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    number
        .and_then(|n| i32::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| invalid(field, "an integer"))
}

fn to_date(field: Field, value: Value) -> Result<Option<NaiveDate>, ProfileError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid(field, "a date (YYYY-MM-DD)")),
        _ => Err(invalid(field, "a date (YYYY-MM-DD)")),
    }
}

fn choice_from<C: Choice>(value: &Value) -> Option<C> {
    match value {
        Value::String(key) if key == "unknown" => C::from_ordinal(0),
        Value::String(key) => C::from_key(key),
        Value::Number(number) => number.as_i64().and_then(C::from_ordinal),
        _ => None,
    }
}

fn to_choice<C: Choice>(field: Field, value: Value) -> Result<C, ProfileError> {
    if value.is_null() {
        return C::from_ordinal(0).ok_or_else(|| invalid(field, "a choice"));
    }
    choice_from(&value).ok_or_else(|| invalid(field, "one of the listed choices"))
}

fn to_choice_list<C: Choice>(field: Field, value: Value) -> Result<Vec<C>, ProfileError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| choice_from(item).ok_or_else(|| invalid(field, "a list of choices")))
            .collect(),
        _ => Err(invalid(field, "a list of choices")),
    }
}

fn to_rank_map<C: Choice>(field: Field, value: Value) -> Result<RankMap<C>, ProfileError> {
    match value {
        Value::Null => Ok(RankMap::empty()),
        Value::Object(entries) => {
            let raw = entries
                .into_iter()
                .map(|(key, rank)| rank.as_i64().map(|rank| (key, rank)))
                .collect::<Option<BTreeMap<String, i64>>>()
                .ok_or_else(|| invalid(field, "an object of integer ranks"))?;
            Ok(RankMap::from_raw(&raw))
        }
        _ => Err(invalid(field, "an object of integer ranks")),
    }
}

/// Accepts a list of codes or the comma-separated form ("en, he").
fn to_languages(field: Field, value: Value) -> Result<Vec<String>, ProfileError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(text) => Ok(text
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(code) => Ok(code),
                _ => Err(invalid(field, "a list of language codes")),
            })
            .collect(),
        _ => Err(invalid(field, "a list of language codes")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diet, Rank};
    use serde_json::json;

    #[test]
    fn test_field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>().unwrap(), field);
        }
        assert!(matches!("nickname".parse::<Field>(), Err(ProfileError::UnknownField(_))));
    }

    #[test]
    fn test_integer_coercion() {
        let mut profile = Profile::new("u");
        assign(&mut profile, Field::Height, json!(170)).unwrap();
        assert_eq!(profile.height, Some(170));
        assign(&mut profile, Field::Height, json!("181")).unwrap();
        assert_eq!(profile.height, Some(181));
        assign(&mut profile, Field::Height, json!(null)).unwrap();
        assert_eq!(profile.height, None);
    }

    #[test]
    fn test_non_integer_is_type_error() {
        let mut profile = Profile::new("u");
        profile.height = Some(170);
        for value in [json!("Tel Aviv."), json!(170.5), json!(true), json!([1])] {
            let err = assign(&mut profile, Field::Height, value).unwrap_err();
            assert!(matches!(err, ProfileError::InvalidFieldType { expected: "an integer", .. }));
        }
        assert_eq!(profile.height, Some(170));
    }

    #[test]
    fn test_out_of_range_integer_is_stored() {
        let mut profile = Profile::new("u");
        assign(&mut profile, Field::MinAgeToMatch, json!(-5)).unwrap();
        assert_eq!(profile.min_age_to_match, Some(-5));
    }

    #[test]
    fn test_choice_coercion() {
        let mut profile = Profile::new("u");
        assign(&mut profile, Field::Diet, json!("vegetarian")).unwrap();
        assert_eq!(profile.diet, Diet::Vegetarian);
        assign(&mut profile, Field::Diet, json!(1)).unwrap();
        assert_eq!(profile.diet, Diet::Vegan);
        assign(&mut profile, Field::Diet, json!(null)).unwrap();
        assert_eq!(profile.diet, Diet::Unknown);
        assert!(assign(&mut profile, Field::Diet, json!("fruitarian")).is_err());
        assert!(assign(&mut profile, Field::Diet, json!(9)).is_err());
    }

    #[test]
    fn test_rank_map_coercion() {
        let mut profile = Profile::new("u");
        assign(&mut profile, Field::DietMatch, json!({"vegan": 5, "vegetarian": 9})).unwrap();
        assert_eq!(profile.diet_match.rank_of(Diet::Vegan), Rank::IDEAL);
        assert!(!profile.diet_match.is_complete());

        let err = assign(&mut profile, Field::DietMatch, json!({"vegan": "five"})).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidFieldType { .. }));
    }

    #[test]
    fn test_languages_coercion() {
        let mut profile = Profile::new("u");
        assign(&mut profile, Field::ActiveLanguages, json!("en, he, de")).unwrap();
        assert_eq!(profile.active_languages, vec!["en", "he", "de"]);
        assign(&mut profile, Field::ActiveLanguages, json!("")).unwrap();
        assert!(profile.active_languages.is_empty());
        assign(&mut profile, Field::ActiveLanguages, json!(["en"])).unwrap();
        assert_eq!(profile.active_languages, vec!["en"]);
    }

    #[test]
    fn test_cross_field_rule_is_read_only() {
        let mut profile = Profile::new("u");
        let err = assign(&mut profile, Field::MinMaxAgeToMatch, json!(1)).unwrap_err();
        assert!(matches!(err, ProfileError::ReadOnlyField(_)));
    }

    #[test]
    fn test_assign_all_rejects_unknown_name() {
        let mut profile = Profile::new("u");
        let edits = vec![
            ("city".to_string(), json!("Haifa")),
            ("favourite_color".to_string(), json!("red")),
        ];
        assert!(matches!(assign_all(&mut profile, edits), Err(ProfileError::UnknownField(_))));
        assert_eq!(profile.city.as_deref(), Some("Haifa"));
    }
}
