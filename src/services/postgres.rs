use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Row};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::DatabaseSettings;
use crate::models::{CandidateQuery, Choice, ExclusionSet, Profile, RankMap};
use crate::services::store::{AttributeStore, BlockStore, ExclusionResolver, StoreError};

/// One row of `match_profiles`
///
/// Choice columns hold ordinals. The `*_to_match` arrays are the coarse
/// preference sets derived from the rank maps on every save, so that
/// candidate queries can test containment without reading the JSON.
#[derive(Debug, FromRow)]
struct ProfileRow {
    user_id: String,
    first_name: String,
    gender: i16,
    date_of_birth: Option<NaiveDate>,
    diet: i16,
    smoking_status: i16,
    marital_status: i16,
    height: Option<i32>,
    photo: Option<String>,
    profile_description: Option<String>,
    city: Option<String>,
    children: Option<String>,
    more_children: Option<String>,
    match_description: Option<String>,
    gender_to_match: Vec<i16>,
    min_age_to_match: Option<i32>,
    max_age_to_match: Option<i32>,
    diet_match: Json<BTreeMap<String, i64>>,
    smoking_status_match: Json<BTreeMap<String, i64>>,
    marital_status_match: Json<BTreeMap<String, i64>>,
    active_languages: Vec<String>,
    not_allowed_to_use_matching: bool,
    is_active: bool,
    last_visit: DateTime<Utc>,
    number_of_matches: i32,
    activation_step: i16,
}

fn choice<C: Choice>(column: &str, ordinal: i16) -> Result<C, StoreError> {
    C::from_ordinal(ordinal as i64)
        .ok_or_else(|| StoreError::InvalidData(format!("{} has unknown ordinal {}", column, ordinal)))
}

fn ordinals<C: Choice>(values: &[C]) -> Vec<i16> {
    values.iter().map(|value| value.ordinal() as i16).collect()
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            gender: choice("gender", row.gender)?,
            diet: choice("diet", row.diet)?,
            smoking_status: choice("smoking_status", row.smoking_status)?,
            marital_status: choice("marital_status", row.marital_status)?,
            gender_to_match: row
                .gender_to_match
                .iter()
                .map(|ordinal| choice("gender_to_match", *ordinal))
                .collect::<Result<_, _>>()?,
            diet_match: RankMap::from_raw(&row.diet_match.0),
            smoking_status_match: RankMap::from_raw(&row.smoking_status_match.0),
            marital_status_match: RankMap::from_raw(&row.marital_status_match.0),
            number_of_matches: u32::try_from(row.number_of_matches)
                .map_err(|_| StoreError::InvalidData(format!("negative match count for {}", row.user_id)))?,
            activation_step: usize::try_from(row.activation_step)
                .map_err(|_| StoreError::InvalidData(format!("negative activation step for {}", row.user_id)))?,
            user_id: row.user_id,
            first_name: row.first_name,
            date_of_birth: row.date_of_birth,
            height: row.height,
            photo: row.photo,
            profile_description: row.profile_description,
            city: row.city,
            children: row.children,
            more_children: row.more_children,
            match_description: row.match_description,
            min_age_to_match: row.min_age_to_match,
            max_age_to_match: row.max_age_to_match,
            active_languages: row.active_languages,
            not_allowed_to_use_matching: row.not_allowed_to_use_matching,
            is_active: row.is_active,
            last_visit: row.last_visit,
        })
    }
}

const PROFILE_COLUMNS: &str = r#"
    user_id, first_name, gender, date_of_birth, diet, smoking_status, marital_status,
    height, photo, profile_description, city, children, more_children, match_description,
    gender_to_match, min_age_to_match, max_age_to_match,
    diet_match, smoking_status_match, marital_status_match, active_languages,
    not_allowed_to_use_matching, is_active, last_visit, number_of_matches, activation_step
"#;

/// PostgreSQL-backed attribute and block store
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

#[async_trait]
impl AttributeStore for PostgresClient {
    async fn get_profile(&self, user_id: &str) -> Result<Profile, StoreError> {
        let query = format!("SELECT {} FROM match_profiles WHERE user_id = $1", PROFILE_COLUMNS);

        let row = sqlx::query_as::<_, ProfileRow>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", user_id)))?;

        row.try_into()
    }

    async fn query_candidates(&self, query: &CandidateQuery) -> Result<Vec<Profile>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM match_profiles
            WHERE user_id <> $1
              AND gender = ANY($2)
              AND diet = ANY($3)
              AND smoking_status = ANY($4)
              AND marital_status = ANY($5)
              AND gender_to_match @> ARRAY[$6]::SMALLINT[]
              AND diet_to_match @> ARRAY[$7]::SMALLINT[]
              AND smoking_status_to_match @> ARRAY[$8]::SMALLINT[]
              AND marital_status_to_match @> ARRAY[$9]::SMALLINT[]
              AND date_of_birth BETWEEN $10 AND $11
              AND $12 BETWEEN min_age_to_match AND max_age_to_match
              AND height BETWEEN $13 AND $14
              AND NOT not_allowed_to_use_matching
              AND $15 = ANY(active_languages)
            ORDER BY last_visit DESC, user_id
            LIMIT $16
            "#,
            PROFILE_COLUMNS
        );

        let rows = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(&query.requester_id)
            .bind(ordinals(&query.genders))
            .bind(ordinals(&query.diets))
            .bind(ordinals(&query.smoking_statuses))
            .bind(ordinals(&query.marital_statuses))
            .bind(query.requester_gender.ordinal() as i16)
            .bind(query.requester_diet.ordinal() as i16)
            .bind(query.requester_smoking_status.ordinal() as i16)
            .bind(query.requester_marital_status.ordinal() as i16)
            .bind(query.oldest_birth_date)
            .bind(query.youngest_birth_date)
            .bind(query.requester_age)
            .bind(query.min_height)
            .bind(query.max_height)
            .bind(&query.language_code)
            .bind(query.limit as i64)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Candidate query for {} returned {} rows", query.requester_id, rows.len());

        rows.into_iter().map(Profile::try_from).collect()
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO match_profiles (
                user_id, first_name, gender, date_of_birth, diet, smoking_status, marital_status,
                height, photo, profile_description, city, children, more_children, match_description,
                gender_to_match, min_age_to_match, max_age_to_match,
                diet_match, smoking_status_match, marital_status_match,
                diet_to_match, smoking_status_to_match, marital_status_to_match,
                active_languages, not_allowed_to_use_matching, is_active, last_visit, number_of_matches,
                activation_step
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29)
            ON CONFLICT (user_id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                gender = EXCLUDED.gender,
                date_of_birth = EXCLUDED.date_of_birth,
                diet = EXCLUDED.diet,
                smoking_status = EXCLUDED.smoking_status,
                marital_status = EXCLUDED.marital_status,
                height = EXCLUDED.height,
                photo = EXCLUDED.photo,
                profile_description = EXCLUDED.profile_description,
                city = EXCLUDED.city,
                children = EXCLUDED.children,
                more_children = EXCLUDED.more_children,
                match_description = EXCLUDED.match_description,
                gender_to_match = EXCLUDED.gender_to_match,
                min_age_to_match = EXCLUDED.min_age_to_match,
                max_age_to_match = EXCLUDED.max_age_to_match,
                diet_match = EXCLUDED.diet_match,
                smoking_status_match = EXCLUDED.smoking_status_match,
                marital_status_match = EXCLUDED.marital_status_match,
                diet_to_match = EXCLUDED.diet_to_match,
                smoking_status_to_match = EXCLUDED.smoking_status_to_match,
                marital_status_to_match = EXCLUDED.marital_status_to_match,
                active_languages = EXCLUDED.active_languages,
                not_allowed_to_use_matching = EXCLUDED.not_allowed_to_use_matching,
                is_active = EXCLUDED.is_active,
                last_visit = EXCLUDED.last_visit,
                number_of_matches = EXCLUDED.number_of_matches,
                activation_step = EXCLUDED.activation_step
        "#;

        sqlx::query(query)
            .bind(&profile.user_id)
            .bind(&profile.first_name)
            .bind(profile.gender.ordinal() as i16)
            .bind(profile.date_of_birth)
            .bind(profile.diet.ordinal() as i16)
            .bind(profile.smoking_status.ordinal() as i16)
            .bind(profile.marital_status.ordinal() as i16)
            .bind(profile.height)
            .bind(&profile.photo)
            .bind(&profile.profile_description)
            .bind(&profile.city)
            .bind(&profile.children)
            .bind(&profile.more_children)
            .bind(&profile.match_description)
            .bind(ordinals(&profile.gender_to_match))
            .bind(profile.min_age_to_match)
            .bind(profile.max_age_to_match)
            .bind(Json(profile.diet_match.to_raw()))
            .bind(Json(profile.smoking_status_match.to_raw()))
            .bind(Json(profile.marital_status_match.to_raw()))
            .bind(ordinals(&profile.diet_to_match()))
            .bind(ordinals(&profile.smoking_status_to_match()))
            .bind(ordinals(&profile.marital_status_to_match()))
            .bind(&profile.active_languages)
            .bind(profile.not_allowed_to_use_matching)
            .bind(profile.is_active)
            .bind(profile.last_visit)
            .bind(profile.number_of_matches as i32)
            .bind(profile.activation_step as i16)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Saved profile {}", profile.user_id);
        Ok(())
    }

    async fn set_number_of_matches(&self, user_id: &str, number_of_matches: u32) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE match_profiles SET number_of_matches = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(number_of_matches as i32)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("profile {}", user_id)));
        }
        Ok(())
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl ExclusionResolver for PostgresClient {
    async fn excluded_ids(&self, user_id: &str) -> Result<ExclusionSet, StoreError> {
        let query = r#"
            SELECT blocked_id AS user_id FROM blocks WHERE blocker_id = $1
            UNION
            SELECT blocker_id AS user_id FROM blocks WHERE blocked_id = $1
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        let excluded: ExclusionSet = rows.iter().map(|row| row.get("user_id")).collect();

        tracing::debug!("User {} has {} exclusions", user_id, excluded.len());

        Ok(excluded)
    }
}

#[async_trait]
impl BlockStore for PostgresClient {
    async fn insert_block(&self, blocker_id: &str, blocked_id: &str) -> Result<bool, StoreError> {
        let query = r#"
            INSERT INTO blocks (blocker_id, blocked_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (blocker_id, blocked_id) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(blocker_id)
            .bind(blocked_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_block(&self, blocker_id: &str, blocked_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM blocks WHERE blocker_id = $1 AND blocked_id = $2")
            .bind(blocker_id)
            .bind(blocked_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
