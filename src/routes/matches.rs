use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::config::Settings;
use crate::core::{Matcher, ProfileError, ProfileValidator};
use crate::models::{FindMatchesRequest, FindMatchesResponse, HealthResponse, MatchSummary};
use crate::routes::{error_response, match_error_response, store_error_response};
use crate::services::{AttributeStore, BlockService, BlockStore, ExclusionResolver};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AttributeStore>,
    pub exclusions: Arc<dyn ExclusionResolver>,
    pub blocks: BlockService,
    pub matcher: Matcher,
    pub validator: ProfileValidator,
}

impl AppState {
    /// Wire the handlers to one store; `exclusions` may be a cached view of it
    pub fn new<S>(store: Arc<S>, exclusions: Arc<dyn ExclusionResolver>, settings: &Settings) -> Result<Self, ProfileError>
    where
        S: AttributeStore + BlockStore + 'static,
    {
        Ok(Self {
            blocks: BlockService::new(store.clone()),
            store,
            exclusions,
            matcher: Matcher::new(settings.matching.clone()),
            validator: ProfileValidator::new(&settings.profile)?,
        })
    }
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find matches endpoint
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "languageCode": "en"
/// }
/// ```
async fn find_matches(state: web::Data<AppState>, req: web::Json<FindMatchesRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_matches request: {:?}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let user_id = &req.user_id;
    let language_code = req
        .language_code
        .as_deref()
        .unwrap_or(&state.matcher.settings().default_language);

    tracing::info!("Finding matches for user: {}, language: {}", user_id, language_code);

    let requester = match state.store.get_profile(user_id).await {
        Ok(profile) => profile,
        Err(e) => return store_error_response(&e),
    };

    let result = match state
        .matcher
        .get_matches(&*state.store, &*state.exclusions, &requester, language_code)
        .await
    {
        Ok(result) => result,
        Err(e) => return match_error_response(&e),
    };

    let today = chrono::Utc::now().date_naive();
    let response = FindMatchesResponse {
        matches: result
            .matches
            .iter()
            .map(|ranked| MatchSummary::from_ranked(ranked, today))
            .collect(),
        number_of_matches: result.matches.len(),
        total_candidates: result.total_candidates,
    };

    tracing::info!(
        "Returning {} matches for user {} (from {} candidates)",
        response.number_of_matches,
        user_id,
        result.total_candidates
    );

    HttpResponse::Ok().json(response)
}
