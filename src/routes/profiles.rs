use actix_web::{web, HttpResponse, Responder};

use crate::core::{assign_all, MatchProfile, SiteProfile};
use crate::models::{ActivationStepRequest, Profile, ProfileUpdateRequest, ValidationResponse};
use crate::routes::matches::AppState;
use crate::routes::{profile_error_response, store_error_response};
use crate::services::StoreError;

/// Configure profile editing and activation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/profiles/{user_id}", web::patch().to(update_profile))
        .route("/profiles/{user_id}/activation-step", web::post().to(move_activation_step))
        .route("/profiles/{user_id}/activate", web::post().to(activate_profile))
        .route("/profiles/{user_id}/deactivate", web::post().to(deactivate_profile));
}

/// Apply form edits
///
/// PATCH /api/v1/profiles/{userId}
///
/// The body maps field names to raw values. A profile that is not stored
/// yet starts out empty. An edit that leaves an active profile incomplete
/// deactivates it, and the form cursor is pulled back to the validated step.
async fn update_profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ProfileUpdateRequest>,
) -> impl Responder {
    let user_id = path.into_inner();

    let mut profile = match state.store.get_profile(&user_id).await {
        Ok(profile) => profile,
        Err(StoreError::NotFound(_)) => Profile::new(user_id.as_str()),
        Err(e) => return store_error_response(&e),
    };

    if let Err(e) = assign_all(&mut profile, body.into_inner()) {
        return profile_error_response(&e);
    }

    let report = state.validator.validate(&profile);
    let mut profile = MatchProfile::new(profile);
    if profile.is_active() && !report.is_complete() {
        tracing::info!("Profile {} is incomplete at step {}, deactivating", user_id, report.step);
        profile.deactivate();
    }
    let mut profile = profile.into_inner();
    profile.activation_step = profile.activation_step.min(report.step);
    profile.last_visit = chrono::Utc::now();

    if let Err(e) = state.store.save_profile(&profile).await {
        return store_error_response(&e);
    }

    HttpResponse::Ok().json(ValidationResponse::new(report, &profile))
}

/// Resume or step back through the activation form
///
/// POST /api/v1/profiles/{userId}/activation-step
///
/// `{"back": true}` moves one step back; `{"step": n}` moves to `n`, but never
/// past the furthest step the profile validates to.
async fn move_activation_step(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ActivationStepRequest>,
) -> impl Responder {
    let user_id = path.into_inner();

    let mut profile = match state.store.get_profile(&user_id).await {
        Ok(profile) => profile,
        Err(e) => return store_error_response(&e),
    };

    let report = if body.back {
        profile.step_back();
        state.validator.validate(&profile)
    } else {
        let requested = body.step.unwrap_or(profile.activation_step);
        state.validator.go_to_step(&mut profile, requested)
    };

    if let Err(e) = state.store.save_profile(&profile).await {
        return store_error_response(&e);
    }
    tracing::debug!("Profile {} activation form at step {}", user_id, profile.activation_step);

    HttpResponse::Ok().json(ValidationResponse::new(report, &profile))
}

/// Validate and activate
///
/// POST /api/v1/profiles/{userId}/activate
///
/// Responds 200 either way; `isActive` and `errors` tell the outcome.
async fn activate_profile(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();

    let mut profile = match state.store.get_profile(&user_id).await {
        Ok(profile) => MatchProfile::new(profile),
        Err(e) => return store_error_response(&e),
    };

    let report = match state.validator.validate_and_activate(&mut profile) {
        Ok(report) => report,
        Err(e) => return profile_error_response(&e),
    };

    if report.is_complete() {
        if let Err(e) = state.store.save_profile(profile.profile()).await {
            return store_error_response(&e);
        }
        tracing::info!("Activated profile {}", user_id);
    } else {
        tracing::debug!("Profile {} not activated, failed step {}", user_id, report.step + 1);
    }

    HttpResponse::Ok().json(ValidationResponse::new(report, profile.profile()))
}

/// POST /api/v1/profiles/{userId}/deactivate
async fn deactivate_profile(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();

    let mut profile = match state.store.get_profile(&user_id).await {
        Ok(profile) => MatchProfile::new(profile),
        Err(e) => return store_error_response(&e),
    };

    profile.deactivate();
    if let Err(e) = state.store.save_profile(profile.profile()).await {
        return store_error_response(&e);
    }

    let report = state.validator.validate(profile.profile());
    tracing::info!("Deactivated profile {}", user_id);

    HttpResponse::Ok().json(ValidationResponse::new(report, profile.profile()))
}
