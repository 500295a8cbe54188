// Route exports
pub mod blocks;
pub mod matches;
pub mod profiles;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};

use crate::core::{MatchError, ProfileError};
use crate::models::ErrorResponse;
use crate::services::StoreError;

pub use matches::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(profiles::configure)
            .configure(blocks::configure),
    );
}

pub(crate) fn error_response(status: StatusCode, error: &str, message: impl ToString) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: status.as_u16(),
    })
}

pub(crate) fn store_error_response(error: &StoreError) -> HttpResponse {
    match error {
        StoreError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "Not found", error),
        StoreError::InvalidInput(_) => error_response(StatusCode::BAD_REQUEST, "Invalid input", error),
        _ => {
            tracing::error!("Store failure: {}", error);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Store failure", error)
        }
    }
}

pub(crate) fn profile_error_response(error: &ProfileError) -> HttpResponse {
    match error {
        ProfileError::UnknownField(_) | ProfileError::ReadOnlyField(_) | ProfileError::InvalidFieldType { .. } => {
            error_response(StatusCode::BAD_REQUEST, "Invalid profile field", error)
        }
        ProfileError::ActivateNotImplemented | ProfileError::MissingStepConfiguration(_) => {
            tracing::error!("Profile precondition violated: {}", error);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Profile error", error)
        }
    }
}

pub(crate) fn match_error_response(error: &MatchError) -> HttpResponse {
    match error {
        MatchError::Store(e) => store_error_response(e),
    }
}

/// JSON body rejected before reaching a handler
pub fn handle_json_payload_error(err: actix_web::error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    let response = error_response(StatusCode::BAD_REQUEST, "invalid_json", format!("Invalid JSON: {}", err));
    actix_web::error::InternalError::from_response(err, response).into()
}

/// Path segment rejected before reaching a handler
pub fn handle_path_error(err: actix_web::error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    let response = error_response(StatusCode::BAD_REQUEST, "invalid_path", format!("Invalid path: {}", err));
    actix_web::error::InternalError::from_response(err, response).into()
}
