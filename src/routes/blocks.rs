use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{BlockRequest, BlockResponse};
use crate::routes::matches::AppState;
use crate::routes::{error_response, store_error_response};

/// Configure block routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/blocks", web::post().to(block_user))
        .route("/blocks", web::delete().to(unblock_user));
}

/// POST /api/v1/blocks `{ "blockerId": "...", "blockedId": "..." }`
async fn block_user(state: web::Data<AppState>, req: web::Json<BlockRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    match state.blocks.block(&req.blocker_id, &req.blocked_id).await {
        Ok(changed) => HttpResponse::Ok().json(BlockResponse { changed }),
        Err(e) => store_error_response(&e),
    }
}

/// DELETE /api/v1/blocks, same body as POST
async fn unblock_user(state: web::Data<AppState>, req: web::Json<BlockRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    match state.blocks.unblock(&req.blocker_id, &req.blocked_id).await {
        Ok(changed) => HttpResponse::Ok().json(BlockResponse { changed }),
        Err(e) => store_error_response(&e),
    }
}
