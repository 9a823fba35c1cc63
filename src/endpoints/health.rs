//! Liveness and readiness probes

use super::{AppState, errors::ApiError, respond};
use crate::models::request::RequestContext;
use ntex::web;
use serde_json::json;

/// The process is up and serving requests
#[web::get("/live")]
pub async fn live(
    ctx: RequestContext,
    req: web::HttpRequest,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    let result = Ok(web::HttpResponse::Ok().json(&json!({ "status": "live" })));
    respond(&req, &app_state, &ctx, result)
}

/// Ready only when webhooks can be verified and the store answers
#[web::get("/ready")]
pub async fn ready(
    ctx: RequestContext,
    req: web::HttpRequest,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    let result = check_ready(&app_state)
        .await
        .map(|_| web::HttpResponse::Ok().json(&json!({ "status": "ready" })));
    respond(&req, &app_state, &ctx, result)
}

async fn check_ready(app_state: &AppState) -> Result<(), ApiError> {
    if app_state.webhook_secret.is_none() {
        logfire::warn!("Not ready: WEBHOOK_SECRET is not configured");
        return Err(ApiError::NotReady);
    }

    app_state.repo.ping().await.map_err(|e| {
        logfire::error!(
            "Not ready: database ping failed: {error}",
            error = format!("{e:#}")
        );
        ApiError::NotReady
    })
}
