use super::{AppState, errors::ApiError, respond};
use crate::{api, models::request::RequestContext};
use ntex::web;

/// Store-wide message aggregates
#[web::get("/stats")]
pub async fn get_stats(
    ctx: RequestContext,
    req: web::HttpRequest,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    let result = api::stats::get_stats(&app_state.repo)
        .await
        .map(|stats| web::HttpResponse::Ok().json(&stats))
        .map_err(|e| {
            logfire::error!("Failed to get stats: {error}", error = format!("{e:#}"));
            ApiError::InternalServerError(format!("{e:#}"))
        });

    respond(&req, &app_state, &ctx, result)
}
