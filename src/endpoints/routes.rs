//! Route tables for the read side and the probes.
//!
//! Each function is handed to `App::configure` at startup.

use super::{AppState, errors::ApiError, health, messages, metrics, respond, stats};
use crate::models::request::RequestContext;
use ntex::web;

/// Configures probe routes.
///
/// # Routes
/// - `GET /health/live` - Process is up
/// - `GET /health/ready` - Secret configured and database reachable
pub fn health(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").service((health::live, health::ready)));
}

/// Configures message read routes.
///
/// # Routes
/// - `GET /messages` - Filtered, paginated listing
/// - `GET /stats` - Aggregates over all stored messages
pub fn messages(cfg: &mut web::ServiceConfig) {
    cfg.service((messages::list_messages, stats::get_stats));
}

/// Configures the metrics scrape route.
///
/// # Routes
/// - `GET /metrics` - Prometheus text exposition
pub fn metrics(cfg: &mut web::ServiceConfig) {
    cfg.service(metrics::get_metrics);
}

/// Default service for unknown routes
pub async fn not_found(
    ctx: RequestContext,
    req: web::HttpRequest,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(&req, &app_state, &ctx, Err(ApiError::NotFound))
}
