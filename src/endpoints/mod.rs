//! HTTP surface of the service: shared state, error responses, route tables
//! and the read-side handlers. The webhook receiver lives in
//! [`crate::webhook::routes`].

pub mod errors;
pub mod health;
pub mod messages;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod stats;

use crate::{
    consts,
    logger::{LogEvent, LogLevel},
    metric::CounterName,
    models::request::RequestContext,
    repo, services,
};
use ntex::{
    http::header::{HeaderName, HeaderValue},
    web::{self, error::WebResponseError},
};

pub struct AppState {
    pub repo: repo::ImplMessageRepo,
    pub observer: services::ImplObservabilitySink,
    /// `None` when `WEBHOOK_SECRET` is not configured
    pub webhook_secret: Option<String>,
}

/// Closes a request: renders the error if any, emits the access event,
/// counts the request and echoes the request id.
pub fn respond(
    req: &web::HttpRequest,
    app_state: &AppState,
    ctx: &RequestContext,
    result: Result<web::HttpResponse, errors::ApiError>,
) -> web::HttpResponse {
    let mut response = result.unwrap_or_else(|e| e.error_response(req));
    let status = response.status().as_u16();

    let level = match status {
        500.. => LogLevel::Error,
        400.. => LogLevel::Warn,
        _ => LogLevel::Info,
    };
    let mut event = LogEvent::new(
        level,
        "request completed",
        &ctx.request_id,
        &ctx.method,
        &ctx.path,
        status,
    );
    event.latency_ms = Some(ctx.elapsed_ms());
    app_state.observer.log_event(&event);

    let status_label = status.to_string();
    app_state.observer.incr_counter(
        CounterName::HttpRequests,
        &[("path", ctx.path.as_str()), ("status", status_label.as_str())],
    );

    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response.headers_mut().insert(
            HeaderName::from_static(consts::REQUEST_ID_HEADER),
            value,
        );
    }

    response
}
