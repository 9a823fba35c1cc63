use super::{AppState, respond};
use crate::{consts, models::request::RequestContext};
use ntex::web;

/// Counter values in Prometheus text exposition format
#[web::get("/metrics")]
pub async fn get_metrics(
    ctx: RequestContext,
    req: web::HttpRequest,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    let body = app_state.observer.render_metrics();
    let result = Ok(web::HttpResponse::Ok()
        .content_type(consts::PROMETHEUS_CONTENT_TYPE)
        .body(body));

    respond(&req, &app_state, &ctx, result)
}
