use super::{AppState, errors::ApiError, respond};
use crate::{
    api::{
        self,
        message::{ListMessagesQuery, QueryError},
    },
    models::request::RequestContext,
};
use ntex::web;

/// Lists stored messages
///
/// # Query Parameters
/// - `limit` - page size, 1 to 100 (default 50)
/// - `offset` - rows to skip (default 0)
/// - `from` - exact sender
/// - `since` - lower bound on `ts`, inclusive
/// - `q` - case-insensitive substring of `text`
#[web::get("/messages")]
pub async fn list_messages(
    ctx: RequestContext,
    req: web::HttpRequest,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    let result = fetch_page(&req, &app_state).await;
    respond(&req, &app_state, &ctx, result)
}

async fn fetch_page(
    req: &web::HttpRequest,
    app_state: &AppState,
) -> Result<web::HttpResponse, ApiError> {
    let filter = web::types::Query::<ListMessagesQuery>::from_query(req.query_string())
        .map_err(|e| ApiError::InvalidQuery(QueryError::MalformedQuery(e.to_string())))?
        .into_inner()
        .into_filter()
        .map_err(ApiError::InvalidQuery)?;

    let page = api::message::list_messages(&filter, &app_state.repo)
        .await
        .map_err(|e| {
            logfire::error!("Failed to list messages: {error}", error = format!("{e:#}"));
            ApiError::InternalServerError(format!("{e:#}"))
        })?;

    Ok(web::HttpResponse::Ok().json(&page))
}
