use crate::{
    api::{message::QueryError, webhook::IngestError},
    webhook::schemas::ValidationError,
};
use derive_more::{Display, Error};
use ntex::{http, web};
use serde_json::json;

/// Error responses of the JSON API, rendered as `{"detail": "..."}`
#[derive(Debug, Display, Error)]
pub enum ApiError {
    #[display("bad request: {_0}")]
    BadRequest(#[error(not(source))] String),
    #[display("invalid signature")]
    InvalidSignature,
    #[display("{_0}")]
    Validation(ValidationError),
    #[display("{_0}")]
    InvalidQuery(QueryError),
    #[display("not found")]
    NotFound,
    #[display("not ready")]
    NotReady,
    /// Logged where it happens, the client only sees a generic message
    InternalServerError(#[error(not(source))] String),
}

impl ApiError {
    fn detail(&self) -> String {
        match self {
            ApiError::InternalServerError(_) => "internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(error: IngestError) -> Self {
        match error {
            IngestError::InvalidSignature => ApiError::InvalidSignature,
            IngestError::Validation(e) => ApiError::Validation(e),
            IngestError::Persistence(e) => ApiError::InternalServerError(format!("{e:#}")),
        }
    }
}

impl web::error::WebResponseError for ApiError {
    fn error_response(&self, _: &web::HttpRequest) -> web::HttpResponse {
        web::HttpResponse::build(self.status_code()).json(&json!({ "detail": self.detail() }))
    }

    fn status_code(&self) -> http::StatusCode {
        match *self {
            ApiError::BadRequest(_) => http::StatusCode::BAD_REQUEST,
            ApiError::InvalidSignature => http::StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) | ApiError::InvalidQuery(_) => {
                http::StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::NotFound => http::StatusCode::NOT_FOUND,
            ApiError::NotReady => http::StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalServerError(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
