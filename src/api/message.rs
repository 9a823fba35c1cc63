use crate::{consts, models, repo};
use derive_more::{Display, Error};
use serde::Deserialize;

/// Raw `GET /messages` query string.
///
/// Numbers are kept as strings so that a bad value is reported as a
/// parameter error instead of a generic deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct ListMessagesQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub from: Option<String>,
    pub since: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[display("malformed query string: {_0}")]
    MalformedQuery(#[error(not(source))] String),
    #[display("limit must be an integer between 1 and {}", consts::MESSAGES_MAX_LIMIT)]
    InvalidLimit,
    #[display("offset must be a non-negative integer")]
    InvalidOffset,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ListMessagesQuery {
    /// Applies defaults and range checks; empty filters are ignored
    pub fn into_filter(self) -> Result<models::message::MessageFilter, QueryError> {
        let limit = match self.limit.as_deref() {
            None | Some("") => consts::MESSAGES_DEFAULT_LIMIT,
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|limit| (1..=consts::MESSAGES_MAX_LIMIT).contains(limit))
                .ok_or(QueryError::InvalidLimit)?,
        };

        let offset = match self.offset.as_deref() {
            None | Some("") => 0,
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|offset| *offset >= 0)
                .ok_or(QueryError::InvalidOffset)?,
        };

        Ok(models::message::MessageFilter {
            limit,
            offset,
            from_msisdn: non_empty(self.from),
            since: non_empty(self.since),
            q: non_empty(self.q),
        })
    }
}

/// Lists stored messages ordered by `ts`, then `message_id`
pub async fn list_messages(
    filter: &models::message::MessageFilter,
    repo: &repo::ImplMessageRepo,
) -> anyhow::Result<models::message::MessagePage> {
    repo.list_messages(filter).await
}
