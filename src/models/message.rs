use serde::Serialize;

/// A validated webhook message that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub message_id: String,
    pub from_msisdn: String,
    pub to_msisdn: String,
    pub ts: String,
    pub text: Option<String>,
}

/// A stored message row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Message {
    pub message_id: String,
    #[serde(rename = "from")]
    pub from_msisdn: String,
    #[serde(rename = "to")]
    pub to_msisdn: String,
    pub ts: String,
    pub text: Option<String>,
    #[serde(skip_serializing)]
    pub received_at: String,
}

/// Result of an idempotent insert keyed by `message_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    Duplicate,
}

impl InsertOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate)
    }
}

/// Filters and pagination for listing stored messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub limit: i64,
    pub offset: i64,
    pub from_msisdn: Option<String>,
    pub since: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessagePage {
    pub data: Vec<Message>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SenderCount {
    #[serde(rename = "from")]
    pub from_msisdn: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageStats {
    pub total_messages: i64,
    pub senders_count: i64,
    pub messages_per_sender: Vec<SenderCount>,
    pub first_message_ts: Option<String>,
    pub last_message_ts: Option<String>,
}
