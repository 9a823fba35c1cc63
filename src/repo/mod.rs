pub mod sqlite;
pub mod sqlite_queries;

use crate::models;
use async_trait::async_trait;

/// Message Store port.
///
/// `insert_message` must be atomic per `message_id`: among concurrent callers
/// with the same id exactly one observes [`models::message::InsertOutcome::Created`].
/// Errors are storage failures only, a duplicate id is never an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepo: Send + Sync {
    async fn insert_message(
        &self,
        message: &models::message::NewMessage,
    ) -> anyhow::Result<models::message::InsertOutcome>;

    async fn list_messages(
        &self,
        filter: &models::message::MessageFilter,
    ) -> anyhow::Result<models::message::MessagePage>;

    async fn get_stats(&self, top_senders: i64) -> anyhow::Result<models::message::MessageStats>;

    /// Cheap round trip used by the readiness probe
    async fn ping(&self) -> anyhow::Result<()>;
}

pub type ImplMessageRepo = Box<dyn MessageRepo>;
