use crate::{models, utils};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{MessageRepo, sqlite_queries};

const QUERY_SELECT_MESSAGES: &str =
    "SELECT message_id,from_msisdn,to_msisdn,ts,text,received_at FROM messages";

#[derive(Clone)]
pub struct SqlxSqliteRepo {
    pub db_pool: SqlitePool,
}

#[cfg(test)]
impl SqlxSqliteRepo {
    pub async fn get_message_by_id(
        &self,
        message_id: &str,
    ) -> anyhow::Result<Option<models::message::Message>> {
        Ok(
            sqlx::query_as::<_, models::message::Message>(sqlite_queries::QUERY_GET_MESSAGE_BY_ID)
                .bind(message_id)
                .fetch_optional(&self.db_pool)
                .await?,
        )
    }
}

/// Escapes `LIKE` wildcards so user text is matched literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_message_filters<'args>(
    builder: &mut QueryBuilder<'args, Sqlite>,
    filter: &'args models::message::MessageFilter,
) {
    builder.push(" WHERE 1=1");

    if let Some(from_msisdn) = &filter.from_msisdn {
        builder
            .push(" AND from_msisdn=")
            .push_bind(from_msisdn.as_str());
    }

    if let Some(since) = &filter.since {
        builder.push(" AND ts>=").push_bind(since.as_str());
    }

    if let Some(q) = &filter.q {
        builder
            .push(" AND LOWER(text) LIKE LOWER(")
            .push_bind(format!("%{}%", escape_like(q)))
            .push(") ESCAPE '\\'");
    }
}

#[async_trait]
impl MessageRepo for SqlxSqliteRepo {
    async fn insert_message(
        &self,
        message: &models::message::NewMessage,
    ) -> anyhow::Result<models::message::InsertOutcome> {
        let rows_affected = sqlx::query(sqlite_queries::QUERY_INSERT_MESSAGE)
            .bind(&message.message_id)
            .bind(&message.from_msisdn)
            .bind(&message.to_msisdn)
            .bind(&message.ts)
            .bind(&message.text)
            .bind(utils::utc_now_iso())
            .execute(&self.db_pool)
            .await?
            .rows_affected();

        // ON CONFLICT(message_id) DO NOTHING leaves the first writer's row untouched
        Ok(match rows_affected {
            0 => models::message::InsertOutcome::Duplicate,
            _ => models::message::InsertOutcome::Created,
        })
    }

    async fn list_messages(
        &self,
        filter: &models::message::MessageFilter,
    ) -> anyhow::Result<models::message::MessagePage> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM messages");
        push_message_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;

        let mut data_query = QueryBuilder::<Sqlite>::new(QUERY_SELECT_MESSAGES);
        push_message_filters(&mut data_query, filter);
        data_query
            .push(" ORDER BY ts ASC, message_id ASC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let data = data_query
            .build_query_as::<models::message::Message>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(models::message::MessagePage {
            data,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    async fn get_stats(&self, top_senders: i64) -> anyhow::Result<models::message::MessageStats> {
        let total_messages: i64 = sqlx::query_scalar(sqlite_queries::QUERY_COUNT_MESSAGES)
            .fetch_one(&self.db_pool)
            .await?;

        let senders_count: i64 = sqlx::query_scalar(sqlite_queries::QUERY_COUNT_SENDERS)
            .fetch_one(&self.db_pool)
            .await?;

        let messages_per_sender =
            sqlx::query_as::<_, models::message::SenderCount>(sqlite_queries::QUERY_TOP_SENDERS)
                .bind(top_senders)
                .fetch_all(&self.db_pool)
                .await?;

        let (first_message_ts, last_message_ts): (Option<String>, Option<String>) =
            sqlx::query_as(sqlite_queries::QUERY_MESSAGES_TS_RANGE)
                .fetch_one(&self.db_pool)
                .await?;

        Ok(models::message::MessageStats {
            total_messages,
            senders_count,
            messages_per_sender,
            first_message_ts,
            last_message_ts,
        })
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(sqlx::query(sqlite_queries::QUERY_PING)
            .execute(&self.db_pool)
            .await
            .map(|_| ())?)
    }
}
