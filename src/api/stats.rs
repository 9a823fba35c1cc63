use crate::{consts, models, repo};

/// Store-wide aggregates with the busiest senders first
pub async fn get_stats(
    repo: &repo::ImplMessageRepo,
) -> anyhow::Result<models::message::MessageStats> {
    repo.get_stats(consts::STATS_TOP_SENDERS).await
}
