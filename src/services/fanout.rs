use tracing::debug;

use crate::{dto::sse::RankingsEvent, services::score_service, state::SharedState};

/// Push the current top-K for a game type to everyone subscribed to its
/// topic.
///
/// Best effort end to end: the snapshot is whatever the query path returns
/// right now, delivery carries no acknowledgment, and a missed broadcast is
/// superseded by the next one.
pub async fn broadcast_rankings(state: &SharedState, game_type: &str) {
    let top_k = state.config().broadcast_top_k();
    let entries = score_service::get_top_rankings(state, game_type, top_k).await;

    debug!(
        %game_type,
        count = entries.len(),
        subscribers = state.ranking_hub().subscriber_count(game_type),
        "broadcasting rankings snapshot"
    );

    state.ranking_hub().broadcast(RankingsEvent {
        game_type: game_type.to_owned(),
        entries,
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{bus, config::AppConfig, dao::score_store::memory::MemoryScoreStore, state::AppState};

    #[tokio::test]
    async fn subscribers_receive_current_snapshot() {
        let (bus, _receiver) = bus::channel(8);
        let state = AppState::new(AppConfig::default(), bus);
        state
            .install_score_store(Arc::new(MemoryScoreStore::new()))
            .await;
        state.rankings().apply("snake", "Alice", 100);
        state.rankings().apply("snake", "Bob", 200);

        let mut subscriber = state.ranking_hub().subscribe("snake");
        broadcast_rankings(&state, "snake").await;

        let event = subscriber.recv().await.unwrap();
        assert_eq!(event.game_type, "snake");
        let names: Vec<&str> = event
            .entries
            .iter()
            .map(|entry| entry.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_is_harmless() {
        let (bus, _receiver) = bus::channel(8);
        let state = AppState::new(AppConfig::default(), bus);
        broadcast_rankings(&state, "snake").await;
    }
}
