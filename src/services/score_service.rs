use tokio::time::timeout;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    bus::ScoreEvent,
    dao::models::ScoreRecord,
    dto::game::{PlayerScoreEntry, RankingEntry, ScoreSubmission},
    error::ServiceError,
    state::SharedState,
};

/// Accept a score submission: durably append it, then notify the ranking
/// pipeline.
///
/// The durable append is the only step that can fail the submission. Once
/// it commits, the event publish is best effort: if the bus rejects the
/// event, the leaderboard update is applied directly in-process and the
/// submission still succeeds.
pub async fn submit_score(
    state: &SharedState,
    submission: ScoreSubmission,
) -> Result<(), ServiceError> {
    validate_submission(&submission)?;

    let ScoreSubmission {
        player_id,
        display_name,
        score,
        game_type,
    } = submission;

    let store = state.require_score_store().await?;
    let record = ScoreRecord::new(
        player_id.clone(),
        display_name.clone(),
        score,
        game_type.clone(),
    );
    store.append_score(record).await?;
    info!(%player_id, %game_type, score, "score stored");

    let event = ScoreEvent::new(player_id, display_name, score, game_type);
    if let Err(err) = state.score_bus().publish(event.clone()) {
        // Durability never depends on the bus: fall back to updating the
        // leaderboard synchronously. Subscribers catch up on the next
        // successful broadcast.
        warn!(
            error = %err,
            game_type = %event.game_type,
            "score event publish failed; updating rankings in-process"
        );
        state
            .rankings()
            .apply(&event.game_type, &event.display_name, event.score);
    }

    Ok(())
}

/// The current top `limit` rankings for a game type, best first.
///
/// Reads the leaderboard cache when it has entries for the game type and
/// otherwise recomputes from the score store. Both paths absorb their own
/// failures; the worst case is an empty list, never an error.
pub async fn get_top_rankings(
    state: &SharedState,
    game_type: &str,
    limit: usize,
) -> Vec<RankingEntry> {
    let budget = state.config().fallback_query_timeout();

    let cached = timeout(budget, async { state.rankings().top(game_type, limit) })
        .await
        .unwrap_or_else(|_| {
            warn!(%game_type, "leaderboard read timed out; falling back to score store");
            None
        });

    if let Some(entries) = cached
        && !entries.is_empty()
    {
        return entries
            .into_iter()
            .zip(1u32..)
            .map(|((display_name, score), rank)| {
                RankingEntry::from_cache(rank, display_name, score)
            })
            .collect();
    }

    rankings_from_store(state, game_type, limit).await
}

/// Fallback path: top `limit` records straight from the durable store.
async fn rankings_from_store(
    state: &SharedState,
    game_type: &str,
    limit: usize,
) -> Vec<RankingEntry> {
    let Some(store) = state.score_store().await else {
        warn!(%game_type, "score store unavailable; returning empty rankings");
        return Vec::new();
    };

    let budget = state.config().fallback_query_timeout();
    match timeout(budget, store.top_scores(game_type, limit)).await {
        Ok(Ok(records)) => records
            .into_iter()
            .zip(1u32..)
            .map(|(record, rank)| RankingEntry::from_record(rank, record))
            .collect(),
        Ok(Err(err)) => {
            warn!(%game_type, error = %err, "fallback rankings query failed");
            Vec::new()
        }
        Err(_) => {
            warn!(%game_type, "fallback rankings query timed out");
            Vec::new()
        }
    }
}

/// Every score a player has submitted for a game type, best first.
pub async fn get_player_scores(
    state: &SharedState,
    player_id: &str,
    game_type: &str,
) -> Result<Vec<PlayerScoreEntry>, ServiceError> {
    if player_id.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "player id must not be empty".into(),
        ));
    }

    let store = state.require_score_store().await?;
    let records = store.player_scores(player_id, game_type).await?;
    Ok(records.into_iter().map(Into::into).collect())
}

/// Reject bad submissions before any write happens.
fn validate_submission(submission: &ScoreSubmission) -> Result<(), ServiceError> {
    if submission.score < 0 {
        return Err(ServiceError::InvalidScore(format!(
            "score must be non-negative (got {})",
            submission.score
        )));
    }
    submission
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        bus,
        config::AppConfig,
        dao::score_store::{ScoreStore, memory::MemoryScoreStore},
        state::AppState,
    };

    fn submission(player: &str, name: &str, score: i64, game: &str) -> ScoreSubmission {
        ScoreSubmission {
            player_id: player.to_owned(),
            display_name: name.to_owned(),
            score,
            game_type: game.to_owned(),
        }
    }

    /// State wired to a live bus receiver; events must be drained by the
    /// test (or a spawned updater) for the cache to fill.
    fn state_with_bus() -> (SharedState, tokio::sync::mpsc::Receiver<ScoreEvent>) {
        let (bus, receiver) = bus::channel(64);
        let state = AppState::new(AppConfig::default(), bus);
        (state, receiver)
    }

    /// State whose bus is already closed, forcing every submission through
    /// the degraded in-process path.
    fn state_with_closed_bus() -> SharedState {
        let (bus, receiver) = bus::channel(1);
        drop(receiver);
        AppState::new(AppConfig::default(), bus)
    }

    async fn with_memory_store(state: &SharedState) -> Arc<MemoryScoreStore> {
        let store = Arc::new(MemoryScoreStore::new());
        state.install_score_store(store.clone()).await;
        store
    }

    #[tokio::test]
    async fn negative_score_is_rejected_before_any_write() {
        let state = state_with_closed_bus();
        let store = with_memory_store(&state).await;

        let result = submit_score(&state, submission("p1", "Alice", -1, "snake")).await;
        assert!(matches!(result, Err(ServiceError::InvalidScore(_))));
        assert!(store.is_empty().await);
        assert_eq!(state.rankings().board_len("snake"), 0);
    }

    #[tokio::test]
    async fn blank_display_name_is_rejected() {
        let state = state_with_closed_bus();
        with_memory_store(&state).await;

        let result = submit_score(&state, submission("p1", "   ", 10, "snake")).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn submission_without_store_fails_degraded() {
        let state = state_with_closed_bus();
        let result = submit_score(&state, submission("p1", "Alice", 10, "snake")).await;
        assert!(matches!(result, Err(ServiceError::Degraded)));
    }

    #[tokio::test]
    async fn store_write_precedes_event_publish() {
        let (state, mut receiver) = state_with_bus();
        let store = with_memory_store(&state).await;

        submit_score(&state, submission("p1", "Alice", 100, "snake"))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        let event = receiver.recv().await.unwrap();
        assert_eq!(event.display_name, "Alice");
        assert_eq!(event.score, 100);
        // The cache is the consumer's job on the happy path.
        assert_eq!(state.rankings().board_len("snake"), 0);
    }

    #[tokio::test]
    async fn bus_failure_still_stores_and_updates_cache() {
        let state = state_with_closed_bus();
        let store = with_memory_store(&state).await;

        submit_score(&state, submission("p1", "Alice", 100, "snake"))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        let rankings = get_top_rankings(&state, "snake", 10).await;
        assert_eq!(rankings.len(), 1);
        assert_eq!(rankings[0].display_name, "Alice");
        assert_eq!(rankings[0].score, 100);
    }

    #[tokio::test]
    async fn top_rankings_orders_and_ranks() {
        let state = state_with_closed_bus();
        with_memory_store(&state).await;

        submit_score(&state, submission("p1", "Alice", 100, "snake"))
            .await
            .unwrap();
        submit_score(&state, submission("p2", "Bob", 200, "snake"))
            .await
            .unwrap();
        submit_score(&state, submission("p3", "Cara", 150, "snake"))
            .await
            .unwrap();

        let rankings = get_top_rankings(&state, "snake", 3).await;
        let ordered: Vec<(u32, &str, i64)> = rankings
            .iter()
            .map(|entry| (entry.rank, entry.display_name.as_str(), entry.score))
            .collect();
        assert_eq!(
            ordered,
            vec![(1, "Bob", 200), (2, "Cara", 150), (3, "Alice", 100)]
        );
    }

    #[tokio::test]
    async fn last_write_wins_even_when_lower() {
        let state = state_with_closed_bus();
        with_memory_store(&state).await;

        submit_score(&state, submission("p1", "Alice", 100, "snake"))
            .await
            .unwrap();
        submit_score(&state, submission("p1", "Alice", 50, "snake"))
            .await
            .unwrap();

        let rankings = get_top_rankings(&state, "snake", 1).await;
        assert_eq!(rankings.len(), 1);
        assert_eq!(rankings[0].display_name, "Alice");
        assert_eq!(rankings[0].score, 50);
    }

    #[tokio::test]
    async fn empty_cache_falls_back_to_store() {
        let (state, _receiver) = state_with_bus();
        let store = with_memory_store(&state).await;

        // Seed the store directly; the cache never sees these.
        for (player, name, score) in [("p1", "Alice", 100), ("p2", "Bob", 200)] {
            store
                .append_score(ScoreRecord::new(
                    player.into(),
                    name.into(),
                    score,
                    "snake".into(),
                ))
                .await
                .unwrap();
        }

        let rankings = get_top_rankings(&state, "snake", 5).await;
        let names: Vec<&str> = rankings
            .iter()
            .map(|entry| entry.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
        assert_eq!(rankings[0].rank, 1);
    }

    #[tokio::test]
    async fn unknown_game_type_yields_empty_without_error() {
        let state = state_with_closed_bus();
        with_memory_store(&state).await;

        assert!(get_top_rankings(&state, "unknown-game", 5).await.is_empty());
    }

    #[tokio::test]
    async fn no_store_and_no_cache_yields_empty() {
        let (state, _receiver) = state_with_bus();
        assert!(get_top_rankings(&state, "snake", 5).await.is_empty());
    }

    #[tokio::test]
    async fn player_scores_come_back_best_first() {
        let state = state_with_closed_bus();
        with_memory_store(&state).await;

        submit_score(&state, submission("p1", "Alice", 40, "snake"))
            .await
            .unwrap();
        submit_score(&state, submission("p1", "Alice", 90, "snake"))
            .await
            .unwrap();
        submit_score(&state, submission("p2", "Bob", 70, "snake"))
            .await
            .unwrap();

        let scores = get_player_scores(&state, "p1", "snake").await.unwrap();
        let values: Vec<i64> = scores.iter().map(|entry| entry.score).collect();
        assert_eq!(values, vec![90, 40]);
    }
}
