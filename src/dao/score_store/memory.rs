use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{models::ScoreRecord, score_store::ScoreStore, storage::StorageResult};

/// Append-only score store kept entirely in process memory.
///
/// Used by the test suite and available as a backend for local runs
/// (`SCORE_STORE=memory`). Records do not survive a restart, so the
/// fallback query path only covers the current process lifetime.
#[derive(Clone, Default)]
pub struct MemoryScoreStore {
    records: Arc<RwLock<Vec<ScoreRecord>>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn append(&self, record: ScoreRecord) {
        self.records.write().await.push(record);
    }

    async fn top(&self, game_type: String, limit: usize) -> Vec<ScoreRecord> {
        let guard = self.records.read().await;
        let mut matching: Vec<&ScoreRecord> = guard
            .iter()
            .filter(|record| record.game_type == game_type)
            .collect();
        matching.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.submitted_at.cmp(&b.submitted_at))
        });
        matching.into_iter().take(limit).cloned().collect()
    }

    async fn for_player(&self, player_id: String, game_type: String) -> Vec<ScoreRecord> {
        let guard = self.records.read().await;
        let mut matching: Vec<&ScoreRecord> = guard
            .iter()
            .filter(|record| record.player_id == player_id && record.game_type == game_type)
            .collect();
        matching.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.submitted_at.cmp(&b.submitted_at))
        });
        matching.into_iter().cloned().collect()
    }

    /// Number of records held, across all game types.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records at all.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn append_score(&self, record: ScoreRecord) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.append(record).await;
            Ok(())
        })
    }

    fn top_scores(
        &self,
        game_type: &str,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreRecord>>> {
        let store = self.clone();
        let game_type = game_type.to_owned();
        Box::pin(async move { Ok(store.top(game_type, limit).await) })
    }

    fn player_scores(
        &self,
        player_id: &str,
        game_type: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreRecord>>> {
        let store = self.clone();
        let player_id = player_id.to_owned();
        let game_type = game_type.to_owned();
        Box::pin(async move { Ok(store.for_player(player_id, game_type).await) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(player: &str, name: &str, score: i64, game: &str) -> ScoreRecord {
        ScoreRecord::new(player.into(), name.into(), score, game.into())
    }

    #[tokio::test]
    async fn top_scores_sorted_descending_and_limited() {
        let store = MemoryScoreStore::new();
        store.append(record("p1", "Alice", 100, "snake")).await;
        store.append(record("p2", "Bob", 200, "snake")).await;
        store.append(record("p3", "Cara", 150, "snake")).await;
        store.append(record("p4", "Dave", 999, "tetris")).await;

        let top = store.top_scores("snake", 2).await.unwrap();
        let names: Vec<&str> = top.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Cara"]);
    }

    #[tokio::test]
    async fn ties_broken_by_earliest_submission() {
        let store = MemoryScoreStore::new();
        store.append(record("p1", "First", 50, "snake")).await;
        store.append(record("p2", "Second", 50, "snake")).await;

        let top = store.top_scores("snake", 2).await.unwrap();
        assert_eq!(top[0].display_name, "First");
        assert_eq!(top[1].display_name, "Second");
    }

    #[tokio::test]
    async fn unknown_game_type_yields_empty() {
        let store = MemoryScoreStore::new();
        store.append(record("p1", "Alice", 100, "snake")).await;
        assert!(store.top_scores("pong", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn player_scores_filters_by_player_and_game() {
        let store = MemoryScoreStore::new();
        store.append(record("p1", "Alice", 100, "snake")).await;
        store.append(record("p1", "Alice", 40, "snake")).await;
        store.append(record("p1", "Alice", 70, "tetris")).await;
        store.append(record("p2", "Bob", 90, "snake")).await;

        let scores = store.player_scores("p1", "snake").await.unwrap();
        let values: Vec<i64> = scores.iter().map(|r| r.score).collect();
        assert_eq!(values, vec![100, 40]);
    }
}
