pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::ScoreRecord;
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the durable, append-only score log.
///
/// Implementations must treat records as immutable: `append_score` is the
/// only write, and nothing ever updates or removes a stored record.
pub trait ScoreStore: Send + Sync {
    /// Persist one score record. This is the durability boundary for a
    /// submission: once it returns `Ok`, the score survives restarts.
    fn append_score(&self, record: ScoreRecord) -> BoxFuture<'static, StorageResult<()>>;
    /// The `limit` highest-scoring records for a game type, score
    /// descending, ties broken by earliest submission time.
    fn top_scores(
        &self,
        game_type: &str,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreRecord>>>;
    /// All records a player has submitted for a game type, best first.
    fn player_scores(
        &self,
        player_id: &str,
        game_type: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreRecord>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
