use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::ScoreRecord,
    dto::{format_system_time, validation},
};

/// Payload submitted by a player after finishing a game.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct ScoreSubmission {
    /// Stable identifier of the submitting player.
    #[validate(length(min = 1, max = 64))]
    pub player_id: String,
    /// Name shown on leaderboards.
    #[validate(custom(function = "validation::validate_display_name"))]
    pub display_name: String,
    /// Score achieved; negative values are rejected.
    #[validate(range(min = 0))]
    pub score: i64,
    /// Which game the score belongs to.
    #[validate(custom(function = "validation::validate_game_type"))]
    pub game_type: String,
}

/// Acknowledgement returned once a score has been durably stored.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreSubmittedResponse {
    pub message: String,
}

impl ScoreSubmittedResponse {
    pub fn saved() -> Self {
        Self {
            message: "score saved".to_string(),
        }
    }
}

/// One row of a rankings response, recomputed on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RankingEntry {
    /// 1-based position within the returned slice.
    pub rank: u32,
    /// Name shown on leaderboards.
    pub display_name: String,
    /// The ranked score.
    pub score: i64,
    /// When this ranking was observed, RFC 3339.
    pub observed_at: String,
}

impl RankingEntry {
    /// Project a cache entry, stamped with the current time.
    pub fn from_cache(rank: u32, display_name: String, score: i64) -> Self {
        Self {
            rank,
            display_name,
            score,
            observed_at: format_system_time(SystemTime::now()),
        }
    }

    /// Project a stored record, stamped with the record's own submission time.
    pub fn from_record(rank: u32, record: ScoreRecord) -> Self {
        Self {
            rank,
            display_name: record.display_name,
            score: record.score,
            observed_at: format_system_time(record.submitted_at),
        }
    }
}

/// One stored score in a player's per-game history.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerScoreEntry {
    pub score: i64,
    pub game_type: String,
    /// When the score was submitted, RFC 3339.
    pub submitted_at: String,
}

impl From<ScoreRecord> for PlayerScoreEntry {
    fn from(record: ScoreRecord) -> Self {
        Self {
            score: record.score,
            game_type: record.game_type,
            submitted_at: format_system_time(record.submitted_at),
        }
    }
}
