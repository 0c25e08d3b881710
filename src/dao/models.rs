use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// One durably recorded score submission.
///
/// Records are append-only: written once at submission time, never updated
/// or deleted by this service. The ranking cache is a projection that can
/// always be rebuilt from these records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreRecord {
    /// Primary key of the record.
    pub id: Uuid,
    /// Stable identifier of the submitting player.
    pub player_id: String,
    /// Display name shown on leaderboards.
    pub display_name: String,
    /// The submitted score (non-negative).
    pub score: i64,
    /// Game type the score belongs to (e.g. `snake`).
    pub game_type: String,
    /// Wall-clock time the submission was accepted.
    pub submitted_at: SystemTime,
}

impl ScoreRecord {
    /// Build a fresh record for a validated submission, stamping id and time.
    pub fn new(player_id: String, display_name: String, score: i64, game_type: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            display_name,
            score,
            game_type,
            submitted_at: SystemTime::now(),
        }
    }
}
