use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::ScoreRecord;

/// Wire shape of a score record in the `scores` collection.
///
/// Timestamps travel as bson `DateTime` so the collection stays queryable
/// with plain Mongo tooling and the tie-break sort on `submitted_at` works
/// server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    player_id: String,
    display_name: String,
    score: i64,
    game_type: String,
    submitted_at: DateTime,
}

impl From<ScoreRecord> for MongoScoreDocument {
    fn from(value: ScoreRecord) -> Self {
        Self {
            id: value.id,
            player_id: value.player_id,
            display_name: value.display_name,
            score: value.score,
            game_type: value.game_type,
            submitted_at: DateTime::from_system_time(value.submitted_at),
        }
    }
}

impl From<MongoScoreDocument> for ScoreRecord {
    fn from(value: MongoScoreDocument) -> Self {
        Self {
            id: value.id,
            player_id: value.player_id,
            display_name: value.display_name,
            score: value.score,
            game_type: value.game_type,
            submitted_at: value.submitted_at.to_system_time(),
        }
    }
}
