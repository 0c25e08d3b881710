use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::game::RankingEntry;

/// Rankings snapshot pushed to every subscriber of a game type's channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RankingsEvent {
    pub game_type: String,
    pub entries: Vec<RankingEntry>,
}

/// Initial metadata sent to an SSE client when it connects.
#[derive(Debug, Serialize, ToSchema)]
pub struct Handshake {
    /// Game type the stream is subscribed to.
    pub game_type: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a score store connection.
    pub degraded: bool,
}
