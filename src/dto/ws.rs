use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::game::{RankingEntry, ScoreSubmission};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from game WebSocket clients.
#[serde(tag = "type")]
pub enum GameInboundMessage {
    /// Fire-and-forget score submission over the socket.
    #[serde(rename = "submit_score")]
    SubmitScore(ScoreSubmission),
    /// Start receiving rankings snapshots for one game type.
    #[serde(rename = "subscribe")]
    Subscribe { game_type: String },
    /// Stop receiving rankings snapshots for one game type.
    #[serde(rename = "unsubscribe")]
    Unsubscribe { game_type: String },
    #[serde(other)]
    Unknown,
}

impl GameInboundMessage {
    /// Parse and validate an inbound frame in one step.
    pub fn from_json_str(text: &str) -> Result<Self, String> {
        let message: Self =
            serde_json::from_str(text).map_err(|err| format!("malformed message: {err}"))?;
        if let Self::SubmitScore(submission) = &message {
            submission
                .validate()
                .map_err(|err| format!("invalid submission: {err}"))?;
        }
        Ok(message)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Messages pushed to game WebSocket clients.
#[serde(tag = "type")]
pub enum GameOutboundMessage {
    /// Positive acknowledgement of an inbound request.
    #[serde(rename = "ack")]
    Ack { action: String, game_type: String },
    /// Rankings snapshot for a subscribed game type.
    #[serde(rename = "rankings")]
    Rankings {
        game_type: String,
        entries: Vec<RankingEntry>,
    },
    /// Request-level failure report; the connection stays open.
    #[serde(rename = "error")]
    Error { message: String },
}
