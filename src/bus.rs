//! In-process score event bus.
//!
//! Submissions publish [`ScoreEvent`]s onto a bounded channel; ranking
//! updater workers drain the other end. Publishing never blocks the
//! submission path: a full or closed channel surfaces as a
//! [`PublishError`] and the caller falls back to updating the ranking
//! cache directly.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Notification that a score was durably stored.
///
/// Carries everything the ranking updater needs so consumers never read
/// back from the score store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEvent {
    /// Stable identifier of the submitting player.
    pub player_id: String,
    /// Name shown on leaderboards.
    pub display_name: String,
    /// The submitted score value.
    pub score: i64,
    /// Game type the score belongs to.
    pub game_type: String,
    /// Milliseconds since the Unix epoch at which the event was emitted.
    pub emitted_at_millis: u64,
}

impl ScoreEvent {
    /// Build an event stamped with the current wall-clock time.
    pub fn new(player_id: String, display_name: String, score: i64, game_type: String) -> Self {
        let emitted_at_millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();
        Self {
            player_id,
            display_name,
            score,
            game_type,
            emitted_at_millis,
        }
    }
}

/// Why a publish did not reach the bus.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PublishError {
    /// The channel buffer is full; the event was dropped.
    #[error("score event bus is full")]
    Full,
    /// All consumers are gone; the event was dropped.
    #[error("score event bus is closed")]
    Closed,
}

/// Cloneable producer half of the score event bus.
#[derive(Clone)]
pub struct ScoreBus {
    sender: mpsc::Sender<ScoreEvent>,
}

impl ScoreBus {
    /// Enqueue an event without waiting for buffer space.
    pub fn publish(&self, event: ScoreEvent) -> Result<(), PublishError> {
        self.sender.try_send(event).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => PublishError::Full,
            mpsc::error::TrySendError::Closed(_) => PublishError::Closed,
        })
    }
}

/// Create a bus with the given buffer capacity, returning the producer
/// handle and the single receiver the updater workers share.
pub fn channel(capacity: usize) -> (ScoreBus, mpsc::Receiver<ScoreEvent>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (ScoreBus { sender }, receiver)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(player: &str) -> ScoreEvent {
        ScoreEvent::new(
            player.to_owned(),
            player.to_owned(),
            100,
            "snake".to_owned(),
        )
    }

    #[tokio::test]
    async fn published_events_arrive_in_order() {
        let (bus, mut receiver) = channel(8);
        bus.publish(event("alice")).unwrap();
        bus.publish(event("bob")).unwrap();

        assert_eq!(receiver.recv().await.unwrap().player_id, "alice");
        assert_eq!(receiver.recv().await.unwrap().player_id, "bob");
    }

    #[tokio::test]
    async fn full_bus_rejects_without_blocking() {
        let (bus, _receiver) = channel(1);
        bus.publish(event("alice")).unwrap();
        assert_eq!(bus.publish(event("bob")), Err(PublishError::Full));
    }

    #[tokio::test]
    async fn closed_bus_reports_closed() {
        let (bus, receiver) = channel(1);
        drop(receiver);
        assert_eq!(bus.publish(event("alice")), Err(PublishError::Closed));
    }
}
