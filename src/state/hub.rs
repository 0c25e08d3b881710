use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::sse::RankingsEvent;

/// Per-game-type broadcast hub used to fan rankings snapshots out to SSE
/// streams and WebSocket sessions.
///
/// Delivery is best effort: slow subscribers lag and may skip snapshots,
/// absent subscribers cost one channel lookup. Channels are created lazily
/// per game type and kept for the lifetime of the process.
pub struct RankingHub {
    channels: DashMap<String, broadcast::Sender<RankingsEvent>>,
    capacity: usize,
}

impl RankingHub {
    /// Construct a hub whose per-game-type channels buffer `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Register a subscriber for one game type's rankings snapshots.
    pub fn subscribe(&self, game_type: &str) -> broadcast::Receiver<RankingsEvent> {
        self.sender(game_type).subscribe()
    }

    /// Send a snapshot to all current subscribers of its game type,
    /// ignoring delivery errors.
    pub fn broadcast(&self, event: RankingsEvent) {
        if let Some(sender) = self.channels.get(&event.game_type) {
            let _ = sender.send(event);
        }
    }

    /// Number of live subscribers for a game type.
    pub fn subscriber_count(&self, game_type: &str) -> usize {
        self.channels
            .get(game_type)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    fn sender(&self, game_type: &str) -> broadcast::Sender<RankingsEvent> {
        self.channels
            .entry(game_type.to_owned())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(game_type: &str) -> RankingsEvent {
        RankingsEvent {
            game_type: game_type.to_owned(),
            entries: Vec::new(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_their_game_type_only() {
        let hub = RankingHub::new(8);
        let mut snake = hub.subscribe("snake");
        let mut tetris = hub.subscribe("tetris");

        hub.broadcast(snapshot("snake"));

        let event = snake.recv().await.unwrap();
        assert_eq!(event.game_type, "snake");
        assert!(tetris.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_is_silent() {
        let hub = RankingHub::new(8);
        hub.broadcast(snapshot("snake"));
        assert_eq!(hub.subscriber_count("snake"), 0);
    }

    #[tokio::test]
    async fn dropped_subscriber_is_no_longer_counted() {
        let hub = RankingHub::new(8);
        let receiver = hub.subscribe("snake");
        assert_eq!(hub.subscriber_count("snake"), 1);
        drop(receiver);
        assert_eq!(hub.subscriber_count("snake"), 0);
    }
}
