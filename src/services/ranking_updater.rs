use std::sync::Arc;

use thiserror::Error;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    bus::ScoreEvent,
    services::fanout,
    state::{SharedState, UpdateOutcome},
};

/// Why an event could not be applied to the ranking cache.
#[derive(Debug, Error)]
enum ConsumerError {
    #[error("event has empty game type")]
    EmptyGameType,
    #[error("event has empty display name")]
    EmptyDisplayName,
}

/// Spawn the consumer workers that drain the score event bus.
///
/// Workers share the single receiver behind a mutex and run until every
/// publisher handle is gone. Handles are returned so the caller can detach
/// or await them at shutdown; events still in the channel at that point are
/// lost, which is acceptable because the durable store has every record and
/// boards rebuild lazily from it.
pub fn spawn(
    state: SharedState,
    receiver: mpsc::Receiver<ScoreEvent>,
    workers: usize,
) -> Vec<JoinHandle<()>> {
    let receiver = Arc::new(Mutex::new(receiver));

    (0..workers.max(1))
        .map(|worker| {
            let state = state.clone();
            let receiver = receiver.clone();
            tokio::spawn(async move {
                run_worker(state, receiver, worker).await;
            })
        })
        .collect()
}

async fn run_worker(
    state: SharedState,
    receiver: Arc<Mutex<mpsc::Receiver<ScoreEvent>>>,
    worker: usize,
) {
    loop {
        let event = {
            let mut guard = receiver.lock().await;
            guard.recv().await
        };

        let Some(event) = event else {
            info!(worker, "score event bus closed; ranking updater stopping");
            break;
        };

        // A bad event is logged and dropped; the loop never dies on one.
        if let Err(reason) = process_event(&state, &event).await {
            warn!(worker, ?event, %reason, "dropping unprocessable score event");
        }
    }
}

/// Apply one event to the ranking cache, then fan out the fresh top-K.
///
/// The application is a pure overwrite of `(game_type, display_name)` with
/// the event's score, so replaying a redelivered event is a no-op and needs
/// no deduplication bookkeeping.
async fn process_event(state: &SharedState, event: &ScoreEvent) -> Result<(), ConsumerError> {
    if event.game_type.is_empty() {
        return Err(ConsumerError::EmptyGameType);
    }
    if event.display_name.is_empty() {
        return Err(ConsumerError::EmptyDisplayName);
    }

    let outcome = state
        .rankings()
        .apply(&event.game_type, &event.display_name, event.score);

    match &outcome {
        UpdateOutcome::Inserted { evicted } if !evicted.is_empty() => {
            debug!(
                game_type = %event.game_type,
                evicted = evicted.len(),
                "leaderboard cap reached; evicted lowest entries"
            );
        }
        _ => {}
    }

    fanout::broadcast_rankings(state, &event.game_type).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        bus::{self, ScoreBus},
        config::AppConfig,
        dao::score_store::memory::MemoryScoreStore,
    };
    use crate::state::AppState;

    async fn pipeline(workers: usize) -> (SharedState, ScoreBus) {
        let (bus, receiver) = bus::channel(64);
        let state = AppState::new(AppConfig::default(), bus.clone());
        state
            .install_score_store(Arc::new(MemoryScoreStore::new()))
            .await;
        spawn(state.clone(), receiver, workers);
        (state, bus)
    }

    fn event(name: &str, score: i64) -> ScoreEvent {
        ScoreEvent::new(name.to_lowercase(), name.to_owned(), score, "snake".into())
    }

    #[tokio::test]
    async fn consumed_events_update_cache_and_fan_out() {
        let (state, bus) = pipeline(1).await;
        let mut subscriber = state.ranking_hub().subscribe("snake");

        bus.publish(event("Alice", 100)).unwrap();
        bus.publish(event("Bob", 200)).unwrap();

        // Each processed event pushes one snapshot; the second one carries
        // both players.
        subscriber.recv().await.unwrap();
        let snapshot = subscriber.recv().await.unwrap();
        let names: Vec<&str> = snapshot
            .entries
            .iter()
            .map(|entry| entry.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
        assert_eq!(state.rankings().board_len("snake"), 2);
    }

    #[tokio::test]
    async fn redelivered_event_leaves_cache_unchanged() {
        let (state, bus) = pipeline(1).await;
        let mut subscriber = state.ranking_hub().subscribe("snake");

        let duplicated = event("Alice", 100);
        bus.publish(duplicated.clone()).unwrap();
        bus.publish(duplicated).unwrap();

        subscriber.recv().await.unwrap();
        let snapshot = subscriber.recv().await.unwrap();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].score, 100);
        assert_eq!(state.rankings().board_len("snake"), 1);
    }

    #[tokio::test]
    async fn malformed_event_is_dropped_and_loop_continues() {
        let (state, bus) = pipeline(1).await;
        let mut subscriber = state.ranking_hub().subscribe("snake");

        let mut bad = event("Alice", 100);
        bad.display_name = String::new();
        bus.publish(bad).unwrap();
        bus.publish(event("Bob", 200)).unwrap();

        let snapshot = subscriber.recv().await.unwrap();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].display_name, "Bob");
    }

    #[tokio::test]
    async fn multiple_workers_share_the_bus() {
        let (state, bus) = pipeline(3).await;
        let mut subscriber = state.ranking_hub().subscribe("snake");

        for index in 0..10 {
            bus.publish(event(&format!("player-{index}"), index)).unwrap();
        }

        // Ten applied events produce ten snapshots, regardless of which
        // worker handled each.
        for _ in 0..10 {
            subscriber.recv().await.unwrap();
        }
        assert_eq!(state.rankings().board_len("snake"), 10);
    }
}
