mod hub;
pub mod rankings;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    bus::ScoreBus,
    config::AppConfig,
    dao::score_store::ScoreStore,
    error::ServiceError,
};

pub use self::hub::RankingHub;
pub use self::rankings::{RankingCache, UpdateOutcome};

pub type SharedState = Arc<AppState>;

/// Central application state storing the score store handle, the ranking
/// cache registry, and the fan-out hub.
pub struct AppState {
    score_store: RwLock<Option<Arc<dyn ScoreStore>>>,
    rankings: RankingCache,
    hub: RankingHub,
    bus: ScoreBus,
    degraded: watch::Sender<bool>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a score store is installed.
    pub fn new(config: AppConfig, bus: ScoreBus) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            score_store: RwLock::new(None),
            rankings: RankingCache::new(config.ranking_cap()),
            hub: RankingHub::new(config.fanout_channel_capacity()),
            bus,
            degraded: degraded_tx,
            config,
        })
    }

    /// Obtain a handle to the current score store, if one is installed.
    pub async fn score_store(&self) -> Option<Arc<dyn ScoreStore>> {
        let guard = self.score_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the score store or fail with [`ServiceError::Degraded`].
    pub async fn require_score_store(&self) -> Result<Arc<dyn ScoreStore>, ServiceError> {
        self.score_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new score store implementation and leave degraded mode.
    pub async fn install_score_store(&self, store: Arc<dyn ScoreStore>) {
        {
            let mut guard = self.score_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current score store and enter degraded mode.
    pub async fn clear_score_store(&self) {
        {
            let mut guard = self.score_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.score_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Registry of per-game-type leaderboards.
    pub fn rankings(&self) -> &RankingCache {
        &self.rankings
    }

    /// Hub used to fan rankings snapshots out to SSE and WebSocket clients.
    pub fn ranking_hub(&self) -> &RankingHub {
        &self.hub
    }

    /// Producer handle of the score event bus.
    pub fn score_bus(&self) -> &ScoreBus {
        &self.bus
    }

    /// Runtime configuration shared across services.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Update and broadcast the degraded flag when the value changes.
    fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bus, dao::score_store::memory::MemoryScoreStore};

    fn fresh_state() -> SharedState {
        let (bus, _receiver) = bus::channel(8);
        AppState::new(AppConfig::default(), bus)
    }

    #[tokio::test]
    async fn starts_degraded_until_store_installed() {
        let state = fresh_state();
        assert!(state.is_degraded().await);
        assert!(state.require_score_store().await.is_err());

        state
            .install_score_store(Arc::new(MemoryScoreStore::default()))
            .await;
        assert!(!state.is_degraded().await);
        assert!(state.require_score_store().await.is_ok());
    }

    #[tokio::test]
    async fn clearing_the_store_reenters_degraded_mode() {
        let state = fresh_state();
        let mut watcher = state.degraded_watcher();

        state
            .install_score_store(Arc::new(MemoryScoreStore::default()))
            .await;
        watcher.changed().await.unwrap();
        assert!(!*watcher.borrow());

        state.clear_score_store().await;
        watcher.changed().await.unwrap();
        assert!(*watcher.borrow());
    }
}
