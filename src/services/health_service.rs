use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the current health payload while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_score_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "score store health check failed");
            }
        }
        Err(_) => warn!("score store unavailable (degraded mode)"),
    }

    HealthResponse::from_degraded(state.is_degraded().await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        bus, config::AppConfig, dao::score_store::memory::MemoryScoreStore, state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_without_a_store() {
        let (bus, _receiver) = bus::channel(8);
        let state = AppState::new(AppConfig::default(), bus);
        assert_eq!(health_status(&state).await.status, "degraded");

        state
            .install_score_store(Arc::new(MemoryScoreStore::new()))
            .await;
        assert_eq!(health_status(&state).await.status, "ok");
    }
}
