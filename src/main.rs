//! Arcade Rank Back binary entrypoint wiring REST, WebSocket, SSE, and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arcade_rank_back::{
    bus,
    config::AppConfig,
    dao::{score_store::ScoreStore, score_store::memory::MemoryScoreStore, storage::StorageError},
    routes,
    services::{ranking_updater, storage_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let (score_bus, bus_receiver) = bus::channel(config.bus_capacity());
    let workers = config.consumer_workers();
    let app_state = AppState::new(config, score_bus);

    tokio::spawn(run_store_supervisor(app_state.clone()));
    ranking_updater::spawn(app_state.clone(), bus_receiver, workers);

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Hand the configured score store backend to the supervisor, which retries
/// in the background and toggles degraded mode when connectivity changes.
async fn run_store_supervisor(state: SharedState) {
    let backend = env::var("SCORE_STORE").unwrap_or_else(|_| "mongo".into());

    match backend.as_str() {
        "memory" => {
            info!("using in-memory score store; records will not survive a restart");
            storage_supervisor::run(state, || async {
                Ok(Arc::new(MemoryScoreStore::new()) as Arc<dyn ScoreStore>)
            })
            .await;
        }
        _ => {
            #[cfg(feature = "mongo-store")]
            {
                storage_supervisor::run(state, connect_mongo).await;
            }
            #[cfg(not(feature = "mongo-store"))]
            {
                tracing::warn!(
                    %backend,
                    "built without the mongo-store feature; using in-memory score store"
                );
                storage_supervisor::run(state, || async {
                    Ok(Arc::new(MemoryScoreStore::new()) as Arc<dyn ScoreStore>)
                })
                .await;
            }
        }
    }
}

#[cfg(feature = "mongo-store")]
async fn connect_mongo() -> Result<Arc<dyn ScoreStore>, StorageError> {
    use arcade_rank_back::dao::score_store::mongodb::{MongoConfig, MongoScoreStore};

    let uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let db = env::var("MONGO_DB").ok();
    let config = MongoConfig::from_uri(&uri, db.as_deref()).await?;
    let store = MongoScoreStore::connect(config).await?;
    Ok(Arc::new(store) as Arc<dyn ScoreStore>)
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
