use std::{sync::Arc, time::Duration};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, bson::doc, options::IndexOptions};
use tokio::{sync::RwLock, time::sleep};

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::MongoScoreDocument,
};
use crate::dao::{models::ScoreRecord, score_store::ScoreStore, storage::StorageResult};

const SCORE_COLLECTION_NAME: &str = "scores";

struct RetryPolicy;

impl RetryPolicy {
    const MAX_ATTEMPTS: u32 = 10;
    const INITIAL_DELAY_MS: u64 = 250;

    fn initial_delay() -> Duration {
        Duration::from_millis(Self::INITIAL_DELAY_MS)
    }

    fn next_delay(current: Duration) -> Duration {
        (current * 2).min(Duration::from_secs(5))
    }
}

/// MongoDB-backed implementation of the durable score log.
#[derive(Clone)]
pub struct MongoScoreStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    // The database handle keeps its client alive; nothing else is retained.
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.database.read().await;
            guard.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database = establish_connection(&self.config).await?;
        let mut guard = self.database.write().await;
        *guard = database;
        Ok(())
    }
}

impl MongoScoreStore {
    /// Establish a connection to MongoDB and ensure the score indexes exist.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = establish_connection(&config).await?;

        let inner = Arc::new(MongoInner {
            database: RwLock::new(database),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Create the indexes the query paths rely on: `(game_type, score desc)`
    /// for the fallback top-K query, `(player_id, game_type)` for per-player
    /// history.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;

        let ranking_index = mongodb::IndexModel::builder()
            .keys(doc! {"game_type": 1, "score": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_type_score_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(ranking_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "game_type,score",
                source,
            })?;

        let player_index = mongodb::IndexModel::builder()
            .keys(doc! {"player_id": 1, "game_type": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("player_game_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(player_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "player_id,game_type",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoScoreDocument> {
        let guard = self.inner.database.read().await;
        guard.collection::<MongoScoreDocument>(SCORE_COLLECTION_NAME)
    }

    async fn append_score(&self, record: ScoreRecord) -> MongoResult<()> {
        let id = record.id;
        let document: MongoScoreDocument = record.into();
        let collection = self.collection().await;
        collection
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::AppendScore { id, source })?;

        Ok(())
    }

    async fn top_scores(&self, game_type: String, limit: usize) -> MongoResult<Vec<ScoreRecord>> {
        let collection = self.collection().await;

        let documents: Vec<MongoScoreDocument> = collection
            .find(doc! {"game_type": &game_type})
            .sort(doc! {"score": -1, "submitted_at": 1})
            .limit(limit as i64)
            .await
            .map_err(|source| MongoDaoError::TopScores {
                game_type: game_type.clone(),
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::TopScores {
                game_type: game_type.clone(),
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn player_scores(
        &self,
        player_id: String,
        game_type: String,
    ) -> MongoResult<Vec<ScoreRecord>> {
        let collection = self.collection().await;

        let documents: Vec<MongoScoreDocument> = collection
            .find(doc! {"player_id": &player_id, "game_type": &game_type})
            .sort(doc! {"score": -1, "submitted_at": 1})
            .await
            .map_err(|source| MongoDaoError::PlayerScores {
                player_id: player_id.clone(),
                game_type: game_type.clone(),
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::PlayerScores {
                player_id: player_id.clone(),
                game_type: game_type.clone(),
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }
}

/// Build a client from the configured options and ping until the deployment
/// answers, backing off between attempts.
async fn establish_connection(config: &MongoConfig) -> MongoResult<Database> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut attempts = 0;
    let mut delay = RetryPolicy::initial_delay();

    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => break,
            Err(err) => {
                attempts += 1;
                if attempts >= RetryPolicy::MAX_ATTEMPTS {
                    return Err(MongoDaoError::InitialPing {
                        attempts,
                        source: err,
                    });
                }
                sleep(delay).await;
                delay = RetryPolicy::next_delay(delay);
            }
        }
    }

    Ok(database)
}

impl ScoreStore for MongoScoreStore {
    fn append_score(&self, record: ScoreRecord) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append_score(record).await.map_err(Into::into) })
    }

    fn top_scores(
        &self,
        game_type: &str,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreRecord>>> {
        let store = self.clone();
        let game_type = game_type.to_owned();
        Box::pin(async move { store.top_scores(game_type, limit).await.map_err(Into::into) })
    }

    fn player_scores(
        &self,
        player_id: &str,
        game_type: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreRecord>>> {
        let store = self.clone();
        let player_id = player_id.to_owned();
        let game_type = game_type.to_owned();
        Box::pin(async move {
            store
                .player_scores(player_id, game_type)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
