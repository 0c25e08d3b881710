use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Errors raised by the MongoDB-backed score store, one variant per operation
/// so failures stay attributable in logs.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("environment variable `{var}` is not set")]
    MissingEnvVar { var: &'static str },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to append score record `{id}`")]
    AppendScore {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to query top scores for game type `{game_type}`")]
    TopScores {
        game_type: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to query scores of player `{player_id}` for game type `{game_type}`")]
    PlayerScores {
        player_id: String,
        game_type: String,
        #[source]
        source: MongoError,
    },
}
