/// Durable score record model.
pub mod models;
/// Append-only score store trait and backends.
pub mod score_store;
/// Storage abstraction layer shared by all backends.
pub mod storage;
