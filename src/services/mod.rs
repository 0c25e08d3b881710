/// OpenAPI documentation generation.
pub mod documentation;
/// Rankings snapshot fan-out to subscribed topics.
pub mod fanout;
/// Health check service.
pub mod health_service;
/// Score event bus consumer workers.
pub mod ranking_updater;
/// Score submission and top-K query logic.
pub mod score_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Score store connection supervisor.
pub mod storage_supervisor;
/// WebSocket connection and message handling service.
pub mod websocket_service;
