use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    dto::validation,
    error::AppError,
    services::sse_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/rankings/{game_type}",
    tag = "sse",
    params(("game_type" = String, Path, description = "Game type to follow")),
    responses((status = 200, description = "Rankings SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream realtime rankings snapshots for one game type.
pub async fn rankings_stream(
    State(state): State<SharedState>,
    Path(game_type): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    validation::validate_game_type(&game_type)
        .map_err(|err| AppError::BadRequest(err.to_string()))?;

    let receiver = sse_service::subscribe(&state, &game_type);
    info!(%game_type, "new rankings SSE connection");
    Ok(sse_service::to_sse_stream(&state, game_type, receiver).await)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/rankings/{game_type}", get(rankings_stream))
}
