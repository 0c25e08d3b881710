use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_valid::Valid;
use serde::Deserialize;
use tracing::info;

use crate::{
    dto::game::{PlayerScoreEntry, RankingEntry, ScoreSubmission, ScoreSubmittedResponse},
    error::AppError,
    services::score_service,
    state::SharedState,
};

/// Routes handling score submission and ranking queries.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/game/score", post(submit_score))
        .route("/api/game/rankings/{game_type}", get(get_rankings))
        .route(
            "/api/game/scores/{player_id}/{game_type}",
            get(get_player_scores),
        )
}

/// Query parameters accepted by the rankings endpoint.
#[derive(Debug, Deserialize)]
pub struct RankingsQuery {
    limit: Option<usize>,
}

/// Durably record a submitted score and kick off the ranking update.
#[utoipa::path(
    post,
    path = "/api/game/score",
    tag = "game",
    request_body = ScoreSubmission,
    responses(
        (status = 200, description = "Score stored", body = ScoreSubmittedResponse),
        (status = 400, description = "Invalid submission"),
        (status = 503, description = "Score store unavailable")
    )
)]
pub async fn submit_score(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ScoreSubmission>>,
) -> Result<Json<ScoreSubmittedResponse>, AppError> {
    score_service::submit_score(&state, payload).await?;
    Ok(Json(ScoreSubmittedResponse::saved()))
}

/// Return the current top rankings for a game type.
#[utoipa::path(
    get,
    path = "/api/game/rankings/{game_type}",
    tag = "game",
    params(
        ("game_type" = String, Path, description = "Game type to rank"),
        ("limit" = Option<usize>, Query, description = "Number of entries to return (default 10)")
    ),
    responses(
        (status = 200, description = "Rankings, best first (possibly empty)", body = [RankingEntry]),
        (status = 400, description = "Invalid limit")
    )
)]
pub async fn get_rankings(
    State(state): State<SharedState>,
    Path(game_type): Path<String>,
    Query(query): Query<RankingsQuery>,
) -> Result<Json<Vec<RankingEntry>>, AppError> {
    let limit = query.limit.unwrap_or(10);
    if limit < 1 {
        return Err(AppError::BadRequest("limit must be at least 1".into()));
    }

    info!(%game_type, limit, "rankings requested");
    let rankings = score_service::get_top_rankings(&state, &game_type, limit).await;
    Ok(Json(rankings))
}

/// Return every score a player has submitted for a game type, best first.
#[utoipa::path(
    get,
    path = "/api/game/scores/{player_id}/{game_type}",
    tag = "game",
    params(
        ("player_id" = String, Path, description = "Player identifier"),
        ("game_type" = String, Path, description = "Game type to filter on")
    ),
    responses(
        (status = 200, description = "Player score history", body = [PlayerScoreEntry]),
        (status = 503, description = "Score store unavailable")
    )
)]
pub async fn get_player_scores(
    State(state): State<SharedState>,
    Path((player_id, game_type)): Path<(String, String)>,
) -> Result<Json<Vec<PlayerScoreEntry>>, AppError> {
    let scores = score_service::get_player_scores(&state, &player_id, &game_type).await?;
    Ok(Json(scores))
}
