use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{board::BoardSnapshot, stats::GameStats},
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Read-only game views.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game", get(current_board))
        .route("/games/{id}/stats", get(game_stats))
}

/// Board of the game in progress.
#[utoipa::path(
    get,
    path = "/game",
    tag = "game",
    responses(
        (status = 200, description = "Current board", body = BoardSnapshot)
    )
)]
pub async fn current_board(State(state): State<SharedState>) -> Json<BoardSnapshot> {
    Json(state.board())
}

/// Summary of an archived game.
#[utoipa::path(
    get,
    path = "/games/{id}/stats",
    tag = "game",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Game stats", body = GameStats),
        (status = 404, description = "Unknown game"),
        (status = 503, description = "Archive unavailable")
    )
)]
pub async fn game_stats(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameStats>, AppError> {
    let stats = game_service::archived_stats(&state, id).await?;
    Ok(Json(stats))
}
