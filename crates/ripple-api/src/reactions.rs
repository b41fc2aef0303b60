use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use ripple_core::reactions;
use ripple_types::api::{ToggleReactionRequest, ToggleReactionResponse};
use ripple_types::models::ReactionGroup;

use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::state::{AppState, maybe_caller, resolve_caller, run_blocking};

pub async fn toggle(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ToggleReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = resolve_caller(&state, auth).await?;
    let db = state.db.clone();
    let (added, keys) =
        run_blocking(move || reactions::toggle(&db, &caller, message_id, &req.emoji)).await?;
    state.engine.publish(&keys).await;
    Ok(Json(ToggleReactionResponse { added }))
}

pub async fn list(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<ReactionGroup>>, ApiError> {
    let Some(caller) = maybe_caller(&state, auth).await? else {
        return Ok(Json(vec![]));
    };
    let db = state.db.clone();
    let groups = run_blocking(move || reactions::list_for_message(&db, &caller, message_id)).await?;
    Ok(Json(groups))
}
