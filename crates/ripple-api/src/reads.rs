use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use ripple_core::reads;

use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::state::{AppState, maybe_caller, resolve_caller, run_blocking};

pub async fn mark(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = resolve_caller(&state, auth).await?;
    let db = state.db.clone();
    let keys = run_blocking(move || reads::mark_read(&db, &caller, conversation_id)).await?;
    state.engine.publish(&keys).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unread(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<i64>, ApiError> {
    let Some(caller) = maybe_caller(&state, auth).await? else {
        return Ok(Json(0));
    };
    let db = state.db.clone();
    let count = run_blocking(move || reads::unread_count(&db, &caller, conversation_id)).await?;
    Ok(Json(count))
}
