use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use ripple_core::typing;

use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::state::{AppState, maybe_caller, resolve_caller, run_blocking};

pub async fn set(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = resolve_caller(&state, auth).await?;
    let db = state.db.clone();
    let keys = run_blocking(move || typing::set_typing(&db, &caller, conversation_id)).await?;
    state.engine.publish(&keys).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = resolve_caller(&state, auth).await?;
    let db = state.db.clone();
    let keys = run_blocking(move || typing::clear_typing(&db, &caller, conversation_id)).await?;
    state.engine.publish(&keys).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Option<String>>, ApiError> {
    let Some(caller) = maybe_caller(&state, auth).await? else {
        return Ok(Json(None));
    };
    let db = state.db.clone();
    let name = run_blocking(move || typing::get_typing(&db, &caller, conversation_id)).await?;
    Ok(Json(name))
}
