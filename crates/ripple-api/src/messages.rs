use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use ripple_core::messages;
use ripple_types::api::{MessageSentResponse, SendMessageRequest};
use ripple_types::models::Message;

use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::state::{AppState, maybe_caller, resolve_caller, run_blocking};

pub async fn send(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = resolve_caller(&state, auth).await?;
    let db = state.db.clone();
    let (id, keys) =
        run_blocking(move || messages::append(&db, &caller, conversation_id, &req.content)).await?;
    state.engine.publish(&keys).await;
    Ok((StatusCode::CREATED, Json(MessageSentResponse { id })))
}

pub async fn list(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let Some(caller) = maybe_caller(&state, auth).await? else {
        return Ok(Json(vec![]));
    };
    let db = state.db.clone();
    let list =
        run_blocking(move || messages::list_by_conversation(&db, &caller, conversation_id)).await?;
    Ok(Json(list))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = resolve_caller(&state, auth).await?;
    let db = state.db.clone();
    let keys = run_blocking(move || messages::soft_delete(&db, &caller, message_id)).await?;
    state.engine.publish(&keys).await;
    Ok(StatusCode::NO_CONTENT)
}
