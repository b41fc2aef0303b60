use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use ripple_core::conversations;
use ripple_types::api::{
    ConversationCreatedResponse, DirectConversationRequest, GroupConversationRequest,
};
use ripple_types::models::ConversationView;

use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::state::{AppState, maybe_caller, resolve_caller, run_blocking};

pub async fn create_direct(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<DirectConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = resolve_caller(&state, auth).await?;
    let db = state.db.clone();
    let (id, keys) =
        run_blocking(move || conversations::get_or_create_direct(&db, &caller, req.participant_id))
            .await?;
    state.engine.publish(&keys).await;
    Ok((StatusCode::CREATED, Json(ConversationCreatedResponse { id })))
}

pub async fn create_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<GroupConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = resolve_caller(&state, auth).await?;
    let db = state.db.clone();
    let (id, keys) = run_blocking(move || {
        conversations::create_group(&db, &caller, &req.participant_ids, &req.group_name)
    })
    .await?;
    state.engine.publish(&keys).await;
    Ok((StatusCode::CREATED, Json(ConversationCreatedResponse { id })))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<ConversationView>>, ApiError> {
    let Some(caller) = maybe_caller(&state, auth).await? else {
        return Ok(Json(vec![]));
    };
    let db = state.db.clone();
    let views = run_blocking(move || conversations::list_for_user(&db, &caller)).await?;
    Ok(Json(views))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Option<ConversationView>>, ApiError> {
    let Some(caller) = maybe_caller(&state, auth).await? else {
        return Ok(Json(None));
    };
    let db = state.db.clone();
    let view = run_blocking(move || conversations::get_by_id(&db, &caller, id)).await?;
    Ok(Json(view))
}
