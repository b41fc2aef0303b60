use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};

use ripple_core::presence;

use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::state::{AppState, resolve_caller, run_blocking};

pub async fn online(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = resolve_caller(&state, auth).await?;
    let db = state.db.clone();
    let keys = run_blocking(move || presence::set_online(&db, &caller)).await?;
    state.engine.publish(&keys).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn offline(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = resolve_caller(&state, auth).await?;
    let db = state.db.clone();
    let keys = run_blocking(move || presence::set_offline(&db, &caller)).await?;
    state.engine.publish(&keys).await;
    Ok(StatusCode::NO_CONTENT)
}
