use axum::{Extension, Json, extract::State};

use ripple_core::identity;
use ripple_types::models::User;

use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::state::{AppState, maybe_caller, run_blocking};

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Option<User>>, ApiError> {
    let caller = maybe_caller(&state, auth).await?;
    Ok(Json(caller))
}

/// Every user except the caller, for starting new conversations.
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<User>>, ApiError> {
    let Some(caller) = maybe_caller(&state, auth).await? else {
        return Ok(Json(vec![]));
    };
    let db = state.db.clone();
    let users = run_blocking(move || identity::list_others(&db, &caller)).await?;
    Ok(Json(users))
}
