use std::sync::Arc;

use ripple_core::{ChatError, identity};
use ripple_db::Database;
use ripple_sync::engine::Engine;
use ripple_types::models::User;

use crate::middleware::AuthContext;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub engine: Engine,
    pub jwt_secret: String,
}

/// Resolve the caller for a mutation. Missing/invalid token ⇒ Unauthenticated.
pub async fn resolve_caller(state: &AppState, auth: AuthContext) -> Result<User, ChatError> {
    let claims = auth.0.ok_or(ChatError::Unauthenticated)?;
    let db = state.db.clone();
    let (user, keys) = tokio::task::spawn_blocking(move || identity::resolve(&db, &claims))
        .await
        .map_err(|e| ChatError::Internal(format!("join error: {e}")))??;
    state.engine.publish(&keys).await;
    Ok(user)
}

/// Resolve the caller for a query. Queries issued without authentication
/// get `None` and answer with an empty/null result instead of erroring.
pub async fn maybe_caller(state: &AppState, auth: AuthContext) -> Result<Option<User>, ChatError> {
    if auth.0.is_none() {
        return Ok(None);
    }
    resolve_caller(state, auth).await.map(Some)
}

/// Run blocking store work off the async runtime.
pub async fn run_blocking<T, F>(f: F) -> Result<T, ChatError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ChatError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ChatError::Internal(format!("join error: {e}")))?
}
