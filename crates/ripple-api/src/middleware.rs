use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use ripple_core::identity::{self, IdentityClaims};

use crate::state::AppState;

/// Verified identity-provider claims for this request, if any. Inserted by
/// `auth_context` on every request; handlers decide whether absence is an
/// error (mutations) or an empty answer (queries).
#[derive(Debug, Clone)]
pub struct AuthContext(pub Option<IdentityClaims>);

pub async fn auth_context(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| identity::decode_token(&state.jwt_secret, token).ok());

    req.extensions_mut().insert(AuthContext(claims));
    next.run(req).await
}
