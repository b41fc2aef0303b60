use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ripple_db::Database;
use ripple_types::keys::DepKey;
use ripple_types::models::User;

use crate::error::{ChatError, Result};
use crate::{now_ms, user_from_row};

/// Claims from the external identity provider's token. The provider has
/// already verified the user; we only validate the signature and map the
/// subject to an internal user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub picture: String,
    pub exp: usize,
}

pub fn decode_token(secret: &str, token: &str) -> Result<IdentityClaims> {
    decode::<IdentityClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ChatError::Unauthenticated)
}

/// Map verified claims to the internal user record, creating it on first
/// sight. Idempotent: repeated calls for one subject never create
/// duplicates. Profile claims are synced on every call so a changed
/// display name or avatar propagates.
pub fn resolve(db: &Database, claims: &IdentityClaims) -> Result<(User, Vec<DepKey>)> {
    if let Some(existing) = db.get_user_by_subject(&claims.sub)? {
        if existing.name != claims.name
            || existing.email != claims.email
            || existing.avatar_url != claims.picture
        {
            db.update_user_profile(&existing.id, &claims.name, &claims.email, &claims.picture)?;
            let refreshed = db
                .get_user(&existing.id)?
                .ok_or(ChatError::NotFound("user"))?;
            return Ok((user_from_row(refreshed)?, vec![DepKey::Users]));
        }
        return Ok((user_from_row(existing)?, vec![]));
    }

    let id = Uuid::new_v4();
    let inserted = db.insert_user(
        &id.to_string(),
        &claims.sub,
        &claims.name,
        &claims.email,
        &claims.picture,
        now_ms(),
    )?;
    if !inserted {
        // Lost a create race: a concurrent resolve committed this subject
        // between our lookup and insert. Use its record.
        let row = db
            .get_user_by_subject(&claims.sub)?
            .ok_or(ChatError::NotFound("user"))?;
        return Ok((user_from_row(row)?, vec![]));
    }
    tracing::info!("created user {} for subject {}", id, claims.sub);

    let row = db.get_user(&id.to_string())?.ok_or(ChatError::NotFound("user"))?;
    Ok((user_from_row(row)?, vec![DepKey::Users]))
}

/// Every user except the caller, for the "start a conversation" picker.
pub fn list_others(db: &Database, caller: &User) -> Result<Vec<User>> {
    let rows = db.list_users_except(&caller.id.to_string())?;
    rows.into_iter().map(user_from_row).collect()
}
