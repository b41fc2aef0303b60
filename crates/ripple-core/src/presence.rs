use ripple_db::Database;
use ripple_types::keys::DepKey;
use ripple_types::models::User;

use crate::error::Result;
use crate::now_ms;

/// Called on gateway connect. If a disconnect is missed (dropped network,
/// no teardown) the user appears online until the next reconnect corrects
/// it — an accepted staleness window, there is no heartbeat liveness check.
pub fn set_online(db: &Database, caller: &User) -> Result<Vec<DepKey>> {
    db.set_presence(&caller.id.to_string(), true, now_ms())?;
    Ok(vec![DepKey::Users])
}

pub fn set_offline(db: &Database, caller: &User) -> Result<Vec<DepKey>> {
    db.set_presence(&caller.id.to_string(), false, now_ms())?;
    Ok(vec![DepKey::Users])
}
