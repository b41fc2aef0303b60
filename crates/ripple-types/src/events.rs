use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;
use crate::query::{LiveQuery, QueryOutput};

/// Events sent from the server to a client over the sync gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful identification.
    Ready { user: User },

    /// Fresh result for a live query the client subscribed to.
    QueryUpdate { id: Uuid, result: QueryOutput },

    /// A subscribe was rejected (unknown entity, malformed query).
    SubscriptionError { id: Uuid, message: String },
}

/// Commands sent from a client to the server over the sync gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the connection with an identity-provider token.
    /// Must be the first command.
    Identify { token: String },

    /// Open a live query. The server pushes the current result immediately
    /// and again whenever it changes. `id` is chosen by the client and
    /// echoed on every update.
    Subscribe { id: Uuid, query: LiveQuery },

    /// Close a live query. No further updates are delivered for `id`.
    Unsubscribe { id: Uuid },
}
