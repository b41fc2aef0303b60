use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ripple_core::{identity, presence};
use ripple_db::Database;
use ripple_types::events::{GatewayCommand, GatewayEvent};
use ripple_types::models::User;

use crate::engine::Engine;

/// How long a fresh connection gets to send Identify before being dropped.
const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle one sync gateway connection: identify, mark the user online, then
/// shuttle Subscribe/Unsubscribe commands in and query updates out until
/// the client disconnects.
pub async fn handle_connection(
    socket: WebSocket,
    db: Arc<Database>,
    engine: Engine,
    jwt_secret: String,
) {
    let (mut sender, mut receiver) = socket.split();

    let user = match wait_for_identify(&mut receiver, &db, &engine, &jwt_secret).await {
        Some(user) => user,
        None => {
            warn!("gateway client failed to identify, closing");
            return;
        }
    };

    // Subscription ids come from the client, so the engine scopes them to
    // this connection.
    let client_id = Uuid::new_v4();
    info!("{} ({}) connected to gateway", user.name, user.id);

    let ready = GatewayEvent::Ready { user: user.clone() };
    if send_event(&mut sender, &ready).await.is_err() {
        return;
    }

    set_presence(&db, &engine, &user, true).await;

    // All subscription workers push into this channel; we relay to the socket.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<GatewayEvent>();
    let mut subscriptions: HashSet<Uuid> = HashSet::new();

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let Some(Ok(msg)) = incoming else { break };
                let Message::Text(text) = msg else { continue };
                let command = match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(cmd) => cmd,
                    Err(e) => {
                        debug!("ignoring malformed gateway command: {e}");
                        continue;
                    }
                };
                match command {
                    GatewayCommand::Identify { .. } => {
                        // Already identified; ignore.
                    }
                    GatewayCommand::Subscribe { id, query } => {
                        subscriptions.insert(id);
                        engine.subscribe(client_id, id, user.clone(), query, event_tx.clone()).await;
                    }
                    GatewayCommand::Unsubscribe { id } => {
                        subscriptions.remove(&id);
                        engine.unsubscribe(client_id, id).await;
                    }
                }
            }
            outgoing = event_rx.recv() => {
                let Some(event) = outgoing else { break };
                if send_event(&mut sender, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    // Teardown: release every live query, then go offline. A connection
    // dropped without reaching this point leaves the user online until the
    // next reconnect (accepted staleness window).
    for id in subscriptions {
        engine.unsubscribe(client_id, id).await;
    }
    set_presence(&db, &engine, &user, false).await;
    info!("{} ({}) disconnected from gateway", user.name, user.id);
}

async fn wait_for_identify(
    receiver: &mut SplitStream<WebSocket>,
    db: &Arc<Database>,
    engine: &Engine,
    jwt_secret: &str,
) -> Option<User> {
    let deadline = tokio::time::sleep(IDENTIFY_TIMEOUT);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => return None,
            incoming = receiver.next() => {
                let msg = incoming?.ok()?;
                let Message::Text(text) = msg else { continue };
                let Ok(GatewayCommand::Identify { token }) = serde_json::from_str(&text) else {
                    continue;
                };

                let claims = identity::decode_token(jwt_secret, &token).ok()?;
                let db = db.clone();
                let resolved = tokio::task::spawn_blocking(move || identity::resolve(&db, &claims))
                    .await
                    .ok()?;
                match resolved {
                    Ok((user, keys)) => {
                        engine.publish(&keys).await;
                        return Some(user);
                    }
                    Err(e) => {
                        warn!("identity resolution failed: {e}");
                        return None;
                    }
                }
            }
        }
    }
}

async fn set_presence(db: &Arc<Database>, engine: &Engine, user: &User, online: bool) {
    let db = db.clone();
    let user = user.clone();
    let result = tokio::task::spawn_blocking(move || {
        if online {
            presence::set_online(&db, &user)
        } else {
            presence::set_offline(&db, &user)
        }
    })
    .await;

    match result {
        Ok(Ok(keys)) => engine.publish(&keys).await,
        Ok(Err(e)) => warn!("presence update failed: {e}"),
        Err(e) => warn!("presence task join error: {e}"),
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &GatewayEvent,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(event).unwrap_or_default();
    sender.send(Message::Text(payload.into())).await
}
