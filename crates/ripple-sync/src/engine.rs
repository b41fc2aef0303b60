use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify, RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use ripple_db::Database;
use ripple_types::events::GatewayEvent;
use ripple_types::keys::DepKey;
use ripple_types::models::User;
use ripple_types::query::{LiveQuery, QueryOutput};

use crate::query;

/// Reactive query engine: a publish/subscribe registry of live queries.
///
/// Every subscription runs one lightweight worker that sits parked until a
/// mutation publishes a dependency key it reads. The worker then reruns the
/// full query and pushes the result, but only when it differs from the
/// last pushed value. Publishes arriving while a recompute is in flight
/// coalesce into a single follow-up recompute.
///
/// Subscription ids are chosen by clients, so the registry is keyed by
/// (client, subscription id): two connections reusing the same id never
/// touch each other's queries.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

type SubKey = (Uuid, Uuid);

struct EngineInner {
    db: Arc<Database>,
    subs: RwLock<HashMap<SubKey, SubHandle>>,
}

struct SubHandle {
    /// Distinguishes this registration from a later one reusing the same
    /// subscription id, so a finished worker never tears down its successor.
    worker_id: Uuid,
    deps: Arc<Mutex<HashSet<DepKey>>>,
    notify: Arc<Notify>,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                db,
                subs: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Open a live query for one client. The current result is pushed
    /// immediately, then again after every relevant mutation. Updates
    /// arrive on `tx` as `GatewayEvent::QueryUpdate { id, .. }`.
    pub async fn subscribe(
        &self,
        client: Uuid,
        id: Uuid,
        caller: User,
        live_query: LiveQuery,
        tx: mpsc::UnboundedSender<GatewayEvent>,
    ) {
        // Replace any previous registration this client made under this id.
        self.unsubscribe(client, id).await;

        let worker_id = Uuid::new_v4();
        // Seed with the query's static key set so a mutation landing before
        // the first evaluation finishes still stores a wake-up permit.
        let deps = Arc::new(Mutex::new(query::base_deps(&caller, &live_query)));
        let notify = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        self.inner.subs.write().await.insert(
            (client, id),
            SubHandle {
                worker_id,
                deps: deps.clone(),
                notify: notify.clone(),
                cancel: cancel.clone(),
            },
        );

        let inner = self.inner.clone();
        tokio::spawn(async move {
            run_subscription(
                inner,
                (client, id),
                worker_id,
                caller,
                live_query,
                tx,
                deps,
                notify,
                cancel,
            )
            .await;
        });
    }

    /// Close one client's live query. No further pushes are delivered; a
    /// recompute already in flight may finish but its result is dropped.
    pub async fn unsubscribe(&self, client: Uuid, id: Uuid) {
        if let Some(handle) = self.inner.subs.write().await.remove(&(client, id)) {
            handle.cancel.cancel();
            debug!("subscription {id} of client {client} closed");
        }
    }

    /// Notify the engine that a mutation touched `keys`. Every subscription
    /// whose dependency set intersects them goes stale and is scheduled for
    /// recomputation.
    pub async fn publish(&self, keys: &[DepKey]) {
        if keys.is_empty() {
            return;
        }
        let subs = self.inner.subs.read().await;
        for handle in subs.values() {
            let stale = {
                let deps = handle.deps.lock().await;
                keys.iter().any(|k| deps.contains(k))
            };
            if stale {
                // notify_one stores a permit, so hits during an in-flight
                // recompute coalesce into exactly one follow-up run.
                handle.notify.notify_one();
            }
        }
    }

    pub async fn subscription_count(&self) -> usize {
        self.inner.subs.read().await.len()
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_subscription(
    inner: Arc<EngineInner>,
    key: SubKey,
    worker_id: Uuid,
    caller: User,
    live_query: LiveQuery,
    tx: mpsc::UnboundedSender<GatewayEvent>,
    deps: Arc<Mutex<HashSet<DepKey>>>,
    notify: Arc<Notify>,
    cancel: CancellationToken,
) {
    let id = key.1;
    let mut last_pushed: Option<QueryOutput> = None;

    loop {
        // Rerun the full query off the async runtime (store access blocks).
        let db = inner.db.clone();
        let caller_snapshot = caller.clone();
        let query_snapshot = live_query.clone();
        let evaluated =
            tokio::task::spawn_blocking(move || query::snapshot(&db, &caller_snapshot, &query_snapshot))
                .await;

        let (output, new_deps) = match evaluated {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!("subscription {id} failed: {e}");
                let _ = tx.send(GatewayEvent::SubscriptionError {
                    id,
                    message: e.to_string(),
                });
                break;
            }
            Err(e) => {
                warn!("subscription {id} worker join error: {e}");
                break;
            }
        };

        *deps.lock().await = new_deps;

        // Cancelled while computing: the result must not be delivered.
        if cancel.is_cancelled() {
            return;
        }

        if last_pushed.as_ref() != Some(&output) {
            if tx
                .send(GatewayEvent::QueryUpdate {
                    id,
                    result: output.clone(),
                })
                .is_err()
            {
                // Client side dropped the channel.
                break;
            }
            last_pushed = Some(output);
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = notify.notified() => {}
        }
    }

    // Worker ended on its own (error or dead client): drop the
    // registration, but only if it still belongs to this worker.
    let mut subs = inner.subs.write().await;
    if subs.get(&key).is_some_and(|h| h.worker_id == worker_id) {
        subs.remove(&key);
    }
}
