use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use ripple_api::middleware::auth_context;
use ripple_api::state::{AppState, AppStateInner};
use ripple_api::{conversations, messages, presence, reactions, reads, typing, users};
use ripple_sync::connection;
use ripple_sync::engine::Engine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ripple=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("RIPPLE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("RIPPLE_DB_PATH").unwrap_or_else(|_| "ripple.db".into());
    let host = std::env::var("RIPPLE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("RIPPLE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Shared store + reactive query engine
    let db = Arc::new(ripple_db::Database::open(&PathBuf::from(&db_path))?);
    let engine = Engine::new(db.clone());

    let state: AppState = Arc::new(AppStateInner {
        db,
        engine,
        jwt_secret,
    });

    let app = Router::new()
        .route("/users/me", get(users::me))
        .route("/users", get(users::list))
        .route("/conversations", get(conversations::list))
        .route("/conversations/direct", post(conversations::create_direct))
        .route("/conversations/group", post(conversations::create_group))
        .route("/conversations/{id}", get(conversations::get_by_id))
        .route(
            "/conversations/{id}/messages",
            get(messages::list).post(messages::send),
        )
        .route(
            "/conversations/{id}/typing",
            get(typing::get).put(typing::set).delete(typing::clear),
        )
        .route("/conversations/{id}/read", put(reads::mark))
        .route("/conversations/{id}/unread", get(reads::unread))
        .route("/messages/{id}", delete(messages::remove))
        .route(
            "/messages/{id}/reactions",
            get(reactions::list).post(reactions::toggle),
        )
        .route("/presence/online", put(presence::online))
        .route("/presence/offline", put(presence::offline))
        .route("/gateway", get(ws_upgrade))
        .layer(middleware::from_fn_with_state(state.clone(), auth_context))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("ripple server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        connection::handle_connection(
            socket,
            state.db.clone(),
            state.engine.clone(),
            state.jwt_secret.clone(),
        )
    })
}
