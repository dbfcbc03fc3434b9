//! Contact referee binary: wires the bridge WebSocket, the referee task, the archive and the
//! read-only HTTP/SSE surface.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contact_referee::{
    config::AppConfig,
    dao::game_store::{GameStore, memory::MemoryGameStore},
    routes,
    services::event_loop,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let bridge_token = env::var("CONTACT_BRIDGE_TOKEN").ok().filter(|t| !t.is_empty());
    if bridge_token.is_none() {
        info!("CONTACT_BRIDGE_TOKEN not set; any bridge may connect");
    }

    let (app_state, inbox) = AppState::new(config, bridge_token);
    start_storage(&app_state).await;
    tokio::spawn(event_loop::run(app_state.clone(), inbox));

    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(app_state))
        .await
        .context("serving axum")?;

    Ok(())
}

/// Use CouchDB when `COUCH_BASE_URL` is set, otherwise keep the archive in memory.
async fn start_storage(state: &SharedState) {
    #[cfg(feature = "couch-store")]
    if env::var("COUCH_BASE_URL").is_ok() {
        use contact_referee::{
            dao::{
                game_store::couchdb::{CouchConfig, CouchGameStore},
                storage::StorageError,
            },
            services::storage_supervisor,
        };

        let supervisor_state = state.clone();
        tokio::spawn(storage_supervisor::run(supervisor_state, || async {
            let config = CouchConfig::from_env()?;
            let store = CouchGameStore::connect(config).await?;
            Ok::<_, StorageError>(Arc::new(store) as Arc<dyn GameStore>)
        }));
        return;
    }

    info!("no archive configured; games are kept in memory only");
    state
        .set_game_store(Arc::new(MemoryGameStore::new()) as Arc<dyn GameStore>)
        .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C, SIGTERM or `!shutdown` and stop the server gracefully.
async fn shutdown_signal(state: SharedState) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
            _ = state.shutdown_requested() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = state.shutdown_requested() => {},
        }
    }
}
