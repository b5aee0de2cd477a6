mod app;
mod config;
mod handlers;
mod models;
mod privacy;
mod record;
mod service;
mod state;
mod storage;
mod validation;

use std::net::SocketAddr;

use intake_common::{bind_listener, init_tracing, shutdown_signal};

use crate::config::ServiceConfig;
use crate::state::AppState;
use crate::storage::AppendStore;

#[tokio::main]
async fn main() {
    let _guards = init_tracing("survey-service");

    let config = ServiceConfig::from_env();
    let store = AppendStore::open(&config.store_path)
        .await
        .expect("open survey log");
    tracing::info!(path = %store.path().display(), "survey log opened");

    let app = app::build_router(AppState::new(store));
    let listener = bind_listener(config.bind_addr, config.port)
        .await
        .expect("bind listener");
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "survey intake listening");
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("serve");

    tracing::info!("survey intake stopped");
}
