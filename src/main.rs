use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use smart_porter::api;
use smart_porter::assistant::gemini::GeminiAssistant;
use smart_porter::auth::session::SessionStore;
use smart_porter::config::Config;
use smart_porter::engine::Engine;
use smart_porter::error::AppError;
use smart_porter::pricing::RandomFare;
use smart_porter::seed::seed_demo_data;
use smart_porter::state::AppState;
use smart_porter::store::snapshot::{run_snapshot_writer, Snapshot};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let engine = match &config.data_path {
        Some(path) => match Snapshot::load(path).await? {
            Some(snapshot) => {
                tracing::info!(
                    path = %path.display(),
                    identities = snapshot.identities.len(),
                    orders = snapshot.orders.len(),
                    "restored stores from snapshot"
                );
                Engine::from_snapshot(snapshot)
            }
            None => Engine::in_memory(),
        },
        None => {
            tracing::warn!("DATA_PATH not set; data will not survive a restart");
            Engine::in_memory()
        }
    };

    if config.seed_demo_data {
        seed_demo_data(&engine, &config.demo_password)?;
    }

    let assistant = GeminiAssistant::new(
        config.gemini_api_key.clone(),
        &config.gemini_base_url,
        &config.gemini_model,
        config.assistant_timeout,
    )?;

    let (mut app_state, snapshot_rx) = AppState::new(
        engine,
        Arc::new(RandomFare),
        Arc::new(assistant),
        config.event_buffer_size,
    );
    app_state.sessions = SessionStore::with_ttl(config.session_ttl);
    let shared_state = Arc::new(app_state);

    if let Some(path) = config.data_path.clone() {
        tokio::spawn(run_snapshot_writer(shared_state.clone(), path, snapshot_rx));
        shared_state.mark_dirty();
    }

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    if let Some(path) = &config.data_path {
        shared_state.engine.snapshot().write(path).await?;
        tracing::info!(path = %path.display(), "final snapshot written");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
