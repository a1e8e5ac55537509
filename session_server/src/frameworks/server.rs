// Framework bootstrap for the session server runtime.

use crate::domain::TokenValidator;
use crate::frameworks::config::{self, ServerSettings};
use crate::interface_adapters::clients::auth::AuthClient;
use crate::interface_adapters::net::{Hub, status_handler, world_state_handler, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{WorldStore, world_task};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::Notify;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Serves with default settings and no token validator (every join is a guest join).
pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    run_with_settings(listener, ServerSettings::default(), None).await
}

pub async fn run_with_settings(
    listener: tokio::net::TcpListener,
    settings: ServerSettings,
    validator: Option<Arc<dyn TokenValidator>>,
) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(settings, validator);

    // World maintenance ticker; stopped once the server future returns.
    let shutdown = Arc::new(Notify::new());
    tokio::spawn(world_task(
        state.world.clone(),
        settings.world_tick_interval,
        shutdown.clone(),
    ));

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/world/state", get(world_state_handler))
        .route("/status", get(status_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    let served = axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    });
    shutdown.notify_one();
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    let validator = build_validator()?;
    run_with_settings(listener, ServerSettings::default(), validator).await
}

fn build_validator() -> Result<Option<Arc<dyn TokenValidator>>> {
    let Some(auth_base_url) = config::auth_service_url() else {
        tracing::info!("AUTH_SERVICE_URL not set; join tokens are not verified");
        return Ok(None);
    };

    let auth_verify_timeout = config::auth_verify_timeout();
    let auth_client = AuthClient::new(auth_base_url, auth_verify_timeout)
        .map_err(|e| std::io::Error::other(format!("failed to initialize auth client: {e}")))?;
    tracing::debug!(
        auth_base_url = %auth_client.base_url(),
        auth_verify_timeout_ms = auth_verify_timeout.as_millis(),
        "auth client configured"
    );
    Ok(Some(Arc::new(auth_client)))
}

fn build_state(
    settings: ServerSettings,
    validator: Option<Arc<dyn TokenValidator>>,
) -> Arc<AppState> {
    let world = Arc::new(WorldStore::new(settings.player));
    let hub = Hub::new(settings.outbound_queue_capacity);
    tracing::debug!(
        interaction_radius = settings.player.interaction_radius,
        max_move_step = settings.player.max_move_step,
        outbound_queue_capacity = settings.outbound_queue_capacity,
        keepalive_secs = settings.keepalive_interval.as_secs(),
        "session state configured"
    );

    Arc::new(AppState::new(
        world,
        hub,
        validator,
        settings.stamina,
        settings.keepalive_interval,
        settings.write_timeout,
    ))
}
