// Framework bootstrap for the game server runtime.

use crate::frameworks::config;
use crate::interface_adapters::hub::ConnectionHub;
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::{AppState, InMemoryScoreStore};
use crate::use_cases::{MatchOrchestrator, MatchSettings, Registry};

use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

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

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let settings = MatchSettings {
        slow_duration: config::SLOW_EFFECT_DURATION,
        gravity_tick: config::gravity_tick(),
    };
    tracing::debug!(
        gravity_tick_ms = settings.gravity_tick.map(|tick| tick.as_millis() as u64),
        "match settings"
    );
    let app = app(build_state(settings));

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_host(), config::http_port());

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

/// Wires the registry, connection hub and orchestrator together.
pub fn build_state(settings: MatchSettings) -> AppState {
    let hub = Arc::new(ConnectionHub::new(config::OUTBOUND_CHANNEL_CAPACITY));
    let orchestrator = MatchOrchestrator::new(Arc::new(Registry::new()), hub.clone(), settings);

    AppState {
        orchestrator,
        hub,
        scores: InMemoryScoreStore::default(),
    }
}
