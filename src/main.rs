//! Shift Scheduling - Axum Server
//!
//! Run with: cargo run
//! Configure with SHIFT_SCHEDULING_ADDR, SHIFT_SCHEDULING_DEMO,
//! SHIFT_SCHEDULING_MAX_RANGE_DAYS and SHIFT_SCHEDULING_SESSION_IDLE_SECS.

use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shift_scheduling::api;
use shift_scheduling::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("shift_scheduling=info".parse()?))
        .init();

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr;
    let demo = config.demo_data;

    let state = Arc::new(api::AppState::new(config));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state).layer(cors);

    #[cfg(feature = "console")]
    shift_scheduling::console::print_banner(&addr.to_string(), demo.as_str());
    info!(%addr, demo = demo.as_str(), "Server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
