//! # checkout-server
//!
//! Checkout orchestration and pricing over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! # Optional overrides
//! export STORE_CONFIG=config/store.toml
//! export PRODUCTS_CONFIG=config/products.toml
//! export PORT=8080
//!
//! # Run the server
//! checkout-server
//! ```

use cart_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Products loaded: {}", state.catalog.products.len());
    info!("Discount codes: {}", state.store.discounts.len());
    info!("Strategies: {:?}", state.services.strategies());

    let app = routes::create_router(state);

    info!("Checkout server starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Checkouts: POST http://{}/api/v1/checkouts", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  checkout-rs
  ━━━━━━━━━━━━━━━━━━━━━━━
  Checkout and pricing engine
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
