/// Axum HTTP server setup and routing
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::state::MockLedger;

pub fn create_router(ledger: Arc<MockLedger>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Tron-style endpoints
        .route("/v1/accounts/:address", get(tron_account))
        .route("/v1/accounts/:address/transactions", get(tron_native_transactions))
        .route("/v1/accounts/:address/transactions/trc20", get(tron_token_transactions))
        // Etherscan-style endpoint (action dispatch via query parameters)
        .route("/api", get(etherscan_api))
        // Fixture control
        .route("/fixtures/account", post(put_fixture_account))
        .route("/fixtures/reset", post(reset_fixtures))
        // Shared state
        .with_state(ledger)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(ledger: Arc<MockLedger>, host: String, port: u16) -> anyhow::Result<()> {
    let app = create_router(ledger);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("Explorer mock server listening on http://{}", addr);
    log::info!("Tron API under /v1, Etherscan API under /api");
    log::info!("Fixture control: POST /fixtures/account, POST /fixtures/reset");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Bind on an ephemeral localhost port and serve in the background.
/// Returns the bound address; intended for integration tests.
pub async fn spawn_ephemeral(
    ledger: Arc<MockLedger>,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let app = create_router(ledger);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("Explorer mock server stopped: {}", e);
        }
    });

    Ok((addr, handle))
}
