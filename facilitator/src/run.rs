//! x402 bridging facilitator HTTP server entrypoint.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Greeting |
//! | `GET` | `/verify` | Describe the verification request body |
//! | `POST` | `/verify` | Verify a payment payload against requirements |
//! | `GET` | `/settle` | Describe the settlement request body |
//! | `POST` | `/settle` | Settle a payment on the origin network, bridging first if needed |
//! | `GET` | `/supported` | List supported payment kinds (version/scheme/network/asset) |
//! | `GET` | `/health` | Same as `/supported` |
//!
//! # Environment Variables
//!
//! - `EVM_PRIVATE_KEY` - facilitator signing key (required)
//! - `HOST` - Server bind address (default: `0.0.0.0`)
//! - `PORT` - Server port (default: `3000`)
//! - `CONFIG` - Path to an optional JSON configuration file
//! - `ORIGIN_NETWORK`, `ORIGIN_ASSET`, `SUPPORTED_NETWORKS`, `BRIDGE_DELAY_MS` - settlement routing
//! - `RPC_URL_<NETWORK>` - per-network RPC endpoint, e.g. `RPC_URL_BASE_SEPOLIA`
//! - `X402_CORS_ALLOWED_ORIGINS` - comma-separated CORS allowlist, or `*` to allow all (default)
//! - `RUST_LOG` - log filter (default: `info`)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT` - OTLP trace export (when `telemetry` feature enabled)

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method};
use dotenvy::dotenv;
use tower_http::cors;

use x402_bridge::MockBridge;
use x402_chain_eip155::{Eip155SignerProvider, V1Eip155Exact};
use x402_facilitator_local::util::{SigDown, Telemetry};
use x402_facilitator_local::{FacilitatorLocal, handlers};

use crate::config::Config;

fn build_cors_layer() -> Result<cors::CorsLayer, io::Error> {
    let raw = std::env::var("X402_CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let base = cors::CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(cors::Any);

    if raw.trim() == "*" {
        return Ok(base.allow_origin(cors::Any));
    }

    let origins: Vec<HeaderValue> = raw
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(HeaderValue::from_str)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid X402_CORS_ALLOWED_ORIGINS: {e}"),
            )
        })?;

    if origins.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "X402_CORS_ALLOWED_ORIGINS is empty",
        ));
    }

    Ok(base.allow_origin(origins))
}

/// Initializes and runs the facilitator server.
///
/// - Loads `.env` variables and installs logging.
/// - Resolves configuration; a missing `EVM_PRIVATE_KEY` aborts startup.
/// - Wires the EVM signer provider, the `exact` scheme and the bridge into the orchestrator.
/// - Serves the HTTP endpoints until SIGINT/SIGTERM.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::CryptoProvider::install_default(rustls::crypto::ring::default_provider())
        .map_err(|e| io::Error::other(format!("failed to initialize rustls crypto provider: {e:?}")))?;

    dotenv().ok();

    let telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .register();
    #[cfg(feature = "telemetry")]
    {
        if telemetry.exports_traces() {
            tracing::info!("Exporting traces over OTLP");
        }
    }

    let config = Config::load().inspect_err(|e| tracing::error!("Invalid configuration: {e}"))?;

    let signers = Eip155SignerProvider::from_private_key(config.private_key(), config.rpc().clone())?;
    let bridge = MockBridge::new(config.bridge_delay());
    let settlement = config.settlement();
    tracing::info!(
        signer = %signers.address(),
        origin = %settlement.origin_network,
        asset = %settlement.origin_asset,
        supported = ?settlement.supported_networks,
        bridge_delay_ms = config.bridge_delay().as_millis() as u64,
        "Facilitator configured"
    );

    let facilitator = FacilitatorLocal::new(signers, V1Eip155Exact, bridge, settlement.clone());
    let axum_state = Arc::new(facilitator);

    let http_endpoints = Router::new()
        .merge(handlers::routes().with_state(axum_state))
        .layer(telemetry.http_tracing())
        .layer(build_cors_layer()?);

    let addr = SocketAddr::new(config.host(), config.port());
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .inspect_err(|e| tracing::error!("Failed to bind to {}: {}", addr, e))?;

    let sig_down = SigDown::try_new()?;
    let axum_cancellation_token = sig_down.cancellation_token();
    let axum_graceful_shutdown = async move { axum_cancellation_token.cancelled().await };
    axum::serve(listener, http_endpoints)
        .with_graceful_shutdown(axum_graceful_shutdown)
        .await?;
    tracing::info!("Server stopped");

    Ok(())
}
