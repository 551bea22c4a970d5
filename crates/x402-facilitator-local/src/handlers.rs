//! HTTP endpoints of the bridging facilitator.
//!
//! Protocol endpoints (`/verify`, `/settle`) and discovery endpoints
//! (`/supported`, `/health`). Every failure is answered with HTTP 400 and an
//! [`ErrorResponse`] body; the server keeps serving.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;
use x402_types::facilitator::Facilitator;
use x402_types::proto::{ErrorResponse, SettleRequest, VerifyRequest};

use crate::facilitator_local::FacilitatorLocalError;

/// Router with every facilitator endpoint; state is the shared facilitator.
pub fn routes<F>() -> Router<Arc<F>>
where
    F: Facilitator<Error = FacilitatorLocalError> + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(get_root))
        .route("/verify", get(get_verify_info).post(post_verify::<F>))
        .route("/settle", get(get_settle_info).post(post_settle::<F>))
        .route("/supported", get(get_supported::<F>))
        .route("/health", get(get_supported::<F>))
}

#[instrument(skip_all)]
pub async fn get_root() -> impl IntoResponse {
    let pkg_name = env!("CARGO_PKG_NAME");
    (StatusCode::OK, format!("Hello from {pkg_name}!"))
}

/// `GET /verify`: machine-readable description of the `/verify` body.
#[instrument(skip_all)]
pub async fn get_verify_info() -> impl IntoResponse {
    Json(json!({
        "endpoint": "/verify",
        "description": "POST to verify x402 payments",
        "body": {
            "paymentPayload": "PaymentPayload",
            "paymentRequirements": "PaymentRequirements",
        }
    }))
}

/// `GET /settle`: machine-readable description of the `/settle` body.
#[instrument(skip_all)]
pub async fn get_settle_info() -> impl IntoResponse {
    Json(json!({
        "endpoint": "/settle",
        "description": "POST to settle x402 payments, bridging to the origin network when needed",
        "body": {
            "paymentPayload": "PaymentPayload",
            "paymentRequirements": "PaymentRequirements",
        }
    }))
}

/// `GET /supported` and `GET /health`: payment kinds this facilitator accepts.
#[instrument(skip_all)]
pub async fn get_supported<F>(State(facilitator): State<Arc<F>>) -> Response
where
    F: Facilitator<Error = FacilitatorLocalError>,
{
    match facilitator.supported().await {
        Ok(supported) => (StatusCode::OK, Json(supported)).into_response(),
        Err(error) => bad_request(format!("Invalid request: {error}")),
    }
}

/// `POST /verify`: checks a payment against its requirements without settling.
///
/// The payment is checked on the network it names, whether or not that
/// network is advertised by `/supported`.
#[instrument(skip_all)]
pub async fn post_verify<F>(
    State(facilitator): State<Arc<F>>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Response
where
    F: Facilitator<Error = FacilitatorLocalError>,
{
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Malformed verify request");
            return bad_request("Invalid request");
        }
    };
    match facilitator.verify(&body).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => {
            tracing::warn!(
                error = %error,
                network = %body.payment_requirements.network,
                scheme = %body.payment_requirements.scheme,
                payer = payer_of(&body).unwrap_or("unknown"),
                "Verification failed"
            );
            bad_request("Invalid request")
        }
    }
}

/// `POST /settle`: settles a payment on the origin network, bridging first
/// when the requirements name another network.
#[instrument(skip_all)]
pub async fn post_settle<F>(
    State(facilitator): State<Arc<F>>,
    body: Result<Json<SettleRequest>, JsonRejection>,
) -> Response
where
    F: Facilitator<Error = FacilitatorLocalError>,
{
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            let detail = rejection.body_text();
            tracing::warn!(error = %detail, "Malformed settle request");
            return bad_request(format!("Invalid request: {detail}"));
        }
    };
    match facilitator.settle(&body).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => {
            tracing::warn!(
                error = %error,
                network = %body.payment_requirements.network,
                scheme = %body.payment_requirements.scheme,
                payer = payer_of(&body).unwrap_or("unknown"),
                "Settlement failed"
            );
            bad_request(format!("Invalid request: {error}"))
        }
    }
}

/// The paying address, when the payload carries an ERC-3009 authorization.
fn payer_of(request: &VerifyRequest) -> Option<&str> {
    request
        .payment_payload
        .payload
        .pointer("/authorization/from")
        .and_then(serde_json::Value::as_str)
}

fn bad_request(error: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}
