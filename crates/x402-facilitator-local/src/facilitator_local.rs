//! The settlement-with-bridging orchestrator.
//!
//! [`FacilitatorLocal`] settles every payment on a single **origin network**.
//! A payment whose requirements name another network is first bridged to the
//! origin network and then settled there:
//!
//! 1. the payment is checked against the scheme's format; a malformed payment
//!    is rejected before any bridge or settlement call
//! 2. requirements network == origin: settle directly with a signer scoped to it
//! 3. otherwise: bridge `maxAmountRequired` of the asset to the origin network,
//!    then settle on the origin network with the original payload and requirements
//!
//! At most one settlement is attempted per request and bridging always
//! completes before it starts. A payment the scheme rejects at settlement is
//! reported as `success: false` with its reason, still annotated with the
//! bridge outcome. Nothing is rolled back when settlement fails after a
//! successful bridge; the bridge transaction is logged at `error` level for
//! manual reconciliation.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;
use x402_bridge::{Bridge, BridgeError, BridgeRequest};
use x402_types::chain::{SignerProvider, SignerProviderError};
use x402_types::facilitator::Facilitator;
use x402_types::networks::{Network, UnknownNetworkError};
use x402_types::proto;
use x402_types::proto::{PaymentVerificationError, v1};
use x402_types::scheme::{
    X402SchemeFacilitator, X402SchemeFacilitatorBuilder, X402SchemeFacilitatorError,
};

/// Scheme name advertised by `/supported`.
pub const EXACT_SCHEME: &str = "exact";

/// Static settlement configuration of one facilitator instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementConfig {
    /// The network every payment is finally settled on.
    pub origin_network: Network,
    /// Token address advertised for every supported network.
    pub origin_asset: String,
    /// Networks advertised by `/supported`.
    pub supported_networks: Vec<Network>,
}

/// Orchestrates verification, bridging and settlement.
pub struct FacilitatorLocal<S: SignerProvider> {
    signers: S,
    scheme: Arc<dyn X402SchemeFacilitatorBuilder<S::Provider> + Send + Sync>,
    bridge: Arc<dyn Bridge>,
    config: SettlementConfig,
}

impl<S: SignerProvider> FacilitatorLocal<S> {
    pub fn new<B, X>(signers: S, scheme: X, bridge: B, config: SettlementConfig) -> Self
    where
        B: Bridge + 'static,
        X: X402SchemeFacilitatorBuilder<S::Provider> + Send + Sync + 'static,
    {
        Self {
            signers,
            scheme: Arc::new(scheme),
            bridge: Arc::new(bridge),
            config,
        }
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Builds the payment scheme against a signer scoped to `network`.
    async fn scheme_for(
        &self,
        network: Network,
    ) -> Result<Box<dyn X402SchemeFacilitator>, FacilitatorLocalError> {
        let provider = self.signers.signer_for(network).await?;
        self.scheme
            .build(provider, None)
            .map_err(|e| FacilitatorLocalError::SchemeBuild(e.to_string()))
    }
}

fn requested_network(request: &proto::VerifyRequest) -> Result<Network, FacilitatorLocalError> {
    Ok(Network::from_str(&request.payment_requirements.network)?)
}

fn authorization_field<'a>(request: &'a proto::VerifyRequest, field: &str) -> Option<&'a str> {
    request
        .payment_payload
        .payload
        .get("authorization")
        .and_then(|authorization| authorization.get(field))
        .and_then(Value::as_str)
}

fn payer(request: &proto::VerifyRequest) -> Option<String> {
    authorization_field(request, "from").map(str::to_owned)
}

/// Who receives bridged funds: the payload's `authorization.to`, else `payTo`.
fn bridge_recipient(request: &proto::SettleRequest) -> String {
    authorization_field(request, "to")
        .map(str::to_owned)
        .unwrap_or_else(|| request.payment_requirements.pay_to.clone())
}

/// Settles on `network`; a payment-level rejection becomes a failed settlement result.
async fn settle_with(
    scheme: &dyn X402SchemeFacilitator,
    network: Network,
    request: &proto::SettleRequest,
) -> Result<proto::SettleResponse, FacilitatorLocalError> {
    match scheme.settle(request).await {
        Ok(settlement) => Ok(settlement),
        Err(X402SchemeFacilitatorError::PaymentVerification(e)) => {
            tracing::info!(reason = e.reason(), "Payment rejected at settlement: {e}");
            Ok(v1::SettleResponse::Error {
                reason: e.reason().to_string(),
                payer: payer(request),
                network: network.to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait::async_trait]
impl<S: SignerProvider> Facilitator for FacilitatorLocal<S> {
    type Error = FacilitatorLocalError;

    /// Verifies against the network named by the requirements. No allow-list applies.
    #[instrument(skip_all, err, fields(network = %request.payment_requirements.network))]
    async fn verify(
        &self,
        request: &proto::VerifyRequest,
    ) -> Result<proto::VerifyResponse, Self::Error> {
        let network = requested_network(request)?;
        let scheme = self.scheme_for(network).await?;
        match scheme.verify(request).await {
            Ok(response) => Ok(response),
            Err(X402SchemeFacilitatorError::PaymentVerification(e)) => {
                tracing::info!(reason = e.reason(), "Payment is invalid: {e}");
                Ok(v1::VerifyResponse::invalid(payer(request), e.reason()))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip_all, err, fields(
        network = %request.payment_requirements.network,
        origin = %self.config.origin_network
    ))]
    async fn settle(
        &self,
        request: &proto::SettleRequest,
    ) -> Result<proto::BridgedSettleResponse, Self::Error> {
        let requested = requested_network(request)?;
        let origin = self.config.origin_network;
        let scheme = self.scheme_for(origin).await?;
        scheme
            .validate(request)
            .map_err(FacilitatorLocalError::InvalidPayment)?;

        if requested == origin {
            let settlement = settle_with(scheme.as_ref(), origin, request).await?;
            return Ok(proto::BridgedSettleResponse::direct(settlement));
        }

        let requirements = &request.payment_requirements;
        let bridge_request = BridgeRequest {
            from: requested,
            to: origin,
            asset: requirements.asset.clone(),
            amount: requirements.max_amount_required.clone(),
            recipient: bridge_recipient(request),
        };
        tracing::info!(
            from = %bridge_request.from,
            to = %bridge_request.to,
            asset = %bridge_request.asset,
            amount = %bridge_request.amount,
            recipient = %bridge_request.recipient,
            "Bridging before settlement"
        );
        let receipt = self.bridge.bridge(&bridge_request).await?;
        tracing::info!(bridge_tx = %receipt.tx_hash, "Bridge completed, settling on {origin}");

        match settle_with(scheme.as_ref(), origin, request).await {
            Ok(settlement) => {
                if let v1::SettleResponse::Error { reason, .. } = &settlement {
                    tracing::error!(
                        bridge_tx = %receipt.tx_hash,
                        from = %requested,
                        to = %origin,
                        reason = %reason,
                        "Payment rejected after bridging; bridged funds are not reconciled"
                    );
                }
                Ok(proto::BridgedSettleResponse::bridged(
                    settlement,
                    receipt.tx_hash,
                ))
            }
            Err(e) => {
                tracing::error!(
                    bridge_tx = %receipt.tx_hash,
                    from = %requested,
                    to = %origin,
                    error = %e,
                    "Settlement failed after bridging; bridged funds are not reconciled"
                );
                Err(e)
            }
        }
    }

    async fn supported(&self) -> Result<proto::SupportedResponse, Self::Error> {
        let kinds = self
            .config
            .supported_networks
            .iter()
            .map(|network| proto::SupportedPaymentKind {
                x402_version: v1::X402Version1.into(),
                scheme: EXACT_SCHEME.to_string(),
                network: network.to_string(),
                asset: self.config.origin_asset.clone(),
            })
            .collect();
        Ok(proto::SupportedResponse { kinds })
    }
}

impl<S: SignerProvider> fmt::Debug for FacilitatorLocal<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacilitatorLocal")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FacilitatorLocalError {
    #[error(transparent)]
    UnsupportedNetwork(#[from] UnknownNetworkError),
    #[error(transparent)]
    InvalidPayment(PaymentVerificationError),
    #[error(transparent)]
    Signer(#[from] SignerProviderError),
    #[error("Failed to build payment scheme: {0}")]
    SchemeBuild(String),
    #[error("Bridge failed: {0}")]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Scheme(#[from] X402SchemeFacilitatorError),
}
