//! Wire-format types shared by the facilitator, its schemes and its HTTP layer.
//!
//! Only x402 v1 is served. Raw requests arrive as [`VerifyRequest`] /
//! [`SettleRequest`] with loosely typed fields; schemes re-parse them with
//! [`v1::VerifyRequest::from_proto`].

pub mod v1;

use serde::{Deserialize, Serialize};

/// Raw verify request body.
pub type VerifyRequest = v1::VerifyRequest;

/// Raw settle request body.
pub type SettleRequest = v1::SettleRequest;

pub type VerifyResponse = v1::VerifyResponse;

pub type SettleResponse = v1::SettleResponse;

/// Why a payment failed verification.
///
/// These are payment-level failures: the request was well formed but the
/// payment it describes cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentVerificationError {
    #[error("Invalid payment format: {0}")]
    InvalidFormat(String),
    #[error("Unsupported chain")]
    UnsupportedChain,
    #[error("Chain id mismatch")]
    ChainIdMismatch,
    #[error("Recipient mismatch")]
    RecipientMismatch,
    #[error("Asset mismatch")]
    AssetMismatch,
    #[error("Invalid payment amount")]
    InvalidPaymentAmount,
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("Payment authorization expired")]
    Expired,
    #[error("Payment authorization not yet valid")]
    Early,
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Transaction simulation failed: {0}")]
    TransactionSimulation(String),
    #[error("Unsupported scheme")]
    UnsupportedScheme,
}

impl PaymentVerificationError {
    /// Machine-readable reason reported as `invalidReason` / `errorReason`.
    pub fn reason(&self) -> &'static str {
        match self {
            PaymentVerificationError::InvalidFormat(_) => "invalid_payload",
            PaymentVerificationError::UnsupportedChain => "invalid_network",
            PaymentVerificationError::ChainIdMismatch => "invalid_network",
            PaymentVerificationError::RecipientMismatch => {
                "invalid_exact_evm_payload_recipient_mismatch"
            }
            PaymentVerificationError::AssetMismatch => "invalid_payment_requirements",
            PaymentVerificationError::InvalidPaymentAmount => {
                "invalid_exact_evm_payload_authorization_value"
            }
            PaymentVerificationError::InsufficientFunds => "insufficient_funds",
            PaymentVerificationError::Expired => {
                "invalid_exact_evm_payload_authorization_valid_before"
            }
            PaymentVerificationError::Early => {
                "invalid_exact_evm_payload_authorization_valid_after"
            }
            PaymentVerificationError::InvalidSignature(_) => "invalid_exact_evm_payload_signature",
            PaymentVerificationError::TransactionSimulation(_) => "invalid_transaction_state",
            PaymentVerificationError::UnsupportedScheme => "invalid_scheme",
        }
    }
}

/// One (version, scheme, network, asset) combination accepted by the facilitator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedPaymentKind {
    pub x402_version: u8,
    pub scheme: String,
    pub network: String,
    pub asset: String,
}

/// Body of `GET /supported`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedResponse {
    pub kinds: Vec<SupportedPaymentKind>,
}

/// Error body returned with HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A settlement result annotated with how it was reached.
///
/// Serializes as the flat v1 settle response plus `bridged` and, when funds
/// were bridged first, `bridgeTxHash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgedSettleResponse {
    #[serde(flatten)]
    pub settlement: SettleResponse,
    pub bridged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_tx_hash: Option<String>,
}

impl BridgedSettleResponse {
    /// Settlement that happened on the requested network.
    pub fn direct(settlement: SettleResponse) -> Self {
        Self {
            settlement,
            bridged: false,
            bridge_tx_hash: None,
        }
    }

    /// Settlement that happened on the origin network after a bridge transfer.
    pub fn bridged(settlement: SettleResponse, bridge_tx_hash: impl Into<String>) -> Self {
        Self {
            settlement,
            bridged: true,
            bridge_tx_hash: Some(bridge_tx_hash.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn success() -> SettleResponse {
        SettleResponse::Success {
            payer: "0xpayer".into(),
            transaction: "0xsettle".into(),
            network: "arbitrum".into(),
        }
    }

    #[test]
    fn test_bridged_settle_response_is_flat() {
        let value = serde_json::to_value(BridgedSettleResponse::bridged(success(), "0xbridge"))
            .unwrap();
        assert_eq!(
            value,
            json!({
                "success": true,
                "payer": "0xpayer",
                "transaction": "0xsettle",
                "network": "arbitrum",
                "bridged": true,
                "bridgeTxHash": "0xbridge"
            })
        );
    }

    #[test]
    fn test_direct_settle_response_omits_bridge_hash() {
        let value = serde_json::to_value(BridgedSettleResponse::direct(success())).unwrap();
        assert_eq!(value["bridged"], false);
        assert!(value.get("bridgeTxHash").is_none());

        let parsed: BridgedSettleResponse = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, BridgedSettleResponse::direct(success()));
    }

    #[test]
    fn test_supported_kind_wire_names() {
        let kind = SupportedPaymentKind {
            x402_version: v1::X402Version1.into(),
            scheme: "exact".into(),
            network: "base".into(),
            asset: "0xaf88d065e77c8cC2239327C5EDb3A432268e5831".into(),
        };
        let value = serde_json::to_value(SupportedResponse { kinds: vec![kind] }).unwrap();
        assert_eq!(value["kinds"][0]["x402Version"], 1);
        assert_eq!(value["kinds"][0]["scheme"], "exact");
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(
            PaymentVerificationError::InsufficientFunds.reason(),
            "insufficient_funds"
        );
        assert_eq!(
            PaymentVerificationError::InvalidSignature("bad".into()).reason(),
            "invalid_exact_evm_payload_signature"
        );
    }
}
