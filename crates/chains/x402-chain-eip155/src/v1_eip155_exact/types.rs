//! Type definitions for the V1 EIP-155 "exact" payment scheme.
//!
//! This module defines the wire format types for ERC-3009 based payments
//! on EVM chains using the V1 x402 protocol.

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::sol;
use serde::{Deserialize, Serialize};
use x402_types::lit_str;
use x402_types::proto::v1;
use x402_types::timestamp::UnixTimestamp;

lit_str!(ExactScheme, "exact");

/// V1 verify request using the exact EVM payment scheme.
pub type VerifyRequest = v1::VerifyRequest<PaymentPayload, PaymentRequirements>;

/// Settle requests share the verify request structure.
pub type SettleRequest = VerifyRequest;

pub type PaymentPayload = v1::PaymentPayload<ExactScheme, ExactEvmPayload>;

/// Payment requirements with the amount and addresses parsed.
pub type PaymentRequirements =
    v1::PaymentRequirements<ExactScheme, U256, Address, PaymentRequirementsExtra>;

/// Everything needed to execute `transferWithAuthorization` on an ERC-3009 token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayload {
    /// EIP-712 signature over the authorization.
    ///
    /// 64/65-byte EOA signatures are split into (v, r, s); anything else is
    /// handed to the token as EIP-1271 bytes.
    pub signature: Bytes,
    pub authorization: ExactEvmPayloadAuthorization,
}

/// The signed ERC-3009 `TransferWithAuthorization` message.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayloadAuthorization {
    /// Token owner authorizing the transfer.
    pub from: Address,
    /// Recipient of the transfer.
    pub to: Address,
    /// Amount in the token's smallest unit.
    pub value: U256,
    /// Not valid before this timestamp (inclusive).
    pub valid_after: UnixTimestamp,
    /// Expires at this timestamp (exclusive).
    pub valid_before: UnixTimestamp,
    /// Unique 32-byte nonce.
    pub nonce: B256,
}

/// EIP-712 domain parameters for the token contract.
///
/// When present, the facilitator skips querying `name()` / `version()` on-chain.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirementsExtra {
    pub name: String,
    pub version: String,
}

sol!(
    /// ERC-3009 `TransferWithAuthorization` as used in EIP-712 typed data.
    #[derive(Serialize, Deserialize)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_json() -> serde_json::Value {
        json!({
            "x402Version": 1,
            "paymentPayload": {
                "x402Version": 1,
                "scheme": "exact",
                "network": "arbitrum",
                "payload": {
                    "signature": "0x1234",
                    "authorization": {
                        "from": "0x857b06519E91e3A54538791bDbb0E22373e36b66",
                        "to": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                        "value": "10000",
                        "validAfter": "1740672089",
                        "validBefore": 1740672154,
                        "nonce": "0xf3746613c2d920b5fdabc0856f2aeb2d4f88ee6037b8cc5d04a71a4462f13480"
                    }
                }
            },
            "paymentRequirements": {
                "scheme": "exact",
                "network": "arbitrum",
                "maxAmountRequired": "10000",
                "resource": "https://api.example.com/premium",
                "description": "Premium content",
                "mimeType": "application/json",
                "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                "maxTimeoutSeconds": 60,
                "asset": "0xaf88d065e77c8cC2239327C5EDb3A432268e5831",
                "extra": { "name": "USD Coin", "version": "2" }
            }
        })
    }

    #[test]
    fn test_parse_typed_request() {
        let raw: x402_types::proto::VerifyRequest =
            serde_json::from_value(request_json()).unwrap();
        let typed = VerifyRequest::from_proto(raw).unwrap();
        let authorization = typed.payment_payload.payload.authorization;
        assert_eq!(authorization.value, U256::from(10_000u64));
        assert_eq!(authorization.valid_after.as_secs(), 1_740_672_089);
        assert_eq!(authorization.valid_before.as_secs(), 1_740_672_154);
        assert_eq!(
            typed.payment_requirements.max_amount_required,
            U256::from(10_000u64)
        );
        assert_eq!(
            typed.payment_requirements.extra,
            Some(PaymentRequirementsExtra {
                name: "USD Coin".into(),
                version: "2".into()
            })
        );
    }

    #[test]
    fn test_parse_typed_request_without_extra() {
        let mut raw = request_json();
        raw["paymentRequirements"]
            .as_object_mut()
            .unwrap()
            .remove("extra");
        let raw: x402_types::proto::VerifyRequest = serde_json::from_value(raw).unwrap();
        let typed = VerifyRequest::from_proto(raw).unwrap();
        assert_eq!(typed.payment_requirements.extra, None);
    }

    #[test]
    fn test_reject_other_scheme() {
        let mut raw = request_json();
        raw["paymentPayload"]["scheme"] = json!("upto");
        let raw: x402_types::proto::VerifyRequest = serde_json::from_value(raw).unwrap();
        assert!(VerifyRequest::from_proto(raw).is_err());
    }

    #[test]
    fn test_reject_non_numeric_amount() {
        let mut raw = request_json();
        raw["paymentRequirements"]["maxAmountRequired"] = json!("ten");
        let raw: x402_types::proto::VerifyRequest = serde_json::from_value(raw).unwrap();
        assert!(VerifyRequest::from_proto(raw).is_err());
    }
}
