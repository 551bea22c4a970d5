//! x402 protocol version 1 messages.
//!
//! The v1 format keeps every field flat and names networks with short strings
//! (`"base"`, `"arbitrum"`). All message types are generic over their
//! scheme-specific parts so that a scheme crate can re-parse a raw request into
//! strongly typed amounts and addresses with [`VerifyRequest::from_proto`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::Value;

use crate::proto::PaymentVerificationError;

/// The literal protocol version `1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct X402Version1;

impl X402Version1 {
    pub const VALUE: u8 = 1;
}

impl From<X402Version1> for u8 {
    fn from(_: X402Version1) -> Self {
        X402Version1::VALUE
    }
}

impl Serialize for X402Version1 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for X402Version1 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = u8::deserialize(deserializer)?;
        if version == Self::VALUE {
            Ok(X402Version1)
        } else {
            Err(de::Error::custom(format!(
                "unsupported x402Version {version}, expected 1"
            )))
        }
    }
}

/// What a resource server demands for a payment.
///
/// `maxAmountRequired` is also accepted as `recipientAmount`, and `payTo` as
/// `recipient`, which is how some clients spell them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements<
    TScheme = String,
    TAmount = String,
    TAddress = String,
    TExtra = Value,
> {
    pub scheme: TScheme,
    pub network: String,
    #[serde(alias = "recipientAmount")]
    pub max_amount_required: TAmount,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(alias = "recipient")]
    pub pay_to: TAddress,
    #[serde(default)]
    pub max_timeout_seconds: u64,
    pub asset: TAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<TExtra>,
}

/// A client's signed intent to pay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload<TScheme = String, TPayload = Value> {
    pub x402_version: X402Version1,
    pub scheme: TScheme,
    pub network: String,
    pub payload: TPayload,
}

/// Body of `POST /verify` and `POST /settle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest<TPayload = PaymentPayload, TRequirements = PaymentRequirements> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x402_version: Option<X402Version1>,
    pub payment_payload: TPayload,
    pub payment_requirements: TRequirements,
}

/// Settle requests carry the same body as verify requests.
pub type SettleRequest<TPayload = PaymentPayload, TRequirements = PaymentRequirements> =
    VerifyRequest<TPayload, TRequirements>;

impl<TPayload, TRequirements> VerifyRequest<TPayload, TRequirements>
where
    TPayload: DeserializeOwned,
    TRequirements: DeserializeOwned,
{
    /// Re-parses a raw request into scheme-specific types.
    ///
    /// Fails with [`PaymentVerificationError::InvalidFormat`] when the raw
    /// payload or requirements do not fit the scheme's shape.
    pub fn from_proto(request: VerifyRequest) -> Result<Self, PaymentVerificationError> {
        let value = serde_json::to_value(request)
            .map_err(|e| PaymentVerificationError::InvalidFormat(e.to_string()))?;
        serde_json::from_value(value)
            .map_err(|e| PaymentVerificationError::InvalidFormat(e.to_string()))
    }
}

/// Outcome of a verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "VerifyResponseWire", try_from = "VerifyResponseWire")]
pub enum VerifyResponse {
    Valid { payer: String },
    Invalid { reason: String, payer: Option<String> },
}

impl VerifyResponse {
    pub fn valid(payer: impl Into<String>) -> Self {
        VerifyResponse::Valid {
            payer: payer.into(),
        }
    }

    pub fn invalid(payer: Option<String>, reason: impl Into<String>) -> Self {
        VerifyResponse::Invalid {
            reason: reason.into(),
            payer,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResponse::Valid { .. })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponseWire {
    is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invalid_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
}

impl From<VerifyResponse> for VerifyResponseWire {
    fn from(value: VerifyResponse) -> Self {
        match value {
            VerifyResponse::Valid { payer } => VerifyResponseWire {
                is_valid: true,
                invalid_reason: None,
                payer: Some(payer),
            },
            VerifyResponse::Invalid { reason, payer } => VerifyResponseWire {
                is_valid: false,
                invalid_reason: Some(reason),
                payer,
            },
        }
    }
}

impl TryFrom<VerifyResponseWire> for VerifyResponse {
    type Error = String;

    fn try_from(wire: VerifyResponseWire) -> Result<Self, Self::Error> {
        if wire.is_valid {
            let payer = wire
                .payer
                .ok_or_else(|| "valid verify response without payer".to_string())?;
            Ok(VerifyResponse::Valid { payer })
        } else {
            Ok(VerifyResponse::Invalid {
                reason: wire.invalid_reason.unwrap_or_default(),
                payer: wire.payer,
            })
        }
    }
}

/// Outcome of a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SettleResponseWire", try_from = "SettleResponseWire")]
pub enum SettleResponse {
    Success {
        payer: String,
        transaction: String,
        network: String,
    },
    Error {
        reason: String,
        payer: Option<String>,
        network: String,
    },
}

impl SettleResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, SettleResponse::Success { .. })
    }

    pub fn network(&self) -> &str {
        match self {
            SettleResponse::Success { network, .. } => network,
            SettleResponse::Error { network, .. } => network,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleResponseWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
    #[serde(default)]
    transaction: String,
    network: String,
}

impl From<SettleResponse> for SettleResponseWire {
    fn from(value: SettleResponse) -> Self {
        match value {
            SettleResponse::Success {
                payer,
                transaction,
                network,
            } => SettleResponseWire {
                success: true,
                error_reason: None,
                payer: Some(payer),
                transaction,
                network,
            },
            SettleResponse::Error {
                reason,
                payer,
                network,
            } => SettleResponseWire {
                success: false,
                error_reason: Some(reason),
                payer,
                transaction: String::new(),
                network,
            },
        }
    }
}

impl TryFrom<SettleResponseWire> for SettleResponse {
    type Error = String;

    fn try_from(wire: SettleResponseWire) -> Result<Self, String> {
        if wire.success {
            let payer = wire
                .payer
                .ok_or_else(|| "successful settle response without payer".to_string())?;
            Ok(SettleResponse::Success {
                payer,
                transaction: wire.transaction,
                network: wire.network,
            })
        } else {
            Ok(SettleResponse::Error {
                reason: wire.error_reason.unwrap_or_default(),
                payer: wire.payer,
                network: wire.network,
            })
        }
    }
}
