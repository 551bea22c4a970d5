//! Traits implemented by payment scheme facilitators.
//!
//! A scheme (such as `exact` on EVM chains) knows how to verify and settle one
//! kind of payment. Schemes are constructed per request from a chain-scoped
//! provider through an [`X402SchemeFacilitatorBuilder`], which lets the caller
//! choose which chain the scheme runs against.

use crate::proto;
use crate::proto::PaymentVerificationError;

/// Verification and settlement for one payment scheme on one chain.
#[async_trait::async_trait]
pub trait X402SchemeFacilitator: Send + Sync {
    /// Checks that the request has this scheme's shape without touching the chain.
    ///
    /// Callers run this before any side effect, such as bridging funds.
    fn validate(&self, request: &proto::VerifyRequest) -> Result<(), PaymentVerificationError>;

    async fn verify(
        &self,
        request: &proto::VerifyRequest,
    ) -> Result<proto::VerifyResponse, X402SchemeFacilitatorError>;

    async fn settle(
        &self,
        request: &proto::SettleRequest,
    ) -> Result<proto::SettleResponse, X402SchemeFacilitatorError>;
}

/// Builds a scheme facilitator bound to a chain provider `P`.
pub trait X402SchemeFacilitatorBuilder<P> {
    fn build(
        &self,
        provider: P,
        config: Option<serde_json::Value>,
    ) -> Result<Box<dyn X402SchemeFacilitator>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Identifies a scheme by protocol version, chain namespace and name.
pub trait X402SchemeId {
    fn x402_version(&self) -> u8;
    fn namespace(&self) -> &str;
    fn scheme(&self) -> &str;

    fn id(&self) -> String {
        format!(
            "v{}-{}-{}",
            self.x402_version(),
            self.namespace(),
            self.scheme()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum X402SchemeFacilitatorError {
    #[error(transparent)]
    PaymentVerification(#[from] PaymentVerificationError),
    #[error("Onchain error: {0}")]
    OnchainFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Exact;

    impl X402SchemeId for Exact {
        fn x402_version(&self) -> u8 {
            1
        }
        fn namespace(&self) -> &str {
            "eip155"
        }
        fn scheme(&self) -> &str {
            "exact"
        }
    }

    #[test]
    fn test_scheme_id() {
        assert_eq!(Exact.id(), "v1-eip155-exact");
    }

    #[test]
    fn test_error_display() {
        let err: X402SchemeFacilitatorError = PaymentVerificationError::Expired.into();
        assert_eq!(err.to_string(), "Payment authorization expired");
        let err = X402SchemeFacilitatorError::OnchainFailure("Transaction 0x1 reverted".into());
        assert_eq!(err.to_string(), "Onchain error: Transaction 0x1 reverted");
    }
}
