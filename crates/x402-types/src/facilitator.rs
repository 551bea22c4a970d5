//! The facilitator contract served over HTTP.

use crate::proto;

/// A service that verifies x402 payments and settles them, bridging first when needed.
#[async_trait::async_trait]
pub trait Facilitator {
    type Error: std::fmt::Debug + std::fmt::Display;

    /// Checks a payment without submitting anything on-chain.
    async fn verify(
        &self,
        request: &proto::VerifyRequest,
    ) -> Result<proto::VerifyResponse, Self::Error>;

    /// Settles a payment and reports whether funds were bridged first.
    async fn settle(
        &self,
        request: &proto::SettleRequest,
    ) -> Result<proto::BridgedSettleResponse, Self::Error>;

    /// Payment kinds this facilitator accepts.
    async fn supported(&self) -> Result<proto::SupportedResponse, Self::Error>;
}
