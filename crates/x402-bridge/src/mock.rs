use alloy_primitives::B256;
use std::time::Duration;
use tracing::instrument;

use crate::{Bridge, BridgeError, BridgeReceipt, BridgeRequest};

/// Default time a mock transfer takes.
pub const DEFAULT_BRIDGE_DELAY: Duration = Duration::from_millis(2000);

/// A bridge that waits a fixed delay and reports success with a random transaction hash.
///
/// No funds move. Only a request whose source and destination coincide is refused.
#[derive(Debug, Clone)]
pub struct MockBridge {
    delay: Duration,
}

impl MockBridge {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for MockBridge {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGE_DELAY)
    }
}

#[async_trait::async_trait]
impl Bridge for MockBridge {
    #[instrument(skip_all, fields(from = %request.from, to = %request.to, asset = %request.asset, amount = %request.amount))]
    async fn bridge(&self, request: &BridgeRequest) -> Result<BridgeReceipt, BridgeError> {
        if request.from == request.to {
            return Err(BridgeError::SameNetwork(request.from));
        }
        tracing::info!(
            recipient = %request.recipient,
            delay_ms = self.delay.as_millis() as u64,
            "Bridging {} of {} from {} to {}",
            request.amount,
            request.asset,
            request.from,
            request.to
        );
        tokio::time::sleep(self.delay).await;
        let tx_hash = B256::from(rand::random::<[u8; 32]>()).to_string();
        tracing::info!(tx = %tx_hash, "Bridge transfer completed");
        Ok(BridgeReceipt { tx_hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x402_types::networks::Network;

    fn request(from: Network, to: Network) -> BridgeRequest {
        BridgeRequest {
            from,
            to,
            asset: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".into(),
            amount: "10".into(),
            recipient: "0xAbC0000000000000000000000000000000000001".into(),
        }
    }

    #[tokio::test]
    async fn test_mock_bridge_returns_tx_hash() {
        let bridge = MockBridge::new(Duration::ZERO);
        let receipt = bridge
            .bridge(&request(Network::Base, Network::Arbitrum))
            .await
            .unwrap();
        assert!(receipt.tx_hash.starts_with("0x"));
        assert_eq!(receipt.tx_hash.len(), 66);

        let other = bridge
            .bridge(&request(Network::Base, Network::Arbitrum))
            .await
            .unwrap();
        assert_ne!(receipt, other);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_bridge_waits_for_delay() {
        let bridge = MockBridge::default();
        assert_eq!(bridge.delay(), Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        bridge
            .bridge(&request(Network::Optimism, Network::Arbitrum))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_mock_bridge_refuses_same_network() {
        let bridge = MockBridge::new(Duration::ZERO);
        let err = bridge
            .bridge(&request(Network::Arbitrum, Network::Arbitrum))
            .await
            .unwrap_err();
        assert_eq!(err, BridgeError::SameNetwork(Network::Arbitrum));
    }
}
