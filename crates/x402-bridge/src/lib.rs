#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Cross-chain bridging for the x402 bridging facilitator.
//!
//! The settlement orchestrator only depends on the [`Bridge`] trait: it asks a
//! bridge to move `amount` of `asset` from one network to another for a
//! recipient and gets back a transaction reference or a [`BridgeError`].
//! [`MockBridge`] is the shipped implementation; a real bridge plugs in by
//! implementing the same trait.

mod mock;

pub use mock::*;

use std::sync::Arc;
use x402_types::networks::Network;

/// A request to move funds between networks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    /// Network the funds start on.
    pub from: Network,
    /// Network the funds must arrive on.
    pub to: Network,
    /// Token address on the source network.
    pub asset: String,
    /// Amount in the token's smallest unit, as a decimal string.
    pub amount: String,
    /// Address credited on the destination network.
    pub recipient: String,
}

/// Proof that a bridge transfer was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeReceipt {
    pub tx_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The bridge refused the transfer and reported why.
    #[error("{0}")]
    Rejected(String),
    /// Source and destination are the same network.
    #[error("Nothing to bridge: source and destination are both {0}")]
    SameNetwork(Network),
}

/// Moves token value from one network to another.
#[async_trait::async_trait]
pub trait Bridge: Send + Sync {
    async fn bridge(&self, request: &BridgeRequest) -> Result<BridgeReceipt, BridgeError>;
}

#[async_trait::async_trait]
impl<B: Bridge + ?Sized> Bridge for Arc<B> {
    async fn bridge(&self, request: &BridgeRequest) -> Result<BridgeReceipt, BridgeError> {
        self.as_ref().bridge(request).await
    }
}
