//! Chain identifiers and the chain-provider seam.
//!
//! - [`ChainId`] - a CAIP-2 chain identifier
//! - [`ChainProviderOps`] - what every chain-scoped signing handle can report about itself
//! - [`SignerProvider`] - produces a chain-scoped signing handle for a [`Network`]

mod chain_id;

pub use chain_id::*;

use crate::networks::Network;

/// Common operations available on a chain-scoped provider.
pub trait ChainProviderOps {
    /// Addresses this provider signs and submits transactions with.
    fn signer_addresses(&self) -> Vec<String>;

    /// The chain this provider is bound to.
    fn chain_id(&self) -> ChainId;
}

impl<T: ChainProviderOps> ChainProviderOps for std::sync::Arc<T> {
    fn signer_addresses(&self) -> Vec<String> {
        (**self).signer_addresses()
    }

    fn chain_id(&self) -> ChainId {
        (**self).chain_id()
    }
}

/// Error produced when a signing handle cannot be created for a network.
#[derive(Debug, thiserror::Error)]
pub enum SignerProviderError {
    /// No RPC endpoint is known for the requested network.
    #[error("No RPC endpoint configured for network {0}")]
    NoRpcEndpoint(Network),
    /// The signing key or RPC endpoint is unusable.
    #[error("Invalid signer configuration: {0}")]
    InvalidConfiguration(String),
}

/// Produces chain-scoped signing handles from a single signing key.
///
/// The settlement orchestrator asks for a handle scoped to the network it is
/// about to settle on; implementations may cache handles per network.
#[async_trait::async_trait]
pub trait SignerProvider: Send + Sync {
    /// Chain-scoped provider handed to payment schemes.
    type Provider: ChainProviderOps + Send + Sync + 'static;

    /// Returns a signing handle bound to `network`.
    async fn signer_for(&self, network: Network) -> Result<Self::Provider, SignerProviderError>;

    /// Addresses of the configured signing key(s).
    fn signer_addresses(&self) -> Vec<String>;
}
