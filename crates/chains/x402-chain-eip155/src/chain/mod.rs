//! EVM chain access for x402 payments via EIP-155.
//!
//! # Key Types
//!
//! - [`Eip155ChainReference`] - a numeric chain id for EVM networks (e.g. `42161` for Arbitrum One)
//! - [`Eip155ChainProvider`] - a signing, RPC-connected handle scoped to one network
//! - [`Eip155RpcConfig`] - RPC endpoints per network, with public defaults and env overrides
//! - [`Eip155SignerProvider`] - produces and caches [`Eip155ChainProvider`]s from one private key

pub mod config;
pub mod provider;
pub mod signer;

pub use config::*;
pub use provider::*;
pub use signer::*;

use std::fmt;
use x402_types::chain::ChainId;
use x402_types::networks::Network;

/// The numeric reference part of an `eip155:<n>` chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Eip155ChainReference(u64);

impl Eip155ChainReference {
    pub fn new(chain_id: u64) -> Self {
        Self(chain_id)
    }

    pub fn inner(&self) -> u64 {
        self.0
    }

    pub fn as_chain_id(&self) -> ChainId {
        ChainId::new("eip155", self.0.to_string())
    }
}

impl fmt::Display for Eip155ChainReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Network> for Eip155ChainReference {
    fn from(network: Network) -> Self {
        Eip155ChainReference(network.eip155_chain_id())
    }
}

impl From<&Eip155ChainReference> for ChainId {
    fn from(value: &Eip155ChainReference) -> Self {
        value.as_chain_id()
    }
}

impl From<Eip155ChainReference> for ChainId {
    fn from(value: Eip155ChainReference) -> Self {
        value.as_chain_id()
    }
}
