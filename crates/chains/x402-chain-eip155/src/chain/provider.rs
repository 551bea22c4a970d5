use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use std::fmt;
use url::Url;
use x402_types::chain::{ChainId, ChainProviderOps};
use x402_types::networks::Network;

use crate::chain::Eip155ChainReference;

/// A wallet-backed RPC connection to one EVM network.
///
/// Transactions sent through [`Eip155ChainProvider::inner`] are signed by the
/// facilitator key and get nonce, gas and chain id filled in automatically.
#[derive(Clone)]
pub struct Eip155ChainProvider {
    chain: Eip155ChainReference,
    network: Network,
    signer_address: Address,
    inner: DynProvider,
}

impl Eip155ChainProvider {
    /// Builds a provider for `network` that talks to `rpc_url`.
    ///
    /// No request is made until the provider is used.
    pub fn connect(network: Network, signer: PrivateKeySigner, rpc_url: Url) -> Self {
        let signer_address = signer.address();
        let inner = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(rpc_url)
            .erased();
        Self {
            chain: network.into(),
            network,
            signer_address,
            inner,
        }
    }

    pub fn inner(&self) -> &DynProvider {
        &self.inner
    }

    pub fn chain(&self) -> &Eip155ChainReference {
        &self.chain
    }

    pub fn signer_address(&self) -> Address {
        self.signer_address
    }
}

impl fmt::Debug for Eip155ChainProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eip155ChainProvider")
            .field("chain", &self.chain)
            .field("network", &self.network)
            .field("signer_address", &self.signer_address)
            .finish_non_exhaustive()
    }
}

impl ChainProviderOps for Eip155ChainProvider {
    fn signer_addresses(&self) -> Vec<String> {
        vec![self.signer_address.to_string()]
    }

    fn chain_id(&self) -> ChainId {
        self.chain.as_chain_id()
    }
}

