use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use dashmap::DashMap;
use std::str::FromStr;
use std::sync::Arc;
use x402_types::chain::{SignerProvider, SignerProviderError};
use x402_types::networks::Network;

use crate::chain::{Eip155ChainProvider, Eip155RpcConfig};

/// Hands out per-network [`Eip155ChainProvider`]s that all sign with one key.
///
/// Providers are created on first use and cached, so concurrent requests for
/// the same network share one connection.
pub struct Eip155SignerProvider {
    signer: PrivateKeySigner,
    rpc: Eip155RpcConfig,
    cache: DashMap<Network, Arc<Eip155ChainProvider>>,
}

impl Eip155SignerProvider {
    pub fn new(signer: PrivateKeySigner, rpc: Eip155RpcConfig) -> Self {
        Self {
            signer,
            rpc,
            cache: DashMap::new(),
        }
    }

    /// Parses a hex private key, with or without `0x`.
    pub fn from_private_key(
        private_key: &str,
        rpc: Eip155RpcConfig,
    ) -> Result<Self, SignerProviderError> {
        let signer = PrivateKeySigner::from_str(private_key.trim()).map_err(|e| {
            SignerProviderError::InvalidConfiguration(format!("invalid EVM private key: {e}"))
        })?;
        Ok(Self::new(signer, rpc))
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

#[async_trait::async_trait]
impl SignerProvider for Eip155SignerProvider {
    type Provider = Arc<Eip155ChainProvider>;

    async fn signer_for(&self, network: Network) -> Result<Self::Provider, SignerProviderError> {
        if let Some(provider) = self.cache.get(&network) {
            return Ok(provider.value().clone());
        }
        let rpc_url = self
            .rpc
            .endpoint(network)
            .cloned()
            .ok_or(SignerProviderError::NoRpcEndpoint(network))?;
        #[cfg(feature = "telemetry")]
        tracing::debug!(%network, rpc = %rpc_url, "Connecting EVM provider");
        let provider = Arc::new(Eip155ChainProvider::connect(
            network,
            self.signer.clone(),
            rpc_url,
        ));
        let provider = self.cache.entry(network).or_insert(provider);
        Ok(provider.value().clone())
    }

    fn signer_addresses(&self) -> Vec<String> {
        vec![self.address().to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;
    use x402_types::chain::ChainProviderOps;

    // Anvil's first development key.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn local_rpc() -> Eip155RpcConfig {
        Eip155RpcConfig::empty()
            .with_endpoint(Network::Arbitrum, Url::parse("http://127.0.0.1:8545").unwrap())
            .with_endpoint(Network::Base, Url::parse("http://127.0.0.1:8546").unwrap())
    }

    #[test]
    fn test_private_key_parsing() {
        let provider = Eip155SignerProvider::from_private_key(DEV_KEY, local_rpc()).unwrap();
        assert_eq!(provider.signer_addresses(), vec![DEV_ADDRESS.to_string()]);

        let without_prefix = DEV_KEY.trim_start_matches("0x");
        assert!(Eip155SignerProvider::from_private_key(without_prefix, local_rpc()).is_ok());

        let err = Eip155SignerProvider::from_private_key("0x1234", local_rpc())
            .err()
            .unwrap();
        assert!(matches!(err, SignerProviderError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_signer_for_is_chain_scoped_and_cached() {
        let provider = Eip155SignerProvider::from_private_key(DEV_KEY, local_rpc()).unwrap();

        let arbitrum = provider.signer_for(Network::Arbitrum).await.unwrap();
        assert_eq!(arbitrum.chain_id().to_string(), "eip155:42161");
        assert_eq!(arbitrum.chain().inner(), 42161);
        assert_eq!(arbitrum.signer_address(), provider.address());

        let again = provider.signer_for(Network::Arbitrum).await.unwrap();
        assert!(Arc::ptr_eq(&arbitrum, &again));

        let base = provider.signer_for(Network::Base).await.unwrap();
        assert_eq!(base.chain_id().to_string(), "eip155:8453");
    }

    #[tokio::test]
    async fn test_signer_for_without_endpoint() {
        let provider = Eip155SignerProvider::from_private_key(DEV_KEY, local_rpc()).unwrap();
        let err = provider.signer_for(Network::Polygon).await.unwrap_err();
        assert!(matches!(err, SignerProviderError::NoRpcEndpoint(Network::Polygon)));
    }
}
