//! RPC endpoint configuration for EVM networks.
//!
//! Every known network has a public endpoint built in. Operators override
//! one with `RPC_URL_<NETWORK>`, where `<NETWORK>` is the network name in upper
//! case with dashes turned into underscores (`RPC_URL_BASE_SEPOLIA`).

use std::collections::HashMap;
use url::Url;
use x402_types::networks::Network;

/// Public endpoints used when nothing else is configured.
fn public_endpoint(network: Network) -> &'static str {
    match network {
        Network::Base => "https://mainnet.base.org",
        Network::BaseSepolia => "https://sepolia.base.org",
        Network::Arbitrum => "https://arb1.arbitrum.io/rpc",
        Network::ArbitrumSepolia => "https://sepolia-rollup.arbitrum.io/rpc",
        Network::Ethereum => "https://ethereum-rpc.publicnode.com",
        Network::Sepolia => "https://ethereum-sepolia-rpc.publicnode.com",
        Network::Optimism => "https://mainnet.optimism.io",
        Network::OptimismSepolia => "https://sepolia.optimism.io",
        Network::Polygon => "https://polygon-rpc.com",
        Network::PolygonAmoy => "https://rpc-amoy.polygon.technology",
        Network::Avalanche => "https://api.avax.network/ext/bc/C/rpc",
        Network::AvalancheFuji => "https://api.avax-test.network/ext/bc/C/rpc",
    }
}

/// Name of the environment variable overriding the RPC endpoint of `network`.
pub fn rpc_env_var(network: Network) -> String {
    format!(
        "RPC_URL_{}",
        network.as_str().to_ascii_uppercase().replace('-', "_")
    )
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid RPC URL for {network}: {source}")]
pub struct RpcConfigError {
    pub network: Network,
    #[source]
    pub source: url::ParseError,
}

/// RPC endpoints keyed by network.
#[derive(Debug, Clone, Default)]
pub struct Eip155RpcConfig {
    endpoints: HashMap<Network, Url>,
}

impl Eip155RpcConfig {
    /// No endpoints at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in public endpoint for every known network.
    pub fn public_defaults() -> Self {
        let endpoints = Network::variants()
            .iter()
            .filter_map(|network| {
                Url::parse(public_endpoint(*network))
                    .ok()
                    .map(|url| (*network, url))
            })
            .collect();
        Self { endpoints }
    }

    pub fn with_endpoint(mut self, network: Network, url: Url) -> Self {
        self.endpoints.insert(network, url);
        self
    }

    /// Applies `RPC_URL_<NETWORK>` overrides found in the process environment.
    pub fn with_env_overrides(self) -> Result<Self, RpcConfigError> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides from any lookup keyed by [`rpc_env_var`] names.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, RpcConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for network in Network::variants() {
            let Some(raw) = lookup(&rpc_env_var(*network)) else {
                continue;
            };
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let url = Url::parse(raw).map_err(|source| RpcConfigError {
                network: *network,
                source,
            })?;
            self.endpoints.insert(*network, url);
        }
        Ok(self)
    }

    pub fn endpoint(&self, network: Network) -> Option<&Url> {
        self.endpoints.get(&network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_names() {
        assert_eq!(rpc_env_var(Network::Base), "RPC_URL_BASE");
        assert_eq!(
            rpc_env_var(Network::ArbitrumSepolia),
            "RPC_URL_ARBITRUM_SEPOLIA"
        );
    }

    #[test]
    fn test_public_defaults_cover_every_network() {
        let config = Eip155RpcConfig::public_defaults();
        for network in Network::variants() {
            assert!(config.endpoint(*network).is_some(), "{network}");
        }
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let config = Eip155RpcConfig::public_defaults()
            .with_overrides_from(|name| {
                (name == "RPC_URL_ARBITRUM").then(|| "http://localhost:8545".to_string())
            })
            .unwrap();
        assert_eq!(
            config.endpoint(Network::Arbitrum).unwrap().as_str(),
            "http://localhost:8545/"
        );
        assert_eq!(
            config.endpoint(Network::Base).unwrap().as_str(),
            "https://mainnet.base.org/"
        );
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let err = Eip155RpcConfig::empty()
            .with_overrides_from(|name| (name == "RPC_URL_BASE").then(|| "not a url".to_string()))
            .unwrap_err();
        assert_eq!(err.network, Network::Base);
    }
}
