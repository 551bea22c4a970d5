//! Well-known networks accepted by the facilitator.
//!
//! x402 v1 messages name networks with short strings such as `"base"` or
//! `"arbitrum-sepolia"`. [`Network`] is the validated form of those strings:
//! anything outside this list is rejected when a request is parsed instead of
//! being passed along unchecked.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

use crate::chain::ChainId;

/// A known EVM network, identified on the wire by its x402 v1 name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Network {
    /// Base mainnet (eip155:8453)
    Base,
    /// Base Sepolia testnet (eip155:84532)
    BaseSepolia,
    /// Arbitrum One (eip155:42161)
    Arbitrum,
    /// Arbitrum Sepolia testnet (eip155:421614)
    ArbitrumSepolia,
    /// Ethereum mainnet (eip155:1)
    Ethereum,
    /// Ethereum Sepolia testnet (eip155:11155111)
    Sepolia,
    /// OP Mainnet (eip155:10)
    Optimism,
    /// OP Sepolia testnet (eip155:11155420)
    OptimismSepolia,
    /// Polygon PoS (eip155:137)
    Polygon,
    /// Polygon Amoy testnet (eip155:80002)
    PolygonAmoy,
    /// Avalanche C-Chain (eip155:43114)
    Avalanche,
    /// Avalanche Fuji testnet (eip155:43113)
    AvalancheFuji,
}

impl Network {
    /// All known networks, in declaration order.
    pub fn variants() -> &'static [Network] {
        &[
            Network::Base,
            Network::BaseSepolia,
            Network::Arbitrum,
            Network::ArbitrumSepolia,
            Network::Ethereum,
            Network::Sepolia,
            Network::Optimism,
            Network::OptimismSepolia,
            Network::Polygon,
            Network::PolygonAmoy,
            Network::Avalanche,
            Network::AvalancheFuji,
        ]
    }

    /// The x402 v1 wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Base => "base",
            Network::BaseSepolia => "base-sepolia",
            Network::Arbitrum => "arbitrum",
            Network::ArbitrumSepolia => "arbitrum-sepolia",
            Network::Ethereum => "ethereum",
            Network::Sepolia => "sepolia",
            Network::Optimism => "optimism",
            Network::OptimismSepolia => "optimism-sepolia",
            Network::Polygon => "polygon",
            Network::PolygonAmoy => "polygon-amoy",
            Network::Avalanche => "avalanche",
            Network::AvalancheFuji => "avalanche-fuji",
        }
    }

    /// Numeric EIP-155 chain id.
    pub fn eip155_chain_id(&self) -> u64 {
        match self {
            Network::Base => 8453,
            Network::BaseSepolia => 84532,
            Network::Arbitrum => 42161,
            Network::ArbitrumSepolia => 421614,
            Network::Ethereum => 1,
            Network::Sepolia => 11155111,
            Network::Optimism => 10,
            Network::OptimismSepolia => 11155420,
            Network::Polygon => 137,
            Network::PolygonAmoy => 80002,
            Network::Avalanche => 43114,
            Network::AvalancheFuji => 43113,
        }
    }

    /// CAIP-2 chain id, e.g. `eip155:8453` for Base.
    pub fn chain_id(&self) -> ChainId {
        ChainId::new("eip155", self.eip155_chain_id().to_string())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for a network name outside [`Network::variants`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported network: {0}")]
pub struct UnknownNetworkError(pub String);

impl FromStr for Network {
    type Err = UnknownNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::variants()
            .iter()
            .copied()
            .find(|network| network.as_str() == s)
            .ok_or_else(|| UnknownNetworkError(s.to_string()))
    }
}

impl Serialize for Network {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Network::from_str(&s).map_err(de::Error::custom)
    }
}
