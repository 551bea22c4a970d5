//! Server configuration.
//!
//! Values come from, in order of precedence: command-line flags, environment
//! variables (a `.env` file is loaded first), the optional JSON file named by
//! `--config` / `CONFIG`, and built-in defaults.
//!
//! ```json
//! {
//!   "originNetwork": "arbitrum",
//!   "originAsset": "0xaf88d065e77c8cC2239327C5EDb3A432268e5831",
//!   "supportedNetworks": ["base", "arbitrum", "optimism"],
//!   "bridgeDelayMs": 2000,
//!   "rpc": { "base": "https://mainnet.base.org" }
//! }
//! ```

use clap::Parser;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use x402_bridge::DEFAULT_BRIDGE_DELAY;
use x402_chain_eip155::Eip155RpcConfig;
use x402_chain_eip155::chain::RpcConfigError;
use x402_facilitator_local::SettlementConfig;
use x402_types::networks::{Network, UnknownNetworkError};

/// Native USDC on Arbitrum One.
pub const DEFAULT_ORIGIN_ASSET: &str = "0xaf88d065e77c8cC2239327C5EDb3A432268e5831";
pub const DEFAULT_ORIGIN_NETWORK: Network = Network::Arbitrum;
pub const DEFAULT_SUPPORTED_NETWORKS: [Network; 3] =
    [Network::Base, Network::Arbitrum, Network::Optimism];
pub const DEFAULT_PORT: u16 = 3000;

/// x402 facilitator that settles every payment on one origin network,
/// bridging funds there first when needed.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Hex private key used to sign settlement transactions on every network.
    #[arg(long, value_name = "KEY", env = "EVM_PRIVATE_KEY", hide_env_values = true)]
    pub evm_private_key: Option<String>,
    /// Address to bind the HTTP server to.
    #[arg(long, value_name = "ADDR", env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,
    #[arg(long, value_name = "PORT", env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Optional JSON configuration file.
    #[arg(long, value_name = "FILE", env = "CONFIG")]
    pub config: Option<PathBuf>,
    /// Network every payment is finally settled on [default: arbitrum].
    #[arg(long, value_name = "NETWORK", env = "ORIGIN_NETWORK", value_parser = parse_network)]
    pub origin_network: Option<Network>,
    /// Token address advertised by `/supported` [default: Arbitrum USDC].
    #[arg(long, value_name = "ADDRESS", env = "ORIGIN_ASSET")]
    pub origin_asset: Option<String>,
    /// Comma-separated networks advertised by `/supported` [default: base,arbitrum,optimism].
    #[arg(
        long,
        value_name = "NETWORKS",
        env = "SUPPORTED_NETWORKS",
        value_delimiter = ',',
        value_parser = parse_network
    )]
    pub supported_networks: Option<Vec<Network>>,
    /// Simulated bridge latency in milliseconds [default: 2000].
    #[arg(long, value_name = "MILLIS", env = "BRIDGE_DELAY_MS")]
    pub bridge_delay_ms: Option<u64>,
}

fn parse_network(s: &str) -> Result<Network, UnknownNetworkError> {
    s.trim().parse()
}

/// Contents of the optional JSON configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub origin_network: Option<Network>,
    pub origin_asset: Option<String>,
    pub supported_networks: Option<Vec<Network>>,
    pub bridge_delay_ms: Option<u64>,
    #[serde(default)]
    pub rpc: HashMap<Network, Url>,
}

impl FileConfig {
    pub fn read(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::ParseFile {
            path: path.clone(),
            source,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("EVM_PRIVATE_KEY is not set")]
    MissingPrivateKey,
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Rpc(#[from] RpcConfigError),
    #[error("At least one supported network is required")]
    NoSupportedNetworks,
}

/// Fully resolved server configuration.
pub struct Config {
    host: IpAddr,
    port: u16,
    private_key: String,
    settlement: SettlementConfig,
    bridge_delay: Duration,
    rpc: Eip155RpcConfig,
}

impl Config {
    /// Parses flags and environment, then merges the config file if one is named.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = Cli::parse();
        let file = match &cli.config {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        let rpc = rpc_config(&file).with_env_overrides()?;
        Self::resolve(cli, file, rpc)
    }

    fn resolve(cli: Cli, file: FileConfig, rpc: Eip155RpcConfig) -> Result<Self, ConfigError> {
        let private_key = cli
            .evm_private_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingPrivateKey)?;
        let supported_networks = cli
            .supported_networks
            .or(file.supported_networks)
            .unwrap_or_else(|| DEFAULT_SUPPORTED_NETWORKS.to_vec());
        if supported_networks.is_empty() {
            return Err(ConfigError::NoSupportedNetworks);
        }
        let settlement = SettlementConfig {
            origin_network: cli
                .origin_network
                .or(file.origin_network)
                .unwrap_or(DEFAULT_ORIGIN_NETWORK),
            origin_asset: cli
                .origin_asset
                .or(file.origin_asset)
                .unwrap_or_else(|| DEFAULT_ORIGIN_ASSET.to_string()),
            supported_networks,
        };
        let bridge_delay = cli
            .bridge_delay_ms
            .or(file.bridge_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BRIDGE_DELAY);

        Ok(Self {
            host: cli.host,
            port: cli.port,
            private_key,
            settlement,
            bridge_delay,
            rpc,
        })
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn settlement(&self) -> &SettlementConfig {
        &self.settlement
    }

    pub fn bridge_delay(&self) -> Duration {
        self.bridge_delay
    }

    pub fn rpc(&self) -> &Eip155RpcConfig {
        &self.rpc
    }
}

/// Public endpoints, overridden by the file's `rpc` map.
fn rpc_config(file: &FileConfig) -> Eip155RpcConfig {
    file.rpc
        .iter()
        .fold(Eip155RpcConfig::public_defaults(), |rpc, (network, url)| {
            rpc.with_endpoint(*network, url.clone())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("x402-bridge-facilitator").chain(args.iter().copied()))
            .unwrap()
    }

    fn resolve(cli: Cli, file: FileConfig) -> Result<Config, ConfigError> {
        Config::resolve(cli, file, Eip155RpcConfig::public_defaults())
    }

    #[test]
    fn test_missing_private_key_is_an_error() {
        let mut cli = cli(&[]);
        cli.evm_private_key = None;
        assert!(matches!(
            resolve(cli, FileConfig::default()),
            Err(ConfigError::MissingPrivateKey)
        ));

        let blank = self::cli(&["--evm-private-key", "  "]);
        assert!(matches!(
            resolve(blank, FileConfig::default()),
            Err(ConfigError::MissingPrivateKey)
        ));
    }

    #[test]
    fn test_defaults() {
        let mut cli = cli(&["--evm-private-key", KEY]);
        cli.origin_network = None;
        cli.origin_asset = None;
        cli.supported_networks = None;
        cli.bridge_delay_ms = None;
        let config = resolve(cli, FileConfig::default()).unwrap();

        assert_eq!(config.private_key(), KEY);
        assert_eq!(config.settlement().origin_network, Network::Arbitrum);
        assert_eq!(config.settlement().origin_asset, DEFAULT_ORIGIN_ASSET);
        assert_eq!(
            config.settlement().supported_networks,
            vec![Network::Base, Network::Arbitrum, Network::Optimism]
        );
        assert_eq!(config.bridge_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn test_flags_parse_networks() {
        let cli = cli(&[
            "--evm-private-key",
            KEY,
            "--origin-network",
            "base",
            "--supported-networks",
            "base, polygon",
            "--bridge-delay-ms",
            "0",
            "--port",
            "8080",
        ]);
        let config = resolve(cli, FileConfig::default()).unwrap();
        assert_eq!(config.port(), 8080);
        assert_eq!(config.settlement().origin_network, Network::Base);
        assert_eq!(
            config.settlement().supported_networks,
            vec![Network::Base, Network::Polygon]
        );
        assert_eq!(config.bridge_delay(), Duration::ZERO);
    }

    #[test]
    fn test_unknown_network_flag_is_rejected() {
        let parsed = Cli::try_parse_from([
            "x402-bridge-facilitator",
            "--origin-network",
            "etherlink",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_file_values_apply_below_flags() {
        let file: FileConfig = serde_json::from_value(json!({
            "originNetwork": "optimism",
            "originAsset": "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85",
            "supportedNetworks": ["optimism"],
            "bridgeDelayMs": 50,
            "rpc": { "optimism": "http://localhost:8545" }
        }))
        .unwrap();
        let rpc = rpc_config(&file);
        assert_eq!(
            rpc.endpoint(Network::Optimism).map(Url::as_str),
            Some("http://localhost:8545/")
        );

        let mut cli = cli(&["--evm-private-key", KEY, "--bridge-delay-ms", "5"]);
        cli.origin_network = None;
        cli.origin_asset = None;
        cli.supported_networks = None;
        let config = Config::resolve(cli, file, rpc).unwrap();
        assert_eq!(config.settlement().origin_network, Network::Optimism);
        assert_eq!(
            config.settlement().origin_asset,
            "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"
        );
        assert_eq!(config.settlement().supported_networks, vec![Network::Optimism]);
        assert_eq!(config.bridge_delay(), Duration::from_millis(5));
    }
}
