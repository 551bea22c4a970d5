#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EIP-155 (EVM) support for the x402 bridging facilitator.
//!
//! - [`chain`] - per-network signing providers built from a single private key
//! - [`v1_eip155_exact`] - the v1 `exact` scheme: ERC-3009 `transferWithAuthorization`
//!
//! # Feature Flags
//!
//! - `telemetry` - tracing spans around RPC calls and settlement outcome events

pub mod chain;
pub mod v1_eip155_exact;

pub use chain::{Eip155ChainProvider, Eip155RpcConfig, Eip155SignerProvider};
pub use v1_eip155_exact::V1Eip155Exact;
