#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the x402 payment protocol.
//!
//! This crate is shared by every role of the bridging facilitator:
//!
//! - [`chain`] - CAIP-2 chain identifiers and the signer-provider seam
//! - [`networks`] - the [`networks::Network`] tagged union of known EVM networks
//! - [`proto`] - x402 v1 wire types (requirements, payloads, verify/settle responses)
//! - [`scheme`] - traits implemented by payment scheme facilitators
//! - [`facilitator`] - the [`facilitator::Facilitator`] trait served over HTTP
//! - [`timestamp`] - Unix timestamps as used by payment authorizations

pub mod chain;
pub mod facilitator;
pub mod networks;
pub mod proto;
pub mod scheme;
pub mod timestamp;
pub mod util;
