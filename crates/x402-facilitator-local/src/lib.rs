#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Settlement-with-bridging facilitator for the x402 payment protocol.
//!
//! This crate provides [`FacilitatorLocal`], a [`Facilitator`](x402_types::facilitator::Facilitator)
//! that settles every payment on one origin network, bridging funds there
//! first when a payment names another network.
//!
//! This crate provides:
//! - the settlement orchestrator in [`facilitator_local`]
//! - Axum routes and HTTP error mapping in [`handlers`]
//! - logging, trace export and signal handling in [`util`]

pub mod facilitator_local;
pub mod handlers;
pub mod util;

#[cfg(test)]
mod testing;

pub use facilitator_local::*;
pub use handlers::*;
