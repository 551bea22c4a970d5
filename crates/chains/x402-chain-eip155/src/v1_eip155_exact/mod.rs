//! V1 EIP-155 "exact" payment scheme.
//!
//! Payments are ERC-3009 `transferWithAuthorization` calls: the payer signs an
//! EIP-712 authorization off-chain and the facilitator submits it, paying gas.
//!
//! # Signature Handling
//!
//! - **EOA signatures (64-65 bytes)** that recover to `authorization.from` are
//!   split into (v, r, s) and sent to
//!   `transferWithAuthorization(address,address,uint256,uint256,uint256,bytes32,uint8,bytes32,bytes32)`.
//! - **Everything else** is treated as an EIP-1271 contract-wallet signature and
//!   passed whole to
//!   `transferWithAuthorization(address,address,uint256,uint256,uint256,bytes32,bytes)`.

use x402_types::scheme::X402SchemeId;

pub mod facilitator;
pub mod types;

pub use facilitator::*;
pub use types::*;

/// Scheme marker for `v1-eip155-exact`.
#[derive(Debug, Clone, Copy, Default)]
pub struct V1Eip155Exact;

impl X402SchemeId for V1Eip155Exact {
    fn x402_version(&self) -> u8 {
        1
    }
    fn namespace(&self) -> &str {
        "eip155"
    }
    fn scheme(&self) -> &str {
        ExactScheme.as_ref()
    }
}
