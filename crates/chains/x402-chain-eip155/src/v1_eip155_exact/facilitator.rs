//! Facilitator-side verification and settlement for the V1 EIP-155 exact scheme.
//!
//! Both operations run the same preconditions (network, recipient, validity
//! window, amount, balance, EIP-712 domain). Verification then simulates
//! `transferWithAuthorization` with `eth_call`; settlement sends it and waits
//! for the receipt.

use alloy_network::ReceiptResponse;
use alloy_primitives::{Address, B256, Bytes, Signature, TxHash, U256};
use alloy_provider::{PendingTransactionError, Provider};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain, sol};
use alloy_transport::TransportError;
use std::sync::Arc;
use x402_types::chain::ChainId;
use x402_types::proto;
use x402_types::proto::{PaymentVerificationError, v1};
use x402_types::scheme::{
    X402SchemeFacilitator, X402SchemeFacilitatorBuilder, X402SchemeFacilitatorError,
};
use x402_types::timestamp::UnixTimestamp;

#[cfg(feature = "telemetry")]
use tracing::{Instrument, instrument};
#[cfg(feature = "telemetry")]
use tracing_core::Level;

use crate::chain::{Eip155ChainProvider, Eip155ChainReference};
use crate::v1_eip155_exact::{
    PaymentRequirementsExtra, TransferWithAuthorization, V1Eip155Exact, types,
};

/// Seconds before `validBefore` at which an authorization is already treated as expired.
const EXPIRY_GRACE_SECS: u64 = 6;

sol! {
    #[allow(missing_docs)]
    #[allow(clippy::too_many_arguments)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IEIP3009 {
        function balanceOf(address account) external view returns (uint256);
        function name() external view returns (string);
        function version() external view returns (string);
        function transferWithAuthorization(
            address from,
            address to,
            uint256 value,
            uint256 validAfter,
            uint256 validBefore,
            bytes32 nonce,
            bytes signature
        ) external;
        function transferWithAuthorization(
            address from,
            address to,
            uint256 value,
            uint256 validAfter,
            uint256 validBefore,
            bytes32 nonce,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
    }
}

impl X402SchemeFacilitatorBuilder<Arc<Eip155ChainProvider>> for V1Eip155Exact {
    fn build(
        &self,
        provider: Arc<Eip155ChainProvider>,
        _config: Option<serde_json::Value>,
    ) -> Result<Box<dyn X402SchemeFacilitator>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Box::new(V1Eip155ExactFacilitator::new(provider)))
    }
}

/// Verifies and settles ERC-3009 payments on the chain its provider is bound to.
pub struct V1Eip155ExactFacilitator {
    provider: Arc<Eip155ChainProvider>,
}

impl V1Eip155ExactFacilitator {
    pub fn new(provider: Arc<Eip155ChainProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl X402SchemeFacilitator for V1Eip155ExactFacilitator {
    fn validate(&self, request: &proto::VerifyRequest) -> Result<(), PaymentVerificationError> {
        types::VerifyRequest::from_proto(request.clone()).map(|_| ())
    }

    async fn verify(
        &self,
        request: &proto::VerifyRequest,
    ) -> Result<proto::VerifyResponse, X402SchemeFacilitatorError> {
        let request = types::VerifyRequest::from_proto(request.clone())?;
        let context = assert_valid_payment(
            self.provider.inner(),
            self.provider.chain(),
            &request.payment_payload,
            &request.payment_requirements,
        )
        .await?;
        let payer = verify_payment(&context.contract, &context.payment, &context.domain).await?;
        Ok(v1::VerifyResponse::valid(payer.to_string()))
    }

    async fn settle(
        &self,
        request: &proto::SettleRequest,
    ) -> Result<proto::SettleResponse, X402SchemeFacilitatorError> {
        let request = types::SettleRequest::from_proto(request.clone())?;
        let payload = &request.payment_payload;
        let context = assert_valid_payment(
            self.provider.inner(),
            self.provider.chain(),
            payload,
            &request.payment_requirements,
        )
        .await?;
        let tx_hash = settle_payment(&context.contract, &context.payment, &context.domain).await?;
        Ok(v1::SettleResponse::Success {
            payer: context.payment.from.to_string(),
            transaction: tx_hash.to_string(),
            network: payload.network.clone(),
        })
    }
}

/// A fully specified ERC-3009 authorization, ready to submit.
#[derive(Debug, Clone)]
pub struct ExactEvmPayment {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub valid_after: UnixTimestamp,
    pub valid_before: UnixTimestamp,
    pub nonce: B256,
    pub signature: Bytes,
}

struct PaymentContext<'a, P: Provider> {
    contract: IEIP3009::IEIP3009Instance<&'a P>,
    payment: ExactEvmPayment,
    domain: Eip712Domain,
}

/// Runs every precondition of a payment and returns what is needed to submit it.
#[cfg_attr(feature = "telemetry", instrument(skip_all, err))]
async fn assert_valid_payment<'a, P: Provider>(
    provider: &'a P,
    chain: &Eip155ChainReference,
    payload: &types::PaymentPayload,
    requirements: &types::PaymentRequirements,
) -> Result<PaymentContext<'a, P>, Eip155ExactError> {
    assert_network(chain, &payload.network)?;
    assert_network(chain, &requirements.network)?;

    let authorization = &payload.payload.authorization;
    if authorization.to != requirements.pay_to {
        return Err(PaymentVerificationError::RecipientMismatch.into());
    }
    assert_time(authorization.valid_after, authorization.valid_before)?;

    let amount_required = requirements.max_amount_required;
    assert_enough_value(&authorization.value, &amount_required)?;

    let asset_address = requirements.asset;
    let contract = IEIP3009::new(asset_address, provider);
    let domain = assert_domain(chain, &contract, &asset_address, &requirements.extra).await?;
    assert_enough_balance(&contract, &authorization.from, amount_required).await?;

    let payment = ExactEvmPayment {
        from: authorization.from,
        to: authorization.to,
        value: authorization.value,
        valid_after: authorization.valid_after,
        valid_before: authorization.valid_before,
        nonce: authorization.nonce,
        signature: payload.payload.signature.clone(),
    };
    Ok(PaymentContext {
        contract,
        payment,
        domain,
    })
}

/// Checks that a v1 network name denotes the chain this facilitator is bound to.
pub fn assert_network(
    chain: &Eip155ChainReference,
    network: &str,
) -> Result<(), PaymentVerificationError> {
    let expected: ChainId = chain.into();
    let actual =
        ChainId::from_network_name(network).ok_or(PaymentVerificationError::UnsupportedChain)?;
    if actual != expected {
        return Err(PaymentVerificationError::ChainIdMismatch);
    }
    Ok(())
}

/// Validates that the current time is within the `validAfter` and `validBefore` bounds.
///
/// An authorization expiring within the next six seconds already counts as expired.
#[cfg_attr(feature = "telemetry", instrument(skip_all, err))]
pub fn assert_time(
    valid_after: UnixTimestamp,
    valid_before: UnixTimestamp,
) -> Result<(), PaymentVerificationError> {
    let now = UnixTimestamp::now();
    if valid_before < now + EXPIRY_GRACE_SECS {
        return Err(PaymentVerificationError::Expired);
    }
    if valid_after > now {
        return Err(PaymentVerificationError::Early);
    }
    Ok(())
}

/// The authorized value must equal the required amount exactly.
#[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
    sent = %sent,
    max_amount_required = %max_amount_required
)))]
pub fn assert_enough_value(
    sent: &U256,
    max_amount_required: &U256,
) -> Result<(), PaymentVerificationError> {
    if sent != max_amount_required {
        Err(PaymentVerificationError::InvalidPaymentAmount)
    } else {
        Ok(())
    }
}

/// Builds the token's EIP-712 domain, preferring `extra` over on-chain `name()` / `version()`.
#[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
    network = %chain.as_chain_id(),
    asset = %asset_address
)))]
async fn assert_domain<P: Provider>(
    chain: &Eip155ChainReference,
    token_contract: &IEIP3009::IEIP3009Instance<P>,
    asset_address: &Address,
    extra: &Option<PaymentRequirementsExtra>,
) -> Result<Eip712Domain, Eip155ExactError> {
    let name = match extra.as_ref() {
        Some(extra) => extra.name.clone(),
        None => {
            let name_b = token_contract.name();
            let name_fut = name_b.call().into_future();
            #[cfg(feature = "telemetry")]
            let name = name_fut
                .instrument(tracing::info_span!("fetch_eip712_name", otel.kind = "client"))
                .await?;
            #[cfg(not(feature = "telemetry"))]
            let name = name_fut.await?;
            name
        }
    };
    let version = match extra.as_ref() {
        Some(extra) => extra.version.clone(),
        None => {
            let version_b = token_contract.version();
            let version_fut = version_b.call().into_future();
            #[cfg(feature = "telemetry")]
            let version = version_fut
                .instrument(tracing::info_span!(
                    "fetch_eip712_version",
                    otel.kind = "client"
                ))
                .await?;
            #[cfg(not(feature = "telemetry"))]
            let version = version_fut.await?;
            version
        }
    };
    Ok(eip712_domain! {
        name: name,
        version: version,
        chain_id: chain.inner(),
        verifying_contract: *asset_address,
    })
}

/// Checks the payer holds at least `max_amount_required` of the token.
#[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
    sender = %sender,
    max_required = %max_amount_required,
    token_contract = %token_contract.address()
)))]
async fn assert_enough_balance<P: Provider>(
    token_contract: &IEIP3009::IEIP3009Instance<P>,
    sender: &Address,
    max_amount_required: U256,
) -> Result<(), Eip155ExactError> {
    let balance_of = token_contract.balanceOf(*sender);
    let balance_fut = balance_of.call().into_future();
    #[cfg(feature = "telemetry")]
    let balance = balance_fut
        .instrument(tracing::info_span!(
            "fetch_token_balance",
            token_contract = %token_contract.address(),
            sender = %sender,
            otel.kind = "client"
        ))
        .await?;
    #[cfg(not(feature = "telemetry"))]
    let balance = balance_fut.await?;

    if balance < max_amount_required {
        Err(PaymentVerificationError::InsufficientFunds.into())
    } else {
        Ok(())
    }
}

/// The EIP-712 digest of a payment together with its classified signature.
#[derive(Debug, Clone)]
struct SignedMessage {
    address: Address,
    hash: B256,
    signature: StructuredSignature,
}

impl SignedMessage {
    fn extract(payment: &ExactEvmPayment, domain: &Eip712Domain) -> Self {
        let transfer_with_authorization = TransferWithAuthorization {
            from: payment.from,
            to: payment.to,
            value: payment.value,
            validAfter: U256::from(payment.valid_after.as_secs()),
            validBefore: U256::from(payment.valid_before.as_secs()),
            nonce: payment.nonce,
        };
        let hash = transfer_with_authorization.eip712_signing_hash(domain);
        let signature =
            StructuredSignature::from_bytes(payment.signature.clone(), payment.from, &hash);
        Self {
            address: payment.from,
            hash,
            signature,
        }
    }
}

/// How a signature will be presented to the token contract.
#[derive(Debug, Clone, PartialEq)]
enum StructuredSignature {
    /// Recovers to the payer; sent as (v, r, s).
    #[allow(clippy::upper_case_acronyms)]
    EOA(Signature),
    /// Anything else; sent as raw bytes for the payer's wallet contract to check.
    EIP1271(Bytes),
}

impl StructuredSignature {
    fn from_bytes(bytes: Bytes, expected_signer: Address, prehash: &B256) -> Self {
        let eoa_signature = match bytes.len() {
            65 => Signature::from_raw(&bytes).ok().map(|s| s.normalized_s()),
            64 => Some(Signature::from_erc2098(&bytes).normalized_s()),
            _ => None,
        };
        match eoa_signature {
            Some(s)
                if s.recover_address_from_prehash(prehash)
                    .is_ok_and(|recovered| recovered == expected_signer) =>
            {
                StructuredSignature::EOA(s)
            }
            _ => StructuredSignature::EIP1271(bytes),
        }
    }
}

/// Splits a signature into the `(v, r, s)` triple expected by ERC-3009.
fn split_signature(signature: &Signature) -> (u8, B256, B256) {
    let v = 27 + (signature.v() as u8);
    (v, B256::from(signature.r()), B256::from(signature.s()))
}

/// A revert during simulation is a payment problem; anything else is infrastructure.
fn simulation_error(e: alloy_contract::Error) -> Eip155ExactError {
    if e.as_revert_data().is_some() {
        PaymentVerificationError::TransactionSimulation(e.to_string()).into()
    } else {
        e.into()
    }
}

/// Simulates `transferWithAuthorization` and returns the payer on success.
async fn verify_payment<P: Provider>(
    contract: &IEIP3009::IEIP3009Instance<&P>,
    payment: &ExactEvmPayment,
    eip712_domain: &Eip712Domain,
) -> Result<Address, Eip155ExactError> {
    let signed_message = SignedMessage::extract(payment, eip712_domain);
    let valid_after = U256::from(payment.valid_after.as_secs());
    let valid_before = U256::from(payment.valid_before.as_secs());
    match signed_message.signature {
        StructuredSignature::EOA(signature) => {
            let (v, r, s) = split_signature(&signature);
            let transfer_call = contract.transferWithAuthorization_1(
                payment.from,
                payment.to,
                payment.value,
                valid_after,
                valid_before,
                payment.nonce,
                v,
                r,
                s,
            );
            let transfer_call_fut = transfer_call.call().into_future();
            #[cfg(feature = "telemetry")]
            let result = transfer_call_fut
                .instrument(tracing::info_span!("call_transferWithAuthorization_1",
                    from = %payment.from,
                    to = %payment.to,
                    value = %payment.value,
                    nonce = %payment.nonce,
                    token_contract = %contract.address(),
                    otel.kind = "client",
                ))
                .await;
            #[cfg(not(feature = "telemetry"))]
            let result = transfer_call_fut.await;
            result.map_err(simulation_error)?;
        }
        StructuredSignature::EIP1271(signature) => {
            let transfer_call = contract.transferWithAuthorization_0(
                payment.from,
                payment.to,
                payment.value,
                valid_after,
                valid_before,
                payment.nonce,
                signature,
            );
            let transfer_call_fut = transfer_call.call().into_future();
            #[cfg(feature = "telemetry")]
            let result = transfer_call_fut
                .instrument(tracing::info_span!("call_transferWithAuthorization_0",
                    from = %payment.from,
                    to = %payment.to,
                    value = %payment.value,
                    nonce = %payment.nonce,
                    token_contract = %contract.address(),
                    otel.kind = "client",
                ))
                .await;
            #[cfg(not(feature = "telemetry"))]
            let result = transfer_call_fut.await;
            result.map_err(simulation_error)?;
        }
    }
    Ok(signed_message.address)
}

/// Sends `transferWithAuthorization` and waits for a successful receipt.
async fn settle_payment<P: Provider>(
    contract: &IEIP3009::IEIP3009Instance<&P>,
    payment: &ExactEvmPayment,
    eip712_domain: &Eip712Domain,
) -> Result<TxHash, Eip155ExactError> {
    let signed_message = SignedMessage::extract(payment, eip712_domain);
    let valid_after = U256::from(payment.valid_after.as_secs());
    let valid_before = U256::from(payment.valid_before.as_secs());
    let pending = match signed_message.signature {
        StructuredSignature::EOA(signature) => {
            let (v, r, s) = split_signature(&signature);
            contract
                .transferWithAuthorization_1(
                    payment.from,
                    payment.to,
                    payment.value,
                    valid_after,
                    valid_before,
                    payment.nonce,
                    v,
                    r,
                    s,
                )
                .send()
                .await?
        }
        StructuredSignature::EIP1271(signature) => {
            contract
                .transferWithAuthorization_0(
                    payment.from,
                    payment.to,
                    payment.value,
                    valid_after,
                    valid_before,
                    payment.nonce,
                    signature,
                )
                .send()
                .await?
        }
    };
    let receipt_fut = pending.get_receipt();
    #[cfg(feature = "telemetry")]
    let receipt = receipt_fut
        .instrument(tracing::info_span!("get_receipt",
            from = %payment.from,
            token_contract = %contract.address(),
            otel.kind = "client",
        ))
        .await?;
    #[cfg(not(feature = "telemetry"))]
    let receipt = receipt_fut.await?;

    let tx_hash = receipt.transaction_hash();
    if receipt.status() {
        #[cfg(feature = "telemetry")]
        tracing::event!(Level::INFO, status = "ok", tx = %tx_hash, "transferWithAuthorization succeeded");
        Ok(tx_hash)
    } else {
        #[cfg(feature = "telemetry")]
        tracing::event!(Level::WARN, status = "failed", tx = %tx_hash, "transferWithAuthorization failed");
        Err(Eip155ExactError::TransactionReverted(tx_hash))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Eip155ExactError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    PendingTransaction(#[from] PendingTransactionError),
    #[error("Transaction {0} reverted")]
    TransactionReverted(TxHash),
    #[error("Contract call failed: {0}")]
    ContractCall(String),
    #[error(transparent)]
    PaymentVerification(#[from] PaymentVerificationError),
}

impl From<Eip155ExactError> for X402SchemeFacilitatorError {
    fn from(value: Eip155ExactError) -> Self {
        match value {
            Eip155ExactError::PaymentVerification(e) => Self::PaymentVerification(e),
            Eip155ExactError::Transport(_)
            | Eip155ExactError::PendingTransaction(_)
            | Eip155ExactError::TransactionReverted(_)
            | Eip155ExactError::ContractCall(_) => Self::OnchainFailure(value.to_string()),
        }
    }
}

impl From<alloy_contract::Error> for Eip155ExactError {
    fn from(e: alloy_contract::Error) -> Self {
        match e {
            alloy_contract::Error::TransportError(e) => Self::Transport(e),
            alloy_contract::Error::PendingTransactionError(e) => Self::PendingTransaction(e),
            other => Self::ContractCall(other.to_string()),
        }
    }
}
