//! In-memory signer, scheme and bridge that record every call into one log.

use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use x402_bridge::{Bridge, BridgeError, BridgeReceipt, BridgeRequest};
use x402_types::chain::{ChainId, ChainProviderOps, SignerProvider, SignerProviderError};
use x402_types::networks::Network;
use x402_types::proto::{self, PaymentVerificationError, v1};
use x402_types::scheme::{
    X402SchemeFacilitator, X402SchemeFacilitatorBuilder, X402SchemeFacilitatorError,
};

use crate::facilitator_local::{FacilitatorLocal, SettlementConfig};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Signer(Network),
    Validate(Network),
    Bridge(BridgeRequest),
    Verify(Network),
    Settle(Network),
}

pub type Log = Arc<Mutex<Vec<Event>>>;

pub fn events(log: &Log) -> Vec<Event> {
    log.lock().unwrap().clone()
}

pub fn count(log: &Log, matches: fn(&Event) -> bool) -> usize {
    events(log).iter().filter(|event| matches(event)).count()
}

pub struct MockProvider(pub Network);

impl ChainProviderOps for MockProvider {
    fn signer_addresses(&self) -> Vec<String> {
        vec!["0xfacilitator".to_string()]
    }

    fn chain_id(&self) -> ChainId {
        self.0.chain_id()
    }
}

pub struct MockSigners(pub Log);

#[async_trait::async_trait]
impl SignerProvider for MockSigners {
    type Provider = MockProvider;

    async fn signer_for(&self, network: Network) -> Result<Self::Provider, SignerProviderError> {
        self.0.lock().unwrap().push(Event::Signer(network));
        Ok(MockProvider(network))
    }

    fn signer_addresses(&self) -> Vec<String> {
        vec!["0xfacilitator".to_string()]
    }
}

/// What the scheme answers to verify and settle.
#[derive(Clone)]
pub enum Outcome {
    Ok,
    Invalid(PaymentVerificationError),
    Onchain(String),
}

/// Requires `paymentPayload.payload.authorization` when `strict`, like the EVM scheme.
pub struct MockScheme {
    pub log: Log,
    pub outcome: Outcome,
    pub strict: bool,
}

struct MockSchemeFacilitator {
    network: Network,
    log: Log,
    outcome: Outcome,
    strict: bool,
}

impl X402SchemeFacilitatorBuilder<MockProvider> for MockScheme {
    fn build(
        &self,
        provider: MockProvider,
        _config: Option<Value>,
    ) -> Result<Box<dyn X402SchemeFacilitator>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Box::new(MockSchemeFacilitator {
            network: provider.0,
            log: self.log.clone(),
            outcome: self.outcome.clone(),
            strict: self.strict,
        }))
    }
}

impl MockSchemeFacilitator {
    fn result(&self) -> Result<(), X402SchemeFacilitatorError> {
        match &self.outcome {
            Outcome::Ok => Ok(()),
            Outcome::Invalid(e) => Err(e.clone().into()),
            Outcome::Onchain(e) => Err(X402SchemeFacilitatorError::OnchainFailure(e.clone())),
        }
    }
}

#[async_trait::async_trait]
impl X402SchemeFacilitator for MockSchemeFacilitator {
    fn validate(&self, request: &proto::VerifyRequest) -> Result<(), PaymentVerificationError> {
        self.log.lock().unwrap().push(Event::Validate(self.network));
        let authorization = request.payment_payload.payload.get("authorization");
        if self.strict && authorization.is_none() {
            return Err(PaymentVerificationError::InvalidFormat(
                "missing field `authorization`".into(),
            ));
        }
        Ok(())
    }

    async fn verify(
        &self,
        _request: &proto::VerifyRequest,
    ) -> Result<proto::VerifyResponse, X402SchemeFacilitatorError> {
        self.log.lock().unwrap().push(Event::Verify(self.network));
        self.result()?;
        Ok(v1::VerifyResponse::valid("0xpayer"))
    }

    async fn settle(
        &self,
        _request: &proto::SettleRequest,
    ) -> Result<proto::SettleResponse, X402SchemeFacilitatorError> {
        self.log.lock().unwrap().push(Event::Settle(self.network));
        self.result()?;
        Ok(v1::SettleResponse::Success {
            payer: "0xpayer".into(),
            transaction: "0xsettlement".into(),
            network: self.network.to_string(),
        })
    }
}

pub struct MockBridge {
    pub log: Log,
    pub result: Result<String, BridgeError>,
}

#[async_trait::async_trait]
impl Bridge for MockBridge {
    async fn bridge(&self, request: &BridgeRequest) -> Result<BridgeReceipt, BridgeError> {
        self.log.lock().unwrap().push(Event::Bridge(request.clone()));
        self.result.clone().map(|tx_hash| BridgeReceipt { tx_hash })
    }
}

pub fn config() -> SettlementConfig {
    SettlementConfig {
        origin_network: Network::Arbitrum,
        origin_asset: "0xaf88d065e77c8cC2239327C5EDb3A432268e5831".into(),
        supported_networks: vec![Network::Base, Network::Arbitrum, Network::Optimism],
    }
}

/// An orchestrator over the mocks with a strict scheme, plus its call log.
pub fn facilitator(
    outcome: Outcome,
    bridge: Result<String, BridgeError>,
) -> (FacilitatorLocal<MockSigners>, Log) {
    facilitator_with(outcome, bridge, true)
}

pub fn facilitator_with(
    outcome: Outcome,
    bridge: Result<String, BridgeError>,
    strict: bool,
) -> (FacilitatorLocal<MockSigners>, Log) {
    let log: Log = Arc::default();
    let facilitator = FacilitatorLocal::new(
        MockSigners(log.clone()),
        MockScheme {
            log: log.clone(),
            outcome,
            strict,
        },
        MockBridge {
            log: log.clone(),
            result: bridge,
        },
        config(),
    );
    (facilitator, log)
}

pub fn request_json(network: &str) -> Value {
    json!({
        "paymentPayload": {
            "x402Version": 1,
            "scheme": "exact",
            "network": network,
            "payload": {
                "signature": "0xsig",
                "authorization": {
                    "from": "0xPAYER",
                    "to": "0xABC0000000000000000000000000000000000001",
                    "value": "10"
                }
            }
        },
        "paymentRequirements": {
            "scheme": "exact",
            "network": network,
            "asset": "0xTOKEN",
            "recipientAmount": "10",
            "payTo": "0xPAYTO"
        }
    })
}

pub fn request(network: &str) -> proto::SettleRequest {
    serde_json::from_value(request_json(network)).unwrap()
}
