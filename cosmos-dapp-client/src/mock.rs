//! In-memory wallet provider and signing client used by the unit tests.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use cosmos_sdk_proto::cosmos::base::abci::v1beta1::TxResponse;
use cosmrs::{
    crypto::secp256k1::SigningKey,
    tx::{Raw, SignDoc},
    AccountId,
};
use cosmwasm_std::Coin;
use url::Url;

use crate::{
    chain::{ChainDescriptor, ChainInfo},
    provider::{AccountData, AuthorizedKey, OfflineSigner, WalletProvider},
    signing::{ExecuteResponse, FeeMode, GasSettings, SigningClient, SigningClientFactory},
    traits::IntoAnyhowResult,
    AnyResult,
};

pub const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub fn test_address(seed: u8) -> AccountId {
    AccountId::new("neutron", &[seed; 32]).unwrap()
}

pub struct FakeProvider {
    sign_key: Arc<SigningKey>,
    address: AccountId,
    registered: Mutex<Vec<String>>,
    refuse: AtomicBool,
}

impl FakeProvider {
    pub fn new(chain: &ChainDescriptor) -> FakeProvider {
        let sign_key = SigningKey::random();
        let address = sign_key
            .public_key()
            .account_id(&chain.address_prefix)
            .unwrap();

        FakeProvider {
            sign_key: Arc::new(sign_key),
            address,
            registered: Mutex::new(vec![]),
            refuse: AtomicBool::new(false),
        }
    }

    pub fn refuse_authorization(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    pub fn registered_chains(&self) -> Vec<String> {
        self.registered.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletProvider for FakeProvider {
    async fn register_chain(&self, chain_info: &ChainInfo) -> AnyResult<()> {
        let mut registered = self.registered.lock().unwrap();
        if !registered.contains(&chain_info.chain_id) {
            registered.push(chain_info.chain_id.clone());
        }
        Ok(())
    }

    async fn authorize(&self, _chain_id: &str) -> AnyResult<()> {
        if self.refuse.load(Ordering::SeqCst) {
            bail!("Request rejected");
        }
        Ok(())
    }

    fn get_signer(&self, _chain_id: &str) -> Arc<dyn OfflineSigner> {
        Arc::new(FakeSigner {
            sign_key: self.sign_key.clone(),
            address: self.address.clone(),
        })
    }

    async fn get_authorized_key(&self, _chain_id: &str) -> AnyResult<AuthorizedKey> {
        Ok(AuthorizedKey {
            name: "fake".to_string(),
            address: self.address.clone(),
            pub_key: self.sign_key.public_key(),
        })
    }
}

struct FakeSigner {
    sign_key: Arc<SigningKey>,
    address: AccountId,
}

#[async_trait]
impl OfflineSigner for FakeSigner {
    async fn get_accounts(&self) -> AnyResult<Vec<AccountData>> {
        Ok(vec![AccountData {
            address: self.address.clone(),
            pub_key: self.sign_key.public_key(),
        }])
    }

    async fn sign_direct(&self, _signer_address: &AccountId, sign_doc: SignDoc) -> AnyResult<Raw> {
        sign_doc.sign(&self.sign_key).into_anyresult()
    }
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub sender: AccountId,
    pub contract: AccountId,
    pub msg: String,
    pub fee: FeeMode,
    pub memo: Option<String>,
    pub funds: Vec<Coin>,
}

#[derive(Debug, Clone)]
enum Outcome {
    Success(String),
    Failure(String),
}

struct FakeChain {
    outcome: Mutex<Outcome>,
    latency: Option<Duration>,
    refuse_connect: AtomicBool,
    connects: AtomicUsize,
    endpoints: Mutex<Vec<Url>>,
    submissions: Mutex<Vec<Submission>>,
}

pub struct FakeClientFactory {
    chain: Arc<FakeChain>,
}

impl FakeClientFactory {
    fn new(outcome: Outcome) -> FakeClientFactory {
        FakeClientFactory {
            chain: Arc::new(FakeChain {
                outcome: Mutex::new(outcome),
                latency: None,
                refuse_connect: AtomicBool::new(false),
                connects: AtomicUsize::new(0),
                endpoints: Mutex::new(vec![]),
                submissions: Mutex::new(vec![]),
            }),
        }
    }

    pub fn succeeding(tx_hash: &str) -> FakeClientFactory {
        Self::new(Outcome::Success(tx_hash.to_string()))
    }

    pub fn failing(message: &str) -> FakeClientFactory {
        Self::new(Outcome::Failure(message.to_string()))
    }

    pub fn with_latency(self, latency: Duration) -> FakeClientFactory {
        let chain = Arc::try_unwrap(self.chain).ok().unwrap();
        FakeClientFactory {
            chain: Arc::new(FakeChain {
                latency: Some(latency),
                ..chain
            }),
        }
    }

    pub fn succeed(&self, tx_hash: &str) {
        *self.chain.outcome.lock().unwrap() = Outcome::Success(tx_hash.to_string());
    }

    pub fn refuse_connect(&self) {
        self.chain.refuse_connect.store(true, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.chain.connects.load(Ordering::SeqCst)
    }

    pub fn endpoints(&self) -> Vec<Url> {
        self.chain.endpoints.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.chain.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl SigningClientFactory for FakeClientFactory {
    async fn connect(
        &self,
        endpoint: &Url,
        _signer: Arc<dyn OfflineSigner>,
        _gas: GasSettings,
    ) -> AnyResult<Box<dyn SigningClient>> {
        self.chain.connects.fetch_add(1, Ordering::SeqCst);
        self.chain.endpoints.lock().unwrap().push(endpoint.clone());

        if self.chain.refuse_connect.load(Ordering::SeqCst) {
            bail!("connection refused");
        }

        Ok(Box::new(FakeClient {
            chain: self.chain.clone(),
        }))
    }
}

struct FakeClient {
    chain: Arc<FakeChain>,
}

#[async_trait]
impl SigningClient for FakeClient {
    async fn execute(
        &self,
        sender: &AccountId,
        contract: &AccountId,
        msg: Vec<u8>,
        fee: FeeMode,
        memo: Option<String>,
        funds: Vec<Coin>,
    ) -> AnyResult<ExecuteResponse> {
        if let Some(latency) = self.chain.latency {
            tokio::time::sleep(latency).await;
        }

        self.chain.submissions.lock().unwrap().push(Submission {
            sender: sender.clone(),
            contract: contract.clone(),
            msg: String::from_utf8(msg)?,
            fee,
            memo,
            funds,
        });

        let outcome = self.chain.outcome.lock().unwrap().clone();
        match outcome {
            Outcome::Success(tx_hash) => Ok(ExecuteResponse {
                transaction_hash: tx_hash.clone(),
                raw: TxResponse {
                    txhash: tx_hash,
                    ..Default::default()
                },
            }),
            Outcome::Failure(message) => Err(anyhow!(message)),
        }
    }
}
