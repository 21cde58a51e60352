use std::{
    collections::HashMap,
    fmt::Debug,
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use bip39::Mnemonic;
use cosmrs::{
    crypto::secp256k1::SigningKey,
    tx::{Raw, SignDoc},
    AccountId,
};
use tracing::{debug, info};

use crate::{
    chain::ChainInfo,
    provider::{AccountData, AuthorizedKey, OfflineSigner, WalletProvider},
    traits::{IntoAnyhowResult, OkOrAny},
    AnyResult,
};

enum KeySource {
    /// BIP39 seed, keys are derived per chain from its BIP44 coin type
    Seed { seed: [u8; 64], account_index: u64 },
    /// Same key on every chain
    Single(Arc<SigningKey>),
}

struct LocalChain {
    prefix: String,
    sign_key: Arc<SigningKey>,
    authorized: bool,
}

struct Inner {
    name: String,
    source: KeySource,
    chains: Mutex<HashMap<String, LocalChain>>,
}

impl Inner {
    fn chains(&self) -> AnyResult<MutexGuard<'_, HashMap<String, LocalChain>>> {
        self.chains
            .lock()
            .map_err(|_| anyhow!("Wallet state poisoned"))
    }

    fn authorized_account(&self, chain_id: &str) -> AnyResult<Option<(AccountData, Arc<SigningKey>)>> {
        let chains = self.chains()?;

        let Some(chain) = chains.get(chain_id).filter(|chain| chain.authorized) else {
            return Ok(None);
        };

        let pub_key = chain.sign_key.public_key();
        let address = pub_key.account_id(&chain.prefix).into_anyresult()?;

        Ok(Some((AccountData { address, pub_key }, chain.sign_key.clone())))
    }
}

/// Wallet provider backed by a local key, the in-process counterpart of a
/// browser extension.
///
/// Chains have to be registered and authorized before their account is
/// exposed, like an extension would require.
#[derive(Clone)]
pub struct LocalWalletProvider {
    inner: Arc<Inner>,
}

impl LocalWalletProvider {
    pub fn random(name: impl Into<String>) -> LocalWalletProvider {
        Self::new(name, KeySource::Single(Arc::new(SigningKey::random())))
    }

    pub fn from_private_key(name: impl Into<String>, bytes: &[u8]) -> AnyResult<LocalWalletProvider> {
        let sign_key = SigningKey::from_slice(bytes)
            .map_err(|err| anyhow!("Invalid private key, error: {err}"))?;

        Ok(Self::new(name, KeySource::Single(Arc::new(sign_key))))
    }

    pub fn from_seed_phrase(
        name: impl Into<String>,
        seed_phrase: impl Into<String>,
        account_index: u64,
    ) -> AnyResult<LocalWalletProvider> {
        let seed = Mnemonic::from_str(&seed_phrase.into())?.to_seed("");

        Ok(Self::new(name, KeySource::Seed { seed, account_index }))
    }

    fn new(name: impl Into<String>, source: KeySource) -> LocalWalletProvider {
        LocalWalletProvider {
            inner: Arc::new(Inner {
                name: name.into(),
                source,
                chains: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn derive_key(&self, coin_type: u64) -> AnyResult<Arc<SigningKey>> {
        match &self.inner.source {
            KeySource::Seed {
                seed,
                account_index,
            } => {
                let derivation_path = bip32::DerivationPath::from_str(&format!(
                    "m/44'/{coin_type}'/0'/0/{account_index}"
                ))?;
                let sign_key = SigningKey::derive_from_path(seed, &derivation_path).into_anyresult()?;

                Ok(Arc::new(sign_key))
            }
            KeySource::Single(sign_key) => Ok(sign_key.clone()),
        }
    }

    pub fn registered_chains(&self) -> AnyResult<Vec<String>> {
        let mut chains: Vec<String> = self.inner.chains()?.keys().cloned().collect();
        chains.sort();
        Ok(chains)
    }
}

#[async_trait]
impl WalletProvider for LocalWalletProvider {
    async fn register_chain(&self, chain_info: &ChainInfo) -> AnyResult<()> {
        if self.inner.chains()?.contains_key(&chain_info.chain_id) {
            debug!(chain_id = %chain_info.chain_id, "Chain already registered");
            return Ok(());
        }

        let sign_key = self.derive_key(chain_info.bip44.coin_type)?;

        self.inner.chains()?.entry(chain_info.chain_id.clone()).or_insert(LocalChain {
            prefix: chain_info.bech32_config.bech32_prefix_acc_addr.clone(),
            sign_key,
            authorized: false,
        });

        info!(chain_id = %chain_info.chain_id, wallet = %self.inner.name, "Chain registered");
        Ok(())
    }

    async fn authorize(&self, chain_id: &str) -> AnyResult<()> {
        let mut chains = self.inner.chains()?;

        let chain = chains
            .get_mut(chain_id)
            .ok_or_any(&format!("Chain {chain_id} is not registered"))?;
        chain.authorized = true;

        Ok(())
    }

    fn get_signer(&self, chain_id: &str) -> Arc<dyn OfflineSigner> {
        Arc::new(LocalSigner {
            inner: self.inner.clone(),
            chain_id: chain_id.to_string(),
        })
    }

    async fn get_authorized_key(&self, chain_id: &str) -> AnyResult<AuthorizedKey> {
        let (account, _) = self
            .inner
            .authorized_account(chain_id)?
            .ok_or_any(&format!("Chain {chain_id} is not authorized"))?;

        Ok(AuthorizedKey {
            name: self.inner.name.clone(),
            address: account.address,
            pub_key: account.pub_key,
        })
    }
}

impl Debug for LocalWalletProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWalletProvider")
            .field("name", &self.inner.name)
            .field("registered_chains", &self.registered_chains().unwrap_or_default())
            .finish()
    }
}

struct LocalSigner {
    inner: Arc<Inner>,
    chain_id: String,
}

#[async_trait]
impl OfflineSigner for LocalSigner {
    async fn get_accounts(&self) -> AnyResult<Vec<AccountData>> {
        Ok(self
            .inner
            .authorized_account(&self.chain_id)?
            .map(|(account, _)| vec![account])
            .unwrap_or_default())
    }

    async fn sign_direct(&self, signer_address: &AccountId, sign_doc: SignDoc) -> AnyResult<Raw> {
        let (account, sign_key) = self
            .inner
            .authorized_account(&self.chain_id)?
            .ok_or_any(&format!("Chain {} is not authorized", self.chain_id))?;

        if &account.address != signer_address {
            bail!("Signer address {signer_address} is not managed by this wallet");
        }

        sign_doc.sign(&sign_key).into_anyresult()
    }
}
