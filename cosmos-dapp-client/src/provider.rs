use std::sync::Arc;

use async_trait::async_trait;
use cosmrs::{
    crypto::PublicKey,
    tx::{Raw, SignDoc},
    AccountId,
};

use crate::{chain::ChainInfo, AnyResult};

#[derive(Debug, Clone, PartialEq)]
pub struct AccountData {
    pub address: AccountId,
    pub pub_key: PublicKey,
}

/// Key the provider authorized for a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizedKey {
    pub name: String,
    pub address: AccountId,
    pub pub_key: PublicKey,
}

/// Signs transactions for the accounts it exposes, without ever handing out
/// key material.
#[async_trait]
pub trait OfflineSigner: Send + Sync {
    /// Accounts currently available for signing. An account the user did not
    /// authorize yet is not listed.
    async fn get_accounts(&self) -> AnyResult<Vec<AccountData>>;

    async fn sign_direct(&self, signer_address: &AccountId, sign_doc: SignDoc) -> AnyResult<Raw>;
}

/// Wallet capability injected into a `WalletSession`.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Registers the chain. Registering a known chain again is a no-op.
    async fn register_chain(&self, chain_info: &ChainInfo) -> AnyResult<()>;

    /// Grants the dApp access to the chain, possibly asking the user.
    async fn authorize(&self, chain_id: &str) -> AnyResult<()>;

    fn get_signer(&self, chain_id: &str) -> Arc<dyn OfflineSigner>;

    async fn get_authorized_key(&self, chain_id: &str) -> AnyResult<AuthorizedKey>;
}
