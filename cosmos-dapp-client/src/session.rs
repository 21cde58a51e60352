use std::{fmt::Debug, sync::Arc};

use cosmrs::AccountId;
use tracing::{debug, info, warn};

use crate::{
    chain::ChainDescriptor,
    errors::WalletError,
    provider::{OfflineSigner, WalletProvider},
};

struct Connection {
    chain_id: String,
    address: AccountId,
    signer: Arc<dyn OfflineSigner>,
}

/// Connection of one dApp surface to a wallet provider.
///
/// The session is the only owner of the signer; callers borrow it per
/// transaction through [`WalletSession::get_signer`].
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    connection: Option<Connection>,
}

impl WalletSession {
    /// `None` models an environment without wallet extension.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>) -> WalletSession {
        WalletSession {
            provider,
            connection: None,
        }
    }

    pub fn with_provider(provider: Arc<dyn WalletProvider>) -> WalletSession {
        Self::new(Some(provider))
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn address(&self) -> Option<&AccountId> {
        self.connection.as_ref().map(|connection| &connection.address)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub async fn connect(&mut self, chain: &ChainDescriptor) -> Result<AccountId, WalletError> {
        let provider = self.provider.clone().ok_or(WalletError::NotInstalled)?;

        match Self::open(provider.as_ref(), chain).await {
            Ok(connection) => {
                info!(
                    chain_id = %chain.chain_id,
                    address = %connection.address,
                    "Wallet connected"
                );
                let address = connection.address.clone();
                self.connection = Some(connection);
                Ok(address)
            }
            Err(err) => {
                warn!(chain_id = %chain.chain_id, "Wallet connection failed: {err}");
                self.disconnect();
                Err(err)
            }
        }
    }

    async fn open(
        provider: &dyn WalletProvider,
        chain: &ChainDescriptor,
    ) -> Result<Connection, WalletError> {
        provider
            .register_chain(&chain.chain_info())
            .await
            .map_err(|err| WalletError::ConnectionFailed(format!("{err:#}")))?;

        provider.authorize(&chain.chain_id).await.map_err(|err| {
            debug!("Authorization refused: {err:#}");
            WalletError::NotConnected
        })?;

        let key = provider
            .get_authorized_key(&chain.chain_id)
            .await
            .map_err(|err| {
                debug!("No authorized key: {err:#}");
                WalletError::NotConnected
            })?;

        if key.address.prefix() != chain.address_prefix {
            return Err(WalletError::ConnectionFailed(format!(
                "address {} does not use prefix {}",
                key.address, chain.address_prefix
            )));
        }

        Ok(Connection {
            chain_id: chain.chain_id.clone(),
            address: key.address,
            signer: provider.get_signer(&chain.chain_id),
        })
    }

    /// Picks up an account the provider already authorized, without
    /// prompting. Not being authorized yet is a normal `None`.
    pub async fn restore_if_authorized(&mut self, chain: &ChainDescriptor) -> Option<AccountId> {
        let provider = self.provider.clone()?;
        let signer = provider.get_signer(&chain.chain_id);

        let accounts = match signer.get_accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                debug!(chain_id = %chain.chain_id, "No existing wallet connection: {err:#}");
                return None;
            }
        };

        let account = accounts
            .into_iter()
            .find(|account| account.address.prefix() == chain.address_prefix)?;

        info!(chain_id = %chain.chain_id, address = %account.address, "Wallet session restored");

        self.connection = Some(Connection {
            chain_id: chain.chain_id.clone(),
            address: account.address.clone(),
            signer,
        });

        Some(account.address)
    }

    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            info!(address = %connection.address, "Wallet disconnected");
        }
    }

    pub fn get_signer(&self, chain: &ChainDescriptor) -> Result<Arc<dyn OfflineSigner>, WalletError> {
        if self.provider.is_none() {
            return Err(WalletError::NotInstalled);
        }

        match &self.connection {
            Some(connection) if connection.chain_id == chain.chain_id => {
                Ok(connection.signer.clone())
            }
            _ => Err(WalletError::NotConnected),
        }
    }
}

impl Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("has_provider", &self.has_provider())
            .field("address", &self.address())
            .field(
                "chain_id",
                &self.connection.as_ref().map(|connection| &connection.chain_id),
            )
            .finish()
    }
}
