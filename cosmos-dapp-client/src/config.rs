use std::{path::Path, str::FromStr, sync::Arc, time::Duration};

use cosmrs::AccountId;
use serde::Deserialize;

use crate::{
    chain::ChainDescriptor,
    definitions::SUCCESS_DISPLAY_WINDOW,
    errors::ConfigError,
    executor::TransactionExecutor,
    msg::ContractAction,
    orchestrator::ClaimOrchestrator,
    signing::SigningClientFactory,
    tokens::{TokenCatalog, TokenEntry},
};

/// Contract of each dApp surface; a surface without address is disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContractAddresses {
    pub faucet: Option<String>,
    pub donate: Option<String>,
    pub swap: Option<String>,
}

/// Deployment configuration of the dApp surfaces, usually read from TOML:
///
/// ```toml
/// success_display_secs = 5
///
/// [chain]
/// chain_id = "pion-1"
/// chain_name = "Neutron Testnet"
/// rpc_endpoint = "https://rpc-palvus.pion-1.ntrn.tech"
/// rest_endpoint = "https://rest-palvus.pion-1.ntrn.tech"
/// grpc_endpoint = "http://grpc-palvus.pion-1.ntrn.tech:80"
/// address_prefix = "neutron"
/// denom = "untrn"
/// coin_denom = "NTRN"
/// decimals = 6
/// gas_price_amount = "0.025"
/// gas_adjustment = "1.3"
///
/// [contracts]
/// faucet = "neutron1..."
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DappConfig {
    pub chain: ChainDescriptor,
    #[serde(default)]
    pub contracts: ContractAddresses,
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
    #[serde(default = "default_success_display_secs")]
    pub success_display_secs: u64,
    pub memo: Option<String>,
}

fn default_success_display_secs() -> u64 {
    SUCCESS_DISPLAY_WINDOW.as_secs()
}

impl DappConfig {
    pub fn from_toml_str(raw: &str) -> Result<DappConfig, ConfigError> {
        let config: DappConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<DappConfig, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chain.validate()?;

        for action in [
            ContractAction::Claim,
            ContractAction::Donate,
            ContractAction::Swap,
        ] {
            if self.contract_address(action).is_some() {
                self.contract(action)?;
            }
        }

        Ok(())
    }

    fn contract_address(&self, action: ContractAction) -> Option<&String> {
        match action {
            ContractAction::Claim => self.contracts.faucet.as_ref(),
            ContractAction::Donate => self.contracts.donate.as_ref(),
            ContractAction::Swap => self.contracts.swap.as_ref(),
        }
    }

    /// Contract serving `action`, checked against the chain's address prefix.
    pub fn contract(&self, action: ContractAction) -> Result<AccountId, ConfigError> {
        let address = self
            .contract_address(action)
            .ok_or_else(|| ConfigError::InvalidAddress {
                address: String::new(),
                reason: format!("no contract configured for {action}"),
            })?;

        let invalid = |reason: String| ConfigError::InvalidAddress {
            address: address.clone(),
            reason,
        };

        let account = AccountId::from_str(address).map_err(|err| invalid(err.to_string()))?;
        if account.prefix() != self.chain.address_prefix {
            return Err(invalid(format!(
                "expected prefix {}",
                self.chain.address_prefix
            )));
        }

        Ok(account)
    }

    /// Configured tokens, or the Neutron testnet list when none are given.
    pub fn token_catalog(&self) -> TokenCatalog {
        if self.tokens.is_empty() {
            TokenCatalog::neutron_testnet()
        } else {
            TokenCatalog::new(self.tokens.clone())
        }
    }

    pub fn success_window(&self) -> Duration {
        Duration::from_secs(self.success_display_secs)
    }

    pub fn orchestrator(&self, factory: Arc<dyn SigningClientFactory>) -> ClaimOrchestrator {
        let executor = match &self.memo {
            Some(memo) => TransactionExecutor::new(factory).with_memo(memo.clone()),
            None => TransactionExecutor::new(factory),
        };

        ClaimOrchestrator::new(executor).with_success_window(self.success_window())
    }
}
