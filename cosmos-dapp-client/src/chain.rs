use std::{fmt::Display, str::FromStr};

use cosmwasm_std::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    definitions::{
        NEUTRON_TESTNET_CHAIN_ID, NEUTRON_TESTNET_GRPC, NEUTRON_TESTNET_REST, NEUTRON_TESTNET_RPC,
    },
    errors::ConfigError,
    CoinType,
};

/// Largest `decimals` a currency may declare; `10^18` is the last power of
/// ten representable in `u64` micro units with headroom.
pub const MAX_DECIMALS: u32 = 18;

/// Static description of the chain a dApp surface talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub chain_id: String,
    pub chain_name: String,
    /// Tendermint RPC endpoint, advertised to the wallet provider
    pub rpc_endpoint: Url,
    pub rest_endpoint: Url,
    /// Cosmos gRPC endpoint, preferred by the signing client when set
    #[serde(default)]
    pub grpc_endpoint: Option<Url>,
    /// Bech32 human readable part of account addresses
    pub address_prefix: String,
    /// Minimal denomination (`untrn`)
    pub denom: String,
    /// Display denomination (`NTRN`)
    pub coin_denom: String,
    pub decimals: u32,
    #[serde(default = "default_coin_type")]
    pub coin_type: u64,
    pub gas_price_amount: Decimal,
    pub gas_adjustment: Decimal,
}

fn default_coin_type() -> u64 {
    CoinType::Cosmos.into()
}

impl ChainDescriptor {
    pub fn neutron_testnet() -> Result<ChainDescriptor, ConfigError> {
        let parse = |url: &str| {
            Url::parse(url).map_err(|err| ConfigError::InvalidChain(format!("{url}: {err}")))
        };

        let chain = ChainDescriptor {
            chain_id: NEUTRON_TESTNET_CHAIN_ID.to_string(),
            chain_name: "Neutron Testnet".to_string(),
            rpc_endpoint: parse(NEUTRON_TESTNET_RPC)?,
            rest_endpoint: parse(NEUTRON_TESTNET_REST)?,
            grpc_endpoint: Some(parse(NEUTRON_TESTNET_GRPC)?),
            address_prefix: "neutron".to_string(),
            denom: "untrn".to_string(),
            coin_denom: "NTRN".to_string(),
            decimals: 6,
            coin_type: CoinType::Cosmos.into(),
            gas_price_amount: Decimal::permille(25),
            gas_adjustment: Decimal::percent(130),
        };

        chain.validate()?;
        Ok(chain)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| Err(ConfigError::InvalidChain(reason.to_string()));

        if self.chain_id.trim().is_empty() {
            return invalid("chain_id is empty");
        }
        if self.address_prefix.trim().is_empty() {
            return invalid("address_prefix is empty");
        }
        if self.denom.trim().is_empty() {
            return invalid("denom is empty");
        }
        if self.decimals > MAX_DECIMALS {
            return invalid("decimals is greater than 18");
        }
        if self.gas_price_amount.is_zero() {
            return invalid("gas_price_amount must be greater than 0");
        }
        if self.gas_adjustment.is_zero() {
            return invalid("gas_adjustment must be greater than 0");
        }

        Ok(())
    }

    /// Endpoint handed to the signing client factory.
    pub fn signing_endpoint(&self) -> &Url {
        self.grpc_endpoint.as_ref().unwrap_or(&self.rpc_endpoint)
    }

    pub fn gas_price(&self) -> GasPrice {
        GasPrice {
            amount: self.gas_price_amount,
            denom: self.denom.clone(),
        }
    }

    /// Payload used to register this chain with a wallet provider.
    pub fn chain_info(&self) -> ChainInfo {
        let currency = Currency {
            coin_denom: self.coin_denom.clone(),
            coin_minimal_denom: self.denom.clone(),
            coin_decimals: self.decimals,
        };

        ChainInfo {
            chain_id: self.chain_id.clone(),
            chain_name: self.chain_name.clone(),
            rpc: self.rpc_endpoint.to_string(),
            rest: self.rest_endpoint.to_string(),
            bip44: Bip44 {
                coin_type: self.coin_type,
            },
            bech32_config: Bech32Config::from_prefix(&self.address_prefix),
            currencies: vec![currency.clone()],
            fee_currencies: vec![currency.clone()],
            stake_currency: currency,
            gas_prices: self.gas_price().to_string(),
            gas_adjustment: self.gas_adjustment,
        }
    }
}

/// Price of one unit of gas, `"0.025untrn"` in text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPrice {
    pub amount: Decimal,
    pub denom: String,
}

impl Display for GasPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for GasPrice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidGasPrice(s.to_string());

        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let (amount, denom) = s.split_at(split);

        let amount = Decimal::from_str(amount).map_err(|_| invalid())?;
        if amount.is_zero() || denom.is_empty() {
            return Err(invalid());
        }

        Ok(GasPrice {
            amount,
            denom: denom.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub chain_id: String,
    pub chain_name: String,
    pub rpc: String,
    pub rest: String,
    pub bip44: Bip44,
    pub bech32_config: Bech32Config,
    pub currencies: Vec<Currency>,
    pub fee_currencies: Vec<Currency>,
    pub stake_currency: Currency,
    pub gas_prices: String,
    pub gas_adjustment: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bip44 {
    pub coin_type: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bech32Config {
    pub bech32_prefix_acc_addr: String,
    pub bech32_prefix_acc_pub: String,
    pub bech32_prefix_val_addr: String,
    pub bech32_prefix_val_pub: String,
    pub bech32_prefix_cons_addr: String,
    pub bech32_prefix_cons_pub: String,
}

impl Bech32Config {
    pub fn from_prefix(prefix: &str) -> Self {
        Bech32Config {
            bech32_prefix_acc_addr: prefix.to_string(),
            bech32_prefix_acc_pub: format!("{prefix}pub"),
            bech32_prefix_val_addr: format!("{prefix}valoper"),
            bech32_prefix_val_pub: format!("{prefix}valoperpub"),
            bech32_prefix_cons_addr: format!("{prefix}valcons"),
            bech32_prefix_cons_pub: format!("{prefix}valconspub"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub coin_denom: String,
    pub coin_minimal_denom: String,
    pub coin_decimals: u32,
}
