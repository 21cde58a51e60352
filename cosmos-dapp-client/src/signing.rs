use std::sync::Arc;

use async_trait::async_trait;
use cosmos_sdk_proto::cosmos::base::abci::v1beta1::TxResponse;
use cosmrs::AccountId;
use cosmwasm_std::{Coin, Decimal};
use url::Url;

use crate::{
    chain::{ChainDescriptor, GasPrice},
    provider::OfflineSigner,
    AnyResult,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasSettings {
    pub price: GasPrice,
    /// Multiplier applied to the simulated gas usage
    pub adjustment: Decimal,
}

impl From<&ChainDescriptor> for GasSettings {
    fn from(chain: &ChainDescriptor) -> Self {
        GasSettings {
            price: chain.gas_price(),
            adjustment: chain.gas_adjustment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeMode {
    /// Simulate the transaction and derive gas limit and fee from the result
    Auto,
    Fixed { gas_limit: u64, amount: Vec<Coin> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteResponse {
    pub transaction_hash: String,
    pub raw: TxResponse,
}

/// Client able to sign and broadcast contract executions for one signer.
///
/// Errors are returned as reported by the chain, so callers can inspect the
/// message text.
#[async_trait]
pub trait SigningClient: Send + Sync {
    async fn execute(
        &self,
        sender: &AccountId,
        contract: &AccountId,
        msg: Vec<u8>,
        fee: FeeMode,
        memo: Option<String>,
        funds: Vec<Coin>,
    ) -> AnyResult<ExecuteResponse>;
}

#[async_trait]
pub trait SigningClientFactory: Send + Sync {
    async fn connect(
        &self,
        endpoint: &Url,
        signer: Arc<dyn OfflineSigner>,
        gas: GasSettings,
    ) -> AnyResult<Box<dyn SigningClient>>;
}
