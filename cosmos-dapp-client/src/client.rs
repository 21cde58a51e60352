use std::{fmt::Debug, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use cosmos_sdk_proto::cosmos::{
    auth::v1beta1::{query_client::QueryClient as AuthClient, BaseAccount, QueryAccountRequest},
    base::{
        abci::v1beta1::TxResponse,
        tendermint::v1beta1::{service_client::ServiceClient as TendermintClient, GetNodeInfoRequest},
    },
    tx::v1beta1::{
        service_client::ServiceClient as TxClient, BroadcastTxRequest, GetTxRequest,
        SimulateRequest,
    },
};
use cosmrs::{
    cosmwasm::MsgExecuteContract,
    tendermint::chain,
    tx::{Fee, Msg, Raw, SignDoc, SignerInfo},
    AccountId, Any, Denom,
};
use cosmwasm_std::Coin;
use prost::Message;
use tonic::{transport::Channel, Code};
use tracing::{debug, info};
use url::Url;

use crate::{
    definitions::BroadcastMode,
    math::{IntoU64, IntoUint128},
    provider::{AccountData, OfflineSigner},
    signing::{ExecuteResponse, FeeMode, GasSettings, SigningClient, SigningClientFactory},
    traits::{IntoAnyhowResult, OkOrAny},
    AnyResult,
};

const TX_POLL_INTERVAL: Duration = Duration::from_secs(1);
const TX_POLL_ATTEMPTS: u32 = 60;

#[derive(Clone)]
pub struct StandardClients {
    pub auth: AuthClient<Channel>,
    pub tendermint: TendermintClient<Channel>,
    pub tx: TxClient<Channel>,
}

#[non_exhaustive]
#[derive(Clone)]
pub struct GrpcClient {
    pub chain_id: String,
    /// Standard cosmos_sdk query clients definition
    pub clients: StandardClients,
}

impl GrpcClient {
    pub async fn new(gprc_addres: impl Into<String>) -> AnyResult<GrpcClient> {
        let channel = Channel::builder(Into::<String>::into(gprc_addres).parse()?)
            .connect()
            .await?;

        Self::build(channel).await
    }

    async fn build(channel: Channel) -> AnyResult<GrpcClient> {
        let mut tendermint_client = TendermintClient::new(channel.clone());

        let chain_id = tendermint_client
            .get_node_info(GetNodeInfoRequest {})
            .await?
            .into_inner()
            .default_node_info
            .ok_or(anyhow!("No node info"))?
            .network;

        Ok(GrpcClient {
            chain_id,
            clients: StandardClients {
                auth: AuthClient::new(channel.clone()),
                tendermint: tendermint_client,
                tx: TxClient::new(channel),
            },
        })
    }

    /// Account number and sequence, `(0, 0)` for an account the chain never saw.
    pub async fn account_info(&self, address: &AccountId) -> AnyResult<(u64, u64)> {
        let raw_res = self
            .clients
            .auth
            .clone()
            .account(QueryAccountRequest {
                address: address.to_string(),
            })
            .await
            .map(|res| res.into_inner());

        Ok(match raw_res {
            Ok(raw_res) => BaseAccount::decode(
                &raw_res
                    .account
                    .ok_or_any("Error unwrapping None in raw_res.account")?
                    .value[..],
            )
            .map(|res| (res.account_number, res.sequence))
            .unwrap_or((0, 0)),
            Err(_) => (0, 0),
        })
    }

    /// Polls until the transaction is part of a block.
    pub async fn wait_for_tx(&self, tx_hash: &str) -> AnyResult<TxResponse> {
        let mut tx = self.clients.tx.clone();

        for _ in 0..TX_POLL_ATTEMPTS {
            match tx
                .get_tx(GetTxRequest {
                    hash: tx_hash.to_string(),
                })
                .await
            {
                Ok(res) => {
                    if let Some(tx_response) = res.into_inner().tx_response {
                        return Ok(tx_response);
                    }
                }
                Err(status) if status.code() == Code::NotFound => {}
                Err(status) => return Err(status.into()),
            }

            tokio::time::sleep(TX_POLL_INTERVAL).await;
        }

        bail!("Transaction {tx_hash} was not included in a block in time")
    }
}

/// Signing client over gRPC. Keys never leave the signer, the client only
/// assembles, simulates and broadcasts.
pub struct GrpcSigningClient {
    client: GrpcClient,
    signer: Arc<dyn OfflineSigner>,
    gas: GasSettings,
}

impl GrpcSigningClient {
    pub fn new(client: GrpcClient, signer: Arc<dyn OfflineSigner>, gas: GasSettings) -> Self {
        GrpcSigningClient { client, signer, gas }
    }

    async fn signer_account(&self, sender: &AccountId) -> AnyResult<AccountData> {
        self.signer
            .get_accounts()
            .await?
            .into_iter()
            .find(|account| &account.address == sender)
            .ok_or_any(&format!("Signer does not manage {sender}"))
    }

    fn auto_fee(&self, gas_used: u64) -> AnyResult<Fee> {
        let gas_limit = (gas_used.as_uint128() * self.gas.adjustment).as_u64()?;

        Ok(Fee {
            amount: vec![cosmrs::Coin {
                denom: Denom::from_str(&self.gas.price.denom).into_anyresult()?,
                amount: gas_limit
                    .as_uint128()
                    .checked_mul_ceil(self.gas.price.amount)?
                    .u128(),
            }],
            gas_limit,
            payer: None,
            granter: None,
        })
    }

    #[allow(deprecated)]
    async fn simulate(
        &self,
        account: &AccountData,
        msgs: Vec<Any>,
        memo: &str,
        account_number: u64,
        sequence: u64,
    ) -> AnyResult<u64> {
        let tx = self
            .create_tx(
                account,
                msgs,
                Fee {
                    amount: vec![],
                    gas_limit: 0,
                    granter: None,
                    payer: None,
                },
                memo,
                account_number,
                sequence,
            )
            .await?;

        let request = SimulateRequest {
            tx: None,
            tx_bytes: tx.to_bytes().into_anyresult()?,
        };

        Ok(self
            .client
            .clients
            .tx
            .clone()
            .simulate(request)
            .await?
            .into_inner()
            .gas_info
            .ok_or(anyhow!("No gas info in response"))?
            .gas_used)
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_tx(
        &self,
        account: &AccountData,
        msgs: Vec<Any>,
        fee: Fee,
        memo: &str,
        account_number: u64,
        sequence: u64,
    ) -> AnyResult<Raw> {
        let tx_body = cosmrs::tx::BodyBuilder::new().msgs(msgs).memo(memo).finish();

        let auth_info = SignerInfo::single_direct(Some(account.pub_key), sequence).auth_info(fee);

        let sign_doc = SignDoc::new(
            &tx_body,
            &auth_info,
            &self.client.chain_id.parse::<chain::Id>().into_anyresult()?,
            account_number,
        )
        .into_anyresult()?;

        self.signer.sign_direct(&account.address, sign_doc).await
    }
}

fn into_cosmrs_coin(coin: &Coin) -> AnyResult<cosmrs::Coin> {
    Ok(cosmrs::Coin {
        denom: Denom::from_str(&coin.denom).into_anyresult()?,
        amount: coin.amount.u128(),
    })
}

#[async_trait]
impl SigningClient for GrpcSigningClient {
    async fn execute(
        &self,
        sender: &AccountId,
        contract: &AccountId,
        msg: Vec<u8>,
        fee: FeeMode,
        memo: Option<String>,
        funds: Vec<Coin>,
    ) -> AnyResult<ExecuteResponse> {
        let account = self.signer_account(sender).await?;
        let (account_number, sequence) = self.client.account_info(sender).await?;
        let memo = memo.unwrap_or_default();

        let msgs = vec![MsgExecuteContract {
            sender: sender.clone(),
            contract: contract.clone(),
            msg,
            funds: funds
                .iter()
                .map(into_cosmrs_coin)
                .collect::<AnyResult<Vec<_>>>()?,
        }
        .to_any()
        .into_anyresult()?];

        let fee = match fee {
            FeeMode::Auto => {
                let gas_used = self
                    .simulate(&account, msgs.clone(), &memo, account_number, sequence)
                    .await?;
                debug!(gas_used, "Simulated contract execution");
                self.auto_fee(gas_used)?
            }
            FeeMode::Fixed { gas_limit, amount } => Fee {
                amount: amount
                    .iter()
                    .map(into_cosmrs_coin)
                    .collect::<AnyResult<Vec<_>>>()?,
                gas_limit,
                payer: None,
                granter: None,
            },
        };

        let request = BroadcastTxRequest {
            tx_bytes: self
                .create_tx(&account, msgs, fee, &memo, account_number, sequence)
                .await?
                .to_bytes()
                .into_anyresult()?,
            mode: BroadcastMode::Sync.repr(),
        };

        let res = self
            .client
            .clients
            .tx
            .clone()
            .broadcast_tx(request)
            .await?
            .into_inner()
            .tx_response
            .ok_or_any("No tx_response in broadcast response")?;

        if res.code != 0 {
            bail!("Broadcasting transaction failed with code {}: {}", res.code, res.raw_log);
        }

        let raw = self.client.wait_for_tx(&res.txhash).await?;
        if raw.code != 0 {
            bail!("Transaction {} failed with code {}: {}", raw.txhash, raw.code, raw.raw_log);
        }

        info!(tx_hash = %raw.txhash, height = raw.height, "Contract executed");

        Ok(ExecuteResponse {
            transaction_hash: raw.txhash.clone(),
            raw,
        })
    }
}

impl Debug for GrpcSigningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcSigningClient")
            .field("chain_id", &self.client.chain_id)
            .field("gas_price", &format!("{}", &self.gas.price))
            .field("gas_adjustment", &format!("{}", &self.gas.adjustment))
            .finish()
    }
}

/// Opens a fresh gRPC channel per connect.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrpcSigningClientFactory;

#[async_trait]
impl SigningClientFactory for GrpcSigningClientFactory {
    async fn connect(
        &self,
        endpoint: &Url,
        signer: Arc<dyn OfflineSigner>,
        gas: GasSettings,
    ) -> AnyResult<Box<dyn SigningClient>> {
        let client = GrpcClient::new(endpoint.as_str()).await?;
        debug!(chain_id = %client.chain_id, endpoint = %endpoint, "Signing client connected");

        Ok(Box::new(GrpcSigningClient::new(client, signer, gas)))
    }
}
