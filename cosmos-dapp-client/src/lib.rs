mod chain;
mod client;
mod config;
mod definitions;
mod errors;
mod executor;
mod math;
mod msg;
mod orchestrator;
mod provider;
mod session;
mod signing;
mod timer;
mod tokens;
mod traits;
mod wallet;

#[cfg(test)]
mod mock;

pub use {
    crate::chain::{Bech32Config, Bip44, ChainDescriptor, ChainInfo, Currency, GasPrice},
    crate::client::{GrpcClient, GrpcSigningClient, GrpcSigningClientFactory, StandardClients},
    crate::config::{ContractAddresses, DappConfig},
    crate::definitions::*,
    crate::errors::{ConfigError, ExecuteError, ValidationError, WalletError},
    crate::executor::{classify_failure, parse_retry_after, TransactionExecutor},
    crate::math::{to_micro_units, IntoU64, IntoUint128},
    crate::msg::{BroadcastResult, ContractAction, ContractCallRequest, ExecuteMsg},
    crate::orchestrator::{ClaimOrchestrator, Dispatch, SurfaceState},
    crate::provider::{AccountData, AuthorizedKey, OfflineSigner, WalletProvider},
    crate::session::WalletSession,
    crate::signing::{ExecuteResponse, FeeMode, GasSettings, SigningClient, SigningClientFactory},
    crate::timer::{format_duration, CountdownEvent, CountdownHandle, RateLimitTimer},
    crate::tokens::{TokenCatalog, TokenEntry},
    crate::wallet::LocalWalletProvider,
    anyhow::Result as AnyResult,
    cosmos_sdk_proto, cosmrs,
    cosmwasm_std::{Coin, Decimal, Uint128},
    traits::*,
};
