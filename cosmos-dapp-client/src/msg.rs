use std::fmt::Display;

use cosmos_sdk_proto::cosmos::base::abci::v1beta1::TxResponse;
use cosmrs::AccountId;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{coin, Coin, Uint128};

use crate::{chain::ChainDescriptor, errors::ValidationError, math::to_micro_units};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractAction {
    Claim,
    Donate,
    Swap,
}

impl ContractAction {
    pub fn tag(&self) -> &'static str {
        match self {
            ContractAction::Claim => "claim",
            ContractAction::Donate => "donate",
            ContractAction::Swap => "swap",
        }
    }

    /// Donate and swap move funds, claim does not.
    pub fn carries_amount(&self) -> bool {
        !matches!(self, ContractAction::Claim)
    }
}

impl Display for ContractAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Execute message understood by the faucet, donation and swap contracts.
///
/// Targets contracts that take an explicit `recipient` on every action,
/// `{"claim":{"recipient":"neutron1..."}}`. A faucet declaring a bare
/// `Claim {}` under `deny_unknown_fields` rejects this shape.
#[cw_serde]
pub enum ExecuteMsg {
    Claim {
        recipient: String,
    },
    Donate {
        recipient: String,
        amount_in: Uint128,
    },
    Swap {
        recipient: String,
        amount_in: Uint128,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCallRequest {
    pub contract_address: AccountId,
    pub action: ContractAction,
    /// Defaults to the connected account
    pub recipient: Option<AccountId>,
    pub amount_micro_units: u64,
    pub funds: Vec<Coin>,
}

impl ContractCallRequest {
    pub fn claim(contract_address: AccountId) -> ContractCallRequest {
        ContractCallRequest {
            contract_address,
            action: ContractAction::Claim,
            recipient: None,
            amount_micro_units: 0,
            funds: vec![],
        }
    }

    pub fn donate(
        contract_address: AccountId,
        recipient: Option<AccountId>,
        amount: &str,
        chain: &ChainDescriptor,
    ) -> Result<ContractCallRequest, ValidationError> {
        Self::with_amount(ContractAction::Donate, contract_address, recipient, amount, chain)
    }

    pub fn swap(
        contract_address: AccountId,
        recipient: Option<AccountId>,
        amount: &str,
        chain: &ChainDescriptor,
    ) -> Result<ContractCallRequest, ValidationError> {
        Self::with_amount(ContractAction::Swap, contract_address, recipient, amount, chain)
    }

    /// Normalizes `amount` to micro units and attaches it as native funds.
    pub fn with_amount(
        action: ContractAction,
        contract_address: AccountId,
        recipient: Option<AccountId>,
        amount: &str,
        chain: &ChainDescriptor,
    ) -> Result<ContractCallRequest, ValidationError> {
        let amount_micro_units = to_micro_units(amount, chain.decimals)?;

        Ok(ContractCallRequest {
            contract_address,
            action,
            recipient,
            amount_micro_units,
            funds: vec![coin(amount_micro_units as u128, &chain.denom)],
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.action.carries_amount() && self.amount_micro_units == 0 {
            return Err(ValidationError::NonPositiveAmount);
        }

        Ok(())
    }

    pub fn execute_msg(&self, sender: &AccountId) -> ExecuteMsg {
        let recipient = self.recipient.as_ref().unwrap_or(sender).to_string();
        let amount_in = Uint128::from(self.amount_micro_units);

        match self.action {
            ContractAction::Claim => ExecuteMsg::Claim { recipient },
            ContractAction::Donate => ExecuteMsg::Donate {
                recipient,
                amount_in,
            },
            ContractAction::Swap => ExecuteMsg::Swap {
                recipient,
                amount_in,
            },
        }
    }
}

/// Outcome of one executed `ContractCallRequest`.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastResult {
    Success { tx_hash: String, raw: TxResponse },
    /// The contract refused because of its cooldown
    RateLimited { retry_after_seconds: u64 },
    Rejected { message: String },
    WalletUnavailable,
}
