use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    chain::ChainDescriptor,
    definitions::DEFAULT_CLAIM_MEMO,
    errors::{ExecuteError, WalletError},
    msg::{BroadcastResult, ContractAction, ContractCallRequest},
    session::WalletSession,
    signing::{FeeMode, GasSettings, SigningClientFactory},
};

/// Cooldown errors of the faucet contract read
/// `"Rate limit exceeded. You can claim again in 45 seconds"`. A delay in any
/// other error is not a cooldown.
static RATE_LIMIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Rate limit exceeded.*?in (\d+) seconds").expect("valid rate limit pattern")
});

pub fn parse_retry_after(message: &str) -> Option<u64> {
    RATE_LIMIT
        .captures(message)
        .and_then(|captures| captures.get(1))
        .and_then(|seconds| seconds.as_str().parse().ok())
}

/// Maps a failed broadcast to `RateLimited` or `Rejected`.
pub fn classify_failure(message: String) -> BroadcastResult {
    match parse_retry_after(&message) {
        Some(retry_after_seconds) => BroadcastResult::RateLimited {
            retry_after_seconds,
        },
        None => BroadcastResult::Rejected { message },
    }
}

/// Turns a `ContractCallRequest` into exactly one broadcast.
///
/// Nothing is retried, and neither the signer nor the signing client outlive
/// a call to [`TransactionExecutor::execute`].
pub struct TransactionExecutor {
    factory: Arc<dyn SigningClientFactory>,
    memo: Option<String>,
}

impl TransactionExecutor {
    pub fn new(factory: Arc<dyn SigningClientFactory>) -> TransactionExecutor {
        TransactionExecutor {
            factory,
            memo: None,
        }
    }

    /// Memo attached to every transaction instead of the per action default.
    pub fn with_memo(mut self, memo: impl Into<String>) -> TransactionExecutor {
        self.memo = Some(memo.into());
        self
    }

    fn memo_for(&self, action: ContractAction) -> Option<String> {
        match (&self.memo, action) {
            (Some(memo), _) => Some(memo.clone()),
            (None, ContractAction::Claim) => Some(DEFAULT_CLAIM_MEMO.to_string()),
            (None, _) => None,
        }
    }

    pub async fn execute(
        &self,
        session: &WalletSession,
        chain: &ChainDescriptor,
        req: &ContractCallRequest,
    ) -> Result<BroadcastResult, ExecuteError> {
        let Some(sender) = session.address().cloned() else {
            warn!(action = %req.action, "No wallet connected");
            return Ok(BroadcastResult::WalletUnavailable);
        };

        req.validate()?;

        let signer = match session.get_signer(chain) {
            Ok(signer) => signer,
            Err(err) => {
                warn!(action = %req.action, "No signer available: {err}");
                return Ok(BroadcastResult::WalletUnavailable);
            }
        };

        let client = self
            .factory
            .connect(chain.signing_endpoint(), signer, GasSettings::from(chain))
            .await
            .map_err(|err| WalletError::ConnectionFailed(format!("{err:#}")))?;

        let msg = serde_json_wasm::to_vec(&req.execute_msg(&sender))
            .map_err(|err| ExecuteError::Encode(err.to_string()))?;

        let funds = match req.action {
            ContractAction::Claim => vec![],
            _ => req.funds.clone(),
        };

        info!(
            action = %req.action,
            contract = %req.contract_address,
            sender = %sender,
            amount = req.amount_micro_units,
            "Submitting contract call"
        );

        let result = client
            .execute(
                &sender,
                &req.contract_address,
                msg,
                FeeMode::Auto,
                self.memo_for(req.action),
                funds,
            )
            .await;

        Ok(match result {
            Ok(res) => {
                info!(action = %req.action, tx_hash = %res.transaction_hash, "Contract call succeeded");
                BroadcastResult::Success {
                    tx_hash: res.transaction_hash,
                    raw: res.raw,
                }
            }
            Err(err) => {
                let outcome = classify_failure(format!("{err:#}"));
                warn!(action = %req.action, ?outcome, "Contract call failed");
                outcome
            }
        })
    }
}
