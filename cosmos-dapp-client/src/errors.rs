use thiserror::Error;

/// Bad user input, detected before any wallet or network interaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Amount must be greater than 0")]
    NonPositiveAmount,

    #[error("Invalid amount: {0}")]
    MalformedAmount(String),

    #[error("Amount has more than {decimals} fractional digits")]
    TooManyDecimals { decimals: u32 },

    #[error("Amount is too large")]
    AmountOverflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No wallet provider is available; the user has to install one.
    #[error("Please install a wallet extension")]
    NotInstalled,

    #[error("Please connect your wallet first")]
    NotConnected,

    #[error("Wallet connection failed: {0}")]
    ConnectionFailed(String),
}

/// Failures of `TransactionExecutor::execute` that are not a broadcast outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("Failed to encode contract message: {0}")]
    Encode(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid chain descriptor: {0}")]
    InvalidChain(String),

    #[error("Invalid gas price {0:?}")]
    InvalidGasPrice(String),

    #[error("Invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}
