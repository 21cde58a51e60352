use std::time::Duration;

use enum_repr::EnumRepr;

pub const LOCAL_NODE_GPRC: &str = "http://localhost:9090";

pub const NEUTRON_TESTNET_CHAIN_ID: &str = "pion-1";
pub const NEUTRON_TESTNET_RPC: &str = "https://rpc-palvus.pion-1.ntrn.tech";
pub const NEUTRON_TESTNET_REST: &str = "https://rest-palvus.pion-1.ntrn.tech";
pub const NEUTRON_TESTNET_GRPC: &str = "http://grpc-palvus.pion-1.ntrn.tech:80";

pub const NEUTRON_TESTNET_FAUCET: &str =
    "neutron1w0ls4rscaug5gz30envteezu2yfug2ychs3ts204rzmrfr66g7dss2qlt7";
pub const NEUTRON_TESTNET_DONATE: &str =
    "neutron1ukzxaw7s83ej38sk2kdf2f5sam60uexeganwlxdksj7x4us4js6sa4ekw6";

/// How long a success notice stays visible before the orchestrator clears it.
pub const SUCCESS_DISPLAY_WINDOW: Duration = Duration::from_secs(5);

/// Countdown resolution.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

pub const DEFAULT_CLAIM_MEMO: &str = "Claiming tokens";

#[EnumRepr(type = "i32")]
pub enum BroadcastMode {
    Block = 1,
    Sync = 2,
    Async = 3,
}

#[derive(Clone)]
#[EnumRepr(type = "u64")]
pub enum CoinType {
    Injective = 60,
    Cosmos = 118,
    Terra = 330,
}

impl From<CoinType> for u64 {
    fn from(val: CoinType) -> Self {
        val as u64
    }
}
