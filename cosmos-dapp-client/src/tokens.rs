use serde::{Deserialize, Serialize};

const CW20_PREFIX: &str = "cw20:";

/// Token handed out by the faucet, as listed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Native denom, or `cw20:<contract address>`
    pub denom: String,
    pub symbol: String,
    pub name: String,
    /// Human readable amount given per claim
    pub claim_amount: String,
    #[serde(default)]
    pub is_native: bool,
}

impl TokenEntry {
    pub fn cw20_contract(&self) -> Option<&str> {
        self.denom.strip_prefix(CW20_PREFIX)
    }
}

/// Read-only token list; the core never fetches or mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCatalog {
    tokens: Vec<TokenEntry>,
}

impl TokenCatalog {
    pub fn new(tokens: Vec<TokenEntry>) -> TokenCatalog {
        TokenCatalog { tokens }
    }

    pub fn neutron_testnet() -> TokenCatalog {
        let entry = |denom: &str, symbol: &str, name: &str, claim_amount: &str, is_native| {
            TokenEntry {
                denom: denom.to_string(),
                symbol: symbol.to_string(),
                name: name.to_string(),
                claim_amount: claim_amount.to_string(),
                is_native,
            }
        };

        TokenCatalog::new(vec![
            entry("untrn", "NTRN", "Neutron", "0.1", true),
            entry(
                "cw20:neutron1he6zd5kk03cs5ywxk5tth9qfewxwnh7k9hjwekr7gs9gl9argadsqdc9rp",
                "tNGN",
                "Test Nigerian Naira",
                "1",
                false,
            ),
            entry(
                "cw20:neutron1sr60e2velepytzsdyuutcmccl9n2p2lu3pjcggllxyc9rzyu562sqegazj",
                "tATOM",
                "Test Cosmos Hub",
                "100",
                false,
            ),
        ])
    }

    pub fn tokens(&self) -> &[TokenEntry] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn by_denom(&self, denom: &str) -> Option<&TokenEntry> {
        self.tokens.iter().find(|token| token.denom == denom)
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&TokenEntry> {
        self.tokens
            .iter()
            .find(|token| token.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn native(&self) -> impl Iterator<Item = &TokenEntry> {
        self.tokens.iter().filter(|token| token.is_native)
    }
}
