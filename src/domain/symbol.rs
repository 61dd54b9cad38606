//! Trading pair symbols.
//!
//! Every pair the service tracks is quoted in USDT and stored in the
//! canonical `BASE/USDT` form. [`Symbol::normalize`] accepts the looser
//! spellings operators and collectors tend to send (`sol`, `SOLUSDT`,
//! `sol/usdt`) and maps them onto that form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::DomainError;

/// Quote currency shared by every tracked pair.
pub const QUOTE: &str = "USDT";

/// Pair used when a request does not name one.
pub const DEFAULT_SYMBOL: &str = "SOL/USDT";

const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("SOL", "Solana"),
    ("BTC", "Bitcoin"),
    ("ETH", "Ethereum"),
    ("BNB", "Binance Coin"),
    ("ADA", "Cardano"),
    ("DOT", "Polkadot"),
    ("AVAX", "Avalanche"),
    ("MATIC", "Polygon"),
    ("LINK", "Chainlink"),
    ("UNI", "Uniswap"),
    ("DOGE", "Dogecoin"),
    ("XRP", "Ripple"),
    ("LTC", "Litecoin"),
    ("ATOM", "Cosmos"),
    ("NEAR", "NEAR Protocol"),
    ("SHIB", "Shiba Inu"),
    ("PEPE", "Pepe"),
];

const POPULAR: &[&str] = &[
    "BTC/USDT",
    "ETH/USDT",
    "SOL/USDT",
    "BNB/USDT",
    "ADA/USDT",
    "DOT/USDT",
    "AVAX/USDT",
    "MATIC/USDT",
    "LINK/USDT",
    "UNI/USDT",
    "DOGE/USDT",
    "XRP/USDT",
    "LTC/USDT",
    "ATOM/USDT",
    "NEAR/USDT",
    "SHIB/USDT",
];

/// A normalized `BASE/USDT` trading pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    /// Normalize a user-supplied symbol into `BASE/USDT`.
    ///
    /// An empty (or whitespace-only) input yields [`DEFAULT_SYMBOL`]. A quote
    /// other than USDT is replaced, so `BTC/ETH` becomes `BTC/USDT`.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidSymbol`] when the base asset is empty or
    /// contains characters other than ASCII alphanumerics.
    pub fn normalize(raw: &str) -> Result<Self, DomainError> {
        let upper = raw.trim().to_ascii_uppercase();
        if upper.is_empty() {
            return Ok(Self::default_symbol());
        }

        let base = match upper.split_once('/') {
            Some((base, _quote)) => base.trim().to_string(),
            None => upper
                .strip_suffix(QUOTE)
                .map_or_else(|| upper.clone(), str::to_string),
        };

        if base.is_empty() || !base.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::InvalidSymbol { symbol: raw.to_string() });
        }

        Ok(Self(format!("{base}/{QUOTE}")))
    }

    /// The service-wide default pair.
    #[must_use]
    pub fn default_symbol() -> Self {
        Self(DEFAULT_SYMBOL.to_string())
    }

    /// Canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base asset (`SOL` for `SOL/USDT`).
    #[must_use]
    pub fn base(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }

    /// Human-friendly asset name, falling back to the base ticker.
    #[must_use]
    pub fn display_name(&self) -> &str {
        let base = self.base();
        DISPLAY_NAMES
            .iter()
            .find(|(ticker, _)| *ticker == base)
            .map_or(base, |(_, name)| *name)
    }

    /// Pairs offered to operators picking what to track.
    #[must_use]
    pub fn popular() -> Vec<Self> {
        POPULAR.iter().map(|s| Self((*s).to_string())).collect()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::normalize(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse a comma-separated symbol list, skipping blanks and duplicates.
///
/// # Errors
/// Returns the first normalization failure.
pub fn parse_list(raw: &str) -> Result<Vec<Symbol>, DomainError> {
    let mut symbols: Vec<Symbol> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let symbol = Symbol::normalize(part)?;
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> String {
        Symbol::normalize(raw).unwrap().to_string()
    }

    #[test]
    fn normalize_accepts_loose_spellings() {
        assert_eq!(norm("sol"), "SOL/USDT");
        assert_eq!(norm("SOLUSDT"), "SOL/USDT");
        assert_eq!(norm(" eth/usdt "), "ETH/USDT");
        assert_eq!(norm("BTC/USDT"), "BTC/USDT");
    }

    #[test]
    fn normalize_replaces_foreign_quote() {
        assert_eq!(norm("BTC/ETH"), "BTC/USDT");
    }

    #[test]
    fn empty_input_yields_default() {
        assert_eq!(norm(""), DEFAULT_SYMBOL);
        assert_eq!(norm("   "), DEFAULT_SYMBOL);
    }

    #[test]
    fn bare_quote_is_rejected() {
        assert!(matches!(
            Symbol::normalize("USDT"),
            Err(DomainError::InvalidSymbol { .. })
        ));
        assert!(Symbol::normalize("/USDT").is_err());
        assert!(Symbol::normalize("SO L").is_err());
    }

    #[test]
    fn display_names_fall_back_to_base() {
        assert_eq!(Symbol::normalize("sol").unwrap().display_name(), "Solana");
        assert_eq!(
            Symbol::normalize("near").unwrap().display_name(),
            "NEAR Protocol"
        );
        assert_eq!(Symbol::normalize("WIF").unwrap().display_name(), "WIF");
    }

    #[test]
    fn popular_pairs_are_canonical() {
        let popular = Symbol::popular();
        assert_eq!(popular.len(), 16);
        for symbol in popular {
            assert_eq!(Symbol::normalize(symbol.as_str()).unwrap(), symbol);
        }
    }

    #[test]
    fn parse_list_dedupes() {
        let list = parse_list("sol, SOLUSDT,btc,,").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].as_str(), "SOL/USDT");
        assert_eq!(list[1].as_str(), "BTC/USDT");
    }

    #[test]
    fn serde_normalizes_on_the_way_in() {
        let symbol: Symbol = serde_json::from_str("\"ethusdt\"").unwrap();
        assert_eq!(symbol.as_str(), "ETH/USDT");
        assert_eq!(serde_json::to_string(&symbol).unwrap(), "\"ETH/USDT\"");
    }
}
