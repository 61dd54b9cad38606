//! Request handlers grouped by resource.

pub mod analysis;
pub mod market;
pub mod scheduler;
pub mod signal;
pub mod system;

use crate::domain::{Symbol, Timeframe};
use crate::error::Error;

use super::error::{ApiError, ApiResult};

/// Symbols in paths may use `-` or `_` in place of `/`.
pub(crate) fn path_symbol(raw: &str) -> ApiResult<Symbol> {
    Symbol::normalize(&raw.replace(['-', '_'], "/")).map_err(|e| Error::from(e).into())
}

pub(crate) fn parse_timeframe(raw: &str) -> ApiResult<Timeframe> {
    raw.parse().map_err(|e| ApiError::from(Error::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_symbols_accept_dash_separator() {
        assert_eq!(path_symbol("btc-usdt").unwrap().as_str(), "BTC/USDT");
        assert_eq!(path_symbol("SOLUSDT").unwrap().as_str(), "SOL/USDT");
        assert!(path_symbol("s!l").is_err());
    }
}
