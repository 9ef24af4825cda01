//! Market state read from the pool contract
//!
//! The only external reads in event processing happen here, once per event
//! and before any entity is touched. Everything downstream consumes the
//! immutable [`MarketState`] snapshot.

use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::precision::{scale_amount, DecimalExt, TOKEN_DECIMALS};

/// Immutable token metadata, fetched once when the Bar is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub decimals: u8,
    pub name: String,
    pub symbol: String,
}

/// Pool reads at native precision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMarketState {
    /// Share token totalSupply()
    pub total_supply: u128,
    /// Underlying balanceOf(bar)
    pub staked: u128,
}

/// Decimal market snapshot used for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketState {
    pub total_supply: Decimal,
    pub staked: Decimal,
    /// Underlying units per share
    pub ratio: Decimal,
}

impl MarketState {
    pub fn from_raw(raw: RawMarketState) -> Result<Self> {
        let total_supply = scale_amount(raw.total_supply, TOKEN_DECIMALS)?;
        let staked = scale_amount(raw.staked, TOKEN_DECIMALS)?;
        Self::new(total_supply, staked)
    }

    pub fn new(total_supply: Decimal, staked: Decimal) -> Result<Self> {
        if total_supply.is_zero() {
            return Err(LedgerError::ZeroSupply);
        }
        let ratio = staked.try_div(total_supply)?;
        Ok(Self {
            total_supply,
            staked,
            ratio,
        })
    }

    /// Underlying value of a share amount at this snapshot's ratio
    pub fn underlying_value(&self, shares: Decimal) -> Result<Decimal> {
        Ok(shares.try_mul(self.ratio)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ONE: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_ratio_from_raw() {
        let market = MarketState::from_raw(RawMarketState {
            total_supply: 200 * ONE,
            staked: 300 * ONE,
        })
        .unwrap();

        assert_eq!(market.total_supply, dec!(200));
        assert_eq!(market.staked, dec!(300));
        assert_eq!(market.ratio, dec!(1.5));
        assert_eq!(market.underlying_value(dec!(100)).unwrap(), dec!(150));
    }

    #[test]
    fn test_zero_supply_is_fatal() {
        let err = MarketState::from_raw(RawMarketState {
            total_supply: 0,
            staked: 5 * ONE,
        })
        .unwrap_err();
        assert!(matches!(err, LedgerError::ZeroSupply));
    }
}
