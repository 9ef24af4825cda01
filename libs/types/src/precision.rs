//! Decimal Arithmetic for Share and Underlying Amounts
//!
//! Every monetary quantity, ratio and age accumulator in the indexer is a
//! [`rust_decimal::Decimal`]. On-chain integers arrive at native precision and
//! are scaled exactly once, at the boundary, by `10^decimals`.
//!
//! ## Critical Rules
//!
//! 1. **NO FLOATING POINT**: amounts, ratios and share-days are never `f64`
//! 2. **Checked Arithmetic Only**: overflow and division by zero are errors,
//!    never saturated, wrapped or turned into NaN
//! 3. **Scale Once**: raw values are converted with [`scale_amount`] and stay
//!    in decimal form afterwards
//! 4. **Monotonic Clock**: [`days_between`] refuses a timestamp that moves
//!    backwards, so age accumulators cannot shrink through clock skew
//!
//! ## Example Usage
//!
//! ```rust
//! use types::precision::{scale_amount, DecimalExt};
//!
//! let value = scale_amount(1_500_000_000_000_000_000, 18).unwrap(); // 1.5 shares
//! let ratio = scale_amount(2_000_000_000_000_000_000, 18).unwrap();
//! assert_eq!(value.try_mul(ratio).unwrap(), rust_decimal::Decimal::from(3));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

/// Length of one History bucket and the unit of the age accumulators
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Native precision of the share token and of the underlying asset
pub const TOKEN_DECIMALS: u8 = 18;

/// Largest scale `rust_decimal` can represent
const MAX_SCALE: u8 = 28;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrecisionError {
    #[error("Value overflow: {0}")]
    Overflow(String),

    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    #[error("Unsupported decimals: {0}")]
    UnsupportedDecimals(u8),

    #[error("Clock moved backwards: last update {last_update}, event {event_time}")]
    ClockRegression { last_update: u64, event_time: u64 },
}

pub type Result<T> = std::result::Result<T, PrecisionError>;

/// Convert a native-precision integer into a decimal amount
pub fn scale_amount(raw: u128, decimals: u8) -> Result<Decimal> {
    if decimals > MAX_SCALE {
        return Err(PrecisionError::UnsupportedDecimals(decimals));
    }
    let signed = i128::try_from(raw).map_err(|_| PrecisionError::Overflow(raw.to_string()))?;
    Decimal::try_from_i128_with_scale(signed, decimals as u32)
        .map(|d| d.normalize())
        .map_err(|_| PrecisionError::Overflow(raw.to_string()))
}

/// Elapsed time between two unix timestamps, expressed in (fractional) days
pub fn days_between(last_update: u64, event_time: u64) -> Result<Decimal> {
    if event_time < last_update {
        return Err(PrecisionError::ClockRegression {
            last_update,
            event_time,
        });
    }
    Decimal::from(event_time - last_update).try_div(Decimal::from(SECONDS_PER_DAY))
}

/// Day number since the unix epoch (History bucket key)
pub fn day_bucket(timestamp: u64) -> u64 {
    timestamp / SECONDS_PER_DAY
}

/// Start-of-day timestamp for a bucket
pub fn day_start(day: u64) -> u64 {
    day * SECONDS_PER_DAY
}

/// Checked arithmetic returning [`PrecisionError`] instead of `Option`
pub trait DecimalExt: Sized {
    fn try_add(self, rhs: Self) -> Result<Self>;
    fn try_sub(self, rhs: Self) -> Result<Self>;
    fn try_mul(self, rhs: Self) -> Result<Self>;
    fn try_div(self, rhs: Self) -> Result<Self>;
}

impl DecimalExt for Decimal {
    fn try_add(self, rhs: Self) -> Result<Self> {
        self.checked_add(rhs)
            .ok_or_else(|| PrecisionError::Overflow(format!("{} + {}", self, rhs)))
    }

    fn try_sub(self, rhs: Self) -> Result<Self> {
        self.checked_sub(rhs)
            .ok_or_else(|| PrecisionError::Overflow(format!("{} - {}", self, rhs)))
    }

    fn try_mul(self, rhs: Self) -> Result<Self> {
        self.checked_mul(rhs)
            .ok_or_else(|| PrecisionError::Overflow(format!("{} * {}", self, rhs)))
    }

    fn try_div(self, rhs: Self) -> Result<Self> {
        if rhs.is_zero() {
            return Err(PrecisionError::DivisionByZero(format!("{} / 0", self)));
        }
        self.checked_div(rhs)
            .ok_or_else(|| PrecisionError::Overflow(format!("{} / {}", self, rhs)))
    }
}
