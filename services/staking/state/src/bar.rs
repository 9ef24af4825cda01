//! Pool State (Bar)
//!
//! Singleton record for the whole staking pool. Supply, staked balance and
//! ratio are overwritten from the pool contract at the start of every event;
//! the cumulative counters and the share-day accumulators only change on
//! mint and burn.

use crate::error::Result;
use crate::market::{MarketState, TokenMetadata};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::precision::{days_between, DecimalExt};
use types::Address;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub id: Address,
    pub decimals: u8,
    pub name: String,
    pub symbol: String,

    #[serde(rename = "totalSupply")]
    pub total_supply: Decimal,
    #[serde(rename = "UNNStaked")]
    pub unn_staked: Decimal,
    #[serde(rename = "ratio")]
    pub ratio: Decimal,

    #[serde(rename = "UNNHarvested")]
    pub unn_harvested: Decimal,
    #[serde(rename = "xUNNMinted")]
    pub xunn_minted: Decimal,
    #[serde(rename = "xUNNBurned")]
    pub xunn_burned: Decimal,

    /// Share-days accumulated by all holders
    #[serde(rename = "xUNNAge")]
    pub xunn_age: Decimal,
    #[serde(rename = "xUNNAgeDestroyed")]
    pub xunn_age_destroyed: Decimal,

    #[serde(rename = "updatedAt")]
    pub updated_at: u64,
}

impl Bar {
    pub fn new(id: Address, metadata: TokenMetadata, created_at: u64) -> Self {
        Self {
            id,
            decimals: metadata.decimals,
            name: metadata.name,
            symbol: metadata.symbol,
            total_supply: Decimal::ZERO,
            unn_staked: Decimal::ZERO,
            ratio: Decimal::ZERO,
            unn_harvested: Decimal::ZERO,
            xunn_minted: Decimal::ZERO,
            xunn_burned: Decimal::ZERO,
            xunn_age: Decimal::ZERO,
            xunn_age_destroyed: Decimal::ZERO,
            updated_at: created_at,
        }
    }

    /// Overwrite supply, staked and ratio from the pool contract
    pub fn refresh(&mut self, market: &MarketState) {
        self.total_supply = market.total_supply;
        self.unn_staked = market.staked;
        self.ratio = market.ratio;
    }

    /// Shares outstanding according to the bar's own counters
    pub fn outstanding(&self) -> Result<Decimal> {
        Ok(self.xunn_minted.try_sub(self.xunn_burned)?)
    }

    /// Share-days accrued since the last mint or burn, at the pre-event supply
    fn accrued_age(&self, timestamp: u64) -> Result<Decimal> {
        let days = days_between(self.updated_at, timestamp)?;
        Ok(days.try_mul(self.outstanding()?)?)
    }

    pub fn record_mint(&mut self, value: Decimal, staked: Decimal, timestamp: u64) -> Result<()> {
        let accrued = self.accrued_age(timestamp)?;

        self.xunn_minted = self.xunn_minted.try_add(value)?;
        self.xunn_age = self.xunn_age.try_add(accrued)?;
        self.unn_staked = self.unn_staked.try_add(staked)?;
        self.updated_at = timestamp;
        Ok(())
    }

    pub fn record_burn(
        &mut self,
        value: Decimal,
        harvested: Decimal,
        age_destroyed: Decimal,
        timestamp: u64,
    ) -> Result<()> {
        let accrued = self.accrued_age(timestamp)?;

        // Day fractions are rounded per entity, so the pool total can trail
        // the holders' sum by a few ulps once everyone has exited
        let age = self.xunn_age.try_add(accrued)?.try_sub(age_destroyed)?;

        self.xunn_burned = self.xunn_burned.try_add(value)?;
        self.xunn_age = age.max(Decimal::ZERO);
        self.xunn_age_destroyed = self.xunn_age_destroyed.try_add(age_destroyed)?;
        self.unn_harvested = self.unn_harvested.try_add(harvested)?;
        self.updated_at = timestamp;
        Ok(())
    }
}
