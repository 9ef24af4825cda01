//! Daily History Buckets
//!
//! One record per calendar day, keyed by `timestamp / 86400`. Within a bucket
//! the flow fields (minted, burned, staked, harvested, age destroyed) add up,
//! while the snapshot fields (age, supply, ratio) take the Bar's value after
//! the latest triggering event. Peer transfers never touch History.

use crate::bar::Bar;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use staking_config::deployment::HISTORY_TIMEFRAME;
use types::precision::{day_bucket, day_start, DecimalExt};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Day number since the unix epoch
    pub id: u64,
    /// Start-of-day timestamp
    pub date: u64,
    pub timeframe: String,

    #[serde(rename = "UNNStaked")]
    pub unn_staked: Decimal,
    #[serde(rename = "UNNHarvested")]
    pub unn_harvested: Decimal,
    #[serde(rename = "xUNNAge")]
    pub xunn_age: Decimal,
    #[serde(rename = "xUNNAgeDestroyed")]
    pub xunn_age_destroyed: Decimal,
    #[serde(rename = "xUNNMinted")]
    pub xunn_minted: Decimal,
    #[serde(rename = "xUNNBurned")]
    pub xunn_burned: Decimal,
    #[serde(rename = "xUNNSupply")]
    pub xunn_supply: Decimal,
    pub ratio: Decimal,
}

impl History {
    /// Empty bucket for the day containing `timestamp`
    pub fn for_timestamp(timestamp: u64) -> Self {
        let day = day_bucket(timestamp);
        Self {
            id: day,
            date: day_start(day),
            timeframe: HISTORY_TIMEFRAME.to_string(),
            unn_staked: Decimal::ZERO,
            unn_harvested: Decimal::ZERO,
            xunn_age: Decimal::ZERO,
            xunn_age_destroyed: Decimal::ZERO,
            xunn_minted: Decimal::ZERO,
            xunn_burned: Decimal::ZERO,
            xunn_supply: Decimal::ZERO,
            ratio: Decimal::ZERO,
        }
    }

    /// `bar` must already carry this mint
    pub fn record_mint(&mut self, bar: &Bar, value: Decimal, staked: Decimal) -> Result<()> {
        self.xunn_minted = self.xunn_minted.try_add(value)?;
        self.unn_staked = self.unn_staked.try_add(staked)?;
        self.snapshot(bar);
        Ok(())
    }

    /// `bar` must already carry this burn
    pub fn record_burn(
        &mut self,
        bar: &Bar,
        value: Decimal,
        harvested: Decimal,
        age_destroyed: Decimal,
    ) -> Result<()> {
        self.xunn_burned = self.xunn_burned.try_add(value)?;
        self.unn_harvested = self.unn_harvested.try_add(harvested)?;
        self.xunn_age_destroyed = self.xunn_age_destroyed.try_add(age_destroyed)?;
        self.snapshot(bar);
        Ok(())
    }

    fn snapshot(&mut self, bar: &Bar) {
        self.xunn_age = bar.xunn_age;
        self.xunn_supply = bar.total_supply;
        self.ratio = bar.ratio;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{MarketState, TokenMetadata};
    use rust_decimal_macros::dec;
    use types::Address;

    #[test]
    fn test_bucket_key_and_date() {
        let history = History::for_timestamp(1_700_000_123);
        assert_eq!(history.id, 19_675);
        assert_eq!(history.date, 1_699_920_000);
        assert_eq!(history.timeframe, "Day");
    }

    #[test]
    fn test_flows_add_and_snapshots_overwrite() {
        let metadata = TokenMetadata {
            decimals: 18,
            name: "UNN Bar".to_string(),
            symbol: "xUNN".to_string(),
        };
        let mut bar = Bar::new(Address([1u8; 20]), metadata, 0);
        let mut history = History::for_timestamp(0);

        bar.refresh(&MarketState::new(dec!(100), dec!(100)).unwrap());
        history.record_mint(&bar, dec!(100), dec!(100)).unwrap();

        bar.refresh(&MarketState::new(dec!(100), dec!(200)).unwrap());
        history.record_mint(&bar, dec!(10), dec!(20)).unwrap();

        assert_eq!(history.xunn_minted, dec!(110));
        assert_eq!(history.unn_staked, dec!(120));
        assert_eq!(history.ratio, dec!(2));
        assert_eq!(history.xunn_supply, dec!(100));

        bar.xunn_age = dec!(42);
        history
            .record_burn(&bar, dec!(5), dec!(10), dec!(3))
            .unwrap();
        assert_eq!(history.xunn_burned, dec!(5));
        assert_eq!(history.unn_harvested, dec!(10));
        assert_eq!(history.xunn_age_destroyed, dec!(3));
        assert_eq!(history.xunn_age, dec!(42));
    }
}
