//! Test doubles for the pool reader

use crate::error::ReaderError;
use crate::market::{RawMarketState, TokenMetadata};
use crate::traits::PoolReader;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One whole token at native precision
pub const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

/// `whole` tokens at native precision
pub const fn units(whole: u128) -> u128 {
    whole * ONE_TOKEN
}

/// Pool reader returning injected values
#[derive(Debug)]
pub struct FixedPoolReader {
    metadata: TokenMetadata,
    market: Mutex<RawMarketState>,
    fail_market: Mutex<bool>,
    metadata_calls: AtomicUsize,
    market_calls: AtomicUsize,
}

impl FixedPoolReader {
    pub fn new(total_supply: u128, staked: u128) -> Self {
        Self {
            metadata: TokenMetadata {
                decimals: 18,
                name: "UNN Bar".to_string(),
                symbol: "xUNN".to_string(),
            },
            market: Mutex::new(RawMarketState {
                total_supply,
                staked,
            }),
            fail_market: Mutex::new(false),
            metadata_calls: AtomicUsize::new(0),
            market_calls: AtomicUsize::new(0),
        }
    }

    /// Ratio 1:1 with `supply` whole tokens on both sides
    pub fn at_par(supply: u128) -> Self {
        Self::new(units(supply), units(supply))
    }

    pub fn set_market(&self, total_supply: u128, staked: u128) {
        *self.market.lock() = RawMarketState {
            total_supply,
            staked,
        };
    }

    /// Make every market read fail until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.fail_market.lock() = unavailable;
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::Relaxed)
    }

    pub fn market_calls(&self) -> usize {
        self.market_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PoolReader for FixedPoolReader {
    async fn token_metadata(&self) -> Result<TokenMetadata, ReaderError> {
        self.metadata_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.metadata.clone())
    }

    async fn market_state(&self, _block_number: u64) -> Result<RawMarketState, ReaderError> {
        self.market_calls.fetch_add(1, Ordering::Relaxed);
        if *self.fail_market.lock() {
            return Err(ReaderError::Rpc {
                call: "totalSupply",
                reason: "reader unavailable".to_string(),
            });
        }
        Ok(*self.market.lock())
    }
}
