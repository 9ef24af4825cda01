//! Share token transfer events
//!
//! One [`TransferEvent`] per on-chain `Transfer` log of the share token,
//! delivered in chain order. Classification by sender/recipient pattern lives
//! here so every consumer agrees on what counts as a mint, burn or peer move.

use crate::address::Address;
use crate::precision::{self, scale_amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a log in the chain; strictly increasing in delivery order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventPosition {
    pub block_number: u64,
    pub log_index: u64,
}

impl EventPosition {
    pub const fn new(block_number: u64, log_index: u64) -> Self {
        Self {
            block_number,
            log_index,
        }
    }
}

impl fmt::Display for EventPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block_number, self.log_index)
    }
}

/// How a transfer affects the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Issued from the zero address
    Mint,
    /// Redeemed to the zero address
    Burn,
    /// Moved between two holders
    Peer,
    /// Zero address on both sides
    Null,
}

/// Decoded `Transfer(from, to, value)` log of the share token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    /// Native precision (18 decimals)
    pub value: u128,
    /// Unix seconds of the containing block
    pub block_timestamp: u64,
    pub transaction_hash: [u8; 32],
    pub position: EventPosition,
}

impl TransferEvent {
    pub fn kind(&self) -> TransferKind {
        match (self.from.is_zero(), self.to.is_zero()) {
            (true, true) => TransferKind::Null,
            (true, false) => TransferKind::Mint,
            (false, true) => TransferKind::Burn,
            (false, false) => TransferKind::Peer,
        }
    }

    /// Transfer value as a decimal amount of shares
    pub fn value_decimal(&self) -> precision::Result<Decimal> {
        scale_amount(self.value, precision::TOKEN_DECIMALS)
    }

    pub fn transaction_hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.transaction_hash))
    }
}
