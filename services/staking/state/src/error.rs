//! Error types for event processing
//!
//! Any error aborts the current event before its change set is committed, so
//! a failed event never leaves partially updated entities behind.

use rust_decimal::Decimal;
use thiserror::Error;
use types::{Address, EventPosition, PrecisionError};

/// Entity store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Pool contract read failures
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("RPC call {call} failed: {reason}")]
    Rpc { call: &'static str, reason: String },

    #[error("Invalid response for {call}: {reason}")]
    InvalidResponse { call: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Total supply is zero; ratio is undefined")]
    ZeroSupply,

    #[error("Holder {holder} has zero balance")]
    ZeroBalance { holder: Address },

    #[error("Holder {holder} balance {balance} is below transfer value {value}")]
    InsufficientBalance {
        holder: Address,
        balance: Decimal,
        value: Decimal,
    },

    #[error("Transfer from and to the zero address in tx {0}")]
    NullTransfer(String),

    #[error("Event {position} is not after the last applied event {cursor}")]
    Replay {
        position: EventPosition,
        cursor: EventPosition,
    },

    #[error("Arithmetic error: {0}")]
    Precision(#[from] PrecisionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Pool reader error: {0}")]
    Reader(#[from] ReaderError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
