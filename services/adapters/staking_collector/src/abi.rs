//! Share token event ABI and decoder
//!
//! Decodes ERC-20 `Transfer` logs with ethabi instead of slicing topic bytes
//! by hand, and refuses values that do not fit the ledger's `u128`.

use ethabi::{Event, EventParam, ParamType, RawLog};
use once_cell::sync::Lazy;
use types::{Address, EventPosition, TransferEvent};
use web3::types::{Log, H160, H256, U256};

/// Error types for ABI decoding
#[derive(Debug, thiserror::Error)]
pub enum DecodingError {
    #[error("ABI parsing failed: {0}")]
    AbiParsingError(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Value overflow: {value} exceeds u128::MAX")]
    ValueOverflow { value: String },

    #[error("Log index {0} exceeds u64::MAX")]
    LogIndexOverflow(String),
}

/// ERC-20 Transfer event ABI definition
/// event Transfer(address indexed from, address indexed to, uint256 value)
pub fn transfer_event() -> Event {
    Event {
        name: "Transfer".to_string(),
        inputs: vec![
            EventParam {
                name: "from".to_string(),
                kind: ParamType::Address,
                indexed: true,
            },
            EventParam {
                name: "to".to_string(),
                kind: ParamType::Address,
                indexed: true,
            },
            EventParam {
                name: "value".to_string(),
                kind: ParamType::Uint(256),
                indexed: false,
            },
        ],
        anonymous: false,
    }
}

/// topic0 of every Transfer log
pub static TRANSFER_TOPIC: Lazy<H256> = Lazy::new(|| transfer_event().signature());

/// Decode a Transfer log of the share token
///
/// `block_timestamp` comes from the containing block; logs carry none.
pub fn decode_transfer(log: &Log, block_timestamp: u64) -> Result<TransferEvent, DecodingError> {
    let raw_log = RawLog {
        topics: log.topics.clone(),
        data: log.data.0.clone(),
    };

    let decoded = transfer_event()
        .parse_log(raw_log)
        .map_err(|e| DecodingError::AbiParsingError(e.to_string()))?;

    let from = decoded
        .params
        .first()
        .and_then(|p| p.value.clone().into_address())
        .ok_or(DecodingError::MissingField("from"))?;

    let to = decoded
        .params
        .get(1)
        .and_then(|p| p.value.clone().into_address())
        .ok_or(DecodingError::MissingField("to"))?;

    let value = decoded
        .params
        .get(2)
        .and_then(|p| p.value.clone().into_uint())
        .ok_or(DecodingError::MissingField("value"))?;

    let block_number = log
        .block_number
        .ok_or(DecodingError::MissingField("blockNumber"))?
        .as_u64();

    let log_index = log.log_index.ok_or(DecodingError::MissingField("logIndex"))?;
    if log_index > U256::from(u64::MAX) {
        return Err(DecodingError::LogIndexOverflow(log_index.to_string()));
    }

    let transaction_hash = log
        .transaction_hash
        .ok_or(DecodingError::MissingField("transactionHash"))?;

    Ok(TransferEvent {
        from: to_address(from),
        to: to_address(to),
        value: safe_u256_to_u128(value)?,
        block_timestamp,
        transaction_hash: transaction_hash.0,
        position: EventPosition::new(block_number, log_index.low_u64()),
    })
}

/// Safely convert U256 to u128 with overflow detection
pub fn safe_u256_to_u128(value: U256) -> Result<u128, DecodingError> {
    if value > U256::from(u128::MAX) {
        return Err(DecodingError::ValueOverflow {
            value: format!("{}", value),
        });
    }
    Ok(value.as_u128())
}

pub fn to_address(h160: H160) -> Address {
    Address(h160.0)
}

pub fn to_h160(address: Address) -> H160 {
    H160(address.0)
}
