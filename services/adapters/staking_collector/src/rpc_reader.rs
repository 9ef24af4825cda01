//! Pool contract reads over JSON-RPC
//!
//! `eth_call` against the share token (metadata, totalSupply) and the
//! underlying token (balanceOf the bar). Market reads are pinned to the
//! event's block so a replay from a snapshot sees the same ratio as the
//! original run did.

use crate::abi::{safe_u256_to_u128, to_h160};
use async_trait::async_trait;
use ethabi::{ParamType, Token};
use staking_config::deployment::selectors;
use state_staking::{PoolReader, RawMarketState, ReaderError, TokenMetadata};
use tracing::debug;
use types::Address;
use web3::transports::Http;
use web3::types::{BlockId, BlockNumber, CallRequest, H160};
use web3::Web3;

pub struct Web3PoolReader {
    web3: Web3<Http>,
    bar: H160,
    token: H160,
}

impl Web3PoolReader {
    pub fn new(web3: Web3<Http>, bar: Address, token: Address) -> Self {
        Self {
            web3,
            bar: to_h160(bar),
            token: to_h160(token),
        }
    }

    async fn call(
        &self,
        call: &'static str,
        to: H160,
        data: Vec<u8>,
        block_number: Option<u64>,
    ) -> Result<Vec<u8>, ReaderError> {
        let request = CallRequest {
            to: Some(to),
            data: Some(data.into()),
            ..Default::default()
        };
        let block = block_number.map(|n| BlockId::Number(BlockNumber::Number(n.into())));

        let result = self
            .web3
            .eth()
            .call(request, block)
            .await
            .map_err(|e| ReaderError::Rpc {
                call,
                reason: e.to_string(),
            })?;

        debug!("{} on 0x{} returned {} bytes", call, hex::encode(to), result.0.len());
        Ok(result.0)
    }
}

#[async_trait]
impl PoolReader for Web3PoolReader {
    async fn token_metadata(&self) -> Result<TokenMetadata, ReaderError> {
        let decimals = self
            .call("decimals", self.bar, selector("decimals", selectors::DECIMALS)?, None)
            .await?;
        let name = self
            .call("name", self.bar, selector("name", selectors::NAME)?, None)
            .await?;
        let symbol = self
            .call("symbol", self.bar, selector("symbol", selectors::SYMBOL)?, None)
            .await?;

        Ok(TokenMetadata {
            decimals: decode_u8("decimals", &decimals)?,
            name: decode_string("name", &name)?,
            symbol: decode_string("symbol", &symbol)?,
        })
    }

    async fn market_state(&self, block_number: u64) -> Result<RawMarketState, ReaderError> {
        let total_supply = self
            .call(
                "totalSupply",
                self.bar,
                selector("totalSupply", selectors::TOTAL_SUPPLY)?,
                Some(block_number),
            )
            .await?;

        let staked = self
            .call(
                "balanceOf",
                self.token,
                encode_balance_of(self.bar)?,
                Some(block_number),
            )
            .await?;

        Ok(RawMarketState {
            total_supply: decode_u128("totalSupply", &total_supply)?,
            staked: decode_u128("balanceOf", &staked)?,
        })
    }
}

fn selector(call: &'static str, hex_selector: &str) -> Result<Vec<u8>, ReaderError> {
    hex::decode(hex_selector).map_err(|e| ReaderError::InvalidResponse {
        call,
        reason: format!("bad selector {}: {}", hex_selector, e),
    })
}

/// balanceOf(holder) calldata
pub fn encode_balance_of(holder: H160) -> Result<Vec<u8>, ReaderError> {
    let mut data = selector("balanceOf", selectors::BALANCE_OF)?;
    data.extend(ethabi::encode(&[Token::Address(holder)]));
    Ok(data)
}

fn decode_single(
    call: &'static str,
    kind: ParamType,
    bytes: &[u8],
) -> Result<Token, ReaderError> {
    ethabi::decode(&[kind], bytes)
        .map_err(|e| ReaderError::InvalidResponse {
            call,
            reason: e.to_string(),
        })?
        .into_iter()
        .next()
        .ok_or_else(|| ReaderError::InvalidResponse {
            call,
            reason: "empty return data".to_string(),
        })
}

pub fn decode_u128(call: &'static str, bytes: &[u8]) -> Result<u128, ReaderError> {
    let value = decode_single(call, ParamType::Uint(256), bytes)?
        .into_uint()
        .ok_or_else(|| ReaderError::InvalidResponse {
            call,
            reason: "expected uint256".to_string(),
        })?;

    safe_u256_to_u128(value).map_err(|e| ReaderError::InvalidResponse {
        call,
        reason: e.to_string(),
    })
}

pub fn decode_u8(call: &'static str, bytes: &[u8]) -> Result<u8, ReaderError> {
    let value = decode_u128(call, bytes)?;
    u8::try_from(value).map_err(|_| ReaderError::InvalidResponse {
        call,
        reason: format!("{} does not fit uint8", value),
    })
}

pub fn decode_string(call: &'static str, bytes: &[u8]) -> Result<String, ReaderError> {
    decode_single(call, ParamType::String, bytes)?
        .into_string()
        .ok_or_else(|| ReaderError::InvalidResponse {
            call,
            reason: "expected string".to_string(),
        })
}
