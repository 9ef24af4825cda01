//! Transfer log feed
//!
//! Polls `eth_getLogs` for the share token's Transfer events one block range
//! at a time and hands them to the dispatcher in chain order.
//!
//! ## Ordering
//!
//! - Ranges are contiguous and never overlap
//! - Logs inside a range are sorted by (block, log index) before dispatch
//! - Events at or before the store cursor are dropped, so resuming inside a
//!   partially committed block is safe
//! - The first failed event stops the batch; the range is retried on the
//!   next call instead of being skipped

use crate::abi::{decode_transfer, to_h160, DecodingError, TRANSFER_TOPIC};
use futures::future::try_join_all;
use state_staking::{BarIndexer, EntityStore, EventOutcome, LedgerError, Notifier, PoolReader};
use std::collections::HashMap;
use tracing::{debug, info};
use types::{Address, EventPosition, TransferEvent};
use web3::transports::Http;
use web3::types::{BlockId, BlockNumber, FilterBuilder, Log, U64};
use web3::Web3;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("RPC error: {0}")]
    Rpc(#[from] web3::Error),

    #[error("Decoding error: {0}")]
    Decoding(#[from] DecodingError),

    #[error("Event {position} failed: {source}")]
    Ledger {
        position: EventPosition,
        #[source]
        source: LedgerError,
    },

    #[error("Block {0} not found")]
    MissingBlock(u64),
}

/// Summary of one processed block range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub from_block: u64,
    pub to_block: u64,
    pub applied: usize,
    pub skipped: usize,
    /// Timestamp of the newest block that carried an event
    pub last_timestamp: Option<u64>,
}

pub struct TransferFeed {
    web3: Web3<Http>,
    bar: Address,
    batch_size: u64,
    next_block: u64,
    timestamps: HashMap<u64, u64>,
}

impl TransferFeed {
    pub fn new(web3: Web3<Http>, bar: Address, batch_size: u64, next_block: u64) -> Self {
        Self {
            web3,
            bar,
            batch_size,
            next_block,
            timestamps: HashMap::new(),
        }
    }

    pub fn next_block(&self) -> u64 {
        self.next_block
    }

    /// Process the next block range up to the chain head
    ///
    /// Returns `Ok(None)` when the feed is already at the head.
    pub async fn sync_batch<S, R, N>(
        &mut self,
        indexer: &mut BarIndexer<S, R, N>,
    ) -> Result<Option<BatchReport>, FeedError>
    where
        S: EntityStore,
        R: PoolReader,
        N: Notifier,
    {
        let head = self.web3.eth().block_number().await?.as_u64();
        let Some((from_block, to_block)) = batch_range(self.next_block, head, self.batch_size)
        else {
            return Ok(None);
        };

        let logs = self.fetch_logs(from_block, to_block).await?;
        let events = self.decode_logs(logs).await?;
        let cursor = indexer
            .store()
            .cursor()
            .map_err(|e| FeedError::Ledger {
                position: EventPosition::new(from_block, 0),
                source: e.into(),
            })?;

        let mut report = BatchReport {
            from_block,
            to_block,
            applied: 0,
            skipped: 0,
            last_timestamp: None,
        };

        for event in after_cursor(events, cursor) {
            let outcome = indexer
                .handle_transfer(&event)
                .await
                .map_err(|source| FeedError::Ledger {
                    position: event.position,
                    source,
                })?;

            match outcome {
                EventOutcome::Applied { .. } => report.applied += 1,
                EventOutcome::Skipped => report.skipped += 1,
            }
            report.last_timestamp = Some(event.block_timestamp);
        }

        self.next_block = to_block + 1;
        self.timestamps.retain(|block, _| *block > to_block);

        debug!(
            "Blocks {}-{}: {} applied, {} skipped",
            from_block, to_block, report.applied, report.skipped
        );
        Ok(Some(report))
    }

    async fn fetch_logs(&self, from_block: u64, to_block: u64) -> Result<Vec<Log>, FeedError> {
        let filter = FilterBuilder::default()
            .address(vec![to_h160(self.bar)])
            .topics(Some(vec![*TRANSFER_TOPIC]), None, None, None)
            .from_block(BlockNumber::Number(U64::from(from_block)))
            .to_block(BlockNumber::Number(U64::from(to_block)))
            .build();

        let logs = self.web3.eth().logs(filter).await?;
        if !logs.is_empty() {
            info!(
                "Fetched {} Transfer logs in blocks {}-{}",
                logs.len(),
                from_block,
                to_block
            );
        }
        Ok(logs)
    }

    async fn decode_logs(&mut self, logs: Vec<Log>) -> Result<Vec<TransferEvent>, FeedError> {
        let mut blocks: Vec<u64> = logs
            .iter()
            .filter_map(|log| log.block_number.map(|n| n.as_u64()))
            .filter(|n| !self.timestamps.contains_key(n))
            .collect();
        blocks.sort_unstable();
        blocks.dedup();

        let fetched = try_join_all(blocks.iter().map(|n| self.block_timestamp(*n))).await?;
        self.timestamps.extend(blocks.into_iter().zip(fetched));

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            let block = log
                .block_number
                .ok_or(DecodingError::MissingField("blockNumber"))?
                .as_u64();
            let timestamp = self
                .timestamps
                .get(&block)
                .copied()
                .ok_or(FeedError::MissingBlock(block))?;
            events.push(decode_transfer(log, timestamp)?);
        }

        events.sort_by_key(|e| e.position);
        Ok(events)
    }

    async fn block_timestamp(&self, number: u64) -> Result<u64, FeedError> {
        let block = self
            .web3
            .eth()
            .block(BlockId::Number(BlockNumber::Number(U64::from(number))))
            .await?
            .ok_or(FeedError::MissingBlock(number))?;
        Ok(block.timestamp.low_u64())
    }
}

/// First block to scan after a restart
///
/// The cursor's own block is scanned again; [`after_cursor`] drops what was
/// already committed.
pub fn resume_block(cursor: Option<EventPosition>, start_block: u64) -> u64 {
    match cursor {
        Some(position) => position.block_number.max(start_block),
        None => start_block,
    }
}

/// Next inclusive range of at most `batch_size` blocks, or None at the head
pub fn batch_range(next_block: u64, head: u64, batch_size: u64) -> Option<(u64, u64)> {
    if next_block > head || batch_size == 0 {
        return None;
    }
    let to_block = next_block.saturating_add(batch_size - 1).min(head);
    Some((next_block, to_block))
}

/// Drop events that are not strictly after the cursor
pub fn after_cursor(
    events: Vec<TransferEvent>,
    cursor: Option<EventPosition>,
) -> impl Iterator<Item = TransferEvent> {
    events
        .into_iter()
        .filter(move |e| cursor.map_or(true, |c| e.position > c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_at(block: u64, log_index: u64) -> TransferEvent {
        TransferEvent {
            from: Address::ZERO,
            to: Address([1u8; 20]),
            value: 1,
            block_timestamp: 0,
            transaction_hash: [0u8; 32],
            position: EventPosition::new(block, log_index),
        }
    }

    #[test]
    fn test_batch_ranges() {
        assert_eq!(batch_range(100, 1_000, 500), Some((100, 599)));
        assert_eq!(batch_range(900, 1_000, 500), Some((900, 1_000)));
        assert_eq!(batch_range(1_000, 1_000, 500), Some((1_000, 1_000)));
        assert_eq!(batch_range(1_001, 1_000, 500), None);
        assert_eq!(batch_range(0, 10, 0), None);
    }

    #[test]
    fn test_resume_block() {
        assert_eq!(resume_block(None, 42), 42);
        assert_eq!(resume_block(Some(EventPosition::new(500, 3)), 42), 500);
        assert_eq!(resume_block(Some(EventPosition::new(10, 0)), 42), 42);
    }

    #[test]
    fn test_after_cursor_drops_committed_events() {
        let events = vec![event_at(5, 0), event_at(5, 1), event_at(5, 2), event_at(6, 0)];

        let kept: Vec<EventPosition> = after_cursor(events.clone(), Some(EventPosition::new(5, 1)))
            .map(|e| e.position)
            .collect();
        assert_eq!(
            kept,
            vec![EventPosition::new(5, 2), EventPosition::new(6, 0)]
        );

        assert_eq!(after_cursor(events, None).count(), 4);
    }
}
