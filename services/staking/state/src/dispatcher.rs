//! Event Dispatcher
//!
//! Applies one share-token transfer at a time, in chain order.
//!
//! ## Processing Order
//!
//! 1. Zero-value transfers are reported and discarded
//! 2. Null transfers and replayed positions are rejected
//! 3. The Bar is loaded (or created from token metadata)
//! 4. The market snapshot is read once and refreshes the Bar
//! 5. Mint, burn or peer rules mutate working copies of the entities
//! 6. The change set is committed in one call, then notices are flushed
//!
//! Any error in steps 2-6 returns before the commit, leaving the store and
//! its cursor exactly as they were.

use crate::bar::Bar;
use crate::error::{LedgerError, Result};
use crate::history::History;
use crate::market::MarketState;
use crate::notify::{Notice, Notifier};
use crate::traits::{ChangeSet, EntityStore, PoolReader};
use crate::user::{Membership, User};
use rust_decimal::Decimal;
use tracing::debug;
use types::precision::day_bucket;
use types::{Address, EventPosition, TransferEvent, TransferKind};

/// What happened to one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Zero-value transfer; nothing was written
    Skipped,
    Applied {
        kind: TransferKind,
        position: EventPosition,
    },
}

/// Owns the accounting state and its collaborators
pub struct BarIndexer<S, R, N> {
    bar_address: Address,
    store: S,
    reader: R,
    notifier: N,
}

impl<S, R, N> BarIndexer<S, R, N>
where
    S: EntityStore,
    R: PoolReader,
    N: Notifier,
{
    pub fn new(bar_address: Address, store: S, reader: R, notifier: N) -> Self {
        Self {
            bar_address,
            store,
            reader,
            notifier,
        }
    }

    pub fn bar_address(&self) -> Address {
        self.bar_address
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Apply one transfer event
    pub async fn handle_transfer(&mut self, event: &TransferEvent) -> Result<EventOutcome> {
        let value = event.value_decimal()?;
        if value.is_zero() {
            self.notifier.notify(Notice::ZeroValue {
                raw: event.value,
                tx: event.transaction_hash_hex(),
            });
            return Ok(EventOutcome::Skipped);
        }

        let kind = event.kind();
        if kind == TransferKind::Null {
            return Err(LedgerError::NullTransfer(event.transaction_hash_hex()));
        }

        if let Some(cursor) = self.store.cursor()? {
            if event.position <= cursor {
                return Err(LedgerError::Replay {
                    position: event.position,
                    cursor,
                });
            }
        }

        let timestamp = event.block_timestamp;
        let mut bar = match self.store.load_bar(&self.bar_address)? {
            Some(bar) => bar,
            None => {
                let metadata = self.reader.token_metadata().await?;
                debug!(
                    "Creating bar {} ({} / {})",
                    self.bar_address, metadata.name, metadata.symbol
                );
                Bar::new(self.bar_address, metadata, timestamp)
            }
        };

        let raw = self
            .reader
            .market_state(event.position.block_number)
            .await?;
        let market = MarketState::from_raw(raw)?;
        bar.refresh(&market);

        let underlying = market.underlying_value(value)?;
        let mut notices = Vec::new();

        let (users, history) = match kind {
            TransferKind::Mint => {
                let (user, history) =
                    self.apply_mint(&mut bar, event, value, underlying, &mut notices)?;
                (vec![user], Some(history))
            }
            TransferKind::Burn => {
                let (user, history) =
                    self.apply_burn(&mut bar, event, value, underlying, &mut notices)?;
                (vec![user], Some(history))
            }
            TransferKind::Peer => {
                let users = self.apply_peer(&bar, event, value, underlying, &mut notices)?;
                (users, None)
            }
            TransferKind::Null => {
                return Err(LedgerError::NullTransfer(event.transaction_hash_hex()))
            }
        };

        self.store.commit(ChangeSet {
            bar,
            users,
            history,
            position: event.position,
        })?;

        for notice in notices {
            self.notifier.notify(notice);
        }

        debug!("Applied {:?} transfer at {}", kind, event.position);
        Ok(EventOutcome::Applied {
            kind,
            position: event.position,
        })
    }

    fn apply_mint(
        &self,
        bar: &mut Bar,
        event: &TransferEvent,
        value: Decimal,
        underlying: Decimal,
        notices: &mut Vec<Notice>,
    ) -> Result<(User, History)> {
        let timestamp = event.block_timestamp;
        let mut user = self.user_or_new(event.to, timestamp)?;

        let staked_before = user.unn_staked;
        let membership = user.record_mint(bar.id, value, underlying, timestamp)?;
        bar.record_mint(value, underlying, timestamp)?;

        let mut history = self.history_or_new(timestamp)?;
        history.record_mint(bar, value, underlying)?;

        notices.push(Notice::Minted {
            holder: user.id,
            value,
            underlying,
            staked_before,
            staked_after: user.unn_staked,
        });
        if membership == Membership::Entered {
            notices.push(Notice::EnteredBar {
                holder: user.id,
                by_transfer: false,
            });
        }

        Ok((user, history))
    }

    fn apply_burn(
        &self,
        bar: &mut Bar,
        event: &TransferEvent,
        value: Decimal,
        harvested: Decimal,
        notices: &mut Vec<Notice>,
    ) -> Result<(User, History)> {
        let timestamp = event.block_timestamp;
        let mut user = self.user_or_new(event.from, timestamp)?;

        let outflow = user.record_burn(bar.id, value, harvested, timestamp)?;
        bar.record_burn(value, harvested, outflow.age, timestamp)?;

        let mut history = self.history_or_new(timestamp)?;
        history.record_burn(bar, value, harvested, outflow.age)?;

        notices.push(Notice::Burned {
            holder: user.id,
            value,
        });
        if outflow.membership == Membership::Left {
            notices.push(Notice::LeftBar {
                holder: user.id,
                by_transfer: false,
            });
        }

        Ok((user, history))
    }

    /// Sender first, then recipient. A self-transfer applies both sides to
    /// the same record.
    fn apply_peer(
        &self,
        bar: &Bar,
        event: &TransferEvent,
        value: Decimal,
        underlying: Decimal,
        notices: &mut Vec<Notice>,
    ) -> Result<Vec<User>> {
        let timestamp = event.block_timestamp;
        notices.push(Notice::Transferred {
            from: event.from,
            to: event.to,
            value,
        });

        let mut sender = self.user_or_new(event.from, timestamp)?;
        let outflow = sender.record_send(bar.id, value, underlying, timestamp)?;
        if outflow.membership == Membership::Left {
            notices.push(Notice::LeftBar {
                holder: sender.id,
                by_transfer: true,
            });
        }

        if event.to == event.from {
            receive(&mut sender, bar.id, event, value, underlying, outflow.age, notices)?;
            return Ok(vec![sender]);
        }

        let mut recipient = self.user_or_new(event.to, timestamp)?;
        receive(
            &mut recipient,
            bar.id,
            event,
            value,
            underlying,
            outflow.age,
            notices,
        )?;

        Ok(vec![sender, recipient])
    }

    fn user_or_new(&self, id: Address, timestamp: u64) -> Result<User> {
        Ok(self
            .store
            .load_user(&id)?
            .unwrap_or_else(|| User::new(id, timestamp)))
    }

    fn history_or_new(&self, timestamp: u64) -> Result<History> {
        Ok(self
            .store
            .load_history(day_bucket(timestamp))?
            .unwrap_or_else(|| History::for_timestamp(timestamp)))
    }
}

fn receive(
    recipient: &mut User,
    bar: Address,
    event: &TransferEvent,
    value: Decimal,
    underlying: Decimal,
    inherited_age: Decimal,
    notices: &mut Vec<Notice>,
) -> Result<()> {
    let inflow = recipient.record_receive(
        bar,
        value,
        underlying,
        inherited_age,
        event.block_timestamp,
    )?;

    if inflow.membership == Membership::Entered {
        notices.push(Notice::EnteredBar {
            holder: recipient.id,
            by_transfer: true,
        });
    }
    if inflow.restaked.is_some() {
        notices.push(Notice::ReceivedStake {
            holder: recipient.id,
            from: event.from,
            value,
            underlying,
        });
    }
    Ok(())
}
