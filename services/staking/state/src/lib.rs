//! # Staking Bar State - Incremental Share Accounting
//!
//! ## Purpose
//!
//! Maintains the derived accounting state of a share token (xUNN) that
//! represents a claim on a pool of staked underlying (UNN): per-holder
//! balances, share-day age accumulators, cost-basis offsets, the pool-wide
//! totals and one History bucket per calendar day.
//!
//! ## Integration Points
//!
//! - **Input Sources**: decoded `Transfer` events of the share token, in chain order
//! - **External Reads**: [`PoolReader`] for token metadata, total supply and staked balance
//! - **State Persistence**: [`EntityStore`] commits one [`ChangeSet`] per event
//! - **Diagnostics**: [`Notifier`] sink, flushed after each commit
//!
//! ## Architecture Role
//!
//! ```text
//! Transfer log → [BarIndexer] → MarketState snapshot → Bar / User / History rules
//!                     ↓                                         ↓
//!               replay guard                          ChangeSet → EntityStore
//!                                                               ↓
//!                                                         Notifier flush
//! ```
//!
//! ## Invariants
//!
//! - A holder is a member of the bar exactly while its balance is non-zero
//! - Age accumulators never go negative
//! - `Bar.xUNNMinted - Bar.xUNNBurned` equals the sum of holder balances
//! - An event is either fully committed or leaves no trace

pub mod bar;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod market;
pub mod notify;
pub mod store;
pub mod testing;
pub mod traits;
pub mod user;

pub use bar::Bar;
pub use dispatcher::{BarIndexer, EventOutcome};
pub use error::{LedgerError, ReaderError, Result, StoreError};
pub use history::History;
pub use market::{MarketState, RawMarketState, TokenMetadata};
pub use notify::{Notice, Notifier, RecordingNotifier, TracingNotifier};
pub use store::{MemoryStore, StoreStats};
pub use traits::{ChangeSet, EntityStore, PoolReader, Snapshot};
pub use user::{Inflow, Membership, Outflow, User};
