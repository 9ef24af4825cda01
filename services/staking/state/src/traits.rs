//! Collaborator Traits
//!
//! Seams between the accounting rules and the outside world: the entity
//! store, the pool contract reader and snapshot persistence.

use crate::bar::Bar;
use crate::error::{ReaderError, StoreError};
use crate::history::History;
use crate::market::{RawMarketState, TokenMetadata};
use crate::user::User;
use async_trait::async_trait;
use types::{Address, EventPosition};

/// Every entity mutated by one event, committed together
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    pub bar: Bar,
    pub users: Vec<User>,
    pub history: Option<History>,
    /// Position of the event that produced this change set
    pub position: EventPosition,
}

/// Key-value storage for Bar, User and History records
///
/// A missing record is `Ok(None)`; callers create it with defaults.
pub trait EntityStore: Send + Sync {
    fn load_bar(&self, id: &Address) -> Result<Option<Bar>, StoreError>;

    fn load_user(&self, id: &Address) -> Result<Option<User>, StoreError>;

    fn load_history(&self, day: u64) -> Result<Option<History>, StoreError>;

    /// Position of the last committed event
    fn cursor(&self) -> Result<Option<EventPosition>, StoreError>;

    /// Save every record in the change set and advance the cursor
    fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;
}

/// Read interface of the pool contracts
#[async_trait]
pub trait PoolReader: Send + Sync {
    /// decimals(), name() and symbol() of the share token
    async fn token_metadata(&self) -> Result<TokenMetadata, ReaderError>;

    /// totalSupply() of the share token and balanceOf(bar) on the
    /// underlying asset, as of `block_number`
    async fn market_state(&self, block_number: u64) -> Result<RawMarketState, ReaderError>;
}

/// Components whose full state can be captured and restored
pub trait Snapshot {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Serialize the current state
    fn snapshot(&self) -> Result<Vec<u8>, Self::Error>;

    /// Replace the current state with a snapshot
    fn restore(&self, snapshot: &[u8]) -> Result<(), Self::Error>;
}
