//! # Bar Indexer Types
//!
//! Shared vocabulary for every crate in the workspace.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: native token integers are scaled into
//!   `rust_decimal::Decimal` exactly once, with checked arithmetic afterwards
//! - **Full Addresses**: holders and contracts keep all 20 bytes
//! - **Ordered Events**: every transfer carries its chain position so replays
//!   and reordering can be detected downstream
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{Address, EventPosition, TransferEvent, TransferKind};
//!
//! let mint = TransferEvent {
//!     from: Address::ZERO,
//!     to: "0x00000000000000000000000000000000000000aa".parse().unwrap(),
//!     value: 1_000_000_000_000_000_000,
//!     block_timestamp: 1_650_000_000,
//!     transaction_hash: [0u8; 32],
//!     position: EventPosition::new(1, 0),
//! };
//! assert_eq!(mint.kind(), TransferKind::Mint);
//! ```

pub mod address;
pub mod events;
pub mod precision;

pub use address::{Address, AddressError};
pub use events::{EventPosition, TransferEvent, TransferKind};
pub use precision::{DecimalExt, PrecisionError};
