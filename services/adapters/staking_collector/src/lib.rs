//! Staking Bar Chain Adapter
//!
//! Connects the bar accounting engine to an EVM JSON-RPC endpoint. It polls
//! the share token's `Transfer` logs, decodes them with ethabi and reads the
//! pool contracts for each event's market snapshot.
//!
//! ## Features
//! - **ABI Decoding**: ethabi-validated `Transfer` logs, no manual topic slicing
//! - **Block-Pinned Reads**: totalSupply and balanceOf queried at the event's block
//! - **Resumable**: block ranges restart from the store cursor without replays

pub mod abi;
pub mod feed;
pub mod rpc_reader;

pub use abi::{decode_transfer, transfer_event, DecodingError};
pub use feed::{BatchReport, FeedError, TransferFeed};
pub use rpc_reader::Web3PoolReader;
