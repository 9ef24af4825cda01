//! Deployment constants for the staking bar
//!
//! These values are fixed by the deployed contracts and are not
//! configuration; [`crate::IndexerConfig`] uses them as defaults only.

/// Share token (xUNN) contract, which is also the pool
pub const BAR_ADDRESS: &str = "0x2A21d8AfEA039506db5d05F478250edC2424f325";

/// Underlying asset (UNN) held by the bar
pub const UNDERLYING_TOKEN_ADDRESS: &str = "0xc2b2602344d5Ca808F888954f30fCb2B5E13A08F";

/// Label written into every History record
pub const HISTORY_TIMEFRAME: &str = "Day";

/// ERC-20 contract calls used by the pool reader
pub mod selectors {
    /// decimals()
    pub const DECIMALS: &str = "313ce567";

    /// name()
    pub const NAME: &str = "06fdde03";

    /// symbol()
    pub const SYMBOL: &str = "95d89b41";

    /// totalSupply()
    pub const TOTAL_SUPPLY: &str = "18160ddd";

    /// balanceOf(address)
    pub const BALANCE_OF: &str = "70a08231";
}

/// event Transfer(address indexed from, address indexed to, uint256 value)
pub const TRANSFER_EVENT_SIGNATURE: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
