//! Holder State (User)
//!
//! One record per address that has ever held the share token. Every rule
//! follows the same order:
//!
//! 1. Advance the age accumulator with the *pre-event* balance
//! 2. Apply the balance delta and the cumulative counters
//! 3. Re-derive pool membership from the new balance
//!
//! ## Average-Age Method
//!
//! Burns and outflows remove age proportionally to the share of the balance
//! leaving the wallet: `moved = (age / balance) * value`. A full exit moves
//! the whole accumulator so rounding can never leave dust behind, and a
//! partial exit never moves more than the accumulator holds.
//!
//! ## Cost-Basis Offsets
//!
//! Only the receiving side of a peer transfer touches the offsets. Underlying
//! value is credited to `UNNStaked` only for net new inbound shares, so shares
//! that merely pass through a wallet are not counted twice.

use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::precision::{days_between, DecimalExt};
use types::Address;

/// Membership transition caused by one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Entered,
    Left,
    Unchanged,
}

/// Result of a burn or an outbound transfer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outflow {
    /// Share-days removed from the holder
    pub age: Decimal,
    pub membership: Membership,
}

/// Result of an inbound transfer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inflow {
    pub membership: Membership,
    /// Underlying value credited to `UNNStaked` by the offset logic
    pub restaked: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Address,

    /// Set while the holder has a non-zero balance
    pub bar: Option<Address>,

    #[serde(rename = "xUNN")]
    pub xunn: Decimal,
    #[serde(rename = "xUNNMinted")]
    pub xunn_minted: Decimal,
    #[serde(rename = "xUNNBurned")]
    pub xunn_burned: Decimal,
    #[serde(rename = "xUNNIn")]
    pub xunn_in: Decimal,
    #[serde(rename = "xUNNOut")]
    pub xunn_out: Decimal,

    #[serde(rename = "UNNStaked")]
    pub unn_staked: Decimal,
    #[serde(rename = "UNNHarvested")]
    pub unn_harvested: Decimal,
    #[serde(rename = "UNNIn")]
    pub unn_in: Decimal,
    #[serde(rename = "UNNOut")]
    pub unn_out: Decimal,

    #[serde(rename = "xUNNAge")]
    pub xunn_age: Decimal,
    #[serde(rename = "xUNNAgeDestroyed")]
    pub xunn_age_destroyed: Decimal,

    #[serde(rename = "xUNNOffset")]
    pub xunn_offset: Decimal,
    #[serde(rename = "UNNOffset")]
    pub unn_offset: Decimal,
    /// Carried for schema compatibility; no rule writes it
    #[serde(rename = "usdOffset")]
    pub usd_offset: Decimal,

    #[serde(rename = "updatedAt")]
    pub updated_at: u64,
}

impl User {
    /// Fresh holder record; age starts accruing at `created_at`
    pub fn new(id: Address, created_at: u64) -> Self {
        Self {
            id,
            bar: None,
            xunn: Decimal::ZERO,
            xunn_minted: Decimal::ZERO,
            xunn_burned: Decimal::ZERO,
            xunn_in: Decimal::ZERO,
            xunn_out: Decimal::ZERO,
            unn_staked: Decimal::ZERO,
            unn_harvested: Decimal::ZERO,
            unn_in: Decimal::ZERO,
            unn_out: Decimal::ZERO,
            xunn_age: Decimal::ZERO,
            xunn_age_destroyed: Decimal::ZERO,
            xunn_offset: Decimal::ZERO,
            unn_offset: Decimal::ZERO,
            usd_offset: Decimal::ZERO,
            updated_at: created_at,
        }
    }

    pub fn is_member(&self) -> bool {
        self.bar.is_some()
    }

    /// Integrate the current balance over the time since the last update
    pub fn advance_age(&mut self, timestamp: u64) -> Result<()> {
        let days = days_between(self.updated_at, timestamp)?;
        self.xunn_age = self.xunn_age.try_add(days.try_mul(self.xunn)?)?;
        Ok(())
    }

    /// Age attributable to `value` shares under the average-age method
    ///
    /// Must be called after [`advance_age`](Self::advance_age).
    pub fn proportional_age(&self, value: Decimal) -> Result<Decimal> {
        if self.xunn.is_zero() {
            return Err(LedgerError::ZeroBalance { holder: self.id });
        }
        if value > self.xunn {
            return Err(LedgerError::InsufficientBalance {
                holder: self.id,
                balance: self.xunn,
                value,
            });
        }
        if value == self.xunn {
            return Ok(self.xunn_age);
        }

        let moved = self.xunn_age.try_div(self.xunn)?.try_mul(value)?;
        Ok(moved.min(self.xunn_age))
    }

    /// Re-derive membership from the balance
    fn sync_membership(&mut self, bar: Address) -> Membership {
        match (self.bar.is_some(), self.xunn.is_zero()) {
            (false, false) => {
                self.bar = Some(bar);
                Membership::Entered
            }
            (true, true) => {
                self.bar = None;
                Membership::Left
            }
            _ => Membership::Unchanged,
        }
    }

    pub fn record_mint(
        &mut self,
        bar: Address,
        value: Decimal,
        staked: Decimal,
        timestamp: u64,
    ) -> Result<Membership> {
        self.advance_age(timestamp)?;

        self.xunn_minted = self.xunn_minted.try_add(value)?;
        self.unn_staked = self.unn_staked.try_add(staked)?;
        self.xunn = self.xunn.try_add(value)?;
        self.updated_at = timestamp;

        Ok(self.sync_membership(bar))
    }

    pub fn record_burn(
        &mut self,
        bar: Address,
        value: Decimal,
        harvested: Decimal,
        timestamp: u64,
    ) -> Result<Outflow> {
        self.advance_age(timestamp)?;
        let destroyed = self.proportional_age(value)?;

        self.xunn_burned = self.xunn_burned.try_add(value)?;
        self.unn_harvested = self.unn_harvested.try_add(harvested)?;
        self.xunn_age_destroyed = self.xunn_age_destroyed.try_add(destroyed)?;
        self.xunn_age = self.xunn_age.try_sub(destroyed)?;
        self.xunn = self.xunn.try_sub(value)?;
        self.updated_at = timestamp;

        Ok(Outflow {
            age: destroyed,
            membership: self.sync_membership(bar),
        })
    }

    /// Sender side of a peer transfer
    pub fn record_send(
        &mut self,
        bar: Address,
        value: Decimal,
        underlying: Decimal,
        timestamp: u64,
    ) -> Result<Outflow> {
        self.advance_age(timestamp)?;
        let transferred = self.proportional_age(value)?;

        self.xunn_age = self.xunn_age.try_sub(transferred)?;
        self.xunn = self.xunn.try_sub(value)?;
        self.xunn_out = self.xunn_out.try_add(value)?;
        self.unn_out = self.unn_out.try_add(underlying)?;
        self.updated_at = timestamp;

        Ok(Outflow {
            age: transferred,
            membership: self.sync_membership(bar),
        })
    }

    /// Recipient side of a peer transfer
    ///
    /// `inherited_age` is the sender's transferred age, added as-is.
    pub fn record_receive(
        &mut self,
        bar: Address,
        value: Decimal,
        underlying: Decimal,
        inherited_age: Decimal,
        timestamp: u64,
    ) -> Result<Inflow> {
        self.advance_age(timestamp)?;

        self.xunn_age = self.xunn_age.try_add(inherited_age)?;
        self.xunn = self.xunn.try_add(value)?;
        self.xunn_in = self.xunn_in.try_add(value)?;
        self.unn_in = self.unn_in.try_add(underlying)?;
        self.updated_at = timestamp;

        let membership = self.sync_membership(bar);
        let restaked = self.apply_offsets()?;

        Ok(Inflow {
            membership,
            restaked,
        })
    }

    /// Credit net new inbound value to `UNNStaked` and advance the offsets
    fn apply_offsets(&mut self) -> Result<Option<Decimal>> {
        let difference = self
            .xunn_in
            .try_sub(self.xunn_out)?
            .try_sub(self.xunn_offset)?;

        if difference <= Decimal::ZERO {
            return Ok(None);
        }

        let net_underlying = self
            .unn_in
            .try_sub(self.unn_out)?
            .try_sub(self.unn_offset)?;

        self.unn_staked = self.unn_staked.try_add(net_underlying)?;
        self.xunn_offset = self.xunn_offset.try_add(difference)?;
        self.unn_offset = self.unn_offset.try_add(net_underlying)?;

        Ok(Some(net_underlying))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const DAY: u64 = 86_400;
    const T0: u64 = 1_700_000_000;

    fn bar_id() -> Address {
        Address([0xBA; 20])
    }

    fn holder(byte: u8) -> User {
        User::new(Address([byte; 20]), T0)
    }

    #[test]
    fn test_mint_sets_membership_and_stake() {
        let mut user = holder(1);
        assert!(!user.is_member());

        let change = user
            .record_mint(bar_id(), dec!(100), dec!(150), T0)
            .unwrap();

        assert_eq!(change, Membership::Entered);
        assert_eq!(user.bar, Some(bar_id()));
        assert_eq!(user.xunn, dec!(100));
        assert_eq!(user.unn_staked, dec!(150));
        assert!(user.xunn_age.is_zero());
    }

    #[test]
    fn test_age_uses_pre_event_balance() {
        let mut user = holder(1);
        user.record_mint(bar_id(), dec!(100), dec!(100), T0).unwrap();

        let change = user
            .record_mint(bar_id(), dec!(100), dec!(100), T0 + 3 * DAY)
            .unwrap();

        assert_eq!(change, Membership::Unchanged);
        assert_eq!(user.xunn_age, dec!(300));
        assert_eq!(user.xunn, dec!(200));
    }

    #[test]
    fn test_full_burn_destroys_all_age() {
        let mut user = holder(1);
        user.record_mint(bar_id(), dec!(3), dec!(3), T0).unwrap();

        // 3 shares held for a third of a day leave a non-terminating quotient
        let outflow = user
            .record_burn(bar_id(), dec!(3), dec!(3), T0 + DAY / 3)
            .unwrap();

        assert_eq!(outflow.membership, Membership::Left);
        assert_eq!(outflow.age, user.xunn_age_destroyed);
        assert!(user.xunn_age.is_zero());
        assert!(user.xunn.is_zero());
        assert!(user.bar.is_none());
    }

    #[test]
    fn test_partial_burn_is_proportional() {
        let mut user = holder(1);
        user.record_mint(bar_id(), dec!(100), dec!(100), T0).unwrap();

        let outflow = user
            .record_burn(bar_id(), dec!(40), dec!(40), T0 + 10 * DAY)
            .unwrap();

        assert_eq!(outflow.age, dec!(400));
        assert_eq!(user.xunn_age, dec!(600));
        assert_eq!(outflow.membership, Membership::Unchanged);
    }

    #[test]
    fn test_burn_without_balance_is_rejected() {
        let mut user = holder(1);
        let err = user
            .record_burn(bar_id(), dec!(1), dec!(1), T0)
            .unwrap_err();
        assert!(matches!(err, LedgerError::ZeroBalance { .. }));
    }

    #[test]
    fn test_overdraw_is_rejected() {
        let mut user = holder(1);
        user.record_mint(bar_id(), dec!(10), dec!(10), T0).unwrap();

        let err = user
            .record_send(bar_id(), dec!(11), dec!(11), T0)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_send_and_receive_carry_age() {
        let mut sender = holder(1);
        let mut recipient = holder(2);
        sender.record_mint(bar_id(), dec!(100), dec!(100), T0).unwrap();

        let outflow = sender
            .record_send(bar_id(), dec!(50), dec!(60), T0 + 2 * DAY)
            .unwrap();
        assert_eq!(outflow.age, dec!(100));
        assert_eq!(sender.xunn_age, dec!(100));
        assert_eq!(sender.xunn_out, dec!(50));
        assert_eq!(sender.unn_out, dec!(60));

        let inflow = recipient
            .record_receive(bar_id(), dec!(50), dec!(60), outflow.age, T0 + 2 * DAY)
            .unwrap();
        assert_eq!(inflow.membership, Membership::Entered);
        assert_eq!(inflow.restaked, Some(dec!(60)));
        assert_eq!(recipient.xunn_age, dec!(100));
        assert_eq!(recipient.unn_staked, dec!(60));
        assert_eq!(recipient.xunn_offset, dec!(50));
        assert_eq!(recipient.unn_offset, dec!(60));
    }

    #[test]
    fn test_round_trip_does_not_restake() {
        let mut user = holder(2);

        user.record_receive(bar_id(), dec!(50), dec!(50), Decimal::ZERO, T0)
            .unwrap();
        user.record_send(bar_id(), dec!(50), dec!(50), T0 + DAY)
            .unwrap();
        assert!(!user.is_member());

        // Same 50 coming back: difference is 100 - 50 - 50 = 0
        let inflow = user
            .record_receive(bar_id(), dec!(50), dec!(50), Decimal::ZERO, T0 + 2 * DAY)
            .unwrap();
        assert_eq!(inflow.restaked, None);
        assert_eq!(user.unn_staked, dec!(50));
        assert_eq!(inflow.membership, Membership::Entered);
    }
}
