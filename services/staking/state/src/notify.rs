//! Notification Sink
//!
//! Fire-and-forget diagnostics emitted while events are processed. A
//! notifier never returns an error and nothing reads notices back, so sinks
//! cannot influence accounting.
//!
//! Notices for an event are buffered by the dispatcher and only flushed after
//! the change set commits; a failed event produces no notices apart from the
//! zero-value skip, which has no state to commit.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{info, warn};
use types::Address;

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Transfer with a decimal value of zero, discarded
    ZeroValue { raw: u128, tx: String },

    Minted {
        holder: Address,
        value: Decimal,
        underlying: Decimal,
        staked_before: Decimal,
        staked_after: Decimal,
    },

    Burned { holder: Address, value: Decimal },

    Transferred {
        from: Address,
        to: Address,
        value: Decimal,
    },

    EnteredBar { holder: Address, by_transfer: bool },

    LeftBar { holder: Address, by_transfer: bool },

    /// Recipient credited with the underlying value of net new shares
    ReceivedStake {
        holder: Address,
        from: Address,
        value: Decimal,
        underlying: Decimal,
    },
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Forwards notices to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::ZeroValue { raw, tx } => {
                warn!("Transfer zero value! Value: {} Tx: {}", raw, tx);
            }
            Notice::Minted {
                holder,
                value,
                underlying,
                staked_before,
                staked_after,
            } => {
                info!(
                    "{} minted {} xUNN in exchange for {} UNN - UNNStaked before {} UNNStaked after {}",
                    holder, value, underlying, staked_before, staked_after
                );
            }
            Notice::Burned { holder, value } => {
                info!("{} burned {} xUNN", holder, value);
            }
            Notice::Transferred { from, to, value } => {
                info!("transferred {} xUNN from {} to {}", value, from, to);
            }
            Notice::EnteredBar {
                holder,
                by_transfer,
            } => {
                if by_transfer {
                    info!("{} entered the bar by transfer IN", holder);
                } else {
                    info!("{} entered the bar", holder);
                }
            }
            Notice::LeftBar {
                holder,
                by_transfer,
            } => {
                if by_transfer {
                    info!("{} left the bar by transfer OUT", holder);
                } else {
                    info!("{} left the bar", holder);
                }
            }
            Notice::ReceivedStake {
                holder,
                from,
                value,
                underlying,
            } => {
                info!(
                    "{} received a transfer of {} xUNN from {}, UNN value of transfer is {}",
                    holder, value, from, underlying
                );
            }
        }
    }
}

/// Keeps every notice in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn clear(&self) {
        self.notices.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_recording_notifier_through_arc() {
        let recorder = Arc::new(RecordingNotifier::new());
        let sink: Arc<RecordingNotifier> = Arc::clone(&recorder);

        sink.notify(Notice::Burned {
            holder: Address([1u8; 20]),
            value: Decimal::ONE,
        });
        TracingNotifier.notify(Notice::ZeroValue {
            raw: 0,
            tx: "0x00".to_string(),
        });

        assert_eq!(recorder.notices().len(), 1);
        recorder.clear();
        assert!(recorder.notices().is_empty());
    }
}
