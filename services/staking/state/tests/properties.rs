//! Invariants checked after every event of random mint/transfer/burn histories

use proptest::prelude::*;
use rust_decimal::Decimal;
use state_staking::testing::{FixedPoolReader, ONE_TOKEN};
use state_staking::{BarIndexer, EntityStore, MemoryStore, RecordingNotifier};
use std::collections::HashMap;
use types::precision::scale_amount;
use types::{Address, EventPosition, TransferEvent};

const BAR: Address = Address([0xBA; 20]);
const HOLDERS: [Address; 3] = [
    Address([0x01; 20]),
    Address([0x02; 20]),
    Address([0x03; 20]),
];

#[derive(Debug, Clone)]
enum Op {
    Mint { holder: usize, raw: u128 },
    Burn { holder: usize, percent: u128 },
    Send { from: usize, to: usize, percent: u128 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 1..1_000 * ONE_TOKEN).prop_map(|(holder, raw)| Op::Mint { holder, raw }),
        (0..3usize, 1..=100u128).prop_map(|(holder, percent)| Op::Burn { holder, percent }),
        (0..3usize, 0..3usize, 1..=100u128)
            .prop_map(|(from, to, percent)| Op::Send { from, to, percent }),
    ]
}

/// Turn ops into events, skipping those the model says would overdraw
fn events(ops: &[Op], gaps: &[u64]) -> Vec<TransferEvent> {
    let mut balances: HashMap<usize, u128> = HashMap::new();
    let mut timestamp = 1_650_000_000u64;
    let mut out = Vec::new();

    for (i, op) in ops.iter().enumerate() {
        timestamp += gaps[i % gaps.len()];

        let (from, to, value) = match *op {
            Op::Mint { holder, raw } => {
                *balances.entry(holder).or_default() += raw;
                (Address::ZERO, HOLDERS[holder], raw)
            }
            Op::Burn { holder, percent } => {
                let balance = balances.entry(holder).or_default();
                let value = *balance * percent / 100;
                if value == 0 {
                    continue;
                }
                *balance -= value;
                (HOLDERS[holder], Address::ZERO, value)
            }
            Op::Send { from, to, percent } => {
                let value = balances.get(&from).copied().unwrap_or_default() * percent / 100;
                if value == 0 {
                    continue;
                }
                *balances.entry(from).or_default() -= value;
                *balances.entry(to).or_default() += value;
                (HOLDERS[from], HOLDERS[to], value)
            }
        };

        out.push(TransferEvent {
            from,
            to,
            value,
            block_timestamp: timestamp,
            transaction_hash: [0u8; 32],
            position: EventPosition::new(i as u64 + 1, 0),
        });
    }

    out
}

fn check_invariants(store: &MemoryStore) -> Result<(), TestCaseError> {
    let bar = store.load_bar(&BAR).unwrap().unwrap();
    prop_assert!(bar.xunn_age >= Decimal::ZERO, "bar age {}", bar.xunn_age);

    let mut total = Decimal::ZERO;
    for user in store.users() {
        prop_assert!(user.xunn >= Decimal::ZERO);
        prop_assert!(user.xunn_age >= Decimal::ZERO, "user age {}", user.xunn_age);
        prop_assert_eq!(user.xunn.is_zero(), user.bar.is_none());
        total += user.xunn;
    }

    prop_assert_eq!(bar.xunn_minted - bar.xunn_burned, total);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_conservation_membership_and_age(
        ops in prop::collection::vec(op(), 1..40),
        gaps in prop::collection::vec(0u64..200_000, 1..8),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let events = events(&ops, &gaps);

        runtime.block_on(async {
            let mut indexer = BarIndexer::new(
                BAR,
                MemoryStore::new(),
                FixedPoolReader::at_par(1_000_000),
                RecordingNotifier::new(),
            );

            let mut expected: HashMap<Address, u128> = HashMap::new();
            for event in &events {
                indexer.handle_transfer(event).await.unwrap();

                if !event.from.is_zero() {
                    *expected.entry(event.from).or_default() -= event.value;
                }
                if !event.to.is_zero() {
                    *expected.entry(event.to).or_default() += event.value;
                }

                check_invariants(indexer.store())?;
            }

            for (holder, raw) in expected {
                let user = indexer.store().load_user(&holder).unwrap().unwrap();
                prop_assert_eq!(user.xunn, scale_amount(raw, 18).unwrap());
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
