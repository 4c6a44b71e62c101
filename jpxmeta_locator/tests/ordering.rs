// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Randomized checks of the locator table against a `BTreeMap`.

use std::collections::BTreeMap;

use jpxmeta_locator::{Locator, LocatorConfig, LocatorTable};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Wait(u64, u32),
    Resolve(u64, u32),
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            (0_u64..2_000, any::<u32>()).prop_map(|(p, w)| Op::Wait(p, w)),
            (0_u64..2_000, any::<u32>()).prop_map(|(p, n)| Op::Resolve(p, n)),
        ],
        0..400,
    )
}

#[derive(Default)]
struct Model {
    resolved: Option<u32>,
    waiting: Vec<u32>,
}

proptest! {
    #[test]
    fn behaves_like_a_sorted_map(ops in arb_ops(), capacity in 4_usize..16) {
        let mut table: LocatorTable<u32, u32> =
            LocatorTable::with_config(LocatorConfig { block_capacity: capacity }).unwrap();
        let mut model: BTreeMap<u64, Model> = BTreeMap::new();
        for op in ops {
            match op {
                Op::Wait(position, waiter) => {
                    let entry = model.entry(position).or_default();
                    let got = table.register_waiter(position, waiter);
                    prop_assert_eq!(got, entry.resolved);
                    if entry.resolved.is_none() {
                        entry.waiting.push(waiter);
                    }
                }
                Op::Resolve(position, node) => {
                    let entry = model.entry(position).or_default();
                    let drained = table.resolve(position, node);
                    if entry.resolved.is_none() {
                        prop_assert_eq!(drained, std::mem::take(&mut entry.waiting));
                        entry.resolved = Some(node);
                    } else {
                        prop_assert!(drained.is_empty());
                    }
                }
            }
        }
        prop_assert_eq!(table.len(), model.len());
        let positions: Vec<u64> = table.iter().map(Locator::position).collect();
        prop_assert_eq!(positions, model.keys().copied().collect::<Vec<_>>());
        for (position, entry) in &model {
            let loc = table.find(*position);
            prop_assert_eq!(loc.and_then(Locator::node), entry.resolved);
            prop_assert_eq!(loc.map(Locator::waiting), Some(entry.waiting.len()));
        }
    }
}
