// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of the cluster index: insert, query, split, and remove.

use jpxmeta_index::{ClusterIndex, Span};

fn main() {
    let mut idx: ClusterIndex<Span, u32> = ClusterIndex::new();
    let k1 = idx.insert(Span::point(3), 1);
    let _k2 = idx.insert(Span::new(7, 10), 2);

    // Query a value
    let hits: Vec<_> = idx.matches(Span::point(8), |_, _| true).collect();
    println!("hits at 8: {:?}", hits);

    // Enough spread-out entries to force a split
    for v in 0..64 {
        idx.insert(Span::point(v * 1000), 100 + u32::try_from(v).unwrap_or(0));
    }
    println!("after bulk insert: {:?}", idx.stats());

    idx.remove(k1);
    println!("after removal: {:?}", idx);
}
