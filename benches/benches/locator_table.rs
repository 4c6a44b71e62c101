// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use jpxmeta_locator::{LocatorConfig, LocatorTable};

fn scattered_positions(count: u64) -> Vec<u64> {
    // Multiplicative hashing gives a repeatable, unsorted order.
    (0..count)
        .map(|i| i.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 20)
        .collect()
}

fn bench_locators(c: &mut Criterion) {
    let mut group = c.benchmark_group("locators");
    let positions = scattered_positions(100_000);
    group.throughput(Throughput::Elements(positions.len() as u64));
    for capacity in [16_usize, 64, 256] {
        group.bench_function(format!("insert_scattered_cap{capacity}"), |b| {
            b.iter_batched(
                || {
                    LocatorTable::<u32, u32>::with_config(LocatorConfig {
                        block_capacity: capacity,
                    })
                    .unwrap()
                },
                |mut table| {
                    for p in &positions {
                        table.get_or_insert(*p);
                    }
                    black_box(table.depth());
                },
                BatchSize::LargeInput,
            );
        });
    }

    let mut table: LocatorTable<u32, u32> = LocatorTable::new();
    for (node, p) in (0_u32..).zip(&positions) {
        table.resolve(*p, node);
    }
    group.bench_function("find_resolved", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 7919) % positions.len();
            black_box(table.find(positions[i]).is_some())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_locators);
criterion_main!(benches);
