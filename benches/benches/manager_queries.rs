// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use jpxmeta_index::Rect;
use jpxmeta_library::{AssocKey, EntryKey, MetaManager, Query};

fn populated(count: u32) -> MetaManager<u32> {
    let mut meta = MetaManager::new();
    for owner in 0..count {
        let key = AssocKey::new()
            .with_codestreams([owner % 13])
            .with_layers([owner % 101, owner % 7]);
        meta.notify_entry_ready(owner, EntryKey::Association(key));
        let x = i64::from(owner % 300) * 16;
        let y = i64::from(owner / 300) * 16;
        meta.notify_entry_ready(
            count + owner,
            EntryKey::Region {
                scope: None,
                rect: Rect::from_xywh(x, y, 12, 12),
            },
        );
    }
    meta
}

fn bench_manager(c: &mut Criterion) {
    let mut group = c.benchmark_group("manager");
    let meta = populated(30_000);
    let by_layer = Query {
        layer: Some(42),
        ..Query::default()
    };
    group.bench_function("layer_query", |b| {
        b.iter(|| black_box(meta.matches(&by_layer).count()));
    });
    let by_either = Query {
        layer: Some(3),
        codestream: Some(5),
        ..Query::default()
    };
    group.bench_function("union_query", |b| {
        b.iter(|| black_box(meta.matches(&by_either).count()));
    });
    let probe = Query {
        region: Some(Rect::from_xywh(400, 400, 200, 200)),
        min_size: 8,
        ..Query::default()
    };
    group.bench_function("region_probe", |b| {
        b.iter(|| black_box(meta.matches(&probe).count()));
    });
    group.finish();
}

criterion_group!(benches, bench_manager);
criterion_main!(benches);
