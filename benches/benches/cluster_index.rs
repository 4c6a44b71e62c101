// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use jpxmeta_index::{ClusterIndex, Rect, Span};

fn gen_grid_rects(n: i64, cell: i64) -> Vec<Rect> {
    let mut out = Vec::new();
    for y in 0..n {
        for x in 0..n {
            out.push(Rect::from_xywh(x * cell, y * cell, cell, cell));
        }
    }
    out
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn below(&mut self, bound: u64) -> i64 {
        i64::try_from(self.next_u64() % bound).unwrap_or(0)
    }
}

fn gen_random_rects(count: usize, extent: u64, max_side: u64) -> Vec<Rect> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| {
            let w = 1 + rng.below(max_side);
            let h = 1 + rng.below(max_side);
            Rect::from_xywh(rng.below(extent), rng.below(extent), w, h)
        })
        .collect()
}

fn gen_clustered_rects(n_clusters: usize, per_cluster: usize, spread: u64) -> Vec<Rect> {
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    for _ in 0..n_clusters {
        let (cx, cy) = (rng.below(1 << 16), rng.below(1 << 16));
        for _ in 0..per_cluster {
            out.push(Rect::from_xywh(
                cx + rng.below(spread),
                cy + rng.below(spread),
                12,
                12,
            ));
        }
    }
    out
}

fn gen_layer_sets(count: usize) -> Vec<Span> {
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    (0..count)
        .map(|_| {
            let first = rng.below(4096);
            Span::new(first, first + 1 + rng.below(4))
        })
        .collect()
}

fn build<E: jpxmeta_index::Extent>(items: &[E]) -> ClusterIndex<E, usize> {
    let mut idx = ClusterIndex::new();
    for (i, item) in items.iter().enumerate() {
        idx.insert(*item, i);
    }
    idx
}

fn bench_regions(c: &mut Criterion) {
    let mut group = c.benchmark_group("regions");
    let query = Rect::from_xywh(100, 100, 400, 400);
    for n in [32_i64, 64, 128] {
        let rects = gen_grid_rects(n, 10);
        group.throughput(Throughput::Elements(rects.len() as u64));
        group.bench_function(format!("insert_query_grid_n{n}"), |b| {
            b.iter_batched(
                ClusterIndex::<Rect, usize>::new,
                |mut idx| {
                    for (i, r) in rects.iter().enumerate() {
                        idx.insert(*r, i);
                    }
                    black_box(idx.matches(query, |_, _| true).count());
                },
                BatchSize::SmallInput,
            );
        });
    }

    let datasets = [
        ("random", gen_random_rects(20_000, 1 << 14, 64)),
        ("clustered", gen_clustered_rects(40, 500, 256)),
    ];
    for (name, rects) in &datasets {
        let idx = build(rects);
        group.bench_function(format!("query_{name}"), |b| {
            b.iter(|| black_box(idx.matches(query, |_, _| true).count()));
        });
        group.bench_function(format!("linear_scan_{name}"), |b| {
            b.iter(|| {
                black_box(
                    rects
                        .iter()
                        .filter(|r| {
                            r.min_x < query.lim_x
                                && query.min_x < r.lim_x
                                && r.min_y < query.lim_y
                                && query.min_y < r.lim_y
                        })
                        .count(),
                )
            });
        });
    }
    group.finish();
}

fn bench_spans(c: &mut Criterion) {
    let mut group = c.benchmark_group("spans");
    let spans = gen_layer_sets(50_000);
    group.throughput(Throughput::Elements(spans.len() as u64));
    group.bench_function("insert_50k", |b| {
        b.iter(|| black_box(build(&spans).len()));
    });
    let idx = build(&spans);
    group.bench_function("point_query", |b| {
        let mut v = 0_i64;
        b.iter(|| {
            v = (v + 97) % 4096;
            black_box(idx.matches(Span::point(v), |_, _| true).count())
        });
    });
    group.bench_function("remove_half", |b| {
        b.iter_batched(
            || {
                let mut idx = ClusterIndex::new();
                let keys: Vec<_> = spans.iter().map(|s| idx.insert(*s, 0_u8)).collect();
                (idx, keys)
            },
            |(mut idx, keys)| {
                for k in keys.iter().step_by(2) {
                    idx.remove(*k);
                }
                black_box(idx.len());
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_regions, bench_spans);
criterion_main!(benches);
