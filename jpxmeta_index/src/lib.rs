// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=jpxmeta_index --heading-base-level=0

//! JPX Metadata Index: an incremental cluster index over scalar ranges and rectangles.
//!
//! The index is built for metadata that arrives piece by piece: it never needs the final
//! population, never rebuilds, and only ever splits.
//!
//! - Insert and remove [`Span`]s (1-D) or [`Rect`]s (2-D) with small copyable payloads.
//! - Enumerate everything intersecting a query, lazily, with a resumable [`Cursor`].
//! - Look up an entry by its exact extent with [`ClusterIndex::find_exact`].
//!
//! Entries are grouped by granularity, the smallest power of two covering their longest
//! side. Every granularity gets its own root cluster. A cluster starts as a flat leaf and is
//! subdivided into aligned power-of-two buckets only once it holds more than
//! [`IndexConfig::split_threshold`] entries, so sparse data stays flat and dense data gets
//! as many levels as it needs.
//!
//! # Example
//!
//! ```rust
//! use jpxmeta_index::{ClusterIndex, Span};
//!
//! let mut idx: ClusterIndex<Span, u32> = ClusterIndex::new();
//! let k1 = idx.insert(Span::point(3), 1);
//! let _k2 = idx.insert(Span::new(7, 10), 2);
//!
//! // Everything touching the value 8.
//! let hits: Vec<_> = idx.matches(Span::point(8), |_, _| true).collect();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].1, 2);
//!
//! assert_eq!(idx.remove(k1), Some(1));
//! assert_eq!(idx.len(), 1);
//! ```
//!
//! Enumeration can be suspended and resumed, which lets callers interleave queries with
//! other work:
//!
//! ```rust
//! use jpxmeta_index::{ClusterIndex, Rect};
//!
//! let mut idx: ClusterIndex<Rect, u32> = ClusterIndex::new();
//! for i in 0..4_u32 {
//!     idx.insert(Rect::from_xywh(i64::from(i) * 10, 0, 5, 5), i);
//! }
//!
//! let query = Rect::from_xywh(0, 0, 100, 1);
//! let mut cursor = None;
//! let mut seen = 0;
//! while let Some((_key, _payload, next)) = idx.next_match(&query, cursor, |_, _| true) {
//!     seen += 1;
//!     cursor = Some(next);
//! }
//! assert_eq!(seen, 4);
//! ```
//!
//! ## Tuning
//!
//! The split threshold and the number of bits each cluster level removes are set per index
//! through [`IndexConfig`]. Defaults come from the extent type: 8 entries and 3 bits for
//! spans, 16 entries and 2 bits per axis for rectangles.
//!
//! ## Cursors
//!
//! A [`Cursor`] stays valid only while the index is unchanged. Resuming after a mutation
//! never panics, but the remaining matches may include repeats or miss entries.

#![no_std]

extern crate alloc;

mod cluster;
pub mod config;
pub mod index;
pub mod stats;
pub mod types;

pub use config::{ConfigError, IndexConfig};
pub use index::{ClusterIndex, Cursor, Key, Matches};
pub use stats::IndexStats;
pub use types::{Extent, Rect, Span};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn clear_resets_everything() {
        let mut idx: ClusterIndex<Span, u8> = ClusterIndex::new();
        for v in 0..40_u8 {
            idx.insert(Span::point(i64::from(v) * 3), v);
        }
        assert_eq!(idx.len(), 40);
        idx.clear();
        assert!(idx.is_empty());
        assert_eq!(idx.len(), 0);
        assert_eq!(idx.stats(), IndexStats::default());
        assert_eq!(idx.matches(Span::ALL, |_, _| true).count(), 0);
    }

    #[test]
    fn keys_survive_unrelated_removals() {
        let mut idx: ClusterIndex<Span, u8> = ClusterIndex::new();
        let keys: Vec<_> = (0..20_u8)
            .map(|v| idx.insert(Span::point(i64::from(v)), v))
            .collect();
        for k in &keys[..10] {
            idx.remove(*k);
        }
        for (v, k) in keys.iter().enumerate().skip(10) {
            assert_eq!(idx.get(*k).map(|(_, p)| usize::from(*p)), Some(v));
        }
        assert!(!idx.contains(keys[0]));
        // A reused slot must not revive a stale key.
        let fresh = idx.insert(Span::point(100), 100);
        assert_ne!(fresh, keys[9]);
        assert!(idx.get(keys[9]).is_none());
    }
}
