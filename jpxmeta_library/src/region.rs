// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-index library of region-of-interest owners.

use core::fmt::Debug;

use jpxmeta_index::{ClusterIndex, ConfigError, Cursor, IndexConfig, IndexStats, Key, Rect};

/// Owners of region descriptors, indexed by their bounding rectangle.
pub struct RegionLibrary<O: Copy + Debug> {
    index: ClusterIndex<Rect, O>,
}

impl<O: Copy + Debug> Debug for RegionLibrary<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegionLibrary")
            .field("regions", &self.index.len())
            .field("roots", &self.index.root_count())
            .finish_non_exhaustive()
    }
}

impl<O: Copy + Debug> Default for RegionLibrary<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Copy + Debug> RegionLibrary<O> {
    /// Create an empty library with the default region split policy.
    pub fn new() -> Self {
        Self {
            index: ClusterIndex::new(),
        }
    }

    /// Create an empty library with an explicit split policy.
    pub fn with_config(config: IndexConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            index: ClusterIndex::with_config(config)?,
        })
    }

    /// Add a region owned by `owner`.
    pub fn add(&mut self, rect: Rect, owner: O) -> Key {
        debug_assert!(!rect.is_empty(), "region descriptors have a positive area");
        self.index.insert(rect, owner)
    }

    /// Remove a region, returning its owner.
    pub fn remove(&mut self, key: Key) -> Option<O> {
        self.index.remove(key)
    }

    /// The rectangle of a live region.
    pub fn rect(&self, key: Key) -> Option<Rect> {
        self.index.get(key).map(|(rect, _)| *rect)
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True once the last region is gone; the owner may then drop the library.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Find the next region intersecting `region` whose longer side is at least
    /// `min_size`, resuming after `cursor`.
    pub fn next_match(
        &self,
        region: &Rect,
        min_size: u64,
        cursor: Option<Cursor>,
    ) -> Option<(O, Cursor)> {
        self.index
            .next_match(region, cursor, |rect, _| rect.longest_side() >= min_size)
            .map(|(_, owner, cursor)| (owner, cursor))
    }

    /// Every owner matching `region` and `min_size`.
    pub fn matches(&self, region: Rect, min_size: u64) -> impl Iterator<Item = O> + '_ {
        self.index
            .matches(region, move |rect, _| rect.longest_side() >= min_size)
            .map(|(_, owner)| owner)
    }

    /// Shape of the underlying index.
    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn size_floor_filters_small_regions() {
        let mut lib = RegionLibrary::new();
        lib.add(Rect::from_xywh(0, 0, 4, 4), 'a');
        lib.add(Rect::from_xywh(2, 2, 40, 3), 'b');
        lib.add(Rect::from_xywh(100, 100, 50, 50), 'c');

        let query = Rect::from_xywh(0, 0, 10, 10);
        let mut hits: Vec<char> = lib.matches(query, 0).collect();
        hits.sort_unstable();
        assert_eq!(hits, vec!['a', 'b']);
        let hits: Vec<char> = lib.matches(query, 5).collect();
        assert_eq!(hits, vec!['b']);
        assert_eq!(lib.matches(Rect::ALL, 60).count(), 0);
    }

    #[test]
    fn empties_itself() {
        let mut lib = RegionLibrary::new();
        let k = lib.add(Rect::from_xywh(5, 5, 1, 1), 1_u32);
        assert_eq!(lib.rect(k), Some(Rect::new(5, 5, 6, 6)));
        assert!(!lib.is_empty());
        assert_eq!(lib.remove(k), Some(1));
        assert!(lib.is_empty());
        assert_eq!(lib.rect(k), None);
    }
}
