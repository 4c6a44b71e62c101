// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `ClusterIndex` API: insertion with lazy splitting, removal with pruning, and
//! resumable enumeration.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::cluster::{Arena, Body, Cluster, ClusterId};
use crate::config::{ConfigError, IndexConfig};
use crate::stats::IndexStats;
use crate::types::Extent;

/// Generational handle for entries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Index keys are intentionally 32-bit; higher bits are truncated by design."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Resumption point of an enumeration.
///
/// Names the leaf cluster and the position within it of the last match. A cursor is only
/// meaningful for the index that produced it and only while that index is not mutated;
/// after an insertion or removal, resuming may repeat or miss matches but never panics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cursor {
    cluster: ClusterId,
    position: u32,
}

#[derive(Clone, Debug)]
struct Slot<E, P> {
    extent: E,
    payload: P,
    leaf: ClusterId,
}

/// Incremental cluster index over extents of type `E` carrying payloads `P`.
///
/// Roots are kept one per granularity, coarsest first. Each root starts as a flat leaf and
/// is subdivided into aligned power-of-two buckets only when it overflows the configured
/// split threshold, so the index never needs to know its final population.
pub struct ClusterIndex<E: Extent, P: Copy + Debug> {
    config: IndexConfig,
    entries: Vec<Option<Slot<E, P>>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    clusters: Arena<E>,
    roots: Vec<ClusterId>,
}

impl<E: Extent, P: Copy + Debug> Debug for ClusterIndex<E, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClusterIndex")
            .field("config", &self.config)
            .field("entries", &self.len())
            .field("roots", &self.roots.len())
            .field("clusters", &self.clusters.live())
            .finish_non_exhaustive()
    }
}

impl<E: Extent, P: Copy + Debug> Default for ClusterIndex<E, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Extent, P: Copy + Debug> ClusterIndex<E, P> {
    /// Create an empty index with the default policy for `E`.
    pub fn new() -> Self {
        Self::from_valid_config(IndexConfig::for_extent::<E>())
    }

    /// Create an empty index with an explicit split policy.
    pub fn with_config(config: IndexConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_valid_config(config.validate()?))
    }

    fn from_valid_config(config: IndexConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            clusters: Arena::default(),
            roots: Vec::new(),
        }
    }

    /// The split policy in use.
    pub fn config(&self) -> IndexConfig {
        self.config
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len() - self.free_list.len()
    }

    /// True if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of root clusters, which is the number of distinct granularities in use.
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Remove every entry and cluster.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generations.clear();
        self.free_list.clear();
        self.clusters.clear();
        self.roots.clear();
    }

    /// Insert an entry. Returns a stable handle `Key`.
    pub fn insert(&mut self, extent: E, payload: P) -> Key {
        let granularity = extent.granularity_log2();
        let leaf = self.leaf_for(&extent, granularity);
        let key = self.alloc_slot(Slot {
            extent,
            payload,
            leaf,
        });
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Slot indices share the 32-bit range of keys."
        )]
        self.clusters.node_mut(leaf).slots_mut().push(key.idx() as u32);
        self.rebalance(leaf);
        key
    }

    /// Remove an entry, returning its payload. Stale keys are ignored.
    pub fn remove(&mut self, key: Key) -> Option<P> {
        if !self.contains(key) {
            tracing::warn!(?key, "ignoring removal of a stale index key");
            return None;
        }
        let slot = self.entries[key.idx()].take()?;
        self.free_list.push(key.idx());
        let slots = self.clusters.node_mut(slot.leaf).slots_mut();
        let position = slots.iter().position(|&s| s as usize == key.idx());
        debug_assert!(position.is_some(), "entry missing from its leaf cluster");
        if let Some(position) = position {
            slots.remove(position);
        }
        self.prune(slot.leaf);
        Some(slot.payload)
    }

    /// Returns true if `key` refers to a live entry.
    pub fn contains(&self, key: Key) -> bool {
        self.generations.get(key.idx()) == Some(&key.1)
            && self.entries.get(key.idx()).is_some_and(Option::is_some)
    }

    /// The extent and payload of a live entry.
    pub fn get(&self, key: Key) -> Option<(&E, &P)> {
        if !self.contains(key) {
            return None;
        }
        let slot = self.entries[key.idx()].as_ref()?;
        Some((&slot.extent, &slot.payload))
    }

    /// Find an entry with exactly this extent whose payload satisfies `pred`.
    ///
    /// Only the leaf the extent would be inserted into is scanned.
    pub fn find_exact(&self, extent: &E, mut pred: impl FnMut(&P) -> bool) -> Option<Key> {
        let granularity = extent.granularity_log2();
        let mut current = *self
            .roots
            .iter()
            .find(|&&r| self.clusters.node(r).granularity_log2 == granularity)?;
        loop {
            match &self.clusters.node(current).body {
                Body::Leaf(slots) => {
                    return slots.iter().find_map(|&s| {
                        let slot = self.slot(s);
                        (slot.extent == *extent && pred(&slot.payload)).then(|| self.key_of(s))
                    });
                }
                Body::Branch {
                    child_log2,
                    children,
                } => {
                    current = *children.iter().find(|&&c| {
                        self.clusters
                            .node(c)
                            .cover
                            .shares_bucket(extent, *child_log2)
                    })?;
                }
            }
        }
    }

    /// Find the next entry intersecting `query` that also satisfies `pred`.
    ///
    /// Pass `None` to start from the beginning, or the cursor returned with the previous
    /// match to continue after it. Roots are visited from coarsest to finest granularity,
    /// clusters depth-first, and leaf entries in order.
    pub fn next_match<F>(
        &self,
        query: &E,
        cursor: Option<Cursor>,
        mut pred: F,
    ) -> Option<(Key, P, Cursor)>
    where
        F: FnMut(&E, &P) -> bool,
    {
        let (mut leaf, mut start) = match cursor {
            None => (self.first_leaf_from(0, query)?, 0),
            Some(cursor) => {
                // A freed cluster means the index changed under the cursor: stop.
                let node = self.clusters.get(cursor.cluster)?;
                if !matches!(node.body, Body::Leaf(_)) {
                    return None;
                }
                (cursor.cluster, cursor.position as usize + 1)
            }
        };
        loop {
            if let Body::Leaf(slots) = &self.clusters.node(leaf).body {
                for (position, &s) in slots.iter().enumerate().skip(start) {
                    let slot = self.slot(s);
                    if slot.extent.intersects(query) && pred(&slot.extent, &slot.payload) {
                        #[allow(
                            clippy::cast_possible_truncation,
                            reason = "Leaf positions are bounded by the 32-bit slot range."
                        )]
                        let cursor = Cursor {
                            cluster: leaf,
                            position: position as u32,
                        };
                        return Some((self.key_of(s), slot.payload, cursor));
                    }
                }
            }
            leaf = self.next_leaf(leaf, query)?;
            start = 0;
        }
    }

    /// Iterate entries intersecting `query` that satisfy `pred`.
    pub fn matches<F>(&self, query: E, pred: F) -> Matches<'_, E, P, F>
    where
        F: FnMut(&E, &P) -> bool,
    {
        Matches {
            index: self,
            query,
            cursor: None,
            pred,
            done: false,
        }
    }

    /// Walk the whole forest and summarize its shape.
    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            entries: self.len(),
            roots: self.roots.len(),
            ..IndexStats::default()
        };
        let mut stack: Vec<(ClusterId, usize)> = self.roots.iter().map(|&r| (r, 1)).collect();
        while let Some((id, depth)) = stack.pop() {
            let node = self.clusters.node(id);
            match &node.body {
                Body::Leaf(slots) => stats.visit_leaf(depth, slots.len()),
                Body::Branch { children, .. } => {
                    stats.visit_branch(depth, children.len());
                    stack.extend(children.iter().map(|&c| (c, depth + 1)));
                }
            }
        }
        stats
    }

    // --- internals ---

    fn slot(&self, s: u32) -> &Slot<E, P> {
        self.entries[s as usize]
            .as_ref()
            .expect("leaf references a freed entry")
    }

    fn key_of(&self, s: u32) -> Key {
        Key::new(s as usize, self.generations[s as usize])
    }

    fn alloc_slot(&mut self, slot: Slot<E, P>) -> Key {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.entries[idx] = Some(slot);
            Key::new(idx, generation)
        } else {
            self.entries.push(Some(slot));
            self.generations.push(1);
            Key::new(self.entries.len() - 1, 1)
        }
    }

    /// Find or create the root for `granularity`, growing its cover to include `extent`.
    fn root_for(&mut self, extent: &E, granularity: u32) -> ClusterId {
        let found = self
            .roots
            .binary_search_by(|r| granularity.cmp(&self.clusters.node(*r).granularity_log2));
        match found {
            Ok(i) => {
                let root = self.roots[i];
                let node = self.clusters.node_mut(root);
                node.cover = node.cover.union(extent);
                root
            }
            Err(i) => {
                let root = self.clusters.alloc(Cluster::root(granularity, *extent));
                self.roots.insert(i, root);
                tracing::trace!(granularity, roots = self.roots.len(), "created root cluster");
                root
            }
        }
    }

    /// Descend to the leaf that should hold `extent`, creating missing clusters.
    fn leaf_for(&mut self, extent: &E, granularity: u32) -> ClusterId {
        let mut current = self.root_for(extent, granularity);
        while !matches!(self.clusters.node(current).body, Body::Leaf(_)) {
            current = self.child_for(current, extent, || Body::Leaf(Vec::new()));
        }
        current
    }

    /// Find the child of `parent` whose bucket holds `anchor`, creating it with `new_body`.
    fn child_for(
        &mut self,
        parent: ClusterId,
        anchor: &E,
        new_body: impl FnOnce() -> Body,
    ) -> ClusterId {
        let node = self.clusters.node(parent);
        let granularity = node.granularity_log2;
        let Body::Branch {
            child_log2,
            children,
        } = &node.body
        else {
            unreachable!("child lookup on a leaf cluster");
        };
        let child_log2 = *child_log2;
        let found = children.iter().copied().find(|&c| {
            self.clusters
                .node(c)
                .cover
                .shares_bucket(anchor, child_log2)
        });
        if let Some(child) = found {
            return child;
        }
        let child = self.clusters.alloc(Cluster::child(
            parent,
            child_log2,
            granularity,
            anchor,
            new_body(),
        ));
        self.clusters.node_mut(parent).children_mut().push(child);
        child
    }

    /// Apply the split policy after `leaf` received an entry.
    fn rebalance(&mut self, leaf: ClusterId) {
        self.split_leaf(leaf);
        let mut current = self.clusters.node(leaf).parent;
        while let Some(id) = current {
            self.deepen(id);
            current = self.clusters.node(id).parent;
        }
    }

    /// Turn an overfull leaf into a branch of sub-bucket leaves.
    fn split_leaf(&mut self, id: ClusterId) {
        let node = self.clusters.node(id);
        let Body::Leaf(slots) = &node.body else {
            return;
        };
        let span_log2 = node.span_log2();
        let granularity = node.granularity_log2;
        // Buckets no larger than the granularity cannot separate anything further.
        if slots.len() <= self.config.split_threshold || span_log2 <= granularity {
            return;
        }
        let child_log2 = span_log2
            .saturating_sub(self.config.step_bits)
            .max(granularity);
        let node = self.clusters.node_mut(id);
        let slots = core::mem::take(node.slots_mut());
        node.body = Body::Branch {
            child_log2,
            children: Vec::new(),
        };
        for s in slots {
            let extent = self.slot(s).extent;
            let child = self.child_for(id, &extent, || Body::Leaf(Vec::new()));
            self.clusters.node_mut(child).slots_mut().push(s);
            if let Some(slot) = self.entries[s as usize].as_mut() {
                slot.leaf = child;
            }
        }
        let children = self.clusters.node(id).children().to_vec();
        tracing::trace!(
            span_log2,
            child_log2,
            children = children.len(),
            "split leaf cluster"
        );
        for child in children {
            self.split_leaf(child);
        }
        self.deepen(id);
    }

    /// Give an overfull branch one more level of fan-out.
    fn deepen(&mut self, id: ClusterId) {
        let node = self.clusters.node(id);
        let Body::Branch {
            child_log2,
            children,
        } = &node.body
        else {
            return;
        };
        if children.len() <= self.config.split_threshold {
            return;
        }
        let child_log2 = *child_log2;
        let span_log2 = node.span_log2();
        let inner_log2 = span_log2
            .saturating_sub(self.config.step_bits)
            .max(child_log2 + 1);
        if inner_log2 >= span_log2 {
            return;
        }
        let children = match &mut self.clusters.node_mut(id).body {
            Body::Branch {
                child_log2,
                children,
            } => {
                *child_log2 = inner_log2;
                core::mem::take(children)
            }
            Body::Leaf(_) => unreachable!("checked above"),
        };
        for child in children {
            let anchor = self.clusters.node(child).cover;
            let inner = self.child_for(id, &anchor, || Body::Branch {
                child_log2,
                children: Vec::new(),
            });
            self.clusters.node_mut(inner).children_mut().push(child);
            self.clusters.node_mut(child).parent = Some(inner);
        }
        let inner = self.clusters.node(id).children().to_vec();
        tracing::trace!(
            span_log2,
            inner_log2,
            child_log2,
            inner = inner.len(),
            "added cluster level"
        );
        for cluster in inner {
            self.deepen(cluster);
        }
    }

    /// Remove emptied clusters from `id` upwards.
    fn prune(&mut self, mut id: ClusterId) {
        loop {
            if self.clusters.node(id).len() != 0 {
                return;
            }
            let Some(node) = self.clusters.free(id) else {
                return;
            };
            match node.parent {
                Some(parent) => {
                    self.clusters
                        .node_mut(parent)
                        .children_mut()
                        .retain(|&c| c != id);
                    id = parent;
                }
                None => {
                    self.roots.retain(|&r| r != id);
                    tracing::trace!(
                        granularity = node.granularity_log2,
                        roots = self.roots.len(),
                        "dropped emptied root cluster"
                    );
                    return;
                }
            }
        }
    }

    fn first_leaf_from(&self, root_position: usize, query: &E) -> Option<ClusterId> {
        self.roots
            .get(root_position..)?
            .iter()
            .find_map(|&r| self.first_leaf(r, query))
    }

    /// First leaf under `id`, in depth-first order, whose cover intersects `query`.
    fn first_leaf(&self, id: ClusterId, query: &E) -> Option<ClusterId> {
        let node = self.clusters.node(id);
        if !node.cover.intersects(query) {
            return None;
        }
        match &node.body {
            Body::Leaf(_) => Some(id),
            Body::Branch { children, .. } => {
                children.iter().find_map(|&c| self.first_leaf(c, query))
            }
        }
    }

    /// The leaf following `id` in traversal order, skipping clusters outside `query`.
    fn next_leaf(&self, mut id: ClusterId, query: &E) -> Option<ClusterId> {
        loop {
            match self.clusters.node(id).parent {
                Some(parent) => {
                    let siblings = self.clusters.node(parent).children();
                    let position = siblings.iter().position(|&c| c == id)?;
                    let next = siblings[position + 1..]
                        .iter()
                        .find_map(|&c| self.first_leaf(c, query));
                    if next.is_some() {
                        return next;
                    }
                    id = parent;
                }
                None => {
                    let position = self.roots.iter().position(|&r| r == id)?;
                    return self.first_leaf_from(position + 1, query);
                }
            }
        }
    }
}

/// Iterator over the matches of a query; see [`ClusterIndex::matches`].
pub struct Matches<'a, E: Extent, P: Copy + Debug, F> {
    index: &'a ClusterIndex<E, P>,
    query: E,
    cursor: Option<Cursor>,
    pred: F,
    done: bool,
}

impl<E: Extent, P: Copy + Debug, F> Debug for Matches<'_, E, P, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Matches")
            .field("query", &self.query)
            .field("cursor", &self.cursor)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<E, P, F> Iterator for Matches<'_, E, P, F>
where
    E: Extent,
    P: Copy + Debug,
    F: FnMut(&E, &P) -> bool,
{
    type Item = (Key, P);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self
            .index
            .next_match(&self.query, self.cursor, &mut self.pred)
        {
            Some((key, payload, cursor)) => {
                self.cursor = Some(cursor);
                Some((key, payload))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Rect, Span};
    use alloc::vec;

    fn any<E, P>(_: &E, _: &P) -> bool {
        true
    }

    fn sorted(mut v: Vec<u32>) -> Vec<u32> {
        v.sort_unstable();
        v
    }

    #[test]
    fn insert_and_query_points() {
        let mut idx: ClusterIndex<Span, u32> = ClusterIndex::new();
        idx.insert(Span::point(3), 1);
        idx.insert(Span::new(7, 10), 2);
        idx.insert(Span::point(40), 3);

        let hits: Vec<_> = idx.matches(Span::point(8), any).map(|(_, p)| p).collect();
        assert_eq!(hits, vec![2]);
        let hits: Vec<_> = idx.matches(Span::ALL, any).map(|(_, p)| p).collect();
        assert_eq!(sorted(hits), vec![1, 2, 3]);
        assert_eq!(idx.len(), 3);
        // A singleton and a span of three values live under different granularities.
        assert_eq!(idx.root_count(), 2);
    }

    #[test]
    fn roots_are_ordered_coarsest_first() {
        let mut idx: ClusterIndex<Span, u32> = ClusterIndex::new();
        idx.insert(Span::point(0), 1);
        idx.insert(Span::new(0, 100), 2);
        idx.insert(Span::new(0, 5), 3);
        let order: Vec<_> = idx.matches(Span::ALL, any).map(|(_, p)| p).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn overfull_root_splits_into_buckets() {
        let mut idx: ClusterIndex<Span, u32> = ClusterIndex::new();
        for v in 0..9_u32 {
            idx.insert(Span::point(i64::from(v) * 1000), v);
        }
        let stats = idx.stats();
        assert_eq!(stats.roots, 1);
        assert!(stats.leaves > 1, "nine spread entries must split: {stats:?}");
        assert!(stats.largest_leaf <= 8);
        assert_eq!(stats.empty_clusters, 0);
        for v in 0..9_u32 {
            let hits: Vec<_> = idx
                .matches(Span::point(i64::from(v) * 1000), any)
                .map(|(_, p)| p)
                .collect();
            assert_eq!(hits, vec![v]);
        }
    }

    #[test]
    fn identical_keys_cannot_be_split_apart() {
        let mut idx: ClusterIndex<Span, u32> = ClusterIndex::new();
        for v in 0..20_u32 {
            idx.insert(Span::point(5), v);
        }
        let stats = idx.stats();
        assert_eq!(stats.leaves, 1);
        assert_eq!(stats.largest_leaf, 20);
        assert_eq!(idx.matches(Span::point(5), any).count(), 20);
    }

    #[test]
    fn removal_prunes_empty_clusters_and_roots() {
        let mut idx: ClusterIndex<Span, u32> = ClusterIndex::new();
        let keys: Vec<_> = (0..50_u32)
            .map(|v| idx.insert(Span::point(i64::from(v) * 37), v))
            .collect();
        let wide = idx.insert(Span::new(0, 64), 99);
        assert_eq!(idx.root_count(), 2);

        assert_eq!(idx.remove(wide), Some(99));
        assert_eq!(idx.root_count(), 1);
        assert_eq!(idx.remove(wide), None, "stale keys are ignored");

        for (i, key) in keys.iter().enumerate() {
            if i % 3 != 0 {
                idx.remove(*key);
            }
            assert_eq!(idx.stats().empty_clusters, 0);
        }
        let left: Vec<_> = idx.matches(Span::ALL, any).map(|(_, p)| p).collect();
        assert_eq!(sorted(left), (0..50).filter(|v| v % 3 == 0).collect::<Vec<_>>());

        for (i, key) in keys.iter().enumerate() {
            if i % 3 == 0 {
                idx.remove(*key);
            }
        }
        assert!(idx.is_empty());
        assert_eq!(idx.stats(), IndexStats::default());
    }

    #[test]
    fn cursor_resumes_after_last_match() {
        let mut idx: ClusterIndex<Span, u32> = ClusterIndex::new();
        for v in 0..40_u32 {
            idx.insert(Span::point(i64::from(v) * 11), v);
        }
        let mut seen = Vec::new();
        let mut cursor = None;
        while let Some((_, p, c)) = idx.next_match(&Span::ALL, cursor, |_, p| p % 2 == 0) {
            seen.push(p);
            cursor = Some(c);
        }
        assert_eq!(sorted(seen), (0..40).filter(|v| v % 2 == 0).collect::<Vec<_>>());
    }

    #[test]
    fn stale_cursor_ends_enumeration() {
        let mut idx: ClusterIndex<Span, u32> = ClusterIndex::new();
        let a = idx.insert(Span::point(1), 1);
        let (_, _, cursor) = idx.next_match(&Span::ALL, None, any).unwrap();
        idx.remove(a);
        idx.insert(Span::point(2), 2);
        assert!(idx.next_match(&Span::ALL, Some(cursor), any).is_none());
    }

    #[test]
    fn find_exact_scans_only_the_target_leaf() {
        let mut idx: ClusterIndex<Span, u32> = ClusterIndex::new();
        for v in 0..30_u32 {
            idx.insert(Span::new(i64::from(v) * 10, i64::from(v) * 10 + 2), v);
        }
        let key = idx.find_exact(&Span::new(120, 122), |_| true).unwrap();
        assert_eq!(idx.get(key).map(|(_, p)| *p), Some(12));
        assert!(idx.find_exact(&Span::new(120, 122), |p| *p == 13).is_none());
        assert!(idx.find_exact(&Span::new(120, 123), |_| true).is_none());
    }

    #[test]
    fn rectangles_are_found_by_intersection() {
        let mut idx: ClusterIndex<Rect, u32> = ClusterIndex::new();
        for i in 0..20_u32 {
            for j in 0..20_u32 {
                let (x, y) = (i64::from(i) * 16, i64::from(j) * 16);
                idx.insert(Rect::from_xywh(x, y, 8, 8), i * 20 + j);
            }
        }
        let stats = idx.stats();
        assert!(stats.largest_leaf <= 16, "{stats:?}");
        assert!(stats.widest_branch <= 16, "{stats:?}");

        let hits: Vec<_> = idx
            .matches(Rect::from_xywh(20, 20, 10, 10), any)
            .map(|(_, p)| p)
            .collect();
        assert_eq!(sorted(hits), vec![21]);
        let hits = idx.matches(Rect::from_xywh(0, 0, 33, 17), any).count();
        assert_eq!(hits, 6);
    }

    #[test]
    fn custom_policy_is_validated() {
        let config = IndexConfig {
            split_threshold: 4,
            step_bits: 1,
        };
        let mut idx: ClusterIndex<Span, u32> = ClusterIndex::with_config(config).unwrap();
        for v in 0..64_u32 {
            idx.insert(Span::point(i64::from(v)), v);
        }
        assert!(idx.stats().largest_leaf <= 4);
        assert!(
            ClusterIndex::<Span, u32>::with_config(IndexConfig {
                split_threshold: 0,
                step_bits: 1,
            })
            .is_err()
        );
    }
}
