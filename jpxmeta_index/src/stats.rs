// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural summary returned by [`ClusterIndex::stats`](crate::ClusterIndex::stats).

/// Shape of a cluster forest, gathered by a full walk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Live entries.
    pub entries: usize,
    /// Root clusters, one per granularity in use.
    pub roots: usize,
    /// Clusters reachable from the roots.
    pub clusters: usize,
    /// Reachable leaf clusters.
    pub leaves: usize,
    /// Longest root-to-leaf path, counting the root as depth 1.
    pub depth: usize,
    /// Entry count of the fullest leaf.
    pub largest_leaf: usize,
    /// Child count of the widest branch.
    pub widest_branch: usize,
    /// Clusters with nothing in them; a consistent index always reports zero.
    pub empty_clusters: usize,
}

impl IndexStats {
    /// True if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub(crate) fn visit_leaf(&mut self, depth: usize, len: usize) {
        self.clusters += 1;
        self.leaves += 1;
        self.depth = self.depth.max(depth);
        self.largest_leaf = self.largest_leaf.max(len);
        if len == 0 {
            self.empty_clusters += 1;
        }
    }

    pub(crate) fn visit_branch(&mut self, depth: usize, len: usize) {
        self.clusters += 1;
        self.depth = self.depth.max(depth);
        self.widest_branch = self.widest_branch.max(len);
        if len == 0 {
            self.empty_clusters += 1;
        }
    }
}
