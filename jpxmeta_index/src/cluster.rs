// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cluster nodes of the partition tree and the arena that owns them.

use alloc::vec::Vec;

use crate::types::Extent;

/// Generational handle of a cluster.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ClusterId(u32, u32);

impl ClusterId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Cluster ids are 32-bit; an index never holds 2^32 clusters."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Body {
    /// Entry slots, in insertion order.
    Leaf(Vec<u32>),
    /// Child clusters; all of them have buckets of side `2^child_log2`.
    Branch {
        child_log2: u32,
        children: Vec<ClusterId>,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct Cluster<E> {
    pub(crate) parent: Option<ClusterId>,
    /// Side exponent of the aligned bucket; roots have none and use their cover instead.
    pub(crate) bucket_log2: Option<u32>,
    pub(crate) granularity_log2: u32,
    pub(crate) cover: E,
    pub(crate) body: Body,
}

impl<E: Extent> Cluster<E> {
    pub(crate) fn root(granularity_log2: u32, cover: E) -> Self {
        Self {
            parent: None,
            bucket_log2: None,
            granularity_log2,
            cover,
            body: Body::Leaf(Vec::new()),
        }
    }

    pub(crate) fn child(
        parent: ClusterId,
        bucket_log2: u32,
        granularity_log2: u32,
        anchor: &E,
        body: Body,
    ) -> Self {
        Self {
            parent: Some(parent),
            bucket_log2: Some(bucket_log2),
            granularity_log2,
            cover: anchor.bucket(bucket_log2, granularity_log2),
            body,
        }
    }

    /// Exponent of the range that gets subdivided when this cluster overflows.
    pub(crate) fn span_log2(&self) -> u32 {
        self.bucket_log2.unwrap_or_else(|| self.cover.covering_log2())
    }

    pub(crate) fn len(&self) -> usize {
        match &self.body {
            Body::Leaf(slots) => slots.len(),
            Body::Branch { children, .. } => children.len(),
        }
    }

    pub(crate) fn children(&self) -> &[ClusterId] {
        match &self.body {
            Body::Branch { children, .. } => children,
            Body::Leaf(_) => &[],
        }
    }

    pub(crate) fn slots_mut(&mut self) -> &mut Vec<u32> {
        match &mut self.body {
            Body::Leaf(slots) => slots,
            Body::Branch { .. } => unreachable!("entries live in leaf clusters only"),
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<ClusterId> {
        match &mut self.body {
            Body::Branch { children, .. } => children,
            Body::Leaf(_) => unreachable!("leaf clusters have no children"),
        }
    }
}

/// Slot storage for clusters with generation tracking, so stale cursors are detected.
#[derive(Clone, Debug)]
pub(crate) struct Arena<E> {
    slots: Vec<Option<Cluster<E>>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl<E> Default for Arena<E> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }
}

impl<E> Arena<E> {
    pub(crate) fn alloc(&mut self, cluster: Cluster<E>) -> ClusterId {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(cluster);
            ClusterId::new(idx, generation)
        } else {
            self.slots.push(Some(cluster));
            self.generations.push(1);
            ClusterId::new(self.slots.len() - 1, 1)
        }
    }

    /// Detach a cluster from the arena; its id becomes stale.
    pub(crate) fn free(&mut self, id: ClusterId) -> Option<Cluster<E>> {
        self.get(id)?;
        let cluster = self.slots[id.idx()].take();
        self.free_list.push(id.idx());
        cluster
    }

    pub(crate) fn get(&self, id: ClusterId) -> Option<&Cluster<E>> {
        if self.generations.get(id.idx()) != Some(&id.1) {
            return None;
        }
        self.slots[id.idx()].as_ref()
    }

    /// Access a live cluster; panics if `id` is stale.
    pub(crate) fn node(&self, id: ClusterId) -> &Cluster<E> {
        self.get(id).expect("dangling ClusterId")
    }

    /// Access a live cluster mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: ClusterId) -> &mut Cluster<E> {
        debug_assert_eq!(
            self.generations.get(id.idx()),
            Some(&id.1),
            "stale ClusterId"
        );
        self.slots[id.idx()].as_mut().expect("dangling ClusterId")
    }

    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.generations.clear();
        self.free_list.clear();
    }
}
