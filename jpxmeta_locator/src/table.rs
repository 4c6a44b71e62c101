// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The block tree mapping positions to locators.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::config::{LocatorConfig, LocatorConfigError};
use crate::locator::{Locator, LocatorState};

/// Index of a block. Blocks are never freed, so no generation is needed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct BlockId(u32);

impl BlockId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "A table never holds 2^32 blocks."
    )]
    const fn new(idx: usize) -> Self {
        Self(idx as u32)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
enum Items<N, W> {
    /// Locators sorted by position.
    Locators(Vec<Locator<N, W>>),
    /// Child blocks with the cached key of each, sorted by key.
    Blocks(Vec<(u64, BlockId)>),
}

impl<N, W> Items<N, W> {
    fn len(&self) -> usize {
        match self {
            Self::Locators(items) => items.len(),
            Self::Blocks(items) => items.len(),
        }
    }
}

#[derive(Clone, Debug)]
struct Block<N, W> {
    parent: Option<BlockId>,
    items: Items<N, W>,
}

/// Sorted map from file positions to [`Locator`]s, stored as a tree of bounded blocks.
///
/// `N` is the node handle a locator resolves to and `W` identifies a waiter. Locators are
/// created on demand and never removed; releasing one only scrubs its state.
pub struct LocatorTable<N, W> {
    config: LocatorConfig,
    blocks: Vec<Block<N, W>>,
    root: Option<BlockId>,
    len: usize,
}

impl<N, W> Debug for LocatorTable<N, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LocatorTable")
            .field("config", &self.config)
            .field("locators", &self.len)
            .field("blocks", &self.blocks.len())
            .finish_non_exhaustive()
    }
}

impl<N: Copy, W> Default for LocatorTable<N, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Copy, W> LocatorTable<N, W> {
    /// Create an empty table with 64-item blocks.
    pub fn new() -> Self {
        Self::from_valid_config(LocatorConfig::default())
    }

    /// Create an empty table with explicit block sizing.
    pub fn with_config(config: LocatorConfig) -> Result<Self, LocatorConfigError> {
        Ok(Self::from_valid_config(config.validate()?))
    }

    fn from_valid_config(config: LocatorConfig) -> Self {
        Self {
            config,
            blocks: Vec::new(),
            root: None,
            len: 0,
        }
    }

    /// Number of locators.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no locator has been created.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of block levels; zero for an empty table.
    pub fn depth(&self) -> usize {
        let Some(mut id) = self.root else {
            return 0;
        };
        let mut depth = 1;
        while let Items::Blocks(children) = &self.block(id).items {
            id = children[0].1;
            depth += 1;
        }
        depth
    }

    /// The locator at exactly `position`.
    pub fn find(&self, position: u64) -> Option<&Locator<N, W>> {
        let leaf = self.leaf_for(position)?;
        let Items::Locators(items) = &self.block(leaf).items else {
            return None;
        };
        let i = items
            .binary_search_by_key(&position, Locator::position)
            .ok()?;
        Some(&items[i])
    }

    /// The locator at `position`, created in the `Empty` state if missing.
    pub fn get_or_insert(&mut self, position: u64) -> &mut Locator<N, W> {
        let (leaf, i) = self.locate_or_insert(position);
        match &mut self.blocks[leaf.idx()].items {
            Items::Locators(items) => &mut items[i],
            Items::Blocks(_) => unreachable!("locators live in leaf blocks only"),
        }
    }

    /// Ask to be told about the node at `position`.
    ///
    /// Returns the node right away if it has already been parsed; otherwise `waiter` is
    /// queued until [`resolve`](Self::resolve) is called for that position.
    pub fn register_waiter(&mut self, position: u64, waiter: W) -> Option<N> {
        self.get_or_insert(position).wait(waiter)
    }

    /// Bind `node` to `position` and return every waiter queued there, in registration
    /// order.
    ///
    /// Resolving an already resolved position keeps the first node and returns nothing.
    pub fn resolve(&mut self, position: u64, node: N) -> Vec<W> {
        match self.get_or_insert(position).resolve(node) {
            Some(waiters) => {
                tracing::trace!(position, waiters = waiters.len(), "resolved locator");
                waiters
            }
            None => {
                tracing::warn!(position, "ignoring second resolution of a locator");
                Vec::new()
            }
        }
    }

    /// Forget that `node` lives at `position`, typically because it was deleted.
    ///
    /// Returns false if the locator was not resolved to `node`.
    pub fn release(&mut self, position: u64, node: N) -> bool
    where
        N: PartialEq,
    {
        self.find_mut(position).is_some_and(|loc| loc.release(node))
    }

    /// Withdraw a queued waiter.
    pub fn cancel_waiter(&mut self, position: u64, waiter: &W) -> bool
    where
        W: PartialEq,
    {
        self.find_mut(position).is_some_and(|loc| loc.cancel(waiter))
    }

    /// All locators in position order.
    pub fn iter(&self) -> impl Iterator<Item = &Locator<N, W>> + '_ {
        let mut stack: Vec<BlockId> = self.root.into_iter().collect();
        let mut current: core::slice::Iter<'_, Locator<N, W>> = core::slice::Iter::default();
        core::iter::from_fn(move || {
            loop {
                if let Some(loc) = current.next() {
                    return Some(loc);
                }
                let id = stack.pop()?;
                match &self.block(id).items {
                    Items::Locators(items) => current = items.iter(),
                    Items::Blocks(children) => stack.extend(children.iter().rev().map(|c| c.1)),
                }
            }
        })
    }

    /// Positions that are known but not yet resolved, in order.
    pub fn unresolved(&self) -> impl Iterator<Item = u64> + '_ {
        self.iter()
            .filter(|loc| !matches!(loc.state(), LocatorState::Resolved(_)))
            .map(Locator::position)
    }

    // --- internals ---

    fn block(&self, id: BlockId) -> &Block<N, W> {
        &self.blocks[id.idx()]
    }

    fn alloc_block(&mut self, block: Block<N, W>) -> BlockId {
        self.blocks.push(block);
        BlockId::new(self.blocks.len() - 1)
    }

    fn find_mut(&mut self, position: u64) -> Option<&mut Locator<N, W>> {
        let leaf = self.leaf_for(position)?;
        let Items::Locators(items) = &mut self.blocks[leaf.idx()].items else {
            return None;
        };
        let i = items
            .binary_search_by_key(&position, Locator::position)
            .ok()?;
        Some(&mut items[i])
    }

    /// Descend choosing the child with the greatest key not above `position`.
    fn leaf_for(&self, position: u64) -> Option<BlockId> {
        let mut id = self.root?;
        while let Items::Blocks(children) = &self.block(id).items {
            let after = children.partition_point(|&(key, _)| key <= position);
            id = children[after.saturating_sub(1)].1;
        }
        Some(id)
    }

    fn locate_or_insert(&mut self, position: u64) -> (BlockId, usize) {
        let leaf = match self.leaf_for(position) {
            Some(leaf) => leaf,
            None => {
                let root = self.alloc_block(Block {
                    parent: None,
                    items: Items::Locators(Vec::new()),
                });
                self.root = Some(root);
                root
            }
        };
        let Items::Locators(items) = &mut self.blocks[leaf.idx()].items else {
            unreachable!("descent ends at a leaf block");
        };
        let i = match items.binary_search_by_key(&position, Locator::position) {
            Ok(i) => return (leaf, i),
            Err(i) => i,
        };
        items.insert(i, Locator::new(position));
        self.len += 1;
        if i == 0 {
            self.refresh_keys(leaf, position);
        }
        if self.block(leaf).items.len() <= self.config.block_capacity {
            return (leaf, i);
        }
        let right = self.split(leaf);
        let half = self.block(leaf).items.len();
        if i < half { (leaf, i) } else { (right, i - half) }
    }

    /// Propagate a new first key of `id` to the ancestors that cache it.
    fn refresh_keys(&mut self, mut id: BlockId, key: u64) {
        while let Some(parent) = self.block(id).parent {
            let Items::Blocks(children) = &mut self.blocks[parent.idx()].items else {
                unreachable!("parents are interior blocks");
            };
            let Some(slot) = children.iter().position(|c| c.1 == id) else {
                return;
            };
            children[slot].0 = key;
            if slot != 0 {
                return;
            }
            id = parent;
        }
    }

    /// Move the upper half of `id` into a new sibling, splitting ancestors as needed.
    fn split(&mut self, id: BlockId) -> BlockId {
        let parent = self.block(id).parent;
        let (right_items, right_key) = match &mut self.blocks[id.idx()].items {
            Items::Locators(items) => {
                let upper = items.split_off(items.len() / 2);
                let key = upper[0].position();
                (Items::Locators(upper), key)
            }
            Items::Blocks(children) => {
                let upper = children.split_off(children.len() / 2);
                let key = upper[0].0;
                (Items::Blocks(upper), key)
            }
        };
        let right = self.alloc_block(Block {
            parent,
            items: right_items,
        });
        if let Items::Blocks(children) = &self.block(right).items {
            let moved: Vec<BlockId> = children.iter().map(|c| c.1).collect();
            for child in moved {
                self.blocks[child.idx()].parent = Some(right);
            }
        }
        tracing::trace!(
            key = right_key,
            blocks = self.blocks.len(),
            "split locator block"
        );

        match parent {
            Some(parent) => {
                let Items::Blocks(children) = &mut self.blocks[parent.idx()].items else {
                    unreachable!("parents are interior blocks");
                };
                let slot = children
                    .iter()
                    .position(|c| c.1 == id)
                    .map_or(children.len(), |s| s + 1);
                children.insert(slot, (right_key, right));
                if children.len() > self.config.block_capacity {
                    self.split(parent);
                }
            }
            None => {
                let left_key = self.first_key(id);
                let root = self.alloc_block(Block {
                    parent: None,
                    items: Items::Blocks(alloc::vec![(left_key, id), (right_key, right)]),
                });
                self.blocks[id.idx()].parent = Some(root);
                self.blocks[right.idx()].parent = Some(root);
                self.root = Some(root);
                tracing::trace!(depth = self.depth(), "grew locator tree");
            }
        }
        right
    }

    fn first_key(&self, id: BlockId) -> u64 {
        match &self.block(id).items {
            Items::Locators(items) => items.first().map_or(0, Locator::position),
            Items::Blocks(children) => children.first().map_or(0, |c| c.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn small() -> LocatorTable<u32, u32> {
        LocatorTable::with_config(LocatorConfig { block_capacity: 4 }).unwrap()
    }

    #[test]
    fn get_or_insert_is_idempotent() {
        let mut t = small();
        t.get_or_insert(100);
        t.get_or_insert(100);
        assert_eq!(t.len(), 1);
        assert_eq!(t.find(100).map(Locator::position), Some(100));
        assert!(t.find(99).is_none());
    }

    #[test]
    fn blocks_split_and_stay_ordered() {
        let mut t = small();
        // Descending inserts exercise the first-key refresh on every level.
        for p in (0..200_u64).rev() {
            t.get_or_insert(p * 10);
        }
        for p in 0..200_u64 {
            t.get_or_insert(p * 10 + 5);
        }
        assert_eq!(t.len(), 400);
        assert!(t.depth() >= 3, "depth {}", t.depth());
        let positions: Vec<u64> = t.iter().map(Locator::position).collect();
        let mut expected: Vec<u64> = (0..200_u64).flat_map(|p| [p * 10, p * 10 + 5]).collect();
        expected.sort_unstable();
        assert_eq!(positions, expected);
        for p in expected {
            assert_eq!(t.find(p).map(Locator::position), Some(p));
        }
    }

    #[test]
    fn blocks_respect_capacity() {
        let mut t = small();
        for p in 0..500_u64 {
            t.get_or_insert(p.wrapping_mul(7919) % 1009);
        }
        assert!(t.blocks.iter().all(|b| b.items.len() <= 4));
        for (i, block) in t.blocks.iter().enumerate() {
            if let Items::Blocks(children) = &block.items {
                for &(key, child) in children {
                    assert_eq!(t.first_key(child), key);
                    assert_eq!(t.block(child).parent, Some(BlockId::new(i)));
                }
            }
        }
    }

    #[test]
    fn waiter_before_node() {
        let mut t = small();
        assert_eq!(t.register_waiter(40, 1), None);
        assert_eq!(t.register_waiter(40, 2), None);
        assert_eq!(t.unresolved().collect::<Vec<_>>(), vec![40]);
        assert_eq!(t.resolve(40, 9), vec![1, 2]);
        assert_eq!(t.find(40).and_then(Locator::node), Some(9));
        assert!(t.resolve(40, 10).is_empty());
        assert_eq!(t.unresolved().count(), 0);
    }

    #[test]
    fn waiter_after_node() {
        let mut t = small();
        assert!(t.resolve(40, 9).is_empty());
        assert_eq!(t.register_waiter(40, 1), Some(9));
        assert_eq!(t.find(40).map(Locator::waiting), Some(0));
    }

    #[test]
    fn release_and_cancel() {
        let mut t = small();
        t.register_waiter(8, 1);
        assert!(t.cancel_waiter(8, &1));
        assert!(!t.cancel_waiter(8, &1));
        assert!(!t.cancel_waiter(9, &1));
        t.resolve(8, 3);
        assert!(t.release(8, 3));
        assert_eq!(t.find(8).map(Locator::state), Some(&LocatorState::Empty));
        assert_eq!(t.len(), 1, "released locators stay in the table");
    }
}
