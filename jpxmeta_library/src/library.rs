// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The association library: five parallel indexes over deduplicated representatives.

use alloc::vec::Vec;
use core::fmt::Debug;

use jpxmeta_index::{ClusterIndex, ConfigError, Cursor, IndexConfig, IndexStats, Key, Rect, Span};

use crate::assoc::{AssocKey, AssocQuery, Dimension};
use crate::region::RegionLibrary;

/// Generational handle of a representative.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepId(u32, u32);

impl RepId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Representative ids are 32-bit like index keys."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Resumption point of [`Library::next_match`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LibraryCursor {
    dim: Dimension,
    cursor: Cursor,
}

#[derive(Debug)]
struct Rep<O: Copy + Debug> {
    key: AssocKey,
    /// Identical-key chain; the head is the representative owner.
    members: Vec<O>,
    keys: [Option<Key>; 5],
    regions: Option<RegionLibrary<O>>,
}

impl<O: Copy + Debug> Rep<O> {
    fn is_dead(&self) -> bool {
        self.members.is_empty() && self.regions.as_ref().is_none_or(RegionLibrary::is_empty)
    }
}

/// Association entries grouped into representatives and indexed per dimension.
///
/// Owners whose keys compare equal share one representative, so each distinct key is
/// stored once in each index it has ids for. A representative also carries the regions
/// scoped to its key.
pub struct Library<O: Copy + Debug> {
    indexes: [ClusterIndex<Span, RepId>; 5],
    region_config: IndexConfig,
    reps: Vec<Option<Rep<O>>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl<O: Copy + Debug> Debug for Library<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let scoped = self
            .reps
            .iter()
            .flatten()
            .filter(|rep| rep.regions.is_some())
            .count();
        f.debug_struct("Library")
            .field("representatives", &self.len())
            .field("scoped_libraries", &scoped)
            .field("layer", &self.indexes[0])
            .field("base_layer", &self.indexes[1])
            .field("codestream", &self.indexes[2])
            .field("base_codestream", &self.indexes[3])
            .field("rendered", &self.indexes[4])
            .finish_non_exhaustive()
    }
}

impl<O: Copy + Debug> Default for Library<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Copy + Debug + PartialEq> Library<O> {
    /// Add `owner` under `key`, returning its representative.
    ///
    /// An owner whose key matches an existing representative joins its chain. Keys with no
    /// association in any dimension cannot be found by any query and are rejected.
    pub fn add(&mut self, key: AssocKey, owner: O) -> Option<RepId> {
        if key.is_empty() {
            tracing::warn!(?owner, "rejecting association with an empty key");
            return None;
        }
        let rep = self.scope(key)?;
        let members = &mut self.rep_mut(rep).members;
        debug_assert!(!members.contains(&owner), "owner added twice: {owner:?}");
        members.push(owner);
        Some(rep)
    }

    /// Remove `owner` from the chain of `rep`.
    ///
    /// Removing the head promotes the next member. A representative left with no members
    /// and no scoped regions is removed from every index.
    pub fn remove(&mut self, rep: RepId, owner: O) -> bool {
        let node = self.get_mut(rep);
        debug_assert!(node.is_some(), "removing {owner:?} from dead {rep:?}");
        let Some(node) = node else {
            tracing::warn!(?owner, ?rep, "ignoring removal from a dead representative");
            return false;
        };
        let position = node.members.iter().position(|m| *m == owner);
        debug_assert!(position.is_some(), "{owner:?} is not a member of {rep:?}");
        let Some(position) = position else {
            tracing::warn!(?owner, ?rep, "ignoring removal of an absent member");
            return false;
        };
        node.members.remove(position);
        self.release_if_dead(rep);
        true
    }
}

impl<O: Copy + Debug> Library<O> {
    /// Create an empty library with the default split policies.
    pub fn new() -> Self {
        Self {
            indexes: core::array::from_fn(|_| ClusterIndex::new()),
            region_config: IndexConfig::for_extent::<Rect>(),
            reps: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Create an empty library with explicit policies for the association indexes and
    /// for the scoped region libraries.
    pub fn with_configs(
        associations: IndexConfig,
        regions: IndexConfig,
    ) -> Result<Self, ConfigError> {
        let index = || ClusterIndex::with_config(associations);
        Ok(Self {
            indexes: [index()?, index()?, index()?, index()?, index()?],
            region_config: regions.validate()?,
            reps: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        })
    }

    /// Number of representatives.
    pub fn len(&self) -> usize {
        self.reps.len() - self.free_list.len()
    }

    /// True when nothing is left; the owner may drop the library.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the representative of `key`, creating it without members if needed.
    ///
    /// Use this to attach scoped regions to a key before any association owner with that
    /// key has been seen.
    pub fn scope(&mut self, key: AssocKey) -> Option<RepId> {
        if let Some(rep) = self.find(&key) {
            return Some(rep);
        }
        if key.is_empty() {
            return None;
        }
        let extents = Dimension::ALL.map(|dim| key.extent(dim));
        let rep = self.alloc_rep(Rep {
            key,
            members: Vec::new(),
            keys: [None; 5],
            regions: None,
        });
        let mut keys = [None; 5];
        for ((slot, index), extent) in keys.iter_mut().zip(&mut self.indexes).zip(extents) {
            if let Some(extent) = extent {
                *slot = Some(index.insert(extent, rep));
            }
        }
        self.rep_mut(rep).keys = keys;
        tracing::trace!(?rep, representatives = self.len(), "new representative");
        Some(rep)
    }

    /// The representative already holding `key`.
    pub fn find(&self, key: &AssocKey) -> Option<RepId> {
        let dim = Dimension::ALL
            .into_iter()
            .find(|d| key.extent(*d).is_some())?;
        let extent = key.extent(dim)?;
        let found = self.indexes[dim.index()].find_exact(&extent, |rep| {
            self.get(*rep).is_some_and(|node| node.key == *key)
        })?;
        self.indexes[dim.index()].get(found).map(|(_, rep)| *rep)
    }

    /// The association key of a live representative.
    pub fn key(&self, rep: RepId) -> Option<&AssocKey> {
        self.get(rep).map(|node| &node.key)
    }

    /// The identical-key chain of a live representative, head first.
    pub fn members(&self, rep: RepId) -> Option<&[O]> {
        self.get(rep).map(|node| node.members.as_slice())
    }

    /// The regions scoped to a live representative.
    pub fn regions(&self, rep: RepId) -> Option<&RegionLibrary<O>> {
        self.get(rep)?.regions.as_ref()
    }

    /// Attach a region owned by `owner` to `rep`.
    pub fn add_region(&mut self, rep: RepId, rect: Rect, owner: O) -> Option<Key> {
        let config = self.region_config;
        let node = self.get_mut(rep)?;
        if node.regions.is_none() {
            node.regions = Some(RegionLibrary::with_config(config).ok()?);
        }
        Some(node.regions.as_mut()?.add(rect, owner))
    }

    /// Detach a region from `rep`, releasing the representative if nothing is left.
    pub fn remove_region(&mut self, rep: RepId, key: Key) -> Option<O> {
        let node = self.get_mut(rep)?;
        let regions = node.regions.as_mut()?;
        let owner = regions.remove(key);
        debug_assert!(owner.is_some(), "region {key:?} is not scoped to {rep:?}");
        if regions.is_empty() {
            node.regions = None;
        }
        self.release_if_dead(rep);
        owner
    }

    /// Find the next representative matching `query`, resuming after `cursor`.
    ///
    /// Dimensions are searched in priority order. A representative that also matches an
    /// earlier searched dimension is skipped, so each one is returned once.
    pub fn next_match(
        &self,
        query: &AssocQuery,
        cursor: Option<LibraryCursor>,
    ) -> Option<(RepId, LibraryCursor)> {
        let (start, mut resume) = match cursor {
            Some(c) => (c.dim.index(), Some(c.cursor)),
            None => (0, None),
        };
        for dim in Dimension::ALL.into_iter().skip(start) {
            let Some(criterion) = query.criterion(dim) else {
                resume = None;
                continue;
            };
            let found = self.indexes[dim.index()].next_match(
                &criterion.extent(dim),
                resume.take(),
                |_, rep| {
                    self.get(*rep).is_some_and(|node| {
                        node.key.matches(dim, criterion) && !query.matched_earlier(&node.key, dim)
                    })
                },
            );
            if let Some((_, rep, cursor)) = found {
                return Some((rep, LibraryCursor { dim, cursor }));
            }
        }
        None
    }

    /// Every representative matching `query`.
    pub fn matches<'a>(&'a self, query: &'a AssocQuery) -> impl Iterator<Item = RepId> + 'a {
        let mut cursor = None;
        core::iter::from_fn(move || {
            let (rep, next) = self.next_match(query, cursor)?;
            cursor = Some(next);
            Some(rep)
        })
    }

    /// Shape of the index of one dimension.
    pub fn stats(&self, dim: Dimension) -> IndexStats {
        self.indexes[dim.index()].stats()
    }

    // --- internals ---

    fn get(&self, rep: RepId) -> Option<&Rep<O>> {
        if self.generations.get(rep.idx()) != Some(&rep.1) {
            return None;
        }
        self.reps[rep.idx()].as_ref()
    }

    fn get_mut(&mut self, rep: RepId) -> Option<&mut Rep<O>> {
        if self.generations.get(rep.idx()) != Some(&rep.1) {
            return None;
        }
        self.reps[rep.idx()].as_mut()
    }

    fn rep_mut(&mut self, rep: RepId) -> &mut Rep<O> {
        self.get_mut(rep).expect("dangling RepId")
    }

    fn alloc_rep(&mut self, rep: Rep<O>) -> RepId {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.reps[idx] = Some(rep);
            RepId::new(idx, generation)
        } else {
            self.reps.push(Some(rep));
            self.generations.push(1);
            RepId::new(self.reps.len() - 1, 1)
        }
    }

    fn release_if_dead(&mut self, rep: RepId) {
        if !self.get(rep).is_some_and(Rep::is_dead) {
            return;
        }
        let Some(node) = self.reps[rep.idx()].take() else {
            return;
        };
        self.free_list.push(rep.idx());
        for (index, key) in self.indexes.iter_mut().zip(node.keys) {
            if let Some(key) = key {
                let removed = index.remove(key);
                debug_assert_eq!(removed, Some(rep), "index entry of {rep:?} went missing");
            }
        }
        tracing::trace!(?rep, remaining = self.len(), "released representative");
    }
}
