// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The metadata manager: routes parser notifications into the libraries and the locator
//! table, and answers queries across them.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt::Debug;

use jpxmeta_index::{Cursor, Key, Rect};
use jpxmeta_locator::{Locator, LocatorTable};

use crate::assoc::{AssocKey, AssocQuery};
use crate::config::{ManagerConfig, ManagerConfigError};
use crate::library::{Library, LibraryCursor, RepId};
use crate::region::RegionLibrary;

/// Attributes of a metadata node once it has been fully parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryKey {
    /// A node tied to layers, codestreams or the rendered result.
    Association(AssocKey),
    /// A region-of-interest descriptor, optionally scoped to an association.
    Region {
        /// The association the region belongs to; `None` for top-level regions.
        scope: Option<AssocKey>,
        /// Bounding rectangle of the region.
        rect: Rect,
    },
}

/// Everything [`MetaManager::enumerate_matches`] can filter on.
///
/// Without a `region` the query returns association owners; with one it returns region
/// owners whose rectangle intersects it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    /// Codestream id.
    pub codestream: Option<u32>,
    /// Compositing layer id.
    pub layer: Option<u32>,
    /// Base-range codestream id.
    pub base_codestream: Option<u32>,
    /// Base-range compositing layer id.
    pub base_layer: Option<u32>,
    /// Match nodes that apply to the rendered result.
    pub rendered_result: bool,
    /// Switch to region owners intersecting this rectangle.
    pub region: Option<Rect>,
    /// Smallest accepted longer side of a matching region.
    pub min_size: u64,
}

impl Query {
    /// The association part of the query.
    pub fn associations(&self) -> AssocQuery {
        AssocQuery {
            layer: self.layer,
            base_layer: self.base_layer,
            codestream: self.codestream,
            base_codestream: self.base_codestream,
            rendered_result: self.rendered_result,
        }
    }
}

/// Opaque resumption point of [`MetaManager::enumerate_matches`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token(Step);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Step {
    Member {
        reps: LibraryCursor,
        rep: RepId,
        member: usize,
    },
    Unscoped(Cursor),
    Scoped {
        reps: LibraryCursor,
        rep: RepId,
        cursor: Cursor,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Placement {
    Association(RepId),
    Region(Key),
    ScopedRegion { rep: RepId, key: Key },
}

#[derive(Clone, Debug, Default)]
struct OwnerRecord {
    placement: Option<Placement>,
    /// Where the owner itself was parsed, if a locator points at it.
    position: Option<u64>,
    /// Positions the owner is queued on.
    waiting_on: Vec<u64>,
}

impl OwnerRecord {
    fn is_idle(&self) -> bool {
        self.placement.is_none() && self.position.is_none() && self.waiting_on.is_empty()
    }
}

/// Single owner of the association library, the top-level region library and the
/// locator table of one file.
///
/// Owners are the caller's handles for metadata nodes. They are never dereferenced, only
/// stored and handed back.
pub struct MetaManager<O: Copy + Ord + Debug> {
    associations: Library<O>,
    regions: RegionLibrary<O>,
    locators: LocatorTable<O, O>,
    owners: BTreeMap<O, OwnerRecord>,
}

impl<O: Copy + Ord + Debug> Debug for MetaManager<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MetaManager")
            .field("owners", &self.owners.len())
            .field("associations", &self.associations)
            .field("regions", &self.regions)
            .field("locators", &self.locators)
            .finish()
    }
}

impl<O: Copy + Ord + Debug> Default for MetaManager<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Copy + Ord + Debug> MetaManager<O> {
    /// Create an empty manager with default policies.
    pub fn new() -> Self {
        Self {
            associations: Library::new(),
            regions: RegionLibrary::new(),
            locators: LocatorTable::new(),
            owners: BTreeMap::new(),
        }
    }

    /// Create an empty manager with explicit policies.
    pub fn with_config(config: ManagerConfig) -> Result<Self, ManagerConfigError> {
        let config = config.validate()?;
        Ok(Self {
            associations: Library::with_configs(config.associations, config.regions)
                .map_err(ManagerConfigError::Associations)?,
            regions: RegionLibrary::with_config(config.regions)
                .map_err(ManagerConfigError::Regions)?,
            locators: LocatorTable::with_config(config.locators)?,
            owners: BTreeMap::new(),
        })
    }

    /// The association library.
    pub fn associations(&self) -> &Library<O> {
        &self.associations
    }

    /// The regions not scoped to any association.
    pub fn regions(&self) -> &RegionLibrary<O> {
        &self.regions
    }

    /// The locator table.
    pub fn locators(&self) -> &LocatorTable<O, O> {
        &self.locators
    }

    /// Number of owners currently indexed.
    pub fn indexed_owners(&self) -> usize {
        self.owners
            .values()
            .filter(|record| record.placement.is_some())
            .count()
    }

    /// Index a node whose attributes are now known.
    ///
    /// Notifying an owner that is already indexed reclassifies it: the old entry is removed
    /// first. Returns false if the key cannot be indexed (an association with no ids, or an
    /// empty rectangle); the owner is then left unindexed.
    pub fn notify_entry_ready(&mut self, owner: O, key: EntryKey) -> bool {
        let previous = self
            .owners
            .get_mut(&owner)
            .and_then(|record| record.placement.take());
        if let Some(previous) = previous {
            tracing::debug!(?owner, ?previous, "reclassifying metadata owner");
            self.unplace(owner, previous);
        }
        let placement = match key {
            EntryKey::Association(key) => self.associations.add(key, owner).map(Placement::Association),
            EntryKey::Region { rect, .. } if rect.is_empty() => {
                tracing::warn!(?owner, ?rect, "rejecting empty region");
                None
            }
            EntryKey::Region { scope: None, rect } => {
                Some(Placement::Region(self.regions.add(rect, owner)))
            }
            EntryKey::Region {
                scope: Some(scope),
                rect,
            } => self.associations.scope(scope).and_then(|rep| {
                self.associations
                    .add_region(rep, rect, owner)
                    .map(|key| Placement::ScopedRegion { rep, key })
            }),
        };
        match placement {
            Some(placement) => {
                self.owners.entry(owner).or_default().placement = Some(placement);
                true
            }
            None => {
                self.forget_if_idle(owner);
                false
            }
        }
    }

    /// Drop every trace of a deleted node: its entry, the locator resolved to it, and any
    /// waits it registered.
    pub fn notify_owner_deleted(&mut self, owner: O) -> bool {
        let Some(record) = self.owners.remove(&owner) else {
            tracing::trace!(?owner, "deleted owner was never indexed");
            return false;
        };
        if let Some(placement) = record.placement {
            self.unplace(owner, placement);
        }
        if let Some(position) = record.position {
            self.locators.release(position, owner);
        }
        for position in record.waiting_on {
            while self.locators.cancel_waiter(position, &owner) {}
        }
        true
    }

    /// Look up the node at `position`, recording the position as wanted if it is unknown.
    pub fn resolve_forward_reference(&mut self, position: u64) -> Option<O> {
        self.locators.get_or_insert(position).node()
    }

    /// Have `waiter` handed back by [`notify_node_parsed`](Self::notify_node_parsed) once
    /// the node at `position` is known, or get that node right away.
    pub fn register_waiter(&mut self, position: u64, waiter: O) -> Option<O> {
        let node = self.locators.register_waiter(position, waiter);
        if node.is_none() {
            let waiting_on = &mut self.owners.entry(waiter).or_default().waiting_on;
            if !waiting_on.contains(&position) {
                waiting_on.push(position);
            }
        }
        node
    }

    /// Record that `owner` was parsed at `position`, returning the waiters it releases.
    pub fn notify_node_parsed(&mut self, position: u64, owner: O) -> Vec<O> {
        let waiters = self.locators.resolve(position, owner);
        if self.locators.find(position).and_then(Locator::node) == Some(owner) {
            let record = self.owners.entry(owner).or_default();
            debug_assert!(
                record.position.is_none_or(|p| p == position),
                "{owner:?} parsed at two positions"
            );
            record.position = Some(position);
        }
        for waiter in &waiters {
            if let Some(record) = self.owners.get_mut(waiter) {
                record.waiting_on.retain(|p| *p != position);
            }
            self.forget_if_idle(*waiter);
        }
        waiters
    }

    /// Find the next owner matching `query`, resuming after `token`.
    ///
    /// Association queries yield every member of each matching representative's chain.
    /// Region queries yield top-level regions first (only when no association criterion
    /// is set), then the regions scoped to each matching representative. A token stays
    /// exact only while nothing is added or removed.
    pub fn enumerate_matches(&self, query: &Query, token: Option<Token>) -> Option<(O, Token)> {
        let assoc = query.associations();
        let resume = token.map(|t| t.0);
        match query.region {
            None => self.next_member(&assoc, resume),
            Some(region) => self.next_region(&assoc, &region, query.min_size, resume),
        }
    }

    /// Every owner matching `query`.
    pub fn matches<'a>(&'a self, query: &'a Query) -> impl Iterator<Item = O> + 'a {
        let mut token = None;
        core::iter::from_fn(move || {
            let (owner, next) = self.enumerate_matches(query, token)?;
            token = Some(next);
            Some(owner)
        })
    }

    // --- internals ---

    fn unplace(&mut self, owner: O, placement: Placement) {
        match placement {
            Placement::Association(rep) => {
                self.associations.remove(rep, owner);
            }
            Placement::Region(key) => {
                let removed = self.regions.remove(key);
                debug_assert_eq!(removed, Some(owner), "region entry went missing");
            }
            Placement::ScopedRegion { rep, key } => {
                self.associations.remove_region(rep, key);
            }
        }
    }

    fn forget_if_idle(&mut self, owner: O) {
        if self.owners.get(&owner).is_some_and(OwnerRecord::is_idle) {
            self.owners.remove(&owner);
        }
    }

    fn next_member(&self, assoc: &AssocQuery, resume: Option<Step>) -> Option<(O, Token)> {
        let mut reps_cursor = match resume {
            None => None,
            Some(Step::Member { reps, rep, member }) => {
                let next = self
                    .associations
                    .members(rep)
                    .and_then(|members| members.get(member + 1));
                if let Some(&owner) = next {
                    let step = Step::Member {
                        reps,
                        rep,
                        member: member + 1,
                    };
                    return Some((owner, Token(step)));
                }
                Some(reps)
            }
            Some(Step::Unscoped(_) | Step::Scoped { .. }) => return None,
        };
        while let Some((rep, reps)) = self.associations.next_match(assoc, reps_cursor) {
            let head = self.associations.members(rep).and_then(<[O]>::first);
            if let Some(&owner) = head {
                let step = Step::Member {
                    reps,
                    rep,
                    member: 0,
                };
                return Some((owner, Token(step)));
            }
            reps_cursor = Some(reps);
        }
        None
    }

    fn next_region(
        &self,
        assoc: &AssocQuery,
        region: &Rect,
        min_size: u64,
        resume: Option<Step>,
    ) -> Option<(O, Token)> {
        let mut reps_cursor = None;
        match resume {
            None | Some(Step::Unscoped(_)) => {
                if assoc.is_unrestricted() {
                    let cursor = match resume {
                        Some(Step::Unscoped(cursor)) => Some(cursor),
                        _ => None,
                    };
                    if let Some((owner, cursor)) = self.regions.next_match(region, min_size, cursor)
                    {
                        return Some((owner, Token(Step::Unscoped(cursor))));
                    }
                }
            }
            Some(Step::Scoped { reps, rep, cursor }) => {
                let found = self.scoped_match(rep, reps, region, min_size, Some(cursor));
                if found.is_some() {
                    return found;
                }
                reps_cursor = Some(reps);
            }
            Some(Step::Member { .. }) => return None,
        }
        while let Some((rep, reps)) = self.associations.next_match(assoc, reps_cursor) {
            let found = self.scoped_match(rep, reps, region, min_size, None);
            if found.is_some() {
                return found;
            }
            reps_cursor = Some(reps);
        }
        None
    }

    fn scoped_match(
        &self,
        rep: RepId,
        reps: LibraryCursor,
        region: &Rect,
        min_size: u64,
        cursor: Option<Cursor>,
    ) -> Option<(O, Token)> {
        let regions = self.associations.regions(rep)?;
        let (owner, cursor) = regions.next_match(region, min_size, cursor)?;
        Some((owner, Token(Step::Scoped { reps, rep, cursor })))
    }
}
