// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=jpxmeta_library --heading-base-level=0

//! JPX Metadata Library: association and region lookups over incrementally parsed metadata.
//!
//! JPX files tie metadata nodes to compositing layers, codestreams and the rendered result,
//! and describe regions of interest by rectangle. This crate indexes those attributes as
//! the parser discovers them, using [`jpxmeta_index`] for the cluster trees and
//! [`jpxmeta_locator`] for references to nodes that have not been parsed yet.
//!
//! - [`Library`]: five association indexes (layer, base layer, codestream, base codestream,
//!   rendered result) over deduplicated representatives.
//! - [`RegionLibrary`]: one rectangle index with a minimum-size filter.
//! - [`MetaManager`]: owns both plus a locator table and takes the parser's notifications.
//!
//! # Example
//!
//! ```rust
//! use jpxmeta_library::{AssocKey, EntryKey, MetaManager, Query};
//! use jpxmeta_index::Rect;
//!
//! let mut meta: MetaManager<u32> = MetaManager::new();
//!
//! // Two labels on layer 3 share one representative; a third label covers layers 7 and 9.
//! meta.notify_entry_ready(1, EntryKey::Association(AssocKey::new().with_layers([3])));
//! meta.notify_entry_ready(2, EntryKey::Association(AssocKey::new().with_layers([3])));
//! meta.notify_entry_ready(3, EntryKey::Association(AssocKey::new().with_layers([7, 9])));
//! assert_eq!(meta.associations().len(), 2);
//!
//! let on_layer_3 = Query { layer: Some(3), ..Query::default() };
//! assert_eq!(meta.matches(&on_layer_3).collect::<Vec<_>>(), vec![1, 2]);
//!
//! // A region of interest, found by any intersecting rectangle.
//! let roi = EntryKey::Region { scope: None, rect: Rect::from_xywh(10, 10, 20, 20) };
//! meta.notify_entry_ready(4, roi);
//! let probe = Query { region: Some(Rect::from_xywh(25, 25, 1, 1)), ..Query::default() };
//! assert_eq!(meta.matches(&probe).collect::<Vec<_>>(), vec![4]);
//! ```
//!
//! ## Query semantics
//!
//! The association criteria of a [`Query`] are alternatives: a node matches if it satisfies
//! any criterion that is set, and a query with none set matches everything. Each node is
//! still returned once, even when it matches several criteria.

#![no_std]

extern crate alloc;

pub mod assoc;
pub mod config;
pub mod library;
pub mod manager;
pub mod region;

pub use assoc::{AssocKey, AssocQuery, Criterion, Dimension, Dimensions};
pub use config::{ManagerConfig, ManagerConfigError};
pub use library::{Library, LibraryCursor, RepId};
pub use manager::{EntryKey, MetaManager, Query, Token};
pub use region::RegionLibrary;
