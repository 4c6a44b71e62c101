// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=jpxmeta_locator --heading-base-level=0

//! JPX Metadata Locator: resolve references to metadata that has not been parsed yet.
//!
//! Cross-reference boxes in a JPX file name their target by byte offset, and the target
//! may arrive long after the reference. A [`LocatorTable`] keeps one [`Locator`] per
//! referenced offset in a tree of bounded, sorted blocks:
//!
//! - [`LocatorTable::register_waiter`] hands back the node if it is known, or queues the
//!   waiter.
//! - [`LocatorTable::resolve`] binds the node once and drains the queue.
//! - [`LocatorTable::release`] and [`LocatorTable::cancel_waiter`] scrub state when nodes
//!   are deleted.
//!
//! # Example
//!
//! ```rust
//! use jpxmeta_locator::LocatorTable;
//!
//! // Nodes and waiters are plain handles here.
//! let mut table: LocatorTable<u32, &str> = LocatorTable::new();
//!
//! // A cross-reference to offset 4096 is parsed before its target.
//! assert_eq!(table.register_waiter(4096, "label"), None);
//!
//! // The target arrives; the waiter is handed back exactly once.
//! assert_eq!(table.resolve(4096, 17), vec!["label"]);
//!
//! // Later references resolve immediately.
//! assert_eq!(table.register_waiter(4096, "roi"), Some(17));
//! ```

#![no_std]

extern crate alloc;

pub mod config;
pub mod locator;
pub mod table;

pub use config::{LocatorConfig, LocatorConfigError};
pub use locator::{Locator, LocatorState};
pub use table::LocatorTable;
