// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feed a manager the notifications a parser would send, then query it.

use jpxmeta_index::Rect;
use jpxmeta_library::{AssocKey, EntryKey, MetaManager, Query};

fn main() {
    let mut meta: MetaManager<u32> = MetaManager::new();

    // Labels on codestreams 0 and 1, one of them also on the rendered result
    meta.notify_entry_ready(1, EntryKey::Association(AssocKey::new().with_codestreams([0])));
    meta.notify_entry_ready(
        2,
        EntryKey::Association(AssocKey::new().with_codestreams([1]).with_rendered(true)),
    );

    // A region scoped to codestream 0 and a top-level region
    meta.notify_entry_ready(
        3,
        EntryKey::Region {
            scope: Some(AssocKey::new().with_codestreams([0])),
            rect: Rect::from_xywh(0, 0, 64, 64),
        },
    );
    meta.notify_entry_ready(
        4,
        EntryKey::Region {
            scope: None,
            rect: Rect::from_xywh(32, 32, 8, 8),
        },
    );

    // A cross-reference to a node that has not been parsed yet
    let waiting = meta.register_waiter(8192, 1);
    println!("node at 8192 before parsing: {waiting:?}");
    let woken = meta.notify_node_parsed(8192, 5);
    println!("waiters released by node 5: {woken:?}");

    let cs0 = Query {
        codestream: Some(0),
        ..Query::default()
    };
    println!("codestream 0: {:?}", meta.matches(&cs0).collect::<Vec<_>>());

    let rendered = Query {
        rendered_result: true,
        ..Query::default()
    };
    println!("rendered result: {:?}", meta.matches(&rendered).collect::<Vec<_>>());

    let probe = Query {
        region: Some(Rect::from_xywh(35, 35, 1, 1)),
        ..Query::default()
    };
    println!("regions at (35, 35): {:?}", meta.matches(&probe).collect::<Vec<_>>());

    println!("{meta:?}");
}
