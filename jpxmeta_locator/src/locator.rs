// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-position record and its resolution state machine.

use alloc::vec::Vec;

/// Resolution state of a [`Locator`].
///
/// A locator only moves forward, `Empty` to `Waiting` to `Resolved`, except that
/// [`LocatorTable::release`](crate::LocatorTable::release) scrubs a resolved locator back
/// to `Empty` once its node has been deleted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocatorState<N, W> {
    /// Known position, nothing parsed there and nobody waiting.
    Empty,
    /// Waiters queued in registration order.
    Waiting(Vec<W>),
    /// The node parsed at this position.
    Resolved(N),
}

/// A file position that some metadata refers to.
#[derive(Clone, Debug)]
pub struct Locator<N, W> {
    position: u64,
    state: LocatorState<N, W>,
}

impl<N: Copy, W> Locator<N, W> {
    pub(crate) fn new(position: u64) -> Self {
        Self {
            position,
            state: LocatorState::Empty,
        }
    }

    /// Byte offset of the referenced box.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Current state.
    pub fn state(&self) -> &LocatorState<N, W> {
        &self.state
    }

    /// The resolved node, if any.
    pub fn node(&self) -> Option<N> {
        match self.state {
            LocatorState::Resolved(node) => Some(node),
            _ => None,
        }
    }

    /// Number of queued waiters.
    pub fn waiting(&self) -> usize {
        match &self.state {
            LocatorState::Waiting(waiters) => waiters.len(),
            _ => 0,
        }
    }

    /// Queue `waiter`, or hand back the node if it is already known.
    pub(crate) fn wait(&mut self, waiter: W) -> Option<N> {
        match &mut self.state {
            LocatorState::Resolved(node) => Some(*node),
            LocatorState::Waiting(waiters) => {
                waiters.push(waiter);
                None
            }
            LocatorState::Empty => {
                self.state = LocatorState::Waiting(alloc::vec![waiter]);
                None
            }
        }
    }

    /// Bind the node and drain the queue.
    ///
    /// Returns `None` if the locator was already resolved; the first node wins.
    pub(crate) fn resolve(&mut self, node: N) -> Option<Vec<W>> {
        match core::mem::replace(&mut self.state, LocatorState::Resolved(node)) {
            LocatorState::Empty => Some(Vec::new()),
            LocatorState::Waiting(waiters) => Some(waiters),
            previous @ LocatorState::Resolved(_) => {
                self.state = previous;
                None
            }
        }
    }

    pub(crate) fn release(&mut self, node: N) -> bool
    where
        N: PartialEq,
    {
        if self.node() == Some(node) {
            self.state = LocatorState::Empty;
            true
        } else {
            false
        }
    }

    pub(crate) fn cancel(&mut self, waiter: &W) -> bool
    where
        W: PartialEq,
    {
        let LocatorState::Waiting(waiters) = &mut self.state else {
            return false;
        };
        let Some(i) = waiters.iter().position(|w| w == waiter) else {
            return false;
        };
        waiters.remove(i);
        if waiters.is_empty() {
            self.state = LocatorState::Empty;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiters_drain_once() {
        let mut loc: Locator<u32, char> = Locator::new(10);
        assert_eq!(loc.wait('a'), None);
        assert_eq!(loc.wait('b'), None);
        assert_eq!(loc.waiting(), 2);
        assert_eq!(loc.resolve(7), Some(alloc::vec!['a', 'b']));
        assert_eq!(loc.node(), Some(7));
        assert_eq!(loc.resolve(8), None, "a resolved locator keeps its first node");
        assert_eq!(loc.node(), Some(7));
        assert_eq!(loc.wait('c'), Some(7));
        assert_eq!(loc.waiting(), 0);
    }

    #[test]
    fn release_and_cancel_return_to_empty() {
        let mut loc: Locator<u32, char> = Locator::new(0);
        loc.wait('a');
        assert!(!loc.cancel(&'z'));
        assert!(loc.cancel(&'a'));
        assert_eq!(loc.state(), &LocatorState::Empty);

        loc.resolve(3);
        assert!(!loc.release(4));
        assert!(loc.release(3));
        assert_eq!(loc.state(), &LocatorState::Empty);
    }
}
