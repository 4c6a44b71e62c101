// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Block sizing.

/// Tunables of a [`LocatorTable`](crate::LocatorTable).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LocatorConfig {
    /// Items a block holds before it is split in half.
    pub block_capacity: usize,
}

impl LocatorConfig {
    /// Default number of items per block.
    pub const DEFAULT_BLOCK_CAPACITY: usize = 64;

    /// Smallest capacity that still leaves two items in each half after a split.
    pub const MIN_BLOCK_CAPACITY: usize = 4;

    /// Check that blocks can be split.
    pub fn validate(self) -> Result<Self, LocatorConfigError> {
        if self.block_capacity < Self::MIN_BLOCK_CAPACITY {
            return Err(LocatorConfigError::CapacityTooSmall(self.block_capacity));
        }
        Ok(self)
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            block_capacity: Self::DEFAULT_BLOCK_CAPACITY,
        }
    }
}

/// Rejected [`LocatorConfig`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LocatorConfigError {
    /// Blocks must hold at least [`LocatorConfig::MIN_BLOCK_CAPACITY`] items.
    #[error("block capacity must be at least {min}, got {0}", min = LocatorConfig::MIN_BLOCK_CAPACITY)]
    CapacityTooSmall(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_floor() {
        assert_eq!(LocatorConfig::default().block_capacity, 64);
        assert!(LocatorConfig::default().validate().is_ok());
        let tiny = LocatorConfig { block_capacity: 3 };
        assert_eq!(tiny.validate(), Err(LocatorConfigError::CapacityTooSmall(3)));
    }
}
