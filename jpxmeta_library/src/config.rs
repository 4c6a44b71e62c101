// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Manager configuration.

use jpxmeta_index::{ConfigError, IndexConfig, Rect, Span};
use jpxmeta_locator::{LocatorConfig, LocatorConfigError};

/// Tunables of a [`MetaManager`](crate::MetaManager).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Split policy of the five association indexes.
    pub associations: IndexConfig,
    /// Split policy of every region index, scoped or not.
    pub regions: IndexConfig,
    /// Block sizing of the locator table.
    pub locators: LocatorConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            associations: IndexConfig::for_extent::<Span>(),
            regions: IndexConfig::for_extent::<Rect>(),
            locators: LocatorConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Check every part of the configuration.
    pub fn validate(self) -> Result<Self, ManagerConfigError> {
        self.associations
            .validate()
            .map_err(ManagerConfigError::Associations)?;
        self.regions
            .validate()
            .map_err(ManagerConfigError::Regions)?;
        self.locators.validate()?;
        Ok(self)
    }
}

/// Rejected [`ManagerConfig`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ManagerConfigError {
    /// The association index policy is unusable.
    #[error("association index: {0}")]
    Associations(#[source] ConfigError),
    /// The region index policy is unusable.
    #[error("region index: {0}")]
    Regions(#[source] ConfigError),
    /// The locator table sizing is unusable.
    #[error(transparent)]
    Locators(#[from] LocatorConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_failing_part() {
        assert!(ManagerConfig::default().validate().is_ok());

        let bad_regions = ManagerConfig {
            regions: IndexConfig {
                split_threshold: 16,
                step_bits: 0,
            },
            ..ManagerConfig::default()
        };
        assert_eq!(
            bad_regions.validate(),
            Err(ManagerConfigError::Regions(ConfigError::StepOutOfRange(0)))
        );

        let bad_blocks = ManagerConfig {
            locators: LocatorConfig { block_capacity: 2 },
            ..ManagerConfig::default()
        };
        assert_eq!(
            bad_blocks.validate(),
            Err(ManagerConfigError::Locators(
                LocatorConfigError::CapacityTooSmall(2)
            ))
        );
    }
}
