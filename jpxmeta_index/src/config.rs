// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Split policy configuration.

use crate::types::Extent;

/// Tunable split policy of a [`ClusterIndex`](crate::ClusterIndex).
///
/// The defaults (8 entries and 3-bit steps for spans, 16 entries and 2-bit steps per axis
/// for rectangles) make one level of fan-out exactly absorb one split threshold. They
/// are empirical; no worst-case bound holds for adversarial key distributions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IndexConfig {
    /// Entries a leaf (or children a branch) may hold before the cluster is subdivided.
    pub split_threshold: usize,
    /// Bits each axis loses when a new cluster level is introduced.
    pub step_bits: u32,
}

impl IndexConfig {
    /// Default policy for an extent type.
    pub const fn for_extent<E: Extent>() -> Self {
        Self {
            split_threshold: E::DEFAULT_SPLIT_THRESHOLD,
            step_bits: E::DEFAULT_STEP_BITS,
        }
    }

    /// Check that the policy can make progress.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.split_threshold < 2 {
            return Err(ConfigError::SplitThresholdTooSmall(self.split_threshold));
        }
        if !(1..=16).contains(&self.step_bits) {
            return Err(ConfigError::StepOutOfRange(self.step_bits));
        }
        Ok(self)
    }
}

/// Rejected [`IndexConfig`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A threshold below two would split single entries forever.
    #[error("split threshold must be at least 2, got {0}")]
    SplitThresholdTooSmall(usize),
    /// Steps must shrink buckets without skipping the whole coordinate range.
    #[error("step must be between 1 and 16 bits, got {0}")]
    StepOutOfRange(u32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Rect, Span};

    #[test]
    fn defaults_follow_the_extent() {
        let scalar = IndexConfig::for_extent::<Span>();
        assert_eq!(scalar.split_threshold, 8);
        assert_eq!(scalar.step_bits, 3);
        let region = IndexConfig::for_extent::<Rect>();
        assert_eq!(region.split_threshold, 16);
        assert_eq!(region.step_bits, 2);
        assert_eq!(region.validate(), Ok(region));
    }

    #[test]
    fn degenerate_policies_are_rejected() {
        let bad = IndexConfig {
            split_threshold: 1,
            step_bits: 3,
        };
        assert_eq!(bad.validate(), Err(ConfigError::SplitThresholdTooSmall(1)));
        let bad = IndexConfig {
            split_threshold: 8,
            step_bits: 0,
        };
        assert_eq!(bad.validate(), Err(ConfigError::StepOutOfRange(0)));
    }
}
