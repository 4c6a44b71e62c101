// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Key extents and the power-of-two bucket arithmetic used by the cluster tree.

use core::fmt::Debug;

/// Largest bucket exponent; buckets never exceed `2^63`.
pub(crate) const MAX_LOG2: u32 = 63;

/// Half-open scalar range `[min, lim)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    /// Inclusive lower bound.
    pub min: i64,
    /// Exclusive upper bound.
    pub lim: i64,
}

impl Span {
    /// A span covering every representable value; use it as an unrestricted query.
    pub const ALL: Self = Self {
        min: i64::MIN,
        lim: i64::MAX,
    };

    /// Create a span from its bounds.
    pub const fn new(min: i64, lim: i64) -> Self {
        Self { min, lim }
    }

    /// The single-value span `[value, value + 1)`.
    pub const fn point(value: i64) -> Self {
        Self {
            min: value,
            lim: value.saturating_add(1),
        }
    }

    /// The span from the smallest to the largest member of a sorted set.
    ///
    /// Returns `None` for an empty set.
    pub fn of_sorted(values: &[u32]) -> Option<Self> {
        let first = *values.first()?;
        let last = *values.last()?;
        debug_assert!(first <= last, "set members must be sorted");
        Some(Self::new(i64::from(first), i64::from(last) + 1))
    }

    /// Number of values covered.
    pub const fn len(&self) -> u64 {
        if self.lim > self.min {
            self.lim.abs_diff(self.min)
        } else {
            0
        }
    }

    /// Whether the span covers no value.
    pub const fn is_empty(&self) -> bool {
        self.lim <= self.min
    }

    /// Whether `value` lies in the span.
    pub const fn contains(&self, value: i64) -> bool {
        self.min <= value && value < self.lim
    }
}

/// Axis-aligned integer rectangle with half-open edges.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge (inclusive).
    pub min_x: i64,
    /// Top edge (inclusive).
    pub min_y: i64,
    /// Right edge (exclusive).
    pub lim_x: i64,
    /// Bottom edge (exclusive).
    pub lim_y: i64,
}

impl Rect {
    /// A rectangle covering the whole coordinate plane.
    pub const ALL: Self = Self {
        min_x: i64::MIN,
        min_y: i64::MIN,
        lim_x: i64::MAX,
        lim_y: i64::MAX,
    };

    /// Create a rectangle from its edges.
    pub const fn new(min_x: i64, min_y: i64, lim_x: i64, lim_y: i64) -> Self {
        Self {
            min_x,
            min_y,
            lim_x,
            lim_y,
        }
    }

    /// Create a rectangle from its origin and size.
    pub const fn from_xywh(x: i64, y: i64, w: i64, h: i64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            lim_x: x.saturating_add(w),
            lim_y: y.saturating_add(h),
        }
    }

    /// Horizontal extent.
    pub const fn width(&self) -> u64 {
        Span::new(self.min_x, self.lim_x).len()
    }

    /// Vertical extent.
    pub const fn height(&self) -> u64 {
        Span::new(self.min_y, self.lim_y).len()
    }

    /// Length of the longer side.
    pub fn longest_side(&self) -> u64 {
        self.width().max(self.height())
    }

    /// Whether the rectangle has no area.
    pub const fn is_empty(&self) -> bool {
        self.lim_x <= self.min_x || self.lim_y <= self.min_y
    }

    fn x(&self) -> Span {
        Span::new(self.min_x, self.lim_x)
    }

    fn y(&self) -> Span {
        Span::new(self.min_y, self.lim_y)
    }
}

/// Key shape stored by a [`ClusterIndex`](crate::ClusterIndex).
///
/// Entries are anchored by their minimum corner: a cluster's bucket is the aligned
/// power-of-two cell containing the anchors of everything below it.
pub trait Extent: Copy + PartialEq + Debug {
    /// Number of axes that are subdivided at each cluster level.
    const AXES: u32;

    /// Default number of entries (or children) a cluster holds before it is subdivided.
    const DEFAULT_SPLIT_THRESHOLD: usize;

    /// Default number of bits each axis loses per cluster level.
    const DEFAULT_STEP_BITS: u32;

    /// Exponent of the granularity: the smallest `k` with every side at most `2^k`.
    fn granularity_log2(&self) -> u32;

    /// Exponent of the minimal covering bucket: the smallest aligned `2^k` cell holding
    /// the whole extent.
    fn covering_log2(&self) -> u32;

    /// Smallest extent containing both.
    fn union(&self, other: &Self) -> Self;

    /// Whether the two extents share at least one value.
    fn intersects(&self, other: &Self) -> bool;

    /// Whether both minimum corners fall in the same aligned cell of side `2^log2`.
    fn shares_bucket(&self, other: &Self, log2: u32) -> bool;

    /// The aligned cell of side `2^log2` holding the minimum corner, with its upper edges
    /// pushed out by `2^reach_log2` so that anything anchored inside stays covered.
    fn bucket(&self, log2: u32, reach_log2: u32) -> Self;
}

impl Extent for Span {
    const AXES: u32 = 1;
    const DEFAULT_SPLIT_THRESHOLD: usize = 8;
    const DEFAULT_STEP_BITS: u32 = 3;

    fn granularity_log2(&self) -> u32 {
        ceil_log2(self.len())
    }

    fn covering_log2(&self) -> u32 {
        let hi = self.lim.saturating_sub(1).max(self.min);
        differing_log2(self.min, hi)
    }

    fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.lim.max(other.lim))
    }

    fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min < other.lim
            && other.min < self.lim
    }

    fn shares_bucket(&self, other: &Self, log2: u32) -> bool {
        align_down(self.min, log2) == align_down(other.min, log2)
    }

    fn bucket(&self, log2: u32, reach_log2: u32) -> Self {
        let min = align_down(self.min, log2);
        Self::new(min, min.saturating_add(pow2(log2)).saturating_add(pow2(reach_log2)))
    }
}

impl Extent for Rect {
    const AXES: u32 = 2;
    const DEFAULT_SPLIT_THRESHOLD: usize = 16;
    const DEFAULT_STEP_BITS: u32 = 2;

    fn granularity_log2(&self) -> u32 {
        ceil_log2(self.longest_side())
    }

    fn covering_log2(&self) -> u32 {
        self.x().covering_log2().max(self.y().covering_log2())
    }

    fn union(&self, other: &Self) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.lim_x.max(other.lim_x),
            self.lim_y.max(other.lim_y),
        )
    }

    fn intersects(&self, other: &Self) -> bool {
        self.x().intersects(&other.x()) && self.y().intersects(&other.y())
    }

    fn shares_bucket(&self, other: &Self, log2: u32) -> bool {
        self.x().shares_bucket(&other.x(), log2) && self.y().shares_bucket(&other.y(), log2)
    }

    fn bucket(&self, log2: u32, reach_log2: u32) -> Self {
        let x = self.x().bucket(log2, reach_log2);
        let y = self.y().bucket(log2, reach_log2);
        Self::new(x.min, y.min, x.lim, y.lim)
    }
}

/// Smallest `k` with `n <= 2^k`, treating zero as one.
pub(crate) fn ceil_log2(n: u64) -> u32 {
    if n <= 1 {
        0
    } else {
        (u64::BITS - (n - 1).leading_zeros()).min(MAX_LOG2)
    }
}

/// Smallest `k` with `a >> k == b >> k`.
fn differing_log2(a: i64, b: i64) -> u32 {
    let diff = a ^ b;
    if diff == 0 {
        0
    } else {
        (i64::BITS - diff.leading_zeros()).min(MAX_LOG2)
    }
}

fn align_down(v: i64, log2: u32) -> i64 {
    let log2 = log2.min(MAX_LOG2);
    (v >> log2) << log2
}

fn pow2(log2: u32) -> i64 {
    if log2 >= MAX_LOG2 {
        i64::MAX
    } else {
        1_i64 << log2
    }
}
