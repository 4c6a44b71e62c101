// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Association keys, their per-dimension decomposition, and association queries.

use alloc::vec::Vec;

use jpxmeta_index::Span;

/// One attribute role an association can play.
///
/// Dimensions are listed in query priority order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    /// Compositing layer at top level.
    Layer,
    /// Compositing layer inside a repeated container's base range.
    BaseLayer,
    /// Codestream at top level.
    Codestream,
    /// Codestream inside a repeated container's base range.
    BaseCodestream,
    /// Applies to the rendered result; a single-bucket dimension.
    Rendered,
}

impl Dimension {
    /// Every dimension, in priority order.
    pub const ALL: [Self; 5] = [
        Self::Layer,
        Self::BaseLayer,
        Self::Codestream,
        Self::BaseCodestream,
        Self::Rendered,
    ];

    /// Position in [`Dimension::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The matching flag.
    pub const fn flag(self) -> Dimensions {
        match self {
            Self::Layer => Dimensions::LAYER,
            Self::BaseLayer => Dimensions::BASE_LAYER,
            Self::Codestream => Dimensions::CODESTREAM,
            Self::BaseCodestream => Dimensions::BASE_CODESTREAM,
            Self::Rendered => Dimensions::RENDERED,
        }
    }
}

bitflags::bitflags! {
    /// Set of association dimensions.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Dimensions: u8 {
        /// See [`Dimension::Layer`].
        const LAYER           = 0b0000_0001;
        /// See [`Dimension::BaseLayer`].
        const BASE_LAYER      = 0b0000_0010;
        /// See [`Dimension::Codestream`].
        const CODESTREAM      = 0b0000_0100;
        /// See [`Dimension::BaseCodestream`].
        const BASE_CODESTREAM = 0b0000_1000;
        /// See [`Dimension::Rendered`].
        const RENDERED        = 0b0001_0000;
    }
}

/// Which image components, layers and outputs a metadata node is associated with.
///
/// Each id set is kept sorted without duplicates, so two keys compare equal exactly when
/// they describe the same association.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AssocKey {
    layers: Vec<u32>,
    base_layers: Vec<u32>,
    codestreams: Vec<u32>,
    base_codestreams: Vec<u32>,
    rendered: bool,
}

fn normalized(ids: impl IntoIterator<Item = u32>) -> Vec<u32> {
    let mut ids: Vec<u32> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

impl AssocKey {
    /// A key with no associations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the compositing layer set.
    #[must_use]
    pub fn with_layers(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.layers = normalized(ids);
        self
    }

    /// Replace the base-range compositing layer set.
    #[must_use]
    pub fn with_base_layers(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.base_layers = normalized(ids);
        self
    }

    /// Replace the codestream set.
    #[must_use]
    pub fn with_codestreams(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.codestreams = normalized(ids);
        self
    }

    /// Replace the base-range codestream set.
    #[must_use]
    pub fn with_base_codestreams(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.base_codestreams = normalized(ids);
        self
    }

    /// Set the rendered-result flag.
    #[must_use]
    pub fn with_rendered(mut self, rendered: bool) -> Self {
        self.rendered = rendered;
        self
    }

    /// The sorted ids of a scalar dimension; always empty for [`Dimension::Rendered`].
    pub fn ids(&self, dim: Dimension) -> &[u32] {
        match dim {
            Dimension::Layer => &self.layers,
            Dimension::BaseLayer => &self.base_layers,
            Dimension::Codestream => &self.codestreams,
            Dimension::BaseCodestream => &self.base_codestreams,
            Dimension::Rendered => &[],
        }
    }

    /// Whether the node applies to the rendered result.
    pub fn rendered(&self) -> bool {
        self.rendered
    }

    /// Dimensions in which the key is non-empty.
    pub fn dimensions(&self) -> Dimensions {
        Dimension::ALL
            .into_iter()
            .filter(|d| self.extent(*d).is_some())
            .fold(Dimensions::empty(), |acc, d| acc | d.flag())
    }

    /// True if the key associates with nothing at all.
    pub fn is_empty(&self) -> bool {
        self.dimensions().is_empty()
    }

    /// The scalar sub-key stored in the index of `dim`.
    pub fn extent(&self, dim: Dimension) -> Option<Span> {
        match dim {
            Dimension::Rendered => self.rendered.then_some(RENDERED_EXTENT),
            _ => Span::of_sorted(self.ids(dim)),
        }
    }

    /// Exact membership test behind the conservative range check of the index.
    pub fn matches(&self, dim: Dimension, criterion: Criterion) -> bool {
        match (dim, criterion) {
            (Dimension::Rendered, _) => self.rendered,
            (_, Criterion::Any) => !self.ids(dim).is_empty(),
            (_, Criterion::Id(id)) => self.ids(dim).binary_search(&id).is_ok(),
        }
    }
}

/// The rendered-result dimension holds every flagged key in one bucket.
const RENDERED_EXTENT: Span = Span::point(0);

/// What a query asks of one dimension.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Criterion {
    /// Any non-empty association in the dimension.
    Any,
    /// An association that includes this id.
    Id(u32),
}

impl Criterion {
    /// The range searched in the index of `dim`.
    pub fn extent(self, dim: Dimension) -> Span {
        match (dim, self) {
            (Dimension::Rendered, _) => RENDERED_EXTENT,
            (_, Self::Any) => Span::ALL,
            (_, Self::Id(id)) => Span::point(i64::from(id)),
        }
    }
}

/// Association criteria of a query.
///
/// A representative matches when it satisfies any of the criteria that are set. A query
/// with no criteria at all is unrestricted and matches every representative.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AssocQuery {
    /// Compositing layer id.
    pub layer: Option<u32>,
    /// Base-range compositing layer id.
    pub base_layer: Option<u32>,
    /// Codestream id.
    pub codestream: Option<u32>,
    /// Base-range codestream id.
    pub base_codestream: Option<u32>,
    /// Match nodes that apply to the rendered result.
    pub rendered_result: bool,
}

impl AssocQuery {
    /// True if no criterion is set.
    pub fn is_unrestricted(&self) -> bool {
        *self == Self::default()
    }

    /// The criterion for `dim`, or `None` if the dimension is not searched.
    pub fn criterion(&self, dim: Dimension) -> Option<Criterion> {
        if self.is_unrestricted() {
            return Some(Criterion::Any);
        }
        let id = match dim {
            Dimension::Layer => self.layer,
            Dimension::BaseLayer => self.base_layer,
            Dimension::Codestream => self.codestream,
            Dimension::BaseCodestream => self.base_codestream,
            Dimension::Rendered => return self.rendered_result.then_some(Criterion::Any),
        };
        id.map(Criterion::Id)
    }

    /// Whether `key` satisfies this query in any dimension before `dim`.
    pub(crate) fn matched_earlier(&self, key: &AssocKey, dim: Dimension) -> bool {
        Dimension::ALL[..dim.index()].iter().any(|&earlier| {
            self.criterion(earlier)
                .is_some_and(|c| key.matches(earlier, c))
        })
    }

    /// Whether `key` satisfies this query at all.
    pub fn matches(&self, key: &AssocKey) -> bool {
        Dimension::ALL
            .into_iter()
            .any(|dim| self.criterion(dim).is_some_and(|c| key.matches(dim, c)))
    }
}
