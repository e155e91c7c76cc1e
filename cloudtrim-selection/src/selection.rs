//! Screen-space box selection
//!
//! A point is selected by a box when its projected pixel position lies inside
//! the box, bounds included on both axes. The selection of several boxes is the
//! union of their individual selections.

use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use cloudtrim_core::{BufferVersion, Error, PointBuffer, Result};

use crate::index::ScreenIndex;
use crate::projection::{Projection, ScreenPoint};

/// Identifier of a committed selection box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoxId(pub u64);

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "box#{}", self.0)
    }
}

/// A rectangle dragged on screen, kept as the two corners the user produced
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionBox {
    pub id: BoxId,
    pub start: Point2<f32>,
    pub end: Point2<f32>,
}

impl SelectionBox {
    pub fn new(id: BoxId, start: Point2<f32>, end: Point2<f32>) -> Self {
        Self { id, start, end }
    }

    pub fn rect(&self) -> ScreenRect {
        ScreenRect::from_corners(self.start, self.end)
    }
}

/// Axis-aligned pixel rectangle with normalized bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl ScreenRect {
    /// Build from two opposite corners in any order
    pub fn from_corners(a: Point2<f32>, b: Point2<f32>) -> Self {
        Self {
            min_x: a.x.min(b.x),
            max_x: a.x.max(b.x),
            min_y: a.y.min(b.y),
            max_y: a.y.max(b.y),
        }
    }

    /// Closed-interval containment; NaN coordinates are never contained
    #[inline]
    pub fn contains(&self, p: &ScreenPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Grow the rectangle by `margin` pixels on every side
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min_x: self.min_x - margin,
            max_x: self.max_x + margin,
            min_y: self.min_y - margin,
            max_y: self.max_y + margin,
        }
    }
}

impl From<&SelectionBox> for ScreenRect {
    fn from(selection_box: &SelectionBox) -> Self {
        selection_box.rect()
    }
}

impl From<SelectionBox> for ScreenRect {
    fn from(selection_box: SelectionBox) -> Self {
        selection_box.rect()
    }
}

/// Indices of the points inside one rectangle, ascending
pub fn select_in_box(screen_points: &[ScreenPoint], rect: impl Into<ScreenRect>) -> Vec<usize> {
    let rect = rect.into();
    screen_points
        .iter()
        .enumerate()
        .filter(|(_, p)| rect.contains(p))
        .map(|(i, _)| i)
        .collect()
}

/// Indices of the points inside at least one box, ascending and unique
///
/// O(N·B) with a full scan per call.
pub fn select_union_indices(screen_points: &[ScreenPoint], boxes: &[SelectionBox]) -> Vec<usize> {
    if boxes.is_empty() {
        return Vec::new();
    }
    let rects: Vec<ScreenRect> = boxes.iter().map(ScreenRect::from).collect();
    screen_points
        .iter()
        .enumerate()
        .filter(|(_, p)| rects.iter().any(|r| r.contains(p)))
        .map(|(i, _)| i)
        .collect()
}

/// Union selection over a projection, tagged with the projected buffer version
pub fn select_union(projection: &Projection, boxes: &[SelectionBox]) -> SelectionResult {
    SelectionResult::from_sorted(projection.version(), select_union_indices(projection, boxes))
}

/// How union selections are evaluated
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// Test every projected point against every box
    #[default]
    Linear,
    /// Bulk-load projected points into an R-tree and query it per box
    Indexed,
}

impl SelectionStrategy {
    pub fn select(&self, projection: &Projection, boxes: &[SelectionBox]) -> SelectionResult {
        match *self {
            SelectionStrategy::Linear => select_union(projection, boxes),
            SelectionStrategy::Indexed => {
                ScreenIndex::build(projection).select_union(projection, boxes)
            }
        }
    }
}

/// Set of selected point indices, valid only for the buffer version it was
/// computed against
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionResult {
    version: BufferVersion,
    indices: Vec<usize>,
}

impl SelectionResult {
    /// Build from arbitrary indices; they are sorted and deduplicated
    pub fn new(version: BufferVersion, mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { version, indices }
    }

    pub(crate) fn from_sorted(version: BufferVersion, indices: Vec<usize>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        Self { version, indices }
    }

    pub fn empty(version: BufferVersion) -> Self {
        Self {
            version,
            indices: Vec::new(),
        }
    }

    pub fn version(&self) -> BufferVersion {
        self.version
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether this selection still refers to `buffer`'s point set
    pub fn is_current_for(&self, buffer: &PointBuffer) -> bool {
        self.version == buffer.version()
    }

    /// Strict check, for callers that must not proceed on a stale selection
    pub fn validate_against(&self, buffer: &PointBuffer) -> Result<()> {
        if self.is_current_for(buffer) {
            Ok(())
        } else {
            Err(Error::StaleSelection {
                computed_for: self.version,
                current: buffer.version(),
            })
        }
    }

    /// Selected indices if still valid for `buffer`, otherwise nothing
    pub fn indices_for(&self, buffer: &PointBuffer) -> &[usize] {
        if self.is_current_for(buffer) {
            &self.indices
        } else {
            &[]
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Membership as a dense mask of length `len`
    pub fn to_mask(&self, len: usize) -> Vec<bool> {
        let mut mask = vec![false; len];
        for &i in self.indices.iter().filter(|&&i| i < len) {
            mask[i] = true;
        }
        mask
    }
}
