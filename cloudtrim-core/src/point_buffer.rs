//! Point buffer: positions and per-point colors stored as parallel arrays

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::point::*;

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Identity of one point set
///
/// Every loaded or compacted buffer receives a fresh version. Indices computed
/// against one version are meaningless against any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BufferVersion(u64);

impl BufferVersion {
    fn next() -> Self {
        Self(NEXT_VERSION.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BufferVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Sphere enclosing every point of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: Point3f,
    pub radius: f32,
}

/// An ordered point cloud with one color per point
///
/// `positions` and `colors` always have the same length. The only operation that
/// changes the point count is [`PointBuffer::compact`], which returns a new
/// buffer with a new [`BufferVersion`].
#[derive(Debug, Clone)]
pub struct PointBuffer {
    positions: Vec<Point3f>,
    colors: Vec<Color>,
    version: BufferVersion,
}

impl PointBuffer {
    /// Create a new empty buffer
    pub fn new() -> Self {
        Self::from_parts(Vec::new(), Vec::new())
    }

    /// Build a buffer from loader output, every point colored white
    ///
    /// Empty input is accepted: the result is a zero-length buffer on which every
    /// later operation is a no-op.
    pub fn load<I>(positions: I) -> Self
    where
        I: IntoIterator<Item = Point3f>,
    {
        let positions: Vec<Point3f> = positions.into_iter().collect();
        if positions.is_empty() {
            debug!("loading empty point buffer");
        }
        let colors = vec![Color::WHITE; positions.len()];
        let buffer = Self::from_parts(positions, colors);
        debug!(points = buffer.len(), version = %buffer.version, "loaded point buffer");
        buffer
    }

    /// Build a buffer from a flat `[x0, y0, z0, x1, ...]` array
    pub fn load_flat(flat: &[f32]) -> Result<Self> {
        if flat.len() % 3 != 0 {
            return Err(Error::InvalidData(format!(
                "flat position array length {} is not a multiple of 3",
                flat.len()
            )));
        }
        Ok(Self::load(
            flat.chunks_exact(3).map(|xyz| Point3f::new(xyz[0], xyz[1], xyz[2])),
        ))
    }

    /// Build a buffer from explicit positions and colors
    pub fn with_colors(positions: Vec<Point3f>, colors: Vec<Color>) -> Result<Self> {
        if positions.len() != colors.len() {
            return Err(Error::InvalidData(format!(
                "{} positions but {} colors",
                positions.len(),
                colors.len()
            )));
        }
        Ok(Self::from_parts(positions, colors))
    }

    fn from_parts(positions: Vec<Point3f>, colors: Vec<Color>) -> Self {
        debug_assert_eq!(positions.len(), colors.len());
        Self {
            positions,
            colors,
            version: BufferVersion::next(),
        }
    }

    /// Get the number of points in the buffer
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn version(&self) -> BufferVersion {
        self.version
    }

    pub fn positions(&self) -> &[Point3f] {
        &self.positions
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Positions as a flat `x y z` array, length `3 * len()`
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colors as a flat `r g b` array, length `3 * len()`
    pub fn colors_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn get(&self, index: usize) -> Option<ColoredPoint> {
        Some(ColoredPoint {
            position: *self.positions.get(index)?,
            color: self.colors[index],
        })
    }

    /// Iterate over points in buffer order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = ColoredPoint> + '_ {
        self.positions
            .iter()
            .zip(self.colors.iter())
            .map(|(&position, &color)| ColoredPoint { position, color })
    }

    /// Overwrite the color of one point; no structural effect
    pub fn set_color(&mut self, index: usize, color: Color) -> Result<()> {
        let len = self.len();
        let slot = self
            .colors
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;
        *slot = color;
        Ok(())
    }

    /// Mutable access to the color array for bulk cosmetic passes
    pub fn colors_mut(&mut self) -> &mut [Color] {
        &mut self.colors
    }

    /// Axis-aligned bounds as `(min, max)`, `None` when empty
    pub fn bounding_box(&self) -> Option<(Point3f, Point3f)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        }))
    }

    /// Bounding sphere over the current positions
    ///
    /// Centered on the bounding-box center with the radius reaching the farthest
    /// point. An empty buffer yields a zero sphere at the origin. Not cached:
    /// callers recompute after load or compaction.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        let Some((min, max)) = self.bounding_box() else {
            return BoundingSphere {
                center: Point3f::origin(),
                radius: 0.0,
            };
        };
        let center = nalgebra::center(&min, &max);
        let radius_squared = self
            .positions
            .iter()
            .map(|p| nalgebra::distance_squared(&center, p))
            .fold(0.0_f32, f32::max);
        BoundingSphere {
            center,
            radius: radius_squared.sqrt(),
        }
    }

    /// Translate every point so the bounding-box center sits at the origin
    ///
    /// Returns the translation that was applied. Point count and order are
    /// untouched, so the version is kept.
    pub fn center(&mut self) -> Vector3f {
        let Some((min, max)) = self.bounding_box() else {
            return Vector3f::zeros();
        };
        let offset = -nalgebra::center(&min, &max).coords;
        for p in &mut self.positions {
            *p += offset;
        }
        offset
    }

    /// Keep exactly the points for which `keep(index)` holds, in original order
    ///
    /// Positions and colors are rebuilt together and the result carries a new
    /// version, so any selection computed against `self` is stale afterwards.
    pub fn compact<F>(&self, mut keep: F) -> PointBuffer
    where
        F: FnMut(usize) -> bool,
    {
        let mut positions = Vec::new();
        let mut colors = Vec::new();
        for (i, (p, c)) in self.positions.iter().zip(self.colors.iter()).enumerate() {
            if keep(i) {
                positions.push(*p);
                colors.push(*c);
            }
        }
        let compacted = Self::from_parts(positions, colors);
        debug!(
            before = self.len(),
            after = compacted.len(),
            from = %self.version,
            to = %compacted.version,
            "compacted point buffer"
        );
        compacted
    }
}

impl Default for PointBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Point3f> for PointBuffer {
    fn from_iter<I: IntoIterator<Item = Point3f>>(iter: I) -> Self {
        Self::load(iter)
    }
}
