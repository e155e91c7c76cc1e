//! Projection of cloud-local points into pixel coordinates
//!
//! A point goes through three steps: the cloud's world transform, the camera's
//! view and projection matrices with perspective divide into normalized device
//! coordinates, and finally the viewport transform
//!
//! ```text
//! screen_x = ( ndc.x * 0.5 + 0.5) * width
//! screen_y = (-ndc.y * 0.5 + 0.5) * height
//! ```
//!
//! NDC y grows upward while pixel y grows downward, hence the flip.

use std::ops::Deref;

use nalgebra::{Matrix4, Point2, Point3};
use tracing::trace;

use cloudtrim_core::{BufferVersion, Point3f, PointBuffer, Transform3D};

use crate::camera::{Camera, Viewport};

/// A projected point in pixel coordinates, origin at the top-left corner
pub type ScreenPoint = Point2<f32>;

/// Placeholder for points that cannot be projected; fails every box test
fn unprojected() -> ScreenPoint {
    ScreenPoint::new(f32::NAN, f32::NAN)
}

/// Combined world, view and projection matrix for one camera snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewProjection {
    matrix: Matrix4<f32>,
}

impl ViewProjection {
    pub fn new(world: &Transform3D, camera: &Camera) -> Self {
        Self::from_matrices(world, &camera.view_matrix(), &camera.projection_matrix())
    }

    pub fn from_matrices(
        world: &Transform3D,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Self {
        Self {
            matrix: projection * view * world.matrix,
        }
    }

    /// Normalized device coordinates of a cloud-local point
    ///
    /// `None` when the point lies on or behind the camera plane (`w <= 0`),
    /// where the perspective divide would mirror it back into view.
    pub fn to_ndc(&self, local: &Point3f) -> Option<Point3f> {
        let clip = self.matrix * local.to_homogeneous();
        if !(clip.w > 0.0) {
            return None;
        }
        Some(Point3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w))
    }

    /// Pixel coordinates of a cloud-local point
    pub fn project_point(&self, local: &Point3f, viewport: &Viewport) -> Option<ScreenPoint> {
        self.to_ndc(local).map(|ndc| ndc_to_screen(&ndc, viewport))
    }
}

/// Viewport transform from NDC to pixels
pub fn ndc_to_screen(ndc: &Point3f, viewport: &Viewport) -> ScreenPoint {
    ScreenPoint::new(
        (ndc.x * 0.5 + 0.5) * viewport.width,
        (-ndc.y * 0.5 + 0.5) * viewport.height,
    )
}

/// Screen positions of every point of one buffer version, index-aligned
#[derive(Debug, Clone)]
pub struct Projection {
    version: BufferVersion,
    points: Vec<ScreenPoint>,
}

impl Projection {
    /// A projection holding no points, e.g. when no viewport is bound
    pub fn empty(version: BufferVersion) -> Self {
        Self {
            version,
            points: Vec::new(),
        }
    }

    /// Wrap screen positions produced elsewhere, e.g. read back from a renderer
    pub fn from_points(version: BufferVersion, points: Vec<ScreenPoint>) -> Self {
        Self { version, points }
    }

    pub fn version(&self) -> BufferVersion {
        self.version
    }

    pub fn points(&self) -> &[ScreenPoint] {
        &self.points
    }
}

impl Deref for Projection {
    type Target = [ScreenPoint];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

/// Project every point of `buffer`
///
/// O(N) per call and the dominant cost of interactive selection. Points that
/// cannot be projected come back as NaN coordinates so indices stay aligned.
/// A degenerate viewport yields an empty projection.
///
/// Points behind the camera (clip-space `w <= 0`) are never selectable; they are
/// not mirrored through the eye onto the screen.
pub fn project_all(
    buffer: &PointBuffer,
    world: &Transform3D,
    camera: &Camera,
    viewport: &Viewport,
) -> Projection {
    if viewport.is_degenerate() {
        return Projection::empty(buffer.version());
    }

    let view_projection = ViewProjection::new(world, camera);
    let project = |p: &Point3f| {
        view_projection
            .project_point(p, viewport)
            .unwrap_or_else(unprojected)
    };

    #[cfg(feature = "parallel")]
    let points: Vec<ScreenPoint> = {
        use rayon::prelude::*;
        buffer.positions().par_iter().map(project).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let points: Vec<ScreenPoint> = buffer.positions().iter().map(project).collect();

    trace!(points = buffer.len(), version = %buffer.version(), "projected buffer");
    Projection {
        version: buffer.version(),
        points,
    }
}
