//! Perspective camera and viewport state

use nalgebra::{Matrix4, Perspective3, Point3, Vector3};
use serde::{Deserialize, Serialize};

use cloudtrim_core::BoundingSphere;

const MIN_ASPECT: f32 = 1e-6;
const MIN_NEAR: f32 = 1e-4;

/// A perspective camera looking at an orbit target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Place a camera on the +z axis so that `sphere` fills the view
    pub fn framing(sphere: &BoundingSphere, framing: &Framing, aspect_ratio: f32) -> Self {
        let radius = if sphere.radius > f32::EPSILON { sphere.radius } else { 1.0 };
        Self::new(
            Point3::new(0.0, 0.0, radius * framing.distance_factor),
            Point3::origin(),
            Vector3::y(),
            framing.fov,
            aspect_ratio,
            radius * framing.near_ratio,
            radius * framing.far_ratio,
        )
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix
    ///
    /// Degenerate lens settings fall back to usable values instead of producing
    /// a singular matrix: a near-zero aspect becomes 1, a field of view outside
    /// `(0, π)` becomes the framing default and clip planes closer together than
    /// a thousandth of `near` are pushed apart.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let aspect = if self.aspect_ratio.is_finite() && self.aspect_ratio > MIN_ASPECT {
            self.aspect_ratio
        } else {
            1.0
        };
        let fov = if self.fov > 0.0 && self.fov < std::f32::consts::PI {
            self.fov
        } else {
            Framing::default().fov
        };
        let near = if self.near.is_finite() { self.near.max(MIN_NEAR) } else { MIN_NEAR };
        let min_gap = (near * 1e-3).max(MIN_NEAR);
        let far = if self.far.is_finite() && self.far - near > min_gap {
            self.far
        } else {
            near * 1000.0 + 1.0
        };
        Perspective3::new(aspect, fov, near, far).to_homogeneous()
    }

    /// Re-aim the camera at a new target, keeping its position
    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Framing::default().fov,
            16.0 / 9.0,
            0.1,
            100.0,
        )
    }
}

/// How a freshly loaded cloud is framed, relative to its bounding radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Framing {
    /// Camera distance from the origin; smaller is closer
    pub distance_factor: f32,
    pub near_ratio: f32,
    pub far_ratio: f32,
    pub fov: f32,
}

impl Default for Framing {
    fn default() -> Self {
        Self {
            distance_factor: 0.8,
            near_ratio: 0.01,
            far_ratio: 100.0,
            fov: 50.0_f32.to_radians(),
        }
    }
}

/// Pixel size of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }

    /// A viewport with no drawable area; projection against it yields nothing
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_framing_places_camera_on_z() {
        let sphere = BoundingSphere { center: Point3::origin(), radius: 10.0 };
        let camera = Camera::framing(&sphere, &Framing::default(), 2.0);
        assert_relative_eq!(camera.position, Point3::new(0.0, 0.0, 8.0));
        assert_relative_eq!(camera.near, 0.1);
        assert_relative_eq!(camera.far, 1000.0);
        assert_relative_eq!(camera.aspect_ratio, 2.0);
    }

    #[test]
    fn test_framing_zero_radius_falls_back() {
        let sphere = BoundingSphere { center: Point3::origin(), radius: 0.0 };
        let camera = Camera::framing(&sphere, &Framing::default(), 1.0);
        assert!(camera.near < camera.far);
        assert!(camera.position.z > 0.0);
    }

    #[test]
    fn test_degenerate_viewport() {
        assert!(Viewport::new(0.0, 100.0).is_degenerate());
        assert!(Viewport::new(f32::NAN, 100.0).is_degenerate());
        assert!(!Viewport::new(800.0, 600.0).is_degenerate());
    }

    #[test]
    fn test_degenerate_lens_does_not_panic() {
        let mut camera = Camera::default();
        camera.aspect_ratio = 0.0;
        camera.near = 5.0;
        camera.far = 5.0;
        let m = camera.projection_matrix();
        assert!(m.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_nearly_coincident_clip_planes_fall_back() {
        let mut camera = Camera::default();
        camera.near = 1.0;
        camera.far = 1.0000001;
        assert!(camera.projection_matrix().iter().all(|v| v.is_finite()));

        camera.near = f32::EPSILON;
        camera.far = f32::EPSILON * 1.5;
        assert!(camera.projection_matrix().iter().all(|v| v.is_finite()));

        camera.near = f32::NAN;
        camera.far = f32::INFINITY;
        assert!(camera.projection_matrix().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_tiny_aspect_and_bad_fov_fall_back() {
        let mut camera = Camera::default();
        camera.aspect_ratio = f32::EPSILON / 2.0;
        camera.fov = 0.0;
        let m = camera.projection_matrix();
        assert!(m.iter().all(|v| v.is_finite()));
        assert_relative_eq!(m[(0, 0)], m[(1, 1)]);
    }

    #[test]
    fn test_valid_lens_is_untouched() {
        let camera = Camera::default();
        let expected = Perspective3::new(camera.aspect_ratio, camera.fov, camera.near, camera.far);
        assert_eq!(camera.projection_matrix(), expected.to_homogeneous());
    }
}
