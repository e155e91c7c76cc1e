//! Cloud rotation bookkeeping and view reset

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cloudtrim_core::{Axis, EulerRotation, Point3f, Transform3D};
use cloudtrim_selection::Camera;

/// View state captured when a cloud is loaded
///
/// Immutable for the lifetime of the loaded buffer and replaced on the next load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformSnapshot {
    pub camera_position: Point3f,
    pub camera_up: Vector3<f32>,
    pub rotation: EulerRotation,
    pub position: Point3f,
    pub orbit_target: Point3f,
}

/// Accumulated cloud rotation and position plus the pose to reset to
#[derive(Debug, Clone, PartialEq)]
pub struct TransformController {
    rotation: EulerRotation,
    position: Point3f,
    snapshot: TransformSnapshot,
}

impl TransformController {
    /// Capture the initial state for a freshly framed camera
    ///
    /// The cloud starts unrotated at the origin.
    pub fn capture(camera: &Camera) -> Self {
        let snapshot = TransformSnapshot {
            camera_position: camera.position,
            camera_up: camera.up,
            rotation: EulerRotation::IDENTITY,
            position: Point3f::origin(),
            orbit_target: camera.target,
        };
        Self {
            rotation: snapshot.rotation,
            position: snapshot.position,
            snapshot,
        }
    }

    pub fn rotation(&self) -> EulerRotation {
        self.rotation
    }

    pub fn position(&self) -> Point3f {
        self.position
    }

    pub fn snapshot(&self) -> &TransformSnapshot {
        &self.snapshot
    }

    /// Add `delta` radians to one axis angle
    ///
    /// Axes accumulate independently; mixing axes is not a composition of
    /// successive rotations.
    pub fn rotate(&mut self, axis: Axis, delta: f32) {
        *self.rotation.angle_mut(axis) += delta;
        debug!(%axis, delta, angle = self.rotation.angle(axis), "rotated cloud");
    }

    /// Cloud-local to world transform
    pub fn world_transform(&self) -> Transform3D {
        Transform3D::from_euler_position(&self.rotation, &self.position)
    }

    /// Restore cloud rotation, position, camera pose and orbit target
    ///
    /// Idempotent. Lens settings (field of view, clip planes, aspect) are left
    /// as they are.
    pub fn reset(&mut self, camera: &mut Camera) {
        self.rotation = self.snapshot.rotation;
        self.position = self.snapshot.position;
        camera.position = self.snapshot.camera_position;
        camera.up = self.snapshot.camera_up;
        camera.look_at(self.snapshot.orbit_target);
    }
}

impl Default for TransformController {
    fn default() -> Self {
        Self::capture(&Camera::default())
    }
}

/// Keyboard rotation nudges a host can bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Nudge {
    /// W: tilt top away (x−)
    TiltUp,
    /// S: tilt top toward the viewer (x+)
    TiltDown,
    /// A: turn left (y−)
    TurnLeft,
    /// D: turn right (y+)
    TurnRight,
    /// Q: roll counter-clockwise (z+)
    RollLeft,
    /// E: roll clockwise (z−)
    RollRight,
}

impl Nudge {
    /// Default key binding, case-insensitive
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'w' => Some(Nudge::TiltUp),
            's' => Some(Nudge::TiltDown),
            'a' => Some(Nudge::TurnLeft),
            'd' => Some(Nudge::TurnRight),
            'q' => Some(Nudge::RollLeft),
            'e' => Some(Nudge::RollRight),
            _ => None,
        }
    }

    /// Axis and signed angle for a nudge of `step` radians
    pub fn rotation(self, step: f32) -> (Axis, f32) {
        match self {
            Nudge::TiltUp => (Axis::X, -step),
            Nudge::TiltDown => (Axis::X, step),
            Nudge::TurnLeft => (Axis::Y, -step),
            Nudge::TurnRight => (Axis::Y, step),
            Nudge::RollLeft => (Axis::Z, step),
            Nudge::RollRight => (Axis::Z, -step),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_rotations_accumulate_per_axis() {
        let mut controller = TransformController::default();
        controller.rotate(Axis::X, 0.05);
        controller.rotate(Axis::X, 0.05);
        controller.rotate(Axis::Z, -0.2);
        let rotation = controller.rotation();
        assert_relative_eq!(rotation.x, 0.1);
        assert_relative_eq!(rotation.y, 0.0);
        assert_relative_eq!(rotation.z, -0.2);
    }

    #[test]
    fn test_reset_restores_snapshot_and_is_idempotent() {
        let mut camera = Camera::default();
        let mut controller = TransformController::capture(&camera);
        let initial_camera = camera.clone();

        controller.rotate(Axis::Y, 1.0);
        camera.position = Point3::new(3.0, 4.0, 5.0);
        camera.up = Vector3::x();
        camera.target = Point3::new(1.0, 1.0, 1.0);

        controller.reset(&mut camera);
        let once = (controller.clone(), camera.clone());
        controller.reset(&mut camera);

        assert_eq!(controller.rotation(), EulerRotation::IDENTITY);
        assert_eq!(controller.position(), Point3f::origin());
        assert_eq!(camera, initial_camera);
        assert_eq!((controller, camera), once);
    }

    #[test]
    fn test_reset_keeps_lens() {
        let mut camera = Camera::default();
        let mut controller = TransformController::capture(&camera);
        camera.aspect_ratio = 1.0;
        controller.reset(&mut camera);
        assert_eq!(camera.aspect_ratio, 1.0);
    }

    #[test]
    fn test_world_transform_follows_rotation() {
        let mut controller = TransformController::default();
        assert!(controller.world_transform().is_identity(1e-6));
        controller.rotate(Axis::Z, std::f32::consts::FRAC_PI_2);
        let p = controller.world_transform().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_nudge_bindings() {
        assert_eq!(Nudge::from_key('W'), Some(Nudge::TiltUp));
        assert_eq!(Nudge::from_key('x'), None);
        assert_eq!(Nudge::TiltUp.rotation(0.05), (Axis::X, -0.05));
        assert_eq!(Nudge::RollLeft.rotation(0.05), (Axis::Z, 0.05));
        assert_eq!(Nudge::RollRight.rotation(0.05), (Axis::Z, -0.05));
    }
}
