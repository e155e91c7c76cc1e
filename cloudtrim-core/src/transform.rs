//! Cloud world transform: per-axis Euler rotation plus translation

use std::fmt;
use std::str::FromStr;

use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One of the cloud's local rotation axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> nalgebra::Unit<Vector3<f32>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(Error::InvalidData(format!("unknown rotation axis: {:?}", other))),
        }
    }
}

/// Independent rotation angles (radians) around the local x, y and z axes
///
/// Angles accumulate per axis; they are only combined into one rotation when
/// the world matrix is built, in X then Y then Z order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerRotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl EulerRotation {
    pub const IDENTITY: EulerRotation = EulerRotation { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn angle(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn angle_mut(&mut self, axis: Axis) -> &mut f32 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }

    /// Combined rotation `Rx * Ry * Rz`
    pub fn to_quaternion(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_axis_angle(&Axis::X.unit(), self.x)
            * UnitQuaternion::from_axis_angle(&Axis::Y.unit(), self.y)
            * UnitQuaternion::from_axis_angle(&Axis::Z.unit(), self.z)
    }
}

/// A 3D transformation mapping cloud-local points into world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Create a rotation transformation from a quaternion
    pub fn rotation(rotation: UnitQuaternion<f32>) -> Self {
        Self {
            matrix: rotation.to_homogeneous(),
        }
    }

    /// World transform of a cloud: rotate about its local axes, then translate
    pub fn from_euler_position(rotation: &EulerRotation, position: &Point3<f32>) -> Self {
        Self::translation(position.coords).compose(Self::rotation(rotation.to_quaternion()))
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Compose this transformation with another (`other` applied first)
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Check if this is approximately the identity transformation
    pub fn is_identity(&self, epsilon: f32) -> bool {
        let identity = Matrix4::identity();
        (self.matrix - identity).norm() < epsilon
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_axis_parsing() {
        assert_eq!("x".parse::<Axis>().unwrap(), Axis::X);
        assert_eq!(" Y ".parse::<Axis>().unwrap(), Axis::Y);
        assert!("w".parse::<Axis>().is_err());
        assert_eq!(Axis::Z.to_string(), "z");
    }

    #[test]
    fn test_identity_rotation() {
        let t = Transform3D::from_euler_position(&EulerRotation::IDENTITY, &Point3::origin());
        assert!(t.is_identity(1e-6));
    }

    #[test]
    fn test_rotation_about_z() {
        let rotation = EulerRotation::new(0.0, 0.0, FRAC_PI_2);
        let t = Transform3D::from_euler_position(&rotation, &Point3::origin());
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_xyz_order() {
        // Rz acts first, then Rx: (1,0,0) -> (0,1,0) -> (0,0,1)
        let rotation = EulerRotation::new(FRAC_PI_2, 0.0, FRAC_PI_2);
        let t = Transform3D::from_euler_position(&rotation, &Point3::origin());
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_translation_after_rotation() {
        let rotation = EulerRotation::new(0.0, 0.0, FRAC_PI_2);
        let t = Transform3D::from_euler_position(&rotation, &Point3::new(5.0, 0.0, 0.0));
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(5.0, 1.0, 0.0), epsilon = 1e-6);
    }
}
