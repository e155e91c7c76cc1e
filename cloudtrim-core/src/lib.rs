//! Core data structures for cloudtrim
//!
//! This crate provides the point buffer that every editing operation works on,
//! per-point colors, the bounding sphere used to frame the camera and the
//! cloud's world transform.

pub mod point;
pub mod point_buffer;
pub mod transform;
pub mod error;

pub use point::*;
pub use point_buffer::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point2, Point3, Vector3, Matrix4, UnitQuaternion};
