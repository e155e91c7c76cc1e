//! Camera projection and screen-space selection for cloudtrim
//!
//! This crate turns rectangles drawn over a rendered view into index sets over
//! a [`cloudtrim_core::PointBuffer`]:
//! - Camera and viewport state
//! - Projection of every point into pixel coordinates
//! - Box and union selection, linear or through an R-tree over screen positions
//! - Highlighting and deleting by selection

pub mod camera;
pub mod projection;
pub mod selection;
pub mod index;
pub mod highlight;
pub mod crop;

// Re-export commonly used items
pub use camera::*;
pub use projection::*;
pub use selection::*;
pub use index::*;
pub use highlight::*;
pub use crop::*;
