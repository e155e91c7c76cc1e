//! # cloudtrim
//!
//! Interactive cropping of point clouds: project a cloud through a camera,
//! select points with screen-space boxes, delete inside or outside the
//! selection and export the result as PCD.
//!
//! This is the umbrella crate that re-exports the cloudtrim crates. Use the
//! individual crates for finer control over dependencies.
//!
//! ## Quick Start
//!
//! ```rust
//! use cloudtrim::prelude::*;
//!
//! let mut session = EditSession::new(EditorConfig::default());
//! session.set_viewport(Viewport::new(800.0, 600.0));
//! session.load(vec![
//!     Point3f::new(0.0, 0.0, 0.0),
//!     Point3f::new(1.0, 0.0, 0.0),
//!     Point3f::new(0.0, 1.0, 0.0),
//! ]);
//!
//! // Keep only what is inside the box
//! session.add_box(Point2::new(300.0, 200.0), Point2::new(500.0, 400.0));
//! session.delete_outside().unwrap();
//!
//! let pcd = session.export_pcd().unwrap();
//! assert!(pcd.starts_with(b"# .PCD v0.7"));
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables io and editor
//! - `io`: PCD export
//! - `editor`: The editing session and host command surface (implies `io`)
//! - `parallel`: Project points on the rayon thread pool

// Re-export core functionality
pub use cloudtrim_core::*;

pub use cloudtrim_selection as selection;

#[cfg(feature = "io")]
pub use cloudtrim_io as io;

#[cfg(feature = "editor")]
pub use cloudtrim_editor as editor;

/// Convenient imports for common use cases
pub mod prelude {
    pub use cloudtrim_core::*;
    pub use cloudtrim_selection::*;

    #[cfg(feature = "io")]
    pub use cloudtrim_io::*;

    #[cfg(feature = "editor")]
    pub use cloudtrim_editor::*;
}
