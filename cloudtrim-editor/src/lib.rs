//! Interactive editing session for cloudtrim
//!
//! Ties the buffer, projection, selection and export crates together behind
//! the command surface a viewer host calls: load, rotate, reset, box
//! selection, delete and export.

pub mod config;
pub mod session;
pub mod transform_controller;

pub use config::*;
pub use session::*;
pub use transform_controller::*;
