//! I/O for cloudtrim point buffers
//!
//! Export only: the edited cloud is written as PCD text (or binary) for the
//! host to hand to the user. Parsing point cloud files is left to the loader
//! that produces the positions fed into [`cloudtrim_core::PointBuffer::load`].

pub mod pcd;

pub use pcd::{
    PcdDataFormat, PcdHeader, PcdWriteOptions, PcdWriter, RgbEncoding, DEFAULT_EXPORT_FILE_NAME,
};
