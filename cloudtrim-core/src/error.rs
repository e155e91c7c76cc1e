//! Error types for cloudtrim

use thiserror::Error;

use crate::point_buffer::BufferVersion;

/// Main error type for cloudtrim operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Point index {index} out of range for buffer of {len} points")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Selection computed against buffer {computed_for} but current buffer is {current}")]
    StaleSelection {
        computed_for: BufferVersion,
        current: BufferVersion,
    },
}

/// Result type alias for cloudtrim operations
pub type Result<T> = std::result::Result<T, Error>;
