//! Error types of the crate.
//!
//! Only construction and kernel launch report errors. Element accesses and
//! host traversals assume well-formed inputs.

use thiserror::Error;

/// Result type for tessellate operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer acquisition failed.
    #[error("failed to allocate {elements} elements in {memory} memory")]
    Allocation { elements: usize, memory: &'static str },

    /// Two containers that must agree on their extent do not.
    #[error("extent mismatch: expected {expected:?}, got {actual:?}")]
    ExtentMismatch {
        expected: Vec<isize>,
        actual: Vec<isize>,
    },

    /// Grid extent is not an exact multiple of the block extent.
    #[error("extent {extent:?} is not a multiple of the block extent {block:?}")]
    GridMismatch { extent: Vec<isize>, block: Vec<isize> },

    /// The halo of the mask does not fit the block staging pattern.
    #[error("mask radius {radius:?} needs a halo wider than half the block extent {block:?}")]
    HaloExceedsBlock { radius: Vec<isize>, block: Vec<isize> },

    /// A shared buffer is too small for the requested extent.
    #[error("buffer holds {actual} elements but {required} are required")]
    BufferTooSmall { required: usize, actual: usize },

    /// Wrong number of elements to fill a fixed-shape container.
    #[error("expected {expected} elements, got {actual}")]
    ElementCount { expected: usize, actual: usize },

    /// A device buffer is locked by a live view.
    #[error("device buffer is borrowed by a live view")]
    BufferBusy,

    /// Thread pool construction failed.
    #[error("executor error: {0}")]
    Executor(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn extent_mismatch(expected: Vec<isize>, actual: Vec<isize>) -> Self {
        Self::ExtentMismatch { expected, actual }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::Executor(err.to_string())
    }
}
