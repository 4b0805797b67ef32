//! `tessellate` is a library of multidimensional arrays with compile-time
//! or runtime shapes, lazy functional views, generic traversal algorithms
//! and tiled stencil kernels running on a block-parallel device model.
//!
//! * `tensor` contains the containers and the contract they share,
//! * `algorithm` the host algorithms written against that contract,
//! * `device` the device memory and the block executor,
//! * `stencil` the convolution kernels, instantiated per mask with the
//!   `conv_kernel!` macro.


pub mod algorithm;
pub mod config;
pub mod device;
pub mod error;
pub mod point;
pub mod prelude;
pub mod ring;
pub mod stencil;
pub mod tensor;

pub use error::{Error, Result};
pub use tessellate_macros::conv_kernel;
pub use typenum;
