//! `tensor` is a collection of tools to store and view multidimensional
//! arrays. Fixed-shape containers carry their shape at the type level thanks
//! to type level integers from the `typenum` crate, runtime-shape containers
//! carry it as a `Point`, and lazy views compute their elements on demand.
//!
//! All of them implement the same contract, `TensorExpr`, on which the
//! algorithms and kernels of the crate are written.

pub mod expression;
pub mod lambda_tensor;
pub mod layout;
pub mod policy;
pub mod prelude;
pub mod shape;
pub mod static_tensor;
pub mod tensor;
