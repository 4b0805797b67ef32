pub use super::expression::{TensorExpr, TensorExprMut};
pub use super::lambda_tensor::{make_lambda, make_lambda_in, Generator, LambdaTensor};
pub use super::policy::{ArrayAccess, Device, Host, LinearAccess, Local, Pinned};
pub use super::shape::{Shape1D, Shape2D, Shape3D, Shape4D, StaticExtent, StaticShape};
pub use super::static_tensor::{StaticMatrix, StaticTensor};
pub use super::tensor::{Matrix, Tensor};
