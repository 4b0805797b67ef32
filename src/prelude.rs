pub use crate::algorithm::{copy, fill, for_each, for_each_mut, for_index, reduce};
pub use crate::config::ExecutorConfig;
pub use crate::device::{DeviceTensor, DeviceView, Executor};
pub use crate::error::{Error, Result};
pub use crate::point::{Coordinate, Point};
pub use crate::ring::Ring;
pub use crate::stencil::ConvMask;
pub use crate::tensor::prelude::*;
