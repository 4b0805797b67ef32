//! `ring` defines the `Ring` trait: the element types stencil kernels can
//! accumulate, with their additive and multiplicative identity elements.
//!
//! It is implemented for all numeric primitive types
//! thanks to the `expand_impl` procedural macro from
//! the `tessellate_macros` crate.

use std::fmt::Debug;
use std::ops::*;
use tessellate_macros::expand_impl;

pub trait Ring:
    Copy + Default + PartialEq + Debug + Send + Sync + 'static + Add<Output = Self> + Mul<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;
}

#[expand_impl(T = f64, T = f32)]
impl<T> Ring for T {
    const ZERO: T = 0.0;
    const ONE: T = 1.0;
}

#[expand_impl(
    T = u128,
    T = u64,
    T = u32,
    T = u16,
    T = u8,
    T = usize,
    T = i128,
    T = i64,
    T = i32,
    T = i16,
    T = i8,
    T = isize,
)]
impl<T> Ring for T {
    const ZERO: T = 0;
    const ONE: T = 1;
}
