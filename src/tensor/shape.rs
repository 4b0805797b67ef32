//! `shape` contains the tools to complement the `typenum` crate and use it
//! for the compile-time shapes of fixed-shape containers and stencil masks.
//!
//! As in `typenum`, this module contains unsafe marker traits that provide
//! functions to interact with type-level entities at runtime. A shape is a
//! `typenum` `TArr` of type-level unsigned integers, use the `Shape1D` to
//! `Shape4D` aliases rather than spelling them out.

use crate::point::{Coordinate, Point};
use generic_array::ArrayLength;
use std::ops::Mul;
use typenum::operator_aliases::Prod;
use typenum::{ATerm, Bit, TArr, UInt, Unsigned, U1};

/// Marker trait implemented on type-level unsigned integers
/// that are the only valid type-level dimensions for a shape.
pub unsafe trait StaticDim: Unsigned {}
unsafe impl<U, B> StaticDim for UInt<U, B>
where
    U: Unsigned,
    B: Bit,
{
}

/// Marker trait implemented on `typenum`'s `TArr` containing a collection
/// of type-level unsigned integers. Provides means of conversion for
/// runtime use.
pub unsafe trait StaticShape {
    /// Number of elements, i.e. product of all dimensions of the shape.
    const NUM_ELEMENTS: usize;
    /// Outputs a `Vec` containing the runtime version of the shape.
    fn to_vec() -> Vec<usize>;
}

unsafe impl StaticShape for ATerm {
    const NUM_ELEMENTS: usize = 1;

    #[inline]
    fn to_vec() -> Vec<usize> {
        Vec::new()
    }
}

unsafe impl<D, A> StaticShape for TArr<D, A>
where
    A: StaticShape,
    D: StaticDim,
{
    const NUM_ELEMENTS: usize = D::USIZE * A::NUM_ELEMENTS;

    #[inline]
    fn to_vec() -> Vec<usize> {
        let mut vec = A::to_vec();
        vec.push(D::USIZE);

        vec
    }
}

/// Marker trait implemented on static shapes that provides
/// a type-level number of elements, required to size a `GenericArray`.
pub unsafe trait NumElements<T> {
    type Output: Unsigned + ArrayLength<T>;
}

unsafe impl<T> NumElements<T> for ATerm {
    type Output = U1;
}

unsafe impl<T, S, A> NumElements<T> for TArr<S, A>
where
    A: NumElements<T>,
    S: StaticDim + Mul<<A as NumElements<T>>::Output>,
    Prod<S, <A as NumElements<T>>::Output>: Unsigned + ArrayLength<T>,
{
    type Output = Prod<S, <A as NumElements<T>>::Output>;
}

/// Marker trait implemented on shapes of rank 1 to 4 that maps the
/// type-level shape to the runtime index type of the same rank.
pub unsafe trait StaticExtent: StaticShape {
    type Index: Coordinate;

    fn extent() -> Self::Index;

    #[inline]
    fn stride() -> Self::Index {
        Self::extent().stride_of()
    }
}

unsafe impl<S0> StaticExtent for Shape1D<S0>
where
    S0: StaticDim,
{
    type Index = Point<1>;

    #[inline]
    fn extent() -> Point<1> {
        Point::new([S0::USIZE as isize])
    }
}

unsafe impl<S0, S1> StaticExtent for Shape2D<S0, S1>
where
    S0: StaticDim,
    S1: StaticDim,
{
    type Index = Point<2>;

    #[inline]
    fn extent() -> Point<2> {
        Point::new([S0::USIZE as isize, S1::USIZE as isize])
    }
}

unsafe impl<S0, S1, S2> StaticExtent for Shape3D<S0, S1, S2>
where
    S0: StaticDim,
    S1: StaticDim,
    S2: StaticDim,
{
    type Index = Point<3>;

    #[inline]
    fn extent() -> Point<3> {
        Point::new([S0::USIZE as isize, S1::USIZE as isize, S2::USIZE as isize])
    }
}

unsafe impl<S0, S1, S2, S3> StaticExtent for Shape4D<S0, S1, S2, S3>
where
    S0: StaticDim,
    S1: StaticDim,
    S2: StaticDim,
    S3: StaticDim,
{
    type Index = Point<4>;

    #[inline]
    fn extent() -> Point<4> {
        Point::new([S0::USIZE as isize, S1::USIZE as isize, S2::USIZE as isize, S3::USIZE as isize])
    }
}

/// 1D shape alias.
pub type Shape1D<S0> = TArr<S0, ATerm>;
/// 2D shape alias.
pub type Shape2D<S0, S1> = TArr<S1, TArr<S0, ATerm>>;
/// 3D shape alias.
pub type Shape3D<S0, S1, S2> = TArr<S2, TArr<S1, TArr<S0, ATerm>>>;
/// 4D shape alias.
pub type Shape4D<S0, S1, S2, S3> = TArr<S3, TArr<S2, TArr<S1, TArr<S0, ATerm>>>>;
