//! `point` defines `Point`, the fixed-rank integer vector used as index,
//! extent and stride type by every container of the crate, and the
//! `Coordinate` trait that gives each supported rank (1 to 4) its nested
//! traversal loop.
//!
//! Arithmetic is elementwise. Coordinates are signed so that stencil code can
//! step outside a container (e.g. `idx + mask_idx - radius`) before deciding
//! what to do with the out-of-range position.

use crate::tensor::layout;
use std::fmt::Debug;
use std::ops::*;

/// Rank-`D` integer vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point<const D: usize>(pub [isize; D]);

impl<const D: usize> Point<D> {
    #[inline]
    pub const fn new(coordinates: [isize; D]) -> Self {
        Point(coordinates)
    }

    #[inline]
    pub const fn zeros() -> Self {
        Point([0; D])
    }

    #[inline]
    pub const fn splat(value: isize) -> Self {
        Point([value; D])
    }

    /// Number of elements of `self` read as an extent, `None` if a
    /// coordinate is negative or the product overflows `usize`.
    #[inline]
    pub fn checked_product(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &x| {
            if x < 0 {
                return None;
            }
            acc.checked_mul(x as usize)
        })
    }

    /// True if `0 <= self[k] < extent[k]` on every axis.
    #[inline]
    pub fn within(&self, extent: &Self) -> bool {
        self.0
            .iter()
            .zip(extent.0.iter())
            .all(|(x, e)| *x >= 0 && *x < *e)
    }

    #[inline]
    pub fn to_vec(&self) -> Vec<isize> {
        self.0.to_vec()
    }
}

impl<const D: usize> From<[isize; D]> for Point<D> {
    #[inline]
    fn from(coordinates: [isize; D]) -> Self {
        Point(coordinates)
    }
}

impl<const D: usize> Index<usize> for Point<D> {
    type Output = isize;

    #[inline]
    fn index(&self, axis: usize) -> &isize {
        &self.0[axis]
    }
}

impl<const D: usize> IndexMut<usize> for Point<D> {
    #[inline]
    fn index_mut(&mut self, axis: usize) -> &mut isize {
        &mut self.0[axis]
    }
}

macro_rules! elementwise_op {
    ($($op:ident :: $method:ident),*) => {
        $(
            impl<const D: usize> $op for Point<D> {
                type Output = Self;

                #[inline]
                fn $method(mut self, rhs: Self) -> Self {
                    self.0
                        .iter_mut()
                        .zip(rhs.0.iter())
                        .for_each(|(x, y)| *x = $op::$method(*x, *y));
                    self
                }
            }

            impl<const D: usize> $op<isize> for Point<D> {
                type Output = Self;

                #[inline]
                fn $method(mut self, rhs: isize) -> Self {
                    self.0.iter_mut().for_each(|x| *x = $op::$method(*x, rhs));
                    self
                }
            }
        )*
    };
}

elementwise_op!(Add::add, Sub::sub, Mul::mul, Div::div, Rem::rem);

impl<const D: usize> Neg for Point<D> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        self * -1
    }
}

/// Index type of a container of supported rank.
///
/// `for_index` is written out per rank: the highest dimension is the
/// outermost loop and dimension 0 the innermost one, so that visiting order
/// and linear offset order coincide.
pub trait Coordinate:
    Copy
    + Eq
    + Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Index<usize, Output = isize>
    + IndexMut<usize>
{
    fn zeros() -> Self;

    fn for_index<F: FnMut(Self)>(origin: Self, extent: Self, fun: F);

    /// Cumulative strides of `self` read as an extent.
    fn stride_of(self) -> Self;

    fn to_offset(self, stride: Self) -> usize;

    fn from_offset(offset: usize, stride: Self) -> Self;

    /// Element count of `self` read as an extent. Negative extents count as
    /// empty and overflowing ones saturate to `usize::MAX`, so that any
    /// allocation attempted with the result fails.
    fn num_elements(self) -> usize;

    fn checked_num_elements(self) -> Option<usize>;

    fn to_vec(self) -> Vec<isize>;
}

macro_rules! coordinate_common {
    () => {
        #[inline]
        fn zeros() -> Self {
            Point::zeros()
        }

        #[inline]
        fn stride_of(self) -> Self {
            layout::get_stride(self)
        }

        #[inline]
        fn to_offset(self, stride: Self) -> usize {
            layout::index_to_offset(self, stride)
        }

        #[inline]
        fn from_offset(offset: usize, stride: Self) -> Self {
            layout::offset_to_index(offset, stride)
        }

        #[inline]
        fn num_elements(self) -> usize {
            if self.0.iter().any(|x| *x < 0) {
                return 0;
            }
            self.checked_product().unwrap_or(usize::MAX)
        }

        #[inline]
        fn checked_num_elements(self) -> Option<usize> {
            self.checked_product()
        }

        #[inline]
        fn to_vec(self) -> Vec<isize> {
            Point::to_vec(&self)
        }
    };
}

impl Coordinate for Point<1> {
    coordinate_common!();

    #[inline]
    fn for_index<F: FnMut(Self)>(origin: Self, extent: Self, mut fun: F) {
        for i in origin[0]..extent[0] {
            fun(Point([i]));
        }
    }
}

impl Coordinate for Point<2> {
    coordinate_common!();

    #[inline]
    fn for_index<F: FnMut(Self)>(origin: Self, extent: Self, mut fun: F) {
        for j in origin[1]..extent[1] {
            for i in origin[0]..extent[0] {
                fun(Point([i, j]));
            }
        }
    }
}

impl Coordinate for Point<3> {
    coordinate_common!();

    #[inline]
    fn for_index<F: FnMut(Self)>(origin: Self, extent: Self, mut fun: F) {
        for k in origin[2]..extent[2] {
            for j in origin[1]..extent[1] {
                for i in origin[0]..extent[0] {
                    fun(Point([i, j, k]));
                }
            }
        }
    }
}

impl Coordinate for Point<4> {
    coordinate_common!();

    #[inline]
    fn for_index<F: FnMut(Self)>(origin: Self, extent: Self, mut fun: F) {
        for l in origin[3]..extent[3] {
            for k in origin[2]..extent[2] {
                for j in origin[1]..extent[1] {
                    for i in origin[0]..extent[0] {
                        fun(Point([i, j, k, l]));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elementwise_arithmetic() {
        let a = Point::new([4, 6]);
        let b = Point::new([2, 3]);

        assert_eq!(a + b, Point::new([6, 9]));
        assert_eq!(a - b, Point::new([2, 3]));
        assert_eq!(a * b, Point::new([8, 18]));
        assert_eq!(a / b, Point::new([2, 2]));
        assert_eq!(a % b, Point::new([0, 0]));
        assert_eq!(a / 2, Point::new([2, 3]));
        assert_eq!(-b, Point::new([-2, -3]));
    }

    #[test]
    fn within() {
        let extent = Point::new([3, 2]);
        assert!(Point::new([0, 0]).within(&extent));
        assert!(Point::new([2, 1]).within(&extent));
        assert!(!Point::new([3, 1]).within(&extent));
        assert!(!Point::new([-1, 0]).within(&extent));
    }

    #[test]
    fn element_counts() {
        assert_eq!(Point::new([3, 4, 2]).checked_num_elements(), Some(24));
        assert_eq!(Point::new([3, 0]).checked_num_elements(), Some(0));
        assert_eq!(Point::new([1 << 40, 1 << 40]).checked_num_elements(), None);
        assert_eq!(Point::new([-1, 4]).checked_num_elements(), None);

        assert_eq!(Point::new([1 << 40, 1 << 40]).num_elements(), usize::MAX);
        assert_eq!(Point::new([-1, 4]).num_elements(), 0);
    }

    #[test]
    fn for_index_starts_at_origin() {
        let mut visited = Vec::new();
        Point::for_index(Point::new([1, 1]), Point::new([3, 3]), |idx| visited.push(idx));

        assert_eq!(
            visited,
            vec![
                Point::new([1, 1]),
                Point::new([2, 1]),
                Point::new([1, 2]),
                Point::new([2, 2]),
            ]
        );
    }
}
