//! Conversions between N-dimensional indices and linear offsets.
//!
//! The element order is fixed: the first dimension varies fastest. Strides
//! are the cumulative products of the extent,
//! `stride[0] = extent[0]` and `stride[k] = stride[k - 1] * extent[k]`,
//! so `stride[D - 1]` is the number of elements.
//!
//! Strides saturate instead of overflowing; containers refuse such extents
//! at construction.
//!
//! None of these functions check their inputs: an index outside of the
//! extent yields an offset outside of `[0, size)`, which the containers turn
//! into a bounds-check panic.

use crate::point::Point;

#[inline]
pub fn get_stride<const D: usize>(extent: Point<D>) -> Point<D> {
    let mut stride = extent;
    for k in 1..D {
        stride[k] = stride[k - 1].saturating_mul(extent[k]);
    }

    stride
}

#[inline]
pub fn index_to_offset<const D: usize>(index: Point<D>, stride: Point<D>) -> usize {
    let mut offset = index[0];
    for k in 1..D {
        offset += index[k] * stride[k - 1];
    }

    offset as usize
}

#[inline]
pub fn offset_to_index<const D: usize>(offset: usize, stride: Point<D>) -> Point<D> {
    let mut index = Point::zeros();
    let mut rest = offset as isize;
    for k in (1..D).rev() {
        index[k] = rest / stride[k - 1];
        rest %= stride[k - 1];
    }
    index[0] = rest;

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Coordinate;

    #[test]
    fn strides() {
        assert_eq!(get_stride(Point::new([5])), Point::new([5]));
        assert_eq!(get_stride(Point::new([3, 4])), Point::new([3, 12]));
        assert_eq!(get_stride(Point::new([2, 3, 4, 5])), Point::new([2, 6, 24, 120]));
    }

    #[test]
    fn first_dimension_fastest() {
        let stride = get_stride(Point::new([3, 4]));
        assert_eq!(index_to_offset(Point::new([1, 0]), stride), 1);
        assert_eq!(index_to_offset(Point::new([0, 1]), stride), 3);
        assert_eq!(index_to_offset(Point::new([2, 3]), stride), 11);
        assert_eq!(offset_to_index(7, stride), Point::new([1, 2]));
    }

    fn round_trip<P: Coordinate>(extent: P) {
        let stride = extent.stride_of();
        for offset in 0..extent.num_elements() {
            let index = P::from_offset(offset, stride);
            assert_eq!(index.to_offset(stride), offset);
        }

        P::for_index(P::zeros(), extent, |index| {
            assert_eq!(P::from_offset(index.to_offset(stride), stride), index);
        });
    }

    #[test]
    fn round_trip_all_ranks() {
        round_trip(Point::new([7]));
        round_trip(Point::new([3, 5]));
        round_trip(Point::new([2, 3, 4]));
        round_trip(Point::new([2, 1, 3, 2]));
    }
}
