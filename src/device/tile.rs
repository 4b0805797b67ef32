use crate::point::{Coordinate, Point};
use crate::tensor::expression::{TensorExpr, TensorExprMut};
use crate::tensor::policy::{LinearAccess, Local};

/// Per-block staging storage whose extent is only known at launch, e.g. a
/// block padded with a halo.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedTile<T, const D: usize> {
    extent: Point<D>,
    stride: Point<D>,
    data: Vec<T>,
}

impl<T, const D: usize> SharedTile<T, D>
where
    T: Copy + Default,
    Point<D>: Coordinate,
{
    pub fn new(extent: Point<D>) -> Self {
        SharedTile {
            extent,
            stride: extent.stride_of(),
            data: vec![T::default(); extent.num_elements()],
        }
    }
}

impl<T, const D: usize> TensorExpr for SharedTile<T, D>
where
    T: Copy,
    Point<D>: Coordinate,
{
    type Value = T;
    type Index = Point<D>;
    type Access = LinearAccess;
    type Memory = Local;

    #[inline]
    fn extent(&self) -> Point<D> {
        self.extent
    }

    #[inline]
    fn stride(&self) -> Point<D> {
        self.stride
    }

    #[inline]
    fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn at(&self, index: Point<D>) -> T {
        self.data[index.to_offset(self.stride)]
    }

    #[inline]
    fn get(&self, offset: usize) -> T {
        self.data[offset]
    }
}

impl<T, const D: usize> TensorExprMut for SharedTile<T, D>
where
    T: Copy,
    Point<D>: Coordinate,
{
    #[inline]
    fn set_at(&mut self, index: Point<D>, value: T) {
        self.data[index.to_offset(self.stride)] = value;
    }

    #[inline]
    fn set(&mut self, offset: usize, value: T) {
        self.data[offset] = value;
    }
}
