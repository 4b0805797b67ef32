use super::expression::{TensorExpr, TensorExprMut};
use super::policy::{LinearAccess, Local};
use super::shape::{NumElements, Shape2D, StaticExtent, StaticShape};
use crate::error::Error;
use crate::point::Coordinate;
use generic_array::sequence::GenericSequence;
use generic_array::GenericArray;
use std::convert::TryFrom;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Fixed-shape container whose elements live inside the value itself.
///
/// The shape `S` is a type-level shape such as `Shape2D<U3, U4>`, so the
/// buffer is a `GenericArray` of exactly `product(S)` elements and no
/// allocation ever happens. Cloning duplicates the whole buffer.
///
/// The memory tag is `Local`: fixed-shape containers are usable both by host
/// algorithms and by kernels (masks, shared tiles).
pub struct StaticTensor<T, S>
where
    S: NumElements<T>,
{
    data: GenericArray<T, <S as NumElements<T>>::Output>,
}

pub type StaticMatrix<T, C, R> = StaticTensor<T, Shape2D<C, R>>;

impl<T, S> StaticTensor<T, S>
where
    S: StaticExtent + NumElements<T>,
{
    pub fn new() -> Self
    where
        T: Default,
    {
        Self::default()
    }

    /// Builds the container from its elements in linear order.
    pub fn from_fn<F>(fun: F) -> Self
    where
        F: FnMut(usize) -> T,
    {
        StaticTensor {
            data: GenericArray::generate(fun),
        }
    }

    #[inline]
    pub fn extent(&self) -> S::Index {
        S::extent()
    }

    #[inline]
    pub fn stride(&self) -> S::Index {
        S::stride()
    }

    #[inline]
    pub fn size(&self) -> usize {
        S::NUM_ELEMENTS
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data.as_mut_slice()
    }
}

impl<T, S> Default for StaticTensor<T, S>
where
    S: NumElements<T>,
    T: Default,
{
    fn default() -> Self {
        StaticTensor {
            data: GenericArray::default(),
        }
    }
}

impl<T, S> Clone for StaticTensor<T, S>
where
    S: NumElements<T>,
    T: Clone,
{
    fn clone(&self) -> Self {
        StaticTensor {
            data: self.data.clone(),
        }
    }
}

impl<T, S> PartialEq for StaticTensor<T, S>
where
    S: NumElements<T>,
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<T, S> fmt::Debug for StaticTensor<T, S>
where
    S: StaticShape + NumElements<T>,
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTensor")
            .field("shape", &S::to_vec())
            .field("data", &self.data.as_slice())
            .finish()
    }
}

impl<T, S> TryFrom<&[T]> for StaticTensor<T, S>
where
    S: StaticExtent + NumElements<T>,
    T: Clone,
{
    type Error = Error;

    fn try_from(slice: &[T]) -> Result<Self, Self::Error> {
        if slice.len() != S::NUM_ELEMENTS {
            return Err(Error::ElementCount {
                expected: S::NUM_ELEMENTS,
                actual: slice.len(),
            });
        }

        Ok(StaticTensor {
            data: GenericArray::clone_from_slice(slice),
        })
    }
}

impl<T, S> Index<usize> for StaticTensor<T, S>
where
    S: NumElements<T>,
{
    type Output = T;

    #[inline]
    fn index(&self, offset: usize) -> &T {
        &self.data[offset]
    }
}

impl<T, S> IndexMut<usize> for StaticTensor<T, S>
where
    S: NumElements<T>,
{
    #[inline]
    fn index_mut(&mut self, offset: usize) -> &mut T {
        &mut self.data[offset]
    }
}

impl<T, S, P> Index<P> for StaticTensor<T, S>
where
    S: StaticExtent<Index = P> + NumElements<T>,
    P: Coordinate,
{
    type Output = T;

    #[inline]
    fn index(&self, index: P) -> &T {
        &self.data[index.to_offset(S::stride())]
    }
}

impl<T, S, P> IndexMut<P> for StaticTensor<T, S>
where
    S: StaticExtent<Index = P> + NumElements<T>,
    P: Coordinate,
{
    #[inline]
    fn index_mut(&mut self, index: P) -> &mut T {
        &mut self.data[index.to_offset(S::stride())]
    }
}

impl<T, S> TensorExpr for StaticTensor<T, S>
where
    S: StaticExtent + NumElements<T>,
    T: Copy,
{
    type Value = T;
    type Index = S::Index;
    type Access = LinearAccess;
    type Memory = Local;

    #[inline]
    fn extent(&self) -> S::Index {
        S::extent()
    }

    #[inline]
    fn stride(&self) -> S::Index {
        S::stride()
    }

    #[inline]
    fn size(&self) -> usize {
        S::NUM_ELEMENTS
    }

    #[inline]
    fn at(&self, index: S::Index) -> T {
        self.data[index.to_offset(S::stride())]
    }

    #[inline]
    fn get(&self, offset: usize) -> T {
        self.data[offset]
    }
}

impl<T, S> TensorExprMut for StaticTensor<T, S>
where
    S: StaticExtent + NumElements<T>,
    T: Copy,
{
    #[inline]
    fn set_at(&mut self, index: S::Index, value: T) {
        self.data[index.to_offset(S::stride())] = value;
    }

    #[inline]
    fn set(&mut self, offset: usize, value: T) {
        self.data[offset] = value;
    }
}
