use super::policy::{AccessMode, MemorySpace};
use crate::point::Coordinate;

/// The contract shared by every container: fixed-shape and runtime-shape
/// tensors, lazy views and device views.
///
/// A container exposes both a coordinate accessor (`at`) and a linear one
/// (`get`). `Access` tells the traversal algorithms which of the two is the
/// native one and `Memory` where the elements live; both are type-level tags
/// so the algorithm is selected at compile time.
///
/// Out-of-range accesses are not checked beyond the underlying slice bounds
/// checks and are a caller error.
pub trait TensorExpr {
    type Value: Copy;
    type Index: Coordinate;
    type Access: AccessMode;
    type Memory: MemorySpace;

    fn extent(&self) -> Self::Index;
    fn stride(&self) -> Self::Index;
    fn size(&self) -> usize;

    fn at(&self, index: Self::Index) -> Self::Value;
    fn get(&self, offset: usize) -> Self::Value;
}

/// Writable containers.
pub trait TensorExprMut: TensorExpr {
    fn set_at(&mut self, index: Self::Index, value: Self::Value);
    fn set(&mut self, offset: usize, value: Self::Value);
}

impl<'a, T> TensorExpr for &'a T
where
    T: TensorExpr + ?Sized,
{
    type Value = T::Value;
    type Index = T::Index;
    type Access = T::Access;
    type Memory = T::Memory;

    #[inline]
    fn extent(&self) -> Self::Index {
        (**self).extent()
    }

    #[inline]
    fn stride(&self) -> Self::Index {
        (**self).stride()
    }

    #[inline]
    fn size(&self) -> usize {
        (**self).size()
    }

    #[inline]
    fn at(&self, index: Self::Index) -> Self::Value {
        (**self).at(index)
    }

    #[inline]
    fn get(&self, offset: usize) -> Self::Value {
        (**self).get(offset)
    }
}
