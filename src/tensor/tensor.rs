use super::expression::{TensorExpr, TensorExprMut};
use super::policy::{Host, HostMemory, LinearAccess};
use crate::error::{Error, Result};
use crate::point::{Coordinate, Point};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Runtime-shape container of rank `D` in host memory.
///
/// The extent is chosen at construction and never changes. Elements live in
/// one buffer allocated once and shared between clones: cloning a `Tensor`
/// is cheap and writes through any clone are seen by all of them, i.e. the
/// buffer lives as long as its last handle.
///
/// Elements are stored in `Cell`s, so the container is not `Send` and every
/// aliasing handle stays on one thread.
///
/// `M` is the allocation tag, `Host` by default or `Pinned` for buffers meant
/// to be staged to the device.
pub struct Tensor<T, const D: usize, M = Host> {
    extent: Point<D>,
    stride: Point<D>,
    data: Rc<[Cell<T>]>,
    memory: M,
}

pub type Matrix<T> = Tensor<T, 2>;

impl<T, const D: usize> Tensor<T, D, Host>
where
    T: Copy + Default,
    Point<D>: Coordinate,
{
    /// Allocates a zeroed container in host memory.
    pub fn new(extent: impl Into<Point<D>>) -> Self {
        Self::with_memory(extent, Host)
    }

    pub fn try_new(extent: impl Into<Point<D>>) -> Result<Self> {
        Self::try_with_memory(extent, Host)
    }

    /// Wraps an existing buffer without copying it.
    ///
    /// The buffer may be larger than the extent, the trailing elements are
    /// then not reachable through this container.
    pub fn from_shared(extent: impl Into<Point<D>>, data: Rc<[Cell<T>]>) -> Result<Self> {
        let extent = extent.into();
        let required = extent.num_elements();
        if data.len() < required {
            return Err(Error::BufferTooSmall {
                required,
                actual: data.len(),
            });
        }

        Ok(Tensor {
            extent,
            stride: extent.stride_of(),
            data,
            memory: Host,
        })
    }
}

impl<T, const D: usize, M> Tensor<T, D, M>
where
    T: Copy + Default,
    M: HostMemory,
    Point<D>: Coordinate,
{
    pub fn with_memory(extent: impl Into<Point<D>>, memory: M) -> Self {
        let extent = extent.into();
        let elements = extent.num_elements();
        trace!(elements, memory = M::NAME, "allocating tensor");

        let data = (0..elements).map(|_| Cell::new(T::default())).collect();

        Tensor {
            extent,
            stride: extent.stride_of(),
            data,
            memory,
        }
    }

    /// Fails with `Error::Allocation` if the buffer cannot be reserved,
    /// including extents whose element count is not representable.
    pub fn try_with_memory(extent: impl Into<Point<D>>, memory: M) -> Result<Self> {
        let extent = extent.into();
        let elements = extent.num_elements();
        trace!(elements, memory = M::NAME, "allocating tensor");

        let allocation_failed = Error::Allocation {
            elements,
            memory: M::NAME,
        };
        if extent.checked_num_elements().is_none() {
            return Err(allocation_failed);
        }

        let mut data = Vec::new();
        data.try_reserve_exact(elements)
            .map_err(|_| allocation_failed)?;
        data.resize_with(elements, || Cell::new(T::default()));

        Ok(Tensor {
            extent,
            stride: extent.stride_of(),
            data: Rc::from(data),
            memory,
        })
    }
}

impl<T, const D: usize, M> Tensor<T, D, M>
where
    T: Copy,
    M: HostMemory,
    Point<D>: Coordinate,
{
    #[inline]
    pub fn extent(&self) -> Point<D> {
        self.extent
    }

    #[inline]
    pub fn stride(&self) -> Point<D> {
        self.stride
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.extent.num_elements()
    }

    pub fn memory(&self) -> M {
        self.memory
    }

    /// Returns a container of another extent sharing the same buffer.
    ///
    /// The number of elements must be unchanged, the rank may differ.
    pub fn reshape<const E: usize>(&self, extent: impl Into<Point<E>>) -> Result<Tensor<T, E, M>>
    where
        Point<E>: Coordinate,
    {
        let extent = extent.into();
        if extent.checked_num_elements() != Some(self.size()) {
            return Err(Error::extent_mismatch(self.extent.to_vec(), extent.to_vec()));
        }

        Ok(Tensor {
            extent,
            stride: extent.stride_of(),
            data: Rc::clone(&self.data),
            memory: self.memory,
        })
    }

    /// Underlying buffer, shared with every clone.
    pub fn shared_data(&self) -> &Rc<[Cell<T>]> {
        &self.data
    }

    /// Copies the elements in linear order.
    pub fn to_vec(&self) -> Vec<T> {
        self.data[..self.size()].iter().map(Cell::get).collect()
    }
}

impl<T, const D: usize, M> Clone for Tensor<T, D, M>
where
    M: Copy,
{
    fn clone(&self) -> Self {
        Tensor {
            extent: self.extent,
            stride: self.stride,
            data: Rc::clone(&self.data),
            memory: self.memory,
        }
    }
}

impl<T, const D: usize, M> Default for Tensor<T, D, M>
where
    T: Copy + Default,
    M: HostMemory,
    Point<D>: Coordinate,
{
    fn default() -> Self {
        Self::with_memory(Point::zeros(), M::default())
    }
}

impl<T, const D: usize, M> fmt::Debug for Tensor<T, D, M>
where
    T: Copy + fmt::Debug,
    M: HostMemory,
    Point<D>: Coordinate,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("extent", &self.extent.0)
            .field("memory", &M::NAME)
            .field("data", &self.to_vec())
            .finish()
    }
}

impl<T, const D: usize, M> TensorExpr for Tensor<T, D, M>
where
    T: Copy,
    M: HostMemory,
    Point<D>: Coordinate,
{
    type Value = T;
    type Index = Point<D>;
    type Access = LinearAccess;
    type Memory = M;

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
        self.extent.num_elements()
    }

    #[inline]
    fn at(&self, index: Point<D>) -> T {
        self.data[index.to_offset(self.stride)].get()
    }

    #[inline]
    fn get(&self, offset: usize) -> T {
        self.data[offset].get()
    }
}

impl<T, const D: usize, M> TensorExprMut for Tensor<T, D, M>
where
    T: Copy,
    M: HostMemory,
    Point<D>: Coordinate,
{
    #[inline]
    fn set_at(&mut self, index: Point<D>, value: T) {
        self.data[index.to_offset(self.stride)].set(value);
    }

    #[inline]
    fn set(&mut self, offset: usize, value: T) {
        self.data[offset].set(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::policy::Pinned;

    #[test]
    fn new_is_zeroed() {
        let ts: Matrix<f64> = Tensor::new([3, 4]);
        assert_eq!(ts.extent(), Point::new([3, 4]));
        assert_eq!(ts.stride(), Point::new([3, 12]));
        assert_eq!(ts.size(), 12);
        assert_eq!(ts.to_vec(), vec![0.0; 12]);
    }

    #[test]
    fn clones_alias() {
        let a: Tensor<i32, 2> = Tensor::new([2, 2]);
        let mut b = a.clone();
        b.set_at(Point::new([1, 1]), 7);

        assert_eq!(a.at(Point::new([1, 1])), 7);
        assert_eq!(a.get(3), 7);
        assert!(Rc::ptr_eq(a.shared_data(), b.shared_data()));
    }

    #[test]
    fn reshape_shares_buffer() {
        let a: Tensor<i32, 2> = Tensor::new([2, 3]);
        let mut flat = a.reshape(Point::new([6])).unwrap();
        flat.set(5, 1);
        assert_eq!(a.at(Point::new([1, 2])), 1);

        let err = a.reshape(Point::new([4])).unwrap_err();
        assert_eq!(err, Error::extent_mismatch(vec![2, 3], vec![4]));
    }

    #[test]
    fn from_shared() {
        let data: Rc<[Cell<u8>]> = (0..8).map(Cell::new).collect();
        let ts = Tensor::<u8, 2>::from_shared([2, 3], Rc::clone(&data)).unwrap();
        assert_eq!(ts.to_vec(), vec![0, 1, 2, 3, 4, 5]);

        let err = Tensor::<u8, 2>::from_shared([3, 3], data).unwrap_err();
        assert_eq!(err, Error::BufferTooSmall { required: 9, actual: 8 });
    }

    #[test]
    fn pinned_memory() {
        let ts = Tensor::<f32, 1, Pinned>::try_with_memory([4], Pinned).unwrap();
        assert_eq!(ts.memory(), Pinned);
        assert_eq!(ts.size(), 4);
    }

    #[test]
    fn allocation_failures() {
        let err = Tensor::<f32, 2>::try_new([1 << 40, 1 << 40]).unwrap_err();
        assert_eq!(
            err,
            Error::Allocation {
                elements: usize::MAX,
                memory: "host"
            }
        );

        let err = Tensor::<u64, 2>::try_new([1 << 30, 1 << 30]).unwrap_err();
        assert_eq!(
            err,
            Error::Allocation {
                elements: 1 << 60,
                memory: "host"
            }
        );

        assert!(matches!(
            Tensor::<u8, 1, Pinned>::try_with_memory([-3], Pinned),
            Err(Error::Allocation { memory: "pinned", .. })
        ));
    }

    #[test]
    fn reshape_rejects_overflow() {
        let a: Tensor<i32, 1> = Tensor::new([4]);
        assert!(matches!(
            a.reshape(Point::new([1 << 40, 1 << 40])),
            Err(Error::ExtentMismatch { .. })
        ));
    }

    #[test]
    fn default_is_empty() {
        let ts: Tensor<f32, 3> = Tensor::default();
        assert_eq!(ts.size(), 0);
        assert!(ts.to_vec().is_empty());
    }
}
