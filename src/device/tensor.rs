use crate::algorithm::for_each;
use crate::error::{Error, Result};
use crate::point::{Coordinate, Point};
use crate::tensor::expression::{TensorExpr, TensorExprMut};
use crate::tensor::policy::{Device, HostMemory, HostVisible, LinearAccess, MemorySpace};
use crate::tensor::tensor::Tensor;
use parking_lot::{RwLock, RwLockReadGuard};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tracing::trace;

/// Runtime-shape container in device memory.
///
/// Host algorithms do not accept it. Its elements are read by kernels
/// through a `DeviceView` and written by kernel launches and transfers.
/// Clones share the buffer.
pub struct DeviceTensor<T, const D: usize> {
    extent: Point<D>,
    stride: Point<D>,
    data: Arc<RwLock<Vec<T>>>,
}

impl<T, const D: usize> DeviceTensor<T, D>
where
    T: Copy + Default + Send + Sync,
    Point<D>: Coordinate,
{
    /// Allocates a zeroed buffer.
    pub fn new(extent: impl Into<Point<D>>) -> Self {
        let extent = extent.into();
        let elements = extent.num_elements();
        trace!(elements, memory = Device::NAME, "allocating tensor");

        Self::from_vec(extent, vec![T::default(); elements])
    }

    /// Fails with `Error::Allocation` if the buffer cannot be reserved,
    /// including extents whose element count is not representable.
    pub fn try_new(extent: impl Into<Point<D>>) -> Result<Self> {
        let extent = extent.into();
        let elements = extent.num_elements();
        trace!(elements, memory = Device::NAME, "allocating tensor");

        if extent.checked_num_elements().is_none() {
            return Err(Error::Allocation {
                elements,
                memory: Device::NAME,
            });
        }
        let mut data = reserve(elements)?;
        data.resize(elements, T::default());
        Ok(Self::from_vec(extent, data))
    }

    /// Uploads any host-visible expression.
    pub fn from_host<E>(src: &E) -> Result<Self>
    where
        E: TensorExpr<Value = T, Index = Point<D>>,
        E::Memory: HostVisible,
    {
        let mut data = reserve(src.size())?;
        for_each(src, |x| data.push(x));
        Ok(Self::from_vec(src.extent(), data))
    }

    fn from_vec(extent: Point<D>, data: Vec<T>) -> Self {
        DeviceTensor {
            extent,
            stride: extent.stride_of(),
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Downloads the elements into a new host `Tensor`.
    pub fn to_host(&self) -> Result<Tensor<T, D>> {
        let view = self.read();
        let data: Rc<[Cell<T>]> = view.as_slice().iter().copied().map(Cell::new).collect();
        Tensor::from_shared(self.extent, data)
    }

    /// Downloads the elements into an existing host container of the same
    /// extent.
    pub fn download_into<M>(&self, dst: &mut Tensor<T, D, M>) -> Result<()>
    where
        M: HostMemory,
    {
        if dst.extent() != self.extent {
            return Err(Error::extent_mismatch(self.extent.to_vec(), dst.extent().to_vec()));
        }

        let view = self.read();
        for (i, x) in view.as_slice().iter().enumerate() {
            dst.set(i, *x);
        }

        Ok(())
    }

    pub fn fill(&self, value: T) -> Result<()> {
        let mut data = self.data.try_write().ok_or(Error::BufferBusy)?;
        data.iter_mut().for_each(|x| *x = value);
        Ok(())
    }

    /// Replaces the whole buffer content, `values` being in linear order.
    pub(crate) fn write_all(&self, values: &[T]) -> Result<()> {
        let mut data = self.data.try_write().ok_or(Error::BufferBusy)?;
        data.copy_from_slice(values);
        Ok(())
    }

    /// Writes kernel results at their coordinates.
    pub(crate) fn scatter(&self, values: Vec<(Point<D>, T)>) -> Result<()> {
        let mut data = self.data.try_write().ok_or(Error::BufferBusy)?;
        for (index, x) in values {
            data[index.to_offset(self.stride)] = x;
        }
        Ok(())
    }
}

impl<T, const D: usize> DeviceTensor<T, D>
where
    Point<D>: Coordinate,
{
    /// Read-locks the buffer for kernels. Writes fail with
    /// `Error::BufferBusy` while the view is alive.
    pub fn read(&self) -> DeviceView<'_, T, D> {
        DeviceView {
            extent: self.extent,
            stride: self.stride,
            data: self.data.read_recursive(),
        }
    }

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

    /// True if both handles share their buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

fn reserve<T>(elements: usize) -> Result<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(elements).map_err(|_| Error::Allocation {
        elements,
        memory: Device::NAME,
    })?;
    Ok(data)
}

impl<T, const D: usize> Clone for DeviceTensor<T, D> {
    fn clone(&self) -> Self {
        DeviceTensor {
            extent: self.extent,
            stride: self.stride,
            data: Arc::clone(&self.data),
        }
    }
}

impl<T, const D: usize> fmt::Debug for DeviceTensor<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceTensor")
            .field("extent", &self.extent.0)
            .finish()
    }
}

/// Read-locked view of a `DeviceTensor`, the form in which kernels read
/// device memory.
pub struct DeviceView<'a, T, const D: usize> {
    extent: Point<D>,
    stride: Point<D>,
    data: RwLockReadGuard<'a, Vec<T>>,
}

impl<'a, T, const D: usize> DeviceView<'a, T, D> {
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }
}

impl<'a, T, const D: usize> TensorExpr for DeviceView<'a, T, D>
where
    T: Copy,
    Point<D>: Coordinate,
{
    type Value = T;
    type Index = Point<D>;
    type Access = LinearAccess;
    type Memory = Device;

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
        self.data[index.to_offset(self.stride)]
    }

    #[inline]
    fn get(&self, offset: usize) -> T {
        self.data[offset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::lambda_tensor::make_lambda;

    #[test]
    fn upload_download() {
        let src = make_lambda([3, 2], |i: usize| i as f32);
        let dev = DeviceTensor::from_host(&src).unwrap();
        assert_eq!(dev.extent(), Point::new([3, 2]));

        let host = dev.to_host().unwrap();
        assert_eq!(host.to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);

        let mut other: Tensor<f32, 2> = Tensor::new([3, 2]);
        dev.download_into(&mut other).unwrap();
        assert_eq!(other.to_vec(), host.to_vec());

        let mut wrong: Tensor<f32, 2> = Tensor::new([2, 3]);
        assert!(matches!(
            dev.download_into(&mut wrong),
            Err(Error::ExtentMismatch { .. })
        ));
    }

    #[test]
    fn allocation_failures() {
        let err = DeviceTensor::<f32, 2>::try_new([1 << 40, 1 << 40]).unwrap_err();
        assert_eq!(
            err,
            Error::Allocation {
                elements: usize::MAX,
                memory: "device"
            }
        );

        let err = DeviceTensor::<u64, 2>::try_new([1 << 30, 1 << 30]).unwrap_err();
        assert_eq!(
            err,
            Error::Allocation {
                elements: 1 << 60,
                memory: "device"
            }
        );
    }

    #[test]
    fn clones_alias() {
        let a: DeviceTensor<i32, 1> = DeviceTensor::new([4]);
        let b = a.clone();
        b.fill(3).unwrap();

        assert!(a.ptr_eq(&b));
        assert_eq!(a.read().as_slice(), &[3, 3, 3, 3]);
    }

    #[test]
    fn writes_fail_while_read() {
        let a: DeviceTensor<i32, 1> = DeviceTensor::new([4]);
        let view = a.read();

        assert_eq!(a.fill(1), Err(Error::BufferBusy));
        assert_eq!(view.at(Point::new([2])), 0);
        drop(view);

        assert_eq!(a.fill(1), Ok(()));
    }
}
