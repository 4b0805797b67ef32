use super::expression::TensorExpr;
use super::policy::{AccessMode, ArrayAccess, Device, Host, HostVisible, LinearAccess, MemorySpace, Meet};
use super::shape::{NumElements, StaticExtent};
use super::static_tensor::StaticTensor;
use super::tensor::Tensor;
use crate::algorithm::copy;
use crate::device::{self, DeviceTensor};
use crate::error::Result;
use crate::point::{Coordinate, Point};
use std::fmt;
use std::marker::PhantomData;

/// Function usable as the generator of a `LambdaTensor`.
///
/// It is implemented for closures taking a linear offset, which give
/// `LinearAccess` views, and for closures taking a coordinate, which give
/// `ArrayAccess` views. The access tag `A` is inferred from the closure
/// argument type, so the argument must be annotated:
///
/// ```ignore
/// let by_offset = make_lambda([4, 4], |i: usize| i as f32);
/// let by_index = make_lambda([4, 4], |idx: Point<2>| idx[0] + idx[1]);
/// ```
pub trait Generator<A, const D: usize> {
    type Value: Copy;

    fn call_at(&self, index: Point<D>, stride: Point<D>) -> Self::Value;
    fn call_get(&self, offset: usize, stride: Point<D>) -> Self::Value;
}

impl<F, V, const D: usize> Generator<LinearAccess, D> for F
where
    F: Fn(usize) -> V,
    V: Copy,
    Point<D>: Coordinate,
{
    type Value = V;

    #[inline]
    fn call_at(&self, index: Point<D>, stride: Point<D>) -> V {
        self(index.to_offset(stride))
    }

    #[inline]
    fn call_get(&self, offset: usize, _stride: Point<D>) -> V {
        self(offset)
    }
}

impl<F, V, const D: usize> Generator<ArrayAccess, D> for F
where
    F: Fn(Point<D>) -> V,
    V: Copy,
    Point<D>: Coordinate,
{
    type Value = V;

    #[inline]
    fn call_at(&self, index: Point<D>, _stride: Point<D>) -> V {
        self(index)
    }

    #[inline]
    fn call_get(&self, offset: usize, stride: Point<D>) -> V {
        self(Point::from_offset(offset, stride))
    }
}

/// Lazy view: an extent and a function computing each element on read.
///
/// Nothing is stored or cached, every read calls the generator again.
/// Values captured by the generator (e.g. `Tensor` handles) live as long as
/// the view.
#[derive(Clone)]
pub struct LambdaTensor<F, A, const D: usize, M = Host> {
    extent: Point<D>,
    stride: Point<D>,
    fun: F,
    _phantoms: PhantomData<(A, M)>,
}

/// Builds a lazy view in host memory.
pub fn make_lambda<F, A, const D: usize>(extent: impl Into<Point<D>>, fun: F) -> LambdaTensor<F, A, D, Host>
where
    F: Generator<A, D>,
    A: AccessMode,
    Point<D>: Coordinate,
{
    make_lambda_in(extent, fun, Host)
}

/// Builds a lazy view tagged with the memory space `M`, e.g. `Device` for a
/// view read by kernels.
pub fn make_lambda_in<F, A, M, const D: usize>(
    extent: impl Into<Point<D>>,
    fun: F,
    _memory: M,
) -> LambdaTensor<F, A, D, M>
where
    F: Generator<A, D>,
    A: AccessMode,
    M: MemorySpace,
    Point<D>: Coordinate,
{
    let extent = extent.into();
    LambdaTensor {
        extent,
        stride: extent.stride_of(),
        fun,
        _phantoms: PhantomData,
    }
}

impl<F, A, const D: usize, M> LambdaTensor<F, A, D, M>
where
    F: Generator<A, D>,
    A: AccessMode,
    M: MemorySpace,
    Point<D>: Coordinate,
{
    #[inline]
    pub fn extent(&self) -> Point<D> {
        self.extent
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.extent.num_elements()
    }
}

impl<F, A, const D: usize, M> LambdaTensor<F, A, D, M>
where
    F: Generator<A, D>,
    F::Value: Default,
    A: AccessMode + Meet<LinearAccess>,
    M: HostVisible,
    Point<D>: Coordinate,
{
    /// Evaluates every element once into a new host `Tensor`.
    pub fn persist(&self) -> Tensor<F::Value, D> {
        let mut ts = Tensor::new(self.extent);
        copy(self, &mut ts);
        ts
    }

    /// Like `persist`, but reports a failed allocation as
    /// `Error::Allocation`.
    pub fn try_persist(&self) -> Result<Tensor<F::Value, D>> {
        let mut ts = Tensor::try_new(self.extent)?;
        copy(self, &mut ts);
        Ok(ts)
    }

    /// Evaluates every element once into a fixed-shape container.
    ///
    /// `S` must have the extent of the view.
    pub fn persist_static<S>(&self) -> StaticTensor<F::Value, S>
    where
        S: StaticExtent<Index = Point<D>> + NumElements<F::Value>,
    {
        debug_assert_eq!(S::extent(), self.extent);

        let mut ts = StaticTensor::new();
        copy(self, &mut ts);
        ts
    }
}

impl<F, A, const D: usize> LambdaTensor<F, A, D, Device>
where
    F: Generator<A, D> + Sync,
    F::Value: Default + Send + Sync,
    A: AccessMode,
    Point<D>: Coordinate,
{
    /// Evaluates every element once into a new `DeviceTensor`, one worker
    /// per element.
    pub fn persist(&self) -> Result<DeviceTensor<F::Value, D>> {
        let ts = DeviceTensor::try_new(self.extent)?;
        device::copy(self, &ts)?;
        Ok(ts)
    }
}

impl<F, A, const D: usize, M> TensorExpr for LambdaTensor<F, A, D, M>
where
    F: Generator<A, D>,
    A: AccessMode,
    M: MemorySpace,
    Point<D>: Coordinate,
{
    type Value = F::Value;
    type Index = Point<D>;
    type Access = A;
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
    fn at(&self, index: Point<D>) -> F::Value {
        self.fun.call_at(index, self.stride)
    }

    #[inline]
    fn get(&self, offset: usize) -> F::Value {
        self.fun.call_get(offset, self.stride)
    }
}

impl<F, A, const D: usize, M> fmt::Debug for LambdaTensor<F, A, D, M>
where
    M: MemorySpace,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaTensor")
            .field("extent", &self.extent.0)
            .field("memory", &M::NAME)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::expression::TensorExprMut;
    use crate::tensor::shape::Shape2D;
    use std::cell::Cell;
    use typenum::{U2, U3};

    fn access_of<T: TensorExpr>(_: &T) -> &'static str {
        std::any::type_name::<T::Access>()
    }

    #[test]
    fn access_follows_closure_argument() {
        let linear = make_lambda([2, 3], |i: usize| i as i32);
        let array = make_lambda([2, 3], |idx: Point<2>| idx[0] as i32);

        assert!(access_of(&linear).ends_with("LinearAccess"));
        assert!(access_of(&array).ends_with("ArrayAccess"));
    }

    #[test]
    fn both_accessors_agree() {
        let ts = make_lambda([2, 3], |idx: Point<2>| idx[0] + idx[1] * 100);
        assert_eq!(ts.at(Point::new([1, 2])), 201);
        assert_eq!(ts.get(5), 201);

        let ts = make_lambda([2, 3], |i: usize| i * 10);
        assert_eq!(ts.at(Point::new([1, 2])), 50);
        assert_eq!(ts.get(5), 50);
    }

    #[test]
    fn reads_are_not_cached() {
        let calls = Cell::new(0);
        let ts = make_lambda([2], |i: usize| {
            calls.set(calls.get() + 1);
            i
        });

        ts.get(0);
        ts.get(0);
        ts.at(Point::new([1]));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn views_over_captured_tensors() {
        let mut a: Tensor<i32, 2> = Tensor::new([2, 2]);
        a.set(3, 5);

        let b = a.clone();
        let doubled = make_lambda([2, 2], move |i: usize| b.get(i) * 2);
        drop(a);

        assert_eq!(doubled.persist().to_vec(), vec![0, 0, 0, 10]);
    }

    #[test]
    fn persist_static() {
        let ts = make_lambda([3, 2], |idx: Point<2>| (idx[0] * 10 + idx[1]) as u8);
        let st = ts.persist_static::<Shape2D<U3, U2>>();

        assert_eq!(st.as_slice(), &[0, 10, 20, 1, 11, 21]);
    }

    #[test]
    fn try_persist_reports_allocation_failure() {
        let ts = make_lambda([2, 2], |i: usize| i as u64);
        assert_eq!(ts.try_persist().unwrap().to_vec(), vec![0, 1, 2, 3]);

        let huge = make_lambda([1 << 30, 1 << 30], |i: usize| i as u64);
        assert!(matches!(
            huge.try_persist(),
            Err(crate::error::Error::Allocation { memory: "host", .. })
        ));
    }
}
