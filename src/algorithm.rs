//! Generic host algorithms over the container contract.
//!
//! Every algorithm is sequential and selects its traversal at compile time
//! from the access tag of its arguments: linear containers are walked by
//! offset `0..size`, coordinate containers through `for_index` over
//! `[0, extent)`. Both orders visit elements in linear offset order.
//!
//! Only containers whose memory is `HostVisible` are accepted; device
//! buffers go through the kernels of the `device` and `stencil` modules.

use crate::point::Coordinate;
use crate::tensor::expression::{TensorExpr, TensorExprMut};
use crate::tensor::policy::{AccessMode, HostVisible, Meet};

/// Calls `fun` on every coordinate of `[origin, extent)`, the highest
/// dimension being the outermost loop.
#[inline]
pub fn for_index<P, F>(origin: P, extent: P, fun: F)
where
    P: Coordinate,
    F: FnMut(P),
{
    P::for_index(origin, extent, fun)
}

#[inline]
pub fn for_each<T, F>(ts: &T, fun: F)
where
    T: TensorExpr,
    T::Memory: HostVisible,
    F: FnMut(T::Value),
{
    <T::Access as AccessMode>::for_each(ts, fun)
}

#[inline]
pub fn for_each_mut<T, F>(ts: &mut T, fun: F)
where
    T: TensorExprMut,
    T::Memory: HostVisible,
    F: FnMut(&mut T::Value),
{
    <T::Access as AccessMode>::for_each_mut(ts, fun)
}

pub fn fill<T>(ts: &mut T, value: T::Value)
where
    T: TensorExprMut,
    T::Memory: HostVisible,
{
    for_each_mut(ts, |x| *x = value);
}

/// Copies `src` into `dst`, which must have the same extent.
///
/// The linear path is taken only if both containers are linear.
pub fn copy<S, T>(src: &S, dst: &mut T)
where
    S: TensorExpr,
    S::Memory: HostVisible,
    S::Access: Meet<T::Access>,
    T: TensorExprMut<Value = S::Value, Index = S::Index>,
    T::Memory: HostVisible,
{
    debug_assert_eq!(src.extent(), dst.extent());

    <<S::Access as Meet<T::Access>>::Output as AccessMode>::copy(src, dst)
}

/// Left fold over the elements in traversal order.
pub fn reduce<T, V, F>(ts: &T, init: V, mut op: F) -> V
where
    T: TensorExpr,
    T::Memory: HostVisible,
    V: Copy,
    F: FnMut(V, T::Value) -> V,
{
    let mut acc = init;
    for_each(ts, |x| acc = op(acc, x));
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;
    use crate::tensor::lambda_tensor::make_lambda;
    use crate::tensor::static_tensor::StaticTensor;
    use crate::tensor::shape::Shape2D;
    use crate::tensor::tensor::Tensor;
    use typenum::{U2, U3};

    #[test]
    fn for_index_order() {
        let mut visited = Vec::new();
        for_index(Point::zeros(), Point::new([2, 2]), |idx| visited.push(idx));

        assert_eq!(
            visited,
            vec![
                Point::new([0, 0]),
                Point::new([1, 0]),
                Point::new([0, 1]),
                Point::new([1, 1]),
            ]
        );
    }

    #[test]
    fn for_each_visits_in_offset_order() {
        let linear = make_lambda([3, 2], |i: usize| i);
        let array = make_lambda([3, 2], |idx: Point<2>| idx.to_offset(Point::new([3, 6])));

        let mut a = Vec::new();
        let mut b = Vec::new();
        for_each(&linear, |x| a.push(x));
        for_each(&array, |x| b.push(x));

        assert_eq!(a, (0..6).collect::<Vec<_>>());
        assert_eq!(a, b);
    }

    #[test]
    fn fill_then_reduce() {
        let mut ts: Tensor<f64, 3> = Tensor::new([2, 3, 4]);
        fill(&mut ts, 0.5);

        assert_eq!(reduce(&ts, 0.0, |acc, x| acc + x), 12.0);
    }

    #[test]
    fn for_each_mut_on_static() {
        let mut ts: StaticTensor<i32, Shape2D<U3, U2>> = StaticTensor::from_fn(|i| i as i32);
        for_each_mut(&mut ts, |x| *x *= 2);

        assert_eq!(ts.as_slice(), &[0, 2, 4, 6, 8, 10]);
    }

    #[test]
    fn copy_between_access_modes() {
        let src = make_lambda([3, 2], |idx: Point<2>| idx[0] * 10 + idx[1]);
        let mut dst: StaticTensor<isize, Shape2D<U3, U2>> = StaticTensor::new();
        copy(&src, &mut dst);

        let mut back: Tensor<isize, 2> = Tensor::new([3, 2]);
        copy(&dst, &mut back);

        assert_eq!(back.to_vec(), vec![0, 10, 20, 1, 11, 21]);
    }

    #[test]
    fn reduce_is_a_left_fold() {
        let ts = make_lambda([4], |i: usize| i as i32 + 1);
        let digits = reduce(&ts, 0, |acc, x| acc * 10 + x);

        assert_eq!(digits, 1234);
    }
}
