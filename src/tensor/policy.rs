//! Type-level capability tags.
//!
//! Every container carries two tags through `TensorExpr`:
//! * an access tag, `LinearAccess` when its native accessor is the flat
//!   offset and `ArrayAccess` when it is the coordinate,
//! * a memory tag telling on which side of the host/device boundary its
//!   elements live.
//!
//! Host algorithms require `HostVisible` memory and kernels `DeviceVisible`
//! memory, which rejects crossing the boundary at compile time.

use super::expression::{TensorExpr, TensorExprMut};
use crate::point::Coordinate;

/// Traversal strategy attached to an access tag.
pub trait AccessMode: Default + Copy + Send + Sync + 'static {
    fn for_each<T, F>(ts: &T, fun: F)
    where
        T: TensorExpr,
        F: FnMut(T::Value);

    fn for_each_mut<T, F>(ts: &mut T, fun: F)
    where
        T: TensorExprMut,
        F: FnMut(&mut T::Value);

    fn copy<S, T>(src: &S, dst: &mut T)
    where
        S: TensorExpr,
        T: TensorExprMut<Value = S::Value, Index = S::Index>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinearAccess;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArrayAccess;

impl AccessMode for LinearAccess {
    #[inline]
    fn for_each<T, F>(ts: &T, mut fun: F)
    where
        T: TensorExpr,
        F: FnMut(T::Value),
    {
        for i in 0..ts.size() {
            fun(ts.get(i));
        }
    }

    #[inline]
    fn for_each_mut<T, F>(ts: &mut T, mut fun: F)
    where
        T: TensorExprMut,
        F: FnMut(&mut T::Value),
    {
        for i in 0..ts.size() {
            let mut value = ts.get(i);
            fun(&mut value);
            ts.set(i, value);
        }
    }

    #[inline]
    fn copy<S, T>(src: &S, dst: &mut T)
    where
        S: TensorExpr,
        T: TensorExprMut<Value = S::Value, Index = S::Index>,
    {
        for i in 0..dst.size() {
            dst.set(i, src.get(i));
        }
    }
}

impl AccessMode for ArrayAccess {
    #[inline]
    fn for_each<T, F>(ts: &T, mut fun: F)
    where
        T: TensorExpr,
        F: FnMut(T::Value),
    {
        T::Index::for_index(T::Index::zeros(), ts.extent(), |idx| fun(ts.at(idx)));
    }

    #[inline]
    fn for_each_mut<T, F>(ts: &mut T, mut fun: F)
    where
        T: TensorExprMut,
        F: FnMut(&mut T::Value),
    {
        let extent = ts.extent();
        T::Index::for_index(T::Index::zeros(), extent, |idx| {
            let mut value = ts.at(idx);
            fun(&mut value);
            ts.set_at(idx, value);
        });
    }

    #[inline]
    fn copy<S, T>(src: &S, dst: &mut T)
    where
        S: TensorExpr,
        T: TensorExprMut<Value = S::Value, Index = S::Index>,
    {
        S::Index::for_index(S::Index::zeros(), src.extent(), |idx| {
            dst.set_at(idx, src.at(idx))
        });
    }
}

/// Type operator that outputs the access tag two containers can be
/// traversed with together: linear only if both are linear.
pub trait Meet<Rhs> {
    type Output: AccessMode;
}

impl Meet<LinearAccess> for LinearAccess {
    type Output = LinearAccess;
}

impl Meet<ArrayAccess> for LinearAccess {
    type Output = ArrayAccess;
}

impl<Rhs> Meet<Rhs> for ArrayAccess
where
    Rhs: AccessMode,
{
    type Output = ArrayAccess;
}

pub trait MemorySpace: Default + Copy + Send + Sync + 'static {
    const NAME: &'static str;
}

/// Memory the host may read and write directly.
pub trait HostVisible: MemorySpace {}

/// Memory kernels may read directly.
pub trait DeviceVisible: MemorySpace {}

/// Allocation strategies of runtime-shape host containers.
pub trait HostMemory: HostVisible {}

/// Storage embedded in the container value itself (fixed-shape
/// containers), usable on both sides of the boundary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Local;

/// Plain host heap allocation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Host;

/// Host allocation meant to be staged to the device.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Pinned;

/// Device memory, only reachable from kernels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Device;

impl MemorySpace for Local {
    const NAME: &'static str = "local";
}

impl MemorySpace for Host {
    const NAME: &'static str = "host";
}

impl MemorySpace for Pinned {
    const NAME: &'static str = "pinned";
}

impl MemorySpace for Device {
    const NAME: &'static str = "device";
}

impl HostVisible for Local {}
impl HostVisible for Host {}
impl HostVisible for Pinned {}

impl DeviceVisible for Local {}
impl DeviceVisible for Device {}

impl HostMemory for Host {}
impl HostMemory for Pinned {}
