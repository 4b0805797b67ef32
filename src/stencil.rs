//! Convolution stencils over device tensors.
//!
//! A mask is a type implementing `ConvMask`, usually generated by the
//! `conv_kernel!` macro from a literal. Its weights are compile-time
//! constants, each mask instantiating its own kernels. Every mask extent is
//! odd and the radius is `extent / 2`.
//!
//! Three variants are provided, all producing an output of the input extent:
//! * `conv_global`: one worker per output element reading its neighbours
//!   straight from the input, as a lazy device view,
//! * `conv_block`: workers grouped in blocks of extent `B`. Each block stages
//!   a tile of extent `B + 2 * radius` in shared storage, the halo included,
//!   then computes from the tile,
//! * `conv_block_crack`: the tile is the block itself and only workers whose
//!   whole neighbourhood lies in the tile compute. Elements closer than the
//!   radius to a block seam are not written.
//!
//! Neighbours outside of the input read as zero. `conv_global` and
//! `conv_block` produce identical results and so does `conv_block_crack`
//! wherever it writes.

use crate::device::{block_for_index, BlockIndex, BlockKernel, DeviceTensor, SharedTile};
use crate::error::{Error, Result};
use crate::point::{Coordinate, Point};
use crate::ring::Ring;
use crate::tensor::expression::{TensorExpr, TensorExprMut};
use crate::tensor::lambda_tensor::{make_lambda_in, LambdaTensor};
use crate::tensor::policy::{ArrayAccess, Device, DeviceVisible};
use crate::tensor::shape::{NumElements, StaticExtent};
use crate::tensor::static_tensor::StaticTensor;
use std::marker::PhantomData;
use tracing::debug;

/// Fixed convolution mask.
pub trait ConvMask: 'static {
    type Value: Ring;
    type Shape: StaticExtent + NumElements<Self::Value>;

    const NAME: &'static str;
    /// Weights in linear offset order.
    const WEIGHTS: &'static [Self::Value];

    fn mask() -> StaticTensor<Self::Value, Self::Shape> {
        StaticTensor::from_fn(|i| Self::WEIGHTS[i])
    }
}

/// Radius of the mask `M` along each axis.
pub fn radius<M, const D: usize>() -> Point<D>
where
    M: ConvMask,
    M::Shape: StaticExtent<Index = Point<D>>,
{
    <M::Shape as StaticExtent>::extent() / 2
}

/// True if `local` is at least `radius` away from the borders of `block`.
#[inline]
pub fn inside<const D: usize>(local: Point<D>, radius: Point<D>, block: Point<D>) -> bool {
    (0..D).all(|k| local[k] >= radius[k] && local[k] < block[k] - radius[k])
}

/// Reads `input` at `index` with zero padding.
#[inline]
fn fetch<V, const D: usize>(input: &V, index: Point<D>) -> V::Value
where
    V: TensorExpr<Index = Point<D>>,
    V::Value: Ring,
{
    if index.within(&input.extent()) {
        input.at(index)
    } else {
        <V::Value as Ring>::ZERO
    }
}

/// Unblocked convolution of `input` by `M`, evaluated on read.
///
/// The view is read by device kernels, e.g. `persist()` to materialise it.
pub fn conv_global<M, V, const D: usize>(
    input: V,
) -> LambdaTensor<impl Fn(Point<D>) -> M::Value + Sync, ArrayAccess, D, Device>
where
    M: ConvMask,
    M::Shape: StaticExtent<Index = Point<D>>,
    V: TensorExpr<Value = M::Value, Index = Point<D>> + Sync,
    V::Memory: DeviceVisible,
    Point<D>: Coordinate,
{
    let extent = input.extent();
    let mask = M::mask();
    let mask_extent = mask.extent();
    let radius = radius::<M, D>();

    debug!(kernel = M::NAME, variant = "global", extent = ?extent, "launching stencil");

    make_lambda_in(
        extent,
        move |idx: Point<D>| {
            let mut sum = <M::Value as Ring>::ZERO;
            Point::for_index(Point::zeros(), mask_extent, |m| {
                sum = sum + fetch(&input, idx + m - radius) * mask[m];
            });
            sum
        },
        Device,
    )
}

struct HaloKernel<'a, M: ConvMask, V, const D: usize> {
    input: &'a V,
    mask: StaticTensor<M::Value, M::Shape>,
    radius: Point<D>,
}

impl<'a, M, V, const D: usize> BlockKernel<Point<D>> for HaloKernel<'a, M, V, D>
where
    M: ConvMask,
    M::Shape: StaticExtent<Index = Point<D>>,
    V: TensorExpr<Value = M::Value, Index = Point<D>> + Sync,
    Point<D>: Coordinate,
{
    type Shared = SharedTile<M::Value, D>;
    type Output = M::Value;

    fn shared(&self, block_extent: Point<D>) -> Self::Shared {
        SharedTile::new(block_extent + self.radius * Point::splat(2))
    }

    /// Each worker loads the `2^D` tile elements at `local + corner * 2r`,
    /// which covers the whole tile when `2r <= block_extent`.
    fn stage(&self, idx: &BlockIndex<Point<D>>, tile: &mut Self::Shared) {
        let two = Point::splat(2);
        Point::for_index(Point::zeros(), two, |corner| {
            let value = fetch(self.input, idx.global + (corner * two - Point::splat(1)) * self.radius);
            tile.set_at(idx.local + corner * self.radius * two, value);
        });
    }

    fn compute(&self, idx: &BlockIndex<Point<D>>, tile: &Self::Shared) -> Option<M::Value> {
        let mut sum = <M::Value as Ring>::ZERO;
        Point::for_index(Point::zeros(), self.mask.extent(), |m| {
            sum = sum + tile.at(idx.local + m) * self.mask[m];
        });
        Some(sum)
    }
}

struct CrackKernel<'a, M: ConvMask, B, V, const D: usize> {
    input: &'a V,
    mask: StaticTensor<M::Value, M::Shape>,
    radius: Point<D>,
    _block: PhantomData<fn() -> B>,
}

impl<'a, M, B, V, const D: usize> BlockKernel<Point<D>> for CrackKernel<'a, M, B, V, D>
where
    M: ConvMask,
    M::Shape: StaticExtent<Index = Point<D>>,
    B: StaticExtent<Index = Point<D>> + NumElements<M::Value>,
    V: TensorExpr<Value = M::Value, Index = Point<D>> + Sync,
    Point<D>: Coordinate,
{
    type Shared = StaticTensor<M::Value, B>;
    type Output = M::Value;

    fn shared(&self, _block_extent: Point<D>) -> Self::Shared {
        StaticTensor::new()
    }

    fn stage(&self, idx: &BlockIndex<Point<D>>, tile: &mut Self::Shared) {
        tile[idx.local] = self.input.at(idx.global);
    }

    fn compute(&self, idx: &BlockIndex<Point<D>>, tile: &Self::Shared) -> Option<M::Value> {
        if !inside(idx.local, self.radius, idx.block_extent) {
            return None;
        }

        let mut sum = <M::Value as Ring>::ZERO;
        Point::for_index(Point::zeros(), self.mask.extent(), |m| {
            sum = sum + tile[idx.local + m - self.radius] * self.mask[m];
        });
        Some(sum)
    }
}

/// Checks the grid preconditions shared by blocked variants and returns the
/// grid extent in blocks.
fn grid_extent<T, const D: usize>(
    input: &DeviceTensor<T, D>,
    output: &DeviceTensor<T, D>,
    block: Point<D>,
) -> Result<Point<D>>
where
    Point<D>: Coordinate,
{
    let extent = input.extent();
    if extent % block != Point::zeros() {
        return Err(Error::GridMismatch {
            extent: extent.to_vec(),
            block: block.to_vec(),
        });
    }

    if output.extent() != extent {
        return Err(Error::extent_mismatch(extent.to_vec(), output.extent().to_vec()));
    }

    Ok(extent / block)
}

/// Tiled convolution with halo staging, written into `output`.
///
/// `input` and `output` may be the same buffer.
pub fn conv_block_into<M, B, const D: usize>(
    input: &DeviceTensor<M::Value, D>,
    output: &DeviceTensor<M::Value, D>,
) -> Result<()>
where
    M: ConvMask,
    M::Shape: StaticExtent<Index = Point<D>>,
    B: StaticExtent<Index = Point<D>>,
    Point<D>: Coordinate,
{
    let block = B::extent();
    let grid = grid_extent(input, output, block)?;
    let radius = radius::<M, D>();
    if (0..D).any(|k| 2 * radius[k] > block[k]) {
        return Err(Error::HaloExceedsBlock {
            radius: radius.to_vec(),
            block: block.to_vec(),
        });
    }

    debug!(kernel = M::NAME, variant = "block", grid = ?grid, block = ?block, "launching stencil");

    let results = {
        let view = input.read();
        let kernel = HaloKernel::<M, _, D> {
            input: &view,
            mask: M::mask(),
            radius,
        };
        block_for_index(block, grid, &kernel)
    };

    output.scatter(results)
}

/// Tiled convolution with halo staging.
pub fn conv_block<M, B, const D: usize>(input: &DeviceTensor<M::Value, D>) -> Result<DeviceTensor<M::Value, D>>
where
    M: ConvMask,
    M::Shape: StaticExtent<Index = Point<D>>,
    B: StaticExtent<Index = Point<D>>,
    Point<D>: Coordinate,
{
    let output = DeviceTensor::try_new(input.extent())?;
    conv_block_into::<M, B, D>(input, &output)?;
    Ok(output)
}

/// Tiled convolution without halo, written into `output`.
///
/// Elements of `output` closer than the radius to a block seam are left
/// untouched.
pub fn conv_block_crack_into<M, B, const D: usize>(
    input: &DeviceTensor<M::Value, D>,
    output: &DeviceTensor<M::Value, D>,
) -> Result<()>
where
    M: ConvMask,
    M::Shape: StaticExtent<Index = Point<D>>,
    B: StaticExtent<Index = Point<D>> + NumElements<M::Value>,
    Point<D>: Coordinate,
{
    let block = B::extent();
    let grid = grid_extent(input, output, block)?;

    debug!(kernel = M::NAME, variant = "block_crack", grid = ?grid, block = ?block, "launching stencil");

    let results = {
        let view = input.read();
        let kernel = CrackKernel::<M, B, _, D> {
            input: &view,
            mask: M::mask(),
            radius: radius::<M, D>(),
            _block: PhantomData,
        };
        block_for_index(block, grid, &kernel)
    };

    output.scatter(results)
}

/// Tiled convolution without halo. Block seams are zero in the result.
pub fn conv_block_crack<M, B, const D: usize>(
    input: &DeviceTensor<M::Value, D>,
) -> Result<DeviceTensor<M::Value, D>>
where
    M: ConvMask,
    M::Shape: StaticExtent<Index = Point<D>>,
    B: StaticExtent<Index = Point<D>> + NumElements<M::Value>,
    Point<D>: Coordinate,
{
    let output = DeviceTensor::try_new(input.extent())?;
    conv_block_crack_into::<M, B, D>(input, &output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::shape::{Shape1D, Shape2D};
    use typenum::{U1, U2, U3, U4};

    /// `[1, 2, 3]` along dimension 0.
    struct Ramp;

    impl ConvMask for Ramp {
        type Value = i32;
        type Shape = Shape1D<U3>;

        const NAME: &'static str = "ramp";
        const WEIGHTS: &'static [i32] = &[1, 2, 3];
    }

    /// 3x3 cross.
    struct Cross;

    impl ConvMask for Cross {
        type Value = i64;
        type Shape = Shape2D<U3, U3>;

        const NAME: &'static str = "cross";
        const WEIGHTS: &'static [i64] = &[0, 1, 0, 1, 1, 1, 0, 1, 0];
    }

    fn ramp_input() -> DeviceTensor<i32, 1> {
        let input = DeviceTensor::new([8]);
        input.write_all(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        input
    }

    #[test]
    fn radius_and_inside() {
        assert_eq!(radius::<Cross, 2>(), Point::new([1, 1]));
        assert!(inside(Point::new([1, 2]), Point::new([1, 1]), Point::new([4, 4])));
        assert!(!inside(Point::new([0, 2]), Point::new([1, 1]), Point::new([4, 4])));
        assert!(!inside(Point::new([1, 3]), Point::new([1, 1]), Point::new([4, 4])));
    }

    #[test]
    fn global_zero_padding() {
        let input = ramp_input();
        let view = input.read();
        let out = conv_global::<Ramp, _, 1>(&view).persist().unwrap();

        // out[i] = in[i - 1] + 2 in[i] + 3 in[i + 1]
        assert_eq!(
            out.to_host().unwrap().to_vec(),
            vec![8, 14, 20, 26, 32, 38, 44, 23]
        );
    }

    #[test]
    fn block_matches_global() {
        let input = ramp_input();
        let expected = vec![8, 14, 20, 26, 32, 38, 44, 23];

        let out = conv_block::<Ramp, Shape1D<U2>, 1>(&input).unwrap();
        assert_eq!(out.to_host().unwrap().to_vec(), expected);

        let out = conv_block::<Ramp, Shape1D<U4>, 1>(&input).unwrap();
        assert_eq!(out.to_host().unwrap().to_vec(), expected);
    }

    #[test]
    fn crack_skips_seams() {
        let input = ramp_input();
        let out = conv_block_crack::<Ramp, Shape1D<U4>, 1>(&input).unwrap();

        assert_eq!(out.to_host().unwrap().to_vec(), vec![0, 14, 20, 0, 0, 38, 44, 0]);
    }

    #[test]
    fn crack_into_leaves_seams_untouched() {
        let input = ramp_input();
        let output = DeviceTensor::new([8]);
        output.fill(-1).unwrap();
        conv_block_crack_into::<Ramp, Shape1D<U4>, 1>(&input, &output).unwrap();

        assert_eq!(output.to_host().unwrap().to_vec(), vec![-1, 14, 20, -1, -1, 38, 44, -1]);
    }

    #[test]
    fn in_place() {
        let input: DeviceTensor<i64, 2> = DeviceTensor::new([4, 4]);
        input.fill(1).unwrap();
        conv_block_into::<Cross, Shape2D<U2, U2>, 2>(&input, &input).unwrap();

        let out = input.to_host().unwrap();
        assert_eq!(out.at(Point::new([0, 0])), 3);
        assert_eq!(out.at(Point::new([1, 0])), 4);
        assert_eq!(out.at(Point::new([1, 1])), 5);
    }

    #[test]
    fn preconditions() {
        let input: DeviceTensor<i64, 2> = DeviceTensor::new([4, 6]);

        assert_eq!(
            conv_block::<Cross, Shape2D<U4, U4>, 2>(&input).unwrap_err(),
            Error::GridMismatch {
                extent: vec![4, 6],
                block: vec![4, 4],
            }
        );
        assert_eq!(
            conv_block::<Cross, Shape2D<U1, U2>, 2>(&input).unwrap_err(),
            Error::HaloExceedsBlock {
                radius: vec![1, 1],
                block: vec![1, 2],
            }
        );

        let output: DeviceTensor<i64, 2> = DeviceTensor::new([4, 4]);
        assert!(matches!(
            conv_block_crack_into::<Cross, Shape2D<U2, U2>, 2>(&input, &output),
            Err(Error::ExtentMismatch { .. })
        ));
    }
}
