//! `device` models the accelerator the kernels of the crate run on.
//!
//! A launch partitions a grid into blocks of workers. Blocks are independent
//! and run in parallel on rayon threads in no particular order. Inside a
//! block the workers run in two lockstep phases:
//! * `stage`, where each worker may write the block's shared storage,
//! * `compute`, where each worker reads the shared storage and produces at
//!   most one output element.
//!
//! The end of the stage phase is the block barrier: every staging write is
//! visible to every worker of the block before any of them computes. There
//! is no synchronisation across blocks.
//!
//! Device memory is `DeviceTensor`. Kernels read their inputs through a
//! read-locked `DeviceView` and results are scattered to the output under a
//! single write lock once every block is done.

mod executor;
mod tensor;
mod tile;

pub use executor::Executor;
pub use tensor::{DeviceTensor, DeviceView};
pub use tile::SharedTile;

use crate::error::{Error, Result};
use crate::point::{Coordinate, Point};
use crate::tensor::expression::TensorExpr;
use crate::tensor::policy::DeviceVisible;
use rayon::prelude::*;
use tracing::{debug, trace};

/// Position of one worker in a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockIndex<P> {
    /// Block coordinate in the grid.
    pub block: P,
    /// Worker coordinate in its block.
    pub local: P,
    /// `block * block_extent + local`.
    pub global: P,
    pub block_extent: P,
    /// Number of blocks along each axis.
    pub grid_extent: P,
}

/// A kernel executed by every worker of every block.
pub trait BlockKernel<P: Coordinate>: Sync {
    /// Storage shared by the workers of one block.
    type Shared;
    type Output: Send;

    fn shared(&self, block_extent: P) -> Self::Shared;

    fn stage(&self, idx: &BlockIndex<P>, shared: &mut Self::Shared);

    /// Returns the value to write at `idx.global`, if any.
    fn compute(&self, idx: &BlockIndex<P>, shared: &Self::Shared) -> Option<Self::Output>;
}

/// Runs `kernel` on a grid of `grid_extent` blocks of `block_extent`
/// workers and returns the values produced, keyed by global coordinate.
pub fn block_for_index<P, K>(block_extent: P, grid_extent: P, kernel: &K) -> Vec<(P, K::Output)>
where
    P: Coordinate,
    K: BlockKernel<P>,
{
    let grid_stride = grid_extent.stride_of();
    trace!(block = ?block_extent, grid = ?grid_extent, "block launch");

    (0..grid_extent.num_elements())
        .into_par_iter()
        .flat_map_iter(|b| {
            let block = P::from_offset(b, grid_stride);
            let origin = block * block_extent;
            let worker = |local: P| BlockIndex {
                block,
                local,
                global: origin + local,
                block_extent,
                grid_extent,
            };

            let mut shared = kernel.shared(block_extent);
            P::for_index(P::zeros(), block_extent, |local| {
                kernel.stage(&worker(local), &mut shared)
            });

            let mut output = Vec::with_capacity(block_extent.num_elements());
            P::for_index(P::zeros(), block_extent, |local| {
                let idx = worker(local);
                if let Some(value) = kernel.compute(&idx, &shared) {
                    output.push((idx.global, value));
                }
            });

            output
        })
        .collect()
}

/// Evaluates `src` on device into `dst`, one worker per element.
pub fn copy<E, const D: usize>(src: &E, dst: &DeviceTensor<E::Value, D>) -> Result<()>
where
    E: TensorExpr<Index = Point<D>> + Sync,
    E::Memory: DeviceVisible,
    E::Value: Default + Send + Sync,
    Point<D>: Coordinate,
{
    if src.extent() != dst.extent() {
        return Err(Error::extent_mismatch(dst.extent().to_vec(), src.extent().to_vec()));
    }

    debug!(extent = ?src.extent(), "launching copy kernel");
    let values: Vec<E::Value> = (0..src.size()).into_par_iter().map(|i| src.get(i)).collect();

    dst.write_all(&values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::lambda_tensor::make_lambda_in;
    use crate::tensor::policy::Device;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Each worker stages its block coordinate sum and computes the sum over
    /// the block, which needs every staging write of the block.
    struct BlockSum;

    impl BlockKernel<Point<2>> for BlockSum {
        type Shared = Vec<isize>;
        type Output = isize;

        fn shared(&self, block_extent: Point<2>) -> Vec<isize> {
            Vec::with_capacity(block_extent.num_elements())
        }

        fn stage(&self, idx: &BlockIndex<Point<2>>, shared: &mut Vec<isize>) {
            shared.push(idx.global[0] + idx.global[1]);
        }

        fn compute(&self, idx: &BlockIndex<Point<2>>, shared: &Vec<isize>) -> Option<isize> {
            if idx.local == Point::zeros() {
                Some(shared.iter().sum())
            } else {
                None
            }
        }
    }

    #[test]
    fn barrier_between_phases() {
        let mut results = block_for_index(Point::new([2, 2]), Point::new([2, 1]), &BlockSum);
        results.sort_by_key(|(global, _)| global[0]);

        // Block (0, 0) covers x in 0..2, block (1, 0) covers x in 2..4.
        assert_eq!(results, vec![(Point::new([0, 0]), 4), (Point::new([2, 0]), 12)]);
    }

    struct CountWorkers<'a>(&'a AtomicUsize);

    impl<'a> BlockKernel<Point<3>> for CountWorkers<'a> {
        type Shared = ();
        type Output = ();

        fn shared(&self, _: Point<3>) {}

        fn stage(&self, _: &BlockIndex<Point<3>>, _: &mut ()) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }

        fn compute(&self, _: &BlockIndex<Point<3>>, _: &()) -> Option<()> {
            None
        }
    }

    #[test]
    fn every_worker_runs() {
        let count = AtomicUsize::new(0);
        let results = block_for_index(Point::new([2, 3, 1]), Point::new([3, 1, 2]), &CountWorkers(&count));

        assert!(results.is_empty());
        assert_eq!(count.load(Ordering::Relaxed), 36);
    }

    #[test]
    fn device_lambda_persist() {
        let ts = make_lambda_in([4, 2], |idx: Point<2>| idx[0] * idx[1], Device);
        let dev = ts.persist().unwrap();

        assert_eq!(dev.to_host().unwrap().to_vec(), vec![0, 0, 0, 0, 0, 1, 2, 3]);
    }

    #[test]
    fn copy_checks_extent() {
        let ts = make_lambda_in([4], |i: usize| i, Device);
        let dst: DeviceTensor<usize, 1> = DeviceTensor::new([3]);

        assert!(matches!(copy(&ts, &dst), Err(Error::ExtentMismatch { .. })));
    }
}
