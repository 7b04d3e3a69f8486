//! Nearest-neighbor search over a small set of reference points.
//!
//! Accelerated assignment rebuilds one of these over the current centroids
//! every iteration and asks it for the single nearest centroid of each point.

mod kdtree;

pub use kdtree::KdTree;

use ndarray::{ArrayView1, ArrayView2};

use crate::error::Result;
use crate::metric::Metric;
use crate::scalar::Scalar;

/// One search hit: a reference point index and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<T> {
    /// Row of the reference point the index was built over.
    pub index: usize,
    /// Distance from the query under the index's metric.
    pub distance: T,
}

/// Index answering k-nearest-neighbor queries under a [`Metric`].
pub trait NearestNeighborSearch<T: Scalar, M: Metric<T>>: Sized + Sync {
    /// Build an index over the rows of `points`.
    fn build(points: ArrayView2<'_, T>, metric: M) -> Result<Self>;

    /// Up to `k` nearest rows to `point`, ascending by distance.
    fn query(&self, point: ArrayView1<'_, T>, k: usize) -> Vec<Neighbor<T>>;
}
