//! Nearest-centroid assignment.

use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::index::NearestNeighborSearch;
use crate::metric::Metric;
use crate::scalar::Scalar;

/// Index of the closest centroid. Ties go to the lowest centroid index.
#[inline]
pub(crate) fn nearest_centroid<T, M>(
    point: ArrayView1<'_, T>,
    centroids: ArrayView2<'_, T>,
    metric: &M,
) -> usize
where
    T: Scalar,
    M: Metric<T>,
{
    let mut min_dist = T::infinity();
    let mut min_j = 0;
    for (j, c) in centroids.rows().into_iter().enumerate() {
        let dist = metric.distance(c, point);
        if dist < min_dist {
            min_dist = dist;
            min_j = j;
        }
    }
    min_j
}

/// Reassign every point by scanning all centroids. Returns whether any label changed.
pub(crate) fn assign_brute_force<T, M>(
    points: ArrayView2<'_, T>,
    centroids: ArrayView2<'_, T>,
    metric: &M,
    labels: &mut [usize],
) -> bool
where
    T: Scalar,
    M: Metric<T>,
{
    labels
        .par_iter_mut()
        .enumerate()
        .map(|(i, label)| {
            let nearest = nearest_centroid(points.row(i), centroids, metric);
            let changed = *label != nearest;
            *label = nearest;
            changed
        })
        .reduce(|| false, |a, b| a || b)
}

/// Reassign every point through a search index rebuilt over `centroids`.
pub(crate) fn assign_accelerated<T, M, I>(
    points: ArrayView2<'_, T>,
    centroids: ArrayView2<'_, T>,
    metric: &M,
    labels: &mut [usize],
) -> Result<bool>
where
    T: Scalar,
    M: Metric<T>,
    I: NearestNeighborSearch<T, M>,
{
    let n_clusters = centroids.nrows();
    let index = I::build(centroids, metric.clone())?;
    labels
        .par_iter_mut()
        .enumerate()
        .map(|(i, label)| {
            let nearest = match index.query(points.row(i), 1).first() {
                Some(hit) if hit.index < n_clusters => hit.index,
                Some(hit) => {
                    return Err(Error::InternalInvariantViolation(format!(
                        "search index returned centroid {} of {n_clusters} for point {i}",
                        hit.index
                    )))
                }
                None => {
                    return Err(Error::InternalInvariantViolation(format!(
                        "search index returned no centroid for point {i}"
                    )))
                }
            };
            let changed = *label != nearest;
            *label = nearest;
            Ok(changed)
        })
        .try_reduce(|| false, |a, b| Ok(a || b))
}
