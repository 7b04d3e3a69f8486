//! Centroid recomputation and empty-cluster repair.

use std::sync::{Mutex, PoisonError};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};
use crate::metric::Metric;
use crate::scalar::{from_count, Scalar};

/// Per-cluster coordinate sums and member counts for one iteration.
#[derive(Debug, Clone)]
pub(crate) struct ClusterSums<T> {
    pub(crate) sums: Array2<T>,
    pub(crate) counts: Vec<usize>,
}

impl<T: Scalar> ClusterSums<T> {
    /// Scan `labels` once and sum each cluster's members.
    pub(crate) fn accumulate(points: ArrayView2<'_, T>, labels: &[usize], n_clusters: usize) -> Self {
        let mut sums = Array2::<T>::zeros((n_clusters, points.ncols()));
        let mut counts = vec![0; n_clusters];
        points
            .rows()
            .into_iter()
            .zip(labels.iter())
            .for_each(|(x, &label)| {
                sums.row_mut(label).zip_mut_with(&x, |a, &b| *a += b);
                counts[label] += 1;
            });
        Self { sums, counts }
    }

    /// Mean of the members of `cluster`. The cluster must be non-empty.
    fn mean(&self, cluster: usize) -> Array1<T> {
        let count = from_count::<T>(self.counts[cluster]);
        self.sums.row(cluster).mapv(|v| v / count)
    }

    /// Move `point` (currently counted in `from`) into `to`.
    fn transfer(&mut self, point: ArrayView1<'_, T>, from: usize, to: usize) {
        self.sums.row_mut(from).zip_mut_with(&point, |a, &b| *a -= b);
        self.sums.row_mut(to).zip_mut_with(&point, |a, &b| *a += b);
        self.counts[from] -= 1;
        self.counts[to] += 1;
    }

    /// Divide every sum by its count.
    pub(crate) fn into_centroids(self) -> Result<Array2<T>> {
        let Self { mut sums, counts } = self;
        for (cluster, (mut c, &count)) in sums.rows_mut().into_iter().zip(&counts).enumerate() {
            if count == 0 {
                return Err(Error::InternalInvariantViolation(format!(
                    "cluster {cluster} has no points at centroid division"
                )));
            }
            let count = from_count::<T>(count);
            c.mapv_inplace(|v| v / count);
        }
        Ok(sums)
    }
}

/// Give every empty cluster one point, taken from the currently largest cluster.
///
/// Empty clusters are visited in ascending order. For each, the member of the
/// largest cluster (lowest index on ties) farthest from that cluster's mean is
/// relabeled, and the sums and counts are updated on both sides so later
/// repairs in the same pass see the new sizes. Returns the number of repairs.
pub(crate) fn repair_empty_clusters<T, M>(
    points: ArrayView2<'_, T>,
    labels: &mut [usize],
    acc: &mut ClusterSums<T>,
    metric: &M,
) -> Result<usize>
where
    T: Scalar,
    M: Metric<T>,
{
    let mut repaired = 0;
    for empty in 0..acc.counts.len() {
        if acc.counts[empty] != 0 {
            continue;
        }

        let largest = largest_cluster(&acc.counts);
        if acc.counts[largest] < 2 {
            return Err(Error::InternalInvariantViolation(format!(
                "cluster {empty} is empty and no cluster has a point to spare"
            )));
        }

        let mean = acc.mean(largest);
        let (distance, farthest) = farthest_member(points, labels, largest, mean.view(), metric)
            .ok_or_else(|| {
                Error::InternalInvariantViolation(format!(
                    "cluster {largest} has a nonzero count but no labeled points"
                ))
            })?;

        labels[farthest] = empty;
        acc.transfer(points.row(farthest), largest, empty);
        repaired += 1;
        debug!(
            cluster = empty,
            donor = largest,
            point = farthest,
            distance = ?distance,
            "repaired empty cluster"
        );
    }
    Ok(repaired)
}

/// Cluster with the most members. Ties go to the lowest index.
fn largest_cluster(counts: &[usize]) -> usize {
    let mut max_ind = 0;
    for (j, &count) in counts.iter().enumerate().skip(1) {
        if count > counts[max_ind] {
            max_ind = j;
        }
    }
    max_ind
}

/// `(distance, point)` of the member of `cluster` farthest from `center`.
///
/// Each worker folds its share of the points locally, then merges into the
/// shared extremum under a lock. Equal distances resolve to the lower point
/// index, so the result does not depend on how rayon splits the work.
fn farthest_member<T, M>(
    points: ArrayView2<'_, T>,
    labels: &[usize],
    cluster: usize,
    center: ArrayView1<'_, T>,
    metric: &M,
) -> Option<(T, usize)>
where
    T: Scalar,
    M: Metric<T>,
{
    let extremum: Mutex<Option<(T, usize)>> = Mutex::new(None);
    labels
        .par_iter()
        .enumerate()
        .filter(|&(_, &label)| label == cluster)
        .fold(
            || None,
            |best, (j, _)| farther(best, (metric.distance(center, points.row(j)), j)),
        )
        .for_each(|local| {
            if let Some(candidate) = local {
                let mut shared = extremum.lock().unwrap_or_else(PoisonError::into_inner);
                *shared = farther(*shared, candidate);
            }
        });
    extremum.into_inner().unwrap_or_else(PoisonError::into_inner)
}

fn farther<T: Scalar>(current: Option<(T, usize)>, candidate: (T, usize)) -> Option<(T, usize)> {
    let Some((dist, ind)) = current else {
        return Some(candidate);
    };
    let (cand_dist, cand_ind) = candidate;
    let wins = cand_dist > dist
        || (dist.is_nan() && !cand_dist.is_nan())
        || (cand_dist == dist && cand_ind < ind);
    Some(if wins { candidate } else { (dist, ind) })
}
