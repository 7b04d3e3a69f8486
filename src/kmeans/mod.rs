//! Lloyd's k-means over a borrowed point set.
//!
//! Each iteration assigns every point to its nearest centroid, recomputes the
//! centroids as member means, and repairs any cluster left without members by
//! relocating the farthest point of the currently largest cluster. The loop
//! stops when no label changes, when no centroid moves farther than the
//! tolerance, or after `max_iter` centroid updates.
//!
//! ```
//! use lloyd_kmeans::KMeans;
//! use ndarray::array;
//!
//! let points = array![[0.0f32, 0.0], [0.1, 0.1], [10.0, 10.0], [10.1, 10.1]];
//! let init = array![[0.0f32, 0.0], [10.0, 10.0]];
//!
//! let mut kmeans = KMeans::new(points.view());
//! kmeans.cluster_from_centroids(init.view()).unwrap();
//!
//! assert_eq!(kmeans.cluster_point_indices(), &[vec![0, 1], vec![2, 3]]);
//! assert!(kmeans.status().is_converged());
//! ```

mod assign;
mod convergence;
mod update;

pub use convergence::Status;

use std::marker::PhantomData;

use ndarray::{Array2, ArrayView2, Axis, Slice};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::KMeansConfig;
use crate::error::{Error, Result};
use crate::index::{KdTree, NearestNeighborSearch};
use crate::init::{random_centroids, IndexSampler};
use crate::metric::{Metric, SquaredEuclidean};
use crate::scalar::Scalar;

use self::assign::{assign_accelerated, assign_brute_force, nearest_centroid};
use self::convergence::max_squared_displacement;
use self::update::{repair_empty_clusters, ClusterSums};

/// Label held by every point before the first assignment pass.
const UNASSIGNED: usize = usize::MAX;

/// Outputs of one finished run, committed to the engine only on success.
struct Fit<T> {
    centroids: Array2<T>,
    labels: Vec<usize>,
    buckets: Vec<Vec<usize>>,
    iteration_count: usize,
    status: Status,
}

/// Group point indices by label, ascending within each cluster.
fn bucket_points(labels: &[usize], n_clusters: usize) -> Result<Vec<Vec<usize>>> {
    let mut buckets = vec![Vec::new(); n_clusters];
    for (i, &label) in labels.iter().enumerate() {
        let bucket = buckets.get_mut(label).ok_or_else(|| {
            Error::InternalInvariantViolation(format!(
                "point {i} has label {label} outside 0..{n_clusters}"
            ))
        })?;
        bucket.push(i);
    }
    Ok(buckets)
}

/// K-means clustering engine.
///
/// `M` is the distance metric and `I` the search index used when accelerated
/// assignment is enabled. Both are fixed by type, so the default
/// squared-Euclidean kernels are chosen at compile time.
#[derive(Debug, Clone)]
pub struct KMeans<'a, T, M = SquaredEuclidean, I = KdTree<T, M>> {
    points: ArrayView2<'a, T>,
    metric: M,
    config: KMeansConfig<T>,
    centroids: Array2<T>,
    cluster_point_indices: Vec<Vec<usize>>,
    cluster_index_map: Vec<usize>,
    iteration_count: usize,
    status: Status,
    index: PhantomData<fn() -> I>,
}

/// Engine for `f32` points in the plane. Points carry two columns.
pub type KMeans2D<'a> = KMeans<'a, f32>;

/// Engine for `f32` points in space. Points carry three columns.
pub type KMeans3D<'a> = KMeans<'a, f32>;

impl<'a, T: Scalar> KMeans<'a, T> {
    /// Engine over `points` (one point per row) with the squared-Euclidean metric.
    pub fn new(points: ArrayView2<'a, T>) -> Self {
        Self {
            points,
            metric: SquaredEuclidean,
            config: KMeansConfig::default(),
            centroids: Array2::zeros((0, points.ncols())),
            cluster_point_indices: Vec::new(),
            cluster_index_map: Vec::new(),
            iteration_count: 0,
            status: Status::Running,
            index: PhantomData,
        }
    }
}

impl<'a, T, M, I> KMeans<'a, T, M, I>
where
    T: Scalar,
    M: Metric<T>,
    I: NearestNeighborSearch<T, M>,
{
    /// Switch to another metric. Accelerated search uses a [`KdTree`] over it.
    pub fn with_metric<M2: Metric<T>>(self, metric: M2) -> KMeans<'a, T, M2, KdTree<T, M2>> {
        KMeans {
            points: self.points,
            metric,
            config: self.config,
            centroids: self.centroids,
            cluster_point_indices: self.cluster_point_indices,
            cluster_index_map: self.cluster_index_map,
            iteration_count: self.iteration_count,
            status: self.status,
            index: PhantomData,
        }
    }

    /// Switch the search index used for accelerated assignment.
    pub fn with_search_index<I2: NearestNeighborSearch<T, M>>(self) -> KMeans<'a, T, M, I2> {
        KMeans {
            points: self.points,
            metric: self.metric,
            config: self.config,
            centroids: self.centroids,
            cluster_point_indices: self.cluster_point_indices,
            cluster_index_map: self.cluster_index_map,
            iteration_count: self.iteration_count,
            status: self.status,
            index: PhantomData,
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: KMeansConfig<T>) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.config.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance. Zero disables the displacement check.
    pub fn with_tol(mut self, tol: T) -> Self {
        self.config.tol = tol;
        self
    }

    /// Toggle kd-tree assignment.
    pub fn with_accelerated_search(mut self, enabled: bool) -> Self {
        self.config.use_accelerated_search = enabled;
        self
    }

    /// Set random seed for reproducible initialization.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Cluster into `num_clusters` groups seeded from randomly chosen points.
    ///
    /// `num_clusters` larger than the number of points is clamped.
    pub fn cluster(&mut self, num_clusters: usize) -> Result<&mut Self> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.cluster_with_sampler(num_clusters, &mut rng)
    }

    /// Like [`cluster`](Self::cluster), drawing seed points from `sampler`.
    pub fn cluster_with_sampler<S>(&mut self, num_clusters: usize, sampler: &mut S) -> Result<&mut Self>
    where
        S: IndexSampler + ?Sized,
    {
        self.config.validate()?;
        if num_clusters > self.points.nrows() {
            debug!(
                requested = num_clusters,
                n_points = self.points.nrows(),
                "clamping cluster count to point count"
            );
        }
        let centroids = random_centroids(self.points, num_clusters, sampler)?;
        let fit = self.run(centroids)?;
        self.commit(fit);
        Ok(self)
    }

    /// Cluster starting from explicit centroids, one per row.
    ///
    /// Rows beyond the number of points are dropped.
    pub fn cluster_from_centroids(&mut self, centroids: ArrayView2<'_, T>) -> Result<&mut Self> {
        self.config.validate()?;
        if centroids.nrows() == 0 {
            return Err(Error::InvalidArgument {
                name: "centroids",
                message: "at least one initial centroid is required",
            });
        }
        if centroids.ncols() != self.points.ncols() {
            return Err(Error::DimensionMismatch {
                expected: self.points.ncols(),
                found: centroids.ncols(),
            });
        }
        let n_points = self.points.nrows();
        if n_points == 0 {
            return Err(Error::InternalInvariantViolation(
                "cannot populate clusters from an empty point set".to_string(),
            ));
        }
        let k = centroids.nrows().min(n_points);
        if k < centroids.nrows() {
            debug!(
                requested = centroids.nrows(),
                n_points, "clamping cluster count to point count"
            );
        }
        let centroids = centroids.slice_axis(Axis(0), Slice::from(..k)).to_owned();
        let fit = self.run(centroids)?;
        self.commit(fit);
        Ok(self)
    }

    /// Iterate from `centroids` to a terminal status. Leaves `self` untouched.
    fn run(&self, mut centroids: Array2<T>) -> Result<Fit<T>> {
        let n_points = self.points.nrows();
        let n_clusters = centroids.nrows();
        let tol = self.config.tol;
        let tol_sq = tol * tol;

        let mut labels = vec![UNASSIGNED; n_points];
        let mut iteration_count = 0;
        let mut status = Status::Running;

        // With no iterations allowed, a single pass still defines the labels.
        if self.config.max_iter == 0 {
            self.assign(centroids.view(), &mut labels)?;
            status = Status::MaxIterReached;
        }

        while status == Status::Running {
            if !self.assign(centroids.view(), &mut labels)? {
                status = Status::ConvergedNoChange;
                break;
            }
            let centroids_old = (tol > T::zero()).then(|| centroids.clone());

            let mut acc = ClusterSums::accumulate(self.points, &labels, n_clusters);
            let repaired = repair_empty_clusters(self.points, &mut labels, &mut acc, &self.metric)?;
            centroids = acc.into_centroids()?;
            iteration_count += 1;

            let shift =
                centroids_old.map(|old| max_squared_displacement(old.view(), centroids.view()));
            debug!(
                iteration = iteration_count,
                repaired,
                shift = ?shift,
                "k-means iteration"
            );

            if shift.is_some_and(|s| s < tol_sq) {
                status = Status::ConvergedTolerance;
            } else if iteration_count >= self.config.max_iter {
                status = Status::MaxIterReached;
            }
        }

        let buckets = bucket_points(&labels, n_clusters)?;

        info!(
            status = %status,
            iterations = iteration_count,
            clusters = n_clusters,
            points = n_points,
            "k-means finished"
        );
        Ok(Fit {
            centroids,
            labels,
            buckets,
            iteration_count,
            status,
        })
    }

    fn commit(&mut self, fit: Fit<T>) {
        self.centroids = fit.centroids;
        self.cluster_index_map = fit.labels;
        self.cluster_point_indices = fit.buckets;
        self.iteration_count = fit.iteration_count;
        self.status = fit.status;
    }

    fn assign(&self, centroids: ArrayView2<'_, T>, labels: &mut [usize]) -> Result<bool> {
        if self.config.use_accelerated_search {
            assign_accelerated::<T, M, I>(self.points, centroids, &self.metric, labels)
        } else {
            Ok(assign_brute_force(self.points, centroids, &self.metric, labels))
        }
    }

    /// Nearest final centroid for each row of `points`.
    pub fn predict(&self, points: ArrayView2<'_, T>) -> Result<Vec<usize>> {
        if self.centroids.nrows() == 0 {
            return Err(Error::InvalidArgument {
                name: "centroids",
                message: "cluster before predicting",
            });
        }
        if points.ncols() != self.centroids.ncols() {
            return Err(Error::DimensionMismatch {
                expected: self.centroids.ncols(),
                found: points.ncols(),
            });
        }
        let centroids = self.centroids.view();
        Ok((0..points.nrows())
            .into_par_iter()
            .map(|i| nearest_centroid(points.row(i), centroids, &self.metric))
            .collect())
    }

    /// Sum of metric distances from each point to its assigned centroid.
    pub fn inertia(&self) -> T {
        self.cluster_index_map
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label < self.centroids.nrows())
            .fold(T::zero(), |acc, (i, &label)| {
                acc + self
                    .metric
                    .distance(self.centroids.row(label), self.points.row(i))
            })
    }

    /// The borrowed point set.
    pub fn points(&self) -> ArrayView2<'a, T> {
        self.points
    }

    /// Active configuration.
    pub fn config(&self) -> &KMeansConfig<T> {
        &self.config
    }

    /// Final centroids, one per row.
    pub fn centroids(&self) -> &Array2<T> {
        &self.centroids
    }

    /// Point indices of each cluster, ascending.
    pub fn cluster_point_indices(&self) -> &[Vec<usize>] {
        &self.cluster_point_indices
    }

    /// Cluster of each point.
    pub fn cluster_index_map(&self) -> &[usize] {
        &self.cluster_index_map
    }

    /// Number of clusters actually used.
    pub fn num_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    /// Number of centroid updates performed by the last run.
    pub fn iteration_count(&self) -> usize {
        self.iteration_count
    }

    /// How the last run ended.
    pub fn status(&self) -> Status {
        self.status
    }
}
