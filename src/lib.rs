//! Parallel Lloyd's k-means for point clouds.
//!
//! `lloyd_kmeans` partitions the rows of an [`ndarray::ArrayView2`] into k
//! clusters. The point set is borrowed, never copied; every per-point pass
//! runs on rayon's thread pool.
//!
//! - Initialization from k distinct random points or from explicit centroids.
//! - Brute-force assignment, or assignment through a [`KdTree`] rebuilt over
//!   the centroids each iteration.
//! - Pluggable [`Metric`]s, with squared Euclidean as the default fast path.
//! - Empty clusters are repaired so every cluster keeps at least one point.
//!
//! ```
//! use lloyd_kmeans::KMeans;
//! use ndarray::Array2;
//!
//! let points = Array2::from_shape_fn((40, 2), |(i, j)| (i % 4 * 10 + j) as f64);
//! let mut kmeans = KMeans::new(points.view()).with_seed(42);
//! kmeans.cluster(4).unwrap();
//!
//! assert_eq!(kmeans.num_clusters(), 4);
//! let total: usize = kmeans.cluster_point_indices().iter().map(Vec::len).sum();
//! assert_eq!(total, 40);
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod index;
pub mod init;
pub mod kmeans;
pub mod metric;
mod scalar;

pub use config::KMeansConfig;
pub use error::{Error, Result};
pub use index::{KdTree, NearestNeighborSearch, Neighbor};
pub use init::IndexSampler;
pub use kmeans::{KMeans, KMeans2D, KMeans3D, Status};
pub use metric::{Chebyshev, CustomMetric, Euclidean, Manhattan, Metric, SquaredEuclidean};
pub use scalar::Scalar;
