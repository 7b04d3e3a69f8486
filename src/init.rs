//! Random centroid seeding.

use ndarray::{Array2, ArrayView2};
use rand::Rng;

use crate::error::{Error, Result};
use crate::scalar::Scalar;

/// Source of uniformly distributed indices.
pub trait IndexSampler {
    /// Uniform draw from `0..upper`. `upper` is always at least 1.
    fn sample_index(&mut self, upper: usize) -> usize;
}

impl<R: Rng + ?Sized> IndexSampler for R {
    fn sample_index(&mut self, upper: usize) -> usize {
        self.gen_range(0..upper)
    }
}

/// Copy `k` distinct rows of `points`, chosen uniformly without replacement.
///
/// `k` is clamped to the number of points. Each pick draws from the shrinking
/// prefix of a permutation of row indices and swaps the chosen entry to the
/// back, so no row can be picked twice.
pub fn random_centroids<T, S>(
    points: ArrayView2<'_, T>,
    k: usize,
    sampler: &mut S,
) -> Result<Array2<T>>
where
    T: Scalar,
    S: IndexSampler + ?Sized,
{
    if k == 0 {
        return Err(Error::InvalidArgument {
            name: "k",
            message: "number of clusters must be at least 1",
        });
    }
    let n_points = points.nrows();
    if n_points == 0 {
        return Err(Error::InternalInvariantViolation(
            "cannot seed clusters from an empty point set".to_string(),
        ));
    }
    let k = k.min(n_points);

    let mut range: Vec<usize> = (0..n_points).collect();
    let mut remaining = n_points;
    let mut centroids = Array2::<T>::zeros((k, points.ncols()));
    for mut centroid in centroids.rows_mut() {
        let pick = sampler.sample_index(remaining);
        centroid.assign(&points.row(range[pick]));
        remaining -= 1;
        range.swap(pick, remaining);
    }
    Ok(centroids)
}
