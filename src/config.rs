use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scalar::Scalar;

/// Knobs for a single clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Scalar + Deserialize<'de>"))]
pub struct KMeansConfig<T> {
    /// Maximum number of centroid updates.
    pub max_iter: usize,
    /// Stop once no centroid moves farther than this. Zero disables the check.
    pub tol: T,
    /// Assign points through a kd-tree over the centroids instead of a brute-force scan.
    pub use_accelerated_search: bool,
    /// Seed for random initialization. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl<T: Scalar> Default for KMeansConfig<T> {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tol: T::epsilon(),
            use_accelerated_search: false,
            seed: None,
        }
    }
}

impl<T: Scalar> KMeansConfig<T> {
    /// Check parameters that do not depend on the data.
    pub fn validate(&self) -> Result<()> {
        if !self.tol.is_finite() || self.tol < T::zero() {
            return Err(Error::InvalidArgument {
                name: "tol",
                message: "must be finite and non-negative",
            });
        }
        Ok(())
    }
}
