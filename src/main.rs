use std::time::Instant;

use lloyd_kmeans::{KMeans, Result};
use ndarray::{Array2, Axis};
use ndarray_rand::RandomExt;
use rand::distributions::Uniform;
use rand::prelude::*;
use rand_distr::Normal;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Gaussian blobs around `n_clusters` random centers.
fn generate_blobs(
    n_samples: usize,
    n_features: usize,
    n_clusters: usize,
    rng: &mut StdRng,
) -> Array2<f32> {
    let centers = Array2::random_using((n_clusters, n_features), Uniform::new(0.0f32, 100.0), rng);
    let noise = Array2::random_using((n_samples, n_features), Normal::new(0.0f32, 2.0).unwrap(), rng);
    let cluster_of = Uniform::new(0, n_clusters);

    let mut data = noise;
    for mut row in data.axis_iter_mut(Axis(0)) {
        let center = centers.row(cluster_of.sample(rng));
        row += &center;
    }
    data
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    // Parameters for data generation
    let n_samples = 100_000; // Number of data points
    let n_features = 3; // Number of dimensions
    let n_clusters = 256; // Number of desired clusters
    let max_iter = 100; // Iteration bound for K-Means

    println!(
        "Number of Samples: {}, Number of Features: {}, Number of Clusters: {}",
        n_samples, n_features, n_clusters
    );

    let mut rng = StdRng::seed_from_u64(42);
    let x = generate_blobs(n_samples, n_features, n_clusters, &mut rng);

    for accelerated in [false, true] {
        let mut kmeans = KMeans::new(x.view())
            .with_max_iter(max_iter)
            .with_seed(7)
            .with_accelerated_search(accelerated);

        let start = Instant::now();
        kmeans.cluster(n_clusters)?;
        let elapsed = start.elapsed();

        let sizes: Vec<usize> = kmeans.cluster_point_indices().iter().map(Vec::len).collect();
        println!(
            "accelerated={}: {} after {} iterations in {:.2?}, inertia {:.1}, cluster sizes {}..{}",
            accelerated,
            kmeans.status(),
            kmeans.iteration_count(),
            elapsed,
            kmeans.inertia(),
            sizes.iter().min().copied().unwrap_or(0),
            sizes.iter().max().copied().unwrap_or(0),
        );
    }
    Ok(())
}
