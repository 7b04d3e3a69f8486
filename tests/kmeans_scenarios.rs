use lloyd_kmeans::{
    Chebyshev, CustomMetric, Error, IndexSampler, KMeans, KMeansConfig, KdTree, Manhattan,
    SquaredEuclidean, Status,
};
use ndarray::{array, Array2, ArrayView1};
use rand::prelude::*;
use rand_distr::Normal;

/// Three jittered clouds of `per_cloud` points at (0,0), (100,0), (0,100).
fn three_clouds(per_cloud: usize, seed: u64) -> Array2<f64> {
    let centers = [[0.0, 0.0], [100.0, 0.0], [0.0, 100.0]];
    let jitter = Normal::new(0.0, 1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((3 * per_cloud, 2), |(i, j)| {
        centers[i / per_cloud][j] + jitter.sample(&mut rng)
    })
}

fn assert_partition(buckets: &[Vec<usize>], n_points: usize) {
    let mut seen = vec![false; n_points];
    for bucket in buckets {
        for &i in bucket {
            assert!(!seen[i], "point {i} appears twice");
            seen[i] = true;
        }
    }
    assert!(seen.iter().all(|&s| s), "some point is in no bucket");
}

#[test]
fn separated_clouds_converge_one_bucket_per_cloud() {
    let per_cloud = 50;
    let points = three_clouds(per_cloud, 1);
    let init = array![[3.0, -2.0], [97.0, 4.0], [-1.0, 95.0]];

    for accelerated in [false, true] {
        let mut kmeans = KMeans::new(points.view()).with_accelerated_search(accelerated);
        kmeans.cluster_from_centroids(init.view()).unwrap();

        assert!(kmeans.status().is_converged());
        assert!(kmeans.iteration_count() <= 5);
        let buckets = kmeans.cluster_point_indices();
        assert_eq!(buckets.len(), 3);
        for (cloud, bucket) in buckets.iter().enumerate() {
            let expected: Vec<usize> = (cloud * per_cloud..(cloud + 1) * per_cloud).collect();
            assert_eq!(bucket, &expected);
        }
    }
}

#[test]
fn explicit_centroids_are_deterministic() {
    let points = three_clouds(40, 9);
    let init = array![[10.0, 10.0], [60.0, 0.0], [0.0, 60.0]];

    let run = || {
        let mut kmeans = KMeans::new(points.view()).with_tol(0.0);
        kmeans.cluster_from_centroids(init.view()).unwrap();
        (kmeans.cluster_index_map().to_vec(), kmeans.centroids().clone())
    };
    let (labels_a, centroids_a) = run();
    let (labels_b, centroids_b) = run();
    assert_eq!(labels_a, labels_b);
    assert_eq!(centroids_a, centroids_b);
}

#[test]
fn empty_cluster_is_repaired() {
    let points = array![[0.0f64, 0.0], [0.0, 0.0], [0.0, 0.0]];
    let init = array![[0.0f64, 0.0], [10.0, 10.0]];
    let mut kmeans = KMeans::new(points.view()).with_max_iter(1);
    kmeans.cluster_from_centroids(init.view()).unwrap();

    let sizes: Vec<usize> = kmeans.cluster_point_indices().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 1]);
    assert_eq!(kmeans.cluster_point_indices()[1], vec![0]);
    assert!(kmeans.centroids().iter().all(|v| v.is_finite()));
}

#[test]
fn zero_max_iter_still_assigns() {
    let points = array![[0.0f32], [1.0], [9.0], [10.0]];
    let init = array![[0.0f32], [10.0]];
    let mut kmeans = KMeans::new(points.view()).with_max_iter(0);
    kmeans.cluster_from_centroids(init.view()).unwrap();

    assert_eq!(kmeans.status(), Status::MaxIterReached);
    assert_eq!(kmeans.iteration_count(), 0);
    assert_eq!(kmeans.centroids(), &init);
    assert_eq!(kmeans.cluster_index_map(), &[0, 0, 1, 1]);
    assert_eq!(kmeans.cluster_point_indices(), &[vec![0, 1], vec![2, 3]]);
}

#[test]
fn oversized_k_is_clamped_to_singletons() {
    let points = array![[0.0f64, 0.0], [1.0, 5.0], [2.0, -3.0], [7.0, 7.0], [-4.0, 1.0]];
    let mut kmeans = KMeans::new(points.view()).with_seed(3);
    kmeans.cluster(1000).unwrap();

    assert_eq!(kmeans.num_clusters(), 5);
    assert!(kmeans.cluster_point_indices().iter().all(|b| b.len() == 1));
    assert_partition(kmeans.cluster_point_indices(), 5);
}

#[test]
fn zero_clusters_rejected() {
    let points = array![[0.0f64, 0.0]];
    let mut kmeans = KMeans::new(points.view());
    assert!(matches!(
        kmeans.cluster(0),
        Err(Error::InvalidArgument { name: "k", .. })
    ));
}

#[test]
fn seeded_runs_repeat() {
    let points = three_clouds(30, 4);
    let run = |seed| {
        let mut kmeans = KMeans::new(points.view()).with_seed(seed);
        kmeans.cluster(3).unwrap();
        kmeans.cluster_index_map().to_vec()
    };
    assert_eq!(run(5), run(5));
}

/// Replays a fixed list of draws.
struct Scripted(Vec<usize>);

impl IndexSampler for Scripted {
    fn sample_index(&mut self, upper: usize) -> usize {
        self.0.remove(0) % upper
    }
}

#[test]
fn caller_supplied_sampler_picks_seed_points() {
    let points = three_clouds(10, 2);
    let mut kmeans = KMeans::new(points.view()).with_max_iter(0);
    // First draw picks row 0; row 0 is swapped to the back, then slot 10 is row 10.
    kmeans
        .cluster_with_sampler(2, &mut Scripted(vec![0, 10]))
        .unwrap();
    assert_eq!(kmeans.centroids().row(0), points.row(0));
    assert_eq!(kmeans.centroids().row(1), points.row(10));
}

#[test]
fn generic_metrics_partition_clouds() {
    let points = three_clouds(25, 6);
    let init = array![[5.0, 5.0], [90.0, 5.0], [5.0, 90.0]];

    let mut manhattan = KMeans::new(points.view()).with_metric(Manhattan);
    manhattan.cluster_from_centroids(init.view()).unwrap();

    let mut chebyshev = KMeans::new(points.view())
        .with_metric(Chebyshev)
        .with_accelerated_search(true);
    chebyshev.cluster_from_centroids(init.view()).unwrap();

    let root_metric = CustomMetric::new(|a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>| {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs().sqrt()).sum::<f64>()
    });
    let mut custom = KMeans::new(points.view())
        .with_metric(root_metric)
        .with_accelerated_search(true);
    custom.cluster_from_centroids(init.view()).unwrap();

    for labels in [
        manhattan.cluster_index_map(),
        chebyshev.cluster_index_map(),
        custom.cluster_index_map(),
    ] {
        for (i, &label) in labels.iter().enumerate() {
            assert_eq!(label, i / 25);
        }
    }
}

#[test]
fn custom_search_index_and_config() {
    let points = three_clouds(20, 8);
    let init = array![[0.0, 0.0], [100.0, 0.0], [0.0, 100.0]];
    let config = KMeansConfig {
        max_iter: 10,
        tol: 0.0,
        use_accelerated_search: true,
        seed: None,
    };
    let mut kmeans = KMeans::new(points.view())
        .with_config(config.clone())
        .with_search_index::<KdTree<f64, SquaredEuclidean>>();
    kmeans.cluster_from_centroids(init.view()).unwrap();

    assert_eq!(kmeans.config(), &config);
    assert_eq!(kmeans.status(), Status::ConvergedNoChange);
    assert_partition(kmeans.cluster_point_indices(), 60);
    assert!(kmeans.inertia() > 0.0);
}
