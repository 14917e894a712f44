//! End-to-end clustering results checked against brute force and known layouts.

mod support;

use clue_tiles::{
    validate_clustering, Clusterer, ClusteringParams, DistanceMetric, EuclideanMetric,
    ExponentialKernel, FlatKernel, GaussianKernel, PointsHost, RunOptions, SerialExecutor, NONE,
    UNASSIGNED,
};
use support::points::{grid_points, ring_points, two_blobs, uniform_points, unit_weight_host};

/// Density of every point by direct summation with the flat kernel.
fn brute_force_rho<const N: usize, M: DistanceMetric<N>>(
    rows: &[[f32; N]],
    metric: &M,
    dc: f32,
) -> Vec<f32> {
    (0..rows.len())
        .map(|i| {
            let mut rho = 0.0f32;
            for j in 0..rows.len() {
                if metric.distance(&rows[i], &rows[j]) <= dc {
                    rho += if i == j { 1.0 } else { 0.5 };
                }
            }
            rho
        })
        .collect()
}

/// Nearest-higher links by scanning every pair.
fn brute_force_nh<const N: usize, M: DistanceMetric<N>>(
    rows: &[[f32; N]],
    rho: &[f32],
    metric: &M,
    dm: f32,
) -> Vec<i32> {
    (0..rows.len())
        .map(|i| {
            let mut best = (f32::MAX, NONE);
            for j in 0..rows.len() {
                let higher = rho[j] > rho[i] || (rho[j] == rho[i] && rho[j] > 0.0 && j > i);
                if !higher {
                    continue;
                }
                let d = metric.distance(&rows[i], &rows[j]);
                // Ascending scan, so only a strictly closer point replaces the best.
                if d <= dm && d < best.0 {
                    best = (d, j as i32);
                }
            }
            best.1
        })
        .collect()
}

#[test]
fn test_two_separated_blobs() {
    let (rows, truth) = two_blobs(1000, 50.0, 1.0, 7);
    let mut points = unit_weight_host(&rows);

    let params = ClusteringParams::new(1.0, 5.0)
        .and_then(|p| p.with_dm(5.0))
        .and_then(|p| p.with_seed_dc(5.0))
        .unwrap();
    let mut clusterer = Clusterer::<2>::with_params(params, Default::default()).unwrap();
    clusterer.run(&mut points).unwrap();

    assert_eq!(points.n_seeds(), 2, "one seed per blob");
    assert_eq!(points.n_clusters().unwrap(), 2);
    let labels = points.cluster_indexes().unwrap();
    assert!(
        labels.iter().all(|&c| c != UNASSIGNED),
        "every point should reach a seed within dm = 5"
    );

    let label_a = labels[0];
    let label_b = labels[1000];
    assert_ne!(label_a, label_b);
    for (i, &blob) in truth.iter().enumerate() {
        let expected = if blob == 0 { label_a } else { label_b };
        assert_eq!(labels[i], expected, "point {} left its blob", i);
    }

    let clusters = clusterer.clusters(&points).unwrap();
    assert_eq!(clusters.size(), 2);
    assert_eq!(clusters.bin(0).len(), 1000);
    assert_eq!(clusters.bin(1).len(), 1000);
}

#[test]
fn test_blobs_never_merge_with_short_links() {
    // Short links leave sparse tails unassigned but never split or merge blobs.
    let (rows, truth) = two_blobs(1000, 50.0, 2.0, 11);
    let mut points = unit_weight_host(&rows);
    let mut clusterer = Clusterer::<2>::new(1.0, 5.0).unwrap();
    clusterer.run(&mut points).unwrap();

    let labels = points.cluster_indexes().unwrap();
    let n_clusters = points.n_clusters().unwrap();
    assert_eq!(n_clusters, 2, "expected exactly one cluster per blob");

    let mut blob_of_cluster = vec![None; n_clusters];
    for (i, &c) in labels.iter().enumerate() {
        if c == UNASSIGNED {
            continue;
        }
        let slot = &mut blob_of_cluster[c as usize];
        match *slot {
            None => *slot = Some(truth[i]),
            Some(b) => assert_eq!(b, truth[i], "cluster {} spans both blobs", c),
        }
    }
    assert!(blob_of_cluster.iter().all(Option::is_some));

    // Only sparse tail points may stay unassigned.
    let clusters = clusterer.clusters(&points).unwrap();
    for (id, members) in clusters.iter_bins() {
        assert!(members.len() >= 950, "cluster {} has {} points", id, members.len());
    }

    let report = validate_clustering(&points).unwrap();
    assert!(report.is_valid(), "{}", report);
}

#[test]
fn test_isolated_point_is_noise() {
    let (mut rows, _) = two_blobs(200, 0.0, 1.0, 3);
    rows.truncate(200);
    rows.push([1000.0, 0.0]);
    let mut weights = vec![1.0; rows.len()];
    weights[200] = 3.0;
    let mut points = PointsHost::from_rows(&rows, &weights).unwrap();

    let mut clusterer = Clusterer::<2>::new(1.0, 5.0).unwrap();
    clusterer.run(&mut points).unwrap();

    // Only the self contribution counts.
    assert_eq!(points.rho()[200], 3.0);
    assert_eq!(points.nearest_higher()[200], NONE);
    assert!(!points.is_seed()[200]);
    assert_eq!(points.cluster_indexes().unwrap()[200], UNASSIGNED);
}

#[test]
fn test_self_contribution_for_every_kernel() {
    let rows = [[0.0f32, 0.0], [100.0, 0.0], [0.0, 100.0]];
    let weights = [2.5f32, 0.75, 1.0];
    let options = RunOptions::default();
    let metric = EuclideanMetric::new();

    let mut clusterer = Clusterer::<2>::new(1.0, 1.0).unwrap();
    let check = |kernel_rho: Vec<f32>, name: &str| {
        assert_eq!(kernel_rho, weights.to_vec(), "{} kernel", name);
    };

    let mut points = PointsHost::from_rows(&rows, &weights).unwrap();
    clusterer
        .run_with(&mut points, &metric, &FlatKernel::new(0.2).unwrap(), &options)
        .unwrap();
    check(points.rho().to_vec(), "flat");

    clusterer
        .run_with(&mut points, &metric, &ExponentialKernel::new(1.0, 3.0).unwrap(), &options)
        .unwrap();
    check(points.rho().to_vec(), "exponential");

    clusterer
        .run_with(&mut points, &metric, &GaussianKernel::new(0.0, 1.0, 3.0).unwrap(), &options)
        .unwrap();
    check(points.rho().to_vec(), "gaussian");

    // Weights 2.5 and 1.0 clear rhoc; 0.75 does not.
    assert_eq!(points.is_seed(), &[true, false, true]);
    assert_eq!(points.n_clusters().unwrap(), 2);
}

#[test]
fn test_density_and_links_match_brute_force() {
    let rows = uniform_points::<3>(3000, 0.0, 1.0, 42);
    let mut points = unit_weight_host(&rows);
    let (dc, dm) = (0.08f32, 0.15f32);
    let params = ClusteringParams::new(dc, 3.0)
        .and_then(|p| p.with_dm(dm))
        .and_then(|p| p.with_points_per_tile(16))
        .unwrap();
    let mut clusterer = Clusterer::<3>::with_params(params, Default::default()).unwrap();
    clusterer.run(&mut points).unwrap();

    let metric = EuclideanMetric::new();
    let rho = brute_force_rho(&rows, &metric, dc);
    assert_eq!(points.rho(), rho.as_slice());

    let mut nh = brute_force_nh(&rows, &rho, &metric, dm);
    for (i, &seed) in points.is_seed().iter().enumerate() {
        if seed {
            nh[i] = NONE;
        }
    }
    assert_eq!(points.nearest_higher(), nh.as_slice());

    let report = validate_clustering(&points).unwrap();
    assert!(report.is_valid(), "{}", report);
    assert_eq!(report.num_clusters, report.num_seeds);
}

#[test]
fn test_periodic_axis_joins_boundary_points() {
    let rows = [[0.1f32], [9.9], [5.0]];
    let metric = EuclideanMetric::periodic([Some(10.0)]).unwrap();
    let options = RunOptions::default();

    let mut points = unit_weight_host(&rows);
    let mut clusterer = Clusterer::<1>::new(0.5, 1.2).unwrap();
    clusterer.set_wrapped_coordinates([true]);
    clusterer
        .run_with(&mut points, &metric, &FlatKernel::default(), &options)
        .unwrap();

    assert_eq!(points.rho(), &[1.5, 1.5, 1.0]);
    assert_eq!(points.nearest_higher(), &[1, NONE, NONE]);
    assert_eq!(points.cluster_indexes().unwrap(), &[0, 0, UNASSIGNED]);

    // Without wrapping the two ends never see each other.
    let mut flat = unit_weight_host(&rows);
    let mut plain = Clusterer::<1>::new(0.5, 1.2).unwrap();
    plain.run(&mut flat).unwrap();
    assert_eq!(flat.rho(), &[1.0, 1.0, 1.0]);
    assert_eq!(flat.n_clusters().unwrap(), 0);
    assert_eq!(plain.clusters(&flat).unwrap().size(), 0);
}

#[test]
fn test_periodic_density_matches_brute_force() {
    let rows = ring_points(2000, 10.0, 5);
    let metric = EuclideanMetric::periodic([Some(10.0)]).unwrap();
    let dc = 0.05;

    let mut points = unit_weight_host(&rows);
    let params = ClusteringParams::new(dc, 2.0)
        .and_then(|p| p.with_points_per_tile(32))
        .unwrap();
    let mut clusterer = Clusterer::<1>::with_params(params, Default::default()).unwrap();
    clusterer.set_wrapped_coordinates([true]);
    clusterer
        .run_with(&mut points, &metric, &FlatKernel::default(), &RunOptions::default())
        .unwrap();

    assert_eq!(points.rho(), brute_force_rho(&rows, &metric, dc).as_slice());
    let report = validate_clustering(&points).unwrap();
    assert!(report.is_valid(), "{}", report);
}

#[test]
fn test_serial_and_parallel_agree() {
    let rows = uniform_points::<2>(5000, 0.0, 10.0, 99);
    let params = ClusteringParams::new(0.2, 3.0)
        .and_then(|p| p.with_dm(0.4))
        .unwrap();

    let mut serial_points = unit_weight_host(&rows);
    let mut serial = Clusterer::<2, SerialExecutor>::with_params(params, SerialExecutor).unwrap();
    serial.run(&mut serial_points).unwrap();

    let mut parallel_points = unit_weight_host(&rows);
    let mut parallel = Clusterer::<2>::with_params(params, Default::default()).unwrap();
    parallel.run(&mut parallel_points).unwrap();

    assert_eq!(serial_points.rho(), parallel_points.rho());
    assert_eq!(serial_points.nearest_higher(), parallel_points.nearest_higher());
    assert_eq!(serial.seeds(), parallel.seeds());
    assert_eq!(
        serial_points.cluster_indexes().unwrap(),
        parallel_points.cluster_indexes().unwrap()
    );

    // A second run on the same instance reproduces the first.
    let first = parallel_points.cluster_indexes().unwrap().to_vec();
    parallel.run(&mut parallel_points).unwrap();
    assert_eq!(parallel_points.cluster_indexes().unwrap(), first.as_slice());
}

#[cfg(feature = "parallel")]
#[test]
fn test_dedicated_pool_agrees() {
    use clue_tiles::RayonExecutor;

    let rows = uniform_points::<2>(4000, 0.0, 5.0, 17);
    let params = ClusteringParams::new(0.15, 2.5).unwrap();

    let mut a = unit_weight_host(&rows);
    Clusterer::<2, SerialExecutor>::with_params(params, SerialExecutor)
        .unwrap()
        .run(&mut a)
        .unwrap();

    let mut b = unit_weight_host(&rows);
    let pool = RayonExecutor::with_threads(3).unwrap();
    Clusterer::<2, RayonExecutor>::with_params(params, pool)
        .unwrap()
        .run(&mut b)
        .unwrap();

    assert_eq!(a.cluster_indexes().unwrap(), b.cluster_indexes().unwrap());
}

#[test]
fn test_seed_inside_link_range() {
    // dm > seed_dc: point 0 links to point 1 yet is far enough to be a seed.
    let rows = [[0.0f32], [1.0]];
    let mut points = PointsHost::from_rows(&rows, &[1.0, 3.0]).unwrap();
    let params = ClusteringParams::new(0.5, 0.5)
        .and_then(|p| p.with_dm(2.0))
        .unwrap();
    let mut clusterer = Clusterer::<1>::with_params(params, Default::default()).unwrap();
    clusterer.run(&mut points).unwrap();

    assert_eq!(points.is_seed(), &[true, true]);
    assert_eq!(points.nearest_higher(), &[NONE, NONE]);
    assert_eq!(clusterer.seeds(), &[0, 1]);
    assert_eq!(points.cluster_indexes().unwrap(), &[0, 1]);
}

#[test]
fn test_seed_ids_follow_point_order() {
    // Isolated dense points: each is its own seed and cluster.
    let rows = grid_points::<2>(6, 10.0);
    let mut points = PointsHost::from_rows(&rows, &vec![2.0; rows.len()]).unwrap();
    let mut clusterer = Clusterer::<2>::new(1.0, 1.0).unwrap();
    clusterer.run(&mut points).unwrap();

    let expected: Vec<u32> = (0..36).collect();
    assert_eq!(clusterer.seeds(), expected.as_slice());
    let labels: Vec<i32> = (0..36).collect();
    assert_eq!(points.cluster_indexes().unwrap(), labels.as_slice());
    assert_eq!(clusterer.clusters(&points).unwrap().size(), 36);
}

#[test]
fn test_reuse_across_sizes() {
    let mut clusterer = Clusterer::<2>::new(0.3, 2.0).unwrap();
    for (n, seed) in [(1000usize, 1u64), (10, 2), (5000, 3), (700, 4)] {
        let rows = uniform_points::<2>(n, 0.0, 10.0, seed);
        let mut points = unit_weight_host(&rows);
        clusterer.run(&mut points).unwrap();

        let report = validate_clustering(&points).unwrap();
        assert!(report.is_valid(), "n = {}: {}", n, report);
        assert_eq!(report.num_points, n);
        assert_eq!(clusterer.seeds().len(), report.num_seeds);
        assert_eq!(
            points.rho(),
            brute_force_rho(&rows, &EuclideanMetric::new(), 0.3).as_slice(),
            "n = {}",
            n
        );
    }
}
