#![allow(dead_code)]

use clue_tiles::PointsHost;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

/// `n` points from an isotropic Gaussian around `center`.
pub fn gaussian_blob<const N: usize, R: Rng + ?Sized>(
    n: usize,
    center: [f32; N],
    sigma: f32,
    rng: &mut R,
) -> Vec<[f32; N]> {
    let normal = Normal::new(0.0, sigma).unwrap();
    (0..n)
        .map(|_| std::array::from_fn(|d| center[d] + normal.sample(rng)))
        .collect()
}

/// Two 2-D Gaussian blobs `separation` apart along x.
///
/// Returns the points and, per point, the blob it was drawn from.
pub fn two_blobs(
    n_per_blob: usize,
    separation: f32,
    sigma: f32,
    seed: u64,
) -> (Vec<[f32; 2]>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut points = gaussian_blob(n_per_blob, [0.0, 0.0], sigma, &mut rng);
    points.extend(gaussian_blob(n_per_blob, [separation, 0.0], sigma, &mut rng));
    let truth = (0..2 * n_per_blob).map(|i| i / n_per_blob).collect();
    (points, truth)
}

/// `n` points uniform in the box `[lo, hi)^N`.
pub fn uniform_points<const N: usize>(n: usize, lo: f32, hi: f32, seed: u64) -> Vec<[f32; N]> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| std::array::from_fn(|_| rng.gen_range(lo..hi)))
        .collect()
}

/// `n` positions uniform on a ring `[0, circumference)`.
pub fn ring_points(n: usize, circumference: f32, seed: u64) -> Vec<[f32; 1]> {
    uniform_points(n, 0.0, circumference, seed)
}

/// Points on a regular grid with `per_dim` points per axis, `spacing` apart.
pub fn grid_points<const N: usize>(per_dim: usize, spacing: f32) -> Vec<[f32; N]> {
    let total = per_dim.pow(N as u32);
    (0..total)
        .map(|mut idx| {
            let mut p = [0.0f32; N];
            for d in (0..N).rev() {
                p[d] = (idx % per_dim) as f32 * spacing;
                idx /= per_dim;
            }
            p
        })
        .collect()
}

/// Host store with unit weights.
pub fn unit_weight_host<const N: usize>(rows: &[[f32; N]]) -> PointsHost<N> {
    PointsHost::from_rows(rows, &vec![1.0; rows.len()]).expect("rows and weights agree")
}
