//! Synthetic sample clouds shared by the integration tests

#![allow(dead_code)]

use nalgebra::{Matrix3, Vector3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use sphere_cal::{SampleMatrix, SampleMatrixExt};
use std::f64::consts::PI;

/// Evenly spread unit directions (Fibonacci lattice)
pub fn fibonacci_directions(n: usize) -> Vec<Vector3<f64>> {
    let golden = PI * (3.0 - 5.0_f64.sqrt());
    (0..n)
        .map(|i| {
            let z = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
            let r = (1.0 - z * z).sqrt();
            let phi = golden * i as f64;
            Vector3::new(r * phi.cos(), r * phi.sin(), z)
        })
        .collect()
}

/// Axis-aligned ellipsoid surface samples
pub fn ellipsoid(n: usize, center: Vector3<f64>, radii: Vector3<f64>) -> SampleMatrix {
    let points: Vec<_> = fibonacci_directions(n)
        .into_iter()
        .map(|u| center + u.component_mul(&radii))
        .collect();
    SampleMatrix::from_points(&points)
}

/// Sphere of radius `radius` pushed through `distortion` and shifted by `offset`
pub fn distorted_sphere(
    n: usize,
    radius: f64,
    distortion: Matrix3<f64>,
    offset: Vector3<f64>,
) -> SampleMatrix {
    let points: Vec<_> = fibonacci_directions(n)
        .into_iter()
        .map(|u| distortion * u * radius + offset)
        .collect();
    SampleMatrix::from_points(&points)
}

/// Uniformly distributed points on the unit sphere from a seeded generator
pub fn random_directions(n: usize, seed: u64) -> Vec<Vector3<f64>> {
    let mut rng = Pcg64::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let z: f64 = rng.random_range(-1.0..1.0);
            let phi: f64 = rng.random_range(-PI..PI);
            let r = (1.0 - z * z).sqrt();
            Vector3::new(r * phi.cos(), r * phi.sin(), z)
        })
        .collect()
}

/// Add uniform noise of half-width `amplitude` to every coordinate
pub fn with_noise(samples: &SampleMatrix, amplitude: f64, seed: u64) -> SampleMatrix {
    let mut rng = Pcg64::seed_from_u64(seed);
    samples.map(|v| v + rng.random_range(-amplitude..amplitude))
}

/// Readings concentrated around a single orientation
pub fn cluster(n: usize, direction: Vector3<f64>, spread: f64, seed: u64) -> Vec<Vector3<f64>> {
    let mut rng = Pcg64::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let jitter = Vector3::new(
                rng.random_range(-spread..spread),
                rng.random_range(-spread..spread),
                rng.random_range(-spread..spread),
            );
            (direction + jitter).normalize()
        })
        .collect()
}
