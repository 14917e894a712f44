//! Distance metrics over N-dimensional coordinates.

use crate::error::{ClueError, Result};

/// A distance over two coordinate vectors.
///
/// Implementations must be pure: the pipeline calls them concurrently and in
/// no particular order.
///
/// Neighbour searches scan an axis-aligned box of half-width `radius`, so a
/// metric only sees every neighbour if it never falls below the largest
/// per-axis difference (periodic axes excepted). Axis weights below 1 break this.
pub trait DistanceMetric<const N: usize>: Sync {
    fn distance(&self, a: &[f32; N], b: &[f32; N]) -> f32;
}

/// Absolute coordinate difference, folded onto a ring when `period > 0`.
#[inline]
fn axis_delta(a: f32, b: f32, period: f32) -> f32 {
    let d = (a - b).abs();
    if period > 0.0 {
        let d = d % period;
        d.min(period - d)
    } else {
        d
    }
}

fn check_period(period: f32) -> Result<f32> {
    if period.is_finite() && period > 0.0 {
        Ok(period)
    } else {
        Err(ClueError::InvalidParameter {
            name: "period",
            value: period as f64,
            reason: "must be finite and positive",
        })
    }
}

/// Euclidean distance, optionally periodic along selected axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EuclideanMetric<const N: usize> {
    /// Ring length per axis; 0 marks a non-periodic axis.
    periods: [f32; N],
}

impl<const N: usize> Default for EuclideanMetric<N> {
    fn default() -> Self {
        Self { periods: [0.0; N] }
    }
}

impl<const N: usize> EuclideanMetric<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metric with a ring length for each `Some` axis.
    pub fn periodic(periods: [Option<f32>; N]) -> Result<Self> {
        let mut metric = Self::default();
        for (dim, period) in periods.into_iter().enumerate() {
            if let Some(p) = period {
                metric.periods[dim] = check_period(p)?;
            }
        }
        Ok(metric)
    }

    /// Make axis `dim` periodic with ring length `period`.
    pub fn with_period(mut self, dim: usize, period: f32) -> Result<Self> {
        if dim >= N {
            return Err(ClueError::DimensionOutOfRange { dim, ndim: N });
        }
        self.periods[dim] = check_period(period)?;
        Ok(self)
    }

    /// Ring length of axis `dim`, if periodic.
    pub fn period(&self, dim: usize) -> Option<f32> {
        self.periods.get(dim).copied().filter(|&p| p > 0.0)
    }
}

impl<const N: usize> DistanceMetric<N> for EuclideanMetric<N> {
    #[inline]
    fn distance(&self, a: &[f32; N], b: &[f32; N]) -> f32 {
        let mut sum = 0.0f32;
        for d in 0..N {
            let delta = axis_delta(a[d], b[d], self.periods[d]);
            sum += delta * delta;
        }
        sum.sqrt()
    }
}

/// Euclidean distance with a non-negative weight per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedEuclideanMetric<const N: usize> {
    weights: [f32; N],
}

impl<const N: usize> WeightedEuclideanMetric<N> {
    pub fn new(weights: [f32; N]) -> Result<Self> {
        if let Some(&w) = weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
            return Err(ClueError::InvalidParameter {
                name: "axis weight",
                value: w as f64,
                reason: "must be finite and non-negative",
            });
        }
        Ok(Self { weights })
    }
}

impl<const N: usize> DistanceMetric<N> for WeightedEuclideanMetric<N> {
    #[inline]
    fn distance(&self, a: &[f32; N], b: &[f32; N]) -> f32 {
        let mut sum = 0.0f32;
        for d in 0..N {
            let delta = a[d] - b[d];
            sum += self.weights[d] * delta * delta;
        }
        sum.sqrt()
    }
}

/// L1 distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManhattanMetric;

impl<const N: usize> DistanceMetric<N> for ManhattanMetric {
    #[inline]
    fn distance(&self, a: &[f32; N], b: &[f32; N]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
    }
}

/// L∞ distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChebyshevMetric;

impl<const N: usize> DistanceMetric<N> for ChebyshevMetric {
    #[inline]
    fn distance(&self, a: &[f32; N], b: &[f32; N]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f32::max)
    }
}
