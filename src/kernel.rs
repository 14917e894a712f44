//! Convolutional kernels for local density.
//!
//! A kernel maps the distance between point `i` and a neighbour `j` to the
//! factor applied to `weight[j]`. Every kernel returns exactly `1.0` when
//! `i == j`, so an isolated point's density equals its own weight.

use crate::error::{ClueError, Result};

pub trait ConvolutionalKernel: Sync {
    fn weight(&self, distance: f32, i: usize, j: usize) -> f32;
}

fn check(name: &'static str, value: f32, ok: bool, reason: &'static str) -> Result<f32> {
    if ok && value.is_finite() {
        Ok(value)
    } else {
        Err(ClueError::InvalidParameter {
            name,
            value: value as f64,
            reason,
        })
    }
}

/// Constant contribution for every neighbour within range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatKernel {
    height: f32,
}

impl FlatKernel {
    pub fn new(height: f32) -> Result<Self> {
        let height = check("flat height", height, height >= 0.0, "must be non-negative")?;
        Ok(Self { height })
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

impl Default for FlatKernel {
    fn default() -> Self {
        Self { height: 0.5 }
    }
}

impl ConvolutionalKernel for FlatKernel {
    #[inline]
    fn weight(&self, _distance: f32, i: usize, j: usize) -> f32 {
        if i == j {
            1.0
        } else {
            self.height
        }
    }
}

/// `amplitude * exp(-avg * distance)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialKernel {
    avg: f32,
    amplitude: f32,
}

impl ExponentialKernel {
    pub fn new(avg: f32, amplitude: f32) -> Result<Self> {
        let avg = check("exponential avg", avg, avg >= 0.0, "must be non-negative")?;
        let amplitude = check(
            "exponential amplitude",
            amplitude,
            amplitude >= 0.0,
            "must be non-negative",
        )?;
        Ok(Self { avg, amplitude })
    }
}

impl ConvolutionalKernel for ExponentialKernel {
    #[inline]
    fn weight(&self, distance: f32, i: usize, j: usize) -> f32 {
        if i == j {
            1.0
        } else {
            self.amplitude * (-self.avg * distance).exp()
        }
    }
}

/// `amplitude * exp(-(distance - mean)^2 / (2 std^2))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianKernel {
    mean: f32,
    std: f32,
    amplitude: f32,
}

impl GaussianKernel {
    pub fn new(mean: f32, std: f32, amplitude: f32) -> Result<Self> {
        let mean = check("gaussian mean", mean, true, "must be finite")?;
        let std = check("gaussian std", std, std > 0.0, "must be positive")?;
        let amplitude = check(
            "gaussian amplitude",
            amplitude,
            amplitude >= 0.0,
            "must be non-negative",
        )?;
        Ok(Self {
            mean,
            std,
            amplitude,
        })
    }
}

impl ConvolutionalKernel for GaussianKernel {
    #[inline]
    fn weight(&self, distance: f32, i: usize, j: usize) -> f32 {
        if i == j {
            1.0
        } else {
            let z = distance - self.mean;
            self.amplitude * (-(z * z) / (2.0 * self.std * self.std)).exp()
        }
    }
}
