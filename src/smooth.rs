//! Smoothing strategies for velocity and rotation series.
//!
//! Three interchangeable strategies operate independently on each of the
//! three channels and preserve the series shape:
//!
//! - `interpolate`: refit the channel against the time axis with a
//!   nearest/linear/quadratic/cubic interpolant (`k` ∈ 0..=3) and
//!   re-evaluate at the same time points.
//! - `spline`: discrete smoothing spline: penalized least squares with a
//!   `k`-th order difference penalty weighted by the smoothing factor `s`,
//!   solved with a banded elimination.
//! - `average`: mean over the closed window `[i-k, i+k]`, clipped to the
//!   array bounds at both ends.

use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, Result};
use crate::math::interp::{interp_lagrange, interp_linear, interp_nearest};
use crate::series::Sample;

/// Selectable smoothing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingStrategy {
    Interpolate,
    Spline,
    Average,
}

/// Smoothing parameters for one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub strategy: SmoothingStrategy,
    /// Window half-width (`average`), interpolation degree (`interpolate`)
    /// or difference-penalty order (`spline`).
    pub k: usize,
    /// Smoothing factor; only the `spline` strategy uses it.
    pub s: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            strategy: SmoothingStrategy::Spline,
            k: 3,
            s: 0.8,
        }
    }
}

impl SmoothingConfig {
    /// Validate the parameters for the selected strategy.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::InvalidConfig`] for out-of-range
    /// parameters.
    pub fn validate(&self) -> Result<()> {
        match self.strategy {
            SmoothingStrategy::Interpolate => {
                if self.k > 3 {
                    return Err(ProcessingError::invalid_config(format!(
                        "interpolation degree must be 0..=3, got {}",
                        self.k
                    )));
                }
            }
            SmoothingStrategy::Spline => {
                if self.k == 0 || self.k > 4 {
                    return Err(ProcessingError::invalid_config(format!(
                        "spline penalty order must be 1..=4, got {}",
                        self.k
                    )));
                }
                if self.s < 0.0 {
                    return Err(ProcessingError::invalid_config(format!(
                        "smoothing factor must be non-negative, got {}",
                        self.s
                    )));
                }
            }
            SmoothingStrategy::Average => {}
        }
        Ok(())
    }
}

/// Smooth a triaxial series channel by channel, same shape in and out.
///
/// # Errors
///
/// Returns [`ProcessingError::LengthMismatch`] when time and samples
/// disagree and [`ProcessingError::InvalidConfig`] for bad parameters.
pub fn smooth(time: &[f64], samples: &[Sample], cfg: &SmoothingConfig) -> Result<Vec<Sample>> {
    if time.len() != samples.len() {
        return Err(ProcessingError::length_mismatch(time.len(), samples.len()));
    }
    cfg.validate()?;
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let mut out = vec![[0.0f64; 3]; samples.len()];
    for channel in 0..3 {
        let ys: Vec<f64> = samples.iter().map(|s| s[channel]).collect();
        let smoothed = match cfg.strategy {
            SmoothingStrategy::Interpolate => reinterpolate(time, &ys, cfg.k),
            SmoothingStrategy::Spline => whittaker_smooth(&ys, cfg.k, cfg.s),
            SmoothingStrategy::Average => window_average(&ys, cfg.k),
        };
        for (o, v) in out.iter_mut().zip(smoothed) {
            o[channel] = v;
        }
    }
    Ok(out)
}

/// Refit one channel against the time axis and re-evaluate at the same
/// points.
fn reinterpolate(time: &[f64], ys: &[f64], degree: usize) -> Vec<f64> {
    time.iter()
        .map(|&t| match degree {
            0 => interp_nearest(time, ys, t),
            1 => interp_linear(time, ys, t),
            _ => interp_lagrange(time, ys, t, degree),
        })
        .collect()
}

/// Clipped moving average over the closed window `[i-k, i+k]`.
fn window_average(ys: &[f64], k: usize) -> Vec<f64> {
    let n = ys.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(k);
            let hi = (i + k).min(n - 1);
            let window = &ys[lo..=hi];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

/// Discrete smoothing spline: minimize `Σ(ŷ−y)² + s·Σ(Δᵏŷ)²`.
///
/// The normal equations `(I + s·DᵀD)·ŷ = y` form a symmetric
/// positive-definite band matrix of bandwidth `k`, solved by banded
/// Gaussian elimination. `s = 0` and series shorter than `k + 1` samples
/// pass through unchanged.
fn whittaker_smooth(ys: &[f64], order: usize, s: f64) -> Vec<f64> {
    let n = ys.len();
    if s <= 0.0 || n <= order {
        return ys.to_vec();
    }

    let coeffs = difference_coefficients(order);
    let mut band = vec![vec![0.0f64; 2 * order + 1]; n];
    for row in &mut band {
        row[order] = 1.0;
    }
    for r in 0..n - order {
        for p in 0..=order {
            for q in 0..=order {
                let i = r + p;
                let j = r + q;
                band[i][order + j - i] += s * coeffs[p] * coeffs[q];
            }
        }
    }

    solve_banded(band, ys.to_vec(), order)
}

/// Coefficients of the k-th forward difference: `(-1)^m · C(k, m)`.
fn difference_coefficients(order: usize) -> Vec<f64> {
    let mut coeffs = Vec::with_capacity(order + 1);
    let mut binom = 1.0f64;
    for m in 0..=order {
        let sign = if m % 2 == 0 { 1.0 } else { -1.0 };
        coeffs.push(sign * binom);
        binom = binom * (order - m) as f64 / (m + 1) as f64;
    }
    coeffs
}

/// Solve a symmetric positive-definite band system.
///
/// `band[i][half + j - i]` holds `A[i][j]` for `|j − i| <= half`.
fn solve_banded(mut band: Vec<Vec<f64>>, mut rhs: Vec<f64>, half: usize) -> Vec<f64> {
    let n = rhs.len();

    for i in 0..n {
        let pivot = band[i][half];
        for r in i + 1..(i + half + 1).min(n) {
            let factor = band[r][half - (r - i)] / pivot;
            if factor == 0.0 {
                continue;
            }
            for c in i..=(i + half).min(n - 1) {
                let update = factor * band[i][half + c - i];
                band[r][half + c - r] -= update;
            }
            rhs[r] -= factor * rhs[i];
        }
    }

    let mut x = vec![0.0f64; n];
    for i in (0..n).rev() {
        let mut acc = rhs[i];
        for c in i + 1..=(i + half).min(n - 1) {
            acc -= band[i][half + c - i] * x[c];
        }
        x[i] = acc / band[i][half];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn constant_series(n: usize, value: f64) -> (Vec<f64>, Vec<Sample>) {
        let time: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let samples = vec![[value, -value, 2.0 * value]; n];
        (time, samples)
    }

    #[test]
    fn test_average_k0_is_identity() {
        let time = vec![0.0, 1.0, 2.0, 3.0];
        let samples = vec![
            [1.0, -1.0, 0.5],
            [2.0, -2.0, 1.5],
            [3.0, -3.0, 2.5],
            [4.0, -4.0, 3.5],
        ];
        let cfg = SmoothingConfig {
            strategy: SmoothingStrategy::Average,
            k: 0,
            s: 0.0,
        };
        let out = smooth(&time, &samples, &cfg).unwrap();
        assert_eq!(out, samples);
    }

    #[test]
    fn test_average_clips_windows_at_edges() {
        let ys = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = window_average(&ys, 2);
        // First index averages [0..=2], last averages [2..=4].
        assert_relative_eq!(out[0], 2.0);
        assert_relative_eq!(out[4], 4.0);
        // Interior index averages the full 2k+1 window.
        assert_relative_eq!(out[2], 3.0);
    }

    #[test]
    fn test_interpolate_preserves_values_at_sample_points() {
        let time = vec![0.0, 0.5, 1.25, 2.0, 3.0];
        let samples: Vec<Sample> = time
            .iter()
            .map(|&t| [t * t, (t * 2.0_f64).sin(), -t])
            .collect();
        for k in 0..=3 {
            let cfg = SmoothingConfig {
                strategy: SmoothingStrategy::Interpolate,
                k,
                s: 0.0,
            };
            let out = smooth(&time, &samples, &cfg).unwrap();
            for (o, s) in out.iter().zip(samples.iter()) {
                for c in 0..3 {
                    assert_relative_eq!(o[c], s[c], epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_interpolate_degree_out_of_range() {
        let (time, samples) = constant_series(4, 1.0);
        let cfg = SmoothingConfig {
            strategy: SmoothingStrategy::Interpolate,
            k: 4,
            s: 0.0,
        };
        assert!(matches!(
            smooth(&time, &samples, &cfg),
            Err(ProcessingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_spline_preserves_constant_series() {
        let (time, samples) = constant_series(20, 3.25);
        for s in [0.1, 0.8, 100.0] {
            let cfg = SmoothingConfig {
                strategy: SmoothingStrategy::Spline,
                k: 2,
                s,
            };
            let out = smooth(&time, &samples, &cfg).unwrap();
            for o in &out {
                assert_relative_eq!(o[0], 3.25, epsilon = 1e-9);
                assert_relative_eq!(o[1], -3.25, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_spline_reduces_noise() {
        let n = 64;
        let time: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
        // Alternating noise around a linear ramp.
        let samples: Vec<Sample> = (0..n)
            .map(|i| {
                let noise = if i % 2 == 0 { 0.2 } else { -0.2 };
                [i as f64 * 0.05 + noise, 0.0, 0.0]
            })
            .collect();
        let cfg = SmoothingConfig {
            strategy: SmoothingStrategy::Spline,
            k: 2,
            s: 10.0,
        };
        let out = smooth(&time, &samples, &cfg).unwrap();

        let roughness = |data: &[Sample]| -> f64 {
            data.windows(2).map(|w| (w[1][0] - w[0][0]).abs()).sum()
        };
        assert!(roughness(&out) < roughness(&samples) / 2.0);
    }

    #[test]
    fn test_spline_s_zero_is_identity() {
        let (time, mut samples) = constant_series(8, 1.0);
        samples[3] = [9.0, -9.0, 9.0];
        let cfg = SmoothingConfig {
            strategy: SmoothingStrategy::Spline,
            k: 2,
            s: 0.0,
        };
        let out = smooth(&time, &samples, &cfg).unwrap();
        assert_eq!(out, samples);
    }

    #[test]
    fn test_spline_order_out_of_range() {
        let cfg = SmoothingConfig {
            strategy: SmoothingStrategy::Spline,
            k: 0,
            s: 0.8,
        };
        assert!(cfg.validate().is_err());
        let cfg = SmoothingConfig {
            strategy: SmoothingStrategy::Spline,
            k: 5,
            s: 0.8,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_length_mismatch() {
        let cfg = SmoothingConfig::default();
        let result = smooth(&[0.0, 1.0], &[[0.0; 3]], &cfg);
        assert!(matches!(
            result,
            Err(ProcessingError::LengthMismatch { .. })
        ));
    }
}
