//! Angular rate to angular velocity and absolute orientation.
//!
//! Three modes cover the uses downstream: `velocity` for energy
//! computation, `absolute` for frame correction, `combined` for paired
//! trials that need both.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::config::GyroscopeConfig;
use crate::error::{ProcessingError, Result};
use crate::series::Sample;
use crate::signal::{check_amplitude, quantize, timestep};
use crate::smooth::smooth;

/// What the rotation engine computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    /// Smoothed angular velocity only.
    Velocity,
    /// Absolute orientation angles only.
    Absolute,
    /// Both, with the orientation integrated from the smoothed rate.
    Combined,
}

/// Output of the rotation engine; fields are present per the mode.
#[derive(Debug, Clone)]
pub struct RotationOutput {
    /// Smoothed angular velocity, rad/s.
    pub angular_velocity: Option<Vec<Sample>>,
    /// Absolute rotation angles, each component of magnitude `[0, 2π)`
    /// with the sign of the accumulated angle.
    pub orientation: Option<Vec<Sample>>,
    /// Δt series used for the integration.
    pub dt: Vec<f64>,
}

/// Convert a raw angular-rate series per the configured mode.
///
/// # Errors
///
/// Returns [`ProcessingError::SignalTooSmall`] when the rate does not rise
/// above 25× the error threshold, plus length/config errors from the
/// smoothing stage.
pub fn compute_rotation(
    rate: &[Sample],
    time: &[f64],
    cfg: &GyroscopeConfig,
    mode: RotationMode,
) -> Result<RotationOutput> {
    if rate.len() != time.len() {
        return Err(ProcessingError::length_mismatch(time.len(), rate.len()));
    }
    if rate.is_empty() {
        return Err(ProcessingError::invalid_input(
            "cannot process an empty angular-rate series",
        ));
    }

    let mut w = rate.to_vec();
    w[0] = cfg.initial_rotation;
    check_amplitude(&w, cfg.error)?;

    if cfg.in_degrees {
        for s in &mut w {
            for c in s.iter_mut() {
                *c = c.to_radians();
            }
        }
    }
    let w = quantize(&w, cfg.error);
    let dt = timestep(time);

    match mode {
        RotationMode::Velocity => {
            let smoothed = smooth(time, &w, &cfg.smoothing)?;
            Ok(RotationOutput {
                angular_velocity: Some(smoothed),
                orientation: None,
                dt,
            })
        }
        RotationMode::Absolute => {
            let angle = integrate_rate(&w, &dt);
            let angle = smooth(time, &angle, &cfg.smoothing)?;
            Ok(RotationOutput {
                angular_velocity: None,
                orientation: Some(wrap_angles(angle)),
                dt,
            })
        }
        RotationMode::Combined => {
            let smoothed = smooth(time, &w, &cfg.smoothing)?;
            let angle = integrate_rate(&smoothed, &dt);
            Ok(RotationOutput {
                angular_velocity: Some(smoothed),
                orientation: Some(wrap_angles(angle)),
                dt,
            })
        }
    }
}

/// Cumulative integration of the rate into absolute angles.
fn integrate_rate(rate: &[Sample], dt: &[f64]) -> Vec<Sample> {
    let mut angle = vec![[0.0f64; 3]; rate.len()];
    let mut acc = [0.0f64; 3];
    for (n, sample) in rate.iter().enumerate() {
        for c in 0..3 {
            acc[c] += sample[c] * dt[n];
            angle[n][c] = acc[c];
        }
    }
    angle
}

/// Wrap each component to magnitude `[0, 2π)`, preserving the sign of the
/// accumulated angle.
fn wrap_angles(angles: Vec<Sample>) -> Vec<Sample> {
    angles
        .into_iter()
        .map(|a| [wrap_angle(a[0]), wrap_angle(a[1]), wrap_angle(a[2])])
        .collect()
}

fn wrap_angle(x: f64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    x.signum() * (x.abs() % TAU)
}
