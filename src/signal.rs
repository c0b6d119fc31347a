//! Noise quantization, time-step derivation and the amplitude floor check.

use crate::error::{ProcessingError, Result};
use crate::series::Sample;

/// A signal must exceed this multiple of the error threshold to be usable.
pub const AMPLITUDE_FLOOR_FACTOR: f64 = 25.0;

/// Substitute threshold when the configured error is zero or negative.
pub const MIN_ERROR_THRESHOLD: f64 = 1e-5;

/// The error threshold actually applied: non-positive values are clamped to
/// [`MIN_ERROR_THRESHOLD`] so quantization stays well-defined.
#[must_use]
pub fn effective_error(err: f64) -> f64 {
    if err > 0.0 {
        err
    } else {
        MIN_ERROR_THRESHOLD
    }
}

/// Quantize one value: round its magnitude down to the nearest multiple of
/// the error threshold, preserving sign.
#[must_use]
pub fn quantize_value(x: f64, err: f64) -> f64 {
    let err = effective_error(err);
    // The small offset guards against a one-ulp drop of the quotient when an
    // already-quantized value is quantized again; idempotence must hold.
    let steps = (x.abs() / err + 1e-9).floor();
    steps * err * x.signum()
}

/// Quantize a triaxial series element-wise.
#[must_use]
pub fn quantize(samples: &[Sample], err: f64) -> Vec<Sample> {
    samples
        .iter()
        .map(|s| {
            [
                quantize_value(s[0], err),
                quantize_value(s[1], err),
                quantize_value(s[2], err),
            ]
        })
        .collect()
}

/// Per-sample Δt series: the constant `t[last] / len(t)` broadcast to every
/// sample.
///
/// This assumes uniform sampling; with a non-uniform recording the
/// integrators inherit the resulting error.
#[must_use]
pub fn timestep(time: &[f64]) -> Vec<f64> {
    match time.last() {
        None => Vec::new(),
        Some(&last) => {
            let step = last / time.len() as f64;
            vec![step; time.len()]
        }
    }
}

/// Check that the signal rises above the noise floor.
///
/// # Errors
///
/// Returns [`ProcessingError::SignalTooSmall`] when the maximum absolute
/// component does not exceed [`AMPLITUDE_FLOOR_FACTOR`] times the effective
/// error threshold.
pub fn check_amplitude(samples: &[Sample], err: f64) -> Result<()> {
    let max = samples
        .iter()
        .flatten()
        .fold(0.0f64, |acc, &v| acc.max(v.abs()));
    let threshold = AMPLITUDE_FLOOR_FACTOR * effective_error(err);
    if max <= threshold {
        return Err(ProcessingError::signal_too_small(max, threshold));
    }
    Ok(())
}
