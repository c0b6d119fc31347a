//! Synchronization of two independently sampled series.
//!
//! The accelerometer and gyroscope record on their own clocks and usually
//! produce different sample counts over the same physical window. The pair
//! is aligned onto the shorter series' time vector; the longer series is
//! resampled onto it by per-channel linear interpolation.

use crate::error::{ProcessingError, Result};
use crate::math::interp::resample_samples_linear;
use crate::series::{Sample, SensorSeries};

/// A synchronized pair of series on a common time vector.
#[derive(Debug, Clone)]
pub struct SynchronizedPair {
    pub time: Vec<f64>,
    pub first: Vec<Sample>,
    pub second: Vec<Sample>,
}

/// Align two series onto a common time vector.
///
/// The common vector is the shorter input's; with equal lengths the second
/// input's time vector is kept by convention. The series already on the
/// common grid passes through unchanged.
///
/// # Errors
///
/// Returns an error if either series is empty.
pub fn synchronize(first: &SensorSeries, second: &SensorSeries) -> Result<SynchronizedPair> {
    if first.is_empty() || second.is_empty() {
        return Err(ProcessingError::invalid_input(
            "cannot synchronize an empty series",
        ));
    }

    if first.len() < second.len() {
        let time = first.time().to_vec();
        let resampled = resample_samples_linear(second.time(), second.samples(), &time);
        Ok(SynchronizedPair {
            first: first.samples().to_vec(),
            second: resampled,
            time,
        })
    } else {
        let time = second.time().to_vec();
        let resampled = resample_samples_linear(first.time(), first.samples(), &time);
        Ok(SynchronizedPair {
            first: resampled,
            second: second.samples().to_vec(),
            time,
        })
    }
}
