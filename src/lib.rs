//! Kinergy
//!
//! Batch conversion of raw inertial-sensor trials (triaxial accelerometer
//! and gyroscope CSV recordings of an instrumented ball) into physical
//! quantities: velocity, absolute rotation, 3-D trajectory and
//! translational/rotational/kinetic energy over time, with cross-trial
//! energy aggregation.
//!
//! # Pipeline
//!
//! 1. [`reader`] loads one trial file, merging duplicate timestamps.
//! 2. [`sync`] aligns an accelerometer/gyroscope pair onto a common grid.
//! 3. [`signal`] quantizes sensor noise and derives the Δt series.
//! 4. [`velocity`] / [`rotation`] integrate the calibrated samples, each
//!    smoothing through [`smooth`].
//! 5. [`trajectory`] optionally integrates the velocity into positions.
//! 6. [`energy`] computes per-trial energies and merges trials of the same
//!    setup into averaged curves.
//!
//! The [`batch`] module runs many trials on a worker pool; [`config`],
//! [`output`] and the `kinergy` binary wrap the pipeline for batch use.
//!
//! # Quick Start
//!
//! ```
//! use kinergy::config::AccelerometerConfig;
//! use kinergy::smooth::{SmoothingConfig, SmoothingStrategy};
//! use kinergy::velocity::compute_velocity;
//!
//! let time = [0.0, 1.0, 2.0, 3.0, 4.0];
//! let accel = [[0.0, 0.0, 9.81]; 5];
//! let config = AccelerometerConfig {
//!     error: 0.01,
//!     in_g: false,
//!     gravity_interfered: false,
//!     smoothing: SmoothingConfig {
//!         strategy: SmoothingStrategy::Average,
//!         k: 0,
//!         s: 0.0,
//!     },
//!     ..AccelerometerConfig::default()
//! };
//!
//! let (velocity, dt) = compute_velocity(&accel, &time, &config, None)?;
//! assert_eq!(velocity.len(), time.len());
//! assert_eq!(dt.len(), time.len());
//! # Ok::<(), kinergy::ProcessingError>(())
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]

pub mod batch;
pub mod config;
pub mod energy;
pub mod error;
pub mod math;
pub mod output;
pub mod reader;
pub mod rotation;
pub mod series;
pub mod signal;
pub mod smooth;
pub mod sync;
pub mod trajectory;
pub mod velocity;

// Re-exports for convenient access
pub use config::PipelineConfig;
pub use energy::{EnergyAggregator, EnergyCategory, EnergyRecord};
pub use error::{ProcessingError, Result};
pub use rotation::{compute_rotation, RotationMode};
pub use series::{Measurement, Sample, SensorSeries, Trial};
pub use smooth::{SmoothingConfig, SmoothingStrategy};
pub use sync::synchronize;
pub use trajectory::integrate_positions;
pub use velocity::{compute_velocity, FrameCorrection};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Standard gravity in m/s².
pub const STANDARD_GRAVITY: f64 = 9.81;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A synthetic trial straight through velocity and energy.
    #[test]
    fn test_velocity_to_energy_pipeline() {
        let n = 50;
        let time: Vec<f64> = (0..n).map(|i| i as f64 * 0.02).collect();
        let accel: Vec<Sample> = (0..n).map(|_| [0.5, 0.0, 0.0]).collect();

        let config = config::AccelerometerConfig {
            error: 0.001,
            in_g: false,
            gravity_interfered: false,
            smoothing: SmoothingConfig {
                strategy: SmoothingStrategy::Average,
                k: 2,
                s: 0.0,
            },
            ..config::AccelerometerConfig::default()
        };

        let (v, dt) = compute_velocity(&accel, &time, &config, None).unwrap();
        assert_eq!(v.len(), n);
        assert_eq!(dt.len(), n);

        let energy = energy::translational_energy(0.015, &v);
        assert_eq!(energy.len(), n);
        assert!(energy.iter().all(|&e| e >= 0.0));
    }

    #[test]
    fn test_paired_trial_synchronization_and_rotation() {
        let acc_time: Vec<f64> = (0..40).map(|i| i as f64 * 0.025).collect();
        let acc_samples: Vec<Sample> = acc_time.iter().map(|_| [1.0, 0.0, 0.0]).collect();
        let gyr_time: Vec<f64> = (0..60).map(|i| i as f64 * 0.0166).collect();
        let gyr_samples: Vec<Sample> = gyr_time.iter().map(|_| [0.0, 0.0, 2.0]).collect();

        let acc = SensorSeries::new(acc_time, acc_samples).unwrap();
        let gyr = SensorSeries::new(gyr_time, gyr_samples).unwrap();
        let pair = synchronize(&acc, &gyr).unwrap();
        assert_eq!(pair.time.len(), 40);

        let gyro_config = config::GyroscopeConfig {
            error: 0.01,
            in_degrees: false,
            smoothing: SmoothingConfig {
                strategy: SmoothingStrategy::Average,
                k: 0,
                s: 0.0,
            },
            ..config::GyroscopeConfig::default()
        };
        let out =
            compute_rotation(&pair.second, &pair.time, &gyro_config, RotationMode::Combined)
                .unwrap();
        let omega = out.angular_velocity.unwrap();
        let angles = out.orientation.unwrap();
        assert_eq!(omega.len(), 40);
        assert_relative_eq!(omega[5][2], 2.0, epsilon = 1e-9);
        assert!(angles.iter().all(|a| a[2].abs() < std::f64::consts::TAU));
    }
}
