//! Acceleration to velocity conversion.
//!
//! The engine converts units, rejects signals below the noise floor,
//! quantizes, optionally corrects for the sensor frame's own rotation,
//! removes the gravity bias and integrates, then smooths the result.

use log::debug;

use crate::config::AccelerometerConfig;
use crate::error::{ProcessingError, Result};
use crate::math::quaternion::Quaternion;
use crate::math::{cross3, scale3, sub3};
use crate::series::Sample;
use crate::signal::{check_amplitude, quantize, timestep};
use crate::smooth::smooth;
use crate::STANDARD_GRAVITY;

/// Companion rotation data for frame correction.
#[derive(Debug, Clone, Copy)]
pub struct FrameCorrection<'a> {
    /// Absolute rotation angles per sample, radians.
    pub rotation: &'a [Sample],
    /// Angular velocity per sample, rad/s; enables the offset correction.
    pub angular_rate: Option<&'a [Sample]>,
}

/// Convert an acceleration series into a smoothed velocity series.
///
/// Returns the velocity and the Δt series the integration used.
///
/// # Errors
///
/// Returns [`ProcessingError::SignalTooSmall`] when the signal does not
/// rise above 25× the error threshold, [`ProcessingError::ShapeMismatch`]
/// when companion arrays disagree in length, and length/config errors from
/// the smoothing stage.
pub fn compute_velocity(
    accel: &[Sample],
    time: &[f64],
    cfg: &AccelerometerConfig,
    frame: Option<FrameCorrection<'_>>,
) -> Result<(Vec<Sample>, Vec<f64>)> {
    if accel.len() != time.len() {
        return Err(ProcessingError::length_mismatch(time.len(), accel.len()));
    }
    if accel.is_empty() {
        return Err(ProcessingError::invalid_input(
            "cannot integrate an empty acceleration series",
        ));
    }

    // 1. Unit conversion: factors of g to m/s².
    let mut a: Vec<Sample> = if cfg.in_g {
        accel.iter().map(|s| scale3(*s, STANDARD_GRAVITY)).collect()
    } else {
        accel.to_vec()
    };

    // 2. Time steps and the noise-floor check.
    let dt = timestep(time);
    check_amplitude(&a, cfg.error)?;

    // 3. Noise quantization.
    a = quantize(&a, cfg.error);

    // 4./5. Frame correction and gravity removal.
    match frame {
        Some(correction) => apply_frame_correction(&mut a, &dt, cfg, correction)?,
        None => {
            if cfg.gravity_interfered {
                // Without rotation data the orientation is unknown; spread
                // the residual over all three axes, total magnitude g.
                let residual = STANDARD_GRAVITY / 3.0f64.sqrt();
                for s in &mut a {
                    *s = sub3(*s, [residual; 3]);
                }
            }
        }
    }

    // 6. Integration. The subtractive recurrence is kept verbatim for
    // compatibility with recorded reference outputs; a first-principles
    // integrator would add the previous velocity instead.
    let mut v = vec![[0.0f64; 3]; a.len()];
    v[0] = cfg.initial_velocity;
    for n in 1..a.len() {
        for c in 0..3 {
            v[n][c] = a[n][c] * dt[n] - v[n - 1][c];
        }
    }

    // 7. Smoothing.
    let v = smooth(time, &v, &cfg.smoothing)?;
    debug!("velocity computed for {} samples", v.len());
    Ok((v, dt))
}

/// Rotate the acceleration into the lab frame and remove rotation-induced
/// and gravity terms.
fn apply_frame_correction(
    a: &mut [Sample],
    dt: &[f64],
    cfg: &AccelerometerConfig,
    correction: FrameCorrection<'_>,
) -> Result<()> {
    if correction.rotation.len() != a.len() {
        return Err(ProcessingError::shape_mismatch(
            a.len(),
            correction.rotation.len(),
        ));
    }
    if let Some(rate) = correction.angular_rate {
        if rate.len() != a.len() {
            return Err(ProcessingError::shape_mismatch(a.len(), rate.len()));
        }
    }

    for (n, sample) in a.iter_mut().enumerate() {
        // Undo the sensor's accumulated azimuth (about z) and elevation
        // (about y) so the sample reads in the lab frame.
        let azimuth = correction.rotation[n][2];
        let elevation = correction.rotation[n][1];
        let undo = Quaternion::from_axis_angle([0.0, 0.0, 1.0], -azimuth)
            .compose(&Quaternion::from_axis_angle([0.0, 1.0, 0.0], -elevation));
        *sample = undo.rotate(*sample);

        if let Some(rate) = correction.angular_rate {
            let term = scale3(cross3(rate[n], cfg.sensor_offset), 1.0 / dt[n]);
            *sample = sub3(*sample, term);
        }
    }

    if cfg.gravity_interfered {
        for sample in a.iter_mut() {
            sample[2] -= STANDARD_GRAVITY;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smooth::{SmoothingConfig, SmoothingStrategy};
    use approx::assert_relative_eq;

    /// Configuration with unit conversion, gravity handling and smoothing
    /// all neutral, so the integration itself is observable.
    fn plain_config() -> AccelerometerConfig {
        AccelerometerConfig {
            error: 0.01,
            smoothing: SmoothingConfig {
                strategy: SmoothingStrategy::Average,
                k: 0,
                s: 0.0,
            },
            in_g: false,
            gravity_interfered: false,
            ..AccelerometerConfig::default()
        }
    }

    #[test]
    fn test_golden_recurrence_constant_acceleration() {
        let time = [0.0, 1.0, 2.0, 3.0, 4.0];
        let accel = [[0.0, 0.0, 9.81]; 5];
        let cfg = plain_config();

        let (v, dt) = compute_velocity(&accel, &time, &cfg, None).unwrap();

        // Δt is the constant t_last / n.
        for &d in &dt {
            assert_relative_eq!(d, 0.8);
        }
        // v[0] is the configured initial velocity.
        assert_relative_eq!(v[0][2], 0.0);
        // v[n] = a[n]·Δt − v[n−1], with a quantized to multiples of 0.01.
        let a_q = 9.81;
        let mut expected = 0.0;
        for sample in v.iter().skip(1) {
            expected = a_q * 0.8 - expected;
            assert_relative_eq!(sample[2], expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_initial_velocity_is_kept() {
        let time = [0.0, 1.0, 2.0];
        let accel = [[1.0, 0.0, 0.0]; 3];
        let mut cfg = plain_config();
        cfg.initial_velocity = [0.5, -0.25, 0.125];

        let (v, _) = compute_velocity(&accel, &time, &cfg, None).unwrap();
        assert_relative_eq!(v[0][0], 0.5);
        assert_relative_eq!(v[0][1], -0.25);
        assert_relative_eq!(v[0][2], 0.125);
    }

    #[test]
    fn test_amplitude_floor() {
        let time = [0.0, 1.0, 2.0];
        let cfg = plain_config();

        // Max amplitude 10× the error threshold: rejected.
        let low = [[0.1, 0.0, 0.0]; 3];
        assert!(matches!(
            compute_velocity(&low, &time, &cfg, None),
            Err(ProcessingError::SignalTooSmall { .. })
        ));

        // Max amplitude 30× the error threshold: accepted.
        let high = [[0.3, 0.0, 0.0]; 3];
        assert!(compute_velocity(&high, &time, &cfg, None).is_ok());
    }

    #[test]
    fn test_in_g_conversion() {
        let time = [0.0, 1.0];
        let accel = [[0.0, 0.0, 1.0]; 2];
        let mut cfg = plain_config();
        cfg.in_g = true;

        let (v, _) = compute_velocity(&accel, &time, &cfg, None).unwrap();
        // a = 1 g = 9.81 m/s² quantized at 0.01, Δt = 0.5.
        assert_relative_eq!(v[1][2], 9.81 * 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_gravity_residual_spread_without_rotation() {
        let time = [0.0, 1.0];
        let accel = [[1.0, 1.0, 1.0]; 2];
        let mut cfg = plain_config();
        cfg.gravity_interfered = true;

        let (v, _) = compute_velocity(&accel, &time, &cfg, None).unwrap();
        let residual = STANDARD_GRAVITY / 3.0f64.sqrt();
        let expected = (1.0 - residual) * 0.5;
        for c in 0..3 {
            assert_relative_eq!(v[1][c], expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_frame_correction_shape_mismatch() {
        let time = [0.0, 1.0, 2.0];
        let accel = [[1.0, 0.0, 0.0]; 3];
        let rotation = [[0.0; 3]; 2];
        let cfg = plain_config();

        let result = compute_velocity(
            &accel,
            &time,
            &cfg,
            Some(FrameCorrection {
                rotation: &rotation,
                angular_rate: None,
            }),
        );
        assert!(matches!(
            result,
            Err(ProcessingError::ShapeMismatch { left: 3, right: 2 })
        ));
    }

    #[test]
    fn test_frame_correction_undoes_azimuth() {
        use std::f64::consts::FRAC_PI_2;

        let time = [0.0, 1.0];
        // Sensor frame rotated 90° about z: lab-frame x reads as sensor y.
        let accel = [[0.0, 1.0, 0.0]; 2];
        let rotation = [[0.0, 0.0, FRAC_PI_2]; 2];
        let cfg = plain_config();

        let (v, _) = compute_velocity(
            &accel,
            &time,
            &cfg,
            Some(FrameCorrection {
                rotation: &rotation,
                angular_rate: None,
            }),
        )
        .unwrap();
        // After undoing the azimuth the acceleration points along lab x.
        assert_relative_eq!(v[1][0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(v[1][1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_offset_correction_subtracts_rotation_term() {
        let time = [0.0, 1.0];
        let accel = [[1.0, 0.0, 0.0]; 2];
        let rotation = [[0.0; 3]; 2];
        let rate = [[0.0, 0.0, 2.0]; 2];
        let mut cfg = plain_config();
        cfg.sensor_offset = [0.0, 0.1, 0.0];

        let (v, dt) = compute_velocity(
            &accel,
            &time,
            &cfg,
            Some(FrameCorrection {
                rotation: &rotation,
                angular_rate: Some(&rate),
            }),
        )
        .unwrap();

        // ω × r = (2 ẑ) × (0.1 ŷ) = −0.2 x̂; divided by Δt and subtracted.
        let corrected = 1.0 - (-0.2) / dt[1];
        assert_relative_eq!(v[1][0], corrected * dt[1], epsilon = 1e-9);
    }
}
