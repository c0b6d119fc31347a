//! Configuration surface for the processing pipeline.
//!
//! Loaded from a TOML file with per-section and per-key defaults; a missing
//! file or key falls back to the defaults below. Values are immutable once
//! loaded and cloned into each worker, so no configuration state is shared
//! between threads.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, Result};
use crate::rotation::RotationMode;
use crate::smooth::SmoothingConfig;

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub main: MainConfig,
    pub accelerometer: AccelerometerConfig,
    pub gyroscope: GyroscopeConfig,
    pub output: OutputConfig,
}

/// Shared experiment constants and batch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MainConfig {
    /// Mass of the instrumented ball in kilograms.
    pub mass: f64,
    /// Radius of the ball in metres.
    pub radius: f64,
    /// Explicit trial file list; used when `filenames_auto` is off.
    pub filenames: Vec<String>,
    /// Discover trial files by scanning the input directory.
    pub filenames_auto: bool,
    /// Restrict discovery to these chip names (empty = no filter).
    pub names: Vec<String>,
    /// Worker threads for the trial pool.
    pub workers: usize,
    /// CSV field delimiter for trial files.
    pub delimiter: String,
    /// Header lines to skip in trial files.
    pub skip_header: usize,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            mass: 0.014_96,
            radius: 0.029_25,
            filenames: Vec::new(),
            filenames_auto: true,
            names: Vec::new(),
            workers: 4,
            delimiter: ",".to_string(),
            skip_header: 1,
        }
    }
}

impl MainConfig {
    /// The delimiter as the single byte the CSV reader needs.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }
}

/// Per-accelerometer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelerometerConfig {
    /// Error threshold for quantization and the amplitude floor.
    pub error: f64,
    pub smoothing: SmoothingConfig,
    /// Sensor position relative to the ball centre, metres.
    pub sensor_offset: [f64; 3],
    /// Velocity at the first sample, m/s.
    pub initial_velocity: [f64; 3],
    /// Position at the first sample, metres.
    pub initial_position: [f64; 3],
    /// Input acceleration is recorded in factors of g.
    pub in_g: bool,
    /// Gravity leaks into the recorded acceleration and must be removed.
    pub gravity_interfered: bool,
    /// Also integrate the velocity into a 3-D trajectory.
    pub trajectory: bool,
}

impl Default for AccelerometerConfig {
    fn default() -> Self {
        Self {
            error: 1e-3,
            smoothing: SmoothingConfig::default(),
            sensor_offset: [1.2e-3, 7.4e-3, 4.5e-3],
            initial_velocity: [0.0; 3],
            initial_position: [0.0; 3],
            in_g: true,
            gravity_interfered: true,
            trajectory: false,
        }
    }
}

/// Per-gyroscope settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GyroscopeConfig {
    /// Error threshold for quantization and the amplitude floor.
    pub error: f64,
    pub smoothing: SmoothingConfig,
    /// Rotation at the first sample, in the input's angular unit.
    pub initial_rotation: [f64; 3],
    /// Input angular rate is recorded in degrees per second.
    pub in_degrees: bool,
    /// What the rotation engine computes.
    pub mode: RotationMode,
}

impl Default for GyroscopeConfig {
    fn default() -> Self {
        Self {
            error: 1e-2,
            smoothing: SmoothingConfig::default(),
            initial_rotation: [0.0; 3],
            in_degrees: true,
            mode: RotationMode::Combined,
        }
    }
}

/// Energy output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for the per-category energy files.
    pub directory: PathBuf,
    /// printf-style float spec for the written values, e.g. `%1.5e`.
    pub formatter: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            formatter: "%1.5e".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::InvalidConfig`] when the file cannot be
    /// read or parsed, or when validation fails.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProcessingError::invalid_config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            ProcessingError::invalid_config(format!("cannot parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file when given, otherwise the defaults.
    ///
    /// # Errors
    ///
    /// Propagates [`PipelineConfig::load_from_file`] errors.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Validate the configuration.
    ///
    /// The error thresholds are allowed to be non-positive here; the signal
    /// layer clamps them to its substitute threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::InvalidConfig`] for out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if self.main.mass <= 0.0 {
            return Err(ProcessingError::invalid_config("mass must be positive"));
        }
        if self.main.radius <= 0.0 {
            return Err(ProcessingError::invalid_config("radius must be positive"));
        }
        if self.main.workers == 0 {
            return Err(ProcessingError::invalid_config(
                "worker count must be at least 1",
            ));
        }
        if self.main.delimiter.as_bytes().len() != 1 {
            return Err(ProcessingError::invalid_config(
                "delimiter must be a single byte",
            ));
        }
        self.accelerometer.smoothing.validate()?;
        self.gyroscope.smoothing.validate()?;
        crate::output::FloatFormat::parse(&self.output.formatter)?;
        Ok(())
    }
}
