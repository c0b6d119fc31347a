//! Data model for sensor time series and trials.
//!
//! A trial is one physical measurement, backed by either a single sensor
//! file or an accelerometer+gyroscope pair. Its arrays are owned by the
//! worker processing it and consumed by the energy computation.

use std::path::Path;

use crate::error::{ProcessingError, Result};

/// One triaxial sensor sample.
pub type Sample = [f64; 3];

/// An owned time series of triaxial samples.
///
/// Invariant: `time` and `samples` have equal length, and after the reader's
/// dedup pass no two adjacent timestamps are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSeries {
    time: Vec<f64>,
    samples: Vec<Sample>,
}

impl SensorSeries {
    /// Create a series from a time vector and matching samples.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::LengthMismatch`] if the lengths differ.
    pub fn new(time: Vec<f64>, samples: Vec<Sample>) -> Result<Self> {
        if time.len() != samples.len() {
            return Err(ProcessingError::length_mismatch(time.len(), samples.len()));
        }
        Ok(Self { time, samples })
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the series holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Timestamps in seconds.
    #[must_use]
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Triaxial samples, one per timestamp.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Consume the series into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<f64>, Vec<Sample>) {
        (self.time, self.samples)
    }
}

/// What a trial file recorded.
///
/// Parsed from the filename suffix by full-token equality; a name merely
/// containing one of the tokens as a substring does not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Measurement {
    Accelerometer,
    Gyroscope,
    /// Marker for a synchronized accelerometer+gyroscope pair; the two
    /// companion files must exist alongside it.
    AccGyr,
}

impl Measurement {
    /// Parse a filename token into a measurement kind.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Accelerometer" => Some(Self::Accelerometer),
            "Gyroscope" => Some(Self::Gyroscope),
            "AccGyr" => Some(Self::AccGyr),
            _ => None,
        }
    }

    /// The filename token for this measurement kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accelerometer => "Accelerometer",
            Self::Gyroscope => "Gyroscope",
            Self::AccGyr => "AccGyr",
        }
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a trial filename `<name>_<Measurement>.csv` into its parts.
///
/// Returns `None` for files that do not follow the convention; the batch
/// driver reports and skips those.
#[must_use]
pub fn parse_trial_filename(path: &Path) -> Option<(String, Measurement)> {
    if path.extension().and_then(|e| e.to_str()) != Some("csv") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (name, token) = stem.rsplit_once('_')?;
    let measurement = Measurement::from_token(token)?;
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), measurement))
}

/// One physical measurement with its loaded data.
#[derive(Debug, Clone)]
pub enum Trial {
    /// A single-sensor trial.
    Single {
        id: String,
        measurement: Measurement,
        series: SensorSeries,
    },
    /// A paired trial; the two series are synchronized downstream.
    Paired {
        id: String,
        accelerometer: SensorSeries,
        gyroscope: SensorSeries,
    },
}

impl Trial {
    /// Identifier of the trial (the `<name>` filename part).
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Single { id, .. } | Self::Paired { id, .. } => id,
        }
    }
}
