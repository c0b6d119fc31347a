//! Per-trial energy computation and cross-trial aggregation.
//!
//! Energies are computed per sample from the smoothed velocity and angular
//! velocity. Trials of the same physical setup are merged per category:
//! the first trial fixes the time grid, later trials are resampled onto it
//! and accumulated, and the final curve is the mean over the contributing
//! trials.

use crate::math::interp::resample_linear;
use crate::math::norm3_sq;
use crate::series::Sample;

/// Moment-of-inertia factor of a uniform solid sphere, `I = 2/5·m·r²`.
/// A simplification; the real ball is not perfectly homogeneous.
const SOLID_SPHERE_FACTOR: f64 = 0.4;

/// Translational energy per sample: `½·m·|v|²`.
#[must_use]
pub fn translational_energy(mass: f64, velocity: &[Sample]) -> Vec<f64> {
    velocity.iter().map(|v| 0.5 * mass * norm3_sq(*v)).collect()
}

/// Rotational energy per sample: `0.4·m·r²·ω²` with the solid-sphere
/// approximation.
#[must_use]
pub fn rotational_energy(mass: f64, radius: f64, angular_velocity: &[Sample]) -> Vec<f64> {
    angular_velocity
        .iter()
        .map(|w| SOLID_SPHERE_FACTOR * mass * radius * radius * norm3_sq(*w))
        .collect()
}

/// Kinetic energy: element-wise sum of the translational and rotational
/// series (already on a common time grid for paired trials).
#[must_use]
pub fn kinetic_energy(translational: &[f64], rotational: &[f64]) -> Vec<f64> {
    translational
        .iter()
        .zip(rotational.iter())
        .map(|(t, r)| t + r)
        .collect()
}

/// Energy curves of one processed trial.
///
/// Series are present per the sensors the trial carried.
#[derive(Debug, Clone)]
pub struct EnergyRecord {
    pub trial_id: String,
    pub time: Vec<f64>,
    pub translational: Option<Vec<f64>>,
    pub rotational: Option<Vec<f64>>,
    pub kinetic: Option<Vec<f64>>,
}

/// One energy category aggregated across trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnergyCategory {
    Translational,
    Rotational,
    Kinetic,
}

impl EnergyCategory {
    /// Output file prefix for the category.
    #[must_use]
    pub const fn file_prefix(self) -> &'static str {
        match self {
            Self::Translational => "E_trans",
            Self::Rotational => "E_rot",
            Self::Kinetic => "E_kin",
        }
    }

    /// Human-readable column label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Translational => "translation energy in J",
            Self::Rotational => "rotational energy in J",
            Self::Kinetic => "kinetic energy in J",
        }
    }
}

/// Running aggregate of one energy category.
///
/// Time-aligned to the first contributing trial; later trials are
/// linearly resampled onto that grid.
#[derive(Debug, Clone, Default)]
pub struct AggregateEnergy {
    time: Vec<f64>,
    sum: Vec<f64>,
    columns: Vec<(String, Vec<f64>)>,
}

impl AggregateEnergy {
    /// Whether any trial contributed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of contributing trials.
    #[must_use]
    pub fn count(&self) -> usize {
        self.columns.len()
    }

    /// The common time grid (the first contributing trial's).
    #[must_use]
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Per-trial resampled curves in contribution order.
    #[must_use]
    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }

    /// Add one trial's curve to the aggregate.
    pub fn add(&mut self, trial_id: &str, time: &[f64], energy: &[f64]) {
        if self.columns.is_empty() {
            self.time = time.to_vec();
            self.sum = energy.to_vec();
            self.columns.push((trial_id.to_string(), energy.to_vec()));
        } else {
            let resampled = resample_linear(time, energy, &self.time);
            for (acc, v) in self.sum.iter_mut().zip(resampled.iter()) {
                *acc += v;
            }
            self.columns.push((trial_id.to_string(), resampled));
        }
    }

    /// Mean curve over the contributing trials.
    #[must_use]
    pub fn mean(&self) -> Vec<f64> {
        let count = self.columns.len() as f64;
        self.sum.iter().map(|v| v / count).collect()
    }
}

/// Accumulates energy records across trials, one aggregate per category.
///
/// The accumulation runs strictly after all workers have returned; this is
/// the only cross-trial state in the pipeline.
#[derive(Debug, Clone, Default)]
pub struct EnergyAggregator {
    translational: AggregateEnergy,
    rotational: AggregateEnergy,
    kinetic: AggregateEnergy,
}

impl EnergyAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one trial's record into the per-category aggregates.
    pub fn accumulate(&mut self, record: EnergyRecord) {
        if let Some(series) = &record.translational {
            self.translational.add(&record.trial_id, &record.time, series);
        }
        if let Some(series) = &record.rotational {
            self.rotational.add(&record.trial_id, &record.time, series);
        }
        if let Some(series) = &record.kinetic {
            self.kinetic.add(&record.trial_id, &record.time, series);
        }
    }

    /// The aggregate for one category.
    #[must_use]
    pub fn category(&self, category: EnergyCategory) -> &AggregateEnergy {
        match category {
            EnergyCategory::Translational => &self.translational,
            EnergyCategory::Rotational => &self.rotational,
            EnergyCategory::Kinetic => &self.kinetic,
        }
    }

    /// Whether no trial contributed to any category.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.translational.is_empty() && self.rotational.is_empty() && self.kinetic.is_empty()
    }
}
