//! Per-category energy CSV output.
//!
//! Each non-empty category is written to its own file in the output
//! directory: a header row, then time, the mean curve and one column per
//! contributing trial. Numbers are formatted per a printf-style float spec.

use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;

use crate::config::OutputConfig;
use crate::energy::{AggregateEnergy, EnergyAggregator, EnergyCategory};
use crate::error::{ProcessingError, Result};

/// Parsed printf-style float spec, e.g. `%1.5e` or `%.3f`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatFormat {
    precision: usize,
    scientific: bool,
}

impl FloatFormat {
    /// Parse a spec of the form `%<width>.<precision><e|f>`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::InvalidConfig`] for anything else.
    pub fn parse(spec: &str) -> Result<Self> {
        let body = spec.strip_prefix('%').unwrap_or(spec);
        let scientific = match body.chars().last() {
            Some('e') => true,
            Some('f') => false,
            _ => {
                return Err(ProcessingError::invalid_config(format!(
                    "float spec must end in 'e' or 'f': {spec}"
                )))
            }
        };
        let body = &body[..body.len() - 1];
        let precision_part = match body.split_once('.') {
            Some((width, precision)) => {
                if !width.is_empty() && width.parse::<usize>().is_err() {
                    return Err(ProcessingError::invalid_config(format!(
                        "bad width in float spec: {spec}"
                    )));
                }
                precision
            }
            None => body,
        };
        let precision = if precision_part.is_empty() {
            6
        } else {
            precision_part.parse::<usize>().map_err(|_| {
                ProcessingError::invalid_config(format!("bad precision in float spec: {spec}"))
            })?
        };
        Ok(Self {
            precision,
            scientific,
        })
    }

    /// Format one value per the spec.
    #[must_use]
    pub fn format(&self, value: f64) -> String {
        if self.scientific {
            format!("{:.*e}", self.precision, value)
        } else {
            format!("{:.*}", self.precision, value)
        }
    }
}

/// Write every non-empty category of the aggregator.
///
/// Returns the paths written.
///
/// # Errors
///
/// Propagates I/O and CSV errors; an unparseable float spec fails before
/// any file is touched.
pub fn write_energy_files(
    aggregator: &EnergyAggregator,
    cfg: &OutputConfig,
) -> Result<Vec<PathBuf>> {
    let format = FloatFormat::parse(&cfg.formatter)?;
    if !cfg.directory.exists() {
        std::fs::create_dir_all(&cfg.directory)?;
        info!("created output directory {}", cfg.directory.display());
    }

    let stamp = Local::now().format("%Y_%m_%d-%H_%M_%S").to_string();
    let mut written = Vec::new();
    for category in [
        EnergyCategory::Rotational,
        EnergyCategory::Translational,
        EnergyCategory::Kinetic,
    ] {
        let aggregate = aggregator.category(category);
        if aggregate.is_empty() {
            continue;
        }
        let path = write_category(aggregate, category, &cfg.directory, &stamp, format)?;
        info!("{} saved", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Write one category file and return its path.
fn write_category(
    aggregate: &AggregateEnergy,
    category: EnergyCategory,
    directory: &Path,
    stamp: &str,
    format: FloatFormat,
) -> Result<PathBuf> {
    let path = unique_path(directory, &format!("{}_{stamp}", category.file_prefix()));
    let mut writer = csv::Writer::from_path(&path).map_err(|e| {
        ProcessingError::parse(path.display().to_string(), 0, e.to_string())
    })?;

    let mut header = vec!["Time in s".to_string(), category.label().to_string()];
    header.extend(
        aggregate
            .columns()
            .iter()
            .map(|(trial, _)| format!("by {trial}")),
    );
    writer
        .write_record(&header)
        .map_err(|e| ProcessingError::parse(path.display().to_string(), 0, e.to_string()))?;

    let mean = aggregate.mean();
    for (row, &t) in aggregate.time().iter().enumerate() {
        let mut record = vec![format.format(t), format.format(mean[row])];
        record.extend(
            aggregate
                .columns()
                .iter()
                .map(|(_, series)| format.format(series[row])),
        );
        writer
            .write_record(&record)
            .map_err(|e| ProcessingError::parse(path.display().to_string(), 0, e.to_string()))?;
    }
    writer
        .flush()
        .map_err(ProcessingError::from)?;
    Ok(path)
}

/// First non-existing `<base>.csv`, `<base>_1.csv`, `<base>_2.csv`, ...
fn unique_path(directory: &Path, base: &str) -> PathBuf {
    let candidate = directory.join(format!("{base}.csv"));
    if !candidate.exists() {
        return candidate;
    }
    let mut suffix = 1;
    loop {
        let candidate = directory.join(format!("{base}_{suffix}.csv"));
        if !candidate.exists() {
            return candidate;
        }
        suffix += 1;
    }
}
