//! Trial discovery, scheduling and the worker pool.
//!
//! Trials are embarrassingly parallel: each file or file pair runs
//! end-to-end on one worker with its own cloned configuration and no
//! shared state. Results are gathered before the sequential energy
//! reduce; a failing trial is reported and skipped, never aborting the
//! batch.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::bounded;
use log::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::energy::{
    kinetic_energy, rotational_energy, translational_energy, EnergyAggregator, EnergyRecord,
};
use crate::error::{ProcessingError, Result};
use crate::math::sub3;
use crate::reader::{count_lines, read_trial};
use crate::rotation::{compute_rotation, RotationMode};
use crate::series::{parse_trial_filename, Measurement, Trial};
use crate::sync::synchronize;
use crate::trajectory::integrate_positions;
use crate::velocity::{compute_velocity, FrameCorrection};

/// Maximum invalid answers before the confirmation prompt gives up.
pub const MAX_PROMPT_ATTEMPTS: usize = 3;

/// One schedulable unit of work.
#[derive(Debug, Clone)]
pub struct TrialJob {
    pub id: String,
    pub kind: TrialKind,
}

/// The file or file pair backing a trial.
#[derive(Debug, Clone)]
pub enum TrialKind {
    Accelerometer(PathBuf),
    Gyroscope(PathBuf),
    Paired {
        accelerometer: PathBuf,
        gyroscope: PathBuf,
    },
}

impl TrialJob {
    /// Whether this job processes a sensor pair.
    #[must_use]
    pub fn is_paired(&self) -> bool {
        matches!(self.kind, TrialKind::Paired { .. })
    }

    /// Scheduling cost estimate: total line count of the backing files.
    fn cost(&self) -> usize {
        let lines = |path: &Path| count_lines(path).unwrap_or(0);
        match &self.kind {
            TrialKind::Accelerometer(path) | TrialKind::Gyroscope(path) => lines(path),
            TrialKind::Paired {
                accelerometer,
                gyroscope,
            } => lines(accelerometer) + lines(gyroscope),
        }
    }
}

/// Scan a directory for trial files and build the scheduled job list.
///
/// Files follow `<name>_<Measurement>.csv`; an `AccGyr` marker requires
/// both companion files and claims them for one paired trial. Files with
/// unrecognized names are reported and skipped. Pairs are scheduled first,
/// larger files before smaller ones.
///
/// # Errors
///
/// Returns an I/O error when the directory cannot be read and
/// [`ProcessingError::NoTrials`] when nothing processable is found.
pub fn discover_trials(input_dir: &Path, names_filter: &[String]) -> Result<Vec<TrialJob>> {
    let mut by_name: BTreeMap<String, BTreeMap<Measurement, PathBuf>> = BTreeMap::new();

    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match parse_trial_filename(&path) {
            Some((name, measurement)) => {
                if !names_filter.is_empty() && !names_filter.contains(&name) {
                    debug!("{}: filtered out by chip name", path.display());
                    continue;
                }
                by_name.entry(name).or_default().insert(measurement, path);
            }
            None => {
                if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                    warn!(
                        "no analysis method is known for {}, skipping",
                        path.display()
                    );
                }
            }
        }
    }

    let mut jobs = Vec::new();
    for (name, mut files) in by_name {
        if files.remove(&Measurement::AccGyr).is_some() {
            match (
                files.remove(&Measurement::Accelerometer),
                files.remove(&Measurement::Gyroscope),
            ) {
                (Some(accelerometer), Some(gyroscope)) => {
                    jobs.push(TrialJob {
                        id: name,
                        kind: TrialKind::Paired {
                            accelerometer,
                            gyroscope,
                        },
                    });
                    continue;
                }
                _ => {
                    error!("{name}: AccGyr marker without both companion files, skipping");
                    continue;
                }
            }
        }
        if let Some(path) = files.remove(&Measurement::Accelerometer) {
            jobs.push(TrialJob {
                id: name.clone(),
                kind: TrialKind::Accelerometer(path),
            });
        }
        if let Some(path) = files.remove(&Measurement::Gyroscope) {
            jobs.push(TrialJob {
                id: name,
                kind: TrialKind::Gyroscope(path),
            });
        }
    }

    if jobs.is_empty() {
        return Err(ProcessingError::NoTrials);
    }
    Ok(schedule(jobs))
}

/// Build the job list from an explicit filename list; paths are taken
/// relative to the input directory unless absolute.
///
/// # Errors
///
/// Returns [`ProcessingError::NoTrials`] when no listed file is usable.
pub fn jobs_from_filenames(input_dir: &Path, filenames: &[String]) -> Result<Vec<TrialJob>> {
    let mut jobs = Vec::new();
    for filename in filenames {
        let listed = PathBuf::from(filename);
        let path = if listed.is_absolute() {
            listed
        } else {
            input_dir.join(listed)
        };
        let Some((name, measurement)) = parse_trial_filename(&path) else {
            warn!(
                "no analysis method is known for {}, skipping",
                path.display()
            );
            continue;
        };
        let parent = path.parent().unwrap_or(Path::new("")).to_path_buf();
        match measurement {
            Measurement::Accelerometer => jobs.push(TrialJob {
                id: name,
                kind: TrialKind::Accelerometer(path),
            }),
            Measurement::Gyroscope => jobs.push(TrialJob {
                id: name,
                kind: TrialKind::Gyroscope(path),
            }),
            Measurement::AccGyr => {
                let accelerometer = parent.join(format!("{name}_Accelerometer.csv"));
                let gyroscope = parent.join(format!("{name}_Gyroscope.csv"));
                if accelerometer.is_file() && gyroscope.is_file() {
                    jobs.push(TrialJob {
                        id: name,
                        kind: TrialKind::Paired {
                            accelerometer,
                            gyroscope,
                        },
                    });
                } else {
                    error!("{name}: AccGyr marker without both companion files, skipping");
                }
            }
        }
    }
    if jobs.is_empty() {
        return Err(ProcessingError::NoTrials);
    }
    Ok(schedule(jobs))
}

/// Static schedule: pairs first, then by descending cost.
fn schedule(jobs: Vec<TrialJob>) -> Vec<TrialJob> {
    let mut keyed: Vec<(bool, usize, TrialJob)> = jobs
        .into_iter()
        .map(|job| (job.is_paired(), job.cost(), job))
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
    keyed.into_iter().map(|(_, _, job)| job).collect()
}

/// Process one trial end-to-end into its energy record.
///
/// # Errors
///
/// Propagates reader, synchronization, velocity and rotation errors; the
/// batch boundary reports and skips the trial.
pub fn process_trial(job: &TrialJob, cfg: &PipelineConfig) -> Result<EnergyRecord> {
    let trial = load_trial(job, cfg)?;
    compute_record(trial, cfg)
}

/// Load the backing file(s) of a job into an owned trial.
fn load_trial(job: &TrialJob, cfg: &PipelineConfig) -> Result<Trial> {
    let delimiter = cfg.main.delimiter_byte();
    let skip = cfg.main.skip_header;
    match &job.kind {
        TrialKind::Accelerometer(path) => Ok(Trial::Single {
            id: job.id.clone(),
            measurement: Measurement::Accelerometer,
            series: read_trial(path, delimiter, skip)?,
        }),
        TrialKind::Gyroscope(path) => Ok(Trial::Single {
            id: job.id.clone(),
            measurement: Measurement::Gyroscope,
            series: read_trial(path, delimiter, skip)?,
        }),
        TrialKind::Paired {
            accelerometer,
            gyroscope,
        } => Ok(Trial::Paired {
            id: job.id.clone(),
            accelerometer: read_trial(accelerometer, delimiter, skip)?,
            gyroscope: read_trial(gyroscope, delimiter, skip)?,
        }),
    }
}

/// Run the numeric pipeline on one trial, consuming its arrays.
fn compute_record(trial: Trial, cfg: &PipelineConfig) -> Result<EnergyRecord> {
    let mass = cfg.main.mass;
    let radius = cfg.main.radius;

    match trial {
        Trial::Single {
            id,
            measurement: Measurement::Accelerometer,
            series,
        } => {
            let (time, samples) = series.into_parts();
            let (v, dt) = compute_velocity(&samples, &time, &cfg.accelerometer, None)?;
            maybe_log_trajectory(&id, &dt, &v, cfg)?;
            Ok(EnergyRecord {
                trial_id: id,
                translational: Some(translational_energy(mass, &v)),
                rotational: None,
                kinetic: None,
                time,
            })
        }
        Trial::Single {
            id,
            measurement: Measurement::Gyroscope,
            series,
        } => {
            let (time, samples) = series.into_parts();
            let out = compute_rotation(&samples, &time, &cfg.gyroscope, cfg.gyroscope.mode)?;
            let rotational = out
                .angular_velocity
                .as_ref()
                .map(|w| rotational_energy(mass, radius, w));
            if rotational.is_none() {
                info!("{id}: rotation mode yields no angular velocity, no rotational energy");
            }
            Ok(EnergyRecord {
                trial_id: id,
                translational: None,
                rotational,
                kinetic: None,
                time,
            })
        }
        Trial::Single {
            measurement: Measurement::AccGyr,
            ..
        } => Err(ProcessingError::unknown_mode(
            "AccGyr is not a single-sensor measurement",
        )),
        Trial::Paired {
            id,
            accelerometer,
            gyroscope,
        } => {
            let pair = synchronize(&accelerometer, &gyroscope)?;

            // Paired trials need both the orientation and the rate for the
            // frame correction, regardless of the configured gyro mode.
            let rot = compute_rotation(
                &pair.second,
                &pair.time,
                &cfg.gyroscope,
                RotationMode::Combined,
            )?;
            let (Some(omega), Some(orientation)) = (rot.angular_velocity, rot.orientation) else {
                return Err(ProcessingError::unknown_mode(
                    "combined rotation output is incomplete",
                ));
            };

            let (v, dt) = compute_velocity(
                &pair.first,
                &pair.time,
                &cfg.accelerometer,
                Some(FrameCorrection {
                    rotation: &orientation,
                    angular_rate: Some(&omega),
                }),
            )?;
            maybe_log_trajectory(&id, &dt, &v, cfg)?;

            let translational = translational_energy(mass, &v);
            let rotational = rotational_energy(mass, radius, &omega);
            let kinetic = kinetic_energy(&translational, &rotational);
            Ok(EnergyRecord {
                trial_id: id,
                translational: Some(translational),
                rotational: Some(rotational),
                kinetic: Some(kinetic),
                time: pair.time,
            })
        }
    }
}

/// Integrate and report the trajectory when the config asks for one.
fn maybe_log_trajectory(
    trial_id: &str,
    dt: &[f64],
    velocity: &[crate::series::Sample],
    cfg: &PipelineConfig,
) -> Result<()> {
    if !cfg.accelerometer.trajectory {
        return Ok(());
    }
    let xyz = integrate_positions(dt, velocity, cfg.accelerometer.initial_position)?;
    if let (Some(first), Some(last)) = (xyz.first(), xyz.last()) {
        let net = sub3(*last, *first);
        info!(
            "{trial_id}: trajectory net displacement ({:.4}, {:.4}, {:.4}) m over {} samples",
            net[0],
            net[1],
            net[2],
            xyz.len()
        );
    }
    Ok(())
}

/// Run all jobs on a fixed-size worker pool and reduce the results.
///
/// Workers own cloned configuration values; the gather completes before
/// any accumulation starts. Per-trial failures are logged and skipped.
///
/// # Errors
///
/// Returns [`ProcessingError::NoTrials`] when every trial failed.
pub fn run_batch(jobs: &[TrialJob], cfg: &PipelineConfig) -> Result<EnergyAggregator> {
    let workers = cfg.main.workers.min(jobs.len()).max(1);
    let (job_tx, job_rx) = bounded::<(usize, TrialJob)>(jobs.len());
    let (result_tx, result_rx) = bounded::<(usize, String, Result<EnergyRecord>)>(jobs.len());

    for (index, job) in jobs.iter().enumerate() {
        job_tx
            .send((index, job.clone()))
            .expect("job channel is sized for every job");
    }
    drop(job_tx);

    let mut results: Vec<(usize, String, Result<EnergyRecord>)> = Vec::with_capacity(jobs.len());
    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let cfg = cfg.clone();
            scope.spawn(move || {
                while let Ok((index, job)) = job_rx.recv() {
                    debug!("processing trial {}", job.id);
                    let outcome = process_trial(&job, &cfg);
                    if result_tx.send((index, job.id, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        // Gather: block until every worker has drained its jobs.
        for outcome in result_rx.iter() {
            results.push(outcome);
        }
    });

    // Reduce in schedule order so the first contributing trial per
    // category is deterministic.
    results.sort_by_key(|(index, _, _)| *index);
    let mut aggregator = EnergyAggregator::new();
    let mut succeeded = 0usize;
    for (_, id, outcome) in results {
        match outcome {
            Ok(record) => {
                succeeded += 1;
                aggregator.accumulate(record);
            }
            Err(err) => error!("trial {id} failed: {err}"),
        }
    }
    info!("{succeeded}/{} trials processed", jobs.len());

    if aggregator.is_empty() {
        return Err(ProcessingError::NoTrials);
    }
    Ok(aggregator)
}

/// Ask whether to proceed with a batch smaller than the worker pool.
///
/// Reads yes/no answers from `input`, re-prompting on invalid input at
/// most [`MAX_PROMPT_ATTEMPTS`] times.
///
/// # Errors
///
/// Returns [`ProcessingError::InvalidInput`] when every attempt was
/// invalid, or an I/O error when the input cannot be read.
pub fn confirm_batch_size(trials: usize, workers: usize, input: &mut impl BufRead) -> Result<bool> {
    for _ in 0..MAX_PROMPT_ATTEMPTS {
        eprintln!(
            "Only {trials} trial(s) for {workers} workers; proceed anyway? [y/n] "
        );
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" | "1" => return Ok(true),
            "n" | "no" | "0" => return Ok(false),
            other => warn!("'{other}' is neither yes nor no"),
        }
    }
    Err(ProcessingError::invalid_input(format!(
        "no valid answer after {MAX_PROMPT_ATTEMPTS} attempts"
    )))
}
