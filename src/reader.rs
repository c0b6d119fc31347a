//! Trial file loading.
//!
//! Trial files are CSV with a header line; the first two columns carry
//! index/metadata and are discarded, the third column is the timestamp in
//! seconds and the following three columns are the triaxial sample.
//!
//! Recordings occasionally repeat a timestamp. Two adjacent rows with an
//! exactly equal timestamp are merged into one sample (arithmetic mean of
//! the two rows) so that no zero-Δt step reaches the integrators.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;

use crate::error::{ProcessingError, Result};
use crate::series::{Sample, SensorSeries};

/// Column index of the timestamp in a raw row.
const TIME_COLUMN: usize = 2;

/// Column index of the first sample component.
const SAMPLE_COLUMN: usize = 3;

/// Read one trial file into a sensor series.
///
/// # Errors
///
/// Returns [`ProcessingError::MissingFilename`] for an empty path,
/// [`ProcessingError::Parse`] for malformed rows and an I/O error when the
/// file cannot be opened.
pub fn read_trial(path: &Path, delimiter: u8, skip_header: usize) -> Result<SensorSeries> {
    if path.as_os_str().is_empty() {
        return Err(ProcessingError::MissingFilename);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ProcessingError::parse(path.display().to_string(), 0, e.to_string()))?;

    let mut time: Vec<f64> = Vec::new();
    let mut samples: Vec<Sample> = Vec::new();

    for (row, record) in reader.records().enumerate() {
        if row < skip_header {
            continue;
        }
        let line = row + 1;
        let record = record
            .map_err(|e| ProcessingError::parse(path.display().to_string(), line, e.to_string()))?;

        let t = parse_field(&record, TIME_COLUMN, path, line)?;
        let sample = [
            parse_field(&record, SAMPLE_COLUMN, path, line)?,
            parse_field(&record, SAMPLE_COLUMN + 1, path, line)?,
            parse_field(&record, SAMPLE_COLUMN + 2, path, line)?,
        ];

        if time.last() == Some(&t) {
            // Adjacent duplicate timestamp: average into the previous row
            // and drop the later timestamp.
            let last = samples
                .last_mut()
                .expect("samples and time stay in lockstep");
            for c in 0..3 {
                last[c] = (last[c] + sample[c]) / 2.0;
            }
        } else {
            time.push(t);
            samples.push(sample);
        }
    }

    debug!(
        "read {}: {} samples after dedup",
        path.display(),
        time.len()
    );
    SensorSeries::new(time, samples)
}

fn parse_field(record: &csv::StringRecord, index: usize, path: &Path, line: usize) -> Result<f64> {
    let field = record.get(index).ok_or_else(|| {
        ProcessingError::parse(
            path.display().to_string(),
            line,
            format!("missing column {index}"),
        )
    })?;
    field.trim().parse::<f64>().map_err(|e| {
        ProcessingError::parse(
            path.display().to_string(),
            line,
            format!("column {index}: {e}"),
        )
    })
}

/// Count the lines of a trial file; used as the scheduling cost estimate.
///
/// # Errors
///
/// Returns [`ProcessingError::MissingFilename`] for an empty path or an I/O
/// error when the file cannot be read.
pub fn count_lines(path: &Path) -> Result<usize> {
    if path.as_os_str().is_empty() {
        return Err(ProcessingError::MissingFilename);
    }
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;
    for line in reader.lines() {
        line?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    fn write_file(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        writeln!(file, "id,meta,time,x,y,z").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file
    }

    #[test]
    fn test_read_passes_through_strictly_increasing_time() {
        let file = write_file(&[
            "0,a,0.0,1.0,2.0,3.0",
            "1,a,0.5,4.0,5.0,6.0",
            "2,a,1.0,7.0,8.0,9.0",
        ]);
        let series = read_trial(file.path(), b',', 1).unwrap();
        assert_eq!(series.len(), 3);
        assert_relative_eq!(series.time()[1], 0.5);
        assert_relative_eq!(series.samples()[2][0], 7.0);
    }

    #[test]
    fn test_read_merges_adjacent_equal_timestamps() {
        let file = write_file(&[
            "0,a,0.0,1.0,2.0,3.0",
            "1,a,0.5,4.0,6.0,8.0",
            "2,a,0.5,6.0,8.0,10.0",
            "3,a,1.0,7.0,8.0,9.0",
        ]);
        let series = read_trial(file.path(), b',', 1).unwrap();
        assert_eq!(series.len(), 3);
        // Merged sample is the arithmetic mean of the duplicate rows.
        assert_relative_eq!(series.samples()[1][0], 5.0);
        assert_relative_eq!(series.samples()[1][1], 7.0);
        assert_relative_eq!(series.samples()[1][2], 9.0);
        assert_relative_eq!(series.time()[2], 1.0);
    }

    #[test]
    fn test_read_empty_path_fails() {
        let result = read_trial(Path::new(""), b',', 1);
        assert!(matches!(result, Err(ProcessingError::MissingFilename)));
    }

    #[test]
    fn test_read_malformed_row_fails() {
        let file = write_file(&["0,a,0.0,1.0,not-a-number,3.0"]);
        let result = read_trial(file.path(), b',', 1);
        assert!(matches!(result, Err(ProcessingError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_read_short_row_fails() {
        let file = write_file(&["0,a,0.0,1.0"]);
        let result = read_trial(file.path(), b',', 1);
        assert!(matches!(result, Err(ProcessingError::Parse { .. })));
    }

    #[test]
    fn test_count_lines() {
        let file = write_file(&["0,a,0.0,1.0,2.0,3.0", "1,a,0.5,4.0,5.0,6.0"]);
        assert_eq!(count_lines(file.path()).unwrap(), 3);
    }
}
