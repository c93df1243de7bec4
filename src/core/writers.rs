//! Writers for error bar results.
//!
//! Segments are written as CSV, one row per principal axis:
//!
//! ```text
//! group,axis,eigenvalue,sigma,x0,y0,x1,y1
//! all,0,2.000000,1.414214,-0.414214,0.000000,2.414214,0.000000
//! ```

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use thiserror::Error;

use crate::processors::principal::PrincipalErrors;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, WriteError>;

/// One output row: a single principal axis of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRecord {
    pub group: String,
    pub axis: usize,
    pub eigenvalue: f64,
    pub sigma: f64,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl SegmentRecord {
    /// Records for both axes of a result, in output order.
    pub fn from_errors(group: &str, errors: &PrincipalErrors) -> [SegmentRecord; 2] {
        [0usize, 1].map(|axis| {
            let (x0, y0, x1, y1) = errors.segments[axis].coords();
            SegmentRecord {
                group: group.to_string(),
                axis,
                eigenvalue: errors.axes[axis].eigenvalue,
                sigma: errors.axes[axis].sigma,
                x0,
                y0,
                x1,
                y1,
            }
        })
    }
}

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Write segment records to CSV.
///
/// Values are written with six decimal places. Parent directories are
/// created as needed.
///
/// # Errors
///
/// Returns an error if:
/// - Parent directories cannot be created
/// - File cannot be created or written to
///
/// # Example
///
/// ```no_run
/// use principal_errors::config::ErrorBarConfig;
/// use principal_errors::core::writers::{write_segments_csv, SegmentRecord};
/// use principal_errors::processors::principal::PrincipalErrors;
/// use std::path::Path;
///
/// let errors = PrincipalErrors::compute(&[0.0, 2.0], &[0.0, 1.0], None, None, &ErrorBarConfig::default()).unwrap();
/// let records = SegmentRecord::from_errors("all", &errors);
/// write_segments_csv(Path::new("segments.csv"), &records).unwrap();
/// ```
pub fn write_segments_csv(path: &Path, records: &[SegmentRecord]) -> Result<()> {
    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let buf_writer = BufWriter::new(file);
    let mut csv_writer = csv::Writer::from_writer(buf_writer);

    let path_str = path.display().to_string();

    // Write header
    csv_writer
        .write_record(["group", "axis", "eigenvalue", "sigma", "x0", "y0", "x1", "y1"])
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for record in records {
        csv_writer
            .write_record(&[
                record.group.clone(),
                record.axis.to_string(),
                format!("{:.6}", record.eigenvalue),
                format!("{:.6}", record.sigma),
                format!("{:.6}", record.x0),
                format!("{:.6}", record.y0),
                format!("{:.6}", record.x1),
                format!("{:.6}", record.y1),
            ])
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErrorBarConfig;
    use std::fs;
    use tempfile::tempdir;

    fn known_errors() -> PrincipalErrors {
        PrincipalErrors::compute(&[0.0, 2.0], &[0.0, 0.0], None, None, &ErrorBarConfig::default())
            .unwrap()
    }

    #[test]
    fn test_records_from_errors() {
        let records = SegmentRecord::from_errors("all", &known_errors());

        assert_eq!(records[0].axis, 0);
        assert_eq!(records[0].eigenvalue, 2.0);
        assert_eq!(records[1].sigma, 0.0);
        assert_eq!((records[1].x0, records[1].x1), (1.0, 1.0));
    }

    #[test]
    fn test_write_segments_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("segments.csv");

        let mut records = SegmentRecord::from_errors("a", &known_errors()).to_vec();
        records.extend(SegmentRecord::from_errors("b", &known_errors()));
        write_segments_csv(&path, &records).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "group,axis,eigenvalue,sigma,x0,y0,x1,y1");
        assert_eq!(lines.len(), 5); // header + 2 rows per group
        assert_eq!(
            lines[1],
            "a,0,2.000000,1.414214,-0.414214,0.000000,2.414214,0.000000"
        );
        assert!(lines[4].starts_with("b,1,"));
    }

    #[test]
    fn test_write_segments_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("nested").join("segments.csv");

        write_segments_csv(&path, &SegmentRecord::from_errors("all", &known_errors())).unwrap();

        assert!(path.exists());
    }
}
