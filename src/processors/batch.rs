//! Parallel error bar computation over sample groups and directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use rayon::prelude::*;
use regex::Regex;
use thiserror::Error;

use super::principal::{PrincipalError, PrincipalErrors};
use crate::config::{ErrorBarConfig, ToolConfig};
use crate::core::loaders::{load_grouped_csv, load_sample_csv, SampleGroup};
use crate::core::writers::{write_segments_csv, SegmentRecord};

/// Errors that can occur during batch processing.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("No CSV files matching '{pattern}' in {folder}")]
    NoFilesFound { folder: PathBuf, pattern: String },
}

/// Outcome for one group of samples.
#[derive(Debug, Clone)]
pub struct GroupResult {
    pub name: String,
    pub outcome: std::result::Result<PrincipalErrors, PrincipalError>,
}

/// Counts reported after a directory run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub files_found: usize,
    pub files_written: usize,
    pub files_failed: usize,
    pub groups_computed: usize,
}

/// Compute error bars for every group in parallel.
///
/// Results keep the order of `groups`. A failing group does not affect the
/// others.
pub fn compute_groups(groups: &[SampleGroup], config: &ErrorBarConfig) -> Vec<GroupResult> {
    groups
        .par_iter()
        .map(|group| GroupResult {
            name: group.name.clone(),
            outcome: PrincipalErrors::compute(&group.sample.x, &group.sample.y, None, None, config),
        })
        .collect()
}

/// Flatten successful group results into output records, logging failures.
pub fn records_for(results: &[GroupResult]) -> Vec<SegmentRecord> {
    let mut records = Vec::with_capacity(results.len() * 2);
    for result in results {
        match &result.outcome {
            Ok(errors) => records.extend(SegmentRecord::from_errors(&result.name, errors)),
            Err(e) => log::warn!("group '{}' skipped: {}", result.name, e),
        }
    }
    records
}

/// Find `.csv` files in `directory` whose stem matches `pattern`.
///
/// Files are returned sorted by path.
pub fn find_sample_files(directory: &Path, pattern: &Regex) -> std::result::Result<Vec<PathBuf>, BatchError> {
    if !directory.is_dir() {
        return Err(BatchError::DirectoryNotFound(directory.to_path_buf()));
    }

    let entries = fs::read_dir(directory).map_err(|e| BatchError::ReadDir {
        path: directory.to_path_buf(),
        source: e,
    })?;

    let mut csv_files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .filter(|path| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(|stem| pattern.is_match(stem))
                .unwrap_or(false)
        })
        .collect();

    csv_files.sort();
    Ok(csv_files)
}

/// Output path for a given input sample file.
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    output_dir.join(format!("{}_principal_errors.csv", stem))
}

/// Load, compute and write one file. Returns the number of groups computed.
pub fn process_file(input: &Path, output: &Path, config: &ToolConfig) -> Result<usize> {
    let groups = match &config.input.group_column {
        Some(column) => load_grouped_csv(input, &config.input, column)
            .with_context(|| format!("Failed to load grouped samples: {}", input.display()))?,
        None => {
            let sample = load_sample_csv(input, &config.input)
                .with_context(|| format!("Failed to load samples: {}", input.display()))?;
            vec![SampleGroup {
                name: "all".to_string(),
                sample,
            }]
        }
    };

    let results = compute_groups(&groups, &config.errorbars);
    let records = records_for(&results);
    if records.is_empty() {
        anyhow::bail!(
            "no group in {} produced error bars ({} failed)",
            input.display(),
            results.len()
        );
    }

    write_segments_csv(output, &records)
        .with_context(|| format!("Failed to write segments: {}", output.display()))?;

    Ok(records.len() / 2)
}

/// Compute error bars for every matching CSV in `input_dir`.
///
/// Each input `<stem>.csv` produces `<stem>_principal_errors.csv` in
/// `output_dir`. Files are processed in parallel; a failing file is logged
/// and counted without stopping the run.
pub fn process_directory(
    input_dir: &Path,
    output_dir: &Path,
    config: &ToolConfig,
) -> std::result::Result<BatchSummary, BatchError> {
    let pattern = Regex::new(&config.batch.pattern).map_err(|e| BatchError::InvalidPattern {
        pattern: config.batch.pattern.clone(),
        source: e,
    })?;

    let files = find_sample_files(input_dir, &pattern)?;
    if files.is_empty() {
        return Err(BatchError::NoFilesFound {
            folder: input_dir.to_path_buf(),
            pattern: config.batch.pattern.clone(),
        });
    }

    let written = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let groups = AtomicUsize::new(0);

    files.par_iter().for_each(|src| {
        let dest = output_path_for(src, output_dir);
        match process_file(src, &dest, config) {
            Ok(n_groups) => {
                log::info!(
                    "{} -> {} ({} groups)",
                    src.file_name().unwrap_or_default().to_string_lossy(),
                    dest.display(),
                    n_groups
                );
                written.fetch_add(1, Ordering::Relaxed);
                groups.fetch_add(n_groups, Ordering::Relaxed);
            }
            Err(e) => {
                log::error!("{}: {:#}", src.display(), e);
                failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    Ok(BatchSummary {
        files_found: files.len(),
        files_written: written.into_inner(),
        files_failed: failed.into_inner(),
        groups_computed: groups.into_inner(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::Sample;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn group(name: &str, x: Vec<f64>, y: Vec<f64>) -> SampleGroup {
        SampleGroup {
            name: name.to_string(),
            sample: Sample::new(x, y),
        }
    }

    #[test]
    fn test_compute_groups_keeps_order_and_isolates_failures() {
        let groups = vec![
            group("a", vec![0.0, 2.0], vec![0.0, 0.0]),
            group("bad", vec![1.0, 2.0, 3.0], vec![1.0]),
            group("c", vec![1.0, 2.0, 3.0], vec![3.0, 1.0, 2.0]),
        ];

        let results = compute_groups(&groups, &ErrorBarConfig::default());
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["a", "bad", "c"]);
        assert!(results[0].outcome.is_ok());
        assert!(matches!(
            results[1].outcome,
            Err(PrincipalError::DimensionMismatch { x_len: 3, y_len: 1 })
        ));
        assert!(results[2].outcome.is_ok());

        let records = records_for(&results);
        assert_eq!(records.len(), 4);
        assert_eq!(records[2].group, "c");
    }

    #[test]
    fn test_find_sample_files_with_pattern() {
        let temp_dir = TempDir::new().unwrap();
        write_csv(temp_dir.path(), "run_01.csv", &["x,y"]);
        write_csv(temp_dir.path(), "run_02.CSV", &["x,y"]);
        write_csv(temp_dir.path(), "notes.csv", &["x,y"]);
        write_csv(temp_dir.path(), "run_03.txt", &["x,y"]);

        let pattern = Regex::new(r"^run_\d+$").unwrap();
        let files = find_sample_files(temp_dir.path(), &pattern).unwrap();

        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["run_01.csv", "run_02.CSV"]);
    }

    #[test]
    fn test_find_sample_files_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        let pattern = Regex::new(".*").unwrap();

        assert!(matches!(
            find_sample_files(&missing, &pattern),
            Err(BatchError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_process_directory() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_csv(input.path(), "a.csv", &["x,y", "0,0", "2,0"]);
        write_csv(input.path(), "b.csv", &["x,y", "1,1", "2,3", "4,2"]);
        write_csv(input.path(), "broken.csv", &["x,z", "1,1"]);

        let summary =
            process_directory(input.path(), output.path(), &ToolConfig::default()).unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                files_found: 3,
                files_written: 2,
                files_failed: 1,
                groups_computed: 2,
            }
        );

        let out = fs::read_to_string(output.path().join("a_principal_errors.csv")).unwrap();
        assert_eq!(out.lines().count(), 3);
        assert!(!output.path().join("broken_principal_errors.csv").exists());
    }

    #[test]
    fn test_process_file_grouped() {
        let input = TempDir::new().unwrap();
        let src = write_csv(
            input.path(),
            "labels.csv",
            &["x,y,z,label", "0,0,0,0", "2,0,0,0", "5,5,0,1", "5,7,0,1"],
        );
        let dest = input.path().join("out.csv");

        let mut config = ToolConfig::default();
        config.input.group_column = Some("label".to_string());

        let n_groups = process_file(&src, &dest, &config).unwrap();
        assert_eq!(n_groups, 2);

        let out = fs::read_to_string(&dest).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("0,0,2.000000"));
        assert!(lines[3].starts_with("1,0,2.000000"));
    }

    #[test]
    fn test_file_with_only_failing_groups_counts_as_failed() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_csv(input.path(), "n.csv", &["x,y", "nan,1", "2,3"]);

        let summary =
            process_directory(input.path(), output.path(), &ToolConfig::default()).unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                files_found: 1,
                files_written: 0,
                files_failed: 1,
                groups_computed: 0,
            }
        );
        assert!(!output.path().join("n_principal_errors.csv").exists());
    }

    #[test]
    fn test_invalid_pattern() {
        let input = TempDir::new().unwrap();
        let mut config = ToolConfig::default();
        config.batch.pattern = "(".to_string();

        assert!(matches!(
            process_directory(input.path(), input.path(), &config),
            Err(BatchError::InvalidPattern { .. })
        ));
    }
}
