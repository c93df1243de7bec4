//! Loaders for paired x/y sample data.
//!
//! Samples are read from headered CSV files. Columns are located by name
//! (case-insensitive) using the names from [`InputConfig`]. Rows can
//! optionally be split into groups by a label column, which is how cluster
//! label exports are consumed.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;

use super::geometry::Centroid;
use crate::config::InputConfig;
use crate::processors::covariance::mean;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Paired x/y observations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Sample {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self { x, y }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    /// Number of x observations. Callers that build `Sample` by hand may
    /// leave `y` with a different length; the computation rejects that.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Arithmetic mean point, or `None` for an empty sample.
    pub fn centroid(&self) -> Option<Centroid> {
        Some(Centroid::new(mean(&self.x)?, mean(&self.y)?))
    }
}

/// Samples sharing one value of the group column.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGroup {
    pub name: String,
    pub sample: Sample,
}

fn open_reader(path: &Path, config: &InputConfig) -> Result<csv::Reader<BufReader<File>>> {
    if !config.delimiter.is_ascii() {
        return Err(LoaderError::InvalidDelimiter(config.delimiter));
    }

    let file = File::open(path)?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(config.delimiter as u8)
        .from_reader(BufReader::new(file)))
}

/// Map lowercase header names to column indices.
fn column_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_lowercase(), i))
        .collect()
}

fn find_columns(col_map: &HashMap<String, usize>, names: &[&str]) -> Result<Vec<usize>> {
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| !col_map.contains_key(&name.to_lowercase()))
        .collect();

    if !missing.is_empty() {
        return Err(LoaderError::MissingColumns(missing.join(", ")));
    }

    Ok(names
        .iter()
        .map(|name| col_map[&name.to_lowercase()])
        .collect())
}

fn parse_field(record: &StringRecord, idx: usize, column: &str, row: usize) -> Result<f64> {
    let raw = record.get(idx).unwrap_or("");
    raw.parse::<f64>().map_err(|_| {
        LoaderError::ParseError(format!(
            "row {}: column '{}' has non-numeric value {:?}",
            row, column, raw
        ))
    })
}

/// Load one x/y sample from a headered CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the configured columns are
/// missing, a value is not numeric, or there are no data rows.
pub fn load_sample_csv<P: AsRef<Path>>(path: P, config: &InputConfig) -> Result<Sample> {
    let path = path.as_ref();
    let mut reader = open_reader(path, config)?;

    let col_map = column_map(reader.headers()?);
    let cols = find_columns(&col_map, &[config.x_column.as_str(), config.y_column.as_str()])?;
    let (x_idx, y_idx) = (cols[0], cols[1]);

    let mut sample = Sample::with_capacity(1024);

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        // Header is row 1
        let row = i + 2;
        let x = parse_field(&record, x_idx, &config.x_column, row)?;
        let y = parse_field(&record, y_idx, &config.y_column, row)?;
        sample.push(x, y);
    }

    if sample.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(sample)
}

/// Load x/y samples split by the value of `group_column`.
///
/// Groups are returned in order of first appearance in the file.
pub fn load_grouped_csv<P: AsRef<Path>>(
    path: P,
    config: &InputConfig,
    group_column: &str,
) -> Result<Vec<SampleGroup>> {
    let path = path.as_ref();
    let mut reader = open_reader(path, config)?;

    let col_map = column_map(reader.headers()?);
    let cols = find_columns(
        &col_map,
        &[config.x_column.as_str(), config.y_column.as_str(), group_column],
    )?;
    let (x_idx, y_idx, g_idx) = (cols[0], cols[1], cols[2]);

    let mut groups: Vec<SampleGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let row = i + 2;
        let x = parse_field(&record, x_idx, &config.x_column, row)?;
        let y = parse_field(&record, y_idx, &config.y_column, row)?;
        let name = record.get(g_idx).unwrap_or("").to_string();

        let slot = *index.entry(name.clone()).or_insert_with(|| {
            groups.push(SampleGroup {
                name,
                sample: Sample::new(Vec::new(), Vec::new()),
            });
            groups.len() - 1
        });
        groups[slot].sample.push(x, y);
    }

    if groups.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(groups)
}
