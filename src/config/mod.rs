//! Configuration types for principal error bar computation.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Order in which the two principal axes are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisOrder {
    /// Whatever order the eigensolver produces.
    Native,
    /// Largest eigenvalue (major axis) first.
    Descending,
}

/// Handling of eigenvalues that come out slightly negative from round-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeEigenvalues {
    /// Clamp to zero before taking the square root.
    Clamp,
    /// Take the square root anyway, yielding NaN sigmas.
    Propagate,
}

/// Configuration for the error bar computation itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBarConfig {
    /// Ordering of the returned segments
    #[serde(default = "default_axis_order")]
    pub axis_order: AxisOrder,

    /// Policy for negative eigenvalues
    #[serde(default = "default_negative_eigenvalues")]
    pub negative_eigenvalues: NegativeEigenvalues,

    /// Eigenvalues at or below this are treated as zero variance
    #[serde(default = "default_degenerate_tolerance")]
    pub degenerate_tolerance: f64,
}

fn default_axis_order() -> AxisOrder {
    AxisOrder::Descending
}

fn default_negative_eigenvalues() -> NegativeEigenvalues {
    NegativeEigenvalues::Clamp
}

fn default_degenerate_tolerance() -> f64 {
    1e-12
}

impl Default for ErrorBarConfig {
    fn default() -> Self {
        Self {
            axis_order: default_axis_order(),
            negative_eigenvalues: default_negative_eigenvalues(),
            degenerate_tolerance: default_degenerate_tolerance(),
        }
    }
}

/// Configuration for reading sample CSV files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Header name of the x column (case-insensitive)
    #[serde(default = "default_x_column")]
    pub x_column: String,

    /// Header name of the y column (case-insensitive)
    #[serde(default = "default_y_column")]
    pub y_column: String,

    /// Optional label column used to split rows into groups
    #[serde(default)]
    pub group_column: Option<String>,

    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_x_column() -> String {
    "x".to_string()
}

fn default_y_column() -> String {
    "y".to_string()
}

fn default_delimiter() -> char {
    ','
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            x_column: default_x_column(),
            y_column: default_y_column(),
            group_column: None,
            delimiter: default_delimiter(),
        }
    }
}

/// Configuration for PNG rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// Maximum number of sample points drawn (subsamples if exceeded)
    #[serde(default = "default_plot_max_points")]
    pub max_points: usize,

    /// Alpha for sample points (0.0 to 1.0)
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Radius of sample points in pixels
    #[serde(default = "default_point_radius")]
    pub point_radius: u32,

    /// Stroke width of error bar segments in pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_plot_max_points() -> usize {
    1_000_000
}

fn default_alpha() -> f64 {
    0.5
}

fn default_point_radius() -> u32 {
    2
}

fn default_stroke_width() -> u32 {
    3
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            max_points: default_plot_max_points(),
            alpha: default_alpha(),
            point_radius: default_point_radius(),
            stroke_width: default_stroke_width(),
        }
    }
}

/// Configuration for directory batch processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Regex matched against file stems of candidate CSVs
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

fn default_pattern() -> String {
    ".*".to_string()
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
        }
    }
}

/// Top-level configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub errorbars: ErrorBarConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub plot: PlotConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

impl ToolConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ToolConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
