//! Principal-axis error bars for 2D sample data.
//!
//! This crate provides tools for:
//! - Computing the unbiased sample covariance of paired x/y data
//! - Eigendecomposing it into principal axes
//! - Building one error bar segment per axis, one standard deviation long
//!   on either side of the centroid
//! - Loading samples from CSV, writing segments, and rendering them as PNG
//!
//! # Example
//!
//! ```
//! use principal_errors::principal_errors;
//!
//! let x = [1.0, 2.0, 3.0, 4.0];
//! let y = [2.0, 4.0, 5.0, 9.0];
//! let (major, minor) = principal_errors(&x, &y, None, None).unwrap();
//!
//! assert!(major.half_length() >= minor.half_length());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{AxisOrder, ErrorBarConfig, InputConfig, NegativeEigenvalues, PlotConfig, ToolConfig};
pub use core::geometry::{Centroid, ErrorSegment, Point2};
pub use core::loaders::Sample;
pub use processors::principal::{principal_errors, PrincipalError, PrincipalErrors};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
