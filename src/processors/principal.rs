//! Principal-axis error bars.
//!
//! The sample covariance matrix of paired x/y data is eigendecomposed. Each
//! eigenvector gives a principal axis and the square root of its eigenvalue
//! the standard deviation along it. One segment per axis is built, centred
//! on the centroid and reaching one standard deviation either side.
//!
//! # Example
//!
//! ```
//! use principal_errors::processors::principal::principal_errors;
//!
//! let x = [0.0, 2.0];
//! let y = [0.0, 0.0];
//! let (major, minor) = principal_errors(&x, &y, None, None).unwrap();
//!
//! assert!((major.half_length() - 2f64.sqrt()).abs() < 1e-12);
//! assert_eq!(minor.length(), 0.0);
//! ```

use log::{debug, warn};
use nalgebra::{Matrix2, SymmetricEigen};
use thiserror::Error;

use super::covariance::{check_lengths, mean, sample_covariance};
use crate::config::{AxisOrder, ErrorBarConfig, NegativeEigenvalues};
use crate::core::geometry::{Centroid, ErrorSegment};

/// Components below this magnitude are treated as zero when fixing the sign
/// of an eigenvector.
const SIGN_EPSILON: f64 = 1e-12;

/// Errors from the principal error computation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrincipalError {
    /// x and y do not pair up.
    #[error("sample size of variables not equal: x has {x_len} values, y has {y_len}")]
    DimensionMismatch { x_len: usize, y_len: usize },

    /// No observations at all.
    #[error("cannot compute principal errors of an empty sample")]
    EmptySample,

    /// The covariance matrix contains NaN or infinity.
    #[error("covariance matrix is not finite (input contains NaN or infinite values)")]
    NonFinite,
}

/// Result type for principal error operations.
pub type Result<T> = std::result::Result<T, PrincipalError>;

/// One principal axis of the covariance matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrincipalAxis {
    /// Variance along the axis.
    pub eigenvalue: f64,
    /// Standard deviation along the axis.
    pub sigma: f64,
    /// Unit direction of the axis.
    pub direction: [f64; 2],
}

/// Full result of a principal error computation.
#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalErrors {
    /// Centre of both segments (resolved from overrides or data means).
    pub centroid: Centroid,
    /// Sample covariance of the data.
    pub covariance: Matrix2<f64>,
    /// Axes in output order.
    pub axes: [PrincipalAxis; 2],
    /// Error bar segments, `segments[i]` along `axes[i]`.
    pub segments: [ErrorSegment; 2],
    /// Number of observations.
    pub sample_size: usize,
}

impl PrincipalErrors {
    /// Compute principal error bars for `x`/`y`.
    ///
    /// `x_mean` and `y_mean` override the segment centre. The covariance is
    /// always taken about the data's own means.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` is reported before any numeric work. Empty or
    /// non-finite input is rejected. Zero-variance and single-point input is
    /// accepted and yields zero-length segments (see [`Self::is_degenerate`]).
    pub fn compute(
        x: &[f64],
        y: &[f64],
        x_mean: Option<f64>,
        y_mean: Option<f64>,
        config: &ErrorBarConfig,
    ) -> Result<Self> {
        check_lengths(x, y)?;

        let centroid = Centroid::new(
            match x_mean {
                Some(m) => m,
                None => mean(x).ok_or(PrincipalError::EmptySample)?,
            },
            match y_mean {
                Some(m) => m,
                None => mean(y).ok_or(PrincipalError::EmptySample)?,
            },
        );

        let covariance = sample_covariance(x, y)?;
        let eigen = SymmetricEigen::new(covariance);

        let mut axes = [0usize, 1].map(|i| {
            let eigenvalue = eigen.eigenvalues[i];
            let column = eigen.eigenvectors.column(i);
            PrincipalAxis {
                eigenvalue,
                sigma: sigma_for(eigenvalue, config.negative_eigenvalues),
                direction: canonical_direction([column[0], column[1]]),
            }
        });

        if config.axis_order == AxisOrder::Descending && axes[1].eigenvalue > axes[0].eigenvalue {
            axes.swap(0, 1);
        }

        debug!(
            "n={} cov=[[{:.6}, {:.6}], [{:.6}, {:.6}]] eigenvalues=({:.6}, {:.6})",
            x.len(),
            covariance[(0, 0)],
            covariance[(0, 1)],
            covariance[(1, 0)],
            covariance[(1, 1)],
            axes[0].eigenvalue,
            axes[1].eigenvalue
        );

        let segments = axes.map(|axis| ErrorSegment::along(centroid, axis.direction, axis.sigma));

        let result = Self {
            centroid,
            covariance,
            axes,
            segments,
            sample_size: x.len(),
        };

        if result.is_degenerate(config.degenerate_tolerance) {
            warn!(
                "degenerate sample (n={}, eigenvalues {:e} and {:e}): error bars collapse toward the centroid",
                result.sample_size, result.axes[0].eigenvalue, result.axes[1].eigenvalue
            );
        }

        Ok(result)
    }

    /// True for fewer than two observations or when some axis carries no
    /// variance above `tolerance`.
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        self.sample_size < 2
            || self
                .axes
                .iter()
                .any(|axis| axis.eigenvalue.is_nan() || axis.eigenvalue <= tolerance)
    }

    /// Axis with the larger eigenvalue, regardless of output order.
    pub fn major_axis(&self) -> &PrincipalAxis {
        if self.axes[1].eigenvalue > self.axes[0].eigenvalue {
            &self.axes[1]
        } else {
            &self.axes[0]
        }
    }

    /// Both segments as a pair.
    #[inline]
    pub fn segment_pair(&self) -> (ErrorSegment, ErrorSegment) {
        (self.segments[0], self.segments[1])
    }
}

/// Compute the two principal error bar segments of `x`/`y`.
///
/// Uses [`ErrorBarConfig::default`]: major axis first, negative round-off
/// eigenvalues clamped to zero.
pub fn principal_errors(
    x: &[f64],
    y: &[f64],
    x_mean: Option<f64>,
    y_mean: Option<f64>,
) -> Result<(ErrorSegment, ErrorSegment)> {
    PrincipalErrors::compute(x, y, x_mean, y_mean, &ErrorBarConfig::default())
        .map(|errors| errors.segment_pair())
}

/// Standard deviation for an eigenvalue under the configured policy.
pub fn sigma_for(eigenvalue: f64, policy: NegativeEigenvalues) -> f64 {
    match policy {
        NegativeEigenvalues::Clamp => eigenvalue.max(0.0).sqrt(),
        NegativeEigenvalues::Propagate => eigenvalue.sqrt(),
    }
}

/// Fix the eigenvector sign so x is positive, or y when x is ~0.
fn canonical_direction(v: [f64; 2]) -> [f64; 2] {
    let flip = if v[0].abs() > SIGN_EPSILON {
        v[0] < 0.0
    } else {
        v[1] < 0.0
    };

    if flip {
        [-v[0], -v[1]]
    } else {
        v
    }
}
