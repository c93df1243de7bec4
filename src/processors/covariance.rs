//! Means and the 2×2 sample covariance matrix.

use nalgebra::Matrix2;

use super::principal::{PrincipalError, Result};

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Fail unless `x` and `y` pair up one-to-one.
#[inline]
pub fn check_lengths(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(PrincipalError::DimensionMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    Ok(())
}

/// Unbiased (N−1) covariance matrix of `x` and `y` about their own means.
///
/// A single observation carries no spread information, so N = 1 yields the
/// zero matrix rather than a 0/0 division.
///
/// # Errors
///
/// `DimensionMismatch` for unequal lengths, `EmptySample` for no data and
/// `NonFinite` if any entry of the result is NaN or infinite.
pub fn sample_covariance(x: &[f64], y: &[f64]) -> Result<Matrix2<f64>> {
    check_lengths(x, y)?;

    let n = x.len();
    let x_mean = mean(x).ok_or(PrincipalError::EmptySample)?;
    let y_mean = mean(y).ok_or(PrincipalError::EmptySample)?;

    if n < 2 {
        return Ok(Matrix2::zeros());
    }

    let (mut sxx, mut sxy, mut syy) = (0.0f64, 0.0f64, 0.0f64);
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    let denom = (n - 1) as f64;
    let cov = Matrix2::new(sxx / denom, sxy / denom, sxy / denom, syy / denom);

    if !cov.iter().all(|v| v.is_finite()) {
        return Err(PrincipalError::NonFinite);
    }

    Ok(cov)
}
