//! Numeric processing: covariance, principal axes and batch runs.

pub mod batch;
pub mod covariance;
pub mod principal;

// Re-export key types for convenience
pub use batch::{
    compute_groups, find_sample_files, process_directory, process_file, BatchError, BatchSummary,
    GroupResult,
};
pub use covariance::{mean, sample_covariance};
pub use principal::{principal_errors, PrincipalAxis, PrincipalError, PrincipalErrors};
