//! Core data types and I/O operations.

pub mod geometry;
pub mod loaders;
pub mod writers;

pub use geometry::{Centroid, ErrorSegment, Point2};
pub use loaders::{load_grouped_csv, load_sample_csv, LoaderError, Sample, SampleGroup};
pub use writers::{write_segments_csv, SegmentRecord, WriteError};
