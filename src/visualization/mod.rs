//! Rendering of samples with their principal error bars.
//!
//! Produces a 2D scatter plot PNG with both error bar segments drawn on top
//! using the plotters library.

use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::config::PlotConfig;
use crate::core::geometry::ErrorSegment;
use crate::core::loaders::Sample;
use crate::processors::principal::PrincipalErrors;

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("Empty sample")]
    EmptySample,
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Default point color (cornflower blue).
const POINT_COLOR: (u8, u8, u8) = (100, 149, 237);

/// Major axis color (red).
const MAJOR_COLOR: RGBColor = RGBColor(228, 26, 28);

/// Minor axis color (green).
const MINOR_COLOR: RGBColor = RGBColor(77, 175, 74);

/// Plot `sample` as a scatter with both error bar segments and save as PNG.
///
/// The major-axis segment is drawn in red and the minor-axis one in green.
/// Axis bounds cover all points and all finite segment endpoints.
///
/// # Errors
///
/// Returns `EmptySample` for a sample without points, or a plotting error
/// if the PNG cannot be rendered or written.
pub fn plot_error_bars(
    output_path: &Path,
    sample: &Sample,
    errors: &PrincipalErrors,
    config: &PlotConfig,
) -> Result<()> {
    if sample.is_empty() {
        return Err(VisualizationError::EmptySample);
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let alpha = config.alpha.clamp(0.0, 1.0);
    let point_color = RGBAColor(POINT_COLOR.0, POINT_COLOR.1, POINT_COLOR.2, alpha);

    let points = subsample_points(sample, config.max_points);

    let major_first = errors.axes[0].eigenvalue >= errors.axes[1].eigenvalue;
    let (major, minor) = if major_first {
        (errors.segments[0], errors.segments[1])
    } else {
        (errors.segments[1], errors.segments[0])
    };

    let (x_min, x_max, y_min, y_max) = compute_bounds(&points, &[major, minor]);
    let x_padding = (x_max - x_min) * 0.05;
    let y_padding = (y_max - y_min) * 0.05;

    // Create the plot
    let root = BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();

    root.fill(&WHITE)
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(
            (x_min - x_padding)..(x_max + x_padding),
            (y_min - y_padding)..(y_max + y_padding),
        )
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    // No tick labels: no font backend is compiled in
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(0)
        .y_labels(0)
        .draw()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), config.point_radius, point_color.filled())),
        )
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    for (segment, color) in [(major, MAJOR_COLOR), (minor, MINOR_COLOR)] {
        if !segment_is_finite(&segment) {
            log::warn!("skipping non-finite error bar segment {:?}", segment.coords());
            continue;
        }
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![
                    (segment.start.x, segment.start.y),
                    (segment.end.x, segment.end.y),
                ],
                color.stroke_width(config.stroke_width),
            )))
            .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;
    }

    root.present()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    Ok(())
}

/// Evenly strided points from `sample`, at most `max_points` of them.
fn subsample_points(sample: &Sample, max_points: usize) -> Vec<(f64, f64)> {
    let n = sample.len().min(sample.y.len());
    let max_points = max_points.max(1);
    let step = n.div_ceil(max_points).max(1);

    (0..n)
        .step_by(step)
        .map(|i| (sample.x[i], sample.y[i]))
        .collect()
}

fn segment_is_finite(segment: &ErrorSegment) -> bool {
    let (x0, y0, x1, y1) = segment.coords();
    x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()
}

/// Compute the bounds (min/max) over points and finite segment endpoints.
fn compute_bounds(points: &[(f64, f64)], segments: &[ErrorSegment]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    let endpoints = segments
        .iter()
        .filter(|s| segment_is_finite(s))
        .flat_map(|s| [(s.start.x, s.start.y), (s.end.x, s.end.y)]);

    for (x, y) in points.iter().copied().chain(endpoints) {
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if x_min > x_max {
        // Nothing finite to plot
        return (-1.0, 1.0, -1.0, 1.0);
    }

    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    (x_min, x_max, y_min, y_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErrorBarConfig;
    use crate::core::geometry::Point2;
    use tempfile::tempdir;

    fn small_config() -> PlotConfig {
        PlotConfig {
            width: 200,
            height: 150,
            ..PlotConfig::default()
        }
    }

    #[test]
    fn test_subsample_points_respects_max_points() {
        let sample = Sample::new((0..15).map(f64::from).collect(), vec![0.0; 15]);

        let points = subsample_points(&sample, 10);
        assert!(points.len() <= 10);
        assert_eq!(points.len(), 8);
        assert_eq!(points[1], (2.0, 0.0));

        assert_eq!(subsample_points(&sample, 15).len(), 15);
        assert_eq!(subsample_points(&sample, 100).len(), 15);
        assert_eq!(subsample_points(&sample, 0).len(), 1);
    }

    #[test]
    fn test_compute_bounds_includes_segments() {
        let points = [(0.0, 0.0), (1.0, 1.0)];
        let segment = ErrorSegment {
            start: Point2::new(-2.0, 0.5),
            end: Point2::new(3.0, 0.5),
        };

        let (x_min, x_max, y_min, y_max) = compute_bounds(&points, &[segment]);
        assert_eq!((x_min, x_max), (-2.0, 3.0));
        assert_eq!((y_min, y_max), (0.0, 1.0));
    }

    #[test]
    fn test_compute_bounds_single_point_is_padded() {
        let (x_min, x_max, y_min, y_max) = compute_bounds(&[(5.0, 5.0)], &[]);
        assert_eq!((x_min, x_max, y_min, y_max), (4.0, 6.0, 4.0, 6.0));
    }

    #[test]
    fn test_compute_bounds_skips_nan_segments() {
        let segment = ErrorSegment {
            start: Point2::new(f64::NAN, 0.0),
            end: Point2::new(f64::NAN, 0.0),
        };
        let (x_min, x_max, _, _) = compute_bounds(&[(0.0, 0.0), (2.0, 1.0)], &[segment]);
        assert_eq!((x_min, x_max), (0.0, 2.0));
    }

    #[test]
    fn test_plot_error_bars_writes_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plots").join("errors.png");
        let sample = Sample::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.5, 1.5, 1.0, 3.0]);
        let errors =
            PrincipalErrors::compute(&sample.x, &sample.y, None, None, &ErrorBarConfig::default())
                .unwrap();

        plot_error_bars(&path, &sample, &errors, &small_config()).unwrap();

        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_plot_empty_sample() {
        let dir = tempdir().unwrap();
        let errors =
            PrincipalErrors::compute(&[1.0], &[1.0], None, None, &ErrorBarConfig::default()).unwrap();

        let result = plot_error_bars(
            &dir.path().join("empty.png"),
            &Sample::default(),
            &errors,
            &small_config(),
        );
        assert!(matches!(result, Err(VisualizationError::EmptySample)));
    }
}
