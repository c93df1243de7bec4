//! Planar geometry value types for error bar output.

/// A point in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Mean point of a sample set, possibly overridden by the caller.
pub type Centroid = Point2;

/// A line segment through the centroid along one principal axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorSegment {
    pub start: Point2,
    pub end: Point2,
}

impl ErrorSegment {
    /// Build the segment `center - half * direction` to `center + half * direction`.
    pub fn along(center: Point2, direction: [f64; 2], half: f64) -> Self {
        let dx = half * direction[0];
        let dy = half * direction[1];
        Self {
            start: Point2::new(center.x - dx, center.y - dy),
            end: Point2::new(center.x + dx, center.y + dy),
        }
    }

    #[inline]
    pub fn midpoint(&self) -> Point2 {
        Point2::new(
            0.5 * (self.start.x + self.end.x),
            0.5 * (self.start.y + self.end.y),
        )
    }

    /// Vector from start to end (not normalized).
    #[inline]
    pub fn direction(&self) -> [f64; 2] {
        [self.end.x - self.start.x, self.end.y - self.start.y]
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    #[inline]
    pub fn half_length(&self) -> f64 {
        0.5 * self.length()
    }

    /// True when the segment has collapsed to (nearly) a point.
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        self.length() <= tolerance
    }

    /// Endpoint scalars as `(x0, y0, x1, y1)`.
    #[inline]
    pub fn coords(&self) -> (f64, f64, f64, f64) {
        (self.start.x, self.start.y, self.end.x, self.end.y)
    }

    /// X and Y endpoint pairs, the layout plotting layers take for a line.
    pub fn xy_pairs(&self) -> ([f64; 2], [f64; 2]) {
        ([self.start.x, self.end.x], [self.start.y, self.end.y])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_segment_along() {
        let seg = ErrorSegment::along(Point2::new(1.0, 2.0), [0.0, 1.0], 3.0);
        assert_eq!(seg.start, Point2::new(1.0, -1.0));
        assert_eq!(seg.end, Point2::new(1.0, 5.0));
        assert_eq!(seg.midpoint(), Point2::new(1.0, 2.0));
        assert_abs_diff_eq!(seg.half_length(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_length_segment_is_degenerate() {
        let seg = ErrorSegment::along(Point2::new(5.0, 5.0), [1.0, 0.0], 0.0);
        assert!(seg.is_degenerate(1e-12));
        assert_eq!(seg.coords(), (5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn test_xy_pairs() {
        let seg = ErrorSegment {
            start: Point2::new(0.0, 1.0),
            end: Point2::new(2.0, 3.0),
        };
        let (xs, ys) = seg.xy_pairs();
        assert_eq!(xs, [0.0, 2.0]);
        assert_eq!(ys, [1.0, 3.0]);
        assert_eq!(seg.direction(), [2.0, 2.0]);
    }
}
