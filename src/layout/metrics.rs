//! Box geometry
//!
//! Quadrilateral boxes as emitted by the OCR detector and the axis-aligned
//! summary every clustering decision is made on. Rotation is ignored: a box is
//! reduced to the min/max extents of its four corners.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed box geometry, rejected before it reaches the layout core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("box must have exactly 4 points, got {0}")]
    PointCount(usize),
    #[error("box point {index} has a non-finite coordinate ({x}, {y})")]
    NonFinite { index: usize, x: f64, y: f64 },
}

/// A single (x, y) image coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Four-point text box, serialized as `[[x, y], [x, y], [x, y], [x, y]]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "[Point; 4]")]
pub struct Quad(pub [Point; 4]);

impl Quad {
    /// Build a quad from a point list, checking count and finiteness
    pub fn from_points(points: &[Point]) -> Result<Self, GeometryError> {
        let corners: [Point; 4] = points
            .try_into()
            .map_err(|_| GeometryError::PointCount(points.len()))?;

        for (index, p) in corners.iter().enumerate() {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(GeometryError::NonFinite { index, x: p.x, y: p.y });
            }
        }

        Ok(Self(corners))
    }

    /// Axis-aligned rectangle as top-left, top-right, bottom-right, bottom-left
    pub fn axis_aligned(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self([
            Point::new(left, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(left, bottom),
        ])
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.0
    }

    pub fn metrics(&self) -> BoxMetrics {
        BoxMetrics::from_points(&self.0)
    }
}

impl TryFrom<Vec<Point>> for Quad {
    type Error = GeometryError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        Self::from_points(&points)
    }
}

impl From<Quad> for [Point; 4] {
    fn from(quad: Quad) -> Self {
        quad.0
    }
}

/// Axis-aligned extents of a box plus its center and size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMetrics {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl BoxMetrics {
    /// Compute extents over a non-empty point set
    ///
    /// An empty slice yields an all-zero box; callers validate point counts
    /// at the boundary (see [`Quad::from_points`]).
    pub fn from_points(points: &[Point]) -> Self {
        if points.is_empty() {
            return Self::from_extents(0.0, 0.0, 0.0, 0.0);
        }

        let left = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let right = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let top = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let bottom = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        Self::from_extents(left, top, right, bottom)
    }

    fn from_extents(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
            width: right - left,
            height: bottom - top,
            center_x: (left + right) / 2.0,
            center_y: (top + bottom) / 2.0,
        }
    }

    /// Euclidean distance between the two box centers
    pub fn center_distance(&self, other: &BoxMetrics) -> f64 {
        let dx = self.center_x - other.center_x;
        let dy = self.center_y - other.center_y;
        (dx * dx + dy * dy).sqrt()
    }
}
