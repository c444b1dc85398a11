//! Captured pen strokes.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// One sampled pen position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    /// Position in CSS pixels.
    pub position: Point,
    /// Timestamp in milliseconds.
    pub time_ms: f64,
    /// Pen width at this point, in CSS pixels.
    pub width: f64,
}

/// A continuous pointer drag (series of points).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stroke {
    /// Points in the stroke.
    pub points: Vec<StrokePoint>,
}

impl Stroke {
    /// Create a new empty stroke.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point to the stroke.
    pub fn add_point(&mut self, point: StrokePoint) {
        self.points.push(point);
    }

    /// Last point, if any.
    pub fn last(&self) -> Option<&StrokePoint> {
        self.points.last()
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the stroke is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A tap without movement, rendered as a dot.
    pub fn is_dot(&self) -> bool {
        self.points.len() == 1
    }
}
