//! Pen and background style options.

use crate::error::{SignPadError, SignPadResult};
use peniko::Color;
use peniko::color::{Srgb, parse_color};
use serde::{Deserialize, Serialize};

/// Style configuration accepted from the host.
///
/// Field names follow the host-side option object (`penColor`, `minWidth`, ...),
/// and every field is optional when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PadOptions {
    /// CSS color painted under the strokes.
    pub background_color: String,
    /// CSS color of the pen.
    pub pen_color: String,
    /// Minimum line width in CSS pixels.
    pub min_width: f64,
    /// Maximum line width in CSS pixels.
    pub max_width: f64,
    /// Radius of a single-tap dot. Zero means the mean of min and max width.
    pub dot_size: f64,
    /// Weight of the newest velocity sample in the width filter.
    pub velocity_filter_weight: f64,
    /// Points closer than this to the previous point are dropped.
    pub min_distance: f64,
}

impl Default for PadOptions {
    fn default() -> Self {
        Self {
            background_color: "white".to_string(),
            pen_color: "black".to_string(),
            min_width: 0.7,
            max_width: 2.0,
            dot_size: 1.5,
            velocity_filter_weight: 0.7,
            min_distance: 5.0,
        }
    }
}

impl PadOptions {
    /// Parse colors and check widths.
    pub fn resolve(&self) -> SignPadResult<PenStyle> {
        if !(self.min_width > 0.0 && self.max_width >= self.min_width) {
            return Err(SignPadError::Config(format!(
                "invalid pen widths: min {} max {}",
                self.min_width, self.max_width
            )));
        }
        if self.dot_size < 0.0 || self.min_distance < 0.0 {
            return Err(SignPadError::Config(
                "dotSize and minDistance must not be negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.velocity_filter_weight) {
            return Err(SignPadError::Config(format!(
                "velocityFilterWeight must be within 0..=1, got {}",
                self.velocity_filter_weight
            )));
        }

        Ok(PenStyle {
            background: parse_css_color(&self.background_color)?,
            pen: parse_css_color(&self.pen_color)?,
            min_width: self.min_width,
            max_width: self.max_width,
            dot_size: if self.dot_size > 0.0 {
                self.dot_size
            } else {
                (self.min_width + self.max_width) / 2.0
            },
            velocity_filter_weight: self.velocity_filter_weight,
            min_distance: self.min_distance,
        })
    }
}

/// Validated style used by the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenStyle {
    pub background: Color,
    pub pen: Color,
    pub min_width: f64,
    pub max_width: f64,
    pub dot_size: f64,
    pub velocity_filter_weight: f64,
    pub min_distance: f64,
}

impl PenStyle {
    /// Width for a given smoothed velocity (CSS pixels per millisecond).
    pub fn width_for_velocity(&self, velocity: f64) -> f64 {
        (self.max_width / (velocity + 1.0)).max(self.min_width)
    }
}

fn parse_css_color(value: &str) -> SignPadResult<Color> {
    parse_color(value.trim())
        .map(|c| c.to_alpha_color::<Srgb>())
        .map_err(|e| SignPadError::Config(format!("invalid color {value:?}: {e}")))
}
