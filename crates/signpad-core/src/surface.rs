//! The drawing surface: captured strokes plus their rendered raster.

use crate::error::SignPadResult;
use crate::format::{ImageFormat, to_data_url};
use crate::options::PenStyle;
use crate::raster::Raster;
use crate::stroke::{Stroke, StrokePoint};
use kurbo::{Affine, Point, Size};

/// Owns the strokes and the device-pixel raster they are painted on.
///
/// Positions come in as CSS pixels and are mapped to device pixels with the
/// device pixel ratio captured at the last resize. Pen width follows the
/// pointer velocity: fast movement draws thinner lines.
#[derive(Debug, Clone)]
pub struct SignatureSurface {
    style: PenStyle,
    raster: Raster,
    css_size: Size,
    ratio: f64,
    strokes: Vec<Stroke>,
    current: Option<Stroke>,
    last_velocity: f64,
    last_width: f64,
}

impl SignatureSurface {
    /// Create a surface sized to `css_size` at the given device pixel ratio.
    ///
    /// Fails when the raster would exceed [`crate::raster::MAX_PIXELS`].
    pub fn new(style: PenStyle, css_size: Size, device_pixel_ratio: f64) -> SignPadResult<Self> {
        let ratio = effective_ratio(device_pixel_ratio);
        let raster = Raster::new(
            device_pixels(css_size.width, ratio),
            device_pixels(css_size.height, ratio),
            style.background,
        )?;
        Ok(Self {
            style,
            raster,
            css_size,
            ratio,
            strokes: Vec::new(),
            current: None,
            last_velocity: 0.0,
            last_width: (style.min_width + style.max_width) / 2.0,
        })
    }

    /// Re-scale to a new size and ratio. Drawn content is discarded.
    ///
    /// On error the surface is left as it was.
    pub fn resize(&mut self, css_size: Size, device_pixel_ratio: f64) -> SignPadResult<()> {
        *self = Self::new(self.style, css_size, device_pixel_ratio)?;
        Ok(())
    }

    /// Erase all content.
    pub fn clear(&mut self) {
        self.raster.clear();
        self.strokes.clear();
        self.current = None;
        self.reset_pen();
    }

    /// True when no stroke has been committed since the last clear or resize.
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Committed strokes, oldest first.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn css_size(&self) -> Size {
        self.css_size
    }

    /// Effective device pixel ratio (never below 1).
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Start a stroke at `position`. An unfinished stroke is committed first.
    pub fn begin_stroke(&mut self, position: Point, time_ms: f64) {
        if self.current.is_some() {
            self.end_stroke();
        }
        self.reset_pen();

        let point = StrokePoint {
            position,
            time_ms,
            width: self.style.dot_size,
        };
        let center = self.to_device(position);
        let radius = self.style.dot_size * self.ratio;
        self.raster.fill_disc(center, radius, self.style.pen);

        let mut stroke = Stroke::new();
        stroke.add_point(point);
        self.current = Some(stroke);
    }

    /// Extend the current stroke. Returns false if there is no stroke or the
    /// point is too close to the previous one.
    pub fn extend_stroke(&mut self, position: Point, time_ms: f64) -> bool {
        let Some(last) = self.current.as_ref().and_then(Stroke::last).copied() else {
            return false;
        };

        let distance = position.distance(last.position);
        if distance <= self.style.min_distance {
            return false;
        }

        let elapsed = time_ms - last.time_ms;
        let velocity = if elapsed > 0.0 { distance / elapsed } else { 0.0 };
        let w = self.style.velocity_filter_weight;
        let velocity = w * velocity + (1.0 - w) * self.last_velocity;
        let width = self.style.width_for_velocity(velocity);

        let from = self.to_device(last.position);
        let to = self.to_device(position);
        self.raster.fill_capsule(
            from,
            to,
            self.last_width * self.ratio,
            width * self.ratio,
            self.style.pen,
        );

        self.last_velocity = velocity;
        self.last_width = width;
        if let Some(stroke) = self.current.as_mut() {
            stroke.add_point(StrokePoint {
                position,
                time_ms,
                width,
            });
        }
        true
    }

    /// Finish the current stroke. Returns true if a stroke was committed.
    pub fn end_stroke(&mut self) -> bool {
        match self.current.take() {
            Some(stroke) if !stroke.is_empty() => {
                self.strokes.push(stroke);
                true
            }
            _ => false,
        }
    }

    /// Encode the current raster.
    pub fn encode(&self, format: ImageFormat, quality: f32) -> SignPadResult<Vec<u8>> {
        self.raster.encode(format, quality)
    }

    /// Encode the current raster as a `data:` URL.
    pub fn to_data_url(&self, format: ImageFormat, quality: f32) -> SignPadResult<String> {
        Ok(to_data_url(format, &self.encode(format, quality)?))
    }

    fn to_device(&self, position: Point) -> Point {
        Affine::scale(self.ratio) * position
    }

    fn reset_pen(&mut self) {
        self.last_velocity = 0.0;
        self.last_width = (self.style.min_width + self.style.max_width) / 2.0;
    }
}

fn effective_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() { ratio.max(1.0) } else { 1.0 }
}

fn device_pixels(css: f64, ratio: f64) -> u32 {
    (css * ratio).round().clamp(0.0, u32::MAX as f64) as u32
}
