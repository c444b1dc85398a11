//! Software raster backing the drawing surface.

use crate::error::{SignPadError, SignPadResult};
use crate::format::ImageFormat;
use kurbo::{Point, Rect, Vec2};
use peniko::Color;

/// Largest raster, in device pixels, a surface may allocate.
pub const MAX_PIXELS: u64 = 1 << 25;

/// An RGBA8 pixel buffer in device pixels.
#[derive(Debug, Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    background: [u8; 4],
}

fn rgba(color: Color) -> [u8; 4] {
    let c = color.to_rgba8();
    [c.r, c.g, c.b, c.a]
}

impl Raster {
    /// Create a raster filled with `background`. Dimensions are clamped to one pixel.
    ///
    /// Fails with [`SignPadError::InvalidSurface`] above [`MAX_PIXELS`].
    pub fn new(width: u32, height: u32, background: Color) -> SignPadResult<Self> {
        let width = width.max(1);
        let height = height.max(1);
        let area = u64::from(width) * u64::from(height);
        if area > MAX_PIXELS {
            return Err(SignPadError::InvalidSurface(format!(
                "{width}x{height} device pixels exceeds the {MAX_PIXELS} pixel limit"
            )));
        }
        let len = usize::try_from(area * 4).map_err(|_| {
            SignPadError::InvalidSurface(format!("{width}x{height} does not fit in memory"))
        })?;
        let mut raster = Self {
            width,
            height,
            pixels: vec![0; len],
            background: rgba(background),
        };
        raster.clear();
        Ok(raster)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        let mut px = [0; 4];
        px.copy_from_slice(&self.pixels[i..i + 4]);
        Some(px)
    }

    /// Fill every pixel with the background color.
    pub fn clear(&mut self) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&self.background);
        }
    }

    /// Whether every pixel still has the background color.
    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px == self.background)
    }

    /// Paint an anti-aliased disc.
    pub fn fill_disc(&mut self, center: Point, radius: f64, color: Color) {
        self.fill_capsule(center, center, radius, radius, color);
    }

    /// Paint a segment whose half-width varies linearly from `r0` to `r1`.
    pub fn fill_capsule(&mut self, p0: Point, p1: Point, r0: f64, r1: f64, color: Color) {
        let color = rgba(color);
        let reach = r0.max(r1) + 1.0;
        let bounds = Rect::from_points(p0, p1).inflate(reach, reach);
        let Some((x0, y0, x1, y1)) = self.clip(bounds) else {
            return;
        };

        let seg = p1 - p0;
        let len_sq = seg.hypot2();

        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let t = if len_sq < f64::EPSILON {
                    0.0
                } else {
                    ((center - p0).dot(seg) / len_sq).clamp(0.0, 1.0)
                };
                let nearest = p0 + seg * t;
                let dist = Vec2::new(center.x - nearest.x, center.y - nearest.y).hypot();
                let radius = r0 + (r1 - r0) * t;
                let coverage = (radius - dist + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }

    /// Encode the raster in the given format.
    ///
    /// `quality` is only used for JPEG and is clamped to `0.0..=1.0`.
    pub fn encode(&self, format: ImageFormat, quality: f32) -> SignPadResult<Vec<u8>> {
        match format {
            ImageFormat::Png => self.encode_png(),
            ImageFormat::Jpeg => self.encode_jpeg(quality),
        }
    }

    fn encode_png(&self) -> SignPadResult<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| SignPadError::Encode(e.to_string()))?;
            writer
                .write_image_data(&self.pixels)
                .map_err(|e| SignPadError::Encode(e.to_string()))?;
            writer
                .finish()
                .map_err(|e| SignPadError::Encode(e.to_string()))?;
        }
        Ok(out)
    }

    fn encode_jpeg(&self, quality: f32) -> SignPadResult<Vec<u8>> {
        // JPEG has no alpha channel, so flatten onto white.
        let rgb: Vec<u8> = self
            .pixels
            .chunks_exact(4)
            .flat_map(|px| {
                let a = px[3] as u32;
                let flatten = |c: u8| ((c as u32 * a + 255 * (255 - a)) / 255) as u8;
                [flatten(px[0]), flatten(px[1]), flatten(px[2])]
            })
            .collect();

        let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
        let mut out = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
        let color = image::ExtendedColorType::Rgb8;
        encoder
            .encode(&rgb, self.width, self.height, color)
            .map_err(|e| SignPadError::Encode(e.to_string()))?;
        Ok(out)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + x as usize) * 4
    }

    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.x0.floor().max(0.0);
        let y0 = rect.y0.floor().max(0.0);
        let x1 = rect.x1.ceil().min(self.width as f64);
        let y1 = rect.y1.ceil().min(self.height as f64);
        if !(x0 < x1 && y0 < y1) {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    /// Source-over blend of `color` scaled by `coverage`.
    fn blend(&mut self, x: u32, y: u32, color: [u8; 4], coverage: f64) {
        let i = self.index(x, y);
        let sa = coverage * color[3] as f64 / 255.0;
        let da = self.pixels[i + 3] as f64 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return;
        }
        for c in 0..3 {
            let src = color[c] as f64;
            let dst = self.pixels[i + c] as f64;
            let v = (src * sa + dst * da * (1.0 - sa)) / out_a;
            self.pixels[i + c] = v.round().clamp(0.0, 255.0) as u8;
        }
        self.pixels[i + 3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}
