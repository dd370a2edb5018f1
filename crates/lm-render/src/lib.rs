//! Line overlay rendering.
//!
//! The overlay has the frame's dimensions, a zeroed background and a single
//! stroked segment from column `0` to column `width` along
//! `y = slope * x + intercept`. Endpoint rows are truncated toward zero.
//!
//! A pixel is painted when its center lies within `thickness / 2` of the
//! segment (round caps).

use lm_core::{Error, Image, ImageView, Point2d, Rgb8, SlopeLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LineStyle {
    /// RGB.
    pub color: Rgb8,
    pub thickness: u32,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: [0, 0, 255],
            thickness: 2,
        }
    }
}

impl LineStyle {
    pub fn validate(&self) -> Result<(), Error> {
        if self.thickness == 0 {
            return Err(Error::InvalidParameter {
                name: "thickness",
                reason: "stroke thickness must be >= 1",
            });
        }
        Ok(())
    }

    fn radius(&self) -> f64 {
        self.thickness.max(1) as f64 / 2.0
    }
}

/// Segment endpoints for `line` across a frame `width` columns wide.
pub fn segment_endpoints(line: &SlopeLine, width: usize) -> (Point2d, Point2d) {
    let w = width as f64;
    let y1 = line.intercept as i64;
    let y2 = line.y_at(w) as i64;
    (
        Point2d { x: 0.0, y: y1 as f64 },
        Point2d { x: w, y: y2 as f64 },
    )
}

fn distance_to_segment(p: Point2d, a: Point2d, b: Point2d) -> f64 {
    let ab = b - a;
    let ap = p - a;
    let len2 = ab.dot(ab);
    let t = if len2 > 0.0 {
        (ap.dot(ab) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p - (a + ab * t)).norm()
}

/// Inclusive pixel range covering `[lo, hi]`, clipped to `0..len`.
fn clip_span(lo: f64, hi: f64, len: usize) -> Option<(usize, usize)> {
    if len == 0 || hi < 0.0 || lo > (len - 1) as f64 {
        return None;
    }
    let lo = lo.floor().max(0.0) as usize;
    let hi = (hi.ceil() as usize).min(len - 1);
    (lo <= hi).then_some((lo, hi))
}

/// Strokes the segment `a`-`b` onto `canvas`.
///
/// Walks the major axis of the segment and tests a small window across it, so
/// the cost follows the visible length, not the bounding box.
pub fn draw_segment(canvas: &mut Image<Rgb8>, a: Point2d, b: Point2d, style: &LineStyle) {
    if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
        return;
    }
    let (w, h) = canvas.dims();
    let r = style.radius();
    let pad = r * std::f64::consts::SQRT_2 + 1.0;
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let shallow = dx.abs() >= dy.abs();

    let (major_len, minor_len) = if shallow { (w, h) } else { (h, w) };
    let (m0, m1, d_major, d_minor, n0) = if shallow {
        (a.x, b.x, dx, dy, a.y)
    } else {
        (a.y, b.y, dy, dx, a.x)
    };

    let Some((lo, hi)) = clip_span(m0.min(m1) - r, m0.max(m1) + r, major_len) else {
        return;
    };

    let data = canvas.data_mut();
    for m in lo..=hi {
        let t = if d_major != 0.0 {
            ((m as f64 - m0) / d_major).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let center = n0 + t * d_minor;
        let Some((n_lo, n_hi)) = clip_span(center - pad, center + pad, minor_len) else {
            continue;
        };
        for n in n_lo..=n_hi {
            let (x, y) = if shallow { (m, n) } else { (n, m) };
            let p = Point2d {
                x: x as f64,
                y: y as f64,
            };
            if distance_to_segment(p, a, b) <= r {
                data[y * w + x] = style.color;
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LineRenderer {
    style: LineStyle,
}

impl LineRenderer {
    pub fn new(style: LineStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &LineStyle {
        &self.style
    }

    /// Overlay of `width x height` containing only the stroked line.
    pub fn render_size(&self, width: usize, height: usize, line: &SlopeLine) -> Image<Rgb8> {
        let mut canvas = Image::new_fill(width, height, [0u8; 3]);
        let (a, b) = segment_endpoints(line, width);
        draw_segment(&mut canvas, a, b, &self.style);
        canvas
    }

    /// Overlay matching `frame`'s dimensions. The frame itself is not read
    /// beyond its size.
    pub fn render(&self, frame: &ImageView<'_, Rgb8>, line: &SlopeLine) -> Image<Rgb8> {
        self.render_size(frame.width(), frame.height(), line)
    }
}
