//! Banded cost of a candidate line.
//!
//! For every scanned row `y` the line is solved for its column
//! `x = (y - intercept) / slope`, and the edge-map values on columns
//! `trunc(x - band/2) ..= trunc(x + band/2)` (truncation toward zero, clipped
//! to the map) are summed. Rows outside the map contribute nothing.
//!
//! Row prefix sums make each row an O(1) lookup; the result equals the direct
//! per-pixel sum.

use std::ops::RangeInclusive;

use lm_core::{ImageView, SlopeLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandScore {
    /// Sum of edge-map values inside the band.
    pub cost: u64,
    /// Number of nonzero pixels inside the band.
    pub pixels: usize,
}

#[derive(Debug, Clone)]
pub struct BandScorer {
    width: usize,
    height: usize,
    /// `height` rows of `width + 1` running sums.
    sums: Vec<u64>,
    counts: Vec<u32>,
}

impl BandScorer {
    pub fn new(map: &ImageView<'_, u8>) -> Self {
        let width = map.width();
        let height = map.height();
        let stride = width + 1;
        let mut sums = vec![0u64; stride * height];
        let mut counts = vec![0u32; stride * height];

        for y in 0..height {
            let base = y * stride;
            for (x, &v) in map.row(y).iter().enumerate() {
                sums[base + x + 1] = sums[base + x] + v as u64;
                counts[base + x + 1] = counts[base + x] + u32::from(v != 0);
            }
        }

        Self {
            width,
            height,
            sums,
            counts,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Sum over columns `lo..=hi` of row `y`, clipped to the map.
    pub fn row_band(&self, y: usize, lo: i64, hi: i64) -> BandScore {
        if y >= self.height || self.width == 0 || hi < 0 || lo >= self.width as i64 {
            return BandScore::default();
        }
        let lo = lo.max(0) as usize;
        let hi = (hi as usize).min(self.width - 1);
        if lo > hi {
            return BandScore::default();
        }

        let base = y * (self.width + 1);
        BandScore {
            cost: self.sums[base + hi + 1] - self.sums[base + lo],
            pixels: (self.counts[base + hi + 1] - self.counts[base + lo]) as usize,
        }
    }

    /// Banded score of `line` over `rows`; `None` for horizontal lines.
    pub fn score(
        &self,
        line: &SlopeLine,
        rows: RangeInclusive<usize>,
        band_width: usize,
    ) -> Option<BandScore> {
        if line.is_horizontal() {
            return None;
        }
        let half = band_width as f64 / 2.0;
        let last = *rows.end();
        let first = *rows.start();

        let mut total = BandScore::default();
        if first > last || first >= self.height {
            return Some(total);
        }

        for y in first..=last.min(self.height - 1) {
            let x = line.x_at(y as f64)?;
            let s = self.row_band(y, (x - half) as i64, (x + half) as i64);
            total.cost += s.cost;
            total.pixels += s.pixels;
        }
        Some(total)
    }
}
