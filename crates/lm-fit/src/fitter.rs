use std::ops::RangeInclusive;

use lm_core::{ImageView, Point2i, SlopeLine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::band::{BandScore, BandScorer};
use crate::config::{FitConfig, InlierGate};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineFit {
    pub line: SlopeLine,
    pub cost: u64,
    /// Nonzero pixels inside the band over the scanned rows.
    pub band_pixels: usize,
    /// Iteration that drew the winning pair.
    pub sample_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NoLineReason {
    /// Fewer than two edge pixels.
    TooFewPoints,
    /// Every scored sample had zero cost, or none could be scored.
    NoPositiveCost,
    BelowAcceptance,
    /// Rejected by [`InlierGate::BandPixels`].
    TooFewInliers,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FitResult {
    Line(LineFit),
    NoLine(NoLineReason),
}

impl FitResult {
    pub fn line(&self) -> Option<&LineFit> {
        match self {
            Self::Line(fit) => Some(fit),
            Self::NoLine(_) => None,
        }
    }

    pub fn is_line(&self) -> bool {
        matches!(self, Self::Line(_))
    }
}

/// Sampling diagnostics of a single fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitStats {
    pub points: usize,
    pub samples: usize,
    /// Pairs sharing a column.
    pub skipped_vertical: usize,
    /// Pairs with zero slope.
    pub skipped_horizontal: usize,
    pub scored: usize,
    pub max_cost: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitReport {
    pub result: FitResult,
    pub stats: FitStats,
}

/// Two distinct indices in `0..n`, uniformly, for `n >= 2`.
fn draw_pair<R: Rng + ?Sized>(rng: &mut R, n: usize) -> (usize, usize) {
    let i = rng.gen_range(0..n);
    let mut j = rng.gen_range(0..n - 1);
    if j >= i {
        j += 1;
    }
    (i, j)
}

/// Nonzero pixels of `map` in row-major order.
pub fn collect_points(map: &ImageView<'_, u8>) -> Vec<Point2i> {
    let mut points = Vec::new();
    for y in 0..map.height() {
        for (x, &v) in map.row(y).iter().enumerate() {
            if v > 0 {
                points.push(Point2i { x, y });
            }
        }
    }
    points
}

#[cfg(feature = "rayon")]
fn score_candidates(
    scorer: &BandScorer,
    candidates: &[Option<SlopeLine>],
    rows: &RangeInclusive<usize>,
    band_width: usize,
) -> Vec<Option<BandScore>> {
    candidates
        .par_iter()
        .map(|c| c.and_then(|line| scorer.score(&line, rows.clone(), band_width)))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn score_candidates(
    scorer: &BandScorer,
    candidates: &[Option<SlopeLine>],
    rows: &RangeInclusive<usize>,
    band_width: usize,
) -> Vec<Option<BandScore>> {
    candidates
        .iter()
        .map(|c| c.and_then(|line| scorer.score(&line, rows.clone(), band_width)))
        .collect()
}

/// Randomized line search that ranks candidates by banded cost.
///
/// Each iteration draws two distinct edge pixels, builds the line through
/// them and sums the edge map inside a `band_width` column band around it on
/// every scanned row. Pairs sharing a column and pairs with zero slope are
/// skipped. The highest-cost line wins, the earliest sample breaking ties, and
/// is returned when its cost exceeds `acceptance_ratio` times the maximum.
///
/// Pairs are always drawn in iteration order from the caller's RNG, so the
/// outcome for a given seed does not depend on whether scoring runs in
/// parallel.
#[derive(Debug, Clone, Default)]
pub struct RobustLineFitter {
    cfg: FitConfig,
}

impl RobustLineFitter {
    pub fn new(cfg: FitConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &FitConfig {
        &self.cfg
    }

    pub fn set_config(&mut self, cfg: FitConfig) {
        self.cfg = cfg;
    }

    /// Fits with a fresh `StdRng` seeded from [`FitConfig::seed`].
    pub fn fit_seeded(&self, map: &ImageView<'_, u8>, rows: RangeInclusive<usize>) -> FitReport {
        let mut rng = StdRng::seed_from_u64(self.cfg.seed);
        self.fit(map, rows, &mut rng)
    }

    #[instrument(
        level = "debug",
        skip(self, map, rng),
        fields(w = map.width(), h = map.height())
    )]
    pub fn fit<R: Rng + ?Sized>(
        &self,
        map: &ImageView<'_, u8>,
        rows: RangeInclusive<usize>,
        rng: &mut R,
    ) -> FitReport {
        let points = collect_points(map);
        let mut stats = FitStats {
            points: points.len(),
            ..FitStats::default()
        };

        if points.len() < 2 {
            debug!(points = points.len(), "not enough edge points to sample");
            return FitReport {
                result: FitResult::NoLine(NoLineReason::TooFewPoints),
                stats,
            };
        }

        let mut candidates = Vec::with_capacity(self.cfg.iterations);
        for _ in 0..self.cfg.iterations {
            let (i, j) = draw_pair(rng, points.len());
            let candidate = match SlopeLine::through(points[i], points[j]) {
                None => {
                    stats.skipped_vertical += 1;
                    None
                }
                Some(line) if line.is_horizontal() => {
                    stats.skipped_horizontal += 1;
                    None
                }
                Some(line) => Some(line),
            };
            candidates.push(candidate);
        }
        stats.samples = candidates.len();

        let scorer = BandScorer::new(map);
        let scores = score_candidates(&scorer, &candidates, &rows, self.cfg.band_width);

        let mut best: Option<(usize, SlopeLine, BandScore)> = None;
        for (idx, (line, score)) in candidates.iter().zip(scores.iter()).enumerate() {
            let (Some(line), Some(score)) = (line, score) else {
                continue;
            };
            stats.scored += 1;
            if score.cost > stats.max_cost {
                stats.max_cost = score.cost;
                best = Some((idx, *line, *score));
            }
        }

        let result = self.accept(best, stats.max_cost);
        debug!(
            points = stats.points,
            samples = stats.samples,
            scored = stats.scored,
            skipped_vertical = stats.skipped_vertical,
            skipped_horizontal = stats.skipped_horizontal,
            max_cost = stats.max_cost,
            accepted = result.is_line(),
            "line fit finished"
        );

        FitReport { result, stats }
    }

    fn accept(&self, best: Option<(usize, SlopeLine, BandScore)>, max_cost: u64) -> FitResult {
        let Some((sample_index, line, score)) = best else {
            return FitResult::NoLine(NoLineReason::NoPositiveCost);
        };
        if score.cost as f64 <= self.cfg.acceptance_ratio * max_cost as f64 {
            return FitResult::NoLine(NoLineReason::BelowAcceptance);
        }
        if self.cfg.inlier_gate == InlierGate::BandPixels && score.pixels < self.cfg.min_inliers {
            return FitResult::NoLine(NoLineReason::TooFewInliers);
        }
        FitResult::Line(LineFit {
            line,
            cost: score.cost,
            band_pixels: score.pixels,
            sample_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use lm_core::{Image, Point2i};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{FitResult, NoLineReason, RobustLineFitter, collect_points, draw_pair};
    use crate::config::{FitConfig, InlierGate};

    fn set(img: &mut Image<u8>, x: usize, y: usize) {
        let w = img.width();
        img.data_mut()[y * w + x] = 255;
    }

    /// `y = slope * x + intercept` drawn `half` pixels to each side per row.
    fn slanted_band(w: usize, h: usize, slope: f64, intercept: f64, half: usize) -> Image<u8> {
        let mut img = Image::new_fill(w, h, 0u8);
        for y in 0..h {
            let xc = ((y as f64 - intercept) / slope).round() as i64;
            for x in (xc - half as i64)..=(xc + half as i64) {
                if x >= 0 && (x as usize) < w {
                    set(&mut img, x as usize, y);
                }
            }
        }
        img
    }

    #[test]
    fn pair_indices_are_distinct_and_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in [2, 3, 10] {
            for _ in 0..500 {
                let (i, j) = draw_pair(&mut rng, n);
                assert_ne!(i, j);
                assert!(i < n && j < n);
            }
        }
    }

    #[test]
    fn points_are_row_major() {
        let mut img = Image::new_fill(4, 3, 0u8);
        set(&mut img, 3, 0);
        set(&mut img, 0, 2);
        set(&mut img, 1, 0);
        assert_eq!(
            collect_points(&img.as_view()),
            vec![
                Point2i { x: 1, y: 0 },
                Point2i { x: 3, y: 0 },
                Point2i { x: 0, y: 2 },
            ]
        );
    }

    #[test]
    fn thin_diagonal_is_recovered_exactly() {
        let mut img = Image::new_fill(100, 100, 0u8);
        for i in 0..100 {
            set(&mut img, i, i);
        }
        let fitter = RobustLineFitter::new(FitConfig::default());
        let report = fitter.fit_seeded(&img.as_view(), 10..=90);

        let fit = report.result.line().expect("diagonal is found");
        assert_eq!(fit.line.slope, 1.0);
        assert_eq!(fit.line.intercept, 0.0);
        // One pixel per scanned row.
        assert_eq!(fit.band_pixels, 81);
        assert_eq!(fit.cost, 81 * 255);
        assert_eq!(report.stats.skipped_vertical, 0);
        assert_eq!(report.stats.skipped_horizontal, 0);
        assert_eq!(report.stats.scored, 1000);
    }

    #[test]
    fn slanted_band_is_tracked_within_band() {
        let (w, h) = (240, 200);
        let (slope, intercept) = (1.6, -40.0);
        let img = slanted_band(w, h, slope, intercept, 1);
        let cfg = FitConfig {
            seed: 11,
            ..FitConfig::default()
        };
        let rows = 20..=180;
        let report = RobustLineFitter::new(cfg.clone()).fit_seeded(&img.as_view(), rows.clone());

        let fit = report.result.line().expect("band is found");
        for y in rows {
            let truth = (y as f64 - intercept) / slope;
            let got = fit.line.x_at(y as f64).expect("sloped");
            assert!(
                (got - truth).abs() <= cfg.band_width as f64 / 2.0 + 1.0,
                "row {y}: {got} vs {truth}"
            );
        }
        assert!((fit.line.slope - slope).abs() / slope < 0.3);
    }

    #[test]
    fn all_zero_map_has_no_line() {
        let img = Image::new_fill(64, 48, 0u8);
        let report = RobustLineFitter::default().fit_seeded(&img.as_view(), 4..=43);
        assert_eq!(
            report.result,
            FitResult::NoLine(NoLineReason::TooFewPoints)
        );
        assert_eq!(report.stats.points, 0);
        assert_eq!(report.stats.samples, 0);
    }

    #[test]
    fn single_point_has_no_line() {
        let mut img = Image::new_fill(8, 8, 0u8);
        set(&mut img, 4, 4);
        let report = RobustLineFitter::default().fit_seeded(&img.as_view(), 0..=7);
        assert_eq!(
            report.result,
            FitResult::NoLine(NoLineReason::TooFewPoints)
        );
    }

    #[test]
    fn only_degenerate_pairs_yield_no_positive_cost() {
        // Two pixels in one column: every pair is vertical.
        let mut img = Image::new_fill(8, 8, 0u8);
        set(&mut img, 2, 1);
        set(&mut img, 2, 6);
        let report = RobustLineFitter::default().fit_seeded(&img.as_view(), 0..=7);
        assert_eq!(
            report.result,
            FitResult::NoLine(NoLineReason::NoPositiveCost)
        );
        assert_eq!(report.stats.skipped_vertical, 1000);

        // Two pixels in one row: every pair is horizontal.
        let mut img = Image::new_fill(8, 8, 0u8);
        set(&mut img, 1, 3);
        set(&mut img, 6, 3);
        let report = RobustLineFitter::default().fit_seeded(&img.as_view(), 0..=7);
        assert_eq!(
            report.result,
            FitResult::NoLine(NoLineReason::NoPositiveCost)
        );
        assert_eq!(report.stats.skipped_horizontal, 1000);
    }

    #[test]
    fn vertical_band_exercises_degenerate_slopes() {
        let mut img = Image::new_fill(100, 100, 0u8);
        for y in 0..100 {
            for x in 48..=52 {
                set(&mut img, x, y);
            }
        }
        let report = RobustLineFitter::default().fit_seeded(&img.as_view(), 10..=90);

        assert!(report.stats.skipped_vertical > 0);
        assert!(report.stats.skipped_horizontal > 0);
        let fit = report.result.line().expect("near-vertical line");
        // The whole band is covered on every scanned row.
        assert_eq!(fit.cost, 81 * 5 * 255);
        for y in [10.0, 50.0, 90.0] {
            let x = fit.line.x_at(y).expect("sloped");
            assert!((38.0..=62.0).contains(&x), "x({y}) = {x}");
        }
    }

    #[test]
    fn same_seed_gives_identical_fits() {
        let img = slanted_band(160, 120, -0.9, 130.0, 2);
        let fitter = RobustLineFitter::new(FitConfig {
            seed: 99,
            ..FitConfig::default()
        });
        let a = fitter.fit_seeded(&img.as_view(), 12..=108);
        let b = fitter.fit_seeded(&img.as_view(), 12..=108);
        assert_eq!(a, b);

        let mut rng = StdRng::seed_from_u64(99);
        let c = fitter.fit(&img.as_view(), 12..=108, &mut rng);
        assert_eq!(a, c);
    }

    #[test]
    fn inlier_gate_uses_band_pixels() {
        let mut img = Image::new_fill(100, 100, 0u8);
        for i in 0..100 {
            set(&mut img, i, i);
        }

        let gated = |min_inliers| FitConfig {
            inlier_gate: InlierGate::BandPixels,
            min_inliers,
            ..FitConfig::default()
        };
        let ok = RobustLineFitter::new(gated(50)).fit_seeded(&img.as_view(), 10..=90);
        assert!(ok.result.is_line());

        let rejected = RobustLineFitter::new(gated(100)).fit_seeded(&img.as_view(), 10..=90);
        assert_eq!(
            rejected.result,
            FitResult::NoLine(NoLineReason::TooFewInliers)
        );

        // The default gate ignores min_inliers.
        let ignored = RobustLineFitter::new(FitConfig {
            min_inliers: 100,
            ..FitConfig::default()
        })
        .fit_seeded(&img.as_view(), 10..=90);
        assert!(ignored.result.is_line());
    }

    #[test]
    fn acceptance_ratio_of_one_rejects_everything() {
        let mut img = Image::new_fill(100, 100, 0u8);
        for i in 0..100 {
            set(&mut img, i, i);
        }
        let report = RobustLineFitter::new(FitConfig {
            acceptance_ratio: 1.0,
            ..FitConfig::default()
        })
        .fit_seeded(&img.as_view(), 10..=90);
        assert_eq!(
            report.result,
            FitResult::NoLine(NoLineReason::BelowAcceptance)
        );
        assert_eq!(report.stats.max_cost, 81 * 255);
    }
}
