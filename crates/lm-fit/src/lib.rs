//! Randomized line fitting over binary edge maps.
//!
//! Core strategy:
//! - Collect edge pixels in row-major order.
//! - Draw pixel pairs from a seedable RNG and build the line through each.
//! - Rank candidates by banded cost (sum of edge values near the line per
//!   scanned row), not by inlier count.
//! - Accept the maximum-cost line through a ratio gate and an optional
//!   band-pixel gate.
//!
//! With the `rayon` feature candidates are scored in parallel; the reduction
//! runs in sample order, so results for a given seed are unchanged.

mod band;
mod config;
mod fitter;

pub use band::{BandScore, BandScorer};
pub use config::{FitConfig, InlierGate, ScanRows};
pub use fitter::{
    FitReport, FitResult, FitStats, LineFit, NoLineReason, RobustLineFitter, collect_points,
};
