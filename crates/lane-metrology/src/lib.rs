//! Per-frame lane boundary estimation.
//!
//! Pipeline: RGB frame -> luma -> hat-kernel correlation -> binary edge map
//! -> randomized banded-cost line fit -> stroked overlay.
//!
//! The building blocks live in the `lm-*` crates and are re-exported here.
//! [`LaneEstimator`] wires them together for a session of equally sized
//! frames, and [`LaneEstimator::run`] drives a [`FrameSource`] into a
//! [`FrameSink`].

mod config;
mod pipeline;

pub use config::LaneConfig;
pub use pipeline::{
    FrameOutput, FrameReport, FrameSink, FrameSource, LaneEstimator, RunError, RunSummary,
    StopReason,
};

pub use lm_core::*;
pub use lm_edge::*;
pub use lm_fit::*;
pub use lm_render::*;
