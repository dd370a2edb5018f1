//! Per-frame estimation and the frame loop.
//!
//! A session fixes the frame size on its first valid frame. Frames of another
//! size, or with zero area, are rejected by [`LaneEstimator::process_frame`]
//! and skipped by [`LaneEstimator::run`].

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};

use lm_core::{Error, Image, ImageView, Rgb8};
use lm_edge::{EdgeEnhancer, EdgeMap};
use lm_fit::{FitReport, LineFit, RobustLineFitter};
use lm_render::LineRenderer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::config::LaneConfig;

/// Everything computed for one frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub edge_map: EdgeMap,
    pub rows: RangeInclusive<usize>,
    pub fit: FitReport,
    /// Rendered line, `None` when no line was accepted.
    pub overlay: Option<Image<Rgb8>>,
}

impl FrameReport {
    pub fn line(&self) -> Option<&LineFit> {
        self.fit.result.line()
    }

    /// The overlay, or `frame` itself when no line was found.
    pub fn display<'a>(&'a self, frame: &'a Image<Rgb8>) -> &'a Image<Rgb8> {
        self.overlay.as_ref().unwrap_or(frame)
    }
}

/// Supplies decoded frames; `Ok(None)` ends the input.
pub trait FrameSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn next_frame(&mut self) -> Result<Option<Image<Rgb8>>, Self::Error>;
}

/// Per-frame output handed to a [`FrameSink`].
#[derive(Debug, Clone, Copy)]
pub struct FrameOutput<'a> {
    /// Zero-based index in the source sequence.
    pub index: usize,
    /// Overlay, or the original frame when no line was found.
    pub display: &'a Image<Rgb8>,
    pub edge_map: &'a EdgeMap,
    pub fit: &'a FitReport,
}

pub trait FrameSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn write_frame(&mut self, output: FrameOutput<'_>) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StopReason {
    EndOfInput,
    StopRequested,
    FrameLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    pub frames_read: usize,
    pub processed: usize,
    /// Frames rejected as invalid input.
    pub skipped: usize,
    pub lines_found: usize,
    pub stop: StopReason,
}

#[derive(Debug)]
pub enum RunError {
    Source(Box<dyn std::error::Error + Send + Sync>),
    Sink(Box<dyn std::error::Error + Send + Sync>),
    /// A failure that is not attributable to the frame itself.
    Estimator(Error),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(e) => write!(f, "frame source failed: {e}"),
            Self::Sink(e) => write!(f, "frame sink failed: {e}"),
            Self::Estimator(e) => write!(f, "estimator failed: {e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(e) | Self::Sink(e) => Some(e.as_ref()),
            Self::Estimator(e) => Some(e),
        }
    }
}

/// Session-scoped lane estimator.
///
/// Holds the cached kernel, the seeded sampling RNG (advanced across frames)
/// and the session frame size.
#[derive(Debug, Clone)]
pub struct LaneEstimator {
    cfg: LaneConfig,
    enhancer: EdgeEnhancer,
    fitter: RobustLineFitter,
    renderer: LineRenderer,
    rng: StdRng,
    dims: Option<(usize, usize)>,
}

impl LaneEstimator {
    pub fn new(cfg: LaneConfig) -> Result<Self, Error> {
        cfg.validate()?;
        Ok(Self {
            enhancer: EdgeEnhancer::new(),
            fitter: RobustLineFitter::new(cfg.fit.clone()),
            renderer: LineRenderer::new(cfg.style),
            rng: StdRng::seed_from_u64(cfg.fit.seed),
            dims: None,
            cfg,
        })
    }

    pub fn config(&self) -> &LaneConfig {
        &self.cfg
    }

    /// Frame size fixed by the first accepted frame.
    pub fn session_dims(&self) -> Option<(usize, usize)> {
        self.dims
    }

    /// Forgets the session frame size and reseeds the sampler.
    pub fn reset(&mut self) {
        self.dims = None;
        self.rng = StdRng::seed_from_u64(self.cfg.fit.seed);
    }

    pub fn process_frame(&mut self, frame: &ImageView<'_, Rgb8>) -> Result<FrameReport, Error> {
        frame.require_non_empty()?;
        match self.dims {
            Some((w, h)) => frame.require_dims(w, h)?,
            None => self.dims = Some(frame.dims()),
        }

        let edge_map = self.enhancer.enhance_rgb8(frame, &self.cfg.enhance)?;
        let rows = self.cfg.scan.resolve(frame.height());
        let fit = self
            .fitter
            .fit(&edge_map.as_view(), rows.clone(), &mut self.rng);
        let overlay = fit
            .result
            .line()
            .map(|l| self.renderer.render(frame, &l.line));

        debug!(
            edges = edge_map.edge_count(),
            top = rows.start(),
            bottom = rows.end(),
            found = overlay.is_some(),
            "frame processed"
        );

        Ok(FrameReport {
            edge_map,
            rows,
            fit,
            overlay,
        })
    }

    /// Pulls frames from `source` until it ends, `stop` is raised or
    /// `max_frames` frames have been read. `stop` is checked between frames.
    pub fn run<S, K>(
        &mut self,
        source: &mut S,
        sink: &mut K,
        stop: &AtomicBool,
        max_frames: Option<usize>,
    ) -> Result<RunSummary, RunError>
    where
        S: FrameSource,
        K: FrameSink,
    {
        let mut summary = RunSummary {
            frames_read: 0,
            processed: 0,
            skipped: 0,
            lines_found: 0,
            stop: StopReason::EndOfInput,
        };

        loop {
            if stop.load(Ordering::Relaxed) {
                summary.stop = StopReason::StopRequested;
                break;
            }
            if max_frames.is_some_and(|n| summary.frames_read >= n) {
                summary.stop = StopReason::FrameLimit;
                break;
            }

            let Some(frame) = source
                .next_frame()
                .map_err(|e| RunError::Source(Box::new(e)))?
            else {
                break;
            };
            let index = summary.frames_read;
            summary.frames_read += 1;

            let report = match self.process_frame(&frame.as_view()) {
                Ok(report) => report,
                Err(e) if e.is_invalid_input() => {
                    warn!(index, error = %e, "skipping invalid frame");
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => return Err(RunError::Estimator(e)),
            };

            summary.processed += 1;
            if report.line().is_some() {
                summary.lines_found += 1;
            } else {
                info!(index, "no line detected");
            }

            sink.write_frame(FrameOutput {
                index,
                display: report.display(&frame),
                edge_map: &report.edge_map,
                fit: &report.fit,
            })
            .map_err(|e| RunError::Sink(Box::new(e)))?;
        }

        debug!(
            frames = summary.frames_read,
            skipped = summary.skipped,
            lines = summary.lines_found,
            stop = ?summary.stop,
            "frame loop finished"
        );
        Ok(summary)
    }
}
