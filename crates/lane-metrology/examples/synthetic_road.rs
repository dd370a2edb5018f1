//! Example: lane estimation on a generated road sequence.
//!
//! Renders a short sequence of asphalt frames with one painted marking that
//! drifts sideways, runs the frame loop over it and prints a JSON report with
//! the true and estimated marking position per frame.
//!
//! Run from the workspace root:
//!   cargo run -p lane-metrology --features serde --example synthetic_road -- --help
//!   RUST_LOG=debug cargo run -p lane-metrology --features serde --example synthetic_road

use std::convert::Infallible;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use lane_metrology::{
    FrameOutput, FrameSink, FrameSource, Image, LaneConfig, LaneEstimator, Rgb8, RunSummary,
    SlopeLine,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "Run the lane estimator on a synthetic road sequence")]
struct Args {
    #[arg(long, default_value_t = 640)]
    width: usize,

    #[arg(long, default_value_t = 360)]
    height: usize,

    #[arg(long, default_value_t = 8)]
    frames: usize,

    /// Slope of the marking, `y = slope * x + intercept`
    #[arg(long, default_value_t = -1.4)]
    slope: f64,

    #[arg(long, default_value_t = 700.0)]
    intercept: f64,

    /// Intercept change per frame
    #[arg(long, default_value_t = 6.0)]
    drift: f64,

    /// Sampling seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

struct RoadSource {
    width: usize,
    height: usize,
    marking: usize,
    lines: std::vec::IntoIter<SlopeLine>,
}

impl FrameSource for RoadSource {
    type Error = Infallible;

    fn next_frame(&mut self) -> Result<Option<Image<Rgb8>>, Self::Error> {
        Ok(self
            .lines
            .next()
            .map(|l| road_frame(self.width, self.height, &l, self.marking)))
    }
}

fn road_frame(width: usize, height: usize, line: &SlopeLine, marking: usize) -> Image<Rgb8> {
    const ASPHALT: Rgb8 = [58, 60, 62];
    const PAINT: Rgb8 = [235, 230, 220];

    let mut data = vec![ASPHALT; width * height];
    let half = marking as f64 / 2.0;
    for y in 0..height {
        let Some(xc) = line.x_at(y as f64) else {
            continue;
        };
        for x in 0..width {
            let dx = x as f64 + 0.5 - xc;
            if dx >= -half && dx < half {
                data[y * width + x] = PAINT;
            }
        }
    }
    Image::from_vec(width, height, data).expect("buffer matches frame size")
}

#[derive(Serialize)]
struct FrameRecord {
    index: usize,
    truth: SlopeLine,
    estimate: Option<SlopeLine>,
    cost: Option<u64>,
    edges: usize,
    /// Column error of the estimate at the middle row.
    mid_row_error_px: Option<f64>,
}

struct RecordSink {
    truths: Vec<SlopeLine>,
    mid_row: f64,
    records: Vec<FrameRecord>,
}

impl FrameSink for RecordSink {
    type Error = Infallible;

    fn write_frame(&mut self, output: FrameOutput<'_>) -> Result<(), Self::Error> {
        let truth = self.truths[output.index];
        let fit = output.fit.result.line();
        let mid_row_error_px = fit.and_then(|f| {
            let got = f.line.x_at(self.mid_row)?;
            let want = truth.x_at(self.mid_row)?;
            Some((got - want).abs())
        });
        self.records.push(FrameRecord {
            index: output.index,
            truth,
            estimate: fit.map(|f| f.line),
            cost: fit.map(|f| f.cost),
            edges: output.edge_map.edge_count(),
            mid_row_error_px,
        });
        Ok(())
    }
}

#[derive(Serialize)]
struct Report {
    config: LaneConfig,
    summary: RunSummary,
    elapsed_ms: f64,
    frames: Vec<FrameRecord>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut cfg = LaneConfig::default();
    cfg.fit.seed = args.seed;

    let truths: Vec<SlopeLine> = (0..args.frames)
        .map(|i| SlopeLine::new(args.slope, args.intercept + args.drift * i as f64))
        .collect();

    let mut source = RoadSource {
        width: args.width,
        height: args.height,
        marking: 2 * cfg.enhance.a,
        lines: truths.clone().into_iter(),
    };
    let mut sink = RecordSink {
        truths,
        mid_row: args.height as f64 / 2.0,
        records: Vec::with_capacity(args.frames),
    };

    let mut estimator = LaneEstimator::new(cfg.clone()).context("invalid lane configuration")?;
    let stop = AtomicBool::new(false);

    let t0 = Instant::now();
    let summary = estimator
        .run(&mut source, &mut sink, &stop, None)
        .context("frame loop failed")?;
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

    let report = Report {
        config: cfg,
        summary,
        elapsed_ms,
        frames: sink.records,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize report")?
    );
    Ok(())
}
