use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::{GrayImage, RgbImage};
use lane_metrology::{
    BorderMode, EdgeEnhancer, FitReport, FrameOutput, FrameSink, FrameSource, HatKernel, Image,
    InlierGate, LaneConfig, LaneEstimator, Rgb8, RunSummary, ScanRows, SlopeLine,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lane_gallery")]
#[command(about = "Run the lane estimator on images and frame directories")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump the hat kernel for a given half-band width
    #[command(name = "kernel")]
    Kernel(KernelArgs),
    /// Edge map of a single image
    #[command(name = "enhance")]
    Enhance(ImageArgs),
    /// Edge map, line fit and overlay of a single image
    #[command(name = "fit")]
    Fit(ImageArgs),
    /// Frame loop over the images of a directory
    #[command(name = "frames")]
    Frames(FramesArgs),
}

#[derive(Args, Debug, Clone)]
struct KernelArgs {
    #[arg(long, default_value_t = 10)]
    a: usize,
    #[arg(long, default_value = "out")]
    out: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct ImageArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, default_value = "out")]
    out: PathBuf,
    #[command(flatten)]
    tune: TuneArgs,
}

#[derive(Args, Debug, Clone)]
struct FramesArgs {
    #[arg(long, required = true)]
    input_dir: PathBuf,
    #[arg(long, default_value = "out")]
    out: PathBuf,
    #[arg(long)]
    max_frames: Option<usize>,
    #[command(flatten)]
    tune: TuneArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum BorderArg {
    Reflect101,
    Clamp,
    Zero,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum GateArg {
    Ignore,
    BandPixels,
}

/// Overrides applied on top of `--config` (or the defaults).
#[derive(Args, Debug, Clone, Default)]
struct TuneArgs {
    /// JSON file with a full or partial lane configuration
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    a: Option<usize>,
    #[arg(long)]
    threshold: Option<f32>,
    #[arg(long, value_enum)]
    border: Option<BorderArg>,
    #[arg(long)]
    band_width: Option<usize>,
    #[arg(long)]
    iterations: Option<usize>,
    #[arg(long)]
    min_inliers: Option<usize>,
    #[arg(long, value_enum)]
    inlier_gate: Option<GateArg>,
    #[arg(long)]
    seed: Option<u64>,
    /// Top of the scanned rows as a fraction of the frame height
    #[arg(long)]
    scan_top: Option<f64>,
    /// Bottom of the scanned rows as a fraction of the frame height
    #[arg(long)]
    scan_bottom: Option<f64>,
    #[arg(long)]
    thickness: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct KernelDto {
    a: usize,
    width: usize,
    height: usize,
    anchor: [usize; 2],
    weights: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaEnhance<'a> {
    width: usize,
    height: usize,
    edge_count: usize,
    config: &'a LaneConfig,
}

#[derive(Debug, Clone, Serialize)]
struct FitResultDto {
    width: usize,
    height: usize,
    scan_rows: [usize; 2],
    line: Option<SlopeLine>,
    report: FitReport,
}

#[derive(Debug, Clone, Serialize)]
struct FrameRecord {
    index: usize,
    file: String,
    line: Option<SlopeLine>,
    cost: Option<u64>,
    edge_count: usize,
}

#[derive(Debug, Clone, Serialize)]
struct FramesSummary<'a> {
    config: &'a LaneConfig,
    run: RunSummary,
    frames: Vec<FrameRecord>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Kernel(args) => run_kernel(args),
        Command::Enhance(args) => run_enhance(args),
        Command::Fit(args) => run_fit(args),
        Command::Frames(args) => run_frames(args),
    }
}

fn run_kernel(args: KernelArgs) -> Result<()> {
    let kernel = HatKernel::new(args.a).context("building hat kernel")?;
    ensure_dir(&args.out)?;

    let view = kernel.weights();
    let weights: Vec<Vec<f32>> = (0..view.height()).map(|y| view.row(y).to_vec()).collect();
    let (ax, ay) = kernel.anchor();
    write_json(
        args.out.join("kernel.json"),
        &KernelDto {
            a: kernel.a(),
            width: kernel.width(),
            height: kernel.height(),
            anchor: [ax, ay],
            weights,
        },
    )?;

    // -1 -> 0, 0 -> 128, +1 -> 255
    let vis: Vec<u8> = weights_flat(&kernel)
        .map(|w| ((w + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8)
        .collect();
    save_luma_raw(
        args.out.join("kernel.png"),
        kernel.width(),
        kernel.height(),
        vis,
    )?;
    info!(a = kernel.a(), out = %args.out.display(), "kernel written");
    Ok(())
}

fn weights_flat(kernel: &HatKernel) -> impl Iterator<Item = f32> + '_ {
    let view = kernel.weights();
    (0..view.height()).flat_map(move |y| view.row(y).to_vec())
}

fn run_enhance(args: ImageArgs) -> Result<()> {
    let cfg = load_config(&args.tune)?;
    let frame = load_input_rgb(&args.input)?;
    ensure_dir(&args.out)?;

    let mut enhancer = EdgeEnhancer::new();
    let edge_map = enhancer
        .enhance_rgb8(&frame.as_view(), &cfg.enhance)
        .with_context(|| format!("enhancing {}", args.input.display()))?;

    save_u8_image(args.out.join("edge_map.png"), edge_map.image())?;
    if let Some(response) = enhancer.last_response() {
        save_luma_raw(
            args.out.join("response.png"),
            response.width(),
            response.height(),
            f32_to_u8_vis(response.data()),
        )?;
    }
    write_json(
        args.out.join("meta.json"),
        &MetaEnhance {
            width: frame.width(),
            height: frame.height(),
            edge_count: edge_map.edge_count(),
            config: &cfg,
        },
    )?;
    info!(edges = edge_map.edge_count(), "edge map written");
    Ok(())
}

fn run_fit(args: ImageArgs) -> Result<()> {
    let cfg = load_config(&args.tune)?;
    let frame = load_input_rgb(&args.input)?;
    ensure_dir(&args.out)?;

    let mut estimator = LaneEstimator::new(cfg.clone()).context("invalid lane configuration")?;
    let report = estimator
        .process_frame(&frame.as_view())
        .with_context(|| format!("processing {}", args.input.display()))?;

    save_u8_image(args.out.join("edge_map.png"), report.edge_map.image())?;
    save_rgb_image(args.out.join("overlay.png"), report.display(&frame))?;

    let line = report.line().map(|f| f.line);
    match line {
        Some(l) => info!(slope = l.slope, intercept = l.intercept, "line found"),
        None => info!("no line detected"),
    }

    write_json(
        args.out.join("result.json"),
        &FitResultDto {
            width: frame.width(),
            height: frame.height(),
            scan_rows: [*report.rows.start(), *report.rows.end()],
            line,
            report: report.fit,
        },
    )?;
    write_json(
        args.out.join("meta.json"),
        &MetaEnhance {
            width: frame.width(),
            height: frame.height(),
            edge_count: report.edge_map.edge_count(),
            config: &cfg,
        },
    )?;
    Ok(())
}

/// Image files of a directory in lexicographic order.
struct DirSource {
    files: std::vec::IntoIter<PathBuf>,
    names: Vec<String>,
}

impl DirSource {
    fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            bail!("input directory does not exist: {}", dir.display());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
            let path = entry
                .with_context(|| format!("listing {}", dir.display()))?
                .path();
            if path.is_file() && is_image(&path) {
                files.push(path);
            }
        }
        files.sort();
        if files.is_empty() {
            bail!("no png/jpeg frames in {}", dir.display());
        }

        let names = files
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect();
        Ok(Self {
            files: files.into_iter(),
            names,
        })
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
}

impl FrameSource for DirSource {
    type Error = image::ImageError;

    fn next_frame(&mut self) -> Result<Option<Image<Rgb8>>, Self::Error> {
        let Some(path) = self.files.next() else {
            return Ok(None);
        };
        let rgb = image::open(&path)?.to_rgb8();
        Ok(Some(rgb_to_image(rgb)))
    }
}

/// Writes `overlay_NNNNN.png` and `edges_NNNNN.png` per frame.
struct PngSink {
    out: PathBuf,
    names: Vec<String>,
    records: Vec<FrameRecord>,
}

impl FrameSink for PngSink {
    type Error = image::ImageError;

    fn write_frame(&mut self, output: FrameOutput<'_>) -> Result<(), Self::Error> {
        let i = output.index;
        to_rgb_image(output.display)
            .save(self.out.join(format!("overlay_{i:05}.png")))?;
        to_gray_image(output.edge_map.image())
            .save(self.out.join(format!("edges_{i:05}.png")))?;

        let fit = output.fit.result.line();
        self.records.push(FrameRecord {
            index: i,
            file: self.names.get(i).cloned().unwrap_or_default(),
            line: fit.map(|f| f.line),
            cost: fit.map(|f| f.cost),
            edge_count: output.edge_map.edge_count(),
        });
        Ok(())
    }
}

fn run_frames(args: FramesArgs) -> Result<()> {
    let cfg = load_config(&args.tune)?;
    let mut source = DirSource::open(&args.input_dir)?;
    ensure_dir(&args.out)?;

    let mut sink = PngSink {
        out: args.out.clone(),
        names: source.names.clone(),
        records: Vec::new(),
    };
    let mut estimator = LaneEstimator::new(cfg.clone()).context("invalid lane configuration")?;
    let stop = AtomicBool::new(false);

    let run = estimator
        .run(&mut source, &mut sink, &stop, args.max_frames)
        .context("frame loop failed")?;
    info!(
        frames = run.frames_read,
        lines = run.lines_found,
        skipped = run.skipped,
        "frames done"
    );

    write_json(
        args.out.join("summary.json"),
        &FramesSummary {
            config: &cfg,
            run,
            frames: sink.records,
        },
    )
}

fn load_config(tune: &TuneArgs) -> Result<LaneConfig> {
    let mut cfg = match &tune.config {
        Some(path) => read_json::<LaneConfig>(path)?,
        None => LaneConfig::default(),
    };
    apply_overrides(&mut cfg, tune);
    cfg.validate().context("invalid lane configuration")?;
    Ok(cfg)
}

fn apply_overrides(cfg: &mut LaneConfig, tune: &TuneArgs) {
    if let Some(a) = tune.a {
        cfg.enhance.a = a;
    }
    if let Some(t) = tune.threshold {
        cfg.enhance.threshold = t;
    }
    if let Some(b) = tune.border {
        cfg.enhance.border = match b {
            BorderArg::Reflect101 => BorderMode::Reflect101,
            BorderArg::Clamp => BorderMode::Clamp,
            BorderArg::Zero => BorderMode::Constant(0.0),
        };
    }
    if let Some(w) = tune.band_width {
        cfg.fit.band_width = w;
    }
    if let Some(n) = tune.iterations {
        cfg.fit.iterations = n;
    }
    if let Some(n) = tune.min_inliers {
        cfg.fit.min_inliers = n;
    }
    if let Some(g) = tune.inlier_gate {
        cfg.fit.inlier_gate = match g {
            GateArg::Ignore => InlierGate::Ignore,
            GateArg::BandPixels => InlierGate::BandPixels,
        };
    }
    if let Some(s) = tune.seed {
        cfg.fit.seed = s;
    }
    if tune.scan_top.is_some() || tune.scan_bottom.is_some() {
        let (top, bottom) = match cfg.scan {
            ScanRows::Fraction { top, bottom } => (top, bottom),
            ScanRows::Absolute { .. } => (0.1, 0.9),
        };
        cfg.scan = ScanRows::Fraction {
            top: tune.scan_top.unwrap_or(top),
            bottom: tune.scan_bottom.unwrap_or(bottom),
        };
    }
    if let Some(t) = tune.thickness {
        cfg.style.thickness = t;
    }
}

fn load_input_rgb(path: &Path) -> Result<Image<Rgb8>> {
    ensure_file_exists(path, "input")?;
    let dyn_img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    Ok(rgb_to_image(dyn_img.to_rgb8()))
}

fn rgb_to_image(rgb: RgbImage) -> Image<Rgb8> {
    let (w, h) = rgb.dimensions();
    let data: Vec<Rgb8> = rgb
        .into_raw()
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    Image::from_vec(w as usize, h as usize, data).expect("decoder yields w * h pixels")
}

fn to_rgb_image(img: &Image<Rgb8>) -> RgbImage {
    let flat: Vec<u8> = img.data().iter().flatten().copied().collect();
    RgbImage::from_raw(img.width() as u32, img.height() as u32, flat)
        .expect("dimensions and data length must match")
}

fn to_gray_image(img: &Image<u8>) -> GrayImage {
    GrayImage::from_raw(img.width() as u32, img.height() as u32, img.data().to_vec())
        .expect("dimensions and data length must match")
}

fn save_u8_image(path: PathBuf, img: &Image<u8>) -> Result<()> {
    to_gray_image(img)
        .save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn save_rgb_image(path: PathBuf, img: &Image<Rgb8>) -> Result<()> {
    to_rgb_image(img)
        .save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn save_luma_raw(path: PathBuf, width: usize, height: usize, data: Vec<u8>) -> Result<()> {
    let gray = GrayImage::from_raw(width as u32, height as u32, data)
        .context("constructing GrayImage from raw bytes")?;
    gray.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

/// Min-max stretch to `[0, 255]`.
fn f32_to_u8_vis(data: &[f32]) -> Vec<u8> {
    let (min_v, max_v) = data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if data.is_empty() || (max_v - min_v).abs() < 1e-12 {
        return vec![0u8; data.len()];
    }

    let scale = 255.0 / (max_v - min_v);
    data.iter()
        .map(|&v| ((v - min_v) * scale).round().clamp(0.0, 255.0) as u8)
        .collect()
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    ensure_file_exists(path, "config")?;
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating output directory {}", dir.display()))
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use lane_metrology::{BorderMode, InlierGate, LaneConfig, ScanRows};

    use super::{BorderArg, GateArg, TuneArgs, apply_overrides, f32_to_u8_vis};

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut cfg = LaneConfig::default();
        let tune = TuneArgs {
            a: Some(6),
            border: Some(BorderArg::Zero),
            inlier_gate: Some(GateArg::BandPixels),
            scan_bottom: Some(0.75),
            ..TuneArgs::default()
        };
        apply_overrides(&mut cfg, &tune);

        assert_eq!(cfg.enhance.a, 6);
        assert_eq!(cfg.enhance.threshold, 50.0);
        assert_eq!(cfg.enhance.border, BorderMode::Constant(0.0));
        assert_eq!(cfg.fit.inlier_gate, InlierGate::BandPixels);
        assert_eq!(cfg.fit.iterations, 1000);
        assert_eq!(
            cfg.scan,
            ScanRows::Fraction {
                top: 0.1,
                bottom: 0.75
            }
        );
    }

    #[test]
    fn partial_json_config_keeps_defaults() {
        let cfg: LaneConfig =
            serde_json::from_str(r#"{ "fit": { "band_width": 40 } }"#).expect("valid json");
        assert_eq!(cfg.fit.band_width, 40);
        assert_eq!(cfg.fit.iterations, 1000);
        assert_eq!(cfg.enhance, LaneConfig::default().enhance);
    }

    #[test]
    fn visualization_stretches_range() {
        assert_eq!(f32_to_u8_vis(&[-2.0, 0.0, 2.0]), vec![0, 128, 255]);
        assert_eq!(f32_to_u8_vis(&[3.0, 3.0]), vec![0, 0]);
        assert!(f32_to_u8_vis(&[]).is_empty());
    }
}
