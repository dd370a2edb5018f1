use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lm_core::Image;
use lm_fit::{FitConfig, RobustLineFitter, ScanRows};

/// Lane-like edge band `y = slope * x + intercept`, three pixels wide, plus
/// sparse clutter.
fn build_edge_map(width: usize, height: usize, slope: f64, intercept: f64) -> Image<u8> {
    let mut data = vec![0u8; width * height];
    for y in 0..height {
        let xc = ((y as f64 - intercept) / slope).round() as i64;
        for x in (xc - 1)..=(xc + 1) {
            if x >= 0 && (x as usize) < width {
                data[y * width + x as usize] = 255;
            }
        }
    }
    for (i, v) in data.iter_mut().enumerate() {
        if (i * 2_654_435_761) % 997 == 0 {
            *v = 255;
        }
    }
    Image::from_vec(width, height, data).expect("valid image")
}

fn bench_fit_default(c: &mut Criterion) {
    let img = build_edge_map(1280, 720, -1.2, 1400.0);
    let view = img.as_view();
    let fitter = RobustLineFitter::new(FitConfig::default());
    let rows = ScanRows::default().resolve(720);

    c.bench_function("lm_fit_1280x720_1000_iters", |b| {
        b.iter(|| {
            let report = fitter.fit_seeded(black_box(&view), rows.clone());
            black_box(report.stats.max_cost);
        });
    });
}

fn bench_fit_wide_band(c: &mut Criterion) {
    let img = build_edge_map(1280, 720, 0.8, -200.0);
    let view = img.as_view();
    let fitter = RobustLineFitter::new(FitConfig {
        band_width: 80,
        iterations: 4000,
        ..FitConfig::default()
    });
    let rows = ScanRows::default().resolve(720);

    c.bench_function("lm_fit_1280x720_band80_4000_iters", |b| {
        b.iter(|| {
            let report = fitter.fit_seeded(black_box(&view), rows.clone());
            black_box(report.stats.max_cost);
        });
    });
}

criterion_group!(benches, bench_fit_default, bench_fit_wide_band);
criterion_main!(benches);
