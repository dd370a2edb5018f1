use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lm_core::{Image, Rgb8};
use lm_edge::{EdgeEnhancer, EnhanceConfig};

/// Dark pavement with one slanted bright marking.
fn build_road_rgb(width: usize, height: usize) -> Image<Rgb8> {
    let mut data = vec![[60u8, 60, 60]; width * height];
    for y in 0..height {
        let cx = width as f32 * 0.3 + 0.4 * y as f32;
        for x in 0..width {
            if (x as f32 - cx).abs() < 10.0 {
                data[y * width + x] = [230, 230, 220];
            }
        }
    }

    Image::from_vec(width, height, data).expect("valid image")
}

fn bench_enhance_rgb8(c: &mut Criterion) {
    let img = build_road_rgb(1280, 720);
    let view = img.as_view();
    let cfg = EnhanceConfig::default();
    let mut enh = EdgeEnhancer::new();

    c.bench_function("enhance_rgb8_1280x720_a10", |b| {
        b.iter(|| {
            let map = enh
                .enhance_rgb8(black_box(&view), black_box(&cfg))
                .expect("non-empty frame");
            black_box(map.width());
        });
    });
}

criterion_group!(benches, bench_enhance_rgb8);
criterion_main!(benches);
