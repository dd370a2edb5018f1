use lane_metrology::{Image, Rgb8};

pub const ASPHALT: Rgb8 = [60, 60, 60];
pub const PAINT: Rgb8 = [230, 225, 215];

/// Uniform asphalt with one painted marking `marking` pixels wide, centered
/// on `y = slope * x + intercept`.
pub fn road_frame(
    width: usize,
    height: usize,
    slope: f64,
    intercept: f64,
    marking: usize,
) -> Image<Rgb8> {
    let mut data = vec![ASPHALT; width * height];
    let half = marking as f64 / 2.0;
    for y in 0..height {
        let xc = (y as f64 - intercept) / slope;
        for x in 0..width {
            let dx = x as f64 + 0.5 - xc;
            if dx >= -half && dx < half {
                data[y * width + x] = PAINT;
            }
        }
    }
    Image::from_vec(width, height, data).expect("valid image")
}

pub fn blank_frame(width: usize, height: usize) -> Image<Rgb8> {
    Image::new_fill(width, height, ASPHALT)
}
