//! Frame -> binary edge map.
//!
//! Steps:
//! 1. Rec.601 luma for color frames.
//! 2. Same-size correlation with the [`HatKernel`] under the configured
//!    [`BorderMode`] (reflect-101 unless overridden).
//! 3. The response is rounded and saturated to `[0, 255]` like an 8-bit
//!    filter output, then binarized: `255` where it exceeds `threshold`,
//!    `0` elsewhere.

use lm_core::{BorderMode, Error, Image, ImageView, Point2i, Rgb8, to_luma_u8};

use crate::correlate::correlate_u8;
use crate::kernel::HatKernel;

pub const EDGE_ON: u8 = 255;
pub const EDGE_OFF: u8 = 0;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnhanceConfig {
    /// Half-band width of the hat kernel, `>= 1`.
    pub a: usize,
    pub threshold: f32,
    pub border: BorderMode<f32>,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            a: 10,
            threshold: 50.0,
            border: BorderMode::Reflect101,
        }
    }
}

/// Binary image whose pixels are all [`EDGE_ON`] or [`EDGE_OFF`].
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap(Image<u8>);

impl EdgeMap {
    pub fn from_image(img: Image<u8>) -> Result<Self, Error> {
        if let Some(&value) = img
            .data()
            .iter()
            .find(|&&v| v != EDGE_ON && v != EDGE_OFF)
        {
            return Err(Error::NotBinary { value });
        }
        Ok(Self(img))
    }

    pub fn width(&self) -> usize {
        self.0.width()
    }

    pub fn height(&self) -> usize {
        self.0.height()
    }

    pub fn as_view(&self) -> ImageView<'_, u8> {
        self.0.as_view()
    }

    pub fn image(&self) -> &Image<u8> {
        &self.0
    }

    pub fn into_image(self) -> Image<u8> {
        self.0
    }

    pub fn edge_count(&self) -> usize {
        self.0.data().iter().filter(|&&v| v != EDGE_OFF).count()
    }

    /// Edge pixels in row-major order.
    pub fn edge_points(&self) -> Vec<Point2i> {
        let w = self.width();
        self.0
            .data()
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != EDGE_OFF)
            .map(|(i, _)| Point2i { x: i % w, y: i / w })
            .collect()
    }
}

/// Binarizes an 8-bit grayscale frame against a prebuilt kernel.
pub fn enhance_u8(
    gray: &ImageView<'_, u8>,
    kernel: &HatKernel,
    threshold: f32,
    border: &BorderMode<f32>,
) -> Result<EdgeMap, Error> {
    let mut response = Image::new_fill(0, 0, 0.0f32);
    binarize_into(gray, kernel, threshold, border, &mut response)
}

/// Color variant of [`enhance_u8`].
pub fn enhance_rgb8(
    frame: &ImageView<'_, Rgb8>,
    kernel: &HatKernel,
    threshold: f32,
    border: &BorderMode<f32>,
) -> Result<EdgeMap, Error> {
    frame.require_non_empty()?;
    let gray = to_luma_u8(frame);
    enhance_u8(&gray.as_view(), kernel, threshold, border)
}

fn binarize_into(
    gray: &ImageView<'_, u8>,
    kernel: &HatKernel,
    threshold: f32,
    border: &BorderMode<f32>,
    response: &mut Image<f32>,
) -> Result<EdgeMap, Error> {
    gray.require_non_empty()?;
    correlate_u8(gray, &kernel.weights(), kernel.anchor(), border, response)?;

    let data = response
        .data()
        .iter()
        .map(|&r| {
            if r.round().clamp(0.0, 255.0) > threshold {
                EDGE_ON
            } else {
                EDGE_OFF
            }
        })
        .collect();
    let img = Image::from_vec(gray.width(), gray.height(), data)?;
    Ok(EdgeMap(img))
}

/// Per-session enhancer that caches the kernel for the current `a` and
/// reuses its response buffer across frames.
#[derive(Debug, Clone, Default)]
pub struct EdgeEnhancer {
    kernel: Option<HatKernel>,
    response: Option<Image<f32>>,
}

impl EdgeEnhancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kernel for `a`, rebuilt only when `a` differs from the cached one.
    pub fn kernel(&mut self, a: usize) -> Result<&HatKernel, Error> {
        if self.kernel.as_ref().is_none_or(|k| k.a() != a) {
            self.kernel = Some(HatKernel::new(a)?);
        }
        Ok(self.kernel.as_ref().expect("kernel cached above"))
    }

    pub fn enhance_u8(
        &mut self,
        gray: &ImageView<'_, u8>,
        cfg: &EnhanceConfig,
    ) -> Result<EdgeMap, Error> {
        gray.require_non_empty()?;
        self.kernel(cfg.a)?;
        let kernel = self.kernel.as_ref().expect("kernel cached above");
        let response = self
            .response
            .get_or_insert_with(|| Image::new_fill(0, 0, 0.0));
        binarize_into(gray, kernel, cfg.threshold, &cfg.border, response)
    }

    pub fn enhance_rgb8(
        &mut self,
        frame: &ImageView<'_, Rgb8>,
        cfg: &EnhanceConfig,
    ) -> Result<EdgeMap, Error> {
        frame.require_non_empty()?;
        let gray = to_luma_u8(frame);
        self.enhance_u8(&gray.as_view(), cfg)
    }

    /// Raw correlation response of the last enhanced frame.
    pub fn last_response(&self) -> Option<&Image<f32>> {
        self.response.as_ref()
    }
}
