//! Foundational primitives for lane metrology.
//!
//! ## Images and Stride
//! Images use element stride (not byte stride). `stride` is the distance, in
//! elements, between adjacent row starts and may be greater than `width`.
//! Color frames are `Image<Rgb8>` with channels in R, G, B order.
//!
//! ## Border Modes
//! Neighborhood operators support clamp (replicate), constant fill and
//! reflect-101 behavior. Reflect-101 mirrors around edge pixels without
//! repeating edge elements.
//!
//! ## Line Convention
//! Lines are expressed in image space as `y = slope * x + intercept`, where
//! `y` is the row index and `x` the column index of a pixel center.

mod border;
mod error;
mod geom;
mod image;

pub use border::{BorderMode, map_index};
pub use error::Error;
pub use geom::{Point2d, Point2i, SlopeLine, Vec2d};
pub use image::{Image, ImageView, ImageViewMut, Rgb8, luma_from_rgb, to_luma_u8};
