//! Lane-marking edge enhancement.
//!
//! A hat-shaped kernel (see [`HatKernel`]) is correlated with the luma of a
//! frame and the response is binarized into an [`EdgeMap`]. The kernel
//! subtracts a wide band on the row above and adds a narrower centered band
//! on the anchor row and the row below, so it responds to bright markings of
//! roughly `2a` pixels against darker pavement.
//!
//! Border policy defaults to reflect-101 and is configurable through
//! [`EnhanceConfig::border`]. The kernel is asymmetric, so the policy changes
//! results on the first and last rows and near the left and right edges.

pub mod correlate;
pub mod enhance;
pub mod kernel;

pub use enhance::{
    EDGE_OFF, EDGE_ON, EdgeEnhancer, EdgeMap, EnhanceConfig, enhance_rgb8, enhance_u8,
};
pub use kernel::HatKernel;
