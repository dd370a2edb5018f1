use lm_core::Error;
use lm_edge::EnhanceConfig;
use lm_fit::{FitConfig, ScanRows};
use lm_render::LineStyle;

/// Every knob of the per-frame pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LaneConfig {
    pub enhance: EnhanceConfig,
    pub fit: FitConfig,
    pub scan: ScanRows,
    pub style: LineStyle,
}

impl LaneConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.enhance.a == 0 {
            return Err(Error::InvalidParameter {
                name: "a",
                reason: "kernel half-band width must be >= 1",
            });
        }
        if !self.enhance.threshold.is_finite() {
            return Err(Error::InvalidParameter {
                name: "threshold",
                reason: "must be finite",
            });
        }
        self.fit.validate()?;
        self.scan.validate()?;
        self.style.validate()
    }
}
