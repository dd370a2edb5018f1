use std::ops::RangeInclusive;

use lm_core::Error;

/// How `min_inliers` takes part in acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InlierGate {
    /// Cost-only acceptance; `min_inliers` is carried but has no effect.
    #[default]
    Ignore,
    /// The winning line also needs `min_inliers` nonzero pixels inside its
    /// band over the scanned rows.
    BandPixels,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FitConfig {
    /// Full width of the column band summed around the line on each row.
    pub band_width: usize,
    pub min_inliers: usize,
    pub iterations: usize,
    /// The best line must cost more than `acceptance_ratio * max_cost`.
    pub acceptance_ratio: f64,
    pub inlier_gate: InlierGate,
    /// Seed for [`crate::RobustLineFitter::fit_seeded`].
    pub seed: u64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            band_width: 20,
            min_inliers: 50,
            iterations: 1000,
            acceptance_ratio: 0.8,
            inlier_gate: InlierGate::Ignore,
            seed: 0,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.acceptance_ratio.is_finite() || self.acceptance_ratio < 0.0 {
            return Err(Error::InvalidParameter {
                name: "acceptance_ratio",
                reason: "must be finite and >= 0",
            });
        }
        Ok(())
    }
}

/// Vertical extent scanned by the banded cost.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScanRows {
    /// Fractions of the frame height, truncated to whole rows.
    Fraction { top: f64, bottom: f64 },
    /// Explicit rows, both inclusive.
    Absolute { top: usize, bottom: usize },
}

impl Default for ScanRows {
    fn default() -> Self {
        Self::Fraction {
            top: 0.1,
            bottom: 0.9,
        }
    }
}

impl ScanRows {
    pub fn resolve(&self, height: usize) -> RangeInclusive<usize> {
        match *self {
            Self::Fraction { top, bottom } => {
                let h = height as f64;
                ((h * top) as usize)..=((h * bottom) as usize)
            }
            Self::Absolute { top, bottom } => top..=bottom,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if let Self::Fraction { top, bottom } = *self
            && !(top.is_finite() && bottom.is_finite() && top >= 0.0 && bottom >= 0.0)
        {
            return Err(Error::InvalidParameter {
                name: "scan_rows",
                reason: "fractions must be finite and >= 0",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FitConfig, ScanRows};

    #[test]
    fn default_scan_rows_follow_frame_height() {
        assert_eq!(ScanRows::default().resolve(480), 48..=432);
        assert_eq!(ScanRows::default().resolve(100), 10..=90);
        // 0.1 * 7 = 0.7 and 0.9 * 7 = 6.3 truncate toward zero.
        assert_eq!(ScanRows::default().resolve(7), 0..=6);
        assert_eq!(
            ScanRows::Absolute { top: 3, bottom: 9 }.resolve(1000),
            3..=9
        );
    }

    #[test]
    fn validation() {
        assert!(FitConfig::default().validate().is_ok());
        let bad = FitConfig {
            acceptance_ratio: f64::NAN,
            ..FitConfig::default()
        };
        assert!(bad.validate().is_err());

        assert!(ScanRows::default().validate().is_ok());
        assert!(
            ScanRows::Fraction {
                top: -0.1,
                bottom: 0.5
            }
            .validate()
            .is_err()
        );
    }
}
