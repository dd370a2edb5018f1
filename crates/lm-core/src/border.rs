/// Policy for neighborhood reads that fall outside the image.
///
/// Wide asymmetric kernels make the choice visible near frame edges, so every
/// operator that reads outside the image takes one of these explicitly.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BorderMode<T> {
    /// Replicate the nearest edge pixel.
    Clamp,
    /// Read a fixed value (zero padding with `Constant(0)`).
    Constant(T),
    /// Mirror around the edge pixel without repeating it: `dcb|abcd|cba`.
    Reflect101,
}

impl<T> BorderMode<T> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clamp => "clamp",
            Self::Constant(_) => "constant",
            Self::Reflect101 => "reflect101",
        }
    }
}

impl<T> Default for BorderMode<T> {
    fn default() -> Self {
        Self::Reflect101
    }
}

/// Maps a possibly out-of-range index into `[0, len)`.
///
/// Returns `None` for `Constant` (the caller substitutes the fill value) and
/// for empty ranges.
pub fn map_index<T>(i: isize, len: usize, mode: &BorderMode<T>) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if i >= 0 && (i as usize) < len {
        return Some(i as usize);
    }

    match mode {
        BorderMode::Constant(_) => None,
        BorderMode::Clamp => {
            if i < 0 {
                Some(0)
            } else {
                Some(len - 1)
            }
        }
        BorderMode::Reflect101 => {
            if len == 1 {
                return Some(0);
            }

            let period = (2 * len - 2) as isize;
            let r = i.rem_euclid(period) as usize;
            if r < len {
                Some(r)
            } else {
                Some((2 * len - 2) - r)
            }
        }
    }
}
