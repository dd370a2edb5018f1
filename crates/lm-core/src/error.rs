use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    SizeMismatch {
        expected: usize,
        actual: usize,
    },
    InvalidStride,
    /// Zero width or zero height where pixels are required.
    EmptyImage,
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
    NotBinary {
        value: u8,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::InvalidStride => write!(f, "invalid stride"),
            Self::EmptyImage => write!(f, "image has zero area"),
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "dimension mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            Self::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter `{name}`: {reason}")
            }
            Self::NotBinary { value } => {
                write!(f, "edge map must be binary (0 or 255), found {value}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// True for the errors a frame loop treats as "skip this frame".
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::EmptyImage | Self::DimensionMismatch { .. } | Self::SizeMismatch { .. }
        )
    }
}
