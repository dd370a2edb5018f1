use lm_core::{Error, Image, ImageView};

/// Hat-shaped lane-marking kernel built from the half-band width `a`.
///
/// Layout (height 3, width `4a`):
/// - row 0 is `-1` across the full width,
/// - rows 1 and 2 are `+1` on columns `[a, 3a)` and `0` elsewhere.
///
/// The anchor is the kernel center `(2a, 1)`. Applied by correlation, uniform
/// regions respond with 0 and a vertical bright stripe of width `2a` centered
/// on the anchor column responds with `2a * contrast`.
#[derive(Debug, Clone, PartialEq)]
pub struct HatKernel {
    a: usize,
    weights: Image<f32>,
}

impl HatKernel {
    pub const HEIGHT: usize = 3;

    pub fn new(a: usize) -> Result<Self, Error> {
        if a == 0 {
            return Err(Error::InvalidParameter {
                name: "a",
                reason: "kernel half-band width must be >= 1",
            });
        }
        let width = a.checked_mul(4).ok_or(Error::InvalidParameter {
            name: "a",
            reason: "kernel width overflows",
        })?;

        let mut weights = Image::new_fill(width, Self::HEIGHT, 0.0f32);
        {
            let mut view = weights.as_view_mut();
            view.row_mut(0).fill(-1.0);
            for ky in 1..Self::HEIGHT {
                view.row_mut(ky)[a..3 * a].fill(1.0);
            }
        }

        Ok(Self { a, weights })
    }

    pub fn a(&self) -> usize {
        self.a
    }

    pub fn width(&self) -> usize {
        self.weights.width()
    }

    pub fn height(&self) -> usize {
        self.weights.height()
    }

    pub fn anchor(&self) -> (usize, usize) {
        (self.width() / 2, Self::HEIGHT / 2)
    }

    pub fn weights(&self) -> ImageView<'_, f32> {
        self.weights.as_view()
    }

    pub fn weight(&self, x: usize, y: usize) -> Option<f32> {
        self.weights.as_view().get(x, y).copied()
    }
}

#[cfg(test)]
mod tests {
    use lm_core::Error;

    use super::HatKernel;

    #[test]
    fn shape_invariants_hold_for_many_widths() {
        for a in 1..=16 {
            let k = HatKernel::new(a).expect("a >= 1");
            assert_eq!(k.a(), a);
            assert_eq!(k.height(), 3);
            assert_eq!(k.width(), 4 * a);
            assert_eq!(k.anchor(), (2 * a, 1));

            let w = k.weights();
            assert!(w.row(0).iter().all(|&v| v == -1.0));
            for y in 1..3 {
                for (x, &v) in w.row(y).iter().enumerate() {
                    let expected = if (a..3 * a).contains(&x) { 1.0 } else { 0.0 };
                    assert_eq!(v, expected, "a={a} x={x} y={y}");
                }
            }
        }
    }

    #[test]
    fn weights_balance() {
        // 4a negative taps against 2 * 2a positive taps.
        let k = HatKernel::new(10).expect("a >= 1");
        let sum: f32 = k.weights().row(0).iter().sum::<f32>()
            + k.weights().row(1).iter().sum::<f32>()
            + k.weights().row(2).iter().sum::<f32>();
        assert_eq!(sum, 0.0);
        assert_eq!(k.weight(10, 1), Some(1.0));
        assert_eq!(k.weight(9, 1), Some(0.0));
        assert_eq!(k.weight(40, 0), None);
    }

    #[test]
    fn zero_width_is_rejected() {
        assert!(matches!(
            HatKernel::new(0),
            Err(Error::InvalidParameter { name: "a", .. })
        ));
    }
}
