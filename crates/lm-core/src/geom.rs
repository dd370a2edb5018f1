use core::ops::{Add, Mul, Sub};

/// Integer pixel coordinate: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point2i {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2d {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2d {
    pub x: f64,
    pub y: f64,
}

impl Vec2d {
    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }
}

impl From<Point2i> for Point2d {
    fn from(p: Point2i) -> Self {
        Self {
            x: p.x as f64,
            y: p.y as f64,
        }
    }
}

impl Add<Vec2d> for Point2d {
    type Output = Point2d;

    fn add(self, rhs: Vec2d) -> Self::Output {
        Point2d {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub<Point2d> for Point2d {
    type Output = Vec2d;

    fn sub(self, rhs: Point2d) -> Self::Output {
        Vec2d {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f64> for Vec2d {
    type Output = Vec2d;

    fn mul(self, rhs: f64) -> Self::Output {
        Vec2d {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// Image-space line `y = slope * x + intercept`.
///
/// Vertical lines are not representable; [`SlopeLine::through`] rejects point
/// pairs sharing a column.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlopeLine {
    pub slope: f64,
    pub intercept: f64,
}

impl SlopeLine {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// Line through two pixels, or `None` when they share a column.
    pub fn through(p: Point2i, q: Point2i) -> Option<Self> {
        if p.x == q.x {
            return None;
        }
        let dy = q.y as f64 - p.y as f64;
        let dx = q.x as f64 - p.x as f64;
        let slope = dy / dx;
        Some(Self {
            slope,
            intercept: p.y as f64 - slope * p.x as f64,
        })
    }

    pub fn is_horizontal(&self) -> bool {
        self.slope == 0.0
    }

    pub fn y_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Column crossed at row `y`; `None` for horizontal lines.
    pub fn x_at(&self, y: f64) -> Option<f64> {
        if self.is_horizontal() {
            return None;
        }
        Some((y - self.intercept) / self.slope)
    }
}

#[cfg(test)]
mod tests {
    use super::{Point2d, Point2i, SlopeLine, Vec2d};

    #[test]
    fn vec_ops() {
        let a = Vec2d { x: 3.0, y: 4.0 };
        assert!((a.norm() - 5.0).abs() < 1e-12);
        assert!((a.dot(Vec2d { x: 1.0, y: -2.0 }) + 5.0).abs() < 1e-12);

        let p = Point2d { x: 2.0, y: 3.0 };
        assert_eq!(p + a * 0.5, Point2d { x: 3.5, y: 5.0 });
        assert_eq!(p - Point2d { x: 1.0, y: 1.0 }, Vec2d { x: 1.0, y: 2.0 });
    }

    #[test]
    fn line_through_two_pixels() {
        let line = SlopeLine::through(Point2i { x: 10, y: 5 }, Point2i { x: 20, y: 25 })
            .expect("distinct columns");
        assert!((line.slope - 2.0).abs() < 1e-12);
        assert!((line.intercept + 15.0).abs() < 1e-12);
        assert!((line.y_at(10.0) - 5.0).abs() < 1e-12);
        assert!((line.x_at(25.0).expect("sloped") - 20.0).abs() < 1e-12);
    }

    #[test]
    fn shared_column_and_horizontal_are_degenerate() {
        assert!(SlopeLine::through(Point2i { x: 7, y: 1 }, Point2i { x: 7, y: 9 }).is_none());

        let flat = SlopeLine::through(Point2i { x: 1, y: 4 }, Point2i { x: 9, y: 4 })
            .expect("distinct columns");
        assert!(flat.is_horizontal());
        assert!(flat.x_at(4.0).is_none());
    }
}
