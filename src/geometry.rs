use crate::utils::quadratic_solve;
use std::{
    fmt,
    ops::{Add, Div, Mul, Neg, Sub},
};

pub type Scalar = f64;
pub const EPSILON: f64 = f64::EPSILON;
pub const PI: f64 = std::f64::consts::PI;

/// Format floats in a compact way
pub fn scalar_fmt(f: &mut fmt::Formatter<'_>, value: Scalar) -> fmt::Result {
    let value_abs = value.abs();
    if value.is_nan() {
        write!(f, "NaN")
    } else if value_abs.fract() < EPSILON {
        write!(f, "{}", value.trunc() as i64)
    } else if value_abs > 9999.0 || value_abs <= 0.0001 {
        write!(f, "{:.3e}", value)
    } else {
        let ten: Scalar = 10.0;
        let round = ten.powi(6 - (value_abs.trunc() + 1.0).log10().ceil() as i32);
        write!(f, "{}", (value * round).round() / round)
    }
}

/// Value representing a 2D point or vector.
#[derive(Clone, Copy, PartialEq, Default)]
pub struct Point(pub [Scalar; 2]);

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Point([x, y]) = self;
        scalar_fmt(f, *x)?;
        write!(f, ",")?;
        scalar_fmt(f, *y)?;
        Ok(())
    }
}

impl Point {
    #[inline]
    pub const fn new(x: Scalar, y: Scalar) -> Self {
        Self([x, y])
    }

    /// Get `x` component of the point
    #[inline]
    pub fn x(self) -> Scalar {
        self.0[0]
    }

    /// Get `y` compenent of the point
    #[inline]
    pub fn y(self) -> Scalar {
        self.0[1]
    }

    /// Get length of the vector (distance from the origin)
    pub fn length(self) -> Scalar {
        let Self([x, y]) = self;
        x.hypot(y)
    }

    /// Distance between two points
    pub fn dist(self, other: Self) -> Scalar {
        (self - other).length()
    }

    /// Dot product between two vectors
    pub fn dot(self, other: Self) -> Scalar {
        let Self([x0, y0]) = self;
        let Self([x1, y1]) = other;
        x0 * x1 + y0 * y1
    }

    /// Cross product between two vectors
    pub fn cross(self, other: Self) -> Scalar {
        let Self([x0, y0]) = self;
        let Self([x1, y1]) = other;
        x0 * y1 - y0 * x1
    }

    /// Get vector normal (not a unit sized)
    pub fn normal(self) -> Point {
        let Self([x, y]) = self;
        Self([y, -x])
    }

    /// Convert vector to a unit size vector, if length is not zero
    pub fn normalize(self) -> Option<Point> {
        let Self([x, y]) = self;
        let length = self.length();
        if length < EPSILON {
            None
        } else {
            Some(Self([x / length, y / length]))
        }
    }

    /// Direction angle of the vector from self to the other point
    pub fn angle_to(self, other: Self) -> Scalar {
        (other.y() - self.y()).atan2(other.x() - self.x())
    }

    /// Determine if self is close to the other within the marging of error (EPSILON)
    pub fn is_close_to(self, other: Point) -> bool {
        let Self([x0, y0]) = self;
        let Self([x1, y1]) = other;
        (x0 - x1).abs() < EPSILON && (y0 - y1).abs() < EPSILON
    }
}

impl From<(Scalar, Scalar)> for Point {
    #[inline]
    fn from(xy: (Scalar, Scalar)) -> Self {
        Self([xy.0, xy.1])
    }
}

impl Mul<Point> for Scalar {
    type Output = Point;

    #[inline]
    fn mul(self, other: Point) -> Self::Output {
        let Point([x, y]) = other;
        Point([self * x, self * y])
    }
}

impl Div<Scalar> for Point {
    type Output = Point;

    #[inline]
    fn div(self, rhs: Scalar) -> Self::Output {
        let Point([x, y]) = self;
        Point([x / rhs, y / rhs])
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, other: Point) -> Self::Output {
        let Point([x0, y0]) = self;
        let Point([x1, y1]) = other;
        Point([x0 + x1, y0 + y1])
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, other: Point) -> Self::Output {
        let Point([x0, y0]) = self;
        let Point([x1, y1]) = other;
        Point([x0 - x1, y0 - y1])
    }
}

impl Neg for Point {
    type Output = Point;

    #[inline]
    fn neg(self) -> Self::Output {
        let Point([x, y]) = self;
        Point([-x, -y])
    }
}

/// 2D affine transformation
///
/// Stored as an array [m00, m01, m02, m10, m11, m12] but semantically corresponds to
/// a matrix:
/// ┌             ┐
/// │ m00 m01 m02 │
/// │ m10 m11 m12 │
/// │   0   0   1 │
/// └             ┘
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform([Scalar; 6]);

impl Default for Transform {
    fn default() -> Self {
        Self([1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
    }
}

impl Transform {
    /// Construct transformation from coefficients in `matrix(a b c d e f)` order
    pub fn new(a: Scalar, b: Scalar, c: Scalar, d: Scalar, e: Scalar, f: Scalar) -> Self {
        Self([a, c, e, b, d, f])
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// Coefficients in `matrix(a b c d e f)` order
    pub fn coefficients(&self) -> [Scalar; 6] {
        let Self([m00, m01, m02, m10, m11, m12]) = *self;
        [m00, m10, m01, m11, m02, m12]
    }

    /// Apply this transformation to a point
    pub fn apply(&self, point: Point) -> Point {
        let Self([m00, m01, m02, m10, m11, m12]) = self;
        let Point([x, y]) = point;
        Point([x * m00 + y * m01 + m02, x * m10 + y * m11 + m12])
    }

    /// Find the inverse transformation
    pub fn invert(&self) -> Option<Self> {
        // inv([[M, v], [0, 1]]) = [[inv(M), - inv(M) * v], [0, 1]]
        let Self([m00, m01, m02, m10, m11, m12]) = self;
        let det = m00 * m11 - m10 * m01;
        if det.abs() <= EPSILON {
            return None;
        }
        let o00 = m11 / det;
        let o01 = -m01 / det;
        let o10 = -m10 / det;
        let o11 = m00 / det;
        let o02 = -o00 * m02 - o01 * m12;
        let o12 = -o10 * m02 - o11 * m12;
        Some(Self([o00, o01, o02, o10, o11, o12]))
    }

    /// Apply translation by `[tx, ty]` before self
    pub fn translate(&self, tx: Scalar, ty: Scalar) -> Self {
        self.matmul(Self([1.0, 0.0, tx, 0.0, 1.0, ty]))
    }

    /// Apply scale transformatoin by `[sx, sy]` before self
    pub fn scale(&self, sx: Scalar, sy: Scalar) -> Self {
        self.matmul(Self([sx, 0.0, 0.0, 0.0, sy, 0.0]))
    }

    /// Apply rotation by `a` angle around the origin before self
    pub fn rotate(&self, a: Scalar) -> Self {
        let (sin, cos) = a.sin_cos();
        self.matmul(Self([cos, -sin, 0.0, sin, cos, 0.0]))
    }

    /// Apply scew transformation by `[ax, ay]` before self
    pub fn skew(&self, ax: Scalar, ay: Scalar) -> Self {
        self.matmul(Self([1.0, ax.tan(), 0.0, ay.tan(), 1.0, 0.0]))
    }

    /// Multiply transformations in matrix form
    pub fn matmul(&self, other: Transform) -> Self {
        let Self([s00, s01, s02, s10, s11, s12]) = self;
        let Self([o00, o01, o02, o10, o11, o12]) = other;

        // s00, s01, s02 | o00, o01, o02
        // s10, s11, s12 | o10, o11, o12
        // 0  , 0  , 1   | 0  , 0  , 1
        Self([
            s00 * o00 + s01 * o10,
            s00 * o01 + s01 * o11,
            s00 * o02 + s01 * o12 + s02,
            s10 * o00 + s11 * o10,
            s10 * o01 + s11 * o11,
            s10 * o02 + s11 * o12 + s12,
        ])
    }

    /// Scale factor this transformation applies to lengths (geometric mean of axes)
    pub fn scale_factor(&self) -> Scalar {
        let Self([m00, m01, _, m10, m11, _]) = self;
        (m00 * m11 - m01 * m10).abs().sqrt()
    }
}

impl Mul<Transform> for Transform {
    type Output = Transform;

    fn mul(self, other: Transform) -> Self::Output {
        self.matmul(other)
    }
}

/// Bounding box with sides directed along the axes
///
/// Box starts empty (all coordinates are `NaN`) and grows as points are added,
/// the first added coordinate on each axis initializes that axis.
#[derive(Clone, Copy, PartialEq)]
pub struct BBox {
    /// Point with minimal x and y values
    min: Point,
    /// Point with maximum x and y values
    max: Point,
}

impl Default for BBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BBox {
    /// Construct bounding box which includes points `p0` and `p1`
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        let mut bbox = Self::empty();
        bbox.add_point(p0.into());
        bbox.add_point(p1.into());
        bbox
    }

    /// Bounding box without any points
    pub const fn empty() -> Self {
        Self {
            min: Point::new(Scalar::NAN, Scalar::NAN),
            max: Point::new(Scalar::NAN, Scalar::NAN),
        }
    }

    /// Whether any point was added on both axes
    pub fn is_empty(&self) -> bool {
        self.min.x().is_nan() || self.min.y().is_nan()
    }

    /// Point with minmum values of x and y coordianetes
    #[inline]
    pub fn min(&self) -> Point {
        self.min
    }

    /// Point with maximum values of x and y coordianetes
    #[inline]
    pub fn max(&self) -> Point {
        self.max
    }

    /// `x` coordinate of the point with the minimal value
    #[inline]
    pub fn x(&self) -> Scalar {
        self.min.x()
    }

    /// `y` coordinate of the point with the minimal value
    #[inline]
    pub fn y(&self) -> Scalar {
        self.min.y()
    }

    /// Width of the bounding box
    #[inline]
    pub fn width(&self) -> Scalar {
        self.max.x() - self.min.x()
    }

    /// Hight of the bounding box
    #[inline]
    pub fn height(&self) -> Scalar {
        self.max.y() - self.min.y()
    }

    /// Determine if the point is inside of the bounding box
    pub fn contains(&self, point: Point) -> bool {
        let Point([x, y]) = point;
        self.min.x() <= x && x <= self.max.x() && self.min.y() <= y && y <= self.max.y()
    }

    pub fn add_x(&mut self, x: Scalar) {
        let (x0, x1) = range_extend(self.min.x(), self.max.x(), x);
        self.min.0[0] = x0;
        self.max.0[0] = x1;
    }

    pub fn add_y(&mut self, y: Scalar) {
        let (y0, y1) = range_extend(self.min.y(), self.max.y(), y);
        self.min.0[1] = y0;
        self.max.0[1] = y1;
    }

    /// Extend bounding box so it would contains provided point
    pub fn add_point(&mut self, point: Point) {
        self.add_x(point.x());
        self.add_y(point.y());
    }

    /// Extend bounding box so it would contain other bounding box
    pub fn add_bbox(&mut self, other: BBox) {
        self.add_point(other.min);
        self.add_point(other.max);
    }

    /// Create bounding box the spans both bbox-es
    pub fn union(&self, other: BBox) -> Self {
        let mut result = *self;
        result.add_bbox(other);
        result
    }

    /// Extend bounding box with quadratic bezier curve (elevated to the cubic)
    pub fn add_quadratic_curve(&mut self, p0: Point, p1: Point, p2: Point) {
        let cp1 = p0 + (2.0 / 3.0) * (p1 - p0);
        let cp2 = cp1 + (1.0 / 3.0) * (p2 - p0);
        self.add_bezier_curve(p0, cp1, cp2, p2);
    }

    /// Extend bounding box with cubic bezier curve
    ///
    /// Roots of the derivative on each axis inside (0, 1) are the only interior points
    /// that could extend the box beyond the end points.
    pub fn add_bezier_curve(&mut self, p0: Point, p1: Point, p2: Point, p3: Point) {
        self.add_point(p0);
        self.add_point(p3);
        for axis in 0..2 {
            let (v0, v1, v2, v3) = (p0.0[axis], p1.0[axis], p2.0[axis], p3.0[axis]);
            let a = -3.0 * v0 + 9.0 * v1 - 9.0 * v2 + 3.0 * v3;
            let b = 6.0 * v0 - 12.0 * v1 + 6.0 * v2;
            let c = 3.0 * v1 - 3.0 * v0;
            for t in quadratic_solve(a, b, c) {
                if 0.0 < t && t < 1.0 {
                    let t_1 = 1.0 - t;
                    let value = t_1 * t_1 * t_1 * v0
                        + 3.0 * t_1 * t_1 * t * v1
                        + 3.0 * t_1 * t * t * v2
                        + t * t * t * v3;
                    if axis == 0 {
                        self.add_x(value);
                    } else {
                        self.add_y(value);
                    }
                }
            }
        }
    }

    /// Bounding box of this box corners after transformation
    pub fn transform(&self, tr: Transform) -> Self {
        let mut result = Self::empty();
        if self.is_empty() {
            return result;
        }
        for point in [
            self.min,
            self.max,
            Point::new(self.min.x(), self.max.y()),
            Point::new(self.max.x(), self.min.y()),
        ] {
            result.add_point(tr.apply(point));
        }
        result
    }
}

/// Extend `[min, max]` range with a value, `NaN` range is (re)initialized by the value
fn range_extend(min: Scalar, max: Scalar, value: Scalar) -> (Scalar, Scalar) {
    if min.is_nan() {
        (value, value)
    } else {
        (
            if value < min { value } else { min },
            if value > max { value } else { max },
        )
    }
}

impl fmt::Debug for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox x=")?;
        scalar_fmt(f, self.x())?;
        write!(f, ", y=")?;
        scalar_fmt(f, self.y())?;
        write!(f, ", w=")?;
        scalar_fmt(f, self.width())?;
        write!(f, ", h=")?;
        scalar_fmt(f, self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_trasform() {
        let tr = Transform::default()
            .translate(1.0, 2.0)
            .rotate(PI / 3.0)
            .skew(2.0, 3.0)
            .scale(3.0, 2.0);
        let inv = tr.invert().unwrap();
        let p0 = Point::new(1.0, 1.0);

        let p1 = tr.apply(p0);
        assert_approx_eq!(p1.x(), -1.04674389, 1e-6);
        assert_approx_eq!(p1.y(), 1.59965634, 1e-6);

        let p2 = inv.apply(p1);
        assert_approx_eq!(p2.x(), 1.0, 1e-6);
        assert_approx_eq!(p2.y(), 1.0, 1e-6);
    }

    #[test]
    fn test_transform_coefficients() {
        let tr = Transform::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_eq!(tr.coefficients(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let p = tr.apply(Point::new(1.0, 1.0));
        assert_approx_eq!(p.x(), 1.0 + 3.0 + 5.0);
        assert_approx_eq!(p.y(), 2.0 + 4.0 + 6.0);
    }

    #[test]
    fn test_bbox_empty() {
        let mut bbox = BBox::empty();
        assert!(bbox.is_empty());
        bbox.add_x(3.0);
        assert!(bbox.is_empty());
        bbox.add_y(-1.0);
        assert!(!bbox.is_empty());
        bbox.add_point(Point::new(1.0, 2.0));
        assert_approx_eq!(bbox.x(), 1.0);
        assert_approx_eq!(bbox.y(), -1.0);
        assert_approx_eq!(bbox.width(), 2.0);
        assert_approx_eq!(bbox.height(), 3.0);
        assert!(bbox.contains(Point::new(2.0, 0.0)));
        assert!(!bbox.contains(Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_bbox_nan_propagates() {
        let mut bbox = BBox::empty();
        bbox.add_point(Point::new(Scalar::NAN, 1.0));
        assert!(bbox.is_empty());
        assert!(bbox.width().is_nan());
    }

    #[test]
    fn test_bbox_bezier_contains_samples() {
        let curves = [
            [(0.0, 0.0), (10.0, 40.0), (30.0, -20.0), (40.0, 0.0)],
            [(0.0, 0.0), (-20.0, 10.0), (50.0, 10.0), (10.0, 0.0)],
            [(5.0, 5.0), (5.0, 5.0), (5.0, 5.0), (5.0, 5.0)],
            [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)],
        ];
        for [p0, p1, p2, p3] in curves {
            let (p0, p1, p2, p3) = (p0.into(), p1.into(), p2.into(), p3.into());
            let mut bbox = BBox::empty();
            bbox.add_bezier_curve(p0, p1, p2, p3);
            for i in 0..=100 {
                let t = i as Scalar / 100.0;
                let t_1 = 1.0 - t;
                let p = (t_1 * t_1 * t_1) * p0
                    + (3.0 * t_1 * t_1 * t) * p1
                    + (3.0 * t_1 * t * t) * p2
                    + (t * t * t) * p3;
                assert!(bbox.x() - 1e-9 <= p.x() && p.x() <= bbox.max().x() + 1e-9);
                assert!(bbox.y() - 1e-9 <= p.y() && p.y() <= bbox.max().y() + 1e-9);
            }
        }
    }

    #[test]
    fn test_bbox_quadratic_contains_samples() {
        let (p0, p1, p2) = (
            Point::new(0.0, 0.0),
            Point::new(50.0, 100.0),
            Point::new(100.0, 0.0),
        );
        let mut bbox = BBox::empty();
        bbox.add_quadratic_curve(p0, p1, p2);
        assert_approx_eq!(bbox.height(), 50.0, 1e-9);
        for i in 0..=100 {
            let t = i as Scalar / 100.0;
            let p = ((1.0 - t) * (1.0 - t)) * p0 + (2.0 * (1.0 - t) * t) * p1 + (t * t) * p2;
            assert!(p.y() <= bbox.max().y() + 1e-9);
        }
    }
}
