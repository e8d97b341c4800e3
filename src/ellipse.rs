use crate::{BBox, Cubic, Point, Scalar, Transform, PI};
use std::fmt;

/// Effective signed sweep of canvas `arc(start, end, anticlockwise)`
pub fn canvas_arc_sweep(start: Scalar, end: Scalar, anticlockwise: bool) -> Scalar {
    let turn = 2.0 * PI;
    if !anticlockwise {
        if end - start >= turn {
            turn
        } else {
            (end - start).rem_euclid(turn)
        }
    } else if start - end >= turn {
        -turn
    } else {
        -(start - end).rem_euclid(turn)
    }
}

/// Elliptical Arc
#[derive(Clone, Copy, PartialEq)]
pub struct EllipArc {
    /// center of the ellipse
    center: Point,
    /// radius along x-axis before the rotation
    rx: Scalar,
    /// radius along y-axis before the rotation
    ry: Scalar,
    /// rotation
    phi: Scalar,
    /// angular start
    eta: Scalar,
    /// angular size
    eta_delta: Scalar,
}

impl fmt::Debug for EllipArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Arc center:{:?} radius:{:?} phi:{:.3?} eta:{:.3?} eta_delta:{:.3?}",
            self.center,
            Point([self.rx, self.ry]),
            self.phi,
            self.eta,
            self.eta_delta
        )
    }
}

impl EllipArc {
    /// Elliptical arc with `rx`, `ry` radii rotated by `phi`, swept from `start` to `end`
    /// angle the same way canvas `arc` resolves the direction.
    pub fn new(
        center: Point,
        rx: Scalar,
        ry: Scalar,
        phi: Scalar,
        start: Scalar,
        end: Scalar,
        anticlockwise: bool,
    ) -> Self {
        Self {
            center,
            rx,
            ry,
            phi,
            eta: start,
            eta_delta: canvas_arc_sweep(start, end, anticlockwise),
        }
    }

    /// Circular arc as drawn by canvas `arc(cx, cy, r, start, end, anticlockwise)`
    pub fn new_circle(
        center: Point,
        radius: Scalar,
        start: Scalar,
        end: Scalar,
        anticlockwise: bool,
    ) -> Self {
        Self::new(center, radius, radius, 0.0, start, end, anticlockwise)
    }

    pub fn at(&self, t: Scalar) -> Point {
        let (angle_sin, angle_cos) = (self.eta + t * self.eta_delta).sin_cos();
        let point = Point([self.rx * angle_cos, self.ry * angle_sin]);
        Transform::default().rotate(self.phi).apply(point) + self.center
    }

    pub fn start(&self) -> Point {
        self.at(0.0)
    }

    pub fn end(&self) -> Point {
        self.at(1.0)
    }

    pub fn eta_delta(&self) -> Scalar {
        self.eta_delta
    }

    /// Extend bounding box with the whole arc
    ///
    /// Exact extent of the ellipse, axis extremes that fall inside of the swept
    /// range are added along with the end points.
    pub fn bbox(&self, bbox: &mut BBox) {
        bbox.add_point(self.start());
        if !self.eta_delta.is_finite() || self.eta_delta == 0.0 {
            return;
        }
        bbox.add_point(self.end());
        let (sin, cos) = self.phi.sin_cos();
        let eta_x = (-self.ry * sin).atan2(self.rx * cos);
        let eta_y = (self.ry * cos).atan2(self.rx * sin);
        let sweep = self.eta_delta.abs();
        for eta in [eta_x, eta_x + PI, eta_y, eta_y + PI] {
            // distance from the start along the sweep direction
            let offset = ((eta - self.eta) * self.eta_delta.signum()).rem_euclid(2.0 * PI);
            if offset <= sweep {
                bbox.add_point(self.at(offset / sweep));
            }
        }
    }

    /// Convert elliptic arc to an iterator over Cubic segments
    pub fn to_cubics(&self) -> EllipArcCubicIter {
        EllipArcCubicIter::new(*self)
    }
}

/// Approximate arc with a sequnce of cubic bezier curves
///
/// [Drawing an elliptical arc using polylines, quadratic or cubic Bezier curves]
/// (http://www.spaceroots.org/documents/ellipse/elliptical-arc.pdf)
///
/// Arc is split in segments no bigger then `pi / 2`.
///     P0 = A(eta_1)
///     P1 = P0 + alpha * A'(eta_1)
///     P2 = P3 - alpha * A'(eta_2)
///     P3 = A(eta_2)
/// where
///     alpha = sin(eta_2 - eta_1) * (sqrt(4 + 3 * tan((eta_2 - eta_1) / 2) ** 2) - 1) / 3
pub struct EllipArcCubicIter {
    arc: EllipArc,
    phi_tr: Transform,
    segment_delta: Scalar,
    segment_index: Scalar,
    segment_count: Scalar,
}

impl EllipArcCubicIter {
    fn new(arc: EllipArc) -> Self {
        let phi_tr = Transform::default().rotate(arc.phi);
        let segment_max_angle = PI / 2.0;
        let segment_count = (arc.eta_delta.abs() / segment_max_angle).ceil();
        let segment_count = if segment_count.is_finite() {
            segment_count.max(1.0)
        } else {
            0.0
        };
        let segment_delta = arc.eta_delta / segment_count;
        Self {
            arc,
            phi_tr,
            segment_delta,
            segment_index: 0.0,
            segment_count: segment_count - 1.0,
        }
    }

    fn at(&self, alpha: Scalar) -> (Point, Point) {
        let (sin, cos) = alpha.sin_cos();
        let at = self
            .phi_tr
            .apply(Point([self.arc.rx * cos, self.arc.ry * sin]))
            + self.arc.center;
        let at_deriv = self
            .phi_tr
            .apply(Point([-self.arc.rx * sin, self.arc.ry * cos]));
        (at, at_deriv)
    }
}

impl Iterator for EllipArcCubicIter {
    type Item = Cubic;

    fn next(&mut self) -> Option<Self::Item> {
        if self.segment_index > self.segment_count {
            return None;
        }
        let eta_1 = self.arc.eta + self.segment_delta * self.segment_index;
        let eta_2 = eta_1 + self.segment_delta;
        self.segment_index += 1.0;

        let sq = (4.0 + 3.0 * ((eta_2 - eta_1) / 2.0).tan().powi(2)).sqrt();
        let alpha = (eta_2 - eta_1).sin() * (sq - 1.0) / 3.0;
        let (p0, d0) = self.at(eta_1);
        let (p3, d3) = self.at(eta_2);
        let p1 = p0 + alpha * d0;
        let p2 = p3 - alpha * d3;
        Some(Cubic([p0, p1, p2, p3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_arc_endpoints() {
        let arc = EllipArc::new(Point::new(10.0, 20.0), 30.0, 20.0, PI / 6.0, 0.0, PI, false);
        let rotate = Transform::default().rotate(PI / 6.0);
        assert!(arc.start().is_close_to(rotate.apply(Point::new(30.0, 0.0)) + Point::new(10.0, 20.0)));
        assert!(arc.end().is_close_to(rotate.apply(Point::new(-30.0, 0.0)) + Point::new(10.0, 20.0)));
        assert_approx_eq!(arc.eta_delta(), PI);
        let arc = EllipArc::new(Point::new(0.0, 0.0), 30.0, 20.0, 0.0, 0.0, PI / 2.0, true);
        assert_approx_eq!(arc.eta_delta(), -1.5 * PI);
        assert!(arc.end().is_close_to(Point::new(0.0, 20.0)));
    }

    #[test]
    fn test_arc_bbox() {
        // half of the unrotated ellipse below the x-axis
        let arc = EllipArc::new(Point::new(0.0, 0.0), 20.0, 10.0, 0.0, 0.0, PI, false);
        let mut bbox = BBox::empty();
        arc.bbox(&mut bbox);
        assert_approx_eq!(bbox.x(), -20.0, 1e-9);
        assert_approx_eq!(bbox.y(), 0.0, 1e-9);
        assert_approx_eq!(bbox.width(), 40.0, 1e-9);
        assert_approx_eq!(bbox.height(), 10.0, 1e-9);

        // same half swept the other way round
        let arc = EllipArc::new(Point::new(0.0, 0.0), 20.0, 10.0, 0.0, 0.0, PI, true);
        let mut bbox = BBox::empty();
        arc.bbox(&mut bbox);
        assert_approx_eq!(bbox.y(), -10.0, 1e-9);
        assert_approx_eq!(bbox.height(), 10.0, 1e-9);

        // full turn of the rotated circle is a square
        let arc = EllipArc::new(Point::new(5.0, 5.0), 3.0, 3.0, 0.7, 0.0, 2.0 * PI, false);
        let mut bbox = BBox::empty();
        arc.bbox(&mut bbox);
        assert_approx_eq!(bbox.x(), 2.0, 1e-9);
        assert_approx_eq!(bbox.y(), 2.0, 1e-9);
        assert_approx_eq!(bbox.width(), 6.0, 1e-9);
        assert_approx_eq!(bbox.height(), 6.0, 1e-9);
    }

    #[test]
    fn test_arc_bbox_contains_samples() {
        let arcs = [
            EllipArc::new(Point::new(20.0, 5.0), 25.0, 15.0, 0.3, 2.5, 0.4, false),
            EllipArc::new(Point::new(20.0, 5.0), 25.0, 15.0, 0.3, 2.5, 0.4, true),
            EllipArc::new(Point::new(-3.0, 7.0), 8.0, 30.0, -1.2, -0.5, 4.0, false),
        ];
        for arc in arcs {
            let mut bbox = BBox::empty();
            arc.bbox(&mut bbox);
            for i in 0..=200 {
                let p = arc.at(i as Scalar / 200.0);
                assert!(bbox.x() - 1e-6 <= p.x() && p.x() <= bbox.max().x() + 1e-6, "{:?}", arc);
                assert!(bbox.y() - 1e-6 <= p.y() && p.y() <= bbox.max().y() + 1e-6, "{:?}", arc);
            }
        }
    }

    #[test]
    fn test_canvas_sweep() {
        assert_approx_eq!(canvas_arc_sweep(0.0, PI / 2.0, false), PI / 2.0);
        assert_approx_eq!(canvas_arc_sweep(0.0, PI / 2.0, true), -1.5 * PI);
        assert_approx_eq!(canvas_arc_sweep(0.0, 2.0 * PI, false), 2.0 * PI);
        assert_approx_eq!(canvas_arc_sweep(0.0, -PI / 2.0, false), 1.5 * PI);
    }
}
