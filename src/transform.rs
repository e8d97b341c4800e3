//! Parsed `transform` attribute values
use crate::{
    utils::{compress_spaces, parse_number_list},
    Canvas, Point, Property, Scalar, Transform,
};

/// Single operator of a transform list
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOp {
    Translate { x: Scalar, y: Scalar },
    /// Rotation by `angle` radians around `(cx, cy)`
    Rotate { angle: Scalar, cx: Scalar, cy: Scalar },
    Scale { x: Scalar, y: Scalar },
    /// Raw `[a, b, c, d, e, f]` coefficients, also used for skews
    Matrix([Scalar; 6]),
}

/// Treat `NaN` (missing or malformed number) as the default value
fn or(value: Option<&Scalar>, default: Scalar) -> Scalar {
    match value {
        Some(value) if !value.is_nan() => *value,
        _ => default,
    }
}

impl TransformOp {
    /// Create operator from its name and raw arguments, `None` if the name is unknown
    pub fn parse(name: &str, args: &str) -> Option<Self> {
        let values = parse_number_list(args);
        let op = match name {
            "translate" => TransformOp::Translate {
                x: or(values.first(), 0.0),
                y: or(values.get(1), 0.0),
            },
            "rotate" => {
                let angle = args.split([' ', ',']).find(|s| !s.is_empty()).unwrap_or("");
                TransformOp::Rotate {
                    angle: Property::new("angle", angle).to_radians(),
                    cx: or(values.get(1), 0.0),
                    cy: or(values.get(2), 0.0),
                }
            }
            "scale" => {
                let x = or(values.first(), 1.0);
                TransformOp::Scale {
                    x,
                    y: or(values.get(1), x),
                }
            }
            "matrix" => {
                let mut m = [Scalar::NAN; 6];
                for (dst, src) in m.iter_mut().zip(values) {
                    *dst = src;
                }
                TransformOp::Matrix(m)
            }
            "skewX" => {
                let tan = Property::new("angle", args.trim()).to_radians().tan();
                TransformOp::Matrix([1.0, 0.0, tan, 1.0, 0.0, 0.0])
            }
            "skewY" => {
                let tan = Property::new("angle", args.trim()).to_radians().tan();
                TransformOp::Matrix([1.0, tan, 0.0, 1.0, 0.0, 0.0])
            }
            _ => return None,
        };
        Some(op)
    }

    /// Affine matrix of the operator
    pub fn matrix(&self) -> Transform {
        match *self {
            TransformOp::Translate { x, y } => Transform::identity().translate(x, y),
            TransformOp::Rotate { angle, cx, cy } => Transform::identity()
                .translate(cx, cy)
                .rotate(angle)
                .translate(-cx, -cy),
            TransformOp::Scale { x, y } => Transform::identity().scale(x, y),
            TransformOp::Matrix([a, b, c, d, e, f]) => Transform::new(a, b, c, d, e, f),
        }
    }

    /// Inverse of the operator matrix
    ///
    /// Matrices are inverted with the determinant formula, singular matrices yield
    /// non-finite coefficients.
    pub fn inverse(&self) -> Transform {
        match *self {
            TransformOp::Translate { x, y } => Transform::identity().translate(-x, -y),
            TransformOp::Rotate { angle, cx, cy } => Transform::identity()
                .translate(cx, cy)
                .rotate(-angle)
                .translate(-cx, -cy),
            TransformOp::Scale { x, y } => Transform::identity().scale(1.0 / x, 1.0 / y),
            TransformOp::Matrix([a, b, c, d, e, f]) => {
                let det = 1.0 / (a * d - b * c);
                Transform::new(
                    det * d,
                    -det * b,
                    -det * c,
                    det * a,
                    det * (c * f - d * e),
                    det * (b * e - a * f),
                )
            }
        }
    }

    pub fn apply(&self, canvas: &mut Canvas) {
        let [a, b, c, d, e, f] = self.matrix().coefficients();
        canvas.transform(a, b, c, d, e, f);
    }

    pub fn unapply(&self, canvas: &mut Canvas) {
        let [a, b, c, d, e, f] = self.inverse().coefficients();
        canvas.transform(a, b, c, d, e, f);
    }

    pub fn apply_to_point(&self, point: Point) -> Point {
        self.matrix().apply(point)
    }
}

/// Ordered list of transform operators in document order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformList {
    ops: Vec<TransformOp>,
}

impl TransformList {
    /// Parse transform list, unknown operators are skipped
    pub fn parse(value: &str) -> Self {
        let value = compress_spaces(value);
        let mut ops = Vec::new();
        for item in value.split_inclusive(')') {
            let Some((name, args)) = item.split_once('(') else {
                continue;
            };
            let name = name.trim_matches(|c: char| c.is_whitespace() || c == ',');
            let args = args.trim_end_matches(')');
            match TransformOp::parse(name, args) {
                Some(op) => ops.push(op),
                None => tracing::debug!(name, "unsupported transform operator"),
            }
        }
        Self { ops }
    }

    pub fn ops(&self) -> &[TransformOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Compose operators onto the canvas in document order
    pub fn apply(&self, canvas: &mut Canvas) {
        for op in &self.ops {
            op.apply(canvas);
        }
    }

    /// Revert `apply` by composing inverse operators in reverse order
    pub fn unapply(&self, canvas: &mut Canvas) {
        for op in self.ops.iter().rev() {
            op.unapply(canvas);
        }
    }

    /// Map point the same way `apply` maps user space into the outer space
    pub fn apply_to_point(&self, point: Point) -> Point {
        self.ops
            .iter()
            .rev()
            .fold(point, |point, op| op.apply_to_point(point))
    }

    /// Combined matrix equivalent to `apply`
    pub fn matrix(&self) -> Transform {
        self.ops
            .iter()
            .fold(Transform::identity(), |tr, op| tr * op.matrix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, PI};

    fn assert_point_eq(p0: Point, p1: Point) {
        assert_approx_eq!(p0.x(), p1.x(), 1e-9);
        assert_approx_eq!(p0.y(), p1.y(), 1e-9);
    }

    #[test]
    fn test_parse() {
        let list = TransformList::parse("translate(10,20)rotate(90 5 5) scale(2), skewX(45)");
        assert_eq!(list.ops().len(), 4);
        assert_eq!(list.ops()[0], TransformOp::Translate { x: 10.0, y: 20.0 });
        match list.ops()[1] {
            TransformOp::Rotate { angle, cx, cy } => {
                assert_approx_eq!(angle, PI / 2.0, 1e-12);
                assert_approx_eq!(cx, 5.0);
                assert_approx_eq!(cy, 5.0);
            }
            ref op => panic!("unexpected op: {:?}", op),
        }
        assert_eq!(list.ops()[2], TransformOp::Scale { x: 2.0, y: 2.0 });
        match list.ops()[3] {
            TransformOp::Matrix([_, _, c, ..]) => assert_approx_eq!(c, 1.0, 1e-12),
            ref op => panic!("unexpected op: {:?}", op),
        }

        let list = TransformList::parse("translate(5)");
        assert_eq!(list.ops()[0], TransformOp::Translate { x: 5.0, y: 0.0 });
        assert!(TransformList::parse("").is_empty());
    }

    #[test]
    fn test_apply_to_point() {
        let list = TransformList::parse("translate(10 0) scale(2 3)");
        assert_point_eq(list.apply_to_point(Point::new(1.0, 1.0)), Point::new(12.0, 3.0));
        assert_point_eq(list.matrix().apply(Point::new(1.0, 1.0)), Point::new(12.0, 3.0));
    }

    #[test]
    fn test_apply_unapply() {
        let lists = [
            "translate(3 -7)",
            "scale(2 0.5)",
            "rotate(33 4 -2)",
            "matrix(1 2 3 4 5 6)",
            "skewX(20)",
            "skewY(-35)",
            "translate(1,2) rotate(45) scale(3) matrix(2 0.5 -1 1 10 20) skewX(10)",
        ];
        for value in lists {
            let list = TransformList::parse(value);
            let mut canvas = Canvas::new(1, 1);
            list.apply(&mut canvas);
            list.unapply(&mut canvas);
            let point = Point::new(13.0, -4.5);
            assert_point_eq(canvas.current_transform().apply(point), point);
        }
    }
}
