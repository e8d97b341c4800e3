//! Path data (`d` attribute) parsing into absolute drawing commands
use crate::{utils::parse_float, BBox, Canvas, EllipArc, Point, Scalar, PI};
use std::fmt;

/// Absolute drawing command
#[derive(Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
    QuadTo(Point, Point),
    /// Arc drawn as a scaled and rotated circular arc around `center`
    Arc {
        center: Point,
        rx: Scalar,
        ry: Scalar,
        phi: Scalar,
        start: Scalar,
        delta: Scalar,
        sweep: bool,
    },
    Close,
}

impl fmt::Debug for PathCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathCommand::MoveTo(p) => write!(f, "M{:?}", p),
            PathCommand::LineTo(p) => write!(f, "L{:?}", p),
            PathCommand::CubicTo(p1, p2, p3) => write!(f, "C{:?} {:?} {:?}", p1, p2, p3),
            PathCommand::QuadTo(p1, p2) => write!(f, "Q{:?} {:?}", p1, p2),
            PathCommand::Arc {
                center,
                rx,
                ry,
                start,
                delta,
                ..
            } => write!(
                f,
                "A{:?} r:({:.3}, {:.3}) start:{:.3} delta:{:.3}",
                center, rx, ry, start, delta
            ),
            PathCommand::Close => write!(f, "Z"),
        }
    }
}

impl PathCommand {
    /// Elliptical arc traced by the `Arc` command
    pub fn to_arc(&self) -> Option<EllipArc> {
        match *self {
            PathCommand::Arc {
                center,
                rx,
                ry,
                phi,
                start,
                delta,
                sweep,
            } => Some(EllipArc::new(center, rx, ry, phi, start, start + delta, !sweep)),
            _ => None,
        }
    }
}

/// Parsed path data with its bounding box and marker positions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData {
    commands: Vec<PathCommand>,
    bbox: BBox,
    markers: Vec<(Point, Scalar)>,
}

fn is_command(c: char) -> bool {
    matches!(
        c,
        'M' | 'm' | 'Z' | 'z' | 'L' | 'l' | 'H' | 'h' | 'V' | 'v' | 'C' | 'c' | 'S' | 's' | 'Q'
            | 'q' | 'T' | 't' | 'A' | 'a'
    )
}

/// Split path data into tokens
///
/// Commas become separators, command letters are isolated, signs following a digit
/// and a second decimal point inside of a number start a new number.
fn tokenize(d: &str) -> Vec<String> {
    let mut text = String::with_capacity(d.len() * 2);
    let mut prev: Option<char> = None;
    let mut seen_dot = false;
    for c in d.chars() {
        let c = if c == ',' { ' ' } else { c };
        if let Some(p) = prev {
            let separate = (is_command(p) && !c.is_whitespace())
                || (is_command(c) && !p.is_whitespace())
                || (p.is_ascii_digit() && (c == '+' || c == '-'))
                || (c == '.' && seen_dot);
            if separate {
                text.push(' ');
                if c == '.' {
                    seen_dot = false;
                }
            }
        }
        match c {
            '.' => seen_dot = true,
            c if c.is_ascii_digit() => {}
            _ => seen_dot = false,
        }
        text.push(c);
        prev = Some(c);
    }
    text.split_whitespace().map(str::to_owned).collect()
}

struct Parser {
    tokens: Vec<String>,
    index: usize,
    command: char,
    /// Command of the previous segment, implicit repetitions included
    previous: char,
    start: Point,
    control: Point,
    current: Point,
    points: Vec<Point>,
    angles: Vec<Option<Scalar>>,
}

impl Parser {
    fn new(d: &str) -> Self {
        Self {
            tokens: tokenize(d),
            index: 0,
            command: ' ',
            previous: ' ',
            start: Point::new(0.0, 0.0),
            control: Point::new(0.0, 0.0),
            current: Point::new(0.0, 0.0),
            points: Vec::new(),
            angles: Vec::new(),
        }
    }

    fn is_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn is_command_or_end(&self) -> bool {
        match self.tokens.get(self.index) {
            None => true,
            Some(token) => {
                let mut chars = token.chars();
                matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic())
            }
        }
    }

    fn is_relative(&self) -> bool {
        self.command.is_ascii_lowercase()
    }

    fn next_token(&mut self) -> Option<&str> {
        let token = self.tokens.get(self.index)?;
        self.index += 1;
        Some(token.as_str())
    }

    fn next_command(&mut self) {
        self.command = self
            .next_token()
            .and_then(|token| {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            })
            .unwrap_or(' ');
    }

    fn scalar(&mut self) -> Scalar {
        self.next_token().map_or(Scalar::NAN, parse_float)
    }

    /// Arc flag, flags may be written without separators (`a5 5 0 11 10 10`)
    fn flag(&mut self) -> Scalar {
        let Some(token) = self.tokens.get_mut(self.index) else {
            return Scalar::NAN;
        };
        if token.len() > 1 && (token.starts_with('0') || token.starts_with('1')) {
            let flag = if token.starts_with('1') { 1.0 } else { 0.0 };
            token.remove(0);
            return flag;
        }
        self.scalar()
    }

    fn point(&mut self) -> Point {
        let x = self.scalar();
        let y = self.scalar();
        self.make_absolute(Point::new(x, y))
    }

    fn make_absolute(&self, point: Point) -> Point {
        if self.is_relative() {
            point + self.current
        } else {
            point
        }
    }

    fn as_control_point(&mut self) -> Point {
        let point = self.point();
        self.control = point;
        point
    }

    fn as_current_point(&mut self) -> Point {
        let point = self.point();
        self.current = point;
        point
    }

    /// Reflection of the last control point, only after a segment of the same family
    fn reflected_control_point(&self, family: [char; 2]) -> Point {
        if !family.contains(&self.previous.to_ascii_lowercase()) {
            return self.current;
        }
        2.0 * self.current - self.control
    }

    /// Record marker, angle is from `from` to `point`
    ///
    /// `prior_to` fills the angle of the previous marker if it is still unknown.
    fn add_marker(&mut self, point: Point, from: Option<Point>, prior_to: Option<Point>) {
        let pending = matches!(self.angles.last(), Some(None));
        if let (Some(prior_to), true, Some(&last)) = (prior_to, pending, self.points.last()) {
            let angle = last.angle_to(prior_to);
            if let Some(slot) = self.angles.last_mut() {
                *slot = Some(angle);
            }
        }
        self.add_marker_angle(point, from.map(|from| from.angle_to(point)));
    }

    fn add_marker_angle(&mut self, point: Point, angle: Option<Scalar>) {
        self.points.push(point);
        self.angles.push(angle);
    }

    /// Markers with unknown angles take the angle of the next known one
    fn markers(self) -> Vec<(Point, Scalar)> {
        let mut angles = self.angles;
        for index in 0..angles.len() {
            if angles[index].is_none() {
                angles[index] = angles[index + 1..].iter().find_map(|angle| *angle);
            }
        }
        self.points
            .into_iter()
            .zip(angles)
            .map(|(point, angle)| (point, angle.unwrap_or(0.0)))
            .collect()
    }
}

impl PathData {
    /// Parse path data, malformed numbers propagate as `NaN`
    pub fn parse(d: &str) -> Self {
        let mut pp = Parser::new(d);
        let mut bbox = BBox::empty();
        let mut commands = Vec::new();
        while !pp.is_end() {
            pp.next_command();
            match pp.command {
                'M' | 'm' => {
                    let p = pp.as_current_point();
                    pp.add_marker(p, None, None);
                    bbox.add_point(p);
                    commands.push(PathCommand::MoveTo(p));
                    pp.start = pp.current;
                    while !pp.is_command_or_end() {
                        let p = pp.as_current_point();
                        pp.add_marker(p, Some(pp.start), None);
                        bbox.add_point(p);
                        commands.push(PathCommand::LineTo(p));
                    }
                }
                'L' | 'l' => {
                    while !pp.is_command_or_end() {
                        let c = pp.current;
                        let p = pp.as_current_point();
                        pp.add_marker(p, Some(c), None);
                        bbox.add_point(p);
                        commands.push(PathCommand::LineTo(p));
                    }
                }
                'H' | 'h' | 'V' | 'v' => {
                    let horizontal = pp.command.eq_ignore_ascii_case(&'h');
                    while !pp.is_command_or_end() {
                        let value = pp.scalar();
                        let current = pp.current;
                        let p = match (horizontal, pp.is_relative()) {
                            (true, true) => Point::new(current.x() + value, current.y()),
                            (true, false) => Point::new(value, current.y()),
                            (false, true) => Point::new(current.x(), current.y() + value),
                            (false, false) => Point::new(current.x(), value),
                        };
                        pp.add_marker(p, Some(current), None);
                        pp.current = p;
                        bbox.add_point(p);
                        commands.push(PathCommand::LineTo(p));
                    }
                }
                'C' | 'c' | 'S' | 's' => {
                    let smooth = pp.command.eq_ignore_ascii_case(&'s');
                    while !pp.is_command_or_end() {
                        let curr = pp.current;
                        let p1 = if smooth {
                            pp.reflected_control_point(['c', 's'])
                        } else {
                            pp.point()
                        };
                        let p2 = pp.as_control_point();
                        let p3 = pp.as_current_point();
                        pp.add_marker(p3, Some(p2), Some(p1));
                        bbox.add_bezier_curve(curr, p1, p2, p3);
                        commands.push(PathCommand::CubicTo(p1, p2, p3));
                        pp.previous = pp.command;
                    }
                }
                'Q' | 'q' | 'T' | 't' => {
                    let smooth = pp.command.eq_ignore_ascii_case(&'t');
                    while !pp.is_command_or_end() {
                        let curr = pp.current;
                        let p1 = if smooth {
                            let p1 = pp.reflected_control_point(['q', 't']);
                            pp.control = p1;
                            p1
                        } else {
                            pp.as_control_point()
                        };
                        let p2 = pp.as_current_point();
                        pp.add_marker(p2, Some(p1), Some(p1));
                        bbox.add_quadratic_curve(curr, p1, p2);
                        commands.push(PathCommand::QuadTo(p1, p2));
                        pp.previous = pp.command;
                    }
                }
                'A' | 'a' => {
                    while !pp.is_command_or_end() {
                        let curr = pp.current;
                        let rx = pp.scalar().abs();
                        let ry = pp.scalar().abs();
                        let phi = pp.scalar() * (PI / 180.0);
                        let large = pp.flag();
                        let sweep = pp.flag();
                        let cp = pp.as_current_point();
                        bbox.add_point(cp);
                        if rx == 0.0 || ry == 0.0 {
                            pp.add_marker(cp, Some(curr), None);
                            commands.push(PathCommand::LineTo(cp));
                        } else {
                            let (command, markers) = arc_command(curr, cp, rx, ry, phi, large, sweep);
                            if let Some(arc) = command.to_arc() {
                                arc.bbox(&mut bbox);
                            }
                            for (point, angle) in markers {
                                pp.add_marker_angle(point, Some(angle));
                            }
                            commands.push(command);
                        }
                        pp.previous = pp.command;
                    }
                }
                'Z' | 'z' => {
                    commands.push(PathCommand::Close);
                    pp.current = pp.start;
                }
                _ => {}
            }
            if !matches!(pp.command, 'C' | 'c' | 'S' | 's' | 'Q' | 'q' | 'T' | 't') {
                pp.previous = pp.command;
            }
        }
        Self {
            commands,
            bbox,
            markers: pp.markers(),
        }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// Marker positions with their orientation angles
    pub fn markers(&self) -> &[(Point, Scalar)] {
        &self.markers
    }

    /// Add commands to the current path of the canvas
    pub fn trace(&self, canvas: &mut Canvas) {
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) => canvas.move_to(p.x(), p.y()),
                PathCommand::LineTo(p) => canvas.line_to(p.x(), p.y()),
                PathCommand::CubicTo(p1, p2, p3) => {
                    canvas.bezier_curve_to(p1.x(), p1.y(), p2.x(), p2.y(), p3.x(), p3.y())
                }
                PathCommand::QuadTo(p1, p2) => {
                    canvas.quadratic_curve_to(p1.x(), p1.y(), p2.x(), p2.y())
                }
                PathCommand::Arc {
                    center,
                    rx,
                    ry,
                    phi,
                    start,
                    delta,
                    sweep,
                } => {
                    let r = rx.max(ry);
                    let (sx, sy) = if rx > ry { (1.0, ry / rx) } else { (rx / ry, 1.0) };
                    canvas.translate(center.x(), center.y());
                    canvas.rotate(phi);
                    canvas.scale(sx, sy);
                    canvas.arc(0.0, 0.0, r, start, start + delta, !sweep);
                    canvas.scale(1.0 / sx, 1.0 / sy);
                    canvas.rotate(-phi);
                    canvas.translate(-center.x(), -center.y());
                }
                PathCommand::Close => canvas.close_path(),
            }
        }
    }
}

/// Endpoint to center conversion of the arc, returns command and its two markers
fn arc_command(
    curr: Point,
    cp: Point,
    mut rx: Scalar,
    mut ry: Scalar,
    phi: Scalar,
    large: Scalar,
    sweep: Scalar,
) -> (PathCommand, [(Point, Scalar); 2]) {
    let (sin, cos) = phi.sin_cos();
    // x1', y1'
    let half = (curr - cp) / 2.0;
    let currp = Point::new(
        cos * half.x() + sin * half.y(),
        -sin * half.x() + cos * half.y(),
    );
    // out of range radii are scaled up
    let l = currp.x().powi(2) / rx.powi(2) + currp.y().powi(2) / ry.powi(2);
    if l > 1.0 {
        rx *= l.sqrt();
        ry *= l.sqrt();
    }
    // cx', cy'
    let sign = if large == sweep { -1.0 } else { 1.0 };
    let mut s = sign
        * ((rx.powi(2) * ry.powi(2) - rx.powi(2) * currp.y().powi(2) - ry.powi(2) * currp.x().powi(2))
            / (rx.powi(2) * currp.y().powi(2) + ry.powi(2) * currp.x().powi(2)))
        .sqrt();
    if s.is_nan() {
        s = 0.0;
    }
    let cpp = Point::new(s * rx * currp.y() / ry, s * -ry * currp.x() / rx);
    let mid = (curr + cp) / 2.0;
    let center = Point::new(
        mid.x() + cos * cpp.x() - sin * cpp.y(),
        mid.y() + sin * cpp.x() + cos * cpp.y(),
    );

    let magnitude = |v: Point| (v.x().powi(2) + v.y().powi(2)).sqrt();
    let ratio = |u: Point, v: Point| (u.x() * v.x() + u.y() * v.y()) / (magnitude(u) * magnitude(v));
    let angle = |u: Point, v: Point| {
        let sign = if u.x() * v.y() < u.y() * v.x() { -1.0 } else { 1.0 };
        sign * ratio(u, v).acos()
    };
    let u = Point::new((currp.x() - cpp.x()) / rx, (currp.y() - cpp.y()) / ry);
    let v = Point::new((-currp.x() - cpp.x()) / rx, (-currp.y() - cpp.y()) / ry);
    let start = angle(Point::new(1.0, 0.0), u);
    let mut delta = angle(u, v);
    if ratio(u, v) <= -1.0 {
        delta = PI;
    }
    if ratio(u, v) >= 1.0 {
        delta = 0.0;
    }

    let sweep = sweep != 0.0;
    let dir = if sweep { -1.0 } else { 1.0 };
    let halfway_angle = start + dir * (delta / 2.0);
    let halfway = Point::new(
        center.x() + rx * halfway_angle.cos(),
        center.y() + ry * halfway_angle.sin(),
    );
    let command = PathCommand::Arc {
        center,
        rx,
        ry,
        phi,
        start,
        delta,
        sweep,
    };
    let markers = [
        (halfway, halfway_angle - dir * PI / 2.0),
        (cp, halfway_angle - dir * PI),
    ];
    (command, markers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("M10,20L30-40"), vec!["M", "10", "20", "L", "30", "-40"]);
        assert_eq!(tokenize("m.5.5.5z"), vec!["m", ".5", ".5", ".5", "z"]);
        assert_eq!(tokenize("  M 1e-3 2  "), vec!["M", "1e-3", "2"]);
        assert_eq!(tokenize("ZM1 1"), vec!["Z", "M", "1", "1"]);
    }

    #[test]
    fn test_absolute_and_relative() {
        let path = PathData::parse("M10 20 l 10 0 v 10 H 5 z m 1 1");
        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo(Point::new(10.0, 20.0)),
                PathCommand::LineTo(Point::new(20.0, 20.0)),
                PathCommand::LineTo(Point::new(20.0, 30.0)),
                PathCommand::LineTo(Point::new(5.0, 30.0)),
                PathCommand::Close,
                PathCommand::MoveTo(Point::new(11.0, 21.0)),
            ]
        );
        let bbox = path.bbox();
        assert_approx_eq!(bbox.x(), 5.0);
        assert_approx_eq!(bbox.y(), 20.0);
        assert_approx_eq!(bbox.width(), 15.0);
        assert_approx_eq!(bbox.height(), 10.0);
    }

    #[test]
    fn test_move_to_bbox_corner() {
        for (x, y) in [(0.0, 0.0), (3.5, -7.0), (100.0, 42.0)] {
            let path = PathData::parse(&format!("M {} {} l 5 5 c 1 1 2 2 3 3", x, y));
            assert_approx_eq!(path.bbox().x(), x);
            assert_approx_eq!(path.bbox().y(), y);
        }
    }

    #[test]
    fn test_implicit_line_to() {
        let path = PathData::parse("m 1 1 2 2 3 3");
        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo(Point::new(1.0, 1.0)),
                PathCommand::LineTo(Point::new(3.0, 3.0)),
                PathCommand::LineTo(Point::new(6.0, 6.0)),
            ]
        );
    }

    #[test]
    fn test_smooth_reflection() {
        // reflected after a cubic
        let path = PathData::parse("M0 0 C 0 10 10 10 10 0 S 20 -10 20 0");
        match path.commands()[2] {
            PathCommand::CubicTo(p1, ..) => assert_eq!(p1, Point::new(10.0, -10.0)),
            ref cmd => panic!("unexpected command {:?}", cmd),
        }
        // not reflected after a quadratic
        let path = PathData::parse("M0 0 Q 5 10 10 0 S 20 -10 20 0");
        match path.commands()[2] {
            PathCommand::CubicTo(p1, ..) => assert_eq!(p1, Point::new(10.0, 0.0)),
            ref cmd => panic!("unexpected command {:?}", cmd),
        }
        // quadratic reflection is chained through implicit repetitions
        let path = PathData::parse("M0 0 T 10 0 20 0");
        match (path.commands()[1], path.commands()[2]) {
            (PathCommand::QuadTo(c1, _), PathCommand::QuadTo(c2, _)) => {
                assert_eq!(c1, Point::new(0.0, 0.0));
                assert_eq!(c2, Point::new(20.0, 0.0));
            }
            cmds => panic!("unexpected commands {:?}", cmds),
        }
    }

    #[test]
    fn test_curve_bbox_contains_samples() {
        let paths = [
            "M10 80 C 40 10, 65 10, 95 80",
            "M0 0 C 100 100 -50 100 50 0",
            "M10 80 Q 95 10 180 80",
            "M0 0 Q 50 -40 10 10 T 40 40",
            "M 0 0 A 10 10 0 0 1 20 0",
            "M 10 20 A 30 20 30 1 0 50 35",
            "M 0 0 a 25 15 17 1 1 40 0 l 5 5",
        ];
        for d in paths {
            let path = PathData::parse(d);
            let bbox = path.bbox();
            let mut current = Point::new(0.0, 0.0);
            for command in path.commands() {
                let sample: Box<dyn Fn(Scalar) -> Point> = match *command {
                    PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Box::new(move |_: Scalar| p),
                    PathCommand::CubicTo(p1, p2, p3) => {
                        let p0 = current;
                        Box::new(move |t: Scalar| {
                            let s = 1.0 - t;
                            s * s * s * p0 + 3.0 * s * s * t * p1 + 3.0 * s * t * t * p2 + t * t * t * p3
                        })
                    }
                    PathCommand::QuadTo(p1, p2) => {
                        let p0 = current;
                        Box::new(move |t: Scalar| {
                            let s = 1.0 - t;
                            s * s * p0 + 2.0 * s * t * p1 + t * t * p2
                        })
                    }
                    PathCommand::Arc { .. } => match command.to_arc() {
                        Some(arc) => Box::new(move |t: Scalar| arc.at(t)),
                        None => continue,
                    },
                    _ => continue,
                };
                for i in 0..=1000 {
                    let point = sample(i as Scalar / 1000.0);
                    assert!(point.x() >= bbox.x() - 1e-6 && point.x() <= bbox.max().x() + 1e-6);
                    assert!(point.y() >= bbox.y() - 1e-6 && point.y() <= bbox.max().y() + 1e-6);
                }
                current = sample(1.0);
            }
        }
    }

    #[test]
    fn test_arc() {
        let path = PathData::parse("M 0 0 A 10 10 0 0 1 20 0");
        match path.commands()[1] {
            PathCommand::Arc {
                center, rx, ry, start, delta, sweep, ..
            } => {
                assert_approx_eq!(center.x(), 10.0, 1e-9);
                assert_approx_eq!(center.y(), 0.0, 1e-9);
                assert_approx_eq!(rx, 10.0, 1e-9);
                assert_approx_eq!(ry, 10.0, 1e-9);
                assert_approx_eq!(start.abs(), PI, 1e-9);
                assert_approx_eq!(delta.abs(), PI, 1e-9);
                assert!(sweep);
            }
            ref cmd => panic!("unexpected command {:?}", cmd),
        }
        // upper half of the circle
        let bbox = path.bbox();
        assert_approx_eq!(bbox.x(), 0.0, 1e-9);
        assert_approx_eq!(bbox.y(), -10.0, 1e-9);
        assert_approx_eq!(bbox.width(), 20.0, 1e-9);
        assert_approx_eq!(bbox.height(), 10.0, 1e-9);
        // start marker, halfway marker and end marker
        assert_eq!(path.markers().len(), 3);

        // radii too small are scaled up to fit the end points
        let path = PathData::parse("M 0 0 A 1 1 0 0 0 20 0");
        match path.commands()[1] {
            PathCommand::Arc { rx, .. } => assert_approx_eq!(rx, 10.0, 1e-9),
            ref cmd => panic!("unexpected command {:?}", cmd),
        }

        // compact flags
        let path = PathData::parse("M0 0a5 5 0 1020 0");
        match path.commands()[1] {
            PathCommand::Arc { center, sweep, .. } => {
                assert!(!sweep);
                assert_approx_eq!(center.x(), 10.0, 1e-9);
            }
            ref cmd => panic!("unexpected command {:?}", cmd),
        }

        // zero radius degenerates into a line
        let path = PathData::parse("M0 0 A 0 5 0 0 0 10 10");
        assert_eq!(path.commands()[1], PathCommand::LineTo(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_markers() {
        let path = PathData::parse("M 0 0 L 10 0 L 10 10");
        let markers = path.markers();
        assert_eq!(markers.len(), 3);
        // start marker takes the angle of the first segment
        assert_approx_eq!(markers[0].1, 0.0);
        assert_approx_eq!(markers[1].1, 0.0);
        assert_approx_eq!(markers[2].1, PI / 2.0, 1e-12);

        // curve fills the unknown angle of the previous marker from its first control point
        let path = PathData::parse("M 0 0 C 0 10 10 10 10 0");
        let markers = path.markers();
        assert_approx_eq!(markers[0].1, PI / 2.0, 1e-12);
        assert_approx_eq!(markers[1].1, -PI / 2.0, 1e-12);
    }

    #[test]
    fn test_malformed_numbers() {
        let path = PathData::parse("M 10 x L 5 5");
        assert_eq!(path.commands().len(), 2);
        match path.commands()[0] {
            PathCommand::MoveTo(p) => assert!(p.y().is_nan()),
            ref cmd => panic!("unexpected command {:?}", cmd),
        }
        // later points still extend the box
        assert_approx_eq!(path.bbox().y(), 5.0);
    }

    #[test]
    fn test_trace() {
        let mut canvas = Canvas::new(40, 40);
        let path = PathData::parse("M 10 10 h 20 v 20 h -20 z");
        canvas.begin_path();
        path.trace(&mut canvas);
        assert!(canvas.is_point_in_path(20.0, 20.0));
        assert!(!canvas.is_point_in_path(35.0, 20.0));

        let mut canvas = Canvas::new(40, 40);
        let path = PathData::parse("M 0 20 A 20 10 0 0 0 40 20 z");
        canvas.begin_path();
        path.trace(&mut canvas);
        assert!(canvas.is_point_in_path(20.0, 25.0));
        assert!(!canvas.is_point_in_path(20.0, 15.0));
    }
}
