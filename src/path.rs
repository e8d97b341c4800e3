use crate::{
    BBox, Cubic, Curve, EllipArc, Line, Point, Quad, Scalar, Segment, Transform, EPSILON, PI,
};
use std::fmt;

/// flatness of 0.05px gives good accuracy tradeoff
pub const DEFAULT_FLATNESS: Scalar = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Bevel,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Square,
    Round,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: Scalar,
    pub line_join: LineJoin,
    pub line_cap: LineCap,
    pub miter_limit: Scalar,
    /// Dash lengths, empty list means solid line
    pub dash: Vec<Scalar>,
    pub dash_offset: Scalar,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            line_join: LineJoin::default(),
            line_cap: LineCap::default(),
            miter_limit: 10.0,
            dash: Vec::new(),
            dash_offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// Connected sequence of segments
#[derive(Clone, PartialEq)]
pub struct SubPath {
    start: Point,
    segments: Vec<Segment>,
    closed: bool,
}

impl fmt::Debug for SubPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{:?}", self.start)?;
        for segment in self.segments.iter() {
            write!(f, " {:?}", segment)?;
        }
        if self.closed {
            write!(f, " Z")?;
        }
        Ok(())
    }
}

impl SubPath {
    pub fn start(&self) -> Point {
        self.start
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    /// Flatten subpath into a polyline
    pub fn flatten(&self, tr: Transform, flatness: Scalar) -> Polyline {
        let mut points = vec![tr.apply(self.start)];
        for segment in self.segments.iter() {
            points.extend(segment.flatten(tr, flatness).map(|line| line.end()));
        }
        Polyline {
            points,
            closed: self.closed,
        }
    }
}

/// Flattened subpath
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Polyline {
    /// Lines of the polyline, closed polylines include closing line
    pub fn lines(&self, close: bool) -> impl Iterator<Item = Line> + '_ {
        let closing = if (close || self.closed) && self.points.len() > 1 {
            Some(Line::new(self.points[self.points.len() - 1], self.points[0]))
        } else {
            None
        };
        self.points
            .windows(2)
            .map(|pair| Line::new(pair[0], pair[1]))
            .chain(closing)
    }
}

/// Collection of the SubPath treated as a signle unit
#[derive(Clone, PartialEq, Default)]
pub struct Path {
    subpaths: Vec<SubPath>,
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subpaths.is_empty() {
            write!(f, "Empty")?;
        } else {
            for subpath in self.subpaths.iter() {
                subpath.fmt(f)?
            }
        }
        Ok(())
    }
}

impl Path {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn subpaths(&self) -> &[SubPath] {
        &self.subpaths
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    /// Apply transformation to the path
    pub fn transform(&self, tr: Transform) -> Self {
        let subpaths = self
            .subpaths
            .iter()
            .map(|subpath| SubPath {
                start: tr.apply(subpath.start),
                segments: subpath.segments.iter().map(|s| s.transform(tr)).collect(),
                closed: subpath.closed,
            })
            .collect();
        Self { subpaths }
    }

    /// Convert path to a list of polylines
    pub fn flatten(&self, tr: Transform, flatness: Scalar) -> Vec<Polyline> {
        self.subpaths
            .iter()
            .map(|subpath| subpath.flatten(tr, flatness))
            .collect()
    }

    /// Bounding box of the path
    pub fn bbox(&self) -> BBox {
        let mut bbox = BBox::empty();
        for subpath in self.subpaths.iter() {
            bbox.add_point(subpath.start);
            for segment in subpath.segments.iter() {
                segment.bbox(&mut bbox);
            }
        }
        bbox
    }

    /// Whether point is inside of the area enclosed by the path
    ///
    /// All subpaths are treated as implicitly closed.
    pub fn contains(&self, point: Point, fill_rule: FillRule) -> bool {
        let mut winding = 0i32;
        for polyline in self.flatten(Transform::default(), DEFAULT_FLATNESS) {
            for Line([p0, p1]) in polyline.lines(true) {
                if p0.y() <= point.y() {
                    if p1.y() > point.y() && (p1 - p0).cross(point - p0) > 0.0 {
                        winding += 1;
                    }
                } else if p1.y() <= point.y() && (p1 - p0).cross(point - p0) < 0.0 {
                    winding -= 1;
                }
            }
        }
        match fill_rule {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding % 2 != 0,
        }
    }

    /// Convert stroke of the path into a list of positively oriented polygons
    ///
    /// Union of the returned polygons (non-zero fill) is the stroked area.
    pub fn stroke(&self, style: &StrokeStyle, tr: Transform, flatness: Scalar) -> Vec<Vec<Point>> {
        let half = style.width / 2.0;
        let mut polygons = Vec::new();
        if !(half > 0.0) {
            return polygons;
        }
        for polyline in self.flatten(tr, flatness) {
            let polyline = dedup_polyline(polyline);
            for piece in apply_dash(polyline, &style.dash, style.dash_offset) {
                stroke_polyline(&piece, style, half, &mut polygons);
            }
        }
        for polygon in polygons.iter_mut() {
            if polygon_area(polygon) < 0.0 {
                polygon.reverse();
            }
        }
        polygons
    }
}

/// Signed area of the polygon
fn polygon_area(polygon: &[Point]) -> Scalar {
    let mut area = 0.0;
    for (index, p0) in polygon.iter().enumerate() {
        let p1 = polygon[(index + 1) % polygon.len()];
        area += p0.cross(p1);
    }
    area / 2.0
}

fn dedup_polyline(polyline: Polyline) -> Polyline {
    let mut points: Vec<Point> = Vec::with_capacity(polyline.points.len());
    for point in polyline.points {
        match points.last() {
            Some(last) if last.dist(point) < 1e-9 => {}
            _ => points.push(point),
        }
    }
    if polyline.closed && points.len() > 1 && points[0].dist(points[points.len() - 1]) < 1e-9 {
        points.pop();
    }
    Polyline {
        points,
        closed: polyline.closed,
    }
}

/// Split polyline into dashes
fn apply_dash(polyline: Polyline, dash: &[Scalar], offset: Scalar) -> Vec<Polyline> {
    let total: Scalar = dash.iter().sum();
    if dash.is_empty() || !(total > EPSILON) || dash.iter().any(|d| *d < 0.0) {
        return vec![polyline];
    }
    let mut points = polyline.points.clone();
    if polyline.closed && !points.is_empty() {
        points.push(points[0]);
    }
    // find initial dash state from offset
    let mut index = 0;
    let mut remain = dash[0];
    let mut offset = offset.rem_euclid(total);
    while offset > 0.0 {
        if offset >= remain {
            offset -= remain;
            index = (index + 1) % dash.len();
            remain = dash[index];
        } else {
            remain -= offset;
            offset = 0.0;
        }
    }

    let mut result = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    if index % 2 == 0 {
        if let Some(first) = points.first() {
            current.push(*first);
        }
    }
    for pair in points.windows(2) {
        let (mut p0, p1) = (pair[0], pair[1]);
        let mut length = p0.dist(p1);
        while length > 0.0 {
            let step = remain.min(length);
            let t = step / length;
            let p = p0 + t * (p1 - p0);
            if index % 2 == 0 {
                current.push(p);
            }
            length -= step;
            remain -= step;
            p0 = p;
            if remain <= EPSILON {
                if index % 2 == 0 && current.len() > 1 {
                    result.push(Polyline {
                        points: std::mem::take(&mut current),
                        closed: false,
                    });
                }
                current.clear();
                index = (index + 1) % dash.len();
                remain = dash[index];
                if index % 2 == 0 {
                    current.push(p0);
                }
            }
        }
    }
    if index % 2 == 0 && current.len() > 1 {
        result.push(Polyline {
            points: current,
            closed: false,
        });
    }
    result
}

/// Circle approximated by a polygon
fn round_polygon(center: Point, radius: Scalar) -> Vec<Point> {
    let steps = ((radius * 2.0 * PI / 2.0).ceil() as usize).clamp(8, 128);
    (0..steps)
        .map(|i| {
            let (sin, cos) = (2.0 * PI * i as Scalar / steps as Scalar).sin_cos();
            center + radius * Point::new(cos, sin)
        })
        .collect()
}

fn stroke_polyline(
    polyline: &Polyline,
    style: &StrokeStyle,
    half: Scalar,
    out: &mut Vec<Vec<Point>>,
) {
    let points = &polyline.points;
    if points.len() < 2 {
        if let (Some(point), LineCap::Round) = (points.first(), style.line_cap) {
            if !polyline.closed {
                out.push(round_polygon(*point, half));
            }
        }
        return;
    }
    let count = if polyline.closed {
        points.len()
    } else {
        points.len() - 1
    };
    let segment = |index: usize| (points[index], points[(index + 1) % points.len()]);
    for index in 0..count {
        let (p0, p1) = segment(index);
        let Some(dir) = (p1 - p0).normalize() else {
            continue;
        };
        let n = half * dir.normal();
        out.push(vec![p0 + n, p1 + n, p1 - n, p0 - n]);
    }

    // joins
    let joins = if polyline.closed {
        0..count
    } else {
        1..count
    };
    for index in joins {
        let (a, p) = segment((index + count - 1) % count);
        let (_, b) = segment(index);
        let (Some(d0), Some(d1)) = ((p - a).normalize(), (b - p).normalize()) else {
            continue;
        };
        let (n0, n1) = (d0.normal(), d1.normal());
        match style.line_join {
            LineJoin::Round => out.push(round_polygon(p, half)),
            LineJoin::Bevel | LineJoin::Miter => {
                out.push(vec![p, p + half * n0, p + half * n1]);
                out.push(vec![p, p - half * n0, p - half * n1]);
                if style.line_join == LineJoin::Miter {
                    let side = if d0.cross(d1) > 0.0 { 1.0 } else { -1.0 };
                    let cos_half = ((1.0 + n0.dot(n1)) / 2.0).max(0.0).sqrt();
                    if cos_half > EPSILON && 1.0 / cos_half <= style.miter_limit {
                        if let Some(mid) = (n0 + n1).normalize() {
                            let tip = p + (side * half / cos_half) * mid;
                            out.push(vec![p + (side * half) * n0, tip, p + (side * half) * n1]);
                        }
                    }
                }
            }
        }
    }

    // caps
    if !polyline.closed {
        let ends = [
            (points[0], points[1]),
            (points[points.len() - 1], points[points.len() - 2]),
        ];
        for (end, next) in ends {
            let Some(dir) = (end - next).normalize() else {
                continue;
            };
            let n = half * dir.normal();
            match style.line_cap {
                LineCap::Butt => {}
                LineCap::Square => {
                    let ext = half * dir;
                    out.push(vec![end + n, end + n + ext, end - n + ext, end - n]);
                }
                LineCap::Round => out.push(round_polygon(end, half)),
            }
        }
    }
}

/// Incremental path construction, canvas `beginPath` / `moveTo` / ... family
#[derive(Clone, Default)]
pub struct PathBuilder {
    position: Option<Point>,
    start: Point,
    subpath: Vec<Segment>,
    subpaths: Vec<SubPath>,
}

impl fmt::Debug for PathBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_path().fmt(f)
    }
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the path constructed so far
    pub fn to_path(&self) -> Path {
        let mut subpaths = self.subpaths.clone();
        if !self.subpath.is_empty() {
            subpaths.push(SubPath {
                start: self.start,
                segments: self.subpath.clone(),
                closed: false,
            });
        }
        Path { subpaths }
    }

    /// Remove everything from the builder
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn flush(&mut self, closed: bool) {
        if !self.subpath.is_empty() {
            let segments = std::mem::take(&mut self.subpath);
            self.subpaths.push(SubPath {
                start: self.start,
                segments,
                closed,
            });
        }
    }

    /// Move current position, ending current subpath
    pub fn move_to(&mut self, p: impl Into<Point>) -> &mut Self {
        self.flush(false);
        let p = p.into();
        self.position = Some(p);
        self.start = p;
        self
    }

    /// Close current subpath, new subpath starts at the same point
    pub fn close(&mut self) -> &mut Self {
        if self.position.is_some() {
            self.flush(true);
            self.position = Some(self.start);
        }
        self
    }

    fn ensure_position(&mut self, p: Point) -> Point {
        match self.position {
            Some(position) => position,
            None => {
                self.move_to(p);
                p
            }
        }
    }

    /// Add line from the current position to the specified point
    pub fn line_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p = p.into();
        let position = self.ensure_position(p);
        self.subpath.push(Line::new(position, p).into());
        self.position = Some(p);
        self
    }

    /// Add quadratic bezier curve
    pub fn quad_to(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) -> &mut Self {
        let (p1, p2) = (p1.into(), p2.into());
        let position = self.ensure_position(p1);
        self.subpath.push(Quad::new(position, p1, p2).into());
        self.position = Some(p2);
        self
    }

    /// Add cubic beizer curve
    pub fn cubic_to(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> &mut Self {
        let (p1, p2, p3) = (p1.into(), p2.into(), p3.into());
        let position = self.ensure_position(p1);
        self.subpath.push(Cubic::new(position, p1, p2, p3).into());
        self.position = Some(p3);
        self
    }

    /// Add arc, connected with a line to the current position if there is one
    pub fn arc(&mut self, arc: EllipArc, tr: Transform) -> &mut Self {
        let start = tr.apply(arc.start());
        if self.position.is_some() {
            self.line_to(start);
        } else {
            self.move_to(start);
        }
        for cubic in arc.to_cubics() {
            let Cubic([_, p1, p2, p3]) = cubic.transform(tr);
            self.cubic_to(p1, p2, p3);
        }
        self
    }

    /// Current possition of the builder
    pub fn position(&self) -> Option<Point> {
        self.position
    }
}
