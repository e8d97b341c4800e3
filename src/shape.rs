//! Geometry of path producing elements, bounding boxes and markers
use crate::{
    document::GlyphInfo,
    render::{render, RenderContext},
    text, Axis, BBox, Canvas, Element, ElementKind, FillRule, Metrics, Point, Scalar, PI,
};

/// Control point distance of the cubic bezier approximation of a quarter circle
const KAPPA: Scalar = 4.0 * ((std::f64::consts::SQRT_2 as Scalar) - 1.0) / 3.0;

/// How element geometry is added to the canvas path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PathMode {
    /// Start a new path before adding the geometry
    Draw,
    /// Append geometry to the path being recorded for a clip region
    Record,
}

/// Add geometry of the element to the canvas path, returns its bounding box
///
/// Without a canvas only the bounding box is computed.
pub(crate) fn path(
    cx: &RenderContext<'_>,
    elem: &Element,
    metrics: &Metrics,
    mut canvas: Option<&mut Canvas>,
    mode: PathMode,
) -> BBox {
    if mode == PathMode::Draw {
        if let Some(canvas) = canvas.as_deref_mut() {
            canvas.begin_path();
        }
    }
    let length = |name: &str, axis| elem.attribute(name).to_pixels(metrics, axis, false);
    match elem.kind() {
        ElementKind::Rect => {
            let (x, y) = (length("x", Axis::X), length("y", Axis::Y));
            let (width, height) = (length("width", Axis::X), length("height", Axis::Y));
            let mut rx = length("rx", Axis::X);
            let mut ry = length("ry", Axis::Y);
            if elem.attribute("rx").has_value() && !elem.attribute("ry").has_value() {
                ry = rx;
            }
            if elem.attribute("ry").has_value() && !elem.attribute("rx").has_value() {
                rx = ry;
            }
            let rx = rx.min(width / 2.0);
            let ry = ry.min(height / 2.0);
            if let Some(canvas) = canvas.filter(|_| width > 0.0 && height > 0.0) {
                canvas.move_to(x + rx, y);
                canvas.line_to(x + width - rx, y);
                canvas.quadratic_curve_to(x + width, y, x + width, y + ry);
                canvas.line_to(x + width, y + height - ry);
                canvas.quadratic_curve_to(x + width, y + height, x + width - rx, y + height);
                canvas.line_to(x + rx, y + height);
                canvas.quadratic_curve_to(x, y + height, x, y + height - ry);
                canvas.line_to(x, y + ry);
                canvas.quadratic_curve_to(x, y, x + rx, y);
                canvas.close_path();
            }
            BBox::new((x, y), (x + width, y + height))
        }
        ElementKind::Circle => {
            let (cx, cy) = (length("cx", Axis::X), length("cy", Axis::Y));
            let r = length("r", Axis::Diagonal);
            if let Some(canvas) = canvas.filter(|_| r > 0.0) {
                canvas.arc(cx, cy, r, 0.0, PI * 2.0, true);
                canvas.close_path();
            }
            BBox::new((cx - r, cy - r), (cx + r, cy + r))
        }
        ElementKind::Ellipse => {
            let (cx, cy) = (length("cx", Axis::X), length("cy", Axis::Y));
            let (rx, ry) = (length("rx", Axis::X), length("ry", Axis::Y));
            if let Some(canvas) = canvas.filter(|_| rx > 0.0 && ry > 0.0) {
                let (kx, ky) = (KAPPA * rx, KAPPA * ry);
                canvas.move_to(cx + rx, cy);
                canvas.bezier_curve_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
                canvas.bezier_curve_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
                canvas.bezier_curve_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
                canvas.bezier_curve_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
                canvas.close_path();
            }
            BBox::new((cx - rx, cy - ry), (cx + rx, cy + ry))
        }
        ElementKind::Line => {
            let [p0, p1] = line_points(elem, metrics);
            if let Some(canvas) = canvas {
                canvas.move_to(p0.x(), p0.y());
                canvas.line_to(p1.x(), p1.y());
            }
            BBox::new(p0, p1)
        }
        ElementKind::Polyline(points) | ElementKind::Polygon(points) => {
            let mut bbox = BBox::empty();
            for point in points {
                bbox.add_point(*point);
            }
            if let (Some(canvas), Some(first)) = (canvas, points.first()) {
                canvas.move_to(first.x(), first.y());
                for point in &points[1..] {
                    canvas.line_to(point.x(), point.y());
                }
                if let ElementKind::Polygon(_) = elem.kind() {
                    canvas.line_to(first.x(), first.y());
                    canvas.close_path();
                }
            }
            bbox
        }
        ElementKind::Path(data)
        | ElementKind::Glyph(GlyphInfo { path: data, .. })
        | ElementKind::MissingGlyph(GlyphInfo { path: data, .. }) => {
            if let Some(canvas) = canvas {
                data.trace(canvas);
            }
            data.bbox()
        }
        ElementKind::Use => match cx.definition(elem.href()) {
            Some(target) => path(cx, target, metrics, canvas, mode),
            None => BBox::empty(),
        },
        _ => BBox::empty(),
    }
}

fn line_points(elem: &Element, metrics: &Metrics) -> [Point; 2] {
    let length = |name: &str, axis| elem.attribute(name).to_pixels(metrics, axis, false);
    [
        Point::new(length("x1", Axis::X), length("y1", Axis::Y)),
        Point::new(length("x2", Axis::X), length("y2", Axis::Y)),
    ]
}

/// Bounding box of the element in its user space
pub(crate) fn bbox(cx: &RenderContext<'_>, elem: &Element, metrics: &Metrics) -> BBox {
    match elem.kind() {
        kind if kind.is_path() => path(cx, elem, metrics, None, PathMode::Draw),
        ElementKind::Svg | ElementKind::G => elem
            .children()
            .iter()
            .fold(BBox::empty(), |acc, child| {
                acc.union(bbox(cx, cx.element(*child), metrics))
            }),
        ElementKind::Text => text::bbox(cx, elem, metrics),
        ElementKind::Image { .. } => {
            let length = |name: &str, axis| elem.attribute(name).to_pixels(metrics, axis, false);
            let (x, y) = (length("x", Axis::X), length("y", Axis::Y));
            BBox::new(
                (x, y),
                (x + length("width", Axis::X), y + length("height", Axis::Y)),
            )
        }
        _ => BBox::empty(),
    }
}

/// Marker positions with their orientation angles
pub(crate) fn markers(elem: &Element, metrics: &Metrics) -> Vec<(Point, Scalar)> {
    match elem.kind() {
        ElementKind::Path(data) => data.markers().to_vec(),
        ElementKind::Line => {
            let [p0, p1] = line_points(elem, metrics);
            let angle = p0.angle_to(p1);
            vec![(p0, angle), (p1, angle)]
        }
        ElementKind::Polyline(points) | ElementKind::Polygon(points) => {
            let mut markers: Vec<(Point, Scalar)> = points
                .windows(2)
                .map(|pair| (pair[0], pair[0].angle_to(pair[1])))
                .collect();
            if let (Some(last), Some(&(_, angle))) = (points.last(), markers.last()) {
                markers.push((*last, angle));
            }
            markers
        }
        _ => Vec::new(),
    }
}

/// Draw path of the element with the current fill and stroke, then its markers
pub(crate) fn render_path(cx: &mut RenderContext<'_>, elem: &Element, canvas: &mut Canvas) {
    let metrics = cx.metrics(canvas);
    path(cx, elem, &metrics, Some(&mut *canvas), PathMode::Draw);
    if let (Some(mouse), Some(id)) = (cx.mouse.as_deref_mut(), elem.id()) {
        mouse.check_path(id, canvas);
    }

    if !canvas.fill_paint().is_transparent() {
        let fill_rule = match cx.style(elem, "fill-rule").value() {
            "evenodd" => FillRule::EvenOdd,
            _ => FillRule::NonZero,
        };
        canvas.fill(fill_rule);
    }
    if !canvas.stroke_paint().is_transparent() {
        canvas.stroke();
    }

    let markers = markers(elem, &metrics);
    let Some((&first, &last)) = markers.first().zip(markers.last()) else {
        return;
    };
    if let Some(marker) = marker_definition(cx, elem, "marker-start") {
        render_marker(cx, marker, first, canvas);
    }
    if let Some(marker) = marker_definition(cx, elem, "marker-mid") {
        for &position in markers.iter().take(markers.len() - 1).skip(1) {
            render_marker(cx, marker, position, canvas);
        }
    }
    if let Some(marker) = marker_definition(cx, elem, "marker-end") {
        render_marker(cx, marker, last, canvas);
    }
}

fn marker_definition<'a>(
    cx: &RenderContext<'a>,
    elem: &Element,
    name: &str,
) -> Option<&'a Element> {
    let prop = cx.style(elem, name);
    if !prop.is_url_definition() {
        return None;
    }
    cx.definition(prop)
        .filter(|marker| matches!(marker.kind(), ElementKind::Marker))
}

/// Render marker content at the position oriented along the angle
///
/// The content is placed into a synthesized viewport with the marker `viewBox` and
/// reference point, scaled by the stroke width unless `markerUnits` says otherwise.
fn render_marker(
    cx: &mut RenderContext<'_>,
    marker: &Element,
    (point, angle): (Point, Scalar),
    canvas: &mut Canvas,
) {
    let line_width = canvas.line_width();
    canvas.save();
    canvas.translate(point.x(), point.y());
    if marker.attribute("orient").value_or_default("auto") == "auto" {
        canvas.rotate(angle);
    }
    if marker.attribute("markerUnits").value_or_default("strokeWidth") == "strokeWidth" {
        canvas.scale(line_width, line_width);
    }
    let attr = |name: &str| marker.attribute(name).value().to_owned();
    let viewport = Element::detached(
        "svg",
        ElementKind::Svg,
        [
            ("viewBox", attr("viewBox")),
            ("refX", attr("refX")),
            ("refY", attr("refY")),
            ("width", attr("markerWidth")),
            ("height", attr("markerHeight")),
            (
                "fill",
                marker.attribute("fill").value_or_default("black").to_owned(),
            ),
            (
                "stroke",
                marker.attribute("stroke").value_or_default("none").to_owned(),
            ),
        ],
        marker.children().to_vec(),
    );
    render(cx, &viewport, canvas);
    canvas.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assert_approx_eq, renderer::ImageState, Document, Error, Image, NodeId, Resource,
        ResourceLoader, RGBA,
    };
    use std::collections::HashMap;

    struct NoLoader;

    impl ResourceLoader for NoLoader {
        fn load(&self, _url: &str, _cross_origin: bool) -> Result<Resource, Error> {
            Ok(Resource::Pending)
        }
    }

    fn document(text: &str) -> Document {
        Document::parse(text, &NoLoader, false).expect("valid document")
    }

    fn with_context<R>(doc: &Document, f: impl FnOnce(&mut RenderContext<'_>) -> R) -> R {
        let images: HashMap<NodeId, ImageState> = HashMap::new();
        let mut cx = RenderContext::new(doc, None, &images, &NoLoader);
        cx.viewport.set_current(100.0, 100.0);
        f(&mut cx)
    }

    fn element_bbox(doc: &Document, id: &str) -> BBox {
        let elem = doc.element_by_id(id).expect("element exists");
        with_context(doc, |cx| bbox(cx, elem, &Metrics::new(100.0, 100.0, 12.0)))
    }

    fn assert_bbox(bbox: BBox, x0: Scalar, y0: Scalar, x1: Scalar, y1: Scalar) {
        assert_approx_eq!(bbox.x(), x0, 1e-9);
        assert_approx_eq!(bbox.y(), y0, 1e-9);
        assert_approx_eq!(bbox.max().x(), x1, 1e-9);
        assert_approx_eq!(bbox.max().y(), y1, 1e-9);
    }

    #[test]
    fn test_shape_bboxes() {
        let doc = document(
            r#"<svg>
                <rect id="rect" x="1" y="2" width="50%" height="4"/>
                <circle id="circle" cx="10" cy="10" r="5"/>
                <ellipse id="ellipse" cx="10" cy="10" rx="5" ry="2"/>
                <line id="line" x1="5" y1="1" x2="0" y2="7"/>
                <polyline id="poly" points="0,0 10,5 -3,2"/>
                <path id="path" d="M 3 4 L 10 -1"/>
                <g id="group"><rect width="1" height="1"/><circle cx="20" cy="20" r="1"/></g>
                <use id="use" href="path"/>
            </svg>"#,
        );
        assert_bbox(element_bbox(&doc, "rect"), 1.0, 2.0, 51.0, 6.0);
        assert_bbox(element_bbox(&doc, "circle"), 5.0, 5.0, 15.0, 15.0);
        assert_bbox(element_bbox(&doc, "ellipse"), 5.0, 8.0, 15.0, 12.0);
        assert_bbox(element_bbox(&doc, "line"), 0.0, 1.0, 5.0, 7.0);
        assert_bbox(element_bbox(&doc, "poly"), -3.0, 0.0, 10.0, 5.0);
        assert_bbox(element_bbox(&doc, "path"), 3.0, -1.0, 10.0, 4.0);
        assert_bbox(element_bbox(&doc, "group"), 0.0, 0.0, 21.0, 21.0);
        assert_bbox(element_bbox(&doc, "use"), 3.0, -1.0, 10.0, 4.0);
    }

    #[test]
    fn test_rect_radius_clamp() {
        let doc = document(r#"<svg><rect id="r" width="10" height="4" rx="8"/></svg>"#);
        let elem = doc.element_by_id("r").expect("element exists");
        let mut canvas = Canvas::new(20, 20);
        with_context(&doc, |cx| {
            let metrics = cx.metrics(&canvas);
            path(cx, elem, &metrics, Some(&mut canvas), PathMode::Draw);
        });
        // ry follows rx and both are clamped, corners collapse into half circles
        let bbox = canvas.path().bbox();
        assert_approx_eq!(bbox.x(), 0.0, 1e-6);
        assert_approx_eq!(bbox.width(), 10.0, 1e-6);
        assert_approx_eq!(bbox.height(), 4.0, 1e-6);
        assert!(!canvas.is_point_in_path(0.3, 0.3));
        assert!(canvas.is_point_in_path(5.0, 2.0));
    }

    #[test]
    fn test_markers() {
        let doc = document(
            r#"<svg>
                <line id="line" x1="0" y1="0" x2="0" y2="10"/>
                <polygon id="poly" points="0,0 10,0 10,10"/>
            </svg>"#,
        );
        let metrics = Metrics::new(100.0, 100.0, 12.0);
        let line = markers(doc.element_by_id("line").expect("line"), &metrics);
        assert_eq!(line.len(), 2);
        assert_approx_eq!(line[0].1, PI / 2.0, 1e-9);
        assert_approx_eq!(line[1].1, PI / 2.0, 1e-9);

        let poly = markers(doc.element_by_id("poly").expect("polygon"), &metrics);
        assert_eq!(poly.len(), 3);
        assert_approx_eq!(poly[0].1, 0.0, 1e-9);
        assert_approx_eq!(poly[1].1, PI / 2.0, 1e-9);
        // last marker repeats the previous angle
        assert_approx_eq!(poly[2].1, PI / 2.0, 1e-9);
    }

    #[test]
    fn test_render_path_fill_rule() {
        let doc = document(
            r##"<svg>
                <path id="p" fill="#f00" fill-rule="evenodd"
                    d="M0 0 H20 V20 H0 Z M5 5 H15 V15 H5 Z"/>
            </svg>"##,
        );
        let elem = doc.element_by_id("p").expect("path");
        let mut canvas = Canvas::new(20, 20);
        with_context(&doc, |cx| {
            crate::render::set_context(cx, elem, &mut canvas);
            render_path(cx, elem, &mut canvas);
        });
        let pixel = |x: usize, y: usize| -> RGBA {
            (*canvas.surface().get(y, x).expect("pixel")).into()
        };
        assert_eq!(pixel(2, 2), RGBA::new(255, 0, 0, 255));
        assert_eq!(pixel(10, 10).alpha(), 0);
    }

    #[test]
    fn test_marker_rendering() {
        let doc = document(
            r##"<svg>
                <defs>
                    <marker id="m" markerWidth="4" markerHeight="4" refX="2" refY="2"
                        markerUnits="userSpaceOnUse" viewBox="0 0 4 4">
                        <rect width="4" height="4" fill="#00f"/>
                    </marker>
                </defs>
                <line id="l" x1="10" y1="10" x2="30" y2="10" stroke="#000" marker-end="url(#m)"/>
            </svg>"##,
        );
        let elem = doc.element_by_id("l").expect("line");
        let mut canvas = Canvas::new(40, 20);
        with_context(&doc, |cx| {
            crate::render::render(cx, elem, &mut canvas);
        });
        let pixel: RGBA = (*canvas.surface().get(9, 30).expect("pixel")).into();
        assert_eq!(pixel, RGBA::new(0, 0, 255, 255));
        let pixel: RGBA = (*canvas.surface().get(9, 34).expect("pixel")).into();
        assert_eq!(pixel.alpha(), 0);
    }
}
