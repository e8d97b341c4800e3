//! Painter state derived from the inherited style of an element
//!
//! Fill and stroke either reference a paint server (`linearGradient`,
//! `radialGradient`, `pattern`) or carry a plain color. Everything else that
//! the canvas keeps in its state (line geometry, dashes, font, transform, clip
//! and opacity) is applied here as well.
use crate::{
    effects,
    grad::{GradLinear, GradRadial, GradStop},
    render::{render, RenderContext},
    shape,
    transform::TransformList,
    utils::{format_scalar, parse_number_list},
    Axis, Canvas, Element, ElementKind, Font, LineCap, LineJoin, Metrics, Paint, Pattern,
    Property, Scalar, Transform, RGBA,
};
use std::rc::Rc;

/// Apply inherited style of the element to the canvas state
pub(crate) fn apply_style(cx: &mut RenderContext<'_>, elem: &Element, canvas: &mut Canvas) {
    apply_paint(cx, elem, canvas, PaintTarget::Fill);
    apply_paint(cx, elem, canvas, PaintTarget::Stroke);

    let metrics = cx.metrics(canvas);
    let stroke_width = cx.style(elem, "stroke-width");
    if stroke_width.has_value() {
        let width = stroke_width.to_pixels(&metrics, Axis::Diagonal, false);
        // zero width strokes are still drawn as hairlines
        canvas.set_line_width(if width == 0.0 { 0.001 } else { width });
    }
    match cx.style(elem, "stroke-linecap").value() {
        "butt" => canvas.set_line_cap(LineCap::Butt),
        "round" => canvas.set_line_cap(LineCap::Round),
        "square" => canvas.set_line_cap(LineCap::Square),
        _ => {}
    }
    match cx.style(elem, "stroke-linejoin").value() {
        "miter" => canvas.set_line_join(LineJoin::Miter),
        "round" => canvas.set_line_join(LineJoin::Round),
        "bevel" => canvas.set_line_join(LineJoin::Bevel),
        _ => {}
    }
    let miter_limit = cx.style(elem, "stroke-miterlimit");
    if miter_limit.has_value() {
        canvas.set_miter_limit(miter_limit.num_value());
    }
    let dash = cx.style(elem, "stroke-dasharray");
    if dash.has_value() && dash.value() != "none" {
        canvas.set_line_dash(parse_number_list(dash.value()));
        canvas.set_line_dash_offset(cx.style(elem, "stroke-dashoffset").num_value_or_default(1.0));
    }

    let font = font(cx, elem, canvas.font(), &metrics);
    canvas.set_font(font);

    let transform = cx.own_style(elem, "transform");
    if transform.has_value() {
        TransformList::parse(transform.value()).apply(canvas);
    }
    let clip_path = cx.own_style(elem, "clip-path");
    if clip_path.has_value() {
        match cx.definition(clip_path) {
            Some(clip) if matches!(clip.kind(), ElementKind::ClipPath) => {
                effects::apply_clip(cx, clip, canvas)
            }
            _ => diagnostic!(cx.log(), clip = clip_path.value(), "unresolved clip-path"),
        }
    }

    let opacity = cx.style(elem, "opacity");
    if opacity.has_value() {
        canvas.set_global_alpha(opacity.num_value());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaintTarget {
    Fill,
    Stroke,
}

impl PaintTarget {
    fn name(self) -> &'static str {
        match self {
            PaintTarget::Fill => "fill",
            PaintTarget::Stroke => "stroke",
        }
    }

    fn opacity_name(self) -> &'static str {
        match self {
            PaintTarget::Fill => "fill-opacity",
            PaintTarget::Stroke => "stroke-opacity",
        }
    }

    fn get(self, canvas: &Canvas) -> &Paint {
        match self {
            PaintTarget::Fill => canvas.fill_paint(),
            PaintTarget::Stroke => canvas.stroke_paint(),
        }
    }

    fn set(self, canvas: &mut Canvas, paint: Paint) {
        match self {
            PaintTarget::Fill => canvas.set_fill_paint(paint),
            PaintTarget::Stroke => canvas.set_stroke_paint(paint),
        }
    }
}

/// Resolve `fill` or `stroke` together with its opacity
///
/// Values the canvas would not accept (unknown colors, unresolved references)
/// leave the inherited paint in place.
fn apply_paint(
    cx: &mut RenderContext<'_>,
    elem: &Element,
    canvas: &mut Canvas,
    target: PaintTarget,
) {
    let value = cx.style(elem, target.name());
    let opacity = cx.style(elem, target.opacity_name());
    if value.is_url_definition() {
        if let Some(paint) = paint_server(cx, elem, value, opacity, canvas) {
            target.set(canvas, paint);
        }
    } else if value.has_value() {
        let color = match value.value() {
            "currentColor" => cx.style(elem, "color").value(),
            color => color,
        };
        match color {
            "inherit" => {}
            "none" => target.set(canvas, Paint::transparent()),
            color => match color.trim().parse::<RGBA>() {
                Ok(color) => target.set(canvas, Paint::Solid(color)),
                Err(_) => diagnostic!(cx.log(), color, "invalid paint color"),
            },
        }
    }
    if opacity.has_value() {
        let paint = target.get(canvas).clone().with_opacity(opacity.num_value());
        target.set(canvas, paint);
    }
}

/// Paint of the gradient or pattern referenced by the property
pub(crate) fn paint_server(
    cx: &mut RenderContext<'_>,
    elem: &Element,
    prop: &Property,
    opacity: &Property,
    canvas: &Canvas,
) -> Option<Paint> {
    let def = cx.definition(prop)?;
    match def.kind() {
        ElementKind::LinearGradient { .. } | ElementKind::RadialGradient { .. } => {
            gradient(cx, def, elem, opacity, canvas)
        }
        ElementKind::Pattern => {
            // a referenced pattern provides the content, the referencing one its transform
            let transform = def.attribute("patternTransform").value().to_owned();
            let pattern = match cx.definition(def.href()) {
                Some(target) if def.href().has_value() => target,
                _ => def,
            };
            let transform = if transform.is_empty() {
                pattern.attribute("patternTransform").value().to_owned()
            } else {
                transform
            };
            Some(pattern_paint(cx, pattern, transform, canvas))
        }
        _ => None,
    }
}

/// Build linear or radial gradient paint for the element
///
/// Geometry attributes and stops missing on the gradient are inherited from the
/// gradient it references with `href`.
fn gradient(
    cx: &RenderContext<'_>,
    grad: &Element,
    elem: &Element,
    opacity: &Property,
    canvas: &Canvas,
) -> Option<Paint> {
    let container = match cx.definition(grad.href()) {
        Some(container) if grad.href().has_value() => container,
        _ => grad,
    };
    let attr = |name: &str| inherited_attribute(grad, container, name);
    let stop_ids = match container.kind() {
        ElementKind::LinearGradient { stops } | ElementKind::RadialGradient { stops } => stops,
        _ => return None,
    };
    let with_opacity = |color: RGBA| -> RGBA {
        if opacity.has_value() {
            Paint::Solid(color)
                .with_opacity(opacity.num_value())
                .solid()
                .unwrap_or(color)
        } else {
            color
        }
    };
    let stops: Vec<GradStop> = stop_ids
        .iter()
        .filter_map(|id| match cx.element(*id).kind() {
            ElementKind::Stop {
                offset,
                color: Some(color),
            } => Some(GradStop::new(*offset, with_opacity(*color))),
            _ => None,
        })
        .collect();
    let last = stops.last()?.color;

    let metrics = cx.metrics(canvas);
    let bounding_box = attr("gradientUnits").value_or_default("objectBoundingBox")
        == "objectBoundingBox";
    let bbox = shape::bbox(cx, elem, &metrics);
    let coord = |value: &Property, axis: Axis| -> Scalar {
        if bounding_box {
            match axis {
                Axis::X => bbox.x() + bbox.width() * value.num_value(),
                Axis::Y => bbox.y() + bbox.height() * value.num_value(),
                Axis::Diagonal => (bbox.width() + bbox.height()) / 2.0 * value.num_value(),
            }
        } else {
            value.to_pixels(&metrics, axis, false)
        }
    };
    let transform = attr("gradientTransform");
    let transform = if transform.has_value() {
        TransformList::parse(transform.value()).matrix()
    } else {
        Transform::identity()
    };

    let paint = match grad.kind() {
        ElementKind::LinearGradient { .. } => {
            let names = ["x1", "y1", "x2", "y2"];
            let [x1, y1, x2, y2] = if names.iter().all(|name| !attr(name).has_value()) {
                [0.0, 0.0, 1.0, 0.0].map(|value| Property::new("", format_scalar(value)))
            } else {
                names.map(|name| attr(name).clone())
            };
            let start = (coord(&x1, Axis::X), coord(&y1, Axis::Y));
            let end = (coord(&x2, Axis::X), coord(&y2, Axis::Y));
            if start == end {
                return Some(Paint::Solid(last));
            }
            Paint::Linear(GradLinear::new(stops, transform, start, end))
        }
        _ => {
            let or_half = |name: &str| Property::new(name, attr(name).value_or_default("50%"));
            let center = (coord(&or_half("cx"), Axis::X), coord(&or_half("cy"), Axis::Y));
            let focus_x = attr("fx");
            let focus_y = attr("fy");
            let focus = (
                if focus_x.has_value() {
                    coord(focus_x, Axis::X)
                } else {
                    center.0
                },
                if focus_y.has_value() {
                    coord(focus_y, Axis::Y)
                } else {
                    center.1
                },
            );
            let radius = coord(&or_half("r"), Axis::Diagonal);
            Paint::Radial(GradRadial::new(stops, transform, focus, 0.0, center, radius))
        }
    };
    Some(paint)
}

fn inherited_attribute<'a>(grad: &'a Element, container: &'a Element, name: &str) -> &'a Property {
    let own = grad.attribute(name);
    if own.has_value() {
        own
    } else {
        container.attribute(name)
    }
}

/// Render pattern tile offscreen and wrap it into a repeating paint
///
/// The tile is rendered as a 3x3 grid of shifted copies so transformed content
/// that crosses the tile edges still covers the tile.
fn pattern_paint(
    cx: &mut RenderContext<'_>,
    pattern: &Element,
    transform: String,
    canvas: &Canvas,
) -> Paint {
    let metrics = cx.metrics(canvas);
    let width = pattern.attribute("width").to_pixels(&metrics, Axis::X, true);
    let height = pattern.attribute("height").to_pixels(&metrics, Axis::Y, true);
    let mut viewport = Element::detached(
        "svg",
        ElementKind::Svg,
        [
            ("viewBox", pattern.attribute("viewBox").value().to_owned()),
            ("width", format!("{}px", format_scalar(width))),
            ("height", format!("{}px", format_scalar(height))),
            ("transform", transform),
        ],
        pattern.children().to_vec(),
    );

    let mut tile = Canvas::new(
        crate::canvas::canvas_size(width),
        crate::canvas::canvas_size(height),
    );
    let (x, y) = (pattern.attribute("x"), pattern.attribute("y"));
    if x.has_value() && y.has_value() {
        tile.translate(
            x.to_pixels(&metrics, Axis::X, true),
            y.to_pixels(&metrics, Axis::Y, true),
        );
    }
    let (tile_width, tile_height) = (tile.width() as Scalar, tile.height() as Scalar);
    for dx in -1..=1 {
        for dy in -1..=1 {
            tile.save();
            viewport.set_attribute("x", format_scalar(dx as Scalar * tile_width));
            viewport.set_attribute("y", format_scalar(dy as Scalar * tile_height));
            render(cx, &viewport, &mut tile);
            tile.restore();
        }
    }
    Paint::Pattern(Pattern::new(
        Rc::new(tile.take_surface()),
        true,
        Transform::identity(),
    ))
}

/// Font of the element, unset components are inherited from the canvas font
///
/// Individual `font-*` properties take precedence over the `font` shorthand.
fn font(cx: &RenderContext<'_>, elem: &Element, inherit: &Font, metrics: &Metrics) -> Font {
    let shorthand = cx.style(elem, "font");
    let parts = if shorthand.has_value() {
        Font::parse(shorthand.value())
    } else {
        Default::default()
    };
    let component = |name: &str, fallback: &Option<String>| -> String {
        let prop = cx.style(elem, name);
        if prop.has_value() {
            prop.value().to_owned()
        } else {
            fallback.clone().unwrap_or_default()
        }
    };
    let font_size = cx.style(elem, "font-size");
    let size = if font_size.has_value() {
        let size = font_size.to_pixels(metrics, Axis::Diagonal, false);
        format!("{}px", format_scalar(size))
    } else {
        parts.size.clone().unwrap_or_default()
    };
    Font::create(
        &component("font-style", &parts.style),
        &component("font-variant", &parts.variant),
        &component("font-weight", &parts.weight),
        &size,
        &component("font-family", &parts.family),
        inherit,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assert_approx_eq, renderer::ImageState, Document, Error, Image, NodeId, Resource,
        ResourceLoader,
    };
    use std::collections::HashMap;

    struct NoLoader;

    impl ResourceLoader for NoLoader {
        fn load(&self, _url: &str, _cross_origin: bool) -> Result<Resource, Error> {
            Ok(Resource::Pending)
        }
    }

    /// Apply style of the element and return the resulting canvas
    fn styled(text: &str, id: &str) -> Canvas {
        let doc = Document::parse(text, &NoLoader, false).expect("valid document");
        let images: HashMap<NodeId, ImageState> = HashMap::new();
        let mut cx = RenderContext::new(&doc, None, &images, &NoLoader);
        cx.viewport.set_current(100.0, 100.0);
        let mut canvas = Canvas::new(100, 100);
        let elem = doc.element_by_id(id).expect("element exists");
        apply_style(&mut cx, elem, &mut canvas);
        canvas
    }

    #[test]
    fn test_colors() {
        let canvas = styled(
            r##"<svg color="#00ff00"><rect id="r" fill="currentColor" stroke="none"/></svg>"##,
            "r",
        );
        assert_eq!(canvas.fill_paint().solid(), Some(RGBA::new(0, 255, 0, 255)));
        assert!(canvas.stroke_paint().is_transparent());

        let canvas = styled(
            r#"<svg><rect id="r" fill="red" fill-opacity="0.5" stroke="blue"/></svg>"#,
            "r",
        );
        assert_eq!(canvas.fill_paint().solid(), Some(RGBA::new(255, 0, 0, 128)));
        assert_eq!(canvas.stroke_paint().solid(), Some(RGBA::new(0, 0, 255, 255)));

        // invalid colors and inherit keep the current paint
        let canvas = styled(r#"<svg><rect id="r" fill="bogus" stroke="inherit"/></svg>"#, "r");
        assert_eq!(canvas.fill_paint().solid(), Some(RGBA::new(0, 0, 0, 255)));
        assert!(canvas.stroke_paint().is_transparent());
    }

    #[test]
    fn test_stroke_state() {
        let canvas = styled(
            r#"<svg stroke-width="0"><g id="g" stroke-dasharray="4 2" stroke-linecap="round" opacity="0.5"/></svg>"#,
            "g",
        );
        assert_approx_eq!(canvas.line_width(), 0.001);
        assert_eq!(canvas.line_dash(), &[4.0, 2.0]);
        assert_approx_eq!(canvas.global_alpha(), 0.5);
    }

    #[test]
    fn test_font() {
        let canvas = styled(
            r#"<svg font="italic bold 20px serif"><text id="t" font-size="24px" font-family="mono"/></svg>"#,
            "t",
        );
        let font = canvas.font();
        assert_eq!(font.style, "italic");
        assert_eq!(font.weight, "bold");
        assert_eq!(font.family, "mono");
        assert_approx_eq!(font.size_px(), 24.0);
    }

    #[test]
    fn test_linear_gradient() {
        let doc = r##"<svg>
            <linearGradient id="base">
                <stop offset="0" stop-color="#000"/>
                <stop offset="1" stop-color="#fff"/>
            </linearGradient>
            <linearGradient id="g" href="#base" x1="0" x2="0" y2="1"/>
            <linearGradient id="flat" href="#base" x1="0.5" x2="0.5"/>
            <rect id="r" x="10" y="10" width="20" height="40" fill="url(#g)"/>
            <rect id="f" width="10" height="10" fill="url(#flat)"/>
        </svg>"##;
        let canvas = styled(doc, "r");
        match canvas.fill_paint() {
            Paint::Linear(grad) => {
                let top: RGBA = grad.at((20.0, 10.0).into()).into();
                let bottom: RGBA = grad.at((20.0, 50.0).into()).into();
                assert_eq!(top, RGBA::new(0, 0, 0, 255));
                assert_eq!(bottom, RGBA::new(255, 255, 255, 255));
            }
            paint => panic!("unexpected paint: {:?}", paint),
        }
        // degenerate vector falls back to the last stop color
        let canvas = styled(doc, "f");
        assert_eq!(canvas.fill_paint().solid(), Some(RGBA::new(255, 255, 255, 255)));
    }

    #[test]
    fn test_radial_gradient_opacity() {
        let canvas = styled(
            r##"<svg>
                <radialGradient id="g" gradientUnits="userSpaceOnUse" cx="50" cy="50" r="10">
                    <stop offset="0" stop-color="#f00"/>
                    <stop offset="1" stop-color="#00f"/>
                </radialGradient>
                <rect id="r" width="100" height="100" fill="url(#g)" fill-opacity="0.5"/>
            </svg>"##,
            "r",
        );
        match canvas.fill_paint() {
            Paint::Radial(grad) => {
                let center: RGBA = grad.at((50.0, 50.0).into()).into();
                assert_eq!(center.red(), 255);
                assert_eq!(center.alpha(), 128);
                let edge: RGBA = grad.at((60.0, 50.0).into()).into();
                assert_eq!(edge.blue(), 255);
            }
            paint => panic!("unexpected paint: {:?}", paint),
        }
    }

    #[test]
    fn test_pattern() {
        let canvas = styled(
            r##"<svg>
                <pattern id="p" width="4" height="4" patternUnits="userSpaceOnUse">
                    <rect width="2" height="2" fill="#f00"/>
                </pattern>
                <pattern id="q" href="#p"/>
                <rect id="r" width="10" height="10" fill="url(#q)"/>
            </svg>"##,
            "r",
        );
        match canvas.fill_paint() {
            Paint::Pattern(pattern) => {
                assert_eq!(pattern.image().width(), 4);
                let inside: RGBA = pattern.at((5.0, 1.0).into()).into();
                assert_eq!(inside, RGBA::new(255, 0, 0, 255));
                let outside: RGBA = pattern.at((3.0, 3.0).into()).into();
                assert_eq!(outside.alpha(), 0);
            }
            paint => panic!("unexpected paint: {:?}", paint),
        }
    }
}
