//! Text layout of `text`, `tspan`, `tref` and `a` elements
//!
//! The pen position of every text content element is computed by walking the
//! children of a `text` element in order, each container keeps its own cursor.
//! Spans are drawn either with the canvas text primitives or, when the font
//! family refers to an SVG font, glyph by glyph.
use crate::{
    document::FontInfo,
    render::{render, set_context, RenderContext},
    utils::{compress_spaces, parse_number_list},
    Axis, BBox, Canvas, Element, ElementKind, Metrics, NodeId, Point, Scalar,
};

/// Default `units-per-em` of a font without `font-face`
const DEFAULT_UNITS_PER_EM: Scalar = 1000.0;

/// Lay out and render children of a `text` element
pub(crate) fn render_text(cx: &mut RenderContext<'_>, text: &Element, canvas: &mut Canvas) {
    let Some(id) = text.id() else {
        return;
    };
    let metrics = cx.metrics(canvas);
    let x = text.attribute("x").to_pixels(&metrics, Axis::X, false)
        + offset(text, "dx", &metrics, Axis::X);
    let y = text.attribute("y").to_pixels(&metrics, Axis::Y, false)
        + offset(text, "dy", &metrics, Axis::Y);
    let x = x + anchor_delta(cx, text, text, 0, canvas);
    cx.text_positions.insert(id, Point::new(x, y));
    cx.text_cursors.insert(id, Point::new(x, y));
    for index in 0..text.children().len() {
        render_child(cx, text, text, index, canvas);
    }
}

fn offset(elem: &Element, name: &str, metrics: &Metrics, axis: Axis) -> Scalar {
    let value = elem.attribute(name);
    if value.has_value() {
        value.to_pixels(metrics, axis, false)
    } else {
        0.0
    }
}

/// Position child of the container, render it and then its own children
///
/// A child with explicit `x` (`y`) starts a new chunk, otherwise it continues
/// from the cursor of the container shifted by `dx` (`dy`).
fn render_child(
    cx: &mut RenderContext<'_>,
    text: &Element,
    container: &Element,
    index: usize,
    canvas: &mut Canvas,
) {
    let child = cx.element(container.children()[index]);
    let (Some(container_id), Some(child_id)) = (container.id(), child.id()) else {
        return;
    };
    let metrics = cx.metrics(canvas);
    let cursor = cx
        .text_cursors
        .get(&container_id)
        .copied()
        .unwrap_or_default();

    let x = if child.attribute("x").has_value() {
        child.attribute("x").to_pixels(&metrics, Axis::X, false)
            + anchor_delta(cx, text, container, index, canvas)
            + offset(child, "dx", &metrics, Axis::X)
    } else {
        cursor.x() + offset(child, "dx", &metrics, Axis::X)
    };
    let y = if child.attribute("y").has_value() {
        child.attribute("y").to_pixels(&metrics, Axis::Y, false)
            + offset(child, "dy", &metrics, Axis::Y)
    } else {
        cursor.y() + offset(child, "dy", &metrics, Axis::Y)
    };
    // nested spans advance the cursor by the width of their whole content
    let advance = measure_text_recursive(cx, child, canvas);
    cx.text_cursors
        .insert(container_id, Point::new(x + advance, y));
    cx.text_positions.insert(child_id, Point::new(x, y));
    cx.text_cursors.insert(child_id, Point::new(x, y));

    render(cx, child, canvas);
    for index in 0..child.children().len() {
        render_child(cx, text, child, index, canvas);
    }
}

/// Horizontal shift of the chunk starting at `start` required by `text-anchor`
fn anchor_delta(
    cx: &mut RenderContext<'_>,
    text: &Element,
    container: &Element,
    start: usize,
    canvas: &mut Canvas,
) -> Scalar {
    let anchor = cx.style(text, "text-anchor").value_or_default("start");
    if anchor == "start" {
        return 0.0;
    }
    let mut width = 0.0;
    for (index, child) in container.children().iter().enumerate().skip(start) {
        let child = cx.element(*child);
        if index > start && child.attribute("x").has_value() {
            break;
        }
        width += measure_text_recursive(cx, child, canvas);
    }
    if anchor == "end" {
        -width
    } else {
        -width / 2.0
    }
}

/// Text content of a single text content element
///
/// A `tspan` with children does not own any text, its children do.
fn get_text(cx: &RenderContext<'_>, elem: &Element) -> String {
    match elem.kind() {
        ElementKind::TSpan { text } if elem.children().is_empty() => text.clone(),
        ElementKind::TRef => cx
            .definition(elem.href())
            .and_then(|target| target.children().first())
            .map(|child| get_text(cx, cx.element(*child)))
            .unwrap_or_default(),
        ElementKind::A { text } => text.clone().unwrap_or_default(),
        _ => String::new(),
    }
}

fn measure_text_recursive(cx: &mut RenderContext<'_>, elem: &Element, canvas: &mut Canvas) -> Scalar {
    let mut width = measure_text(cx, elem, canvas);
    for child in elem.children() {
        let child = cx.element(*child);
        width += measure_text_recursive(cx, child, canvas);
    }
    width
}

/// Advance of the element own text
fn measure_text(cx: &mut RenderContext<'_>, elem: &Element, canvas: &mut Canvas) -> Scalar {
    if !matches!(
        elem.kind(),
        ElementKind::TSpan { .. } | ElementKind::TRef | ElementKind::A { .. }
    ) {
        return 0.0;
    }
    let text = get_text(cx, elem);
    if let Some(font) = custom_font(cx, elem) {
        let size = font_size(cx, elem, canvas);
        let chars = font.chars(&text);
        let dx = font.dx(cx, elem);
        return (0..chars.len())
            .map(|index| {
                let glyph = font.glyph(&chars, index);
                let advance = font.advance(cx, glyph) * size / font.units_per_em;
                advance + dx.get(index).copied().filter(|d| d.is_finite()).unwrap_or(0.0)
            })
            .sum();
    }

    let text = compress_spaces(&text);
    canvas.save();
    set_context(cx, elem, canvas);
    let width = canvas.measure_text(&text);
    canvas.restore();
    width
}

/// Font size used by glyph layout, taken from the parent of the span
fn font_size(cx: &RenderContext<'_>, elem: &Element, canvas: &Canvas) -> Scalar {
    let default = canvas.font().size_px();
    match elem.parent() {
        Some(parent) => cx
            .style(cx.element(parent), "font-size")
            .num_value_or_default(default),
        None => default,
    }
}

/// SVG font referenced by `font-family` of the span parent
struct CustomFont<'a> {
    info: &'a FontInfo,
    units_per_em: Scalar,
}

fn custom_font<'a>(cx: &RenderContext<'a>, elem: &Element) -> Option<CustomFont<'a>> {
    let parent = cx.element(elem.parent()?);
    let ElementKind::Font(info) = cx.definition(cx.style(parent, "font-family"))?.kind() else {
        return None;
    };
    let units_per_em = info
        .font_face
        .and_then(|id| match cx.element(id).kind() {
            ElementKind::FontFace { units_per_em } if *units_per_em > 0.0 => Some(*units_per_em),
            _ => None,
        })
        .unwrap_or(DEFAULT_UNITS_PER_EM);
    Some(CustomFont { info, units_per_em })
}

impl CustomFont<'_> {
    /// Characters in visual order
    fn chars(&self, text: &str) -> Vec<char> {
        let mut chars: Vec<char> = text.chars().collect();
        if self.info.is_arabic {
            chars.reverse();
        }
        chars
    }

    /// Per character offsets from `dx` of the span parent
    fn dx(&self, cx: &RenderContext<'_>, elem: &Element) -> Vec<Scalar> {
        elem.parent()
            .map(|parent| parse_number_list(cx.element(parent).attribute("dx").value()))
            .unwrap_or_default()
    }

    /// Glyph for the character at `index`
    ///
    /// Arabic fonts select the contextual form from the neighbouring characters
    /// and fall back to the plain glyph.
    fn glyph(&self, chars: &[char], index: usize) -> Option<NodeId> {
        let forms = self.info.glyphs.get(chars[index].to_string().as_str());
        let glyph = if self.info.is_arabic {
            let len = chars.len();
            let joined_before = index > 0 && chars[index - 1] != ' ';
            let joined_after = index + 2 < len && chars[index + 1] != ' ';
            let form = if joined_before && (index + 1 == len || chars[index + 1] == ' ') {
                "initial"
            } else if joined_before && joined_after {
                "medial"
            } else if !joined_before && joined_after {
                "terminal"
            } else {
                "isolated"
            };
            forms.and_then(|forms| forms.forms.get(form).copied().or(forms.glyph))
        } else {
            forms.and_then(|forms| forms.glyph)
        };
        glyph.or(self.info.missing_glyph)
    }

    /// Horizontal advance in font units
    fn advance(&self, cx: &RenderContext<'_>, glyph: Option<NodeId>) -> Scalar {
        let advance = glyph.and_then(|id| match cx.element(id).kind() {
            ElementKind::Glyph(info) | ElementKind::MissingGlyph(info) => Some(info.horiz_adv_x),
            _ => None,
        });
        match advance {
            Some(advance) if advance.is_finite() && advance != 0.0 => advance,
            _ => self.info.horiz_adv_x,
        }
    }
}

/// Draw text of a `tspan` or `tref` at its laid out position
pub(crate) fn render_span(cx: &mut RenderContext<'_>, elem: &Element, canvas: &mut Canvas) {
    let Some(position) = elem.id().and_then(|id| cx.text_positions.get(&id).copied()) else {
        return;
    };
    let text = get_text(cx, elem);
    if let Some(font) = custom_font(cx, elem) {
        render_glyphs(cx, elem, &font, &text, position, canvas);
        return;
    }
    let text = compress_spaces(&text);
    if !canvas.fill_paint().is_transparent() {
        canvas.fill_text(&text, position.x(), position.y());
    }
    if !canvas.stroke_paint().is_transparent() {
        canvas.stroke_text(&text, position.x(), position.y());
    }
}

fn render_glyphs(
    cx: &mut RenderContext<'_>,
    elem: &Element,
    font: &CustomFont<'_>,
    text: &str,
    position: Point,
    canvas: &mut Canvas,
) {
    let size = font_size(cx, elem, canvas);
    let italic = match elem.parent() {
        Some(parent) => {
            let style = cx.style(cx.element(parent), "font-style");
            if style.has_value() {
                style.value() == "italic"
            } else {
                canvas.font().style == "italic"
            }
        }
        None => canvas.font().style == "italic",
    };
    let scale = size / font.units_per_em;
    let chars = font.chars(text);
    let dx = font.dx(cx, elem);
    let mut x = position.x();
    for index in 0..chars.len() {
        let glyph = font.glyph(&chars, index);
        if let Some(glyph) = glyph {
            canvas.save();
            canvas.translate(x, position.y());
            canvas.scale(scale, -scale);
            canvas.set_line_width(canvas.line_width() / scale);
            if italic {
                canvas.transform(1.0, 0.0, 0.4, 1.0, 0.0, 0.0);
            }
            let glyph = cx.element(glyph);
            render(cx, glyph, canvas);
            canvas.restore();
        }
        x += font.advance(cx, glyph) * scale;
        if let Some(dx) = dx.get(index).filter(|dx| dx.is_finite()) {
            x += dx;
        }
    }
}

/// Render an `a` element
///
/// A link with only text content is laid out as a span and registers its box
/// for hit testing, otherwise its children are rendered as a group.
pub(crate) fn render_link(cx: &mut RenderContext<'_>, elem: &Element, canvas: &mut Canvas) {
    if let ElementKind::A { text: Some(_) } = elem.kind() {
        render_span(cx, elem, canvas);
        let position = elem
            .id()
            .and_then(|id| Some((id, cx.text_positions.get(&id).copied()?)));
        if let Some((id, position)) = position {
            let size = canvas.font().size_px();
            let width = measure_text(cx, elem, canvas);
            let transform = canvas.current_transform();
            let bbox = BBox::new(
                transform.apply(Point::new(position.x(), position.y() - size)),
                transform.apply(Point::new(position.x() + width, position.y())),
            );
            if let Some(mouse) = cx.mouse.as_deref_mut() {
                mouse.check_bbox(id, bbox);
            }
        }
    } else {
        for child in elem.children() {
            let child = cx.element(*child);
            render(cx, child, canvas);
        }
    }
}

/// Approximate bounding box of a `text` element
pub(crate) fn bbox(cx: &RenderContext<'_>, text: &Element, metrics: &Metrics) -> BBox {
    let x = text.attribute("x").to_pixels(metrics, Axis::X, false);
    let y = text.attribute("y").to_pixels(metrics, Axis::Y, false);
    let size = match text.parent() {
        Some(parent) => cx
            .style(cx.element(parent), "font-size")
            .num_value_or_default(metrics.em),
        None => metrics.em,
    };
    let len = text
        .children()
        .first()
        .map_or(0, |child| get_text(cx, cx.element(*child)).chars().count());
    BBox::new(
        (x, y - size),
        (x + (size * 2.0 / 3.0).floor() * len as Scalar, y),
    )
}
