//! Rendering of the element graph onto a canvas
//!
//! A frame walks the element graph depth first. Every visible element saves the
//! canvas state, applies its inherited style, renders its own content and then
//! restores the state. Masks and filters first redirect the element into an
//! offscreen canvas and composite the result back.
use crate::{
    document::LookupScope,
    effects,
    events::Mouse,
    paint,
    renderer::{self, ImageState},
    shape, text,
    utils::parse_number_list,
    viewport::{AspectRatio, ViewPort},
    Axis, Canvas, Document, Element, ElementKind, Image, LineCap, LineJoin, Metrics, NodeId,
    Paint, Point, Property, ResourceLoader, Scalar,
};
use std::collections::HashMap;

/// State of a single frame threaded through every render call
pub(crate) struct RenderContext<'a> {
    pub doc: &'a Document,
    pub viewport: ViewPort,
    pub scope: LookupScope,
    /// Hit-test recorder, `None` when pointer input is ignored
    pub mouse: Option<&'a mut Mouse>,
    pub images: &'a HashMap<NodeId, ImageState>,
    pub loader: &'a dyn ResourceLoader,
    /// Pen position of text content elements
    pub text_positions: HashMap<NodeId, Point>,
    /// Layout cursor of text containers, advanced past every laid out child
    pub text_cursors: HashMap<NodeId, Point>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        doc: &'a Document,
        mouse: Option<&'a mut Mouse>,
        images: &'a HashMap<NodeId, ImageState>,
        loader: &'a dyn ResourceLoader,
    ) -> Self {
        Self {
            doc,
            viewport: ViewPort::new(),
            scope: LookupScope::default(),
            mouse,
            images,
            loader,
            text_positions: HashMap::new(),
            text_cursors: HashMap::new(),
        }
    }

    pub fn log(&self) -> bool {
        self.doc.log()
    }

    pub fn element(&self, id: NodeId) -> &'a Element {
        self.doc.element(id)
    }

    /// Style of the element looked up through its ancestors
    pub fn style<'b>(&self, elem: &'b Element, name: &str) -> &'b Property
    where
        'a: 'b,
    {
        let doc: &'b Document = self.doc;
        doc.lookup_style(elem, name, false, &self.scope)
    }

    /// Style set on the element itself, ancestors are not consulted
    pub fn own_style<'b>(&self, elem: &'b Element, name: &str) -> &'b Property
    where
        'a: 'b,
    {
        let doc: &'b Document = self.doc;
        doc.lookup_style(elem, name, true, &self.scope)
    }

    /// Element referenced by the property value
    pub fn definition(&self, prop: &Property) -> Option<&'a Element> {
        prop.definition(self.doc).map(|id| self.doc.element(id))
    }

    /// Metrics of the current viewport and the font of the canvas
    pub fn metrics(&self, canvas: &Canvas) -> Metrics {
        Metrics::new(
            self.viewport.width(),
            self.viewport.height(),
            canvas.font().size_px(),
        )
    }

    pub fn is_root(&self, elem: &Element) -> bool {
        elem.id() == Some(self.doc.root())
    }
}

/// Elements that draw something when they are reached by the tree walk
fn is_rendered(kind: &ElementKind) -> bool {
    use ElementKind::*;
    matches!(
        kind,
        Svg | G | Text | TSpan { .. } | TRef | A { .. } | Image { .. }
    ) || kind.is_path()
}

/// Render element together with its content
pub(crate) fn render(cx: &mut RenderContext<'_>, elem: &Element, canvas: &mut Canvas) {
    if !is_rendered(elem.kind()) {
        return;
    }
    if cx.style(elem, "display").value() == "none"
        || cx.style(elem, "visibility").value() == "hidden"
    {
        return;
    }

    canvas.save();
    let mask = cx.style(elem, "mask");
    let filter = cx.style(elem, "filter");
    if mask.has_value() {
        match cx.definition(mask) {
            Some(def) if matches!(def.kind(), ElementKind::Mask) => {
                effects::apply_mask(cx, def, elem, canvas)
            }
            _ => diagnostic!(cx.log(), mask = mask.value(), "unresolved mask"),
        }
    } else if filter.has_value() {
        match cx.definition(filter) {
            Some(def) if matches!(def.kind(), ElementKind::Filter) => {
                effects::apply_filter(cx, def, elem, canvas)
            }
            _ => diagnostic!(cx.log(), filter = filter.value(), "unresolved filter"),
        }
    } else {
        set_context(cx, elem, canvas);
        render_children(cx, elem, canvas);
        clear_context(cx, elem, canvas);
    }
    canvas.restore();
}

/// Apply element style to the canvas before its content is rendered
pub(crate) fn set_context(cx: &mut RenderContext<'_>, elem: &Element, canvas: &mut Canvas) {
    match elem.kind() {
        ElementKind::Svg => set_viewport(cx, elem, canvas),
        ElementKind::Text => {
            paint::apply_style(cx, elem, canvas);
            let baseline = cx
                .style(elem, "dominant-baseline")
                .to_text_baseline()
                .or_else(|| cx.style(elem, "alignment-baseline").to_text_baseline());
            if let Some(baseline) = baseline {
                canvas.set_text_baseline(baseline);
            }
        }
        ElementKind::Use => {
            paint::apply_style(cx, elem, canvas);
            let metrics = cx.metrics(canvas);
            let x = elem.attribute("x");
            if x.has_value() {
                canvas.translate(x.to_pixels(&metrics, Axis::X, false), 0.0);
            }
            let y = elem.attribute("y");
            if y.has_value() {
                canvas.translate(0.0, y.to_pixels(&metrics, Axis::Y, false));
            }
        }
        _ => paint::apply_style(cx, elem, canvas),
    }
}

pub(crate) fn clear_context(cx: &mut RenderContext<'_>, elem: &Element, _canvas: &mut Canvas) {
    if let ElementKind::Svg = elem.kind() {
        cx.viewport.remove_current();
    }
}

/// Render own content of the element
pub(crate) fn render_children(cx: &mut RenderContext<'_>, elem: &Element, canvas: &mut Canvas) {
    match elem.kind() {
        ElementKind::Use => render_use(cx, elem, canvas),
        ElementKind::Text => text::render_text(cx, elem, canvas),
        ElementKind::TSpan { .. } | ElementKind::TRef => text::render_span(cx, elem, canvas),
        ElementKind::A { .. } => text::render_link(cx, elem, canvas),
        ElementKind::Image { .. } => render_image(cx, elem, canvas),
        kind if kind.is_path() => shape::render_path(cx, elem, canvas),
        _ => {
            for &child in elem.children() {
                let child = cx.element(child);
                render(cx, child, canvas);
            }
        }
    }
}

/// Establish a new viewport for an `svg` element
///
/// The root element keeps the size of the canvas, nested elements resolve their own
/// size and clip to it unless `overflow` is `visible`.
fn set_viewport(cx: &mut RenderContext<'_>, elem: &Element, canvas: &mut Canvas) {
    canvas.set_stroke_paint(Paint::transparent());
    canvas.set_line_cap(LineCap::Butt);
    canvas.set_line_join(LineJoin::Miter);
    canvas.set_miter_limit(4.0);
    paint::apply_style(cx, elem, canvas);

    let metrics = cx.metrics(canvas);
    canvas.translate(
        elem.attribute("x").to_pixels(&metrics, Axis::X, false),
        elem.attribute("y").to_pixels(&metrics, Axis::Y, false),
    );

    let ref_x = elem.attribute("refX");
    let ref_y = elem.attribute("refY");
    let has_reference = ref_x.has_value() && ref_y.has_value();
    let (mut width, mut height) = cx.viewport.current();
    if !cx.is_root(elem) {
        let size = |name: &str, axis| {
            Property::new(name, elem.attribute(name).value_or_default("100%"))
                .to_pixels(&metrics, axis, false)
        };
        width = size("width", Axis::X);
        height = size("height", Axis::Y);
        let (x, y) = if has_reference {
            (
                -ref_x.to_pixels(&metrics, Axis::X, false),
                -ref_y.to_pixels(&metrics, Axis::Y, false),
            )
        } else {
            (0.0, 0.0)
        };
        if elem.attribute("overflow").value_or_default("hidden") != "visible" {
            canvas.begin_path();
            canvas.move_to(x, y);
            canvas.line_to(width, y);
            canvas.line_to(width, height);
            canvas.line_to(x, height);
            canvas.close_path();
            canvas.clip();
        }
    }
    cx.viewport.set_current(width, height);

    let view_box = elem.attribute("viewBox");
    if view_box.has_value() {
        let values = parse_number_list(view_box.value());
        let value = |index: usize| values.get(index).copied().unwrap_or(Scalar::NAN);
        let metrics = cx.metrics(canvas);
        let reference = has_reference.then(|| {
            (
                ref_x.to_pixels(&metrics, Axis::X, false),
                ref_y.to_pixels(&metrics, Axis::Y, false),
            )
        });
        AspectRatio {
            value: elem.attribute("preserveAspectRatio").value(),
            size: cx.viewport.current(),
            desired: (value(2), value(3)),
            min: (value(0), value(1)),
            reference,
        }
        .apply(canvas);
        cx.viewport.remove_current();
        cx.viewport.set_current(value(2), value(3));
    }
}

/// Render the element referenced by `use`
///
/// Symbols become a synthesized viewport, the size of `svg` and `symbol` targets is
/// overridden by the size of the `use` element. The target does not inherit styles
/// of its own ancestors, only the canvas state set up by the `use` element.
fn render_use(cx: &mut RenderContext<'_>, elem: &Element, canvas: &mut Canvas) {
    let Some(target) = cx.definition(elem.href()) else {
        diagnostic!(cx.log(), href = elem.href().value(), "unresolved use reference");
        return;
    };
    let override_size = |viewport: &mut Element| {
        for name in ["width", "height"] {
            let value = elem.attribute(name);
            if value.has_value() {
                viewport.set_attribute(name, value.value());
            }
        }
    };
    match target.kind() {
        ElementKind::Symbol => {
            let mut viewport = Element::detached(
                "svg",
                ElementKind::Svg,
                ["viewBox", "preserveAspectRatio", "overflow"]
                    .map(|name| (name, target.attribute(name).value().to_owned())),
                target.children().to_vec(),
            );
            override_size(&mut viewport);
            render(cx, &viewport, canvas);
        }
        _ => {
            let Some(id) = target.id() else {
                return;
            };
            cx.scope.detached.push(id);
            if let ElementKind::Svg = target.kind() {
                let mut viewport = target.clone();
                viewport.set_parent(None);
                override_size(&mut viewport);
                render(cx, &viewport, canvas);
            } else {
                render(cx, target, canvas);
            }
            cx.scope.detached.pop();
        }
    }
}

/// Draw raster image or nested document of an `image` element
fn render_image(cx: &mut RenderContext<'_>, elem: &Element, canvas: &mut Canvas) {
    let metrics = cx.metrics(canvas);
    let length = |name: &str, axis| elem.attribute(name).to_pixels(&metrics, axis, false);
    let (x, y) = (length("x", Axis::X), length("y", Axis::Y));
    let (width, height) = (length("width", Axis::X), length("height", Axis::Y));
    if width == 0.0 || height == 0.0 {
        return;
    }
    let images = cx.images;
    let Some(state) = elem.id().and_then(|id| images.get(&id)) else {
        return;
    };

    canvas.save();
    match state {
        ImageState::Raster(image) => {
            canvas.translate(x, y);
            AspectRatio {
                value: elem.attribute("preserveAspectRatio").value(),
                size: (width, height),
                desired: (image.width() as Scalar, image.height() as Scalar),
                min: (0.0, 0.0),
                reference: None,
            }
            .apply(canvas);
            canvas.draw_image(image.clone(), 0.0, 0.0);
        }
        ImageState::Svg(source) => {
            renderer::draw_nested(source, cx.loader, cx.log(), canvas, (x, y), (width, height));
        }
        ImageState::Pending | ImageState::Failed => {}
    }
    canvas.restore();
}
