//! Element graph built from the parsed markup
//!
//! Elements live in a flat arena owned by [`Document`] and refer to each other with
//! [`NodeId`] handles. The builder walks the markup in document order and applies
//! the style sheet as it grows, so a `<style>` element only affects the elements
//! that follow it.
use crate::{
    animation::Animation,
    property::EMPTY,
    style::StyleSheet,
    utils::{compress_spaces, parse_float, parse_number_list},
    Error, PathData, Point, Property, Resource, ResourceLoader, Scalar, RGBA,
};
use std::{collections::HashMap, fmt};

/// Handle of an element inside of the [`Document`] arena
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Glyph table of a custom SVG font
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontInfo {
    pub font_face: Option<NodeId>,
    pub missing_glyph: Option<NodeId>,
    pub glyphs: HashMap<String, GlyphForms>,
    /// Font contains glyphs with `arabic-form`
    pub is_arabic: bool,
    pub horiz_adv_x: Scalar,
}

/// Glyphs registered for a single `unicode` value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphForms {
    /// Glyph without `arabic-form`
    pub glyph: Option<NodeId>,
    /// Glyphs keyed by `arabic-form` (`isolated`, `initial`, `medial`, `terminal`)
    pub forms: HashMap<String, NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphInfo {
    pub path: PathData,
    pub horiz_adv_x: Scalar,
    pub unicode: String,
    pub arabic_form: String,
}

/// Kind specific data of an element
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Svg,
    G,
    Defs,
    Symbol,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline(Vec<Point>),
    Polygon(Vec<Point>),
    Path(PathData),
    Pattern,
    Marker,
    LinearGradient { stops: Vec<NodeId> },
    RadialGradient { stops: Vec<NodeId> },
    /// Gradient stop, `color` is `None` if the color is invalid
    Stop { offset: Scalar, color: Option<RGBA> },
    Animate,
    AnimateColor,
    AnimateTransform,
    Font(FontInfo),
    FontFace { units_per_em: Scalar },
    MissingGlyph(GlyphInfo),
    Glyph(GlyphInfo),
    Text,
    /// Either a `tspan` element or a captured text node
    TSpan { text: String },
    TRef,
    /// Link, `text` is set when all of its children are text nodes
    A { text: Option<String> },
    Image { href: String, is_svg: bool },
    Style,
    Use,
    Mask,
    ClipPath,
    Filter,
    FeMorphology,
    FeComposite,
    FeColorMatrix { matrix: [Scalar; 20] },
    FeGaussianBlur { radius: usize },
    Desc,
    Unknown,
}

impl ElementKind {
    /// Element produces path geometry
    pub fn is_path(&self) -> bool {
        matches!(
            self,
            ElementKind::Rect
                | ElementKind::Circle
                | ElementKind::Ellipse
                | ElementKind::Line
                | ElementKind::Polyline(_)
                | ElementKind::Polygon(_)
                | ElementKind::Path(_)
                | ElementKind::Glyph(_)
                | ElementKind::MissingGlyph(_)
                | ElementKind::Use
        )
    }
}

/// Single node of the element graph
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    kind: ElementKind,
    attributes: HashMap<String, Property>,
    styles: HashMap<String, Property>,
    specificity: HashMap<String, String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    id: Option<NodeId>,
    frozen_value: Option<String>,
}

impl Element {
    fn new(tag: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            tag: tag.into(),
            kind,
            attributes: HashMap::new(),
            styles: HashMap::new(),
            specificity: HashMap::new(),
            children: Vec::new(),
            parent: None,
            id: None,
            frozen_value: None,
        }
    }

    /// Element that is not part of the arena, used for synthesized viewports
    pub(crate) fn detached<'a>(
        tag: &str,
        kind: ElementKind,
        attributes: impl IntoIterator<Item = (&'a str, String)>,
        children: Vec<NodeId>,
    ) -> Self {
        let mut elem = Self::new(tag, kind);
        for (name, value) in attributes {
            elem.set_attribute(name, value);
        }
        elem.children = children;
        elem
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// Arena handle, `None` for synthesized elements
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Attribute by name, empty property if it is missing
    pub fn attribute(&self, name: &str) -> &Property {
        self.attributes.get(name).unwrap_or(&EMPTY)
    }

    /// Attribute by name, created empty if it is missing
    pub fn attribute_mut(&mut self, name: &str) -> &mut Property {
        self.attributes
            .entry(name.to_owned())
            .or_insert_with(|| Property::new(name, ""))
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attribute_mut(name).set_value(value);
    }

    /// Link target, namespace prefixes are already stripped from attribute names
    pub fn href(&self) -> &Property {
        self.attribute("href")
    }

    /// Style set on the element itself by a rule or inline `style`
    pub fn own_style(&self, name: &str) -> Option<&Property> {
        self.styles.get(name)
    }

    /// Own style by name, created empty if it is missing
    pub fn style_mut(&mut self, name: &str) -> &mut Property {
        self.styles
            .entry(name.to_owned())
            .or_insert_with(|| Property::new(name, ""))
    }

    pub fn set_style(&mut self, name: &str, value: impl Into<String>) {
        self.style_mut(name).set_value(value);
    }

    /// Value captured by a frozen animation of this element
    pub fn frozen_value(&self) -> Option<&str> {
        self.frozen_value.as_deref()
    }

    pub(crate) fn set_frozen_value(&mut self, value: String) {
        self.frozen_value = Some(value);
    }
}

/// Elements excluded from style lookups while a frame is rendered
#[derive(Debug, Clone, Default)]
pub(crate) struct LookupScope {
    /// Roots of synthesized viewports, the ancestor walk stops at them
    pub detached: Vec<NodeId>,
    /// Properties hidden on an element while its mask or filter is applied
    pub suppressed: Vec<(NodeId, &'static str)>,
}

impl LookupScope {
    fn is_suppressed(&self, elem: &Element, name: &str) -> bool {
        elem.id
            .is_some_and(|id| self.suppressed.iter().any(|s| s.0 == id && s.1 == name))
    }
}

/// Resolve style through own styles, attributes and then ancestors
fn lookup<'a>(
    elements: &'a [Element],
    mut elem: &'a Element,
    name: &str,
    skip_ancestors: bool,
    scope: &LookupScope,
) -> &'a Property {
    loop {
        if !scope.is_suppressed(elem, name) {
            if let Some(style) = elem.styles.get(name) {
                return style;
            }
            let attr = elem.attribute(name);
            if attr.has_value() {
                return attr;
            }
        }
        if skip_ancestors || elem.id.is_some_and(|id| scope.detached.contains(&id)) {
            return &EMPTY;
        }
        match elem.parent.and_then(|parent| elements.get(parent.0)) {
            Some(parent) => elem = parent,
            None => return &EMPTY,
        }
    }
}

/// Parsed document: element arena, definitions and the active resources
pub struct Document {
    elements: Vec<Element>,
    root: NodeId,
    definitions: HashMap<String, NodeId>,
    animations: Vec<Animation>,
    images: Vec<NodeId>,
    log: bool,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("elements", &self.elements.len())
            .field("root", &self.root)
            .field("definitions", &self.definitions.len())
            .field("animations", &self.animations.len())
            .field("images", &self.images.len())
            .finish()
    }
}

impl Document {
    /// Parse markup and build the element graph
    pub fn parse(text: &str, loader: &dyn ResourceLoader, log: bool) -> Result<Self, Error> {
        let xml = roxmltree::Document::parse(text)?;
        Self::from_xml(&xml, loader, log)
    }

    /// Build the element graph from already parsed markup
    pub fn from_xml(
        xml: &roxmltree::Document<'_>,
        loader: &dyn ResourceLoader,
        log: bool,
    ) -> Result<Self, Error> {
        let _span = tracing::debug_span!("[load]").entered();
        let root_node = xml.root_element();
        if root_node.tag_name().name() != "svg" {
            return Err(Error::NoRoot(root_node.tag_name().name().to_owned()));
        }
        let mut builder = Builder {
            elements: Vec::new(),
            definitions: HashMap::new(),
            sheet: StyleSheet::new(),
            animations: Vec::new(),
            images: Vec::new(),
            loader,
            log,
        };
        let root = builder.build(root_node, None);
        // rules declared after the root was created still apply to it
        let mut root_elem = builder.elements[root.0].clone();
        builder.apply_styles(&mut root_elem, root_node);
        builder.elements[root.0] = root_elem;
        tracing::debug!(
            elements = builder.elements.len(),
            rules = builder.sheet.rules().len(),
            "document built"
        );
        Ok(Self {
            elements: builder.elements,
            root,
            definitions: builder.definitions,
            animations: builder.animations,
            images: builder.images,
            log,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn element(&self, id: NodeId) -> &Element {
        &self.elements[id.0]
    }

    pub fn element_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.elements[id.0]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element registered under the id or a font family name
    pub fn definition(&self, name: &str) -> Option<NodeId> {
        self.definitions.get(name).copied()
    }

    /// Element with the `id` attribute, first registered element wins
    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        self.definition(id).map(|id| self.element(id))
    }

    /// Style of the element, looked up through its ancestors
    pub fn style<'a>(&'a self, elem: &'a Element, name: &str) -> &'a Property {
        lookup(&self.elements, elem, name, false, &LookupScope::default())
    }

    /// Style lookup with explicit control over the ancestor walk
    pub(crate) fn lookup_style<'a>(
        &'a self,
        elem: &'a Element,
        name: &str,
        skip_ancestors: bool,
        scope: &LookupScope,
    ) -> &'a Property {
        lookup(&self.elements, elem, name, skip_ancestors, scope)
    }

    /// Parent chain starting with the element itself
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), |id| self.element(*id).parent)
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub(crate) fn take_animations(&mut self) -> Vec<Animation> {
        std::mem::take(&mut self.animations)
    }

    pub(crate) fn restore_animations(&mut self, animations: Vec<Animation>) {
        self.animations = animations;
    }

    /// Image elements with a non-empty `href`
    pub fn images(&self) -> &[NodeId] {
        &self.images
    }

    /// Unsupported constructs are reported as warnings
    pub fn log(&self) -> bool {
        self.log
    }
}

struct Builder<'a> {
    elements: Vec<Element>,
    definitions: HashMap<String, NodeId>,
    sheet: StyleSheet,
    animations: Vec<Animation>,
    images: Vec<NodeId>,
    loader: &'a dyn ResourceLoader,
    log: bool,
}

impl Builder<'_> {
    /// Apply every matching rule, a rule overrides a style only with strictly
    /// greater specificity
    fn apply_rules(&self, elem: &mut Element, node: roxmltree::Node<'_, '_>) {
        for rule in self.sheet.rules() {
            if !rule.matches(node) {
                continue;
            }
            for prop in rule.props() {
                let existing = elem
                    .specificity
                    .get(prop.name())
                    .map_or("000", String::as_str);
                if rule.specificity() > existing {
                    elem.styles.insert(prop.name().to_owned(), prop.clone());
                    elem.specificity
                        .insert(prop.name().to_owned(), rule.specificity().to_owned());
                }
            }
        }
    }

    /// Apply matching rules and then the inline `style` attribute on top of them
    fn apply_styles(&self, elem: &mut Element, node: roxmltree::Node<'_, '_>) {
        self.apply_rules(elem, node);
        let inline = elem.attribute("style").value().to_owned();
        for decl in inline.split(';') {
            if decl.trim().is_empty() {
                continue;
            }
            let (name, value) = decl.split_once(':').unwrap_or((decl, ""));
            let name = name.trim();
            elem.styles
                .insert(name.to_owned(), Property::new(name, value.trim()));
        }
    }

    fn build(&mut self, node: roxmltree::Node<'_, '_>, parent: Option<NodeId>) -> NodeId {
        let tag = node.tag_name().name();
        let id = NodeId(self.elements.len());
        let mut elem = Element::new(tag, ElementKind::Unknown);
        elem.parent = parent;
        elem.id = Some(id);

        let known = is_known_tag(tag);
        if !known {
            diagnostic!(self.log, tag, "element is not supported");
        }
        if !known || tag == "desc" {
            // unsupported and descriptive elements carry no data
            elem.kind = if known {
                ElementKind::Desc
            } else {
                ElementKind::Unknown
            };
            self.elements.push(elem);
            return id;
        }

        for attr in node.attributes() {
            elem.attributes
                .insert(attr.name().to_owned(), Property::new(attr.name(), attr.value()));
        }
        self.apply_styles(&mut elem, node);
        let element_id = elem.attribute("id").value().to_owned();
        if !element_id.is_empty() {
            self.definitions.entry(element_id).or_insert(id);
        }
        self.elements.push(elem);

        let capture_text = matches!(tag, "text" | "tspan");
        for child in node.children() {
            if child.is_element() {
                // title is built for completeness but never rendered
                if child.tag_name().name() == "title" {
                    continue;
                }
                let child_id = self.build(child, Some(id));
                self.elements[id.0].children.push(child_id);
            } else if capture_text && child.is_text() {
                let text = compress_spaces(child.text().unwrap_or(""));
                if text.is_empty() {
                    continue;
                }
                let child_id = NodeId(self.elements.len());
                let mut span = Element::new("tspan", ElementKind::TSpan { text });
                span.parent = Some(id);
                span.id = Some(child_id);
                self.elements.push(span);
                self.elements[id.0].children.push(child_id);
            }
        }

        let kind = self.make_kind(tag, node, id);
        self.elements[id.0].kind = kind;
        id
    }

    fn make_kind(&mut self, tag: &str, node: roxmltree::Node<'_, '_>, id: NodeId) -> ElementKind {
        let elem = &self.elements[id.0];
        match tag {
            "svg" => ElementKind::Svg,
            "g" => ElementKind::G,
            "defs" => ElementKind::Defs,
            "symbol" => ElementKind::Symbol,
            "rect" => ElementKind::Rect,
            "circle" => ElementKind::Circle,
            "ellipse" => ElementKind::Ellipse,
            "line" => ElementKind::Line,
            "polyline" => ElementKind::Polyline(parse_points(elem.attribute("points").value())),
            "polygon" => ElementKind::Polygon(parse_points(elem.attribute("points").value())),
            "path" => ElementKind::Path(PathData::parse(elem.attribute("d").value())),
            "pattern" => ElementKind::Pattern,
            "marker" => ElementKind::Marker,
            "linearGradient" => ElementKind::LinearGradient {
                stops: self.stops(id),
            },
            "radialGradient" => ElementKind::RadialGradient {
                stops: self.stops(id),
            },
            "stop" => stop_kind(elem),
            "animate" | "animateColor" | "animateTransform" => {
                let animation = elem.parent.map(|parent| Animation::new(id, parent, elem));
                self.animations.extend(animation);
                match tag {
                    "animate" => ElementKind::Animate,
                    "animateColor" => ElementKind::AnimateColor,
                    _ => ElementKind::AnimateTransform,
                }
            }
            "font" => ElementKind::Font(self.font_info(id)),
            "font-face" => ElementKind::FontFace {
                units_per_em: elem.attribute("units-per-em").num_value(),
            },
            "missing-glyph" => ElementKind::MissingGlyph(GlyphInfo {
                path: PathData::parse(elem.attribute("d").value()),
                horiz_adv_x: 0.0,
                unicode: String::new(),
                arabic_form: String::new(),
            }),
            "glyph" => ElementKind::Glyph(GlyphInfo {
                path: PathData::parse(elem.attribute("d").value()),
                horiz_adv_x: elem.attribute("horiz-adv-x").num_value(),
                unicode: elem.attribute("unicode").value().to_owned(),
                arabic_form: elem.attribute("arabic-form").value().to_owned(),
            }),
            "text" => ElementKind::Text,
            "tspan" => ElementKind::TSpan {
                text: compress_spaces(&text_content(node)),
            },
            "tref" => ElementKind::TRef,
            "a" => {
                let has_text = node.has_children() && node.children().all(|n| n.is_text());
                ElementKind::A {
                    text: has_text
                        .then(|| node.first_child().and_then(|n| n.text()).unwrap_or(""))
                        .map(str::to_owned),
                }
            }
            "image" => {
                let href = elem.href().value().to_owned();
                if !href.is_empty() {
                    self.images.push(id);
                }
                ElementKind::Image {
                    is_svg: href.ends_with(".svg"),
                    href,
                }
            }
            "style" => {
                let css: String = node.children().filter_map(|n| n.text()).collect();
                self.add_css(&css);
                ElementKind::Style
            }
            "use" => ElementKind::Use,
            "mask" => ElementKind::Mask,
            "clipPath" => ElementKind::ClipPath,
            "filter" => ElementKind::Filter,
            "feMorphology" => ElementKind::FeMorphology,
            "feComposite" => ElementKind::FeComposite,
            "feColorMatrix" => ElementKind::FeColorMatrix {
                matrix: color_matrix(
                    elem.attribute("type").value(),
                    elem.attribute("values").value(),
                ),
            },
            "feGaussianBlur" => {
                let deviation = elem.attribute("stdDeviation").num_value();
                ElementKind::FeGaussianBlur {
                    radius: if deviation.is_finite() && deviation > 0.0 {
                        deviation.floor() as usize
                    } else {
                        0
                    },
                }
            }
            _ => ElementKind::Unknown,
        }
    }

    fn stops(&self, id: NodeId) -> Vec<NodeId> {
        self.elements[id.0]
            .children
            .iter()
            .copied()
            .filter(|child| self.elements[child.0].tag == "stop")
            .collect()
    }

    fn font_info(&mut self, id: NodeId) -> FontInfo {
        let mut info = FontInfo {
            horiz_adv_x: self.elements[id.0].attribute("horiz-adv-x").num_value(),
            ..FontInfo::default()
        };
        for child_id in self.elements[id.0].children.clone() {
            let child = &self.elements[child_id.0];
            match child.tag.as_str() {
                "font-face" => {
                    info.font_face = Some(child_id);
                    let scope = LookupScope::default();
                    let family = lookup(&self.elements, child, "font-family", false, &scope);
                    if family.has_value() {
                        self.definitions.insert(family.value().to_owned(), id);
                    }
                }
                "missing-glyph" => info.missing_glyph = Some(child_id),
                "glyph" => {
                    let unicode = child.attribute("unicode").value().to_owned();
                    let form = child.attribute("arabic-form").value().to_owned();
                    let entry = info.glyphs.entry(unicode).or_default();
                    if form.is_empty() {
                        entry.glyph = Some(child_id);
                    } else {
                        info.is_arabic = true;
                        entry.forms.insert(form, child_id);
                    }
                }
                _ => {}
            }
        }
        info
    }

    /// Add style sheet rules and load fonts referenced by `@font-face`
    fn add_css(&mut self, css: &str) {
        for source in self.sheet.add_css(css) {
            let text = match self.loader.load(&source.url, false) {
                Ok(Resource::Ready(data)) => String::from_utf8_lossy(&data).into_owned(),
                Ok(Resource::Pending) => {
                    diagnostic!(self.log, url = %source.url, "font is not available yet");
                    continue;
                }
                Err(error) => {
                    diagnostic!(self.log, url = %source.url, %error, "failed to load font");
                    continue;
                }
            };
            let xml = match roxmltree::Document::parse(&text) {
                Ok(xml) => xml,
                Err(error) => {
                    diagnostic!(self.log, url = %source.url, %error, "failed to parse font");
                    continue;
                }
            };
            let fonts: Vec<_> = xml
                .descendants()
                .filter(|node| node.tag_name().name() == "font")
                .collect();
            for node in fonts {
                let font = self.build(node, None);
                self.definitions.insert(source.family.clone(), font);
            }
        }
    }
}

fn is_known_tag(tag: &str) -> bool {
    matches!(
        tag,
        "svg"
            | "g"
            | "defs"
            | "symbol"
            | "rect"
            | "circle"
            | "ellipse"
            | "line"
            | "polyline"
            | "polygon"
            | "path"
            | "pattern"
            | "marker"
            | "linearGradient"
            | "radialGradient"
            | "stop"
            | "animate"
            | "animateColor"
            | "animateTransform"
            | "font"
            | "font-face"
            | "missing-glyph"
            | "glyph"
            | "text"
            | "tspan"
            | "tref"
            | "a"
            | "image"
            | "style"
            | "use"
            | "mask"
            | "clipPath"
            | "filter"
            | "feMorphology"
            | "feComposite"
            | "feColorMatrix"
            | "feGaussianBlur"
            | "desc"
    )
}

/// Concatenated text of all descendant text nodes
fn text_content(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Points of `polyline` and `polygon`, odd trailing coordinate yields `NaN`
fn parse_points(value: &str) -> Vec<Point> {
    let values: Vec<Scalar> = compress_spaces(&value.replace(',', " "))
        .trim()
        .split(' ')
        .map(parse_float)
        .collect();
    values
        .chunks(2)
        .map(|pair| Point::new(pair[0], pair.get(1).copied().unwrap_or(Scalar::NAN)))
        .collect()
}

/// Stop offset and color, computed from the stop's own styles and attributes
fn stop_kind(elem: &Element) -> ElementKind {
    let own = |name: &str| match elem.own_style(name) {
        Some(style) => style,
        None => elem.attribute(name),
    };
    let mut offset = elem.attribute("offset").num_value();
    if offset.is_nan() || offset < 0.0 {
        offset = 0.0;
    }
    if offset > 1.0 {
        offset = 1.0;
    }
    let color = own("stop-color").value_or_default("#000");
    let color = color.trim().parse::<RGBA>().ok().map(|color| {
        let opacity = own("stop-opacity");
        if opacity.has_value() {
            let alpha = opacity.num_value();
            let alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
            RGBA::new(
                color.red(),
                color.green(),
                color.blue(),
                (alpha * 255.0).round() as u8,
            )
        } else {
            color
        }
    });
    ElementKind::Stop { offset, color }
}

/// Row-major 4x5 color matrix of `feColorMatrix`
#[rustfmt::skip]
fn color_matrix(kind: &str, values: &str) -> [Scalar; 20] {
    let mut matrix = [0.0; 20];
    let values = parse_number_list(values);
    match kind {
        "saturate" => {
            let s = values.first().copied().unwrap_or(Scalar::NAN);
            matrix = [
                0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s, 0.0, 0.0,
                0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s, 0.0, 0.0,
                0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s, 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0, 0.0,
            ];
        }
        "hueRotate" => {
            let a = values.first().copied().unwrap_or(Scalar::NAN) * crate::PI / 180.0;
            let (sin, cos) = a.sin_cos();
            let m = |c1: Scalar, c2: Scalar, c3: Scalar| c1 + cos * c2 + sin * c3;
            matrix = [
                m(0.213, 0.787, -0.213), m(0.715, -0.715, -0.715), m(0.072, -0.072, 0.928), 0.0, 0.0,
                m(0.213, -0.213, 0.143), m(0.715, 0.285, 0.140), m(0.072, -0.072, -0.283), 0.0, 0.0,
                m(0.213, -0.213, -0.787), m(0.715, -0.715, 0.715), m(0.072, 0.928, 0.072), 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0, 0.0,
            ];
        }
        "luminanceToAlpha" => {
            matrix[15] = 0.2125;
            matrix[16] = 0.7154;
            matrix[17] = 0.0721;
        }
        _ if values.is_empty() => {
            // identity for a missing `values` attribute
            for i in 0..4 {
                matrix[i * 5 + i] = 1.0;
            }
        }
        _ => {
            matrix = [Scalar::NAN; 20];
            for (dst, src) in matrix.iter_mut().zip(values) {
                *dst = src;
            }
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    struct MemLoader(HashMap<&'static str, &'static str>);

    impl ResourceLoader for MemLoader {
        fn load(&self, url: &str, _cross_origin: bool) -> Result<Resource, Error> {
            match self.0.get(url) {
                Some(data) => Ok(Resource::Ready(data.as_bytes().to_vec())),
                None => Err(Error::IoError(std::io::ErrorKind::NotFound.into())),
            }
        }
    }

    fn parse(text: &str) -> Document {
        Document::parse(text, &MemLoader(HashMap::new()), false).expect("valid document")
    }

    fn by_id<'a>(doc: &'a Document, id: &str) -> &'a Element {
        doc.element_by_id(id).expect("element exists")
    }

    #[test]
    fn test_structure() {
        let doc = parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100">
                <title>ignored</title>
                <g id="group"><rect id="r" width="5"/><circle/></g>
                <desc id="description" fill="red">text</desc>
                <switch id="unknown"><rect/></switch>
            </svg>"#,
        );
        let root = doc.element(doc.root());
        assert_eq!(root.kind(), &ElementKind::Svg);
        assert_eq!(root.children().len(), 3);
        let group = by_id(&doc, "group");
        assert_eq!(group.children().len(), 2);
        assert_eq!(doc.element(group.children()[0]).kind(), &ElementKind::Rect);
        assert_eq!(by_id(&doc, "r").parent(), group.id());
        // desc and unknown elements keep neither attributes nor children
        assert!(doc.element_by_id("description").is_none());
        assert!(doc.element_by_id("unknown").is_none());
        let last = doc.element(root.children()[2]);
        assert_eq!(last.kind(), &ElementKind::Unknown);
        assert!(last.children().is_empty());
    }

    #[test]
    fn test_first_id_wins() {
        let doc = parse(r#"<svg><rect id="a" x="1"/><circle id="a"/></svg>"#);
        assert_eq!(by_id(&doc, "a").kind(), &ElementKind::Rect);
    }

    #[test]
    fn test_style_cascade() {
        let doc = parse(
            r#"<svg>
                <style>
                    .shape { fill: blue; stroke: green }
                    .plain { fill: red }
                    rect { stroke: yellow }
                    rect { stroke-width: 2 }
                    .big { stroke-width: 4 }
                    #special { stroke-width: 8 }
                </style>
                <rect id="plain" class="shape plain"/>
                <rect id="special" class="big" style="stroke: black; fill:"/>
            </svg>"#,
        );
        let plain = by_id(&doc, "plain");
        // both class rules have equal specificity, the first one applied wins
        assert_eq!(doc.style(plain, "fill").value(), "blue");
        assert_eq!(doc.style(plain, "stroke").value(), "green");
        // repeated selector is merged into a single rule
        assert_eq!(doc.style(plain, "stroke-width").value(), "2");
        let special = by_id(&doc, "special");
        assert_eq!(doc.style(special, "stroke-width").value(), "8");
        assert_eq!(doc.style(special, "stroke").value(), "black");
        assert!(!doc.style(special, "fill").has_value());
    }

    #[test]
    fn test_equal_specificity_keeps_first() {
        let doc = parse(
            r#"<svg>
                <style>.a { fill: red } .b { fill: blue }</style>
                <rect id="r" class="a b"/>
            </svg>"#,
        );
        assert_eq!(doc.style(by_id(&doc, "r"), "fill").value(), "red");
    }

    #[test]
    fn test_root_inline_style_wins() {
        let doc = parse(
            r#"<svg id="root" style="fill: blue">
                <style>svg { fill: red; stroke: green } #root { fill: yellow }</style>
            </svg>"#,
        );
        let root = doc.element(doc.root());
        // late rules reach the root, but never over its inline style
        assert_eq!(doc.style(root, "fill").value(), "blue");
        assert_eq!(doc.style(root, "stroke").value(), "green");
    }

    #[test]
    fn test_rules_apply_in_document_order() {
        let doc = parse(
            r#"<svg>
                <rect id="before"/>
                <style>rect { fill: red }</style>
                <rect id="after"/>
            </svg>"#,
        );
        assert!(!doc.style(by_id(&doc, "before"), "fill").has_value());
        assert_eq!(doc.style(by_id(&doc, "after"), "fill").value(), "red");
    }

    #[test]
    fn test_lookup() {
        let doc = parse(
            r#"<svg fill="red" transform="scale(2)">
                <g id="g" stroke="blue"><rect id="r" stroke="green"/></g>
            </svg>"#,
        );
        let rect = by_id(&doc, "r");
        let group = by_id(&doc, "g");
        assert_eq!(doc.style(rect, "fill").value(), "red");
        assert_eq!(doc.style(rect, "stroke").value(), "green");
        assert!(!doc
            .lookup_style(rect, "fill", true, &LookupScope::default())
            .has_value());
        let mut scope = LookupScope {
            detached: vec![group.id().expect("arena element")],
            ..LookupScope::default()
        };
        assert!(!doc.lookup_style(rect, "fill", false, &scope).has_value());
        assert_eq!(doc.lookup_style(rect, "stroke", false, &scope).value(), "green");
        // suppressed values are skipped and the walk continues upwards
        scope.detached.clear();
        scope.suppressed.push((rect.id().expect("arena element"), "stroke"));
        assert_eq!(doc.lookup_style(rect, "stroke", false, &scope).value(), "blue");
        assert!(!doc.style(rect, "missing").has_value());
        let chain: Vec<_> = doc.ancestors(rect.id().expect("arena element")).collect();
        assert_eq!(chain, vec![rect.id().unwrap(), group.id().unwrap(), doc.root()]);
    }

    #[test]
    fn test_text_nodes() {
        let doc = parse(
            r#"<svg><text id="t">  Hello <tspan id="s">big</tspan> world <!-- c --></text></svg>"#,
        );
        let text = by_id(&doc, "t");
        let spans: Vec<_> = text
            .children()
            .iter()
            .map(|id| match doc.element(*id).kind() {
                ElementKind::TSpan { text } => text.clone(),
                kind => panic!("unexpected kind: {:?}", kind),
            })
            .collect();
        assert_eq!(spans, vec![" Hello ", "big", " world "]);
    }

    #[test]
    fn test_link_text() {
        let doc = parse(
            r#"<svg><a id="a1" href="x">click</a><a id="a2"><rect/></a></svg>"#,
        );
        assert_eq!(
            by_id(&doc, "a1").kind(),
            &ElementKind::A {
                text: Some("click".to_owned())
            }
        );
        assert_eq!(by_id(&doc, "a2").kind(), &ElementKind::A { text: None });
    }

    #[test]
    fn test_gradient_stops() {
        let doc = parse(
            r##"<svg>
                <linearGradient id="g">
                    <stop offset="-1" stop-color="red"/>
                    <stop offset="50%" style="stop-color: #00f; stop-opacity: 0.5"/>
                    <stop offset="2" stop-color="bogus"/>
                    <animate/>
                </linearGradient>
            </svg>"##,
        );
        let ElementKind::LinearGradient { stops } = by_id(&doc, "g").kind() else {
            panic!("gradient expected");
        };
        assert_eq!(stops.len(), 3);
        let stop = |index: usize| match doc.element(stops[index]).kind() {
            ElementKind::Stop { offset, color } => (*offset, *color),
            kind => panic!("unexpected kind: {:?}", kind),
        };
        assert_approx_eq!(stop(0).0, 0.0);
        assert_eq!(stop(0).1, Some(RGBA::new(255, 0, 0, 255)));
        assert_approx_eq!(stop(1).0, 0.5);
        assert_eq!(stop(1).1, Some(RGBA::new(0, 0, 255, 128)));
        assert_approx_eq!(stop(2).0, 1.0);
        assert_eq!(stop(2).1, None);
    }

    #[test]
    fn test_fonts() {
        let font = r#"<svg><defs><font id="f" horiz-adv-x="500">
            <font-face font-family="Remote" units-per-em="1000"/>
            <missing-glyph d="M0 0h10"/>
            <glyph unicode="a" d="M0 0h1"/>
            <glyph unicode="b" arabic-form="initial" d="M0 0h1"/>
        </font></defs></svg>"#;
        let loader = MemLoader([("fonts/remote.svg", font)].into_iter().collect());
        let doc = Document::parse(
            r#"<svg><style>@font-face { font-family: Remote; src: url('fonts/remote.svg') format("svg") }</style>
                <text font-family="Remote">a</text></svg>"#,
            &loader,
            false,
        )
        .expect("valid document");
        let font = doc.element(doc.definition("Remote").expect("font registered"));
        let ElementKind::Font(info) = font.kind() else {
            panic!("font expected");
        };
        assert!(info.is_arabic);
        assert!(info.missing_glyph.is_some());
        assert!(info.glyphs["a"].glyph.is_some());
        assert!(info.glyphs["b"].forms.contains_key("initial"));
        assert_approx_eq!(info.horiz_adv_x, 500.0);
        assert_eq!(font.parent(), None);
    }

    #[test]
    fn test_animations_and_images() {
        let doc = parse(
            r#"<svg><rect id="r"><animate attributeName="x" from="0" to="100" dur="1s"/></rect>
                <image href="a.png"/><image/></svg>"#,
        );
        assert_eq!(doc.animations().len(), 1);
        assert_eq!(doc.images().len(), 1);
        let points = parse_points("1,2 3 4 5");
        assert_eq!(points.len(), 3);
        assert!(points[2].y().is_nan());
    }

    #[test]
    fn test_no_root() {
        let loader = MemLoader(HashMap::new());
        assert!(matches!(
            Document::parse("<html/>", &loader, false),
            Err(Error::NoRoot(_))
        ));
        assert!(matches!(
            Document::parse("<svg", &loader, false),
            Err(Error::Xml(_))
        ));
    }
}
