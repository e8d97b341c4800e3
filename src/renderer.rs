//! Rendering session: resources, frame scheduling and pointer event dispatch
use crate::{
    events::{EventKind, Mouse, PointerEvent},
    render::{render, RenderContext},
    utils::{format_scalar, parse_number_list},
    Axis, Canvas, Document, ElementKind, Error, Font, ImageOwned, LinColor, Metrics, NodeId,
    Property, Scalar,
};
use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    rc::Rc,
};

/// Scheduler frame rate in frames per second
pub const FRAME_RATE: Scalar = 30.0;

/// Interval between scheduler ticks in milliseconds
pub const FRAME_INTERVAL: Scalar = 1000.0 / FRAME_RATE;

/// Result of a resource request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// Resource content is available
    Ready(Vec<u8>),
    /// Resource is still loading, it is delivered later with [`Renderer::complete_image`]
    Pending,
}

/// Source of external resources (images, fonts referenced from style sheets)
pub trait ResourceLoader {
    fn load(&self, url: &str, cross_origin: bool) -> Result<Resource, Error>;
}

/// Loads resources from the file system relative to a base directory
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    base: PathBuf,
}

impl FsLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl ResourceLoader for FsLoader {
    fn load(&self, url: &str, _cross_origin: bool) -> Result<Resource, Error> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        Ok(Resource::Ready(std::fs::read(self.base.join(path))?))
    }
}

/// Loading state of an `image` element
#[derive(Debug, Clone)]
pub enum ImageState {
    Pending,
    Raster(Rc<ImageOwned<LinColor>>),
    /// Markup of a nested document
    Svg(String),
    /// Loading failed, the image is considered loaded and renders nothing
    Failed,
}

impl ImageState {
    pub fn is_loaded(&self) -> bool {
        !matches!(self, ImageState::Pending)
    }
}

/// Options of a rendering session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct Options {
    /// Do not hit test and dispatch pointer events
    pub ignore_mouse: bool,
    /// Do not advance animations
    pub ignore_animation: bool,
    /// Do not resize the surface from the size of the root element
    pub ignore_dimensions: bool,
    /// Do not clear the surface before each frame
    pub ignore_clear: bool,
    /// Position of the root element
    pub offset_x: Option<Scalar>,
    pub offset_y: Option<Scalar>,
    /// Size the root element is scaled to
    pub scale_width: Option<Scalar>,
    pub scale_height: Option<Scalar>,
    /// Request images with the cross origin flag
    #[cfg_attr(feature = "serde", serde(rename = "useCORS"))]
    pub use_cors: bool,
    /// Report unsupported constructs as warnings instead of debug messages
    pub log: bool,
    /// Surface size used when the document does not dictate one
    pub width: usize,
    pub height: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ignore_mouse: false,
            ignore_animation: false,
            ignore_dimensions: false,
            ignore_clear: false,
            offset_x: None,
            offset_y: None,
            scale_width: None,
            scale_height: None,
            use_cors: false,
            log: false,
            width: 300,
            height: 150,
        }
    }
}

impl Options {
    /// Load options from a JSON object with camel case option names
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Per document state that survives between frames
#[derive(Debug, Default)]
struct Session {
    /// Ratios of the scale options once they are folded into the root transform
    ratio: Option<(Scalar, Scalar)>,
}

impl Session {
    /// Render a single frame of the document
    fn draw(
        &mut self,
        doc: &mut Document,
        options: &Options,
        canvas: &mut Canvas,
        mouse: Option<&mut Mouse>,
        images: &HashMap<NodeId, ImageState>,
        loader: &dyn ResourceLoader,
    ) {
        let root = doc.root();
        let metrics = Metrics::new(
            options.width as Scalar,
            options.height as Scalar,
            Font::default().size_px(),
        );
        let scale = options.scale_width.is_some() || options.scale_height.is_some();
        if scale && self.ratio.is_none() {
            self.ratio = Some(scale_root(doc, options, &metrics).unwrap_or((1.0, 1.0)));
        }
        // root position is resolved after its transform, offsets are in surface units
        let (x_ratio, y_ratio) = self.ratio.unwrap_or((1.0, 1.0));
        if let Some(x) = options.offset_x {
            doc.element_mut(root).set_attribute("x", format_scalar(x * x_ratio));
        }
        if let Some(y) = options.offset_y {
            doc.element_mut(root).set_attribute("y", format_scalar(y * y_ratio));
        }

        let root_size = |doc: &Document, name: &str, axis| -> Option<Scalar> {
            let prop = doc.style(doc.element(root), name);
            prop.has_value().then(|| prop.to_pixels(&metrics, axis, false))
        };
        let width = root_size(doc, "width", Axis::X);
        let height = root_size(doc, "height", Axis::Y);
        if !options.ignore_dimensions {
            let size = (
                width.map_or(canvas.width(), crate::canvas::canvas_size),
                height.map_or(canvas.height(), crate::canvas::canvas_size),
            );
            if size != (canvas.width(), canvas.height()) {
                canvas.resize(size.0, size.1);
            }
        }
        let (mut viewport_width, mut viewport_height) =
            (canvas.width() as Scalar, canvas.height() as Scalar);
        if options.ignore_dimensions {
            if let (Some(width), Some(height)) = (width, height) {
                viewport_width = width;
                viewport_height = height;
            }
        }

        if !options.ignore_clear {
            canvas.clear_rect(0.0, 0.0, viewport_width, viewport_height);
        }
        let doc: &Document = doc;
        let mut cx = RenderContext::new(doc, mouse, images, loader);
        cx.viewport.set_current(viewport_width, viewport_height);
        tracing::debug_span!("[frame]").in_scope(|| render(&mut cx, doc.element(root), canvas));
    }
}

/// Resize the root element to the scale options
///
/// The ratio of an axis comes from the root `width` (`height`) or the `viewBox`,
/// a missing ratio is taken from the other axis. Returns the applied ratios.
fn scale_root(
    doc: &mut Document,
    options: &Options,
    metrics: &Metrics,
) -> Option<(Scalar, Scalar)> {
    let root = doc.element(doc.root());
    let view_box = parse_number_list(root.attribute("viewBox").value());
    let ratio = |scale: Option<Scalar>, name: &str, axis, index: usize| -> Option<Scalar> {
        let scale = scale?;
        let size = root.attribute(name);
        if size.has_value() {
            Some(size.to_pixels(metrics, axis, false) / scale)
        } else {
            view_box
                .get(index)
                .filter(|value| !value.is_nan())
                .map(|value| value / scale)
        }
    };
    let x_ratio = ratio(options.scale_width, "width", Axis::X, 2);
    let y_ratio = ratio(options.scale_height, "height", Axis::Y, 3);
    let (x_ratio, y_ratio) = x_ratio.or(y_ratio).zip(y_ratio.or(x_ratio))?;
    // axis without a scale option keeps its proportion
    let size = |scale: Option<Scalar>, name: &str, axis, ratio: Scalar| -> Option<Scalar> {
        scale.or_else(|| {
            let size = root.attribute(name);
            size.has_value().then(|| size.to_pixels(metrics, axis, false) / ratio)
        })
    };
    let width = size(options.scale_width, "width", Axis::X, x_ratio);
    let height = size(options.scale_height, "height", Axis::Y, y_ratio);
    let transform = Property::new(
        "transform",
        root.own_style("transform")
            .filter(|prop| prop.has_value())
            .unwrap_or_else(|| root.attribute("transform"))
            .value(),
    );

    let root = doc.element_mut(doc.root());
    if let Some(width) = width {
        root.set_attribute("width", format_scalar(width));
    }
    if let Some(height) = height {
        root.set_attribute("height", format_scalar(height));
    }
    root.set_style(
        "transform",
        format!(
            "{} scale({},{})",
            transform.value(),
            format_scalar(1.0 / x_ratio),
            format_scalar(1.0 / y_ratio)
        ),
    );
    Some((x_ratio, y_ratio))
}

/// Render nested document markup into the box `(x, y, width, height)`
///
/// Used by `image` elements referencing SVG documents. The nested session
/// ignores pointer input, animations and surface dimensions and loads its
/// images synchronously.
pub(crate) fn draw_nested(
    source: &str,
    loader: &dyn ResourceLoader,
    log: bool,
    canvas: &mut Canvas,
    (x, y): (Scalar, Scalar),
    (width, height): (Scalar, Scalar),
) {
    let mut doc = match Document::parse(source, loader, log) {
        Ok(doc) => doc,
        Err(error) => {
            diagnostic!(log, %error, "failed to parse nested document");
            return;
        }
    };
    let options = Options {
        ignore_mouse: true,
        ignore_animation: true,
        ignore_dimensions: true,
        ignore_clear: true,
        offset_x: Some(x),
        offset_y: Some(y),
        scale_width: Some(width),
        scale_height: Some(height),
        log,
        width: canvas.width(),
        height: canvas.height(),
        ..Options::default()
    };
    let images = load_images(&doc, loader, false, log);
    Session::default().draw(&mut doc, &options, canvas, None, &images, loader);
}

/// Request every image of the document from the loader
fn load_images(
    doc: &Document,
    loader: &dyn ResourceLoader,
    cross_origin: bool,
    log: bool,
) -> HashMap<NodeId, ImageState> {
    doc.images()
        .iter()
        .filter_map(|id| {
            let ElementKind::Image { href, is_svg } = doc.element(*id).kind() else {
                return None;
            };
            let state = match loader.load(href, cross_origin) {
                Ok(Resource::Ready(data)) => decode_image(href, *is_svg, data, log),
                Ok(Resource::Pending) => ImageState::Pending,
                Err(error) => {
                    diagnostic!(log, href = %href, %error, "failed to load image");
                    ImageState::Failed
                }
            };
            Some((*id, state))
        })
        .collect()
}

fn decode_image(href: &str, is_svg: bool, data: Vec<u8>, log: bool) -> ImageState {
    if is_svg {
        return ImageState::Svg(String::from_utf8_lossy(&data).into_owned());
    }
    decode_raster(href, &data, log)
}

#[cfg(feature = "png")]
fn decode_raster(href: &str, data: &[u8], log: bool) -> ImageState {
    match crate::image::read_png(data) {
        Ok(image) => ImageState::Raster(Rc::new(image)),
        Err(error) => {
            diagnostic!(log, href = %href, %error, "failed to decode image");
            ImageState::Failed
        }
    }
}

#[cfg(not(feature = "png"))]
fn decode_raster(href: &str, _data: &[u8], log: bool) -> ImageState {
    diagnostic!(log, href = %href, "raster images require the png feature");
    ImageState::Failed
}

type EventHandler = Box<dyn FnMut(NodeId, &PointerEvent)>;

/// Renders a document onto an owned canvas and drives its animations and events
pub struct Renderer {
    doc: Document,
    options: Options,
    loader: Box<dyn ResourceLoader>,
    canvas: Canvas,
    session: Session,
    images: HashMap<NodeId, ImageState>,
    waiting_for_images: bool,
    mouse: Mouse,
    handlers: HashMap<(NodeId, EventKind), Vec<EventHandler>>,
    cursor: String,
    navigations: Vec<String>,
    render_callback: Option<Box<dyn FnMut(&Document)>>,
    force_redraw: Option<Box<dyn FnMut() -> bool>>,
    frames: usize,
    running: bool,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("doc", &self.doc)
            .field("options", &self.options)
            .field("frames", &self.frames)
            .field("running", &self.running)
            .finish()
    }
}

impl Renderer {
    /// Parse markup and create a renderer for it
    pub fn from_str(
        text: &str,
        options: Options,
        loader: impl ResourceLoader + 'static,
    ) -> Result<Self, Error> {
        let doc = Document::parse(text, &loader, options.log)?;
        Ok(Self::new(doc, options, Box::new(loader)))
    }

    /// Create a renderer for already parsed markup
    pub fn from_document(
        xml: &roxmltree::Document<'_>,
        options: Options,
        loader: impl ResourceLoader + 'static,
    ) -> Result<Self, Error> {
        let doc = Document::from_xml(xml, &loader, options.log)?;
        Ok(Self::new(doc, options, Box::new(loader)))
    }

    /// Read document from a file, resources are resolved relative to its directory
    pub fn from_path(path: impl AsRef<Path>, options: Options) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_str(&text, options, FsLoader::new(base))
    }

    fn new(doc: Document, options: Options, loader: Box<dyn ResourceLoader>) -> Self {
        let images = load_images(&doc, loader.as_ref(), options.use_cors, options.log);
        let canvas = Canvas::new(options.width, options.height);
        Self {
            doc,
            options,
            loader,
            canvas,
            session: Session::default(),
            images,
            waiting_for_images: true,
            mouse: Mouse::new(),
            handlers: HashMap::new(),
            cursor: String::new(),
            navigations: Vec::new(),
            render_callback: None,
            force_redraw: None,
            frames: 0,
            running: true,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Rendered surface
    pub fn surface(&self) -> &ImageOwned<LinColor> {
        self.canvas.surface()
    }

    /// Encode rendered surface as PNG
    #[cfg(feature = "png")]
    pub fn write_png(&self, out: impl std::io::Write) -> Result<(), Error> {
        crate::image::write_png(self.canvas.surface(), out)
    }

    /// Number of frames rendered so far
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Called once after the first frame is rendered
    pub fn set_render_callback(&mut self, callback: impl FnMut(&Document) + 'static) {
        self.render_callback = Some(Box::new(callback));
    }

    /// Polled on every tick, returning `true` forces a redraw
    pub fn set_force_redraw(&mut self, predicate: impl FnMut() -> bool + 'static) {
        self.force_redraw = Some(Box::new(predicate));
    }

    /// Deliver content of an image that was pending
    pub fn complete_image(&mut self, id: NodeId, data: Result<Vec<u8>, Error>) {
        let ElementKind::Image { href, is_svg } = self.doc.element(id).kind() else {
            return;
        };
        let log = self.options.log;
        let state = match data {
            Ok(data) => decode_image(href, *is_svg, data, log),
            Err(error) => {
                diagnostic!(log, href = %href, %error, "failed to load image");
                ImageState::Failed
            }
        };
        self.images.insert(id, state);
    }

    /// Whether every image finished loading, failed ones included
    pub fn images_loaded(&self) -> bool {
        self.images.values().all(ImageState::is_loaded)
    }

    pub fn on_click(&mut self, x: Scalar, y: Scalar) {
        if !self.options.ignore_mouse {
            self.mouse.on_click(x, y);
        }
    }

    pub fn on_mouse_move(&mut self, x: Scalar, y: Scalar) {
        if !self.options.ignore_mouse {
            self.mouse.on_mouse_move(x, y);
        }
    }

    /// Register handler invoked when an event reaches the element
    ///
    /// Events are delivered to the topmost element under the pointer and then to
    /// each of its ancestors.
    pub fn on(
        &mut self,
        id: NodeId,
        kind: EventKind,
        handler: impl FnMut(NodeId, &PointerEvent) + 'static,
    ) {
        self.handlers
            .entry((id, kind))
            .or_default()
            .push(Box::new(handler));
    }

    /// Cursor requested by the element under the pointer, empty for the default one
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// Links activated by clicks since the last call
    pub fn take_navigations(&mut self) -> Vec<String> {
        std::mem::take(&mut self.navigations)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop the scheduler, later ticks do nothing
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance the scheduler by `delta` milliseconds
    ///
    /// A frame is rendered only if images finished loading, pointer events are
    /// pending, an animation changed its target or the redraw predicate asks for
    /// it. Returns whether a frame was rendered.
    pub fn tick(&mut self, delta: Scalar) -> bool {
        if !self.running {
            return false;
        }
        let mut update = false;
        if self.waiting_for_images && self.images_loaded() {
            self.waiting_for_images = false;
            update = true;
        }
        if !self.options.ignore_mouse {
            update |= self.mouse.has_events();
        }
        if !self.options.ignore_animation {
            let mut animations = self.doc.take_animations();
            for animation in animations.iter_mut() {
                update |= animation.update(&mut self.doc, delta);
            }
            self.doc.restore_animations(animations);
        }
        if let Some(force_redraw) = self.force_redraw.as_mut() {
            update |= force_redraw();
        }
        if update {
            self.draw();
            self.run_events();
        }
        update
    }

    /// Run up to `frames` scheduler ticks at the fixed frame interval
    pub fn run(&mut self, frames: usize) -> usize {
        let mut rendered = 0;
        for _ in 0..frames {
            if !self.running {
                break;
            }
            if self.tick(FRAME_INTERVAL) {
                rendered += 1;
            }
        }
        rendered
    }

    /// Render a frame unconditionally
    pub fn draw(&mut self) {
        let mouse = (!self.options.ignore_mouse).then_some(&mut self.mouse);
        self.session.draw(
            &mut self.doc,
            &self.options,
            &mut self.canvas,
            mouse,
            &self.images,
            self.loader.as_ref(),
        );
        self.frames += 1;
        if self.frames == 1 {
            if let Some(callback) = self.render_callback.as_mut() {
                callback(&self.doc);
            }
        }
    }

    /// Dispatch pointer events resolved by the last frame
    fn run_events(&mut self) {
        self.cursor.clear();
        for event in self.mouse.take_events() {
            let Some(target) = event.target else {
                continue;
            };
            let chain: Vec<NodeId> = self.doc.ancestors(target).collect();
            for id in chain {
                if let Some(handlers) = self.handlers.get_mut(&(id, event.kind)) {
                    for handler in handlers.iter_mut() {
                        handler(id, &event);
                    }
                }
                let elem = self.doc.element(id);
                if let ElementKind::A { .. } = elem.kind() {
                    match event.kind {
                        EventKind::Click => self.navigations.push(elem.href().value().to_owned()),
                        EventKind::MouseMove => self.cursor = "pointer".to_owned(),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, Image, RGBA};
    use std::{cell::RefCell, rc::Rc};

    struct NoLoader;

    impl ResourceLoader for NoLoader {
        fn load(&self, _url: &str, _cross_origin: bool) -> Result<Resource, Error> {
            Ok(Resource::Pending)
        }
    }

    struct MemLoader(HashMap<String, Vec<u8>>);

    impl ResourceLoader for MemLoader {
        fn load(&self, url: &str, _cross_origin: bool) -> Result<Resource, Error> {
            match self.0.get(url) {
                Some(data) => Ok(Resource::Ready(data.clone())),
                None => Err(Error::IoError(std::io::ErrorKind::NotFound.into())),
            }
        }
    }

    fn renderer(text: &str) -> Renderer {
        Renderer::from_str(text, Options::default(), NoLoader).expect("valid document")
    }

    fn pixel(renderer: &Renderer, x: usize, y: usize) -> RGBA {
        (*renderer.surface().get(y, x).expect("in bounds")).into()
    }

    #[test]
    fn test_rect_frame() {
        let mut renderer = renderer(
            r##"<svg width="100" height="100"><rect id="r" x="0" y="0" width="50" height="50" fill="#ff0000"/></svg>"##,
        );
        assert!(renderer.tick(FRAME_INTERVAL));
        assert_eq!(renderer.surface().width(), 100);
        assert_eq!(pixel(&renderer, 25, 25), RGBA::new(255, 0, 0, 255));
        assert_eq!(pixel(&renderer, 49, 49), RGBA::new(255, 0, 0, 255));
        assert_eq!(pixel(&renderer, 50, 50).alpha(), 0);
        // nothing changed, no redraw
        assert!(!renderer.tick(FRAME_INTERVAL));
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn test_view_box_scale() {
        let mut renderer = renderer(
            r##"<svg width="200" height="100" viewBox="0 0 100 50"><rect x="10" y="10" width="10" height="10" fill="#000"/></svg>"##,
        );
        renderer.tick(FRAME_INTERVAL);
        assert_eq!(pixel(&renderer, 21, 21).alpha(), 255);
        assert_eq!(pixel(&renderer, 38, 38).alpha(), 255);
        assert_eq!(pixel(&renderer, 19, 19).alpha(), 0);
        assert_eq!(pixel(&renderer, 41, 41).alpha(), 0);
    }

    #[test]
    fn test_ignore_dimensions() {
        let options = Options {
            ignore_dimensions: true,
            width: 40,
            height: 30,
            ..Options::default()
        };
        let mut renderer =
            Renderer::from_str(r#"<svg width="100" height="100"/>"#, options, NoLoader)
                .expect("valid document");
        renderer.tick(FRAME_INTERVAL);
        assert_eq!(renderer.surface().width(), 40);
        assert_eq!(renderer.surface().height(), 30);
    }

    #[test]
    fn test_offset_and_scale() {
        let options = Options {
            offset_x: Some(10.0),
            scale_width: Some(20.0),
            ignore_dimensions: true,
            width: 50,
            height: 50,
            ..Options::default()
        };
        let mut renderer = Renderer::from_str(
            r##"<svg width="40" height="40"><rect width="40" height="40" fill="#000"/></svg>"##,
            options,
            NoLoader,
        )
        .expect("valid document");
        renderer.draw();
        renderer.draw();
        // scaled by one half once, then moved by the offset
        assert_eq!(pixel(&renderer, 11, 1).alpha(), 255);
        assert_eq!(pixel(&renderer, 29, 19).alpha(), 255);
        assert_eq!(pixel(&renderer, 31, 5).alpha(), 0);
        assert_eq!(pixel(&renderer, 5, 5).alpha(), 0);
        assert_eq!(pixel(&renderer, 15, 21).alpha(), 0);
    }

    #[test]
    fn test_animation_frames() {
        let mut renderer = renderer(
            r#"<svg width="10" height="10"><rect id="r" width="0" height="10"><animate attributeName="width" from="0" to="100" dur="1000ms"/></rect></svg>"#,
        );
        assert_eq!(renderer.run(15), 15);
        let doc = renderer.document();
        let rect = doc.element_by_id("r").expect("rect exists");
        let width = rect.attribute("width").num_value();
        assert_approx_eq!(width, 50.0, 1e-6);
        renderer.stop();
        assert_eq!(renderer.run(10), 0);
    }

    #[test]
    fn test_events_and_cursor() {
        let mut renderer = renderer(
            r##"<svg width="100" height="100">
                <g id="g"><rect id="r" width="50" height="50" fill="#f00"/></g>
                <a id="link" href="https://example.com"><rect width="10" height="10" x="80" y="80"/></a>
            </svg>"##,
        );
        let doc = renderer.document();
        let rect = doc.element_by_id("r").and_then(|e| e.id()).expect("rect");
        let group = doc.element_by_id("g").and_then(|e| e.id()).expect("group");
        let seen = Rc::new(RefCell::new(Vec::new()));
        for id in [rect, group] {
            let seen = seen.clone();
            renderer.on(id, EventKind::Click, move |id, event| {
                seen.borrow_mut().push((id, event.target))
            });
        }
        renderer.tick(FRAME_INTERVAL);

        renderer.on_click(10.0, 10.0);
        renderer.on_click(70.0, 70.0);
        assert!(renderer.tick(FRAME_INTERVAL));
        assert_eq!(
            *seen.borrow(),
            vec![(rect, Some(rect)), (group, Some(rect))]
        );
        assert_eq!(renderer.cursor(), "");

        renderer.on_mouse_move(85.0, 85.0);
        renderer.on_click(85.0, 85.0);
        renderer.tick(FRAME_INTERVAL);
        assert_eq!(renderer.cursor(), "pointer");
        assert_eq!(renderer.take_navigations(), vec!["https://example.com".to_owned()]);

        renderer.on_mouse_move(5.0, 95.0);
        renderer.tick(FRAME_INTERVAL);
        assert_eq!(renderer.cursor(), "");
    }

    #[test]
    fn test_from_document() -> Result<(), Error> {
        let xml = roxmltree::Document::parse(
            r##"<svg width="20" height="20"><rect id="r" width="20" height="20" fill="#00f"/></svg>"##,
        )?;
        let mut renderer = Renderer::from_document(&xml, Options::default(), NoLoader)?;
        assert!(renderer.is_running());
        let rect = renderer
            .document()
            .element_by_id("r")
            .and_then(|elem| elem.id())
            .expect("rect exists");
        renderer
            .document_mut()
            .element_mut(rect)
            .set_attribute("fill", "#0f0");
        renderer.draw();
        assert_eq!(pixel(&renderer, 10, 10), RGBA::new(0, 255, 0, 255));
        Ok(())
    }

    #[test]
    fn test_pending_images() {
        let mut renderer = renderer(
            r#"<svg width="10" height="10"><image id="i" href="a.png" width="10" height="10"/></svg>"#,
        );
        let callbacks = Rc::new(RefCell::new(0));
        {
            let callbacks = callbacks.clone();
            renderer.set_render_callback(move |_| *callbacks.borrow_mut() += 1);
        }
        assert!(!renderer.images_loaded());
        assert!(!renderer.tick(FRAME_INTERVAL));
        let image = renderer.document().images()[0];
        renderer.complete_image(image, Err(Error::IoError(std::io::ErrorKind::NotFound.into())));
        assert!(renderer.images_loaded());
        assert!(renderer.tick(FRAME_INTERVAL));
        renderer.set_force_redraw(|| true);
        assert!(renderer.tick(FRAME_INTERVAL));
        assert_eq!(*callbacks.borrow(), 1);
    }

    #[cfg(feature = "png")]
    #[test]
    fn test_raster_and_nested_images() -> Result<(), Error> {
        let color: LinColor = RGBA::new(0, 0, 255, 255).into();
        let mut png = Vec::new();
        crate::image::write_png(&ImageOwned::new_with(2, 2, |_, _| color), &mut png)?;
        let nested = br##"<svg width="10" height="10"><rect width="10" height="10" fill="#0f0"/></svg>"##;
        let loader = MemLoader(
            [
                ("blue.png".to_owned(), png),
                ("green.svg".to_owned(), nested.to_vec()),
            ]
            .into_iter()
            .collect(),
        );
        let mut renderer = Renderer::from_str(
            r#"<svg width="40" height="20">
                <image href="blue.png" width="20" height="20" preserveAspectRatio="none"/>
                <image href="green.svg" x="20" width="20" height="20"/>
                <image href="missing.png" width="20" height="20"/>
            </svg>"#,
            Options::default(),
            loader,
        )?;
        assert!(renderer.images_loaded());
        renderer.tick(FRAME_INTERVAL);
        assert_eq!(pixel(&renderer, 10, 10), RGBA::new(0, 0, 255, 255));
        assert_eq!(pixel(&renderer, 30, 10), RGBA::new(0, 255, 0, 255));
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_options_json() -> Result<(), Error> {
        let options = Options::from_json(
            r#"{"ignoreMouse": true, "scaleWidth": 200, "useCORS": true, "width": 64}"#,
        )?;
        assert!(options.ignore_mouse);
        assert!(options.use_cors);
        assert_eq!(options.scale_width, Some(200.0));
        assert_eq!(options.width, 64);
        assert_eq!(options.height, 150);
        assert!(!options.ignore_clear);
        Ok(())
    }
}
