//! Software 2D painter with the semantics of a canvas rendering context
//!
//! Geometry is transformed into device space as it is added to the current path,
//! fills and strokes are rasterized into coverage masks and composited onto the
//! premultiplied linear color surface.
use crate::{
    rasterize::rasterize_lines, Color, EllipArc, FillRule, Font, Image, ImageMut, ImageOwned,
    LineCap, LineJoin, LinColor, Mask, Paint, Path, PathBuilder, Pattern, Point, Scalar,
    StrokeStyle, Transform, DEFAULT_FLATNESS, EPSILON, RGBA,
};
use std::rc::Rc;

/// Largest size of the canvas side in pixels
pub const MAX_CANVAS_SIZE: usize = 8192;

/// Convert length in pixels into a canvas size, non-finite and negative values are empty
pub fn canvas_size(value: Scalar) -> usize {
    if value.is_finite() && value > 0.0 {
        (value as usize).min(MAX_CANVAS_SIZE)
    } else {
        0
    }
}

/// Global composite operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composite {
    #[default]
    SourceOver,
    DestinationIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Start,
    End,
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    #[default]
    Alphabetic,
    Top,
    Hanging,
    Middle,
    Ideographic,
    Bottom,
}

#[derive(Debug, Clone)]
struct CanvasState {
    transform: Transform,
    fill: Paint,
    stroke: Paint,
    stroke_style: StrokeStyle,
    global_alpha: Scalar,
    composite: Composite,
    clip: Option<Rc<Mask>>,
    font: Font,
    text_align: TextAlign,
    text_baseline: TextBaseline,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            fill: Paint::Solid(RGBA::new(0, 0, 0, 255)),
            stroke: Paint::transparent(),
            stroke_style: StrokeStyle::default(),
            global_alpha: 1.0,
            composite: Composite::default(),
            clip: None,
            font: Font::default(),
            text_align: TextAlign::default(),
            text_baseline: TextBaseline::default(),
        }
    }
}

/// Raster surface together with the painter state
#[derive(Debug, Clone)]
pub struct Canvas {
    surface: ImageOwned<LinColor>,
    state: CanvasState,
    stack: Vec<CanvasState>,
    path: PathBuilder,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            surface: ImageOwned::new_default(height, width),
            state: CanvasState::default(),
            stack: Vec::new(),
            path: PathBuilder::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.surface.width()
    }

    pub fn height(&self) -> usize {
        self.surface.height()
    }

    pub fn surface(&self) -> &ImageOwned<LinColor> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut ImageOwned<LinColor> {
        &mut self.surface
    }

    /// Take surface out of the canvas leaving an empty surface of the same size
    pub fn take_surface(&mut self) -> ImageOwned<LinColor> {
        let empty = ImageOwned::new_default(self.height(), self.width());
        std::mem::replace(&mut self.surface, empty)
    }

    /// Change size of the canvas, this clears the surface and resets the state
    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    pub fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    pub fn fill_paint(&self) -> &Paint {
        &self.state.fill
    }

    pub fn set_fill_paint(&mut self, paint: impl Into<Paint>) {
        self.state.fill = paint.into();
    }

    pub fn stroke_paint(&self) -> &Paint {
        &self.state.stroke
    }

    pub fn set_stroke_paint(&mut self, paint: impl Into<Paint>) {
        self.state.stroke = paint.into();
    }

    pub fn line_width(&self) -> Scalar {
        self.state.stroke_style.width
    }

    /// Set line width, non-positive and non-finite values are ignored
    pub fn set_line_width(&mut self, width: Scalar) {
        if width.is_finite() && width > 0.0 {
            self.state.stroke_style.width = width;
        }
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.state.stroke_style.line_cap = cap;
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.state.stroke_style.line_join = join;
    }

    pub fn set_miter_limit(&mut self, limit: Scalar) {
        if limit.is_finite() && limit > 0.0 {
            self.state.stroke_style.miter_limit = limit;
        }
    }

    /// Set dash pattern, odd length lists are repeated to become even, invalid lists are ignored
    pub fn set_line_dash(&mut self, dash: Vec<Scalar>) {
        if dash.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return;
        }
        let dash = if dash.len() % 2 == 1 {
            dash.iter().chain(dash.iter()).copied().collect()
        } else {
            dash
        };
        self.state.stroke_style.dash = dash;
    }

    pub fn line_dash(&self) -> &[Scalar] {
        &self.state.stroke_style.dash
    }

    pub fn set_line_dash_offset(&mut self, offset: Scalar) {
        if offset.is_finite() {
            self.state.stroke_style.dash_offset = offset;
        }
    }

    pub fn global_alpha(&self) -> Scalar {
        self.state.global_alpha
    }

    /// Set global alpha, values outside of `[0, 1]` are ignored
    pub fn set_global_alpha(&mut self, alpha: Scalar) {
        if (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    pub fn set_composite(&mut self, composite: Composite) {
        self.state.composite = composite;
    }

    pub fn font(&self) -> &Font {
        &self.state.font
    }

    pub fn set_font(&mut self, font: Font) {
        self.state.font = font;
    }

    pub fn set_text_align(&mut self, align: TextAlign) {
        self.state.text_align = align;
    }

    pub fn text_baseline(&self) -> TextBaseline {
        self.state.text_baseline
    }

    pub fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state.text_baseline = baseline;
    }

    // -------------------------------------------------------------------------
    // Transformation
    // -------------------------------------------------------------------------

    pub fn current_transform(&self) -> Transform {
        self.state.transform
    }

    pub fn set_transform(&mut self, tr: Transform) {
        self.state.transform = tr;
    }

    pub fn translate(&mut self, tx: Scalar, ty: Scalar) {
        self.state.transform = self.state.transform.translate(tx, ty);
    }

    pub fn scale(&mut self, sx: Scalar, sy: Scalar) {
        self.state.transform = self.state.transform.scale(sx, sy);
    }

    pub fn rotate(&mut self, angle: Scalar) {
        self.state.transform = self.state.transform.rotate(angle);
    }

    /// Multiply current transformation by `matrix(a b c d e f)`
    pub fn transform(&mut self, a: Scalar, b: Scalar, c: Scalar, d: Scalar, e: Scalar, f: Scalar) {
        self.state.transform = self.state.transform * Transform::new(a, b, c, d, e, f);
    }

    // -------------------------------------------------------------------------
    // Path construction
    // -------------------------------------------------------------------------

    pub fn begin_path(&mut self) {
        self.path.clear();
    }

    pub fn move_to(&mut self, x: Scalar, y: Scalar) {
        let p = self.state.transform.apply(Point::new(x, y));
        self.path.move_to(p);
    }

    pub fn line_to(&mut self, x: Scalar, y: Scalar) {
        let p = self.state.transform.apply(Point::new(x, y));
        self.path.line_to(p);
    }

    pub fn quadratic_curve_to(&mut self, x1: Scalar, y1: Scalar, x: Scalar, y: Scalar) {
        let tr = self.state.transform;
        self.path
            .quad_to(tr.apply(Point::new(x1, y1)), tr.apply(Point::new(x, y)));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn bezier_curve_to(
        &mut self,
        x1: Scalar,
        y1: Scalar,
        x2: Scalar,
        y2: Scalar,
        x: Scalar,
        y: Scalar,
    ) {
        let tr = self.state.transform;
        self.path.cubic_to(
            tr.apply(Point::new(x1, y1)),
            tr.apply(Point::new(x2, y2)),
            tr.apply(Point::new(x, y)),
        );
    }

    /// Circular arc, connected with a line to the current point if there is one
    pub fn arc(
        &mut self,
        cx: Scalar,
        cy: Scalar,
        radius: Scalar,
        start: Scalar,
        end: Scalar,
        anticlockwise: bool,
    ) {
        if !(radius >= 0.0) {
            return;
        }
        let arc = EllipArc::new_circle(Point::new(cx, cy), radius, start, end, anticlockwise);
        self.path.arc(arc, self.state.transform);
    }

    pub fn close_path(&mut self) {
        self.path.close();
    }

    pub fn rect(&mut self, x: Scalar, y: Scalar, width: Scalar, height: Scalar) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close_path();
        self.move_to(x, y);
    }

    /// Current path in device coordinates
    pub fn path(&self) -> Path {
        self.path.to_path()
    }

    /// Whether device space point is inside of the current path
    pub fn is_point_in_path(&self, x: Scalar, y: Scalar) -> bool {
        self.path
            .to_path()
            .contains(Point::new(x, y), FillRule::NonZero)
    }

    // -------------------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------------------

    /// Fill current path with the fill paint
    pub fn fill(&mut self, fill_rule: FillRule) {
        let path = self.path.to_path();
        let paint = self.state.fill.clone();
        self.fill_device_path(&path, fill_rule, &paint);
    }

    /// Stroke current path with the stroke paint
    pub fn stroke(&mut self) {
        let path = self.path.to_path();
        let paint = self.state.stroke.clone();
        self.stroke_device_path(&path, &paint);
    }

    /// Intersect clip region with the current path
    pub fn clip(&mut self) {
        let path = self.path.to_path();
        let mut mask = self.rasterize(&path, FillRule::NonZero);
        if let Some(clip) = self.state.clip.as_ref() {
            for (value, clip) in mask.data_mut().iter_mut().zip(clip.data()) {
                *value *= clip;
            }
        }
        self.state.clip = Some(Rc::new(mask));
    }

    pub fn fill_rect(&mut self, x: Scalar, y: Scalar, width: Scalar, height: Scalar) {
        let path = self.rect_path(x, y, width, height);
        let paint = self.state.fill.clone();
        self.fill_device_path(&path, FillRule::NonZero, &paint);
    }

    /// Make pixels covered by the rectangle transparent
    pub fn clear_rect(&mut self, x: Scalar, y: Scalar, width: Scalar, height: Scalar) {
        let path = self.rect_path(x, y, width, height);
        let mask = self.rasterize(&path, FillRule::NonZero);
        let clip = self.state.clip.clone();
        let shape = self.surface.shape();
        let data = self.surface.data_mut();
        for row in 0..shape.height {
            for col in 0..shape.width {
                let offset = shape.offset(row, col);
                let mut coverage = mask.data()[row * shape.width + col];
                if let Some(clip) = clip.as_ref() {
                    coverage *= clip.data()[row * shape.width + col];
                }
                if coverage > 0.0 {
                    data[offset] = data[offset] * (1.0 - coverage as f32);
                }
            }
        }
    }

    /// Draw image with its top left corner at `(x, y)` in user coordinates
    pub fn draw_image(&mut self, image: Rc<ImageOwned<LinColor>>, x: Scalar, y: Scalar) {
        let (width, height) = (image.width() as Scalar, image.height() as Scalar);
        let paint = Paint::Pattern(Pattern::new(
            image,
            false,
            Transform::identity().translate(x, y),
        ));
        let path = self.rect_path(x, y, width, height);
        self.fill_device_path(&path, FillRule::NonZero, &paint);
    }

    /// Width of the text as reported by the text measurement collaborator
    pub fn measure_text(&self, text: &str) -> Scalar {
        text.chars().count() as Scalar * self.state.font.size_px() * 0.5
    }

    /// Fill text, each visible character is drawn as a box glyph
    pub fn fill_text(&mut self, text: &str, x: Scalar, y: Scalar) {
        let path = self.text_path(text, x, y);
        let paint = self.state.fill.clone();
        self.fill_device_path(&path, FillRule::NonZero, &paint);
    }

    /// Stroke outlines of the box glyphs
    pub fn stroke_text(&mut self, text: &str, x: Scalar, y: Scalar) {
        let path = self.text_path(text, x, y);
        let paint = self.state.stroke.clone();
        self.stroke_device_path(&path, &paint);
    }

    fn text_path(&self, text: &str, x: Scalar, y: Scalar) -> Path {
        let size = self.state.font.size_px();
        let width = self.measure_text(text);
        let x = match self.state.text_align {
            TextAlign::Start | TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::End | TextAlign::Right => x - width,
        };
        let top = match self.state.text_baseline {
            TextBaseline::Alphabetic | TextBaseline::Ideographic | TextBaseline::Bottom => {
                y - 0.7 * size
            }
            TextBaseline::Top | TextBaseline::Hanging => y,
            TextBaseline::Middle => y - 0.35 * size,
        };
        let tr = self.state.transform;
        let mut builder = PathBuilder::new();
        for (index, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let x0 = x + (index as Scalar + 0.1) * size * 0.5;
            let x1 = x0 + 0.4 * size;
            builder
                .move_to(tr.apply(Point::new(x0, top)))
                .line_to(tr.apply(Point::new(x1, top)))
                .line_to(tr.apply(Point::new(x1, top + 0.7 * size)))
                .line_to(tr.apply(Point::new(x0, top + 0.7 * size)))
                .close();
        }
        builder.to_path()
    }

    fn rect_path(&self, x: Scalar, y: Scalar, width: Scalar, height: Scalar) -> Path {
        let tr = self.state.transform;
        let mut builder = PathBuilder::new();
        builder
            .move_to(tr.apply(Point::new(x, y)))
            .line_to(tr.apply(Point::new(x + width, y)))
            .line_to(tr.apply(Point::new(x + width, y + height)))
            .line_to(tr.apply(Point::new(x, y + height)))
            .close();
        builder.to_path()
    }

    fn rasterize(&self, path: &Path, fill_rule: FillRule) -> Mask {
        let polylines = path.flatten(Transform::identity(), DEFAULT_FLATNESS);
        rasterize_lines(
            polylines.iter().flat_map(|polyline| polyline.lines(true)),
            self.width(),
            self.height(),
            fill_rule,
        )
    }

    fn fill_device_path(&mut self, path: &Path, fill_rule: FillRule, paint: &Paint) {
        if path.is_empty() {
            return;
        }
        let mask = self.rasterize(path, fill_rule);
        self.composite_mask(&mask, paint);
    }

    fn stroke_device_path(&mut self, path: &Path, paint: &Paint) {
        if path.is_empty() || paint.is_transparent() {
            return;
        }
        let tr = self.state.transform;
        let Some(inverse) = tr.invert() else {
            return;
        };
        let scale = tr.scale_factor();
        if !(scale > EPSILON) {
            return;
        }
        // stroke is constructed in the user space and mapped back into the device space
        let polygons = path.transform(inverse).stroke(
            &self.state.stroke_style,
            Transform::identity(),
            DEFAULT_FLATNESS / scale,
        );
        let lines = polygons.iter().flat_map(|polygon| {
            let count = polygon.len();
            (0..count).map(move |index| {
                crate::Line::new(
                    tr.apply(polygon[index]),
                    tr.apply(polygon[(index + 1) % count]),
                )
            })
        });
        let mask = rasterize_lines(lines, self.width(), self.height(), FillRule::NonZero);
        self.composite_mask(&mask, paint);
    }

    /// Composite paint through the coverage mask onto the surface
    fn composite_mask(&mut self, mask: &Mask, paint: &Paint) {
        let alpha = self.state.global_alpha as f32;
        let composite = self.state.composite;
        if composite == Composite::SourceOver && (paint.is_transparent() || alpha <= 0.0) {
            return;
        }
        let solid: Option<LinColor> = paint.solid().map(LinColor::from);
        let inverse = if solid.is_some() {
            Some(Transform::identity())
        } else {
            (self.state.transform * paint.transform()).invert()
        };
        let Some(inverse) = inverse else {
            return;
        };
        let clip = self.state.clip.clone();
        let shape = self.surface.shape();
        let data = self.surface.data_mut();
        for row in 0..shape.height {
            for col in 0..shape.width {
                let index = row * shape.width + col;
                let mut coverage = mask.data()[index] as f32;
                if let Some(clip) = clip.as_ref() {
                    let clip = clip.data()[index] as f32;
                    if clip <= 0.0 {
                        continue;
                    }
                    coverage *= clip;
                }
                let offset = shape.offset(row, col);
                match composite {
                    Composite::SourceOver => {
                        if coverage <= 0.0 {
                            continue;
                        }
                        let color = match solid {
                            Some(color) => color,
                            None => paint.at(
                                inverse.apply(Point::new(col as Scalar + 0.5, row as Scalar + 0.5)),
                            ),
                        };
                        data[offset] = data[offset].blend_over(color * (coverage * alpha));
                    }
                    Composite::DestinationIn => {
                        let source_alpha = if coverage <= 0.0 {
                            0.0
                        } else {
                            let color = match solid {
                                Some(color) => color,
                                None => paint.at(inverse.apply(Point::new(
                                    col as Scalar + 0.5,
                                    row as Scalar + 0.5,
                                ))),
                            };
                            color.alpha() * coverage * alpha
                        };
                        data[offset] = data[offset] * source_alpha;
                    }
                }
            }
        }
    }
}
