//! Masks, clip paths and filter effects
//!
//! Masks and filters render the element into offscreen canvases sized in user
//! units and composite the result back with a pattern fill.
use crate::{
    canvas::canvas_size,
    grad::{lin_to_srgb_components, srgb_components_to_lin},
    render::{render, RenderContext},
    shape::{self, PathMode},
    transform::TransformList,
    Axis, BBox, Canvas, Composite, Element, ElementKind, Image, ImageMut, ImageOwned,
    LinColor, Paint, Pattern, Scalar, Transform,
};
use std::rc::Rc;

/// Render element through the `mask` definition
///
/// Only the alpha of the rendered mask content is used.
pub(crate) fn apply_mask(
    cx: &mut RenderContext<'_>,
    mask: &Element,
    elem: &Element,
    canvas: &mut Canvas,
) {
    let Some(id) = elem.id() else {
        return;
    };
    let metrics = cx.metrics(canvas);
    let length = |name: &str, axis| mask.attribute(name).to_pixels(&metrics, axis, false);
    let (mut x, mut y) = (length("x", Axis::X), length("y", Axis::Y));
    let (mut width, mut height) = (length("width", Axis::X), length("height", Axis::Y));
    if width == 0.0 && height == 0.0 {
        let bbox = mask.children().iter().fold(BBox::empty(), |acc, child| {
            acc.union(shape::bbox(cx, cx.element(*child), &metrics))
        });
        x = bbox.x().floor();
        y = bbox.y().floor();
        width = bbox.width().floor();
        height = bbox.height().floor();
    }
    let (right, bottom) = (x + width, y + height);

    cx.scope.suppressed.push((id, "mask"));
    let mut mask_canvas = Canvas::new(canvas_size(right), canvas_size(bottom));
    for child in mask.children() {
        let child = cx.element(*child);
        render(cx, child, &mut mask_canvas);
    }
    let mut content = Canvas::new(canvas_size(right), canvas_size(bottom));
    render(cx, elem, &mut content);
    cx.scope.suppressed.pop();

    content.set_composite(Composite::DestinationIn);
    content.set_fill_paint(offscreen_paint(mask_canvas));
    content.fill_rect(0.0, 0.0, right, bottom);

    canvas.set_fill_paint(offscreen_paint(content));
    canvas.fill_rect(0.0, 0.0, right, bottom);
}

/// Non repeating pattern paint of the rendered offscreen canvas
fn offscreen_paint(mut canvas: Canvas) -> Paint {
    Paint::Pattern(Pattern::new(
        Rc::new(canvas.take_surface()),
        false,
        Transform::identity(),
    ))
}

/// Intersect the clip region of the canvas with the geometry of the `clipPath`
///
/// Geometry of all children is recorded into a single path, each child with its
/// own transform.
pub(crate) fn apply_clip(cx: &mut RenderContext<'_>, clip: &Element, canvas: &mut Canvas) {
    let metrics = cx.metrics(canvas);
    canvas.begin_path();
    for child in clip.children() {
        let child = cx.element(*child);
        if !child.kind().is_path() {
            continue;
        }
        let transform = cx.own_style(child, "transform");
        let transform = transform
            .has_value()
            .then(|| TransformList::parse(transform.value()));
        if let Some(transform) = &transform {
            transform.apply(canvas);
        }
        shape::path(cx, child, &metrics, Some(&mut *canvas), PathMode::Record);
        if let Some(transform) = &transform {
            transform.unapply(canvas);
        }
    }
    canvas.close_path();
    canvas.clip();
}

/// Render element through the primitives of the `filter` definition
pub(crate) fn apply_filter(
    cx: &mut RenderContext<'_>,
    filter: &Element,
    elem: &Element,
    canvas: &mut Canvas,
) {
    let Some(id) = elem.id() else {
        return;
    };
    let metrics = cx.metrics(canvas);
    let bbox = shape::bbox(cx, elem, &metrics);
    if bbox.is_empty() {
        return;
    }
    let (x, y) = (bbox.x().floor(), bbox.y().floor());
    let (width, height) = (bbox.width().floor(), bbox.height().floor());
    // blur needs a margin around the content
    let padding = filter
        .children()
        .iter()
        .filter_map(|child| match cx.element(*child).kind() {
            ElementKind::FeGaussianBlur { radius } => Some(*radius),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    let pad = padding as Scalar;

    cx.scope.suppressed.push((id, "filter"));
    let mut offscreen = Canvas::new(
        canvas_size(width + 2.0 * pad),
        canvas_size(height + 2.0 * pad),
    );
    offscreen.translate(-x + pad, -y + pad);
    render(cx, elem, &mut offscreen);
    cx.scope.suppressed.pop();

    for child in filter.children() {
        let child = cx.element(*child);
        match child.kind() {
            ElementKind::FeColorMatrix { matrix } => {
                color_matrix(offscreen.surface_mut(), matrix)
            }
            ElementKind::FeGaussianBlur { radius } => stack_blur(offscreen.surface_mut(), *radius),
            ElementKind::FeMorphology | ElementKind::FeComposite => {
                diagnostic!(cx.log(), primitive = child.tag(), "filter primitive is not implemented")
            }
            _ => diagnostic!(cx.log(), primitive = child.tag(), "unsupported filter primitive"),
        }
    }
    canvas.draw_image(Rc::new(offscreen.take_surface()), x - pad, y - pad);
}

/// Apply 4x5 color matrix in the 8-bit sRGB space
///
/// Negative coefficients are applied to the inverted channel value.
pub(crate) fn color_matrix(image: &mut ImageOwned<LinColor>, matrix: &[Scalar; 20]) {
    let m = |index: usize, value: f32| -> f32 {
        let coeff = matrix[index] as f32;
        coeff * if coeff < 0.0 { value - 255.0 } else { value }
    };
    for pixel in image.data_mut().iter_mut() {
        let [r, g, b, a] = lin_to_srgb_components(*pixel);
        let row = |offset: usize| -> f32 {
            let value = m(offset, r) + m(offset + 1, g) + m(offset + 2, b) + m(offset + 3, a)
                + m(offset + 4, 1.0);
            if value.is_nan() {
                0.0
            } else {
                value.clamp(0.0, 255.0).round()
            }
        };
        *pixel = srgb_components_to_lin([row(0), row(5), row(10), row(15)]);
    }
}

/// Stack blur with the given radius
///
/// Equivalent to two passes of a box blur, implemented as a separable
/// convolution with triangular weights `r + 1 - |i|`. Pixels outside of the
/// image repeat the edge pixel.
pub(crate) fn stack_blur(image: &mut ImageOwned<LinColor>, radius: usize) {
    if radius == 0 {
        return;
    }
    let shape = image.shape();
    let (width, height) = (shape.width, shape.height);
    if width == 0 || height == 0 {
        return;
    }
    let weights: Vec<f32> = (0..=2 * radius)
        .map(|index| (radius + 1 - index.abs_diff(radius)) as f32)
        .collect();
    let norm = 1.0 / ((radius + 1) * (radius + 1)) as f32;
    let blur_line = |line: &[LinColor], output: &mut Vec<LinColor>| {
        output.clear();
        let last = line.len() - 1;
        for center in 0..line.len() {
            let mut acc = LinColor::transparent();
            for (index, weight) in weights.iter().enumerate() {
                let pos = (center + index).saturating_sub(radius).min(last);
                acc = acc + line[pos] * *weight;
            }
            output.push(acc * norm);
        }
    };

    let mut line = Vec::with_capacity(width.max(height));
    let mut output = Vec::with_capacity(width.max(height));
    for row in 0..height {
        line.clear();
        line.extend((0..width).map(|col| image.data()[shape.offset(row, col)]));
        blur_line(&line, &mut output);
        for (col, color) in output.iter().enumerate() {
            image.data_mut()[shape.offset(row, col)] = *color;
        }
    }
    for col in 0..width {
        line.clear();
        line.extend((0..height).map(|row| image.data()[shape.offset(row, col)]));
        blur_line(&line, &mut output);
        for (row, color) in output.iter().enumerate() {
            image.data_mut()[shape.offset(row, col)] = *color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assert_approx_eq, renderer::ImageState, Document, Error, NodeId, Resource,
        ResourceLoader, RGBA,
    };
    use std::collections::HashMap;

    struct NoLoader;

    impl ResourceLoader for NoLoader {
        fn load(&self, _url: &str, _cross_origin: bool) -> Result<Resource, Error> {
            Ok(Resource::Pending)
        }
    }

    fn draw(text: &str, width: usize, height: usize) -> Canvas {
        let doc = Document::parse(text, &NoLoader, false).expect("valid document");
        let images: HashMap<NodeId, ImageState> = HashMap::new();
        let mut cx = RenderContext::new(&doc, None, &images, &NoLoader);
        cx.viewport.set_current(width as Scalar, height as Scalar);
        let mut canvas = Canvas::new(width, height);
        render(&mut cx, doc.element(doc.root()), &mut canvas);
        canvas
    }

    fn pixel(canvas: &Canvas, x: usize, y: usize) -> RGBA {
        (*canvas.surface().get(y, x).expect("in bounds")).into()
    }

    #[test]
    fn test_clip_path() {
        let canvas = draw(
            r##"<svg>
                <clipPath id="c">
                    <rect width="5" height="5"/>
                    <rect width="5" height="5" transform="translate(10 10)"/>
                </clipPath>
                <rect width="20" height="20" fill="#f00" clip-path="url(#c)"/>
            </svg>"##,
            20,
            20,
        );
        assert_eq!(pixel(&canvas, 2, 2), RGBA::new(255, 0, 0, 255));
        assert_eq!(pixel(&canvas, 12, 12), RGBA::new(255, 0, 0, 255));
        assert_eq!(pixel(&canvas, 7, 7).alpha(), 0);
        assert_eq!(pixel(&canvas, 12, 2).alpha(), 0);
    }

    #[test]
    fn test_mask() {
        let canvas = draw(
            r##"<svg>
                <mask id="m" x="0" y="0" width="20" height="20">
                    <rect width="10" height="20" fill="#fff"/>
                </mask>
                <rect id="r" width="20" height="20" fill="#0f0" mask="url(#m)"/>
            </svg>"##,
            20,
            20,
        );
        assert_eq!(pixel(&canvas, 5, 10), RGBA::new(0, 255, 0, 255));
        assert_eq!(pixel(&canvas, 15, 10).alpha(), 0);
    }

    #[test]
    fn test_mask_children_bbox() {
        // zero sized region falls back to the bounding box of the mask content
        let canvas = draw(
            r##"<svg>
                <mask id="m"><rect x="2" y="2" width="6" height="6" fill="#fff"/></mask>
                <rect id="r" width="10" height="10" fill="#00f" mask="url(#m)"/>
            </svg>"##,
            10,
            10,
        );
        assert_eq!(pixel(&canvas, 4, 4), RGBA::new(0, 0, 255, 255));
        assert_eq!(pixel(&canvas, 1, 1).alpha(), 0);
    }

    #[test]
    fn test_filter_color_matrix() {
        let canvas = draw(
            r##"<svg>
                <filter id="f"><feColorMatrix type="matrix" values="0 0 0 0 0  1 0 0 0 0  0 0 0 0 0  0 0 0 1 0"/></filter>
                <rect id="r" x="2" y="2" width="6" height="6" fill="#f00" filter="url(#f)"/>
            </svg>"##,
            10,
            10,
        );
        // red channel is moved into green
        assert_eq!(pixel(&canvas, 4, 4), RGBA::new(0, 255, 0, 255));
        assert_eq!(pixel(&canvas, 0, 0).alpha(), 0);
    }

    #[test]
    fn test_color_matrix_negative() {
        let mut image = ImageOwned::new_default(1, 1);
        image.data_mut()[0] = RGBA::new(255, 0, 0, 255).into();
        // negative coefficient inverts the channel: -1 * (0 - 255) = 255
        let mut matrix = [0.0; 20];
        matrix[1] = -1.0;
        matrix[18] = 1.0;
        color_matrix(&mut image, &matrix);
        let color: RGBA = image.data()[0].into();
        assert_eq!(color, RGBA::new(255, 0, 0, 255));
    }

    #[test]
    fn test_stack_blur() {
        let mut image = ImageOwned::new_default(9, 9);
        let white = LinColor::new(1.0, 1.0, 1.0, 1.0);
        let offset = image.shape().offset(4, 4);
        image.data_mut()[offset] = white;
        stack_blur(&mut image, 2);
        let alpha = |row, col| image.get(row, col).map_or(0.0, |c| c.alpha());
        // separable triangular kernel normalized by (r + 1)^2 in each direction
        assert_approx_eq!(alpha(4, 4) as Scalar, 1.0 / 9.0, 1e-6);
        assert_approx_eq!(alpha(4, 5) as Scalar, 2.0 / 81.0 * 3.0, 1e-6);
        assert_approx_eq!(alpha(4, 7) as Scalar, 0.0, 1e-6);
        let total: f32 = image.data().iter().map(|c| c.alpha()).sum();
        assert_approx_eq!(total as Scalar, 1.0, 1e-5);
    }

    #[test]
    fn test_filter_blur_spreads() {
        let canvas = draw(
            r##"<svg>
                <filter id="f"><feGaussianBlur stdDeviation="2"/><feMorphology/></filter>
                <rect id="r" x="5" y="5" width="10" height="10" fill="#000" filter="url(#f)"/>
            </svg>"##,
            20,
            20,
        );
        assert!(pixel(&canvas, 4, 10).alpha() > 0);
        assert_eq!(pixel(&canvas, 10, 10).alpha(), 255);
        assert_eq!(pixel(&canvas, 0, 0).alpha(), 0);
    }
}
