//! Paint sources: solid colors, gradients and image patterns
use crate::{
    color::{linear_to_srgb, srgb_to_linear},
    utils::quadratic_solve,
    Color, Image, ImageOwned, LinColor, Point, Scalar, Transform, RGBA,
};
use std::{cmp::Ordering, rc::Rc};

/// Specifies color at a particular parmeter offset of the gradient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradStop {
    pub position: Scalar,
    pub color: RGBA,
}

impl GradStop {
    pub fn new(position: Scalar, color: RGBA) -> Self {
        Self { position, color }
    }
}

/// List of all `GradStop` in the gradient
///
/// Colors are interpolated in the alpha premultiplied sRGB space, the same
/// way 2D canvas gradients are interpolated.
#[derive(Debug, Clone, Default)]
pub struct GradStops {
    stops: Vec<(Scalar, [f32; 4])>,
}

impl GradStops {
    pub fn new(mut stops: Vec<GradStop>) -> Self {
        stops.sort_by(|s0, s1| {
            s0.position
                .partial_cmp(&s1.position)
                .unwrap_or(Ordering::Greater)
        });
        let stops = stops
            .into_iter()
            .map(|stop| {
                let [r, g, b, a] = stop.color.to_rgba().map(|c| c as f32 / 255.0);
                (stop.position, [r * a, g * a, b * a, a])
            })
            .collect();
        Self { stops }
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Color at the offset, offsets outside of `[0, 1]` are padded
    pub fn at(&self, t: Scalar) -> LinColor {
        let Some(first) = self.stops.first() else {
            return LinColor::transparent();
        };
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let index = self.stops.partition_point(|(position, _)| *position <= t);
        let color = if index == 0 {
            first.1
        } else if index == self.stops.len() {
            self.stops[index - 1].1
        } else {
            let (p0, c0) = self.stops[index - 1];
            let (p1, c1) = self.stops[index];
            let ratio = ((t - p0) / (p1 - p0)) as f32;
            std::array::from_fn(|i| c0[i] * (1.0 - ratio) + c1[i] * ratio)
        };
        srgb_premultiplied_to_linear(color)
    }
}

impl From<Vec<GradStop>> for GradStops {
    fn from(stops: Vec<GradStop>) -> Self {
        Self::new(stops)
    }
}

fn srgb_premultiplied_to_linear([r, g, b, a]: [f32; 4]) -> LinColor {
    if a <= 1e-6 {
        return LinColor::transparent();
    }
    LinColor::new(
        srgb_to_linear(r / a) * a,
        srgb_to_linear(g / a) * a,
        srgb_to_linear(b / a) * a,
        a,
    )
}

/// Linear Gradient
#[derive(Debug, Clone)]
pub struct GradLinear {
    stops: GradStops,
    tr: Transform,
    start: Point,
    // precomputed value equal to `(end - start) / |end - start| ^ 2`
    dir: Point,
}

impl GradLinear {
    pub fn new(
        stops: impl Into<GradStops>,
        tr: Transform,
        start: impl Into<Point>,
        end: impl Into<Point>,
    ) -> Self {
        let start = start.into();
        let end = end.into();
        let dir = end - start;
        Self {
            stops: stops.into(),
            tr,
            start,
            dir: dir / dir.dot(dir),
        }
    }

    pub fn at(&self, point: Point) -> LinColor {
        // t = (point - start).dot(end - start) / |end - start| ^ 2
        let t = (point - self.start).dot(self.dir);
        self.stops.at(t)
    }
}

/// Two point radial gradient with the focal circle `(fcenter, fradius)`
/// and the end circle `(center, radius)`
#[derive(Debug, Clone)]
pub struct GradRadial {
    stops: GradStops,
    tr: Transform,
    center: Point,
    radius: Scalar,
    fcenter: Point,
    fradius: Scalar,
}

impl GradRadial {
    pub fn new(
        stops: impl Into<GradStops>,
        tr: Transform,
        fcenter: impl Into<Point>,
        fradius: Scalar,
        center: impl Into<Point>,
        radius: Scalar,
    ) -> Self {
        Self {
            stops: stops.into(),
            tr,
            center: center.into(),
            radius,
            fcenter: fcenter.into(),
            fradius,
        }
    }

    /// Calculate gradient offset at a given point
    fn offset(&self, point: Point) -> Option<Scalar> {
        // Two circle gradient is an interpolation between two circles (fc, fr) and (c, r),
        // with center `c(t) = (1 - t) * fc + t * c`, and radius `r(t) = (1 - t) * fr + t * r`.
        // If we have a pixel with coordinates `p`, we should solve equation for it
        // `|| c(t) - p || = r(t)` and pick solution corresponding to bigger radius.
        //
        // Solving this equation for `t`:
        //```
        //     || c(t) - p || = r(t)  -> At² - 2Bt + C = 0
        // where:
        //
        //     cd = c - fc
        //     pd = p - fc
        //     rd = r - fr
        //     A = cdx ^ 2 + cdy ^ 2 - rd ^ 2
        //     B = pdx * cdx + pdy * cdy + fradius * rd
        //     C = pdx ^2 + pdy ^ 2 - fradius ^ 2
        // results in:
        //     t = (B +/- (B ^ 2 - A * C).sqrt()) / A
        //```
        // [reference]: https://cgit.freedesktop.org/pixman/tree/pixman/pixman-radial-gradient.c

        let cd = self.center - self.fcenter;
        let pd = point - self.fcenter;
        let rd = self.radius - self.fradius;

        let a = cd.dot(cd) - rd * rd;
        let b = -2.0 * (cd.dot(pd) + self.fradius * rd);
        let c = pd.dot(pd) - self.fradius * self.fradius;

        quadratic_solve(a, b, c)
            .filter(|t| self.fradius + t * rd >= 0.0)
            .fold(None, |acc: Option<Scalar>, t| {
                Some(acc.map_or(t, |acc| acc.max(t)))
            })
    }

    pub fn at(&self, point: Point) -> LinColor {
        match self.offset(point) {
            None => LinColor::transparent(),
            Some(offset) => self.stops.at(offset),
        }
    }
}

/// Image used as a paint, optionally repeated in both directions
#[derive(Debug, Clone)]
pub struct Pattern {
    image: Rc<ImageOwned<LinColor>>,
    repeat: bool,
    tr: Transform,
}

impl Pattern {
    pub fn new(image: Rc<ImageOwned<LinColor>>, repeat: bool, tr: Transform) -> Self {
        Self { image, repeat, tr }
    }

    pub fn image(&self) -> &ImageOwned<LinColor> {
        &self.image
    }

    pub fn at(&self, point: Point) -> LinColor {
        let (width, height) = (self.image.width() as Scalar, self.image.height() as Scalar);
        if !(width > 0.0 && height > 0.0) {
            return LinColor::transparent();
        }
        let (mut x, mut y) = (point.x().floor(), point.y().floor());
        if self.repeat {
            x = x.rem_euclid(width);
            y = y.rem_euclid(height);
        }
        if !(x >= 0.0 && y >= 0.0) {
            return LinColor::transparent();
        }
        self.image
            .get(y as usize, x as usize)
            .copied()
            .unwrap_or_default()
    }
}

/// Source of the color used by fill and stroke operations
#[derive(Debug, Clone)]
pub enum Paint {
    Solid(RGBA),
    Linear(GradLinear),
    Radial(GradRadial),
    Pattern(Pattern),
}

impl Paint {
    /// Fully transparent solid paint
    pub fn transparent() -> Self {
        Paint::Solid(RGBA::new(0, 0, 0, 0))
    }

    /// Color of the paint at the point given in the paint coordinates
    pub fn at(&self, point: Point) -> LinColor {
        match self {
            Paint::Solid(color) => (*color).into(),
            Paint::Linear(grad) => grad.at(point),
            Paint::Radial(grad) => grad.at(point),
            Paint::Pattern(pattern) => pattern.at(point),
        }
    }

    /// Transformation from the paint coordinates to the user coordinates
    pub fn transform(&self) -> Transform {
        match self {
            Paint::Solid(_) => Transform::identity(),
            Paint::Linear(grad) => grad.tr,
            Paint::Radial(grad) => grad.tr,
            Paint::Pattern(pattern) => pattern.tr,
        }
    }

    /// Solid color if this is a solid paint
    pub fn solid(&self) -> Option<RGBA> {
        match self {
            Paint::Solid(color) => Some(*color),
            _ => None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, Paint::Solid(color) if color.alpha() == 0)
    }

    /// Replace alpha of an opaque solid color with `opacity`
    ///
    /// Translucent colors, gradients and patterns are returned unchanged.
    pub fn with_opacity(self, opacity: Scalar) -> Self {
        match self {
            Paint::Solid(color) if color.alpha() == 255 => {
                let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round();
                let alpha = if alpha.is_nan() { 0 } else { alpha as u8 };
                Paint::Solid(RGBA::new(color.red(), color.green(), color.blue(), alpha))
            }
            paint => paint,
        }
    }
}

impl From<RGBA> for Paint {
    fn from(color: RGBA) -> Self {
        Paint::Solid(color)
    }
}

/// Convert linear color back into sRGB component space (used by pixel filters)
pub(crate) fn lin_to_srgb_components(color: LinColor) -> [f32; 4] {
    let [r, g, b, a] = color.unmultiply();
    [
        linear_to_srgb(r) * 255.0,
        linear_to_srgb(g) * 255.0,
        linear_to_srgb(b) * 255.0,
        a * 255.0,
    ]
}

/// Inverse of `lin_to_srgb_components`
pub(crate) fn srgb_components_to_lin(components: [f32; 4]) -> LinColor {
    let [r, g, b, a] = components.map(|c| (c / 255.0).clamp(0.0, 1.0));
    LinColor::new(
        srgb_to_linear(r) * a,
        srgb_to_linear(g) * a,
        srgb_to_linear(b) * a,
        a,
    )
}
