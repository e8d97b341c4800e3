//! Nested viewports and `preserveAspectRatio` fitting
use crate::{Axis, Canvas, Scalar};

/// Stack of `(width, height)` frames used to resolve percentage lengths
#[derive(Debug, Clone, Default)]
pub struct ViewPort {
    frames: Vec<(Scalar, Scalar)>,
}

impl ViewPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn set_current(&mut self, width: Scalar, height: Scalar) {
        self.frames.push((width, height));
    }

    pub fn remove_current(&mut self) {
        self.frames.pop();
    }

    /// Top frame, `(0, 0)` if the stack is empty
    pub fn current(&self) -> (Scalar, Scalar) {
        self.frames.last().copied().unwrap_or((0.0, 0.0))
    }

    /// Bottom frame, `(0, 0)` if the stack is empty
    pub fn root(&self) -> (Scalar, Scalar) {
        self.frames.first().copied().unwrap_or((0.0, 0.0))
    }

    pub fn width(&self) -> Scalar {
        self.current().0
    }

    pub fn height(&self) -> Scalar {
        self.current().1
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Size of the current frame along the axis
    pub fn compute_size(&self, axis: Axis) -> Scalar {
        let (width, height) = self.current();
        match axis {
            Axis::X => width,
            Axis::Y => height,
            Axis::Diagonal => (width * width + height * height).sqrt() / (2.0 as Scalar).sqrt(),
        }
    }
}

/// Source rectangle fitted into a viewport according to `preserveAspectRatio`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio<'a> {
    /// Raw `preserveAspectRatio` value
    pub value: &'a str,
    /// Size of the target viewport
    pub size: (Scalar, Scalar),
    /// Size of the source rectangle
    pub desired: (Scalar, Scalar),
    /// Origin of the source rectangle
    pub min: (Scalar, Scalar),
    /// Reference point in pixels (markers), replaces alignment when present
    pub reference: Option<(Scalar, Scalar)>,
}

impl AspectRatio<'_> {
    /// Apply fitting transformation to the canvas
    pub fn apply(&self, canvas: &mut Canvas) {
        let value = crate::utils::compress_spaces(self.value);
        let value = value.strip_prefix("defer ").unwrap_or(&value);
        let mut parts = value.split(' ');
        let align = parts.next().filter(|s| !s.is_empty()).unwrap_or("xMidYMid");
        let meet_or_slice = parts.next().filter(|s| !s.is_empty()).unwrap_or("meet");
        let meet = meet_or_slice == "meet";
        let slice = meet_or_slice == "slice";

        let (width, height) = self.size;
        let (mut desired_width, mut desired_height) = self.desired;
        let scale_x = width / desired_width;
        let scale_y = height / desired_height;
        let scale_min = scale_x.min(scale_y);
        let scale_max = scale_x.max(scale_y);
        if meet {
            desired_width *= scale_min;
            desired_height *= scale_min;
        }
        if slice {
            desired_width *= scale_max;
            desired_height *= scale_max;
        }

        match self.reference {
            Some((ref_x, ref_y)) => canvas.translate(-scale_min * ref_x, -scale_min * ref_y),
            None => {
                // alignment only matters on the axis that has free space
                let fit_x = (meet && scale_min == scale_y) || (slice && scale_max == scale_y);
                let fit_y = (meet && scale_min == scale_x) || (slice && scale_max == scale_x);
                if align.starts_with("xMid") && fit_x {
                    canvas.translate(width / 2.0 - desired_width / 2.0, 0.0);
                }
                if align.ends_with("YMid") && fit_y {
                    canvas.translate(0.0, height / 2.0 - desired_height / 2.0);
                }
                if align.starts_with("xMax") && fit_x {
                    canvas.translate(width - desired_width, 0.0);
                }
                if align.ends_with("YMax") && fit_y {
                    canvas.translate(0.0, height - desired_height);
                }
            }
        }

        if align == "none" {
            canvas.scale(scale_x, scale_y);
        } else if meet {
            canvas.scale(scale_min, scale_min);
        } else if slice {
            canvas.scale(scale_max, scale_max);
        }

        let (min_x, min_y) = self.min;
        canvas.translate(-min_x, -min_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, Point};

    fn fit(value: &str, size: (Scalar, Scalar), desired: (Scalar, Scalar)) -> [Scalar; 6] {
        let mut canvas = Canvas::new(1, 1);
        AspectRatio {
            value,
            size,
            desired,
            min: (0.0, 0.0),
            reference: None,
        }
        .apply(&mut canvas);
        canvas.current_transform().coefficients()
    }

    #[test]
    fn test_viewport_stack() {
        let mut viewport = ViewPort::new();
        assert_eq!(viewport.current(), (0.0, 0.0));
        viewport.set_current(300.0, 400.0);
        viewport.set_current(30.0, 40.0);
        assert_approx_eq!(viewport.compute_size(Axis::X), 30.0);
        assert_approx_eq!(viewport.compute_size(Axis::Diagonal), 50.0 / 2.0f64.sqrt(), 1e-9);
        viewport.remove_current();
        assert_approx_eq!(viewport.height(), 400.0);
        assert_eq!(viewport.root(), (300.0, 400.0));
        viewport.clear();
        assert_eq!(viewport.depth(), 0);
    }

    #[test]
    fn test_meet_centers() {
        // 200x100 viewport, 100x100 box: scale 1, centered horizontally
        let [a, _, _, d, e, f] = fit("", (200.0, 100.0), (100.0, 100.0));
        assert_approx_eq!(a, 1.0);
        assert_approx_eq!(d, 1.0);
        assert_approx_eq!(e, 50.0);
        assert_approx_eq!(f, 0.0);
    }

    #[test]
    fn test_align_min_and_max() {
        let [_, _, _, _, e, _] = fit("xMinYMin meet", (200.0, 100.0), (100.0, 100.0));
        assert_approx_eq!(e, 0.0);
        let [_, _, _, _, e, _] = fit("xMaxYMax", (200.0, 100.0), (100.0, 100.0));
        assert_approx_eq!(e, 100.0);
    }

    #[test]
    fn test_slice_and_none() {
        let [a, _, _, d, _, f] = fit("xMidYMid slice", (200.0, 100.0), (100.0, 100.0));
        assert_approx_eq!(a, 2.0);
        assert_approx_eq!(d, 2.0);
        assert_approx_eq!(f, -50.0);
        let [a, _, _, d, e, f] = fit("none", (200.0, 100.0), (100.0, 100.0));
        assert_approx_eq!(a, 2.0);
        assert_approx_eq!(d, 1.0);
        assert_approx_eq!(e, 0.0);
        assert_approx_eq!(f, 0.0);
    }

    #[test]
    fn test_view_box_scaling() {
        let mut canvas = Canvas::new(1, 1);
        AspectRatio {
            value: "",
            size: (200.0, 100.0),
            desired: (100.0, 50.0),
            min: (10.0, 5.0),
            reference: None,
        }
        .apply(&mut canvas);
        let p = canvas.current_transform().apply(Point::new(60.0, 30.0));
        assert_approx_eq!(p.x(), 100.0);
        assert_approx_eq!(p.y(), 50.0);
    }
}
