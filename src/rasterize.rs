use crate::{FillRule, Image, ImageMut, ImageOwned, Line, Point, Scalar, EPSILON};
use std::cmp::min;

/// Coverage mask, values are in `[0, 1]` range
pub type Mask = ImageOwned<Scalar>;

/// Update provided surface with the signed difference of the line
///
/// Signed difference is a diffrence between adjacent pixels introduced by the line.
pub(crate) fn signed_difference_line(surf: &mut ImageOwned<Scalar>, line: Line) {
    // y - is a row
    // x - is a column
    let Line([p0, p1]) = line;
    if !(p0.x().is_finite() && p0.y().is_finite() && p1.x().is_finite() && p1.y().is_finite()) {
        return;
    }

    // handle lines that are intersecting `x == surf.width()`
    // - just throw away part that has x > surf.width for all points
    let width = surf.width() as Scalar - 1.0;
    let line = if p0.x() > width || p1.x() > width {
        if p0.x() > width && p1.x() > width {
            Line::new((width - 0.001, p0.y()), (width - 0.001, p1.y()))
        } else {
            let t = (p0.x() - width) / (p0.x() - p1.x());
            let mid = Point::new(width, (1.0 - t) * p0.y() + t * p1.y());
            if p0.x() < width {
                Line::new(p0, mid)
            } else {
                Line::new(mid, p1)
            }
        }
    } else {
        line
    };

    // handle lines that are intersecting `x == 0.0`
    // - line is splitted in left (for all points where x < 0.0) and the mid part
    // - left part is converted to a vertical line that spans same y's and x == 0.0
    // - left part is rastterized recursivelly, and mid part rasterized after this
    let Line([p0, p1]) = line;
    let line = if p0.x() < 0.0 || p1.x() < 0.0 {
        let (vertical, line) = if p1.x() > 0.0 || p0.x() > 0.0 {
            let t = p0.x() / (p0.x() - p1.x());
            let mid = Point::new(0.0, (1.0 - t) * p0.y() + t * p1.y());
            if p1.x() > 0.0 {
                let p = Point::new(0.0, p0.y());
                (Line::new(p, mid), Line::new(mid, p1))
            } else {
                let p = Point::new(0.0, p1.y());
                (Line::new(mid, p), Line::new(p0, mid))
            }
        } else {
            (
                Line::new((0.0, p0.y()), (0.0, p1.y())),
                Line::new((0.0, 0.0), (0.0, 0.0)),
            )
        };
        // signed difference by the line left of `x == 0.0`
        signed_difference_line(surf, vertical);
        line
    } else {
        line
    };

    let Line([p0, p1]) = line;
    let shape = surf.shape();
    let data = surf.data_mut();
    let mut add = |row_offset: usize, col: i32, value: Scalar| {
        if col >= 0 && (col as usize) < shape.width {
            data[row_offset + col as usize * shape.col_stride] += value;
        }
    };

    if (p0.y() - p1.y()).abs() < EPSILON {
        // line does not introduce any signed converage
        return;
    }
    // always iterate from the point with the smallest y coordinate
    let (dir, p0, p1) = if p0.y() < p1.y() {
        (1.0, p0, p1)
    } else {
        (-1.0, p1, p0)
    };
    let dxdy = (p1.x() - p0.x()) / (p1.y() - p0.y());
    // find first point to trace. since we are going to interate over y's
    // we should pick min(y , p0.y) as a starting y point, and adjust x
    // accordingly
    let y = p0.y().max(0.0) as usize;
    let mut x = if p0.y() < 0.0 {
        p0.x() - p0.y() * dxdy
    } else {
        p0.x()
    };
    let mut x_next = x;
    for y in y..min(shape.height, p1.y().ceil().max(0.0) as usize) {
        x = x_next;
        let row_offset = shape.offset(y, 0); // current line offset in the data array
        let dy = ((y + 1) as Scalar).min(p1.y()) - (y as Scalar).max(p0.y());
        // signed y difference
        let d = dir * dy;
        // find next x position
        x_next = x + dxdy * dy;
        // order (x, x_next) from smaller value x0 to bigger x1
        let (x0, x1) = if x < x_next { (x, x_next) } else { (x_next, x) };
        // lower bound of effected x pixels
        let x0_floor = x0.floor().max(0.0);
        let x0i = x0_floor as i32;
        // uppwer bound of effected x pixels
        let x1_ceil = x1.ceil();
        let x1i = x1_ceil as i32;
        if x1i <= x0i + 1 {
            // only goes through one pixel (with the total coverage of `d` spread over two pixels)
            let xmf = 0.5 * (x + x_next) - x0_floor; // effective height
            add(row_offset, x0i, d * (1.0 - xmf));
            add(row_offset, x0i + 1, d * xmf);
        } else {
            let s = (x1 - x0).recip();
            let x0f = x0 - x0_floor; // fractional part of x0
            let x1f = x1 - x1_ceil + 1.0; // fractional part of x1
            let a0 = 0.5 * s * (1.0 - x0f) * (1.0 - x0f); // fractional area of the pixel with smallest x
            let am = 0.5 * s * x1f * x1f; // fractional area of the pixel with largest x
            add(row_offset, x0i, d * a0);
            if x1i == x0i + 2 {
                // only two pixels are covered
                add(row_offset, x0i + 1, d * (1.0 - a0 - am));
            } else {
                // second pixel
                let a1 = s * (1.5 - x0f);
                add(row_offset, x0i + 1, d * (a1 - a0));
                // (second, last) pixels
                for xi in x0i + 2..x1i - 1 {
                    add(row_offset, xi, d * s);
                }
                // last pixel
                let a2 = a1 + (x1i - x0i - 3) as Scalar * s;
                add(row_offset, x1i - 1, d * (1.0 - a2 - am));
            }
            add(row_offset, x1i, d * am);
        }
    }
}

pub(crate) fn signed_difference_to_mask(surf: &mut ImageOwned<Scalar>, fill_rule: FillRule) {
    let shape = surf.shape();
    let data = surf.data_mut();
    match fill_rule {
        FillRule::NonZero => {
            for y in 0..shape.height {
                let mut acc = 0.0;
                for x in 0..shape.width {
                    let offset = shape.offset(y, x);
                    acc += data[offset];

                    let value = acc.abs();
                    data[offset] = if value > 1.0 {
                        1.0
                    } else if value < 1e-6 {
                        0.0
                    } else {
                        value
                    };
                }
            }
        }
        FillRule::EvenOdd => {
            for y in 0..shape.height {
                let mut acc = 0.0;
                for x in 0..shape.width {
                    let offset = shape.offset(y, x);
                    acc += data[offset];

                    data[offset] = ((acc + 1.0).rem_euclid(2.0) - 1.0).abs()
                }
            }
        }
    }
}

/// Rasterize closed polygons (given as a list of lines) into a coverage mask
pub fn rasterize_lines(
    lines: impl IntoIterator<Item = Line>,
    width: usize,
    height: usize,
    fill_rule: FillRule,
) -> Mask {
    // extra column absorbs coverage of the lines touching the right edge
    let mut surf = ImageOwned::new_default(height, width + 1);
    for line in lines {
        signed_difference_line(&mut surf, line);
    }
    signed_difference_to_mask(&mut surf, fill_rule);
    ImageOwned::new_with(height, width, |row, col| {
        surf.get(row, col).copied().unwrap_or(0.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_signed_difference_line() {
        let mut surf = ImageOwned::<Scalar>::new_default(2, 5);

        // line convers many columns but just one row
        signed_difference_line(&mut surf, Line::new((0.5, 1.0), (3.5, 0.0)));
        // covered areas per-pixel
        let a0 = (0.5 * (1.0 / 6.0)) / 2.0;
        let a1 = ((1.0 / 6.0) + (3.0 / 6.0)) / 2.0;
        let a2 = ((3.0 / 6.0) + (5.0 / 6.0)) / 2.0;
        assert_approx_eq!(*surf.get(0, 0).unwrap(), -a0);
        assert_approx_eq!(*surf.get(0, 1).unwrap(), a0 - a1);
        assert_approx_eq!(*surf.get(0, 2).unwrap(), a1 - a2);
        assert_approx_eq!(*surf.get(0, 3).unwrap(), a0 - a1);
        assert_approx_eq!(*surf.get(0, 4).unwrap(), -a0);
        // total difference
        let a: Scalar = surf.data().iter().sum();
        assert_approx_eq!(a, -1.0);
        surf.clear();

        // out of bound line (intersects x = 0.0)
        signed_difference_line(&mut surf, Line::new((-1.0, 0.0), (1.0, 1.0)));
        assert_approx_eq!(*surf.get(0, 0).unwrap(), 3.0 / 4.0);
        assert_approx_eq!(*surf.get(0, 1).unwrap(), 1.0 / 4.0);
        surf.clear();

        // multiple rows vertical
        signed_difference_line(&mut surf, Line::new((0.5, 0.5), (0.5, 1.75)));
        assert_approx_eq!(*surf.get(0, 0).unwrap(), 1.0 / 4.0);
        assert_approx_eq!(*surf.get(0, 1).unwrap(), 1.0 / 4.0);
        assert_approx_eq!(*surf.get(1, 0).unwrap(), 3.0 / 8.0);
        assert_approx_eq!(*surf.get(1, 1).unwrap(), 3.0 / 8.0);
    }

    #[test]
    fn test_rasterize_square() {
        let square = [
            Line::new((1.0, 1.0), (3.0, 1.0)),
            Line::new((3.0, 1.0), (3.0, 3.0)),
            Line::new((3.0, 3.0), (1.0, 3.0)),
            Line::new((1.0, 3.0), (1.0, 1.0)),
        ];
        let mask = rasterize_lines(square, 4, 4, FillRule::NonZero);
        assert_approx_eq!(*mask.get(1, 1).unwrap(), 1.0, 1e-9);
        assert_approx_eq!(*mask.get(2, 2).unwrap(), 1.0, 1e-9);
        assert_approx_eq!(*mask.get(0, 0).unwrap(), 0.0, 1e-9);
        assert_approx_eq!(*mask.get(3, 3).unwrap(), 0.0, 1e-9);
        let total: Scalar = mask.data().iter().sum();
        assert_approx_eq!(total, 4.0, 1e-9);
    }

    #[test]
    fn test_rasterize_touching_right_edge() {
        let square = [
            Line::new((2.0, 0.0), (4.0, 0.0)),
            Line::new((4.0, 0.0), (4.0, 4.0)),
            Line::new((4.0, 4.0), (2.0, 4.0)),
            Line::new((2.0, 4.0), (2.0, 0.0)),
        ];
        let mask = rasterize_lines(square, 4, 4, FillRule::NonZero);
        assert_approx_eq!(*mask.get(0, 3).unwrap(), 1.0, 1e-9);
        assert_approx_eq!(*mask.get(3, 1).unwrap(), 0.0, 1e-9);
    }
}
