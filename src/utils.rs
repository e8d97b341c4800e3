//! Utility functions and types used accross the library
use crate::{Scalar, EPSILON};
use std::fmt;

/// Fixed sized iterator
///
/// This type is similar to a smallvec but it never allocates and just panics
/// if you try to fit more data than its size.
#[derive(Clone, Copy)]
pub struct ArrayIter<T, const N: usize> {
    start: usize,
    end: usize,
    array: [Option<T>; N],
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for ArrayIter<T, N> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = fmt.debug_list();
        for item in self.array[self.start..self.end].iter().flatten() {
            list.entry(item);
        }
        list.finish()
    }
}

impl<T, const N: usize> Default for ArrayIter<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> ArrayIter<T, N> {
    pub fn new() -> Self {
        Self {
            start: 0,
            end: 0,
            array: std::array::from_fn(|_| None),
        }
    }

    /// Push new element to the end of the iterator
    pub fn push(&mut self, item: T) {
        self.array[self.end] = Some(item);
        self.end += 1;
    }

    /// Check if array iterator is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of uncosumed elements
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

impl<T, const N: usize> Extend<T> for ArrayIter<T, N> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T, const N: usize> FromIterator<T> for ArrayIter<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        array.extend(iter);
        array
    }
}

impl<T, const N: usize> Iterator for ArrayIter<T, N> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start < self.end {
            let item = self.array[self.start].take();
            self.start += 1;
            item
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.end - self.start;
        (size, Some(size))
    }
}

/// Solve quadratic equation `a * t ^ 2 + b * t + c = 0` for `t`
///
/// Degenerate cases are handled the same way bounding box accumulation expects:
/// zero leading coefficient falls back to the linear root, and a linear equation
/// with zero slope has no roots.
pub(crate) fn quadratic_solve(a: Scalar, b: Scalar, c: Scalar) -> ArrayIter<Scalar, 2> {
    let mut result = ArrayIter::new();
    if a.abs() < EPSILON {
        if b.abs() > EPSILON {
            result.push(-c / b);
        }
        return result;
    }
    let disc = b * b - 4.0 * a * c;
    if disc.abs() < EPSILON {
        result.push(-b / (2.0 * a));
    } else if disc > 0.0 {
        let sq = disc.sqrt();
        // More stable solution than generic formula:
        // https://people.csail.mit.edu/bkph/articles/Quadratics.pdf
        if b >= 0.0 {
            let mul = -b - sq;
            result.push(mul / (2.0 * a));
            result.push(2.0 * c / mul);
        } else {
            let mul = -b + sq;
            result.push(2.0 * c / mul);
            result.push(mul / (2.0 * a));
        }
    }
    result
}

/// Parse leading numeric prefix of the string, `NaN` if there is none.
///
/// Leading whitespace is skipped, everything after the number (units, garbage) is ignored.
/// An exponent is only taken when digits follow it, so `2em` is `2`.
pub fn parse_float(value: &str) -> Scalar {
    let value = value.trim_start().as_bytes();
    let length = number_prefix(value);
    if length == 0 {
        return Scalar::NAN;
    }
    lexical_core::parse::<Scalar>(&value[..length]).unwrap_or(Scalar::NAN)
}

/// Length of the longest prefix that forms a decimal number
fn number_prefix(value: &[u8]) -> usize {
    let digits = |start: usize| {
        value[start..]
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count()
    };
    let mut index = 0;
    if matches!(value.first(), Some(b'+' | b'-')) {
        index += 1;
    }
    let integer = digits(index);
    index += integer;
    let mut fraction = 0;
    if value.get(index) == Some(&b'.') {
        fraction = digits(index + 1);
        if fraction > 0 {
            index += 1 + fraction;
        }
    }
    if integer == 0 && fraction == 0 {
        return 0;
    }
    if matches!(value.get(index), Some(b'e' | b'E')) {
        let mut exponent = index + 1;
        if matches!(value.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let count = digits(exponent);
        if count > 0 {
            index = exponent + count;
        }
    }
    index
}

/// Parse whitespace and/or comma separated list of numbers.
///
/// Tokens that are not numbers are preserved as `NaN`.
pub fn parse_number_list(value: &str) -> Vec<Scalar> {
    value
        .split(|c: char| c == ',' || c.is_ascii_whitespace())
        .filter(|token| !token.is_empty())
        .map(parse_float)
        .collect()
}

/// Collapse runs of whitespace into a single space, ends are not trimmed
pub fn compress_spaces(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut space = false;
    for c in value.chars() {
        if c.is_whitespace() {
            if !space {
                result.push(' ');
            }
            space = true;
        } else {
            result.push(c);
            space = false;
        }
    }
    result
}

/// Format scalar in a compact form
pub fn format_scalar(value: Scalar) -> String {
    let mut buffer = [0u8; lexical_core::BUFFER_SIZE];
    let bytes = lexical_core::write(value, &mut buffer);
    let text = String::from_utf8_lossy(bytes);
    match text.strip_suffix(".0") {
        Some(text) => text.to_string(),
        None => text.into_owned(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[macro_export]
    macro_rules! assert_approx_eq {
        ( $v0:expr, $v1: expr ) => {{
            assert!(($v0 - $v1).abs() < $crate::EPSILON, "{} != {}", $v0, $v1);
        }};
        ( $v0:expr, $v1: expr, $e: expr ) => {{
            assert!(($v0 - $v1).abs() < $e, "{} != {}", $v0, $v1);
        }};
    }

    #[test]
    fn test_quadratic_solve() {
        let roots: Vec<_> = quadratic_solve(1.0, -3.0, 2.0).collect();
        assert_eq!(roots.len(), 2);
        assert_approx_eq!(roots[0].min(roots[1]), 1.0);
        assert_approx_eq!(roots[0].max(roots[1]), 2.0);

        // linear fallback
        let roots: Vec<_> = quadratic_solve(0.0, 2.0, -1.0).collect();
        assert_eq!(roots, vec![0.5]);

        // constant, no roots
        assert!(quadratic_solve(0.0, 0.0, 1.0).is_empty());
        // negative discriminant
        assert!(quadratic_solve(1.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_parse_float() {
        assert_approx_eq!(parse_float("12px"), 12.0);
        assert_approx_eq!(parse_float("  -1.5e1"), -15.0);
        assert_approx_eq!(parse_float("50%"), 50.0);
        assert!(parse_float("abc").is_nan());
        assert!(parse_float("").is_nan());

        // exponent needs digits, otherwise it is a unit
        assert_approx_eq!(parse_float("2em"), 2.0);
        assert_approx_eq!(parse_float("1.5ex"), 1.5);
        assert_approx_eq!(parse_float("-.5em"), -0.5);
        assert_approx_eq!(parse_float("3e"), 3.0);
        assert_approx_eq!(parse_float("1e+2px"), 100.0);
        assert_approx_eq!(parse_float("4E-1"), 0.4);
        assert_approx_eq!(parse_float("7."), 7.0);
        assert!(parse_float(".").is_nan());
        assert!(parse_float("e5").is_nan());
        assert!(parse_float("-").is_nan());
    }

    #[test]
    fn test_number_list() {
        let list = parse_number_list("1,2 3\n 4.5 , x");
        assert_eq!(list.len(), 5);
        assert_approx_eq!(list[3], 4.5);
        assert!(list[4].is_nan());
    }

    #[test]
    fn test_format_scalar() {
        assert_eq!(format_scalar(1.0), "1");
        assert_eq!(format_scalar(0.5), "0.5");
        assert_eq!(compress_spaces("  a \n\t b  c "), " a b c ");
        assert_eq!(compress_spaces("a\n"), "a ");
    }
}
