//! Raw attribute and style values with unit aware conversions
use crate::{utils::parse_float, Document, NodeId, Scalar, TextBaseline, PI};
use std::fmt;

/// Resolution used to convert absolute units into pixels
const DPI: Scalar = 96.0;

/// Font size used when nothing else is specified
pub const DEFAULT_FONT_SIZE: Scalar = 12.0;

/// Property without a value, returned by lookups that found nothing
pub static EMPTY: Property = Property {
    name: String::new(),
    value: String::new(),
};

/// Axis hint used to resolve percentage lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    /// Normalized diagonal `sqrt(w^2 + h^2) / sqrt(2)`
    Diagonal,
}

/// Everything needed to convert relative lengths into pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Width of the current viewport
    pub width: Scalar,
    /// Height of the current viewport
    pub height: Scalar,
    /// Current font size in pixels
    pub em: Scalar,
}

impl Metrics {
    pub fn new(width: Scalar, height: Scalar, em: Scalar) -> Self {
        Self { width, height, em }
    }

    /// Size of the viewport along the axis
    pub fn size(&self, axis: Axis) -> Scalar {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
            Axis::Diagonal => {
                (self.width * self.width + self.height * self.height).sqrt() / (2.0 as Scalar).sqrt()
            }
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(0.0, 0.0, DEFAULT_FONT_SIZE)
    }
}

/// Named raw value of an attribute or a style
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Property {
    name: String,
    value: String,
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}", self.name, self.value)
    }
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }

    /// Numeric prefix of the value, percentages are converted to fractions
    ///
    /// Empty value is `0`, value without a numeric prefix is `NaN`.
    pub fn num_value(&self) -> Scalar {
        if !self.has_value() {
            return 0.0;
        }
        let value = parse_float(&self.value);
        if self.value.ends_with('%') {
            value / 100.0
        } else {
            value
        }
    }

    pub fn value_or_default<'a>(&'a self, default: &'a str) -> &'a str {
        if self.has_value() {
            &self.value
        } else {
            default
        }
    }

    pub fn num_value_or_default(&self, default: Scalar) -> Scalar {
        if self.has_value() {
            self.num_value()
        } else {
            default
        }
    }

    /// Value with all digits, dots and minus signs removed
    pub fn units(&self) -> String {
        self.value
            .chars()
            .filter(|c| !(c.is_ascii_digit() || *c == '.' || *c == '-'))
            .collect()
    }

    /// Length in pixels
    ///
    /// With `process_percent` unitless values below `1` are treated as fractions
    /// of the viewport size.
    pub fn to_pixels(&self, metrics: &Metrics, axis: Axis, process_percent: bool) -> Scalar {
        if !self.has_value() {
            return 0.0;
        }
        let value = self.value.as_str();
        let n = self.num_value();
        if value.ends_with("em") {
            n * metrics.em
        } else if value.ends_with("ex") {
            n * metrics.em / 2.0
        } else if value.ends_with("px") {
            n
        } else if value.ends_with("pt") {
            n * DPI / 72.0
        } else if value.ends_with("pc") {
            n * 15.0
        } else if value.ends_with("cm") {
            n * DPI / 2.54
        } else if value.ends_with("mm") {
            n * DPI / 25.4
        } else if value.ends_with("in") {
            n * DPI
        } else if value.ends_with('%') {
            n * metrics.size(axis)
        } else if process_percent && n < 1.0 {
            n * metrics.size(axis)
        } else {
            n
        }
    }

    /// Duration in milliseconds, unitless values are milliseconds
    pub fn to_milliseconds(&self) -> Scalar {
        if !self.has_value() {
            return 0.0;
        }
        let n = self.num_value();
        if self.value.ends_with("ms") {
            n
        } else if self.value.ends_with('s') {
            n * 1000.0
        } else {
            n
        }
    }

    /// Angle in radians, unitless values are degrees
    pub fn to_radians(&self) -> Scalar {
        if !self.has_value() {
            return 0.0;
        }
        let n = self.num_value();
        if self.value.ends_with("deg") {
            n * PI / 180.0
        } else if self.value.ends_with("grad") {
            n * PI / 200.0
        } else if self.value.ends_with("rad") {
            n
        } else {
            n * PI / 180.0
        }
    }

    /// Canvas baseline for `dominant-baseline` and `alignment-baseline` values
    pub fn to_text_baseline(&self) -> Option<TextBaseline> {
        let baseline = match self.value.as_str() {
            "baseline" | "alphabetic" | "mathematical" => TextBaseline::Alphabetic,
            "before-edge" | "text-before-edge" => TextBaseline::Top,
            "middle" | "central" => TextBaseline::Middle,
            "after-edge" | "text-after-edge" => TextBaseline::Bottom,
            "ideographic" => TextBaseline::Ideographic,
            "hanging" => TextBaseline::Hanging,
            _ => return None,
        };
        Some(baseline)
    }

    /// Name of the referenced definition, `url(#name)` or `#name` yields `name`
    pub fn definition_name(&self) -> &str {
        if let Some(start) = self.value.find('#') {
            let rest = &self.value[start + 1..];
            let end = rest.find([')', '\'', '"']).unwrap_or(rest.len());
            if end > 0 {
                return &rest[..end];
            }
        }
        &self.value
    }

    /// Resolve referenced definition in the document
    pub fn definition(&self, doc: &Document) -> Option<NodeId> {
        if !self.has_value() {
            return None;
        }
        doc.definition(self.definition_name())
    }

    pub fn is_url_definition(&self) -> bool {
        self.value.starts_with("url(")
    }
}
