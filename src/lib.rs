//! SVG document renderer on top of a small 2D canvas.
//!
//! Main features:
//!  - SVG parsing with CSS style sheets, `use`, `symbol` and nested documents
//!  - Anti-aliased rendering of shapes, text, gradients and patterns
//!  - Clipping, masks and a subset of filter effects
//!  - SMIL animations and pointer events driven by a frame scheduler
//!
#![warn(missing_debug_implementations)]

/// Report unsupported or malformed input, as a warning when logging was requested
macro_rules! diagnostic {
    ($log:expr, $($arg:tt)*) => {
        if $log {
            tracing::warn!($($arg)*)
        } else {
            tracing::debug!($($arg)*)
        }
    };
}

mod animation;
mod canvas;
mod color;
mod curve;
mod document;
mod effects;
mod ellipse;
mod error;
mod events;
mod geometry;
mod grad;
mod image;
mod paint;
mod path;
mod pathdata;
mod property;
mod rasterize;
mod render;
mod renderer;
mod shape;
mod style;
mod text;
mod transform;
mod utils;
mod viewport;

pub use animation::Animation;
pub use canvas::{canvas_size, Canvas, Composite, TextAlign, TextBaseline, MAX_CANVAS_SIZE};
pub use color::{Color, ColorError, LinColor, RGBA};
pub use curve::{Cubic, Curve, Line, Quad, Segment};
pub use document::{Document, Element, ElementKind, NodeId};
pub use ellipse::EllipArc;
pub use error::Error;
pub use events::{EventKind, Mouse, PointerEvent};
pub use geometry::{BBox, Point, Scalar, Transform, EPSILON, PI};
pub use grad::{GradLinear, GradRadial, GradStop, GradStops, Paint, Pattern};
#[cfg(feature = "png")]
pub use image::{read_png, write_png};
pub use image::{image_to_rgba, Image, ImageMut, ImageOwned, Shape};
pub use path::{FillRule, LineCap, LineJoin, Path, PathBuilder, StrokeStyle, DEFAULT_FLATNESS};
pub use pathdata::{PathCommand, PathData};
pub use property::{Axis, Metrics, Property, DEFAULT_FONT_SIZE};
pub use rasterize::Mask;
pub use renderer::{
    FsLoader, ImageState, Options, Renderer, Resource, ResourceLoader, FRAME_INTERVAL, FRAME_RATE,
};
pub use style::Font;
pub use transform::{TransformList, TransformOp};
