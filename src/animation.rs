//! `animate`, `animateColor` and `animateTransform` tweening
use crate::{
    utils::{format_scalar, parse_number_list},
    Document, Element, ElementKind, NodeId, Property, Scalar, RGBA,
};

/// Playback state of a single animation element
///
/// Animations are created once while the document is built and are never removed,
/// finished animations only flip their `frozen` or `removed` flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    node: NodeId,
    target: NodeId,
    duration: Scalar,
    begin: Scalar,
    max_duration: Scalar,
    /// Value and units of the target before the animation started
    initial: Option<(String, String)>,
    frozen: bool,
    removed: bool,
}

impl Animation {
    pub(crate) fn new(node: NodeId, target: NodeId, elem: &Element) -> Self {
        let begin = elem.attribute("begin").to_milliseconds();
        Self {
            node,
            target,
            duration: 0.0,
            begin,
            max_duration: begin + elem.attribute("dur").to_milliseconds(),
            initial: None,
            frozen: false,
            removed: false,
        }
    }

    /// Animation element
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Element whose attribute or style is animated
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Elapsed time in milliseconds
    pub fn duration(&self) -> Scalar {
        self.duration
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Advance animation by `delta` milliseconds, returns `true` if the target changed
    pub fn update(&mut self, doc: &mut Document, delta: Scalar) -> bool {
        let elem = doc.element(self.node);
        let css = elem.attribute("attributeType").value() == "CSS";
        let name = elem.attribute("attributeName").value().to_owned();
        let repeat = elem.attribute("repeatCount").value() == "indefinite"
            || elem.attribute("repeatDur").value() == "indefinite";
        let fill = elem.attribute("fill").value_or_default("remove").to_owned();

        if self.initial.is_none() {
            let current = self.current(doc, &name, css);
            self.initial = Some((current.value().to_owned(), current.units()));
        }

        if self.duration > self.max_duration {
            if repeat {
                self.duration = 0.0;
            } else if fill == "freeze" && !self.frozen {
                self.frozen = true;
                let value = self.current(doc, &name, css).value().to_owned();
                doc.element_mut(self.target).set_frozen_value(value);
            } else if fill == "remove" && !self.removed {
                self.removed = true;
                let value = match doc.element(self.target).frozen_value() {
                    Some(frozen) => frozen.to_owned(),
                    None => self.initial.as_ref().map_or_else(String::new, |i| i.0.clone()),
                };
                self.set(doc, &name, css, value);
                return true;
            }
            return false;
        }
        self.duration += delta;

        if self.begin < self.duration {
            let mut value = self.calc_value(doc.element(self.node));
            let kind = doc.element(self.node).attribute("type");
            if kind.has_value() {
                value = format!("{}({})", kind.value(), value);
            }
            self.set(doc, &name, css, value);
            return true;
        }
        false
    }

    fn current<'a>(&self, doc: &'a Document, name: &str, css: bool) -> &'a Property {
        let target = doc.element(self.target);
        if css {
            doc.style(target, name)
        } else {
            target.attribute(name)
        }
    }

    fn set(&self, doc: &mut Document, name: &str, css: bool, value: String) {
        let target = doc.element_mut(self.target);
        if css {
            target.set_style(name, value);
        } else {
            target.set_attribute(name, value);
        }
    }

    /// Interpolation endpoints and progress between them
    ///
    /// With a `values` list, progress is first mapped into the pair of bracketing
    /// keyframes.
    fn progress(&self, elem: &Element) -> (String, String, Scalar) {
        let span = self.max_duration - self.begin;
        let progress = ((self.duration - self.begin) / span).clamp(0.0, 1.0);
        let values = elem.attribute("values");
        if !values.has_value() {
            return (
                elem.attribute("from").value().to_owned(),
                elem.attribute("to").value().to_owned(),
                progress,
            );
        }
        let values: Vec<&str> = values.value().split(';').map(str::trim).collect();
        let last = values.len() - 1;
        let position = progress * last as Scalar;
        let lower = (position.floor() as usize).min(last);
        let upper = (position.ceil() as usize).min(last);
        let progress = if upper > lower {
            (position - lower as Scalar) / (upper - lower) as Scalar
        } else {
            0.0
        };
        (values[lower].to_owned(), values[upper].to_owned(), progress)
    }

    fn calc_value(&self, elem: &Element) -> String {
        let (from, to, progress) = self.progress(elem);
        match elem.kind() {
            ElementKind::AnimateColor => {
                match (from.trim().parse::<RGBA>(), to.trim().parse::<RGBA>()) {
                    (Ok(from), Ok(to)) => {
                        let channel = |from: u8, to: u8| {
                            let (from, to) = (from as Scalar, to as Scalar);
                            (from + (to - from) * progress).trunc() as u8
                        };
                        format!(
                            "rgb({},{},{})",
                            channel(from.red(), to.red()),
                            channel(from.green(), to.green()),
                            channel(from.blue(), to.blue()),
                        )
                    }
                    _ => elem.attribute("from").value().to_owned(),
                }
            }
            ElementKind::AnimateTransform => {
                let from = parse_number_list(&from);
                let to = parse_number_list(&to);
                let mut value = String::new();
                for (index, from) in from.iter().enumerate() {
                    let to = to.get(index).copied().unwrap_or(Scalar::NAN);
                    value.push_str(&format_scalar(from + (to - from) * progress));
                    value.push(' ');
                }
                value
            }
            _ => {
                let from = Property::new("from", from).num_value();
                let to = Property::new("to", to).num_value();
                let units = self.initial.as_ref().map_or("", |i| i.1.as_str());
                format!("{}{}", format_scalar(from + (to - from) * progress), units)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, utils::parse_float, Error, Resource, ResourceLoader};

    struct NoLoader;

    impl ResourceLoader for NoLoader {
        fn load(&self, _url: &str, _cross_origin: bool) -> Result<Resource, Error> {
            Ok(Resource::Pending)
        }
    }

    fn document(text: &str) -> Document {
        Document::parse(text, &NoLoader, false).expect("valid document")
    }

    fn run(doc: &mut Document, steps: &[Scalar]) -> Vec<bool> {
        let mut animations = doc.take_animations();
        let changed = steps
            .iter()
            .map(|delta| animations[0].update(doc, *delta))
            .collect();
        doc.restore_animations(animations);
        changed
    }

    fn target_attr(doc: &Document, name: &str) -> String {
        let target = doc.animations()[0].target();
        doc.element(target).attribute(name).value().to_owned()
    }

    #[test]
    fn test_linear_tween() {
        let mut doc = document(
            r#"<svg><rect x="0px"><animate attributeName="x" from="0" to="100" dur="1000ms"/></rect></svg>"#,
        );
        assert_eq!(run(&mut doc, &[500.0]), vec![true]);
        let x = target_attr(&doc, "x");
        assert!(x.ends_with("px"));
        assert_approx_eq!(parse_float(&x), 50.0, 1e-9);
    }

    #[test]
    fn test_begin_and_remove() {
        let mut doc = document(
            r#"<svg><rect x="7"><animate attributeName="x" from="0" to="10" begin="1s" dur="1s"/></rect></svg>"#,
        );
        // inactive before begin, active, then past the end
        assert_eq!(run(&mut doc, &[500.0]), vec![false]);
        assert_eq!(target_attr(&doc, "x"), "7");
        run(&mut doc, &[1000.0]);
        assert_approx_eq!(parse_float(&target_attr(&doc, "x")), 5.0, 1e-9);
        run(&mut doc, &[600.0]);
        assert_eq!(run(&mut doc, &[10.0]), vec![true]);
        assert_eq!(target_attr(&doc, "x"), "7");
        assert!(doc.animations()[0].is_removed());
        // terminal state is sticky
        assert_eq!(run(&mut doc, &[10.0]), vec![false]);
    }

    #[test]
    fn test_freeze() {
        let mut doc = document(
            r#"<svg><rect><animate attributeName="width" from="0" to="10" dur="100" fill="freeze"/></rect></svg>"#,
        );
        run(&mut doc, &[150.0, 10.0, 10.0]);
        assert_eq!(target_attr(&doc, "width"), "10");
        assert!(doc.animations()[0].is_frozen());
        let target = doc.animations()[0].target();
        assert_eq!(doc.element(target).frozen_value(), Some("10"));
    }

    #[test]
    fn test_repeat_indefinite() {
        let mut doc = document(
            r#"<svg><rect><animate attributeName="x" from="0" to="10" dur="100" repeatCount="indefinite"/></rect></svg>"#,
        );
        run(&mut doc, &[150.0, 10.0]);
        assert_approx_eq!(doc.animations()[0].duration(), 0.0);
        run(&mut doc, &[30.0]);
        assert_approx_eq!(parse_float(&target_attr(&doc, "x")), 3.0, 1e-9);
    }

    #[test]
    fn test_values_keyframes() {
        let mut doc = document(
            r#"<svg><rect><animate attributeName="x" values="0;10;30" dur="1000"/></rect></svg>"#,
        );
        run(&mut doc, &[750.0]);
        assert_approx_eq!(parse_float(&target_attr(&doc, "x")), 20.0, 1e-9);
    }

    #[test]
    fn test_color_and_transform() {
        let mut doc = document(
            r##"<svg><rect><animateColor attributeName="fill" attributeType="CSS" from="#000000" to="#ff0080" dur="100"/></rect></svg>"##,
        );
        run(&mut doc, &[50.0]);
        let target = doc.animations()[0].target();
        let fill = doc.element(target).own_style("fill").map(|p| p.value().to_owned());
        assert_eq!(fill.as_deref(), Some("rgb(127,0,64)"));

        let mut doc = document(
            r#"<svg><g><animateTransform attributeName="transform" type="rotate" from="0 5 5" to="90 5 5" dur="100"/></g></svg>"#,
        );
        run(&mut doc, &[50.0]);
        assert_eq!(target_attr(&doc, "transform"), "rotate(45 5 5 )");
    }
}
