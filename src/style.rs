//! Style sheets, selector specificity and matching, CSS font values
use crate::{
    property::{Axis, Metrics, DEFAULT_FONT_SIZE},
    utils::compress_spaces,
    Property, Scalar,
};
use std::fmt;

/// Style rule collected from `<style>` elements
#[derive(Debug, Clone)]
pub struct StyleRule {
    selector: String,
    specificity: String,
    parsed: Option<Selector>,
    props: Vec<Property>,
}

impl StyleRule {
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Specificity as a string of per-category counts
    pub fn specificity(&self) -> &str {
        &self.specificity
    }

    pub fn props(&self) -> &[Property] {
        &self.props
    }

    pub fn prop(&self, name: &str) -> Option<&Property> {
        self.props.iter().find(|prop| prop.name() == name)
    }

    /// Whether rule applies to the node, at-rules never match
    pub fn matches(&self, node: roxmltree::Node<'_, '_>) -> bool {
        if self.selector.starts_with('@') {
            return false;
        }
        self.parsed
            .as_ref()
            .is_some_and(|selector| selector.matches(node))
    }
}

/// SVG font referenced from an `@font-face` rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFaceSource {
    pub family: String,
    pub url: String,
}

/// Ordered collection of style rules, keyed by selector text
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    rules: Vec<StyleRule>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule with exactly this selector text
    pub fn rule(&self, selector: &str) -> Option<&StyleRule> {
        self.rules.iter().find(|rule| rule.selector == selector)
    }

    /// Add rules from the style sheet text
    ///
    /// Repeated selectors merge their declarations into the existing rule.
    /// Returns SVG fonts referenced by `@font-face` rules of this text.
    pub fn add_css(&mut self, css: &str) -> Vec<FontFaceSource> {
        let css = compress_spaces(&strip_comments(css));
        let mut fonts = Vec::new();
        for block in css.split('}') {
            if block.trim().is_empty() {
                continue;
            }
            let Some((selectors, body)) = block.split_once('{') else {
                continue;
            };
            let declarations: Vec<Property> = body
                .split(';')
                .filter_map(|decl| {
                    let (name, value) = decl.split_once(':')?;
                    let name = name.trim();
                    (!name.is_empty()).then(|| Property::new(name, value.trim()))
                })
                .collect();
            for selector in selectors.split(',') {
                let selector = selector.trim();
                if selector.is_empty() {
                    continue;
                }
                let index = match self.rules.iter().position(|rule| rule.selector == selector) {
                    Some(index) => index,
                    None => {
                        self.rules.push(StyleRule {
                            selector: selector.to_owned(),
                            specificity: selector_specificity(selector),
                            parsed: Selector::parse(selector),
                            props: Vec::new(),
                        });
                        self.rules.len() - 1
                    }
                };
                let rule = &mut self.rules[index];
                for decl in &declarations {
                    match rule.props.iter_mut().find(|prop| prop.name() == decl.name()) {
                        Some(prop) => *prop = decl.clone(),
                        None => rule.props.push(decl.clone()),
                    }
                }
                if selector == "@font-face" {
                    fonts.extend(font_face_sources(rule));
                }
            }
        }
        fonts
    }
}

/// Remove `/* ... */` blocks and lines starting with `//`
fn strip_comments(css: &str) -> String {
    let mut result = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        result.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    result.push_str(rest);
    result
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn font_face_sources(rule: &StyleRule) -> Vec<FontFaceSource> {
    let (Some(family), Some(src)) = (rule.prop("font-family"), rule.prop("src")) else {
        return Vec::new();
    };
    let family = family.value().replace('"', "");
    src.value()
        .split(',')
        .filter(|src| src.find("format(\"svg\")").is_some_and(|index| index > 0))
        .filter_map(|src| {
            let start = src.find("url(")? + 4;
            let end = start + src[start..].find(')')?;
            let url = src[start..end].trim().trim_matches(['"', '\'']);
            Some(FontFaceSource {
                family: family.clone(),
                url: url.to_owned(),
            })
        })
        .collect()
}

// -----------------------------------------------------------------------------
// Specificity
// -----------------------------------------------------------------------------

fn is_selector_stop(c: char) -> bool {
    c.is_whitespace() || matches!(c, '+' | '>' | '~' | '.' | '[' | ':')
}

/// Length of the run of non-stop characters starting at `index`
fn name_run(chars: &[char], index: usize) -> usize {
    chars[index..]
        .iter()
        .take_while(|c| !is_selector_stop(**c))
        .count()
}

fn starts_with_ignore_case(chars: &[char], index: usize, prefix: &str) -> bool {
    let mut offset = index;
    for p in prefix.chars() {
        match chars.get(offset) {
            Some(c) if c.eq_ignore_ascii_case(&p) => offset += 1,
            _ => return false,
        }
    }
    true
}

fn match_attribute(chars: &[char], index: usize) -> Option<usize> {
    if chars[index] != '[' {
        return None;
    }
    let inner = chars[index + 1..].iter().take_while(|c| **c != ']').count();
    (inner > 0 && chars.get(index + 1 + inner) == Some(&']')).then_some(inner + 2)
}

fn match_prefixed(prefix: char) -> impl Fn(&[char], usize) -> Option<usize> {
    move |chars, index| {
        if chars[index] != prefix {
            return None;
        }
        let run = name_run(chars, index + 1);
        (run > 0).then_some(run + 1)
    }
}

fn match_pseudo_element(chars: &[char], index: usize) -> Option<usize> {
    if chars[index] != ':' {
        return None;
    }
    if chars.get(index + 1) == Some(&':') {
        let run = name_run(chars, index + 2);
        if run > 0 {
            return Some(run + 2);
        }
    }
    [":first-line", ":first-letter", ":before", ":after"]
        .into_iter()
        .find(|name| starts_with_ignore_case(chars, index, name))
        .map(|name| name.len())
}

fn match_pseudo_class_brackets(chars: &[char], index: usize) -> Option<usize> {
    if chars[index] != ':' {
        return None;
    }
    let name = chars[index + 1..]
        .iter()
        .take_while(|c| c.is_alphanumeric() || **c == '_' || **c == '-')
        .count();
    if name == 0 || chars.get(index + 1 + name) != Some(&'(') {
        return None;
    }
    let open = index + 1 + name;
    let inner = chars[open + 1..].iter().take_while(|c| **c != ')').count();
    (chars.get(open + 1 + inner) == Some(&')')).then_some(name + inner + 3)
}

fn match_element(chars: &[char], index: usize) -> Option<usize> {
    let run = name_run(chars, index);
    (run > 0).then_some(run)
}

/// Replace all non-overlapping matches with a space and count them
fn take_matches(chars: &mut Vec<char>, matcher: impl Fn(&[char], usize) -> Option<usize>) -> usize {
    let mut count = 0;
    let mut result = Vec::with_capacity(chars.len());
    let mut index = 0;
    while index < chars.len() {
        match matcher(chars, index) {
            Some(len) => {
                count += 1;
                result.push(' ');
                index += len;
            }
            None => {
                result.push(chars[index]);
                index += 1;
            }
        }
    }
    *chars = result;
    count
}

/// Specificity of the selector as concatenated counts of
/// ids, classes/attributes/pseudo-classes and elements/pseudo-elements
///
/// Results are compared as strings.
pub fn selector_specificity(selector: &str) -> String {
    // unwrap `:not(...)` arguments
    let mut text = String::new();
    let mut rest = selector;
    while let Some(start) = rest.find(":not(") {
        let inner_start = start + 5;
        let Some(inner_len) = rest[inner_start..].find(')') else {
            break;
        };
        text.push_str(&rest[..start]);
        text.push_str("     ");
        text.push_str(&rest[inner_start..inner_start + inner_len]);
        text.push(' ');
        rest = &rest[inner_start + inner_len + 1..];
    }
    text.push_str(rest);
    if let Some(brace) = text.find('{') {
        text.truncate(brace);
    }

    let mut chars: Vec<char> = text.chars().collect();
    let mut counts = [0usize; 3];
    counts[1] += take_matches(&mut chars, match_attribute);
    counts[0] += take_matches(&mut chars, match_prefixed('#'));
    counts[1] += take_matches(&mut chars, match_prefixed('.'));
    counts[2] += take_matches(&mut chars, match_pseudo_element);
    counts[1] += take_matches(&mut chars, match_pseudo_class_brackets);
    counts[1] += take_matches(&mut chars, match_prefixed(':'));
    for c in chars.iter_mut() {
        if c.is_whitespace() || matches!(*c, '*' | '+' | '>' | '~' | '#' | '.') {
            *c = ' ';
        }
    }
    counts[2] += take_matches(&mut chars, match_element);
    format!("{}{}{}", counts[0], counts[1], counts[2])
}

// -----------------------------------------------------------------------------
// Selector matching
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    Adjacent,
    Sibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Includes(String),
    DashMatch(String),
    Prefix(String),
    Suffix(String),
    Substring(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<(String, AttrOp)>,
    first_child: bool,
}

impl Compound {
    fn matches(&self, node: roxmltree::Node<'_, '_>) -> bool {
        if !node.is_element() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if node.tag_name().name() != tag {
                return false;
            }
        }
        if self.ids.iter().any(|id| node.attribute("id") != Some(id.as_str())) {
            return false;
        }
        let class = node.attribute("class").unwrap_or("");
        if !self
            .classes
            .iter()
            .all(|name| class.split_whitespace().any(|c| c == name))
        {
            return false;
        }
        if self.first_child && node.prev_sibling_element().is_some() {
            return false;
        }
        self.attributes.iter().all(|(name, op)| {
            let Some(value) = node_attribute(node, name) else {
                return false;
            };
            match op {
                AttrOp::Exists => true,
                AttrOp::Equals(expected) => value == expected,
                AttrOp::Includes(expected) => value.split_whitespace().any(|v| v == expected),
                AttrOp::DashMatch(expected) => {
                    value == expected || value.starts_with(&format!("{}-", expected))
                }
                AttrOp::Prefix(expected) => !expected.is_empty() && value.starts_with(expected),
                AttrOp::Suffix(expected) => !expected.is_empty() && value.ends_with(expected),
                AttrOp::Substring(expected) => !expected.is_empty() && value.contains(expected),
            }
        })
    }
}

/// Attribute lookup accepting prefixed names such as `xlink:href`
fn node_attribute<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    let local = name.rsplit(['|', ':']).next().unwrap_or(name);
    node.attributes()
        .find(|attr| attr.name() == local)
        .map(|attr| attr.value())
}

/// Parsed complex selector, compounds are stored right to left
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    last: Compound,
    rest: Vec<(Combinator, Compound)>,
}

impl Selector {
    /// Parse selector, `None` if it uses unsupported syntax
    pub fn parse(selector: &str) -> Option<Self> {
        let chars: Vec<char> = selector.chars().collect();
        let mut index = 0;
        let mut compounds: Vec<(Combinator, Compound)> = Vec::new();
        let mut combinator = Combinator::Descendant;
        loop {
            while index < chars.len() && chars[index].is_whitespace() {
                index += 1;
            }
            if index >= chars.len() {
                break;
            }
            if let Some(next) = match chars[index] {
                '>' => Some(Combinator::Child),
                '+' => Some(Combinator::Adjacent),
                '~' => Some(Combinator::Sibling),
                _ => None,
            } {
                if compounds.is_empty() {
                    return None;
                }
                combinator = next;
                index += 1;
                continue;
            }
            let (compound, len) = parse_compound(&chars[index..])?;
            index += len;
            compounds.push((combinator, compound));
            combinator = Combinator::Descendant;
        }
        // each compound is stored with the combinator joining it to its right neighbour
        let (mut join, last) = compounds.pop()?;
        let mut rest = Vec::with_capacity(compounds.len());
        for (combinator, compound) in compounds.into_iter().rev() {
            rest.push((join, compound));
            join = combinator;
        }
        Some(Self { last, rest })
    }

    pub fn matches(&self, node: roxmltree::Node<'_, '_>) -> bool {
        self.last.matches(node) && Self::matches_rest(&self.rest, node)
    }

    fn matches_rest(rest: &[(Combinator, Compound)], node: roxmltree::Node<'_, '_>) -> bool {
        let Some(((combinator, compound), rest)) = rest.split_first() else {
            return true;
        };
        match combinator {
            Combinator::Child => node
                .parent_element()
                .is_some_and(|parent| compound.matches(parent) && Self::matches_rest(rest, parent)),
            Combinator::Descendant => node
                .ancestors()
                .skip(1)
                .filter(|n| n.is_element())
                .any(|parent| compound.matches(parent) && Self::matches_rest(rest, parent)),
            Combinator::Adjacent => node
                .prev_sibling_element()
                .is_some_and(|prev| compound.matches(prev) && Self::matches_rest(rest, prev)),
            Combinator::Sibling => node
                .prev_siblings()
                .skip(1)
                .filter(|n| n.is_element())
                .any(|prev| compound.matches(prev) && Self::matches_rest(rest, prev)),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '\\') || !c.is_ascii()
}

fn parse_ident(chars: &[char]) -> (String, usize) {
    let len = chars.iter().take_while(|c| is_ident_char(**c)).count();
    (chars[..len].iter().collect(), len)
}

fn parse_compound(chars: &[char]) -> Option<(Compound, usize)> {
    let mut compound = Compound::default();
    let mut index = 0;
    if chars.first() == Some(&'*') {
        index += 1;
    } else {
        let (tag, len) = parse_ident(chars);
        if len > 0 {
            compound.tag = Some(tag.rsplit('|').next().unwrap_or(&tag).to_owned());
            index += len;
        }
    }
    while let Some(&c) = chars.get(index) {
        match c {
            '#' | '.' => {
                let (name, len) = parse_ident(&chars[index + 1..]);
                if len == 0 {
                    return None;
                }
                if c == '#' {
                    compound.ids.push(name);
                } else {
                    compound.classes.push(name);
                }
                index += len + 1;
            }
            '[' => {
                let inner_len = chars[index + 1..].iter().position(|c| *c == ']')?;
                let inner: String = chars[index + 1..index + 1 + inner_len].iter().collect();
                compound.attributes.push(parse_attribute_selector(&inner)?);
                index += inner_len + 2;
            }
            ':' => {
                let (name, len) = parse_ident(&chars[index + 1..]);
                if name != "first-child" {
                    return None;
                }
                compound.first_child = true;
                index += len + 1;
            }
            _ => break,
        }
    }
    (index > 0).then_some((compound, index))
}

fn parse_attribute_selector(inner: &str) -> Option<(String, AttrOp)> {
    let unquote = |value: &str| value.trim().trim_matches(['"', '\'']).to_owned();
    for (token, op) in [
        ("~=", AttrOp::Includes as fn(String) -> AttrOp),
        ("|=", AttrOp::DashMatch),
        ("^=", AttrOp::Prefix),
        ("$=", AttrOp::Suffix),
        ("*=", AttrOp::Substring),
    ] {
        if let Some((name, value)) = inner.split_once(token) {
            return Some((name.trim().to_owned(), op(unquote(value))));
        }
    }
    match inner.split_once('=') {
        Some((name, value)) => Some((name.trim().to_owned(), AttrOp::Equals(unquote(value)))),
        None => {
            let name = inner.trim();
            (!name.is_empty()).then(|| (name.to_owned(), AttrOp::Exists))
        }
    }
}

// -----------------------------------------------------------------------------
// Fonts
// -----------------------------------------------------------------------------

const FONT_STYLES: &[&str] = &["normal", "italic", "oblique", "inherit"];
const FONT_VARIANTS: &[&str] = &["normal", "small-caps", "inherit"];
const FONT_WEIGHTS: &[&str] = &[
    "normal", "bold", "bolder", "lighter", "100", "200", "300", "400", "500", "600", "700", "800",
    "900", "inherit",
];

/// Components found in a CSS `font` shorthand value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontParts {
    pub style: Option<String>,
    pub variant: Option<String>,
    pub weight: Option<String>,
    pub size: Option<String>,
    pub family: Option<String>,
}

/// Canvas font description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    pub style: String,
    pub variant: String,
    pub weight: String,
    pub size: String,
    pub family: String,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            style: "normal".to_owned(),
            variant: "normal".to_owned(),
            weight: "normal".to_owned(),
            size: format!("{}px", DEFAULT_FONT_SIZE),
            family: "sans-serif".to_owned(),
        }
    }
}

impl Font {
    /// Parse CSS `font` shorthand
    ///
    /// Tokens are consumed in order style, variant, weight, size (`size/line-height`)
    /// and family. Once a later component is found earlier ones can not appear any more.
    /// `inherit` marks a component as seen without setting it.
    pub fn parse(value: &str) -> FontParts {
        let mut parts = FontParts::default();
        let mut family = String::new();
        // index of the next component that can still be matched
        let mut stage = 0;
        for token in compress_spaces(value).split(' ').filter(|t| !t.is_empty()) {
            let value = (token != "inherit").then(|| token.to_owned());
            if stage < 1 && FONT_STYLES.contains(&token) {
                parts.style = value;
                stage = 1;
            } else if stage < 2 && FONT_VARIANTS.contains(&token) {
                parts.variant = value;
                stage = 2;
            } else if stage < 3 && FONT_WEIGHTS.contains(&token) {
                parts.weight = value;
                stage = 3;
            } else if stage < 4 {
                parts.size = value.map(|size| size.split('/').next().unwrap_or("").to_owned());
                stage = 4;
            } else if token != "inherit" {
                family.push_str(token);
            }
        }
        if !family.is_empty() {
            parts.family = Some(family);
        }
        parts
    }

    /// Create font from components, empty components are taken from `inherit`
    pub fn create(
        style: &str,
        variant: &str,
        weight: &str,
        size: &str,
        family: &str,
        inherit: &Font,
    ) -> Self {
        let pick = |value: &str, inherited: &str| {
            if value.is_empty() {
                inherited.to_owned()
            } else {
                value.to_owned()
            }
        };
        Self {
            style: pick(style, &inherit.style),
            variant: pick(variant, &inherit.variant),
            weight: pick(weight, &inherit.weight),
            size: pick(size, &inherit.size),
            family: pick(family, &inherit.family),
        }
    }

    /// Font size in pixels, relative units resolve against the default font size
    pub fn size_px(&self) -> Scalar {
        let size = Property::new("font-size", self.size.as_str())
            .to_pixels(&Metrics::default(), Axis::Diagonal, false);
        if size.is_finite() {
            size
        } else {
            DEFAULT_FONT_SIZE
        }
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.style, self.variant, self.weight, self.size, self.family
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specificity() {
        assert_eq!(selector_specificity("rect"), "001");
        assert_eq!(selector_specificity(".a"), "010");
        assert_eq!(selector_specificity("#id"), "100");
        assert_eq!(selector_specificity("g > rect.a.b"), "022");
        assert_eq!(selector_specificity("rect[fill=red]"), "011");
        assert_eq!(selector_specificity("a:hover"), "011");
        assert_eq!(selector_specificity("p::before"), "002");
        assert_eq!(selector_specificity("li:nth-child(2n)"), "011");
        assert_eq!(selector_specificity("*"), "000");
        assert_eq!(selector_specificity("rect:not(.x)"), "011");
        // components are concatenated and compared as strings
        assert!(selector_specificity("#a") > selector_specificity(".a.b.c"));
    }

    #[test]
    fn test_parse_css() {
        let mut sheet = StyleSheet::new();
        let fonts = sheet.add_css(
            "/* comment */ rect, .a { fill: red; stroke : blue }\n\
             rect { stroke-width: 2 }\n\
             @font-face { font-family: \"Fancy\"; src: url(\"fancy.svg\") format(\"svg\") }",
        );
        assert_eq!(sheet.rules().len(), 3);
        let rect = sheet.rule("rect").expect("rect rule");
        assert_eq!(rect.props().len(), 3);
        assert_eq!(rect.prop("stroke").map(Property::value), Some("blue"));
        assert_eq!(rect.specificity(), "001");
        assert_eq!(
            fonts,
            vec![FontFaceSource {
                family: "Fancy".to_owned(),
                url: "fancy.svg".to_owned()
            }]
        );
    }

    #[test]
    fn test_selector_matching() {
        let text = r#"<svg><g class="layer top" id="g1"><rect id="r" width="1"/><circle/></g><rect/></svg>"#;
        let doc = roxmltree::Document::parse(text).expect("valid xml");
        let find = |id: Option<&str>, tag: &str| {
            doc.descendants()
                .find(|n| n.tag_name().name() == tag && n.attribute("id") == id)
                .expect("node")
        };
        let inner = find(Some("r"), "rect");
        let outer = find(None, "rect");
        let circle = find(None, "circle");
        let matches = |selector: &str, node| Selector::parse(selector).is_some_and(|s| s.matches(node));

        assert!(matches("rect", inner));
        assert!(matches("g rect", inner));
        assert!(!matches("g rect", outer));
        assert!(matches("svg > g > rect", inner));
        assert!(!matches("svg > rect#r", inner));
        assert!(matches(".layer.top #r", inner));
        assert!(matches("rect[width]", inner));
        assert!(matches("rect[width='1']", inner));
        assert!(!matches("rect[width=2]", inner));
        assert!(matches("rect + circle", circle));
        assert!(matches("g ~ rect", outer));
        assert!(matches("*", circle));
        assert!(matches("rect:first-child", inner));
        assert!(!matches("circle:hover", circle));

        let rule = StyleRule {
            selector: "@font-face".to_owned(),
            specificity: "000".to_owned(),
            parsed: None,
            props: Vec::new(),
        };
        assert!(!rule.matches(inner));
    }

    #[test]
    fn test_font() {
        let parts = Font::parse("italic bold 16px/20px Times New Roman");
        assert_eq!(parts.style.as_deref(), Some("italic"));
        assert_eq!(parts.variant, None);
        assert_eq!(parts.weight.as_deref(), Some("bold"));
        assert_eq!(parts.size.as_deref(), Some("16px"));
        assert_eq!(parts.family.as_deref(), Some("TimesNewRoman"));

        let font = Font::create("", "", "bold", "20px", "", &Font::default());
        assert_eq!(font.to_string(), "normal normal bold 20px sans-serif");
        assert_eq!(font.size_px(), 20.0);
        assert_eq!(Font::default().size_px(), 12.0);
    }
}
