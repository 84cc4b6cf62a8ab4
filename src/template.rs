//! String templates for URLs, titles and file names
//!
//! A template is literal text with `{field}` placeholders. The set of fields
//! is fixed:
//!
//! | placeholder      | value                                   |
//! |------------------|-----------------------------------------|
//! | `{wp.name}`      | waypoint name                           |
//! | `{wp.latitude}`  | latitude, e.g. `45.0`                   |
//! | `{wp.longitude}` | longitude, e.g. `-122.0`                |
//! | `{gpx_stem}`     | uploaded file name without extension    |
//!
//! Coordinates accept a precision spec (`{wp.latitude:.5f}`). Literal braces
//! are written `{{` and `}}`.

use crate::error::{Error, Result};
use crate::track::Waypoint;
use std::fmt;

/// Read-only input to template substitution
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Waypoint being rendered
    pub waypoint: &'a Waypoint,
    /// Stem of the uploaded track file
    pub file_stem: &'a str,
}

impl<'a> RenderContext<'a> {
    /// Build a context for one waypoint
    pub fn new(waypoint: &'a Waypoint, file_stem: &'a str) -> Self {
        Self {
            waypoint,
            file_stem,
        }
    }
}

/// Fields a placeholder may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `wp.name`
    Name,
    /// `wp.latitude`
    Latitude,
    /// `wp.longitude`
    Longitude,
    /// `gpx_stem`
    FileStem,
}

impl Field {
    const TABLE: [(&'static str, Field); 4] = [
        ("wp.name", Field::Name),
        ("wp.latitude", Field::Latitude),
        ("wp.longitude", Field::Longitude),
        ("gpx_stem", Field::FileStem),
    ];

    /// Look up a placeholder name
    pub fn lookup(name: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, field)| *field)
    }

    /// Placeholder name as written in templates
    pub fn key(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(_, field)| *field == self)
            .map(|(key, _)| *key)
            .unwrap_or_default()
    }

    fn is_numeric(self) -> bool {
        matches!(self, Field::Latitude | Field::Longitude)
    }

    fn coordinate(self, ctx: &RenderContext<'_>) -> Option<f64> {
        match self {
            Field::Latitude => Some(ctx.waypoint.latitude),
            Field::Longitude => Some(ctx.waypoint.longitude),
            Field::Name | Field::FileStem => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field {
        field: Field,
        precision: Option<usize>,
    },
}

/// A parsed template, ready to render against any [`RenderContext`]
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template, rejecting unknown fields and unbalanced braces.
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(Error::template(source, "single '}' encountered")),
                '{' => {
                    let mut placeholder = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(Error::template(
                                    source,
                                    "nested '{' inside placeholder",
                                ));
                            }
                            other => placeholder.push(other),
                        }
                    }
                    if !closed {
                        return Err(Error::template(source, "unterminated '{'"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_placeholder(source, &placeholder)?);
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Original template text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Fields referenced by this template, in order of appearance
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field { field, .. } => Some(*field),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute the context into the template.
    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        let mut out = String::with_capacity(self.source.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { field, precision } => match field.coordinate(ctx) {
                    Some(value) => match *precision {
                        Some(digits) => out.push_str(&format!("{value:.digits$}")),
                        None => out.push_str(&format_float(value)),
                    },
                    None if *field == Field::Name => out.push_str(&ctx.waypoint.name),
                    None => out.push_str(ctx.file_stem),
                },
            }
        }
        out
    }
}

/// Parse and render in one step.
pub fn render(source: &str, ctx: &RenderContext<'_>) -> Result<String> {
    Ok(Template::parse(source)?.render(ctx))
}

fn parse_placeholder(source: &str, placeholder: &str) -> Result<Segment> {
    let (name, spec) = match placeholder.split_once(':') {
        Some((name, spec)) => (name, Some(spec)),
        None => (placeholder, None),
    };

    let field = Field::lookup(name).ok_or_else(|| {
        let known: Vec<&str> = Field::TABLE.iter().map(|(key, _)| *key).collect();
        Error::template(
            source,
            format!("unknown field '{{{name}}}', expected one of {}", known.join(", ")),
        )
    })?;

    let precision = match spec {
        None => None,
        Some(spec) if field.is_numeric() => Some(parse_precision(spec).ok_or_else(|| {
            Error::template(
                source,
                format!("unsupported format spec '{spec}' for '{field}', use .N or .Nf"),
            )
        })?),
        Some(spec) => {
            return Err(Error::template(
                source,
                format!("format spec '{spec}' is not allowed on text field '{field}'"),
            ));
        }
    };

    Ok(Segment::Field { field, precision })
}

fn parse_precision(spec: &str) -> Option<usize> {
    let digits = spec.strip_prefix('.')?;
    let digits = digits.strip_suffix('f').unwrap_or(digits);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Shortest round-trip float text with a `.0` on integral values and a
/// signed two-digit exponent (`1e-05`) outside `[1e-4, 1e16)`.
pub fn format_float(value: f64) -> String {
    let text = format!("{value:?}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => text,
    }
}
