//! File name templating.
//!
//! A template is plain text with embedded placeholders of the form `%{name}` or
//! `%{name|directive}`. Both `name` and `directive` consist of ASCII word
//! characters (`[A-Za-z0-9_]`). The directive is a C-style format specifier
//! without its leading `%`, for example `%{f|06d}` renders frame `42` as
//! `000042` and `%{f|x}` renders it as `2a`.
//!
//! Rendering never fails:
//!
//! * a placeholder whose name is not in the dictionary is emitted verbatim,
//!   so `%{unknown}` stays visible in the produced path;
//! * a value that cannot be formatted (an unsupported value kind, a malformed
//!   directive, or a string value paired with a numeric conversion) renders as
//!   an empty string.

use std::collections::HashMap;
use std::fmt;

/// A value that can be substituted into a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    /// Accepted in a dictionary but never formatted; renders as an empty string.
    Float(f64),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

/// The dictionary a template is rendered against.
pub type Variables = HashMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder {
        name: String,
        directive: Option<String>,
        /// The placeholder exactly as written, emitted when `name` is unbound.
        text: String,
    },
}

/// A template compiled into literal and placeholder segments.
///
/// Compiling is infallible: anything that does not parse as a placeholder is
/// literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl StringTemplate {
    pub fn compile(template: &str) -> Self {
        let bytes = template.as_bytes();
        let mut segments = vec![];
        let mut literal_start = 0;
        let mut ix = 0;
        while ix < bytes.len() {
            if let Some((name, directive, end)) = parse_placeholder(bytes, ix) {
                if literal_start < ix {
                    segments.push(Segment::Literal(template[literal_start..ix].to_owned()));
                }
                segments.push(Segment::Placeholder {
                    name: template[name.0..name.1].to_owned(),
                    directive: directive.map(|(s, e)| template[s..e].to_owned()),
                    text: template[ix..end].to_owned(),
                });
                ix = end;
                literal_start = end;
            } else {
                ix += 1;
            }
        }
        if literal_start < bytes.len() {
            segments.push(Segment::Literal(template[literal_start..].to_owned()));
        }
        Self {
            source: template.to_owned(),
            segments,
        }
    }

    /// The template text this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names referenced by placeholders, in order of appearance.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn render(&self, vars: &Variables) -> String {
        let mut output = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Placeholder {
                    name,
                    directive,
                    text,
                } => match vars.get(name) {
                    Some(value) => {
                        if let Some(formatted) = format_value(value, directive.as_deref()) {
                            output.push_str(&formatted);
                        }
                    }
                    None => output.push_str(text),
                },
            }
        }
        output
    }
}

impl From<&str> for StringTemplate {
    fn from(template: &str) -> Self {
        Self::compile(template)
    }
}

impl fmt::Display for StringTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compiles and renders `template` in one go.
pub fn render(template: &str, vars: &Variables) -> String {
    StringTemplate::compile(template).render(vars)
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn word_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && is_word(bytes[end]) {
        end += 1;
    }
    end
}

type Span = (usize, usize);

/// Tries to match a placeholder starting exactly at `start`.
///
/// Returns the name span, the optional directive span and the index one past
/// the closing brace.
fn parse_placeholder(bytes: &[u8], start: usize) -> Option<(Span, Option<Span>, usize)> {
    if bytes.get(start) != Some(&b'%') || bytes.get(start + 1) != Some(&b'{') {
        return None;
    }
    let name_start = start + 2;
    let name_end = word_end(bytes, name_start);
    if name_end == name_start {
        return None;
    }
    let mut directive = None;
    let mut ix = name_end;
    if bytes.get(ix) == Some(&b'|') {
        let directive_end = word_end(bytes, ix + 1);
        if directive_end == ix + 1 {
            return None;
        }
        directive = Some((ix + 1, directive_end));
        ix = directive_end;
    }
    if bytes.get(ix) != Some(&b'}') {
        return None;
    }
    Some(((name_start, name_end), directive, ix + 1))
}

fn format_value(value: &Value, directive: Option<&str>) -> Option<String> {
    match value {
        Value::Str(s) => {
            let directive = match directive {
                Some(spec) => Directive::parse(spec)?,
                None => Directive::plain(Conversion::Str),
            };
            directive.format_str(s)
        }
        Value::Int(v) => {
            let directive = match directive {
                Some(spec) => Directive::parse(spec)?,
                None => Directive::plain(Conversion::Signed),
            };
            directive.format_int(*v)
        }
        Value::Float(_) => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Signed,
    Unsigned,
    LowerHex,
    UpperHex,
    Octal,
    Char,
    Str,
}

/// The part of a printf conversion that word characters can
/// express: `[0][width][length][conversion]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Directive {
    zero_pad: bool,
    width: usize,
    conversion: Conversion,
}

impl Directive {
    fn plain(conversion: Conversion) -> Self {
        Self {
            zero_pad: false,
            width: 0,
            conversion,
        }
    }

    fn parse(spec: &str) -> Option<Self> {
        let bytes = spec.as_bytes();
        let mut ix = 0;
        let mut zero_pad = false;
        while bytes.get(ix) == Some(&b'0') {
            zero_pad = true;
            ix += 1;
        }
        let mut width = 0usize;
        while let Some(digit) = bytes.get(ix).filter(|b| b.is_ascii_digit()) {
            width = width.checked_mul(10)?.checked_add(usize::from(digit - b'0'))?;
            ix += 1;
        }
        // Length modifiers only matter for C varargs.
        while matches!(
            bytes.get(ix),
            Some(b'h' | b'l' | b'j' | b'z' | b't' | b'q' | b'L')
        ) {
            ix += 1;
        }
        let conversion = match bytes.get(ix)? {
            b'd' | b'i' => Conversion::Signed,
            b'u' => Conversion::Unsigned,
            b'x' => Conversion::LowerHex,
            b'X' => Conversion::UpperHex,
            b'o' => Conversion::Octal,
            b'c' => Conversion::Char,
            b's' => Conversion::Str,
            _ => return None,
        };
        if ix + 1 != bytes.len() {
            return None;
        }
        Some(Self {
            zero_pad,
            width,
            conversion,
        })
    }

    fn format_int(&self, v: i64) -> Option<String> {
        // Negative values reinterpret as a 32-bit C `unsigned int`.
        let unsigned = if v < 0 {
            u64::from(v as i32 as u32)
        } else {
            v as u64
        };
        let (sign, digits) = match self.conversion {
            Conversion::Signed => (if v < 0 { "-" } else { "" }, v.unsigned_abs().to_string()),
            Conversion::Unsigned => ("", unsigned.to_string()),
            Conversion::LowerHex => ("", format!("{:x}", unsigned)),
            Conversion::UpperHex => ("", format!("{:X}", unsigned)),
            Conversion::Octal => ("", format!("{:o}", unsigned)),
            Conversion::Char => {
                let c = char::from_u32(v as u32)?;
                return Some(self.pad_spaces(c.to_string()));
            }
            Conversion::Str => return Some(self.pad_spaces(v.to_string())),
        };
        let len = sign.len() + digits.len();
        if self.zero_pad && len < self.width {
            Some(format!("{}{}{}", sign, "0".repeat(self.width - len), digits))
        } else {
            Some(self.pad_spaces(format!("{}{}", sign, digits)))
        }
    }

    fn format_str(&self, s: &str) -> Option<String> {
        match self.conversion {
            Conversion::Str => Some(self.pad_spaces(s.to_owned())),
            _ => None,
        }
    }

    fn pad_spaces(&self, text: String) -> String {
        let len = text.chars().count();
        if len < self.width {
            format!("{}{}", " ".repeat(self.width - len), text)
        } else {
            text
        }
    }
}
