//! Structural model of EDN data and its canonical printer.
//!
//! `Display` writes text that the reader parses back into an equal value, so a
//! payload can be logged or forwarded verbatim.

use core::fmt::{self, Write as _};

/// Namespaced or bare name shared by symbols and keywords.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    pub namespace: Option<String>,
    pub name: String,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Keyword (`:name` or `:ns/name`). Printed with its leading colon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Keyword(pub Symbol);

impl Keyword {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Symbol::new(name))
    }

    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self(Symbol::namespaced(namespace, name))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.0.namespace.as_deref()
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

/// A single EDN element.
///
/// Maps and sets keep insertion order; equality between two maps (or two sets)
/// ignores that order, as EDN collections are unordered.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    /// Arbitrary precision integer, kept as its decimal digits (with sign, no `N`).
    BigInt(String),
    Float(f64),
    /// Exact decimal, kept as written (without the `M` suffix).
    Decimal(String),
    Char(char),
    String(String),
    Keyword(Keyword),
    Symbol(Symbol),
    List(Vec<Value>),
    Vector(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
    Tagged(Symbol, Box<Value>),
}

impl Value {
    /// Short type name, used in logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Integer(_) | Value::BigInt(_) => "integer",
            Value::Float(_) | Value::Decimal(_) => "float",
            Value::Char(_) => "character",
            Value::String(_) => "string",
            Value::Keyword(_) => "keyword",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Vector(_) => "vector",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Tagged(..) => "tagged",
        }
    }

    /// Number of elements of a collection (entries for maps), `None` for scalars.
    pub fn count(&self) -> Option<usize> {
        match self {
            Value::List(items) | Value::Vector(items) | Value::Set(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Map lookup by key; `None` if this is not a map or the key is absent.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Map lookup by bare keyword name, e.g. `get_keyword("deps")` for `:deps`.
    pub fn get_keyword(&self, name: &str) -> Option<&Value> {
        self.get(&Value::Keyword(Keyword::new(name)))
    }

    /// Printed form that is identical for equal values.
    ///
    /// Map entries and set elements are sorted and `-0.0` is folded into `0.0`.
    /// Unlike `==`, `##NaN` keys equal to themselves.
    pub fn canonical_key(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            Value::Float(x) if *x == 0.0 => out.push_str("0.0"),
            Value::List(items) => write_canonical_seq(out, '(', items, ')'),
            Value::Vector(items) => write_canonical_seq(out, '[', items, ']'),
            Value::Set(items) => {
                let mut keys: Vec<String> = items.iter().map(Value::canonical_key).collect();
                keys.sort_unstable();
                out.push_str("#{");
                out.push_str(&keys.join(" "));
                out.push('}');
            }
            Value::Map(entries) => {
                let mut keys: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| {
                        let mut entry = k.canonical_key();
                        entry.push(' ');
                        v.write_canonical(&mut entry);
                        entry
                    })
                    .collect();
                keys.sort_unstable();
                out.push('{');
                out.push_str(&keys.join(", "));
                out.push('}');
            }
            Value::Tagged(tag, inner) => {
                let _ = write!(out, "#{tag} ");
                inner.write_canonical(out);
            }
            scalar => {
                let _ = write!(out, "{scalar}");
            }
        }
    }
}

fn write_canonical_seq(out: &mut String, open: char, items: &[Value], close: char) {
    out.push(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        item.write_canonical(out);
    }
    out.push(close);
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Nil, Nil) => true,
            (Bool(a), Bool(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (BigInt(a), BigInt(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Decimal(a), Decimal(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Keyword(a), Keyword(b)) => a == b,
            (Symbol(a), Symbol(b)) => a == b,
            (List(a), List(b)) | (Vector(a), Vector(b)) => a == b,
            (Map(_), Map(_)) | (Set(_), Set(_)) => {
                self.count() == other.count() && self.canonical_key() == other.canonical_key()
            }
            (Tagged(t1, v1), Tagged(t2, v2)) => t1 == t2 && v1 == v2,
            _ => false,
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: char) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_char(' ')?;
        }
        write!(f, "{item}")?;
    }
    f.write_char(close)
}

fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

fn write_char(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    match c {
        '\n' => f.write_str("\\newline"),
        '\r' => f.write_str("\\return"),
        ' ' => f.write_str("\\space"),
        '\t' => f.write_str("\\tab"),
        c if c.is_control() || c.is_whitespace() => write!(f, "\\u{:04x}", c as u32),
        c => write!(f, "\\{c}"),
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("##NaN")
    } else if x == f64::INFINITY {
        f.write_str("##Inf")
    } else if x == f64::NEG_INFINITY {
        f.write_str("##-Inf")
    } else {
        // `Debug` always keeps a fraction or exponent, so the text reads back as a float.
        write!(f, "{x:?}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::BigInt(digits) => write!(f, "{digits}N"),
            Value::Float(x) => write_float(f, *x),
            Value::Decimal(text) => write!(f, "{text}M"),
            Value::Char(c) => write_char(f, *c),
            Value::String(s) => write_string(f, s),
            Value::Keyword(k) => write!(f, "{k}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::List(items) => write_seq(f, "(", items, ')'),
            Value::Vector(items) => write_seq(f, "[", items, ']'),
            Value::Set(items) => write_seq(f, "#{", items, '}'),
            Value::Map(entries) => {
                f.write_char('{')?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k} {v}")?;
                }
                f.write_char('}')
            }
            Value::Tagged(tag, inner) => write!(f, "#{tag} {inner}"),
        }
    }
}
