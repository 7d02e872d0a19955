//! EDN reader: source text → [`Value`].
//!
//! Hand-written recursive descent over a `&str`. Recursion depth is bounded by
//! [`ParseOptions::max_depth`] so hostile payloads cannot exhaust the stack.

use std::collections::HashSet;

use chrono::DateTime;
use uuid::Uuid;

use crate::error::{ParseError, ParseErrorKind, Position};
use crate::value::{Keyword, Symbol, Value};

/// Reader limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting of collections and tagged elements.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_depth: 128 }
    }
}

/// Parse exactly one form. Empty input and trailing forms are errors.
pub fn parse(input: &str) -> Result<Value, ParseError> {
    parse_with(input, ParseOptions::default())
}

/// [`parse`] with explicit limits.
pub fn parse_with(input: &str, options: ParseOptions) -> Result<Value, ParseError> {
    let mut reader = Reader::with_options(input, options);
    let value = match reader.next_form()? {
        Some(v) => v,
        None => return Err(reader.end_of_forms_error(ParseErrorKind::EmptyInput)),
    };

    let trailing_at = reader.skip_whitespace();
    match reader.next_form()? {
        Some(_) => Err(ParseError::new(ParseErrorKind::TrailingInput, trailing_at)),
        None if reader.at_eof() => Ok(value),
        None => Err(reader.end_of_forms_error(ParseErrorKind::TrailingInput)),
    }
}

/// Parse a whitespace-separated stream of zero or more forms.
pub fn parse_all(input: &str) -> Result<Vec<Value>, ParseError> {
    let mut reader = Reader::new(input);
    let mut forms = Vec::new();
    while let Some(v) = reader.next_form()? {
        forms.push(v);
    }
    if reader.at_eof() {
        Ok(forms)
    } else {
        Err(reader.end_of_forms_error(ParseErrorKind::TrailingInput))
    }
}

/// Cursor over EDN source text.
///
/// Most callers want [`parse`] or [`parse_all`]; the reader itself is exposed
/// for streaming one form at a time.
#[derive(Debug)]
pub struct Reader<'a> {
    src: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    depth: usize,
    options: ParseOptions,
}

fn is_whitespace(c: char) -> bool {
    c.is_whitespace() || c == ','
}

fn is_delimiter(c: char) -> bool {
    is_whitespace(c) || matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';')
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(
            c,
            '.' | '*' | '+' | '!' | '-' | '_' | '?' | '$' | '%' | '&' | '=' | '<' | '>' | '/' | ':' | '#' | '\''
        )
}

impl<'a> Reader<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::with_options(src, ParseOptions::default())
    }

    pub fn with_options(src: &'a str, options: ParseOptions) -> Self {
        Self {
            src,
            offset: 0,
            line: 1,
            column: 1,
            depth: 0,
            options,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    pub fn at_eof(&self) -> bool {
        self.offset >= self.src.len()
    }

    /// Read the next form.
    ///
    /// Returns `Ok(None)` at end of input or when the next character closes an
    /// enclosing collection; callers decide which of those is acceptable.
    pub fn next_form(&mut self) -> Result<Option<Value>, ParseError> {
        loop {
            let start = self.skip_whitespace();
            match (self.peek(), self.peek_second()) {
                (None, _) | (Some(')' | ']' | '}'), _) => return Ok(None),
                (Some('#'), Some('_')) => {
                    self.bump();
                    self.bump();
                    // Chained discards recurse, so they count towards the depth limit.
                    self.enter(start)?;
                    let discarded = self.next_form()?;
                    self.leave();
                    if discarded.is_none() {
                        return Err(ParseError::new(ParseErrorKind::DiscardWithoutForm, start));
                    }
                }
                _ => return self.read_form().map(Some),
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cursor primitives
    // ─────────────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.offset..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Skip whitespace, commas and `;` comments; returns the position reached.
    fn skip_whitespace(&mut self) -> Position {
        while let Some(c) = self.peek() {
            if is_whitespace(c) {
                self.bump();
            } else if c == ';' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
        self.position()
    }

    fn take_token(&mut self) -> &'a str {
        let src = self.src;
        let start = self.offset;
        while let Some(c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            self.bump();
        }
        &src[start..self.offset]
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.position())
    }

    /// Error for a `next_form` that returned `None` where a form was required.
    fn end_of_forms_error(&self, at_eof: ParseErrorKind) -> ParseError {
        match self.peek() {
            Some(c) => self.error(ParseErrorKind::UnmatchedDelimiter(c)),
            None => self.error(at_eof),
        }
    }

    fn require_form(&mut self) -> Result<Value, ParseError> {
        match self.next_form()? {
            Some(v) => Ok(v),
            None => Err(self.end_of_forms_error(ParseErrorKind::UnexpectedEof)),
        }
    }

    fn enter(&mut self, at: Position) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(ParseError::new(
                ParseErrorKind::DepthLimitExceeded(self.options.max_depth),
                at,
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Forms
    // ─────────────────────────────────────────────────────────────────────

    fn read_form(&mut self) -> Result<Value, ParseError> {
        let start = self.position();
        match self.peek() {
            None => Err(self.error(ParseErrorKind::UnexpectedEof)),
            Some('(') => self.read_seq(')').map(Value::List),
            Some('[') => self.read_seq(']').map(Value::Vector),
            Some('{') => self.read_map(),
            Some('"') => self.read_string().map(Value::String),
            Some('\\') => self.read_char(),
            Some('#') => self.read_dispatch(),
            Some(_) => {
                let token = self.take_token();
                if token.is_empty() {
                    // Only reachable for a stray delimiter such as '"' inside a token.
                    let c = self.peek().unwrap_or(' ');
                    return Err(ParseError::new(ParseErrorKind::UnexpectedChar(c), start));
                }
                classify_token(token).map_err(|kind| ParseError::new(kind, start))
            }
        }
    }

    fn read_seq(&mut self, close: char) -> Result<Vec<Value>, ParseError> {
        let start = self.position();
        self.bump();
        self.enter(start)?;
        let mut items = Vec::new();
        loop {
            match self.next_form()? {
                Some(v) => items.push(v),
                None => match self.peek() {
                    Some(c) if c == close => {
                        self.bump();
                        break;
                    }
                    Some(c) => return Err(self.error(ParseErrorKind::UnmatchedDelimiter(c))),
                    None => return Err(self.error(ParseErrorKind::UnexpectedEof)),
                },
            }
        }
        self.leave();
        Ok(items)
    }

    fn read_map(&mut self) -> Result<Value, ParseError> {
        let start = self.position();
        let forms = self.read_seq('}')?;
        if forms.len() % 2 != 0 {
            return Err(ParseError::new(ParseErrorKind::OddMapEntries, start));
        }

        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(forms.len() / 2);
        let mut seen = HashSet::with_capacity(forms.len() / 2);
        let mut forms = forms.into_iter();
        while let (Some(k), Some(v)) = (forms.next(), forms.next()) {
            if !seen.insert(k.canonical_key()) {
                return Err(ParseError::new(ParseErrorKind::DuplicateKey(k.to_string()), start));
            }
            entries.push((k, v));
        }
        Ok(Value::Map(entries))
    }

    fn read_set(&mut self, start: Position) -> Result<Value, ParseError> {
        let forms = self.read_seq('}')?;
        let mut items: Vec<Value> = Vec::with_capacity(forms.len());
        let mut seen = HashSet::with_capacity(forms.len());
        for item in forms {
            if !seen.insert(item.canonical_key()) {
                return Err(ParseError::new(
                    ParseErrorKind::DuplicateSetElement(item.to_string()),
                    start,
                ));
            }
            items.push(item);
        }
        Ok(Value::Set(items))
    }

    /// Everything that starts with `#` except `#_` (handled by `next_form`).
    fn read_dispatch(&mut self) -> Result<Value, ParseError> {
        let start = self.position();
        self.bump();
        match self.peek() {
            Some('{') => self.read_set(start),
            Some('#') => {
                self.bump();
                let token = self.take_token();
                match token {
                    "Inf" => Ok(Value::Float(f64::INFINITY)),
                    "-Inf" => Ok(Value::Float(f64::NEG_INFINITY)),
                    "NaN" => Ok(Value::Float(f64::NAN)),
                    other => Err(ParseError::new(
                        ParseErrorKind::InvalidTag(format!("#{other}")),
                        start,
                    )),
                }
            }
            Some(c) if c.is_alphabetic() => {
                let token = self.take_token();
                let tag = parse_symbol(token)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidTag(token.to_string()), start))?;
                self.enter(start)?;
                let inner = self.require_form()?;
                self.leave();
                validate_tagged(&tag, &inner).map_err(|kind| ParseError::new(kind, start))?;
                Ok(Value::Tagged(tag, Box::new(inner)))
            }
            Some(c) => Err(self.error(ParseErrorKind::UnexpectedChar(c))),
            None => Err(self.error(ParseErrorKind::UnexpectedEof)),
        }
    }

    fn read_string(&mut self) -> Result<String, ParseError> {
        self.bump();
        let mut out = String::new();
        loop {
            let at = self.position();
            match self.bump() {
                None => return Err(self.error(ParseErrorKind::UnexpectedEof)),
                Some('"') => return Ok(out),
                Some('\\') => {
                    let escaped = match self.bump() {
                        None => return Err(self.error(ParseErrorKind::UnexpectedEof)),
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('n') => '\n',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('u') => self.read_unicode_escape(at)?,
                        Some(other) => {
                            return Err(ParseError::new(
                                ParseErrorKind::InvalidEscape(other.to_string()),
                                at,
                            ));
                        }
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// Reads the hex digits after `\u`, combining surrogate pairs.
    fn read_unicode_escape(&mut self, at: Position) -> Result<char, ParseError> {
        let high = self.read_hex4(at)?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(high)
                .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidEscape(format!("u{high:04x}")), at));
        }

        if self.peek() == Some('\\') && self.peek_second() == Some('u') {
            self.bump();
            self.bump();
            let low = self.read_hex4(at)?;
            if (0xDC00..0xE000).contains(&low) {
                let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                if let Some(c) = char::from_u32(combined) {
                    return Ok(c);
                }
            }
        }
        Err(ParseError::new(
            ParseErrorKind::InvalidEscape(format!("u{high:04x}")),
            at,
        ))
    }

    fn read_hex4(&mut self, at: Position) -> Result<u32, ParseError> {
        let mut digits = String::with_capacity(4);
        for _ in 0..4 {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => digits.push(c),
                Some(c) => {
                    digits.push(c);
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidEscape(format!("u{digits}")),
                        at,
                    ));
                }
                None => return Err(self.error(ParseErrorKind::UnexpectedEof)),
            }
        }
        u32::from_str_radix(&digits, 16)
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidEscape(format!("u{digits}")), at))
    }

    fn read_char(&mut self) -> Result<Value, ParseError> {
        let start = self.position();
        self.bump();
        // The first character is taken verbatim, so `\(` and `\,` are valid.
        let first = match self.bump() {
            Some(c) => c,
            None => return Err(self.error(ParseErrorKind::UnexpectedEof)),
        };
        let rest = self.take_token();
        if rest.is_empty() {
            return Ok(Value::Char(first));
        }

        let mut literal = String::with_capacity(rest.len() + 1);
        literal.push(first);
        literal.push_str(rest);
        let invalid = || ParseError::new(ParseErrorKind::InvalidCharacter(literal.clone()), start);

        let c = match literal.as_str() {
            "newline" => '\n',
            "return" => '\r',
            "space" => ' ',
            "tab" => '\t',
            hex if hex.len() == 5
                && hex.starts_with('u')
                && hex[1..].bytes().all(|b| b.is_ascii_hexdigit()) =>
            {
                u32::from_str_radix(&hex[1..], 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(invalid)?
            }
            _ => return Err(invalid()),
        };
        Ok(Value::Char(c))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokens: numbers, symbols, keywords, literals
// ─────────────────────────────────────────────────────────────────────────────

fn classify_token(token: &str) -> Result<Value, ParseErrorKind> {
    let mut chars = token.chars();
    let first = chars.next().unwrap_or(' ');
    let second = chars.next();

    if first.is_ascii_digit() || (matches!(first, '+' | '-') && second.is_some_and(|c| c.is_ascii_digit())) {
        return parse_number(token);
    }

    match token {
        "nil" => return Ok(Value::Nil),
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }

    if let Some(body) = token.strip_prefix(':') {
        return parse_keyword(body)
            .map(|sym| Value::Keyword(Keyword(sym)))
            .ok_or_else(|| ParseErrorKind::InvalidKeyword(token.to_string()));
    }

    parse_symbol(token)
        .map(Value::Symbol)
        .ok_or_else(|| ParseErrorKind::InvalidSymbol(token.to_string()))
}

/// `[+-]? int frac? exp? (N|M)?` where `int` has no leading zeros.
fn parse_number(token: &str) -> Result<Value, ParseErrorKind> {
    let invalid = || ParseErrorKind::InvalidNumber(token.to_string());

    let (body, suffix) = match token.as_bytes().last() {
        Some(b'N') => (&token[..token.len() - 1], Some('N')),
        Some(b'M') => (&token[..token.len() - 1], Some('M')),
        _ => (token, None),
    };

    let bytes = body.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = &body[int_start..i];
    if int_digits.is_empty() || (int_digits.len() > 1 && int_digits.starts_with('0')) {
        return Err(invalid());
    }

    let mut is_float = false;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return Err(invalid());
        }
        is_float = true;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return Err(invalid());
        }
        is_float = true;
    }
    if i != bytes.len() {
        return Err(invalid());
    }

    let canonical = body.strip_prefix('+').unwrap_or(body);
    match suffix {
        Some('N') if is_float => Err(invalid()),
        Some('N') => Ok(Value::BigInt(canonical.to_string())),
        Some(_) => Ok(Value::Decimal(canonical.to_string())),
        None if is_float => body.parse::<f64>().map(Value::Float).map_err(|_| invalid()),
        None => Ok(canonical
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::BigInt(canonical.to_string()))),
    }
}

fn valid_name_part(part: &str) -> bool {
    let mut chars = part.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if first.is_ascii_digit() || matches!(first, ':' | '#' | '\'') {
        return false;
    }
    if matches!(first, '+' | '-' | '.') && chars.next().is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    part.chars().all(|c| is_symbol_char(c) && c != '/')
}

fn parse_symbol(token: &str) -> Option<Symbol> {
    if token == "/" {
        return Some(Symbol::new("/"));
    }
    match token.split_once('/') {
        Some((ns, name)) => {
            (valid_name_part(ns) && valid_name_part(name)).then(|| Symbol::namespaced(ns, name))
        }
        None => valid_name_part(token).then(|| Symbol::new(token)),
    }
}

/// Keyword names may start with a digit (`:1st`), otherwise they follow symbol rules.
fn parse_keyword(body: &str) -> Option<Symbol> {
    if body.starts_with(':') || body == "/" {
        return None;
    }
    let relaxed = |part: &str| {
        !part.is_empty()
            && !part.starts_with('#')
            && part.chars().all(|c| is_symbol_char(c) && c != '/')
    };
    match body.split_once('/') {
        Some((ns, name)) => (relaxed(ns) && relaxed(name)).then(|| Symbol::namespaced(ns, name)),
        None => relaxed(body).then(|| Symbol::new(body)),
    }
}

/// Built-in tags carry a string with a fixed format.
fn validate_tagged(tag: &Symbol, inner: &Value) -> Result<(), ParseErrorKind> {
    if tag.namespace.is_some() {
        return Ok(());
    }
    let invalid = |reason: String| ParseErrorKind::InvalidTaggedValue {
        tag: tag.name.clone(),
        reason,
    };
    match tag.name.as_str() {
        "inst" => {
            let text = inner.as_str().ok_or_else(|| invalid("expected a string".into()))?;
            DateTime::parse_from_rfc3339(text).map_err(|e| invalid(e.to_string()))?;
            Ok(())
        }
        "uuid" => {
            let text = inner.as_str().ok_or_else(|| invalid("expected a string".into()))?;
            Uuid::parse_str(text).map_err(|e| invalid(e.to_string()))?;
            Ok(())
        }
        _ => Ok(()),
    }
}
