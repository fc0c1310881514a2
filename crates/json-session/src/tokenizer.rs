use std::fmt;
use std::io::{self, Read};

use smallvec::SmallVec;

use crate::source::ByteSource;

/// A JSON number. Integers stay exact as long as they fit into 64 bits.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum JsonNumber {
    PosInt(u64),
    NegInt(i64),
    Float(f64),
}

/// A JSON token.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum JsonToken {
    Number(JsonNumber),
    True,
    False,
    String(String),
    Null,
    ArrayOpen,
    Comma,
    ArrayClose,
    ObjOpen,
    Colon,
    ObjClose,
}

/// A byte offset and the corresponding line and column number.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub byte_offset: u64,
    pub line: u64,
    pub col: u64,
}

impl Location {
    fn advance_by_byte(&mut self, c: u8) {
        if c == b'\n' {
            self.col = 0;
            self.line += 1;
        } else {
            self.col += 1;
        }
        self.byte_offset += 1;
    }
}

/// What went wrong in a [`JsonParseError`].
#[derive(Debug)]
pub enum JsonParseErrorKind {
    /// The input is not valid JSON.
    Syntax(String),
    /// Reading from the underlying reader failed.
    Io(io::Error),
}

/// The error type used in this crate. Comes with Location information.
#[derive(Debug)]
pub struct JsonParseError {
    kind: JsonParseErrorKind,
    location: Location,
}

impl JsonParseError {
    /// Creates a new syntax error.
    pub fn new(msg: String, location: Location) -> JsonParseError {
        JsonParseError {
            kind: JsonParseErrorKind::Syntax(msg),
            location,
        }
    }

    /// Wraps an error from the underlying reader.
    pub fn io(err: io::Error, location: Location) -> JsonParseError {
        JsonParseError {
            kind: JsonParseErrorKind::Io(err),
            location,
        }
    }

    pub fn kind(&self) -> &JsonParseErrorKind {
        &self.kind
    }

    /// Whether this error came from the reader rather than from the document.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, JsonParseErrorKind::Io(_))
    }

    /// The location in the source document at which the error was encountered.
    pub fn location(&self) -> Location {
        self.location
    }
}

impl fmt::Display for JsonParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            JsonParseErrorKind::Syntax(msg) => write!(
                f,
                "Parse error at line:{}, col:{}: {}",
                self.location.line, self.location.col, msg,
            ),
            JsonParseErrorKind::Io(err) => write!(
                f,
                "Read error at line:{}, col:{}: {}",
                self.location.line, self.location.col, err,
            ),
        }
    }
}

impl std::error::Error for JsonParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            JsonParseErrorKind::Io(err) => Some(err),
            JsonParseErrorKind::Syntax(_) => None,
        }
    }
}

/// A type alias for `Result<T, JsonParseError>`.
pub type JsonParseResult<T> = Result<T, JsonParseError>;

// Note: char::is_ascii_whitespace is not available because some characters are not defined as
// whitespace character in JSON spec. For example, U+000C FORM FEED is whitespace in Rust but
// it isn't in JSON.
fn is_whitespace(c: u8) -> bool {
    matches!(c, 0x20 | 0xa | 0xd | 0x9)
}

/// A pull-based tokenizer which reads bytes from an [`io::Read`] and emits [`JsonToken`]s.
pub struct JsonTokenizer<R> {
    bytes: ByteSource<R>,
    location: Location,
}

impl<R: Read> JsonTokenizer<R> {
    /// Create a new [`JsonTokenizer`]
    pub fn new(reader: R) -> Self {
        Self::from_source(ByteSource::new(reader))
    }

    pub fn from_source(bytes: ByteSource<R>) -> Self {
        JsonTokenizer {
            bytes,
            location: Location::default(),
        }
    }

    /// The location of the token that will be returned by the next call to `next_token()`.
    ///
    /// If there is whitespace before the next token, this is the location of that whitespace.
    pub fn location(&self) -> Location {
        self.location
    }

    pub fn get_ref(&self) -> &R {
        self.bytes.get_ref()
    }

    pub fn into_inner(self) -> R {
        self.bytes.into_inner()
    }

    /// Returns an error if there is more than just white space in the remaining bytes.
    pub fn expect_eof(&mut self) -> JsonParseResult<()> {
        match self.skip_whitespace()? {
            Some(b) => self.err(format!("Expected EOF but found byte {b:#x}")),
            None => Ok(()),
        }
    }

    /// Parses a token and returns it, or an error.
    pub fn next_token(&mut self) -> JsonParseResult<JsonToken> {
        let Some(b) = self.skip_whitespace()? else {
            return Err(self.eof_err());
        };
        let token = match b {
            b'[' => JsonToken::ArrayOpen,
            b']' => JsonToken::ArrayClose,
            b'{' => JsonToken::ObjOpen,
            b'}' => JsonToken::ObjClose,
            b':' => JsonToken::Colon,
            b',' => JsonToken::Comma,
            b'0'..=b'9' | b'-' => return self.consume_number(),
            b'"' => return self.consume_string(),
            b't' => return self.consume_literal("true", JsonToken::True),
            b'f' => return self.consume_literal("false", JsonToken::False),
            b'n' => return self.consume_literal("null", JsonToken::Null),
            c => return self.err(format!("Invalid byte: {c:#x}")),
        };
        self.bump(b);
        Ok(token)
    }

    fn err<T>(&self, msg: String) -> JsonParseResult<T> {
        Err(JsonParseError::new(msg, self.location))
    }

    fn eof_err(&self) -> JsonParseError {
        JsonParseError::new(String::from("Unexpected EOF"), self.location)
    }

    fn peek_byte(&mut self) -> JsonParseResult<Option<u8>> {
        let location = self.location;
        self.bytes
            .peek()
            .map_err(|err| JsonParseError::io(err, location))
    }

    /// Consumes a byte that was just returned by `peek_byte()`.
    fn bump(&mut self, b: u8) {
        self.bytes.consume();
        self.location.advance_by_byte(b);
    }

    fn consume_byte(&mut self) -> JsonParseResult<u8> {
        match self.peek_byte()? {
            Some(b) => {
                self.bump(b);
                Ok(b)
            }
            None => Err(self.eof_err()),
        }
    }

    fn skip_whitespace(&mut self) -> JsonParseResult<Option<u8>> {
        while let Some(b) = self.peek_byte()? {
            if !is_whitespace(b) {
                return Ok(Some(b));
            }
            self.bump(b);
        }
        Ok(None)
    }

    fn consume_literal(
        &mut self,
        literal: &'static str,
        token: JsonToken,
    ) -> JsonParseResult<JsonToken> {
        for &expected in literal.as_bytes() {
            let b = self.consume_byte()?;
            if b != expected {
                return self.err(format!("Unexpected byte {b:#x} while parsing '{literal}'"));
            }
        }
        Ok(token)
    }

    fn consume_string(&mut self) -> JsonParseResult<JsonToken> {
        self.consume_byte()?; // opening quote

        let mut s = SmallVec::<[u8; 32]>::new();
        loop {
            match self.consume_byte()? {
                b'"' => break,
                b'\\' => self.consume_escape(&mut s)?,
                // JSON accepts 0x7f (DEL) in string literals, so c.is_control() is too strict.
                b if b < 0x20 => {
                    return self.err(format!("Unexpected control character {b:#x} in string"));
                }
                b => s.push(b),
            }
        }

        match String::from_utf8(s.into_vec()) {
            Ok(s) => Ok(JsonToken::String(s)),
            Err(_) => self.err("Invalid UTF-8 in string".into()),
        }
    }

    fn consume_escape(&mut self, s: &mut SmallVec<[u8; 32]>) -> JsonParseResult<()> {
        let b = match self.consume_byte()? {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x8,
            b'f' => 0xc,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                let c = self.consume_unicode_escape()?;
                s.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
                return Ok(());
            }
            b => return self.err(format!("{b:#x} is invalid escaped character")),
        };
        s.push(b);
        Ok(())
    }

    /// Decodes the `XXXX` of a `\uXXXX` escape, plus the low surrogate escape that must follow
    /// a high surrogate.
    fn consume_unicode_escape(&mut self) -> JsonParseResult<char> {
        let high = self.consume_hex4()?;
        let code_point = match high {
            0xD800..=0xDBFF => {
                if self.consume_byte()? != b'\\' || self.consume_byte()? != b'u' {
                    return self.err(format!(
                        "UTF-16 surrogate {high:#x} must be directly followed by a second \\uXXXX surrogate"
                    ));
                }
                let low = self.consume_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return self.err(format!(
                        "UTF-16 surrogate {high:#x} must be followed by a second surrogate, but found {low:#x}"
                    ));
                }
                0x1_0000 + ((u32::from(high & 0x3ff) << 10) | u32::from(low & 0x3ff))
            }
            0xDC00..=0xDFFF => {
                return self.err(format!("Unpaired UTF-16 second surrogate: {high:#x}"));
            }
            u => u32::from(u),
        };
        match char::from_u32(code_point) {
            Some(c) => Ok(c),
            None => self.err(format!("Invalid code point {code_point:#x}")),
        }
    }

    fn consume_hex4(&mut self) -> JsonParseResult<u16> {
        let mut value = 0u16;
        for _ in 0..4 {
            let b = self.consume_byte()?;
            match char::from(b).to_digit(16) {
                Some(digit) => value = (value << 4) | digit as u16,
                None => {
                    return self.err(format!(
                        "Unicode character must be \\uXXXX (X is hex character) format but found byte {b:#x}"
                    ))
                }
            }
        }
        Ok(value)
    }

    /// Pushes ASCII digits onto `text` and returns how many there were.
    fn take_digits(&mut self, text: &mut SmallVec<[u8; 24]>) -> JsonParseResult<usize> {
        let mut count = 0;
        while let Some(b @ b'0'..=b'9') = self.peek_byte()? {
            text.push(b);
            self.bump(b);
            count += 1;
        }
        Ok(count)
    }

    fn consume_number(&mut self) -> JsonParseResult<JsonToken> {
        let mut text = SmallVec::<[u8; 24]>::new();
        let negative = self.peek_byte()? == Some(b'-');
        if negative {
            text.push(self.consume_byte()?);
        }

        let int_start = text.len();
        let int_len = self.take_digits(&mut text)?;
        if int_len == 0 {
            return self.err("Integer part must not be empty in number literal".to_string());
        }
        if int_len > 1 && text[int_start] == b'0' {
            return self.err("Integer part of number must not start with 0 except for '0'".to_string());
        }

        let mut is_float = false;
        if self.peek_byte()? == Some(b'.') {
            is_float = true;
            text.push(self.consume_byte()?);
            if self.take_digits(&mut text)? == 0 {
                return self.err("Fraction part of number must not be empty".to_string());
            }
        }

        if let Some(b'e' | b'E') = self.peek_byte()? {
            is_float = true;
            text.push(self.consume_byte()?);
            if let Some(b'+' | b'-') = self.peek_byte()? {
                text.push(self.consume_byte()?);
            }
            if self.take_digits(&mut text)? == 0 {
                return self.err("Exponent part must not be empty in number literal".to_string());
            }
        }

        // Only ASCII digits and signs were pushed.
        let text = String::from_utf8_lossy(&text);
        let integer = if is_float {
            None
        } else if negative {
            text.parse::<i64>().ok().map(JsonNumber::NegInt)
        } else {
            text.parse::<u64>().ok().map(JsonNumber::PosInt)
        };
        if let Some(n) = integer {
            return Ok(JsonToken::Number(n));
        }
        match text.parse::<f64>() {
            Ok(n) => Ok(JsonToken::Number(JsonNumber::Float(n))),
            Err(err) => self.err(format!("Invalid number literal '{text}': {err}")),
        }
    }
}
