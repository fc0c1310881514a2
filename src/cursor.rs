use std::fmt;
use std::io::Read;

use json_session::{JsonSession, JsonSessionEvent, Location};
use serde::de::DeserializeOwned;

use crate::error::CursorError;
use crate::options::ParserOptions;
use crate::value_builder::read_value;

/// The kind of token under a [`TokenCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    StartArray,
    EndArray,
    StartObject,
    EndObject,
    /// An object key; the cursor's `current_name()` returns it.
    FieldName,
    /// A string, number, boolean or null.
    Value,
    /// Nothing is under the cursor: before the first token or after the end of the document.
    NotAvailable,
}

impl TokenKind {
    fn of(event: &JsonSessionEvent) -> TokenKind {
        match event {
            JsonSessionEvent::BeginArray { .. } => TokenKind::StartArray,
            JsonSessionEvent::EndArray { .. } => TokenKind::EndArray,
            JsonSessionEvent::BeginObject { .. } => TokenKind::StartObject,
            JsonSessionEvent::EndObject { .. } => TokenKind::EndObject,
            JsonSessionEvent::ObjectProperty { .. } => TokenKind::FieldName,
            JsonSessionEvent::PrimitiveValue { .. } => TokenKind::Value,
        }
    }

    /// Whether a value can be decoded starting at this token.
    pub fn starts_value(self) -> bool {
        matches!(
            self,
            TokenKind::StartArray | TokenKind::StartObject | TokenKind::Value
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::StartArray => "start of array",
            TokenKind::EndArray => "end of array",
            TokenKind::StartObject => "start of object",
            TokenKind::EndObject => "end of object",
            TokenKind::FieldName => "field name",
            TokenKind::Value => "value",
            TokenKind::NotAvailable => "end of input",
        })
    }
}

/// A forward-only cursor over JSON tokens with one token of lookahead.
///
/// The cursor starts out on [`TokenKind::NotAvailable`]; the first `advance()` moves it onto
/// the first token of the document.
pub trait TokenCursor {
    /// The kind of the token under the cursor.
    fn current_token(&self) -> TokenKind;

    /// The key, if the cursor is on a [`TokenKind::FieldName`].
    fn current_name(&self) -> Option<&str> {
        None
    }

    /// Moves to the next token and returns its kind.
    fn advance(&mut self) -> Result<TokenKind, CursorError>;

    /// Decodes the value that starts at the current token.
    ///
    /// The whole value is consumed, including any nested arrays and objects. The cursor does
    /// not move on: it is left on [`TokenKind::NotAvailable`] until the next `advance()`, so a
    /// failure to read past the value never costs the value itself.
    fn decode_current<T: DeserializeOwned>(&mut self) -> Result<T, CursorError>;
}

/// A [`TokenCursor`] over a [`JsonSession`] reading from `R`.
pub struct SessionCursor<R> {
    session: JsonSession<R>,
    current: Option<JsonSessionEvent>,
}

impl<R: Read> SessionCursor<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, &ParserOptions::default())
    }

    pub fn with_options(reader: R, options: &ParserOptions) -> Self {
        SessionCursor {
            session: JsonSession::with_capacity(reader, options.read_buffer_size)
                .with_max_depth(options.max_depth),
            current: None,
        }
    }

    /// Where the tokenizer currently is in the input.
    pub fn location(&self) -> Location {
        self.session.location()
    }

    pub fn get_ref(&self) -> &R {
        self.session.get_ref()
    }

    /// Returns the reader. Input that was already buffered is lost.
    pub fn into_inner(self) -> R {
        self.session.into_inner()
    }
}

impl<R: Read> TokenCursor for SessionCursor<R> {
    fn current_token(&self) -> TokenKind {
        self.current
            .as_ref()
            .map_or(TokenKind::NotAvailable, TokenKind::of)
    }

    fn current_name(&self) -> Option<&str> {
        match &self.current {
            Some(JsonSessionEvent::ObjectProperty { property_key, .. }) => Some(property_key.as_str()),
            _ => None,
        }
    }

    fn advance(&mut self) -> Result<TokenKind, CursorError> {
        self.current = self.session.next_event()?;
        Ok(self.current_token())
    }

    fn decode_current<T: DeserializeOwned>(&mut self) -> Result<T, CursorError> {
        let found = self.current_token();
        if !found.starts_value() {
            return Err(CursorError::UnexpectedToken { found });
        }
        let Some(first) = self.current.take() else {
            return Err(CursorError::UnexpectedToken { found });
        };
        let value = read_value(first, &mut self.session)?;
        Ok(serde_json::from_value(value)?)
    }
}
