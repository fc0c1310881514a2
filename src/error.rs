use json_session::JsonParseError;
use thiserror::Error;

use crate::cursor::TokenKind;

/// A failure of the token cursor to advance or to decode a value.
#[derive(Debug, Error)]
pub enum CursorError {
    /// The tokenizer failed, either on malformed input or on a read error.
    #[error(transparent)]
    Parse(#[from] JsonParseError),

    /// The cursor was asked to decode a token that does not start a value.
    #[error("cannot decode a value at {found}")]
    UnexpectedToken { found: TokenKind },

    /// A number literal that does not fit into a finite `f64`.
    #[error("number {0} is out of range")]
    NumberOutOfRange(f64),

    /// The value was well-formed JSON but did not match the requested type.
    #[error("failed to decode value: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CursorError {
    /// Whether the failure came from reading the input rather than from its contents.
    pub fn is_io(&self) -> bool {
        matches!(self, CursorError::Parse(err) if err.is_io())
    }
}

/// An error reported through the callback of an array stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The document does not have the expected shape at the point where streaming starts.
    #[error("expected {expected} but found {found}")]
    Structural { expected: TokenKind, found: TokenKind },

    /// The object does not contain the requested array field where it was expected.
    #[error("expected field `{field}` but found {found}")]
    MissingField { field: String, found: TokenKind },

    /// The token cursor failed to advance or decode.
    #[error(transparent)]
    Io(#[from] CursorError),
}

impl StreamError {
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            StreamError::Structural { .. } | StreamError::MissingField { .. }
        )
    }
}
