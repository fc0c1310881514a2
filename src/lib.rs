//! Lazy, single-pass sequences and a streaming reader for large JSON arrays.
//!
//! The first half of this crate is a small set of pull-based sequence building blocks:
//! [`generate_until_sentinel`], [`limit_while`], [`action_sequence`], [`concat`],
//! [`append_action`] and [`with_auto_close`]. All of them produce a [`LazySequence`], which is
//! an ordinary [`Iterator`] that may also carry close handlers.
//!
//! The second half, [`ArrayStreamParser`], uses them to turn a JSON array of any size into a
//! sequence of decoded elements. Only one element is held in memory at a time:
//!
//! ```rust
//! use json_array_stream::ArrayStreamParser;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Entry {
//!     name: String,
//! }
//!
//! let input = r#"[{"name": "a"}, {"name": "b"}]"#;
//! let mut state = ArrayStreamParser::new().parse(input.as_bytes()).unwrap();
//! let mut failure = None;
//! let names: Vec<String> = state
//!     .parse_array::<Entry, _>(|err| failure = Some(err))
//!     .map(|entry| entry.name)
//!     .collect();
//! assert_eq!(names, ["a", "b"]);
//! assert!(failure.is_none());
//! ```
//!
//! Failures do not show up as items of the sequence. They are handed to a callback, at most
//! once per sequence, and the sequence ends.

mod action;
mod array_stream;
mod combinators;
mod cursor;
mod error;
mod options;
mod sequence;
mod value_builder;

pub use action::{action_sequence, ActionSequence};
pub use array_stream::{ArrayElements, ArrayStreamParser, ParserState, Step};
pub use combinators::{append_action, concat, with_auto_close, AutoClose, Concat, SequenceExt};
pub use cursor::{SessionCursor, TokenCursor, TokenKind};
pub use error::{CursorError, StreamError};
pub use options::ParserOptions;
pub use sequence::{generate_until_sentinel, limit_while, until_sentinel, LazySequence, LimitWhile, UntilNone};

pub use json_session::{JsonParseError, Location};
