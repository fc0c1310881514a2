use std::io::Read;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::cursor::{SessionCursor, TokenCursor, TokenKind};
use crate::error::{CursorError, StreamError};
use crate::options::ParserOptions;
use crate::sequence::{generate_until_sentinel, LazySequence};

/// The outcome of producing one array element.
#[derive(Debug)]
pub enum Step<T, E> {
    Value(T),
    End,
    Error(E),
}

/// Creates [`ParserState`]s over readers.
///
/// ```rust
/// use json_array_stream::ArrayStreamParser;
///
/// let mut state = ArrayStreamParser::new().parse(&b"[1, 2, 3]"[..]).unwrap();
/// let mut errors = Vec::new();
/// let sum: u32 = state.parse_array::<u32, _>(|e| errors.push(e)).sum();
/// assert_eq!(sum, 6);
/// assert!(errors.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArrayStreamParser {
    options: ParserOptions,
}

impl ArrayStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParserOptions) -> Self {
        ArrayStreamParser { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Starts parsing `input` and reads its first token.
    pub fn parse<R: Read>(&self, input: R) -> Result<ParserState<SessionCursor<R>>, CursorError> {
        ParserState::new(SessionCursor::with_options(input, &self.options))
    }
}

/// The state of one parse: the token cursor plus the object fields collected so far.
pub struct ParserState<C> {
    cursor: C,
    fields: IndexMap<String, Value>,
}

impl<C: TokenCursor> ParserState<C> {
    /// Wraps `cursor` and moves it onto the first token.
    pub fn new(mut cursor: C) -> Result<Self, CursorError> {
        let first = cursor.advance()?;
        trace!(token = %first, "prefetched first token");
        Ok(ParserState {
            cursor,
            fields: IndexMap::new(),
        })
    }

    /// Streams the elements of the array under the cursor.
    ///
    /// Failures never surface through the returned sequence: they are passed to `on_error`,
    /// at most once, and the sequence simply ends. If the cursor is not on the start of an
    /// array, `on_error` is called right away and the sequence is empty.
    pub fn parse_array<'s, T, F>(&'s mut self, mut on_error: F) -> LazySequence<'s, T>
    where
        T: DeserializeOwned + 's,
        F: FnMut(StreamError) + 's,
    {
        match self.array_elements() {
            Ok(elements) => stream_elements(elements, on_error),
            Err(err) => {
                on_error(err);
                LazySequence::empty()
            }
        }
    }

    /// Like [`parse_array`](Self::parse_array), but reports failures in-band as `Err` items.
    pub fn array_elements<T>(&mut self) -> Result<ArrayElements<'_, C, T>, StreamError>
    where
        T: DeserializeOwned,
    {
        expect_start(&mut self.cursor, TokenKind::StartArray)?;
        Ok(ArrayElements::new(&mut self.cursor))
    }

    /// Streams the array stored under `field` in the object under the cursor.
    ///
    /// Properties that come before `field` are decoded and kept in [`fields`](Self::fields).
    /// Once the returned sequence is drained, [`parse_rest`](Self::parse_rest) collects the
    /// properties after it.
    pub fn parse_field_array<'s, T, F>(&'s mut self, field: &str, mut on_error: F) -> LazySequence<'s, T>
    where
        T: DeserializeOwned + 's,
        F: FnMut(StreamError) + 's,
    {
        match self.seek_field_array(field) {
            Ok(()) => stream_elements(ArrayElements::new(&mut self.cursor), on_error),
            Err(err) => {
                on_error(err);
                LazySequence::empty()
            }
        }
    }

    /// Collects the remaining properties of the current object and moves past its end.
    pub fn parse_rest<F>(&mut self, mut on_error: F)
    where
        F: FnMut(StreamError),
    {
        if let Err(err) = self.finish_object() {
            debug!(error = %err, "failed to read remaining fields");
            on_error(err);
        }
    }

    /// The object properties collected so far, in document order.
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn cursor(&self) -> &C {
        &self.cursor
    }

    pub fn into_cursor(self) -> C {
        self.cursor
    }

    fn seek_field_array(&mut self, field: &str) -> Result<(), StreamError> {
        expect_start(&mut self.cursor, TokenKind::StartObject)?;
        self.collect_fields(Some(field))?;
        if self.cursor.current_name() != Some(field) {
            return Err(StreamError::MissingField {
                field: field.to_owned(),
                found: self.cursor.current_token(),
            });
        }
        self.cursor.advance()?;
        expect_start(&mut self.cursor, TokenKind::StartArray)
    }

    /// Decodes properties into `fields` until the cursor leaves them or reaches `stop_at`.
    fn collect_fields(&mut self, stop_at: Option<&str>) -> Result<(), StreamError> {
        while self.cursor.current_token() == TokenKind::FieldName {
            let name = match self.cursor.current_name() {
                Some(name) if Some(name) == stop_at => return Ok(()),
                Some(name) => name.to_owned(),
                None => break,
            };
            self.cursor.advance()?;
            let value = self.cursor.decode_current::<Value>()?;
            self.fields.insert(name, value);
            self.cursor.advance()?;
        }
        Ok(())
    }

    fn finish_object(&mut self) -> Result<(), StreamError> {
        self.collect_fields(None)?;
        if self.cursor.current_token() == TokenKind::EndObject {
            self.cursor.advance()?;
        }
        Ok(())
    }
}

impl<R: Read> ParserState<SessionCursor<R>> {
    /// Returns the reader the document was parsed from.
    pub fn into_input(self) -> R {
        self.cursor.into_inner()
    }
}

fn expect_start<C: TokenCursor>(cursor: &mut C, expected: TokenKind) -> Result<(), StreamError> {
    let found = cursor.current_token();
    if found != expected {
        debug!(%expected, %found, "document does not have the expected shape");
        return Err(StreamError::Structural { expected, found });
    }
    cursor.advance()?;
    trace!(%expected, "entered container");
    Ok(())
}

fn stream_elements<'s, C, T, F>(mut elements: ArrayElements<'s, C, T>, mut on_error: F) -> LazySequence<'s, T>
where
    C: TokenCursor + 's,
    T: DeserializeOwned + 's,
    F: FnMut(StreamError) + 's,
{
    generate_until_sentinel(move |_| match elements.produce_next() {
        Step::Value(value) => Some(value),
        Step::End => None,
        Step::Error(err) => {
            on_error(err);
            None
        }
    })
}

/// Produces the elements of an array whose start token has already been consumed.
pub struct ArrayElements<'c, C, T> {
    cursor: &'c mut C,
    produced: usize,
    /// The last element was decoded but the cursor has not moved past it yet.
    pending_advance: bool,
    finished: bool,
    _item: PhantomData<fn() -> T>,
}

impl<'c, C: TokenCursor, T: DeserializeOwned> ArrayElements<'c, C, T> {
    fn new(cursor: &'c mut C) -> Self {
        ArrayElements {
            cursor,
            produced: 0,
            pending_advance: false,
            finished: false,
            _item: PhantomData,
        }
    }

    /// How many elements have been produced so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Produces the next element. After the first `End` or `Error`, always returns `End`
    /// without touching the cursor again.
    pub fn produce_next(&mut self) -> Step<T, StreamError> {
        if self.finished {
            return Step::End;
        }
        let step = self.step();
        if !matches!(step, Step::Value(_)) {
            self.finished = true;
        }
        step
    }

    fn step(&mut self) -> Step<T, StreamError> {
        if self.pending_advance {
            self.pending_advance = false;
            if let Err(err) = self.cursor.advance() {
                debug!(index = self.produced, error = %err, "failed to read past array element");
                return Step::Error(err.into());
            }
        }
        if self.cursor.current_token() == TokenKind::EndArray {
            return match self.cursor.advance() {
                Ok(_) => {
                    debug!(elements = self.produced, "reached end of array");
                    Step::End
                }
                Err(err) => Step::Error(err.into()),
            };
        }
        match self.cursor.decode_current::<T>() {
            Ok(value) => {
                self.produced += 1;
                self.pending_advance = true;
                Step::Value(value)
            }
            Err(err) => {
                debug!(index = self.produced, error = %err, "failed to read array element");
                Step::Error(err.into())
            }
        }
    }
}

impl<C: TokenCursor, T: DeserializeOwned> Iterator for ArrayElements<'_, C, T> {
    type Item = Result<T, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.produce_next() {
            Step::Value(value) => Some(Ok(value)),
            Step::End => None,
            Step::Error(err) => Some(Err(err)),
        }
    }
}

impl<C: TokenCursor, T: DeserializeOwned> FusedIterator for ArrayElements<'_, C, T> {}
