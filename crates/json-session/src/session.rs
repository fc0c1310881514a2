use std::io::Read;

use smallvec::SmallVec;

use crate::source::ByteSource;
use crate::tokenizer::{JsonNumber, JsonParseError, JsonParseResult, JsonToken, JsonTokenizer, Location};

/// How deeply arrays and objects may be nested unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone)]
pub enum JsonSessionEvent {
    BeginObject {
        location_at_obj_start: Location,
    },
    ObjectProperty {
        property_key: String,
        location_at_prop_key_start: Location,
    },
    EndObject {
        location_after_obj_end: Location,
    },
    BeginArray {
        location_at_array_start: Location,
    },
    EndArray {
        location_after_array_end: Location,
    },
    PrimitiveValue {
        value: JsonPrimitiveValue,
        location_at_value_start: Location,
        location_after_value_end: Location,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsonPrimitiveValue {
    Number(JsonNumber),
    Boolean(bool),
    String(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Array,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// A value is expected next: the document root, an array item after a comma, or a
    /// property value after a colon.
    ExpectValue,
    /// Just after `[`: either `]` or the first item.
    ArrayOpened,
    /// Just after `{`: either `}` or the first key.
    ObjectOpened,
    /// A value was completed; the innermost container decides what may follow.
    AfterValue,
    Done,
}

/// Turns the tokens of a single JSON document into a flat sequence of [`JsonSessionEvent`]s.
pub struct JsonSession<R> {
    tokenizer: JsonTokenizer<R>,
    stack: SmallVec<[Container; 16]>,
    state: SessionState,
    max_depth: usize,
}

impl<R: Read> JsonSession<R> {
    pub fn new(reader: R) -> Self {
        Self::from_tokenizer(JsonTokenizer::new(reader))
    }

    /// Creates a session which reads from `reader` in chunks of `capacity` bytes.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self::from_tokenizer(JsonTokenizer::from_source(ByteSource::with_capacity(
            reader, capacity,
        )))
    }

    fn from_tokenizer(tokenizer: JsonTokenizer<R>) -> Self {
        JsonSession {
            tokenizer,
            stack: SmallVec::new(),
            state: SessionState::ExpectValue,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets how many arrays and objects may be open at the same time.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The number of currently open arrays and objects.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn location(&self) -> Location {
        self.tokenizer.location()
    }

    pub fn get_ref(&self) -> &R {
        self.tokenizer.get_ref()
    }

    pub fn into_inner(self) -> R {
        self.tokenizer.into_inner()
    }

    /// Returns the next event, or `None` once the document is complete and only whitespace
    /// follows it.
    pub fn next_event(&mut self) -> JsonParseResult<Option<JsonSessionEvent>> {
        loop {
            match self.state {
                SessionState::Done => return Ok(None),
                SessionState::ExpectValue => {
                    let location = self.tokenizer.location();
                    let token = self.tokenizer.next_token()?;
                    return self.begin_value(token, location).map(Some);
                }
                SessionState::ArrayOpened => {
                    let location = self.tokenizer.location();
                    let token = self.tokenizer.next_token()?;
                    if token == JsonToken::ArrayClose {
                        return Ok(Some(self.close(Container::Array)));
                    }
                    return self.begin_value(token, location).map(Some);
                }
                SessionState::ObjectOpened => {
                    let location = self.tokenizer.location();
                    let token = self.tokenizer.next_token()?;
                    if token == JsonToken::ObjClose {
                        return Ok(Some(self.close(Container::Object)));
                    }
                    return self.property_key(token, location).map(Some);
                }
                SessionState::AfterValue => {
                    let Some(&container) = self.stack.last() else {
                        self.tokenizer.expect_eof()?;
                        self.state = SessionState::Done;
                        continue;
                    };
                    let location = self.tokenizer.location();
                    let token = self.tokenizer.next_token()?;
                    match (container, token) {
                        (Container::Array, JsonToken::Comma) => {
                            self.state = SessionState::ExpectValue;
                        }
                        (Container::Array, JsonToken::ArrayClose) => {
                            return Ok(Some(self.close(Container::Array)));
                        }
                        (Container::Object, JsonToken::Comma) => {
                            let location = self.tokenizer.location();
                            let token = self.tokenizer.next_token()?;
                            return self.property_key(token, location).map(Some);
                        }
                        (Container::Object, JsonToken::ObjClose) => {
                            return Ok(Some(self.close(Container::Object)));
                        }
                        (Container::Array, token) => {
                            return Err(JsonParseError::new(
                                format!(
                                    "',' or ']' is expected for array but actually found '{token:?}'"
                                ),
                                location,
                            ));
                        }
                        (Container::Object, token) => {
                            return Err(JsonParseError::new(
                                format!(
                                    "',' or '}}' is expected for object but actually found '{token:?}'"
                                ),
                                location,
                            ));
                        }
                    }
                }
            }
        }
    }

    fn begin_value(
        &mut self,
        token: JsonToken,
        location: Location,
    ) -> JsonParseResult<JsonSessionEvent> {
        let value = match token {
            JsonToken::Number(n) => JsonPrimitiveValue::Number(n),
            JsonToken::True => JsonPrimitiveValue::Boolean(true),
            JsonToken::False => JsonPrimitiveValue::Boolean(false),
            JsonToken::String(s) => JsonPrimitiveValue::String(s),
            JsonToken::Null => JsonPrimitiveValue::Null,
            JsonToken::ArrayOpen => {
                self.open(Container::Array, location)?;
                return Ok(JsonSessionEvent::BeginArray {
                    location_at_array_start: location,
                });
            }
            JsonToken::ObjOpen => {
                self.open(Container::Object, location)?;
                return Ok(JsonSessionEvent::BeginObject {
                    location_at_obj_start: location,
                });
            }
            t @ (JsonToken::Comma | JsonToken::ArrayClose | JsonToken::Colon | JsonToken::ObjClose) => {
                return Err(JsonParseError::new(format!("Unexpected token {t:?}"), location));
            }
        };
        self.state = SessionState::AfterValue;
        Ok(JsonSessionEvent::PrimitiveValue {
            value,
            location_at_value_start: location,
            location_after_value_end: self.tokenizer.location(),
        })
    }

    fn property_key(
        &mut self,
        token: JsonToken,
        location: Location,
    ) -> JsonParseResult<JsonSessionEvent> {
        let property_key = match token {
            JsonToken::String(s) => s,
            other_token => {
                return Err(JsonParseError::new(
                    format!("Key of object must be string but found {other_token:?}"),
                    location,
                ))
            }
        };

        let colon_location = self.tokenizer.location();
        let token = self.tokenizer.next_token()?;
        if token != JsonToken::Colon {
            return Err(JsonParseError::new(
                format!("':' is expected after key of object but actually found '{token:?}'"),
                colon_location,
            ));
        }

        self.state = SessionState::ExpectValue;
        Ok(JsonSessionEvent::ObjectProperty {
            property_key,
            location_at_prop_key_start: location,
        })
    }

    fn open(&mut self, container: Container, location: Location) -> JsonParseResult<()> {
        if self.stack.len() >= self.max_depth {
            return Err(JsonParseError::new(
                format!("Nesting depth exceeds the limit of {}", self.max_depth),
                location,
            ));
        }
        self.stack.push(container);
        self.state = match container {
            Container::Array => SessionState::ArrayOpened,
            Container::Object => SessionState::ObjectOpened,
        };
        Ok(())
    }

    fn close(&mut self, container: Container) -> JsonSessionEvent {
        debug_assert_eq!(self.stack.last(), Some(&container));
        self.stack.pop();
        self.state = SessionState::AfterValue;
        let location = self.tokenizer.location();
        match container {
            Container::Array => JsonSessionEvent::EndArray {
                location_after_array_end: location,
            },
            Container::Object => JsonSessionEvent::EndObject {
                location_after_obj_end: location,
            },
        }
    }
}

#[cfg(feature = "fallible-iterator")]
impl<R: Read> fallible_iterator::FallibleIterator for JsonSession<R> {
    type Item = JsonSessionEvent;
    type Error = JsonParseError;

    fn next(&mut self) -> Result<Option<Self::Item>, Self::Error> {
        self.next_event()
    }
}

#[cfg(test)]
mod test {
    use std::io;

    use super::*;

    fn get(s: &str) -> (Vec<JsonSessionEvent>, Option<JsonParseError>) {
        get_from(JsonSession::new(s.as_bytes()))
    }

    fn get_from<R: Read>(mut session: JsonSession<R>) -> (Vec<JsonSessionEvent>, Option<JsonParseError>) {
        let mut v = Vec::new();
        loop {
            match session.next_event() {
                Ok(Some(ev)) => v.push(ev),
                Ok(None) => return (v, None),
                Err(e) => return (v, Some(e)),
            }
        }
    }

    #[test]
    fn test_basic() {
        let s =
            r#"{"propertyKey": 1234, "arr": [], "obj": {}, "arr2": [null, false, true, -0.54e2] }"#;
        let (v, e) = get(s);
        assert!(e.is_none());
        assert_eq!(v.len(), 17);
    }

    #[test]
    fn test_primitive_root() {
        let (v, e) = get(" 42 ");
        assert!(e.is_none());
        assert!(matches!(
            &v[..],
            [JsonSessionEvent::PrimitiveValue {
                value: JsonPrimitiveValue::Number(JsonNumber::PosInt(42)),
                ..
            }]
        ));
    }

    #[test]
    fn test_done_is_stable() {
        let mut session = JsonSession::new("[]".as_bytes());
        assert!(session.next_event().unwrap().is_some());
        assert!(session.next_event().unwrap().is_some());
        assert!(session.next_event().unwrap().is_none());
        assert!(session.next_event().unwrap().is_none());
    }

    #[test]
    fn test_trailing_garbage() {
        let (v, e) = get("[1] 2");
        assert_eq!(v.len(), 3);
        assert!(e.unwrap().to_string().contains("Expected EOF"));
    }

    #[test]
    fn test_missing_comma() {
        let (v, e) = get("[1 2]");
        assert_eq!(v.len(), 2);
        assert!(e.unwrap().to_string().contains("',' or ']'"));
    }

    #[test]
    fn test_max_depth() {
        let (v, e) = get_from(JsonSession::new("[[[1]]]".as_bytes()).with_max_depth(2));
        assert_eq!(v.len(), 2);
        assert!(e.unwrap().to_string().contains("Nesting depth"));

        let (_, e) = get_from(JsonSession::new("[[[1]]]".as_bytes()).with_max_depth(3));
        assert!(e.is_none());
    }

    #[test]
    fn test_read_error_is_reported_as_io() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("unplugged"))
            }
        }
        let (v, e) = get_from(JsonSession::new(Broken));
        assert!(v.is_empty());
        assert!(e.unwrap().is_io());
    }

    #[test]
    fn test_depth_tracks_open_containers() {
        let mut session = JsonSession::new(r#"{"a": [1]}"#.as_bytes());
        session.next_event().unwrap();
        assert_eq!(session.depth(), 1);
        session.next_event().unwrap();
        session.next_event().unwrap();
        assert_eq!(session.depth(), 2);
        session.next_event().unwrap();
        session.next_event().unwrap();
        assert_eq!(session.depth(), 1);
        session.next_event().unwrap();
        assert_eq!(session.depth(), 0);
    }

    #[cfg(feature = "fallible-iterator")]
    #[test]
    fn test_fallible_iterator() {
        use fallible_iterator::FallibleIterator;

        let events: Vec<JsonSessionEvent> = JsonSession::new("[1, [true]]".as_bytes())
            .collect()
            .unwrap();
        assert_eq!(events.len(), 6);
        assert!(matches!(events[0], JsonSessionEvent::BeginArray { .. }));

        let err = JsonSession::new("[1, @]".as_bytes()).count().unwrap_err();
        assert!(!err.is_io());
    }
}
