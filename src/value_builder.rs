use std::io::Read;

use json_session::{JsonNumber, JsonPrimitiveValue, JsonSession, JsonSessionEvent};
use serde_json::{Map, Number, Value};
use smallvec::SmallVec;

use crate::cursor::TokenKind;
use crate::error::CursorError;

enum Frame {
    Array(Vec<Value>),
    Object(Map<String, Value>, Option<String>),
}

/// Assembles one complete value from session events.
#[derive(Default)]
struct ValueBuilder {
    stack: SmallVec<[Frame; 8]>,
}

impl ValueBuilder {
    /// Feeds one event; returns the value once it is complete.
    fn push_event(&mut self, event: JsonSessionEvent) -> Result<Option<Value>, CursorError> {
        match event {
            JsonSessionEvent::BeginObject { .. } => {
                self.stack.push(Frame::Object(Map::new(), None));
                Ok(None)
            }
            JsonSessionEvent::ObjectProperty { property_key, .. } => match self.stack.last_mut() {
                Some(Frame::Object(_, key)) => {
                    *key = Some(property_key);
                    Ok(None)
                }
                _ => Err(CursorError::UnexpectedToken {
                    found: TokenKind::FieldName,
                }),
            },
            JsonSessionEvent::EndObject { .. } => match self.stack.pop() {
                Some(Frame::Object(map, None)) => self.put_value(Value::Object(map)),
                _ => Err(CursorError::UnexpectedToken {
                    found: TokenKind::EndObject,
                }),
            },
            JsonSessionEvent::BeginArray { .. } => {
                self.stack.push(Frame::Array(Vec::new()));
                Ok(None)
            }
            JsonSessionEvent::EndArray { .. } => match self.stack.pop() {
                Some(Frame::Array(items)) => self.put_value(Value::Array(items)),
                _ => Err(CursorError::UnexpectedToken {
                    found: TokenKind::EndArray,
                }),
            },
            JsonSessionEvent::PrimitiveValue { value, .. } => {
                let value = primitive_to_value(value)?;
                self.put_value(value)
            }
        }
    }

    fn put_value(&mut self, value: Value) -> Result<Option<Value>, CursorError> {
        match self.stack.last_mut() {
            None => Ok(Some(value)),
            Some(Frame::Array(items)) => {
                items.push(value);
                Ok(None)
            }
            Some(Frame::Object(map, key)) => match key.take() {
                Some(key) => {
                    map.insert(key, value);
                    Ok(None)
                }
                None => Err(CursorError::UnexpectedToken {
                    found: TokenKind::Value,
                }),
            },
        }
    }
}

fn primitive_to_value(value: JsonPrimitiveValue) -> Result<Value, CursorError> {
    Ok(match value {
        JsonPrimitiveValue::Number(JsonNumber::PosInt(n)) => Value::Number(n.into()),
        JsonPrimitiveValue::Number(JsonNumber::NegInt(n)) => Value::Number(n.into()),
        JsonPrimitiveValue::Number(JsonNumber::Float(n)) => match Number::from_f64(n) {
            Some(n) => Value::Number(n),
            None => return Err(CursorError::NumberOutOfRange(n)),
        },
        JsonPrimitiveValue::Boolean(b) => Value::Bool(b),
        JsonPrimitiveValue::String(s) => Value::String(s),
        JsonPrimitiveValue::Null => Value::Null,
    })
}

/// Reads the value that starts with `first`, pulling the rest of its events from `session`.
///
/// Afterwards the session is positioned right after the value.
pub(crate) fn read_value<R: Read>(
    first: JsonSessionEvent,
    session: &mut JsonSession<R>,
) -> Result<Value, CursorError> {
    let mut builder = ValueBuilder::default();
    let mut event = first;
    loop {
        if let Some(value) = builder.push_event(event)? {
            return Ok(value);
        }
        event = match session.next_event()? {
            Some(event) => event,
            None => {
                return Err(CursorError::UnexpectedToken {
                    found: TokenKind::NotAvailable,
                })
            }
        };
    }
}
