//! Streaming parser for JSON. [`JsonSession`] pulls bytes from any [`std::io::Read`] and yields
//! events of the following enum variants: `BeginObject`, `ObjectProperty`, `EndObject`,
//! `BeginArray`, `EndArray`, and `PrimitiveValue`.
//!
//! This allows walking over large JSON documents without ever holding the entire document in
//! memory. Read errors are reported as [`JsonParseError`]s whose [`is_io`](JsonParseError::is_io)
//! returns true, so they can be told apart from malformed input.
//!
//! Every event has location information attached to it, saying at which byte offset
//! (and at which line and column) the relevant fragment began or ended.
//!
//! ```
//! use json_session::{JsonNumber, JsonPrimitiveValue, JsonSession, JsonSessionEvent};
//!
//! # fn main() {
//!     let s = r#"{"key1": 1234, "key2": [true], "key3": "value" }"#;
//!     let mut session = JsonSession::new(s.as_bytes());
//!     session.next_event().unwrap(); // JsonSessionEvent::BeginObject
//!     session.next_event().unwrap(); // JsonSessionEvent::ObjectProperty { property_key: "key1", .. }
//!     match session.next_event().unwrap() {
//!         Some(JsonSessionEvent::PrimitiveValue { value, .. }) => {
//!             assert_eq!(value, JsonPrimitiveValue::Number(JsonNumber::PosInt(1234)));
//!         }
//!         other => panic!("unexpected event {other:?}"),
//!     }
//!     session.next_event().unwrap(); // JsonSessionEvent::ObjectProperty { property_key: "key2", .. }
//!     session.next_event().unwrap(); // JsonSessionEvent::BeginArray
//!     session.next_event().unwrap(); // JsonSessionEvent::PrimitiveValue(Boolean(true))
//!     session.next_event().unwrap(); // JsonSessionEvent::EndArray
//!     session.next_event().unwrap(); // JsonSessionEvent::ObjectProperty { property_key: "key3", .. }
//!     session.next_event().unwrap(); // JsonSessionEvent::PrimitiveValue(String("value"))
//!     session.next_event().unwrap(); // JsonSessionEvent::EndObject
//!     assert!(session.next_event().unwrap().is_none());
//! # }
//! ```

mod session;
mod source;
mod tokenizer;

pub use session::*;
pub use source::*;
pub use tokenizer::*;
