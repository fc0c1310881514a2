use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

use json_array_stream::{ArrayStreamParser, CursorError, ParserOptions, StreamError};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct FooBarBaz {
    foo: String,
    bar: i32,
    baz: bool,
}

fn fixture(name: &str) -> File {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", name]
        .iter()
        .collect();
    File::open(&path).unwrap_or_else(|e| panic!("cannot open {}: {e}", path.display()))
}

/// Collects a typed array and every error reported for it.
fn stream_all<T, R>(parser: &ArrayStreamParser, input: R) -> (Vec<T>, Vec<StreamError>)
where
    T: serde::de::DeserializeOwned,
    R: Read,
{
    let mut state = parser.parse(input).unwrap();
    let mut errors = Vec::new();
    let items = state.parse_array(|e| errors.push(e)).collect();
    (items, errors)
}

/// Yields `data`, then fails every read.
struct FailingReader {
    data: Cursor<Vec<u8>>,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
            n => Ok(n),
        }
    }
}

#[test]
fn test_resource_array() {
    let (items, errors) = stream_all::<FooBarBaz, _>(&ArrayStreamParser::new(), fixture("example-list.json"));
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(items.len(), 100);
    assert_eq!(
        items[0],
        FooBarBaz {
            foo: "9d7517c5-50f2-4120-9191-0f973f7139b3".to_owned(),
            bar: 724,
            baz: true,
        }
    );
    assert_eq!(items.iter().map(|i| i.bar as i64).sum::<i64>(), 48368);
    assert_eq!(items.iter().filter(|i| i.baz).count(), 52);
}

#[test]
fn test_small_buffer_gives_same_result() {
    let small = ArrayStreamParser::with_options(ParserOptions {
        read_buffer_size: 7,
        ..Default::default()
    });
    let (a, _) = stream_all::<FooBarBaz, _>(&small, fixture("example-list.json"));
    let (b, _) = stream_all::<FooBarBaz, _>(&ArrayStreamParser::new(), fixture("example-list.json"));
    assert_eq!(a, b);
}

#[test]
fn test_field_array_small() {
    let input = r#"
        {"a" : 1,
            "tostream": [
                {
                  "foo": "cba3cb55-62f2-48bd-bdf9-ef381dc5652b",
                  "bar": 528,
                  "baz": true
                }
            ],
            "b":2
        } "#;
    let mut state = ArrayStreamParser::new().parse(input.as_bytes()).unwrap();
    let mut errors = Vec::new();
    let items: Vec<FooBarBaz> = state
        .parse_field_array("tostream", |e| errors.push(e))
        .collect();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].bar, 528);
    assert_eq!(state.field("a"), Some(&json!(1)));
    assert_eq!(state.field("b"), None);
    state.parse_rest(|e| errors.push(e));
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(state.field("b").map(Value::to_string).as_deref(), Some("2"));
}

#[test]
fn test_field_array_large() {
    let mut state = ArrayStreamParser::new()
        .parse(fixture("example-object.json"))
        .unwrap();
    let mut errors = Vec::new();
    let count = state
        .parse_field_array::<FooBarBaz, _>("tostream", |e| errors.push(e))
        .count();
    assert_eq!(count, 100);
    state.parse_rest(|e| errors.push(e));
    assert!(errors.is_empty(), "{errors:?}");
    let rendered: Vec<(String, String)> = state
        .fields()
        .iter()
        .map(|(k, v)| (k.clone(), v.to_string()))
        .collect();
    assert_eq!(
        rendered,
        [
            ("beforeStr".to_owned(), "\"str\"".to_owned()),
            ("beforeInt".to_owned(), "-7".to_owned()),
            ("afterStr".to_owned(), "\"str\"".to_owned()),
            ("afterInt".to_owned(), "7".to_owned()),
        ]
    );
}

#[test]
fn test_missing_field() {
    let mut state = ArrayStreamParser::new().parse(&br#"{"a": 1}"#[..]).unwrap();
    let mut errors = Vec::new();
    let count = state
        .parse_field_array::<Value, _>("tostream", |e| errors.push(e))
        .count();
    assert_eq!(count, 0);
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], StreamError::MissingField { field, .. } if field == "tostream"));
    assert_eq!(state.field("a"), Some(&json!(1)));
}

#[test]
fn test_field_is_not_an_array() {
    let mut state = ArrayStreamParser::new().parse(&br#"{"tostream": 5}"#[..]).unwrap();
    let mut errors = Vec::new();
    let count = state
        .parse_field_array::<Value, _>("tostream", |e| errors.push(e))
        .count();
    assert_eq!(count, 0);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_structural());
}

#[test]
fn test_root_is_not_an_array() {
    let (items, errors) = stream_all::<Value, _>(&ArrayStreamParser::new(), &br#"{"a": [1]}"#[..]);
    assert!(items.is_empty());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "expected start of array but found start of object");
}

#[test]
fn test_read_failure_mid_array() {
    let reader = FailingReader {
        data: Cursor::new(b"[1, 2, 3, 4".to_vec()),
    };
    let parser = ArrayStreamParser::with_options(ParserOptions {
        read_buffer_size: 4,
        ..Default::default()
    });
    let (items, errors) = stream_all::<u32, _>(&parser, reader);
    // 3 was read completely; the failure comes while looking for the end of 4.
    assert_eq!(items, [1, 2, 3]);
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        StreamError::Io(err) => assert!(err.is_io()),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_read_failure_after_complete_element() {
    let reader = FailingReader {
        data: Cursor::new(b"[1, 2, 3,".to_vec()),
    };
    let (items, errors) = stream_all::<u32, _>(&ArrayStreamParser::new(), reader);
    assert_eq!(items, [1, 2, 3]);
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        StreamError::Io(CursorError::Parse(err)) => {
            assert!(err.is_io());
            assert_eq!(err.location().byte_offset, 9);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_syntax_error_mid_array() {
    let (items, errors) = stream_all::<u32, _>(&ArrayStreamParser::new(), &b"[1, 2, @, 4]"[..]);
    assert_eq!(items, [1, 2]);
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        StreamError::Io(err @ CursorError::Parse(_)) => assert!(!err.is_io()),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_truncated_input() {
    let (items, errors) = stream_all::<u32, _>(&ArrayStreamParser::new(), &b"[1, 2"[..]);
    assert_eq!(items, [1, 2]);
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_nested_arrays() {
    let (items, errors) =
        stream_all::<Vec<Vec<i32>>, _>(&ArrayStreamParser::new(), &b"[[[1], []], [], [[2, 3]]]"[..]);
    assert!(errors.is_empty());
    assert_eq!(items, vec![vec![vec![1], vec![]], vec![], vec![vec![2, 3]]]);
}

#[test]
fn test_untyped_values() {
    let input = br#"[null, true, "s", -1.5, {"k": [1, {"x": null}]}]"#;
    let (items, errors) = stream_all::<Value, _>(&ArrayStreamParser::new(), &input[..]);
    assert!(errors.is_empty());
    assert_eq!(
        items,
        [json!(null), json!(true), json!("s"), json!(-1.5), json!({"k": [1, {"x": null}]})]
    );
}

#[test]
fn test_integers_are_exact() {
    let input = format!("[{}, {}, 9007199254740993]", u64::MAX, i64::MIN);
    let (items, errors) = stream_all::<Value, _>(&ArrayStreamParser::new(), input.as_bytes());
    assert!(errors.is_empty());
    assert_eq!(items[0].as_u64(), Some(u64::MAX));
    assert_eq!(items[1].as_i64(), Some(i64::MIN));
    assert_eq!(items[2].as_u64(), Some(9007199254740993));
}

#[test]
fn test_max_depth() {
    let parser = ArrayStreamParser::with_options(ParserOptions {
        max_depth: 2,
        ..Default::default()
    });
    let (items, errors) = stream_all::<Value, _>(&parser, &b"[[1], [[2]], [3]]"[..]);
    assert_eq!(items, [json!([1])]);
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_large_generated_array() {
    let mut input = String::from("[");
    for i in 0..10_000 {
        if i > 0 {
            input.push(',');
        }
        input.push_str(&format!(r#"{{"foo": "item-{i}", "bar": {i}, "baz": {}}}"#, i % 3 == 0));
    }
    input.push(']');
    let mut state = ArrayStreamParser::new().parse(input.as_bytes()).unwrap();
    let mut errors = Vec::new();
    let mut expected_bar = 0;
    for item in state.parse_array::<FooBarBaz, _>(|e| errors.push(e)) {
        assert_eq!(item.bar, expected_bar);
        expected_bar += 1;
    }
    assert_eq!(expected_bar, 10_000);
    assert!(errors.is_empty());
}

#[test]
fn test_abandoned_stream_reports_nothing() {
    let mut state = ArrayStreamParser::new().parse(&b"[1, 2, @]"[..]).unwrap();
    let mut errors = Vec::new();
    let first: Vec<u32> = state.parse_array(|e| errors.push(e)).take(1).collect();
    assert_eq!(first, [1]);
    assert!(errors.is_empty());
}

#[test]
fn test_into_input() {
    let state = ArrayStreamParser::new()
        .parse(Cursor::new(b"[1]".to_vec()))
        .unwrap();
    let input = state.into_input();
    assert_eq!(input.position(), 3);
}
