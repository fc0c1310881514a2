use json_session::{DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_DEPTH};

/// Configuration for [`ArrayStreamParser`](crate::ArrayStreamParser).
///
/// ```rust
/// use json_array_stream::{ArrayStreamParser, ParserOptions};
///
/// let parser = ArrayStreamParser::with_options(ParserOptions {
///     max_depth: 16,
///     ..Default::default()
/// });
/// # let _ = parser;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// How many bytes are read from the input at a time.
    ///
    /// # Default
    ///
    /// 4096
    pub read_buffer_size: usize,

    /// How deeply arrays and objects may be nested, counting the streamed array itself.
    /// Deeper documents fail with a parse error.
    ///
    /// # Default
    ///
    /// 128
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            read_buffer_size: DEFAULT_BUFFER_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
