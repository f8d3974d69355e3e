//! Per-input text buffer

mod decode;

pub use decode::Encoding;
pub(crate) use decode::Decoder;

/// Accumulated, not yet consumed text of one input.
///
/// Text is only appended until a match succeeds; the matched prefix is
/// then removed with [`consume`](InputBuffer::consume). The buffer is owned
/// by its input engine and only touched by the task calling `expect`.
#[derive(Debug, Default)]
pub(crate) struct InputBuffer {
    text: String,
}

impl InputBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, data: &str) {
        self.text.push_str(data);
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.text
    }

    /// Mutable access for filters that rewrite the buffer after an append.
    pub(crate) fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    /// Remove everything before `end`.
    ///
    /// `end` is clamped to the buffer length and moved back to a character
    /// boundary, since a filter may have rewritten the buffer after the
    /// match was computed.
    pub(crate) fn consume(&mut self, end: usize) {
        let mut end = end.min(self.text.len());
        while !self.text.is_char_boundary(end) {
            end -= 1;
        }
        self.text.drain(..end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_buffer() {
        let buffer = InputBuffer::new();
        assert_eq!(buffer.as_str(), "");
    }

    #[test]
    fn test_multiple_appends() {
        let mut buffer = InputBuffer::new();
        buffer.append("Hello ");
        buffer.append("World");
        assert_eq!(buffer.as_str(), "Hello World");
    }

    #[test]
    fn test_consume() {
        let mut buffer = InputBuffer::new();
        buffer.append("Hello World");
        buffer.consume(6);
        assert_eq!(buffer.as_str(), "World");
    }

    #[test]
    fn test_consume_past_end() {
        let mut buffer = InputBuffer::new();
        buffer.append("abc");
        buffer.consume(100);
        assert_eq!(buffer.as_str(), "");
    }

    #[test]
    fn test_consume_inside_character() {
        let mut buffer = InputBuffer::new();
        buffer.append("a世b");
        buffer.consume(2);
        assert_eq!(buffer.as_str(), "世b");
    }

    #[test]
    fn test_empty_append() {
        let mut buffer = InputBuffer::new();
        buffer.append("");
        assert_eq!(buffer.as_str(), "");
    }

    #[test]
    fn test_text_mut() {
        let mut buffer = InputBuffer::new();
        buffer.append("abc");
        buffer.text_mut().replace_range(..1, "x");
        assert_eq!(buffer.as_str(), "xbc");
    }

    proptest! {
        #[test]
        fn consume_leaves_the_tail(text in ".*", cut in 0usize..64) {
            let mut buffer = InputBuffer::new();
            buffer.append(&text);
            let mut end = cut.min(text.len());
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            buffer.consume(cut);
            prop_assert_eq!(buffer.as_str(), &text[end..]);
        }
    }
}
