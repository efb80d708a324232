//! Newline framing over an arbitrarily chunked byte stream.

use bytes::BytesMut;

/// Stateful UTF-8 line decoder.
///
/// Bytes are decoded as they arrive; a chunk ending in the middle of a code
/// point keeps the incomplete tail until the next chunk completes it. Decoded
/// text is split on `\n` and the unterminated remainder stays buffered.
#[derive(Debug, Default)]
pub struct LineDecoder {
    /// Bytes of an incomplete code point
    pending: BytesMut,
    /// Decoded text not yet terminated by a newline
    buffer: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completed, in order.
    ///
    /// Line terminators (`\n` and a preceding `\r`) are not included.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        self.decode_pending();
        self.drain_lines()
    }

    /// Text decoded but not yet terminated by a newline.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// End of input: return the unterminated trailing fragment, if any.
    ///
    /// Held bytes that never formed a complete code point decode to U+FFFD.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending.is_empty() {
            let tail = self.pending.split();
            self.buffer.push_str(&String::from_utf8_lossy(&tail));
        }

        let mut fragment = std::mem::take(&mut self.buffer);
        if fragment.ends_with('\r') {
            fragment.pop();
        }
        if fragment.is_empty() {
            None
        } else {
            Some(fragment)
        }
    }

    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(err) => {
                    let valid = self.pending.split_to(err.valid_up_to());
                    self.buffer.push_str(&String::from_utf8_lossy(&valid));

                    match err.error_len() {
                        Some(invalid) => {
                            let _ = self.pending.split_to(invalid);
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                        }
                        // Incomplete sequence at the end: wait for more bytes
                        None => return,
                    }
                }
            }
        }
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let mut line: String = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lines_across_chunks() {
        let mut decoder = LineDecoder::new();

        assert!(decoder.push(b"0:").is_empty());
        assert_eq!(decoder.push(b"abc\n0:"), vec!["0:abc".to_string()]);
        assert_eq!(decoder.buffered(), "0:");
        assert_eq!(
            decoder.push(b"def\nghi\n"),
            vec!["0:def".to_string(), "ghi".to_string()]
        );
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_split_inside_multibyte_character() {
        let text = "Prices from £573K – 15% lift €\n";
        let bytes = text.as_bytes();

        for offset in 0..bytes.len() {
            let mut decoder = LineDecoder::new();
            let mut lines = decoder.push(&bytes[..offset]);
            lines.extend(decoder.push(&bytes[offset..]));
            assert_eq!(lines, vec!["Prices from £573K – 15% lift €".to_string()]);
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let text = "naïve 👋\nsecond\n";
        let mut decoder = LineDecoder::new();
        let mut lines = Vec::new();
        for byte in text.as_bytes() {
            lines.extend(decoder.push(std::slice::from_ref(byte)));
        }
        assert_eq!(lines, vec!["naïve 👋".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_crlf_terminators_are_stripped() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"data: one\r\n\r\ndata: two\r\n");
        assert_eq!(
            lines,
            vec!["data: one".to_string(), String::new(), "data: two".to_string()]
        );
    }

    #[test]
    fn test_invalid_bytes_become_replacement_character() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"ok \xFF ok\n");
        assert_eq!(lines, vec!["ok \u{FFFD} ok".to_string()]);
    }

    #[test]
    fn test_finish_returns_trailing_fragment() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"first\nlast words");
        assert_eq!(decoder.finish(), Some("last words".to_string()));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_finish_flushes_incomplete_code_point() {
        let mut decoder = LineDecoder::new();
        decoder.push(&[b'a', 0xE2, 0x82]);
        assert_eq!(decoder.finish(), Some("a\u{FFFD}".to_string()));
    }
}
