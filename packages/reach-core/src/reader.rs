//! Stream ingestion for one assistant turn.
//!
//! [`TurnReader`] is the synchronous half of the reader: it is fed raw body
//! chunks in arrival order and keeps the accumulated assistant text. The async
//! read loop (network, idle timeout, cancellation) lives in the client and
//! drives this state machine one chunk at a time.

use crate::decoder::LineDecoder;
use crate::frame::{classify_line, StreamFrame};

/// What a single chunk did to the turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkOutcome {
    /// The accumulated text grew
    pub appended: bool,
    /// A finish marker has been seen; later input is ignored
    pub finished: bool,
}

/// Accumulates text deltas for one assistant turn.
#[derive(Debug, Default)]
pub struct TurnReader {
    decoder: LineDecoder,
    text: String,
    /// Finish marker seen
    finished: bool,
    /// Line breaks owed before the next literal line, while literal lines run
    literal_breaks: Option<usize>,
    frames: usize,
}

impl TurnReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one body chunk; every complete line in it is processed in order.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> ChunkOutcome {
        let before = self.text.len();
        if !self.finished {
            for line in self.decoder.push(chunk) {
                self.accept_line(&line, true);
                if self.finished {
                    break;
                }
            }
        }
        self.outcome_since(before)
    }

    /// End of input.
    ///
    /// The unterminated trailing line, if any, is processed like any other
    /// line: plain-text bodies usually end without a newline.
    pub fn finish(&mut self) -> ChunkOutcome {
        let before = self.text.len();
        if !self.finished {
            if let Some(fragment) = self.decoder.finish() {
                self.accept_line(&fragment, false);
            }
        }
        tracing::debug!(
            frames = self.frames,
            bytes = self.text.len(),
            finished = self.finished,
            "stream input ended"
        );
        self.outcome_since(before)
    }

    /// Input stopped early (cancelled or broken).
    ///
    /// The unterminated trailing line is discarded: it is most likely a cut
    /// frame, not text.
    pub fn abandon(&mut self) {
        let dropped = self.decoder.finish().map_or(0, |fragment| fragment.len());
        tracing::debug!(
            frames = self.frames,
            bytes = self.text.len(),
            dropped,
            "stream input abandoned"
        );
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether a finish marker ended the turn.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of non-blank frames processed.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Run a whole recorded body through a reader in `chunk_size` pieces.
    pub fn replay(body: &[u8], chunk_size: usize) -> Self {
        let mut reader = Self::new();
        for chunk in body.chunks(chunk_size.max(1)) {
            if reader.push_chunk(chunk).finished {
                break;
            }
        }
        reader.finish();
        reader
    }

    fn accept_line(&mut self, line: &str, terminated: bool) {
        if line.trim().is_empty() {
            // Blank lines separate SSE events; inside literal text they are
            // paragraph breaks
            if let Some(breaks) = self.literal_breaks.as_mut() {
                *breaks += 1;
            }
            return;
        }

        let frame = classify_line(line);
        self.frames += 1;
        tracing::trace!(kind = frame.kind(), "frame");

        if frame.is_finish() {
            self.finished = true;
            return;
        }

        let Some(text) = frame.text() else {
            self.literal_breaks = None;
            return;
        };

        if frame.is_literal() {
            self.push_literal(text, terminated);
        } else {
            self.literal_breaks = None;
            self.text.push_str(text);
        }
    }

    /// Literal lines keep the line structure the framing consumed.
    fn push_literal(&mut self, text: &str, terminated: bool) {
        if let Some(breaks) = self.literal_breaks {
            for _ in 0..breaks {
                self.text.push('\n');
            }
        }
        self.text.push_str(text);
        self.literal_breaks = terminated.then_some(1);
    }

    fn outcome_since(&self, before: usize) -> ChunkOutcome {
        ChunkOutcome {
            appended: self.text.len() > before,
            finished: self.finished,
        }
    }
}
