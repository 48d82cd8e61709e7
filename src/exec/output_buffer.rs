// src/exec/output_buffer.rs

//! Bounded accumulator for the streamed output of one command.
//!
//! Chunks are stored as they arrive; nothing is split into lines on the hot
//! path. Line views are built lazily by [`OutputBuffer::last_lines`] and
//! cached until the next push. Once the stored bytes pass the compaction
//! threshold, the chunks are recombined and cut down to the last
//! [`MAX_RETAINED_LINES`] complete lines plus any trailing partial line,
//! and never more than the last [`MAX_BUFFER_BYTES`] of them.
//!
//! The threshold is `MAX_BUFFER_BYTES`, or twice what the previous
//! compaction kept if that is larger, so at least `MAX_BUFFER_BYTES / 2`
//! new bytes arrive between two compactions. Retained storage stays under
//! `2 * MAX_BUFFER_BYTES` plus one chunk.

/// Raw byte threshold that triggers compaction.
pub const MAX_BUFFER_BYTES: usize = 1024 * 1024;

/// Upper bound on lines kept after compaction and on any line view.
pub const MAX_RETAINED_LINES: usize = 128;

#[derive(Debug, Default, Clone)]
pub struct OutputBuffer {
    chunks: Vec<String>,
    bytes: usize,
    /// Size of the storage right after the last compaction.
    compacted_bytes: usize,
    /// Trailing lines (at most `MAX_RETAINED_LINES`), rebuilt after a push.
    cached: Option<Vec<String>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. O(1) apart from the occasional compaction.
    pub fn push(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        self.chunks.push(chunk.to_owned());
        self.bytes += chunk.len();
        self.cached = None;

        if self.bytes > self.compaction_threshold() {
            self.compact();
        }
    }

    /// The last `n` lines, capped at [`MAX_RETAINED_LINES`].
    pub fn last_lines(&mut self, n: usize) -> Vec<String> {
        let lines = self.cached.get_or_insert_with(|| {
            let joined = self.chunks.concat();
            let mut lines = split_lines(&joined);
            if lines.len() > MAX_RETAINED_LINES {
                lines.drain(..lines.len() - MAX_RETAINED_LINES);
            }
            lines
        });

        let take = n.min(lines.len());
        lines[lines.len() - take..].to_vec()
    }

    /// Everything currently retained, joined.
    pub fn contents(&self) -> String {
        self.chunks.concat()
    }

    /// Bytes currently held in the backing storage.
    pub fn retained_bytes(&self) -> usize {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    fn compaction_threshold(&self) -> usize {
        MAX_BUFFER_BYTES.max(2 * self.compacted_bytes)
    }

    fn compact(&mut self) {
        let joined = self.chunks.concat();

        // Complete line k (counted from the end) starts right after newline
        // k + 1, so keeping MAX_RETAINED_LINES lines means cutting after the
        // (MAX_RETAINED_LINES + 1)-th newline from the end.
        let mut start = joined
            .match_indices('\n')
            .rev()
            .nth(MAX_RETAINED_LINES)
            .map(|(pos, _)| pos + 1)
            .unwrap_or(0);

        // Very long lines (or `\r`-only progress output, which is one endless
        // partial line) are cut to the last MAX_BUFFER_BYTES.
        if joined.len() - start > MAX_BUFFER_BYTES {
            start = joined.len() - MAX_BUFFER_BYTES;
            while !joined.is_char_boundary(start) {
                start += 1;
            }
        }

        let kept = joined[start..].to_owned();
        self.bytes = kept.len();
        self.compacted_bytes = kept.len();
        self.chunks = vec![kept];
        self.cached = None;
    }
}

/// Split on `\n`, dropping a trailing `\r` from each line. A terminating
/// newline does not yield an empty final line.
fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_owned())
        .collect()
}
