//! Line-oriented framing of NETCONF 1.0 chunks.
//!
//! Each line is trimmed and stripped of `]]>]]>` markers before it joins the
//! pending buffer. A line mentioning `</hello>` or `</rpc>` completes the
//! chunk.

use std::io::{self, BufRead};

use thiserror::Error;
use tracing::debug;

use super::SESSION_TARGET;

/// End-of-message marker used by NETCONF 1.0 framing.
pub const END_OF_MESSAGE: &str = "]]>]]>";

/// Upper bound for a single pending chunk.
pub const MAX_CHUNK_BYTES: usize = 16 * 1024 * 1024;

const CHUNK_TERMINATORS: [&str; 2] = ["</hello>", "</rpc>"];

/// Errors raised while framing the input stream.
#[derive(Debug, Error)]
pub enum FramingError {
    /// Reading from the transport failed.
    #[error("failed to read from transport: {source}")]
    Io {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A chunk grew past [`MAX_CHUNK_BYTES`] without terminating.
    #[error("pending chunk exceeds {limit} bytes")]
    ChunkTooLarge {
        /// Configured limit.
        limit: usize,
    },
}

/// Splits a byte stream into candidate message chunks.
#[derive(Debug)]
pub struct FramingReader<R> {
    reader: R,
    pending: String,
    line: String,
}

impl<R: BufRead> FramingReader<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: String::new(),
            line: String::new(),
        }
    }

    /// Reads until a chunk completes.
    ///
    /// Returns `Ok(None)` at end of stream; an unterminated remainder is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError`] when the read fails or the chunk grows too
    /// large.
    pub fn next_chunk(&mut self) -> Result<Option<String>, FramingError> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .map_err(|source| FramingError::Io { source })?;
            if read == 0 {
                if !self.pending.trim().is_empty() {
                    debug!(
                        target: SESSION_TARGET,
                        bytes = self.pending.len(),
                        "discarding unterminated chunk at end of stream"
                    );
                }
                self.pending.clear();
                return Ok(None);
            }

            let line = self.line.trim().replace(END_OF_MESSAGE, "");
            self.pending.push_str(&line);
            self.pending.push('\n');
            if self.pending.len() > MAX_CHUNK_BYTES {
                self.pending.clear();
                return Err(FramingError::ChunkTooLarge {
                    limit: MAX_CHUNK_BYTES,
                });
            }

            if CHUNK_TERMINATORS
                .iter()
                .any(|terminator| line.contains(terminator))
            {
                let chunk = self.pending.trim().to_owned();
                self.pending.clear();
                return Ok(Some(chunk));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    fn chunks(input: &str) -> Vec<String> {
        let mut reader = FramingReader::new(Cursor::new(input.as_bytes().to_vec()));
        let mut chunks = Vec::new();
        while let Some(chunk) = reader.next_chunk().expect("read chunk") {
            chunks.push(chunk);
        }
        chunks
    }

    #[test]
    fn multi_line_rpc_forms_one_chunk() {
        let input = "<rpc message-id=\"1\">\n  <get/>\n</rpc>\n]]>]]>\n";
        assert_eq!(chunks(input), vec!["<rpc message-id=\"1\">\n<get/>\n</rpc>"]);
    }

    #[test]
    fn markers_are_stripped_from_terminating_lines() {
        let input = "<hello><capabilities/></hello>]]>]]>\n<rpc message-id=\"2\"><get/></rpc>]]>]]>";
        assert_eq!(
            chunks(input),
            vec![
                "<hello><capabilities/></hello>",
                "<rpc message-id=\"2\"><get/></rpc>",
            ]
        );
    }

    #[rstest]
    #[case("")]
    #[case("<rpc message-id=\"3\">\n<get/>\n")]
    fn unterminated_input_ends_without_chunk(#[case] input: &str) {
        assert!(chunks(input).is_empty());
    }

    #[test]
    fn stray_marker_lines_join_the_next_chunk() {
        let input = "]]>]]>\n<rpc message-id=\"4\"><lock/></rpc>\n";
        assert_eq!(chunks(input), vec!["<rpc message-id=\"4\"><lock/></rpc>"]);
    }

    #[test]
    fn oversized_chunks_fail() {
        let line = "x".repeat(1024);
        let input = format!("{line}\n").repeat(MAX_CHUNK_BYTES / 1024 + 1);
        let mut reader = FramingReader::new(Cursor::new(input.into_bytes()));
        let result = reader.next_chunk();
        assert!(matches!(
            result,
            Err(FramingError::ChunkTooLarge { limit }) if limit == MAX_CHUNK_BYTES
        ));
    }
}
