//! Stdio transport layer with LSP header framing.
//!
//! Each message is framed as:
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```
//!
//! Zero or more headers may precede the blank line; only `Content-Length`
//! is consulted. End-of-stream before the first header byte of a frame is an
//! orderly close and reported as `Ok(None)`.

use std::io::{self, BufRead, ErrorKind, Write};

use pyinspect_config::DEFAULT_MAX_FRAME_BYTES;

use crate::errors::TransportError;

const CONTENT_LENGTH: &str = "Content-Length";

/// Largest header block accepted before the blank line, terminators included.
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Headers of one frame, discarded once the body length is known.
#[derive(Debug, Default)]
struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    fn insert(&mut self, name: &str, value: &str) {
        self.entries.push((name.to_owned(), value.trim().to_owned()));
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn content_length(&self, max: usize) -> Result<usize, TransportError> {
        let value = self
            .get(CONTENT_LENGTH)
            .ok_or(TransportError::MissingContentLength)?;
        let length =
            value
                .parse::<usize>()
                .map_err(|_| TransportError::InvalidContentLength {
                    value: value.to_owned(),
                })?;
        if length > max {
            return Err(TransportError::FrameTooLarge { length, max });
        }
        Ok(length)
    }
}

/// Reads and writes LSP-framed messages over a byte stream pair.
pub struct StdioTransport<R, W> {
    reader: R,
    writer: W,
    max_frame_bytes: usize,
}

impl<R, W> StdioTransport<R, W>
where
    R: BufRead,
    W: Write,
{
    /// Creates a transport over the supplied reader and writer.
    #[must_use]
    pub const fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Replaces the frame body size limit.
    #[must_use]
    pub const fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    /// Receives one framed message, blocking until it is complete.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] for any framing or I/O failure.
    pub fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        match self.read_headers()? {
            Some(length) => self.read_body(length).map(Some),
            None => Ok(None),
        }
    }

    /// Reads one header block and returns the declared body length.
    ///
    /// Returns `Ok(None)` when the stream ends before any header byte.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::UnexpectedEof` if the stream ends inside the
    /// block, `HeaderTooLarge` once the block passes [`MAX_HEADER_BYTES`],
    /// `MalformedHeader` for a line without `": "`, and
    /// `MissingContentLength`, `InvalidContentLength` or `FrameTooLarge` when
    /// the length cannot be trusted.
    pub fn read_headers(&mut self) -> Result<Option<usize>, TransportError> {
        let mut headers = HeaderSet::default();
        let mut consumed = 0_usize;

        loop {
            let remaining = MAX_HEADER_BYTES.saturating_sub(consumed);
            if remaining == 0 {
                return Err(TransportError::HeaderTooLarge {
                    limit: MAX_HEADER_BYTES,
                });
            }

            let mut line = Vec::new();
            let budget = u64::try_from(remaining).unwrap_or(u64::MAX);
            let bytes_read =
                io::Read::take(&mut self.reader, budget).read_until(b'\n', &mut line)?;
            if bytes_read == 0 {
                if consumed > 0 {
                    return Err(TransportError::UnexpectedEof);
                }
                return Ok(None);
            }
            consumed += bytes_read;

            if line.pop() != Some(b'\n') {
                if bytes_read == remaining {
                    return Err(TransportError::HeaderTooLarge {
                        limit: MAX_HEADER_BYTES,
                    });
                }
                return Err(TransportError::UnexpectedEof);
            }
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.is_empty() {
                break;
            }

            let text = String::from_utf8_lossy(&line);
            let (name, value) =
                text.split_once(": ")
                    .ok_or_else(|| TransportError::MalformedHeader {
                        line: text.to_string(),
                    })?;
            headers.insert(name, value);
        }

        headers.content_length(self.max_frame_bytes).map(Some)
    }

    /// Reads exactly `length` body bytes, accumulating short reads.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::TruncatedBody` if the stream ends early and
    /// `TransportError::Io` for any other read failure.
    pub fn read_body(&mut self, length: usize) -> Result<Vec<u8>, TransportError> {
        let mut body = vec![0_u8; length];
        let mut received = 0;

        while let Some(remaining) = body.get_mut(received..).filter(|rest| !rest.is_empty()) {
            match self.reader.read(remaining) {
                Ok(0) => {
                    return Err(TransportError::TruncatedBody {
                        expected: length,
                        received,
                    });
                }
                Ok(count) => received += count,
                Err(error) if error.kind() == ErrorKind::Interrupted => {}
                Err(error) => return Err(TransportError::Io(error)),
            }
        }

        Ok(body)
    }

    /// Sends one framed message and flushes the writer.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Io` if writing or flushing fails.
    pub fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        let header = format!("{CONTENT_LENGTH}: {}\r\n\r\n", message.len());
        self.writer.write_all(header.as_bytes())?;
        self.writer.write_all(message)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Consumes the transport, returning the reader and writer.
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}
