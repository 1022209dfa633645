//! NUL-delimited JSON framing.
//!
//! Each message is a single JSON value followed by one `0x00` byte. JSON never
//! contains a raw NUL (control characters inside strings are escaped), so the
//! terminator is an unambiguous boundary even when a value spans several
//! lines.
//!
//! ```text
//! {"method":"io.systemd.UserDatabase.GetUserRecord","parameters":{...},"more":true}\0
//! ```

use std::io::{self, BufRead, BufReader, Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Message terminator.
pub const NUL: u8 = 0;

/// Largest accepted message, excluding its terminator.
pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Errors raised while framing or parsing messages.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The peer closed the stream before sending any byte of a message.
    #[error("connection closed before a message was received")]
    ConnectionClosed,
    /// The peer closed the stream part-way through a message.
    #[error("connection closed after {received} bytes without a message terminator")]
    Truncated {
        /// Bytes buffered before the stream ended.
        received: usize,
    },
    /// The frame is not valid JSON of the expected shape.
    #[error("malformed message: {source}")]
    MalformedMessage {
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// The frame exceeds [`MAX_MESSAGE_BYTES`].
    #[error("message too large: {size} bytes exceeds {max_size} byte limit")]
    MessageTooLarge {
        /// Bytes buffered when the limit was hit.
        size: usize,
        /// Configured limit.
        max_size: usize,
    },
    /// The outgoing value could not be serialized.
    #[error("failed to serialize message: {source}")]
    Serialize {
        /// Serializer error.
        #[source]
        source: serde_json::Error,
    },
    /// Reading or writing the stream failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Whether the stream ended before a complete message arrived.
    #[must_use]
    pub const fn is_framing(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::Truncated { .. })
    }
}

/// Writes `message` followed by the terminator and flushes the sink.
///
/// # Errors
///
/// Returns [`CodecError::Serialize`] if the value cannot be represented as
/// JSON, or [`CodecError::Io`] if the sink rejects the bytes.
pub fn encode<W, T>(writer: &mut W, message: &T) -> Result<(), CodecError>
where
    W: Write + ?Sized,
    T: Serialize + ?Sized,
{
    let mut frame =
        serde_json::to_vec(message).map_err(|source| CodecError::Serialize { source })?;
    frame.push(NUL);
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Parses the payload of a single frame.
///
/// # Errors
///
/// Returns [`CodecError::MalformedMessage`] when the bytes are not valid JSON
/// of the requested shape.
pub fn parse<T: DeserializeOwned>(frame: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(frame).map_err(|source| CodecError::MalformedMessage { source })
}

/// Reads NUL-terminated frames from a byte stream.
///
/// The reader keeps its buffer across calls, so bytes received past one
/// terminator are available to the next [`MessageReader::decode`].
#[derive(Debug)]
pub struct MessageReader<R> {
    reader: BufReader<R>,
    max_size: usize,
}

impl<R: Read> MessageReader<R> {
    /// Wraps a byte source.
    pub fn new(source: R) -> Self {
        Self::with_limit(source, MAX_MESSAGE_BYTES)
    }

    /// Wraps a byte source with a custom frame size limit.
    pub fn with_limit(source: R, max_size: usize) -> Self {
        Self {
            reader: BufReader::new(source),
            max_size,
        }
    }

    /// Reads the bytes of the next frame, without the terminator.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between frames.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Truncated`] if the stream ends inside a frame,
    /// [`CodecError::MessageTooLarge`] if the frame exceeds the limit, or
    /// [`CodecError::Io`] if reading fails.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>, CodecError> {
        let mut frame = Vec::new();
        loop {
            let (consumed, complete) = {
                let available = match self.reader.fill_buf() {
                    Ok(available) => available,
                    Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                    Err(error) => return Err(error.into()),
                };
                if available.is_empty() {
                    return if frame.is_empty() {
                        Ok(None)
                    } else {
                        Err(CodecError::Truncated {
                            received: frame.len(),
                        })
                    };
                }
                match available.iter().position(|byte| *byte == NUL) {
                    Some(position) => {
                        let (payload, _) = available.split_at(position);
                        frame.extend_from_slice(payload);
                        (position + 1, true)
                    }
                    None => {
                        frame.extend_from_slice(available);
                        (available.len(), false)
                    }
                }
            };
            self.reader.consume(consumed);
            self.enforce_limit(frame.len())?;
            if complete {
                return Ok(Some(frame));
            }
        }
    }

    /// Reads and parses the next message.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ConnectionClosed`] if the stream ends before any
    /// byte of the message, and otherwise the errors of
    /// [`MessageReader::read_frame`] and [`parse`].
    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<T, CodecError> {
        let frame = self.read_frame()?.ok_or(CodecError::ConnectionClosed)?;
        parse(&frame)
    }

    /// Unwraps the source, discarding any buffered bytes.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    const fn enforce_limit(&self, size: usize) -> Result<(), CodecError> {
        if size > self.max_size {
            return Err(CodecError::MessageTooLarge {
                size,
                max_size: self.max_size,
            });
        }
        Ok(())
    }
}
