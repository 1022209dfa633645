//! Reply streaming for the dispatch loop.

use std::io::Write;

use serde::Serialize;
use userdb_protocol::{ErrorCode, Reply, codec};

use super::errors::DispatchError;

/// Empty parameters object used for error replies to unknown methods.
#[derive(Debug, Default, Serialize)]
pub struct NoParameters {}

/// Outcome of serving one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResult {
    /// Replies written to the client.
    pub replies: usize,
    /// Whether the last written reply was terminal.
    pub terminated: bool,
}

/// Writer that frames replies onto the connection.
///
/// When the caller did not set `more`, every reply is sent as terminal so the
/// client never waits for a continuation it did not ask for.
pub struct ReplyWriter<W> {
    writer: W,
    more: bool,
    written: usize,
}

impl<W: Write> ReplyWriter<W> {
    /// Creates a writer for a request with the given `more` flag.
    pub fn new(writer: W, more: bool) -> Self {
        Self {
            writer,
            more,
            written: 0,
        }
    }

    /// Writes one reply, returning whether it ended the stream.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Write`] if encoding or writing fails.
    pub fn write<P: Serialize>(&mut self, mut reply: Reply<P>) -> Result<bool, DispatchError> {
        if !self.more {
            reply.continues = false;
        }
        codec::encode(&mut self.writer, &reply).map_err(DispatchError::Write)?;
        self.written += 1;
        Ok(reply.is_terminal())
    }

    /// Drains `replies` until a terminal reply has been written.
    ///
    /// Replies produced after the terminal one are never pulled.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Write`] if a reply cannot be written.
    pub fn stream<P, I>(&mut self, replies: I) -> Result<DispatchResult, DispatchError>
    where
        P: Serialize,
        I: IntoIterator<Item = Reply<P>>,
    {
        for reply in replies {
            if self.write(reply)? {
                return Ok(self.result(true));
            }
        }
        Ok(self.result(false))
    }

    /// Writes a single terminal error reply with empty parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Write`] if the reply cannot be written.
    pub fn write_error(&mut self, code: ErrorCode) -> Result<DispatchResult, DispatchError> {
        self.write(Reply::<NoParameters>::error(code))?;
        Ok(self.result(true))
    }

    fn result(&self, terminated: bool) -> DispatchResult {
        DispatchResult {
            replies: self.written,
            terminated,
        }
    }
}

#[cfg(test)]
mod tests {
    use userdb_protocol::{GetUserRecordReply, UserRecord};

    use super::*;

    fn frames(output: &[u8]) -> Vec<serde_json::Value> {
        output
            .split(|byte| *byte == 0)
            .filter(|frame| !frame.is_empty())
            .map(|frame| serde_json::from_slice(frame).expect("valid json"))
            .collect()
    }

    #[test]
    fn writes_error_reply_with_empty_parameters() {
        let mut output = Vec::new();
        let result = ReplyWriter::new(&mut output, false)
            .write_error(ErrorCode::Unimplemented)
            .expect("write error");

        assert_eq!(
            result,
            DispatchResult {
                replies: 1,
                terminated: true
            }
        );
        assert_eq!(
            frames(&output),
            vec![serde_json::json!({
                "parameters": {},
                "error": "org.varlink.service.MethodNotImplemented"
            })]
        );
        assert_eq!(output.last(), Some(&0));
    }

    #[test]
    fn stops_pulling_after_terminal_reply() {
        let mut output = Vec::new();
        let mut pulled = 0;
        let replies = (0..5).map(|index| {
            pulled += 1;
            GetUserRecordReply::record(UserRecord::new(format!("user{index}")))
                .with_continues(index != 1)
        });
        let result = ReplyWriter::new(&mut output, true)
            .stream(replies)
            .expect("stream replies");

        assert_eq!(result.replies, 2);
        assert!(result.terminated);
        assert_eq!(pulled, 2);
    }

    #[test]
    fn clears_continuation_when_more_was_not_requested() {
        let mut output = Vec::new();
        let replies = vec![
            GetUserRecordReply::record(UserRecord::new("alice")).with_continues(true),
            GetUserRecordReply::record(UserRecord::new("bob")),
        ];
        let result = ReplyWriter::new(&mut output, false)
            .stream(replies)
            .expect("stream replies");

        assert_eq!(result.replies, 1);
        let written = frames(&output);
        assert_eq!(written.len(), 1);
        assert!(written[0].get("continues").is_none());
    }

    #[test]
    fn reports_exhausted_stream_without_terminal_reply() {
        let mut output = Vec::new();
        let replies = vec![GetUserRecordReply::record(UserRecord::new("alice")).with_continues(true)];
        let result = ReplyWriter::new(&mut output, true)
            .stream(replies)
            .expect("stream replies");

        assert_eq!(
            result,
            DispatchResult {
                replies: 1,
                terminated: false
            }
        );
    }
}
