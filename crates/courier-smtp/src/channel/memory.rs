//! In-memory recording channel.

use std::borrow::Cow;
use std::collections::VecDeque;

use super::Channel;
use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// [`Channel`] that records every byte written and never touches the
/// network.
///
/// Replies come from a queue filled with [`MemoryChannel::with_reply`]. When
/// the queue is empty the channel acts as an accommodating server and answers
/// the last line written: `220` for the greeting and STARTTLS, `354` for
/// DATA, `235` for AUTH with an initial response, `334` for AUTH LOGIN and
/// its username line, `221` for QUIT and `250` for everything else.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    log: Vec<u8>,
    replies: VecDeque<Reply>,
    answer: Option<Reply>,
    login_steps: u8,
    host: String,
    open: bool,
    refuse: Option<String>,
    fail_close: bool,
    connects: usize,
    closes: usize,
    tls_upgrades: usize,
}

impl MemoryChannel {
    /// Creates an accommodating channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a channel whose `connect` always fails with `reason`.
    #[must_use]
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            refuse: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Queues a reply to be returned ahead of the automatic ones.
    #[must_use]
    pub fn with_reply(mut self, code: u16, text: impl Into<String>) -> Self {
        self.push_reply(Reply::single(code, text));
        self
    }

    /// Makes `close` report an error (the channel still ends up closed).
    #[must_use]
    pub const fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Queues a reply to be returned ahead of the automatic ones.
    pub fn push_reply(&mut self, reply: Reply) {
        self.replies.push_back(reply);
    }

    /// Everything written so far, as text.
    #[must_use]
    pub fn log(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.log)
    }

    /// Everything written so far, as bytes.
    #[must_use]
    pub fn log_bytes(&self) -> &[u8] {
        &self.log
    }

    /// Written lines, CRLF stripped.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.log()
            .split_terminator("\r\n")
            .map(str::to_string)
            .collect()
    }

    /// Forgets everything written so far.
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Number of successful `connect` calls.
    #[must_use]
    pub const fn connects(&self) -> usize {
        self.connects
    }

    /// Number of `close` calls on an open channel.
    #[must_use]
    pub const fn closes(&self) -> usize {
        self.closes
    }

    /// Number of STARTTLS upgrades.
    #[must_use]
    pub const fn tls_upgrades(&self) -> usize {
        self.tls_upgrades
    }

    fn not_open(&self) -> Error {
        Error::connection(self.host.as_str(), "channel is not open")
    }

    fn automatic_reply(&self) -> Reply {
        self.answer
            .clone()
            .unwrap_or_else(|| Reply::single(220, "memory ESMTP ready"))
    }

    fn answer_line(&mut self, line: &str) -> Reply {
        if self.login_steps > 0 {
            self.login_steps -= 1;
            return if self.login_steps > 0 {
                Reply::single(334, "UGFzc3dvcmQ6")
            } else {
                Reply::single(235, "Authentication successful")
            };
        }

        let verb = line
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();

        let (code, text) = match verb.as_str() {
            "DATA" => (ReplyCode::START_DATA, "End data with <CR><LF>.<CR><LF>"),
            "QUIT" => (ReplyCode::CLOSING, "Bye"),
            "STARTTLS" => (ReplyCode::SERVICE_READY, "Ready to start TLS"),
            "AUTH" if line.split_whitespace().count() == 2 => {
                self.login_steps = 2;
                (ReplyCode::AUTH_CONTINUE, "VXNlcm5hbWU6")
            }
            "AUTH" => (ReplyCode::AUTH_SUCCESS, "Authentication successful"),
            _ => (ReplyCode::OK, "OK"),
        };
        Reply::new(code, vec![text.to_string()])
    }
}

impl Channel for MemoryChannel {
    async fn connect(&mut self, host: &str, _port: u16) -> Result<()> {
        host.clone_into(&mut self.host);
        if let Some(reason) = &self.refuse {
            return Err(Error::connection(host, reason));
        }
        self.open = true;
        self.answer = None;
        self.login_steps = 0;
        self.connects += 1;
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if !self.open {
            return Err(self.not_open());
        }
        self.log.extend_from_slice(data);
        let text = String::from_utf8_lossy(data);
        if let Some(line) = text.split_terminator("\r\n").filter(|l| !l.is_empty()).last() {
            self.answer = Some(self.answer_line(line));
        }
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        if !self.open {
            return Err(self.not_open());
        }
        Ok(self
            .replies
            .pop_front()
            .unwrap_or_else(|| self.automatic_reply()))
    }

    async fn start_tls(&mut self) -> Result<()> {
        if !self.open {
            return Err(self.not_open());
        }
        self.tls_upgrades += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.closes += 1;
        if self.fail_close {
            return Err(Error::connection(self.host.as_str(), "close failed"));
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
