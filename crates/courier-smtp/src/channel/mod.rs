//! Byte-stream channels the session talks through.
//!
//! [`Channel`] is the seam between the protocol state machine and the
//! transport underneath it. [`TcpChannel`] speaks to a real server;
//! [`MemoryChannel`] records what was written and answers from a script,
//! which is what the tests run against.

mod memory;
mod stream;
mod tcp;

use std::future::Future;

pub use memory::MemoryChannel;
pub use stream::{SmtpStream, connect, connect_tls, read_reply_lines};
pub use tcp::TcpChannel;

use crate::error::{Error, Result};
use crate::types::Reply;

/// Bidirectional line-oriented byte stream with a connect/close lifecycle.
///
/// Calls are strictly sequential; the session never has two in flight.
pub trait Channel {
    /// Opens the stream to `host:port`.
    ///
    /// Failures are reported as [`Error::Connection`] naming `host`.
    fn connect(&mut self, host: &str, port: u16) -> impl Future<Output = Result<()>> + Send;

    /// Writes `data` verbatim and flushes it.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Reads one complete (possibly multi-line) reply.
    fn read_reply(&mut self) -> impl Future<Output = Result<Reply>> + Send;

    /// Upgrades the open stream to TLS after a successful STARTTLS.
    fn start_tls(&mut self) -> impl Future<Output = Result<()>> + Send {
        async { Err(Error::NotSupported("STARTTLS".into())) }
    }

    /// Closes the stream. The channel counts as closed afterwards even if
    /// this returns an error.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Returns true while the stream is open.
    fn is_open(&self) -> bool;
}
