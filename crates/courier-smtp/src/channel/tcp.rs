//! Network channel over TCP or TLS.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::time::timeout;

use super::stream::{self, SmtpStream};
use super::Channel;
use crate::config::{Config, Security};
use crate::error::{Error, Result};
use crate::parser::parse_reply;
use crate::types::Reply;

/// [`Channel`] backed by a real socket.
///
/// Applies the configured connect and I/O timeouts to every operation; an
/// expired timeout is reported like any other connection failure.
#[derive(Debug)]
pub struct TcpChannel {
    security: Security,
    connect_timeout: Duration,
    io_timeout: Duration,
    host: String,
    stream: Option<SmtpStream>,
}

impl TcpChannel {
    /// Creates a closed channel using the security mode and timeouts from
    /// `config`.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            security: config.security,
            connect_timeout: config.connect_timeout,
            io_timeout: config.io_timeout,
            host: config.host.clone(),
            stream: None,
        }
    }

    /// Host of the current or last connection.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl Channel for TcpChannel {
    async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        host.clone_into(&mut self.host);
        let opened = match self.security {
            Security::Implicit => {
                with_timeout(self.connect_timeout, stream::connect_tls(host, port)).await
            }
            Security::None | Security::StartTls => {
                with_timeout(self.connect_timeout, stream::connect(host, port)).await
            }
        };

        let stream = opened.map_err(|e| Error::connection(host, e))?;
        tracing::debug!(host, port, security = ?self.security, "Channel opened");
        self.stream = Some(stream);
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let Self {
            host,
            stream,
            io_timeout,
            ..
        } = self;
        let stream = stream
            .as_mut()
            .ok_or_else(|| Error::connection(host.as_str(), "channel is not open"))?;

        with_timeout(*io_timeout, stream.write_all(data))
            .await
            .map_err(|e| Error::connection(host.as_str(), e))
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let Self {
            host,
            stream,
            io_timeout,
            ..
        } = self;
        let stream = stream
            .as_mut()
            .ok_or_else(|| Error::connection(host.as_str(), "channel is not open"))?;

        let lines = with_timeout(*io_timeout, stream.read_reply_lines())
            .await
            .map_err(|e| Error::connection(host.as_str(), e))?;
        parse_reply(&lines)
    }

    async fn start_tls(&mut self) -> Result<()> {
        let stream = self
            .stream
            .take()
            .ok_or_else(|| Error::connection(self.host.as_str(), "channel is not open"))?;

        let upgraded = with_timeout(self.connect_timeout, stream.upgrade_to_tls(&self.host))
            .await
            .map_err(|e| Error::connection(self.host.as_str(), e))?;
        tracing::debug!(host = %self.host, "Channel upgraded to TLS");
        self.stream = Some(upgraded);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        with_timeout(self.io_timeout, stream.shutdown())
            .await
            .map_err(|e| Error::connection(self.host.as_str(), e))
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = io::Result<T>>,
) -> io::Result<T> {
    timeout(limit, fut)
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "operation timed out"))?
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_unreachable_host_names_host() {
        let config = Config::builder("nonexistentremote")
            .connect_timeout(Duration::from_secs(5))
            .build();
        let mut channel = TcpChannel::new(&config);

        let err = channel.connect("nonexistentremote", 25).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("nonexistentremote"));
        assert!(!channel.is_open());
    }

    #[tokio::test]
    async fn test_io_on_closed_channel() {
        let mut channel = TcpChannel::new(&Config::new("mail.example.com"));
        let err = channel.write_all(b"NOOP\r\n").await.unwrap_err();
        assert!(matches!(err, Error::Connection { ref host, .. } if host == "mail.example.com"));
        assert!(channel.read_reply().await.is_err());
        assert!(channel.start_tls().await.is_err());
        assert!(channel.close().await.is_ok());
    }
}
