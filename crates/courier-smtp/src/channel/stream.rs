//! Low-level SMTP stream handling.

use std::io;
use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

use crate::parser::is_last_reply_line;

/// Longest reply line accepted, CRLF included.
const MAX_LINE_LENGTH: usize = 4096;

/// Most lines accepted in one multi-line reply.
const MAX_REPLY_LINES: usize = 256;

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(BufReader<TcpStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
}

impl SmtpStream {
    /// Reads the lines of one reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the peer closes mid-reply.
    pub async fn read_reply_lines(&mut self) -> io::Result<Vec<String>> {
        match self {
            Self::Tcp(reader) => read_reply_lines(reader).await,
            Self::Tls(reader) => read_reply_lines(reader.as_mut()).await,
        }
    }

    /// Writes data to the stream and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Self::Tcp(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await
            }
        }
    }

    /// Shuts down the write half.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown fails.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(reader) => reader.get_mut().shutdown().await,
            Self::Tls(reader) => reader.get_mut().shutdown().await,
        }
    }

    /// Upgrades a TCP stream to TLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream already uses TLS or the handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> io::Result<Self> {
        let tcp_stream = match self {
            Self::Tcp(reader) => reader.into_inner(),
            Self::Tls(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "stream already uses TLS",
                ));
            }
        };

        let tls_stream = create_tls_connector()
            .connect(server_name(hostname)?, tcp_stream)
            .await?;
        Ok(Self::Tls(Box::new(BufReader::new(tls_stream))))
    }
}

/// Connects to an SMTP server over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect(hostname: &str, port: u16) -> io::Result<SmtpStream> {
    let stream = TcpStream::connect((hostname, port)).await?;
    Ok(SmtpStream::Tcp(BufReader::new(stream)))
}

/// Connects to an SMTP server over TLS (implicit TLS on port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16) -> io::Result<SmtpStream> {
    let tcp_stream = TcpStream::connect((hostname, port)).await?;
    let tls_stream = create_tls_connector()
        .connect(server_name(hostname)?, tcp_stream)
        .await?;
    Ok(SmtpStream::Tls(Box::new(BufReader::new(tls_stream))))
}

/// Reads reply lines up to and including the last one, CRLF stripped.
///
/// Empty lines are skipped. A line too short to carry a continuation marker
/// ends the reply so the parser can reject it.
///
/// # Errors
///
/// Returns `UnexpectedEof` if the peer closes first, `InvalidData` if a line
/// or the reply grows past the limits.
pub async fn read_reply_lines<R>(reader: &mut R) -> io::Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();
    loop {
        let line = read_line(reader).await?;
        if line.is_empty() {
            continue;
        }

        let is_last = line.len() < 4 || is_last_reply_line(&line);
        lines.push(line);

        if is_last {
            return Ok(lines);
        }
        if lines.len() >= MAX_REPLY_LINES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "reply has too many lines",
            ));
        }
    }
}

async fn read_line<R>(reader: &mut R) -> io::Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let limit = u64::try_from(MAX_LINE_LENGTH).unwrap_or(u64::MAX);
    let read = (&mut *reader)
        .take(limit)
        .read_until(b'\n', &mut buf)
        .await?;

    if read == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed by peer",
        ));
    }
    if !buf.ends_with(b"\n") {
        let (kind, msg) = if buf.len() >= MAX_LINE_LENGTH {
            (io::ErrorKind::InvalidData, "reply line too long")
        } else {
            (io::ErrorKind::UnexpectedEof, "connection closed mid-line")
        };
        return Err(io::Error::new(kind, msg));
    }

    let line = String::from_utf8_lossy(&buf);
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn server_name(hostname: &str) -> io::Result<ServerName<'static>> {
    ServerName::try_from(hostname.to_string()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid TLS server name: {hostname}"),
        )
    })
}

/// Creates a TLS connector trusting the webpki root certificates.
fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_single_line_reply() {
        let mut reader = BufReader::new(Builder::new().read(b"250 OK\r\n").build());
        let lines = read_reply_lines(&mut reader).await.unwrap();
        assert_eq!(lines, vec!["250 OK"]);
    }

    #[tokio::test]
    async fn test_multi_line_reply_across_reads() {
        let mock = Builder::new()
            .read(b"250-mail.example.com\r\n250-PIPE")
            .read(b"LINING\r\n250 HELP\r\n")
            .build();
        let mut reader = BufReader::new(mock);

        let lines = read_reply_lines(&mut reader).await.unwrap();
        assert_eq!(lines, vec!["250-mail.example.com", "250-PIPELINING", "250 HELP"]);
    }

    #[tokio::test]
    async fn test_bare_lf_and_blank_lines() {
        let mock = Builder::new().read(b"\r\n221 Bye\n").build();
        let mut reader = BufReader::new(mock);
        assert_eq!(read_reply_lines(&mut reader).await.unwrap(), vec!["221 Bye"]);
    }

    #[tokio::test]
    async fn test_eof_before_reply() {
        let mut reader = BufReader::new(Builder::new().build());
        let err = read_reply_lines(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_eof_mid_reply() {
        let mock = Builder::new().read(b"250-first\r\n250 sec").build();
        let mut reader = BufReader::new(mock);
        let err = read_reply_lines(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_line_length_limit() {
        let long_line = format!("250 {}", "A".repeat(MAX_LINE_LENGTH));
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let mut reader = BufReader::new(mock);

        let err = read_reply_lines(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_server_name_rejects_garbage() {
        assert!(server_name("mail.example.com").is_ok());
        assert!(server_name("bad host\r\n").is_err());
    }
}
