//! Error types for SMTP operations.

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The channel could not be opened, or failed mid-transaction.
    #[error("Could not communicate with {host}: {reason}")]
    Connection {
        /// Remote host the channel was bound to.
        host: String,
        /// What went wrong.
        reason: String,
    },

    /// A command was issued out of order.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Hostname does not follow the DNS hostname grammar.
    #[error("The input does not match the expected structure for a DNS hostname: {0:?}")]
    InvalidHostname(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Header name or value that would break the header block.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Server returned an unexpected reply.
    #[error("SMTP error {code}: {message}")]
    SmtpError {
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Malformed reply.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Feature not supported by the channel.
    #[error("Channel does not support {0}")]
    NotSupported(String),
}

/// Commands issued in an order RFC 5321 does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// `connect` on a session that is already connected.
    #[error("A connection has already been established")]
    AlreadyConnected,

    /// A command that needs an open channel on a disconnected session.
    #[error("No connection has been established")]
    NotConnected,

    /// HELO/EHLO issued twice.
    #[error("Cannot issue HELO to existing session")]
    HeloRepeated,

    /// MAIL or RSET before a successful HELO.
    #[error("A valid session has not been started")]
    NoSession,

    /// RCPT before a successful MAIL.
    #[error("No sender reverse path has been supplied")]
    NoSender,

    /// DATA before any successful RCPT.
    #[error("No recipient forward path has been supplied")]
    NoRecipient,

    /// AUTH issued twice.
    #[error("Already authenticated for this session")]
    AlreadyAuthenticated,
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure.
    Connection,
    /// Command ordering violation.
    Sequence,
    /// Rejected input.
    Validation,
    /// Unexpected or malformed peer reply.
    Protocol,
}

impl Error {
    /// Creates an SMTP error from a reply code and message.
    #[must_use]
    pub fn smtp_error(code: u16, message: impl Into<String>) -> Self {
        Self::SmtpError {
            code,
            message: message.into(),
        }
    }

    /// Creates a connection error for `host`.
    #[must_use]
    pub fn connection(host: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Connection {
            host: host.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns the broad kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } | Self::NotSupported(_) => ErrorKind::Connection,
            Self::Sequence(_) => ErrorKind::Sequence,
            Self::InvalidHostname(_) | Self::InvalidAddress(_) | Self::InvalidHeader(_) => {
                ErrorKind::Validation
            }
            Self::SmtpError { .. } | Self::Protocol(_) => ErrorKind::Protocol,
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::SmtpError { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::SmtpError { code, .. } if *code >= 400 && *code < 500)
    }
}
