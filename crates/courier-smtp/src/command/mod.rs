//! Client commands and their wire form.

use std::fmt;

use crate::types::{Address, AuthMechanism};

/// One client command, as written to the channel.
///
/// `Display` renders the wire form without the line terminator;
/// [`Command::serialize`] adds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `HELO <hostname>`, the RFC 821 greeting.
    Helo {
        /// Name the client announces.
        hostname: String,
    },
    /// `EHLO <hostname>`.
    Ehlo {
        /// Name the client announces.
        hostname: String,
    },
    /// `STARTTLS`.
    StartTls,
    /// `AUTH <mechanism> [initial-response]`.
    Auth {
        /// SASL mechanism.
        mechanism: AuthMechanism,
        /// Base64 initial response, sent on the same line.
        initial_response: Option<String>,
    },
    /// Base64 line answering a 334 challenge.
    AuthResponse(String),
    /// `MAIL FROM:<reverse-path>`.
    MailFrom {
        /// Reverse path.
        from: Address,
    },
    /// `RCPT TO:<forward-path>`.
    RcptTo {
        /// Forward path.
        to: Address,
    },
    /// `DATA`.
    Data,
    /// `RSET`.
    Rset,
    /// `VRFY <string>`.
    Vrfy {
        /// User name or mailbox to look up.
        address: String,
    },
    /// `NOOP`.
    Noop,
    /// `QUIT`.
    Quit,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Helo { hostname } | Self::Ehlo { hostname } => {
                write!(f, "{} {hostname}", self.verb())
            }
            Self::Auth {
                mechanism,
                initial_response: Some(response),
            } => write!(f, "AUTH {} {response}", mechanism.as_str()),
            Self::Auth {
                mechanism,
                initial_response: None,
            } => write!(f, "AUTH {}", mechanism.as_str()),
            Self::AuthResponse(response) => f.write_str(response),
            Self::MailFrom { from } => write!(f, "MAIL FROM:<{from}>"),
            Self::RcptTo { to } => write!(f, "RCPT TO:<{to}>"),
            Self::Vrfy { address } => write!(f, "VRFY {address}"),
            Self::StartTls | Self::Data | Self::Rset | Self::Noop | Self::Quit => {
                f.write_str(self.verb())
            }
        }
    }
}

impl Command {
    /// Wire bytes, CRLF included.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        format!("{self}\r\n").into_bytes()
    }

    /// Verb for logging. Never includes arguments, so credentials stay out
    /// of the logs.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Helo { .. } => "HELO",
            Self::Ehlo { .. } => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::Auth { .. } => "AUTH",
            Self::AuthResponse(_) => "AUTH-RESPONSE",
            Self::MailFrom { .. } => "MAIL",
            Self::RcptTo { .. } => "RCPT",
            Self::Data => "DATA",
            Self::Rset => "RSET",
            Self::Vrfy { .. } => "VRFY",
            Self::Noop => "NOOP",
            Self::Quit => "QUIT",
        }
    }
}
