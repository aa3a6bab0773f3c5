//! # courier-smtp
//!
//! Client side of an SMTP mail transaction (RFC 5321).
//!
//! ## Features
//!
//! - **Guarded session state machine**: HELO, AUTH, MAIL, RCPT and DATA are
//!   refused with a typed [`SequenceError`] when issued out of order
//! - **Wire transparency**: CRLF normalization and dot-stuffing of the DATA
//!   payload
//! - **Two ways to hang up**: full QUIT handshake or an abrupt close, both
//!   resetting the session
//! - **Pluggable channel**: TCP/TLS for real servers, an in-memory recording
//!   channel for tests
//!
//! ## Quick Start
//!
//! ```ignore
//! use courier_smtp::{Config, Envelope, Mailbox, Transport};
//!
//! #[tokio::main]
//! async fn main() -> courier_smtp::Result<()> {
//!     let config = Config::builder("smtp.example.com").port(2525).build();
//!     let mut transport = Transport::from_config(config);
//!
//!     let envelope = Envelope::builder()
//!         .header("Subject", "Hello")
//!         .sender(Mailbox::with_name("Example Sender", "sender@example.com")?)
//!         .to(Mailbox::new("recipient@example.com")?)
//!         .body("Hello, World!")
//!         .build()?;
//!
//!     transport.send(&envelope).await?;
//!     transport.disconnect().await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`channel`]: byte-stream abstraction and its implementations
//! - [`command`]: SMTP command builders
//! - [`encode`]: DATA payload encoding
//! - [`parser`]: reply parser
//! - [`session`]: the guarded state machine
//! - [`types`]: addresses, envelopes, replies, credentials

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod channel;
pub mod command;
mod config;
pub mod encode;
mod error;
pub mod parser;
pub mod session;
mod transport;
pub mod types;

pub use channel::{Channel, MemoryChannel, TcpChannel};
pub use config::{Config, ConfigBuilder, Security};
pub use error::{Error, ErrorKind, Result, SequenceError};
pub use session::{ConnectionState, Session, SessionState};
pub use transport::Transport;
pub use types::{Address, AuthMechanism, Credentials, Envelope, Mailbox, Reply, ReplyCode};
