//! SMTP session state machine.
//!
//! A [`Session`] owns one [`Channel`] and the [`SessionState`] describing
//! which protocol steps have succeeded on it. Every command goes through a
//! guard first; a failing guard returns a [`SequenceError`] before anything
//! is written, and a rejected command leaves the flags untouched.
//!
//! ```text
//! Disconnected ── connect ──→ Connected ── helo ──→ Greeted ── mail ──→ Sender set
//!      ↑                                      │                            │
//!      │                                     auth                        rcpt (n times)
//!      │                                                                   │
//!      └──────────────────── disconnect (from any state) ←──── data ───────┘
//! ```
//!
//! [`SequenceError`]: crate::SequenceError

mod state;

pub use state::{ConnectionState, SessionState};

use crate::channel::{Channel, TcpChannel};
use crate::command::Command;
use crate::config::{Config, Security};
use crate::encode;
use crate::error::{Error, Result};
use crate::types::{Address, AuthMechanism, Credentials, Reply, ReplyCode, validate_hostname};

/// One SMTP conversation over one channel.
#[derive(Debug)]
pub struct Session<C = TcpChannel> {
    channel: C,
    config: Config,
    state: SessionState,
}

impl Session<TcpChannel> {
    /// Creates a disconnected session that will talk to `config.host` over
    /// the network.
    #[must_use]
    pub fn tcp(config: Config) -> Self {
        let channel = TcpChannel::new(&config);
        Self::new(channel, config)
    }
}

impl<C: Channel> Session<C> {
    /// Creates a disconnected session over `channel`.
    #[must_use]
    pub fn new(channel: C, config: Config) -> Self {
        Self {
            channel,
            config,
            state: SessionState::default(),
        }
    }

    /// Current protocol state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying channel.
    #[must_use]
    pub const fn channel(&self) -> &C {
        &self.channel
    }

    /// The underlying channel, mutably.
    pub const fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Consumes the session, returning its channel.
    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Whether `disconnect` performs the QUIT handshake.
    #[must_use]
    pub const fn use_complete_quit(&self) -> bool {
        self.config.use_complete_quit
    }

    /// Chooses between the QUIT handshake and an abrupt close on
    /// `disconnect`.
    pub const fn set_use_complete_quit(&mut self, enabled: bool) {
        self.config.use_complete_quit = enabled;
    }

    /// Opens the channel to the configured server and reads its greeting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] naming the host if the channel cannot be
    /// opened, or the greeting's error if the server does not answer 220.
    pub async fn connect(&mut self) -> Result<()> {
        self.state.check_connect()?;

        let host = self.config.host.clone();
        let port = self.config.port();
        self.channel.connect(&host, port).await?;

        let greeting = match self.channel.read_reply().await {
            Ok(reply) => reply.expect(&[ReplyCode::SERVICE_READY]),
            Err(e) => Err(e),
        };
        let greeting = match greeting {
            Ok(greeting) => greeting,
            Err(e) => {
                if let Err(close_err) = self.channel.close().await {
                    tracing::warn!(
                        error = %close_err,
                        "Closing channel after bad greeting failed"
                    );
                }
                return Err(e);
            }
        };

        tracing::info!(host = %host, port, greeting = %greeting, "Connected");
        self.state.connected();
        Ok(())
    }

    /// Greets the server with EHLO, falling back to HELO when EHLO is
    /// refused. With [`Security::StartTls`] the channel is then upgraded and
    /// EHLO repeated.
    ///
    /// # Errors
    ///
    /// Fails without writing anything if HELO already succeeded, `hostname`
    /// is not a DNS hostname, or the session is not connected, checked in
    /// that order.
    pub async fn helo(&mut self, hostname: &str) -> Result<()> {
        self.state.check_helo()?;
        validate_hostname(hostname)?;
        self.state.check_connected()?;

        self.greet(hostname).await?;
        if self.config.security == Security::StartTls {
            self.send(Command::StartTls)
                .await?
                .expect(&[ReplyCode::SERVICE_READY])?;
            self.channel.start_tls().await?;
            self.greet(hostname).await?;
        }

        self.state.helo_done = true;
        Ok(())
    }

    /// Authenticates with the mechanism named in `credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SequenceError::AlreadyAuthenticated`] on a second
    /// call, or the server's rejection.
    pub async fn auth(&mut self, credentials: &Credentials) -> Result<()> {
        self.state.check_auth()?;

        match credentials.mechanism {
            AuthMechanism::Plain => {
                self.send(Command::Auth {
                    mechanism: AuthMechanism::Plain,
                    initial_response: Some(credentials.plain_response()),
                })
                .await?
                .expect(&[ReplyCode::AUTH_SUCCESS])?;
            }
            AuthMechanism::Login => {
                self.send(Command::Auth {
                    mechanism: AuthMechanism::Login,
                    initial_response: None,
                })
                .await?
                .expect(&[ReplyCode::AUTH_CONTINUE])?;
                self.send(Command::AuthResponse(credentials.login_username()))
                    .await?
                    .expect(&[ReplyCode::AUTH_CONTINUE])?;
                self.send(Command::AuthResponse(credentials.login_password()))
                    .await?
                    .expect(&[ReplyCode::AUTH_SUCCESS])?;
            }
        }

        tracing::debug!(username = %credentials.username, "Authenticated");
        self.state.authenticated = true;
        Ok(())
    }

    /// Sends MAIL FROM, starting a new envelope.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SequenceError::NoSession`] before a successful HELO,
    /// or the server's rejection.
    pub async fn mail(&mut self, from: &Address) -> Result<()> {
        self.state.check_session()?;
        self.send(Command::MailFrom { from: from.clone() })
            .await?
            .expect(&[ReplyCode::OK])?;
        self.state.begin_envelope();
        Ok(())
    }

    /// Sends RCPT TO for one recipient.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SequenceError::NoSender`] before a successful MAIL,
    /// or the server's rejection.
    pub async fn rcpt(&mut self, to: &Address) -> Result<()> {
        self.state.check_rcpt()?;
        self.send(Command::RcptTo { to: to.clone() })
            .await?
            .expect(&[ReplyCode::OK, ReplyCode::FORWARD])?;
        self.state.recipient_count += 1;
        Ok(())
    }

    /// Sends DATA followed by `payload`, CRLF-normalized and dot-stuffed,
    /// and the end-of-data marker. An accepted message ends the envelope.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SequenceError::NoRecipient`] before a successful
    /// RCPT, or the server's rejection of DATA or of the message.
    pub async fn data(&mut self, payload: &[u8]) -> Result<()> {
        self.state.check_data()?;
        self.send(Command::Data)
            .await?
            .expect(&[ReplyCode::START_DATA])?;

        let encoded = encode::data_payload(payload);
        tracing::debug!(bytes = encoded.len(), "Sending message");
        self.channel.write_all(&encoded).await?;
        let reply = self.channel.read_reply().await?.expect(&[ReplyCode::OK])?;
        tracing::info!(
            recipients = self.state.recipient_count,
            reply = %reply,
            "Message accepted"
        );
        self.state.clear_envelope();
        Ok(())
    }

    /// Aborts the current envelope with RSET.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SequenceError::NoSession`] before a successful HELO,
    /// or the server's rejection.
    pub async fn rset(&mut self) -> Result<()> {
        self.state.check_session()?;
        self.send(Command::Rset)
            .await?
            .expect(&[ReplyCode::OK, ReplyCode::SERVICE_READY])?;
        self.state.clear_envelope();
        Ok(())
    }

    /// Sends NOOP.
    ///
    /// # Errors
    ///
    /// Returns an error if not connected or the server does not answer 250.
    pub async fn noop(&mut self) -> Result<()> {
        self.state.check_connected()?;
        self.send(Command::Noop).await?.expect(&[ReplyCode::OK])?;
        Ok(())
    }

    /// Asks the server to verify `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if not connected or the server answers anything but
    /// 250, 251 or 252.
    pub async fn vrfy(&mut self, user: &str) -> Result<Reply> {
        self.state.check_connected()?;
        if user.contains(['\r', '\n']) {
            return Err(Error::InvalidAddress(format!("{user:?}")));
        }
        self.send(Command::Vrfy {
            address: user.to_string(),
        })
        .await?
        .expect(&[ReplyCode::OK, ReplyCode::FORWARD, ReplyCode::CANNOT_VERIFY])
    }

    /// Ends the session.
    ///
    /// With `use_complete_quit` QUIT is attempted in any state and 221 is
    /// awaited; otherwise the channel is closed straight away. Either way the
    /// channel is closed and every flag reset before this returns, even when
    /// QUIT or the close fails. The first such failure is returned, so a
    /// session that never connected reports the failed QUIT write.
    ///
    /// # Errors
    ///
    /// Returns the QUIT or close failure, after the reset.
    pub async fn disconnect(&mut self) -> Result<()> {
        let mut outcome = Ok(());

        if self.config.use_complete_quit {
            outcome = self.quit().await;
            if let Err(e) = &outcome {
                tracing::warn!(error = %e, "QUIT failed");
            }
        }

        let closed = self.channel.close().await;
        if let Err(e) = &closed {
            tracing::warn!(error = %e, "Closing channel failed");
        }
        outcome = outcome.and(closed);

        self.state.reset();
        tracing::info!(host = %self.config.host, quit = self.state.quit_sent, "Disconnected");
        outcome
    }

    async fn quit(&mut self) -> Result<()> {
        tracing::debug!(command = Command::Quit.verb(), "Sending command");
        self.state.quit_sent = true;
        self.channel.write_all(&Command::Quit.serialize()).await?;
        self.channel
            .read_reply()
            .await?
            .expect(&[ReplyCode::CLOSING])?;
        Ok(())
    }

    async fn greet(&mut self, hostname: &str) -> Result<()> {
        let reply = self
            .send(Command::Ehlo {
                hostname: hostname.to_string(),
            })
            .await?;
        if reply.is_success() {
            return Ok(());
        }
        if !reply.code.is_permanent() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        tracing::debug!(code = reply.code.as_u16(), "EHLO refused, falling back to HELO");
        self.send(Command::Helo {
            hostname: hostname.to_string(),
        })
        .await?
        .expect(&[ReplyCode::OK])?;
        Ok(())
    }

    async fn send(&mut self, command: Command) -> Result<Reply> {
        tracing::debug!(command = command.verb(), "Sending command");
        self.channel.write_all(&command.serialize()).await?;
        let reply = self.channel.read_reply().await?;
        tracing::trace!(code = reply.code.as_u16(), "Received reply");
        Ok(reply)
    }
}
