//! Whole-message sending on top of a [`Session`].

use crate::channel::{Channel, TcpChannel};
use crate::config::Config;
use crate::encode;
use crate::error::Result;
use crate::session::Session;
use crate::types::Envelope;

/// Sends envelopes through one session.
///
/// `send` never disconnects; the owner decides when the session ends, so
/// the session flags can still be inspected after a send.
#[derive(Debug)]
pub struct Transport<C = TcpChannel> {
    session: Session<C>,
}

impl Transport<TcpChannel> {
    /// Creates a transport talking to `config.host` over the network.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self::new(Session::tcp(config))
    }
}

impl<C: Channel> Transport<C> {
    /// Wraps an existing session.
    #[must_use]
    pub const fn new(session: Session<C>) -> Self {
        Self { session }
    }

    /// The session commands are issued on.
    #[must_use]
    pub const fn session(&self) -> &Session<C> {
        &self.session
    }

    /// The session, mutably.
    pub const fn session_mut(&mut self) -> &mut Session<C> {
        &mut self.session
    }

    /// Consumes the transport, returning its session.
    pub fn into_session(self) -> Session<C> {
        self.session
    }

    /// Sends one envelope.
    ///
    /// Connects and greets if needed (or resets a transaction a failed
    /// envelope left open), authenticates when credentials are configured,
    /// then issues MAIL, one RCPT per recipient in envelope order, and DATA.
    /// The first failure stops the sequence; commands the server already
    /// accepted are not undone.
    ///
    /// # Errors
    ///
    /// Returns the first connection, sequence, validation or protocol error.
    pub async fn send(&mut self, envelope: &Envelope) -> Result<()> {
        if !self.session.state().is_connected() {
            self.session.connect().await?;
        }

        if !self.session.state().helo_done {
            let hostname = self.session.config().local_hostname.clone();
            self.session.helo(&hostname).await?;
        } else if self.session.state().sender_set {
            self.session.rset().await?;
        }

        if !self.session.state().authenticated
            && let Some(credentials) = self.session.config().credentials.clone()
        {
            self.session.auth(&credentials).await?;
        }

        self.session.mail(&envelope.sender().address).await?;
        for recipient in envelope.recipient_addresses() {
            self.session.rcpt(recipient).await?;
        }

        let payload = encode::message_payload(&envelope.header_block(), envelope.body());
        self.session.data(&payload).await
    }

    /// Ends the session; see [`Session::disconnect`].
    ///
    /// # Errors
    ///
    /// Returns the QUIT or close failure, after the session was reset.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.session.disconnect().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::channel::MemoryChannel;
    use crate::error::{Error, SequenceError};
    use crate::types::{Credentials, Mailbox};

    fn envelope(recipients: &[&str]) -> Envelope {
        let mut builder = Envelope::builder()
            .sender(Mailbox::new("sender@example.com").unwrap())
            .body("hello");
        for r in recipients {
            builder = builder.to(Mailbox::new(*r).unwrap());
        }
        builder.build().unwrap()
    }

    fn transport(channel: MemoryChannel, config: Config) -> Transport<MemoryChannel> {
        Transport::new(Session::new(channel, config))
    }

    #[tokio::test]
    async fn test_recipients_in_envelope_order() {
        let mut transport = transport(MemoryChannel::new(), Config::new("mx.example.com"));
        transport
            .send(&envelope(&["a@example.com", "b@example.com", "c@example.com"]))
            .await
            .unwrap();

        let lines = transport.session().channel().lines();
        assert_eq!(
            &lines[..6],
            [
                "EHLO localhost",
                "MAIL FROM:<sender@example.com>",
                "RCPT TO:<a@example.com>",
                "RCPT TO:<b@example.com>",
                "RCPT TO:<c@example.com>",
                "DATA",
            ]
        );
        assert!(!transport.session().state().sender_set);
        assert!(transport.session().state().is_connected());
    }

    #[tokio::test]
    async fn test_rejected_recipient_withholds_tail() {
        let channel = MemoryChannel::new()
            .with_reply(220, "ready")
            .with_reply(250, "hello")
            .with_reply(250, "sender ok")
            .with_reply(250, "a ok")
            .with_reply(550, "no b");
        let mut transport = transport(channel, Config::new("mx.example.com"));

        let err = transport
            .send(&envelope(&["a@example.com", "b@example.com", "c@example.com"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SmtpError { code: 550, .. }));

        let log = transport.session().channel().log();
        assert!(log.ends_with("RCPT TO:<b@example.com>\r\n"));
        assert!(!log.contains("c@example.com"));
        assert!(!log.contains("DATA"));
    }

    #[tokio::test]
    async fn test_no_recipients_fails_before_data() {
        let mut transport = transport(MemoryChannel::new(), Config::new("mx.example.com"));
        let err = transport.send(&envelope(&[])).await.unwrap_err();
        assert!(matches!(err, Error::Sequence(SequenceError::NoRecipient)));
        assert!(!transport.session().channel().log().contains("DATA"));
    }

    #[tokio::test]
    async fn test_second_send_reuses_session() {
        let mut transport = transport(MemoryChannel::new(), Config::new("mx.example.com"));
        transport.send(&envelope(&["a@example.com"])).await.unwrap();
        transport.session_mut().channel_mut().clear_log();

        transport.send(&envelope(&["b@example.com"])).await.unwrap();
        let lines = transport.session().channel().lines();
        assert_eq!(lines[0], "MAIL FROM:<sender@example.com>");
        assert_eq!(transport.session().channel().connects(), 1);
    }

    #[tokio::test]
    async fn test_send_after_failed_envelope_resets() {
        let channel = MemoryChannel::new()
            .with_reply(220, "ready")
            .with_reply(250, "hello")
            .with_reply(250, "sender ok")
            .with_reply(550, "no such user");
        let mut transport = transport(channel, Config::new("mx.example.com"));
        assert!(transport.send(&envelope(&["a@example.com"])).await.is_err());
        transport.session_mut().channel_mut().clear_log();

        transport.send(&envelope(&["b@example.com"])).await.unwrap();
        let lines = transport.session().channel().lines();
        assert_eq!(lines[0], "RSET");
        assert_eq!(lines[1], "MAIL FROM:<sender@example.com>");
    }

    #[tokio::test]
    async fn test_authenticates_with_configured_credentials() {
        let config = Config::builder("mx.example.com")
            .credentials(Credentials::new("user", "pass"))
            .build();
        let mut transport = transport(MemoryChannel::new(), config);
        transport.send(&envelope(&["a@example.com"])).await.unwrap();

        let lines = transport.session().channel().lines();
        assert_eq!(lines[1], "AUTH PLAIN AHVzZXIAcGFzcw==");
        assert!(transport.session().state().authenticated);

        transport.send(&envelope(&["b@example.com"])).await.unwrap();
        let auths = transport
            .session()
            .channel()
            .lines()
            .iter()
            .filter(|l| l.starts_with("AUTH"))
            .count();
        assert_eq!(auths, 1);
    }

    #[tokio::test]
    async fn test_send_does_not_disconnect() {
        let mut transport = transport(MemoryChannel::new(), Config::new("mx.example.com"));
        transport.send(&envelope(&["a@example.com"])).await.unwrap();
        assert!(!transport.session().channel().log().contains("QUIT"));

        transport.disconnect().await.unwrap();
        assert!(transport.session().channel().log().ends_with("QUIT\r\n"));
        let session = transport.into_session();
        assert!(!session.state().is_connected());
    }
}
