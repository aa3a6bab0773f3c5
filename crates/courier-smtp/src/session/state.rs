//! Session state and command guards.
//!
//! The guards are pure: they inspect the flags and say whether a command may
//! be issued, without touching the channel or the flags themselves.

use crate::error::SequenceError;

/// Whether the byte stream is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No open stream.
    #[default]
    Disconnected,
    /// Stream open and greeting received.
    Connected,
}

/// Which protocol steps have succeeded since `connect`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Whether the byte stream is open.
    pub connection: ConnectionState,
    /// EHLO/HELO accepted.
    pub helo_done: bool,
    /// MAIL FROM accepted.
    pub sender_set: bool,
    /// RCPT TO commands accepted since the last MAIL FROM.
    pub recipient_count: usize,
    /// AUTH succeeded.
    pub authenticated: bool,
    /// QUIT was attempted during the last disconnect.
    pub quit_sent: bool,
}

impl SessionState {
    /// Returns true while the stream is open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self.connection, ConnectionState::Connected)
    }

    /// Guard for `connect`.
    ///
    /// # Errors
    ///
    /// [`SequenceError::AlreadyConnected`] if the stream is open.
    pub const fn check_connect(&self) -> Result<(), SequenceError> {
        if self.is_connected() {
            return Err(SequenceError::AlreadyConnected);
        }
        Ok(())
    }

    /// Guard for commands that only need an open stream (NOOP, VRFY).
    ///
    /// # Errors
    ///
    /// [`SequenceError::NotConnected`] if the stream is closed.
    pub const fn check_connected(&self) -> Result<(), SequenceError> {
        if !self.is_connected() {
            return Err(SequenceError::NotConnected);
        }
        Ok(())
    }

    /// Guard for EHLO/HELO. The connection is checked separately, after the
    /// hostname argument.
    ///
    /// # Errors
    ///
    /// [`SequenceError::HeloRepeated`] after a successful HELO.
    pub const fn check_helo(&self) -> Result<(), SequenceError> {
        if self.helo_done {
            return Err(SequenceError::HeloRepeated);
        }
        Ok(())
    }

    /// Guard for AUTH.
    ///
    /// # Errors
    ///
    /// [`SequenceError::AlreadyAuthenticated`] after a successful AUTH,
    /// otherwise [`SequenceError::NoSession`] before HELO.
    pub const fn check_auth(&self) -> Result<(), SequenceError> {
        if self.authenticated {
            return Err(SequenceError::AlreadyAuthenticated);
        }
        self.check_session()
    }

    /// Guard for MAIL and RSET.
    ///
    /// # Errors
    ///
    /// [`SequenceError::NoSession`] unless connected and greeted.
    pub const fn check_session(&self) -> Result<(), SequenceError> {
        if !self.is_connected() || !self.helo_done {
            return Err(SequenceError::NoSession);
        }
        Ok(())
    }

    /// Guard for RCPT.
    ///
    /// # Errors
    ///
    /// [`SequenceError::NoSender`] before a successful MAIL.
    pub const fn check_rcpt(&self) -> Result<(), SequenceError> {
        if !self.sender_set {
            return Err(SequenceError::NoSender);
        }
        Ok(())
    }

    /// Guard for DATA.
    ///
    /// # Errors
    ///
    /// [`SequenceError::NoRecipient`] before a successful RCPT.
    pub const fn check_data(&self) -> Result<(), SequenceError> {
        if self.recipient_count == 0 {
            return Err(SequenceError::NoRecipient);
        }
        Ok(())
    }

    /// Marks the stream open with a clean slate.
    pub fn connected(&mut self) {
        *self = Self {
            connection: ConnectionState::Connected,
            ..Self::default()
        };
    }

    /// Starts a new envelope.
    pub const fn begin_envelope(&mut self) {
        self.sender_set = true;
        self.recipient_count = 0;
    }

    /// Drops the current envelope.
    pub const fn clear_envelope(&mut self) {
        self.sender_set = false;
        self.recipient_count = 0;
    }

    /// Back to the disconnected state. `quit_sent` survives for inspection.
    pub const fn reset(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.helo_done = false;
        self.authenticated = false;
        self.clear_envelope();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greeted() -> SessionState {
        let mut state = SessionState::default();
        state.connected();
        state.helo_done = true;
        state
    }

    #[test]
    fn test_fresh_state() {
        let state = SessionState::default();
        assert!(!state.is_connected());
        assert_eq!(state.check_connect(), Ok(()));
        assert_eq!(state.check_helo(), Ok(()));
        assert_eq!(state.check_connected(), Err(SequenceError::NotConnected));
        assert_eq!(state.check_session(), Err(SequenceError::NoSession));
        assert_eq!(state.check_rcpt(), Err(SequenceError::NoSender));
        assert_eq!(state.check_data(), Err(SequenceError::NoRecipient));
    }

    #[test]
    fn test_helo_only_once() {
        let state = greeted();
        assert_eq!(state.check_helo(), Err(SequenceError::HeloRepeated));
        assert_eq!(state.check_connect(), Err(SequenceError::AlreadyConnected));
    }

    #[test]
    fn test_mail_needs_greeting() {
        let mut state = SessionState::default();
        state.connected();
        assert_eq!(state.check_session(), Err(SequenceError::NoSession));
        assert_eq!(greeted().check_session(), Ok(()));
    }

    #[test]
    fn test_auth_only_once() {
        let mut state = greeted();
        assert_eq!(state.check_auth(), Ok(()));
        state.authenticated = true;
        assert_eq!(state.check_auth(), Err(SequenceError::AlreadyAuthenticated));

        let unconnected = SessionState {
            authenticated: true,
            ..SessionState::default()
        };
        assert_eq!(
            unconnected.check_auth(),
            Err(SequenceError::AlreadyAuthenticated)
        );
    }

    #[test]
    fn test_envelope_progression() {
        let mut state = greeted();
        state.begin_envelope();
        assert_eq!(state.check_rcpt(), Ok(()));
        assert_eq!(state.check_data(), Err(SequenceError::NoRecipient));

        state.recipient_count += 2;
        assert_eq!(state.check_data(), Ok(()));

        state.begin_envelope();
        assert_eq!(state.recipient_count, 0);
        assert!(state.sender_set);
    }

    #[test]
    fn test_reset_clears_everything_but_quit_flag() {
        let mut state = greeted();
        state.authenticated = true;
        state.begin_envelope();
        state.recipient_count = 3;
        state.quit_sent = true;

        state.reset();

        assert_eq!(
            state,
            SessionState {
                quit_sent: true,
                ..SessionState::default()
            }
        );
    }

    #[test]
    fn test_connected_clears_quit_flag() {
        let mut state = SessionState {
            quit_sent: true,
            ..SessionState::default()
        };
        state.connected();
        assert!(state.is_connected());
        assert!(!state.quit_sent);
    }
}
