//! Authentication types.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// SASL mechanism used by `Session::auth`.
///
/// The mechanism is chosen by the caller; no negotiation against the EHLO
/// reply takes place.
///
/// Deserializes from a mechanism name in any case, such as `"plain"` or
/// `"LOGIN"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AuthMechanism {
    /// PLAIN with an initial response (RFC 4616).
    #[default]
    Plain,
    /// LOGIN: username and password sent as separate continuations.
    Login,
}

impl AuthMechanism {
    /// Parses a mechanism name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PLAIN" => Some(Self::Plain),
            "LOGIN" => Some(Self::Login),
            _ => None,
        }
    }

    /// Returns the mechanism name as sent after `AUTH`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
        }
    }
}

impl TryFrom<String> for AuthMechanism {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::parse(&name).ok_or_else(|| format!("unsupported SASL mechanism {name:?}"))
    }
}

/// Username/password pair for AUTH.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Authentication identity.
    pub username: String,
    /// Secret.
    pub password: String,
    /// Mechanism to authenticate with.
    #[serde(default)]
    pub mechanism: AuthMechanism,
}

impl Credentials {
    /// Creates PLAIN credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            mechanism: AuthMechanism::Plain,
        }
    }

    /// Switches the mechanism.
    #[must_use]
    pub const fn mechanism(mut self, mechanism: AuthMechanism) -> Self {
        self.mechanism = mechanism;
        self
    }

    /// Base64 `\0username\0password` for AUTH PLAIN.
    #[must_use]
    pub fn plain_response(&self) -> String {
        let credentials = format!("\0{}\0{}", self.username, self.password);
        encode(credentials.as_bytes())
    }

    /// Base64 username for AUTH LOGIN.
    #[must_use]
    pub fn login_username(&self) -> String {
        encode(self.username.as_bytes())
    }

    /// Base64 password for AUTH LOGIN.
    #[must_use]
    pub fn login_password(&self) -> String {
        encode(self.password.as_bytes())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("mechanism", &self.mechanism)
            .finish()
    }
}

fn encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn plain_response() {
        let creds = Credentials::new("user", "pass");
        assert_eq!(creds.plain_response(), "AHVzZXIAcGFzcw==");
    }

    #[test]
    fn login_responses() {
        let creds = Credentials::new("user", "pass").mechanism(AuthMechanism::Login);
        assert_eq!(creds.login_username(), "dXNlcg==");
        assert_eq!(creds.login_password(), "cGFzcw==");
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::new("user", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn parse_mechanism() {
        assert_eq!(AuthMechanism::parse("plain"), Some(AuthMechanism::Plain));
        assert_eq!(AuthMechanism::parse("LOGIN"), Some(AuthMechanism::Login));
        assert_eq!(AuthMechanism::parse("CRAM-MD5"), None);
    }

    #[test]
    fn mechanism_from_config_ignores_case() {
        let creds: Credentials =
            serde_json::from_str(r#"{"username": "u", "password": "p", "mechanism": "LOGIN"}"#)
                .unwrap();
        assert_eq!(creds.mechanism, AuthMechanism::Login);

        let err = serde_json::from_str::<Credentials>(
            r#"{"username": "u", "password": "p", "mechanism": "cram-md5"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported SASL mechanism"));

        let rendered = serde_json::to_string(&AuthMechanism::Plain).unwrap();
        assert_eq!(rendered, r#""plain""#);
    }
}
