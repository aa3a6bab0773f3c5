//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Credentials;

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    /// Plain text for the whole session (port 25).
    #[default]
    None,
    /// Start in plain text, upgrade with STARTTLS after EHLO (port 587).
    StartTls,
    /// TLS from the first byte (port 465).
    Implicit,
}

impl Security {
    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 25,
            Self::StartTls => 587,
            Self::Implicit => 465,
        }
    }
}

/// SMTP session configuration.
///
/// Every field has a default, so a partial document such as
/// `{"use_complete_quit": false}` deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port. `None` picks the default for `security`.
    pub port: Option<u16>,
    /// Security mode.
    pub security: Security,
    /// Name announced in EHLO/HELO.
    pub local_hostname: String,
    /// Send QUIT and wait for 221 on disconnect instead of just closing.
    pub use_complete_quit: bool,
    /// Connection timeout.
    #[serde(with = "seconds")]
    pub connect_timeout: Duration,
    /// Read/write timeout. RFC 5321 section 4.5.3.2 suggests minutes.
    #[serde(with = "seconds")]
    pub io_timeout: Duration,
    /// Credentials for AUTH, if the transport should authenticate.
    pub credentials: Option<Credentials>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: None,
            security: Security::None,
            local_hostname: "localhost".into(),
            use_complete_quit: true,
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(300),
            credentials: None,
        }
    }
}

impl Config {
    /// Creates a plain-text configuration for `host`.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder {
            config: Self::new(host),
        }
    }

    /// Port to connect to.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.security.default_port())
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.config.port = Some(port);
        self
    }

    /// Sets the security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.config.security = security;
        self
    }

    /// Sets the name announced in EHLO.
    #[must_use]
    pub fn local_hostname(mut self, name: impl Into<String>) -> Self {
        self.config.local_hostname = name.into();
        self
    }

    /// Chooses between the QUIT handshake and an abrupt close.
    #[must_use]
    pub const fn use_complete_quit(mut self, enabled: bool) -> Self {
        self.config.use_complete_quit = enabled;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the I/O timeout.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.config.io_timeout = timeout;
        self
    }

    /// Sets AUTH credentials.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = Some(credentials);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::AuthMechanism;

    #[test]
    fn test_defaults() {
        let config = Config::new("smtp.example.com");
        assert_eq!(config.host, "smtp.example.com");
        assert_eq!(config.port(), 25);
        assert_eq!(config.local_hostname, "localhost");
        assert!(config.use_complete_quit);
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(Security::None.default_port(), 25);
        assert_eq!(Security::StartTls.default_port(), 587);
        assert_eq!(Security::Implicit.default_port(), 465);
    }

    #[test]
    fn test_builder() {
        let config = Config::builder("smtp.example.com")
            .security(Security::StartTls)
            .local_hostname("client.example.com")
            .use_complete_quit(false)
            .connect_timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.port(), 587);
        assert_eq!(config.local_hostname, "client.example.com");
        assert!(!config.use_complete_quit);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));

        let config = Config::builder("smtp.example.com").port(2525).build();
        assert_eq!(config.port(), 2525);
    }

    #[test]
    fn test_partial_document() {
        let config: Config = serde_json::from_str(r#"{"use_complete_quit": false}"#).unwrap();
        assert!(!config.use_complete_quit);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.io_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_full_document() {
        let config: Config = serde_json::from_str(
            r#"{
                "host": "mail.example.com",
                "port": 465,
                "security": "implicit",
                "io_timeout": 10,
                "credentials": {"username": "u", "password": "p", "mechanism": "login"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.port(), 465);
        assert_eq!(config.security, Security::Implicit);
        assert_eq!(config.io_timeout, Duration::from_secs(10));
        let credentials = config.credentials.unwrap();
        assert_eq!(credentials.mechanism, AuthMechanism::Login);
        assert!(config.use_complete_quit);
    }
}
