//! Email address types.

use crate::error::{Error, Result};

/// Email address for the SMTP envelope.
///
/// Sent inside angle brackets exactly as supplied, so anything that could
/// end the command line early is rejected up front.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Checks and wraps `addr`.
    ///
    /// Only the shape is checked: one `@` with something on both sides and
    /// no control characters or angle brackets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] naming the problem.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(addr: &str) -> Result<()> {
        let problem = if addr.is_empty() {
            Some("empty address")
        } else if addr.chars().any(|c| c.is_control() || c == '<' || c == '>') {
            Some("forbidden character")
        } else {
            match addr.split_once('@') {
                None => Some("missing @"),
                Some((_, domain)) if domain.contains('@') => Some("more than one @"),
                Some((local, domain)) if local.is_empty() || domain.is_empty() => {
                    Some("empty local part or domain")
                }
                Some(_) => None,
            }
        };

        match problem {
            Some(problem) => Err(Error::InvalidAddress(format!("{problem}: {addr:?}"))),
            None => Ok(()),
        }
    }
}

impl std::str::FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address with an optional display name, as shown in `Sender`/`To`/`Cc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name (optional).
    pub name: Option<String>,
    /// Email address.
    pub address: Address,
}

impl Mailbox {
    /// Creates a new mailbox with just an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: None,
            address: Address::new(address)?,
        })
    }

    /// Creates a new mailbox with a display name and address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: Some(name.into()),
            address: Address::new(address)?,
        })
    }
}

/// Renders `Name <addr>`, or the bare address without a name.
impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => write!(f, "{name} <{}>", self.address),
            _ => write!(f, "{}", self.address),
        }
    }
}
