//! Core SMTP types.

mod address;
mod auth;
mod envelope;
mod hostname;
mod reply;

pub use address::{Address, Mailbox};
pub use auth::{AuthMechanism, Credentials};
pub use envelope::{Envelope, EnvelopeBuilder};
pub use hostname::{is_valid_hostname, validate_hostname};
pub use reply::{Reply, ReplyCode};
