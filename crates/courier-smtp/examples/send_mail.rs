#![allow(clippy::doc_markdown, clippy::uninlined_format_args)]
//! Example: send one message through an SMTP relay
//!
//! Useful against a local development relay such as MailHog or smtp4dev.
//!
//! ## Running
//!
//! ```bash
//! SMTP_HOST=localhost SMTP_PORT=1025 RUST_LOG=courier_smtp=debug \
//!     cargo run --package courier-smtp --example send_mail -- recipient@example.com
//! ```
//!
//! Set `SMTP_USER` and `SMTP_PASSWORD` to authenticate with AUTH PLAIN, and
//! `SMTP_NO_QUIT=1` to hang up without the QUIT handshake.

use courier_smtp::{Config, Credentials, Envelope, Mailbox, Transport};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = std::env::var("SMTP_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(25);
    let recipient = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "recipient@example.com".to_string());

    let mut builder = Config::builder(&host)
        .port(port)
        .use_complete_quit(std::env::var_os("SMTP_NO_QUIT").is_none());
    if let (Ok(user), Ok(password)) = (std::env::var("SMTP_USER"), std::env::var("SMTP_PASSWORD")) {
        builder = builder.credentials(Credentials::new(user, password));
    }

    let envelope = Envelope::builder()
        .header("Subject", "Hello from courier")
        .sender(Mailbox::with_name("Courier Example", "sender@example.com")?)
        .to(Mailbox::new(recipient.as_str())?)
        .body("Hello!\n\n.This line starts with a dot.\n")
        .build()?;

    println!("Sending to {} via {}:{}...", recipient, host, port);
    let mut transport = Transport::from_config(builder.build());
    transport.send(&envelope).await?;
    println!("✓ Message accepted");

    transport.disconnect().await?;
    println!("✓ Disconnected (QUIT sent: {})", transport.session().state().quit_sent);
    Ok(())
}
