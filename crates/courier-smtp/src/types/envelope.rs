//! Envelope handed to the transport.
//!
//! Carries the reverse path, the ordered forward paths, an ordered header
//! list and the body text. Header rendering is plain: one
//! `Name: value` line per header, in insertion order.

use crate::error::{Error, Result};

use super::{Address, Mailbox};

/// Message addressing plus content, read by [`crate::Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    sender: Mailbox,
    recipients: Vec<Mailbox>,
    headers: Vec<(String, String)>,
    body: String,
}

impl Envelope {
    /// Starts building an envelope.
    #[must_use]
    pub fn builder() -> EnvelopeBuilder {
        EnvelopeBuilder::default()
    }

    /// Reverse path.
    #[must_use]
    pub const fn sender(&self) -> &Mailbox {
        &self.sender
    }

    /// Forward paths, in the order they were added.
    #[must_use]
    pub fn recipients(&self) -> &[Mailbox] {
        &self.recipients
    }

    /// Recipient addresses, in order.
    pub fn recipient_addresses(&self) -> impl Iterator<Item = &Address> {
        self.recipients.iter().map(|mailbox| &mailbox.address)
    }

    /// Headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Renders the header block, each header terminated by CRLF.
    #[must_use]
    pub fn header_block(&self) -> String {
        use std::fmt::Write;

        let mut block = String::new();
        for (name, value) in &self.headers {
            let _ = write!(block, "{name}: {value}\r\n");
        }
        block
    }

    /// Body text as supplied.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Builder for [`Envelope`].
#[derive(Debug, Clone, Default)]
pub struct EnvelopeBuilder {
    sender: Option<Mailbox>,
    recipients: Vec<Mailbox>,
    headers: Vec<(String, String)>,
    body: String,
}

impl EnvelopeBuilder {
    /// Appends a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the reverse path and appends a `Sender` header.
    #[must_use]
    pub fn sender(mut self, mailbox: Mailbox) -> Self {
        self.headers.push(("Sender".into(), mailbox.to_string()));
        self.sender = Some(mailbox);
        self
    }

    /// Adds a recipient listed in the `To` header.
    #[must_use]
    pub fn to(self, mailbox: Mailbox) -> Self {
        self.listed_recipient("To", mailbox)
    }

    /// Adds a recipient listed in the `Cc` header.
    #[must_use]
    pub fn cc(self, mailbox: Mailbox) -> Self {
        self.listed_recipient("Cc", mailbox)
    }

    /// Adds a recipient that appears in no header.
    #[must_use]
    pub fn bcc(mut self, mailbox: Mailbox) -> Self {
        self.recipients.push(mailbox);
        self
    }

    /// Sets the body text.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Finishes the envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if no sender was set, or a header name or value
    /// contains a line break (or a name contains `:` or whitespace).
    pub fn build(self) -> Result<Envelope> {
        let sender = self
            .sender
            .ok_or_else(|| Error::InvalidAddress("No sender specified".into()))?;

        for (name, value) in &self.headers {
            let bad_name = name.is_empty()
                || name
                    .chars()
                    .any(|c| c == ':' || c.is_whitespace() || c.is_control());
            if bad_name {
                return Err(Error::InvalidHeader(format!("name {name:?}")));
            }
            if value.contains(['\r', '\n']) {
                return Err(Error::InvalidHeader(format!("{name} value {value:?}")));
            }
        }

        Ok(Envelope {
            sender,
            recipients: self.recipients,
            headers: self.headers,
            body: self.body,
        })
    }

    fn listed_recipient(mut self, header: &str, mailbox: Mailbox) -> Self {
        let rendered = mailbox.to_string();
        match self.headers.iter_mut().find(|(name, _)| name == header) {
            Some((_, value)) => {
                value.push_str(", ");
                value.push_str(&rendered);
            }
            None => self.headers.push((header.to_string(), rendered)),
        }
        self.recipients.push(mailbox);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sender() -> Mailbox {
        Mailbox::with_name("Example Sender", "sender@example.com").unwrap()
    }

    #[test]
    fn header_block_keeps_insertion_order() {
        let envelope = Envelope::builder()
            .header("Date", "Sun, 10 Jun 2012 20:07:24 +0200")
            .sender(sender())
            .body("hello")
            .to(Mailbox::with_name("Recipient Name", "recipient@example.com").unwrap())
            .build()
            .unwrap();

        assert_eq!(
            envelope.header_block(),
            "Date: Sun, 10 Jun 2012 20:07:24 +0200\r\n\
             Sender: Example Sender <sender@example.com>\r\n\
             To: Recipient Name <recipient@example.com>\r\n"
        );
        assert_eq!(envelope.body(), "hello");
    }

    #[test]
    fn recipients_keep_order_and_share_header() {
        let envelope = Envelope::builder()
            .sender(sender())
            .to(Mailbox::new("a@example.com").unwrap())
            .bcc(Mailbox::new("hidden@example.com").unwrap())
            .to(Mailbox::new("b@example.com").unwrap())
            .cc(Mailbox::new("c@example.com").unwrap())
            .build()
            .unwrap();

        let order: Vec<&str> = envelope.recipient_addresses().map(Address::as_str).collect();
        assert_eq!(
            order,
            ["a@example.com", "hidden@example.com", "b@example.com", "c@example.com"]
        );
        assert!(envelope.header_block().contains("To: a@example.com, b@example.com\r\n"));
        assert!(envelope.header_block().contains("Cc: c@example.com\r\n"));
        assert!(!envelope.header_block().contains("hidden"));
    }

    #[test]
    fn missing_sender_is_rejected() {
        let err = Envelope::builder()
            .to(Mailbox::new("a@example.com").unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
    }

    #[test]
    fn header_injection_is_rejected() {
        let err = Envelope::builder()
            .sender(sender())
            .header("Subject", "hi\r\nBcc: victim@example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));

        let err = Envelope::builder()
            .sender(sender())
            .header("Bad Name", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }
}
