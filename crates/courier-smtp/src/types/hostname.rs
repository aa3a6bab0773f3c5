//! DNS hostname validation for HELO/EHLO.

use crate::error::{Error, Result};

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Checks `hostname` against the DNS hostname grammar.
///
/// Single-label local names such as `localhost` are accepted, and so is a
/// dotted IPv4 address since it fits the label grammar. IPv6 literals and
/// anything with whitespace or control characters are not.
///
/// # Errors
///
/// Returns [`Error::InvalidHostname`] if the name does not match.
pub fn validate_hostname(hostname: &str) -> Result<()> {
    if is_valid_hostname(hostname) {
        Ok(())
    } else {
        Err(Error::InvalidHostname(hostname.to_string()))
    }
}

/// Returns true if `hostname` matches the DNS hostname grammar.
#[must_use]
pub fn is_valid_hostname(hostname: &str) -> bool {
    let name = hostname.strip_suffix('.').unwrap_or(hostname);

    if name.is_empty() || name.len() > MAX_HOSTNAME_LEN {
        return false;
    }

    name.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_names() {
        for name in [
            "localhost",
            "hostname.test",
            "mail.example.com",
            "mail.example.com.",
            "a-b.c1",
            "xn--bcher-kva.example",
            "127.0.0.1",
        ] {
            assert!(is_valid_hostname(name), "{name}");
        }
    }

    #[test]
    fn rejects_line_breaks() {
        assert!(!is_valid_hostname("invalid\r\nhost name"));
        assert!(!is_valid_hostname("host\n"));
        assert!(!is_valid_hostname("host\rname"));
    }

    #[test]
    fn rejects_bad_labels() {
        for name in [
            "",
            ".",
            "host name",
            "-leading.example",
            "trailing-.example",
            "double..dot",
            "under_score.example",
            "::1",
            "[127.0.0.1]",
        ] {
            assert!(!is_valid_hostname(name), "{name:?}");
        }
    }

    #[test]
    fn rejects_long_labels() {
        let label = "a".repeat(64);
        assert!(!is_valid_hostname(&format!("{label}.example")));
        assert!(is_valid_hostname(&format!("{}.example", &label[..63])));
    }

    #[test]
    fn validation_error_message() {
        let err = validate_hostname("invalid\r\nhost name").unwrap_err();
        assert!(
            err.to_string()
                .contains("does not match the expected structure for a DNS hostname")
        );
    }
}
