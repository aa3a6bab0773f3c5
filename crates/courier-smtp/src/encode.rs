//! DATA payload encoding.
//!
//! Everything here is a pure transformation: CRLF normalization, the
//! RFC 5321 section 4.5.2 transparency rule (dot-stuffing), and framing of the
//! payload with its end-of-data marker.

use bytes::{BufMut, BytesMut};

/// Line terminator used on the wire.
pub const CRLF: &[u8] = b"\r\n";

/// End-of-data marker sent after the payload.
pub const END_OF_DATA: &[u8] = b".\r\n";

/// Splits `input` into logical lines.
///
/// `\r\n`, a lone `\n` and a lone `\r` all end a line. A terminator at the
/// very end does not open a new, empty line.
fn lines(input: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < input.len() {
        match input[i] {
            b'\n' => {
                out.push(&input[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                out.push(&input[start..i]);
                i += if input.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }

    if start < input.len() {
        out.push(&input[start..]);
    }
    out
}

/// Rewrites every line ending as CRLF and terminates the last line.
#[must_use]
pub fn normalize_line_endings(input: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(input.len() + input.len() / 32 + 2);
    for line in lines(input) {
        buf.put_slice(line);
        buf.put_slice(CRLF);
    }
    buf
}

/// Doubles the leading `.` of every line.
///
/// `input` is expected to be CRLF-normalized already.
#[must_use]
pub fn dot_stuff(input: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(input.len() + 8);
    for line in lines(input) {
        if line.first() == Some(&b'.') {
            buf.put_u8(b'.');
        }
        buf.put_slice(line);
        buf.put_slice(CRLF);
    }
    buf
}

/// Joins a header block and a body with exactly one blank line.
#[must_use]
pub fn message_payload(header_block: &str, body: &str) -> BytesMut {
    let mut buf = normalize_line_endings(header_block.as_bytes());
    buf.put_slice(CRLF);
    buf.put_slice(body.as_bytes());
    buf
}

/// Produces the exact bytes sent after a `354` reply to DATA.
#[must_use]
pub fn data_payload(payload: &[u8]) -> BytesMut {
    let mut buf = dot_stuff(&normalize_line_endings(payload));
    buf.put_slice(END_OF_DATA);
    buf
}
