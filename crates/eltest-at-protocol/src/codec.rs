//! Terminator-framed codec for AT communication.
//!
//! Responses are framed solely by a trailing newline. The codec accumulates
//! received bytes and hands out one line at a time, terminator included;
//! bytes after the first terminator stay buffered for the next line.

use bytes::BytesMut;

/// Byte that completes a response.
pub const TERMINATOR: u8 = b'\n';

/// Line ending appended to commands.
pub const COMMAND_TERMINATOR: &str = "\r\n";

/// Replacement for characters outside ISO-8859-1.
const REPLACEMENT: u8 = b'?';

/// Encode text as ISO-8859-1, replacing unencodable characters with `?`.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(REPLACEMENT))
        .collect()
}

/// Decode ISO-8859-1 bytes. Every byte maps to exactly one character.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Complete a command's text for transmission.
///
/// Appends `\r\n` unless the text is empty or already ends with a newline.
pub fn terminate_command(text: &str) -> String {
    if text.is_empty() || text.ends_with(char::from(TERMINATOR)) {
        text.to_string()
    } else {
        format!("{}{}", text, COMMAND_TERMINATOR)
    }
}

/// Accumulates response bytes and splits them into terminated lines.
#[derive(Debug, Default)]
pub struct LineCodec {
    buffer: BytesMut,
}

impl LineCodec {
    /// Create a new line codec.
    pub fn new() -> Self {
        LineCodec {
            buffer: BytesMut::with_capacity(256),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the first complete line, terminator included.
    ///
    /// Returns `None` while no terminator has been received.
    pub fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.buffer.iter().position(|&b| b == TERMINATOR)?;
        let line = self.buffer.split_to(end + 1);
        log::trace!("decoded line of {} bytes, {} left", line.len(), self.buffer.len());
        Some(line.to_vec())
    }

    /// Take everything buffered, complete or not.
    pub fn take_all(&mut self) -> Vec<u8> {
        self.buffer.split().to_vec()
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminate_command() {
        assert_eq!(terminate_command("AT+EVENT?"), "AT+EVENT?\r\n");
        assert_eq!(terminate_command("AT+EVENT?\r\n"), "AT+EVENT?\r\n");
        assert_eq!(terminate_command("AT+CONF RootCA=pem\nABC\n"), "AT+CONF RootCA=pem\nABC\n");
        assert_eq!(terminate_command(""), "");
    }

    #[test]
    fn test_partial_line() {
        let mut codec = LineCodec::new();
        codec.push(b"OK 2 0 ");
        assert!(codec.take_line().is_none());

        codec.push(b"STARTUP\r\n");
        assert_eq!(codec.take_line(), Some(b"OK 2 0 STARTUP\r\n".to_vec()));
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_bytes_after_terminator_stay_buffered() {
        let mut codec = LineCodec::new();
        codec.push(b"OK\r\nERR3 ");

        assert_eq!(codec.take_line(), Some(b"OK\r\n".to_vec()));
        assert!(codec.take_line().is_none());
        assert_eq!(codec.take_all(), b"ERR3 ".to_vec());
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_bare_newline_ends_line() {
        let mut codec = LineCodec::new();
        codec.push(b"OK first\nsecond\r\n");
        assert_eq!(codec.take_line(), Some(b"OK first\n".to_vec()));
        assert_eq!(codec.take_line(), Some(b"second\r\n".to_vec()));
    }

    #[test]
    fn test_latin1_conversion() {
        assert_eq!(encode_latin1("caf\u{e9}"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_latin1("\u{20ac}1"), b"?1".to_vec());
        assert_eq!(decode_latin1(&[b'O', b'K', 0xFF]), "OK\u{ff}");
    }
}
