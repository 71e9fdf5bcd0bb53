//! Line protocol codec
//!
//! The device speaks a line-delimited key/value protocol over the raw byte
//! stream:
//!
//! - `OK` — heartbeat, no payload
//! - `{KEY}:{VALUE}` — one signal update, where VALUE is signed fixed-point
//!   with exactly two decimal places (`-?\d+\.\d\d`)
//! - anything else — discarded silently
//!
//! The two-decimal constraint is a deliberate wire contract, not a
//! formatting accident: it lets the codec reject partial or garbled reads
//! without length-prefixed or checksummed framing, which is an acceptable
//! trade on a trusted point-to-point link. Outgoing messages use the exact
//! same format so the encoder and the validator can never drift apart.
//!
//! [`LineFramer`] turns raw read chunks into complete lines; [`LineCodec`]
//! classifies each line. Timestamping of signal events is the caller's job,
//! captured at the moment classification succeeds.

use regex::Regex;

/// Heartbeat token sent periodically by the device
pub const HEARTBEAT_TOKEN: &str = "OK";

/// A classified incoming line
#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    /// The device reported it is alive
    Heartbeat,
    /// One parsed signal update
    Signal {
        /// Wire key of the signal
        key: String,
        /// Parsed value
        value: f64,
    },
}

/// Classifier for complete protocol lines
#[derive(Debug)]
pub struct LineCodec {
    value_pattern: Regex,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCodec {
    /// Create a codec with the wire value pattern compiled
    pub fn new() -> Self {
        Self {
            // Signed fixed-point with exactly two decimal places. This is
            // the link's only framing safety net; do not loosen it.
            value_pattern: Regex::new(r"^-?\d+\.\d\d$").expect("hard-coded pattern compiles"),
        }
    }

    /// Serialize an outgoing key/value message into wire bytes
    ///
    /// Produces exactly `"{key}:{value:.2}\r\n"`, bit-exact with what
    /// [`LineCodec::classify`] accepts.
    pub fn encode(key: &str, value: f64) -> Vec<u8> {
        format!("{key}:{value:.2}\r\n").into_bytes()
    }

    /// Classify one line, already stripped of its `\n` terminator
    ///
    /// Returns `None` for empty lines and for anything malformed or out of
    /// format — discards are silent by design.
    pub fn classify(&self, line: &str) -> Option<LineEvent> {
        let line = line.trim();

        if line.is_empty() {
            return None;
        }

        if line == HEARTBEAT_TOKEN {
            return Some(LineEvent::Heartbeat);
        }

        let (key, raw_value) = line.split_once(':')?;

        if !self.value_pattern.is_match(raw_value) {
            return None;
        }

        // The pattern guarantees a parseable float, but a failure here must
        // still discard rather than panic.
        let value: f64 = raw_value.parse().ok()?;

        Some(LineEvent::Signal {
            key: key.to_string(),
            value,
        })
    }
}

/// Accumulates raw read chunks and yields complete lines
///
/// Serial data arrives in arbitrary bursts, so a line may be torn across two
/// reads. The framer carries the unterminated tail until its `\n` arrives.
/// Bytes decode as UTF-8 with replacement of invalid sequences — a garbled
/// byte corrupts at most the line it sits on, which the value pattern then
/// rejects.
#[derive(Debug, Default)]
pub struct LineFramer {
    carry: String,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of raw bytes, returning all newly completed lines
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.carry.push_str(&String::from_utf8_lossy(bytes));

        let mut lines = Vec::new();
        while let Some(pos) = self.carry.find('\n') {
            let mut line: String = self.carry.drain(..=pos).collect();
            line.truncate(line.trim_end_matches(['\r', '\n']).len());
            lines.push(line);
        }
        lines
    }

    /// Bytes of the unterminated tail currently held back
    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> Option<LineEvent> {
        LineCodec::new().classify(line)
    }

    #[test]
    fn test_encode_format() {
        assert_eq!(LineCodec::encode("TEMP", 25.3), b"TEMP:25.30\r\n");
        assert_eq!(LineCodec::encode("SETP", -1.0), b"SETP:-1.00\r\n");
        assert_eq!(LineCodec::encode("X", 0.005), b"X:0.01\r\n");
    }

    #[test]
    fn test_heartbeat() {
        assert_eq!(classify("OK"), Some(LineEvent::Heartbeat));
        assert_eq!(classify("OK\r"), Some(LineEvent::Heartbeat));
        assert_eq!(classify("  OK  "), Some(LineEvent::Heartbeat));
    }

    #[test]
    fn test_valid_signal_lines() {
        assert_eq!(
            classify("TEMP:25.31"),
            Some(LineEvent::Signal {
                key: "TEMP".to_string(),
                value: 25.31,
            })
        );
        assert_eq!(
            classify("X:-0.50"),
            Some(LineEvent::Signal {
                key: "X".to_string(),
                value: -0.5,
            })
        );
    }

    #[test]
    fn test_malformed_lines_discard_silently() {
        // No separator
        assert_eq!(classify("foo"), None);
        // Non-numeric value
        assert_eq!(classify("a:b"), None);
        assert_eq!(classify("x:abc"), None);
        // Wrong decimal count
        assert_eq!(classify("x:1.2345"), None);
        assert_eq!(classify("x:1.2"), None);
        // Missing integer part
        assert_eq!(classify("x:.25"), None);
        // No fractional part at all
        assert_eq!(classify("x:42"), None);
        // Empty line
        assert_eq!(classify(""), None);
        assert_eq!(classify("   "), None);
    }

    #[test]
    fn test_key_keeps_extra_separators() {
        // Split is on the first ':' only; the rest belongs to the value and
        // fails the pattern
        assert_eq!(classify("a:b:1.25"), None);
    }

    #[test]
    fn test_framer_splits_complete_lines() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"TEMP:25.31\r\nOK\r\n");
        assert_eq!(lines, vec!["TEMP:25.31", "OK"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_framer_carries_torn_line() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"TEMP:2").is_empty());
        assert!(framer.pending() > 0);

        let lines = framer.push(b"5.31\r\nOK\r");
        assert_eq!(lines, vec!["TEMP:25.31"]);

        // The heartbeat completes on the next chunk
        let lines = framer.push(b"\n");
        assert_eq!(lines, vec!["OK"]);
    }

    #[test]
    fn test_framer_replaces_invalid_utf8() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"TE\xffMP:1.25\nOK\n");
        // The replacement character lands inside the key; the line still
        // frames and the codec decides its fate
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "OK");
    }

    proptest::proptest! {
        /// decode(encode(k, v)) round-trips for any two-decimal value
        #[test]
        fn prop_encode_decode_roundtrip(
            key in "[A-Za-z][A-Za-z0-9_]{0,15}",
            value in -100_000.0f64..100_000.0,
        ) {
            let codec = LineCodec::new();
            let wire = LineCodec::encode(&key, value);
            let mut framer = LineFramer::new();
            let lines = framer.push(&wire);
            proptest::prop_assert_eq!(lines.len(), 1);

            match codec.classify(&lines[0]) {
                Some(LineEvent::Signal { key: k, value: v }) => {
                    proptest::prop_assert_eq!(k, key);
                    // Within two-decimal quantization of the original
                    proptest::prop_assert!((v - value).abs() <= 0.005 + 1e-9);
                }
                other => proptest::prop_assert!(false, "expected signal, got {:?}", other),
            }
        }
    }
}
