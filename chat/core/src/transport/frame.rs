//! Fragment Framing
//!
//! The streaming socket carries untyped text frames. A reply is one or more
//! frames; the last one contains a literal terminator marker. This module
//! separates the marker from the payload so the marker never reaches message
//! content.
//!
//! A frame that carries both payload and the marker yields the payload and
//! is still terminal.

/// Terminator marker ending a streamed reply
pub const DEFAULT_TERMINATOR: &str = "[END]";

/// A decoded incoming frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    /// Text to accumulate into the reply (marker removed)
    pub payload: String,
    /// Whether the frame ends the reply
    pub terminal: bool,
}

/// Decoder for incoming text frames
#[derive(Clone, Debug)]
pub struct FragmentDecoder {
    terminator: String,
}

impl Default for FragmentDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINATOR)
    }
}

impl FragmentDecoder {
    /// Create a decoder for the given terminator marker
    #[must_use]
    pub fn new(terminator: impl Into<String>) -> Self {
        Self {
            terminator: terminator.into(),
        }
    }

    /// The terminator marker
    #[must_use]
    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    /// Split a raw frame into payload and end-of-reply flag
    #[must_use]
    pub fn decode(&self, raw: &str) -> Fragment {
        // An empty marker would match everywhere
        if self.terminator.is_empty() || !raw.contains(&self.terminator) {
            return Fragment {
                payload: raw.to_string(),
                terminal: false,
            };
        }

        Fragment {
            payload: raw.replace(&self.terminator, ""),
            terminal: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fragment() {
        let decoder = FragmentDecoder::default();
        let fragment = decoder.decode("Hello");
        assert_eq!(fragment.payload, "Hello");
        assert!(!fragment.terminal);
    }

    #[test]
    fn test_bare_terminator() {
        let decoder = FragmentDecoder::default();
        let fragment = decoder.decode("[END]");
        assert!(fragment.payload.is_empty());
        assert!(fragment.terminal);
    }

    #[test]
    fn test_terminator_with_surrounding_payload() {
        let decoder = FragmentDecoder::default();

        let fragment = decoder.decode("world![END]");
        assert_eq!(fragment.payload, "world!");
        assert!(fragment.terminal);

        let fragment = decoder.decode("tail[END] trailing");
        assert_eq!(fragment.payload, "tail trailing");
        assert!(fragment.terminal);
    }

    #[test]
    fn test_custom_and_empty_terminator() {
        let decoder = FragmentDecoder::new("<<done>>");
        assert!(decoder.decode("x<<done>>").terminal);
        assert!(!decoder.decode("[END]").terminal);

        let decoder = FragmentDecoder::new("");
        let fragment = decoder.decode("anything");
        assert_eq!(fragment.payload, "anything");
        assert!(!fragment.terminal);
    }
}
