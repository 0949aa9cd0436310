//! Sentence assembly from a stream of words.
//!
//! A sentence is an ordered sequence of words terminated by a zero-length
//! word. [`SentenceBuffer`] owns a rolling byte buffer fed by socket reads
//! and yields one [`Sentence`] at a time, holding fragmented data until the
//! terminator arrives.
//!
//! # Example
//!
//! ```
//! use routeros_client::protocol::{encode_word, SentenceBuffer};
//!
//! let mut wire = Vec::new();
//! encode_word("!done", &mut wire);
//! wire.push(0); // terminator
//!
//! let mut buffer = SentenceBuffer::new();
//! buffer.extend(&wire);
//! let sentence = buffer.try_next().unwrap().unwrap();
//! assert!(sentence.is_done());
//! ```

use bytes::BytesMut;

use crate::error::Result;

use super::word::decode_word;

/// Reply tag: one result row.
pub const REPLY_RE: &str = "!re";
/// Reply tag: end of results, may carry scalar attributes.
pub const REPLY_DONE: &str = "!done";
/// Reply tag: command-level error.
pub const REPLY_TRAP: &str = "!trap";
/// Reply tag: connection-level error.
pub const REPLY_FATAL: &str = "!fatal";

/// One protocol message: the non-empty words of a sentence, in wire order.
///
/// The terminating zero-length word is consumed during assembly and never
/// appears here. A sentence with no words at all is a keep-alive/spacing
/// message from the peer; callers skip those rather than treating them as
/// protocol errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    words: Vec<String>,
}

impl Sentence {
    /// Create a sentence from already-decoded words.
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }

    /// All words, in wire order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Whether the sentence carries no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The first word: a reply tag for responses, a command path for requests.
    pub fn first_word(&self) -> Option<&str> {
        self.words.first().map(String::as_str)
    }

    /// Words after the first: attribute words and query words.
    pub fn attribute_words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().skip(1).map(String::as_str)
    }

    /// Whether this is a `!re` result row.
    pub fn is_re(&self) -> bool {
        self.first_word() == Some(REPLY_RE)
    }

    /// Whether this is a `!done` end-of-results marker.
    pub fn is_done(&self) -> bool {
        self.first_word() == Some(REPLY_DONE)
    }

    /// Whether this is a `!trap` command-level error.
    pub fn is_trap(&self) -> bool {
        self.first_word() == Some(REPLY_TRAP)
    }

    /// Whether this is a `!fatal` connection-level error.
    pub fn is_fatal(&self) -> bool {
        self.first_word() == Some(REPLY_FATAL)
    }
}

/// Buffer for accumulating incoming bytes and extracting complete sentences.
///
/// Bytes are consumed from the buffer only when a full sentence (terminator
/// included) is available, so a partial read never loses data.
#[derive(Debug)]
pub struct SentenceBuffer {
    buffer: BytesMut,
}

impl SentenceBuffer {
    /// Create an empty buffer. Default capacity: 8 KiB.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
        }
    }

    /// Append raw bytes from a socket read.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to extract the next sentence.
    ///
    /// Returns:
    /// - `Ok(Some(sentence))` if a complete sentence was extracted
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` on a framing violation (e.g. oversized word)
    pub fn try_next(&mut self) -> Result<Option<Sentence>> {
        let mut words = Vec::new();
        let mut offset = 0;

        loop {
            match decode_word(&self.buffer[offset..])? {
                None => return Ok(None),
                Some((word, consumed)) => {
                    offset += consumed;
                    if word.is_empty() {
                        let _ = self.buffer.split_to(offset);
                        return Ok(Some(Sentence::new(words)));
                    }
                    words.push(word);
                }
            }
        }
    }

    /// Number of buffered bytes not yet assembled into a sentence.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether no partial data is pending.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop any buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for SentenceBuffer {
    fn default() -> Self {
        Self::new()
    }
}
