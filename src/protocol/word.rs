//! Word encoding and decoding.
//!
//! A word is one length-prefixed UTF-8 atom: a command path, a reply tag, or
//! an attribute word. The zero-length word is never a data value; it is the
//! universal sentence terminator and encodes to a single zero byte.

use crate::error::{Result, RouterOsError};

use super::length::{decode_length, encode_length};

/// Largest word length this client will accept from a peer (16 MiB).
///
/// Declared lengths above this indicate a corrupted or hostile stream.
pub const MAX_WORD_LEN: u32 = 16 * 1024 * 1024;

/// Append the wire encoding of `word` (length prefix + UTF-8 bytes) to `out`.
///
/// # Example
///
/// ```
/// use routeros_client::protocol::encode_word;
///
/// let mut out = Vec::new();
/// encode_word("", &mut out);
/// assert_eq!(out, [0x00]); // the sentence terminator
/// ```
pub fn encode_word(word: &str, out: &mut Vec<u8>) {
    encode_length(word.len() as u32, out);
    out.extend_from_slice(word.as_bytes());
}

/// Decode one word from the front of `buf`.
///
/// Returns the word and the number of bytes consumed, or `Ok(None)` when the
/// buffer does not yet hold the full word. Byte sequences that are not valid
/// UTF-8 are decoded lossily; the peer's words are text by contract.
///
/// # Errors
///
/// `Protocol` if the declared length exceeds [`MAX_WORD_LEN`].
pub fn decode_word(buf: &[u8]) -> Result<Option<(String, usize)>> {
    let Some((len, prefix_len)) = decode_length(buf) else {
        return Ok(None);
    };

    if len > MAX_WORD_LEN {
        return Err(RouterOsError::Protocol(format!(
            "word length {len} exceeds maximum {MAX_WORD_LEN}"
        )));
    }

    let len = len as usize;
    let Some(bytes) = buf.get(prefix_len..prefix_len + len) else {
        return Ok(None);
    };

    Ok(Some((
        String::from_utf8_lossy(bytes).into_owned(),
        prefix_len + len,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(word: &str) -> Vec<u8> {
        let mut out = Vec::new();
        encode_word(word, &mut out);
        out
    }

    #[test]
    fn test_empty_word_is_single_zero_byte() {
        assert_eq!(encode(""), vec![0x00]);

        let (word, consumed) = decode_word(&[0x00]).unwrap().unwrap();
        assert_eq!(word, "");
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_roundtrip_ascii() {
        let bytes = encode("/ip/firewall/filter/print");
        let (word, consumed) = decode_word(&bytes).unwrap().unwrap();
        assert_eq!(word, "/ip/firewall/filter/print");
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_roundtrip_multibyte_utf8() {
        let original = "=comment=überwachung 🔥";
        let bytes = encode(original);
        // Length prefix counts bytes, not chars.
        assert_eq!(bytes[0] as usize, original.len());

        let (word, consumed) = decode_word(&bytes).unwrap().unwrap();
        assert_eq!(word, original);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_incomplete_prefix_and_body() {
        // No length byte at all.
        assert!(decode_word(&[]).unwrap().is_none());

        // Length says 5 bytes but only 3 arrived.
        let mut bytes = encode("hello");
        bytes.truncate(4);
        assert!(decode_word(&bytes).unwrap().is_none());
    }

    #[test]
    fn test_oversized_length_rejected() {
        let mut bytes = Vec::new();
        encode_length(MAX_WORD_LEN + 1, &mut bytes);

        let err = decode_word(&bytes).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_invalid_utf8_decoded_lossily() {
        let bytes = vec![0x02, 0xFF, 0xFE];
        let (word, consumed) = decode_word(&bytes).unwrap().unwrap();
        assert_eq!(word, "\u{FFFD}\u{FFFD}");
        assert_eq!(consumed, 3);
    }
}
