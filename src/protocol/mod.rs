//! Wire framing for the RouterOS API protocol.
//!
//! The protocol is sentence oriented: a sentence is a sequence of words
//! terminated by a zero-length word, and each word is a length-prefixed
//! UTF-8 atom. Three layers build on each other:
//!
//! - [`length`] - the variable-width length prefix
//! - [`word`] - one length-prefixed word
//! - [`sentence`] - word sequences assembled from a rolling byte buffer

pub mod length;
pub mod sentence;
pub mod word;

pub use length::{decode_length, encode_length};
pub use sentence::{
    Sentence, SentenceBuffer, REPLY_DONE, REPLY_FATAL, REPLY_RE, REPLY_TRAP,
};
pub use word::{decode_word, encode_word, MAX_WORD_LEN};
