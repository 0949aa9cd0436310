//! Reply records assembled from response sentences.
//!
//! Each `!re` sentence contributes one [`ReplyRecord`]: a key/value map built
//! from its `=key=value` attribute words. The `!done` sentence's attributes
//! form a record of their own; count-only queries put their single scalar
//! there as `=ret=`.

use std::collections::HashMap;

use crate::protocol::Sentence;

/// Attribute key carrying the scalar result of count-only queries.
pub const RET_KEY: &str = "ret";

/// Split an attribute word of the form `=key=value` into its parts.
///
/// Only the first two `=` characters are structural; the value may itself
/// contain `=`. Words of any other shape (reply tags, bare query words)
/// yield `None` and contribute nothing to a record.
pub fn parse_attribute(word: &str) -> Option<(&str, &str)> {
    let rest = word.strip_prefix('=')?;
    let split = rest.find('=')?;
    Some((&rest[..split], &rest[split + 1..]))
}

/// Key/value mapping built from one sentence's attribute words.
///
/// Keys are unique within a record; on a duplicate key the last write wins
/// (which should not occur on a well-behaved peer).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyRecord {
    fields: HashMap<String, String>,
}

impl ReplyRecord {
    /// Build a record from the attribute words of `sentence`, skipping the
    /// leading type word and any word that is not `=key=value` shaped.
    pub fn from_sentence(sentence: &Sentence) -> Self {
        let mut record = Self::default();
        for word in sentence.attribute_words() {
            if let Some((key, value)) = parse_attribute(word) {
                record.insert(key, value);
            }
        }
        record
    }

    /// Insert one field; replaces any existing value for `key`.
    pub fn insert(&mut self, key: &str, value: &str) {
        self.fields.insert(key.to_owned(), value.to_owned());
    }

    /// Look up a field value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record carries no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Everything collected for one executed command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandReply {
    /// One record per `!re` sentence, in wire arrival order.
    pub rows: Vec<ReplyRecord>,
    /// Attribute words of the terminating `!done` sentence. Empty when the
    /// command ended in `!trap`.
    pub done: ReplyRecord,
    /// The trap message, if the command's reply stream ended in `!trap`.
    /// Rows collected before the trap are kept.
    pub trap: Option<String>,
}

impl CommandReply {
    /// Whether this command ended in `!trap`.
    pub fn is_trapped(&self) -> bool {
        self.trap.is_some()
    }

    /// The `=ret=` scalar from the `!done` sentence, parsed as an integer.
    ///
    /// This is how count-only queries report their result.
    pub fn scalar_ret(&self) -> Option<u64> {
        self.done.get(RET_KEY)?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attribute_basic() {
        assert_eq!(parse_attribute("=dst-port=80"), Some(("dst-port", "80")));
        assert_eq!(parse_attribute("=chain=forward"), Some(("chain", "forward")));
    }

    #[test]
    fn test_parse_attribute_value_may_contain_equals() {
        assert_eq!(
            parse_attribute("=comment=a=b=c"),
            Some(("comment", "a=b=c"))
        );
    }

    #[test]
    fn test_parse_attribute_empty_value() {
        assert_eq!(parse_attribute("=count-only="), Some(("count-only", "")));
    }

    #[test]
    fn test_non_attribute_words_rejected() {
        assert_eq!(parse_attribute("disabled"), None);
        assert_eq!(parse_attribute("?protocol=tcp"), None);
        assert_eq!(parse_attribute("=oddball"), None);
        assert_eq!(parse_attribute("!re"), None);
    }

    #[test]
    fn test_record_from_sentence_skips_malformed_words() {
        let sentence = Sentence::new(vec![
            "!re".into(),
            "=dst-port=80".into(),
            "disabled".into(),
            "=chain=input".into(),
        ]);

        let record = ReplyRecord::from_sentence(&sentence);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("dst-port"), Some("80"));
        assert_eq!(record.get("chain"), Some("input"));
        assert_eq!(record.get("disabled"), None);
    }

    #[test]
    fn test_duplicate_key_last_write_wins() {
        let sentence = Sentence::new(vec![
            "!re".into(),
            "=action=accept".into(),
            "=action=drop".into(),
        ]);

        let record = ReplyRecord::from_sentence(&sentence);
        assert_eq!(record.get("action"), Some("drop"));
    }

    #[test]
    fn test_scalar_ret_from_done() {
        let done = Sentence::new(vec!["!done".into(), "=ret=42".into()]);
        let reply = CommandReply {
            done: ReplyRecord::from_sentence(&done),
            ..CommandReply::default()
        };

        assert_eq!(reply.scalar_ret(), Some(42));
        assert!(!reply.is_trapped());
    }

    #[test]
    fn test_scalar_ret_absent_or_unparsable() {
        let reply = CommandReply::default();
        assert_eq!(reply.scalar_ret(), None);

        let mut done = ReplyRecord::default();
        done.insert(RET_KEY, "not-a-number");
        let reply = CommandReply {
            done,
            ..CommandReply::default()
        };
        assert_eq!(reply.scalar_ret(), None);
    }
}
