//! Request sentences sent by the client.
//!
//! A command's first word is a resource path (e.g.
//! `/ip/firewall/filter/print`); the remaining words are `=key=value`
//! attribute words and `?`-prefixed query words. Commands are independent of
//! each other and are executed strictly one at a time.
//!
//! # Example
//!
//! ```
//! use routeros_client::Command;
//!
//! let cmd = Command::new("/ip/firewall/connection/print")
//!     .attribute("count-only", "")
//!     .query("protocol=tcp");
//!
//! assert_eq!(
//!     cmd.words(),
//!     ["/ip/firewall/connection/print", "=count-only=", "?protocol=tcp"]
//! );
//! ```

use crate::protocol::encode_word;

/// One request sentence: a resource path plus attribute and query words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    words: Vec<String>,
}

impl Command {
    /// Create a command for the given resource path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            words: vec![path.into()],
        }
    }

    /// Append an `=key=value` attribute word.
    ///
    /// An empty value produces `=key=`, the shape used for count-only
    /// requests.
    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.words.push(format!("={key}={value}"));
        self
    }

    /// Append a `?`-prefixed query word, e.g. `protocol=tcp` or
    /// `topics~firewall`.
    pub fn query(mut self, expr: &str) -> Self {
        self.words.push(format!("?{expr}"));
        self
    }

    /// Append a `=.proplist=` attribute restricting which properties the
    /// device returns.
    pub fn proplist(self, props: &[&str]) -> Self {
        let joined = props.join(",");
        self.attribute(".proplist", &joined)
    }

    /// The resource path (first word).
    pub fn path(&self) -> &str {
        &self.words[0]
    }

    /// All words, in send order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Append the wire encoding of this command, terminator included, to
    /// `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        for word in &self.words {
            encode_word(word, out);
        }
        out.push(0);
    }
}
