//! Best-effort field extraction from firewall log lines.
//!
//! Firewall log messages are free text, e.g.
//! `input: in=ether1 action=drop, proto=tcp, src=10.0.0.99 dst-port=22`.
//! Each field is extracted by its own pattern, independently of the others:
//! a pattern that does not match leaves that field unset and never aborts
//! processing of the line.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static SRC_AFTER_MAC: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)src-mac [^ ]+ src ([^ ]+)"));
static SRC: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)src[= ]([0-9.]+)"));
static DST: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)dst[= ]([0-9.]+)"));
static PROTOCOL: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)proto[= ]([^ ,]+)"));
static DST_PORT: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)dst-port[= ]([0-9]+)"));
static CHAIN: LazyLock<Regex> = LazyLock::new(|| pattern(r"^([^ ]+)"));
static ACTION: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)action[= ]([^ ,]+)"));
static IN_INTERFACE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)in[= ]([^ ,]+)"));
static OUT_INTERFACE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)out[= ]([^ ,]+)"));

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("hand-written pattern compiles")
}

fn capture(regex: &Regex, message: &str) -> Option<String> {
    regex
        .captures(message)
        .and_then(|captures| captures.get(1))
        .map(|found| found.as_str().to_owned())
}

/// Structured fields pulled out of one log message. Every field is optional;
/// whatever the patterns cannot find stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogFields {
    pub chain: Option<String>,
    pub action: Option<String>,
    pub src_address: Option<String>,
    pub dst_address: Option<String>,
    pub protocol: Option<String>,
    pub dst_port: Option<String>,
    pub in_interface: Option<String>,
    pub out_interface: Option<String>,
}

impl LogFields {
    /// Run every extraction over `message`.
    ///
    /// The source address has two candidate shapes: the form following a
    /// `src-mac` pair, then a plain `src=`/`src ` address as fallback.
    pub fn parse(message: &str) -> Self {
        Self {
            chain: capture(&CHAIN, message),
            action: capture(&ACTION, message),
            src_address: capture(&SRC_AFTER_MAC, message)
                .or_else(|| capture(&SRC, message)),
            dst_address: capture(&DST, message),
            protocol: capture(&PROTOCOL, message),
            dst_port: capture(&DST_PORT, message),
            in_interface: capture(&IN_INTERFACE, message),
            out_interface: capture(&OUT_INTERFACE, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_structured_line() {
        let fields = LogFields::parse(
            "input: in=ether1 out=bridge action=drop, proto=tcp, src=10.0.0.99 dst=192.168.88.1 dst-port=2222",
        );

        assert_eq!(fields.chain.as_deref(), Some("input:"));
        assert_eq!(fields.action.as_deref(), Some("drop"));
        assert_eq!(fields.src_address.as_deref(), Some("10.0.0.99"));
        assert_eq!(fields.dst_address.as_deref(), Some("192.168.88.1"));
        assert_eq!(fields.protocol.as_deref(), Some("tcp"));
        assert_eq!(fields.dst_port.as_deref(), Some("2222"));
        assert_eq!(fields.in_interface.as_deref(), Some("ether1"));
        assert_eq!(fields.out_interface.as_deref(), Some("bridge"));
    }

    #[test]
    fn test_src_after_mac_takes_precedence() {
        let fields = LogFields::parse(
            "forward: src-mac 00:0c:29:12:34:56 src 192.168.88.10 proto UDP, len 78",
        );

        assert_eq!(fields.src_address.as_deref(), Some("192.168.88.10"));
        assert_eq!(fields.protocol.as_deref(), Some("UDP"));
        assert_eq!(fields.chain.as_deref(), Some("forward:"));
        // `in:`/`out:` shapes are not the `in=`/`in ` the patterns expect.
        assert_eq!(fields.in_interface, None);
        assert_eq!(fields.out_interface, None);
    }

    #[test]
    fn test_unstructured_line_extracts_only_chain() {
        let fields = LogFields::parse("dhcp lease granted");

        assert_eq!(fields.chain.as_deref(), Some("dhcp"));
        assert_eq!(fields.action, None);
        assert_eq!(fields.src_address, None);
        assert_eq!(fields.dst_address, None);
        assert_eq!(fields.protocol, None);
        assert_eq!(fields.dst_port, None);
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(LogFields::parse(""), LogFields::default());
    }

    #[test]
    fn test_each_extraction_is_independent() {
        // A destination port with no destination address: one matches, the
        // other stays unset, nothing aborts.
        let fields = LogFields::parse("forward: dst-port=443 action=accept");

        assert_eq!(fields.dst_port.as_deref(), Some("443"));
        assert_eq!(fields.action.as_deref(), Some("accept"));
        assert_eq!(fields.src_address, None);
    }
}
