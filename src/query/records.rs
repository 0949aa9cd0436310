//! Caller-facing record types for one device visit.
//!
//! These are plain data carriers handed to the storage/orchestration
//! collaborator; nothing here touches the wire. Field mapping mirrors what
//! the device reports: a missing or empty attribute becomes `None`,
//! `chain`/`action` fall back to `"unknown"`, and counters parse to 0 on
//! absence.

use serde::Serialize;

use crate::reply::ReplyRecord;

use super::logparse::LogFields;

/// Attribute key for the device's internal rule identifier.
const ID_KEY: &str = ".id";

/// One firewall filter rule, ordered by its position in the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirewallRule {
    /// Zero-based position in the device's rule listing.
    pub rule_order: usize,
    /// The device's internal rule id (`.id`).
    pub rule_id: Option<String>,
    pub chain: String,
    pub action: String,
    pub src_address: Option<String>,
    pub dst_address: Option<String>,
    pub protocol: Option<String>,
    pub dst_port: Option<String>,
    pub src_port: Option<String>,
    pub in_interface: Option<String>,
    pub out_interface: Option<String>,
    pub comment: Option<String>,
    pub disabled: bool,
    pub bytes: u64,
    pub packets: u64,
}

impl FirewallRule {
    /// Map one `!re` record into a rule at listing position `order`.
    pub fn from_record(order: usize, record: &ReplyRecord) -> Self {
        Self {
            rule_order: order,
            rule_id: field(record, ID_KEY),
            chain: field_or(record, "chain", "unknown"),
            action: field_or(record, "action", "unknown"),
            src_address: field(record, "src-address"),
            dst_address: field(record, "dst-address"),
            protocol: field(record, "protocol"),
            dst_port: field(record, "dst-port"),
            src_port: field(record, "src-port"),
            in_interface: field(record, "in-interface"),
            out_interface: field(record, "out-interface"),
            comment: field(record, "comment"),
            disabled: record.get("disabled") == Some("true"),
            bytes: counter(record, "bytes"),
            packets: counter(record, "packets"),
        }
    }
}

/// One NAT rule: a filter rule plus translation targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NatRule {
    pub rule_order: usize,
    pub rule_id: Option<String>,
    pub chain: String,
    pub action: String,
    pub src_address: Option<String>,
    pub dst_address: Option<String>,
    pub protocol: Option<String>,
    pub dst_port: Option<String>,
    pub src_port: Option<String>,
    pub to_addresses: Option<String>,
    pub to_ports: Option<String>,
    pub in_interface: Option<String>,
    pub out_interface: Option<String>,
    pub comment: Option<String>,
    pub disabled: bool,
    pub bytes: u64,
    pub packets: u64,
}

impl NatRule {
    /// Map one `!re` record into a NAT rule at listing position `order`.
    pub fn from_record(order: usize, record: &ReplyRecord) -> Self {
        Self {
            rule_order: order,
            rule_id: field(record, ID_KEY),
            chain: field_or(record, "chain", "unknown"),
            action: field_or(record, "action", "unknown"),
            src_address: field(record, "src-address"),
            dst_address: field(record, "dst-address"),
            protocol: field(record, "protocol"),
            dst_port: field(record, "dst-port"),
            src_port: field(record, "src-port"),
            to_addresses: field(record, "to-addresses"),
            to_ports: field(record, "to-ports"),
            in_interface: field(record, "in-interface"),
            out_interface: field(record, "out-interface"),
            comment: field(record, "comment"),
            disabled: record.get("disabled") == Some("true"),
            bytes: counter(record, "bytes"),
            packets: counter(record, "packets"),
        }
    }
}

/// Connection-tracking counters from the count-only queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionStats {
    pub total: u64,
    pub tcp: u64,
    pub udp: u64,
    pub icmp: u64,
}

/// One firewall log line with its best-effort structured fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// The device's log timestamp, verbatim.
    pub time: Option<String>,
    /// The raw log message.
    pub message: String,
    /// Fields extracted from the message; each is independently optional.
    pub fields: LogFields,
}

impl LogEntry {
    /// Map one `!re` record into a log entry, parsing its message.
    pub fn from_record(record: &ReplyRecord) -> Self {
        let message = record.get("message").unwrap_or_default().to_owned();
        let fields = LogFields::parse(&message);
        Self {
            time: field(record, "time"),
            message,
            fields,
        }
    }
}

/// Everything collected for one device visit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    pub filter_rules: Vec<FirewallRule>,
    pub nat_rules: Vec<NatRule>,
    pub connections: ConnectionStats,
    pub logs: Vec<LogEntry>,
}

/// Per-device outcome summary for a scan over many devices.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceReport {
    /// The device's host as given in its target.
    pub device: String,
    pub success: bool,
    pub filter_rules: usize,
    pub nat_rules: usize,
    pub connections: u64,
    /// Short failure message when `success` is false.
    pub error: Option<String>,
}

impl DeviceReport {
    /// Summary of a completed visit.
    pub fn success(device: impl Into<String>, snapshot: &DeviceSnapshot) -> Self {
        Self {
            device: device.into(),
            success: true,
            filter_rules: snapshot.filter_rules.len(),
            nat_rules: snapshot.nat_rules.len(),
            connections: snapshot.connections.total,
            error: None,
        }
    }

    /// Summary of a failed visit.
    pub fn failure(device: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

fn field(record: &ReplyRecord, key: &str) -> Option<String> {
    record
        .get(key)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn field_or(record: &ReplyRecord, key: &str, default: &str) -> String {
    field(record, key).unwrap_or_else(|| default.to_owned())
}

fn counter(record: &ReplyRecord, key: &str) -> u64 {
    record
        .get(key)
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> ReplyRecord {
        let mut record = ReplyRecord::default();
        for (key, value) in pairs {
            record.insert(key, value);
        }
        record
    }

    #[test]
    fn test_firewall_rule_mapping() {
        let rule = FirewallRule::from_record(
            3,
            &record(&[
                (".id", "*A"),
                ("chain", "forward"),
                ("action", "drop"),
                ("src-address", "10.0.0.0/8"),
                ("dst-port", "22"),
                ("protocol", "tcp"),
                ("disabled", "true"),
                ("bytes", "1024"),
                ("packets", "16"),
            ]),
        );

        assert_eq!(rule.rule_order, 3);
        assert_eq!(rule.rule_id.as_deref(), Some("*A"));
        assert_eq!(rule.chain, "forward");
        assert_eq!(rule.action, "drop");
        assert_eq!(rule.src_address.as_deref(), Some("10.0.0.0/8"));
        assert_eq!(rule.dst_address, None);
        assert_eq!(rule.dst_port.as_deref(), Some("22"));
        assert!(rule.disabled);
        assert_eq!(rule.bytes, 1024);
        assert_eq!(rule.packets, 16);
    }

    #[test]
    fn test_missing_and_empty_fields_default() {
        let rule = FirewallRule::from_record(0, &record(&[("src-address", "")]));

        assert_eq!(rule.chain, "unknown");
        assert_eq!(rule.action, "unknown");
        // Empty attribute values are as absent as missing ones.
        assert_eq!(rule.src_address, None);
        assert!(!rule.disabled);
        assert_eq!(rule.bytes, 0);
    }

    #[test]
    fn test_disabled_requires_literal_true() {
        let rule = FirewallRule::from_record(0, &record(&[("disabled", "yes")]));
        assert!(!rule.disabled);
    }

    #[test]
    fn test_nat_rule_translation_fields() {
        let rule = NatRule::from_record(
            0,
            &record(&[
                ("chain", "dstnat"),
                ("action", "dst-nat"),
                ("to-addresses", "192.168.88.10"),
                ("to-ports", "8080"),
            ]),
        );

        assert_eq!(rule.to_addresses.as_deref(), Some("192.168.88.10"));
        assert_eq!(rule.to_ports.as_deref(), Some("8080"));
    }

    #[test]
    fn test_log_entry_parses_message() {
        let entry = LogEntry::from_record(&record(&[
            ("time", "jan/02 10:33:01"),
            (
                "message",
                "input: in=ether1 out=bridge action=drop, proto=tcp, src=10.0.0.99 dst=192.168.88.1 dst-port=2222",
            ),
        ]));

        assert_eq!(entry.time.as_deref(), Some("jan/02 10:33:01"));
        assert_eq!(entry.fields.chain.as_deref(), Some("input:"));
        assert_eq!(entry.fields.action.as_deref(), Some("drop"));
        assert_eq!(entry.fields.src_address.as_deref(), Some("10.0.0.99"));
    }

    #[test]
    fn test_report_summaries() {
        let snapshot = DeviceSnapshot {
            filter_rules: vec![FirewallRule::default(), FirewallRule::default()],
            nat_rules: vec![NatRule::default()],
            connections: ConnectionStats {
                total: 42,
                tcp: 20,
                udp: 15,
                icmp: 7,
            },
            logs: Vec::new(),
        };

        let ok = DeviceReport::success("192.168.88.1", &snapshot);
        assert!(ok.success);
        assert_eq!(ok.filter_rules, 2);
        assert_eq!(ok.nat_rules, 1);
        assert_eq!(ok.connections, 42);
        assert_eq!(ok.error, None);

        let failed = DeviceReport::failure("192.168.88.2", "connection closed");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("connection closed"));
        assert_eq!(failed.filter_rules, 0);
    }

    #[test]
    fn test_records_serialize_to_json() {
        let rule = FirewallRule::from_record(0, &record(&[("chain", "input")]));
        let json = serde_json::to_value(&rule).unwrap();

        assert_eq!(json["chain"], "input");
        assert_eq!(json["rule_order"], 0);
        assert_eq!(json["src_address"], serde_json::Value::Null);
    }
}
