//! Per-visit query orchestration.
//!
//! Issues the fixed set of queries one device visit needs (firewall filter
//! rules, NAT rules, connection-tracking counters, firewall logs) and maps
//! the raw replies into caller-facing records. Performs no I/O beyond the
//! sessions it opens and knows nothing about how results are persisted.
//!
//! Each command group (rules, counters, logs) opens its own session through
//! the [`Connector`] handed to it; sessions are never shared between groups
//! or reused across visits.

pub mod logparse;
pub mod records;

use tokio::net::TcpStream;

use crate::command::Command;
use crate::error::Result;
use crate::session::{DeviceTarget, Session, SessionConfig};

pub use logparse::LogFields;
pub use records::{
    ConnectionStats, DeviceReport, DeviceSnapshot, FirewallRule, LogEntry, NatRule,
};

/// Resource path listing firewall filter rules.
pub const FILTER_PRINT_PATH: &str = "/ip/firewall/filter/print";
/// Resource path listing NAT rules.
pub const NAT_PRINT_PATH: &str = "/ip/firewall/nat/print";
/// Resource path querying the connection-tracking table.
pub const CONNECTION_PRINT_PATH: &str = "/ip/firewall/connection/print";
/// Resource path listing log entries.
pub const LOG_PRINT_PATH: &str = "/log/print";

/// Properties requested from the filter rule listing.
const FILTER_PROPLIST: &[&str] = &[
    ".id",
    "chain",
    "action",
    "src-address",
    "dst-address",
    "protocol",
    "dst-port",
    "src-port",
    "in-interface",
    "out-interface",
    "comment",
    "disabled",
    "bytes",
    "packets",
];

/// Properties requested from the NAT rule listing.
const NAT_PROPLIST: &[&str] = &[
    ".id",
    "chain",
    "action",
    "src-address",
    "dst-address",
    "protocol",
    "dst-port",
    "src-port",
    "to-addresses",
    "to-ports",
    "in-interface",
    "out-interface",
    "comment",
    "disabled",
    "bytes",
    "packets",
];

/// Properties requested from the log listing.
const LOG_PROPLIST: &[&str] = &["time", "message"];

/// Upper bound on log entries kept per visit.
const MAX_LOG_ENTRIES: usize = 100;

/// Connection factory for one device: opens a fresh, logged-in session per
/// command group.
#[derive(Debug, Clone)]
pub struct Connector {
    target: DeviceTarget,
    config: SessionConfig,
}

impl Connector {
    /// Factory with default session timeouts.
    pub fn new(target: DeviceTarget) -> Self {
        Self::with_config(target, SessionConfig::default())
    }

    /// Factory with explicit session timeouts.
    pub fn with_config(target: DeviceTarget, config: SessionConfig) -> Self {
        Self { target, config }
    }

    /// The device this factory connects to.
    pub fn target(&self) -> &DeviceTarget {
        &self.target
    }

    /// Open a fresh, authenticated session.
    pub async fn open(&self) -> Result<Session<TcpStream>> {
        Session::open(&self.target, &self.config).await
    }
}

/// Fetch the filter and NAT rule tables over one session.
pub async fn fetch_firewall_tables(
    conn: &Connector,
) -> Result<(Vec<FirewallRule>, Vec<NatRule>)> {
    let commands = [
        Command::new(FILTER_PRINT_PATH).proplist(FILTER_PROPLIST),
        Command::new(NAT_PRINT_PATH).proplist(NAT_PROPLIST),
    ];
    let replies = conn.open().await?.execute(&commands).await?;
    let mut replies = replies.into_iter();

    let filter_rules = replies
        .next()
        .unwrap_or_default()
        .rows
        .iter()
        .enumerate()
        .map(|(order, record)| FirewallRule::from_record(order, record))
        .collect();

    let nat_rules = replies
        .next()
        .unwrap_or_default()
        .rows
        .iter()
        .enumerate()
        .map(|(order, record)| NatRule::from_record(order, record))
        .collect();

    Ok((filter_rules, nat_rules))
}

/// Fetch connection-tracking counters over one session: the total, then one
/// count per protocol filter. Each count-only reply carries its scalar on
/// the `!done` sentence as `=ret=`.
pub async fn fetch_connection_stats(conn: &Connector) -> Result<ConnectionStats> {
    let commands = [
        count_command(None),
        count_command(Some("tcp")),
        count_command(Some("udp")),
        count_command(Some("icmp")),
    ];
    let replies = conn.open().await?.execute(&commands).await?;
    let mut scalars = replies
        .into_iter()
        .map(|reply| reply.scalar_ret().unwrap_or(0));

    Ok(ConnectionStats {
        total: scalars.next().unwrap_or(0),
        tcp: scalars.next().unwrap_or(0),
        udp: scalars.next().unwrap_or(0),
        icmp: scalars.next().unwrap_or(0),
    })
}

/// Fetch firewall-topic log entries over one session, capped at
/// [`MAX_LOG_ENTRIES`].
pub async fn fetch_firewall_logs(conn: &Connector) -> Result<Vec<LogEntry>> {
    let command = Command::new(LOG_PRINT_PATH)
        .query("topics~firewall")
        .proplist(LOG_PROPLIST);
    let replies = conn
        .open()
        .await?
        .execute(std::slice::from_ref(&command))
        .await?;

    Ok(replies
        .into_iter()
        .next()
        .unwrap_or_default()
        .rows
        .iter()
        .take(MAX_LOG_ENTRIES)
        .map(LogEntry::from_record)
        .collect())
}

/// Run the full visit for one device: rules, counters, logs.
///
/// The rules batch decides the visit's fate; counter and log batches degrade
/// to zeros/empty on failure, since a device whose rule tables were read is
/// still worth reporting.
pub async fn visit_device(conn: &Connector) -> Result<DeviceSnapshot> {
    let (filter_rules, nat_rules) = fetch_firewall_tables(conn).await?;

    let connections = match fetch_connection_stats(conn).await {
        Ok(stats) => stats,
        Err(error) => {
            tracing::warn!(host = %conn.target().host, %error, "connection counters unavailable");
            ConnectionStats::default()
        }
    };

    let logs = match fetch_firewall_logs(conn).await {
        Ok(entries) => entries,
        Err(error) => {
            tracing::warn!(host = %conn.target().host, %error, "log fetch failed");
            Vec::new()
        }
    };

    Ok(DeviceSnapshot {
        filter_rules,
        nat_rules,
        connections,
        logs,
    })
}

/// Visit every target in order, producing one report per device. A failed
/// device is reported and never aborts the remaining visits.
pub async fn visit_devices(
    targets: &[DeviceTarget],
    config: &SessionConfig,
) -> Vec<DeviceReport> {
    let mut reports = Vec::with_capacity(targets.len());

    for target in targets {
        let conn = Connector::with_config(target.clone(), config.clone());
        match visit_device(&conn).await {
            Ok(snapshot) => reports.push(DeviceReport::success(&target.host, &snapshot)),
            Err(error) => {
                tracing::error!(host = %target.host, %error, "device visit failed");
                reports.push(DeviceReport::failure(&target.host, error.to_string()));
            }
        }
    }

    reports
}

fn count_command(protocol: Option<&str>) -> Command {
    let command = Command::new(CONNECTION_PRINT_PATH).attribute("count-only", "");
    match protocol {
        Some(protocol) => command.query(&format!("protocol={protocol}")),
        None => command,
    }
}
