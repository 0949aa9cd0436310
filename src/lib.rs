//! # routeros-client
//!
//! Async client for the MikroTik RouterOS binary API protocol.
//!
//! RouterOS devices expose a proprietary RPC protocol on TCP port 8728:
//! length-prefixed UTF-8 *words* grouped into *sentences*, each terminated
//! by a zero-length word. This crate logs in with the plaintext scheme,
//! executes commands strictly one at a time per connection, classifies
//! replies (`!re`, `!done`, `!trap`, `!fatal`), and maps them into
//! structured firewall, NAT, connection-tracking, and log records.
//!
//! ## Architecture
//!
//! - **Wire layer** ([`protocol`]): length prefix, word, and sentence codecs
//!   over a rolling receive buffer
//! - **Session layer** ([`session`]): one socket per device visit, login,
//!   sequential command execution with partial-failure handling
//! - **Query layer** ([`query`]): the fixed set of queries a device visit
//!   issues, mapped to caller-facing records
//!
//! ## Example
//!
//! ```ignore
//! use routeros_client::query::{self, Connector};
//! use routeros_client::DeviceTarget;
//!
//! #[tokio::main]
//! async fn main() -> routeros_client::Result<()> {
//!     let target = DeviceTarget::new("192.168.88.1", "admin", "secret");
//!     let snapshot = query::visit_device(&Connector::new(target)).await?;
//!     println!(
//!         "{} filter rules, {} connections",
//!         snapshot.filter_rules.len(),
//!         snapshot.connections.total
//!     );
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod error;
pub mod protocol;
pub mod query;
pub mod reply;
pub mod session;

pub use command::Command;
pub use error::{Result, RouterOsError};
pub use reply::{CommandReply, ReplyRecord};
pub use session::{DeviceTarget, Session, SessionConfig, DEFAULT_API_PORT};
