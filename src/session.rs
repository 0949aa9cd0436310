//! Device session: connect, log in, execute a command batch.
//!
//! A [`Session`] owns one socket for one device visit. Its lifecycle is
//! linear: connect, authenticate, execute the queued commands one at a time,
//! send `/quit`, release the socket. The client never sends a second command
//! before the previous command's terminating sentence (`!done` or `!trap`)
//! has been read; the protocol's request tags for pipelined dispatch are
//! deliberately unused.
//!
//! Reply classification while executing:
//!
//! - `!re` rows accumulate into the command's result list
//! - `!done` ends the command; its attributes carry count-only scalars
//! - `!trap` ends the command *without* failing the batch
//! - `!fatal`, EOF, and timeouts fail the whole batch
//!
//! The socket is an owned value, so every exit path (errors included)
//! releases it when the session is dropped.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::command::Command;
use crate::error::{Result, RouterOsError};
use crate::protocol::{Sentence, SentenceBuffer};
use crate::reply::{CommandReply, ReplyRecord, RET_KEY};

/// TCP port the RouterOS API listens on by default.
pub const DEFAULT_API_PORT: u16 = 8728;

/// Default timeout for opening the TCP connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for a single socket read while awaiting a reply.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Socket read chunk size.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Address and credentials for one device, as supplied by the inventory
/// collaborator. Held only for the lifetime of the sessions it opens.
#[derive(Debug, Clone)]
pub struct DeviceTarget {
    /// Host name or IP address.
    pub host: String,
    /// API port, usually [`DEFAULT_API_PORT`].
    pub port: u16,
    /// Login user.
    pub username: String,
    /// Login password, sent with the plaintext scheme.
    pub password: String,
}

impl DeviceTarget {
    /// Target on the default API port.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_API_PORT,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Override the API port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Timeouts applied to a session's transport operations.
///
/// A timed-out connect or read is indistinguishable from a closed
/// connection and is reported as one.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Timeout for opening the TCP connection.
    pub connect_timeout: Duration,
    /// Timeout for each socket read while awaiting a reply.
    pub read_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// An authenticated connection to one device.
///
/// Generic over the transport so tests can drive it with an in-memory
/// duplex stream; production code uses [`Session::open`] and gets a
/// `Session<TcpStream>`.
#[derive(Debug)]
pub struct Session<S = TcpStream> {
    stream: S,
    buffer: SentenceBuffer,
    read_timeout: Duration,
}

impl Session<TcpStream> {
    /// Connect to the device and log in with the plaintext scheme.
    ///
    /// # Errors
    ///
    /// - `Io` / `ConnectionClosed` if the TCP connect fails or times out
    /// - `Authentication` if the device answers the login with `!trap`
    /// - `UnsupportedAuthScheme` if the device asks for the legacy
    ///   challenge-response login
    pub async fn open(target: &DeviceTarget, config: &SessionConfig) -> Result<Self> {
        tracing::debug!(host = %target.host, port = target.port, "connecting");

        let connect = TcpStream::connect((target.host.as_str(), target.port));
        let stream = match timeout(config.connect_timeout, connect).await {
            Ok(connected) => connected?,
            Err(_) => return Err(RouterOsError::ConnectionClosed),
        };

        let mut session = Session::from_stream(stream, config);
        session.login(&target.username, &target.password).await?;
        Ok(session)
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    /// Wrap an already-established transport. The caller still needs to
    /// [`login`](Session::login).
    pub fn from_stream(stream: S, config: &SessionConfig) -> Self {
        Self {
            stream,
            buffer: SentenceBuffer::new(),
            read_timeout: config.read_timeout,
        }
    }

    /// Log in with the plaintext scheme (RouterOS 6.43 and later).
    ///
    /// A `!trap` reply is fatal: no commands are attempted. A `!done` reply
    /// carrying `=ret=` is the legacy challenge-response handshake, which is
    /// rejected outright rather than half-spoken.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let login = Command::new("/login")
            .attribute("name", username)
            .attribute("password", password);
        self.send_command(&login).await?;

        let reply = self.read_reply_sentence().await?;
        let record = ReplyRecord::from_sentence(&reply);

        if reply.is_trap() {
            let message = record
                .get("message")
                .map(str::to_owned)
                .unwrap_or_else(|| reply.words().join(" "));
            return Err(RouterOsError::Authentication(message));
        }
        if reply.is_fatal() {
            return Err(fatal_error(&reply));
        }
        if record.get(RET_KEY).is_some() {
            return Err(RouterOsError::UnsupportedAuthScheme);
        }

        tracing::debug!("login accepted");
        Ok(())
    }

    /// Execute the commands in order, returning one [`CommandReply`] per
    /// command, in submission order.
    ///
    /// A per-command `!trap` is recorded in that command's reply and the
    /// batch continues; transport and framing failures abort the batch.
    /// Consumes the session: after the last command a `/quit` farewell is
    /// sent without awaiting a reply, and the socket is released.
    pub async fn execute(mut self, commands: &[Command]) -> Result<Vec<CommandReply>> {
        let mut replies = Vec::with_capacity(commands.len());

        for command in commands {
            self.send_command(command).await?;
            replies.push(self.collect_reply(command).await?);
        }

        // Farewell. The reply is never awaited, and a write failure cannot
        // invalidate the already-collected results.
        let _ = self.send_command(&Command::new("/quit")).await;

        Ok(replies)
    }

    /// Read sentences for one command until `!done` or `!trap`.
    async fn collect_reply(&mut self, command: &Command) -> Result<CommandReply> {
        let mut reply = CommandReply::default();

        loop {
            let sentence = self.read_reply_sentence().await?;
            let Some(tag) = sentence.first_word() else {
                continue;
            };

            if sentence.is_re() {
                reply.rows.push(ReplyRecord::from_sentence(&sentence));
            } else if sentence.is_done() {
                reply.done = ReplyRecord::from_sentence(&sentence);
                return Ok(reply);
            } else if sentence.is_trap() {
                let record = ReplyRecord::from_sentence(&sentence);
                let message = record
                    .get("message")
                    .map(str::to_owned)
                    .unwrap_or_else(|| sentence.words().join(" "));
                tracing::warn!(command = command.path(), %message, "command trapped");
                reply.trap = Some(message);
                return Ok(reply);
            } else if sentence.is_fatal() {
                return Err(fatal_error(&sentence));
            } else {
                tracing::debug!(tag, "ignoring reply sentence with unknown tag");
            }
        }
    }

    /// Encode and send one command sentence.
    async fn send_command(&mut self, command: &Command) -> Result<()> {
        let mut wire = Vec::new();
        command.encode(&mut wire);
        self.stream.write_all(&wire).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Next non-empty sentence. Empty sentences are keep-alive/spacing and
    /// are skipped here so reply classification never sees them.
    async fn read_reply_sentence(&mut self) -> Result<Sentence> {
        loop {
            let sentence = self.read_sentence().await?;
            if !sentence.is_empty() {
                return Ok(sentence);
            }
        }
    }

    /// Read socket data into the rolling buffer until one sentence is
    /// complete. Suspends until bytes arrive, the read times out, or the
    /// peer closes the stream.
    async fn read_sentence(&mut self) -> Result<Sentence> {
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        loop {
            if let Some(sentence) = self.buffer.try_next()? {
                return Ok(sentence);
            }

            let n = match timeout(self.read_timeout, self.stream.read(&mut chunk)).await {
                Ok(read) => read?,
                Err(_) => return Err(RouterOsError::ConnectionClosed),
            };

            if n == 0 {
                if self.buffer.is_empty() {
                    return Err(RouterOsError::ConnectionClosed);
                }
                return Err(RouterOsError::Protocol(
                    "stream ended inside a sentence".to_string(),
                ));
            }

            self.buffer.extend(&chunk[..n]);
        }
    }
}

/// Map a `!fatal` sentence to the batch-level error carrying the peer's
/// reason, which arrives as plain words rather than attributes.
fn fatal_error(sentence: &Sentence) -> RouterOsError {
    let mut reason = sentence.words()[1..].join(" ");
    if reason.is_empty() {
        reason = "no reason given".to_string();
    }
    RouterOsError::Protocol(format!("fatal reply from device: {reason}"))
}
