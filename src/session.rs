//! Session configuration and the script driver.
//!
//! The [`SessionBuilder`] provides a fluent API for configuring a session.
//! A [`Session`] runs one [`Script`] per connection:
//! 1. Open the transport (or take a caller-supplied stream)
//! 2. Answer telnet negotiation inline while reading
//! 3. Walk the steps, sending lines and waiting for prompts
//! 4. Extract fields from the text captured before each prompt
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use horizons_client::{Query, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::builder()
//!         .timeout(Duration::from_secs(20))
//!         .build()?;
//!
//!     let record = session.query(&Query::new("earth")?).await?;
//!     println!("{}", serde_json::to_string_pretty(&record)?);
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadHalf, WriteHalf};

use crate::codec::{TelnetCodec, WindowSize};
use crate::error::{HorizonsError, Result, StepContext};
use crate::extract::Extractor;
use crate::protocol::{PatternBuffer, Script, Step, DEFAULT_MAX_BUFFER};
use crate::query::Query;
use crate::record::{Field, RecordBuilder, ResultRecord};
use crate::transport::{ConnectionState, TcpTransport};
use crate::writer::SessionWriter;

/// Default HORIZONS host.
pub const DEFAULT_HOST: &str = "horizons.jpl.nasa.gov";

/// Default HORIZONS telnet port.
pub const DEFAULT_PORT: u16 = 6775;

/// Default inactivity timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Size of a single socket read.
const READ_CHUNK_SIZE: usize = 4096;

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

/// Settings for a session.
///
/// Missing JSON keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Host to connect to.
    pub host: String,
    /// Port to connect to.
    pub port: u16,
    /// Inactivity timeout, `timeout_ms` in JSON.
    #[serde(rename = "timeout_ms", deserialize_with = "millis")]
    pub timeout: Duration,
    /// Window size announced over NAWS.
    pub window: WindowSize,
    /// Pattern buffer size that triggers a warning.
    pub max_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            window: WindowSize::default(),
            max_buffer: DEFAULT_MAX_BUFFER,
        }
    }
}

impl SessionConfig {
    /// Parse a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check values that would make every run fail.
    ///
    /// # Errors
    ///
    /// Returns [`HorizonsError::Config`] naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(HorizonsError::Config("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(HorizonsError::Config("port must not be 0".into()));
        }
        if self.timeout.is_zero() {
            return Err(HorizonsError::Config("timeout must be positive".into()));
        }
        if self.max_buffer == 0 {
            return Err(HorizonsError::Config("max_buffer must be positive".into()));
        }
        Ok(())
    }
}

/// Builder for configuring and creating a [`Session`].
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    config: SessionConfig,
}

impl SessionBuilder {
    /// Create a new session builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the host.
    ///
    /// Default: `horizons.jpl.nasa.gov`
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the port.
    ///
    /// Default: 6775
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the inactivity timeout.
    ///
    /// Every wait for inbound bytes is bounded by it, as is the connect.
    /// Default: 10 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the window size announced over NAWS.
    ///
    /// Default: 80 x 100
    pub fn window_size(mut self, columns: u16, rows: u16) -> Self {
        self.config.window = WindowSize { columns, rows };
        self
    }

    /// Set the pattern buffer warning threshold.
    ///
    /// Default: 1 MiB
    pub fn max_buffer(mut self, bytes: usize) -> Self {
        self.config.max_buffer = bytes;
        self
    }

    /// Validate the configuration and build the session.
    pub fn build(self) -> Result<Session> {
        self.config.validate()?;
        Ok(Session {
            config: self.config,
            extractor: Extractor::horizons(),
        })
    }
}

/// A failed run together with whatever was extracted before the failure.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PartialRun {
    /// Why the run failed.
    #[source]
    pub error: HorizonsError,
    /// Fields extracted before the failure.
    pub partial: ResultRecord,
}

impl From<PartialRun> for HorizonsError {
    fn from(run: PartialRun) -> Self {
        run.error
    }
}

/// Progress of one run. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Negotiating,
    Step(usize),
    Completed,
    Failed,
}

impl RunState {
    fn can_advance_to(self, next: RunState) -> bool {
        match (self, next) {
            (Self::Idle, Self::Negotiating) => true,
            (Self::Negotiating, Self::Step(0)) => true,
            (Self::Step(i), Self::Step(j)) => j == i + 1,
            (Self::Negotiating | Self::Step(_), Self::Completed | Self::Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Negotiating => f.write_str("negotiating"),
            Self::Step(i) => write!(f, "step {}", i + 1),
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Runs scripts against the configured endpoint.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    extractor: &'static Extractor,
}

impl Session {
    /// Create a new session builder.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Session settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolve and run a query against the configured endpoint.
    pub async fn query(&self, query: &Query) -> Result<ResultRecord> {
        self.connect_and_run(&query.script()).await
    }

    /// Open a TCP connection and run `script` over it.
    ///
    /// The connection is closed when the run ends, whatever the outcome.
    pub async fn connect_and_run(&self, script: &Script) -> Result<ResultRecord> {
        let transport =
            TcpTransport::connect(&self.config.host, self.config.port, self.config.timeout).await?;
        self.run(script, transport).await
    }

    /// Run `script` over an already-open stream.
    pub async fn run<S>(&self, script: &Script, stream: S) -> Result<ResultRecord>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.run_keeping_partial(script, stream)
            .await
            .map_err(HorizonsError::from)
    }

    /// Like [`run`](Self::run), but a failure keeps the fields extracted so far.
    pub async fn run_keeping_partial<S>(
        &self,
        script: &Script,
        stream: S,
    ) -> std::result::Result<ResultRecord, PartialRun>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut record = RecordBuilder::new(script.target());
        let mut conn = Connection::new(stream, &self.config);

        match self.drive(script, &mut conn, &mut record).await {
            Ok(()) => {
                conn.close().await;
                let record = record.finish();
                tracing::debug!(
                    "Run for {} completed with {} fields",
                    record.target(),
                    record.len()
                );
                Ok(record)
            }
            Err(error) => {
                conn.abort();
                tracing::warn!("Run for {} failed: {}", script.target(), error);
                Err(PartialRun {
                    error,
                    partial: record.finish(),
                })
            }
        }
    }

    async fn drive<S>(
        &self,
        script: &Script,
        conn: &mut Connection<S>,
        record: &mut RecordBuilder,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut state = RunState::Idle;
        advance(&mut state, RunState::Negotiating);

        let result = self.walk(script, conn, record, &mut state).await;
        match &result {
            Ok(()) => advance(&mut state, RunState::Completed),
            Err(_) => advance(&mut state, RunState::Failed),
        }
        result
    }

    async fn walk<S>(
        &self,
        script: &Script,
        conn: &mut Connection<S>,
        record: &mut RecordBuilder,
        state: &mut RunState,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let terminal = script.terminal_index();

        for (index, step) in script.steps().iter().enumerate() {
            advance(state, RunState::Step(index));
            let context = StepContext::step(index, step.describe());
            tracing::debug!("{} of {}: {}", state, script.len(), context.description);

            match step {
                Step::Send(line) => conn.send_line(line, &context).await?,
                Step::Expect { prompt, capture } => match conn.expect(prompt, &context).await? {
                    Received::Matched(text) => self.capture(capture, &text, record),
                    Received::Closed(text) if Some(index) == terminal => {
                        tracing::debug!("Remote closed at the final prompt");
                        self.capture(capture, &text, record);
                        return Ok(());
                    }
                    Received::Closed(_) => {
                        return Err(HorizonsError::Protocol {
                            step: context,
                            reason: "connection closed before the final prompt".into(),
                        });
                    }
                },
            }
        }
        Ok(())
    }

    fn capture(&self, fields: &[Field], text: &str, record: &mut RecordBuilder) {
        if fields.is_empty() {
            return;
        }
        for field in self.extractor.extract_into(fields, text, record) {
            tracing::debug!("No rule matched {}", field);
        }
    }
}

fn advance(state: &mut RunState, next: RunState) {
    debug_assert!(
        state.can_advance_to(next),
        "run state moved backwards: {} -> {}",
        state,
        next
    );
    tracing::trace!("Run {} -> {}", state, next);
    *state = next;
}

/// A broken pipe means the remote already hung up, which is a close like any other.
fn write_failed(step: &StepContext, source: io::Error) -> HorizonsError {
    if source.kind() == io::ErrorKind::BrokenPipe {
        tracing::debug!("Write failed, remote already closed: {}", source);
        HorizonsError::Protocol {
            step: step.clone(),
            reason: "connection closed before the final prompt".into(),
        }
    } else {
        HorizonsError::Transport {
            step: step.clone(),
            source,
        }
    }
}

/// What an expect step got back.
enum Received {
    /// Text up to and including the prompt.
    Matched(String),
    /// The remote closed cleanly; whatever was buffered.
    Closed(String),
}

/// One open connection: codec, buffer and the two stream halves.
struct Connection<S> {
    reader: ReadHalf<S>,
    writer: SessionWriter<WriteHalf<S>>,
    codec: TelnetCodec,
    buffer: PatternBuffer,
    state: ConnectionState,
    timeout: Duration,
    chunk: Vec<u8>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn new(stream: S, config: &SessionConfig) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        let mut conn = Self {
            reader,
            writer: SessionWriter::new(writer),
            codec: TelnetCodec::new(config.window),
            buffer: PatternBuffer::with_max_len(config.max_buffer),
            state: ConnectionState::Connecting,
            timeout: config.timeout,
            chunk: vec![0; READ_CHUNK_SIZE],
        };
        conn.set_state(ConnectionState::Negotiating);
        conn
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state != next {
            tracing::debug!("Connection {} -> {}", self.state, next);
            self.state = next;
        }
    }

    async fn send_line(&mut self, line: &str, step: &StepContext) -> Result<()> {
        self.writer
            .send_line(line)
            .await
            .map_err(|source| write_failed(step, source))
    }

    /// Wait until `prompt` matches the buffered text or the remote closes.
    async fn expect(&mut self, prompt: &Regex, step: &StepContext) -> Result<Received> {
        if let Some(text) = self.buffer.request_until(prompt.clone())? {
            return Ok(Received::Matched(text));
        }

        loop {
            let read = tokio::time::timeout(self.timeout, self.reader.read(&mut self.chunk)).await;
            let n = match read {
                Ok(Ok(0)) => return self.remote_closed(step),
                Ok(Ok(n)) => n,
                Ok(Err(source)) => {
                    return Err(HorizonsError::Transport {
                        step: step.clone(),
                        source,
                    })
                }
                Err(_) => {
                    self.buffer.cancel();
                    return Err(HorizonsError::Timeout {
                        step: step.clone(),
                        timeout: self.timeout,
                    });
                }
            };

            let decoded = self.codec.decode(&self.chunk[..n]);

            if !decoded.reply.is_empty() {
                self.writer
                    .send_raw(&decoded.reply)
                    .await
                    .map_err(|source| write_failed(step, source))?;
            }

            if decoded.text.is_empty() {
                continue;
            }
            self.set_state(ConnectionState::Open);
            if let Some(text) = self.buffer.append(&decoded.text) {
                return Ok(Received::Matched(text));
            }
        }
    }

    fn remote_closed(&mut self, step: &StepContext) -> Result<Received> {
        if self.codec.in_subnegotiation() {
            return Err(HorizonsError::Protocol {
                step: step.clone(),
                reason: "connection closed inside a subnegotiation".into(),
            });
        }
        if self.codec.is_mid_sequence() {
            tracing::warn!("Connection closed in the middle of a telnet command");
        }
        self.set_state(ConnectionState::Closed);
        Ok(Received::Closed(self.buffer.take_remaining()))
    }

    /// Shut down our side after a successful run.
    async fn close(mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.set_state(ConnectionState::Closing);
        tracing::debug!("Closing after {} bytes written", self.writer.bytes_written());
        if let Err(e) = self.writer.shutdown().await {
            tracing::debug!("Shutdown failed: {}", e);
        }
        self.set_state(ConnectionState::Closed);
    }

    /// Drop the connection without a graceful shutdown.
    fn abort(mut self) {
        self.set_state(ConnectionState::Failed);
        let discarded = self.buffer.len();
        if discarded > 0 {
            tracing::debug!("Discarding {} buffered bytes", discarded);
        }
    }
}
