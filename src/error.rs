//! Error types for horizons-client.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::record::Field;

/// Identifies the script step that was in flight when a run failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepContext {
    /// Zero-based step index, `None` before the first step (connect phase).
    pub index: Option<usize>,
    /// Human-readable description of the step.
    pub description: String,
}

impl StepContext {
    /// Context for a failure that happened before any step ran.
    pub fn connect(addr: &str) -> Self {
        Self {
            index: None,
            description: format!("connect to {}", addr),
        }
    }

    /// Context for a numbered script step.
    pub fn step(index: usize, description: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            description: description.into(),
        }
    }
}

impl fmt::Display for StepContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "step {} ({})", i + 1, self.description),
            None => f.write_str(&self.description),
        }
    }
}

/// Main error type for all horizons operations.
#[derive(Debug, Error)]
pub enum HorizonsError {
    /// Name resolution or connection establishment failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Read, write or reset failure on an open connection.
    #[error("transport error during {step}: {source}")]
    Transport {
        step: StepContext,
        #[source]
        source: std::io::Error,
    },

    /// Nothing arrived and no prompt matched within the inactivity window.
    #[error("timed out after {timeout:?} during {step}")]
    Timeout { step: StepContext, timeout: Duration },

    /// The remote closed early or sent framing that never terminated.
    #[error("protocol error during {step}: {reason}")]
    Protocol { step: StepContext, reason: String },

    /// A read was registered while another one was still pending.
    #[error("a read for `{0}` is already pending")]
    ReadPending(String),

    /// A field the caller requires was not found in the response.
    #[error("field `{0}` was not found in the response")]
    MissingField(Field),

    /// Orbital elements outside what the converter handles.
    #[error("invalid orbital elements: {0}")]
    InvalidElements(String),

    /// The body name has no HORIZONS identifier.
    #[error("unknown body `{0}`")]
    UnknownBody(String),

    /// A prompt or rule pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// JSON error (configuration files, record output).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local I/O error outside a session (e.g. reading a config file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HorizonsError {
    /// The step that was in flight, for errors raised during a run.
    pub fn step(&self) -> Option<&StepContext> {
        match self {
            Self::Transport { step, .. } | Self::Timeout { step, .. } | Self::Protocol { step, .. } => {
                Some(step)
            }
            _ => None,
        }
    }

    /// Returns true for inactivity timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias using HorizonsError.
pub type Result<T> = std::result::Result<T, HorizonsError>;
