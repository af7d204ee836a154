//! Transport module - TCP connection to the telnet service.
//!
//! Sessions run over any `AsyncRead + AsyncWrite` stream; [`TcpTransport`]
//! is the one used against the live service.

mod tcp;

pub use tcp::{ConnectionState, TcpTransport};
