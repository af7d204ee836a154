//! Codec module - Telnet framing on the raw byte stream.
//!
//! - [`TelnetCodec`] - stateful decoder separating text from control framing
//! - [`encode_window_size`], [`encode_negotiation`], [`escape_data`] - outbound encoding
//!
//! # Design
//!
//! The codec never touches the socket. It returns decoded text and the reply
//! bytes to send, so the session decides when writes happen and the decoder
//! can be tested with plain byte slices.

mod telnet;

pub use telnet::{
    command, encode_negotiation, encode_window_size, escape_data, option, Decoded,
    TelnetCodec, TelnetCommand, TelnetEvent, TelnetOption, WindowSize,
};
