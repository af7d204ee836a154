//! Telnet byte codec.
//!
//! Splits the inbound byte stream into readable text and control framing:
//!
//! ```text
//! IAC <cmd>                       two-byte command (NOP, GA, ...)
//! IAC WILL|WONT|DO|DONT <option>  negotiation
//! IAC SB <option> <payload> IAC SE subnegotiation
//! IAC IAC                         literal 0xFF data byte
//! ```
//!
//! Only `DO NAWS` is answered (with `WILL NAWS` and a fixed window size).
//! Everything else is reported as an event and otherwise ignored.
//!
//! # Example
//!
//! ```
//! use horizons_client::codec::{command, option, TelnetCodec, WindowSize};
//!
//! let mut codec = TelnetCodec::new(WindowSize::default());
//! let decoded = codec.decode(&[command::IAC, command::DO, option::NAWS, b'o', b'k']);
//!
//! assert_eq!(decoded.text, "ok");
//! assert_eq!(&decoded.reply[..3], &[command::IAC, command::WILL, option::NAWS]);
//! ```

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use serde::Deserialize;

/// Command byte values (RFC 854).
pub mod command {
    /// End of subnegotiation parameters.
    pub const SE: u8 = 240;
    /// No operation.
    pub const NOP: u8 = 241;
    /// Data mark (data stream portion of a Synch).
    pub const DM: u8 = 242;
    /// NVT character break.
    pub const BRK: u8 = 243;
    /// Interrupt process.
    pub const IP: u8 = 244;
    /// Abort output.
    pub const AO: u8 = 245;
    /// Are you there.
    pub const AYT: u8 = 246;
    /// Erase character.
    pub const EC: u8 = 247;
    /// Erase line.
    pub const EL: u8 = 248;
    /// Go ahead.
    pub const GA: u8 = 249;
    /// Start of subnegotiation.
    pub const SB: u8 = 250;
    /// Sender wants to enable (or confirms) an option.
    pub const WILL: u8 = 251;
    /// Sender refuses an option.
    pub const WONT: u8 = 252;
    /// Sender asks the receiver to enable an option.
    pub const DO: u8 = 253;
    /// Sender asks the receiver to disable an option.
    pub const DONT: u8 = 254;
    /// Interpret as command.
    pub const IAC: u8 = 255;
}

/// Option identifiers seen during the HORIZONS handshake.
pub mod option {
    /// Echo (RFC 857).
    pub const ECHO: u8 = 1;
    /// Suppress go-ahead (RFC 858).
    pub const SUPPRESS_GO_AHEAD: u8 = 3;
    /// Terminal type (RFC 1091).
    pub const TERMINAL_TYPE: u8 = 24;
    /// Negotiate about window size (RFC 1073).
    pub const NAWS: u8 = 31;
}

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Telnet command following an `IAC` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelnetCommand {
    Se,
    Nop,
    DataMark,
    Break,
    InterruptProcess,
    AbortOutput,
    AreYouThere,
    EraseCharacter,
    EraseLine,
    GoAhead,
    Sb,
    Will,
    Wont,
    Do,
    Dont,
    Iac,
}

impl TelnetCommand {
    /// Map a byte to its command, `None` for bytes below 240.
    pub fn from_byte(byte: u8) -> Option<Self> {
        let cmd = match byte {
            command::SE => Self::Se,
            command::NOP => Self::Nop,
            command::DM => Self::DataMark,
            command::BRK => Self::Break,
            command::IP => Self::InterruptProcess,
            command::AO => Self::AbortOutput,
            command::AYT => Self::AreYouThere,
            command::EC => Self::EraseCharacter,
            command::EL => Self::EraseLine,
            command::GA => Self::GoAhead,
            command::SB => Self::Sb,
            command::WILL => Self::Will,
            command::WONT => Self::Wont,
            command::DO => Self::Do,
            command::DONT => Self::Dont,
            command::IAC => Self::Iac,
            _ => return None,
        };
        Some(cmd)
    }

    /// Wire value of the command.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Se => command::SE,
            Self::Nop => command::NOP,
            Self::DataMark => command::DM,
            Self::Break => command::BRK,
            Self::InterruptProcess => command::IP,
            Self::AbortOutput => command::AO,
            Self::AreYouThere => command::AYT,
            Self::EraseCharacter => command::EC,
            Self::EraseLine => command::EL,
            Self::GoAhead => command::GA,
            Self::Sb => command::SB,
            Self::Will => command::WILL,
            Self::Wont => command::WONT,
            Self::Do => command::DO,
            Self::Dont => command::DONT,
            Self::Iac => command::IAC,
        }
    }

    /// Mnemonic used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Se => "SE",
            Self::Nop => "NOP",
            Self::DataMark => "DM",
            Self::Break => "BRK",
            Self::InterruptProcess => "IP",
            Self::AbortOutput => "AO",
            Self::AreYouThere => "AYT",
            Self::EraseCharacter => "EC",
            Self::EraseLine => "EL",
            Self::GoAhead => "GA",
            Self::Sb => "SB",
            Self::Will => "WILL",
            Self::Wont => "WONT",
            Self::Do => "DO",
            Self::Dont => "DONT",
            Self::Iac => "IAC",
        }
    }

    /// WILL, WONT, DO and DONT take an option byte.
    #[inline]
    pub fn is_negotiation(self) -> bool {
        matches!(self, Self::Will | Self::Wont | Self::Do | Self::Dont)
    }
}

impl fmt::Display for TelnetCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Telnet option identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelnetOption {
    Echo,
    SuppressGoAhead,
    TerminalType,
    WindowSize,
    Other(u8),
}

impl From<u8> for TelnetOption {
    fn from(byte: u8) -> Self {
        match byte {
            option::ECHO => Self::Echo,
            option::SUPPRESS_GO_AHEAD => Self::SuppressGoAhead,
            option::TERMINAL_TYPE => Self::TerminalType,
            option::NAWS => Self::WindowSize,
            other => Self::Other(other),
        }
    }
}

impl TelnetOption {
    /// Wire value of the option.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Echo => option::ECHO,
            Self::SuppressGoAhead => option::SUPPRESS_GO_AHEAD,
            Self::TerminalType => option::TERMINAL_TYPE,
            Self::WindowSize => option::NAWS,
            Self::Other(b) => b,
        }
    }
}

impl fmt::Display for TelnetOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Echo => f.write_str("ECHO"),
            Self::SuppressGoAhead => f.write_str("SUPPRESS-GO-AHEAD"),
            Self::TerminalType => f.write_str("TERMINAL-TYPE"),
            Self::WindowSize => f.write_str("NAWS"),
            Self::Other(b) => write!(f, "option {}", b),
        }
    }
}

/// Window size announced in the NAWS subnegotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowSize {
    pub columns: u16,
    pub rows: u16,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            columns: 80,
            rows: 100,
        }
    }
}

/// Something the codec noticed while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelnetEvent {
    /// A negotiation was answered.
    Negotiated {
        command: TelnetCommand,
        option: TelnetOption,
    },
    /// A negotiation nobody handles; no reply is sent.
    UnhandledOption {
        command: TelnetCommand,
        option: TelnetOption,
    },
    /// A two-byte command (NOP, GA, stray SE, ...).
    Command(TelnetCommand),
    /// A complete subnegotiation whose payload was discarded.
    SubnegotiationIgnored { option: TelnetOption, len: usize },
    /// `IAC <x>` inside a subnegotiation where `x` is neither SE nor IAC.
    MalformedSubnegotiation { option: TelnetOption, byte: u8 },
}

/// Output of one [`TelnetCodec::decode`] call.
#[derive(Debug, Clone, Default)]
pub struct Decoded {
    /// Readable text, with stray control bytes rendered as `[n]`.
    pub text: String,
    /// Bytes to write back to the peer (may be empty).
    pub reply: Bytes,
    /// Control events, in stream order.
    pub events: Vec<TelnetEvent>,
}

/// Decoder state carried across chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Plain text.
    Text,
    /// Saw IAC, waiting for the command byte.
    Command,
    /// Saw IAC WILL/WONT/DO/DONT, waiting for the option byte.
    Negotiation(TelnetCommand),
    /// Saw IAC SB, waiting for the option byte.
    SubnegotiationOption,
    /// Inside the subnegotiation payload.
    Subnegotiation { option: u8, len: usize },
    /// Saw IAC inside the payload.
    SubnegotiationIac { option: u8, len: usize },
}

/// Stateful Telnet decoder.
#[derive(Debug, Clone)]
pub struct TelnetCodec {
    state: State,
    window: WindowSize,
}

impl TelnetCodec {
    /// Create a codec that announces `window` when asked for NAWS.
    pub fn new(window: WindowSize) -> Self {
        Self {
            state: State::Text,
            window,
        }
    }

    /// Decode a chunk of inbound bytes.
    ///
    /// Sequences split across chunks are resumed on the next call.
    pub fn decode(&mut self, data: &[u8]) -> Decoded {
        let mut text = String::with_capacity(data.len());
        let mut reply = BytesMut::new();
        let mut events = Vec::new();

        for &byte in data {
            self.decode_byte(byte, &mut text, &mut reply, &mut events);
        }

        Decoded {
            text,
            reply: reply.freeze(),
            events,
        }
    }

    fn decode_byte(
        &mut self,
        byte: u8,
        text: &mut String,
        reply: &mut BytesMut,
        events: &mut Vec<TelnetEvent>,
    ) {
        self.state = match self.state {
            State::Text => {
                if byte == command::IAC {
                    State::Command
                } else {
                    push_text(text, byte);
                    State::Text
                }
            }

            State::Command => match TelnetCommand::from_byte(byte) {
                // Escaped 0xFF data byte
                Some(TelnetCommand::Iac) => {
                    text.push(char::from(byte));
                    State::Text
                }
                Some(TelnetCommand::Sb) => State::SubnegotiationOption,
                Some(cmd) if cmd.is_negotiation() => State::Negotiation(cmd),
                Some(cmd) => {
                    tracing::debug!("Ignoring command IAC {}", cmd);
                    events.push(TelnetEvent::Command(cmd));
                    State::Text
                }
                None => {
                    tracing::warn!("Invalid command byte after IAC: {}", byte);
                    State::Text
                }
            },

            State::Negotiation(cmd) => {
                let option = TelnetOption::from(byte);
                if cmd == TelnetCommand::Do && option == TelnetOption::WindowSize {
                    tracing::debug!("Negotiate about window size: {:?}", self.window);
                    reply.extend_from_slice(&encode_negotiation(TelnetCommand::Will, option));
                    reply.extend_from_slice(&encode_window_size(self.window));
                    events.push(TelnetEvent::Negotiated {
                        command: cmd,
                        option,
                    });
                } else {
                    tracing::debug!("Unhandled option: IAC {} {}", cmd, option);
                    events.push(TelnetEvent::UnhandledOption {
                        command: cmd,
                        option,
                    });
                }
                State::Text
            }

            State::SubnegotiationOption => State::Subnegotiation {
                option: byte,
                len: 0,
            },

            State::Subnegotiation { option, len } => {
                if byte == command::IAC {
                    State::SubnegotiationIac { option, len }
                } else {
                    State::Subnegotiation {
                        option,
                        len: len + 1,
                    }
                }
            }

            State::SubnegotiationIac { option, len } => match byte {
                command::SE => {
                    let option = TelnetOption::from(option);
                    tracing::debug!("Ignoring subnegotiation for {} ({} bytes)", option, len);
                    events.push(TelnetEvent::SubnegotiationIgnored { option, len });
                    State::Text
                }
                command::IAC => State::Subnegotiation {
                    option,
                    len: len + 1,
                },
                other => {
                    let option = TelnetOption::from(option);
                    tracing::warn!("Wrong subnegotiation for {}: IAC {}", option, other);
                    events.push(TelnetEvent::MalformedSubnegotiation {
                        option,
                        byte: other,
                    });
                    State::Text
                }
            },
        };
    }

    /// True while inside `IAC SB ... IAC SE`.
    pub fn in_subnegotiation(&self) -> bool {
        matches!(
            self.state,
            State::SubnegotiationOption
                | State::Subnegotiation { .. }
                | State::SubnegotiationIac { .. }
        )
    }

    /// True when the last byte seen left a control sequence unfinished.
    pub fn is_mid_sequence(&self) -> bool {
        self.state != State::Text
    }

    /// Window size announced by this codec.
    pub fn window(&self) -> WindowSize {
        self.window
    }

    /// Forget any partially decoded sequence.
    pub fn reset(&mut self) {
        self.state = State::Text;
    }
}

impl Default for TelnetCodec {
    fn default() -> Self {
        Self::new(WindowSize::default())
    }
}

/// Append one text byte, rendering non-printable bytes as `[n]`.
fn push_text(text: &mut String, byte: u8) {
    if byte < 32 && byte != CR && byte != LF {
        text.push('[');
        text.push_str(&byte.to_string());
        text.push(']');
    } else {
        text.push(char::from(byte));
    }
}

/// Encode `IAC <command> <option>`.
#[inline]
pub fn encode_negotiation(command: TelnetCommand, option: TelnetOption) -> [u8; 3] {
    [command::IAC, command.as_byte(), option.as_byte()]
}

/// Encode `IAC SB NAWS <cols> <rows> IAC SE` (16-bit big endian, 0xFF doubled).
pub fn encode_window_size(size: WindowSize) -> Bytes {
    let mut buf = BytesMut::with_capacity(13);
    buf.put_slice(&[command::IAC, command::SB, option::NAWS]);
    for byte in size
        .columns
        .to_be_bytes()
        .into_iter()
        .chain(size.rows.to_be_bytes())
    {
        buf.put_u8(byte);
        if byte == command::IAC {
            buf.put_u8(command::IAC);
        }
    }
    buf.put_slice(&[command::IAC, command::SE]);
    buf.freeze()
}

/// Escape outbound data by doubling every `IAC` byte.
pub fn escape_data(data: &[u8]) -> Bytes {
    if !data.contains(&command::IAC) {
        return Bytes::copy_from_slice(data);
    }
    let mut buf = BytesMut::with_capacity(data.len() + 4);
    for &byte in data {
        buf.put_u8(byte);
        if byte == command::IAC {
            buf.put_u8(command::IAC);
        }
    }
    buf.freeze()
}
