//! Protocol module - prompt matching and session scripts.
//!
//! - [`PatternBuffer`] accumulates decoded text until a prompt matches
//! - [`Script`] is the ordered list of send/expect steps for one query
//! - [`prompt`] holds the prompts HORIZONS prints

mod pattern_buffer;
mod script;

pub use pattern_buffer::{PatternBuffer, DEFAULT_MAX_BUFFER};
pub use script::{prompt, Script, Step};
