//! Linear session scripts.
//!
//! A script is a flat list of steps: send a line, or wait for a prompt and
//! optionally extract fields from the text that preceded it. Branching is
//! done by building a different script before the run starts.
//!
//! # Example
//!
//! ```
//! use horizons_client::protocol::{prompt, Script, Step};
//! use horizons_client::record::Field;
//!
//! let script = Script::new("earth")
//!     .expect(prompt::main())
//!     .send("399")
//!     .expect_capture(prompt::object_page(), &[Field::Radius, Field::Mass]);
//!
//! assert_eq!(script.len(), 3);
//! assert_eq!(script.terminal_index(), Some(2));
//! assert!(matches!(script.steps()[1], Step::Send(_)));
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::record::Field;

/// Prompts printed by HORIZONS.
pub mod prompt {
    use super::*;

    static MAIN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new("Horizons> ").expect("Invalid main prompt regex"));
    static OBJECT_PAGE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new("<cr>: ").expect("Invalid object page prompt regex"));
    static FIELD: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\] : ").expect("Invalid field prompt regex"));
    static CASE_END: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\? : ").expect("Invalid case end prompt regex"));

    /// `Horizons> ` - the top-level command prompt.
    pub fn main() -> &'static Regex {
        &MAIN
    }

    /// `<cr>: ` - end of the physical data page.
    pub fn object_page() -> &'static Regex {
        &OBJECT_PAGE
    }

    /// `] : ` - end of every bracketed option prompt.
    pub fn field() -> &'static Regex {
        &FIELD
    }

    /// `? : ` - the "[A]gain, [N]ew-case ..." prompt after a table.
    pub fn case_end() -> &'static Regex {
        &CASE_END
    }
}

/// One script step.
#[derive(Debug, Clone)]
pub enum Step {
    /// Write a line; `\n` is appended when sent.
    Send(String),
    /// Wait for `prompt`, then extract `capture` from the text before it.
    Expect { prompt: Regex, capture: Vec<Field> },
}

impl Step {
    /// Short description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            Step::Send(text) => format!("send `{}`", text),
            Step::Expect { prompt, capture } if capture.is_empty() => {
                format!("expect `{}`", prompt.as_str())
            }
            Step::Expect { prompt, capture } => {
                let names: Vec<_> = capture.iter().map(|f| f.name()).collect();
                format!("expect `{}` capturing {}", prompt.as_str(), names.join(", "))
            }
        }
    }

    /// True for steps that wait on the remote.
    pub fn is_expect(&self) -> bool {
        matches!(self, Step::Expect { .. })
    }
}

/// Immutable ordered list of steps for one target.
#[derive(Debug, Clone)]
pub struct Script {
    target: String,
    steps: Vec<Step>,
}

impl Script {
    /// Start an empty script for `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            steps: Vec::new(),
        }
    }

    /// Append a send step.
    pub fn send(mut self, line: impl Into<String>) -> Self {
        self.steps.push(Step::Send(line.into()));
        self
    }

    /// Append an expect step without extraction.
    pub fn expect(self, prompt: &Regex) -> Self {
        self.expect_capture(prompt, &[])
    }

    /// Append an expect step that extracts `fields`.
    pub fn expect_capture(mut self, prompt: &Regex, fields: &[Field]) -> Self {
        self.steps.push(Step::Expect {
            prompt: prompt.clone(),
            capture: fields.to_vec(),
        });
        self
    }

    /// Append an expect step from a pattern string.
    ///
    /// # Errors
    ///
    /// Returns [`HorizonsError::Pattern`](crate::HorizonsError::Pattern) if the
    /// pattern does not compile.
    pub fn expect_pattern(self, pattern: &str, fields: &[Field]) -> Result<Self> {
        let prompt = Regex::new(pattern)?;
        Ok(self.expect_capture(&prompt, fields))
    }

    /// Name of the queried body.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if the script has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the final expect step; a clean remote close there is success.
    pub fn terminal_index(&self) -> Option<usize> {
        self.steps.iter().rposition(Step::is_expect)
    }
}
