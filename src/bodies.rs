//! Body name to HORIZONS identifier table.

use crate::error::{HorizonsError, Result};

/// HORIZONS identifier of the Sun, also the default coordinate centre.
pub const SUN_ID: u32 = 10;

const BODIES: &[(&str, u32)] = &[
    ("sun", SUN_ID),
    ("mercury", 199),
    ("venus", 299),
    ("earth", 399),
    ("moon", 301),
    ("mars", 499),
    ("jupiter", 599),
    ("saturn", 699),
    ("uranus", 799),
    ("neptune", 899),
    ("pluto", 999),
];

/// Identifier for a body name (case-insensitive).
///
/// # Errors
///
/// Returns [`HorizonsError::UnknownBody`] for names not in the table.
pub fn lookup(name: &str) -> Result<u32> {
    BODIES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name.trim()))
        .map(|(_, id)| *id)
        .ok_or_else(|| HorizonsError::UnknownBody(name.to_string()))
}

/// Canonical name for an identifier.
pub fn name_of(id: u32) -> Option<&'static str> {
    BODIES
        .iter()
        .find(|(_, known)| *known == id)
        .map(|(name, _)| *name)
}

/// All known body names.
pub fn names() -> impl Iterator<Item = &'static str> {
    BODIES.iter().map(|(name, _)| *name)
}
