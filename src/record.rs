//! Result record produced by one session run.
//!
//! A [`RecordBuilder`] travels with the run and collects fields as their
//! script steps complete. When the run ends it is frozen into a
//! [`ResultRecord`], which has no setters.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{HorizonsError, Result};

/// Logical field extracted from HORIZONS output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Mean radius, metres.
    Radius,
    /// Mass, kilograms.
    Mass,
    /// Sidereal rotation rate, radians per second.
    Rotation,
    /// Eccentricity `EC`.
    Eccentricity,
    /// Longitude of ascending node `OM`, degrees.
    AscendingNode,
    /// Argument of perifocus `W`, degrees.
    Perifocus,
    /// Mean motion `N`, degrees per second.
    MeanMotion,
    /// True anomaly `TA`, degrees.
    TrueAnomaly,
    /// Semi-major axis `A`, kilometres.
    SemiMajorAxis,
}

impl Field {
    /// Every field, in record order.
    pub const ALL: [Field; 9] = [
        Field::Radius,
        Field::Mass,
        Field::Rotation,
        Field::Eccentricity,
        Field::AscendingNode,
        Field::Perifocus,
        Field::MeanMotion,
        Field::TrueAnomaly,
        Field::SemiMajorAxis,
    ];

    /// Name used in records and logs (element fields keep the HORIZONS labels).
    pub fn name(self) -> &'static str {
        match self {
            Field::Radius => "radius",
            Field::Mass => "mass",
            Field::Rotation => "rotation",
            Field::Eccentricity => "EC",
            Field::AscendingNode => "OM",
            Field::Perifocus => "W",
            Field::MeanMotion => "N",
            Field::TrueAnomaly => "TA",
            Field::SemiMajorAxis => "A",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = HorizonsError;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| HorizonsError::Config(format!("unknown field `{}`", s)))
    }
}

/// Mutable record used while a run is in progress.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    target: String,
    fields: BTreeMap<Field, f64>,
}

impl RecordBuilder {
    /// Start an empty record for `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set a field. Each field is set at most once; later values are ignored.
    ///
    /// Returns `true` if the value was stored.
    pub fn set(&mut self, field: Field, value: f64) -> bool {
        if let Some(existing) = self.fields.get(&field) {
            tracing::warn!(
                "Ignoring second value {} for {} (kept {})",
                value,
                field,
                existing
            );
            return false;
        }
        self.fields.insert(field, value);
        true
    }

    /// Whether a field has been set.
    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    /// Freeze into an immutable record.
    pub fn finish(self) -> ResultRecord {
        ResultRecord {
            target: self.target,
            fields: self.fields,
        }
    }
}

/// Immutable output of a session run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    target: String,
    fields: BTreeMap<Field, f64>,
}

impl ResultRecord {
    /// Name of the queried body.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Value of a field, `None` if no rule matched.
    pub fn get(&self, field: Field) -> Option<f64> {
        self.fields.get(&field).copied()
    }

    /// Value of a field the caller cannot do without.
    ///
    /// # Errors
    ///
    /// Returns [`HorizonsError::MissingField`] if the field is absent.
    pub fn require(&self, field: Field) -> Result<f64> {
        self.get(field).ok_or(HorizonsError::MissingField(field))
    }

    /// Fields that were extracted, in record order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, f64)> + '_ {
        self.fields.iter().map(|(field, value)| (*field, *value))
    }

    /// Number of extracted fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("target", &self.target)?;
        for (field, value) in &self.fields {
            map.serialize_entry(field.name(), value)?;
        }
        map.end()
    }
}
