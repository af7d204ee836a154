//! Queries for one body and the scripts that answer them.
//!
//! A full query walks the HORIZONS ephemeris dialogue to get osculating
//! orbital elements after reading the physical-data page. The body used as
//! coordinate centre has no orbit around itself, so its query stops after
//! the physical-data page.
//!
//! # Example
//!
//! ```
//! use horizons_client::query::{EphemerisRequest, Query};
//!
//! let query = Query::new("earth").unwrap();
//! assert_eq!(query.id(), 399);
//! assert!(query.wants_elements());
//!
//! let sun = Query::new("sun").unwrap();
//! assert!(!sun.wants_elements());
//! assert_eq!(sun.script().len(), 3);
//!
//! let later = Query::new("mars")
//!     .unwrap()
//!     .with_ephemeris(EphemerisRequest::default().date_range("2020-01-01", "2020-01-02"));
//! assert_eq!(later.ephemeris().start, "2020-01-01");
//! ```

use serde::Deserialize;

use crate::bodies;
use crate::error::Result;
use crate::protocol::{prompt, Script};
use crate::record::Field;

/// Fields read from the physical-data page.
pub const PHYSICAL_FIELDS: &[Field] = &[Field::Radius, Field::Mass, Field::Rotation];

/// Fields read from the osculating-element table.
pub const ELEMENT_FIELDS: &[Field] = &[
    Field::Eccentricity,
    Field::AscendingNode,
    Field::Perifocus,
    Field::MeanMotion,
    Field::TrueAnomaly,
    Field::SemiMajorAxis,
];

/// Answers given to the ephemeris prompts, in the order they are asked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EphemerisRequest {
    /// Table type (`e` = osculating elements).
    pub table: String,
    /// Coordinate centre identifier.
    pub center: String,
    /// Reference plane.
    pub plane: String,
    /// First epoch, `YYYY-MM-DD`.
    pub start: String,
    /// Last epoch, `YYYY-MM-DD`.
    pub stop: String,
    /// Output interval, e.g. `2d`.
    pub step: String,
    /// Whether to accept the default output settings.
    pub default_output: String,
    /// Reference frame.
    pub frame: String,
    /// Output units (`1` = km and seconds).
    pub units: String,
    /// CSV output.
    pub csv: String,
    /// Label cartesian output.
    pub labels: String,
    /// Time-of-periapsis format.
    pub periapsis_time: String,
}

impl Default for EphemerisRequest {
    fn default() -> Self {
        Self {
            table: "e".into(),
            center: bodies::SUN_ID.to_string(),
            plane: "eclip".into(),
            start: "2014-05-13".into(),
            stop: "2014-05-14".into(),
            step: "2d".into(),
            default_output: "n".into(),
            frame: "J2000".into(),
            units: "1".into(),
            csv: "NO".into(),
            labels: "YES".into(),
            periapsis_time: "ABS".into(),
        }
    }
}

impl EphemerisRequest {
    /// Set the epoch range.
    pub fn date_range(mut self, start: impl Into<String>, stop: impl Into<String>) -> Self {
        self.start = start.into();
        self.stop = stop.into();
        self
    }

    /// Set the output interval.
    pub fn step_size(mut self, step: impl Into<String>) -> Self {
        self.step = step.into();
        self
    }

    /// Answers to the `] : ` prompts, before the final periapsis answer.
    fn answers(&self) -> [&str; 11] {
        [
            self.table.as_str(),
            self.center.as_str(),
            self.plane.as_str(),
            self.start.as_str(),
            self.stop.as_str(),
            self.step.as_str(),
            self.default_output.as_str(),
            self.frame.as_str(),
            self.units.as_str(),
            self.csv.as_str(),
            self.labels.as_str(),
        ]
    }
}

/// A resolved query for one body.
#[derive(Debug, Clone)]
pub struct Query {
    name: String,
    id: u32,
    ephemeris: EphemerisRequest,
}

impl Query {
    /// Resolve `name` against the body table.
    ///
    /// # Errors
    ///
    /// Returns [`HorizonsError::UnknownBody`](crate::HorizonsError::UnknownBody)
    /// if the name is not known.
    pub fn new(name: &str) -> Result<Self> {
        let id = bodies::lookup(name)?;
        Ok(Self {
            name: name.trim().to_ascii_lowercase(),
            id,
            ephemeris: EphemerisRequest::default(),
        })
    }

    /// Replace the ephemeris answers.
    pub fn with_ephemeris(mut self, ephemeris: EphemerisRequest) -> Self {
        self.ephemeris = ephemeris;
        self
    }

    /// Body name, lower case.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// HORIZONS identifier.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Ephemeris answers used by [`script`](Self::script).
    pub fn ephemeris(&self) -> &EphemerisRequest {
        &self.ephemeris
    }

    /// False when the body is the coordinate centre.
    pub fn wants_elements(&self) -> bool {
        self.ephemeris.center != self.id.to_string()
    }

    /// Script for this query.
    pub fn script(&self) -> Script {
        if self.wants_elements() {
            orbital_elements_script(&self.name, self.id, &self.ephemeris)
        } else {
            physical_data_script(&self.name, self.id)
        }
    }
}

fn select_body(name: &str, id: u32) -> Script {
    Script::new(name)
        .expect(prompt::main())
        .send(id.to_string())
}

/// Select the body and read its physical-data page.
pub fn physical_data_script(name: &str, id: u32) -> Script {
    select_body(name, id).expect_capture(prompt::object_page(), PHYSICAL_FIELDS)
}

/// Physical-data page followed by the osculating-element table.
pub fn orbital_elements_script(name: &str, id: u32, request: &EphemerisRequest) -> Script {
    let mut script = select_body(name, id)
        .expect_capture(prompt::object_page(), PHYSICAL_FIELDS)
        .send("E")
        .expect(prompt::field());

    for answer in request.answers() {
        script = script.send(answer).expect(prompt::field());
    }

    script
        .send(request.periapsis_time.as_str())
        .expect_capture(prompt::case_end(), ELEMENT_FIELDS)
}
