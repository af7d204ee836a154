//! PlaneworldML output.
//!
//! A body becomes one `RigidBody` object with a circular shape. Numbers are
//! written in SI units: kilograms, metres, metres/second and rad/s.
//!
//! # Example
//!
//! ```
//! use horizons_client::convert::StateVector;
//! use horizons_client::markup::BodyDocument;
//!
//! let doc = BodyDocument {
//!     name: "earth".into(),
//!     mass: 12.0,
//!     radius: 14.0,
//!     state: StateVector { position: [13.0, 14.0], velocity: [15.0, 16.0] },
//!     rotation: 0.5,
//! };
//!
//! let xml = doc.render();
//! assert!(xml.starts_with("<!DOCTYPE PlaneworldML>\n"));
//! assert!(xml.contains(r#"velocity_y="16""#));
//! ```

use std::fmt;

use crate::convert::{OrbitalElements, StateVector};
use crate::error::Result;
use crate::query::ELEMENT_FIELDS;
use crate::record::{Field, ResultRecord};

/// Everything written for one body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDocument {
    pub name: String,
    /// Kilograms.
    pub mass: f64,
    /// Metres.
    pub radius: f64,
    pub state: StateVector,
    /// rad/s.
    pub rotation: f64,
}

impl BodyDocument {
    /// Build the document for a finished query.
    ///
    /// A record without any orbital element (the coordinate centre) is
    /// placed at rest at the origin. A missing rotation is written as 0.
    ///
    /// # Errors
    ///
    /// [`HorizonsError::MissingField`](crate::HorizonsError::MissingField)
    /// for a missing mass or radius, or an incomplete element set.
    pub fn from_record(record: &ResultRecord) -> Result<Self> {
        let has_elements = ELEMENT_FIELDS.iter().any(|f| record.get(*f).is_some());
        let state = if has_elements {
            OrbitalElements::from_record(record)?.state_vector()
        } else {
            StateVector::default()
        };

        let rotation = record.get(Field::Rotation).unwrap_or_else(|| {
            tracing::debug!("No rotation for {}, writing 0", record.target());
            0.0
        });

        Ok(Self {
            name: record.target().to_string(),
            mass: record.require(Field::Mass)?,
            radius: record.require(Field::Radius)?,
            state,
            rotation,
        })
    }

    /// Render the PlaneworldML document.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BodyDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y] = self.state.position;
        let [vx, vy] = self.state.velocity;

        f.write_str("<!DOCTYPE PlaneworldML>\n")?;
        f.write_str("<object type=\"RigidBody\">\n")?;
        f.write_str("    <core\n")?;
        attribute(f, "name", &escape(&self.name))?;
        attribute(f, "mass", &number(self.mass))?;
        attribute(f, "origin_x", &number(x))?;
        attribute(f, "origin_y", &number(y))?;
        attribute(f, "velocity_x", &number(vx))?;
        attribute(f, "velocity_y", &number(vy))?;
        attribute(f, "angle_velocity", &number(self.rotation))?;
        attribute(f, "dynamics", "true")?;
        attribute(f, "gravity", "true")?;
        f.write_str("    />\n")?;
        f.write_str("    <shape\n")?;
        attribute(f, "type", "Circle")?;
        attribute(f, "radius", &number(self.radius))?;
        attribute(f, "center_x", "0.0")?;
        f.write_str("        center_y=\"0.0\">\n")?;
        f.write_str("        <visuals type=\"Circle\"/>\n")?;
        f.write_str("    </shape>\n")?;
        f.write_str("</object>\n")
    }
}

fn attribute(f: &mut fmt::Formatter<'_>, name: &str, value: &str) -> fmt::Result {
    writeln!(f, "        {}=\"{}\"", name, value)
}

/// Shortest form, switching to exponent notation for very large or small magnitudes.
fn number(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-6..1e21).contains(&magnitude) {
        format!("{:e}", value)
    } else {
        format!("{}", value)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HorizonsError;
    use crate::record::RecordBuilder;

    #[test]
    fn test_render_layout() {
        let doc = BodyDocument {
            name: "earth".into(),
            mass: 12.0,
            radius: 14.0,
            state: StateVector {
                position: [13.0, 14.0],
                velocity: [15.0, 16.0],
            },
            rotation: 7.292115e-5,
        };

        let expected = "<!DOCTYPE PlaneworldML>\n\
<object type=\"RigidBody\">\n    <core\n        name=\"earth\"\n        mass=\"12\"\n        \
origin_x=\"13\"\n        origin_y=\"14\"\n        velocity_x=\"15\"\n        velocity_y=\"16\"\n        \
angle_velocity=\"0.00007292115\"\n        dynamics=\"true\"\n        gravity=\"true\"\n    />\n    \
<shape\n        type=\"Circle\"\n        radius=\"14\"\n        center_x=\"0.0\"\n        \
center_y=\"0.0\">\n        <visuals type=\"Circle\"/>\n    </shape>\n</object>\n";

        assert_eq!(doc.render(), expected);
    }

    #[test]
    fn test_number_format() {
        assert_eq!(number(0.0), "0");
        assert_eq!(number(6_371_010.0), "6371010");
        assert_eq!(number(5.97219e24), "5.97219e24");
        assert_eq!(number(-2.5e-9), "-2.5e-9");
    }

    #[test]
    fn test_name_is_escaped() {
        assert_eq!(escape(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&apos;");
    }

    #[test]
    fn test_centre_body_at_rest() {
        let mut builder = RecordBuilder::new("sun");
        builder.set(Field::Radius, 6.957e8);
        builder.set(Field::Mass, 1.989e30);

        let doc = BodyDocument::from_record(&builder.finish()).unwrap();
        assert_eq!(doc.state, StateVector::default());
        assert_eq!(doc.rotation, 0.0);
        assert!(doc.render().contains("mass=\"1.989e30\""));
    }

    #[test]
    fn test_incomplete_elements_rejected() {
        let mut builder = RecordBuilder::new("mars");
        builder.set(Field::Radius, 3.3895e6);
        builder.set(Field::Mass, 6.4171e23);
        builder.set(Field::Eccentricity, 0.09);

        let err = BodyDocument::from_record(&builder.finish()).unwrap_err();
        assert!(matches!(err, HorizonsError::MissingField(_)));
    }
}
