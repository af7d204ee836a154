//! # horizons-client
//!
//! Scripted telnet sessions against the JPL HORIZONS ephemeris service.
//!
//! The crate drives the HORIZONS prompt dialogue over a raw telnet
//! connection and turns the free-text pages it prints into numbers.
//!
//! ## Architecture
//!
//! - **Codec** ([`codec`]): telnet command framing, NAWS reply, text decoding
//! - **Protocol** ([`protocol`]): read-until-prompt buffer and linear scripts
//! - **Session** ([`session`]): runs a script over one connection with an
//!   inactivity timeout
//! - **Extraction** ([`extract`]): ordered rule chains per field
//!
//! A finished [`ResultRecord`] can be turned into a planar state vector
//! ([`convert`]) and a PlaneworldML document ([`markup`]).
//!
//! ## Example
//!
//! ```ignore
//! use horizons_client::{BodyDocument, Query, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::builder().build()?;
//!     let record = session.query(&Query::new("earth")?).await?;
//!
//!     println!("{}", BodyDocument::from_record(&record)?.render());
//!     Ok(())
//! }
//! ```

pub mod bodies;
pub mod codec;
pub mod convert;
pub mod error;
pub mod extract;
pub mod markup;
pub mod protocol;
pub mod query;
pub mod record;
pub mod session;
pub mod transport;

mod writer;

pub use convert::{OrbitalElements, StateVector};
pub use error::{HorizonsError, Result, StepContext};
pub use markup::BodyDocument;
pub use query::{EphemerisRequest, Query};
pub use record::{Field, RecordBuilder, ResultRecord};
pub use session::{PartialRun, Session, SessionBuilder, SessionConfig};
