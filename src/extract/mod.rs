//! Field extraction - ordered rule chains over free text.
//!
//! - [`Rule`] - one (regex, transform) pair
//! - [`RuleChain`] - rules for one field, first match wins
//! - [`Extractor`] - chains keyed by [`Field`]
//!
//! # Example
//!
//! ```
//! use horizons_client::extract::Extractor;
//! use horizons_client::record::Field;
//!
//! let text = " Mean radius (km)      =  12345(+-1) ";
//! assert_eq!(Extractor::horizons().extract(Field::Radius, text), Some(12_345_000.0));
//! assert_eq!(Extractor::horizons().extract(Field::Mass, text), None);
//! ```

mod horizons;
mod rule;

use std::collections::BTreeMap;
use std::sync::LazyLock;

pub use horizons::{mass_chain, radius_chain, rate_from_period, rotation_chain, scaled};
pub use rule::{Rule, RuleChain, Transform};

use crate::record::{Field, RecordBuilder};

static HORIZONS: LazyLock<Extractor> = LazyLock::new(|| {
    let mut extractor = Extractor::new();
    for chain in horizons::chains() {
        extractor.insert(chain);
    }
    extractor
});

/// Rule chains for every known field.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    chains: BTreeMap<Field, RuleChain>,
}

impl Extractor {
    /// Create an extractor with no chains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared extractor with the built-in HORIZONS layouts.
    pub fn horizons() -> &'static Extractor {
        &HORIZONS
    }

    /// Register a chain, replacing any chain for the same field.
    pub fn insert(&mut self, chain: RuleChain) {
        self.chains.insert(chain.field(), chain);
    }

    /// Chain registered for `field`.
    pub fn chain(&self, field: Field) -> Option<&RuleChain> {
        self.chains.get(&field)
    }

    /// Resolve one field; absent if no chain or no rule matches.
    pub fn extract(&self, field: Field, text: &str) -> Option<f64> {
        self.chains.get(&field)?.extract(text)
    }

    /// Resolve `fields` from `text` into `record`.
    ///
    /// Returns the fields that stayed absent.
    pub fn extract_into(&self, fields: &[Field], text: &str, record: &mut RecordBuilder) -> Vec<Field> {
        let mut missing = Vec::new();
        for &field in fields {
            match self.extract(field, text) {
                Some(value) => {
                    record.set(field, value);
                }
                None => missing.push(field),
            }
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizons_has_every_field() {
        let extractor = Extractor::horizons();
        for field in Field::ALL {
            assert!(extractor.chain(field).is_some(), "no chain for {}", field);
        }
    }

    #[test]
    fn test_extract_into_reports_missing() {
        let text = " Mean radius, km = 6371.01+-0.01   Mass, 10^24 kg = 5.97219+-0.0006 ";
        let mut record = RecordBuilder::new("earth");

        let missing = Extractor::horizons().extract_into(
            &[Field::Radius, Field::Mass, Field::Rotation],
            text,
            &mut record,
        );

        assert_eq!(missing, vec![Field::Rotation]);
        let record = record.finish();
        assert_eq!(record.get(Field::Radius), Some(6_371_010.0));
        assert_eq!(record.get(Field::Mass), Some(5.97219e24));
        assert_eq!(record.get(Field::Rotation), None);
    }

    #[test]
    fn test_custom_chain_replaces_builtin() {
        fn fixed(_: &regex::Captures<'_>) -> Option<f64> {
            Some(1.0)
        }

        let mut extractor = Extractor::horizons().clone();
        extractor.insert(RuleChain::new(Field::Radius).with(Rule::new("any", "radius", fixed).unwrap()));

        assert_eq!(extractor.extract(Field::Radius, "radius"), Some(1.0));
        assert_eq!(Extractor::new().extract(Field::Radius, "radius"), None);
    }
}
