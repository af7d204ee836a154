//! Ordered (pattern, transform) rules.

use regex::{Captures, Regex};

use crate::error::Result;
use crate::record::Field;

/// Pure conversion from regex captures to a value.
pub type Transform = fn(&Captures<'_>) -> Option<f64>;

/// One layout the remote may use for a field.
#[derive(Debug, Clone)]
pub struct Rule {
    label: &'static str,
    pattern: Regex,
    transform: Transform,
}

impl Rule {
    /// Compile a rule.
    ///
    /// # Errors
    ///
    /// Returns [`HorizonsError::Pattern`](crate::HorizonsError::Pattern) if the
    /// pattern does not compile.
    pub fn new(label: &'static str, pattern: &str, transform: Transform) -> Result<Self> {
        Ok(Self {
            label,
            pattern: Regex::new(pattern)?,
            transform,
        })
    }

    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The rule's pattern.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Apply the rule.
    ///
    /// `None` if the pattern does not match; `Some(None)` if it matched but
    /// the transform rejected the captures.
    pub fn apply(&self, text: &str) -> Option<Option<f64>> {
        self.pattern
            .captures(text)
            .map(|caps| (self.transform)(&caps))
    }
}

/// Rules for one field, tried in declaration order.
#[derive(Debug, Clone)]
pub struct RuleChain {
    field: Field,
    rules: Vec<Rule>,
}

impl RuleChain {
    /// Start an empty chain.
    pub fn new(field: Field) -> Self {
        Self {
            field,
            rules: Vec::new(),
        }
    }

    /// Append a rule with lower precedence than all existing ones.
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, rule: Rule) -> Self {
        self.push(rule);
        self
    }

    /// Field this chain resolves.
    pub fn field(&self) -> Field {
        self.field
    }

    /// Rules in precedence order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First rule whose pattern matches `text`.
    pub fn matching_rule(&self, text: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.pattern.is_match(text))
    }

    /// Value from the first matching rule.
    ///
    /// Once a pattern matches, later rules are not consulted, even if the
    /// transform rejects the captures.
    pub fn extract(&self, text: &str) -> Option<f64> {
        let (rule, value) = self
            .rules
            .iter()
            .find_map(|rule| rule.apply(text).map(|value| (rule, value)))?;

        match value {
            Some(v) => {
                tracing::debug!("{} = {} (rule {})", self.field, v, rule.label);
                Some(v)
            }
            None => {
                tracing::warn!(
                    "Rule {} matched {} but the value could not be converted",
                    rule.label,
                    self.field
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(caps: &Captures<'_>) -> Option<f64> {
        caps.get(1)?.as_str().parse().ok()
    }

    fn doubled(caps: &Captures<'_>) -> Option<f64> {
        first(caps).map(|v| v * 2.0)
    }

    fn reject(_: &Captures<'_>) -> Option<f64> {
        None
    }

    #[test]
    fn test_first_declared_rule_wins() {
        // Both patterns match "value = 21"
        let chain = RuleChain::new(Field::Mass)
            .with(Rule::new("doubled", r"value = (\d+)", doubled).unwrap())
            .with(Rule::new("plain", r"= (\d+)", first).unwrap());

        assert_eq!(chain.extract("value = 21"), Some(42.0));
        assert_eq!(chain.matching_rule("value = 21").unwrap().label(), "doubled");

        // Only the second one matches here
        assert_eq!(chain.extract("x = 21"), Some(21.0));
    }

    #[test]
    fn test_reversed_order_changes_result() {
        let chain = RuleChain::new(Field::Mass)
            .with(Rule::new("plain", r"= (\d+)", first).unwrap())
            .with(Rule::new("doubled", r"value = (\d+)", doubled).unwrap());

        assert_eq!(chain.extract("value = 21"), Some(21.0));
    }

    #[test]
    fn test_matching_rule_that_rejects_stops_the_chain() {
        let chain = RuleChain::new(Field::Radius)
            .with(Rule::new("reject", r"(\d+)", reject).unwrap())
            .with(Rule::new("plain", r"(\d+)", first).unwrap());

        assert_eq!(chain.extract("42"), None);
    }

    #[test]
    fn test_no_match_is_absent() {
        let chain = RuleChain::new(Field::Radius)
            .with(Rule::new("plain", r"radius = (\d+)", first).unwrap());

        assert_eq!(chain.extract("mass = 5"), None);
        assert!(chain.matching_rule("mass = 5").is_none());
        assert_eq!(chain.field(), Field::Radius);
        assert_eq!(chain.rules().len(), 1);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(Rule::new("broken", r"(unclosed", first).is_err());
    }
}
