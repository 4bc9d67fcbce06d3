//! Per-dimension predicate registry entries and value conditions.

use crate::error::{LocatorError, Result};
use crate::locator::Locator;
use serde::Serialize;
use std::fmt;

/// A filter over one item, built from one dimension value.
pub type Predicate<T> = Box<dyn Fn(&T) -> bool>;

/// Turns a raw dimension value into a predicate. `Ok(None)` means the value
/// imposes no constraint (for example `any`).
pub type PredicateBuilder<T> = Box<dyn Fn(&str) -> Result<Option<Predicate<T>>> + Send + Sync>;

pub struct DimensionSpec<T> {
    pub name: &'static str,
    pub description: &'static str,
    /// Multi-valued dimensions consume every occurrence; all values must match.
    pub multi: bool,
    builder: PredicateBuilder<T>,
}

impl<T> DimensionSpec<T> {
    pub fn new<F>(name: &'static str, description: &'static str, builder: F) -> Self
    where
        F: Fn(&str) -> Result<Option<Predicate<T>>> + Send + Sync + 'static,
    {
        Self {
            name,
            description,
            multi: false,
            builder: Box::new(builder),
        }
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn build(&self, raw: &str) -> Result<Option<Predicate<T>>> {
        (self.builder)(raw)
    }
}

impl<T> fmt::Debug for DimensionSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DimensionSpec")
            .field("name", &self.name)
            .field("multi", &self.multi)
            .finish()
    }
}

/// Boxes a closure as a constraining predicate.
pub fn predicate<T>(f: impl Fn(&T) -> bool + 'static) -> Option<Predicate<T>> {
    Some(Box::new(f))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Comparison {
    Equals,
    DoesNotEqual,
    MoreThan,
    NoMoreThan,
    LessThan,
    NoLessThan,
}

impl Comparison {
    pub const NAMES: &'static [&'static str] = &[
        "equals",
        "does-not-equal",
        "more-than",
        "no-more-than",
        "less-than",
        "no-less-than",
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        let comparison = match raw.to_ascii_lowercase().as_str() {
            "equals" | "eq" => Comparison::Equals,
            "does-not-equal" | "ne" => Comparison::DoesNotEqual,
            "more-than" | "gt" => Comparison::MoreThan,
            "no-more-than" | "le" => Comparison::NoMoreThan,
            "less-than" | "lt" => Comparison::LessThan,
            "no-less-than" | "ge" => Comparison::NoLessThan,
            _ => return None,
        };
        Some(comparison)
    }
}

/// Numeric condition: `5`, `any`, or `(condition:more-than,value:5)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueCondition {
    pub comparison: Comparison,
    pub value: i64,
}

impl ValueCondition {
    pub fn equals(value: i64) -> Self {
        Self {
            comparison: Comparison::Equals,
            value,
        }
    }

    pub fn parse(dimension: &str, raw: &str) -> Result<Option<Self>> {
        if raw.eq_ignore_ascii_case("any") {
            return Ok(None);
        }
        if let Ok(value) = raw.parse::<i64>() {
            return Ok(Some(Self::equals(value)));
        }
        let mut nested = Locator::parse(raw)
            .map_err(|err| LocatorError::bad_value(dimension, raw, err.to_string()))?;
        if nested.is_single_value() {
            return Err(LocatorError::bad_value(
                dimension,
                raw,
                "expected a number, 'any' or (condition:<op>,value:<n>)",
            ));
        }
        let comparison = match nested.get_dimension("condition") {
            Some(name) => Comparison::parse(&name).ok_or_else(|| {
                LocatorError::bad_value(
                    dimension,
                    raw,
                    format!(
                        "unknown condition '{name}', expected one of: {}",
                        Comparison::NAMES.join(", ")
                    ),
                )
            })?,
            None => Comparison::Equals,
        };
        let value = nested
            .get_i64("value")
            .map_err(|err| LocatorError::bad_value(dimension, raw, err.to_string()))?
            .ok_or_else(|| LocatorError::bad_value(dimension, raw, "condition needs a 'value'"))?;
        nested
            .assert_consumed_against(&["condition", "value"])
            .map_err(|err| LocatorError::bad_value(dimension, raw, err.to_string()))?;
        Ok(Some(Self { comparison, value }))
    }

    pub fn matches(&self, actual: i64) -> bool {
        match self.comparison {
            Comparison::Equals => actual == self.value,
            Comparison::DoesNotEqual => actual != self.value,
            Comparison::MoreThan => actual > self.value,
            Comparison::NoMoreThan => actual <= self.value,
            Comparison::LessThan => actual < self.value,
            Comparison::NoLessThan => actual >= self.value,
        }
    }
}
