use super::{ScopeCounters, ScopeType};
use crate::error::{LocatorError, Result};
use crate::finder::ValueCondition;
use crate::locator::Locator;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Counter {
    Total,
    Passed,
    Failed,
    Ignored,
    Muted,
}

impl Counter {
    pub const ALL: [Counter; 5] = [
        Counter::Total,
        Counter::Passed,
        Counter::Failed,
        Counter::Ignored,
        Counter::Muted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Counter::Total => "total",
            Counter::Passed => "passed",
            Counter::Failed => "failed",
            Counter::Ignored => "ignored",
            Counter::Muted => "muted",
        }
    }

    pub fn read(self, counters: &ScopeCounters) -> usize {
        match self {
            Counter::Total => counters.total,
            Counter::Passed => counters.passed,
            Counter::Failed => counters.failed,
            Counter::Ignored => counters.ignored,
            Counter::Muted => counters.muted,
        }
    }
}

/// Condition over a fully populated scope bucket: its name and its counters.
///
/// Grammar (a locator fragment): `type:<scope>`, `value:<exact name>`, and any
/// of `total`, `passed`, `failed`, `ignored`, `muted` set to a number, `any`,
/// or `(condition:<op>,value:<n>)`. A bare single value is shorthand for
/// `value:<name>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScopeFilter {
    pub scope_type: Option<ScopeType>,
    pub value: Option<String>,
    pub conditions: Vec<(Counter, ValueCondition)>,
}

const FILTER_KEYS: [&str; 7] = ["type", "value", "total", "passed", "failed", "ignored", "muted"];

impl ScopeFilter {
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let bad = |message: String| LocatorError::bad_filter(text, message);
        let mut locator = Locator::parse(text).map_err(|err| bad(err.to_string()))?;
        if let Some(value) = locator.get_single_value() {
            return Ok(Self {
                value: Some(value),
                ..Self::default()
            });
        }

        let scope_type = locator.get_dimension("type").map(|raw| ScopeType::parse(&raw)).transpose()?;
        let value = locator.get_dimension("value");
        let mut conditions = Vec::new();
        for counter in Counter::ALL {
            let Some(raw) = locator.get_dimension(counter.name()) else {
                continue;
            };
            if let Some(condition) =
                ValueCondition::parse(counter.name(), &raw).map_err(|err| bad(err.to_string()))?
            {
                conditions.push((counter, condition));
            }
        }

        let (repeated, unknown): (Vec<String>, Vec<String>) = locator
            .unused_dimensions()
            .into_iter()
            .partition(|name| FILTER_KEYS.contains(&name.as_str()));
        let mut problems = Vec::new();
        if !unknown.is_empty() {
            problems.push(format!(
                "unknown filter {}: {} (supported: {})",
                if unknown.len() == 1 { "key" } else { "keys" },
                unknown.join(", "),
                FILTER_KEYS.join(", ")
            ));
        }
        if !repeated.is_empty() {
            problems.push(format!(
                "filter {} given more than once: {}",
                if repeated.len() == 1 { "key" } else { "keys" },
                repeated.join(", ")
            ));
        }
        if !problems.is_empty() {
            return Err(bad(problems.join("; ")));
        }
        Ok(Self {
            scope_type,
            value,
            conditions,
        })
    }

    /// A filter that keeps only buckets with at least one non-muted failure.
    pub fn failed_only() -> Self {
        Self {
            conditions: vec![(
                Counter::Failed,
                ValueCondition {
                    comparison: crate::finder::Comparison::MoreThan,
                    value: 0,
                },
            )],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.conditions.is_empty()
    }

    pub fn accepts(&self, key: &str, counters: &ScopeCounters) -> bool {
        if self.value.as_deref().is_some_and(|value| value != key) {
            return false;
        }
        self.conditions
            .iter()
            .all(|(counter, condition)| condition.matches(counter.read(counters) as i64))
    }
}
