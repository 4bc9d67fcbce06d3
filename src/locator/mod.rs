//! Locator strings: `dimension:value,dimension:(nested:value,...)`.
//!
//! A [`Locator`] is an ordered multi-map of dimension names to raw values.
//! Reading a dimension consumes it; whatever is left unconsumed at the end of
//! an evaluation is, by definition, a dimension nobody understood. Nested
//! values are kept as raw strings and parsed again only by the code that reads
//! them.

pub mod grammar;

use crate::error::{LocatorError, Result};
use serde::Serialize;
use std::fmt;

/// Name reported for an unconsumed single-value locator.
pub const SINGLE_VALUE: &str = "<single value>";

#[derive(Debug, Clone, Serialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
    #[serde(skip)]
    used: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Locator {
    single_value: Option<String>,
    single_used: bool,
    dimensions: Vec<Dimension>,
}

#[derive(Debug, Serialize)]
pub struct LocatorView<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_value: Option<&'a str>,
    pub dimensions: &'a [Dimension],
}

impl Locator {
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(LocatorError::malformed("locator is empty", text));
        }
        let segments = grammar::split_top_level(text)?;
        if segments.len() == 1 && grammar::find_top_level(text, ':').is_none() {
            let value = grammar::unwrap_value(text)?;
            return Ok(Self::single(value.into_owned()));
        }
        let mut dimensions = Vec::with_capacity(segments.len());
        for segment in &segments {
            let (name, raw) = grammar::split_dimension(segment)?;
            let value = grammar::unwrap_value(raw)?;
            dimensions.push(Dimension {
                name: name.to_string(),
                value: value.into_owned(),
                used: false,
            });
        }
        Ok(Self {
            single_value: None,
            single_used: false,
            dimensions,
        })
    }

    /// A locator with no dimensions; finders treat it as "use defaults".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(value: impl Into<String>) -> Self {
        Self {
            single_value: Some(value.into()),
            single_used: false,
            dimensions: Vec::new(),
        }
    }

    pub fn from_pairs<I, N, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut locator = Self::empty();
        for (name, value) in pairs {
            locator.add_dimension(name, value)?;
        }
        Ok(locator)
    }

    pub fn add_dimension(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        if !grammar::is_valid_name(&name) {
            return Err(LocatorError::malformed(
                format!("invalid dimension name '{name}'"),
                name.clone(),
            ));
        }
        if self.single_value.is_some() {
            return Err(LocatorError::malformed(
                "cannot add dimensions to a single-value locator",
                name,
            ));
        }
        self.dimensions.push(Dimension {
            name,
            value: value.into(),
            used: false,
        });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.single_value.is_none() && self.dimensions.is_empty()
    }

    pub fn is_single_value(&self) -> bool {
        self.single_value.is_some()
    }

    pub fn single_value(&self) -> Option<&str> {
        self.single_value.as_deref()
    }

    pub fn get_single_value(&mut self) -> Option<String> {
        let value = self.single_value.clone()?;
        self.single_used = true;
        Some(value)
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Returns the first unconsumed value of `name` and consumes it.
    pub fn get_dimension(&mut self, name: &str) -> Option<String> {
        let dimension = self
            .dimensions
            .iter_mut()
            .find(|dimension| !dimension.used && dimension.name == name)?;
        dimension.used = true;
        Some(dimension.value.clone())
    }

    /// Returns every unconsumed value of `name`, in order, and consumes them.
    pub fn get_multi_dimension(&mut self, name: &str) -> Vec<String> {
        self.dimensions
            .iter_mut()
            .filter(|dimension| !dimension.used && dimension.name == name)
            .map(|dimension| {
                dimension.used = true;
                dimension.value.clone()
            })
            .collect()
    }

    pub fn peek_dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|dimension| dimension.name == name)
            .map(|dimension| dimension.value.as_str())
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.dimensions.iter().any(|dimension| dimension.name == name)
    }

    /// Drops every occurrence of `name`, returning the first value.
    pub fn remove_dimension(&mut self, name: &str) -> Option<String> {
        let first = self.peek_dimension(name).map(str::to_string);
        self.dimensions.retain(|dimension| dimension.name != name);
        first
    }

    pub fn get_usize(&mut self, name: &str) -> Result<Option<usize>> {
        let Some(raw) = self.get_dimension(name) else {
            return Ok(None);
        };
        raw.parse::<usize>()
            .map(Some)
            .map_err(|_| LocatorError::bad_value(name, raw.as_str(), "expected a non-negative integer"))
    }

    pub fn get_i64(&mut self, name: &str) -> Result<Option<i64>> {
        let Some(raw) = self.get_dimension(name) else {
            return Ok(None);
        };
        raw.parse::<i64>()
            .map(Some)
            .map_err(|_| LocatorError::bad_value(name, raw.as_str(), "expected an integer"))
    }

    /// `true`/`false` constrain, `any` consumes the dimension without constraining.
    pub fn get_bool(&mut self, name: &str) -> Result<Option<bool>> {
        match self.get_dimension(name) {
            Some(raw) => parse_bool(name, &raw),
            None => Ok(None),
        }
    }

    /// Distinct names of unconsumed dimensions, in first-appearance order.
    pub fn unused_dimensions(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        if self.single_value.is_some() && !self.single_used {
            names.push(SINGLE_VALUE.to_string());
        }
        for dimension in self.dimensions.iter().filter(|dimension| !dimension.used) {
            if !names.contains(&dimension.name) {
                names.push(dimension.name.clone());
            }
        }
        names
    }

    pub fn used_dimensions(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for dimension in self.dimensions.iter().filter(|dimension| dimension.used) {
            if !names.contains(&dimension.name) {
                names.push(dimension.name.clone());
            }
        }
        names
    }

    pub fn assert_fully_consumed(&self) -> Result<()> {
        self.assert_consumed_against::<&str>(&[])
    }

    /// Like [`Locator::assert_fully_consumed`], listing `supported` in the error.
    pub fn assert_consumed_against<S: AsRef<str>>(&self, supported: &[S]) -> Result<()> {
        let names = self.unused_dimensions();
        if names.is_empty() {
            return Ok(());
        }
        Err(LocatorError::UnusedDimensions {
            names,
            supported: supported.iter().map(|name| name.as_ref().to_string()).collect(),
        })
    }

    pub fn view(&self) -> LocatorView<'_> {
        LocatorView {
            single_value: self.single_value.as_deref(),
            dimensions: &self.dimensions,
        }
    }
}

pub fn parse_bool(dimension: &str, raw: &str) -> Result<Option<bool>> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" => Ok(Some(true)),
        "false" | "no" => Ok(Some(false)),
        "any" => Ok(None),
        _ => Err(LocatorError::bad_value(
            dimension,
            raw,
            "expected true, false or any",
        )),
    }
}

impl PartialEq for Locator {
    fn eq(&self, other: &Self) -> bool {
        self.single_value == other.single_value
            && self.dimensions.len() == other.dimensions.len()
            && self
                .dimensions
                .iter()
                .zip(&other.dimensions)
                .all(|(a, b)| a.name == b.name && a.value == b.value)
    }
}

impl Eq for Locator {}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = &self.single_value {
            return f.write_str(&grammar::render_single_value(value));
        }
        for (idx, dimension) in self.dimensions.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", dimension.name, grammar::render_value(&dimension.value))?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Locator {
    type Err = LocatorError;

    fn from_str(text: &str) -> Result<Self> {
        Locator::parse(text)
    }
}
