//! Concrete finder specializations and the predicate builders they share.

pub mod build;
pub mod problem;
pub mod test_occurrence;

pub use build::build_finder;
pub use problem::problem_finder;
pub use test_occurrence::test_occurrence_finder;

use crate::error::{LocatorError, Result};
use crate::finder::{Predicate, predicate};
use crate::locator;
use crate::model::Status;

/// Exact, case-sensitive text equality.
pub(crate) fn text_equals<T: 'static>(
    get: fn(&T) -> &str,
) -> impl Fn(&str) -> Result<Option<Predicate<T>>> + Send + Sync + 'static {
    move |raw: &str| {
        let expected = raw.to_string();
        Ok(predicate(move |item: &T| get(item) == expected))
    }
}

pub(crate) fn status_equals<T: 'static>(
    dimension: &'static str,
    get: fn(&T) -> Status,
) -> impl Fn(&str) -> Result<Option<Predicate<T>>> + Send + Sync + 'static {
    move |raw: &str| {
        let expected = Status::parse(raw).ok_or_else(|| {
            LocatorError::bad_value(dimension, raw, "expected SUCCESS, FAILURE or UNKNOWN")
        })?;
        Ok(predicate(move |item: &T| get(item) == expected))
    }
}

pub(crate) fn flag_equals<T: 'static>(
    dimension: &'static str,
    get: fn(&T) -> bool,
) -> impl Fn(&str) -> Result<Option<Predicate<T>>> + Send + Sync + 'static {
    move |raw: &str| {
        Ok(locator::parse_bool(dimension, raw)?
            .and_then(|expected| predicate(move |item: &T| get(item) == expected)))
    }
}

pub(crate) fn parse_id(dimension: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| LocatorError::bad_value(dimension, raw, "expected a numeric id"))
}
