//! Grouping of flat test-run sequences into named scope buckets.
//!
//! Buckets keep first-seen order, never sorted. Hierarchical scopes are built
//! one level at a time: `suite` groups by package first and then by suite
//! within each package's members; `class` adds a third pass by class.

pub mod filter;

pub use filter::{Counter, ScopeFilter};

use crate::error::{LocatorError, Result};
use crate::finder::Finder;
use crate::locator::Locator;
use crate::model::{Status, TestName, TestRun};
use indexmap::IndexMap;
use serde::Serialize;

/// Locator dimension carrying the scope fragment on the test-scope endpoint.
pub const SCOPE_DIMENSION: &str = "scope";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    Package,
    Suite,
    Class,
}

impl ScopeType {
    pub const SUPPORTED: [&'static str; 3] = ["package", "suite", "class"];

    pub fn parse(raw: &str) -> Result<Self> {
        let scope = match raw.trim().to_ascii_lowercase().as_str() {
            "package" => ScopeType::Package,
            "suite" => ScopeType::Suite,
            "class" => ScopeType::Class,
            _ => {
                return Err(LocatorError::UnsupportedScope {
                    scope: raw.to_string(),
                    supported: Self::SUPPORTED.iter().map(|name| name.to_string()).collect(),
                });
            }
        };
        Ok(scope)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScopeType::Package => "package",
            ScopeType::Suite => "suite",
            ScopeType::Class => "class",
        }
    }

    /// Grouping passes needed to reach this scope, outermost first.
    pub fn levels(self) -> &'static [ScopeType] {
        match self {
            ScopeType::Package => &[ScopeType::Package],
            ScopeType::Suite => &[ScopeType::Package, ScopeType::Suite],
            ScopeType::Class => &[ScopeType::Package, ScopeType::Suite, ScopeType::Class],
        }
    }

    pub fn key(self, name: &TestName) -> String {
        match self {
            ScopeType::Package => name.package.clone(),
            ScopeType::Suite => name.suite.clone(),
            ScopeType::Class => name.class.clone(),
        }
    }
}

/// What the collector needs to know about a test run.
pub trait TestRunLike {
    fn test_name(&self) -> TestName;
    fn status(&self) -> Status;
    fn is_muted(&self) -> bool;
}

impl TestRunLike for TestRun {
    fn test_name(&self) -> TestName {
        TestName::parse(&self.name)
    }

    fn status(&self) -> Status {
        self.status
    }

    fn is_muted(&self) -> bool {
        self.muted
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScopeCounters {
    pub total: usize,
    pub passed: usize,
    /// Failures that are not muted.
    pub failed: usize,
    pub ignored: usize,
    /// Muted failures.
    pub muted: usize,
}

impl ScopeCounters {
    pub fn record(&mut self, status: Status, muted: bool) {
        self.total += 1;
        match (status, muted) {
            (Status::Success, _) => self.passed += 1,
            (Status::Failure, false) => self.failed += 1,
            (Status::Failure, true) => self.muted += 1,
            (Status::Unknown, _) => self.ignored += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scope<T> {
    pub key: String,
    /// Keys of the enclosing buckets, outermost first.
    pub path: Vec<String>,
    pub members: Vec<T>,
    pub counters: ScopeCounters,
}

/// Buckets `items` by `key_fn` in one forward pass, then yields the buckets
/// that `filter` accepts, in first-seen order.
pub fn group_by<T, I, K>(items: I, key_fn: K, filter: ScopeFilter) -> impl Iterator<Item = Scope<T>>
where
    T: TestRunLike,
    I: IntoIterator<Item = T>,
    K: FnMut(&T) -> String,
{
    collect_buckets(items, key_fn, &[])
        .into_iter()
        .filter(move |scope| filter.accepts(&scope.key, &scope.counters))
}

/// Groups by every level `scope` implies, regrouping each previous level's
/// member lists. Only buckets of the final level are filtered and yielded.
pub fn group_hierarchy<T, I>(
    items: I,
    scope: ScopeType,
    filter: ScopeFilter,
) -> impl Iterator<Item = Scope<T>>
where
    T: TestRunLike,
    I: IntoIterator<Item = T>,
{
    let levels = scope.levels();
    let outer = &levels[..levels.len() - 1];
    let mut frontier: Vec<(Vec<String>, Vec<T>)> = vec![(Vec::new(), items.into_iter().collect())];
    for &level in outer {
        frontier = frontier
            .into_iter()
            .flat_map(|(path, members)| {
                collect_buckets(members, |item: &T| level.key(&item.test_name()), &path)
                    .into_iter()
                    .map(|bucket| {
                        let mut path = bucket.path;
                        path.push(bucket.key);
                        (path, bucket.members)
                    })
            })
            .collect();
    }
    frontier
        .into_iter()
        .flat_map(move |(path, members)| {
            collect_buckets(members, |item: &T| scope.key(&item.test_name()), &path)
        })
        .filter(move |bucket| filter.accepts(&bucket.key, &bucket.counters))
}

/// Groups `items` at `scope_name` level, keeping buckets accepted by the
/// filter fragment.
pub fn group_into<T, I>(scope_name: &str, items: I, filter_text: Option<&str>) -> Result<Vec<Scope<T>>>
where
    T: TestRunLike,
    I: IntoIterator<Item = T>,
{
    let scope = ScopeType::parse(scope_name)?;
    let filter = match filter_text {
        Some(text) => ScopeFilter::parse(text)?,
        None => ScopeFilter::default(),
    };
    match filter.scope_type {
        Some(requested) if requested != scope => {
            return Err(LocatorError::bad_filter(
                filter_text.unwrap_or_default(),
                format!(
                    "filter type '{}' does not match grouping scope '{}'",
                    requested.as_str(),
                    scope.as_str()
                ),
            ));
        }
        _ => {}
    }
    Ok(group_hierarchy(items, scope, filter).collect())
}

/// Test-scope query: a test-occurrence locator carrying a
/// `scope:(type:<level>,...)` dimension, given once. The scope fragment is
/// consumed, the remainder is evaluated by `finder`, and the matches are grouped.
pub fn test_scopes<T>(finder: &Finder<T>, locator_text: &str) -> Result<Vec<Scope<T>>>
where
    T: TestRunLike + 'static,
{
    let mut locator = Locator::parse(locator_text)?;
    let mut fragments = locator.get_multi_dimension(SCOPE_DIMENSION);
    if fragments.len() > 1 {
        let mut supported: Vec<String> =
            finder.supported_dimensions().iter().map(|name| name.to_string()).collect();
        supported.push(SCOPE_DIMENSION.to_string());
        return Err(LocatorError::UnusedDimensions {
            names: vec![SCOPE_DIMENSION.to_string()],
            supported,
        });
    }
    let Some(scope_text) = fragments.pop() else {
        return Err(LocatorError::MissingDimension {
            expected: vec![SCOPE_DIMENSION.to_string()],
        });
    };
    let filter = ScopeFilter::parse(&scope_text)?;
    let Some(scope) = filter.scope_type else {
        return Err(LocatorError::bad_filter(
            scope_text,
            format!("scope needs a type ({})", ScopeType::SUPPORTED.join(", ")),
        ));
    };
    let runs = finder.evaluate_with(&mut locator, None)?.entries;
    Ok(group_hierarchy(runs, scope, filter).collect())
}

fn collect_buckets<T, I, K>(items: I, mut key_fn: K, path: &[String]) -> Vec<Scope<T>>
where
    T: TestRunLike,
    I: IntoIterator<Item = T>,
    K: FnMut(&T) -> String,
{
    let mut buckets: IndexMap<String, Scope<T>> = IndexMap::new();
    for item in items {
        let key = key_fn(&item);
        let bucket = buckets.entry(key).or_insert_with_key(|key| Scope {
            key: key.clone(),
            path: path.to_vec(),
            members: Vec::new(),
            counters: ScopeCounters::default(),
        });
        bucket.counters.record(item.status(), item.is_muted());
        bucket.members.push(item);
    }
    buckets.into_values().collect()
}
