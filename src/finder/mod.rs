//! Generic locator evaluation over an ordered item source.
//!
//! A [`Finder`] owns a flat table of [`DimensionSpec`]s. Evaluation builds one
//! predicate per dimension present in the locator, in table order (not in the
//! order the dimensions appear in the locator), so cheap equality checks run
//! before filters that recurse into other finders. The composed predicate is
//! then streamed over the source once and the matches are sliced by
//! `start`/`count`.

pub mod dimension;

pub use dimension::{Comparison, DimensionSpec, Predicate, ValueCondition, predicate};

use crate::error::{LocatorError, Result};
use crate::locator::Locator;
use crate::paged::{PageRequest, PagedSearchResult};
use std::fmt;
use std::sync::Arc;

pub const START: &str = "start";
pub const COUNT: &str = "count";
pub const LOOKUP_LIMIT: &str = "lookupLimit";

/// Ordered source of items a finder filters. Retrieval, ordering and
/// consistency are owned by the implementor.
pub trait ItemSource<T>: Send + Sync {
    fn items(&self) -> Box<dyn Iterator<Item = T> + '_>;

    fn find_by_key(&self, key: &str, key_of: fn(&T) -> String) -> Option<T> {
        self.items().find(|item| key_of(item) == key)
    }
}

impl<T: Clone + Send + Sync> ItemSource<T> for Vec<T> {
    fn items(&self) -> Box<dyn Iterator<Item = T> + '_> {
        Box::new(self.iter().cloned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinderSettings {
    /// Used when a collection locator has no `count`; `None` means unbounded.
    pub default_page_size: Option<usize>,
    pub lookup_limit: Option<usize>,
    /// Reject locators that still hold unconsumed dimensions.
    pub strict: bool,
}

impl Default for FinderSettings {
    fn default() -> Self {
        Self {
            default_page_size: Some(100),
            lookup_limit: None,
            strict: true,
        }
    }
}

pub struct Finder<T> {
    name: &'static str,
    default_dimension: &'static str,
    source: Arc<dyn ItemSource<T>>,
    key_of: fn(&T) -> String,
    dimensions: Vec<DimensionSpec<T>>,
    required_any: Vec<&'static str>,
    default_locator: Option<String>,
    settings: FinderSettings,
}

impl<T> fmt::Debug for Finder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finder")
            .field("name", &self.name)
            .field("dimensions", &self.dimensions)
            .field("settings", &self.settings)
            .finish()
    }
}

impl<T: 'static> Finder<T> {
    pub fn builder(
        name: &'static str,
        source: Arc<dyn ItemSource<T>>,
        key_of: fn(&T) -> String,
    ) -> FinderBuilder<T> {
        FinderBuilder {
            finder: Finder {
                name,
                default_dimension: "id",
                source,
                key_of,
                dimensions: Vec::new(),
                required_any: Vec::new(),
                default_locator: None,
                settings: FinderSettings::default(),
            },
        }
    }

    /// Every dimension name this finder consumes, in evaluation order.
    pub fn supported_dimensions(&self) -> Vec<&'static str> {
        let mut names = vec![self.default_dimension];
        names.extend(self.dimensions.iter().map(|spec| spec.name));
        names.extend([START, COUNT, LOOKUP_LIMIT]);
        names
    }

    pub fn describe(&self) -> Vec<(&'static str, &'static str)> {
        let mut docs = vec![(self.default_dimension, "primary identifier")];
        docs.extend(self.dimensions.iter().map(|spec| (spec.name, spec.description)));
        docs.push((START, "offset of the first returned match"));
        docs.push((COUNT, "page size, -1 for unbounded"));
        docs.push((LOOKUP_LIMIT, "maximum number of source items examined, 0 for unbounded"));
        docs
    }

    /// Resolves a locator that must name exactly one item.
    pub fn get_item(&self, text: &str) -> Result<T> {
        let mut locator = Locator::parse(text)?;
        if let Some(key) = self.direct_key(&mut locator) {
            return self
                .source
                .find_by_key(&key, self.key_of)
                .ok_or_else(|| LocatorError::NotFound {
                    locator: text.to_string(),
                });
        }
        let mut page = self.evaluate_with(&mut locator, None)?;
        match page.entries.len() {
            0 => Err(LocatorError::NotFound {
                locator: text.to_string(),
            }),
            1 => Ok(page.entries.remove(0)),
            _ => Err(LocatorError::Ambiguous {
                locator: text.to_string(),
                match_count: page.matched,
                dimensions: locator.used_dimensions(),
            }),
        }
    }

    /// Evaluates a collection locator; `None` falls back to the finder's
    /// default locator, then to "everything, first page".
    pub fn get_items(&self, text: Option<&str>) -> Result<PagedSearchResult<T>> {
        let mut locator = match text.or(self.default_locator.as_deref()) {
            Some(text) => Locator::parse(text)?,
            None => Locator::empty(),
        };
        self.evaluate(&mut locator)
    }

    /// Evaluates an already parsed (and possibly stripped) locator.
    pub fn evaluate(&self, locator: &mut Locator) -> Result<PagedSearchResult<T>> {
        self.evaluate_with(locator, self.settings.default_page_size)
    }

    pub fn evaluate_with(
        &self,
        locator: &mut Locator,
        default_count: Option<usize>,
    ) -> Result<PagedSearchResult<T>> {
        if let Some(key) = locator.get_single_value() {
            let entries: Vec<T> = self.source.find_by_key(&key, self.key_of).into_iter().collect();
            return Ok(PagedSearchResult::of(entries));
        }

        let page = self.page_request(locator, default_count)?;
        self.check_required(locator)?;
        let predicates = self.build_predicates(locator)?;
        if self.settings.strict {
            locator.assert_consumed_against(&self.supported_dimensions())?;
        }

        let items = self.source.items();
        let items: Box<dyn Iterator<Item = T> + '_> = match page.lookup_limit {
            Some(limit) => Box::new(items.take(limit)),
            None => items,
        };
        let mut entries = Vec::new();
        let mut examined = 0usize;
        let mut matched = 0usize;
        for item in items {
            examined += 1;
            if !predicates.iter().all(|check| check(&item)) {
                continue;
            }
            matched += 1;
            if page.accepts(matched, entries.len()) {
                entries.push(item);
            }
        }

        tracing::debug!(
            finder = self.name,
            predicates = predicates.len(),
            examined,
            matched,
            returned = entries.len(),
            "locator evaluated"
        );
        Ok(PagedSearchResult::new(entries, page, examined, matched))
    }

    /// A single value, or a locator made of the default dimension alone, is
    /// resolved by key without scanning.
    fn direct_key(&self, locator: &mut Locator) -> Option<String> {
        if locator.is_single_value() {
            return locator.get_single_value();
        }
        let only_default = matches!(
            locator.dimensions(),
            [dimension] if dimension.name == self.default_dimension
        );
        if only_default {
            locator.get_dimension(self.default_dimension)
        } else {
            None
        }
    }

    fn page_request(
        &self,
        locator: &mut Locator,
        default_count: Option<usize>,
    ) -> Result<PageRequest> {
        let start = locator.get_usize(START)?.unwrap_or(0);
        let count = match locator.get_dimension(COUNT) {
            Some(raw) if raw == "-1" => None,
            Some(raw) => Some(raw.parse::<usize>().map_err(|_| {
                LocatorError::bad_value(COUNT, raw.as_str(), "expected a non-negative integer or -1")
            })?),
            None => default_count,
        };
        let lookup_limit = match locator.get_usize(LOOKUP_LIMIT)? {
            Some(0) => None,
            Some(limit) => Some(limit),
            None => self.settings.lookup_limit,
        };
        Ok(PageRequest {
            start,
            count,
            lookup_limit,
        })
    }

    fn check_required(&self, locator: &Locator) -> Result<()> {
        if self.required_any.is_empty() || locator.is_present(self.default_dimension) {
            return Ok(());
        }
        if self.required_any.iter().any(|name| locator.is_present(name)) {
            return Ok(());
        }
        Err(LocatorError::MissingDimension {
            expected: self.required_any.iter().map(|name| name.to_string()).collect(),
        })
    }

    fn build_predicates(&self, locator: &mut Locator) -> Result<Vec<Predicate<T>>> {
        let mut predicates: Vec<Predicate<T>> = Vec::new();
        if let Some(key) = locator.get_dimension(self.default_dimension) {
            let key_of = self.key_of;
            predicates.push(Box::new(move |item: &T| key_of(item) == key));
        }
        for spec in &self.dimensions {
            let values = if spec.multi {
                locator.get_multi_dimension(spec.name)
            } else {
                locator.get_dimension(spec.name).into_iter().collect()
            };
            for raw in values {
                if let Some(check) = spec.build(&raw)? {
                    predicates.push(check);
                }
            }
        }
        Ok(predicates)
    }
}

pub struct FinderBuilder<T> {
    finder: Finder<T>,
}

impl<T: 'static> FinderBuilder<T> {
    pub fn dimension<F>(mut self, name: &'static str, description: &'static str, builder: F) -> Self
    where
        F: Fn(&str) -> Result<Option<Predicate<T>>> + Send + Sync + 'static,
    {
        self.finder
            .dimensions
            .push(DimensionSpec::new(name, description, builder));
        self
    }

    pub fn multi_dimension<F>(
        mut self,
        name: &'static str,
        description: &'static str,
        builder: F,
    ) -> Self
    where
        F: Fn(&str) -> Result<Option<Predicate<T>>> + Send + Sync + 'static,
    {
        self.finder
            .dimensions
            .push(DimensionSpec::new(name, description, builder).multi());
        self
    }

    pub fn require_any(mut self, names: &[&'static str]) -> Self {
        self.finder.required_any = names.to_vec();
        self
    }

    pub fn default_locator(mut self, text: impl Into<String>) -> Self {
        self.finder.default_locator = Some(text.into());
        self
    }

    pub fn settings(mut self, settings: FinderSettings) -> Self {
        self.finder.settings = settings;
        self
    }

    pub fn build(self) -> Finder<T> {
        self.finder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        color: &'static str,
        size: u32,
    }

    fn items() -> Vec<Item> {
        let colors = ["red", "blue", "red", "green", "red", "blue"];
        colors
            .iter()
            .enumerate()
            .map(|(idx, color)| Item {
                id: idx as u32 + 1,
                color,
                size: (idx as u32 + 1) * 10,
            })
            .collect()
    }

    fn finder(settings: FinderSettings) -> Finder<Item> {
        Finder::<Item>::builder("items", Arc::new(items()), |item: &Item| item.id.to_string())
            .dimension("color", "item color", |raw| {
                let raw = raw.to_string();
                Ok(predicate(move |item: &Item| item.color == raw))
            })
            .dimension("size", "size condition", |raw| {
                Ok(ValueCondition::parse("size", raw)?
                    .and_then(|condition| predicate(move |item: &Item| condition.matches(item.size as i64))))
            })
            .multi_dimension("not", "excluded id", |raw| {
                let raw = raw.to_string();
                Ok(predicate(move |item: &Item| item.id.to_string() != raw))
            })
            .settings(settings)
            .build()
    }

    fn ids(result: &PagedSearchResult<Item>) -> Vec<u32> {
        result.entries.iter().map(|item| item.id).collect()
    }

    #[test]
    fn filters_and_pages_in_source_order() {
        let finder = finder(FinderSettings::default());
        let result = finder.get_items(Some("color:red,start:1,count:1")).unwrap();
        assert_eq!(ids(&result), vec![3]);
        assert_eq!(result.matched, 3);
        assert_eq!(result.examined, 6);
        assert_eq!(result.next_start, Some(2));
    }

    #[test]
    fn missing_count_uses_default_page_size() {
        let finder = finder(FinderSettings {
            default_page_size: Some(2),
            ..FinderSettings::default()
        });
        let result = finder.get_items(None).unwrap();
        assert_eq!(ids(&result), vec![1, 2]);
        assert_eq!(result.count, Some(2));
        let all = finder.get_items(Some("count:-1")).unwrap();
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn multi_valued_dimensions_must_all_match() {
        let finder = finder(FinderSettings::default());
        let result = finder.get_items(Some("not:1,not:3,color:red")).unwrap();
        assert_eq!(ids(&result), vec![5]);
    }

    #[test]
    fn unknown_dimensions_fail_in_strict_mode() {
        let finder = finder(FinderSettings::default());
        let err = finder.get_items(Some("color:red,bogus:1,weird:2")).unwrap_err();
        match err {
            LocatorError::UnusedDimensions { names, supported } => {
                assert_eq!(names, vec!["bogus".to_string(), "weird".to_string()]);
                assert!(supported.contains(&"color".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let lenient = finder_with_strict(false);
        assert_eq!(lenient.get_items(Some("color:red,bogus:1")).unwrap().len(), 3);
    }

    fn finder_with_strict(strict: bool) -> Finder<Item> {
        finder(FinderSettings {
            strict,
            ..FinderSettings::default()
        })
    }

    #[test]
    fn single_item_lookup() {
        let finder = finder(FinderSettings::default());
        assert_eq!(finder.get_item("4").unwrap().color, "green");
        assert_eq!(finder.get_item("id:4").unwrap(), finder.get_item("4").unwrap());
        assert_eq!(finder.get_item("color:green").unwrap().id, 4);
        assert!(matches!(
            finder.get_item("99"),
            Err(LocatorError::NotFound { .. })
        ));
        match finder.get_item("color:red") {
            Err(LocatorError::Ambiguous {
                match_count,
                dimensions,
                ..
            }) => {
                assert_eq!(match_count, 3);
                assert_eq!(dimensions, vec!["color".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(finder.get_item("color:red,count:1").unwrap().id, 1);
    }

    #[test]
    fn bad_values_are_rejected() {
        let finder = finder(FinderSettings::default());
        assert!(matches!(
            finder.get_items(Some("count:many")),
            Err(LocatorError::BadValue { .. })
        ));
        assert!(matches!(
            finder.get_items(Some("size:(condition:huge,value:1)")),
            Err(LocatorError::BadValue { .. })
        ));
    }

    #[test]
    fn lookup_limit_bounds_examined_items() {
        let finder = finder(FinderSettings::default());
        let result = finder.get_items(Some("color:red,lookupLimit:3")).unwrap();
        assert_eq!(ids(&result), vec![1, 3]);
        assert_eq!(result.examined, 3);
        assert!(result.lookup_limit_reached);
    }

    #[test]
    fn zero_lookup_limit_lifts_the_bound() {
        let finder = finder(FinderSettings {
            lookup_limit: Some(2),
            ..FinderSettings::default()
        });
        assert_eq!(finder.get_items(Some("color:red")).unwrap().examined, 2);
        let result = finder.get_items(Some("color:red,lookupLimit:0")).unwrap();
        assert_eq!(ids(&result), vec![1, 3, 5]);
        assert_eq!(result.examined, 6);
        assert!(!result.lookup_limit_reached);
        assert_eq!(result.lookup_limit, None);
    }

    #[test]
    fn required_dimensions_are_enforced() {
        let finder = Finder::<Item>::builder("items", Arc::new(items()), |item: &Item| item.id.to_string())
            .dimension("color", "item color", |raw| {
                let raw = raw.to_string();
                Ok(predicate(move |item: &Item| item.color == raw))
            })
            .require_any(&["color"])
            .build();
        assert_eq!(
            finder.get_items(Some("count:5")).unwrap_err(),
            LocatorError::MissingDimension {
                expected: vec!["color".to_string()]
            }
        );
        assert!(finder.get_items(Some("id:2,count:5")).is_ok());
    }

    #[test]
    fn predicates_run_in_declared_order() {
        use std::sync::Mutex;
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::clone(&order);
        let second = Arc::clone(&order);
        let finder = Finder::<Item>::builder("items", Arc::new(items()), |item: &Item| item.id.to_string())
            .dimension("cheap", "runs first", move |_| {
                first.lock().unwrap().push("cheap");
                Ok(None)
            })
            .dimension("costly", "runs second", move |_| {
                second.lock().unwrap().push("costly");
                Ok(None)
            })
            .build();
        finder.get_items(Some("costly:x,cheap:y")).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["cheap", "costly"]);
    }
}
