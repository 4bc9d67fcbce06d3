use serde::Serialize;

/// Paging window requested by a locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub start: usize,
    /// `None` means unbounded.
    pub count: Option<usize>,
    pub lookup_limit: Option<usize>,
}

impl PageRequest {
    pub fn new(start: usize, count: Option<usize>) -> Self {
        Self {
            start,
            count,
            lookup_limit: None,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0, None)
    }

    /// Whether the `matched`-th match (1-based) lands inside the window.
    pub fn accepts(&self, matched: usize, taken: usize) -> bool {
        matched > self.start && self.count.is_none_or(|count| taken < count)
    }
}

/// One page of a filtered, ordered item sequence.
///
/// The result is a value, not a live cursor: paging continues by re-querying
/// with `start` set to `next_start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagedSearchResult<T> {
    pub entries: Vec<T>,
    pub start: usize,
    pub count: Option<usize>,
    /// Source items pulled before filtering.
    pub examined: usize,
    /// Items that passed every predicate, before slicing.
    pub matched: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_limit: Option<usize>,
    pub lookup_limit_reached: bool,
}

impl<T> PagedSearchResult<T> {
    pub fn new(entries: Vec<T>, page: PageRequest, examined: usize, matched: usize) -> Self {
        let end = page.start + entries.len();
        let lookup_limit_reached = page.lookup_limit.is_some_and(|limit| examined >= limit);
        Self {
            next_start: (matched > end).then_some(end),
            entries,
            start: page.start,
            count: page.count,
            examined,
            matched,
            lookup_limit: page.lookup_limit,
            lookup_limit_reached,
        }
    }

    /// A result holding exactly the given items, as produced by a direct lookup.
    pub fn of(entries: Vec<T>) -> Self {
        let len = entries.len();
        Self::new(entries, PageRequest::unbounded(), len, len)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.next_start.is_some()
    }
}

impl<T> IntoIterator for PagedSearchResult<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
