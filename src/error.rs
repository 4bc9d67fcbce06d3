use thiserror::Error;

/// Errors raised while parsing or evaluating a locator.
///
/// Every variant is deterministic for a given input: callers fix the locator
/// text, they never retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    /// Syntactic problem: unbalanced parentheses, empty names, stray separators.
    #[error("malformed locator: {message} (at '{fragment}')")]
    Malformed { message: String, fragment: String },

    /// The locator parsed but still holds dimensions nobody consumed.
    #[error(
        "unknown locator {}: {}{}",
        plural(names.len(), "dimension", "dimensions"),
        names.join(", "),
        supported_suffix(supported)
    )]
    UnusedDimensions {
        names: Vec<String>,
        supported: Vec<String>,
    },

    /// A dimension value could not be converted to its expected type.
    #[error("invalid value '{value}' for dimension '{dimension}': {reason}")]
    BadValue {
        dimension: String,
        value: String,
        reason: String,
    },

    /// A collection query lacked every one of the dimensions it needs.
    #[error("locator must specify one of: {}", expected.join(", "))]
    MissingDimension { expected: Vec<String> },

    #[error("nothing is found by locator '{locator}'")]
    NotFound { locator: String },

    #[error(
        "locator '{locator}' matches {match_count} items, expected one (dimensions used: {})",
        dimensions.join(", ")
    )]
    Ambiguous {
        locator: String,
        match_count: usize,
        dimensions: Vec<String>,
    },

    #[error("unsupported scope '{scope}' (supported: {})", supported.join(", "))]
    UnsupportedScope {
        scope: String,
        supported: Vec<String>,
    },

    #[error("bad scope filter '{filter}': {message}")]
    BadFilter { filter: String, message: String },
}

/// Transport-neutral classification of a [`LocatorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NotFound => "not_found",
        }
    }
}

impl LocatorError {
    pub fn malformed(message: impl Into<String>, fragment: impl Into<String>) -> Self {
        LocatorError::Malformed {
            message: message.into(),
            fragment: fragment.into(),
        }
    }

    pub fn bad_value(
        dimension: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        LocatorError::BadValue {
            dimension: dimension.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn bad_filter(filter: impl Into<String>, message: impl Into<String>) -> Self {
        LocatorError::BadFilter {
            filter: filter.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LocatorError::NotFound { .. } => ErrorKind::NotFound,
            _ => ErrorKind::BadRequest,
        }
    }
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

fn supported_suffix(supported: &[String]) -> String {
    if supported.is_empty() {
        String::new()
    } else {
        format!(" (supported: {})", supported.join(", "))
    }
}

pub type Result<T> = std::result::Result<T, LocatorError>;
