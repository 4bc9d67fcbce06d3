// Configuration for locq
// Reads from environment variables with sensible defaults

use crate::finder::FinderSettings;
use std::env;
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Page size for collection locators without `count` (LOCQ_DEFAULT_PAGE_SIZE)
    pub default_page_size: usize,

    /// Maximum number of source items examined per query (LOCQ_LOOKUP_LIMIT)
    pub lookup_limit: Option<usize>,

    /// Reject locators with unknown dimensions (LOCQ_STRICT_LOCATORS)
    pub strict_locators: bool,

    /// Fallback log filter when RUST_LOG is unset (LOCQ_LOG)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_page_size: 100,
            lookup_limit: None,
            strict_locators: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value if set.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        override_from(&lookup, "LOCQ_DEFAULT_PAGE_SIZE", &mut config.default_page_size);
        if let Some(val) = lookup("LOCQ_LOOKUP_LIMIT") {
            match val.trim().parse::<usize>() {
                Ok(0) => config.lookup_limit = None,
                Ok(parsed) => config.lookup_limit = Some(parsed),
                Err(_) => tracing::warn!(
                    variable = "LOCQ_LOOKUP_LIMIT",
                    value = %val,
                    "invalid value, lookup limit stays unset"
                ),
            }
        }
        if let Some(val) = lookup("LOCQ_STRICT_LOCATORS") {
            match val.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.strict_locators = true,
                "0" | "false" | "no" | "off" => config.strict_locators = false,
                _ => tracing::warn!(
                    variable = "LOCQ_STRICT_LOCATORS",
                    value = %val,
                    default = config.strict_locators,
                    "invalid value, using default"
                ),
            }
        }
        if let Some(val) = lookup("LOCQ_LOG") {
            if !val.trim().is_empty() {
                config.log_level = val.trim().to_string();
            }
        }

        config
    }

    pub fn finder_settings(&self) -> FinderSettings {
        FinderSettings {
            default_page_size: Some(self.default_page_size),
            lookup_limit: self.lookup_limit,
            strict: self.strict_locators,
        }
    }
}

fn override_from<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, target: &mut T)
where
    T: FromStr + std::fmt::Display,
{
    let Some(val) = lookup(name) else {
        return;
    };
    match val.trim().parse() {
        Ok(parsed) => *target = parsed,
        Err(_) => tracing::warn!(
            variable = name,
            value = %val,
            default = %target,
            "invalid value, using default"
        ),
    }
}
