pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod finder;
pub mod finders;
pub mod locator;
pub mod logging;
pub mod model;
pub mod paged;
pub mod rpc;
pub mod scope;
pub mod util;

pub use error::{ErrorKind, LocatorError};
pub use finder::{Finder, FinderSettings, ItemSource};
pub use locator::Locator;
pub use paged::PagedSearchResult;
