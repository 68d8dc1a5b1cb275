pub mod browser;
pub mod cache_store;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod html_table;
pub mod match_calendar;
pub mod metric;
pub mod normalize;
pub mod xg_fetch;
pub mod xg_value;

pub mod logging;

pub use cache_store::{CacheKey, CacheStore, StatKind};
pub use error::{FetchError, ParseError, UnsupportedModeError, XgError};
pub use metric::MetricMode;
pub use xg_fetch::XgScraper;
