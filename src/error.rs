use std::path::PathBuf;

use thiserror::Error;

use crate::cache_store::StatKind;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("page {url} unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("page {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("fragment `{selector}` not found for {stat_kind} page {url}")]
    FragmentMissing {
        url: String,
        stat_kind: StatKind,
        selector: &'static str,
    },

    #[error("cache io at {}: {source}", path.display())]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("entity name `{entity}` cannot be used as a cache key")]
    InvalidEntity { entity: String },

    #[error("page loader unavailable: {0}")]
    Loader(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("no table found in fragment")]
    MissingTable,

    #[error("required column `{0}` missing from table header")]
    MissingColumn(&'static str),

    #[error("column `{column}` has non-numeric value `{raw}`")]
    NotNumeric { column: String, raw: String },

    #[error("row {row} is shorter than the header ({len} cells)")]
    ShortRow { row: usize, len: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported metric mode `{mode}`{}", chart_suffix(.chart))]
pub struct UnsupportedModeError {
    pub mode: String,
    pub chart: Option<&'static str>,
}

fn chart_suffix(chart: &Option<&'static str>) -> String {
    match chart {
        Some(chart) => format!(" for {chart} chart"),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum XgError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Mode(#[from] UnsupportedModeError),
}
