use thiserror::Error;

use crate::record::ReportId;

/// Per-report extraction failures. The run records the report and moves on.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("label {0:?} is not text followed by ':'")]
    MalformedLabel(String),

    #[error("report {id}: {labels} labels but {values} values")]
    FieldCountMismatch {
        id: ReportId,
        labels: usize,
        values: usize,
    },

    #[error("geometry marker present but no coordinate pair matched")]
    CoordinateParse,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Conditions that end a run early.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("listing page {page} unreachable: {source}")]
    ListingUnreachable {
        page: u32,
        #[source]
        source: FetchError,
    },
}
