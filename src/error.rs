//! Request-level failures surfaced to the caller.

use thiserror::Error;

/// Every way a report request can fail. Insufficient history and a missing
/// secondary quote are not errors; they flow through as `None`.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Required request input (the symbol) is absent or blank.
    #[error("{0}")]
    MissingInput(String),

    /// The primary data source has no credentials configured.
    #[error("{0}")]
    Misconfigured(String),

    /// The primary data source could not deliver a usable series or quote.
    #[error("{0}")]
    DataUnavailable(String),
}

impl ReportError {
    pub fn data_unavailable(err: impl std::fmt::Display) -> Self {
        Self::DataUnavailable(err.to_string())
    }
}
