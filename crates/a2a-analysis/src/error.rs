//! Error types for the analysis engines

use thiserror::Error;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors raised by the engines and the collaborators feeding them
///
/// Every variant is converted to an `ANALYSIS_FAILED` error envelope at the
/// adapter boundary; none of them crosses the protocol layer as a panic.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The input series is shorter than the minimum lookback, or a required
    /// series (e.g. a benchmark) is absent
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The input violates a domain constraint (empty portfolio, negative
    /// quantity, unsupported analysis type)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A collaborator (market data, event feed, store) failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Indicator computation error
    #[error("Indicator error: {0}")]
    Indicator(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for AnalysisError {
    fn from(err: anyhow::Error) -> Self {
        AnalysisError::Other(err.to_string())
    }
}
