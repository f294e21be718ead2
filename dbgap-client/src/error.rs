use std::result;

use thiserror::Error;

/// Validation failures for a single ESummary variable record
///
/// Every variant carries the UID of the offending record so callers can
/// report it without holding on to the raw JSON.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The record is not a dbGaP variable
    #[error("UID {uid}: expected object type 'variable', found '{found}'")]
    UnexpectedObjectType { uid: String, found: String },

    /// ESummary returned an error object instead of a document
    #[error("UID {uid}: {message}")]
    SummaryError { uid: String, message: String },

    /// A required field is absent or not a string
    #[error("UID {uid}: missing field '{field}'")]
    MissingField { uid: String, field: &'static str },

    /// The compound variable id does not split into exactly two parts
    #[error("UID {uid}: variable id '{value}' does not have the form '<n>|phv...'")]
    MalformedVariableId { uid: String, value: String },

    /// The second half of the variable id is not a phv accession
    #[error("UID {uid}: '{value}' is not a phv accession")]
    InvalidAccession { uid: String, value: String },
}

impl RecordError {
    /// UID of the record that failed validation
    pub fn uid(&self) -> &str {
        match self {
            RecordError::UnexpectedObjectType { uid, .. }
            | RecordError::SummaryError { uid, .. }
            | RecordError::MissingField { uid, .. }
            | RecordError::MalformedVariableId { uid, .. }
            | RecordError::InvalidAccession { uid, .. } => uid,
        }
    }
}

/// Error types for dbGaP client operations
#[derive(Error, Debug)]
pub enum GapError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic API error with HTTP status code
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Invalid query structure or parameters
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The search response did not include a history session
    #[error("WebEnv/query_key not returned by ESearch")]
    WebEnvNotAvailable,

    /// The history server rejected the session or returned an error payload
    #[error("History session error: {0}")]
    HistorySessionError(String),

    /// A response is missing a required field or has an unexpected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A variable record failed validation
    #[error("Invalid variable record: {0}")]
    InvalidRecord(#[from] RecordError),

    /// Malformed phv accession outside of record parsing
    #[error("Invalid phv accession: {accession}")]
    InvalidAccession { accession: String },

    /// API rate limit exceeded
    #[error("API rate limit exceeded")]
    RateLimitExceeded,
}

pub type Result<T> = result::Result<T, GapError>;
