use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ESearchResult {
    pub esearchresult: ESearchData,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ESearchData {
    #[serde(default, rename = "ERROR")]
    pub error: Option<String>,
    #[serde(default)]
    pub count: Option<String>,
    #[serde(default)]
    pub retmax: Option<String>,
    #[serde(default)]
    pub retstart: Option<String>,
    #[serde(default)]
    pub idlist: Vec<String>,
    /// WebEnv session identifier for history server
    #[serde(default)]
    pub webenv: Option<String>,
    /// Query key for history server
    #[serde(default, rename = "querykey")]
    pub query_key: Option<String>,
    #[serde(default)]
    pub querytranslation: Option<String>,
}

/// ESummary JSON envelope.
///
/// `result` holds a `uids` array plus one object per UID keyed by the UID
/// itself, so it stays a `serde_json::Value` and is walked by the parser.
/// Failures come back either as a top-level `error` string or as an
/// `esummaryresult` list of messages, both with HTTP 200.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ESummaryResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub esummaryresult: Option<Vec<String>>,
}

// Field names inside a dbGaP variable document summary
pub(crate) const FIELD_OBJECT_TYPE: &str = "d_object_type";
pub(crate) const FIELD_VARIABLE_RESULTS: &str = "d_variable_results";
pub(crate) const FIELD_VARIABLE_ID: &str = "d_variable_id";
pub(crate) const FIELD_VARIABLE_NAME: &str = "d_variable_name";
pub(crate) const FIELD_VARIABLE_DESCRIPTION: &str = "d_variable_description";
