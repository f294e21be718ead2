use serde::{Deserialize, Serialize};

use crate::common::VariableAccession;
use crate::error::RecordError;

/// ESearch result for a dbGaP variable query
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Total number of variable records matching the term
    pub total_count: usize,
    /// WebEnv session identifier for history server
    pub webenv: Option<String>,
    /// Query key for history server
    pub query_key: Option<String>,
    /// How Entrez interpreted the term, e.g. `2[s_discriminator] AND phs000280[All Fields]`
    pub query_translation: Option<String>,
}

impl SearchResult {
    /// Get the history session if WebEnv and query_key are available
    pub fn history_session(&self) -> Option<HistorySession> {
        match (&self.webenv, &self.query_key) {
            (Some(webenv), Some(query_key)) => Some(HistorySession {
                webenv: webenv.clone(),
                query_key: query_key.clone(),
            }),
            _ => None,
        }
    }

    pub fn has_history(&self) -> bool {
        self.webenv.is_some() && self.query_key.is_some()
    }

    /// Start offsets of every page needed to cover `total_count` records
    ///
    /// ```
    /// use dbgap_client::gap::SearchResult;
    ///
    /// let result = SearchResult {
    ///     total_count: 600,
    ///     webenv: None,
    ///     query_key: None,
    ///     query_translation: None,
    /// };
    /// assert_eq!(result.page_offsets(500).collect::<Vec<_>>(), vec![0, 500]);
    /// ```
    pub fn page_offsets(&self, page_size: usize) -> impl Iterator<Item = usize> {
        (0..self.total_count).step_by(page_size.max(1))
    }
}

/// History server session used for paginated ESummary calls
///
/// WebEnv sessions typically expire after 1 hour of inactivity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySession {
    pub webenv: String,
    pub query_key: String,
}

/// A validated dbGaP variable summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRecord {
    /// Entrez UID of the document summary
    pub uid: String,
    /// `phv` accession from the second half of `d_variable_id`
    pub accession: VariableAccession,
    pub name: String,
    pub description: String,
}

impl VariableRecord {
    /// Tab-separated `name`, `accession`, `description`
    pub fn to_tsv_line(&self) -> String {
        format!("{}\t{}\t{}", self.name, self.accession, self.description)
    }
}

/// One ESummary page after validation
#[derive(Debug, Clone, Default)]
pub struct VariablePage {
    /// Offset the page was requested at
    pub start: usize,
    /// Number of UIDs the server listed for this page
    pub uid_count: usize,
    /// Records that passed validation, in server order
    pub records: Vec<VariableRecord>,
    /// Records rejected under [`ValidationPolicy::SkipAndLog`](crate::gap::ValidationPolicy)
    pub skipped: Vec<RecordError>,
}

impl VariablePage {
    pub fn is_empty(&self) -> bool {
        self.uid_count == 0
    }
}
