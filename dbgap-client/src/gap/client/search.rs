//! ESearch with history server support

use crate::error::{GapError, Result};
use crate::gap::models::SearchResult;
use crate::gap::query::{GAP_DB, variable_search_term};
use crate::gap::responses::ESearchResult;
use tracing::{debug, info, instrument};

use super::GapClient;

impl GapClient {
    /// Search dbGaP for every variable of a study, keeping results on the history server
    ///
    /// The returned [`SearchResult`] carries the total count and the
    /// WebEnv/query_key pair used by
    /// [`fetch_summary_page`](Self::fetch_summary_page).
    ///
    /// # Errors
    ///
    /// * `GapError::InvalidQuery` - If `study` is blank
    /// * `GapError::ApiError` - If NCBI reports an error in the response body
    /// * `GapError::InvalidResponse` - If the count is absent or not a number
    /// * `GapError::RequestError` - If the HTTP request fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dbgap_client::{ClientConfig, GapClient};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let client = GapClient::with_config(ClientConfig::new().with_email("me@example.org"))?;
    ///     let result = client.search_variables("phs000280").await?;
    ///     println!("{} variables", result.total_count);
    ///     Ok(())
    /// }
    /// ```
    #[instrument(skip(self), fields(study = %study))]
    pub async fn search_variables(&self, study: &str) -> Result<SearchResult> {
        let term = variable_search_term(study)?;
        self.search_with_history(&term).await
    }

    /// Run an arbitrary dbGaP ESearch term with `usehistory=y`
    ///
    /// Only the count and history handles are requested; UIDs are read later
    /// page by page through ESummary.
    #[instrument(skip(self), fields(term = %term))]
    pub async fn search_with_history(&self, term: &str) -> Result<SearchResult> {
        if term.trim().is_empty() {
            return Err(GapError::InvalidQuery(
                "search term cannot be empty".to_string(),
            ));
        }

        let params = [
            ("db", GAP_DB.to_string()),
            ("term", term.to_string()),
            ("usehistory", "y".to_string()),
            ("retmax", "0".to_string()),
            ("retmode", "json".to_string()),
        ];

        debug!("Making ESearch API request with history");
        let response = self.make_request("esearch.fcgi", &params).await?;
        let search_result: ESearchResult = response.json().await?;
        let data = search_result.esearchresult;

        // NCBI reports bad terms with HTTP 200 and an ERROR field
        if let Some(error_msg) = data.error {
            return Err(GapError::ApiError {
                status: 200,
                message: format!("NCBI ESearch API error: {}", error_msg),
            });
        }

        let total_count: usize = match data.count.as_deref() {
            Some(count) => count.parse().map_err(|_| {
                GapError::InvalidResponse(format!("ESearch count '{count}' is not a number"))
            })?,
            None => {
                return Err(GapError::InvalidResponse(
                    "ESearch response has no count".to_string(),
                ));
            }
        };

        info!(
            total_count,
            has_webenv = data.webenv.is_some(),
            query_translation = ?data.querytranslation,
            "Search with history completed"
        );

        Ok(SearchResult {
            total_count,
            webenv: data.webenv,
            query_key: data.query_key,
            query_translation: data.querytranslation,
        })
    }
}
