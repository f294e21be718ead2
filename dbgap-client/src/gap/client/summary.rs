//! ESummary paging over a history session

use crate::config::MAX_JSON_PAGE_SIZE;
use crate::error::{GapError, Result};
use crate::gap::models::{HistorySession, SearchResult, VariablePage, VariableRecord};
use crate::gap::parser::{ValidationPolicy, parse_summary_page};
use crate::gap::query::GAP_DB;
use tracing::{debug, info, instrument};

use super::GapClient;

impl GapClient {
    /// Fetch one page of variable summaries from the history server
    ///
    /// `max` is capped at 500, the most ESummary returns in JSON mode.
    ///
    /// # Arguments
    ///
    /// * `session` - WebEnv/query_key from [`search_variables`](Self::search_variables)
    /// * `start` - 0-based offset into the result set
    /// * `max` - Number of records to request
    /// * `policy` - How to treat records that fail validation
    #[instrument(skip(self, session), fields(start = start, max = max))]
    pub async fn fetch_summary_page(
        &self,
        session: &HistorySession,
        start: usize,
        max: usize,
        policy: ValidationPolicy,
    ) -> Result<VariablePage> {
        let max = max.clamp(1, MAX_JSON_PAGE_SIZE);

        let params = [
            ("db", GAP_DB.to_string()),
            ("query_key", session.query_key.clone()),
            ("WebEnv", session.webenv.clone()),
            ("retstart", start.to_string()),
            ("retmax", max.to_string()),
            ("retmode", "json".to_string()),
        ];

        debug!("Making ESummary API request from history");
        let response = self.make_request("esummary.fcgi", &params).await?;
        let json_text = response.text().await?;

        let page = parse_summary_page(&json_text, start, policy)?;

        info!(
            start,
            uids = page.uid_count,
            accepted = page.records.len(),
            skipped = page.skipped.len(),
            "Fetched ESummary page"
        );

        Ok(page)
    }

    /// Fetch every variable of a search, one page at a time
    ///
    /// Pages are requested at offsets `0, page_size, 2 * page_size, ...`
    /// while the offset is below `search.total_count`, with the page size
    /// taken from the client configuration. Every page is handed to
    /// `on_page` before the next request is made. The first failure aborts
    /// the whole walk.
    #[instrument(skip(self, search, on_page), fields(total = search.total_count))]
    pub async fn for_each_variable_page<F>(
        &self,
        search: &SearchResult,
        policy: ValidationPolicy,
        mut on_page: F,
    ) -> Result<usize>
    where
        F: FnMut(VariablePage),
    {
        if search.total_count == 0 {
            debug!("Search returned no records");
            return Ok(0);
        }

        let session = search
            .history_session()
            .ok_or(GapError::WebEnvNotAvailable)?;
        let page_size = self.config().effective_page_size();

        let mut pages = 0;
        for start in search.page_offsets(page_size) {
            let page = self
                .fetch_summary_page(&session, start, page_size, policy)
                .await?;
            pages += 1;
            on_page(page);
        }

        Ok(pages)
    }

    /// Search a study and collect all of its validated variable records
    pub async fn search_and_fetch_variables(
        &self,
        study: &str,
        policy: ValidationPolicy,
    ) -> Result<Vec<VariableRecord>> {
        let search = self.search_variables(study).await?;

        let mut records = Vec::new();
        self.for_each_variable_page(&search, policy, |page| records.extend(page.records))
            .await?;

        Ok(records)
    }
}
