//! Keyword selection of dbGaP variables and sorted TSV output
//!
//! [`GapClient::collect_phenotypes`] runs the whole search, page walk and
//! filter for one study and returns a [`PhenotypeTable`] keyed by `phv`
//! accession.

use std::collections::BTreeMap;
use std::io::{self, Write};

use tracing::{info, instrument, warn};

use crate::common::VariableAccession;
use crate::error::Result;
use crate::gap::{GapClient, ValidationPolicy, VariableRecord};

/// Substrings marking a smoking or tobacco related description
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "nicotin", "smoke", "smoki", "cigar", "vape", "vapi", "tobacco", "hookah",
];

/// Case-insensitive substring filter over variable descriptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    /// Build a filter from custom keywords
    ///
    /// Keywords are lower-cased; blank ones are dropped. A filter with no
    /// keywords matches nothing.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True when the description contains any keyword, ignoring case
    ///
    /// ```
    /// use dbgap_client::KeywordFilter;
    ///
    /// let filter = KeywordFilter::default();
    /// assert!(filter.matches("Current cigarette smoking status"));
    /// assert!(filter.matches("EVER SMOKED"));
    /// assert!(!filter.matches("Body mass index"));
    /// ```
    pub fn matches(&self, description: &str) -> bool {
        let description = description.to_lowercase();
        self.keywords.iter().any(|k| description.contains(k.as_str()))
    }
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

/// Selected variables keyed by accession, iterated in sorted order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhenotypeTable {
    lines: BTreeMap<VariableAccession, String>,
    replaced: usize,
}

impl PhenotypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the record's output line, replacing any earlier line for the same accession
    ///
    /// Returns the replaced line. Replacing with a different line is logged.
    pub fn insert(&mut self, record: &VariableRecord) -> Option<String> {
        let line = record.to_tsv_line();
        let previous = self.lines.insert(record.accession.clone(), line);

        if let Some(old) = &previous {
            self.replaced += 1;
            if old != &self.lines[&record.accession] {
                warn!(
                    accession = %record.accession,
                    uid = %record.uid,
                    "Duplicate accession with different content, keeping the later record"
                );
            }
        }

        previous
    }

    /// Insert the records accepted by `filter`, returning how many matched
    pub fn extend_matching<'a, I>(&mut self, records: I, filter: &KeywordFilter) -> usize
    where
        I: IntoIterator<Item = &'a VariableRecord>,
    {
        let mut matched = 0;
        for record in records {
            if filter.matches(&record.description) {
                self.insert(record);
                matched += 1;
            }
        }
        matched
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of inserts that overwrote an existing accession
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    pub fn get(&self, accession: &str) -> Option<&str> {
        self.lines.get(accession).map(String::as_str)
    }

    /// Output lines in lexicographic accession order
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.values().map(String::as_str)
    }

    /// Write every line followed by `\n`
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for line in self.lines() {
            writeln!(writer, "{line}")?;
        }
        writer.flush()
    }
}

/// Statistics from one [`GapClient::collect_phenotypes`] run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    pub total_count: usize,
    pub pages: usize,
    pub records: usize,
    pub skipped: usize,
    pub matched: usize,
}

impl GapClient {
    /// Search a study's variables and keep those whose description matches `filter`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dbgap_client::{ClientConfig, GapClient, KeywordFilter, gap::ValidationPolicy};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let client = GapClient::with_config(ClientConfig::new().with_email("me@example.org"))?;
    ///     let (table, _) = client
    ///         .collect_phenotypes("phs000280", &KeywordFilter::default(), ValidationPolicy::FailFast)
    ///         .await?;
    ///     table.write_to(std::io::stdout().lock())?;
    ///     Ok(())
    /// }
    /// ```
    #[instrument(skip(self, filter), fields(study = %study))]
    pub async fn collect_phenotypes(
        &self,
        study: &str,
        filter: &KeywordFilter,
        policy: ValidationPolicy,
    ) -> Result<(PhenotypeTable, CollectionSummary)> {
        let search = self.search_variables(study).await?;

        let mut table = PhenotypeTable::new();

        let mut records = 0;
        let mut skipped = 0;
        let mut matched = 0;
        let pages = self
            .for_each_variable_page(&search, policy, |page| {
                records += page.records.len();
                skipped += page.skipped.len();
                matched += table.extend_matching(&page.records, filter);
            })
            .await?;

        let summary = CollectionSummary {
            total_count: search.total_count,
            pages,
            records,
            skipped,
            matched,
        };

        info!(
            total = summary.total_count,
            pages = summary.pages,
            matched = summary.matched,
            kept = table.len(),
            skipped = summary.skipped,
            "Phenotype collection completed"
        );

        Ok((table, summary))
    }
}
