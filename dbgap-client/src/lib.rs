//! # dbGaP Client
//!
//! An async client for the NCBI dbGaP database through E-utilities. It finds
//! every variable (phenotype) of a study, validates the document summaries
//! and selects variables whose description matches a keyword list.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dbgap_client::{ClientConfig, GapClient, KeywordFilter, ValidationPolicy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new().with_email("researcher@university.edu");
//!     let client = GapClient::with_config(config)?;
//!
//!     let (table, summary) = client
//!         .collect_phenotypes("phs000280", &KeywordFilter::default(), ValidationPolicy::FailFast)
//!         .await?;
//!
//!     println!("{} of {} variables matched", table.len(), summary.total_count);
//!     for line in table.lines() {
//!         println!("{line}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod config;
pub mod error;
pub mod gap;
pub mod phenotype;
pub mod rate_limit;

pub use common::VariableAccession;
pub use config::{ClientConfig, MAX_JSON_PAGE_SIZE};
pub use error::{GapError, RecordError, Result};
pub use gap::{GapClient, HistorySession, SearchResult, ValidationPolicy, VariableRecord};
pub use phenotype::{CollectionSummary, DEFAULT_KEYWORDS, KeywordFilter, PhenotypeTable};
pub use rate_limit::RateLimiter;
