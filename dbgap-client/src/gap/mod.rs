//! dbGaP client for searching variables and paging through their summaries
//!
//! The client functionality is split across focused modules under [`client`]:
//! - `client/mod.rs` - Core client struct, constructors and request plumbing
//! - `client/search` - ESearch with history server support
//! - `client/summary` - ESummary paging over a history session

pub mod client;
pub mod models;
pub mod parser;
pub mod query;
pub(crate) mod responses;

pub use client::GapClient;
pub use models::{HistorySession, SearchResult, VariablePage, VariableRecord};
pub use parser::{ValidationPolicy, parse_summary_page, parse_variable_record};
pub use query::{GAP_DB, VARIABLE_DISCRIMINATOR, variable_search_term};
