//! Entrez search terms for the dbGaP database

use crate::error::{GapError, Result};

/// Entrez database name for dbGaP
pub const GAP_DB: &str = "gap";

/// Restricts a dbGaP search to variable records (`s_discriminator` 2)
pub const VARIABLE_DISCRIMINATOR: &str = "2[s_discriminator]";

/// Build the ESearch term selecting every variable of a study
///
/// The study identifier is used verbatim, so versioned accessions such as
/// `phs000280.v8.p1` pass through unchanged. Blank input is rejected.
///
/// ```
/// use dbgap_client::gap::variable_search_term;
///
/// assert_eq!(
///     variable_search_term("phs000280").unwrap(),
///     "2[s_discriminator] AND phs000280"
/// );
/// assert!(variable_search_term("   ").is_err());
/// ```
pub fn variable_search_term(study: &str) -> Result<String> {
    if study.trim().is_empty() {
        return Err(GapError::InvalidQuery(
            "study identifier cannot be empty".to_string(),
        ));
    }

    Ok(format!("{VARIABLE_DISCRIMINATOR} AND {study}"))
}
