//! Validated dbGaP accession types

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GapError, Result};

/// Prefix shared by all dbGaP variable accessions
pub const VARIABLE_PREFIX: &str = "phv";

/// A dbGaP variable accession such as `phv00012345` or `phv00012345.v1.p1`
///
/// Only the `phv` prefix is enforced. dbGaP has changed the version suffix
/// format over time, so the remainder is kept verbatim.
///
/// ```
/// use dbgap_client::common::VariableAccession;
///
/// let accession = VariableAccession::parse("phv00012345").unwrap();
/// assert_eq!(accession.as_str(), "phv00012345");
///
/// assert!(VariableAccession::parse("phs000280").is_err());
/// assert!(VariableAccession::parse("ph").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariableAccession(String);

impl VariableAccession {
    /// Parse an accession, rejecting anything without the `phv` prefix
    ///
    /// Surrounding whitespace is not stripped: the accession is taken from a
    /// server-issued compound id and must be used as-is for output.
    pub fn parse(s: &str) -> Result<Self> {
        if s.starts_with(VARIABLE_PREFIX) {
            Ok(Self(s.to_string()))
        } else {
            Err(GapError::InvalidAccession {
                accession: s.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for VariableAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VariableAccession {
    type Err = GapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VariableAccession {
    type Error = GapError;

    fn try_from(value: String) -> Result<Self> {
        if value.starts_with(VARIABLE_PREFIX) {
            Ok(Self(value))
        } else {
            Err(GapError::InvalidAccession { accession: value })
        }
    }
}

impl From<VariableAccession> for String {
    fn from(accession: VariableAccession) -> Self {
        accession.0
    }
}

impl Borrow<str> for VariableAccession {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for VariableAccession {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
