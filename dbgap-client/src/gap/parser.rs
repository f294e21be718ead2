//! Validation of dbGaP ESummary JSON into [`VariableRecord`]s

use serde_json::Value;
use tracing::{debug, warn};

use crate::common::VariableAccession;
use crate::error::{GapError, RecordError, Result};
use crate::gap::models::{VariablePage, VariableRecord};
use crate::gap::responses::{
    ESummaryResponse, FIELD_OBJECT_TYPE, FIELD_VARIABLE_DESCRIPTION, FIELD_VARIABLE_ID,
    FIELD_VARIABLE_NAME, FIELD_VARIABLE_RESULTS,
};

/// Object type of a dbGaP variable document
pub const VARIABLE_OBJECT_TYPE: &str = "variable";

/// Separator inside `d_variable_id`, e.g. `2|phv00012345`
pub const VARIABLE_ID_SEPARATOR: char = '|';

/// What to do with a record that fails validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Abort on the first invalid record
    #[default]
    FailFast,
    /// Log the record at `warn` level and continue
    SkipAndLog,
}

/// Validate one document summary and extract the variable fields
///
/// ```
/// use dbgap_client::gap::parse_variable_record;
/// use serde_json::json;
///
/// let doc = json!({
///     "d_object_type": "variable",
///     "d_variable_results": {
///         "d_variable_id": "2|phv00012345",
///         "d_variable_name": "SMK_STATUS",
///         "d_variable_description": "Current cigarette smoking status"
///     }
/// });
///
/// let record = parse_variable_record("12345", &doc).unwrap();
/// assert_eq!(record.accession.as_str(), "phv00012345");
/// ```
pub fn parse_variable_record(
    uid: &str,
    doc: &Value,
) -> std::result::Result<VariableRecord, RecordError> {
    if let Some(message) = doc.get("error").and_then(Value::as_str) {
        return Err(RecordError::SummaryError {
            uid: uid.to_string(),
            message: message.to_string(),
        });
    }

    let object_type = required_str(uid, doc, FIELD_OBJECT_TYPE)?;
    if object_type != VARIABLE_OBJECT_TYPE {
        return Err(RecordError::UnexpectedObjectType {
            uid: uid.to_string(),
            found: object_type.to_string(),
        });
    }

    let results = doc
        .get(FIELD_VARIABLE_RESULTS)
        .filter(|v| v.is_object())
        .ok_or_else(|| RecordError::MissingField {
            uid: uid.to_string(),
            field: FIELD_VARIABLE_RESULTS,
        })?;

    let variable_id = required_str(uid, results, FIELD_VARIABLE_ID)?;
    let accession = split_variable_id(uid, variable_id)?;
    let name = required_str(uid, results, FIELD_VARIABLE_NAME)?;
    let description = required_str(uid, results, FIELD_VARIABLE_DESCRIPTION)?;

    Ok(VariableRecord {
        uid: uid.to_string(),
        accession,
        name: name.to_string(),
        description: description.to_string(),
    })
}

fn required_str<'a>(
    uid: &str,
    value: &'a Value,
    field: &'static str,
) -> std::result::Result<&'a str, RecordError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| RecordError::MissingField {
            uid: uid.to_string(),
            field,
        })
}

fn split_variable_id(
    uid: &str,
    variable_id: &str,
) -> std::result::Result<VariableAccession, RecordError> {
    let parts: Vec<&str> = variable_id.split(VARIABLE_ID_SEPARATOR).collect();
    let [_, accession] = parts.as_slice() else {
        return Err(RecordError::MalformedVariableId {
            uid: uid.to_string(),
            value: variable_id.to_string(),
        });
    };

    VariableAccession::parse(accession).map_err(|_| RecordError::InvalidAccession {
        uid: uid.to_string(),
        value: accession.to_string(),
    })
}

/// Parse an ESummary JSON page for dbGaP variables
///
/// Errors reported by the history server (expired WebEnv, unknown query key)
/// become [`GapError::HistorySessionError`]. A `result` without a `uids`
/// array of strings is [`GapError::InvalidResponse`]. Per-record validation
/// follows `policy`.
pub fn parse_summary_page(
    json_text: &str,
    start: usize,
    policy: ValidationPolicy,
) -> Result<VariablePage> {
    let response: ESummaryResponse = serde_json::from_str(json_text)?;

    if let Some(error) = response.error {
        return Err(GapError::HistorySessionError(error));
    }

    let Some(result) = response.result else {
        let message = response
            .esummaryresult
            .filter(|messages| !messages.is_empty())
            .map(|messages| messages.join("; "))
            .unwrap_or_else(|| "ESummary response has no result".to_string());
        return Err(GapError::HistorySessionError(message));
    };

    let uids = result
        .get("uids")
        .and_then(Value::as_array)
        .ok_or_else(|| GapError::InvalidResponse("ESummary result has no uids list".to_string()))?
        .iter()
        .map(|uid| {
            uid.as_str().ok_or_else(|| {
                GapError::InvalidResponse(format!("ESummary uid {uid} is not a string"))
            })
        })
        .collect::<Result<Vec<&str>>>()?;

    let mut page = VariablePage {
        start,
        uid_count: uids.len(),
        records: Vec::with_capacity(uids.len()),
        skipped: Vec::new(),
    };

    for uid in uids {
        let parsed = match result.get(uid) {
            Some(doc) => parse_variable_record(uid, doc),
            None => Err(RecordError::MissingField {
                uid: uid.to_string(),
                field: "document summary",
            }),
        };

        match (parsed, policy) {
            (Ok(record), _) => page.records.push(record),
            (Err(err), ValidationPolicy::FailFast) => return Err(err.into()),
            (Err(err), ValidationPolicy::SkipAndLog) => {
                warn!(uid = %err.uid(), error = %err, "Skipping invalid variable record");
                page.skipped.push(err);
            }
        }
    }

    debug!(
        start,
        uids = page.uid_count,
        accepted = page.records.len(),
        skipped = page.skipped.len(),
        "Parsed ESummary page"
    );

    Ok(page)
}
