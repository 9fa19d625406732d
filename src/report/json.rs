//! This module contains the JSON projection of the report, in the standard
//! machine-readable weakness-report format.
//!
//! The projection is lossless: every field of a [`Finding`] either has a
//! first-class place in the issue object or is carried in the issue's `extra`
//! mapping, so parsing a rendered report recovers the findings exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    constant::{REPORT_SOURCE_FORMAT, REPORT_SOURCE_TYPE},
    error::{
        analysis::{Error, Result},
        container::Locatable,
    },
    report::{source_map::SourceResolver, swc::SwcId, Description, Finding, Report, Severity},
};

/// The `extra` key under which the finding's title travels.
const EXTRA_TITLE: &str = "title";

/// The `extra` key under which the finding's function name travels.
const EXTRA_FUNCTION_NAME: &str = "functionName";

/// The `extra` key under which the finding's trigger offset travels.
///
/// The offset is also the default location's source-map offset, but a client
/// resolver can replace that with a real source range, so the offset is
/// always carried here as well.
const EXTRA_PC_ADDRESS: &str = "pcAddress";

/// The `extra` key under which the finding's minimum gas estimate travels.
const EXTRA_MIN_GAS: &str = "minGasUsed";

/// The `extra` key under which the finding's maximum gas estimate travels.
const EXTRA_MAX_GAS: &str = "maxGasUsed";

/// The top-level object of the JSON report format.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct JsonReport {
    /// The reported issues.
    pub issues: Vec<JsonIssue>,

    /// Metadata about the analysis run that produced the issues.
    pub meta: JsonMeta,

    /// The format of the analyzed sources.
    #[serde(rename = "sourceFormat")]
    pub source_format: String,

    /// The identities of the analyzed sources, as bytecode hashes.
    #[serde(rename = "sourceList")]
    pub source_list: Vec<String>,

    /// The kind of the analyzed sources.
    #[serde(rename = "sourceType")]
    pub source_type: String,
}

/// The metadata object of the JSON report format.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct JsonMeta {
    /// Whether exploration was truncated by a resource budget, meaning the
    /// issues may not cover the whole bytecode.
    #[serde(rename = "coverageTruncated")]
    pub coverage_truncated: bool,
}

/// A single issue object in the JSON report format.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct JsonIssue {
    /// The catalog identifier, in `SWC-NNN` form.
    #[serde(rename = "swcID")]
    pub swc_id: String,

    /// The catalog title of the weakness.
    #[serde(rename = "swcTitle")]
    pub swc_title: String,

    /// The fixed description text of the issue's category.
    pub description: Description,

    /// The severity of the issue.
    pub severity: Severity,

    /// The locations at which the issue was observed.
    pub locations: Vec<JsonLocation>,

    /// Additional metadata about the issue.
    pub extra: BTreeMap<String, String>,
}

/// A location object in the JSON report format.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct JsonLocation {
    /// The location in `<offset>:<length>:<fileIndex>` form.
    #[serde(rename = "sourceMap")]
    pub source_map: String,
}

impl JsonIssue {
    /// Projects `finding` into an issue object, resolving its location
    /// through `resolver`.
    ///
    /// When the resolver knows no mapping for the trigger offset, the
    /// location falls back to the bytecode offset itself with a length of one
    /// byte in source zero.
    #[must_use]
    pub fn from_finding(finding: &Finding, resolver: &dyn SourceResolver) -> Self {
        let source_map = resolver
            .resolve(finding.instruction_pointer)
            .map_or_else(
                || format!("{}:1:0", finding.instruction_pointer),
                |range| range.as_source_map(),
            );

        let mut extra = finding.extra.clone();
        extra.insert(EXTRA_TITLE.into(), finding.title.clone());
        extra.insert(EXTRA_FUNCTION_NAME.into(), finding.function_name.clone());
        extra.insert(
            EXTRA_PC_ADDRESS.into(),
            finding.instruction_pointer.to_string(),
        );
        extra.insert(EXTRA_MIN_GAS.into(), finding.min_gas_used.to_string());
        extra.insert(EXTRA_MAX_GAS.into(), finding.max_gas_used.to_string());

        Self {
            swc_id: finding.swc_id.to_string(),
            swc_title: finding.swc_id.title().into(),
            description: finding.description.clone(),
            severity: finding.severity,
            locations: vec![JsonLocation { source_map }],
            extra,
        }
    }
}

/// Recovers the finding an issue object was projected from.
impl TryFrom<&JsonIssue> for Finding {
    type Error = Error;

    fn try_from(issue: &JsonIssue) -> std::result::Result<Self, Self::Error> {
        let swc_id: SwcId = issue.swc_id.parse()?;

        let mut extra = issue.extra.clone();
        let title = take_extra(&mut extra, EXTRA_TITLE)?;
        let function_name = take_extra(&mut extra, EXTRA_FUNCTION_NAME)?;
        let instruction_pointer = parse_number(&take_extra(&mut extra, EXTRA_PC_ADDRESS)?)?;
        let min_gas_used = parse_number(&take_extra(&mut extra, EXTRA_MIN_GAS)?)?;
        let max_gas_used = parse_number(&take_extra(&mut extra, EXTRA_MAX_GAS)?)?;

        Ok(Self {
            swc_id,
            severity: issue.severity,
            title,
            description: issue.description.clone(),
            function_name,
            instruction_pointer,
            min_gas_used,
            max_gas_used,
            extra,
        })
    }
}

/// Removes the entry at `key` from `extra`, erroring if it is absent.
fn take_extra(extra: &mut BTreeMap<String, String>, key: &str) -> std::result::Result<String, Error> {
    extra.remove(key).ok_or_else(|| Error::SerializationFailed {
        reason: format!("The issue is missing the `{key}` entry in its extra data"),
    })
}

/// Parses a decimal number carried in the issue's extra data.
fn parse_number<N: std::str::FromStr>(text: &str) -> std::result::Result<N, Error> {
    text.parse().map_err(|_| Error::SerializationFailed {
        reason: format!("`{text}` is not a valid number"),
    })
}

impl Report {
    /// Projects the report into the JSON report object, resolving locations
    /// through `resolver`.
    #[must_use]
    pub fn as_json_report(&self, resolver: &dyn SourceResolver) -> JsonReport {
        let issues = self
            .findings()
            .into_iter()
            .map(|finding| JsonIssue::from_finding(finding, resolver))
            .collect();

        JsonReport {
            issues,
            meta: JsonMeta {
                coverage_truncated: self.coverage_truncated(),
            },
            source_format: REPORT_SOURCE_FORMAT.into(),
            source_list: vec![self.bytecode_hash().into()],
            source_type: REPORT_SOURCE_TYPE.into(),
        }
    }

    /// Renders the report as a JSON string.
    ///
    /// # Errors
    ///
    /// If the report cannot be serialized.
    pub fn to_json(&self, resolver: &dyn SourceResolver) -> Result<String> {
        serde_json::to_string_pretty(&self.as_json_report(resolver)).map_err(|error| {
            Error::SerializationFailed {
                reason: error.to_string(),
            }
            .locate(0)
            .into()
        })
    }
}

/// Parses the findings back out of a rendered JSON report.
///
/// # Errors
///
/// If `text` is not a valid JSON report, or one of its issues cannot be
/// recovered as a finding.
pub fn parse_findings(text: &str) -> Result<Vec<Finding>> {
    let report: JsonReport = serde_json::from_str(text).map_err(|error| {
        Error::SerializationFailed {
            reason: error.to_string(),
        }
        .locate(0)
    })?;

    report
        .issues
        .iter()
        .map(|issue| Finding::try_from(issue).map_err(|error| error.locate(0).into()))
        .collect()
}
