//! This module contains the finding data model and the report aggregator that
//! collects, deduplicates, and renders the findings produced by the detectors.

pub mod json;
pub mod markdown;
pub mod source_map;
pub mod swc;

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::{
    constant::{UNKNOWN_CONTRACT_NAME, UNKNOWN_FUNCTION_NAME},
    report::swc::SwcId,
};

/// How serious the consequences of a reported weakness are.
///
/// The severity of a finding is fixed by the detector category that produced
/// it, and is never adjusted afterwards.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Severity {
    /// The weakness is unlikely to endanger funds or contract state.
    Low,

    /// The weakness can endanger contract state under attacker influence.
    Medium,

    /// The weakness directly endangers funds or contract state.
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        write!(f, "{text}")
    }
}

/// The two-part description text of a finding.
///
/// Both parts are fixed per detector category rather than generated from the
/// state that triggered the finding.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Description {
    /// A one-sentence summary of the weakness.
    pub head: String,

    /// The longer explanation, including remediation advice.
    pub tail: String,
}

impl Description {
    /// Constructs a new description from its `head` and `tail` texts.
    #[must_use]
    pub fn new(head: impl Into<String>, tail: impl Into<String>) -> Self {
        let head = head.into();
        let tail = tail.into();
        Self { head, tail }
    }
}

/// A single vulnerability finding, produced by a detector and confirmed
/// feasible against the path condition it was observed under.
///
/// Findings are immutable once emitted. The [`Report`] owns them after
/// emission.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Finding {
    /// The catalog entry this finding reports against.
    pub swc_id: SwcId,

    /// The severity of the finding's category.
    pub severity: Severity,

    /// The human-readable name of the finding.
    pub title: String,

    /// The fixed description text of the finding's category.
    pub description: Description,

    /// The name of the function the triggering instruction belongs to.
    ///
    /// Function discovery requires the source-map collaborator, so this is
    /// [`crate::constant::UNKNOWN_FUNCTION_NAME`] for raw bytecode.
    pub function_name: String,

    /// The bytecode offset of the instruction that triggered the finding.
    pub instruction_pointer: u32,

    /// The lower bound of the gas used on the path at the trigger point.
    pub min_gas_used: usize,

    /// The upper bound of the gas used on the path at the trigger point.
    pub max_gas_used: usize,

    /// Additional detector-specific metadata.
    pub extra: BTreeMap<String, String>,
}

impl Finding {
    /// Constructs a new finding for the category described by `swc_id`,
    /// triggered at `instruction_pointer`.
    #[must_use]
    pub fn new(
        swc_id: SwcId,
        severity: Severity,
        title: impl Into<String>,
        description: Description,
        instruction_pointer: u32,
        gas_used: (usize, usize),
    ) -> Self {
        let (min_gas_used, max_gas_used) = gas_used;
        Self {
            swc_id,
            severity,
            title: title.into(),
            description,
            function_name: UNKNOWN_FUNCTION_NAME.into(),
            instruction_pointer,
            min_gas_used,
            max_gas_used,
            extra: BTreeMap::new(),
        }
    }
}

/// The collection of findings for one analyzed contract, together with the
/// data needed to render the output formats.
///
/// # Deduplication
///
/// Detectors observe every explored path, so the same weakness at the same
/// instruction is frequently rediscovered. The report deduplicates on the
/// `(swc_id, instruction_pointer, title)` triple, keeping the first finding
/// seen for each.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Report {
    /// The name of the contract the findings belong to.
    contract: String,

    /// The keccak256 hash of the analyzed bytecode, forming the report's
    /// source list.
    bytecode_hash: String,

    /// The deduplicated findings.
    findings: Vec<Finding>,

    /// Whether exploration was truncated by a resource budget, meaning the
    /// findings may not cover the whole bytecode.
    coverage_truncated: bool,
}

impl Report {
    /// Constructs a new, empty report for the contract with the provided
    /// `bytecode`.
    #[must_use]
    pub fn new(bytecode: &[u8]) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(bytecode);
        let bytecode_hash = format!("0x{}", hex::encode(hasher.finalize()));

        Self {
            contract: UNKNOWN_CONTRACT_NAME.into(),
            bytecode_hash,
            findings: Vec::new(),
            coverage_truncated: false,
        }
    }

    /// Sets the name of the contract the findings belong to.
    #[must_use]
    pub fn with_contract_name(mut self, name: impl Into<String>) -> Self {
        self.contract = name.into();
        self
    }

    /// Marks whether exploration was truncated by a resource budget.
    #[must_use]
    pub fn with_coverage_truncated(mut self, truncated: bool) -> Self {
        self.coverage_truncated = truncated;
        self
    }

    /// Adds `finding` to the report, discarding it if a finding with the same
    /// catalog entry, trigger offset, and title has already been added.
    pub fn add_finding(&mut self, finding: Finding) {
        let duplicate = self.findings.iter().any(|existing| {
            existing.swc_id == finding.swc_id
                && existing.instruction_pointer == finding.instruction_pointer
                && existing.title == finding.title
        });
        if !duplicate {
            self.findings.push(finding);
        }
    }

    /// Adds every finding in `findings` to the report, deduplicating each.
    pub fn add_findings(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.add_finding(finding);
        }
    }

    /// Gets the findings in the report, ordered by trigger offset and then by
    /// title.
    #[must_use]
    pub fn findings(&self) -> Vec<&Finding> {
        self.findings
            .iter()
            .sorted_by(|a, b| {
                a.instruction_pointer
                    .cmp(&b.instruction_pointer)
                    .then_with(|| a.title.cmp(&b.title))
            })
            .collect()
    }

    /// Gets the number of findings in the report.
    #[must_use]
    pub fn len(&self) -> usize {
        self.findings.len()
    }

    /// Checks if the report contains no findings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Gets the name of the contract the findings belong to.
    #[must_use]
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Gets the keccak256 hash of the analyzed bytecode.
    #[must_use]
    pub fn bytecode_hash(&self) -> &str {
        &self.bytecode_hash
    }

    /// Checks whether exploration was truncated by a resource budget.
    #[must_use]
    pub fn coverage_truncated(&self) -> bool {
        self.coverage_truncated
    }
}

#[cfg(test)]
mod test {
    use crate::report::{swc::SwcId, Description, Finding, Report, Severity};

    fn new_finding(instruction_pointer: u32, title: &str) -> Finding {
        Finding::new(
            SwcId::UncheckedCallReturnValue,
            Severity::Low,
            title,
            Description::new("head", "tail"),
            instruction_pointer,
            (100, 200),
        )
    }

    #[test]
    fn hashes_the_bytecode_for_the_source_list() {
        // keccak256 of the empty input.
        let report = Report::new(&[]);
        assert_eq!(
            report.bytecode_hash(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn deduplicates_identical_findings() {
        let mut report = Report::new(&[0x00]);
        report.add_finding(new_finding(618, "Unchecked Call Return Value"));
        report.add_finding(new_finding(618, "Unchecked Call Return Value"));
        report.add_finding(new_finding(1038, "Unchecked Call Return Value"));

        assert_eq!(report.len(), 2);
    }

    #[test]
    fn findings_are_ordered_by_offset_then_title() {
        let mut report = Report::new(&[0x00]);
        report.add_finding(new_finding(1038, "B title"));
        report.add_finding(new_finding(618, "Z title"));
        report.add_finding(new_finding(1038, "A title"));

        let offsets: Vec<(u32, &str)> = report
            .findings()
            .iter()
            .map(|f| (f.instruction_pointer, f.title.as_str()))
            .collect();
        assert_eq!(
            offsets,
            vec![(618, "Z title"), (1038, "A title"), (1038, "B title")]
        );
    }
}
