//! This module tests the rendered projections of the report.
#![cfg(test)]

use evm_sentinel::{
    bytecode,
    opcode::{arithmetic::*, control::*, memory::*, Opcode},
    report::{json, source_map::NullResolver},
    watchdog::LazyWatchdog,
};

mod common;

/// Builds a small contract with a single wrapping subtraction in it.
fn wrapping_bytecode() -> anyhow::Result<Vec<u8>> {
    Ok(bytecode![
        PushN::new(1, vec![0x02])?, // The subtrahend
        PushN::new(1, vec![0x01])?, // The minuend
        Sub,                        // Wraps
        Pop,                        // Discard the result
        Stop                        // Return from this thread
    ])
}

#[test]
fn findings_survive_a_round_trip_through_the_json_text() -> anyhow::Result<()> {
    let analyzer = common::new_analyzer_from_bytes(wrapping_bytecode()?, LazyWatchdog.in_rc());
    let report = analyzer.analyze()?;

    let text = report.to_json(&NullResolver)?;
    let recovered = json::parse_findings(&text)?;

    let originals: Vec<_> = report.findings().into_iter().cloned().collect();
    assert_eq!(recovered, originals);

    Ok(())
}

#[test]
fn the_json_report_carries_the_fixed_source_fields() -> anyhow::Result<()> {
    let analyzer = common::new_analyzer_from_bytes(wrapping_bytecode()?, LazyWatchdog.in_rc());
    let report = analyzer.analyze()?;

    let json_report = report.as_json_report(&NullResolver);

    assert_eq!(json_report.source_format, "evm-byzantium-bytecode");
    assert_eq!(json_report.source_type, "raw-bytecode");
    assert_eq!(
        json_report.source_list,
        vec![report.bytecode_hash().to_string()]
    );
    assert!(!json_report.meta.coverage_truncated);
    assert_eq!(json_report.issues.len(), 1);
    assert_eq!(json_report.issues[0].swc_id, "SWC-101");
    assert_eq!(json_report.issues[0].locations[0].source_map, "4:1:0");

    Ok(())
}

#[test]
fn the_markdown_report_renders_the_findings() -> anyhow::Result<()> {
    let analyzer = common::new_analyzer_from_bytes(wrapping_bytecode()?, LazyWatchdog.in_rc());
    let report = analyzer.analyze()?;

    let markdown = report.to_markdown();

    assert!(markdown.starts_with("# Analysis results for Unknown"));
    assert!(markdown.contains("## Integer Underflow"));
    assert!(markdown.contains("- SWC ID: SWC-101"));
    assert!(markdown.contains("- Severity: High"));
    assert!(markdown.contains("- PC address: 4"));

    Ok(())
}
