//! This module tests that exhausting a resource budget truncates the analysis
//! instead of failing it.
#![cfg(test)]

use std::sync::{atomic::AtomicBool, Arc};

use evm_sentinel::{
    bytecode,
    opcode::{arithmetic::*, control::*, memory::*, Opcode},
    report::source_map::NullResolver,
    solver::FoldingOracle,
    vm,
    watchdog::{FlagWatchdog, LazyWatchdog},
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
fn an_exhausted_state_budget_yields_an_empty_truncated_report() -> anyhow::Result<()> {
    let config = vm::Config::default().with_max_explored_states(0);
    let analyzer = common::new_analyzer_with_config(
        wrapping_bytecode()?,
        config,
        FoldingOracle::in_rc(),
        LazyWatchdog.in_rc(),
    );

    // Exhausting the budget is not an error.
    let report = analyzer.analyze()?;

    assert!(report.is_empty());
    assert!(report.coverage_truncated());

    // The truncation travels into the rendered report as well.
    let json_report = report.as_json_report(&NullResolver);
    assert!(json_report.meta.coverage_truncated);

    Ok(())
}

#[test]
fn a_stopped_watchdog_yields_an_empty_truncated_report() -> anyhow::Result<()> {
    let flag = Arc::new(AtomicBool::new(true));
    let watchdog = FlagWatchdog::new(flag).polling_every(1).in_rc();

    let analyzer = common::new_analyzer_with_config(
        wrapping_bytecode()?,
        vm::Config::default(),
        FoldingOracle::in_rc(),
        watchdog,
    );

    let report = analyzer.analyze()?;

    assert!(report.is_empty());
    assert!(report.coverage_truncated());

    Ok(())
}

#[test]
fn an_ample_budget_leaves_coverage_complete() -> anyhow::Result<()> {
    let analyzer = common::new_analyzer_from_bytes(wrapping_bytecode()?, LazyWatchdog.in_rc());
    let report = analyzer.analyze()?;

    assert!(!report.coverage_truncated());
    assert_eq!(report.len(), 1);

    Ok(())
}
