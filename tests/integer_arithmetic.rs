//! This module tests the library's ability to discover arithmetic that can
//! wrap around the word width.
#![cfg(test)]

use evm_sentinel::{
    bytecode,
    opcode::{arithmetic::*, control::*, memory::*, Opcode},
    report::swc::SwcId,
    watchdog::LazyWatchdog,
};

mod common;

#[test]
fn reports_a_subtraction_that_wraps() -> anyhow::Result<()> {
    // Computes 1 - 2, which wraps below zero.
    let bytes = bytecode![
        PushN::new(1, vec![0x02])?, // The subtrahend
        PushN::new(1, vec![0x01])?, // The minuend
        Sub,                        // Wraps
        Pop,                        // Discard the result
        Stop                        // Return from this thread
    ];
    let analyzer = common::new_analyzer_from_bytes(bytes, LazyWatchdog.in_rc());

    let report = analyzer.analyze()?;

    assert_eq!(report.len(), 1);
    let finding = report.findings()[0];
    assert_eq!(finding.swc_id, SwcId::IntegerOverflowAndUnderflow);
    assert_eq!(finding.title, "Integer Underflow");
    assert_eq!(finding.instruction_pointer, 4);

    Ok(())
}

#[test]
fn reports_an_addition_that_wraps() -> anyhow::Result<()> {
    // Computes MAX + 1, which wraps above the word width.
    let bytes = bytecode![
        PushN::new(32, vec![0xff; 32])?, // The largest representable word
        PushN::new(1, vec![0x01])?,      // One
        Add,                             // Wraps
        Pop,                             // Discard the result
        Stop                             // Return from this thread
    ];
    let analyzer = common::new_analyzer_from_bytes(bytes, LazyWatchdog.in_rc());

    let report = analyzer.analyze()?;

    assert_eq!(report.len(), 1);
    let finding = report.findings()[0];
    assert_eq!(finding.title, "Integer Overflow");
    assert_eq!(finding.instruction_pointer, 35);

    Ok(())
}

#[test]
fn constrained_arithmetic_is_not_reported() -> anyhow::Result<()> {
    // Computes 2 - 1 and 3 * 4, neither of which can wrap.
    let bytes = bytecode![
        PushN::new(1, vec![0x01])?,
        PushN::new(1, vec![0x02])?,
        Sub,
        PushN::new(1, vec![0x04])?,
        PushN::new(1, vec![0x03])?,
        Mul,
        Pop,
        Pop,
        Stop
    ];
    let analyzer = common::new_analyzer_from_bytes(bytes, LazyWatchdog.in_rc());

    let report = analyzer.analyze()?;
    assert!(report.is_empty());

    Ok(())
}

#[test]
fn symbolic_operands_are_reported() -> anyhow::Result<()> {
    // Subtracts an attacker-chosen word from one, which wraps whenever the
    // word exceeds one.
    let bytes = bytecode![
        PushN::new(1, vec![0x00])?, // The calldata offset to load from
        CallDataLoad,               // An attacker-chosen word
        PushN::new(1, vec![0x01])?, // The minuend
        Sub,                        // Wraps for most calldata
        Pop,
        Stop
    ];
    let analyzer = common::new_analyzer_from_bytes(bytes, LazyWatchdog.in_rc());

    let report = analyzer.analyze()?;

    assert_eq!(report.len(), 1);
    assert_eq!(report.findings()[0].title, "Integer Underflow");
    assert_eq!(report.findings()[0].instruction_pointer, 5);

    Ok(())
}
