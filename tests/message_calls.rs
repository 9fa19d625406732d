//! This module tests the library's ability to discover weaknesses in the way
//! a contract performs and handles message calls.
#![cfg(test)]

use evm_sentinel::{
    bytecode,
    opcode::{control::*, logic::*, memory::*, Opcode},
    report::swc::SwcId,
    watchdog::LazyWatchdog,
};

mod common;

#[test]
fn reports_a_call_whose_success_value_is_discarded() -> anyhow::Result<()> {
    // Calls an attacker-chosen address and discards the success value.
    let bytes = bytecode![
        PushN::new(1, vec![0x00])?,       // retSize
        PushN::new(1, vec![0x00])?,       // retOffset
        PushN::new(1, vec![0x00])?,       // argsSize
        PushN::new(1, vec![0x00])?,       // argsOffset
        PushN::new(1, vec![0x00])?,       // value
        PushN::new(1, vec![0x00])?,       // The calldata offset to load from
        CallDataLoad,                     // The callee address, chosen by the caller
        PushN::new(2, vec![0x08, 0xfc])?, // gas
        Call,                             // Make the call
        Pop,                              // Discard the success value
        Stop                              // Return from this thread
    ];
    let analyzer = common::new_analyzer_from_bytes(bytes, LazyWatchdog.in_rc());

    let report = analyzer.analyze()?;

    // The discarded success value is one weakness, and the caller-chosen
    // callee address is another. Both trigger at the call itself.
    assert_eq!(report.len(), 2);

    let unchecked: Vec<_> = report
        .findings()
        .into_iter()
        .filter(|finding| finding.swc_id == SwcId::UncheckedCallReturnValue)
        .collect();
    assert_eq!(unchecked.len(), 1);
    assert_eq!(unchecked[0].instruction_pointer, 16);

    let external: Vec<_> = report
        .findings()
        .into_iter()
        .filter(|finding| finding.swc_id == SwcId::Reentrancy)
        .collect();
    assert_eq!(external.len(), 1);
    assert_eq!(external[0].instruction_pointer, 16);
    assert_eq!(external[0].title, "External Call To User-Supplied Address");

    Ok(())
}

#[test]
fn checked_calls_to_fixed_addresses_are_not_reported() -> anyhow::Result<()> {
    // Calls a fixed address and branches on the success value.
    let bytes = bytecode![
        PushN::new(1, vec![0x00])?,       // retSize
        PushN::new(1, vec![0x00])?,       // retOffset
        PushN::new(1, vec![0x00])?,       // argsSize
        PushN::new(1, vec![0x00])?,       // argsOffset
        PushN::new(1, vec![0x00])?,       // value
        PushN::new(1, vec![0xaa])?,       // The callee address, fixed by the contract
        PushN::new(2, vec![0x08, 0xfc])?, // gas
        Call,                             // Make the call
        IsZero,                           // Check the success value
        PushN::new(1, vec![0x15])?,       // The jump destination offset
        JumpI,                            // Branch on the check
        Stop,                             // The call succeeded
        JumpDest,                         // The call failed
        Stop                              // Return from this thread
    ];
    let analyzer = common::new_analyzer_from_bytes(bytes, LazyWatchdog.in_rc());

    let report = analyzer.analyze()?;
    assert!(report.is_empty());

    Ok(())
}

#[test]
fn each_unchecked_call_site_is_reported_once() -> anyhow::Result<()> {
    // Performs the same unchecked call twice from different sites.
    let bytes = bytecode![
        PushN::new(1, vec![0x00])?,       // retSize
        PushN::new(1, vec![0x00])?,       // retOffset
        PushN::new(1, vec![0x00])?,       // argsSize
        PushN::new(1, vec![0x00])?,       // argsOffset
        PushN::new(1, vec![0x00])?,       // value
        PushN::new(1, vec![0xaa])?,       // The first callee address
        PushN::new(2, vec![0x08, 0xfc])?, // gas
        Call,                             // The first call site
        Pop,                              // Discard the success value
        PushN::new(1, vec![0x00])?,       // retSize
        PushN::new(1, vec![0x00])?,       // retOffset
        PushN::new(1, vec![0x00])?,       // argsSize
        PushN::new(1, vec![0x00])?,       // argsOffset
        PushN::new(1, vec![0x00])?,       // value
        PushN::new(1, vec![0xbb])?,       // The second callee address
        PushN::new(2, vec![0x08, 0xfc])?, // gas
        Call,                             // The second call site
        Pop,                              // Discard the success value
        Stop                              // Return from this thread
    ];
    let analyzer = common::new_analyzer_from_bytes(bytes, LazyWatchdog.in_rc());

    let report = analyzer.analyze()?;

    let mut offsets: Vec<u32> = report
        .findings()
        .into_iter()
        .filter(|finding| finding.swc_id == SwcId::UncheckedCallReturnValue)
        .map(|finding| finding.instruction_pointer)
        .collect();
    offsets.sort_unstable();
    assert_eq!(offsets, vec![15, 32]);

    Ok(())
}

#[test]
fn unchecked_calls_to_user_addresses_trigger_both_weaknesses() -> anyhow::Result<()> {
    // Performs two unchecked calls, each to an address read from calldata.
    let bytes = bytecode![
        PushN::new(1, vec![0x00])?,       // retSize
        PushN::new(1, vec![0x00])?,       // retOffset
        PushN::new(1, vec![0x00])?,       // argsSize
        PushN::new(1, vec![0x00])?,       // argsOffset
        PushN::new(1, vec![0x00])?,       // value
        PushN::new(1, vec![0x00])?,       // The calldata offset to load from
        CallDataLoad,                     // The first callee address
        PushN::new(2, vec![0x08, 0xfc])?, // gas
        Call,                             // The first call site
        Pop,                              // Discard the success value
        PushN::new(1, vec![0x00])?,       // retSize
        PushN::new(1, vec![0x00])?,       // retOffset
        PushN::new(1, vec![0x00])?,       // argsSize
        PushN::new(1, vec![0x00])?,       // argsOffset
        PushN::new(1, vec![0x00])?,       // value
        PushN::new(1, vec![0x20])?,       // The calldata offset to load from
        CallDataLoad,                     // The second callee address
        PushN::new(2, vec![0x08, 0xfc])?, // gas
        Call,                             // The second call site
        Pop,                              // Discard the success value
        Stop                              // Return from this thread
    ];
    let analyzer = common::new_analyzer_from_bytes(bytes, LazyWatchdog.in_rc());

    let report = analyzer.analyze()?;

    // Each site is both an unchecked return value and a call to a
    // caller-chosen address.
    let mut unchecked: Vec<u32> = report
        .findings()
        .into_iter()
        .filter(|finding| finding.swc_id == SwcId::UncheckedCallReturnValue)
        .map(|finding| finding.instruction_pointer)
        .collect();
    unchecked.sort_unstable();
    assert_eq!(unchecked, vec![16, 34]);

    let mut external: Vec<u32> = report
        .findings()
        .into_iter()
        .filter(|finding| finding.swc_id == SwcId::Reentrancy)
        .map(|finding| finding.instruction_pointer)
        .collect();
    external.sort_unstable();
    assert_eq!(external, vec![16, 34]);

    Ok(())
}

#[test]
fn reports_usage_of_callcode() -> anyhow::Result<()> {
    // Uses the deprecated CALLCODE instruction, checking its success value so
    // that the usage itself is the only weakness at the site.
    let bytes = bytecode![
        PushN::new(1, vec![0x00])?,       // retSize
        PushN::new(1, vec![0x00])?,       // retOffset
        PushN::new(1, vec![0x00])?,       // argsSize
        PushN::new(1, vec![0x00])?,       // argsOffset
        PushN::new(1, vec![0x00])?,       // value
        PushN::new(1, vec![0xaa])?,       // The callee address, fixed by the contract
        PushN::new(2, vec![0x08, 0xfc])?, // gas
        CallCode,                         // The deprecated call
        IsZero,                           // Check the success value
        PushN::new(1, vec![0x15])?,       // The jump destination offset
        JumpI,                            // Branch on the check
        Stop,                             // The call succeeded
        JumpDest,                         // The call failed
        Stop                              // Return from this thread
    ];
    let analyzer = common::new_analyzer_from_bytes(bytes, LazyWatchdog.in_rc());

    let report = analyzer.analyze()?;

    assert_eq!(report.len(), 1);
    let finding = report.findings()[0];
    assert_eq!(finding.swc_id, SwcId::DeprecatedFunctionsUsage);
    assert_eq!(finding.title, "Use of callcode");
    assert_eq!(finding.instruction_pointer, 15);

    Ok(())
}
