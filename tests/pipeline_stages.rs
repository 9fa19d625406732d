//! This module is an integration test that drives the analyzer through its
//! individual stages, allowing inspection of the intermediate results.
#![cfg(test)]

use evm_sentinel::{
    bytecode,
    opcode::{control::*, logic::*, memory::*, Opcode},
    watchdog::LazyWatchdog,
};

mod common;

#[test]
fn exposes_the_intermediate_results_of_each_stage() -> anyhow::Result<()> {
    // A contract with a single symbolic branch in it.
    let bytes = bytecode![
        CallDataSize,               // Get a symbolic value
        IsZero,                     // Check if the size is zero
        PushN::new(1, vec![0x06])?, // The jump destination offset
        JumpI,                      // Branch on the check
        Stop,                       // The fall-through path
        JumpDest,                   // The destination for the jump
        Stop                        // The jumping path
    ];
    let analyzer = common::new_analyzer_from_bytes(bytes, LazyWatchdog.in_rc());

    // Disassemble
    let disassembled = analyzer.disassemble()?;
    assert_eq!(disassembled.state().bytecode.len(), 8);

    // Prepare the VM
    let execution_ready = disassembled.prepare_vm()?;
    assert_eq!(execution_ready.state().vm.remaining_thread_count(), 1);

    // Execute the VM
    let executed = execution_ready.execute()?;
    let results = &executed.state().execution_result;

    // The symbolic branch forks execution, so both paths leave a state.
    assert_eq!(results.states.len(), 2);
    assert!(results.errors.is_empty());
    assert!(!results.coverage_truncated);

    // Aggregate the report
    let reported = executed.prepare_report();
    assert!(reported.report().is_empty());
    assert_eq!(reported.execution_result().states.len(), 2);

    Ok(())
}
