//! This module contains the state tracking functionality for the analyzer.

use std::fmt::Debug;

use crate::{
    disassembly::InstructionStream,
    report::Report,
    solver::DynOracle,
    vm,
    vm::{ExecutionResult, VM},
    watchdog::DynWatchdog,
};

/// A marker trait that says that the type implementing it is an analyzer
/// state.
///
/// Analyzer states can be transitioned between as part of the
/// [`crate::analyzer::Analyzer`] state machine, and are intended to enforce
/// that correct state transitions take place.
pub trait State
where
    Self: Debug + Sized,
{
}

/// The initial state for the analyzer.
#[derive(Debug)]
pub struct HasContract {
    /// The virtual machine configuration.
    pub vm_config: vm::Config,

    /// The constraint oracle used to decide branch feasibility and to confirm
    /// candidate findings.
    pub oracle: DynOracle,

    /// The watchdog that is monitoring the progress of the analyzer.
    pub watchdog: DynWatchdog,
}
impl State for HasContract {}

/// The state for an analyzer that has successfully disassembled the bytecode.
#[derive(Debug)]
pub struct DisassemblyComplete {
    /// The disassembled bytecode for the contract being analyzed.
    pub bytecode: InstructionStream,

    /// The configuration for the analyzer's virtual machine.
    pub vm_config: vm::Config,

    /// The constraint oracle used to decide branch feasibility and to confirm
    /// candidate findings.
    pub oracle: DynOracle,

    /// The watchdog that is monitoring the progress of the analyzer.
    pub watchdog: DynWatchdog,
}
impl State for DisassemblyComplete {}

/// The analyzer has prepared the virtual machine to symbolically execute the
/// contract's bytecode.
#[derive(Debug)]
pub struct VMReady {
    /// The virtual machine, prepared with the input contract and ready to
    /// execute.
    pub vm: VM,

    /// The watchdog that is monitoring the progress of the analyzer.
    pub watchdog: DynWatchdog,
}
impl State for VMReady {}

/// The analyzer has completed symbolic execution of the bytecode.
#[derive(Debug)]
pub struct ExecutionComplete {
    /// The result from executing the bytecode.
    pub execution_result: ExecutionResult,
}
impl State for ExecutionComplete {}

/// The analyzer has aggregated the findings from execution, and is now ready
/// to provide the concrete report.
#[derive(Debug)]
pub struct ReportReady {
    /// The aggregated report for the contract.
    pub report: Report,

    /// The result from executing the bytecode, retained for clients that want
    /// to inspect the raw execution data behind the report.
    pub execution_result: ExecutionResult,
}
impl State for ReportReady {}
