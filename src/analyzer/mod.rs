//! This module contains the definition of the analyzer itself.

pub mod state;

use crate::{
    analyzer::state::State,
    contract::Contract,
    disassembly::InstructionStream,
    error,
    report::Report,
    solver::DynOracle,
    vm,
    vm::VM,
    watchdog::DynWatchdog,
};

/// Creates a new analyzer wrapping the provided `contract`, and with the
/// provided `vm_config`, `oracle`, and `watchdog`.
#[must_use]
pub fn new(
    contract: Contract,
    vm_config: vm::Config,
    oracle: DynOracle,
    watchdog: DynWatchdog,
) -> Analyzer<state::HasContract> {
    let state = state::HasContract {
        vm_config,
        oracle,
        watchdog,
    };
    Analyzer { contract, state }
}

/// The core of the security analysis, the `Analyzer` is responsible for
/// ingesting user data and outputting a report of the weaknesses discovered in
/// the contract's bytecode.
///
/// # Enforcing Valid State Transitions
///
/// The analyzer enforces that only correct state transitions can occur through
/// use of structs that implement the exact state required by it at any given
/// point.
///
/// There is the [`Self::state`] function that provides access to the state data
/// of whichever state the analyzer is currently in.
pub struct Analyzer<S: State> {
    /// The contract that is being analyzed.
    contract: Contract,

    /// The internal state of the analyzer.
    state: S,
}

/// The safe operations available in all states.
///
/// # Modifying the Analyzer
///
/// If you feel the need to modify the analyzer outside of the standard
/// transitions, perhaps as part of external extensions to the library, you
/// will need to use one of the following functions:
///
/// - [`Analyzer::contract_mut`]
/// - [`Analyzer::state_mut`]
/// - [`Analyzer::set_contract`]
/// - [`Analyzer::set_state`]
/// - [`Analyzer::transform_state`]
///
/// All of these are unsafe as they allow violating the invariants of the
/// analyzer's state. Be very careful and be sure that you know what you are
/// doing if you reach for these.
impl<S: State> Analyzer<S> {
    /// Gets a reference to the contract being analyzed.
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Gets an immutable reference to the current state of the analyzer.
    pub fn state(&self) -> &S {
        &self.state
    }
}

/// Unsafe operations available in all states.
///
/// These operations are capable of **violating the state invariants** of the
/// analyzer, and must be used with the _utmost_ care.
impl<S: State> Analyzer<S> {
    /// Gets a mutable reference to the contract being analyzed.
    ///
    /// # Safety
    ///
    /// Do not mutate the contract instance unless you totally understand the
    /// state that the analyzer is in, and the implications of doing so.
    pub unsafe fn contract_mut(&mut self) -> &mut Contract {
        &mut self.contract
    }

    /// Gets a mutable reference to the current state of the analyzer.
    ///
    /// # Safety
    ///
    /// Do not mutate the state instance unless you totally understand the
    /// state that the analyzer is in, and the implications of doing so.
    pub unsafe fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Sets the analyzer's contract instance to `contract`.
    ///
    /// # Safety
    ///
    /// Do not change the contract instance used by the analyzer unless you
    /// totally understand the state that the analyzer is in, and the
    /// implications of doing so.
    pub unsafe fn set_contract(&mut self, contract: Contract) {
        self.contract = contract;
    }

    /// Forces the analyzer into `new_state`, disregarding any safety with
    /// regards to state transitions.
    ///
    /// # Safety
    ///
    /// Do not force a state transition for the analyzer unless you totally
    /// understand the state that the analyzer is in, and the implications
    /// of doing so.
    pub unsafe fn set_state<NS: State>(self, new_state: NS) -> Analyzer<NS> {
        Analyzer {
            contract: self.contract,
            state:    new_state,
        }
    }

    /// Forces the analyzer into the state `NS`, with the value of the state
    /// created by applying `transform` to the analyzer's current state and
    /// disregarding any safety with regard to state transitions.
    ///
    /// # Safety
    ///
    /// Do not force a state transition for the analyzer unless you totally
    /// understand the state that the analyzer is in, and the implications
    /// of doing so.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the provided `transform` returns [`Err`].
    pub unsafe fn transform_state<NS: State>(
        self,
        transform: impl FnOnce(S) -> error::Result<NS>,
    ) -> error::Result<Analyzer<NS>> {
        let state = transform(self.state)?;
        let contract = self.contract;

        Ok(Analyzer { contract, state })
    }
}

/// A type that allows the user to easily name the initial state of the
/// analyzer.
pub type InitialAnalyzer = Analyzer<state::HasContract>;

/// Operations available on a newly-created analyzer.
impl Analyzer<state::HasContract> {
    /// Executes the analysis process from beginning to end, performing all the
    /// intermediate steps automatically and returning the report.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if any step in the process fails.
    pub fn analyze(self) -> error::Result<Report> {
        let analyzer = self.disassemble()?;
        let analyzer = analyzer.prepare_vm()?;
        let analyzer = analyzer.execute()?;
        let analyzer = analyzer.prepare_report();
        let report = analyzer.report();

        Ok(report.clone())
    }

    /// Performs the disassembly process to turn the input contract code into
    /// bytecode.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if disassembly fails.
    pub fn disassemble(self) -> error::Result<Analyzer<state::DisassemblyComplete>> {
        let bytecode = InstructionStream::try_from(self.contract.bytecode().as_slice())?;
        unsafe {
            self.transform_state(|old_state| {
                let vm_config = old_state.vm_config;
                let oracle = old_state.oracle;
                let watchdog = old_state.watchdog;
                Ok(state::DisassemblyComplete {
                    bytecode,
                    vm_config,
                    oracle,
                    watchdog,
                })
            })
        }
    }
}

/// Operations available on an analyzer that has completed the disassembly of
/// the bytecode.
impl Analyzer<state::DisassemblyComplete> {
    /// Prepares the virtual machine for symbolic execution of the bytecode.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the virtual machine cannot be constructed for some
    /// reason.
    pub fn prepare_vm(self) -> error::Result<Analyzer<state::VMReady>> {
        unsafe {
            self.transform_state(|old_state| {
                let watchdog = old_state.watchdog;
                let vm = VM::new(
                    old_state.bytecode,
                    old_state.vm_config,
                    old_state.oracle,
                    watchdog.clone(),
                )?;
                Ok(state::VMReady { vm, watchdog })
            })
        }
    }
}

/// Operations available on an analyzer that has a virtual machine ready to
/// execute the bytecode.
impl Analyzer<state::VMReady> {
    /// Symbolically executes the disassembled bytecode on the [`VM`],
    /// gathering the findings that the detectors confirm during execution.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if execution in the virtual machine fails for any
    /// reason.
    pub fn execute(self) -> error::Result<Analyzer<state::ExecutionComplete>> {
        unsafe {
            self.transform_state(|mut old_state| {
                old_state.vm.execute()?;
                let execution_result = old_state.vm.consume();
                Ok(state::ExecutionComplete { execution_result })
            })
        }
    }
}

/// Operations available on an analyzer that has a VM which has completed
/// execution of the bytecode.
impl Analyzer<state::ExecutionComplete> {
    /// Aggregates the findings from execution into a report for the contract.
    ///
    /// Detector failures during execution never discard the findings the other
    /// detectors confirmed, so they are logged here rather than being turned
    /// into errors.
    #[allow(clippy::missing_panics_doc)] // Explicit closure can never return Err
    #[must_use]
    pub fn prepare_report(self) -> Analyzer<state::ReportReady> {
        let report =
            Report::new(self.contract.bytecode()).with_contract_name(self.contract.name());
        unsafe {
            // Safe to unwrap as we guarantee that the internal operations cannot fail.
            self.transform_state(move |old_state| {
                let execution_result = old_state.execution_result;

                if !execution_result.detector_errors.is_empty() {
                    tracing::warn!(
                        errors = %execution_result.detector_errors,
                        "Some detectors failed during execution"
                    );
                }

                let mut report =
                    report.with_coverage_truncated(execution_result.coverage_truncated);
                report.add_findings(execution_result.findings.iter().cloned());

                Ok(state::ReportReady {
                    report,
                    execution_result,
                })
            })
            .expect("Explicit closure cannot return Err")
        }
    }
}

/// Operations available on an analyzer that has aggregated its findings.
impl Analyzer<state::ReportReady> {
    /// Gets the aggregated report for the contract.
    #[must_use]
    pub fn report(&self) -> &Report {
        &self.state.report
    }

    /// Gets the raw execution data behind the report.
    #[must_use]
    pub fn execution_result(&self) -> &vm::ExecutionResult {
        &self.state.execution_result
    }
}
