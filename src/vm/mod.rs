//! This module contains the symbolic virtual machine.

pub mod data;
pub mod state;
pub mod thread;
pub mod value;

use std::collections::VecDeque;

use crate::{
    constant::{
        BLOCK_GAS_LIMIT,
        DEFAULT_CONDITIONAL_JUMP_PER_TARGET_FORK_LIMIT,
        DEFAULT_ITERATIONS_PER_OPCODE,
        DEFAULT_MAXIMUM_EXPLORED_STATES,
        DEFAULT_PERMISSIVE_ERRORS_ENABLED,
        DEFAULT_VALUE_SIZE_LIMIT,
    },
    detector::{Detectors, Observation, Phase},
    disassembly::{ExecutionThread, InstructionStream},
    error::{
        self,
        analysis,
        container::Locatable,
        execution::{Error, Errors, Result},
    },
    opcode::{control, DynOpcode},
    report::Finding,
    solver::DynOracle,
    vm::{
        data::JumpTargets,
        state::{stack::LocatedStackHandle, VMState},
        thread::VMThread,
        value::{known::KnownWord, BoxedVal, Provenance, SymbolicValue, SymbolicValueData},
    },
    watchdog::DynWatchdog,
};

/// The virtual machine used to perform symbolic execution of the contract
/// bytecode.
///
/// It is designed so as to be a 1:1 match for the semantics of a real runtime
/// EVM wherever such semantics can be represented symbolically. On top of the
/// machine semantics it carries the detector registry, delivering an
/// observation to every detector around each executed instruction and at the
/// completion of each thread of execution.
#[derive(Debug)]
pub struct VM {
    /// The instructions that are being executed by this virtual machine.
    instructions: InstructionStream,

    /// Global tracking for jump target information, allowing global bounding of
    /// how many times each target is conditionally jumped to.
    jump_targets: JumpTargets,

    /// The queue of execution threads that will be taken when executing the
    /// provided `instructions`.
    thread_queue: VecDeque<VMThread>,

    /// The stored states that are no longer associated with a thread of
    /// execution.
    stored_states: Vec<VMState>,

    /// The number of threads of execution that have been dispatched so far,
    /// counted against [`Config::maximum_explored_states`].
    dispatched_states: usize,

    /// The configuration of the virtual machine.
    config: Config,

    /// Whether the currently executing thread needs to die.
    current_thread_killed: bool,

    /// Whether execution was stopped before the frontier was exhausted,
    /// meaning the run's results may not cover the whole bytecode.
    coverage_truncated: bool,

    /// Any errors that were encountered during the course of execution.
    errors: Errors,

    /// Any errors raised by the detectors while observing execution.
    ///
    /// These are kept apart from the execution errors as a detector failing
    /// never invalidates the machine semantics of the run.
    detector_errors: analysis::Errors,

    /// A builder for new values with configuration.
    builder: ValueBuilder,

    /// The registry of detectors observing the execution.
    detectors: Detectors,

    /// The findings confirmed so far.
    findings: Vec<Finding>,

    /// The constraint oracle used to decide branch feasibility and to confirm
    /// candidate findings.
    oracle: DynOracle,

    /// A watchdog that gets polled at intervals to check whether the analysis
    /// needs to exit.
    watchdog: DynWatchdog,
}

impl VM {
    /// Constructs a new virtual machine that executes over the provided
    /// `instructions`, consulting `oracle` at branches and when confirming
    /// candidate findings.
    ///
    /// It is created with an initial thread of execution that begins at the
    /// first instruction, and with the default detector registry. Call
    /// [`Self::with_detectors`] to run a different set of detectors.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the virtual machine could not be constructed.
    pub fn new(
        instructions: InstructionStream,
        config: Config,
        oracle: DynOracle,
        watchdog: DynWatchdog,
    ) -> Result<Self> {
        // Create the initial thread internally as we can't use the function for this
        // while `self` doesn't exist.
        let initial_state = VMState::new();
        let initial_instruction_thread = instructions.new_thread(0)?;
        let initial_thread = VMThread::new(initial_state, initial_instruction_thread);
        let jump_targets = JumpTargets::new(config.maximum_forks_per_fork_target);

        // Set up the data for the VM.
        let mut thread_queue = VecDeque::new();
        thread_queue.push_back(initial_thread);
        let stored_states = Vec::new();
        let current_thread_killed = false;
        let errors = Errors::default();
        let detector_errors = analysis::Errors::default();
        let builder = ValueBuilder::new(&config);
        let detectors = Detectors::default();
        let findings = Vec::new();

        Ok(Self {
            instructions,
            jump_targets,
            thread_queue,
            stored_states,
            dispatched_states: 1,
            config,
            current_thread_killed,
            coverage_truncated: false,
            errors,
            detector_errors,
            builder,
            detectors,
            findings,
            oracle,
            watchdog,
        })
    }

    /// Replaces the virtual machine's detector registry with `detectors`.
    #[must_use]
    pub fn with_detectors(mut self, detectors: Detectors) -> Self {
        self.detectors = detectors;
        self
    }

    /// Performs symbolic execution of the entire bytecode.
    ///
    /// Running out of gas just stops execution of that thread, thereby allowing
    /// exploration of the full scope of what could potentially execute on
    /// chain.
    ///
    /// # Resource Budgets
    ///
    /// Exceeding the explored-state budget, or being told to stop by the
    /// watchdog, is not an error: the remaining frontier is retired and the
    /// run completes with [`Self::coverage_truncated`] set, so the findings
    /// gathered up to that point are still reported.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if an internal error occurs, or at the end of execution
    /// if any thread failed to execute. Errors that are fatal are forwarded
    /// immediately, while errors that can allow execution to continue are
    /// buffered.
    ///
    /// Note that if this errors, it will still be possible to collect any
    /// stored state information for as far as execution proceeded.
    pub fn execute(&mut self) -> std::result::Result<(), Errors> {
        let poll_interval = self.watchdog.poll_every();
        let mut counter = 0;

        while let Ok(instruction) = self.current_instruction() {
            let instruction_pointer = self.instruction_pointer()?;

            // The budget bounds how many threads are dispatched, not how many
            // are created, so it is checked as part of the loop.
            if self.dispatched_states > self.config.maximum_explored_states {
                tracing::debug!(
                    budget = self.config.maximum_explored_states,
                    "Explored-state budget exhausted, truncating the frontier"
                );
                self.truncate_frontier();
                break;
            }

            // If we have been told to stop, retire the frontier and complete
            // with what was gathered so far.
            if counter % poll_interval == 0 && self.watchdog.should_stop() {
                tracing::debug!("Stopped by the watchdog, truncating the frontier");
                self.truncate_frontier();
                break;
            }

            // We have to mark as being visited beforehand, so this is reflected in any
            // state bifurcations
            self.state()?.register_visit(instruction_pointer);

            self.observe(Phase::Before, instruction_pointer, &instruction);

            let result = instruction.execute(self);
            match result {
                Ok(()) => {
                    self.state()?
                        .record_gas(instruction.min_gas_cost(), instruction.max_gas_cost());
                }
                Err(payload) => {
                    // If execution errored and we are not in permissive error mode, add the error
                    // to the collection of them and then kill the current
                    // thread to continue. If we are in permissive error mode we
                    // will only collect critical errors.
                    match payload.payload {
                        error::execution::Error::InvalidOffsetForJump { .. }
                        | error::execution::Error::InvalidJumpTarget { .. }
                        | error::execution::Error::NonExistentJumpTarget { .. }
                        | error::execution::Error::NoConcreteJumpDestination => {
                            if !self.config.permissive_errors {
                                self.errors.add(payload);
                            }
                        }
                        _ => {
                            self.errors.add(payload);
                        }
                    }
                    self.kill_current_thread();
                }
            }

            self.observe(Phase::After, instruction_pointer, &instruction);

            // This should never be called if there is nothing to advance to, so if it
            // errors we forward it immediately.
            self.advance()?;

            counter += 1;
        }

        // If we reach here, we have run out of things to execute.
        if self.errors.is_empty() {
            // If no errors have resulted, we can return happily.
            Ok(())
        } else {
            // Otherwise we return the descriptive errors.
            Err(self.errors.clone())
        }
    }

    /// Gets the instruction indicated by the current instruction pointer.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread.
    pub fn current_instruction(&self) -> Result<DynOpcode> {
        self.current_thread().map(|thread| thread.instructions().current())
    }

    /// Advances the virtual machine to the next instruction.
    ///
    /// This function handles correctly modifying the instruction pointer and
    /// dealing with the limitations placed on execution. A thread that cannot
    /// be advanced is retired: the detectors see its completed state, and the
    /// state is stored for later collection.
    ///
    /// # Errors
    ///
    /// If the virtual machine cannot be advanced, or if advancing would result
    /// in the virtual machine pointing to an invalid instruction.
    #[allow(clippy::missing_panics_doc)] // All panics are guarded by conditions
    pub fn advance(&mut self) -> Result<()> {
        if self.thread_queue.is_empty() {
            return Err(Error::InvalidStep.locate(self.instructions_len()));
        }

        let instructions_len = self.instructions_len();
        let current_thread = self
            .thread_queue
            .front()
            .expect("We already know a thread is present");
        let instruction_pointer = current_thread.instructions().instruction_pointer();
        let next_offset = instruction_pointer + 1;

        let oob_instruction = next_offset >= instructions_len;
        let exceeded_iteration_limit = oob_instruction
            || current_thread.state().visit_count(next_offset)
                >= self.config.maximum_iterations_per_opcode;

        // The gas limit is applied optimistically, using the lower bound of
        // what the thread may have spent.
        let is_out_of_gas =
            current_thread.state().gas_used().minimum() > self.config.gas_limit;
        let should_die = self.current_thread_killed;

        if exceeded_iteration_limit || is_out_of_gas || should_die {
            // In this case we are at the end of this thread, so we need to collect it and
            // move on by removing it from the queue. We already know that the queue isn't
            // empty, so it's safe to `unwrap`.
            let thread = self
                .thread_queue
                .pop_front()
                .expect("We already know a thread is present");
            self.complete_thread(thread);

            // The thread no longer is the current, so whether it was or wasn't killed the
            // next one certainly isn't.
            self.current_thread_killed = false;

            // If we have run out of gas, mark it as an error.
            if is_out_of_gas {
                self.errors.add_located(instruction_pointer, Error::GasLimitExceeded);
            }

            // If another thread is about to become current, it counts against
            // the explored-state budget.
            if !self.thread_queue.is_empty() {
                self.dispatched_states += 1;
            }
        } else {
            // And then continue execution on the current thread.
            self.current_thread_mut()
                .expect("We already know a thread is present")
                .instructions_mut()
                .step();
        }

        Ok(())
    }

    /// Delivers an observation of `instruction` to the detector registry.
    fn observe(&mut self, phase: Phase, instruction_pointer: u32, instruction: &DynOpcode) {
        let Some(thread) = self.thread_queue.front() else {
            return;
        };
        let observation = Observation {
            phase,
            instruction_pointer,
            instruction,
            state: thread.state(),
        };
        self.detectors.observe(
            &observation,
            self.oracle.as_ref(),
            &mut self.findings,
            &mut self.detector_errors,
        );
    }

    /// Retires `thread`, notifying the detectors that its path has completed
    /// and storing its state for later collection.
    fn complete_thread(&mut self, thread: VMThread) {
        let state = VMState::from(thread);
        self.detectors.thread_complete(
            &state,
            self.oracle.as_ref(),
            &mut self.findings,
            &mut self.detector_errors,
        );
        self.stored_states.push(state);
    }

    /// Retires every thread remaining in the queue without executing it
    /// further, marking the run's coverage as truncated.
    ///
    /// The retired threads' paths never completed, so the detectors are not
    /// notified of their completion; judging an interrupted path would report
    /// weaknesses the missing suffix may well have discharged.
    fn truncate_frontier(&mut self) {
        self.coverage_truncated = true;
        while let Some(thread) = self.thread_queue.pop_front() {
            self.stored_states.push(thread.into());
        }
    }

    /// Gets a handle for the virtual machine stack of the current thread.
    ///
    /// # Getting the Actual Stack
    ///
    /// If you want to get the actual VM stack, rather than the wrapped view
    /// onto it, call `.state()?.stack` instead.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread.
    pub fn stack_handle(&mut self) -> Result<LocatedStackHandle<'_>> {
        let instruction_pointer = self.instruction_pointer()?;
        self.current_thread_mut()
            .map(|thread| thread.state_mut().stack_mut().new_located(instruction_pointer))
    }

    /// Gets the virtual machine state for the thread that is currently being
    /// executed.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread.
    pub fn state(&mut self) -> Result<&mut VMState> {
        self.current_thread_mut().map(VMThread::state_mut)
    }

    /// Gets the execution thread for the thread that is currently being
    /// executed.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread.
    pub fn execution_thread(&self) -> Result<&ExecutionThread> {
        self.current_thread().map(VMThread::instructions)
    }

    /// Gets the current tracking for jump target forks.
    #[must_use]
    pub fn jump_targets(&self) -> &JumpTargets {
        &self.jump_targets
    }

    /// Gets the current value of the instruction pointer for the thread that is
    /// being executed.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread.
    pub fn instruction_pointer(&mut self) -> Result<u32> {
        self.current_thread_mut()
            .map(|thread| thread.instructions_mut().instruction_pointer())
    }

    /// Gets the currently executing virtual machine thread.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread.
    pub fn current_thread(&self) -> Result<&VMThread> {
        self.thread_queue
            .front()
            .ok_or(Error::NoSuchThread.locate(self.instructions_len()))
    }

    /// Gets the currently executing virtual machine thread.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread.
    pub fn current_thread_mut(&mut self) -> Result<&mut VMThread> {
        let offset = self.instructions_len();
        self.thread_queue
            .front_mut()
            .ok_or(Error::NoSuchThread.locate(offset))
    }

    /// Adds a virtual machine thread to the queue of threads to be executed.
    pub fn enqueue_thread(&mut self, thread: VMThread) {
        self.thread_queue.push_back(thread);
    }

    /// Jumps the currently executing thread to `jump_target`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no instruction at `jump_target`, or if the
    /// instruction there is not a [`control::JumpDest`].
    pub fn jump_current_thread(&mut self, jump_target: u32) -> Result<()> {
        let instruction_pointer = self.instruction_pointer()?;
        self.validate_jump_target(jump_target, instruction_pointer)?;

        self.current_thread_mut()?.instructions_mut().jump(jump_target);

        Ok(())
    }

    /// Forks the currently executing thread to `jump_target`, conjoining
    /// `condition` onto the forked thread's path condition and maintaining the
    /// state at the moment of forking in the new thread.
    ///
    /// The new thread is then added to the thread queue to await execution.
    ///
    /// # Fork Bounding
    ///
    /// If `jump_target` has already been forked to
    /// [`Config::maximum_forks_per_fork_target`] times, the fork is refused
    /// silently and the current thread continues alone. This is a bound on
    /// path explosion, not an error in the bytecode.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no instruction at `jump_target`, or if the
    /// instruction there is not a [`control::JumpDest`].
    pub fn fork_current_thread(&mut self, jump_target: u32, condition: BoxedVal) -> Result<()> {
        let instruction_pointer = self.instruction_pointer()?;
        self.validate_jump_target(jump_target, instruction_pointer)?;

        if self.jump_targets.at_fork_limit(jump_target) {
            tracing::debug!(
                jump_target,
                limit = self.config.maximum_forks_per_fork_target,
                "Fork limit reached for the jump target, not forking"
            );
            return Ok(());
        }
        self.jump_targets.mark_forked(jump_target);

        // It is a programmer error to ask for a thread to be forked when none exists,
        // so we forward the error immediately.
        let mut new_thread = self.current_thread_mut()?.fork(jump_target);
        new_thread.state_mut().add_constraint(condition);
        self.enqueue_thread(new_thread);

        Ok(())
    }

    /// Checks that `jump_target` is a valid destination for a jump.
    fn validate_jump_target(&self, jump_target: u32, instruction_pointer: u32) -> Result<()> {
        let instruction = self
            .current_thread()?
            .instructions()
            .instruction(jump_target)
            .ok_or(
                Error::NonExistentJumpTarget {
                    offset: jump_target,
                }
                .locate(instruction_pointer),
            )?;

        if instruction.downcast_ref::<control::JumpDest>().is_none() {
            return Err(Error::InvalidJumpTarget {
                offset: jump_target,
            }
            .locate(instruction_pointer));
        }

        Ok(())
    }

    /// Checks if the current thread has been killed.
    #[must_use]
    pub fn current_thread_killed(&self) -> bool {
        self.current_thread_killed
    }

    /// Says that the current thread has encountered an instruction that forces
    /// it to cease execution.
    pub fn kill_current_thread(&mut self) {
        self.current_thread_killed = true;
    }

    /// Gets the count of remaining threads of execution for this virtual
    /// machine.
    #[must_use]
    pub fn remaining_thread_count(&self) -> usize {
        self.thread_queue.len()
    }

    /// Checks if the virtual machine has any more code to execute.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining_thread_count() == 0
    }

    /// Gets the instruction stream associated with this virtual machine.
    #[must_use]
    pub fn instructions(&self) -> &InstructionStream {
        &self.instructions
    }

    /// Gets the length of the instruction stream.
    ///
    /// # Panics
    ///
    /// Panics if the instructions length exceeds [`u32::MAX`] as this a
    /// programmer error.
    #[must_use]
    pub fn instructions_len(&self) -> u32 {
        self.instructions
            .len()
            .try_into()
            .unwrap_or_else(|_| panic!("Instruction length should not exceed {}", u32::MAX))
    }

    /// Gets the stored states that have resulted from execution in this virtual
    /// machine.
    #[must_use]
    pub fn stored_states(&self) -> &[VMState] {
        self.stored_states.as_slice()
    }

    /// Gets the findings confirmed so far.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        self.findings.as_slice()
    }

    /// Checks whether execution was stopped before the frontier was exhausted.
    #[must_use]
    pub fn coverage_truncated(&self) -> bool {
        self.coverage_truncated
    }

    /// Gets the value [`ValueBuilder`] associated with this VM instance.
    ///
    /// This is used for creating new values without having to manually pass
    /// configuration from the virtual machine to each call to the value
    /// constructor functions.
    #[must_use]
    pub fn build(&self) -> &ValueBuilder {
        &self.builder
    }

    /// Gets the constraint oracle associated with this VM instance.
    #[must_use]
    pub fn oracle(&self) -> &DynOracle {
        &self.oracle
    }

    /// Gets a reference to the virtual machine's watchdog instance, allowing it
    /// to be used for monitoring during loops in the opcode implementations.
    #[must_use]
    pub fn watchdog(&self) -> &DynWatchdog {
        &self.watchdog
    }

    /// Gets a reference to the virtual machine's configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consumes the virtual machine to convert it into the data gathered by
    /// the run, for aggregation into a report.
    #[must_use]
    pub fn consume(self) -> ExecutionResult {
        ExecutionResult {
            instructions: self.instructions,
            states: self.stored_states,
            findings: self.findings,
            errors: self.errors,
            detector_errors: self.detector_errors,
            coverage_truncated: self.coverage_truncated,
        }
    }
}

/// The data gathered by one run of the virtual machine.
#[derive(Debug)]
pub struct ExecutionResult {
    /// The instructions over which the execution result was gathered.
    pub instructions: InstructionStream,

    /// The states that resulted from total symbolic execution of
    /// `instructions`.
    pub states: Vec<VMState>,

    /// The findings confirmed during execution.
    pub findings: Vec<Finding>,

    /// Any errors that arose during execution.
    ///
    /// Note that if `errors` is not empty, the execution result may not have
    /// full coverage of the bytecode. It is recommended to inspect the errors
    /// themselves before continuing to determine if the data is useful to use
    /// as the basis for continued analysis.
    pub errors: Errors,

    /// Any errors raised by the detectors while observing execution.
    pub detector_errors: analysis::Errors,

    /// Whether execution was stopped before the frontier was exhausted,
    /// meaning `findings` may not cover the whole bytecode.
    pub coverage_truncated: bool,
}

/// The configuration for the virtual machine instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// The maximum amount of gas that the virtual machine can consume.
    ///
    /// Note that this limit is applied optimistically, assuming that every
    /// operation takes the minimal amount of gas it can. In reality, execution
    /// on an EVM will not get as far as symbolic execution can here.
    ///
    /// Defaults to [`BLOCK_GAS_LIMIT`].
    pub gas_limit: usize,

    /// The maximum number of times that the virtual machine will visit each
    /// opcode.
    ///
    /// This limit is enforced _per-thread_ in the virtual machine.
    ///
    /// Defaults to [`DEFAULT_ITERATIONS_PER_OPCODE`].
    pub maximum_iterations_per_opcode: usize,

    /// The maximum number of times that the virtual machine will fork from any
    /// conditional jump to a given jump target.
    ///
    /// This limit is enforced globally to prevent exponential blowup of threads
    /// when symbolically executing the bytecode.
    ///
    /// Defaults to [`DEFAULT_CONDITIONAL_JUMP_PER_TARGET_FORK_LIMIT`].
    pub maximum_forks_per_fork_target: usize,

    /// The maximum number of threads of execution that the virtual machine
    /// will dispatch in one run.
    ///
    /// Exceeding this budget is not an error: the remaining frontier is
    /// retired and the run's results carry a coverage caveat instead.
    ///
    /// Defaults to [`DEFAULT_MAXIMUM_EXPLORED_STATES`].
    pub maximum_explored_states: usize,

    /// The maximum number of nodes that a symbolic value can contain before it
    /// is culled.
    ///
    /// Defaults to [`DEFAULT_VALUE_SIZE_LIMIT`].
    pub value_size_limit: usize,

    /// Whether to continue execution when non critical errors happen during
    /// execution.
    pub permissive_errors: bool,
}

impl Config {
    /// Sets the `maximum_forks_per_fork_target` config parameter to `value`.
    #[must_use]
    pub fn with_max_forks_per_fork_target(mut self, value: usize) -> Self {
        self.maximum_forks_per_fork_target = value;
        self
    }

    /// Sets the `maximum_iterations_per_opcode` config parameter to `value`.
    #[must_use]
    pub fn with_max_iterations_per_opcode(mut self, value: usize) -> Self {
        self.maximum_iterations_per_opcode = value;
        self
    }

    /// Sets the `maximum_explored_states` config parameter to `value`.
    #[must_use]
    pub fn with_max_explored_states(mut self, value: usize) -> Self {
        self.maximum_explored_states = value;
        self
    }

    /// Sets the `gas_limit` config parameter to `value`.
    #[must_use]
    pub fn with_gas_limit(mut self, value: usize) -> Self {
        self.gas_limit = value;
        self
    }

    /// Sets the value size limit configuration parameter to `value`.
    #[must_use]
    pub fn with_value_size_limit(mut self, value: usize) -> Self {
        self.value_size_limit = value;
        self
    }

    /// Sets the permissive errors configuration parameter to `value`.
    #[must_use]
    pub fn with_permissive_errors(mut self, value: bool) -> Self {
        self.permissive_errors = value;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        let gas_limit = BLOCK_GAS_LIMIT;
        let maximum_iterations_per_opcode = DEFAULT_ITERATIONS_PER_OPCODE;
        let maximum_forks_per_fork_target = DEFAULT_CONDITIONAL_JUMP_PER_TARGET_FORK_LIMIT;
        let maximum_explored_states = DEFAULT_MAXIMUM_EXPLORED_STATES;
        let value_size_limit = DEFAULT_VALUE_SIZE_LIMIT;
        let permissive_errors = DEFAULT_PERMISSIVE_ERRORS_ENABLED;
        Self {
            gas_limit,
            maximum_iterations_per_opcode,
            maximum_forks_per_fork_target,
            maximum_explored_states,
            value_size_limit,
            permissive_errors,
        }
    }
}

/// A structure that provides an interface to building new
/// [`SymbolicValue`]s with access to the VM's configuration.
///
/// It should be used for building all values that are constructed during the
/// course of execution as it ensures that size invariants are enforced for
/// those values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValueBuilder {
    config: Config,
}

impl ValueBuilder {
    /// Constructs a new value builder with access to the specified `config`.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let config = config.clone();
        Self { config }
    }

    /// Constructs a new bare value at `instruction_pointer` with the specified
    /// `provenance`.
    #[must_use]
    pub fn value(&self, instruction_pointer: u32, provenance: Provenance) -> BoxedVal {
        SymbolicValue::new_value(instruction_pointer, provenance)
    }

    /// Constructs a new symbolic value representing the operation performed at
    /// `instruction_pointer` on the symbolic `data` and with the specified
    /// `provenance`, enforcing [`Config::value_size_limit`].
    #[must_use]
    pub fn symbolic(
        &self,
        instruction_pointer: u32,
        data: SymbolicValueData,
        provenance: Provenance,
    ) -> BoxedVal {
        self.cull(SymbolicValue::new(instruction_pointer, data, provenance))
    }

    /// Constructs a new symbolic value representing the operation performed at
    /// `instruction_pointer` on the symbolic `data` and with its provenance
    /// being [`Provenance::Execution`], enforcing
    /// [`Config::value_size_limit`].
    #[must_use]
    pub fn symbolic_exec(&self, instruction_pointer: u32, data: SymbolicValueData) -> BoxedVal {
        self.symbolic(instruction_pointer, data, Provenance::Execution)
    }

    /// Constructs a new symbolic value representing a known value of
    /// `value_data` created at `instruction_pointer` with the specified
    /// `provenance`.
    #[must_use]
    pub fn known(
        &self,
        instruction_pointer: u32,
        value_data: KnownWord,
        provenance: Provenance,
    ) -> BoxedVal {
        SymbolicValue::new_known(instruction_pointer, value_data, provenance)
    }

    /// Replaces `value` with an opaque synthetic value if its execution tree
    /// has grown beyond the configured size limit.
    ///
    /// Trees that large carry no useful information for the detectors while
    /// making every structural traversal slower, so they are cut off at the
    /// point of construction.
    fn cull(&self, value: BoxedVal) -> BoxedVal {
        if value.node_count() > self.config.value_size_limit {
            tracing::debug!(
                instruction_pointer = value.instruction_pointer,
                limit = self.config.value_size_limit,
                "Culling an oversized symbolic value"
            );
            SymbolicValue::new_value(value.instruction_pointer, Provenance::Synthetic)
        } else {
            value
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use crate::{
        bytecode,
        disassembly::InstructionStream,
        error::execution::{Error, LocatedError},
        opcode::{
            arithmetic::Sub,
            control::{Invalid, JumpDest, JumpI, Return, Stop},
            logic::IsZero,
            memory::{CallDataSize, MStore, PushN, SStore},
        },
        solver::{FoldingOracle, TrivialOracle},
        vm::{Config, VM},
        watchdog::{FlagWatchdog, LazyWatchdog},
    };

    #[test]
    fn can_construct_new_vm() -> anyhow::Result<()> {
        let instructions = util::basic_instruction_stream();
        let vm = VM::new(
            instructions,
            Config::default(),
            TrivialOracle::in_rc(),
            LazyWatchdog.in_rc(),
        )?;

        // A newly-constructed virtual machine should have one thread of
        // execution to explore.
        assert_eq!(vm.remaining_thread_count(), 1);

        Ok(())
    }

    #[test]
    fn vm_executes_on_valid_bytecode() -> anyhow::Result<()> {
        // Create the instruction stream for this VM
        let bytes = bytecode![
            CallDataSize,               // Get a symbolic value
            IsZero,                     // Check if the size is zero
            PushN::new(1, vec![0x0b])?, // Push the jump destination offset onto the stack
            JumpI,                      // Jump if the condition is true
            PushN::new(1, vec![0x00])?, // Value to store
            PushN::new(1, vec![0x00])?, // Key under which to store it
            SStore,                     // Storage
            Invalid::default(),         // Return from this thread with invalid instruction
            JumpDest,                   // The destination for the jump
            PushN::new(1, vec![0xff])?, // The value to store into memory
            PushN::new(1, vec![0x00])?, // The offset in memory to store it at
            MStore,                     // Store to memory
            PushN::new(1, vec![0x01])?, // The size of the data to return
            PushN::new(1, vec![0x00])?, // The location in memory to return
            Return                      // Return from this thread
        ];
        let instructions = InstructionStream::try_from(bytes.as_slice())?;

        // Prepare the vm itself
        let config = Config::default();
        let mut vm = VM::new(
            instructions,
            config,
            TrivialOracle::in_rc(),
            LazyWatchdog.in_rc(),
        )?;

        // Execute the VM
        let result = vm.execute();
        assert!(result.is_ok());

        // Get the analysis data and see what happened
        let data = vm.consume();

        // We should have seen two threads due to the fork point
        assert_eq!(data.states.len(), 2);
        assert!(!data.coverage_truncated);

        // Both threads ran to a terminator, leaving their stacks empty
        assert!(data.states.iter().all(|state| state.stack().is_empty()));

        // The fall-through thread wrote to storage, the jumping thread didn't
        let entry_counts: Vec<usize> = data
            .states
            .iter()
            .map(|state| state.storage().entry_count())
            .collect();
        assert!(entry_counts.contains(&0));
        assert!(entry_counts.contains(&1));

        Ok(())
    }

    #[test]
    fn vm_executes_in_the_presence_of_errors() -> anyhow::Result<()> {
        // The jump targets the middle of a push, which is not a JUMPDEST.
        let bytes = bytecode![
            CallDataSize,               // Get a symbolic value
            IsZero,                     // Check if the size is zero
            PushN::new(1, vec![0x0b])?, // Push an invalid jump destination
            JumpI,                      // Jump if the condition is true
            PushN::new(1, vec![0xff])?, // The value to store into memory
            PushN::new(1, vec![0x00])?, // The offset in memory to store it at
            MStore,                     // Store to memory
            PushN::new(1, vec![0x01])?, // The size of the data to return
            PushN::new(1, vec![0x00])?, // The location in memory to return
            Return                      // Return from this thread
        ];
        let instructions = InstructionStream::try_from(bytes.as_slice())?;

        let mut vm = VM::new(
            instructions,
            Config::default(),
            TrivialOracle::in_rc(),
            LazyWatchdog.in_rc(),
        )?;

        let result = vm.execute();
        let errors = result.expect_err("Execution did not error");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.payloads()[0],
            LocatedError {
                location: 4,
                payload:  Error::InvalidJumpTarget { offset: 11 },
            }
        );

        // The thread died at the failed fork, so only one state was stored.
        let data = vm.consume();
        assert_eq!(data.states.len(), 1);

        Ok(())
    }

    #[test]
    fn permissive_mode_suppresses_jump_errors() -> anyhow::Result<()> {
        let bytes = bytecode![
            CallDataSize,
            IsZero,
            PushN::new(1, vec![0x0b])?,
            JumpI,
            Stop
        ];
        let instructions = InstructionStream::try_from(bytes.as_slice())?;

        let mut vm = VM::new(
            instructions,
            Config::default().with_permissive_errors(true),
            TrivialOracle::in_rc(),
            LazyWatchdog.in_rc(),
        )?;

        assert!(vm.execute().is_ok());

        Ok(())
    }

    #[test]
    fn forking_respects_the_per_target_limit() -> anyhow::Result<()> {
        let bytes = bytecode![
            CallDataSize,               // Get a symbolic value
            IsZero,                     // A symbolic branch condition
            PushN::new(1, vec![0x06])?, // The jump destination offset
            JumpI,                      // Fork point
            Stop,                       // Fall-through terminator
            JumpDest,                   // The destination for the jump
            JumpDest,                   // Passed through by the jumping thread
            Stop                        // Jumping terminator
        ];
        let instructions = InstructionStream::try_from(bytes.as_slice())?;

        // With the fork limit at zero, only the fall-through path executes.
        let mut vm = VM::new(
            InstructionStream::try_from(bytes.as_slice())?,
            Config::default().with_max_forks_per_fork_target(0),
            TrivialOracle::in_rc(),
            LazyWatchdog.in_rc(),
        )?;
        assert!(vm.execute().is_ok());
        assert_eq!(vm.stored_states().len(), 1);

        // With the default limit, both paths execute.
        let mut vm = VM::new(
            instructions,
            Config::default(),
            TrivialOracle::in_rc(),
            LazyWatchdog.in_rc(),
        )?;
        assert!(vm.execute().is_ok());
        assert_eq!(vm.stored_states().len(), 2);
        assert_eq!(vm.jump_targets().fork_count(6), 1);

        Ok(())
    }

    #[test]
    fn exhausting_the_state_budget_truncates_coverage() -> anyhow::Result<()> {
        let bytes = bytecode![CallDataSize, Stop];
        let instructions = InstructionStream::try_from(bytes.as_slice())?;

        let mut vm = VM::new(
            instructions,
            Config::default().with_max_explored_states(0),
            TrivialOracle::in_rc(),
            LazyWatchdog.in_rc(),
        )?;

        // Truncation is not an error.
        assert!(vm.execute().is_ok());

        let data = vm.consume();
        assert!(data.coverage_truncated);
        assert!(data.findings.is_empty());
        assert_eq!(data.states.len(), 1);

        Ok(())
    }

    #[test]
    fn the_watchdog_truncates_instead_of_erroring() -> anyhow::Result<()> {
        let bytes = bytecode![CallDataSize, Stop];
        let instructions = InstructionStream::try_from(bytes.as_slice())?;

        let flag = Arc::new(AtomicBool::new(false));
        flag.store(true, Ordering::Relaxed);
        let watchdog = FlagWatchdog::new(flag).polling_every(1).in_rc();

        let mut vm = VM::new(
            instructions,
            Config::default(),
            TrivialOracle::in_rc(),
            watchdog,
        )?;

        assert!(vm.execute().is_ok());
        assert!(vm.coverage_truncated());

        Ok(())
    }

    #[test]
    fn detectors_report_findings_during_execution() -> anyhow::Result<()> {
        // Computes 1 - 2, which wraps.
        let bytes = bytecode![
            PushN::new(1, vec![0x02])?, // The subtrahend
            PushN::new(1, vec![0x01])?, // The minuend
            Sub,                        // Underflows
            Stop
        ];
        let instructions = InstructionStream::try_from(bytes.as_slice())?;

        let mut vm = VM::new(
            instructions,
            Config::default(),
            FoldingOracle::in_rc(),
            LazyWatchdog.in_rc(),
        )?;

        assert!(vm.execute().is_ok());

        let data = vm.consume();
        assert!(data.detector_errors.is_empty());
        assert_eq!(data.findings.len(), 1);
        assert_eq!(data.findings[0].title, "Integer Underflow");
        assert_eq!(data.findings[0].instruction_pointer, 4);

        Ok(())
    }

    #[test]
    fn constrained_arithmetic_is_not_reported() -> anyhow::Result<()> {
        // Computes 2 - 1, which cannot wrap.
        let bytes = bytecode![
            PushN::new(1, vec![0x01])?,
            PushN::new(1, vec![0x02])?,
            Sub,
            Stop
        ];
        let instructions = InstructionStream::try_from(bytes.as_slice())?;

        let mut vm = VM::new(
            instructions,
            Config::default(),
            FoldingOracle::in_rc(),
            LazyWatchdog.in_rc(),
        )?;

        assert!(vm.execute().is_ok());
        assert!(vm.findings().is_empty());

        Ok(())
    }

    /// Utilities for aiding in the testing of the virtual machine.
    mod util {
        use crate::disassembly::InstructionStream;

        /// Constructs a basic instruction stream for testing purposes.
        pub fn basic_instruction_stream() -> InstructionStream {
            let bytes: Vec<u8> = vec![
                0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x10, 0x11,
                0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x20, 0x30,
                0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x3b, 0x3c, 0x3d, 0x3e,
            ];

            InstructionStream::try_from(bytes.as_slice()).unwrap()
        }
    }
}
