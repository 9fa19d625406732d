//! This module contains the definition of the [`VMThread`] type, representing
//! the divergent execution paths that can be taken during symbolic execution.

use crate::{disassembly::ExecutionThread, vm::state::VMState};

/// A `VMThread` is a representation of a given execution path during the course
/// of symbolic execution.
///
/// The construct can be forked at will to represent the branches in execution,
/// but contains no logic for performing that execution itself.
#[derive(Clone, Debug)]
pub struct VMThread {
    /// The virtual machine's state for this thread of execution.
    state: VMState,

    /// The instruction stream and instruction pointer.
    thread: ExecutionThread,
}

impl VMThread {
    /// Constructs a new virtual machine thread with `state` as the initial
    /// state at `thread.instruction_pointer()`.
    #[must_use]
    pub fn new(state: VMState, thread: ExecutionThread) -> Self {
        Self { state, thread }
    }

    /// Gets the current virtual machine state for this virtual machine thread.
    #[must_use]
    pub fn state(&self) -> &VMState {
        &self.state
    }

    /// Gets the current virtual machine state for this virtual machine thread.
    #[must_use]
    pub fn state_mut(&mut self) -> &mut VMState {
        &mut self.state
    }

    /// Gets the instruction stream and current execution position associated
    /// with this virtual machine thread.
    #[must_use]
    pub fn instructions(&self) -> &ExecutionThread {
        &self.thread
    }

    /// Gets the instruction stream and current execution position associated
    /// with this virtual machine thread.
    #[must_use]
    pub fn instructions_mut(&mut self) -> &mut ExecutionThread {
        &mut self.thread
    }

    /// Forks the virtual machine thread at the current point of execution,
    /// jumping the new thread to `target` and leaving the current thread at the
    /// current point of execution.
    ///
    /// This method performs no validation as to whether the fork point is a
    /// valid fork point. This is up to the VM itself.
    #[must_use]
    pub fn fork(&self, target: u32) -> Self {
        let instruction_pointer = self.thread.instruction_pointer();
        let state = self.state.fork(instruction_pointer);
        let mut thread = self.thread.clone();
        let _ = thread.at(target);

        Self { state, thread }
    }
}

impl From<VMThread> for VMState {
    fn from(value: VMThread) -> Self {
        value.state
    }
}
