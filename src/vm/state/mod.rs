//! The state representation for the symbolic virtual machine, and utilities
//! for dealing with said representation.

pub mod call_frame;
pub mod memory;
pub mod path;
pub mod stack;
pub mod storage;

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::vm::{
    state::{
        call_frame::{CallFrame, CallRecord, CallStack},
        memory::Memory,
        path::PathCondition,
        stack::Stack,
        storage::Storage,
    },
    value::{BoxedVal, Provenance, SymbolicValue, SymbolicValueData},
};

/// The state representation for the [`super::VM`].
///
/// It contains the stack, memory, and storage of a single thread of
/// execution, together with the call stack, the path condition under which
/// the thread is executing, the record of call results seen so far, and the
/// gas accounting for the thread.
///
/// # Forking
///
/// States are forked at conditional jumps. A fork is a plain clone: the
/// containers are copied, while all of the symbolic values within them are
/// shared by reference. As values are immutable this sharing is never
/// observable, and mutations to one fork (new stack slots, new constraints)
/// never appear in the other.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VMState {
    /// The point at which this state was forked from its parent, or 0 for
    /// the initial state of the execution.
    fork_point: u32,

    /// The virtual machine's stack.
    stack: Stack,

    /// The virtual machine's transient memory.
    memory: Memory,

    /// The virtual machine's persistent storage.
    storage: Storage,

    /// The stack of message-call contexts.
    call_stack: CallStack,

    /// The conjunction of constraints under which this thread executes.
    path_condition: PathCondition,

    /// The call-family instructions executed on this thread so far.
    call_records: Vec<CallRecord>,

    /// The range of gas used by this thread so far.
    gas_used: GasRange,

    /// The number of times each instruction has been executed on this thread.
    visited_instructions: HashMap<u32, usize>,
}

impl VMState {
    /// Constructs a new virtual machine state, seeding the entry call frame
    /// with symbolic values describing the transaction environment.
    #[must_use]
    pub fn new() -> Self {
        let caller = SymbolicValue::new(0, SymbolicValueData::Caller, Provenance::Environment);
        let callee = SymbolicValue::new(0, SymbolicValueData::Address, Provenance::Environment);
        let value = SymbolicValue::new(0, SymbolicValueData::CallValue, Provenance::Environment);
        let input = SymbolicValue::new_value(0, Provenance::MessageData);
        let entry = CallFrame::entry(caller, callee, value, input);

        Self {
            fork_point: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            storage: Storage::new(),
            call_stack: CallStack::new(entry),
            path_condition: PathCondition::new(),
            call_records: Vec::new(),
            gas_used: GasRange::default(),
            visited_instructions: HashMap::new(),
        }
    }

    /// Forks this state at `fork_point`, producing an independent state that
    /// shares all of its symbolic values with this one.
    #[must_use]
    pub fn fork(&self, fork_point: u32) -> Self {
        let mut forked = self.clone();
        forked.fork_point = fork_point;
        forked
    }

    /// Gets the point at which this state was forked from its parent.
    #[must_use]
    pub fn fork_point(&self) -> u32 {
        self.fork_point
    }

    /// Gets the state's stack.
    #[must_use]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Gets the state's stack mutably.
    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    /// Gets the state's memory.
    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Gets the state's memory mutably.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Gets the state's storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Gets the state's storage mutably.
    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    /// Gets the state's call stack.
    #[must_use]
    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    /// Gets the state's call stack mutably.
    pub fn call_stack_mut(&mut self) -> &mut CallStack {
        &mut self.call_stack
    }

    /// Gets the path condition under which this thread executes.
    #[must_use]
    pub fn path_condition(&self) -> &PathCondition {
        &self.path_condition
    }

    /// Conjoins `constraint` onto this thread's path condition.
    pub fn add_constraint(&mut self, constraint: BoxedVal) {
        self.path_condition.push(constraint);
    }

    /// Records a call-family instruction executed on this thread.
    pub fn record_call(&mut self, record: CallRecord) {
        self.call_records.push(record);
    }

    /// Gets the call-family instructions executed on this thread so far.
    #[must_use]
    pub fn call_records(&self) -> &[CallRecord] {
        self.call_records.as_slice()
    }

    /// Marks as checked every call record whose success value occurs in the
    /// provided branch `condition`.
    pub fn mark_call_results_checked(&mut self, condition: &BoxedVal) {
        let mut checked_ids: HashSet<Uuid> = HashSet::new();
        condition.walk(&mut |node| {
            if let SymbolicValueData::CallResult { id } = &node.data {
                checked_ids.insert(*id);
            }
        });

        for record in &mut self.call_records {
            if checked_ids.contains(&record.result_id) {
                record.checked = true;
            }
        }
    }

    /// Gets the call records whose success values were never consumed by a
    /// conditional branch on this thread.
    #[must_use]
    pub fn unchecked_call_records(&self) -> Vec<&CallRecord> {
        self.call_records.iter().filter(|record| !record.checked).collect()
    }

    /// Gets the range of gas used by this thread so far.
    #[must_use]
    pub fn gas_used(&self) -> GasRange {
        self.gas_used
    }

    /// Adds the gas cost range of one instruction to the thread's gas
    /// accounting.
    pub fn record_gas(&mut self, minimum: usize, maximum: usize) {
        self.gas_used.add(minimum, maximum);
    }

    /// Registers a visit to the instruction at `instruction_pointer`,
    /// returning the total number of visits made to it on this thread.
    pub fn register_visit(&mut self, instruction_pointer: u32) -> usize {
        let count = self.visited_instructions.entry(instruction_pointer).or_insert(0);
        *count += 1;
        *count
    }

    /// Gets the number of times the instruction at `instruction_pointer` has
    /// been executed on this thread.
    #[must_use]
    pub fn visit_count(&self, instruction_pointer: u32) -> usize {
        self.visited_instructions
            .get(&instruction_pointer)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for VMState {
    fn default() -> Self {
        Self::new()
    }
}

/// The `[minimum, maximum]` range of gas that a thread of execution may have
/// used at a given program point.
///
/// Symbolic execution cannot know the dynamic portion of most gas costs, so
/// each instruction contributes an interval rather than a point value.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GasRange {
    minimum: usize,
    maximum: usize,
}

impl GasRange {
    /// Gets the lower bound of the range.
    #[must_use]
    pub fn minimum(&self) -> usize {
        self.minimum
    }

    /// Gets the upper bound of the range.
    #[must_use]
    pub fn maximum(&self) -> usize {
        self.maximum
    }

    /// Widens the range by the gas interval of one instruction.
    pub fn add(&mut self, minimum: usize, maximum: usize) {
        self.minimum = self.minimum.saturating_add(minimum);
        self.maximum = self.maximum.saturating_add(maximum);
    }
}

#[cfg(test)]
mod test {
    use uuid::Uuid;

    use crate::vm::{
        state::{call_frame::CallRecord, VMState},
        value::{Provenance, SymbolicValue, SymbolicValueData},
    };

    #[test]
    fn forks_share_values_but_not_mutations() {
        let mut state = VMState::new();
        let value = SymbolicValue::new_value(0, Provenance::Synthetic);
        state.stack_mut().push(value).unwrap();

        let mut forked = state.fork(7);
        assert_eq!(forked.fork_point(), 7);
        assert_eq!(forked.stack().size(), 1);

        forked
            .stack_mut()
            .push(SymbolicValue::new_value(1, Provenance::Synthetic))
            .unwrap();
        assert_eq!(forked.stack().size(), 2);
        assert_eq!(state.stack().size(), 1);
    }

    #[test]
    fn visit_counts_accumulate() {
        let mut state = VMState::new();
        assert_eq!(state.visit_count(3), 0);
        assert_eq!(state.register_visit(3), 1);
        assert_eq!(state.register_visit(3), 2);
        assert_eq!(state.visit_count(3), 2);
    }

    #[test]
    fn gas_accounting_widens_the_range() {
        let mut state = VMState::new();
        state.record_gas(3, 3);
        state.record_gas(700, 34_700);

        assert_eq!(state.gas_used().minimum(), 703);
        assert_eq!(state.gas_used().maximum(), 34_703);
    }

    #[test]
    fn branch_conditions_mark_call_results_checked() {
        let mut state = VMState::new();
        let id = Uuid::new_v4();
        let result = SymbolicValue::new(
            5,
            SymbolicValueData::CallResult { id },
            Provenance::Execution,
        );
        state.record_call(CallRecord {
            instruction_pointer: 5,
            kind: crate::vm::state::call_frame::CallKind::Call,
            callee: SymbolicValue::new_value(5, Provenance::MessageData),
            result: result.clone(),
            result_id: id,
            checked: false,
        });

        assert_eq!(state.unchecked_call_records().len(), 1);

        let condition = SymbolicValue::new(
            6,
            SymbolicValueData::IsZero { number: result },
            Provenance::Execution,
        );
        state.mark_call_results_checked(&condition);

        assert!(state.unchecked_call_records().is_empty());
    }
}
