//! Opcodes that deal with control flow on the EVM.

use ethnum::U256;
use uuid::Uuid;

use crate::{
    constant::WORD_SIZE_BITS,
    error::{
        container::Locatable,
        execution::{Error, LocatedError},
    },
    opcode::{ExecuteResult, Opcode},
    vm::{
        state::call_frame::{CallFrame, CallKind, CallRecord},
        value::{known::KnownWord, BoxedVal, Provenance, SymbolicValueData},
        VM,
    },
};

/// The `STOP` opcode halts execution on the current thread.
///
/// # Semantics
///
/// | Stack Index | Input | Output |
/// | :---------: | :---: | :----: |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Stop;

impl Opcode for Stop {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // The thread of execution ends here
        vm.kill_current_thread();

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        0
    }

    fn arg_count(&self) -> usize {
        0
    }

    fn as_text_code(&self) -> String {
        "STOP".into()
    }

    fn as_byte(&self) -> u8 {
        0x00
    }
}

/// The `JUMP` opcode alters the program counter to a new offset in the code.
///
/// The destination `counter` must be a [`JumpDest`] instruction.
///
/// # Semantics
///
/// | Stack Index | Input     | Output |
/// | :---------: | :-------: | :----: |
/// | 1           | `counter` |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas, if there are not enough
/// operands on the stack, or if the destination is not a [`JumpDest`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Jump;

impl Opcode for Jump {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the jump target from the stack
        let counter = stack.pop()?;
        let offset = resolve_jump_target(&counter, instruction_pointer)?;

        // Perform the jump
        vm.jump_current_thread(offset)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        8
    }

    fn arg_count(&self) -> usize {
        1
    }

    fn as_text_code(&self) -> String {
        "JUMP".into()
    }

    fn as_byte(&self) -> u8 {
        0x56
    }
}

/// The `JUMPI` opcode conditionally alters the program counter.
///
/// The destination `counter` must be a [`JumpDest`] instruction, and the jump
/// is performed only if `condition` is not zero.
///
/// # Forking
///
/// Where the `condition` cannot be resolved to a constant, both outcomes of
/// the branch are possible. Each outcome is queried against the machine's
/// constraint oracle under the current path condition; if both survive, the
/// thread is forked, with the fork taking the jump under the `condition` and
/// the current thread falling through under its negation. Outcomes the oracle
/// proves unsatisfiable are not executed.
///
/// A branch on a call's success value is also what marks that call as checked
/// for return-value tracking.
///
/// # Semantics
///
/// | Stack Index | Input       | Output |
/// | :---------: | :---------: | :----: |
/// | 1           | `counter`   |        |
/// | 2           | `condition` |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas, if there are not enough
/// operands on the stack, or if the destination is not a [`JumpDest`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct JumpI;

impl Opcode for JumpI {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the jump target and condition from the stack
        let counter = stack.pop()?;
        let condition = stack.pop()?;
        let offset = resolve_jump_target(&counter, instruction_pointer)?;

        // Branching on a value is what constitutes checking it
        vm.state()?.mark_call_results_checked(&condition);

        match condition.constant_fold(WORD_SIZE_BITS) {
            // The condition is concretely true, so the jump is always taken
            Some(word) if bool::from(word) => vm.jump_current_thread(offset)?,

            // The condition is concretely false, so execution falls through
            Some(_) => (),

            // The condition is symbolic, so both outcomes have to be
            // considered
            None => {
                let negation = vm.build().symbolic_exec(
                    instruction_pointer,
                    SymbolicValueData::IsZero {
                        number: condition.clone(),
                    },
                );

                let state = vm.state()?;
                let take_query = state.path_condition().conjoined_with(condition.clone());
                let fall_query = state.path_condition().conjoined_with(negation.clone());
                let may_take = vm.oracle().check(&take_query).may_hold();
                let may_fall = vm.oracle().check(&fall_query).may_hold();

                match (may_take, may_fall) {
                    (true, true) => {
                        vm.fork_current_thread(offset, condition)?;
                        vm.state()?.add_constraint(negation);
                    }
                    (true, false) => {
                        vm.state()?.add_constraint(condition);
                        vm.jump_current_thread(offset)?;
                    }
                    (false, true) => vm.state()?.add_constraint(negation),

                    // Neither outcome of the branch is reachable, so the
                    // thread itself is unreachable
                    (false, false) => vm.kill_current_thread(),
                }
            }
        }

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        10
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "JUMPI".into()
    }

    fn as_byte(&self) -> u8 {
        0x57
    }
}

/// Resolves the provided jump `counter` to a concrete byte offset in the
/// instruction stream.
///
/// # Errors
///
/// If the counter does not fold to a constant, or folds to a constant too
/// large to be an offset in the bytecode.
fn resolve_jump_target(
    counter: &BoxedVal,
    instruction_pointer: u32,
) -> Result<u32, LocatedError> {
    let word = counter
        .constant_fold(WORD_SIZE_BITS)
        .ok_or(Error::NoConcreteJumpDestination.locate(instruction_pointer))?;

    let value = U256::from(word);
    if value > U256::from(u32::MAX) {
        return Err(Error::InvalidOffsetForJump { data: word }.locate(instruction_pointer));
    }

    Ok(value.as_u32())
}

/// The `PC` opcode gets the value of the program counter prior to the
/// increment corresponding to this instruction.
///
/// # Semantics
///
/// | Stack Index | Input | Output    |
/// | :---------: | :---: | :-------: |
/// | 1           |       | `counter` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PC;

impl Opcode for PC {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm.build().known(
            instruction_pointer,
            KnownWord::new(instruction_pointer),
            Provenance::Execution,
        );
        let mut stack = vm.stack_handle()?;
        stack.push(value)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        2
    }

    fn arg_count(&self) -> usize {
        0
    }

    fn as_text_code(&self) -> String {
        "PC".into()
    }

    fn as_byte(&self) -> u8 {
        0x58
    }
}

/// The `JUMPDEST` opcode marks a valid destination for a jump.
///
/// It makes no change to the machine state when executed.
///
/// # Semantics
///
/// | Stack Index | Input | Output |
/// | :---------: | :---: | :----: |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct JumpDest;

impl Opcode for JumpDest {
    fn execute(&self, _vm: &mut VM) -> ExecuteResult {
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        1
    }

    fn arg_count(&self) -> usize {
        0
    }

    fn as_text_code(&self) -> String {
        "JUMPDEST".into()
    }

    fn as_byte(&self) -> u8 {
        0x5b
    }
}

/// Performs the common portion of the call-family opcodes.
///
/// The callee's code is not available to the analysis, so the call frame is
/// entered and left in a single step; it exists to resolve the execution
/// context the callee would observe. The call's return data and boolean
/// success value are opaque, and the latter is registered with the state for
/// return-value tracking.
fn perform_call(vm: &mut VM, kind: CallKind, has_value: bool) -> ExecuteResult {
    // Get the stack and environment data
    let instruction_pointer = vm.instruction_pointer()?;
    let mut stack = vm.stack_handle()?;

    // Get the operands from the stack
    let _gas = stack.pop()?;
    let callee = stack.pop()?;
    let value = if has_value { Some(stack.pop()?) } else { None };
    let args_offset = stack.pop()?;
    let _args_size = stack.pop()?;
    let ret_offset = stack.pop()?;
    let _ret_size = stack.pop()?;

    // The input to the call is whatever was written to memory at the argument
    // offset
    let input = vm.state()?.memory_mut().load(&args_offset).clone();

    // Calls without an explicit value operand still have one in their frame
    let value = match value {
        Some(value) => value,
        None => match kind {
            // A delegated call preserves the value of the enclosing call
            CallKind::DelegateCall => vm.state()?.call_stack().current().value().clone(),
            _ => vm.build().known(
                instruction_pointer,
                KnownWord::zero(),
                Provenance::Synthetic,
            ),
        },
    };

    // Enter and leave the callee's frame
    let frame = CallFrame::child_of(
        vm.state()?.call_stack().current(),
        kind,
        callee.clone(),
        value,
        input,
    );
    vm.state()?
        .call_stack_mut()
        .push(frame)
        .locate(instruction_pointer)?;
    vm.state()?
        .call_stack_mut()
        .pop()
        .locate(instruction_pointer)?;

    // Whatever the callee returned is opaque
    let data = vm
        .build()
        .value(instruction_pointer, Provenance::Execution);
    vm.state()?.memory_mut().store(ret_offset, data);

    // The success value is pushed onto the stack and registered for
    // return-value tracking
    let id = Uuid::new_v4();
    let result = vm
        .build()
        .symbolic_exec(instruction_pointer, SymbolicValueData::CallResult { id });
    vm.stack_handle()?.push(result.clone())?;
    vm.state()?.record_call(CallRecord {
        instruction_pointer,
        kind,
        callee,
        result,
        result_id: id,
        checked: false,
    });

    // Done, so return ok
    Ok(())
}

/// The `CALL` opcode performs a message call into another account.
///
/// # Semantics
///
/// | Stack Index | Input        | Output    |
/// | :---------: | :----------: | :-------: |
/// | 1           | `gas`        | `success` |
/// | 2           | `address`    |           |
/// | 3           | `value`      |           |
/// | 4           | `argsOffset` |           |
/// | 5           | `argsSize`   |           |
/// | 6           | `retOffset`  |           |
/// | 7           | `retSize`    |           |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Call;

impl Opcode for Call {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        perform_call(vm, CallKind::Call, true)
    }

    fn min_gas_cost(&self) -> usize {
        700
    }

    fn max_gas_cost(&self) -> usize {
        // 700 + 9000 where value is transferred + 25000 where the target
        // account is new.
        34_700
    }

    fn arg_count(&self) -> usize {
        7
    }

    fn as_text_code(&self) -> String {
        "CALL".into()
    }

    fn as_byte(&self) -> u8 {
        0xf1
    }
}

/// The `CALLCODE` opcode performs a message call into the current account
/// using another account's code.
///
/// The callee's code executes against the _caller's_ storage and balance.
/// This behaviour is nearly always a mistake in modern code, which should use
/// [`DelegateCall`] instead.
///
/// # Semantics
///
/// | Stack Index | Input        | Output    |
/// | :---------: | :----------: | :-------: |
/// | 1           | `gas`        | `success` |
/// | 2           | `address`    |           |
/// | 3           | `value`      |           |
/// | 4           | `argsOffset` |           |
/// | 5           | `argsSize`   |           |
/// | 6           | `retOffset`  |           |
/// | 7           | `retSize`    |           |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CallCode;

impl Opcode for CallCode {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        perform_call(vm, CallKind::CallCode, true)
    }

    fn min_gas_cost(&self) -> usize {
        700
    }

    fn max_gas_cost(&self) -> usize {
        34_700
    }

    fn arg_count(&self) -> usize {
        7
    }

    fn as_text_code(&self) -> String {
        "CALLCODE".into()
    }

    fn as_byte(&self) -> u8 {
        0xf2
    }
}

/// The `RETURN` opcode halts execution, returning output data.
///
/// The returned data is read from memory at `offset` over a `size` in bytes.
///
/// # Semantics
///
/// | Stack Index | Input    | Output |
/// | :---------: | :------: | :----: |
/// | 1           | `offset` |        |
/// | 2           | `size`   |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Return;

impl Opcode for Return {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack
        let mut stack = vm.stack_handle()?;

        // The returned data makes no difference to the analysis
        stack.pop()?;
        stack.pop()?;

        // The thread of execution ends here
        vm.kill_current_thread();

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        0
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "RETURN".into()
    }

    fn as_byte(&self) -> u8 {
        0xf3
    }
}

/// The `DELEGATECALL` opcode performs a message call into the current account
/// using another account's code, preserving the current values of
/// `msg.sender` and `msg.value`.
///
/// # Semantics
///
/// | Stack Index | Input        | Output    |
/// | :---------: | :----------: | :-------: |
/// | 1           | `gas`        | `success` |
/// | 2           | `address`    |           |
/// | 3           | `argsOffset` |           |
/// | 4           | `argsSize`   |           |
/// | 5           | `retOffset`  |           |
/// | 6           | `retSize`    |           |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DelegateCall;

impl Opcode for DelegateCall {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        perform_call(vm, CallKind::DelegateCall, false)
    }

    fn min_gas_cost(&self) -> usize {
        700
    }

    fn max_gas_cost(&self) -> usize {
        34_700
    }

    fn arg_count(&self) -> usize {
        6
    }

    fn as_text_code(&self) -> String {
        "DELEGATECALL".into()
    }

    fn as_byte(&self) -> u8 {
        0xf4
    }
}

/// The `STATICCALL` opcode performs a message call that forbids any state
/// modification in the callee.
///
/// # Semantics
///
/// | Stack Index | Input        | Output    |
/// | :---------: | :----------: | :-------: |
/// | 1           | `gas`        | `success` |
/// | 2           | `address`    |           |
/// | 3           | `argsOffset` |           |
/// | 4           | `argsSize`   |           |
/// | 5           | `retOffset`  |           |
/// | 6           | `retSize`    |           |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StaticCall;

impl Opcode for StaticCall {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        perform_call(vm, CallKind::StaticCall, false)
    }

    fn min_gas_cost(&self) -> usize {
        700
    }

    fn max_gas_cost(&self) -> usize {
        34_700
    }

    fn arg_count(&self) -> usize {
        6
    }

    fn as_text_code(&self) -> String {
        "STATICCALL".into()
    }

    fn as_byte(&self) -> u8 {
        0xfa
    }
}

/// The `REVERT` opcode halts execution, reverting all state changes and
/// returning the data at `offset` over a `size` in bytes.
///
/// # Semantics
///
/// | Stack Index | Input    | Output |
/// | :---------: | :------: | :----: |
/// | 1           | `offset` |        |
/// | 2           | `size`   |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Revert;

impl Opcode for Revert {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack
        let mut stack = vm.stack_handle()?;

        // The revert data makes no difference to the analysis
        stack.pop()?;
        stack.pop()?;

        // The thread of execution ends here
        vm.kill_current_thread();

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        0
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "REVERT".into()
    }

    fn as_byte(&self) -> u8 {
        0xfd
    }
}

/// The `INVALID` opcode is an explicitly invalid instruction that reverts
/// execution.
///
/// Any byte that does not correspond to a known opcode is represented as an
/// instance of this opcode, retaining the original byte. This is commonly the
/// result of executing into CBOR metadata.
///
/// # Semantics
///
/// | Stack Index | Input | Output |
/// | :---------: | :---: | :----: |
///
/// # Errors
///
/// Execution always reverts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Invalid {
    byte: u8,
}

impl Invalid {
    /// Creates an invalid opcode that retains the `byte` it was parsed from.
    #[must_use]
    pub fn new(byte: u8) -> Self {
        Self { byte }
    }
}

impl Default for Invalid {
    fn default() -> Self {
        Self::new(0xfe)
    }
}

impl Opcode for Invalid {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // The thread of execution reverts here
        vm.kill_current_thread();

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        0
    }

    fn arg_count(&self) -> usize {
        0
    }

    fn as_text_code(&self) -> String {
        "INVALID".into()
    }

    fn as_byte(&self) -> u8 {
        self.byte
    }
}

/// The `NOP` opcode is not a true EVM opcode, and instead pads the
/// instruction stream so that instruction offsets match byte offsets in the
/// presence of `PUSHN` data.
///
/// It makes no change to the machine state when executed, and encodes to no
/// bytes at all.
///
/// # Semantics
///
/// | Stack Index | Input | Output |
/// | :---------: | :---: | :----: |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Nop;

impl Opcode for Nop {
    fn execute(&self, _vm: &mut VM) -> ExecuteResult {
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        0
    }

    fn arg_count(&self) -> usize {
        0
    }

    fn as_text_code(&self) -> String {
        "NOP".into()
    }

    fn as_byte(&self) -> u8 {
        // This opcode never exists in real instruction streams, so the byte
        // here is only a placeholder.
        0x00
    }

    fn encode(&self) -> Vec<u8> {
        vec![]
    }
}
