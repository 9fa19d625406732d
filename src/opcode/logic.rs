//! Opcodes that perform logical operations on the EVM.

use crate::{
    opcode::{ExecuteResult, Opcode},
    vm::{value::SymbolicValueData, VM},
};

/// The `LT` opcode performs an unsigned less-than comparison.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a < b`     |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Lt;

impl Opcode for Lt {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let left = stack.pop()?;
        let right = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Lt { left, right });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "LT".into()
    }

    fn as_byte(&self) -> u8 {
        0x10
    }
}

/// The `GT` opcode performs an unsigned greater-than comparison.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a > b`     |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Gt;

impl Opcode for Gt {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let left = stack.pop()?;
        let right = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Gt { left, right });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "GT".into()
    }

    fn as_byte(&self) -> u8 {
        0x11
    }
}

/// The `SLT` opcode performs a signed less-than comparison.
///
/// The operands are interpreted as two's complement words.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a < b`     |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SLt;

impl Opcode for SLt {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let left = stack.pop()?;
        let right = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::SLt { left, right });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "SLT".into()
    }

    fn as_byte(&self) -> u8 {
        0x12
    }
}

/// The `SGT` opcode performs a signed greater-than comparison.
///
/// The operands are interpreted as two's complement words.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a > b`     |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SGt;

impl Opcode for SGt {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let left = stack.pop()?;
        let right = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::SGt { left, right });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "SGT".into()
    }

    fn as_byte(&self) -> u8 {
        0x13
    }
}

/// The `EQ` opcode performs an equality comparison.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a == b`    |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Eq;

impl Opcode for Eq {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let left = stack.pop()?;
        let right = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Eq { left, right });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "EQ".into()
    }

    fn as_byte(&self) -> u8 {
        0x14
    }
}

/// The `ISZERO` opcode checks if its operand is zero.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a == 0`    |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IsZero;

impl Opcode for IsZero {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operand from the stack
        let number = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::IsZero { number });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        1
    }

    fn as_text_code(&self) -> String {
        "ISZERO".into()
    }

    fn as_byte(&self) -> u8 {
        0x15
    }
}

/// The `AND` opcode performs a bitwise conjunction.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a & b`     |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct And;

impl Opcode for And {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let left = stack.pop()?;
        let right = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::And { left, right });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "AND".into()
    }

    fn as_byte(&self) -> u8 {
        0x16
    }
}

/// The `OR` opcode performs a bitwise disjunction.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a \| b`    |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Or;

impl Opcode for Or {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let left = stack.pop()?;
        let right = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Or { left, right });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "OR".into()
    }

    fn as_byte(&self) -> u8 {
        0x17
    }
}

/// The `XOR` opcode performs a bitwise exclusive disjunction.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a ^ b`     |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Xor;

impl Opcode for Xor {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let left = stack.pop()?;
        let right = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Xor { left, right });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "XOR".into()
    }

    fn as_byte(&self) -> u8 {
        0x18
    }
}

/// The `NOT` opcode performs a bitwise negation.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `~a`        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Not;

impl Opcode for Not {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operand from the stack
        let value = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Not { value });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        1
    }

    fn as_text_code(&self) -> String {
        "NOT".into()
    }

    fn as_byte(&self) -> u8 {
        0x19
    }
}

/// The `BYTE` opcode extracts a single byte from a word.
///
/// # Semantics
///
/// | Stack Index | Input | Output       |
/// | :---------: | :---: | :----------: |
/// | 1           | `i`   | `x\[i\]`     |
/// | 2           | `x`   |              |
///
/// where:
///
/// - `i` is the byte offset from the big end of `x`
/// - `x` is the word to index into
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Byte;

impl Opcode for Byte {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let offset = stack.pop()?;
        let value = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::Byte { offset, value },
        );
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "BYTE".into()
    }

    fn as_byte(&self) -> u8 {
        0x1a
    }
}

/// The `SHL` opcode performs a left shift.
///
/// Bits shifted beyond the word width are discarded.
///
/// # Semantics
///
/// | Stack Index | Input   | Output       |
/// | :---------: | :-----: | :----------: |
/// | 1           | `shift` | `x << shift` |
/// | 2           | `x`     |              |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Shl;

impl Opcode for Shl {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let shift = stack.pop()?;
        let value = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Shl { shift, value });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "SHL".into()
    }

    fn as_byte(&self) -> u8 {
        0x1b
    }
}

/// The `SHR` opcode performs a logical right shift.
///
/// # Semantics
///
/// | Stack Index | Input   | Output       |
/// | :---------: | :-----: | :----------: |
/// | 1           | `shift` | `x >> shift` |
/// | 2           | `x`     |              |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Shr;

impl Opcode for Shr {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let shift = stack.pop()?;
        let value = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Shr { shift, value });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "SHR".into()
    }

    fn as_byte(&self) -> u8 {
        0x1c
    }
}

/// The `SAR` opcode performs an arithmetic right shift.
///
/// The value being shifted is interpreted as a two's complement word, and its
/// sign bit is replicated into the vacated positions.
///
/// # Semantics
///
/// | Stack Index | Input   | Output       |
/// | :---------: | :-----: | :----------: |
/// | 1           | `shift` | `x >> shift` |
/// | 2           | `x`     |              |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Sar;

impl Opcode for Sar {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let shift = stack.pop()?;
        let value = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Sar { shift, value });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "SAR".into()
    }

    fn as_byte(&self) -> u8 {
        0x1d
    }
}
