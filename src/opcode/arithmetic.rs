//! Opcodes that perform arithmetic operations on the EVM.

use crate::{
    opcode::{ExecuteResult, Opcode},
    vm::{value::SymbolicValueData, VM},
};

/// The `ADD` opcode performs addition.
///
/// The addition is performed modulo `2^256`.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a + b`     |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Add;

impl Opcode for Add {
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
            .symbolic_exec(instruction_pointer, SymbolicValueData::Add { left, right });
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
        "ADD".into()
    }

    fn as_byte(&self) -> u8 {
        0x01
    }
}

/// The `MUL` opcode performs multiplication.
///
/// The multiplication is performed modulo `2^256`.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a * b`     |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Mul;

impl Opcode for Mul {
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
            .symbolic_exec(instruction_pointer, SymbolicValueData::Mul { left, right });
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        5
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "MUL".into()
    }

    fn as_byte(&self) -> u8 {
        0x02
    }
}

/// The `SUB` opcode performs subtraction.
///
/// The subtraction is performed modulo `2^256`, and hence wraps below zero.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a - b`     |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Sub;

impl Opcode for Sub {
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
            .symbolic_exec(instruction_pointer, SymbolicValueData::Sub { left, right });
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
        "SUB".into()
    }

    fn as_byte(&self) -> u8 {
        0x03
    }
}

/// The `DIV` opcode performs unsigned integer division.
///
/// Division by zero yields zero rather than reverting.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a // b`    |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Div;

impl Opcode for Div {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let dividend = stack.pop()?;
        let divisor = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::Div { dividend, divisor },
        );
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        5
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "DIV".into()
    }

    fn as_byte(&self) -> u8 {
        0x04
    }
}

/// The `SDIV` opcode performs signed integer division.
///
/// The operands are interpreted as two's complement words, and division by
/// zero yields zero rather than reverting.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a // b`    |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SDiv;

impl Opcode for SDiv {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let dividend = stack.pop()?;
        let divisor = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::SDiv { dividend, divisor },
        );
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        5
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "SDIV".into()
    }

    fn as_byte(&self) -> u8 {
        0x05
    }
}

/// The `MOD` opcode performs unsigned modulo.
///
/// A modulus of zero yields zero rather than reverting.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a % b`     |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Mod;

impl Opcode for Mod {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let dividend = stack.pop()?;
        let divisor = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::Mod { dividend, divisor },
        );
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        5
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "MOD".into()
    }

    fn as_byte(&self) -> u8 {
        0x06
    }
}

/// The `SMOD` opcode performs signed modulo.
///
/// The operands are interpreted as two's complement words, and a modulus of
/// zero yields zero rather than reverting.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a % b`     |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SMod;

impl Opcode for SMod {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let dividend = stack.pop()?;
        let divisor = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::SMod { dividend, divisor },
        );
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        5
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "SMOD".into()
    }

    fn as_byte(&self) -> u8 {
        0x07
    }
}

/// The `ADDMOD` opcode performs addition followed by modulo.
///
/// The intermediate sum is not subject to `2^256` wrapping, and a modulus of
/// zero yields zero.
///
/// # Semantics
///
/// | Stack Index | Input | Output          |
/// | :---------: | :---: | :-------------: |
/// | 1           | `a`   | `(a + b) % N`   |
/// | 2           | `b`   |                 |
/// | 3           | `N`   |                 |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AddMod;

impl Opcode for AddMod {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let left = stack.pop()?;
        let right = stack.pop()?;
        let modulus = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::AddMod {
                left,
                right,
                modulus,
            },
        );
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        8
    }

    fn arg_count(&self) -> usize {
        3
    }

    fn as_text_code(&self) -> String {
        "ADDMOD".into()
    }

    fn as_byte(&self) -> u8 {
        0x08
    }
}

/// The `MULMOD` opcode performs multiplication followed by modulo.
///
/// The intermediate product is not subject to `2^256` wrapping, and a modulus
/// of zero yields zero.
///
/// # Semantics
///
/// | Stack Index | Input | Output          |
/// | :---------: | :---: | :-------------: |
/// | 1           | `a`   | `(a * b) % N`   |
/// | 2           | `b`   |                 |
/// | 3           | `N`   |                 |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MulMod;

impl Opcode for MulMod {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let left = stack.pop()?;
        let right = stack.pop()?;
        let modulus = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::MulMod {
                left,
                right,
                modulus,
            },
        );
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        8
    }

    fn arg_count(&self) -> usize {
        3
    }

    fn as_text_code(&self) -> String {
        "MULMOD".into()
    }

    fn as_byte(&self) -> u8 {
        0x09
    }
}

/// The `EXP` opcode performs exponentiation.
///
/// The exponentiation is performed modulo `2^256`.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           | `a`   | `a ** b`    |
/// | 2           | `b`   |             |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Exp;

impl Opcode for Exp {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let value = stack.pop()?;
        let exponent = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::Exp { value, exponent },
        );
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        10
    }

    fn max_gas_cost(&self) -> usize {
        // 10 + 10 per byte of the exponent, which may be a full word wide.
        330
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "EXP".into()
    }

    fn as_byte(&self) -> u8 {
        0x0a
    }
}

/// The `SIGNEXTEND` opcode extends the length of a two's complement signed
/// integer.
///
/// # Semantics
///
/// | Stack Index | Input | Output                 |
/// | :---------: | :---: | :--------------------: |
/// | 1           | `b`   | `signextend(x, b)`     |
/// | 2           | `x`   |                        |
///
/// where:
///
/// - `b` is the size in bytes minus one of the integer to extend
/// - `x` is the integer to extend
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SignExtend;

impl Opcode for SignExtend {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let size = stack.pop()?;
        let value = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::SignExtend { size, value },
        );
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        5
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "SIGNEXTEND".into()
    }

    fn as_byte(&self) -> u8 {
        0x0b
    }
}
