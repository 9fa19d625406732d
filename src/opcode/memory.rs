//! Opcodes that interact with the various kinds of memory on the EVM.

use crate::{
    constant::{
        DUP_OPCODE_BASE_VALUE,
        PUSH_OPCODE_BASE_VALUE,
        PUSH_OPCODE_MAX_BYTES,
        SWAP_OPCODE_BASE_VALUE,
        WORD_SIZE_BYTES,
    },
    error::disassembly,
    opcode::{ExecuteResult, Opcode},
    vm::{
        value::{known::KnownWord, Provenance, SymbolicValueData},
        VM,
    },
};

/// The `CALLDATALOAD` opcode loads a word of the current call's input data.
///
/// # Semantics
///
/// | Stack Index | Input    | Output                         |
/// | :---------: | :------: | :----------------------------: |
/// | 1           | `offset` | `msg.data\[offset:offset+32\]` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CallDataLoad;

impl Opcode for CallDataLoad {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operand from the stack
        let offset = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm.build().symbolic(
            instruction_pointer,
            SymbolicValueData::CallData { offset },
            Provenance::MessageData,
        );
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
        "CALLDATALOAD".into()
    }

    fn as_byte(&self) -> u8 {
        0x35
    }
}

/// The `CALLDATASIZE` opcode gets the size of the current call's input data.
///
/// # Semantics
///
/// | Stack Index | Input | Output            |
/// | :---------: | :---: | :---------------: |
/// | 1           |       | `msg.data.length` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CallDataSize;

impl Opcode for CallDataSize {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm.build().symbolic(
            instruction_pointer,
            SymbolicValueData::CallDataSize,
            Provenance::MessageData,
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
        "CALLDATASIZE".into()
    }

    fn as_byte(&self) -> u8 {
        0x36
    }
}

/// The `CALLDATACOPY` opcode copies the current call's input data into
/// memory.
///
/// # Semantics
///
/// | Stack Index | Input        | Output |
/// | :---------: | :----------: | :----: |
/// | 1           | `destOffset` |        |
/// | 2           | `offset`     |        |
/// | 3           | `size`       |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CallDataCopy;

impl Opcode for CallDataCopy {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let dest_offset = stack.pop()?;
        let offset = stack.pop()?;
        let _size = stack.pop()?;

        // Write the copied data into memory
        let data = vm.build().symbolic(
            instruction_pointer,
            SymbolicValueData::CallData { offset },
            Provenance::MessageData,
        );
        vm.state()?.memory_mut().store(dest_offset, data);

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        2
    }

    fn max_gas_cost(&self) -> usize {
        // 2 + 3 per word of data copied, up to the size of the input data.
        2_306
    }

    fn arg_count(&self) -> usize {
        3
    }

    fn as_text_code(&self) -> String {
        "CALLDATACOPY".into()
    }

    fn as_byte(&self) -> u8 {
        0x37
    }
}

/// The `CODESIZE` opcode gets the size of the currently executing code.
///
/// # Semantics
///
/// | Stack Index | Input | Output                         |
/// | :---------: | :---: | :----------------------------: |
/// | 1           |       | `address(this).code.length`    |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CodeSize;

impl Opcode for CodeSize {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // The size of the executing code is statically known
        let length = vm.instructions_len();
        let value = vm.build().known(
            instruction_pointer,
            KnownWord::new(length),
            Provenance::Bytecode,
        );

        // Push it onto the stack
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
        "CODESIZE".into()
    }

    fn as_byte(&self) -> u8 {
        0x38
    }
}

/// The `CODECOPY` opcode copies the currently executing code into memory.
///
/// # Semantics
///
/// | Stack Index | Input        | Output |
/// | :---------: | :----------: | :----: |
/// | 1           | `destOffset` |        |
/// | 2           | `offset`     |        |
/// | 3           | `size`       |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CodeCopy;

impl Opcode for CodeCopy {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let dest_offset = stack.pop()?;
        let _offset = stack.pop()?;
        let _size = stack.pop()?;

        // The copied code is not modelled word-by-word, so the write is an
        // opaque value originating from the bytecode
        let data = vm.build().value(instruction_pointer, Provenance::Bytecode);
        vm.state()?.memory_mut().store(dest_offset, data);

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        2
    }

    fn max_gas_cost(&self) -> usize {
        // 2 + 3 per word of code copied.
        2_306
    }

    fn arg_count(&self) -> usize {
        3
    }

    fn as_text_code(&self) -> String {
        "CODECOPY".into()
    }

    fn as_byte(&self) -> u8 {
        0x39
    }
}

/// The `EXTCODESIZE` opcode gets the size of the code of the target account.
///
/// # Semantics
///
/// | Stack Index | Input     | Output                |
/// | :---------: | :-------: | :-------------------: |
/// | 1           | `address` | `address.code.length` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ExtCodeSize;

impl Opcode for ExtCodeSize {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the argument from the stack
        let address = stack.pop()?;

        // Create and push the value onto the stack
        let value = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::ExtCodeSize { address },
        );
        let mut stack = vm.stack_handle()?;
        stack.push(value)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        700
    }

    fn arg_count(&self) -> usize {
        1
    }

    fn as_text_code(&self) -> String {
        "EXTCODESIZE".into()
    }

    fn as_byte(&self) -> u8 {
        0x3b
    }
}

/// The `EXTCODECOPY` opcode copies the code of the target account into
/// memory.
///
/// # Semantics
///
/// | Stack Index | Input        | Output |
/// | :---------: | :----------: | :----: |
/// | 1           | `address`    |        |
/// | 2           | `destOffset` |        |
/// | 3           | `offset`     |        |
/// | 4           | `size`       |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ExtCodeCopy;

impl Opcode for ExtCodeCopy {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let _address = stack.pop()?;
        let dest_offset = stack.pop()?;
        let _offset = stack.pop()?;
        let _size = stack.pop()?;

        // The external code is entirely opaque to the analysis
        let data = vm.build().value(instruction_pointer, Provenance::Environment);
        vm.state()?.memory_mut().store(dest_offset, data);

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        700
    }

    fn max_gas_cost(&self) -> usize {
        // 700 + 3 per word of code copied.
        3_004
    }

    fn arg_count(&self) -> usize {
        4
    }

    fn as_text_code(&self) -> String {
        "EXTCODECOPY".into()
    }

    fn as_byte(&self) -> u8 {
        0x3c
    }
}

/// The `RETURNDATASIZE` opcode gets the size of the return data from the most
/// recent message call.
///
/// # Semantics
///
/// | Stack Index | Input | Output                 |
/// | :---------: | :---: | :--------------------: |
/// | 1           |       | `returndata.length`    |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ReturnDataSize;

impl Opcode for ReturnDataSize {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::ReturnDataSize);
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
        "RETURNDATASIZE".into()
    }

    fn as_byte(&self) -> u8 {
        0x3d
    }
}

/// The `RETURNDATACOPY` opcode copies the return data from the most recent
/// message call into memory.
///
/// # Semantics
///
/// | Stack Index | Input        | Output |
/// | :---------: | :----------: | :----: |
/// | 1           | `destOffset` |        |
/// | 2           | `offset`     |        |
/// | 3           | `size`       |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ReturnDataCopy;

impl Opcode for ReturnDataCopy {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let dest_offset = stack.pop()?;
        let _offset = stack.pop()?;
        let _size = stack.pop()?;

        // The return data of an opaque callee is itself opaque
        let data = vm.build().value(instruction_pointer, Provenance::Execution);
        vm.state()?.memory_mut().store(dest_offset, data);

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        2
    }

    fn max_gas_cost(&self) -> usize {
        // 2 + 3 per word of data copied.
        2_306
    }

    fn arg_count(&self) -> usize {
        3
    }

    fn as_text_code(&self) -> String {
        "RETURNDATACOPY".into()
    }

    fn as_byte(&self) -> u8 {
        0x3e
    }
}

/// The `POP` opcode discards the top item on the stack.
///
/// # Semantics
///
/// | Stack Index | Input | Output |
/// | :---------: | :---: | :----: |
/// | 1           | `a`   |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Pop;

impl Opcode for Pop {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack
        let mut stack = vm.stack_handle()?;

        // Discard the top item
        stack.pop()?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        2
    }

    fn arg_count(&self) -> usize {
        1
    }

    fn as_text_code(&self) -> String {
        "POP".into()
    }

    fn as_byte(&self) -> u8 {
        0x50
    }
}

/// The `MLOAD` opcode loads a word from memory.
///
/// # Semantics
///
/// | Stack Index | Input    | Output                    |
/// | :---------: | :------: | :-----------------------: |
/// | 1           | `offset` | `mem\[offset:offset+32\]` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MLoad;

impl Opcode for MLoad {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack
        let mut stack = vm.stack_handle()?;

        // Get the operand from the stack
        let offset = stack.pop()?;

        // Load from memory and push the result onto the stack
        let value = vm.state()?.memory_mut().load(&offset).clone();
        vm.stack_handle()?.push(value)?;

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
        "MLOAD".into()
    }

    fn as_byte(&self) -> u8 {
        0x51
    }
}

/// The `MSTORE` opcode stores a word to memory.
///
/// # Semantics
///
/// | Stack Index | Input    | Output |
/// | :---------: | :------: | :----: |
/// | 1           | `offset` |        |
/// | 2           | `value`  |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MStore;

impl Opcode for MStore {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let offset = stack.pop()?;
        let value = stack.pop()?;

        // Store the value into memory
        vm.state()?.memory_mut().store(offset, value);

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
        "MSTORE".into()
    }

    fn as_byte(&self) -> u8 {
        0x52
    }
}

/// The `MSTORE8` opcode stores a single byte to memory.
///
/// The byte stored is the least significant byte of `value`.
///
/// # Semantics
///
/// | Stack Index | Input    | Output |
/// | :---------: | :------: | :----: |
/// | 1           | `offset` |        |
/// | 2           | `value`  |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MStore8;

impl Opcode for MStore8 {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let offset = stack.pop()?;
        let value = stack.pop()?;

        // Only the lowest byte of the value is written, which is expressed as
        // indexing the value's lowest byte
        let byte_offset = vm.build().known(
            instruction_pointer,
            KnownWord::from(WORD_SIZE_BYTES - 1),
            Provenance::Synthetic,
        );
        let byte = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::Byte {
                offset: byte_offset,
                value,
            },
        );
        vm.state()?.memory_mut().store(offset, byte);

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
        "MSTORE8".into()
    }

    fn as_byte(&self) -> u8 {
        0x53
    }
}

/// The `SLOAD` opcode loads a word from storage.
///
/// # Semantics
///
/// | Stack Index | Input | Output           |
/// | :---------: | :---: | :--------------: |
/// | 1           | `key` | `storage\[key\]` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SLoad;

impl Opcode for SLoad {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack
        let mut stack = vm.stack_handle()?;

        // Get the operand from the stack
        let key = stack.pop()?;

        // Load from storage and push the result onto the stack
        let value = vm.state()?.storage_mut().load(&key).clone();
        vm.stack_handle()?.push(value)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        800
    }

    fn arg_count(&self) -> usize {
        1
    }

    fn as_text_code(&self) -> String {
        "SLOAD".into()
    }

    fn as_byte(&self) -> u8 {
        0x54
    }
}

/// The `SSTORE` opcode stores a word to storage.
///
/// # Semantics
///
/// | Stack Index | Input   | Output |
/// | :---------: | :-----: | :----: |
/// | 1           | `key`   |        |
/// | 2           | `value` |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SStore;

impl Opcode for SStore {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let key = stack.pop()?;
        let value = stack.pop()?;

        // Store the value into storage
        vm.state()?.storage_mut().store(key, value);

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        5_000
    }

    fn max_gas_cost(&self) -> usize {
        // 20000 where the slot is being set from zero to non-zero.
        20_000
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "SSTORE".into()
    }

    fn as_byte(&self) -> u8 {
        0x55
    }
}

/// The `MSIZE` opcode gets the size of the active memory in bytes.
///
/// # Semantics
///
/// | Stack Index | Input | Output    |
/// | :---------: | :---: | :-------: |
/// | 1           |       | `msize()` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MSize;

impl Opcode for MSize {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::MSize);
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
        "MSIZE".into()
    }

    fn as_byte(&self) -> u8 {
        0x59
    }
}

/// The `PUSH0` opcode pushes a zero onto the stack.
///
/// # Semantics
///
/// | Stack Index | Input | Output |
/// | :---------: | :---: | :----: |
/// | 1           |       | `0`    |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Push0;

impl Opcode for Push0 {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Construct the value of zero
        let zero = vm.build().known(
            instruction_pointer,
            KnownWord::zero(),
            Provenance::Bytecode,
        );

        // Push it onto the stack
        let mut stack = vm.stack_handle()?;
        stack.push(zero)?;

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
        "PUSH0".into()
    }

    fn as_byte(&self) -> u8 {
        0x5f
    }
}

/// The `PUSHN` opcode pushes an `N`-byte item onto the stack, where
/// `0 < N <= 32`.
///
/// # Semantics
///
/// | Stack Index | Input | Output |
/// | :---------: | :---: | :----: |
/// | 1           |       | `item` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PushN {
    byte_count: u8,
    bytes:      Vec<u8>,
}

impl PushN {
    /// Construct a new instance of the `PUSHN` opcode for some `n`.
    ///
    /// The `bytes` are in big-endian byte ordering.
    ///
    /// # Errors
    ///
    /// If `n` is not in the specified range, or if the number of `bytes` does
    /// not match `n`.
    pub fn new(n: u8, bytes: impl Into<Vec<u8>>) -> Result<Self, disassembly::Error> {
        let bytes: Vec<u8> = bytes.into();
        if n > 0 && n <= PUSH_OPCODE_MAX_BYTES && bytes.len() == n as usize {
            Ok(Self {
                byte_count: n,
                bytes,
            })
        } else {
            Err(disassembly::Error::InvalidPushSize(n))
        }
    }

    /// Get the number of bytes this `PUSHN` opcode pushes onto the stack.
    #[must_use]
    pub fn byte_size(&self) -> u8 {
        self.byte_count
    }

    /// Get the data to be pushed onto the stack by this opcode. It is
    /// guaranteed that `bytes_data.len() == byte_size()`.
    #[must_use]
    pub fn bytes_data(&self) -> &[u8] {
        &self.bytes
    }

    /// Gets the bytes that are pushed as a known word.
    #[must_use]
    pub fn bytes_as_word(&self) -> KnownWord {
        // Left-pad the data out to the width of a word
        let mut bytes = [0x0; WORD_SIZE_BYTES];
        bytes[WORD_SIZE_BYTES - self.bytes.len()..].copy_from_slice(&self.bytes);

        KnownWord::from_be_bytes(bytes)
    }
}

impl Opcode for PushN {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Construct the pushed value
        let value = vm.build().known(
            instruction_pointer,
            self.bytes_as_word(),
            Provenance::Bytecode,
        );

        // Push it onto the stack
        let mut stack = vm.stack_handle()?;
        stack.push(value)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        0
    }

    fn as_text_code(&self) -> String {
        format!("PUSH{}", self.byte_count)
    }

    fn as_byte(&self) -> u8 {
        PUSH_OPCODE_BASE_VALUE + self.byte_count
    }

    fn encode(&self) -> Vec<u8> {
        let mut data = vec![self.as_byte()];
        data.extend(&self.bytes);
        data
    }
}

/// The `DUPN` opcode duplicates the `N`th item on the stack, where `0 < N <=
/// 16`, pushing it on the top of the stack. This makes the duplicated item the
/// `N+1`th item.
///
/// # Semantics
///
/// | Stack Index | Input  | Output |
/// | :---------: | :----: | :----: |
/// | 1           |        | `item` |
/// | ...         |        |        |
/// | `N+1`       | `item` | `item` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DupN {
    item: u8,
}

impl DupN {
    /// Constructs a new instance of the `DUPN` opcode.
    ///
    /// # Errors
    ///
    /// If the provided `n` is not in the specified range.
    pub fn new(n: u8) -> Result<Self, disassembly::Error> {
        if 0 < n && n <= 16 {
            Ok(Self { item: n })
        } else {
            Err(disassembly::Error::InvalidStackItem {
                item: n,
                name: "DUP".into(),
            })
        }
    }

    /// Gets the item on the stack that this opcode is duplicating.
    #[must_use]
    pub fn n(&self) -> u8 {
        self.item
    }
}

impl Opcode for DupN {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack
        let mut stack = vm.stack_handle()?;

        // Get the dup frame, converting from EVM to internal semantics and with
        // the subtraction always safe as `DupN` is guaranteed to have
        // `item >= 1`.
        let frame = u16::from(self.n()) - 1;

        // Duplicate the specified item; verification is done in parsing
        stack.dup(frame)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        usize::from(self.item)
    }

    fn as_text_code(&self) -> String {
        format!("DUP{}", self.item)
    }

    fn as_byte(&self) -> u8 {
        DUP_OPCODE_BASE_VALUE + self.item
    }
}

/// The `SWAPN` opcode swaps the top item on the stack with the `N+1`th item,
/// where `0 < N <= 16`.
///
/// # Semantics
///
/// | Stack Index | Input  | Output |
/// | :---------: | :----: | :----: |
/// | 1           | `a`    | `b`    |
/// | ...         |        |        |
/// | `N+1`       | `b`    | `a`    |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SwapN {
    item: u8,
}

impl SwapN {
    /// Constructs a new instance of the `SWAPN` opcode.
    ///
    /// # Errors
    ///
    /// If the provided `n` is not in the specified range.
    pub fn new(n: u8) -> Result<Self, disassembly::Error> {
        if 0 < n && n <= 16 {
            Ok(Self { item: n })
        } else {
            Err(disassembly::Error::InvalidStackItem {
                item: n,
                name: "SWAP".into(),
            })
        }
    }

    /// Gets the item on the stack that this opcode is swapping with.
    #[must_use]
    pub fn n(&self) -> u8 {
        self.item
    }
}

impl Opcode for SwapN {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack
        let mut stack = vm.stack_handle()?;

        // Compute the internal item to swap with
        let frame = u16::from(self.n());

        // Swap the items; verification is done in parsing
        stack.swap(frame)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        3
    }

    fn arg_count(&self) -> usize {
        usize::from(self.item) + 1
    }

    fn as_text_code(&self) -> String {
        format!("SWAP{}", self.item)
    }

    fn as_byte(&self) -> u8 {
        SWAP_OPCODE_BASE_VALUE + self.item
    }
}
