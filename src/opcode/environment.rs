//! Opcodes that interact with the external environment on the EVM.

use crate::{
    constant::LOG_OPCODE_BASE_VALUE,
    error::disassembly,
    opcode::{ExecuteResult, Opcode},
    vm::{value::SymbolicValueData, VM},
};

/// The `SHA3` opcode computes the keccak256 hash of the input.
///
/// The hash is computed on the data in memory at `offset` over a `size` in
/// bytes.
///
/// # Semantics
///
/// | Stack Index | Input    | Output                                 |
/// | :---------: | :------: | :------------------------------------: |
/// | 1           | `offset` | `keccak256(mem\[offset:offset+size\])` |
/// | 2           | `size`   |                                        |
///
/// where:
///
/// - `offset` is the byte offset in memory where the data to be hashed starts
/// - `size` is the number of bytes in the data to be hashed
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Sha3;

impl Opcode for Sha3 {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let offset = stack.pop()?;
        let _size = stack.pop()?;

        // Get the value at `offset` out of memory
        let data = vm.state()?.memory_mut().load(&offset).clone();

        // Build the result and push it onto the stack
        let result = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::Sha3 { data: vec![data] },
        );
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        30
    }

    fn max_gas_cost(&self) -> usize {
        // 30 + 6 per word of input hashed.
        78
    }

    fn arg_count(&self) -> usize {
        2
    }

    fn as_text_code(&self) -> String {
        "SHA3".into()
    }

    fn as_byte(&self) -> u8 {
        0x20
    }
}

/// The `ADDRESS` opcode gets the address of the currently executing account.
///
/// Note that this is the _context_ address of the current call frame, which
/// for `CALLCODE` and `DELEGATECALL` frames is the address of the caller.
///
/// # Semantics
///
/// | Stack Index | Input | Output          |
/// | :---------: | :---: | :-------------: |
/// | 1           |       | `address(this)` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Address;

impl Opcode for Address {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the value from the current call context
        let value = vm.state()?.call_stack().current().context_address().clone();

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
        "ADDRESS".into()
    }

    fn as_byte(&self) -> u8 {
        0x30
    }
}

/// The `BALANCE` opcode gets the balance of the target account.
///
/// # Semantics
///
/// | Stack Index | Input     | Output                       |
/// | :---------: | :-------: | :--------------------------: |
/// | 1           | `address` | `balance := address.balance` |
///
/// where:
///
/// - `address` is the address of the account to check the balance for
/// - `balance` is the balance in WEI
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Balance;

impl Opcode for Balance {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the argument from the stack
        let address = stack.pop()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Balance { address });
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
        "BALANCE".into()
    }

    fn as_byte(&self) -> u8 {
        0x31
    }
}

/// The `ORIGIN` opcode gets the address from which execution was started.
///
/// # Semantics
///
/// | Stack Index | Input | Output                |
/// | :---------: | :---: | :-------------------: |
/// | 1           |       | `origin := tx.origin` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Origin;

impl Opcode for Origin {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Origin);
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
        "ORIGIN".into()
    }

    fn as_byte(&self) -> u8 {
        0x32
    }
}

/// The `CALLER` opcode gets the `msg.sender` of the current call context.
///
/// For `DELEGATECALL` frames this is the sender observed by the caller,
/// preserved across the call.
///
/// # Semantics
///
/// | Stack Index | Input | Output       |
/// | :---------: | :---: | :----------: |
/// | 1           |       | `msg.sender` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Caller;

impl Opcode for Caller {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the value from the current call context
        let value = vm.state()?.call_stack().current().context_caller().clone();

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
        "CALLER".into()
    }

    fn as_byte(&self) -> u8 {
        0x33
    }
}

/// The `CALLVALUE` opcode gets the value deposited by the current call.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           |       | `msg.value` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CallValue;

impl Opcode for CallValue {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the value from the current call context
        let value = vm.state()?.call_stack().current().value().clone();

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
        "CALLVALUE".into()
    }

    fn as_byte(&self) -> u8 {
        0x34
    }
}

/// The `GASPRICE` opcode gets the gas price of the enclosing transaction.
///
/// # Semantics
///
/// | Stack Index | Input | Output        |
/// | :---------: | :---: | :-----------: |
/// | 1           |       | `tx.gasprice` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GasPrice;

impl Opcode for GasPrice {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::GasPrice);
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
        "GASPRICE".into()
    }

    fn as_byte(&self) -> u8 {
        0x3a
    }
}

/// The `EXTCODEHASH` opcode gets the code hash of the target account.
///
/// # Semantics
///
/// | Stack Index | Input     | Output                      |
/// | :---------: | :-------: | :-------------------------: |
/// | 1           | `address` | `keccak256(address.code)`   |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ExtCodeHash;

impl Opcode for ExtCodeHash {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the argument from the stack
        let address = stack.pop()?;

        // Create and push the value onto the stack
        let value = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::ExtCodeHash { address },
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
        "EXTCODEHASH".into()
    }

    fn as_byte(&self) -> u8 {
        0x3f
    }
}

/// The `BLOCKHASH` opcode gets the hash of one of the 256 most recent blocks.
///
/// # Semantics
///
/// | Stack Index | Input    | Output             |
/// | :---------: | :------: | :----------------: |
/// | 1           | `number` | `blockhash(number)`|
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BlockHash;

impl Opcode for BlockHash {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the argument from the stack
        let block_number = stack.pop()?;

        // Create and push the value onto the stack
        let value = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::BlockHash { block_number },
        );
        let mut stack = vm.stack_handle()?;
        stack.push(value)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        20
    }

    fn arg_count(&self) -> usize {
        1
    }

    fn as_text_code(&self) -> String {
        "BLOCKHASH".into()
    }

    fn as_byte(&self) -> u8 {
        0x40
    }
}

/// The `COINBASE` opcode gets the beneficiary address of the current block.
///
/// # Semantics
///
/// | Stack Index | Input | Output           |
/// | :---------: | :---: | :--------------: |
/// | 1           |       | `block.coinbase` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CoinBase;

impl Opcode for CoinBase {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::CoinBase);
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
        "COINBASE".into()
    }

    fn as_byte(&self) -> u8 {
        0x41
    }
}

/// The `TIMESTAMP` opcode gets the timestamp of the current block.
///
/// # Semantics
///
/// | Stack Index | Input | Output            |
/// | :---------: | :---: | :---------------: |
/// | 1           |       | `block.timestamp` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Timestamp;

impl Opcode for Timestamp {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Timestamp);
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
        "TIMESTAMP".into()
    }

    fn as_byte(&self) -> u8 {
        0x42
    }
}

/// The `NUMBER` opcode gets the number of the current block.
///
/// # Semantics
///
/// | Stack Index | Input | Output         |
/// | :---------: | :---: | :------------: |
/// | 1           |       | `block.number` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Number;

impl Opcode for Number {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Number);
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
        "NUMBER".into()
    }

    fn as_byte(&self) -> u8 {
        0x43
    }
}

/// The `DIFFICULTY` opcode gets the difficulty of the current block.
///
/// # Semantics
///
/// | Stack Index | Input | Output             |
/// | :---------: | :---: | :----------------: |
/// | 1           |       | `block.difficulty` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Difficulty;

impl Opcode for Difficulty {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Difficulty);
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
        "DIFFICULTY".into()
    }

    fn as_byte(&self) -> u8 {
        0x44
    }
}

/// The `GASLIMIT` opcode gets the gas limit of the current block.
///
/// # Semantics
///
/// | Stack Index | Input | Output           |
/// | :---------: | :---: | :--------------: |
/// | 1           |       | `block.gaslimit` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GasLimit;

impl Opcode for GasLimit {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::GasLimit);
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
        "GASLIMIT".into()
    }

    fn as_byte(&self) -> u8 {
        0x45
    }
}

/// The `CHAINID` opcode gets the identifier of the chain being executed on.
///
/// # Semantics
///
/// | Stack Index | Input | Output     |
/// | :---------: | :---: | :--------: |
/// | 1           |       | `chain_id` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChainId;

impl Opcode for ChainId {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::ChainId);
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
        "CHAINID".into()
    }

    fn as_byte(&self) -> u8 {
        0x46
    }
}

/// The `SELFBALANCE` opcode gets the balance of the executing account.
///
/// # Semantics
///
/// | Stack Index | Input | Output                  |
/// | :---------: | :---: | :---------------------: |
/// | 1           |       | `address(this).balance` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SelfBalance;

impl Opcode for SelfBalance {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::SelfBalance);
        let mut stack = vm.stack_handle()?;
        stack.push(value)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        5
    }

    fn arg_count(&self) -> usize {
        0
    }

    fn as_text_code(&self) -> String {
        "SELFBALANCE".into()
    }

    fn as_byte(&self) -> u8 {
        0x47
    }
}

/// The `BASEFEE` opcode gets the base fee of the current block.
///
/// # Semantics
///
/// | Stack Index | Input | Output    |
/// | :---------: | :---: | :-------: |
/// | 1           |       | `basefee` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BaseFee;

impl Opcode for BaseFee {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::BaseFee);
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
        "BASEFEE".into()
    }

    fn as_byte(&self) -> u8 {
        0x48
    }
}

/// The `GAS` opcode gets the amount of gas currently remaining.
///
/// # Semantics
///
/// | Stack Index | Input | Output      |
/// | :---------: | :---: | :---------: |
/// | 1           |       | `gasleft()` |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Gas;

impl Opcode for Gas {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;

        // Create and push the value onto the stack
        let value = vm
            .build()
            .symbolic_exec(instruction_pointer, SymbolicValueData::Gas);
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
        "GAS".into()
    }

    fn as_byte(&self) -> u8 {
        0x5a
    }
}

/// The `LOGN` opcode logs `N` topics, where `0 <= N <= 4`.
///
/// The logged data is read from memory at `offset` over a `size` in bytes.
///
/// # Semantics
///
/// | Stack Index | Input      | Output |
/// | :---------: | :--------: | :----: |
/// | 1           | `offset`   |        |
/// | 2           | `size`     |        |
/// | ...         |            |        |
/// | `N+2`       | `topic[N]` |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LogN {
    topic_count: u8,
}

impl LogN {
    /// Constructs a new instance of the `LOGN` opcode.
    ///
    /// # Errors
    ///
    /// If the provided `n` is not in the specified range.
    pub fn new(n: u8) -> Result<Self, disassembly::Error> {
        if n <= 4 {
            Ok(Self { topic_count: n })
        } else {
            Err(disassembly::Error::InvalidTopicCount(n))
        }
    }

    /// Gets the number of topics this opcode logs.
    #[must_use]
    pub fn n(&self) -> u8 {
        self.topic_count
    }
}

impl Opcode for LogN {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack
        let mut stack = vm.stack_handle()?;

        // Logging makes no observable change to the machine state, so the
        // operands are just consumed
        for _ in 0..self.arg_count() {
            stack.pop()?;
        }

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        375 * (usize::from(self.topic_count) + 1)
    }

    fn max_gas_cost(&self) -> usize {
        // 8 gas per byte of data logged, assumed at most a word.
        self.min_gas_cost() + 256
    }

    fn arg_count(&self) -> usize {
        usize::from(self.topic_count) + 2
    }

    fn as_text_code(&self) -> String {
        format!("LOG{}", self.topic_count)
    }

    fn as_byte(&self) -> u8 {
        LOG_OPCODE_BASE_VALUE + self.topic_count
    }
}

/// The `CREATE` opcode creates a new contract.
///
/// The deployment code for the new contract is read from memory at `offset`
/// over a `size` in bytes, and `value` WEI is transferred to the new account.
///
/// # Semantics
///
/// | Stack Index | Input    | Output    |
/// | :---------: | :------: | :-------: |
/// | 1           | `value`  | `address` |
/// | 2           | `offset` |           |
/// | 3           | `size`   |           |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Create;

impl Opcode for Create {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let value = stack.pop()?;
        let offset = stack.pop()?;
        let size = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::Create {
                value,
                offset,
                size,
            },
        );
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        32_000
    }

    fn arg_count(&self) -> usize {
        3
    }

    fn as_text_code(&self) -> String {
        "CREATE".into()
    }

    fn as_byte(&self) -> u8 {
        0xf0
    }
}

/// The `CREATE2` opcode creates a new contract at a predictable address.
///
/// It behaves as [`Create`], except that the address of the new account is a
/// function of the deployment code and the provided `salt`.
///
/// # Semantics
///
/// | Stack Index | Input    | Output    |
/// | :---------: | :------: | :-------: |
/// | 1           | `value`  | `address` |
/// | 2           | `offset` |           |
/// | 3           | `size`   |           |
/// | 4           | `salt`   |           |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Create2;

impl Opcode for Create2 {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack and environment data
        let instruction_pointer = vm.instruction_pointer()?;
        let mut stack = vm.stack_handle()?;

        // Get the operands from the stack
        let value = stack.pop()?;
        let offset = stack.pop()?;
        let size = stack.pop()?;
        let salt = stack.pop()?;

        // Construct the result and push it onto the stack
        let result = vm.build().symbolic_exec(
            instruction_pointer,
            SymbolicValueData::Create2 {
                value,
                offset,
                size,
                salt,
            },
        );
        vm.stack_handle()?.push(result)?;

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        32_000
    }

    fn arg_count(&self) -> usize {
        4
    }

    fn as_text_code(&self) -> String {
        "CREATE2".into()
    }

    fn as_byte(&self) -> u8 {
        0xf5
    }
}

/// The `SELFDESTRUCT` opcode destroys the executing account, sending its
/// balance to the provided beneficiary.
///
/// # Semantics
///
/// | Stack Index | Input     | Output |
/// | :---------: | :-------: | :----: |
/// | 1           | `address` |        |
///
/// # Errors
///
/// Execution is reverted if there is not enough gas or if there are not enough
/// operands on the stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SelfDestruct;

impl Opcode for SelfDestruct {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        // Get the stack
        let mut stack = vm.stack_handle()?;

        // The beneficiary is consumed but the destruction itself has no
        // observable effect within the analysis
        stack.pop()?;

        // The thread of execution ends here
        vm.kill_current_thread();

        // Done, so return ok
        Ok(())
    }

    fn min_gas_cost(&self) -> usize {
        5_000
    }

    fn max_gas_cost(&self) -> usize {
        // 5000 + 25000 where the beneficiary account is new.
        30_000
    }

    fn arg_count(&self) -> usize {
        1
    }

    fn as_text_code(&self) -> String {
        "SELFDESTRUCT".into()
    }

    fn as_byte(&self) -> u8 {
        0xff
    }
}
