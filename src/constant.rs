//! This module contains constants that are needed throughout the codebase.

/// The maximum size that a contract can have when being deployed on the
/// blockchain.
///
/// This is specified in [EIP-170](https://eips.ethereum.org/EIPS/eip-170).
pub const CONTRACT_MAXIMUM_SIZE_BYTES: usize = 24_576;

/// The maximum amount of gas that can be spent in a given block on the EVM.
pub const BLOCK_GAS_LIMIT: usize = 30_000_000;

/// The base byte value for the `PUSH` opcode, for `N > 0`.
///
/// This is constructed such that for `PUSHN`, `PUSH_OPCODE_BASE_VALUE` + `N`
/// equals the byte value for the corresponding `PUSH` opcode.
pub const PUSH_OPCODE_BASE_VALUE: u8 = 0x5f;

/// The base byte value for the `DUP` opcode.
///
/// This is constructed such that for `DUPN`, `DUP_OPCODE_BASE_VALUE` + `N`
/// equals the byte value for the corresponding `DUP` opcode.
pub const DUP_OPCODE_BASE_VALUE: u8 = 0x7f;

/// The base byte value for the `SWAP` opcode.
///
/// This is constructed such that for `SWAPN`, `SWAP_OPCODE_BASE_VALUE` + `N`
/// equals the byte value for the corresponding `SWAP` opcode.
pub const SWAP_OPCODE_BASE_VALUE: u8 = 0x8f;

/// The base byte value for the `LOG` opcode.
pub const LOG_OPCODE_BASE_VALUE: u8 = 0xa0;

/// The maximum number of bytes that can be pushed at once using the `PUSH`
/// opcode.
pub const PUSH_OPCODE_MAX_BYTES: u8 = 32;

/// The maximum stack depth for the EVM.
pub const MAXIMUM_STACK_DEPTH: usize = 1024;

/// The maximum call-stack depth for the EVM.
pub const MAXIMUM_CALL_STACK_DEPTH: usize = 1024;

/// The width of a word on the EVM in bits.
pub const WORD_SIZE_BITS: usize = 256;

/// The width of a byte on the EVM (and most other places) in bits.
pub const BYTE_SIZE_BITS: usize = 8;

/// The width of a word on the EVM in bytes.
pub const WORD_SIZE_BYTES: usize = WORD_SIZE_BITS / BYTE_SIZE_BITS;

/// The default maximum number of times that the virtual machine will visit
/// each opcode on a single thread of execution.
pub const DEFAULT_ITERATIONS_PER_OPCODE: usize = 10;

/// The default maximum number of times that the virtual machine will fork
/// during a conditional jump to a given jump target.
pub const DEFAULT_CONDITIONAL_JUMP_PER_TARGET_FORK_LIMIT: usize = 50;

/// The default maximum number of execution threads that the virtual machine
/// will dispatch in a single analysis run.
///
/// Exceeding this budget retires the remaining frontier without error; the
/// run's results carry a coverage caveat instead.
pub const DEFAULT_MAXIMUM_EXPLORED_STATES: usize = 10_000;

/// The default number of nodes that a symbolic value can contain before it is
/// culled to an opaque value.
pub const DEFAULT_VALUE_SIZE_LIMIT: usize = 250;

/// The default number of loop iterations the analyzer will wait before
/// polling the watchdog.
pub const DEFAULT_WATCHDOG_POLL_LOOP_ITERATIONS: usize = 100;

/// The default value for whether to execute the virtual machine in permissive
/// errors mode.
///
/// Permissive errors mode allows the VM to complete successfully in the
/// presence of non-fatal errors. See [`crate::vm::Config`] for more
/// information on what this entails.
pub const DEFAULT_PERMISSIVE_ERRORS_ENABLED: bool = false;

/// The placeholder name used for the contract in findings when the client
/// does not provide one.
pub const UNKNOWN_CONTRACT_NAME: &str = "Unknown";

/// The placeholder name used for the enclosing function in findings, given
/// that function discovery requires the source-map collaborator.
pub const UNKNOWN_FUNCTION_NAME: &str = "unknown";

/// The source format reported for raw bytecode analysis.
pub const REPORT_SOURCE_FORMAT: &str = "evm-byzantium-bytecode";

/// The source type reported for raw bytecode analysis.
pub const REPORT_SOURCE_TYPE: &str = "raw-bytecode";
