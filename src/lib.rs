//! This library implements a symbolic-execution analysis of
//! [EVM](https://ethereum.org/en/developers/docs/evm/) bytecode that aims to
//! discover common security weaknesses in the contract being studied, and to
//! report them against the [SWC registry](https://swcregistry.io). It is a
//! _best effort_ analysis.
//!
//! Note that this library is not intended to be nor expected to evolve into a
//! full decompiler or prover for EVM bytecode.
//!
//! # How it Works
//!
//! From a very high level, the weakness discovery process is performed as
//! follows:
//!
//! 1. Bytecode is ingested and turned into a
//!    [`disassembly::InstructionStream`]. This is a sequence of
//!    [`opcode::Opcode`]s that is equivalent to the bytecode.
//! 2. The stream of instructions is executed symbolically on a specialised
//!    [`vm::VM`]. This execution is both speculative and total, exploring all
//!    code paths that fit within the configured resource budgets and that the
//!    [`solver::Oracle`] cannot prove dead.
//! 3. Each [`detector::Detector`] observes every executed instruction and
//!    every completed thread of execution, producing candidate findings that
//!    carry the condition under which the weakness manifests.
//! 4. Each candidate is confirmed against the path condition it was observed
//!    under, and the confirmed [`report::Finding`]s are aggregated,
//!    deduplicated, and written to a [`report::Report`] that can then be
//!    rendered as JSON or Markdown.
//!
//! # Basic Usage
//!
//! For the most basic usage of the library, it is sufficient to construct an
//! `Analyzer` and call the `.analyze` method, passing your contract.
//!
//! ```
//! use evm_sentinel as sentinel;
//! use evm_sentinel::{
//!     bytecode,
//!     contract::Contract,
//!     opcode::{arithmetic::*, control::*, memory::*, Opcode},
//!     solver::FoldingOracle,
//!     vm,
//!     watchdog::LazyWatchdog,
//! };
//!
//! let bytes = bytecode![
//!     PushN::new(1, vec![0x02]).unwrap(), // The subtrahend
//!     PushN::new(1, vec![0x01]).unwrap(), // The minuend
//!     Sub,                                // 1 - 2 wraps below zero
//!     Stop                                // Return from this thread
//! ];
//!
//! let contract = Contract::new(bytes).with_name("Wrapping");
//!
//! let report = sentinel::new(
//!     contract,
//!     vm::Config::default(),
//!     FoldingOracle::in_rc(),
//!     LazyWatchdog.in_rc(),
//! )
//! .analyze()
//! .unwrap();
//!
//! assert_eq!(report.len(), 1);
//! assert_eq!(report.findings()[0].title, "Integer Underflow");
//! ```

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod analyzer;
pub mod constant;
pub mod contract;
pub mod detector;
pub mod disassembly;
pub mod error;
pub mod opcode;
pub mod report;
pub mod solver;
pub mod vm;
pub mod watchdog;

// Re-exports to provide the library interface.
pub use analyzer::new;
pub use report::{Finding, Report};
