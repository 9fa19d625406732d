//! This module contains the [`Opcode`] trait, and the concrete implementation
//! of each of the EVM's [opcodes](https://ethereum.org/en/developers/docs/evm/opcodes/).

pub mod arithmetic;
pub mod control;
pub mod environment;
pub mod logic;
pub mod macros;
pub mod memory;

use std::{fmt::Debug, rc::Rc};

use downcast_rs::Downcast;

use crate::vm::VM;

/// The result of executing an [`Opcode`] against the virtual machine.
pub type ExecuteResult = crate::error::execution::Result<()>;

/// This trait forms the core of the `Opcode` representation. It provides the
/// basic set of operations that are required of all opcodes, and is implemented
/// by each of the concrete opcodes.
///
/// # Object Safety
///
/// This trait must remain
/// [object safe](https://doc.rust-lang.org/reference/items/traits.html#object-safety)
/// as the implementors of the trait will be used in dynamic dispatch.
///
/// # Self Bounds
///
/// The bounds on `Self` are required by these traits for the following reasons:
///
/// - [`Downcast`] allows downcasting to concrete implementations of `Opcode`
///   where the execution engine needs to treat an opcode specially.
/// - [`Debug`] to provide representations to aid in debugging. It is
///   recommended to use the derive feature for this.
///
/// # Terminology
///
/// When referring to stack slots, we treat index 1 as being the top of the
/// stack.
pub trait Opcode
where
    Self: Debug + Downcast,
{
    /// Executes the opcode, modifying the state of the [`VM`] appropriately.
    ///
    /// # Errors
    ///
    /// If the state of the virtual machine does not allow execution of the
    /// opcode, or if execution would yield an invalid state in the virtual
    /// machine.
    fn execute(&self, vm: &mut VM) -> ExecuteResult;

    /// Gets the minimum cost of the opcode in gas.
    ///
    /// Many opcodes have a cost that depends on their arguments or on the
    /// state of the chain at execution time. As the machine executes
    /// symbolically it cannot resolve these, so each opcode instead reports
    /// the interval `[min_gas_cost, max_gas_cost]` its execution may cost.
    fn min_gas_cost(&self) -> usize;

    /// Gets the maximum cost of the opcode in gas.
    ///
    /// For opcodes with a state-independent cost this is the same as
    /// [`Self::min_gas_cost`], which is the default.
    fn max_gas_cost(&self) -> usize {
        self.min_gas_cost()
    }

    /// Gets the number of arguments that the opcode accepts from the virtual
    /// machine's stack.
    fn arg_count(&self) -> usize;

    /// Gets a textual representation of the opcode to aid in debugging.
    fn as_text_code(&self) -> String;

    /// Gets the byte representation of the opcode.
    fn as_byte(&self) -> u8;

    /// Encodes the opcode as its sequence of bytes in the instruction stream.
    ///
    /// For all opcodes but `PUSHN` this is just the opcode's byte.
    fn encode(&self) -> Vec<u8> {
        vec![self.as_byte()]
    }
}

downcast_rs::impl_downcast!(Opcode);

/// A type for an [`Opcode`] that is dynamically dispatched.
///
/// These are reference counted as the instruction stream is shared between
/// every thread of execution.
pub type DynOpcode = Rc<dyn Opcode>;
