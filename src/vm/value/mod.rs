//! This module contains the definition of the [`SymbolicValue`] and its
//! supporting types.

pub mod known;

use std::rc::Rc;

use uuid::Uuid;

use crate::vm::value::known::KnownWord;

/// The type of a shared symbolic value.
///
/// Values are reference counted rather than boxed so that forked execution
/// states can share sub-structure instead of deep-copying their stacks,
/// memories, and path conditions. The trees themselves are immutable, so the
/// sharing is never observable through mutation.
pub type BoxedVal = Rc<SymbolicValue>;

/// A symbolic value is an "execution tree" that records the informative
/// operations that are made to a piece of data.
#[derive(Clone, Debug)]
pub struct SymbolicValue {
    /// The instruction pointer's value at the location where this part of the
    /// symbolic execution tree was recorded.
    pub instruction_pointer: u32,

    /// The actual execution tree that forms this value.
    pub data: SymbolicValueData,

    /// Where the value originally came from.
    pub provenance: Provenance,
}

impl SymbolicValue {
    /// Constructs a new `SymbolicValue` representing the operation performed
    /// at `instruction_pointer` on the symbolic `data`.
    ///
    /// It returns [`BoxedVal`] as in the vast majority of cases this type is
    /// used in a recursive data type and hence indirection is needed.
    pub fn new(
        instruction_pointer: u32,
        data: SymbolicValueData,
        provenance: Provenance,
    ) -> BoxedVal {
        Rc::new(Self {
            instruction_pointer,
            data,
            provenance,
        })
    }

    /// Constructs a new value at `instruction_pointer` about which nothing is
    /// known other than its identity.
    pub fn new_value(instruction_pointer: u32, provenance: Provenance) -> BoxedVal {
        Self::new(
            instruction_pointer,
            SymbolicValueData::default(),
            provenance,
        )
    }

    /// Constructs a new value at `instruction_pointer` with the concretely
    /// known word `value`.
    pub fn new_known(
        instruction_pointer: u32,
        value: KnownWord,
        provenance: Provenance,
    ) -> BoxedVal {
        Self::new(
            instruction_pointer,
            SymbolicValueData::KnownData { value },
            provenance,
        )
    }

    /// Gets the concretely known word for this value, if there is one at the
    /// root of the tree.
    #[must_use]
    pub fn known_value(&self) -> Option<KnownWord> {
        match &self.data {
            SymbolicValueData::KnownData { value } => Some(*value),
            _ => None,
        }
    }

    /// Gets the direct children of this value in the execution tree.
    #[must_use]
    pub fn children(&self) -> Vec<&BoxedVal> {
        use SymbolicValueData::*;
        match &self.data {
            Add { left, right }
            | Mul { left, right }
            | Sub { left, right }
            | Lt { left, right }
            | Gt { left, right }
            | SLt { left, right }
            | SGt { left, right }
            | Eq { left, right }
            | And { left, right }
            | Or { left, right }
            | Xor { left, right } => vec![left, right],
            Div { dividend, divisor }
            | SDiv { dividend, divisor }
            | Mod { dividend, divisor }
            | SMod { dividend, divisor } => vec![dividend, divisor],
            AddMod {
                left,
                right,
                modulus,
            }
            | MulMod {
                left,
                right,
                modulus,
            } => vec![left, right, modulus],
            Exp { value, exponent } => vec![value, exponent],
            SignExtend { size, value } | Byte { offset: size, value } => vec![size, value],
            Shl { shift, value } | Shr { shift, value } | Sar { shift, value } => {
                vec![shift, value]
            }
            IsZero { number } => vec![number],
            Not { value } => vec![value],
            Sha3 { data } => data.iter().collect(),
            Balance { address } | ExtCodeSize { address } | ExtCodeHash { address } => {
                vec![address]
            }
            BlockHash { block_number } => vec![block_number],
            CallData { offset } => vec![offset],
            SLoad { key } => vec![key],
            Create {
                value,
                offset,
                size,
            } => vec![value, offset, size],
            Create2 {
                value,
                offset,
                size,
                salt,
            } => vec![value, offset, size, salt],
            _ => vec![],
        }
    }

    /// Visits every node in this value's execution tree in pre-order, calling
    /// `visitor` on each.
    pub fn walk(&self, visitor: &mut impl FnMut(&SymbolicValue)) {
        visitor(self);
        for child in self.children() {
            child.walk(visitor);
        }
    }

    /// Checks if any node in this value's execution tree satisfies
    /// `predicate`.
    #[must_use]
    pub fn contains(&self, predicate: impl Fn(&SymbolicValueData) -> bool) -> bool {
        let mut found = false;
        self.walk(&mut |node| {
            if predicate(&node.data) {
                found = true;
            }
        });
        found
    }

    /// Counts the nodes in this value's execution tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }

    /// Attempts to evaluate this value's execution tree to a concretely known
    /// word, with all arithmetic wrapping at `width_bits`.
    ///
    /// This is a best-effort evaluation. Trees containing any node whose
    /// value depends on the execution environment fold to [`None`].
    #[must_use]
    pub fn constant_fold(&self, width_bits: usize) -> Option<KnownWord> {
        use SymbolicValueData::*;
        let word = match &self.data {
            KnownData { value } => *value,
            Add { left, right } => {
                (left.constant_fold(width_bits)? + right.constant_fold(width_bits)?)
                    .masked(width_bits)
            }
            Mul { left, right } => {
                (left.constant_fold(width_bits)? * right.constant_fold(width_bits)?)
                    .masked(width_bits)
            }
            Sub { left, right } => {
                (left.constant_fold(width_bits)? - right.constant_fold(width_bits)?)
                    .masked(width_bits)
            }
            Div { dividend, divisor } => {
                dividend.constant_fold(width_bits)? / divisor.constant_fold(width_bits)?
            }
            SDiv { dividend, divisor } => dividend
                .constant_fold(width_bits)?
                .signed_div(divisor.constant_fold(width_bits)?)
                .masked(width_bits),
            Mod { dividend, divisor } => {
                dividend.constant_fold(width_bits)? % divisor.constant_fold(width_bits)?
            }
            SMod { dividend, divisor } => dividend
                .constant_fold(width_bits)?
                .signed_rem(divisor.constant_fold(width_bits)?)
                .masked(width_bits),
            AddMod {
                left,
                right,
                modulus,
            } => (left.constant_fold(width_bits)? + right.constant_fold(width_bits)?)
                .masked(width_bits)
                % modulus.constant_fold(width_bits)?,
            MulMod {
                left,
                right,
                modulus,
            } => (left.constant_fold(width_bits)? * right.constant_fold(width_bits)?)
                .masked(width_bits)
                % modulus.constant_fold(width_bits)?,
            Exp { value, exponent } => value
                .constant_fold(width_bits)?
                .exp(exponent.constant_fold(width_bits)?)
                .masked(width_bits),
            SignExtend { size, value } => value
                .constant_fold(width_bits)?
                .sign_extend(size.constant_fold(width_bits)?)
                .masked(width_bits),
            Lt { left, right } => left
                .constant_fold(width_bits)?
                .lt(right.constant_fold(width_bits)?),
            Gt { left, right } => left
                .constant_fold(width_bits)?
                .gt(right.constant_fold(width_bits)?),
            SLt { left, right } => left
                .constant_fold(width_bits)?
                .signed_lt(right.constant_fold(width_bits)?),
            SGt { left, right } => left
                .constant_fold(width_bits)?
                .signed_gt(right.constant_fold(width_bits)?),
            Eq { left, right } => left
                .constant_fold(width_bits)?
                .eq_word(right.constant_fold(width_bits)?),
            IsZero { number } => number.constant_fold(width_bits)?.is_zero(),
            And { left, right } => {
                left.constant_fold(width_bits)? & right.constant_fold(width_bits)?
            }
            Or { left, right } => {
                left.constant_fold(width_bits)? | right.constant_fold(width_bits)?
            }
            Xor { left, right } => {
                left.constant_fold(width_bits)? ^ right.constant_fold(width_bits)?
            }
            Not { value } => (!value.constant_fold(width_bits)?).masked(width_bits),
            Byte { offset, value } => value
                .constant_fold(width_bits)?
                .byte(offset.constant_fold(width_bits)?),
            Shl { shift, value } => (value.constant_fold(width_bits)?
                << shift.constant_fold(width_bits)?)
            .masked(width_bits),
            Shr { shift, value } => {
                value.constant_fold(width_bits)? >> shift.constant_fold(width_bits)?
            }
            Sar { shift, value } => value
                .constant_fold(width_bits)?
                .sar(shift.constant_fold(width_bits)?)
                .masked(width_bits),
            _ => return None,
        };

        Some(word)
    }
}

/// Equality for symbolic values is structural over the execution tree,
/// ignoring the instruction pointers and provenances at which the nodes were
/// recorded.
///
/// Two constants pushed by different instructions therefore compare equal,
/// which is what allows the sparse memory and storage to address a slot
/// consistently across writes.
impl PartialEq for SymbolicValue {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for SymbolicValue {}

/// Where the value in question came from during execution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Provenance {
    /// The value was created while executing an instruction.
    Execution,

    /// The value was read directly from the bytecode, such as a `PUSH`
    /// immediate.
    Bytecode,

    /// The value was read from the data of the transaction's message.
    MessageData,

    /// The value was read from the contract's storage.
    Storage,

    /// The value describes part of the execution environment, such as the
    /// current block.
    Environment,

    /// The value was created by the analyzer itself rather than by any part
    /// of the program under analysis.
    Synthetic,
}

/// The execution tree structures that allow the analyzer to build traces of
/// the execution pertaining to certain symbolic values.
///
/// Note that these do not duplicate the opcodes 1:1, instead representing the
/// opcode operations that _provide information about the value_ as an
/// execution tree. Notable (and intentional) omissions here are the opcodes
/// that deal with memory, storage, and the stack.
///
/// # Semantics
///
/// For the semantics of these operations at runtime, please see the
/// corresponding documentation comments in the [`crate::opcode`] subtree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SymbolicValueData {
    /// A value with identity, but about which nothing else is known.
    Value { id: Uuid },

    /// A value that is made up of a concretely known word.
    KnownData { value: KnownWord },

    /// Addition of symbolic values.
    Add { left: BoxedVal, right: BoxedVal },

    /// Multiplication of symbolic values.
    Mul { left: BoxedVal, right: BoxedVal },

    /// Subtraction of symbolic values.
    Sub { left: BoxedVal, right: BoxedVal },

    /// Division of symbolic values.
    Div { dividend: BoxedVal, divisor: BoxedVal },

    /// Signed division of symbolic values.
    SDiv { dividend: BoxedVal, divisor: BoxedVal },

    /// Modulo of symbolic values.
    Mod { dividend: BoxedVal, divisor: BoxedVal },

    /// Signed modulo of symbolic values.
    SMod { dividend: BoxedVal, divisor: BoxedVal },

    /// Addition followed by modulo.
    AddMod {
        left:    BoxedVal,
        right:   BoxedVal,
        modulus: BoxedVal,
    },

    /// Multiplication followed by modulo.
    MulMod {
        left:    BoxedVal,
        right:   BoxedVal,
        modulus: BoxedVal,
    },

    /// Exponentiation of symbolic values.
    Exp { value: BoxedVal, exponent: BoxedVal },

    /// Sign extension of a symbolic value to a symbolic length.
    SignExtend { size: BoxedVal, value: BoxedVal },

    /// A keccak256 hash over symbolic values.
    Sha3 { data: Vec<BoxedVal> },

    /// The address of the currently-executing contract.
    Address,

    /// The balance of the target account.
    Balance { address: BoxedVal },

    /// The address of the transaction's origin.
    Origin,

    /// The caller of the current message.
    Caller,

    /// The value deposited by the caller.
    CallValue,

    /// A word read from the data of the transaction's message at a symbolic
    /// offset.
    CallData { offset: BoxedVal },

    /// The size of the data of the transaction's message.
    CallDataSize,

    /// The size of the currently-executing code.
    CodeSize,

    /// The current gas price.
    GasPrice,

    /// The size of the code of the target account.
    ExtCodeSize { address: BoxedVal },

    /// Compute the external code hash of a symbolic value.
    ExtCodeHash { address: BoxedVal },

    /// The size of the return data from the most recent call.
    ReturnDataSize,

    /// Gets the block hash of one of the most recent blocks.
    BlockHash { block_number: BoxedVal },

    /// Gets the block's beneficiary address.
    CoinBase,

    /// Gets the timestamp of the current block.
    Timestamp,

    /// Gets the number of the current block.
    Number,

    /// Gets the difficulty of the current block.
    Difficulty,

    /// Gets the gas limit of the current block.
    GasLimit,

    /// Gets the identifier for the chain on which the current block is
    /// executing.
    ChainId,

    /// Gets the balance of the currently executing account.
    SelfBalance,

    /// Gets the block base fee.
    BaseFee,

    /// Gets the currently available gas.
    Gas,

    /// Gets the size of the active memory.
    MSize,

    /// A word read from a storage slot that was never written during the
    /// current execution.
    SLoad { key: BoxedVal },

    /// The boolean success value pushed by one of the call-family opcodes.
    ///
    /// It has an `id` so that the return values of distinct calls remain
    /// distinguishable even when the call operands coincide.
    CallResult { id: Uuid },

    /// The address pushed by creating a new contract.
    Create {
        value:  BoxedVal,
        offset: BoxedVal,
        size:   BoxedVal,
    },

    /// The address pushed by creating a new contract at a predictable
    /// address.
    Create2 {
        value:  BoxedVal,
        offset: BoxedVal,
        size:   BoxedVal,
        salt:   BoxedVal,
    },

    /// Less than for symbolic values.
    Lt { left: BoxedVal, right: BoxedVal },

    /// Greater than for symbolic values.
    Gt { left: BoxedVal, right: BoxedVal },

    /// Less than for symbolic values where the values are signed.
    SLt { left: BoxedVal, right: BoxedVal },

    /// Greater than for symbolic values where the values are signed.
    SGt { left: BoxedVal, right: BoxedVal },

    /// Equality for symbolic values.
    Eq { left: BoxedVal, right: BoxedVal },

    /// Checking if a symbolic value is zero.
    IsZero { number: BoxedVal },

    /// Conjunction for symbolic values.
    And { left: BoxedVal, right: BoxedVal },

    /// Disjunction for symbolic values.
    Or { left: BoxedVal, right: BoxedVal },

    /// XOR for symbolic values.
    Xor { left: BoxedVal, right: BoxedVal },

    /// Negation of a symbolic value.
    Not { value: BoxedVal },

    /// Gets a byte from a word.
    Byte { offset: BoxedVal, value: BoxedVal },

    /// Left shift with symbolic values.
    Shl { shift: BoxedVal, value: BoxedVal },

    /// Right shift with symbolic values.
    Shr { shift: BoxedVal, value: BoxedVal },

    /// Signed right shift with symbolic values.
    Sar { shift: BoxedVal, value: BoxedVal },
}

/// The default value for a symbolic value's data is a
/// [`SymbolicValueData::Value`] about which nothing else is known.
impl Default for SymbolicValueData {
    fn default() -> Self {
        SymbolicValueData::Value { id: Uuid::new_v4() }
    }
}
