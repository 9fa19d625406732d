//! This module contains the interface to the constraint oracle used to decide
//! the satisfiability of path conditions, along with the built-in oracle
//! implementations.
//!
//! The machine only ever asks an oracle whether a conjunction of boolean
//! symbolic values can hold. Oracles are free to be as clever or as cheap as
//! they like, as long as they are _sound in one direction_: an answer of
//! [`Satisfiability::Unsatisfiable`] must be a proof, while
//! [`Satisfiability::Unknown`] is always acceptable. The execution engine
//! treats `Unknown` conservatively, keeping the queried path alive.

use std::rc::Rc;

use crate::{
    constant::WORD_SIZE_BITS,
    vm::value::BoxedVal,
};

/// The verdict an [`Oracle`] gives about a conjunction of constraints.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Satisfiability {
    /// The constraints can all hold at once, witnessed by the oracle.
    Satisfiable,

    /// The constraints can never all hold at once.
    ///
    /// This verdict is trusted absolutely, so it must only be returned when
    /// the oracle can actually prove it.
    Unsatisfiable,

    /// The oracle could not decide either way.
    Unknown,
}

impl Satisfiability {
    /// Checks whether the queried constraints might still hold, which is the
    /// question the execution engine actually asks.
    ///
    /// Both [`Self::Satisfiable`] and [`Self::Unknown`] answer yes; only a
    /// proof of unsatisfiability answers no.
    #[must_use]
    pub fn may_hold(&self) -> bool {
        !matches!(self, Self::Unsatisfiable)
    }
}

/// The interface to a decision procedure for path conditions.
///
/// # Object Safety
///
/// This trait must remain
/// [object safe](https://doc.rust-lang.org/reference/items/traits.html#object-safety)
/// as the implementors of the trait will be used in dynamic dispatch.
pub trait Oracle
where
    Self: std::fmt::Debug,
{
    /// Decides whether the conjunction of the provided `constraints` can
    /// hold, where each constraint is a boolean symbolic value that holds
    /// when it evaluates to a non-zero word.
    ///
    /// An empty conjunction trivially holds.
    fn check(&self, constraints: &[BoxedVal]) -> Satisfiability;
}

/// A type for an [`Oracle`] that is dynamically dispatched.
pub type DynOracle = Rc<dyn Oracle>;

/// An oracle that decides nothing.
///
/// Every query comes back [`Satisfiability::Unknown`], so execution explores
/// every syntactically reachable path. This is the weakest sound oracle, and
/// is useful as a baseline and in testing.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TrivialOracle;

impl TrivialOracle {
    /// Constructs a new trivial oracle, wrapped for use by the execution
    /// engine.
    #[must_use]
    pub fn in_rc() -> DynOracle {
        Rc::new(Self)
    }
}

impl Oracle for TrivialOracle {
    fn check(&self, _constraints: &[BoxedVal]) -> Satisfiability {
        Satisfiability::Unknown
    }
}

/// An oracle that decides queries by constant folding.
///
/// Each constraint is independently folded at the oracle's word width, which
/// defaults to the EVM's 256 bits. A constraint that folds to zero can never
/// hold, making the whole conjunction unsatisfiable. If every constraint
/// folds to a non-zero constant the conjunction provably holds. Anything
/// involving a genuinely symbolic value is left undecided.
///
/// This is deliberately cheap. It is enough to stop execution from exploring
/// branches that are concretely dead (a very common pattern in
/// compiler-generated dispatch code), while remaining sound by answering
/// [`Satisfiability::Unknown`] everywhere else.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FoldingOracle {
    /// The word width at which wrapping arithmetic is folded.
    width_bits: usize,
}

impl FoldingOracle {
    /// Constructs a new folding oracle at the default word width, wrapped for
    /// use by the execution engine.
    #[must_use]
    pub fn in_rc() -> DynOracle {
        Rc::new(Self::default())
    }

    /// Sets the word width at which wrapping arithmetic is folded to
    /// `width_bits`.
    #[must_use]
    pub fn with_width_bits(mut self, width_bits: usize) -> Self {
        self.width_bits = width_bits;
        self
    }
}

impl Default for FoldingOracle {
    fn default() -> Self {
        let width_bits = WORD_SIZE_BITS;
        Self { width_bits }
    }
}

impl Oracle for FoldingOracle {
    fn check(&self, constraints: &[BoxedVal]) -> Satisfiability {
        let mut all_known = true;

        for constraint in constraints {
            match constraint.constant_fold(self.width_bits) {
                Some(word) if bool::from(word) => (),
                Some(_) => return Satisfiability::Unsatisfiable,
                None => all_known = false,
            }
        }

        if all_known {
            Satisfiability::Satisfiable
        } else {
            Satisfiability::Unknown
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        solver::{FoldingOracle, Oracle, Satisfiability, TrivialOracle},
        vm::value::{known::KnownWord, Provenance, SymbolicValue, SymbolicValueData},
    };

    #[test]
    fn trivial_oracle_never_decides() {
        let oracle = TrivialOracle;
        assert_eq!(oracle.check(&[]), Satisfiability::Unknown);

        let symbolic = SymbolicValue::new_value(0, Provenance::MessageData);
        assert_eq!(oracle.check(&[symbolic]), Satisfiability::Unknown);
    }

    #[test]
    fn folding_oracle_proves_empty_conjunctions() {
        assert_eq!(FoldingOracle::default().check(&[]), Satisfiability::Satisfiable);
    }

    #[test]
    fn folding_oracle_refutes_concretely_false_constraints() {
        let truthy = SymbolicValue::new_known(0, KnownWord::one(), Provenance::Execution);
        let falsy = SymbolicValue::new_known(1, KnownWord::zero(), Provenance::Execution);

        assert_eq!(
            FoldingOracle::default().check(&[truthy.clone()]),
            Satisfiability::Satisfiable
        );
        assert_eq!(
            FoldingOracle::default().check(&[truthy, falsy]),
            Satisfiability::Unsatisfiable
        );
    }

    #[test]
    fn folding_oracle_leaves_symbolic_constraints_undecided() {
        let symbolic = SymbolicValue::new_value(0, Provenance::MessageData);
        let negated = SymbolicValue::new(
            1,
            SymbolicValueData::IsZero { number: symbolic.clone() },
            Provenance::Execution,
        );

        assert_eq!(
            FoldingOracle::default().check(&[symbolic, negated]),
            Satisfiability::Unknown
        );
    }

    #[test]
    fn folding_oracle_respects_the_configured_word_width() {
        // 200 + 56 wraps to zero in an eight-bit word.
        let wrapping_sum = SymbolicValue::new(
            1,
            SymbolicValueData::Add {
                left:  SymbolicValue::new_known(0, KnownWord::new(200u32), Provenance::Execution),
                right: SymbolicValue::new_known(0, KnownWord::new(56u32), Provenance::Execution),
            },
            Provenance::Execution,
        );

        assert_eq!(
            FoldingOracle::default().check(&[wrapping_sum.clone()]),
            Satisfiability::Satisfiable
        );
        assert_eq!(
            FoldingOracle::default().with_width_bits(8).check(&[wrapping_sum]),
            Satisfiability::Unsatisfiable
        );
    }

    #[test]
    fn folding_oracle_folds_compound_constraints() {
        let two = SymbolicValue::new_known(0, KnownWord::new(2u32), Provenance::Execution);
        let three = SymbolicValue::new_known(0, KnownWord::new(3u32), Provenance::Execution);
        let five = SymbolicValue::new(
            1,
            SymbolicValueData::Add {
                left:  two,
                right: three,
            },
            Provenance::Execution,
        );

        assert_eq!(FoldingOracle::default().check(&[five]), Satisfiability::Satisfiable);
    }
}
