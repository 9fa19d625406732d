//! This module contains the detector for arithmetic that can wrap around the
//! word width (SWC-101).

use crate::{
    detector::{Candidate, Detector, Observation, Phase},
    error::analysis::Result,
    opcode::arithmetic,
    report::{swc::SwcId, Description, Finding, Severity},
    vm::value::{BoxedVal, Provenance, SymbolicValue, SymbolicValueData},
};

/// The arithmetic operations the detector watches.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum WatchedOp {
    Addition,
    Multiplication,
    Subtraction,
}

impl WatchedOp {
    /// The name of the operation as it appears in the description texts.
    fn operation(self) -> &'static str {
        match self {
            Self::Addition => "addition",
            Self::Multiplication => "multiplication",
            Self::Subtraction => "subtraction",
        }
    }

    /// The kind of wrap the operation is susceptible to.
    fn wrap(self) -> &'static str {
        match self {
            Self::Addition | Self::Multiplication => "overflow",
            Self::Subtraction => "underflow",
        }
    }

    /// The title of the finding the operation gives rise to.
    fn title(self) -> &'static str {
        match self {
            Self::Addition | Self::Multiplication => "Integer Overflow",
            Self::Subtraction => "Integer Underflow",
        }
    }
}

/// A detector that reports `ADD`, `MUL`, and `SUB` instructions whose results
/// can wrap around the word width.
///
/// Each watched instruction is observed before it executes, while its
/// operands are still on the stack. The wrap condition is expressed as a
/// symbolic constraint over those operands and attached to the candidate, so
/// an instruction whose operands are sufficiently constrained along the
/// observed path is refuted by the oracle rather than reported.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IntegerArithmeticDetector;

impl IntegerArithmeticDetector {
    /// Builds the constraint that holds exactly when `op` wraps on the
    /// operands `left` and `right`.
    ///
    /// - Addition wraps iff `left + right < left`.
    /// - Subtraction wraps iff `left < right`.
    /// - Multiplication wraps iff `right != 0 && (left * right) / right !=
    ///   left`.
    fn wrap_condition(
        op: WatchedOp,
        instruction_pointer: u32,
        left: BoxedVal,
        right: BoxedVal,
    ) -> BoxedVal {
        let new = |data| SymbolicValue::new(instruction_pointer, data, Provenance::Synthetic);

        match op {
            WatchedOp::Addition => {
                let sum = new(SymbolicValueData::Add {
                    left:  left.clone(),
                    right,
                });
                new(SymbolicValueData::Lt {
                    left:  sum,
                    right: left,
                })
            }
            WatchedOp::Subtraction => new(SymbolicValueData::Lt { left, right }),
            WatchedOp::Multiplication => {
                let product = new(SymbolicValueData::Mul {
                    left:  left.clone(),
                    right: right.clone(),
                });
                let quotient = new(SymbolicValueData::Div {
                    dividend: product,
                    divisor:  right.clone(),
                });
                let lossless = new(SymbolicValueData::Eq {
                    left:  quotient,
                    right: left,
                });
                let lossy = new(SymbolicValueData::IsZero { number: lossless });
                let divisor_is_zero = new(SymbolicValueData::IsZero { number: right });
                let divisor_nonzero = new(SymbolicValueData::IsZero {
                    number: divisor_is_zero,
                });
                new(SymbolicValueData::And {
                    left:  lossy,
                    right: divisor_nonzero,
                })
            }
        }
    }
}

impl Detector for IntegerArithmeticDetector {
    fn name(&self) -> &'static str {
        "integer arithmetic"
    }

    fn observe(&self, observation: &Observation) -> Result<Vec<Candidate>> {
        if observation.phase != Phase::Before {
            return Ok(Vec::new());
        }

        let instruction = observation.instruction;
        let op = if instruction.downcast_ref::<arithmetic::Add>().is_some() {
            WatchedOp::Addition
        } else if instruction.downcast_ref::<arithmetic::Mul>().is_some() {
            WatchedOp::Multiplication
        } else if instruction.downcast_ref::<arithmetic::Sub>().is_some() {
            WatchedOp::Subtraction
        } else {
            return Ok(Vec::new());
        };

        // If the operands are not there the instruction itself is about to
        // fail, which is not this detector's concern.
        let stack = observation.state.stack();
        let (Ok(left), Ok(right)) = (stack.read(0), stack.read(1)) else {
            return Ok(Vec::new());
        };

        let constraint = Self::wrap_condition(
            op,
            observation.instruction_pointer,
            left.clone(),
            right.clone(),
        );

        let operation = op.operation();
        let wrap = op.wrap();
        let gas = observation.state.gas_used();
        let finding = Finding::new(
            SwcId::IntegerOverflowAndUnderflow,
            Severity::High,
            op.title(),
            Description::new(
                format!("The binary {operation} can {wrap}."),
                format!(
                    "The operands of the {operation} operation are not sufficiently constrained. \
                     The {operation} could therefore result in an integer {wrap}. Prevent the \
                     {wrap} by checking inputs or ensure sure that the {wrap} is caught by an \
                     assertion."
                ),
            ),
            observation.instruction_pointer,
            (gas.minimum(), gas.maximum()),
        );

        Ok(vec![Candidate::constrained(finding, constraint)])
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use crate::{
        detector::{integer::IntegerArithmeticDetector, Detector, Observation, Phase},
        opcode::{arithmetic, logic, DynOpcode},
        report::swc::SwcId,
        solver::{FoldingOracle, Oracle, Satisfiability},
        vm::{
            state::VMState,
            value::{known::KnownWord, Provenance, SymbolicValue},
        },
    };

    fn state_with_operands(top: impl Into<KnownWord>, next: impl Into<KnownWord>) -> VMState {
        let mut state = VMState::new();
        state
            .stack_mut()
            .push(SymbolicValue::new_known(0, next.into(), Provenance::Bytecode))
            .unwrap();
        state
            .stack_mut()
            .push(SymbolicValue::new_known(1, top.into(), Provenance::Bytecode))
            .unwrap();
        state
    }

    fn observe(detector: &IntegerArithmeticDetector, instruction: DynOpcode, state: &VMState) -> Vec<crate::detector::Candidate> {
        let observation = Observation {
            phase: Phase::Before,
            instruction_pointer: 10,
            instruction: &instruction,
            state,
        };
        detector.observe(&observation).unwrap()
    }

    #[test]
    fn reports_subtractions_that_can_underflow() {
        let state = state_with_operands(1u32, 2u32);
        let candidates = observe(&IntegerArithmeticDetector, Rc::new(arithmetic::Sub), &state);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].finding.title, "Integer Underflow");
        assert_eq!(
            candidates[0].finding.swc_id,
            SwcId::IntegerOverflowAndUnderflow
        );
        assert_eq!(
            candidates[0].finding.description.head,
            "The binary subtraction can underflow."
        );

        let constraint = candidates[0].constraint.clone().unwrap();
        assert_eq!(
            FoldingOracle::default().check(&[constraint]),
            Satisfiability::Satisfiable
        );
    }

    #[test]
    fn constrained_subtractions_fold_to_unsatisfiable() {
        let state = state_with_operands(5u32, 2u32);
        let candidates = observe(&IntegerArithmeticDetector, Rc::new(arithmetic::Sub), &state);

        let constraint = candidates[0].constraint.clone().unwrap();
        assert_eq!(
            FoldingOracle::default().check(&[constraint]),
            Satisfiability::Unsatisfiable
        );
    }

    #[test]
    fn reports_additions_that_can_overflow() {
        let max = KnownWord::from_be_bytes([0xff; 32]);
        let state = state_with_operands(max, 1u32);
        let candidates = observe(&IntegerArithmeticDetector, Rc::new(arithmetic::Add), &state);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].finding.title, "Integer Overflow");
        assert_eq!(
            candidates[0].finding.description.head,
            "The binary addition can overflow."
        );

        let constraint = candidates[0].constraint.clone().unwrap();
        assert_eq!(
            FoldingOracle::default().check(&[constraint]),
            Satisfiability::Satisfiable
        );
    }

    #[test]
    fn small_multiplications_fold_to_unsatisfiable() {
        let state = state_with_operands(3u32, 4u32);
        let candidates = observe(&IntegerArithmeticDetector, Rc::new(arithmetic::Mul), &state);

        assert_eq!(
            candidates[0].finding.description.head,
            "The binary multiplication can overflow."
        );
        let constraint = candidates[0].constraint.clone().unwrap();
        assert_eq!(
            FoldingOracle::default().check(&[constraint]),
            Satisfiability::Unsatisfiable
        );
    }

    #[test]
    fn ignores_unwatched_instructions_and_the_after_phase() {
        let state = state_with_operands(1u32, 2u32);
        let candidates = observe(&IntegerArithmeticDetector, Rc::new(logic::Lt), &state);
        assert!(candidates.is_empty());

        let instruction: DynOpcode = Rc::new(arithmetic::Sub);
        let observation = Observation {
            phase: Phase::After,
            instruction_pointer: 10,
            instruction: &instruction,
            state: &state,
        };
        assert!(IntegerArithmeticDetector
            .observe(&observation)
            .unwrap()
            .is_empty());
    }
}
