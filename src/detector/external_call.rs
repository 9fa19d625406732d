//! This module contains the detector for message calls whose callee address
//! is under the control of the transaction sender (SWC-107).

use crate::{
    detector::{Candidate, Detector, Observation, Phase},
    error::analysis::Result,
    opcode::control,
    report::{swc::SwcId, Description, Finding, Severity},
    vm::value::{BoxedVal, Provenance, SymbolicValueData},
};

/// A detector that reports call-family instructions whose callee address is
/// derived from the transaction rather than being fixed by the contract.
///
/// Such a call can be pointed at arbitrary code by whoever constructs the
/// transaction, so it can re-enter the contract under analysis. The check is
/// structural: the callee operand's execution tree is searched for anything
/// the message sender controls, which covers both direct uses of the calldata
/// and values computed from it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ExternalCallDetector;

/// Checks whether any part of `value` was supplied by the transaction sender.
fn is_user_supplied(value: &BoxedVal) -> bool {
    let mut found = false;
    value.walk(&mut |node| {
        let sender_controlled = matches!(
            node.data,
            SymbolicValueData::CallData { .. }
                | SymbolicValueData::Caller
                | SymbolicValueData::Origin
        );
        if sender_controlled || node.provenance == Provenance::MessageData {
            found = true;
        }
    });
    found
}

impl Detector for ExternalCallDetector {
    fn name(&self) -> &'static str {
        "external call target"
    }

    fn observe(&self, observation: &Observation) -> Result<Vec<Candidate>> {
        if observation.phase != Phase::Before {
            return Ok(Vec::new());
        }

        let instruction = observation.instruction;
        let is_call_family = instruction.downcast_ref::<control::Call>().is_some()
            || instruction.downcast_ref::<control::CallCode>().is_some()
            || instruction.downcast_ref::<control::DelegateCall>().is_some()
            || instruction.downcast_ref::<control::StaticCall>().is_some();
        if !is_call_family {
            return Ok(Vec::new());
        }

        // The callee address sits below the gas operand for every member of
        // the call family.
        let Ok(callee) = observation.state.stack().read(1) else {
            return Ok(Vec::new());
        };
        if !is_user_supplied(callee) {
            return Ok(Vec::new());
        }

        let gas = observation.state.gas_used();
        let finding = Finding::new(
            SwcId::Reentrancy,
            Severity::Medium,
            "External Call To User-Supplied Address",
            Description::new(
                "A call to a user-supplied address is executed.",
                "The callee address of an external message call can be set by the caller. Note \
                 that the callee can contain arbitrary code and may re-enter any function in \
                 this contract. Review the business logic carefully to prevent averse effects on \
                 the contract state.",
            ),
            observation.instruction_pointer,
            (gas.minimum(), gas.maximum()),
        );

        Ok(vec![Candidate::unconditional(finding)])
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use crate::{
        detector::{external_call::ExternalCallDetector, Detector, Observation, Phase},
        opcode::{control, DynOpcode},
        report::swc::SwcId,
        vm::{
            state::VMState,
            value::{known::KnownWord, BoxedVal, Provenance, SymbolicValue, SymbolicValueData},
        },
    };

    fn state_with_callee(callee: BoxedVal) -> VMState {
        let mut state = VMState::new();
        // Push the operands deepest-first so the gas operand ends up on top.
        for _ in 0..5 {
            state
                .stack_mut()
                .push(SymbolicValue::new_known(
                    0,
                    KnownWord::zero(),
                    Provenance::Bytecode,
                ))
                .unwrap();
        }
        state.stack_mut().push(callee).unwrap();
        state
            .stack_mut()
            .push(SymbolicValue::new_known(
                0,
                KnownWord::new(2300u32),
                Provenance::Bytecode,
            ))
            .unwrap();
        state
    }

    fn observe(instruction: DynOpcode, callee: BoxedVal) -> Vec<crate::detector::Candidate> {
        let state = state_with_callee(callee);
        let observation = Observation {
            phase: Phase::Before,
            instruction_pointer: 42,
            instruction: &instruction,
            state: &state,
        };
        ExternalCallDetector.observe(&observation).unwrap()
    }

    #[test]
    fn reports_calls_to_calldata_derived_addresses() {
        let offset = SymbolicValue::new_known(0, KnownWord::zero(), Provenance::Bytecode);
        let callee = SymbolicValue::new(
            1,
            SymbolicValueData::CallData { offset },
            Provenance::MessageData,
        );

        let candidates = observe(Rc::new(control::Call), callee);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].finding.swc_id, SwcId::Reentrancy);
        assert_eq!(
            candidates[0].finding.title,
            "External Call To User-Supplied Address"
        );
        assert_eq!(candidates[0].finding.instruction_pointer, 42);
    }

    #[test]
    fn derivation_is_followed_through_computation() {
        // An address masked out of the calldata is still user supplied.
        let raw = SymbolicValue::new_value(0, Provenance::MessageData);
        let callee = SymbolicValue::new(
            1,
            SymbolicValueData::And {
                left:  raw,
                right: SymbolicValue::new_known(1, KnownWord::one(), Provenance::Bytecode),
            },
            Provenance::Execution,
        );

        assert_eq!(observe(Rc::new(control::StaticCall), callee).len(), 1);
    }

    #[test]
    fn fixed_addresses_are_not_reported() {
        let callee = SymbolicValue::new_known(0, KnownWord::new(0xdeadu32), Provenance::Bytecode);
        assert!(observe(Rc::new(control::Call), callee).is_empty());

        let environment = SymbolicValue::new(0, SymbolicValueData::Address, Provenance::Environment);
        assert!(observe(Rc::new(control::DelegateCall), environment).is_empty());
    }

    #[test]
    fn ignores_instructions_outside_the_call_family() {
        let callee = SymbolicValue::new_value(0, Provenance::MessageData);
        assert!(observe(Rc::new(control::Jump), callee).is_empty());
    }
}
