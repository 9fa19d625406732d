//! This module contains the detector for usage of the deprecated `CALLCODE`
//! instruction (SWC-111).

use crate::{
    detector::{Candidate, Detector, Observation, Phase},
    error::analysis::Result,
    opcode::control,
    report::{swc::SwcId, Description, Finding, Severity},
};

/// A detector that reports every reachable `CALLCODE` instruction.
///
/// The weakness is the instruction's presence, so candidates carry no extra
/// constraint. Reaching the instruction on any explored path is enough.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CallCodeDetector;

impl Detector for CallCodeDetector {
    fn name(&self) -> &'static str {
        "callcode usage"
    }

    fn observe(&self, observation: &Observation) -> Result<Vec<Candidate>> {
        if observation.phase != Phase::Before {
            return Ok(Vec::new());
        }
        if observation
            .instruction
            .downcast_ref::<control::CallCode>()
            .is_none()
        {
            return Ok(Vec::new());
        }

        let gas = observation.state.gas_used();
        let finding = Finding::new(
            SwcId::DeprecatedFunctionsUsage,
            Severity::Medium,
            "Use of callcode",
            Description::new(
                "Use of callcode is deprecated.",
                "The callcode method executes code of another contract in the context of the \
                 caller account. Due to a bug in the implementation it does not persist sender \
                 and value over the call. It was therefore deprecated and may be removed in the \
                 future. Use the delegatecall method instead.",
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
        detector::{callcode::CallCodeDetector, Detector, Observation, Phase},
        opcode::{control, DynOpcode},
        report::swc::SwcId,
        vm::state::VMState,
    };

    fn observe(instruction: DynOpcode, phase: Phase) -> Vec<crate::detector::Candidate> {
        let state = VMState::new();
        let observation = Observation {
            phase,
            instruction_pointer: 24,
            instruction: &instruction,
            state: &state,
        };
        CallCodeDetector.observe(&observation).unwrap()
    }

    #[test]
    fn reports_callcode_unconditionally() {
        let candidates = observe(Rc::new(control::CallCode), Phase::Before);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].finding.swc_id, SwcId::DeprecatedFunctionsUsage);
        assert_eq!(candidates[0].finding.title, "Use of callcode");
        assert_eq!(candidates[0].finding.instruction_pointer, 24);
        assert!(candidates[0].constraint.is_none());
    }

    #[test]
    fn ignores_the_other_call_instructions() {
        assert!(observe(Rc::new(control::Call), Phase::Before).is_empty());
        assert!(observe(Rc::new(control::DelegateCall), Phase::Before).is_empty());
        assert!(observe(Rc::new(control::StaticCall), Phase::Before).is_empty());
    }

    #[test]
    fn only_fires_before_execution() {
        assert!(observe(Rc::new(control::CallCode), Phase::After).is_empty());
    }
}
