//! This module contains the detector for message calls whose success value is
//! never checked (SWC-104).

use crate::{
    detector::{Candidate, Detector, Observation},
    error::analysis::Result,
    report::{swc::SwcId, Description, Finding, Severity},
    vm::{
        state::VMState,
        value::{Provenance, SymbolicValue, SymbolicValueData},
    },
};

/// A detector that reports call-family instructions whose boolean success
/// value never reaches a conditional branch.
///
/// Whether a success value is checked is a property of a whole path, not of
/// any single instruction: the check may come arbitrarily long after the call
/// itself. The state tracks the success value of every call it executes and
/// marks it checked when a branch condition consumes it, so this detector
/// only has work to do once a thread has completed.
///
/// Each surviving record becomes one candidate, constrained on the call
/// having actually failed. A path that proves the call succeeded is thereby
/// refuted by the oracle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UncheckedRetvalDetector;

impl Detector for UncheckedRetvalDetector {
    fn name(&self) -> &'static str {
        "unchecked return value"
    }

    fn observe(&self, _observation: &Observation) -> Result<Vec<Candidate>> {
        Ok(Vec::new())
    }

    fn thread_complete(&self, state: &VMState) -> Result<Vec<Candidate>> {
        let gas = state.gas_used();
        let candidates = state
            .unchecked_call_records()
            .into_iter()
            .map(|record| {
                let finding = Finding::new(
                    SwcId::UncheckedCallReturnValue,
                    Severity::Low,
                    "Unchecked Call Return Value",
                    Description::new(
                        "The return value of a message call is not checked.",
                        "External calls return a boolean value. If the callee contract halts \
                         with an exception, 'false' is returned and execution continues in the \
                         caller. It is usually recommended to wrap external calls into a require \
                         statement to prevent unexpected states.",
                    ),
                    record.instruction_pointer,
                    (gas.minimum(), gas.maximum()),
                );
                let call_failed = SymbolicValue::new(
                    record.instruction_pointer,
                    SymbolicValueData::IsZero {
                        number: record.result.clone(),
                    },
                    Provenance::Synthetic,
                );

                Candidate::constrained(finding, call_failed)
            })
            .collect();

        Ok(candidates)
    }
}

#[cfg(test)]
mod test {
    use uuid::Uuid;

    use crate::{
        detector::{unchecked_call::UncheckedRetvalDetector, Detector},
        report::swc::SwcId,
        vm::{
            state::{
                call_frame::{CallKind, CallRecord},
                VMState,
            },
            value::{BoxedVal, Provenance, SymbolicValue, SymbolicValueData},
        },
    };

    fn record_call_at(state: &mut VMState, instruction_pointer: u32) -> BoxedVal {
        let id = Uuid::new_v4();
        let result = SymbolicValue::new(
            instruction_pointer,
            SymbolicValueData::CallResult { id },
            Provenance::Execution,
        );
        state.record_call(CallRecord {
            instruction_pointer,
            kind: CallKind::Call,
            callee: SymbolicValue::new_value(instruction_pointer, Provenance::MessageData),
            result: result.clone(),
            result_id: id,
            checked: false,
        });
        result
    }

    #[test]
    fn reports_each_unchecked_call_once() {
        let mut state = VMState::new();
        record_call_at(&mut state, 618);
        record_call_at(&mut state, 1038);

        let candidates = UncheckedRetvalDetector.thread_complete(&state).unwrap();

        let mut offsets: Vec<u32> = candidates
            .iter()
            .map(|c| c.finding.instruction_pointer)
            .collect();
        offsets.sort_unstable();
        assert_eq!(offsets, vec![618, 1038]);
        assert!(candidates
            .iter()
            .all(|c| c.finding.swc_id == SwcId::UncheckedCallReturnValue));
        assert!(candidates.iter().all(|c| c.constraint.is_some()));
    }

    #[test]
    fn checked_calls_are_not_reported() {
        let mut state = VMState::new();
        let checked_result = record_call_at(&mut state, 618);
        record_call_at(&mut state, 1038);

        let condition = SymbolicValue::new(
            620,
            SymbolicValueData::IsZero {
                number: checked_result,
            },
            Provenance::Execution,
        );
        state.mark_call_results_checked(&condition);

        let candidates = UncheckedRetvalDetector.thread_complete(&state).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].finding.instruction_pointer, 1038);
    }

    #[test]
    fn threads_without_calls_produce_nothing() {
        let state = VMState::new();
        assert!(UncheckedRetvalDetector
            .thread_complete(&state)
            .unwrap()
            .is_empty());
    }
}
