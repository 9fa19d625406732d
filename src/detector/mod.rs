//! This module contains the vulnerability detectors that observe symbolic
//! execution and produce candidate findings, together with the registry that
//! runs them.
//!
//! Detectors are independent and order-insensitive. They never mutate the
//! state they observe, and one detector failing never stops the others from
//! running.

pub mod callcode;
pub mod external_call;
pub mod integer;
pub mod unchecked_call;

use std::{
    any::{Any, TypeId},
    collections::HashSet,
    fmt::Debug,
    ops::Deref,
};

use derivative::Derivative;
use downcast_rs::Downcast;

use crate::{
    detector::{
        callcode::CallCodeDetector,
        external_call::ExternalCallDetector,
        integer::IntegerArithmeticDetector,
        unchecked_call::UncheckedRetvalDetector,
    },
    error::analysis::{Errors, Result},
    opcode::DynOpcode,
    report::Finding,
    solver::Oracle,
    vm::{state::VMState, value::BoxedVal},
};

/// Whether an observation is delivered before or after the instruction
/// executes against the state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// The instruction is about to execute; its operands are still on the
    /// stack.
    Before,

    /// The instruction has executed; its results are on the stack.
    After,
}

/// One observation of the execution stream, as delivered to every detector.
///
/// The observation grants read access to the instruction and the executing
/// thread's state, including its stack, call stack, call records, path
/// condition, and gas accounting.
#[derive(Clone, Copy, Debug)]
pub struct Observation<'a> {
    /// Whether the instruction has executed yet.
    pub phase: Phase,

    /// The bytecode offset of the instruction.
    pub instruction_pointer: u32,

    /// The instruction being observed.
    pub instruction: &'a DynOpcode,

    /// The state of the thread executing the instruction.
    pub state: &'a VMState,
}

/// A candidate finding, produced by a detector but not yet confirmed
/// feasible.
///
/// A candidate may carry an extra boolean constraint describing the condition
/// under which the weakness manifests. The registry promotes the candidate to
/// a reported finding only if that constraint, conjoined with the path
/// condition it was observed under, is not proven unsatisfiable.
#[derive(Clone, Debug)]
pub struct Candidate {
    /// The finding to report if the candidate is confirmed.
    pub finding: Finding,

    /// The condition under which the weakness manifests, if the trigger is
    /// not unconditional.
    pub constraint: Option<BoxedVal>,
}

impl Candidate {
    /// Constructs a candidate whose trigger is unconditional.
    #[must_use]
    pub fn unconditional(finding: Finding) -> Self {
        Self {
            finding,
            constraint: None,
        }
    }

    /// Constructs a candidate that manifests only when `constraint` can hold.
    #[must_use]
    pub fn constrained(finding: Finding, constraint: BoxedVal) -> Self {
        Self {
            finding,
            constraint: Some(constraint),
        }
    }
}

/// The interface implemented by each vulnerability detector.
///
/// # Purity
///
/// Detectors only read the observations they are given. All of their output
/// travels through the returned candidates.
pub trait Detector
where
    Self: Any + Debug + Downcast,
{
    /// Gets the human-readable name of the detector, used when reporting
    /// detector failures.
    fn name(&self) -> &'static str;

    /// Observes one instruction of the execution stream, returning any
    /// candidate findings the observation gives rise to.
    ///
    /// This is called both before and after every instruction executes; the
    /// detector distinguishes the two through [`Observation::phase`].
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the detector cannot process the observation. The
    /// error is recorded and isolated to this detector.
    fn observe(&self, observation: &Observation) -> Result<Vec<Candidate>>;

    /// Observes the completion of a thread of execution, returning any
    /// candidate findings that can only be judged once the path has
    /// terminated.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the detector cannot process the completed thread.
    /// The error is recorded and isolated to this detector.
    fn thread_complete(&self, state: &VMState) -> Result<Vec<Candidate>> {
        let _ = state;
        Ok(Vec::new())
    }
}

/// A container for a set of detectors that will be run in an **arbitrary
/// order**.
///
/// The registry is also where candidates are confirmed: each candidate's
/// constraint is checked against the path condition it was observed under,
/// and candidates the oracle refutes are discarded silently.
#[derive(Debug)]
pub struct Detectors {
    /// The detectors.
    detectors: HashSet<DetectorsItem>,
}

impl Detectors {
    /// Constructs a new, empty detector registry.
    #[must_use]
    pub fn new() -> Self {
        let detectors = HashSet::new();
        Self { detectors }
    }

    /// Adds the `detector` to the registry.
    ///
    /// If a detector of the given type is already registered, it will not be
    /// added again.
    pub fn add<D: Detector>(&mut self, detector: D) {
        self.detectors.insert(DetectorsItem::new(detector));
    }

    /// Gets the number of registered detectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    /// Checks if the registry contains no detectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Delivers `observation` to every registered detector, confirming the
    /// produced candidates against `oracle` and pushing the confirmed ones
    /// into `findings`.
    ///
    /// A detector that errors is isolated: its error is added to `errors` and
    /// the remaining detectors still run.
    pub fn observe(
        &self,
        observation: &Observation,
        oracle: &dyn Oracle,
        findings: &mut Vec<Finding>,
        errors: &mut Errors,
    ) {
        for detector in &self.detectors {
            match detector.observe(observation) {
                Ok(candidates) => {
                    confirm(candidates, observation.state, oracle, findings);
                }
                Err(detector_errors) => errors.add_many(Vec::from(detector_errors)),
            }
        }
    }

    /// Notifies every registered detector that a thread of execution has
    /// completed with `state`, confirming the produced candidates against
    /// `oracle` and pushing the confirmed ones into `findings`.
    ///
    /// A detector that errors is isolated: its error is added to `errors` and
    /// the remaining detectors still run.
    pub fn thread_complete(
        &self,
        state: &VMState,
        oracle: &dyn Oracle,
        findings: &mut Vec<Finding>,
        errors: &mut Errors,
    ) {
        for detector in &self.detectors {
            match detector.thread_complete(state) {
                Ok(candidates) => {
                    confirm(candidates, state, oracle, findings);
                }
                Err(detector_errors) => errors.add_many(Vec::from(detector_errors)),
            }
        }
    }
}

/// Confirms each candidate against the path condition of `state`, promoting
/// the survivors into `findings`.
///
/// An unconditional candidate is always promoted, as the path it was observed
/// on was itself reached under a condition the oracle did not refute. A
/// constrained candidate is promoted unless the oracle proves its constraint
/// cannot hold together with the path condition; an undecided oracle answer
/// confirms, keeping the analysis conservative.
fn confirm(
    candidates: Vec<Candidate>,
    state: &VMState,
    oracle: &dyn Oracle,
    findings: &mut Vec<Finding>,
) {
    for candidate in candidates {
        let confirmed = match &candidate.constraint {
            Some(constraint) => {
                let query = state.path_condition().conjoined_with(constraint.clone());
                oracle.check(&query).may_hold()
            }
            None => true,
        };

        if confirmed {
            findings.push(candidate.finding);
        } else {
            tracing::debug!(
                title = candidate.finding.title,
                instruction_pointer = candidate.finding.instruction_pointer,
                "Candidate finding refuted by the oracle"
            );
        }
    }
}

/// The default registry contains all of the built-in detectors.
impl Default for Detectors {
    fn default() -> Self {
        // Keep these sorted for easy visual grep
        let mut detectors = Self::new();
        detectors.add(CallCodeDetector);
        detectors.add(ExternalCallDetector);
        detectors.add(IntegerArithmeticDetector);
        detectors.add(UncheckedRetvalDetector);

        detectors
    }
}

/// An internal type to make it possible to base the detectors container
/// around a set.
#[derive(Debug, Derivative)]
#[derivative(Hash, Eq, PartialEq)]
struct DetectorsItem {
    /// A field used to hash the detector.
    pub hash_key: TypeId,

    /// The detector itself.
    #[derivative(PartialEq = "ignore", Hash = "ignore")]
    pub detector: Box<dyn Detector>,
}

impl DetectorsItem {
    /// Constructs a new detectors item.
    pub fn new<D: Detector>(detector: D) -> Self {
        let hash_key = TypeId::of::<D>();
        let detector = Box::new(detector);

        Self { hash_key, detector }
    }
}

/// Allow deref-coercions from the detectors item to the detector it contains
/// for ease of use internally.
impl Deref for DetectorsItem {
    type Target = Box<dyn Detector>;

    fn deref(&self) -> &Self::Target {
        &self.detector
    }
}

#[cfg(test)]
mod test {
    use crate::{
        detector::{Candidate, Detector, Detectors, Observation, Phase},
        error::{
            analysis::{Error, Errors, Result},
            container::Locatable,
        },
        opcode::{control, DynOpcode},
        report::{swc::SwcId, Description, Finding, Severity},
        solver::FoldingOracle,
        vm::{
            state::VMState,
            value::{known::KnownWord, Provenance, SymbolicValue},
        },
    };
    use std::rc::Rc;

    fn new_finding(title: &str) -> Finding {
        Finding::new(
            SwcId::Reentrancy,
            Severity::Medium,
            title,
            Description::new("head", "tail"),
            0,
            (0, 0),
        )
    }

    #[derive(Debug)]
    struct ConstantCandidates;

    impl Detector for ConstantCandidates {
        fn name(&self) -> &'static str {
            "constant candidates"
        }

        fn observe(&self, _observation: &Observation) -> Result<Vec<Candidate>> {
            let satisfiable = Candidate::constrained(
                new_finding("satisfiable"),
                SymbolicValue::new_known(0, KnownWord::one(), Provenance::Synthetic),
            );
            let refuted = Candidate::constrained(
                new_finding("refuted"),
                SymbolicValue::new_known(0, KnownWord::zero(), Provenance::Synthetic),
            );
            let unconditional = Candidate::unconditional(new_finding("unconditional"));

            Ok(vec![satisfiable, refuted, unconditional])
        }
    }

    #[derive(Debug)]
    struct AlwaysFails;

    impl Detector for AlwaysFails {
        fn name(&self) -> &'static str {
            "always fails"
        }

        fn observe(&self, observation: &Observation) -> Result<Vec<Candidate>> {
            Err(Error::DetectorFailed {
                detector: self.name().into(),
                reason:   "on purpose".into(),
            }
            .locate(observation.instruction_pointer)
            .into())
        }
    }

    #[test]
    fn refuted_candidates_are_discarded_silently() {
        let mut detectors = Detectors::new();
        detectors.add(ConstantCandidates);

        let state = VMState::new();
        let instruction: DynOpcode = Rc::new(control::JumpDest);
        let observation = Observation {
            phase: Phase::Before,
            instruction_pointer: 0,
            instruction: &instruction,
            state: &state,
        };

        let mut findings = Vec::new();
        let mut errors = Errors::new();
        detectors.observe(&observation, &FoldingOracle::default(), &mut findings, &mut errors);

        let mut titles: Vec<&str> = findings.iter().map(|f| f.title.as_str()).collect();
        titles.sort_unstable();
        assert_eq!(titles, vec!["satisfiable", "unconditional"]);
        assert!(errors.is_empty());
    }

    #[test]
    fn failing_detectors_are_isolated() {
        let mut detectors = Detectors::new();
        detectors.add(ConstantCandidates);
        detectors.add(AlwaysFails);

        let state = VMState::new();
        let instruction: DynOpcode = Rc::new(control::JumpDest);
        let observation = Observation {
            phase: Phase::Before,
            instruction_pointer: 0,
            instruction: &instruction,
            state: &state,
        };

        let mut findings = Vec::new();
        let mut errors = Errors::new();
        detectors.observe(&observation, &FoldingOracle::default(), &mut findings, &mut errors);

        // The failing detector contributed an error, not a crash, and the
        // other detector's findings are intact.
        assert_eq!(findings.len(), 2);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn duplicate_detector_types_register_once() {
        let mut detectors = Detectors::new();
        detectors.add(ConstantCandidates);
        detectors.add(ConstantCandidates);

        assert_eq!(detectors.len(), 1);
    }

    #[test]
    fn the_default_registry_contains_the_built_in_detectors() {
        assert_eq!(Detectors::default().len(), 4);
    }
}
