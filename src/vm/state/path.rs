//! This module contains the representation of the path condition accumulated
//! along a single thread of execution.

use crate::vm::value::BoxedVal;

/// The conjunction of boolean symbolic values that must all hold for
/// execution to have reached the current program point on a given thread.
///
/// The condition only ever grows as a thread executes. Forked threads clone
/// it, sharing the constraint trees themselves.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PathCondition {
    constraints: Vec<BoxedVal>,
}

impl PathCondition {
    /// Creates a new, empty path condition, which holds trivially.
    #[must_use]
    pub fn new() -> Self {
        let constraints = Vec::new();
        Self { constraints }
    }

    /// Conjoins `constraint` onto the path condition.
    pub fn push(&mut self, constraint: BoxedVal) {
        self.constraints.push(constraint);
    }

    /// Gets the constraints making up the conjunction.
    #[must_use]
    pub fn constraints(&self) -> &[BoxedVal] {
        self.constraints.as_slice()
    }

    /// Gets the constraints together with `extra` conjoined on, in the shape
    /// expected by an oracle query.
    #[must_use]
    pub fn conjoined_with(&self, extra: BoxedVal) -> Vec<BoxedVal> {
        let mut query = self.constraints.clone();
        query.push(extra);
        query
    }

    /// Gets the number of constraints in the conjunction.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Checks if the path condition is trivial.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

#[cfg(test)]
mod test {
    use crate::vm::{
        state::path::PathCondition,
        value::{Provenance, SymbolicValue},
    };

    #[test]
    fn starts_trivial_and_grows() {
        let mut condition = PathCondition::new();
        assert!(condition.is_empty());

        let constraint = SymbolicValue::new_value(0, Provenance::Execution);
        condition.push(constraint.clone());

        assert_eq!(condition.len(), 1);
        assert_eq!(condition.constraints(), &[constraint]);
    }

    #[test]
    fn conjoining_does_not_mutate() {
        let mut condition = PathCondition::new();
        condition.push(SymbolicValue::new_value(0, Provenance::Execution));

        let extra = SymbolicValue::new_value(1, Provenance::Execution);
        let query = condition.conjoined_with(extra);

        assert_eq!(query.len(), 2);
        assert_eq!(condition.len(), 1);
    }
}
