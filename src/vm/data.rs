//! This module contains miscellaneous small data-types that are used throughout
//! the virtual machine.

use std::collections::HashMap;

/// A container that tracks how many times execution has forked at a
/// conditional jump to each jump target.
///
/// The limit is enforced globally rather than per-thread, as it exists to
/// prevent exponential blowup of the thread queue when symbolically executing
/// looping bytecode.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JumpTargets {
    forks_per_target: usize,
    data: HashMap<u32, usize>,
}

impl JumpTargets {
    /// Constructs a new jump target tracker that allows at most
    /// `forks_per_target` forks to each conditional jump target.
    #[must_use]
    pub fn new(forks_per_target: usize) -> Self {
        let data = HashMap::default();
        Self {
            forks_per_target,
            data,
        }
    }

    /// Checks if the conditional jump target at `target` has reached the fork
    /// limit.
    #[must_use]
    pub fn at_fork_limit(&self, target: u32) -> bool {
        self.data.get(&target).unwrap_or(&0) >= &self.forks_per_target
    }

    /// Records a fork to the conditional jump target at `target`.
    pub fn mark_forked(&mut self, target: u32) {
        self.data
            .entry(target)
            .and_modify(|count| *count = count.saturating_add(1))
            .or_insert(1);
    }

    /// Gets the number of times execution has forked to the conditional jump
    /// target at `target`.
    #[must_use]
    pub fn fork_count(&self, target: u32) -> usize {
        self.data.get(&target).copied().unwrap_or(0)
    }
}
