//! This module contains errors pertaining to the vulnerability detectors and
//! the report construction that runs over the results of symbolic execution.

use thiserror::Error;

use crate::error::container;

/// Errors that occur while the detector set observes execution in the
/// [`crate::vm::VM`], or while findings are aggregated into a report.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Detector `{detector}` failed while observing execution: {reason}")]
    DetectorFailed { detector: String, reason: String },

    #[error("Invalid tree {value} encountered during analysis: {reason}")]
    InvalidTree { value: String, reason: String },

    #[error("A candidate finding was produced with no triggering instruction")]
    MissingTriggerInstruction,

    #[error("The report could not be serialized: {reason}")]
    SerializationFailed { reason: String },
}

/// Make it possible to attach locations to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, instruction_pointer: u32) -> Self::Located {
        container::Located {
            location: instruction_pointer,
            payload:  self,
        }
    }
}

/// An analysis error with an associated location in the bytecode.
pub type LocatedError = container::Located<Error>;

/// A container of analysis errors used for aggregation of errors during the
/// detection process.
pub type Errors = container::Errors<LocatedError>;

/// The result type for methods that may have analysis errors.
pub type Result<T> = std::result::Result<T, Errors>;
