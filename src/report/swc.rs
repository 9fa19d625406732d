//! This module contains the subset of the Smart Contract Weakness
//! Classification catalog that the built-in detectors report against.

use std::{fmt::Display, str::FromStr};

use crate::error::analysis::Error;

/// An entry in the Smart Contract Weakness Classification catalog.
///
/// Each detector reports findings against exactly one catalog entry, and each
/// entry carries a fixed, human-readable catalog title.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SwcId {
    /// SWC-101, arithmetic that can wrap around the word width.
    IntegerOverflowAndUnderflow,

    /// SWC-104, the boolean result of a message call left unexamined.
    UncheckedCallReturnValue,

    /// SWC-107, an external call that can hand control to untrusted code.
    Reentrancy,

    /// SWC-111, use of an opcode that is deprecated on the target chain.
    DeprecatedFunctionsUsage,
}

impl SwcId {
    /// Gets the number of the catalog entry.
    #[must_use]
    pub fn number(&self) -> u32 {
        match self {
            Self::IntegerOverflowAndUnderflow => 101,
            Self::UncheckedCallReturnValue => 104,
            Self::Reentrancy => 107,
            Self::DeprecatedFunctionsUsage => 111,
        }
    }

    /// Gets the catalog title of the entry.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::IntegerOverflowAndUnderflow => "Integer Overflow and Underflow",
            Self::UncheckedCallReturnValue => "Unchecked Call Return Value",
            Self::Reentrancy => "Reentrancy",
            Self::DeprecatedFunctionsUsage => "Use of Deprecated Solidity Functions",
        }
    }
}

/// Displays the entry in the standard `SWC-NNN` form used by reports.
impl Display for SwcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SWC-{}", self.number())
    }
}

/// Parses the standard `SWC-NNN` form back into a catalog entry.
impl FromStr for SwcId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SWC-101" => Ok(Self::IntegerOverflowAndUnderflow),
            "SWC-104" => Ok(Self::UncheckedCallReturnValue),
            "SWC-107" => Ok(Self::Reentrancy),
            "SWC-111" => Ok(Self::DeprecatedFunctionsUsage),
            _ => Err(Error::SerializationFailed {
                reason: format!("`{s}` is not a known SWC identifier"),
            }),
        }
    }
}
