//! This module contains types useful for dealing with concrete contracts that
//! you want to analyze.

use std::{fs::File, io::Read};

use anyhow::anyhow;

use crate::constant::UNKNOWN_CONTRACT_NAME;

/// A representation of a contract that is passed to the library.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Contract {
    bytecode: Vec<u8>,
    name:     String,
}

impl Contract {
    /// Creates a new contract from the provided `bytecode`.
    ///
    /// This must be the deployed (runtime) bytecode for the contract, not the
    /// creation bytecode.
    #[must_use]
    pub fn new(bytecode: Vec<u8>) -> Self {
        let name = UNKNOWN_CONTRACT_NAME.into();
        Self { bytecode, name }
    }

    /// Creates a new contract from the provided hexadecimal `string`, with or
    /// without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `string` is not valid hexadecimal.
    pub fn new_from_hex(string: impl AsRef<str>) -> anyhow::Result<Self> {
        let string = string.as_ref();
        let stripped = string.strip_prefix("0x").unwrap_or(string);
        let bytecode = hex::decode(stripped).map_err(|_| anyhow!("Could not decode hex"))?;

        Ok(Self::new(bytecode))
    }

    /// Creates a new contract from the file at the provided `path`.
    ///
    /// The file at `path` must contain the hexadecimal encoding of the
    /// contract's deployed bytecode, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the file cannot be read, or if its contents are not
    /// valid hexadecimal.
    pub fn new_from_file(path: impl Into<String>) -> anyhow::Result<Self> {
        let path = path.into();
        let mut file = File::open(path).map_err(|_| anyhow!("File not available"))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|_| anyhow!("File could not be read"))?;

        Self::new_from_hex(contents.trim())
    }

    /// Sets the name of the contract to `name`.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Gets a reference to the bytecode of the contract.
    #[must_use]
    pub fn bytecode(&self) -> &Vec<u8> {
        &self.bytecode
    }

    /// Gets the name of the contract.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod test {
    use crate::{constant::UNKNOWN_CONTRACT_NAME, contract::Contract};

    #[test]
    fn decodes_hex_with_and_without_the_prefix() -> anyhow::Result<()> {
        let prefixed = Contract::new_from_hex("0x60016002")?;
        let bare = Contract::new_from_hex("60016002")?;

        assert_eq!(prefixed.bytecode(), &vec![0x60, 0x01, 0x60, 0x02]);
        assert_eq!(prefixed, bare);

        Ok(())
    }

    #[test]
    fn rejects_invalid_hex() {
        assert!(Contract::new_from_hex("0xzz").is_err());
    }

    #[test]
    fn carries_a_name_when_given_one() {
        let contract = Contract::new(vec![0x00]);
        assert_eq!(contract.name(), UNKNOWN_CONTRACT_NAME);

        let named = contract.with_name("Token");
        assert_eq!(named.name(), "Token");
    }
}
