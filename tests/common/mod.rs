//! This module contains common utilities for simplifying the writing of
//! integration tests for this library.

#![cfg(test)]

use anyhow::anyhow;
use evm_sentinel as sentinel;
use evm_sentinel::{
    analyzer::InitialAnalyzer,
    contract::Contract,
    solver::{DynOracle, FoldingOracle},
    vm,
    watchdog::DynWatchdog,
};

/// Constructs a new analyzer for the provided contract `bytes`, with the
/// default configuration and the folding oracle.
#[allow(unused)] // It is actually
pub fn new_analyzer_from_bytes(
    bytes: impl Into<Vec<u8>>,
    watchdog: DynWatchdog,
) -> InitialAnalyzer {
    new_analyzer_with_config(bytes, vm::Config::default(), FoldingOracle::in_rc(), watchdog)
}

/// Constructs a new analyzer for the provided contract `bytes`, with full
/// control over the configuration and the oracle.
#[allow(unused)] // It is actually
pub fn new_analyzer_with_config(
    bytes: impl Into<Vec<u8>>,
    vm_config: vm::Config,
    oracle: DynOracle,
    watchdog: DynWatchdog,
) -> InitialAnalyzer {
    let contract = Contract::new(bytes.into());
    sentinel::new(contract, vm_config, oracle, watchdog)
}

/// Constructs a new analyzer to analyze the hex-encoded (with or without the
/// `0x` prefix) contract bytecode provided in `code`.
///
/// It uses the default configurations for the analyzer.
#[allow(unused)] // It is actually
pub fn new_analyzer_from_bytecode(
    code: impl Into<String>,
    watchdog: DynWatchdog,
) -> anyhow::Result<InitialAnalyzer> {
    let bytecode = get_bytecode_from_string(code)?;
    Ok(new_analyzer_from_bytes(bytecode, watchdog))
}

/// Gets the contract bytecode from the provided hex-encoded string `code`.
///
/// This hex-encoded string may or may not start with the `0x` prefix. Both
/// cases will be handled.
#[allow(unused)] // It is actually
pub fn get_bytecode_from_string(code: impl Into<String>) -> anyhow::Result<Vec<u8>> {
    let bytecode_string = code.into();
    // Remove the 0x if it is present
    let no_0x_prefix = match bytecode_string.strip_prefix("0x") {
        Some(no_0x_prefix) => no_0x_prefix,
        None => &bytecode_string,
    };

    let bytecode = hex::decode(no_0x_prefix).map_err(|_| anyhow!("Could not decode hex"))?;
    Ok(bytecode)
}
