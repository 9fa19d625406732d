//! This module contains the definition of the virtual machine's transient
//! memory container.

use crate::vm::value::{known::KnownWord, BoxedVal, Provenance, SymbolicValue};

/// A representation of the transient memory of the symbolic virtual machine.
///
/// Where memory on a real EVM implementation is a byte-addressable array that
/// grows on demand, the symbolic machine instead stores whole
/// [`SymbolicValue`]s against the (potentially symbolic) offsets they were
/// written at.
///
/// Offsets are matched structurally, so a constant offset computed in two
/// different places still addresses the same cell. Aliasing between distinct
/// symbolic offset expressions cannot be decided here, making this a
/// best-effort model.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Memory {
    cells: Vec<(BoxedVal, BoxedVal)>,
}

impl Memory {
    /// Constructs a new, empty memory.
    #[must_use]
    pub fn new() -> Self {
        let cells = Vec::new();
        Self { cells }
    }

    /// Stores the provided `value` at the provided `offset`, overwriting any
    /// existing value at that offset.
    ///
    /// The `value` is treated as being a word wide.
    pub fn store(&mut self, offset: BoxedVal, value: BoxedVal) {
        match self.cells.iter_mut().find(|(key, _)| key == &offset) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((offset, value)),
        }
    }

    /// Loads the value found at the provided `offset`.
    ///
    /// Memory on the EVM is zero-initialized, so an offset that has not been
    /// written during the current execution reads as a known zero.
    #[must_use]
    pub fn load(&mut self, offset: &BoxedVal) -> &BoxedVal {
        let position = self.cells.iter().position(|(key, _)| key == offset);
        let index = match position {
            Some(index) => index,
            None => {
                // The instruction pointer is 0 here, as the zero value existed
                // when the program started.
                let zero = SymbolicValue::new_known(0, KnownWord::zero(), Provenance::Execution);
                self.cells.push((offset.clone(), zero));
                self.cells.len() - 1
            }
        };

        &self.cells[index].1
    }

    /// Gets the number of cells that have been written to or read from.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.cells.len()
    }

    /// Checks if the memory has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod test {
    use crate::vm::{
        state::memory::Memory,
        value::{known::KnownWord, BoxedVal, Provenance, SymbolicValue},
    };

    /// Creates a new synthetic value for testing purposes.
    fn new_synthetic_value(instruction_pointer: u32) -> BoxedVal {
        SymbolicValue::new_value(instruction_pointer, Provenance::Synthetic)
    }

    #[test]
    fn can_store_and_load_at_symbolic_offset() {
        let mut memory = Memory::new();
        let offset = new_synthetic_value(0);
        let value = new_synthetic_value(1);

        memory.store(offset.clone(), value.clone());

        assert_eq!(memory.entry_count(), 1);
        assert_eq!(memory.load(&offset), &value);
    }

    #[test]
    fn stores_overwrite_previous_values() {
        let mut memory = Memory::new();
        let offset = new_synthetic_value(0);
        let first = new_synthetic_value(1);
        let second = new_synthetic_value(2);

        memory.store(offset.clone(), first);
        memory.store(offset.clone(), second.clone());

        assert_eq!(memory.entry_count(), 1);
        assert_eq!(memory.load(&offset), &second);
    }

    #[test]
    fn structurally_equal_offsets_address_the_same_cell() {
        let mut memory = Memory::new();
        let offset_a = SymbolicValue::new_known(0, KnownWord::new(0x40u32), Provenance::Bytecode);
        let offset_b = SymbolicValue::new_known(9, KnownWord::new(0x40u32), Provenance::Bytecode);
        let value = new_synthetic_value(1);

        memory.store(offset_a, value.clone());

        assert_eq!(memory.load(&offset_b), &value);
        assert_eq!(memory.entry_count(), 1);
    }

    #[test]
    fn unwritten_offsets_read_as_zero() {
        let mut memory = Memory::new();
        let offset = new_synthetic_value(0);

        let loaded = memory.load(&offset).clone();
        assert_eq!(loaded.known_value(), Some(KnownWord::zero()));

        // The read is stable across repeated loads.
        assert_eq!(memory.load(&offset), &loaded);
        assert_eq!(memory.entry_count(), 1);
    }
}
