//! This module contains the definition of the virtual machine's persistent
//! storage container.

use crate::vm::value::{BoxedVal, Provenance, SymbolicValue, SymbolicValueData};

/// A representation of the persistent storage of the symbolic virtual machine.
///
/// Where the storage on a real EVM implementation is effectively a
/// word-addressable word-array where every slot is initialized to 0, many
/// storage keys here are computed in the program (e.g. for mappings and
/// dynamic arrays), so the container has to work with arbitrary symbolic
/// values as keys. Keys are matched structurally, so the same constant slot
/// computed at two different sites addresses the same entry.
///
/// # Generational Storage
///
/// Each storage location stores the total history of writes made to it during
/// the course of a given thread of execution. You can call the
/// [`Self::generations`] method to get at these for a given key.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Storage {
    slots: Vec<(BoxedVal, Vec<BoxedVal>)>,
}

impl Storage {
    /// Creates a new, empty storage.
    #[must_use]
    pub fn new() -> Self {
        let slots = Vec::new();
        Self { slots }
    }

    /// Stores the provided `value` in storage at the provided `key`,
    /// recording it as the newest generation at that key.
    ///
    /// The `value` is treated as being a word wide.
    pub fn store(&mut self, key: BoxedVal, value: BoxedVal) {
        match self.slots.iter_mut().find(|(slot, _)| slot == &key) {
            Some((_, generations)) => generations.push(value),
            None => self.slots.push((key, vec![value])),
        }
    }

    /// Loads the value found at the provided `key`.
    ///
    /// This always returns the _most-recently written_ value, and does not
    /// account for the generations.
    ///
    /// If the slot has not been written to during the current execution, it
    /// returns a symbolic value representing the unknown prior contents of
    /// the slot.
    ///
    /// # Note
    ///
    /// This is a best-effort analysis as we cannot decide aliasing between
    /// distinct symbolic key expressions.
    pub fn load(&mut self, key: &BoxedVal) -> &BoxedVal {
        let position = self.slots.iter().position(|(slot, _)| slot == key);
        let index = match position {
            Some(index) => index,
            None => {
                // The instruction pointer is 0 here, as the unwritten value
                // was created when the program started. It is _not_ synthetic.
                let unwritten = SymbolicValue::new(
                    0,
                    SymbolicValueData::SLoad { key: key.clone() },
                    Provenance::Storage,
                );
                self.slots.push((key.clone(), vec![unwritten]));
                self.slots.len() - 1
            }
        };

        // Safe as we always guarantee that there is at least one item in the
        // generations vector.
        self.slots[index].1.last().expect("generations are never empty")
    }

    /// Gets all of the stores that were made at the provided `key` during the
    /// course of execution.
    ///
    /// Returns [`Some`] for keys that have seen at least one access, and
    /// otherwise returns [`None`].
    #[must_use]
    pub fn generations(&self, key: &BoxedVal) -> Option<Vec<&BoxedVal>> {
        self.slots
            .iter()
            .find(|(slot, _)| slot == key)
            .map(|(_, generations)| generations.iter().collect())
    }

    /// Gets the number of entries in the storage.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.slots.len()
    }

    /// Gets the slot keys for this storage that have been accessed.
    #[must_use]
    pub fn keys(&self) -> Vec<&BoxedVal> {
        self.slots.iter().map(|(slot, _)| slot).collect()
    }
}

#[cfg(test)]
mod test {
    use std::ops::Deref;

    use crate::vm::{
        state::storage::Storage,
        value::{known::KnownWord, BoxedVal, Provenance, SymbolicValue, SymbolicValueData},
    };

    /// Creates a new synthetic value for testing purposes.
    fn new_synthetic_value(instruction_pointer: u32) -> BoxedVal {
        SymbolicValue::new_value(instruction_pointer, Provenance::Synthetic)
    }

    #[test]
    fn can_store_word_to_storage() {
        let mut storage = Storage::new();
        let key = new_synthetic_value(0);
        let value = new_synthetic_value(1);
        storage.store(key.clone(), value.clone());

        assert_eq!(storage.entry_count(), 1);
        assert_eq!(storage.load(&key), &value);
    }

    #[test]
    fn can_overwrite_word_in_storage() {
        let mut storage = Storage::new();
        let key = new_synthetic_value(0);
        let value_1 = new_synthetic_value(1);
        let value_2 = new_synthetic_value(2);

        storage.store(key.clone(), value_1.clone());
        assert_eq!(storage.load(&key), &value_1);

        storage.store(key.clone(), value_2.clone());
        assert_eq!(storage.entry_count(), 1);
        assert_eq!(storage.load(&key), &value_2);
    }

    #[test]
    fn can_store_word_under_known_key() {
        let mut storage = Storage::new();
        let key = SymbolicValue::new_known(0, KnownWord::zero(), Provenance::Synthetic);
        let second_key = SymbolicValue::new_known(7, KnownWord::zero(), Provenance::Bytecode);
        let value = new_synthetic_value(1);

        storage.store(key, value.clone());
        assert_eq!(storage.entry_count(), 1);

        // The structurally equal key addresses the same slot.
        assert_eq!(storage.load(&second_key), &value);
    }

    #[test]
    fn unwritten_slots_read_as_symbolic_loads() {
        let mut storage = Storage::new();
        let key_1 = SymbolicValue::new_known(0, KnownWord::zero(), Provenance::Synthetic);

        match storage.load(&key_1).deref() {
            SymbolicValue {
                data: SymbolicValueData::SLoad { key },
                provenance,
                ..
            } => {
                assert_eq!(key, &key_1);
                assert_eq!(provenance, &Provenance::Storage);
            }
            _ => panic!("Unwritten slot did not read as a symbolic load"),
        }
    }

    #[test]
    fn can_query_generations() {
        let mut storage = Storage::new();
        let key = new_synthetic_value(0);
        let value_1 = new_synthetic_value(1);
        let value_2 = new_synthetic_value(2);

        storage.store(key.clone(), value_1.clone());
        storage.store(key.clone(), value_2.clone());

        let generations = storage.generations(&key).unwrap();
        assert_eq!(generations, vec![&value_1, &value_2]);
    }
}
