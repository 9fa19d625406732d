//! This module contains the implementation of the symbolic virtual machine's
//! stack.

use crate::{
    constant::MAXIMUM_STACK_DEPTH,
    error::{
        container::Locatable,
        execution::{Error, Result as ExecutionResult},
    },
    vm::value::BoxedVal,
};

/// The representation of the symbolic virtual machine's stack.
///
/// # Indexing
///
/// Indexing into this stack is zero-based, where frame 0 is the top stack
/// frame.
///
/// # Depth
///
/// In a true EVM, it is a depth [`MAXIMUM_STACK_DEPTH`] stack, where each item
/// is word (256-bit) sized. Here, the symbolic virtual machine maintains the
/// same maximum depth, but instead stores [`crate::vm::value::SymbolicValue`]s
/// instead of words.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Stack {
    data: Vec<BoxedVal>,
}

impl Stack {
    /// Creates a new stack without any items on it.
    #[must_use]
    pub fn new() -> Self {
        let data = Vec::with_capacity(MAXIMUM_STACK_DEPTH);
        Self { data }
    }

    /// Pushes the provided value onto the top of the stack.
    ///
    /// # Errors
    ///
    /// If the stack cannot grow to accommodate the requested `data`.
    pub fn push(&mut self, data: BoxedVal) -> Result<(), Error> {
        if self.data.len() + 1 > MAXIMUM_STACK_DEPTH {
            return Err(Error::StackDepthExceeded {
                requested: self.data.len() + 1,
            });
        }
        self.data.push(data);
        Ok(())
    }

    /// Pops the top value from the stack.
    ///
    /// # Errors
    ///
    /// If the stack has no item to pop.
    pub fn pop(&mut self) -> Result<BoxedVal, Error> {
        self.data.pop().ok_or(Error::NoSuchStackFrame { depth: 0 })
    }

    /// Reads from the stack frame at the provided `depth`.
    ///
    /// # Errors
    ///
    /// If `depth` does not exist in the stack.
    pub fn read(&self, depth: u16) -> Result<&BoxedVal, Error> {
        self.check_frame_at(depth)?;

        // This is a safe unsigned subtraction as `check_frame_at` will have
        // returned an error if `depth` exceeds the current size.
        let index = self.top_frame_index()? - depth as usize;

        Ok(&self.data[index])
    }

    /// Duplicates the stack item at `frame` onto the top of the stack.
    ///
    /// This is a more general case of the `DUP` opcodes as it can duplicate
    /// any available stack frame.
    ///
    /// # Errors
    ///
    /// If `frame` doesn't exist.
    pub fn dup(&mut self, frame: u16) -> Result<(), Error> {
        self.check_frame_at(frame)?;
        let index = self.top_frame_index()? - frame as usize;
        let value = self.data[index].clone();

        self.push(value)
    }

    /// Swaps the top stack item with the item in `frame`.
    ///
    /// Note that this is a more general case of the `SWAP` opcodes as it can
    /// swap any two stack frames. It also swaps with the indicated frame
    /// directly, rather than the `n+1`th frame as for the `SWAP` opcodes.
    ///
    /// # Errors
    ///
    /// If either the source or target stack frame do not exist.
    pub fn swap(&mut self, frame: u16) -> Result<(), Error> {
        self.check_frame_at(0)?;
        self.check_frame_at(frame)?;
        let top_index = self.top_frame_index()?;
        let frame_index = top_index - frame as usize;

        self.data.swap(top_index, frame_index);

        Ok(())
    }

    /// Gets the current size of the stack.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Checks if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Checks if a frame exists at the provided `depth`.
    ///
    /// # Errors
    ///
    /// If there is no such stack frame.
    pub fn check_frame_at(&self, depth: u16) -> Result<(), Error> {
        let current_depth = self.data.len();

        if depth as usize >= current_depth {
            return Err(Error::NoSuchStackFrame {
                depth: i64::from(depth),
            });
        }

        Ok(())
    }

    /// Gets the index of the top frame.
    ///
    /// # Errors
    ///
    /// If there are no frames on the stack.
    fn top_frame_index(&self) -> Result<usize, Error> {
        if self.data.is_empty() {
            return Err(Error::NoSuchStackFrame { depth: -1 });
        }

        Ok(self.data.len() - 1)
    }

    /// Creates a handle onto this stack that automatically attaches the
    /// provided `instruction_pointer` as the location of any errors.
    pub fn new_located(&mut self, instruction_pointer: u32) -> LocatedStackHandle<'_> {
        LocatedStackHandle {
            stack: self,
            instruction_pointer,
        }
    }
}

/// A handle onto a [`Stack`] that attaches a fixed instruction pointer to any
/// errors raised by the stack operations, saving the opcode implementations
/// from having to locate every error by hand.
#[derive(Debug)]
pub struct LocatedStackHandle<'a> {
    stack: &'a mut Stack,
    instruction_pointer: u32,
}

impl LocatedStackHandle<'_> {
    /// Pushes the provided value onto the top of the stack.
    ///
    /// # Errors
    ///
    /// If the stack cannot grow to accommodate the requested `data`.
    pub fn push(&mut self, data: BoxedVal) -> ExecutionResult<()> {
        self.stack.push(data).locate(self.instruction_pointer)
    }

    /// Pops the top value from the stack.
    ///
    /// # Errors
    ///
    /// If the stack has no item to pop.
    pub fn pop(&mut self) -> ExecutionResult<BoxedVal> {
        self.stack.pop().locate(self.instruction_pointer)
    }

    /// Reads from the stack frame at the provided `depth`.
    ///
    /// # Errors
    ///
    /// If `depth` does not exist in the stack.
    pub fn read(&self, depth: u16) -> ExecutionResult<&BoxedVal> {
        self.stack.read(depth).locate(self.instruction_pointer)
    }

    /// Duplicates the stack item at `frame` onto the top of the stack.
    ///
    /// # Errors
    ///
    /// If `frame` doesn't exist.
    pub fn dup(&mut self, frame: u16) -> ExecutionResult<()> {
        self.stack.dup(frame).locate(self.instruction_pointer)
    }

    /// Swaps the top stack item with the item in `frame`.
    ///
    /// # Errors
    ///
    /// If either the source or target stack frame do not exist.
    pub fn swap(&mut self, frame: u16) -> ExecutionResult<()> {
        self.stack.swap(frame).locate(self.instruction_pointer)
    }

    /// Gets the current size of the stack.
    #[must_use]
    pub fn size(&self) -> usize {
        self.stack.size()
    }
}

#[cfg(test)]
mod test {
    use crate::{
        constant::MAXIMUM_STACK_DEPTH,
        vm::{
            state::stack::Stack,
            value::{BoxedVal, Provenance, SymbolicValue},
        },
    };

    /// Creates a new synthetic value for testing purposes.
    fn new_synthetic_value(instruction_pointer: u32) -> BoxedVal {
        SymbolicValue::new_value(instruction_pointer, Provenance::Synthetic)
    }

    /// Constructs a new stack with `item_count` unknown items pushed onto it.
    fn new_stack_with_items(item_count: usize) -> Stack {
        let mut stack = Stack::new();
        for i in 0..item_count {
            stack.push(new_synthetic_value(i as u32)).unwrap();
        }

        stack
    }

    #[test]
    fn can_construct_new_stack() {
        let stack = Stack::new();
        assert_eq!(stack.size(), 0);
    }

    #[test]
    fn cannot_push_outside_of_capacity() {
        let mut stack = new_stack_with_items(MAXIMUM_STACK_DEPTH);
        stack
            .push(new_synthetic_value(0))
            .expect_err("Pushing onto a full stack did not error");
    }

    #[test]
    fn can_pop_item() {
        let mut stack = new_stack_with_items(1);
        stack.pop().expect("Unable to pop item that exists");
    }

    #[test]
    fn cannot_pop_item_when_empty() {
        let mut stack = Stack::default();
        stack.pop().expect_err("Did not error when popping empty stack");
    }

    #[test]
    fn can_read_item_at_depth() {
        let stack = new_stack_with_items(10);
        stack.read(7).expect("Did not read an item at depth 7");
    }

    #[test]
    fn cannot_read_item_at_invalid_depth() {
        let stack = new_stack_with_items(10);
        stack
            .read(11)
            .expect_err("Read an item at a depth that doesn't exist");
    }

    #[test]
    fn can_dup_existing_item() {
        let mut stack = new_stack_with_items(10);
        assert_eq!(stack.size(), 10);
        stack.dup(3).unwrap();
        assert_eq!(stack.size(), 11);
    }

    #[test]
    fn cannot_dup_nonexistent_item() {
        let mut stack = new_stack_with_items(10);
        stack.dup(10).expect_err("Duplicated a nonexistent stack item");
    }

    #[test]
    fn can_swap_with_valid_item() {
        let first = new_synthetic_value(0);
        let second = new_synthetic_value(1);
        let mut stack = Stack::new();
        stack.push(first.clone()).unwrap();
        stack.push(second.clone()).unwrap();

        stack.swap(1).expect("Unable to swap valid stack frames");

        assert_eq!(stack.read(0).unwrap(), &first);
        assert_eq!(stack.read(1).unwrap(), &second);
    }

    #[test]
    fn cannot_swap_with_invalid_item() {
        let mut stack = new_stack_with_items(100);
        stack.swap(100).expect_err("Swapped with an invalid stack item");
    }

    #[test]
    fn can_get_size_for_stack() {
        let empty = Stack::default();
        assert_eq!(empty.size(), 0);
        assert!(empty.is_empty());

        let non_empty = new_stack_with_items(100);
        assert_eq!(non_empty.size(), 100);
        assert!(!non_empty.is_empty());
    }
}
