//! This module contains the representation of message-call contexts during
//! symbolic execution.

use uuid::Uuid;

use crate::{
    constant::MAXIMUM_CALL_STACK_DEPTH,
    error::execution::Error,
    vm::value::BoxedVal,
};

/// The flavour of a message call made by one of the call-family opcodes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallKind {
    /// A standard message call into the callee's context.
    Call,

    /// A message call that runs the callee's code in the caller's storage
    /// context.
    CallCode,

    /// A message call that runs the callee's code in the caller's storage
    /// context, additionally preserving the caller's own `msg.sender` and
    /// `msg.value`.
    DelegateCall,

    /// A message call that forbids any state modification in the callee.
    StaticCall,
}

impl CallKind {
    /// Gets the text name of the opcode that produces this kind of call.
    #[must_use]
    pub fn as_text_code(&self) -> &'static str {
        match self {
            Self::Call => "CALL",
            Self::CallCode => "CALLCODE",
            Self::DelegateCall => "DELEGATECALL",
            Self::StaticCall => "STATICCALL",
        }
    }
}

/// A single message-call context.
///
/// The execution context of a frame is not always the callee: `CALLCODE` and
/// `DELEGATECALL` run the callee's code against the _caller's_ storage and
/// address, and `DELEGATECALL` additionally preserves the caller's own
/// `msg.sender`. Both resolutions are computed when the frame is built, and
/// read back through [`Self::context_address`] and [`Self::context_caller`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallFrame {
    /// The kind of call that created this frame.
    kind: CallKind,

    /// The account whose code nominally executes in this frame.
    callee: BoxedVal,

    /// The value transferred with the call.
    value: BoxedVal,

    /// The input data passed to the call.
    input: BoxedVal,

    /// The address whose storage the frame's code executes against.
    context_address: BoxedVal,

    /// The `msg.sender` the frame's code observes.
    context_caller: BoxedVal,
}

impl CallFrame {
    /// Constructs the entry frame for an execution, where `caller` is the
    /// transaction sender and `callee` the contract under analysis.
    #[must_use]
    pub fn entry(caller: BoxedVal, callee: BoxedVal, value: BoxedVal, input: BoxedVal) -> Self {
        Self {
            kind: CallKind::Call,
            callee: callee.clone(),
            value,
            input,
            context_address: callee,
            context_caller: caller,
        }
    }

    /// Constructs a frame for a call of `kind` made from within `parent`.
    #[must_use]
    pub fn child_of(
        parent: &CallFrame,
        kind: CallKind,
        callee: BoxedVal,
        value: BoxedVal,
        input: BoxedVal,
    ) -> Self {
        let context_address = match kind {
            CallKind::Call | CallKind::StaticCall => callee.clone(),
            CallKind::CallCode | CallKind::DelegateCall => parent.context_address.clone(),
        };
        let context_caller = match kind {
            CallKind::DelegateCall => parent.context_caller.clone(),
            _ => parent.context_address.clone(),
        };

        Self {
            kind,
            callee,
            value,
            input,
            context_address,
            context_caller,
        }
    }

    /// Gets the kind of call that created this frame.
    #[must_use]
    pub fn kind(&self) -> CallKind {
        self.kind
    }

    /// Gets the account whose code nominally executes in this frame.
    #[must_use]
    pub fn callee(&self) -> &BoxedVal {
        &self.callee
    }

    /// Gets the value transferred with the call.
    #[must_use]
    pub fn value(&self) -> &BoxedVal {
        &self.value
    }

    /// Gets the input data passed to the call.
    #[must_use]
    pub fn input(&self) -> &BoxedVal {
        &self.input
    }

    /// Gets the address whose storage this frame's code executes against.
    ///
    /// For `CALLCODE` and `DELEGATECALL` frames this is the caller's context
    /// address, not the callee.
    #[must_use]
    pub fn context_address(&self) -> &BoxedVal {
        &self.context_address
    }

    /// Gets the `msg.sender` this frame's code observes.
    ///
    /// For `DELEGATECALL` frames this is the caller's own `msg.sender`,
    /// preserved across the call.
    #[must_use]
    pub fn context_caller(&self) -> &BoxedVal {
        &self.context_caller
    }
}

/// The stack of message-call contexts for a single thread of execution.
///
/// The entry frame is seeded when the state is created and is never popped,
/// so the stack is non-empty for the whole life of a thread.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallStack {
    frames: Vec<CallFrame>,
}

impl CallStack {
    /// Creates a new call stack with `entry` as its entry frame.
    #[must_use]
    pub fn new(entry: CallFrame) -> Self {
        let frames = vec![entry];
        Self { frames }
    }

    /// Pushes a new frame onto the call stack.
    ///
    /// # Errors
    ///
    /// If pushing would exceed [`MAXIMUM_CALL_STACK_DEPTH`].
    pub fn push(&mut self, frame: CallFrame) -> Result<(), Error> {
        if self.frames.len() + 1 > MAXIMUM_CALL_STACK_DEPTH {
            return Err(Error::CallStackDepthExceeded {
                limit: MAXIMUM_CALL_STACK_DEPTH,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pops the top frame from the call stack.
    ///
    /// # Errors
    ///
    /// If popping would remove the entry frame.
    pub fn pop(&mut self) -> Result<CallFrame, Error> {
        if self.frames.len() <= 1 {
            return Err(Error::NoSuchCallFrame);
        }
        self.frames.pop().ok_or(Error::NoSuchCallFrame)
    }

    /// Gets the currently-executing frame.
    #[must_use]
    pub fn current(&self) -> &CallFrame {
        // Safe as the entry frame can never be popped.
        self.frames.last().expect("call stack is never empty")
    }

    /// Gets the depth of the call stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// A record of a call-family instruction that was executed on a thread, kept
/// for return-value tracking.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallRecord {
    /// The instruction pointer of the call instruction.
    pub instruction_pointer: u32,

    /// The kind of the call.
    pub kind: CallKind,

    /// The callee operand of the call.
    pub callee: BoxedVal,

    /// The boolean success value the call pushed onto the stack.
    pub result: BoxedVal,

    /// The identity of the success value, used to recognise it inside branch
    /// conditions.
    pub result_id: Uuid,

    /// Whether the success value has been consumed by a conditional branch on
    /// this thread.
    pub checked: bool,
}

#[cfg(test)]
mod test {
    use crate::vm::{
        state::call_frame::{CallFrame, CallKind, CallStack},
        value::{BoxedVal, Provenance, SymbolicValue, SymbolicValueData},
    };

    fn new_env_value(data: SymbolicValueData) -> BoxedVal {
        SymbolicValue::new(0, data, Provenance::Environment)
    }

    fn entry_frame() -> CallFrame {
        CallFrame::entry(
            new_env_value(SymbolicValueData::Caller),
            new_env_value(SymbolicValueData::Address),
            new_env_value(SymbolicValueData::CallValue),
            SymbolicValue::new_value(0, Provenance::MessageData),
        )
    }

    #[test]
    fn plain_calls_execute_in_the_callee_context() {
        let entry = entry_frame();
        let callee = SymbolicValue::new_value(10, Provenance::MessageData);
        let frame = CallFrame::child_of(
            &entry,
            CallKind::Call,
            callee.clone(),
            SymbolicValue::new_value(10, Provenance::Synthetic),
            SymbolicValue::new_value(10, Provenance::Synthetic),
        );

        assert_eq!(frame.context_address(), &callee);
        assert_eq!(frame.context_caller(), entry.context_address());
    }

    #[test]
    fn callcode_keeps_the_caller_storage_context() {
        let entry = entry_frame();
        let callee = SymbolicValue::new_value(10, Provenance::MessageData);
        let frame = CallFrame::child_of(
            &entry,
            CallKind::CallCode,
            callee,
            SymbolicValue::new_value(10, Provenance::Synthetic),
            SymbolicValue::new_value(10, Provenance::Synthetic),
        );

        assert_eq!(frame.context_address(), entry.context_address());
        assert_eq!(frame.context_caller(), entry.context_address());
    }

    #[test]
    fn delegatecall_preserves_the_caller_sender() {
        let entry = entry_frame();
        let callee = SymbolicValue::new_value(10, Provenance::MessageData);
        let frame = CallFrame::child_of(
            &entry,
            CallKind::DelegateCall,
            callee,
            SymbolicValue::new_value(10, Provenance::Synthetic),
            SymbolicValue::new_value(10, Provenance::Synthetic),
        );

        assert_eq!(frame.context_address(), entry.context_address());
        assert_eq!(frame.context_caller(), entry.context_caller());
    }

    #[test]
    fn the_entry_frame_cannot_be_popped() {
        let mut stack = CallStack::new(entry_frame());
        assert_eq!(stack.depth(), 1);
        stack.pop().expect_err("Popped the entry frame");
    }
}
