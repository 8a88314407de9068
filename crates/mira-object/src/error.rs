//! Runtime faults and the unwind signal

use std::sync::Arc;

use crate::frame::StackMarker;
use crate::value::Value;

/// Runtime faults surfaced to the embedder
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// Message lookup failed and no `doesNotUnderstand:arguments:` is defined
    #[error("{class_name} does not understand #{selector}")]
    MessageNotUnderstood {
        /// Receiver's class name
        class_name: String,
        /// Selector of the failed send
        selector: String,
    },

    /// Activation handler returned an argument array of the wrong length
    #[error("activation handler returned {got} argument slots for #{selector}, which expects {expected}")]
    ReifiedArityMismatch {
        /// Selector of the method being activated
        selector: String,
        /// Expected slot count, receiver included
        expected: usize,
        /// Slots actually returned
        got: usize,
    },

    /// Interception handler returned a value of the wrong kind
    #[error("{operation} handler returned a {got}")]
    InvalidMetaResult {
        /// Intercepted operation label
        operation: &'static str,
        /// Kind of the offending value
        got: &'static str,
    },

    /// Field index outside the instance's slot range
    #[error("field index {index} out of bounds ({count} fields)")]
    FieldIndexOutOfBounds {
        /// Requested slot index
        index: usize,
        /// Number of slots
        count: usize,
    },

    /// Array index outside the element range
    #[error("array index {index} out of bounds (length {len})")]
    IndexOutOfBounds {
        /// Requested element index
        index: usize,
        /// Array length
        len: usize,
    },

    /// Field access on a value without indexed fields
    #[error("receiver of kind {got} has no indexed fields")]
    NotAnInstance {
        /// Kind of the receiver
        got: &'static str,
    },

    /// Call arrived with the wrong number of arguments
    #[error("#{selector} called with {got} arguments, expected {expected}")]
    WrongArgumentCount {
        /// Selector of the callee
        selector: String,
        /// Declared argument count, receiver excluded
        expected: usize,
        /// Arguments actually passed, receiver excluded
        got: usize,
    },

    /// Receiver or argument of an unexpected kind
    #[error("type error: {0}")]
    TypeError(String),
}

/// A non-local return in flight.
///
/// Carries the returned value and the marker of the method activation it
/// targets; only that activation turns it back into an ordinary result.
#[derive(Debug, Clone)]
pub struct NonLocalReturn {
    /// Value being returned
    pub value: Value,
    /// Marker identifying the target method activation
    pub marker: Arc<StackMarker>,
}

/// Unwind signal propagated through every call boundary.
///
/// Faults and non-local returns ride the same channel so host bodies can
/// forward both with `?`; only the activation controller tells them apart.
#[derive(Debug, Clone)]
pub enum Unwind {
    /// A runtime fault
    Error(RuntimeError),
    /// A non-local return travelling to its home activation
    Return(NonLocalReturn),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Error(error)
    }
}

/// Result of every call in the dispatch core
pub type CallResult = Result<Value, Unwind>;
