//! Meta-objects: interception handlers per operation kind

use std::sync::Arc;

use crate::method::Method;

/// Operation kinds a meta-object can intercept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaOperation {
    /// Reading an instance field slot
    FieldRead,
    /// Writing an instance field slot
    FieldWrite,
    /// Deciding which method a message send activates
    MessageLookup,
    /// Activating a method chosen by a reflective lookup
    Activation,
}

impl MetaOperation {
    /// Stable label for diagnostics
    pub fn label(self) -> &'static str {
        match self {
            MetaOperation::FieldRead => "fieldRead",
            MetaOperation::FieldWrite => "fieldWrite",
            MetaOperation::MessageLookup => "messageLookup",
            MetaOperation::Activation => "activation",
        }
    }
}

/// A meta-object: at most one handler method per intercepted operation.
///
/// Handlers are ordinary methods; the dispatch core runs them at the meta
/// execution level. An operation without a handler keeps its base behavior.
#[derive(Debug, Default)]
pub struct MetaObject {
    read_field: Option<Arc<Method>>,
    write_field: Option<Arc<Method>>,
    message_lookup: Option<Arc<Method>>,
    activation: Option<Arc<Method>>,
}

impl MetaObject {
    /// Meta-object with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a handler for `op`, consuming and returning the meta-object
    pub fn with_handler(mut self, op: MetaOperation, handler: Arc<Method>) -> Self {
        let slot = match op {
            MetaOperation::FieldRead => &mut self.read_field,
            MetaOperation::FieldWrite => &mut self.write_field,
            MetaOperation::MessageLookup => &mut self.message_lookup,
            MetaOperation::Activation => &mut self.activation,
        };
        *slot = Some(handler);
        self
    }

    /// Handler for `op`, if attached
    pub fn handler(&self, op: MetaOperation) -> Option<&Arc<Method>> {
        match op {
            MetaOperation::FieldRead => self.read_field.as_ref(),
            MetaOperation::FieldWrite => self.write_field.as_ref(),
            MetaOperation::MessageLookup => self.message_lookup.as_ref(),
            MetaOperation::Activation => self.activation.as_ref(),
        }
    }
}
