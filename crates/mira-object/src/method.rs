//! Methods and host bodies

use std::fmt;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;

use crate::class::Class;
use crate::error::CallResult;
use crate::frame::Activation;
use crate::symbol::Symbol;

/// Host function implementing a method or block body.
///
/// The body receives an activation view carrying the universe, the call
/// environment, the frame context, and the argument slice (receiver at
/// index 0).
pub type HostFn = Arc<dyn Fn(&Activation<'_>) -> CallResult + Send + Sync>;

/// An installed method.
///
/// Methods are identity objects: caches guard on `Arc::ptr_eq` of the
/// method reference. `arity` counts declared arguments, receiver excluded.
pub struct Method {
    selector: Symbol,
    arity: usize,
    holder: OnceCell<Weak<Class>>,
    body: HostFn,
}

impl Method {
    /// Create a method from a shared host body
    pub fn new(selector: Symbol, arity: usize, body: HostFn) -> Arc<Self> {
        Arc::new(Self {
            selector,
            arity,
            holder: OnceCell::new(),
            body,
        })
    }

    /// Create a method from a closure
    pub fn from_fn<F>(selector: Symbol, arity: usize, body: F) -> Arc<Self>
    where
        F: Fn(&Activation<'_>) -> CallResult + Send + Sync + 'static,
    {
        Self::new(selector, arity, Arc::new(body))
    }

    /// Selector this method answers to
    pub fn selector(&self) -> Symbol {
        self.selector
    }

    /// Declared argument count, receiver excluded
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Class the method was first installed in, if still alive
    pub fn holder(&self) -> Option<Arc<Class>> {
        self.holder.get().and_then(Weak::upgrade)
    }

    // First installation wins; installing the same method elsewhere keeps
    // the original holder.
    pub(crate) fn bind_holder(&self, class: &Arc<Class>) {
        let _ = self.holder.set(Arc::downgrade(class));
    }

    /// Run the body against a prepared activation.
    ///
    /// Marker bookkeeping and unwind filtering are the caller's concern.
    pub fn invoke_with(&self, activation: &Activation<'_>) -> CallResult {
        (self.body)(activation)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("selector", &self.selector)
            .field("arity", &self.arity)
            .finish()
    }
}
