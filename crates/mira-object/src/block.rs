//! Block closures

use std::fmt;
use std::sync::Arc;

use crate::env::CallEnv;
use crate::error::{CallResult, RuntimeError};
use crate::frame::{Activation, FrameContext};
use crate::method::HostFn;
use crate::universe::Universe;
use crate::value::Value;

/// A block closure: a host body plus the frame context it was created in.
///
/// `arity` counts the block's declared parameters. When a block is invoked,
/// `args[0]` is the block value itself (mirroring method activations, where
/// `args[0]` is the receiver).
pub struct Block {
    context: Arc<FrameContext>,
    arity: usize,
    body: HostFn,
}

impl Block {
    /// Create a block capturing `context`
    pub fn new(context: Arc<FrameContext>, arity: usize, body: HostFn) -> Arc<Self> {
        Arc::new(Self {
            context,
            arity,
            body,
        })
    }

    /// Create a block from a closure
    pub fn from_fn<F>(context: Arc<FrameContext>, arity: usize, body: F) -> Arc<Self>
    where
        F: Fn(&Activation<'_>) -> CallResult + Send + Sync + 'static,
    {
        Self::new(context, arity, Arc::new(body))
    }

    /// The context the block was created in
    pub fn context(&self) -> &Arc<FrameContext> {
        &self.context
    }

    /// Declared parameter count
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Run the block body.
    ///
    /// Chains a block context onto the defining context and executes the
    /// body. Blocks own no marker; non-local returns unwind to the home
    /// method activation.
    pub fn invoke(&self, universe: &Universe, env: &CallEnv, args: &[Value]) -> CallResult {
        if args.len() != self.arity + 1 {
            return Err(RuntimeError::WrongArgumentCount {
                selector: "<block>".to_string(),
                expected: self.arity,
                got: args.len().saturating_sub(1),
            }
            .into());
        }
        let context = FrameContext::for_block(Arc::clone(&self.context));
        let activation = Activation::new(universe, env, context, args);
        (self.body)(&activation)
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block").field("arity", &self.arity).finish()
    }
}
