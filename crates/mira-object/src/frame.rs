//! Frame markers, lexical contexts, and activation views

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::env::CallEnv;
use crate::universe::Universe;
use crate::value::Value;

/// On-stack flag for one method activation.
///
/// Created when the activation is entered, flipped off on every exit path.
/// Identity (`Arc::ptr_eq`) is what ties a non-local return to its target
/// frame.
#[derive(Debug)]
pub struct StackMarker {
    on_stack: AtomicBool,
}

impl StackMarker {
    /// Fresh marker, initially on-stack
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            on_stack: AtomicBool::new(true),
        })
    }

    /// Whether the owning activation is still on the stack
    pub fn is_on_stack(&self) -> bool {
        self.on_stack.load(Ordering::Relaxed)
    }

    /// Flip the marker off-stack
    pub fn mark_off_stack(&self) {
        self.on_stack.store(false, Ordering::Relaxed);
    }
}

enum FrameKind {
    Method {
        receiver: Value,
        marker: Arc<StackMarker>,
    },
    Block {
        outer: Arc<FrameContext>,
    },
}

/// Lexical context chain captured by blocks.
///
/// A method activation owns a context holding its receiver and marker; a
/// block activation's context links to the context the block was created
/// in. `home` walks block links back to the owning method context.
pub struct FrameContext {
    kind: FrameKind,
}

impl FrameContext {
    /// Context for a method activation
    pub fn for_method(receiver: Value, marker: Arc<StackMarker>) -> Arc<Self> {
        Arc::new(Self {
            kind: FrameKind::Method { receiver, marker },
        })
    }

    /// Context for a block activation, linked to its defining context
    pub fn for_block(outer: Arc<FrameContext>) -> Arc<Self> {
        Arc::new(Self {
            kind: FrameKind::Block { outer },
        })
    }

    /// Whether this is a method context
    pub fn is_method_frame(&self) -> bool {
        matches!(self.kind, FrameKind::Method { .. })
    }

    /// Receiver, present on method contexts
    pub fn receiver(&self) -> Option<&Value> {
        match &self.kind {
            FrameKind::Method { receiver, .. } => Some(receiver),
            FrameKind::Block { .. } => None,
        }
    }

    /// Marker, present on method contexts
    pub fn marker(&self) -> Option<&Arc<StackMarker>> {
        match &self.kind {
            FrameKind::Method { marker, .. } => Some(marker),
            FrameKind::Block { .. } => None,
        }
    }

    /// Defining context, present on block contexts
    pub fn outer(&self) -> Option<&Arc<FrameContext>> {
        match &self.kind {
            FrameKind::Method { .. } => None,
            FrameKind::Block { outer } => Some(outer),
        }
    }

    /// Owning method context (self for method contexts)
    pub fn home(self: &Arc<Self>) -> Arc<FrameContext> {
        let mut current = Arc::clone(self);
        loop {
            let next = match &current.kind {
                FrameKind::Method { .. } => None,
                FrameKind::Block { outer } => Some(Arc::clone(outer)),
            };
            match next {
                Some(outer) => current = outer,
                None => return current,
            }
        }
    }

    /// Marker of the owning method context
    pub fn home_marker(self: &Arc<Self>) -> Arc<StackMarker> {
        let mut current = Arc::clone(self);
        loop {
            let next = match &current.kind {
                FrameKind::Method { marker, .. } => return Arc::clone(marker),
                FrameKind::Block { outer } => Arc::clone(outer),
            };
            current = next;
        }
    }

    /// Receiver of the owning method context
    pub fn home_receiver(self: &Arc<Self>) -> Value {
        let mut current = Arc::clone(self);
        loop {
            let next = match &current.kind {
                FrameKind::Method { receiver, .. } => return receiver.clone(),
                FrameKind::Block { outer } => Arc::clone(outer),
            };
            current = next;
        }
    }
}

impl std::fmt::Debug for FrameContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            FrameKind::Method { receiver, marker } => f
                .debug_struct("MethodFrame")
                .field("receiver", receiver)
                .field("on_stack", &marker.is_on_stack())
                .finish(),
            FrameKind::Block { .. } => write!(f, "BlockFrame"),
        }
    }
}

/// View over one running activation, handed to host bodies.
///
/// `args[0]` is the receiver; `arg(n)` addresses the arguments after it.
pub struct Activation<'a> {
    universe: &'a Universe,
    env: CallEnv,
    context: Arc<FrameContext>,
    args: &'a [Value],
}

impl<'a> Activation<'a> {
    /// Assemble an activation view
    pub fn new(
        universe: &'a Universe,
        env: &CallEnv,
        context: Arc<FrameContext>,
        args: &'a [Value],
    ) -> Self {
        debug_assert!(!args.is_empty(), "activation needs at least a receiver");
        Self {
            universe,
            env: env.clone(),
            context,
            args,
        }
    }

    /// The universe this activation runs in
    pub fn universe(&self) -> &'a Universe {
        self.universe
    }

    /// Call environment of this activation
    pub fn env(&self) -> &CallEnv {
        &self.env
    }

    /// Frame context of this activation
    pub fn context(&self) -> &Arc<FrameContext> {
        &self.context
    }

    /// The receiver (`args[0]`)
    pub fn receiver(&self) -> &Value {
        &self.args[0]
    }

    /// Full argument slice, receiver included at index 0
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    /// The `index`th argument after the receiver
    pub fn arg(&self, index: usize) -> &Value {
        &self.args[index + 1]
    }
}
