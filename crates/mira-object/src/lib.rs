//! Mira object model
//!
//! This crate provides the runtime object model consumed by the dispatch
//! core:
//! - Values and interned selectors
//! - Classes, methods, and instances
//! - Meta-objects (interception handlers per operation kind)
//! - Blocks, frame contexts, and on-stack markers
//! - The unwind signal (runtime faults and non-local returns)
//! - The `Universe` tying interner, core classes, and options together
//!
//! Dispatch policy (inline caches, interception gates, the non-local return
//! controller) lives in `mira-dispatch`; this crate only defines the shapes
//! those mechanisms operate on.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod block;
pub mod class;
pub mod env;
pub mod error;
pub mod frame;
pub mod instance;
pub mod meta;
pub mod method;
pub mod symbol;
pub mod universe;
pub mod value;

pub use block::Block;
pub use class::Class;
pub use env::{CallEnv, ExecutionLevel};
pub use error::{CallResult, NonLocalReturn, RuntimeError, Unwind};
pub use frame::{Activation, FrameContext, StackMarker};
pub use instance::Instance;
pub use meta::{MetaObject, MetaOperation};
pub use method::{HostFn, Method};
pub use symbol::{selector_arity, Interner, Symbol};
pub use universe::{
    CoreClasses, DispatchOptions, Selectors, Universe, DEFAULT_INLINE_CACHE_LIMIT,
};
pub use value::{ArrayObj, Value};
