//! Adaptive message dispatch and meta-object interception
//!
//! This crate implements the dispatch core of the Mira runtime:
//! - Per-call-site polymorphic inline caches with one-way collapse to a
//!   generic state
//! - Superclass-chain method lookup and `doesNotUnderstand:arguments:`
//!   synthesis
//! - The semantic-check gate deciding whether an operation is intercepted
//!   by a meta-object
//! - Reflective dispatch for field access, message lookup, and method
//!   activation
//! - Method activation with frame-marker bookkeeping and the non-local
//!   return controller
//!
//! Call sites are plain state machines owned by the evaluator; nothing in
//! here is global. All interception is driven by the meta-objects installed
//! in the [`mira_object::Universe`] and by the execution level carried in
//! each [`mira_object::CallEnv`].

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod activate;
pub mod gate;
pub mod lookup;
pub mod nonlocal;
pub mod reflect;
pub mod send;

pub use activate::activate_method;
pub use gate::SemanticSite;
pub use lookup::{generic_send, resolve, send_does_not_understand};
pub use nonlocal::non_local_return;
pub use reflect::activation::{ActivationDispatchSite, MethodActivationSite};
pub use reflect::field::{FieldReadSite, FieldWriteSite};
pub use reflect::lookup::{LookupStart, ReflectiveLookupSite};
pub use send::{CacheShape, MessageSendSite, SiteStats, SuperSendSite};
