//! Reflective dispatch: interception handlers replacing base operations
//!
//! Three operation families can be taken over by an installed meta-object:
//! field access ([`field`]), message lookup ([`lookup`]), and method
//! activation ([`activation`]). Handlers are ordinary methods; the helpers
//! here run them at the meta execution level with the caller's environment
//! value preserved, so handler code itself is dispatched unintercepted.

pub mod activation;
pub mod field;
pub mod lookup;

use std::sync::Arc;

use mira_object::{CallEnv, CallResult, Method, Universe, Value};

use crate::activate;

// Run an interception handler. Level flips to meta for the handler's whole
// dynamic extent; the environment value rides along unchanged.
pub(crate) fn call_meta(
    universe: &Universe,
    env: &CallEnv,
    handler: &Arc<Method>,
    args: Vec<Value>,
) -> CallResult {
    let meta_env = env.meta_of();
    activate::activate_method(universe, &meta_env, handler, args)
}
