//! Superclass-chain lookup, the generic send path, and message-not-understood

use std::sync::Arc;

use log::debug;

use mira_object::{CallEnv, CallResult, Class, Method, RuntimeError, Symbol, Universe, Value};

use crate::activate;

/// Resolve `selector` by walking the superclass chain from `start`.
///
/// This is the one lookup routine in the core; inline caches, the generic
/// path, and message-not-understood synthesis all go through it.
pub fn resolve(start: &Arc<Class>, selector: Symbol) -> Option<Arc<Method>> {
    let mut current = Some(Arc::clone(start));
    while let Some(class) = current {
        if let Some(method) = class.local_method(selector) {
            return Some(method);
        }
        current = class.superclass().cloned();
    }
    None
}

/// Send `selector` without any call-site state.
///
/// Looks the method up on every call and never caches. Used by collapsed
/// call sites and for the synthesized sends the core makes itself
/// (`doesNotUnderstand:arguments:`, `escapedBlock:`).
pub fn generic_send(
    universe: &Universe,
    env: &CallEnv,
    selector: Symbol,
    args: Vec<Value>,
) -> CallResult {
    debug_assert!(!args.is_empty(), "send needs a receiver");
    let receiver_class = universe.class_of(&args[0]);
    match resolve(&receiver_class, selector) {
        Some(method) => activate::activate_method(universe, env, &method, args),
        None => send_does_not_understand(universe, env, selector, args),
    }
}

/// Deliver a failed send as `doesNotUnderstand:arguments:`.
///
/// The receiver keeps its place; the failed selector arrives as a symbol
/// and the original arguments (receiver excluded) as an array. The
/// synthesized send is itself uncached. If the receiver's class chain does
/// not define the selector either, the failure surfaces as
/// [`RuntimeError::MessageNotUnderstood`].
pub fn send_does_not_understand(
    universe: &Universe,
    env: &CallEnv,
    selector: Symbol,
    args: Vec<Value>,
) -> CallResult {
    debug_assert!(!args.is_empty(), "send needs a receiver");
    let receiver_class = universe.class_of(&args[0]);
    debug!(
        "{} does not understand #{}",
        receiver_class.name(),
        universe.symbol_name(selector)
    );

    let dnu = universe.selectors().does_not_understand;
    let Some(method) = resolve(&receiver_class, dnu) else {
        return Err(RuntimeError::MessageNotUnderstood {
            class_name: receiver_class.name().to_string(),
            selector: universe.symbol_name(selector),
        }
        .into());
    };

    let mut args = args;
    let receiver = args.remove(0);
    let dnu_args = vec![receiver, Value::Symbol(selector), Value::array(args)];
    activate::activate_method(universe, env, &method, dnu_args)
}
