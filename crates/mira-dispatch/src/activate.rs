//! Method activation and unwind filtering

use std::sync::Arc;

use log::trace;

use mira_object::{
    Activation, CallEnv, CallResult, FrameContext, Method, RuntimeError, StackMarker, Universe,
    Unwind, Value,
};

/// Activate `method` with `args` (receiver at index 0).
///
/// Every method activation allocates a fresh stack marker and a method
/// frame context. The marker is flipped off-stack on every exit path.
/// A non-local return unwinding through here is caught exactly when it
/// targets this activation's marker; anything else keeps propagating.
pub fn activate_method(
    universe: &Universe,
    env: &CallEnv,
    method: &Arc<Method>,
    args: Vec<Value>,
) -> CallResult {
    if args.len() != method.arity() + 1 {
        return Err(RuntimeError::WrongArgumentCount {
            selector: universe.symbol_name(method.selector()),
            expected: method.arity(),
            got: args.len().saturating_sub(1),
        }
        .into());
    }

    let marker = StackMarker::new();
    let context = FrameContext::for_method(args[0].clone(), Arc::clone(&marker));
    let activation = Activation::new(universe, env, context, &args);
    let result = method.invoke_with(&activation);
    marker.mark_off_stack();

    match result {
        Err(Unwind::Return(nlr)) if Arc::ptr_eq(&nlr.marker, &marker) => {
            trace!(
                "non-local return reached #{}",
                universe.symbol_name(method.selector())
            );
            Ok(nlr.value)
        }
        other => other,
    }
}
