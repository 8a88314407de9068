//! Non-local return initiation

use log::debug;

use mira_object::{Activation, CallResult, NonLocalReturn, Unwind, Value};

use crate::lookup;

/// Return `value` from the home method activation of the current block.
///
/// When the home activation is still on the stack this raises the unwind
/// signal that [`crate::activate::activate_method`] catches by marker
/// identity; every frame in between just propagates it. When the home
/// activation has already returned, the block has escaped: the situation
/// is delegated by sending `escapedBlock:` to the home receiver with the
/// escaping block as argument, and that send's result becomes this call's
/// result. Delegation is policy, not failure; a receiver without an
/// `escapedBlock:` method ends up in the ordinary
/// `doesNotUnderstand:arguments:` path.
pub fn non_local_return(activation: &Activation<'_>, value: Value) -> CallResult {
    let context = activation.context();
    let marker = context.home_marker();

    if marker.is_on_stack() {
        return Err(Unwind::Return(NonLocalReturn { value, marker }));
    }

    let universe = activation.universe();
    debug!("block escaped its home activation, delegating");
    let home_receiver = context.home_receiver();
    let block = activation.receiver().clone();
    let selector = universe.selectors().escaped_block;
    lookup::generic_send(
        universe,
        activation.env(),
        selector,
        vec![home_receiver, block],
    )
}
