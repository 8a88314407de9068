//! Integration tests for method-activation interception
//!
//! Tests cover:
//! - Handlers substituting the argument values a method runs with
//! - The reified argument array handed to handlers (receiver included)
//! - Replacement arrays of the wrong length and non-array answers
//! - Activation handlers running on every activation, in contrast to
//!   lookup handlers whose decisions are cached

use std::sync::Arc;

use parking_lot::Mutex;

use mira_dispatch::{MessageSendSite, MethodActivationSite};
use mira_object::{
    CallEnv, Instance, MetaObject, MetaOperation, Method, RuntimeError, Universe, Unwind, Value,
};

fn lookup_to(universe: &Universe, target: &Arc<Method>) -> Arc<Method> {
    let target = Arc::clone(target);
    Method::from_fn(universe.intern("find:since:"), 2, move |_activation| {
        Ok(Value::Method(Arc::clone(&target)))
    })
}

fn doubling_method(universe: &Universe) -> Arc<Method> {
    Method::from_fn(universe.intern("double:"), 1, |activation| {
        match activation.arg(0) {
            Value::Integer(n) => Ok(Value::Integer(n * 2)),
            other => Err(RuntimeError::TypeError(format!(
                "double: sent with a {}",
                other.type_name()
            ))
            .into()),
        }
    })
}

#[test]
fn test_handler_substitutes_arguments() {
    let universe = Universe::new();
    let env = CallEnv::base();

    let class = universe.new_class("Tuned", None, 0);
    let target = doubling_method(&universe);
    class.install_method(Arc::clone(&target));

    let meta = Arc::new(
        MetaObject::new()
            .with_handler(MetaOperation::MessageLookup, lookup_to(&universe, &target))
            .with_handler(
                MetaOperation::Activation,
                Method::from_fn(universe.intern("run:with:"), 2, |activation| {
                    // whatever was sent, the method runs with 21
                    Ok(Value::array(vec![
                        activation.receiver().clone(),
                        Value::Integer(21),
                    ]))
                }),
            ),
    );
    universe.install_class_meta(&class, meta);

    let mut site = MessageSendSite::new(universe.intern("double:"));
    let result = site
        .dispatch(
            &universe,
            &env,
            vec![Value::Object(Instance::new(&class)), Value::Integer(5)],
        )
        .unwrap();
    assert_eq!(result, Value::Integer(42));
}

#[test]
fn test_reified_arguments_include_the_receiver() {
    let universe = Universe::new();
    let env = CallEnv::base();

    let class = universe.new_class("Watched", None, 0);
    let target = doubling_method(&universe);
    class.install_method(Arc::clone(&target));

    let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let target_for_handler = Arc::clone(&target);
    let meta = Arc::new(
        MetaObject::new()
            .with_handler(MetaOperation::MessageLookup, lookup_to(&universe, &target))
            .with_handler(
                MetaOperation::Activation,
                Method::from_fn(universe.intern("run:with:"), 2, move |activation| {
                    match activation.arg(0) {
                        Value::Method(method) => {
                            assert!(Arc::ptr_eq(method, &target_for_handler))
                        }
                        other => panic!("expected the method, got {}", other.type_name()),
                    }
                    *sink.lock() = Some(activation.arg(1).clone());
                    // pass the reified arguments through unchanged
                    Ok(activation.arg(1).clone())
                }),
            ),
    );
    universe.install_class_meta(&class, meta);

    let receiver = Value::Object(Instance::new(&class));
    let mut site = MessageSendSite::new(universe.intern("double:"));
    let result = site
        .dispatch(&universe, &env, vec![receiver.clone(), Value::Integer(5)])
        .unwrap();
    assert_eq!(result, Value::Integer(10));

    match seen.lock().take() {
        Some(Value::Array(array)) => {
            assert_eq!(array.len(), 2);
            assert_eq!(array.get(0).unwrap(), receiver);
            assert_eq!(array.get(1).unwrap(), Value::Integer(5));
        }
        other => panic!("expected the reified arguments, got {other:?}"),
    };
}

#[test]
fn test_replacement_of_the_wrong_length_is_an_error() {
    let universe = Universe::new();
    let env = CallEnv::base();

    let class = universe.new_class("Short", None, 0);
    let target = doubling_method(&universe);
    class.install_method(Arc::clone(&target));

    let meta = Arc::new(
        MetaObject::new()
            .with_handler(MetaOperation::MessageLookup, lookup_to(&universe, &target))
            .with_handler(
                MetaOperation::Activation,
                Method::from_fn(universe.intern("run:with:"), 2, |activation| {
                    // drops the argument, keeping only the receiver slot
                    Ok(Value::array(vec![activation.receiver().clone()]))
                }),
            ),
    );
    universe.install_class_meta(&class, meta);

    let mut site = MessageSendSite::new(universe.intern("double:"));
    let err = site
        .dispatch(
            &universe,
            &env,
            vec![Value::Object(Instance::new(&class)), Value::Integer(5)],
        )
        .unwrap_err();
    match err {
        Unwind::Error(RuntimeError::ReifiedArityMismatch {
            selector,
            expected,
            got,
        }) => {
            assert_eq!(selector, "double:");
            assert_eq!(expected, 2);
            assert_eq!(got, 1);
        }
        other => panic!("expected ReifiedArityMismatch, got {other:?}"),
    }
}

#[test]
fn test_non_array_replacement_is_rejected() {
    let universe = Universe::new();
    let env = CallEnv::base();

    let class = universe.new_class("Broken", None, 0);
    let target = doubling_method(&universe);
    class.install_method(Arc::clone(&target));

    let meta = Arc::new(
        MetaObject::new()
            .with_handler(MetaOperation::MessageLookup, lookup_to(&universe, &target))
            .with_handler(
                MetaOperation::Activation,
                Method::from_fn(universe.intern("run:with:"), 2, |_activation| Ok(Value::Nil)),
            ),
    );
    universe.install_class_meta(&class, meta);

    let mut site = MessageSendSite::new(universe.intern("double:"));
    let err = site
        .dispatch(
            &universe,
            &env,
            vec![Value::Object(Instance::new(&class)), Value::Integer(5)],
        )
        .unwrap_err();
    match err {
        Unwind::Error(RuntimeError::InvalidMetaResult { operation, got }) => {
            assert_eq!(operation, "activation");
            assert_eq!(got, "Nil");
        }
        other => panic!("expected InvalidMetaResult, got {other:?}"),
    }
}

#[test]
fn test_activation_handler_runs_on_every_send() {
    let universe = Universe::new();
    let env = CallEnv::base();

    let class = universe.new_class("Traced", None, 0);
    let target = doubling_method(&universe);
    class.install_method(Arc::clone(&target));

    let lookups = Arc::new(Mutex::new(0));
    let activations = Arc::new(Mutex::new(0));
    let lookup_count = Arc::clone(&lookups);
    let activation_count = Arc::clone(&activations);
    let target_for_lookup = Arc::clone(&target);

    let meta = Arc::new(
        MetaObject::new()
            .with_handler(
                MetaOperation::MessageLookup,
                Method::from_fn(universe.intern("find:since:"), 2, move |_activation| {
                    *lookup_count.lock() += 1;
                    Ok(Value::Method(Arc::clone(&target_for_lookup)))
                }),
            )
            .with_handler(
                MetaOperation::Activation,
                Method::from_fn(universe.intern("run:with:"), 2, move |activation| {
                    *activation_count.lock() += 1;
                    Ok(activation.arg(1).clone())
                }),
            ),
    );
    universe.install_class_meta(&class, meta);

    let receiver = Value::Object(Instance::new(&class));
    let mut site = MessageSendSite::new(universe.intern("double:"));
    for n in 1..=3 {
        let result = site
            .dispatch(&universe, &env, vec![receiver.clone(), Value::Integer(n)])
            .unwrap();
        assert_eq!(result, Value::Integer(n * 2));
    }

    // the lookup decision is cached; the activation wrap is not
    assert_eq!(*lookups.lock(), 1);
    assert_eq!(*activations.lock(), 3);
}

#[test]
fn test_standalone_activation_site_without_a_handler() {
    let universe = Universe::new();
    let env = CallEnv::base();

    let class = universe.new_class("Plain", None, 0);
    let target = doubling_method(&universe);
    class.install_method(Arc::clone(&target));

    // no meta anywhere: the site is a transparent pass-through
    let mut site = MethodActivationSite::new();
    let result = site
        .activate(
            &universe,
            &env,
            &target,
            vec![Value::Object(Instance::new(&class)), Value::Integer(8)],
        )
        .unwrap();
    assert_eq!(result, Value::Integer(16));
}
