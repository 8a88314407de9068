//! Integration tests for the doesNotUnderstand:arguments: protocol
//!
//! Tests cover:
//! - Synthesized message shape: selector symbol plus an argument array
//!   that excludes the receiver
//! - Receiver identity preserved into the handler
//! - Failed lookups never entering the inline cache
//! - The hard MessageNotUnderstood error when no handler exists anywhere

use std::sync::Arc;

use parking_lot::Mutex;

use mira_dispatch::{CacheShape, MessageSendSite};
use mira_object::{CallEnv, Instance, Method, RuntimeError, Universe, Unwind, Value};

#[test]
fn test_handler_receives_selector_and_argument_array() {
    let universe = Universe::new();
    let env = CallEnv::base();

    let seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let class = universe.new_class("Proxy", None, 0);
    class.install_method(Method::from_fn(
        universe.selectors().does_not_understand,
        2,
        move |activation| {
            let mut log = sink.lock();
            log.push(activation.receiver().clone());
            log.push(activation.arg(0).clone());
            log.push(activation.arg(1).clone());
            Ok(Value::Integer(99))
        },
    ));

    let receiver = Value::Object(Instance::new(&class));
    let selector = universe.intern("route:to:");
    let mut site = MessageSendSite::new(selector);

    let result = site
        .dispatch(
            &universe,
            &env,
            vec![receiver.clone(), Value::Integer(1), Value::Integer(2)],
        )
        .unwrap();
    assert_eq!(result, Value::Integer(99));

    let log = seen.lock();
    // receiver identity survives the synthesis
    assert_eq!(log[0], receiver);
    assert_eq!(log[1], Value::Symbol(selector));
    // the argument array excludes the receiver
    match &log[2] {
        Value::Array(array) => {
            assert_eq!(array.len(), 2);
            assert_eq!(array.get(0).unwrap(), Value::Integer(1));
            assert_eq!(array.get(1).unwrap(), Value::Integer(2));
        }
        other => panic!("expected an array of arguments, got {}", other.type_name()),
    }
}

#[test]
fn test_unary_miss_synthesizes_empty_argument_array() {
    let universe = Universe::new();
    let env = CallEnv::base();

    let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);

    let class = universe.new_class("Proxy", None, 0);
    class.install_method(Method::from_fn(
        universe.selectors().does_not_understand,
        2,
        move |activation| {
            *sink.lock() = Some(activation.arg(1).clone());
            Ok(Value::Nil)
        },
    ));

    let mut site = MessageSendSite::new(universe.intern("ping"));
    site.dispatch(&universe, &env, vec![Value::Object(Instance::new(&class))])
        .unwrap();

    match seen.lock().take() {
        Some(Value::Array(array)) => assert!(array.is_empty()),
        other => panic!("expected an empty array, got {other:?}"),
    };
}

#[test]
fn test_failed_lookup_is_never_cached() {
    let universe = Universe::new();
    let env = CallEnv::base();

    let class = universe.new_class("Proxy", None, 0);
    class.install_method(Method::from_fn(
        universe.selectors().does_not_understand,
        2,
        |_activation| Ok(Value::Nil),
    ));
    let receiver = Value::Object(Instance::new(&class));

    let mut site = MessageSendSite::new(universe.intern("missing"));
    site.dispatch(&universe, &env, vec![receiver.clone()]).unwrap();
    site.dispatch(&universe, &env, vec![receiver]).unwrap();

    // every failed lookup re-resolves; nothing specializes
    assert_eq!(site.shape(), CacheShape::Uninitialized);
    assert_eq!(site.stats().misses, 2);
    assert_eq!(site.stats().hits, 0);
}

#[test]
fn test_installing_the_selector_later_still_specializes() {
    let universe = Universe::new();
    let env = CallEnv::base();

    let class = universe.new_class("Late", None, 0);
    class.install_method(Method::from_fn(
        universe.selectors().does_not_understand,
        2,
        |_activation| Ok(Value::Integer(-1)),
    ));
    let receiver = Value::Object(Instance::new(&class));

    let selector = universe.intern("answer");
    let mut site = MessageSendSite::new(selector);
    assert_eq!(
        site.dispatch(&universe, &env, vec![receiver.clone()]).unwrap(),
        Value::Integer(-1)
    );
    assert_eq!(site.shape(), CacheShape::Uninitialized);

    // once the method exists the same site specializes normally
    class.install_method(Method::from_fn(selector, 0, |_activation| {
        Ok(Value::Integer(42))
    }));
    assert_eq!(
        site.dispatch(&universe, &env, vec![receiver]).unwrap(),
        Value::Integer(42)
    );
    assert_eq!(site.shape(), CacheShape::Specialized(1));
}

#[test]
fn test_unhandled_message_is_a_hard_error() {
    let universe = Universe::new();
    let env = CallEnv::base();

    let class = universe.new_class("Mute", None, 0);
    let mut site = MessageSendSite::new(universe.intern("shout"));

    let err = site
        .dispatch(&universe, &env, vec![Value::Object(Instance::new(&class))])
        .unwrap_err();
    match err {
        Unwind::Error(RuntimeError::MessageNotUnderstood {
            class_name,
            selector,
        }) => {
            assert_eq!(class_name, "Mute");
            assert_eq!(selector, "shout");
        }
        other => panic!("expected MessageNotUnderstood, got {other:?}"),
    }
}

#[test]
fn test_handler_found_on_a_superclass() {
    let universe = Universe::new();
    let env = CallEnv::base();

    let base = universe.new_class("Base", None, 0);
    base.install_method(Method::from_fn(
        universe.selectors().does_not_understand,
        2,
        |activation| Ok(activation.arg(0).clone()),
    ));
    let derived = universe.new_class("Derived", Some(&base), 0);

    let selector = universe.intern("lost");
    let mut site = MessageSendSite::new(selector);
    let result = site
        .dispatch(&universe, &env, vec![Value::Object(Instance::new(&derived))])
        .unwrap();
    assert_eq!(result, Value::Symbol(selector));
}
