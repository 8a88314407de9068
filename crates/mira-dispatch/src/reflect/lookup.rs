//! Message-lookup interception

use std::mem;
use std::sync::Arc;

use log::debug;

use mira_object::{
    CallEnv, CallResult, Class, Method, RuntimeError, Symbol, Universe, Unwind, Value,
};

use crate::reflect::activation::MethodActivationSite;
use crate::reflect::call_meta;
use crate::send::{CacheShape, SiteStats};

/// Where an intercepted lookup tells the handler to start
#[derive(Debug, Clone)]
pub enum LookupStart {
    /// The receiver's dynamic class (ordinary sends)
    ReceiverClass,
    /// A statically known class (super sends)
    Lexical(Arc<Class>),
}

#[derive(Debug, Clone)]
struct NestedEntry {
    handler: Arc<Method>,
    class: Arc<Class>,
    target: Arc<Method>,
}

#[derive(Debug, Clone)]
enum NestedState {
    Uninitialized,
    Specialized(Vec<NestedEntry>),
    Generic,
}

/// Reflective overlay of a message-send site.
///
/// The lookup handler runs with `(receiver, selector, sinceClass)` and must
/// answer the method to activate. Its decisions are cached in a nested
/// inline cache keyed on (handler, receiver class): a nested hit skips the
/// handler entirely and goes straight to activating the remembered method.
/// Past the bound the nested cache collapses and the handler runs on every
/// send. Either way the chosen method is activated through the activation
/// interception site, so an activation handler still applies. The nested
/// cache is generation-stamped and self-clears when meta-objects change.
pub struct ReflectiveLookupSite {
    selector: Symbol,
    start: LookupStart,
    nested: NestedState,
    generation: u64,
    activation: MethodActivationSite,
    stats: SiteStats,
}

impl ReflectiveLookupSite {
    /// Overlay for `selector`, telling handlers to start at `start`
    pub fn new(selector: Symbol, start: LookupStart) -> Self {
        Self {
            selector,
            start,
            nested: NestedState::Uninitialized,
            generation: 0,
            activation: MethodActivationSite::new(),
            stats: SiteStats::default(),
        }
    }

    /// Selector of the intercepted send
    pub fn selector(&self) -> Symbol {
        self.selector
    }

    /// Shape of the nested (handler, class) cache
    pub fn nested_shape(&self) -> CacheShape {
        match &self.nested {
            NestedState::Uninitialized => CacheShape::Uninitialized,
            NestedState::Specialized(entries) => CacheShape::Specialized(entries.len()),
            NestedState::Generic => CacheShape::Generic,
        }
    }

    /// Hit/miss counters for the nested cache
    pub fn stats(&self) -> SiteStats {
        self.stats
    }

    /// Dispatch through the lookup handler (or its cached decision)
    pub fn dispatch(
        &mut self,
        universe: &Universe,
        env: &CallEnv,
        handler: &Arc<Method>,
        args: Vec<Value>,
    ) -> CallResult {
        debug_assert!(!args.is_empty(), "send needs a receiver");
        self.refresh_generation(universe);
        let receiver_class = universe.class_of(&args[0]);

        if let NestedState::Specialized(entries) = &self.nested {
            if let Some(entry) = entries.iter().find(|entry| {
                Arc::ptr_eq(&entry.handler, handler) && Arc::ptr_eq(&entry.class, &receiver_class)
            }) {
                let target = Arc::clone(&entry.target);
                self.stats.hits += 1;
                return self.activation.activate(universe, env, &target, args);
            }
        }

        self.stats.misses += 1;
        let target = self.run_handler(universe, env, handler, &args[0], &receiver_class)?;
        if !matches!(self.nested, NestedState::Generic) {
            self.extend(
                universe,
                Arc::clone(handler),
                receiver_class,
                Arc::clone(&target),
            );
        }
        self.activation.activate(universe, env, &target, args)
    }

    fn refresh_generation(&mut self, universe: &Universe) {
        let generation = universe.meta_generation();
        if generation != self.generation {
            self.nested = NestedState::Uninitialized;
            self.generation = generation;
        }
    }

    // Ask the handler which method to activate.
    fn run_handler(
        &self,
        universe: &Universe,
        env: &CallEnv,
        handler: &Arc<Method>,
        receiver: &Value,
        receiver_class: &Arc<Class>,
    ) -> Result<Arc<Method>, Unwind> {
        let since = match &self.start {
            LookupStart::ReceiverClass => Arc::clone(receiver_class),
            LookupStart::Lexical(class) => Arc::clone(class),
        };
        let handler_args = vec![
            receiver.clone(),
            Value::Symbol(self.selector),
            Value::Class(since),
        ];
        match call_meta(universe, env, handler, handler_args)? {
            Value::Method(method) => Ok(method),
            other => Err(RuntimeError::InvalidMetaResult {
                operation: "messageLookup",
                got: other.type_name(),
            }
            .into()),
        }
    }

    fn extend(
        &mut self,
        universe: &Universe,
        handler: Arc<Method>,
        class: Arc<Class>,
        target: Arc<Method>,
    ) {
        let limit = universe.options().reflect_cache_limit;
        let entry = NestedEntry {
            handler,
            class,
            target,
        };
        let state = mem::replace(&mut self.nested, NestedState::Uninitialized);
        self.nested = match state {
            NestedState::Uninitialized => NestedState::Specialized(vec![entry]),
            NestedState::Specialized(mut entries) => {
                if entries.len() >= limit {
                    debug!(
                        "reflective lookup cache for #{} went megamorphic",
                        universe.symbol_name(self.selector)
                    );
                    NestedState::Generic
                } else {
                    entries.push(entry);
                    NestedState::Specialized(entries)
                }
            }
            NestedState::Generic => NestedState::Generic,
        };
    }
}
