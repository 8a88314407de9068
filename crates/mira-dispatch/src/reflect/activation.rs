//! Method-activation interception

use std::mem;
use std::sync::Arc;

use mira_object::{
    CallEnv, CallResult, MetaOperation, Method, RuntimeError, Universe, Value,
};

use crate::activate;
use crate::gate::SemanticSite;
use crate::reflect::call_meta;
use crate::send::{CacheShape, SiteStats};

/// Activation entry point of the reflective family.
///
/// Checks the activation gate for the receiver; when a handler applies the
/// activation is routed through an [`ActivationDispatchSite`], otherwise
/// the method is activated directly.
pub struct MethodActivationSite {
    gate: SemanticSite,
    dispatch: ActivationDispatchSite,
}

impl MethodActivationSite {
    /// Fresh activation site
    pub fn new() -> Self {
        Self {
            gate: SemanticSite::new(MetaOperation::Activation),
            dispatch: ActivationDispatchSite::new(),
        }
    }

    /// Shape of the underlying (handler, method) cache
    pub fn dispatch_shape(&self) -> CacheShape {
        self.dispatch.shape()
    }

    /// Activate `method` on `args`, honoring an activation handler if one applies
    pub fn activate(
        &mut self,
        universe: &Universe,
        env: &CallEnv,
        method: &Arc<Method>,
        args: Vec<Value>,
    ) -> CallResult {
        debug_assert!(!args.is_empty(), "activation needs a receiver");
        if let Some(handler) = self.gate.check(universe, env, &args[0]) {
            return self.dispatch.execute(universe, env, &handler, method, args);
        }
        activate::activate_method(universe, env, method, args)
    }
}

impl Default for MethodActivationSite {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct PairEntry {
    handler: Arc<Method>,
    target: Arc<Method>,
}

#[derive(Debug, Clone)]
enum PairState {
    Uninitialized,
    Specialized(Vec<PairEntry>),
    Generic,
}

/// Intercepted activation.
///
/// The handler runs with `(receiver, methodToActivate, arguments)` where
/// `arguments` is the full reified argument array, receiver included. It
/// must answer a replacement array of exactly the method's slot count; the
/// method is then activated with the replaced values back at the caller's
/// level. Pairings of (handler, methodToActivate) are cached by identity
/// with the usual bound and one-way collapse, generation-stamped like the
/// other interception caches.
pub struct ActivationDispatchSite {
    pairs: PairState,
    generation: u64,
    stats: SiteStats,
}

impl ActivationDispatchSite {
    /// Fresh dispatch site
    pub fn new() -> Self {
        Self {
            pairs: PairState::Uninitialized,
            generation: 0,
            stats: SiteStats::default(),
        }
    }

    /// Current pair-cache shape
    pub fn shape(&self) -> CacheShape {
        match &self.pairs {
            PairState::Uninitialized => CacheShape::Uninitialized,
            PairState::Specialized(entries) => CacheShape::Specialized(entries.len()),
            PairState::Generic => CacheShape::Generic,
        }
    }

    /// Hit/miss counters for the pair cache
    pub fn stats(&self) -> SiteStats {
        self.stats
    }

    /// Run `handler` around the activation of `target`
    pub fn execute(
        &mut self,
        universe: &Universe,
        env: &CallEnv,
        handler: &Arc<Method>,
        target: &Arc<Method>,
        args: Vec<Value>,
    ) -> CallResult {
        self.note_pair(universe, handler, target);

        let reified = Value::array(args.clone());
        let handler_args = vec![
            args[0].clone(),
            Value::Method(Arc::clone(target)),
            reified,
        ];
        let replaced = call_meta(universe, env, handler, handler_args)?;

        let array = match replaced {
            Value::Array(array) => array,
            other => {
                return Err(RuntimeError::InvalidMetaResult {
                    operation: "activation",
                    got: other.type_name(),
                }
                .into())
            }
        };
        let new_args = array.to_vec();
        if new_args.len() != target.arity() + 1 {
            return Err(RuntimeError::ReifiedArityMismatch {
                selector: universe.symbol_name(target.selector()),
                expected: target.arity() + 1,
                got: new_args.len(),
            }
            .into());
        }

        activate::activate_method(universe, env, target, new_args)
    }

    fn note_pair(&mut self, universe: &Universe, handler: &Arc<Method>, target: &Arc<Method>) {
        let generation = universe.meta_generation();
        if generation != self.generation {
            self.pairs = PairState::Uninitialized;
            self.generation = generation;
        }

        if let PairState::Specialized(entries) = &self.pairs {
            if entries.iter().any(|entry| {
                Arc::ptr_eq(&entry.handler, handler) && Arc::ptr_eq(&entry.target, target)
            }) {
                self.stats.hits += 1;
                return;
            }
        }
        if matches!(self.pairs, PairState::Generic) {
            self.stats.misses += 1;
            return;
        }

        self.stats.misses += 1;
        let limit = universe.options().reflect_cache_limit;
        let entry = PairEntry {
            handler: Arc::clone(handler),
            target: Arc::clone(target),
        };
        let state = mem::replace(&mut self.pairs, PairState::Uninitialized);
        self.pairs = match state {
            PairState::Uninitialized => PairState::Specialized(vec![entry]),
            PairState::Specialized(mut entries) => {
                if entries.len() >= limit {
                    PairState::Generic
                } else {
                    entries.push(entry);
                    PairState::Specialized(entries)
                }
            }
            PairState::Generic => PairState::Generic,
        };
    }
}

impl Default for ActivationDispatchSite {
    fn default() -> Self {
        Self::new()
    }
}
