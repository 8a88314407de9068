//! The semantic-check gate

use std::mem;
use std::sync::Arc;

use log::trace;

use mira_object::{CallEnv, Class, MetaOperation, Method, Universe, Value};

use crate::send::CacheShape;

#[derive(Debug, Clone)]
struct GateEntry {
    class: Arc<Class>,
    handler: Option<Arc<Method>>,
}

#[derive(Debug, Clone)]
enum GateState {
    Uninitialized,
    Specialized(Vec<GateEntry>),
    Generic,
}

/// Per-site interception decision for one operation kind.
///
/// `check` answers the handler method to run instead of the base operation,
/// or `None` when the operation proceeds normally. Two answers are never
/// cached: meta-level callers (interception is off at the meta level, which
/// is what stops the protocol from recursing) and receivers carrying a
/// per-instance meta-object. Class-level answers are cached per receiver
/// class, negative answers included, with the same bounded one-way collapse
/// as the send caches. Entries are stamped with the universe's meta
/// generation and dropped wholesale when it moves.
pub struct SemanticSite {
    op: MetaOperation,
    state: GateState,
    generation: u64,
}

impl SemanticSite {
    /// Gate for one operation kind
    pub fn new(op: MetaOperation) -> Self {
        Self {
            op,
            state: GateState::Uninitialized,
            generation: 0,
        }
    }

    /// Operation kind this gate covers
    pub fn operation(&self) -> MetaOperation {
        self.op
    }

    /// Current cache shape
    pub fn shape(&self) -> CacheShape {
        match &self.state {
            GateState::Uninitialized => CacheShape::Uninitialized,
            GateState::Specialized(entries) => CacheShape::Specialized(entries.len()),
            GateState::Generic => CacheShape::Generic,
        }
    }

    /// Handler to run for `receiver`, or `None` for the base behavior
    pub fn check(
        &mut self,
        universe: &Universe,
        env: &CallEnv,
        receiver: &Value,
    ) -> Option<Arc<Method>> {
        if env.is_meta() {
            return None;
        }
        if let Value::Object(instance) = receiver {
            if let Some(meta) = instance.meta_object() {
                // per-instance meta wins wholesale, handler present or not
                return meta.handler(self.op).cloned();
            }
        }
        let class = universe.class_of(receiver);
        self.check_class(universe, &class)
    }

    fn check_class(&mut self, universe: &Universe, class: &Arc<Class>) -> Option<Arc<Method>> {
        let generation = universe.meta_generation();
        if generation != self.generation {
            if !matches!(self.state, GateState::Uninitialized) {
                trace!(
                    "{} gate cleared, generation {} -> {}",
                    self.op.label(),
                    self.generation,
                    generation
                );
                self.state = GateState::Uninitialized;
            }
            self.generation = generation;
        }

        if let GateState::Specialized(entries) = &self.state {
            if let Some(entry) = entries.iter().find(|e| Arc::ptr_eq(&e.class, class)) {
                return entry.handler.clone();
            }
        }

        if matches!(self.state, GateState::Generic) {
            return class.meta_object().and_then(|m| m.handler(self.op).cloned());
        }

        let handler = class.meta_object().and_then(|m| m.handler(self.op).cloned());
        self.extend(universe, Arc::clone(class), handler.clone());
        handler
    }

    fn extend(&mut self, universe: &Universe, class: Arc<Class>, handler: Option<Arc<Method>>) {
        let limit = universe.options().reflect_cache_limit;
        let state = mem::replace(&mut self.state, GateState::Uninitialized);
        self.state = match state {
            GateState::Uninitialized => GateState::Specialized(vec![GateEntry { class, handler }]),
            GateState::Specialized(mut entries) => {
                if entries.len() >= limit {
                    GateState::Generic
                } else {
                    entries.push(GateEntry { class, handler });
                    GateState::Specialized(entries)
                }
            }
            GateState::Generic => GateState::Generic,
        };
    }
}
