//! Message-send call sites and their inline caches

use std::mem;
use std::sync::Arc;

use log::debug;

use mira_object::{CallEnv, CallResult, Class, Method, Symbol, Universe, Value};

use crate::activate;
use crate::gate::SemanticSite;
use crate::lookup;
use crate::reflect::lookup::{LookupStart, ReflectiveLookupSite};

/// Summary of a cache's current shape, for introspection and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheShape {
    /// Nothing dispatched yet
    Uninitialized,
    /// Bounded entry list of the given length
    Specialized(usize),
    /// Collapsed; every dispatch takes the generic path
    Generic,
}

/// Hit and miss counts for one call site
#[derive(Debug, Clone, Copy, Default)]
pub struct SiteStats {
    /// Dispatches answered from the cache
    pub hits: u64,
    /// Dispatches that had to resolve (or run generically)
    pub misses: u64,
}

/// One cache entry: receiver-class guard plus the resolved target
#[derive(Debug, Clone)]
struct CacheEntry {
    guard: Arc<Class>,
    target: Arc<Method>,
}

// The three-state call-site machine. Misses append entries in dispatch
// order; once a miss would push the entry count past the configured bound
// the whole list is discarded and the state is `Generic` for good.
#[derive(Debug, Clone)]
enum CacheState {
    Uninitialized,
    Specialized(Vec<CacheEntry>),
    Generic,
}

impl CacheState {
    fn shape(&self) -> CacheShape {
        match self {
            CacheState::Uninitialized => CacheShape::Uninitialized,
            CacheState::Specialized(entries) => CacheShape::Specialized(entries.len()),
            CacheState::Generic => CacheShape::Generic,
        }
    }
}

/// A message-send call site.
///
/// Dispatch order: the semantic-check gate first; when a message-lookup
/// handler applies, the send goes through the reflective overlay. Otherwise
/// the inline cache answers, guarded on receiver-class identity, with
/// misses resolved through [`lookup::resolve`] and failed lookups delivered
/// as `doesNotUnderstand:arguments:` (never cached).
pub struct MessageSendSite {
    selector: Symbol,
    state: CacheState,
    gate: SemanticSite,
    reflective: ReflectiveLookupSite,
    stats: SiteStats,
}

impl MessageSendSite {
    /// Call site for `selector`
    pub fn new(selector: Symbol) -> Self {
        Self {
            selector,
            state: CacheState::Uninitialized,
            gate: SemanticSite::new(mira_object::MetaOperation::MessageLookup),
            reflective: ReflectiveLookupSite::new(selector, LookupStart::ReceiverClass),
            stats: SiteStats::default(),
        }
    }

    /// Selector this site sends
    pub fn selector(&self) -> Symbol {
        self.selector
    }

    /// Current cache shape
    pub fn shape(&self) -> CacheShape {
        self.state.shape()
    }

    /// Hit/miss counters
    pub fn stats(&self) -> SiteStats {
        self.stats
    }

    /// Shape of the reflective overlay's nested cache
    pub fn reflective_shape(&self) -> CacheShape {
        self.reflective.nested_shape()
    }

    /// Dispatch `selector` to `args[0]` with the given arguments
    pub fn dispatch(&mut self, universe: &Universe, env: &CallEnv, args: Vec<Value>) -> CallResult {
        debug_assert!(!args.is_empty(), "send needs a receiver");
        if let Some(handler) = self.gate.check(universe, env, &args[0]) {
            return self.reflective.dispatch(universe, env, &handler, args);
        }
        self.dispatch_direct(universe, env, args)
    }

    fn dispatch_direct(
        &mut self,
        universe: &Universe,
        env: &CallEnv,
        args: Vec<Value>,
    ) -> CallResult {
        let receiver_class = universe.class_of(&args[0]);

        if let CacheState::Specialized(entries) = &self.state {
            if let Some(entry) = entries
                .iter()
                .find(|entry| Arc::ptr_eq(&entry.guard, &receiver_class))
            {
                let target = Arc::clone(&entry.target);
                self.stats.hits += 1;
                return activate::activate_method(universe, env, &target, args);
            }
        }

        if matches!(self.state, CacheState::Generic) {
            self.stats.misses += 1;
            return lookup::generic_send(universe, env, self.selector, args);
        }

        // miss on an uninitialized or specialized site
        self.stats.misses += 1;
        match lookup::resolve(&receiver_class, self.selector) {
            Some(target) => {
                self.extend_cache(universe, receiver_class, Arc::clone(&target));
                activate::activate_method(universe, env, &target, args)
            }
            // lookup failures are never cached
            None => lookup::send_does_not_understand(universe, env, self.selector, args),
        }
    }

    fn extend_cache(&mut self, universe: &Universe, guard: Arc<Class>, target: Arc<Method>) {
        let limit = universe.options().send_cache_limit;
        let state = mem::replace(&mut self.state, CacheState::Uninitialized);
        self.state = match state {
            CacheState::Uninitialized => CacheState::Specialized(vec![CacheEntry { guard, target }]),
            CacheState::Specialized(mut entries) => {
                if entries.len() >= limit {
                    debug!(
                        "send site #{} went megamorphic after {} classes",
                        universe.symbol_name(self.selector),
                        entries.len()
                    );
                    CacheState::Generic
                } else {
                    entries.push(CacheEntry { guard, target });
                    CacheState::Specialized(entries)
                }
            }
            CacheState::Generic => CacheState::Generic,
        };
    }
}

/// A super-send call site.
///
/// The lookup start class is the statically known lexical superclass, so
/// the receiver's dynamic class never matters: the first resolution is
/// cached as a single unguarded method reference.
pub struct SuperSendSite {
    selector: Symbol,
    start: Arc<Class>,
    cached: Option<Arc<Method>>,
    gate: SemanticSite,
    reflective: ReflectiveLookupSite,
    stats: SiteStats,
}

impl SuperSendSite {
    /// Super-send site for `selector`, starting lookup at `start`
    pub fn new(selector: Symbol, start: Arc<Class>) -> Self {
        let reflective =
            ReflectiveLookupSite::new(selector, LookupStart::Lexical(Arc::clone(&start)));
        Self {
            selector,
            start,
            cached: None,
            gate: SemanticSite::new(mira_object::MetaOperation::MessageLookup),
            reflective,
            stats: SiteStats::default(),
        }
    }

    /// Selector this site sends
    pub fn selector(&self) -> Symbol {
        self.selector
    }

    /// Lexical superclass lookup starts from
    pub fn start(&self) -> &Arc<Class> {
        &self.start
    }

    /// Current cache shape (at most one unguarded entry)
    pub fn shape(&self) -> CacheShape {
        match &self.cached {
            Some(_) => CacheShape::Specialized(1),
            None => CacheShape::Uninitialized,
        }
    }

    /// Hit/miss counters
    pub fn stats(&self) -> SiteStats {
        self.stats
    }

    /// Dispatch the super send
    pub fn dispatch(&mut self, universe: &Universe, env: &CallEnv, args: Vec<Value>) -> CallResult {
        debug_assert!(!args.is_empty(), "send needs a receiver");
        if let Some(handler) = self.gate.check(universe, env, &args[0]) {
            return self.reflective.dispatch(universe, env, &handler, args);
        }

        if let Some(target) = &self.cached {
            let target = Arc::clone(target);
            self.stats.hits += 1;
            return activate::activate_method(universe, env, &target, args);
        }

        self.stats.misses += 1;
        match lookup::resolve(&self.start, self.selector) {
            Some(target) => {
                self.cached = Some(Arc::clone(&target));
                activate::activate_method(universe, env, &target, args)
            }
            None => lookup::send_does_not_understand(universe, env, self.selector, args),
        }
    }
}
