//! The universe: interner, core classes, well-known selectors, options

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::class::Class;
use crate::error::{CallResult, RuntimeError};
use crate::frame::Activation;
use crate::instance::Instance;
use crate::meta::MetaObject;
use crate::method::Method;
use crate::symbol::{selector_arity, Interner, Symbol};
use crate::value::Value;

/// Default bound for inline caches before they collapse to the generic state
pub const DEFAULT_INLINE_CACHE_LIMIT: usize = 6;

/// Tuning knobs for the dispatch core
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Entry bound for message-send inline caches
    pub send_cache_limit: usize,
    /// Entry bound for interception-side caches (gates, reflective caches)
    pub reflect_cache_limit: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            send_cache_limit: DEFAULT_INLINE_CACHE_LIMIT,
            reflect_cache_limit: DEFAULT_INLINE_CACHE_LIMIT,
        }
    }
}

/// Well-known selectors, interned once at bootstrap
#[derive(Debug, Clone, Copy)]
pub struct Selectors {
    /// `doesNotUnderstand:arguments:`
    pub does_not_understand: Symbol,
    /// `escapedBlock:`
    pub escaped_block: Symbol,
    /// Block evaluation selectors, indexed by block parameter count
    pub block_value: [Symbol; 3],
}

/// Classes every universe starts with
#[derive(Debug)]
pub struct CoreClasses {
    /// Root of the class hierarchy
    pub object: Arc<Class>,
    /// Class of class values
    pub class: Arc<Class>,
    /// Class of `nil`
    pub nil: Arc<Class>,
    /// Class of booleans
    pub boolean: Arc<Class>,
    /// Class of integers
    pub integer: Arc<Class>,
    /// Class of doubles
    pub double: Arc<Class>,
    /// Class of strings
    pub string: Arc<Class>,
    /// Class of symbols
    pub symbol: Arc<Class>,
    /// Class of arrays
    pub array: Arc<Class>,
    /// Class of blocks; carries the `value` evaluation primitives
    pub block: Arc<Class>,
    /// Class of method values
    pub method: Arc<Class>,
}

/// The runtime universe.
///
/// Owns the interner, the core classes, the dispatch options, and the meta
/// generation counter. Meta-object installation goes through the universe
/// so that generation-stamped caches notice the change.
#[derive(Debug)]
pub struct Universe {
    interner: Interner,
    core: CoreClasses,
    selectors: Selectors,
    options: DispatchOptions,
    meta_generation: AtomicU64,
}

impl Universe {
    /// Universe with default options
    pub fn new() -> Self {
        Self::with_options(DispatchOptions::default())
    }

    /// Universe with explicit options
    pub fn with_options(options: DispatchOptions) -> Self {
        let interner = Interner::new();
        let selectors = Selectors {
            does_not_understand: interner.intern("doesNotUnderstand:arguments:"),
            escaped_block: interner.intern("escapedBlock:"),
            block_value: [
                interner.intern("value"),
                interner.intern("value:"),
                interner.intern("value:with:"),
            ],
        };

        let object = Class::new("Object", None, 0);
        let core = CoreClasses {
            class: Class::new("Class", Some(Arc::clone(&object)), 0),
            nil: Class::new("Nil", Some(Arc::clone(&object)), 0),
            boolean: Class::new("Boolean", Some(Arc::clone(&object)), 0),
            integer: Class::new("Integer", Some(Arc::clone(&object)), 0),
            double: Class::new("Double", Some(Arc::clone(&object)), 0),
            string: Class::new("String", Some(Arc::clone(&object)), 0),
            symbol: Class::new("Symbol", Some(Arc::clone(&object)), 0),
            array: Class::new("Array", Some(Arc::clone(&object)), 0),
            block: Class::new("Block", Some(Arc::clone(&object)), 0),
            method: Class::new("Method", Some(Arc::clone(&object)), 0),
            object,
        };

        // Block evaluation goes through ordinary dispatch: install the
        // value-family primitives on the Block class.
        for selector in selectors.block_value {
            let name = interner
                .name(selector)
                .unwrap_or_else(|| Arc::from("value"));
            let method = Method::from_fn(selector, selector_arity(&name), block_value_primitive);
            core.block.install_method(method);
        }

        Self {
            interner,
            core,
            selectors,
            options,
            meta_generation: AtomicU64::new(0),
        }
    }

    /// Intern a selector name
    pub fn intern(&self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    /// Printable name of a symbol
    pub fn symbol_name(&self, symbol: Symbol) -> String {
        match self.interner.name(symbol) {
            Some(name) => name.to_string(),
            None => format!("<sym{}>", symbol.index()),
        }
    }

    /// Core classes
    pub fn core(&self) -> &CoreClasses {
        &self.core
    }

    /// Well-known selectors
    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    /// Dispatch options
    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Class of a value
    pub fn class_of(&self, value: &Value) -> Arc<Class> {
        match value {
            Value::Nil => Arc::clone(&self.core.nil),
            Value::Boolean(_) => Arc::clone(&self.core.boolean),
            Value::Integer(_) => Arc::clone(&self.core.integer),
            Value::Double(_) => Arc::clone(&self.core.double),
            Value::Symbol(_) => Arc::clone(&self.core.symbol),
            Value::String(_) => Arc::clone(&self.core.string),
            Value::Array(_) => Arc::clone(&self.core.array),
            Value::Object(instance) => Arc::clone(instance.class()),
            Value::Class(_) => Arc::clone(&self.core.class),
            Value::Method(_) => Arc::clone(&self.core.method),
            Value::Block(_) => Arc::clone(&self.core.block),
        }
    }

    /// Create a class; `None` means subclass of `Object`
    pub fn new_class(
        &self,
        name: &str,
        superclass: Option<&Arc<Class>>,
        field_count: usize,
    ) -> Arc<Class> {
        let superclass = superclass.unwrap_or(&self.core.object);
        Class::new(name, Some(Arc::clone(superclass)), field_count)
    }

    /// Current meta generation.
    ///
    /// Bumped on every meta-object install or clear; generation-stamped
    /// caches self-clear when they observe a newer value.
    pub fn meta_generation(&self) -> u64 {
        self.meta_generation.load(Ordering::Relaxed)
    }

    fn bump_meta_generation(&self) {
        self.meta_generation.fetch_add(1, Ordering::Relaxed);
    }

    /// Install a class-level meta-object
    pub fn install_class_meta(&self, class: &Arc<Class>, meta: Arc<MetaObject>) {
        class.set_meta_object(Some(meta));
        self.bump_meta_generation();
    }

    /// Remove the class-level meta-object
    pub fn clear_class_meta(&self, class: &Arc<Class>) {
        class.set_meta_object(None);
        self.bump_meta_generation();
    }

    /// Install a per-instance meta-object; takes precedence over the class one
    pub fn install_instance_meta(&self, instance: &Arc<Instance>, meta: Arc<MetaObject>) {
        instance.set_meta_object(Some(meta));
        self.bump_meta_generation();
    }

    /// Remove the per-instance meta-object
    pub fn clear_instance_meta(&self, instance: &Arc<Instance>) {
        instance.set_meta_object(None);
        self.bump_meta_generation();
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

// Shared body of `value`, `value:`, and `value:with:`. The receiver is the
// block; arity checking happens in `Block::invoke`.
fn block_value_primitive(activation: &Activation<'_>) -> CallResult {
    match activation.receiver() {
        Value::Block(block) => {
            block.invoke(activation.universe(), activation.env(), activation.args())
        }
        other => Err(RuntimeError::TypeError(format!(
            "value sent to a {}",
            other.type_name()
        ))
        .into()),
    }
}
