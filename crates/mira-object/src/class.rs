//! Classes and method tables

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::meta::MetaObject;
use crate::method::Method;
use crate::symbol::Symbol;

/// A class: name, superclass link, method table, and instance layout size.
///
/// Classes are identity objects; hold them behind `Arc` and compare with
/// `Arc::ptr_eq`. Redefining a selector installs a fresh `Arc<Method>` and
/// never mutates the old one, so cached method references stay valid as
/// values even when stale.
pub struct Class {
    name: String,
    superclass: Option<Arc<Class>>,
    field_count: usize,
    methods: RwLock<FxHashMap<Symbol, Arc<Method>>>,
    meta: RwLock<Option<Arc<MetaObject>>>,
}

impl Class {
    /// Create a class with `field_count` instance slots
    pub fn new(
        name: impl Into<String>,
        superclass: Option<Arc<Class>>,
        field_count: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            superclass,
            field_count,
            methods: RwLock::new(FxHashMap::default()),
            meta: RwLock::new(None),
        })
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Superclass link, `None` for the root
    pub fn superclass(&self) -> Option<&Arc<Class>> {
        self.superclass.as_ref()
    }

    /// Number of instance field slots
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Install (or redefine) a method under its selector.
    ///
    /// The first class a method is installed in becomes its holder.
    pub fn install_method(self: &Arc<Self>, method: Arc<Method>) {
        method.bind_holder(self);
        self.methods.write().insert(method.selector(), method);
    }

    /// Method defined directly on this class, superclasses not consulted
    pub fn local_method(&self, selector: Symbol) -> Option<Arc<Method>> {
        self.methods.read().get(&selector).cloned()
    }

    /// Number of locally defined methods
    pub fn method_count(&self) -> usize {
        self.methods.read().len()
    }

    /// Currently installed meta-object, if any
    pub fn meta_object(&self) -> Option<Arc<MetaObject>> {
        self.meta.read().clone()
    }

    // Installation goes through Universe so the meta generation is bumped.
    pub(crate) fn set_meta_object(&self, meta: Option<Arc<MetaObject>>) {
        *self.meta.write() = meta;
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("field_count", &self.field_count)
            .finish()
    }
}
