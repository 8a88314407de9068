//! Class instances with indexed field slots

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::class::Class;
use crate::error::RuntimeError;
use crate::meta::MetaObject;
use crate::value::Value;

/// An instance: a class reference plus `field_count` indexed slots.
///
/// An instance may carry its own meta-object; when present it takes
/// precedence over the class-level one.
pub struct Instance {
    class: Arc<Class>,
    fields: RwLock<Vec<Value>>,
    meta: RwLock<Option<Arc<MetaObject>>>,
}

impl Instance {
    /// Allocate an instance with nil-initialized fields
    pub fn new(class: &Arc<Class>) -> Arc<Self> {
        Arc::new(Self {
            class: Arc::clone(class),
            fields: RwLock::new(vec![Value::Nil; class.field_count()]),
            meta: RwLock::new(None),
        })
    }

    /// The instance's class
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Number of field slots
    pub fn field_count(&self) -> usize {
        self.fields.read().len()
    }

    /// Read the field at `index`
    pub fn field(&self, index: usize) -> Result<Value, RuntimeError> {
        let fields = self.fields.read();
        let count = fields.len();
        fields
            .get(index)
            .cloned()
            .ok_or(RuntimeError::FieldIndexOutOfBounds { index, count })
    }

    /// Write the field at `index`
    pub fn set_field(&self, index: usize, value: Value) -> Result<(), RuntimeError> {
        let mut fields = self.fields.write();
        let count = fields.len();
        match fields.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::FieldIndexOutOfBounds { index, count }),
        }
    }

    /// Per-instance meta-object, if installed
    pub fn meta_object(&self) -> Option<Arc<MetaObject>> {
        self.meta.read().clone()
    }

    // Installation goes through Universe so the meta generation is bumped.
    pub(crate) fn set_meta_object(&self, meta: Option<Arc<MetaObject>>) {
        *self.meta.write() = meta;
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.class.name())
    }
}
