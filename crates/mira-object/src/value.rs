//! Runtime values

use std::sync::Arc;

use parking_lot::RwLock;

use crate::block::Block;
use crate::class::Class;
use crate::error::RuntimeError;
use crate::instance::Instance;
use crate::method::Method;
use crate::symbol::Symbol;

/// Array object with shared, mutable storage
#[derive(Debug)]
pub struct ArrayObj {
    elements: RwLock<Vec<Value>>,
}

impl ArrayObj {
    /// Create an array of `len` nil slots
    pub fn new(len: usize) -> Self {
        Self {
            elements: RwLock::new(vec![Value::Nil; len]),
        }
    }

    /// Create an array from existing values
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            elements: RwLock::new(values),
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.elements.read().len()
    }

    /// Whether the array has no elements
    pub fn is_empty(&self) -> bool {
        self.elements.read().is_empty()
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<Value> {
        self.elements.read().get(index).cloned()
    }

    /// Replace the element at `index`
    pub fn set(&self, index: usize, value: Value) -> Result<(), RuntimeError> {
        let mut elements = self.elements.write();
        let len = elements.len();
        match elements.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::IndexOutOfBounds { index, len }),
        }
    }

    /// Snapshot of the current elements
    pub fn to_vec(&self) -> Vec<Value> {
        self.elements.read().clone()
    }
}

/// A runtime value.
///
/// Primitive kinds compare structurally; heap kinds (arrays, instances,
/// classes, methods, blocks) compare by identity.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value
    Nil,
    /// Boolean
    Boolean(bool),
    /// Signed integer
    Integer(i64),
    /// Floating point number
    Double(f64),
    /// Interned selector
    Symbol(Symbol),
    /// Immutable string
    String(Arc<str>),
    /// Array object
    Array(Arc<ArrayObj>),
    /// Instance of a user class
    Object(Arc<Instance>),
    /// Class reference
    Class(Arc<Class>),
    /// Method reference
    Method(Arc<Method>),
    /// Block closure
    Block(Arc<Block>),
}

impl Value {
    /// Build an array value from `values`
    pub fn array(values: Vec<Value>) -> Value {
        Value::Array(Arc::new(ArrayObj::from_values(values)))
    }

    /// Build a string value
    pub fn string(s: impl Into<Arc<str>>) -> Value {
        Value::String(s.into())
    }

    /// Whether this is `Nil`
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Boolean payload, if any
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer payload, if any
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Double payload, if any
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Symbol payload, if any
    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Value::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    /// Array payload, if any
    pub fn as_array(&self) -> Option<&Arc<ArrayObj>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Instance payload, if any
    pub fn as_object(&self) -> Option<&Arc<Instance>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Class payload, if any
    pub fn as_class(&self) -> Option<&Arc<Class>> {
        match self {
            Value::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Method payload, if any
    pub fn as_method(&self) -> Option<&Arc<Method>> {
        match self {
            Value::Method(m) => Some(m),
            _ => None,
        }
    }

    /// Block payload, if any
    pub fn as_block(&self) -> Option<&Arc<Block>> {
        match self {
            Value::Block(b) => Some(b),
            _ => None,
        }
    }

    /// Kind name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Double(_) => "Double",
            Value::Symbol(_) => "Symbol",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
            Value::Class(_) => "Class",
            Value::Method(_) => "Method",
            Value::Block(_) => "Block",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Arc::ptr_eq(a, b),
            (Value::Method(a), Value::Method(b)) => Arc::ptr_eq(a, b),
            (Value::Block(a), Value::Block(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
