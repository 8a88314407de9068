//! Interned selectors

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Interned selector identifier.
///
/// Symbols are compared by index; two symbols interned from the same
/// `Interner` are equal exactly when their names are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Index into the owning interner's name table
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Number of arguments a selector takes, receiver excluded.
///
/// Follows the Smalltalk signature convention: a selector starting with a
/// non-alphabetic character is binary (one argument), otherwise the argument
/// count is the number of colons (`value:with:` takes two, `size` takes
/// none).
pub fn selector_arity(name: &str) -> usize {
    match name.chars().next() {
        None => 0,
        Some(first) if !first.is_alphanumeric() && first != '_' && first != ':' => 1,
        Some(_) => name.matches(':').count(),
    }
}

#[derive(Debug, Default)]
struct InternerInner {
    names: Vec<Arc<str>>,
    table: FxHashMap<Arc<str>, Symbol>,
}

/// Selector interner.
///
/// Thread-safe; `intern` is idempotent and the returned `Symbol` is stable
/// for the interner's lifetime.
#[derive(Debug, Default)]
pub struct Interner {
    inner: RwLock<InternerInner>,
}

impl Interner {
    /// Create an empty interner
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name`, returning its symbol
    pub fn intern(&self, name: &str) -> Symbol {
        if let Some(&symbol) = self.inner.read().table.get(name) {
            return symbol;
        }
        let mut inner = self.inner.write();
        // Re-check under the write lock; another thread may have won
        if let Some(&symbol) = inner.table.get(name) {
            return symbol;
        }
        let symbol = Symbol(inner.names.len() as u32);
        let shared: Arc<str> = Arc::from(name);
        inner.names.push(Arc::clone(&shared));
        inner.table.insert(shared, symbol);
        symbol
    }

    /// Name of a previously interned symbol
    pub fn name(&self, symbol: Symbol) -> Option<Arc<str>> {
        self.inner.read().names.get(symbol.index() as usize).cloned()
    }

    /// Number of interned symbols
    pub fn len(&self) -> usize {
        self.inner.read().names.len()
    }

    /// Whether nothing has been interned yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
