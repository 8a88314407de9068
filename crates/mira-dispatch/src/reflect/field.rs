//! Field-access interception

use std::sync::Arc;

use mira_object::{
    CallEnv, CallResult, Instance, MetaOperation, Method, RuntimeError, Universe, Unwind, Value,
};

use crate::gate::SemanticSite;
use crate::reflect::call_meta;
use crate::send::SiteStats;

fn instance_of(value: &Value) -> Result<&Arc<Instance>, Unwind> {
    match value {
        Value::Object(instance) => Ok(instance),
        other => Err(RuntimeError::NotAnInstance {
            got: other.type_name(),
        }
        .into()),
    }
}

/// A field-read site for one slot index.
///
/// When a field-read handler applies it runs with `(receiver, index)` and
/// its result replaces the slot value. The site caches the bound handler
/// by identity only; there is no receiver-class guard on this path.
pub struct FieldReadSite {
    index: usize,
    gate: SemanticSite,
    bound: Option<Arc<Method>>,
    stats: SiteStats,
}

impl FieldReadSite {
    /// Read site for slot `index`
    pub fn new(index: usize) -> Self {
        Self {
            index,
            gate: SemanticSite::new(MetaOperation::FieldRead),
            bound: None,
            stats: SiteStats::default(),
        }
    }

    /// Slot index this site reads
    pub fn index(&self) -> usize {
        self.index
    }

    /// Hit/miss counters for the handler binding
    pub fn stats(&self) -> SiteStats {
        self.stats
    }

    /// Read the slot, or run the applicable handler
    pub fn read(&mut self, universe: &Universe, env: &CallEnv, receiver: &Value) -> CallResult {
        if let Some(handler) = self.gate.check(universe, env, receiver) {
            self.rebind(&handler);
            let args = vec![receiver.clone(), Value::Integer(self.index as i64)];
            return call_meta(universe, env, &handler, args);
        }
        let instance = instance_of(receiver)?;
        Ok(instance.field(self.index)?)
    }

    fn rebind(&mut self, handler: &Arc<Method>) {
        match &self.bound {
            Some(current) if Arc::ptr_eq(current, handler) => self.stats.hits += 1,
            _ => {
                self.stats.misses += 1;
                self.bound = Some(Arc::clone(handler));
            }
        }
    }
}

/// A field-write site for one slot index.
///
/// When a field-write handler applies it runs with
/// `(receiver, index, value)` and its result becomes the operation's
/// result. The direct path stores the value and returns it.
pub struct FieldWriteSite {
    index: usize,
    gate: SemanticSite,
    bound: Option<Arc<Method>>,
    stats: SiteStats,
}

impl FieldWriteSite {
    /// Write site for slot `index`
    pub fn new(index: usize) -> Self {
        Self {
            index,
            gate: SemanticSite::new(MetaOperation::FieldWrite),
            bound: None,
            stats: SiteStats::default(),
        }
    }

    /// Slot index this site writes
    pub fn index(&self) -> usize {
        self.index
    }

    /// Hit/miss counters for the handler binding
    pub fn stats(&self) -> SiteStats {
        self.stats
    }

    /// Write the slot, or run the applicable handler
    pub fn write(
        &mut self,
        universe: &Universe,
        env: &CallEnv,
        receiver: &Value,
        value: Value,
    ) -> CallResult {
        if let Some(handler) = self.gate.check(universe, env, receiver) {
            self.rebind(&handler);
            let args = vec![
                receiver.clone(),
                Value::Integer(self.index as i64),
                value,
            ];
            return call_meta(universe, env, &handler, args);
        }
        let instance = instance_of(receiver)?;
        instance.set_field(self.index, value.clone())?;
        Ok(value)
    }

    fn rebind(&mut self, handler: &Arc<Method>) {
        match &self.bound {
            Some(current) if Arc::ptr_eq(current, handler) => self.stats.hits += 1,
            _ => {
                self.stats.misses += 1;
                self.bound = Some(Arc::clone(handler));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_read_and_write() {
        let universe = Universe::new();
        let env = CallEnv::base();
        let class = universe.new_class("Pair", None, 2);
        let receiver = Value::Object(Instance::new(&class));

        let mut write = FieldWriteSite::new(1);
        let mut read = FieldReadSite::new(1);

        // a write answers the written value
        let written = write
            .write(&universe, &env, &receiver, Value::Integer(8))
            .unwrap();
        assert_eq!(written, Value::Integer(8));
        assert_eq!(read.read(&universe, &env, &receiver).unwrap(), Value::Integer(8));
    }

    #[test]
    fn test_non_instance_receiver_is_rejected() {
        let universe = Universe::new();
        let env = CallEnv::base();
        let mut read = FieldReadSite::new(0);
        let result = read.read(&universe, &env, &Value::Integer(3));
        assert!(matches!(
            result,
            Err(Unwind::Error(RuntimeError::NotAnInstance { got: "Integer" }))
        ));
    }

    #[test]
    fn test_out_of_bounds_slot() {
        let universe = Universe::new();
        let env = CallEnv::base();
        let class = universe.new_class("Single", None, 1);
        let receiver = Value::Object(Instance::new(&class));
        let mut read = FieldReadSite::new(4);
        assert!(matches!(
            read.read(&universe, &env, &receiver),
            Err(Unwind::Error(RuntimeError::FieldIndexOutOfBounds {
                index: 4,
                count: 1
            }))
        ));
    }
}
