//! Execution levels and the call environment

use crate::value::Value;

/// Level a piece of code executes at.
///
/// Meta-level code (interception handlers) runs with interception disabled,
/// which is what keeps the meta-object protocol from recursing into itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionLevel {
    /// Ordinary application code
    Base,
    /// Interception handler code
    Meta,
}

/// Call environment threaded explicitly down every call edge.
///
/// Carries the execution level plus an opaque `environment` value that is
/// handed through to interception handlers unchanged. Never stored in
/// global or thread-local state.
#[derive(Debug, Clone)]
pub struct CallEnv {
    level: ExecutionLevel,
    environment: Value,
}

impl CallEnv {
    /// Base-level environment with a nil environment value
    pub fn base() -> Self {
        Self {
            level: ExecutionLevel::Base,
            environment: Value::Nil,
        }
    }

    /// Base-level environment carrying `environment`
    pub fn with_environment(environment: Value) -> Self {
        Self {
            level: ExecutionLevel::Base,
            environment,
        }
    }

    /// Current execution level
    pub fn level(&self) -> ExecutionLevel {
        self.level
    }

    /// Opaque environment value
    pub fn environment(&self) -> &Value {
        &self.environment
    }

    /// Whether this is the meta level
    pub fn is_meta(&self) -> bool {
        self.level == ExecutionLevel::Meta
    }

    /// Same environment value, meta level
    pub fn meta_of(&self) -> CallEnv {
        CallEnv {
            level: ExecutionLevel::Meta,
            environment: self.environment.clone(),
        }
    }

    /// Same environment value, base level
    pub fn base_of(&self) -> CallEnv {
        CallEnv {
            level: ExecutionLevel::Base,
            environment: self.environment.clone(),
        }
    }
}

impl Default for CallEnv {
    fn default() -> Self {
        Self::base()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_transitions_preserve_environment() {
        let env = CallEnv::with_environment(Value::Integer(9));
        assert_eq!(env.level(), ExecutionLevel::Base);
        assert!(!env.is_meta());

        let meta = env.meta_of();
        assert!(meta.is_meta());
        assert_eq!(meta.environment(), &Value::Integer(9));

        let back = meta.base_of();
        assert_eq!(back.level(), ExecutionLevel::Base);
        assert_eq!(back.environment(), &Value::Integer(9));
    }
}
