//! # Function Registry

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::value::Value;

use super::aggregate::{self, AGGREGATION_NAMES};
use super::errors::{FunctionError, FunctionResult};
use super::function::{Function, FunctionKind};
use super::scalar;

/// Built-ins by lowercase name
#[derive(Default)]
pub struct FunctionRegistry {
    functions: RwLock<HashMap<String, Arc<dyn Function>>>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Scalar catalog only. WHERE evaluates against this.
    pub fn scalar() -> Self {
        let registry = Self::new();
        let builtins: Vec<Arc<dyn Function>> = vec![
            Arc::new(scalar::Now),
            Arc::new(scalar::Cast),
            Arc::new(scalar::Int2Bin),
            Arc::new(scalar::Bin2Int),
            Arc::new(scalar::Ext),
            Arc::new(scalar::Dir),
            Arc::new(scalar::Base),
            Arc::new(scalar::Len),
            Arc::new(scalar::Floor),
            Arc::new(scalar::Ceil),
            Arc::new(scalar::Pow),
            Arc::new(scalar::Grep),
            Arc::new(scalar::Depth),
        ];
        registry.extend(builtins);
        registry
    }

    /// Scalar and aggregation catalog
    pub fn standard() -> Self {
        let registry = Self::scalar();
        let builtins: Vec<Arc<dyn Function>> = vec![
            Arc::new(aggregate::Count),
            Arc::new(aggregate::Min),
            Arc::new(aggregate::Max),
            Arc::new(aggregate::Product),
            Arc::new(aggregate::Sum),
            Arc::new(aggregate::Avg),
        ];
        registry.extend(builtins);
        registry
    }

    fn extend(&self, builtins: Vec<Arc<dyn Function>>) {
        if let Ok(mut functions) = self.functions.write() {
            for f in builtins {
                functions.insert(f.name().to_string(), f);
            }
        }
    }

    /// Names every aggregation function, registered or not
    pub fn aggregation_names() -> &'static [&'static str] {
        AGGREGATION_NAMES
    }

    /// Register a function
    pub fn register(&self, function: Arc<dyn Function>) -> FunctionResult<()> {
        let name = function.name().to_ascii_lowercase();
        let mut functions = self
            .functions
            .write()
            .map_err(|_| FunctionError::Internal("Lock poisoned".into()))?;
        if functions.contains_key(&name) {
            return Err(FunctionError::AlreadyExists(name));
        }
        functions.insert(name, function);
        Ok(())
    }

    /// Get function by name, ignoring case
    pub fn get(&self, name: &str) -> FunctionResult<Arc<dyn Function>> {
        let functions = self
            .functions
            .read()
            .map_err(|_| FunctionError::Internal("Lock poisoned".into()))?;
        functions
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| FunctionError::NotFound(name.to_string()))
    }

    /// Kind of the named function, if registered
    pub fn kind_of(&self, name: &str) -> Option<FunctionKind> {
        self.get(name).ok().map(|f| f.kind())
    }

    /// Look up and call
    pub fn call(&self, name: &str, args: &[Value]) -> FunctionResult<Value> {
        self.get(name)?.call(args)
    }

    /// Sorted names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .functions
            .read()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Get function count
    pub fn len(&self) -> usize {
        self.functions.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// True if `name` is an aggregation function name, ignoring case
pub fn is_aggregation_name(name: &str) -> bool {
    AGGREGATION_NAMES
        .iter()
        .any(|n| n.eq_ignore_ascii_case(name))
}
