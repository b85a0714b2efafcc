//! # Environment
//!
//! Name bindings seen by the evaluator. A binding is a scalar, an
//! unevaluated expression that is replaced by its value on first read, or
//! a column holding one value per member row.
//!
//! Aliases are a single hop: `alias("a", "b")` makes reads and writes of `a`
//! go to `b`, and aliasing `b` to something else afterwards does not affect
//! `a`.
//!
//! `Clone` is shallow. Columns and lazy expressions are shared behind `Arc`,
//! so each pipeline stage can clone a base environment per item cheaply.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::Expr;
use crate::value::Value;

/// A bound name
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Scalar(Value),
    Lazy(Arc<Expr>),
    Column(Arc<[Value]>),
}

impl Binding {
    pub fn kind(&self) -> &'static str {
        match self {
            Binding::Scalar(_) => "scalar",
            Binding::Lazy(_) => "lazy",
            Binding::Column(_) => "column",
        }
    }
}

/// Binding table plus one-hop alias table
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: HashMap<String, Binding>,
    aliases: HashMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    fn key<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Looks up `name` through at most one alias hop
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(self.key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Binds `name`, writing through its alias if it has one
    pub fn set(&mut self, name: &str, binding: Binding) {
        let key = self.key(name).to_string();
        self.bindings.insert(key, binding);
    }

    pub fn set_value(&mut self, name: &str, value: Value) {
        self.set(name, Binding::Scalar(value));
    }

    pub fn set_lazy(&mut self, name: &str, expr: Expr) {
        self.set(name, Binding::Lazy(Arc::new(expr)));
    }

    pub fn set_column(&mut self, name: &str, values: impl Into<Arc<[Value]>>) {
        self.set(name, Binding::Column(values.into()));
    }

    /// Removes and returns the binding for `name`, honouring its alias
    pub fn take(&mut self, name: &str) -> Option<Binding> {
        let key = self.key(name).to_string();
        self.bindings.remove(&key)
    }

    /// Makes `name` refer to `target`
    pub fn alias(&mut self, name: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(name.into(), target.into());
    }

    /// Number of bindings, aliases excluded
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
