use std::rc::Rc;

use tracing::{trace, warn};

use super::{
    error::{EvalError, EvalResult},
    value::Value,
};
use crate::ast::FunctionDef;

/// What a name is bound to.
#[derive(Debug, PartialEq, Clone)]
pub enum Binding {
    Value(Value),
    Function(Rc<FunctionDef>),
}

/// A single frame. Entries keep insertion order; lookups see the newest
/// entry first.
#[derive(Debug, Default)]
struct Scope {
    entries: Vec<(String, Binding)>,
}

impl Scope {
    fn get(&self, name: &str) -> Option<&Binding> {
        self.entries
            .iter()
            .rev()
            .find(|(entry, _)| entry == name)
            .map(|(_, binding)| binding)
    }

    fn set(&mut self, name: &str, binding: Binding) {
        match self.entries.iter_mut().find(|(entry, _)| entry == name) {
            Some((_, existing)) => *existing = binding,
            None => self.entries.push((name.to_string(), binding)),
        }
    }
}

/// The scope chain: the global frame plus a stack of nested frames, each
/// parented to the one below it.
#[derive(Debug)]
pub struct Environment {
    global: Scope,
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            global: Scope::default(),
            scopes: Vec::new(),
        }
    }

    /// Number of live frames, the global frame included.
    pub fn depth(&self) -> usize {
        self.scopes.len() + 1
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
        trace!(depth = self.depth(), "pushed scope");
    }

    /// Drops the innermost frame and everything bound in it. The global
    /// frame is never popped; trying to returns `false`.
    pub fn pop_scope(&mut self) -> bool {
        if self.scopes.pop().is_none() {
            warn!("pop_scope called with only the global scope present");
            return false;
        }
        trace!(depth = self.depth(), "popped scope");
        true
    }

    /// Finds `name`, walking from the innermost frame outwards.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes
            .iter()
            .rev()
            .chain(std::iter::once(&self.global))
            .find_map(|scope| scope.get(name))
    }

    /// Binds `value` in the innermost frame, overwriting an entry of the same
    /// name in that frame only. A same-named entry further out is shadowed.
    pub fn bind(&mut self, name: &str, value: Value) {
        self.current_scope().set(name, Binding::Value(value));
    }

    pub fn bind_int(&mut self, name: &str, value: i32) {
        self.bind(name, Value::make_int(value));
    }

    pub fn bind_float(&mut self, name: &str, value: f32) {
        self.bind(name, Value::make_float(value));
    }

    pub fn bind_string(&mut self, name: &str, value: String) {
        self.bind(name, Value::String(value));
    }

    pub fn bind_bool(&mut self, name: &str, value: bool) {
        self.bind(name, Value::make_bool(value));
    }

    /// Registers a function in the innermost frame. Unlike variables,
    /// functions may not shadow or replace anything already reachable.
    pub fn bind_function(&mut self, name: &str, function: Rc<FunctionDef>) -> EvalResult<()> {
        if self.lookup(name).is_some() {
            return Err(EvalError::FunctionRedefinition(name.to_string()));
        }
        self.current_scope().set(name, Binding::Function(function));
        Ok(())
    }

    /// Names bound in the innermost frame, newest first.
    pub fn local_names(&self) -> Vec<&str> {
        self.scopes
            .last()
            .unwrap_or(&self.global)
            .entries
            .iter()
            .rev()
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn current_scope(&mut self) -> &mut Scope {
        self.scopes.last_mut().unwrap_or(&mut self.global)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
