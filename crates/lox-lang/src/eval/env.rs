use std::{cell::RefCell, rc::Rc};

use rustc_hash::{FxBuildHasher, FxHashMap};
use thiserror::Error;

use super::error::EvalError;
use super::runtime_value::RuntimeValue;
use crate::ast::node::Ident;

#[derive(Error, Debug, PartialEq)]
pub enum EnvError {
    #[error("Undefined variable \"{0}\"")]
    Undefined(Ident),
}

impl EnvError {
    pub fn to_eval_error(&self) -> EvalError {
        match self {
            EnvError::Undefined(ident) => EvalError::UndefinedVariable(ident.name.clone()),
        }
    }
}

/// One frame of the lexical scope chain. The parent is shared, not owned:
/// a closure captured in this frame may keep the parent alive after the
/// block or call that created it has finished.
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: FxHashMap<Ident, RuntimeValue>,
    access_counts: FxHashMap<Ident, usize>,
    parent: Option<Rc<RefCell<Env>>>,
}

impl Env {
    pub fn with_parent(parent: Rc<RefCell<Env>>) -> Self {
        Self {
            bindings: FxHashMap::with_capacity_and_hasher(8, FxBuildHasher),
            access_counts: FxHashMap::default(),
            parent: Some(parent),
        }
    }

    /// Inserts or overwrites `ident` in this frame only. Redefinition in an
    /// inner frame never touches an outer frame.
    #[inline(always)]
    pub fn define(&mut self, ident: Ident, value: RuntimeValue) {
        self.bindings.insert(ident, value);
    }

    /// Searches this frame then the parent chain; the first frame holding
    /// `ident` has its access counter incremented and yields the value.
    pub fn resolve(&mut self, ident: &Ident) -> Result<RuntimeValue, EnvError> {
        match self.bindings.get(ident) {
            Some(value) => {
                let value = value.clone();
                *self.access_counts.entry(ident.clone()).or_insert(0) += 1;
                Ok(value)
            }
            None => match &self.parent {
                Some(parent) => parent.borrow_mut().resolve(ident),
                None => Err(EnvError::Undefined(ident.clone())),
            },
        }
    }

    /// Updates `ident` in the frame where it is already bound. Assignment
    /// never implicitly creates a binding.
    pub fn assign(&mut self, ident: &Ident, value: RuntimeValue) -> Result<(), EnvError> {
        if self.bindings.contains_key(ident) {
            self.bindings.insert(ident.clone(), value);
            Ok(())
        } else {
            match &self.parent {
                Some(parent) => parent.borrow_mut().assign(ident, value),
                None => Err(EnvError::Undefined(ident.clone())),
            }
        }
    }

    /// Returns `true` if `ident` is bound anywhere in the chain.
    pub fn contains(&self, ident: &Ident) -> bool {
        self.bindings.contains_key(ident)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.borrow().contains(ident))
    }

    /// Number of successful reads of `ident` served by this frame.
    pub fn access_count(&self, ident: &Ident) -> usize {
        self.access_counts.get(ident).copied().unwrap_or(0)
    }
}
