use std::collections::HashMap;

use tracing::trace;

use crate::{
    error::{Error, Result, RuntimeError},
    token::Token,
    value::{Value, VarType},
};

#[derive(Clone, Debug, PartialEq)]
struct Binding {
    value: Value,
    ty: VarType,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Scope {
    values: HashMap<String, Binding>,
}

/// Position in the scope stack to return to once a block is finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ScopeMarker(usize);

/// A stack of scopes, innermost last. The first scope is the global one and is
/// never discarded.
#[derive(Debug)]
pub(crate) struct EnvironmentManager {
    scopes: Vec<Scope>,
}

impl EnvironmentManager {
    pub(crate) fn new() -> Self {
        EnvironmentManager { scopes: vec![Scope::default()] }
    }

    pub(crate) fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub(crate) fn create_child(&mut self) -> ScopeMarker {
        let marker = ScopeMarker(self.scopes.len());
        self.scopes.push(Scope::default());
        trace!(depth = self.depth(), "entered scope");
        marker
    }

    pub(crate) fn discard_until(&mut self, marker: ScopeMarker) {
        let keep = marker.0.max(1);
        if self.scopes.len() > keep {
            self.scopes.truncate(keep);
            trace!(depth = self.depth(), "left scope");
        }
    }

    pub(crate) fn define<S: Into<String>>(&mut self, name: S, value: Value, ty: VarType) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.values.insert(name.into(), Binding { value, ty });
        }
    }

    pub(crate) fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        let binding = self.lookup_mut(name)?;
        binding.ty = value.var_type();
        binding.value = value;
        Ok(())
    }

    pub(crate) fn get(&self, name: &Token) -> Result<Value> {
        match &self.lookup(name)?.value {
            Value::Nil => Err(Error::runtime(
                name.clone(),
                RuntimeError::UninitializedVariable(name.lexeme.clone()),
            )),
            value => Ok(value.clone()),
        }
    }

    pub(crate) fn get_type(&self, name: &Token) -> Result<VarType> {
        self.lookup(name).map(|b| b.ty)
    }

    fn lookup(&self, name: &Token) -> Result<&Binding> {
        self.scopes.iter()
            .rev()
            .find_map(|s| s.values.get(&name.lexeme))
            .ok_or_else(|| undefined_var_error(name))
    }

    fn lookup_mut(&mut self, name: &Token) -> Result<&mut Binding> {
        self.scopes.iter_mut()
            .rev()
            .find_map(|s| s.values.get_mut(&name.lexeme))
            .ok_or_else(|| undefined_var_error(name))
    }
}

fn undefined_var_error(name: &Token) -> Error {
    Error::runtime(
        name.clone(),
        RuntimeError::UndefinedVariable(name.lexeme.clone()),
    )
}
