use std::fmt::{self, Display};

#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Bool(bool),
    Nil,
    Number(f64),
    Text(String),
}

impl Value {
    /// Same-kind structural equality; values of different kinds are never equal.
    pub(crate) fn is_equal(&self, other: &Value) -> bool {
        self == other
    }

    pub(crate) fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Nil)
    }

    pub(crate) fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    /// The tag a binding takes on when this value is assigned to it.
    pub(crate) fn var_type(&self) -> VarType {
        match self {
            Value::Bool(_) => VarType::Bool,
            Value::Nil => VarType::Untyped,
            Value::Number(_) => VarType::Number,
            Value::Text(_) => VarType::Text,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Value::*;
        match self {
            Bool(b) => write!(f, "{}", b),
            Nil => write!(f, "nil"),
            Number(n) => write!(f, "{}", n),
            Text(s) => write!(f, "{}", s),
        }
    }
}

/// Type tag stored next to every binding; decides how `read` coerces input.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum VarType {
    Text,
    Number,
    Bool,
    Untyped,
}

/// The keyword a declaration was introduced with.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DeclKind {
    Int,
    Real,
    Str,
}

impl DeclKind {
    pub(crate) fn var_type(self) -> VarType {
        match self {
            DeclKind::Int | DeclKind::Real => VarType::Number,
            DeclKind::Str => VarType::Text,
        }
    }
}

impl Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclKind::Int => write!(f, "int"),
            DeclKind::Real => write!(f, "real"),
            DeclKind::Str => write!(f, "string"),
        }
    }
}
