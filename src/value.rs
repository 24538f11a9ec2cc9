use std::fmt;

use crate::expr::{Expr, Type};
use crate::interpreter;
use crate::units::UnitTable;

/// Runtime values. Units are not carried: dimensional correctness was proven
/// before execution, so arithmetic works on magnitudes only.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Void,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::Void => write!(f, "void"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ValueType {
    Int,
    Float,
    Bool,
    String,
    Void,
}

pub fn type_of(value: &Value) -> ValueType {
    match value {
        Value::Int(_) => ValueType::Int,
        Value::Float(_) => ValueType::Float,
        Value::Bool(_) => ValueType::Bool,
        Value::String(_) => ValueType::String,
        Value::Void => ValueType::Void,
    }
}

/// Static typing rule of a built-in: given the declared units and the
/// argument types (and expressions, for literal exponents), the result type,
/// or `None` when the call is not permitted.
pub type Signature = fn(&UnitTable, &[Type], &[Expr]) -> Option<Type>;

#[derive(Clone, Debug)]
pub struct NativeFunction {
    pub arity: usize,
    pub name: &'static str,
    pub signature: Signature,
    pub func: fn(&mut interpreter::Interpreter, &[Value]) -> Result<Value, String>,
}
