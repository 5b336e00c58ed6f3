mod error;

pub use error::ValueError;

use compact_str::{format_compact, CompactString};

/// A runtime value. Every expression node caches one of these after
/// evaluation; `None` is both the initial state and the "empty" value the
/// language exposes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    None,
    Number(f64),
    String(CompactString),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    None,
    Number,
    String,
    Bool,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::None => write!(f, "empty"),
            ValueKind::Number => write!(f, "number"),
            ValueKind::String => write!(f, "string"),
            ValueKind::Bool => write!(f, "boolean"),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::Number(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::None => ValueKind::None,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Bool(_) => ValueKind::Bool,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Truthiness for conditions: booleans are themselves, numbers are true
    /// when non-zero, everything else is false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(v) => *v,
            Value::Number(v) => *v != 0.0,
            _ => false,
        }
    }

    /// Equality across kinds: equal iff same kind and same payload.
    pub fn is_equal(&self, other: &Value) -> bool {
        self == other
    }

    /// Addition never faults: two numbers sum, any other pair concatenates
    /// the display strings.
    pub fn add(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs + rhs)),
            _ => Ok(Value::String(format_compact!("{self}{other}"))),
        }
    }

    pub fn subtract(&self, other: &Value) -> Result<Value, ValueError> {
        self.numeric_pair(other).map(|(a, b)| Value::Number(a - b))
    }

    pub fn multiply(&self, other: &Value) -> Result<Value, ValueError> {
        self.numeric_pair(other).map(|(a, b)| Value::Number(a * b))
    }

    pub fn divide(&self, other: &Value) -> Result<Value, ValueError> {
        self.numeric_pair(other).map(|(a, b)| Value::Number(a / b))
    }

    pub fn power(&self, other: &Value) -> Result<Value, ValueError> {
        self.numeric_pair(other)
            .map(|(a, b)| Value::Number(a.powf(b)))
    }

    pub fn less_than(&self, other: &Value) -> Result<Value, ValueError> {
        self.numeric_pair(other).map(|(a, b)| Value::Bool(a < b))
    }

    pub fn less_than_or_equal(&self, other: &Value) -> Result<Value, ValueError> {
        self.numeric_pair(other).map(|(a, b)| Value::Bool(a <= b))
    }

    pub fn greater_than(&self, other: &Value) -> Result<Value, ValueError> {
        self.numeric_pair(other).map(|(a, b)| Value::Bool(a > b))
    }

    pub fn greater_than_or_equal(&self, other: &Value) -> Result<Value, ValueError> {
        self.numeric_pair(other).map(|(a, b)| Value::Bool(a >= b))
    }

    pub fn and(&self, other: &Value) -> Result<Value, ValueError> {
        self.boolean_pair(other).map(|(a, b)| Value::Bool(a && b))
    }

    pub fn or(&self, other: &Value) -> Result<Value, ValueError> {
        self.boolean_pair(other).map(|(a, b)| Value::Bool(a || b))
    }

    pub fn not(&self) -> Result<Value, ValueError> {
        match self {
            Value::Bool(v) => Ok(Value::Bool(!v)),
            _ => Err(ValueError::NonBooleanOperand(self.kind())),
        }
    }

    fn numeric_pair(&self, other: &Value) -> Result<(f64, f64), ValueError> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok((*lhs, *rhs)),
            _ => Err(ValueError::NonNumericOperands(self.kind(), other.kind())),
        }
    }

    fn boolean_pair(&self, other: &Value) -> Result<(bool, bool), ValueError> {
        match (self, other) {
            (Value::Bool(lhs), Value::Bool(rhs)) => Ok((*lhs, *rhs)),
            _ => Err(ValueError::NonBooleanOperands(self.kind(), other.kind())),
        }
    }
}
