use std::fmt::Display;

use ordered_float::OrderedFloat;

/// A literal constant as written in the source.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Value {
    Int(i32),
    Float(OrderedFloat<f32>),
    Bool(bool),
}

impl Value {
    /// The arithmetic negation, for folding `-` into numeric literals.
    pub fn negated(self) -> Option<Value> {
        match self {
            Value::Int(n) => n.checked_neg().map(Value::Int),
            Value::Float(n) => Some(Value::Float(-n)),
            Value::Bool(_) => None,
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}
impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(OrderedFloat(n))
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) if n.fract() == 0.0 => write!(f, "{:.1}", n.0),
            Self::Float(n) => write!(f, "{}", n.0),
            Self::Bool(b) => match b {
                true => f.write_str("true"),
                false => f.write_str("false"),
            },
        }
    }
}
