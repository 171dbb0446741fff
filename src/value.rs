use crate::registry::RuleSetBuilder;

/// Scalar property value as seen by the validation engine.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, or text that is empty / whitespace-only.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// What reading one property yields: a scalar, or an owned sub-object slot.
/// `Object(None)` is an absent sub-object (the slot exists, nothing is in it).
pub enum Field<'a> {
    Value(Value),
    Object(Option<&'a dyn Validatable>),
}

/// An instance the engine can validate.
///
/// `field` reads a property by name (never mutating); `field_names` is the
/// declared shape used for discovery-time path checks; `configure` is the
/// one-time registration hook where a type declares its rules and custom
/// handlers (run once per type, cached by [`crate::MetadataRegistry`]).
pub trait Validatable {
    fn type_name(&self) -> &str;

    fn field_names(&self) -> Vec<&str>;

    fn field(&self, name: &str) -> Option<Field<'_>>;

    fn configure(&self, rules: &mut RuleSetBuilder) {
        let _ = rules;
    }
}

/// Identifies a property by name and declaring type. Resolved once at
/// discovery and reused for every evaluation of that property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub declaring_type: String,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, declaring_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaring_type: declaring_type.into(),
        }
    }
}
