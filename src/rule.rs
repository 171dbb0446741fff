use crate::{
    error::RulegateResult,
    path::PropertyPath,
};

/// Message severity. Only `Error` blocks overall validity; `Warning` is
/// informational.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// Comparison operand: a numeric literal, or a path to another numeric
/// property on the object graph.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Operand {
    Literal(f64),
    Path(PropertyPath),
}

impl Operand {
    pub fn literal(n: f64) -> Self {
        Operand::Literal(n)
    }

    pub fn path(s: &str) -> RulegateResult<Self> {
        Ok(Operand::Path(PropertyPath::parse(s)?))
    }
}

/// The closed set of rule kinds. Each variant is a data record carrying its
/// own parameters; custom checks go through a named handler registered on
/// the validated type.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RuleKind {
    /// Fails if the target is null, or empty/whitespace-only text.
    HasValue,
    /// Fails unless `target > operand` (strict).
    NumberGreaterThan { operand: Operand },
    /// Fails unless `len(target) > min` (strict).
    StringLengthGreaterThan { min: usize },
    /// Fails unless `len(target) < max` (strict).
    StringLengthLessThan { max: usize },
    /// Defers pass/fail to the named handler; handler output is authoritative.
    Custom { handler: String },
}

impl RuleKind {
    pub fn label(&self) -> &'static str {
        match self {
            RuleKind::HasValue => "has_value",
            RuleKind::NumberGreaterThan { .. } => "number_greater_than",
            RuleKind::StringLengthGreaterThan { .. } => "string_length_greater_than",
            RuleKind::StringLengthLessThan { .. } => "string_length_less_than",
            RuleKind::Custom { .. } => "custom",
        }
    }
}

/// One immutable validation rule attached to a property, declared at the
/// type level and cached after discovery.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuleDefinition {
    pub property: String,
    pub kind: RuleKind,
    /// Evaluate only while the property this path resolves to is currently
    /// valid (and, for boolean gates, true).
    #[serde(default)]
    pub gate: Option<PropertyPath>,
    pub severity: Severity,
    /// Looked up through the message-resolution service; a miss falls back
    /// to `fallback`.
    #[serde(default)]
    pub message_key: Option<String>,
    pub fallback: String,
}

impl RuleDefinition {
    fn new(property: impl Into<String>, kind: RuleKind) -> Self {
        let property = property.into();
        let fallback = format!("{property} is not valid");
        Self {
            property,
            kind,
            gate: None,
            severity: Severity::Error,
            message_key: None,
            fallback,
        }
    }

    pub fn has_value(property: impl Into<String>) -> Self {
        Self::new(property, RuleKind::HasValue)
    }

    pub fn number_greater_than(property: impl Into<String>, operand: Operand) -> Self {
        Self::new(property, RuleKind::NumberGreaterThan { operand })
    }

    pub fn string_length_greater_than(property: impl Into<String>, min: usize) -> Self {
        Self::new(property, RuleKind::StringLengthGreaterThan { min })
    }

    pub fn string_length_less_than(property: impl Into<String>, max: usize) -> Self {
        Self::new(property, RuleKind::StringLengthLessThan { max })
    }

    pub fn custom(property: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(
            property,
            RuleKind::Custom {
                handler: handler.into(),
            },
        )
    }

    pub fn gated_on(mut self, gate: PropertyPath) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn message_key(mut self, key: impl Into<String>) -> Self {
        self.message_key = Some(key.into());
        self
    }

    pub fn fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }

    /// Stable identity of this rule within its type's table.
    pub fn id(&self, index: usize) -> String {
        format!("{}#{index}:{}", self.property, self.kind.label())
    }
}

/// One failing check. Value object: recreated on each evaluation pass,
/// never mutated in place.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ValidationMessage {
    pub severity: Severity,
    pub text: String,
    /// Identity of the originating rule, e.g. `"Email#0:has_value"`.
    pub rule: String,
}

impl ValidationMessage {
    pub fn new(severity: Severity, text: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
            rule: rule.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
