use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::{
    error::{RulegateError, RulegateResult},
    locale::MessageResolver,
    path::{Resolved, resolve},
    registry::{HandlerArgs, TypeMetadata},
    rule::{Operand, RuleDefinition, RuleKind, Severity, ValidationMessage},
    value::{Field, Validatable, Value},
};

/// Outcome of evaluating one rule against one instance.
#[derive(Debug)]
pub enum Evaluation {
    Pass,
    Fail(ValidationMessage),
    /// A custom handler raised. The message is recorded on the property like
    /// any failure; the detail travels back to the caller as a diagnostic.
    Fault {
        message: ValidationMessage,
        detail: String,
    },
}

enum Target {
    Scalar(Value),
    AbsentObject,
    PresentObject,
}

pub struct RuleEvaluator;

impl RuleEvaluator {
    /// Evaluate one rule definition against a live instance. Gating is the
    /// engine's job; by the time a rule reaches here it is already ungated
    /// or its gate was satisfied.
    pub fn evaluate(
        instance: &dyn Validatable,
        rule: &RuleDefinition,
        index: usize,
        metadata: &TypeMetadata,
        resolver: &dyn MessageResolver,
    ) -> RulegateResult<Evaluation> {
        let target = read_target(instance, rule)?;
        let failed = match &rule.kind {
            RuleKind::HasValue => match &target {
                Target::Scalar(v) => v.is_blank(),
                Target::AbsentObject => true,
                Target::PresentObject => false,
            },
            RuleKind::NumberGreaterThan { operand } => {
                !number_exceeds(instance, &target, operand)?
            }
            RuleKind::StringLengthGreaterThan { min } => {
                !text_length(&target).is_some_and(|len| len > *min)
            }
            RuleKind::StringLengthLessThan { max } => {
                !text_length(&target).is_some_and(|len| len < *max)
            }
            RuleKind::Custom { handler } => {
                return invoke_handler(handler, &target, rule, index, metadata, resolver);
            }
        };

        if failed {
            Ok(Evaluation::Fail(failure_message(rule, index, resolver)))
        } else {
            Ok(Evaluation::Pass)
        }
    }
}

fn read_target(instance: &dyn Validatable, rule: &RuleDefinition) -> RulegateResult<Target> {
    match instance.field(&rule.property) {
        None => Err(RulegateError::path_resolution(format!(
            "'{}' is not a property of type '{}'",
            rule.property,
            instance.type_name()
        ))),
        Some(Field::Value(v)) => Ok(Target::Scalar(v)),
        Some(Field::Object(None)) => Ok(Target::AbsentObject),
        Some(Field::Object(Some(_))) => Ok(Target::PresentObject),
    }
}

/// Strict `target > operand`. Anything that prevents the comparison (a
/// non-numeric target, an unresolved operand path) cannot satisfy the
/// strict bound and counts as false.
fn number_exceeds(
    instance: &dyn Validatable,
    target: &Target,
    operand: &Operand,
) -> RulegateResult<bool> {
    let Target::Scalar(value) = target else {
        return Ok(false);
    };
    let Some(lhs) = value.as_number() else {
        return Ok(false);
    };
    let rhs = match operand {
        Operand::Literal(n) => Some(*n),
        Operand::Path(path) => match resolve(instance, path)? {
            Resolved::Value(v) => v.as_number(),
            Resolved::Unresolved => None,
        },
    };
    Ok(rhs.is_some_and(|rhs| lhs > rhs))
}

/// Character length of the target text. Null counts as length 0 (presence is
/// `HasValue`'s job); any other non-text target has no defined length.
fn text_length(target: &Target) -> Option<usize> {
    match target {
        Target::Scalar(Value::Text(s)) => Some(s.chars().count()),
        Target::Scalar(Value::Null) | Target::AbsentObject => Some(0),
        _ => None,
    }
}

fn failure_message(
    rule: &RuleDefinition,
    index: usize,
    resolver: &dyn MessageResolver,
) -> ValidationMessage {
    let text = rule
        .message_key
        .as_deref()
        .and_then(|key| resolver.resolve(key))
        .unwrap_or_else(|| rule.fallback.clone());
    ValidationMessage::new(rule.severity, text, rule.id(index))
}

fn invoke_handler(
    name: &str,
    target: &Target,
    rule: &RuleDefinition,
    index: usize,
    metadata: &TypeMetadata,
    resolver: &dyn MessageResolver,
) -> RulegateResult<Evaluation> {
    let handler = metadata.handler(name).ok_or_else(|| {
        RulegateError::configuration(format!(
            "handler '{name}' is not registered on type '{}'",
            metadata.type_name()
        ))
    })?;
    let descriptor = metadata.descriptor(&rule.property).ok_or_else(|| {
        RulegateError::configuration(format!(
            "no descriptor for property '{}' on type '{}'",
            rule.property,
            metadata.type_name()
        ))
    })?;

    let value = match target {
        Target::Scalar(v) => v.clone(),
        Target::AbsentObject | Target::PresentObject => Value::Null,
    };
    let fallback = failure_message(rule, index, resolver);
    let args = HandlerArgs {
        value,
        descriptor,
        fallback: &fallback,
    };

    match catch_unwind(AssertUnwindSafe(|| handler(&args))) {
        Ok(outcome) => Ok(match outcome {
            None => Evaluation::Pass,
            Some(message) => Evaluation::Fail(message),
        }),
        Err(payload) => {
            let detail = panic_text(payload.as_ref());
            tracing::warn!(
                handler = name,
                property = %rule.property,
                %detail,
                "custom handler raised during validation"
            );
            let message = ValidationMessage::new(
                Severity::Error,
                format!("handler '{name}' failed while validating '{}'", rule.property),
                rule.id(index),
            );
            Ok(Evaluation::Fault {
                message,
                detail: RulegateError::handler_execution(format!("handler '{name}': {detail}"))
                    .to_string(),
            })
        }
    }
}

fn panic_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
