use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    error::RulegateResult,
    evaluate::{Evaluation, RuleEvaluator},
    locale::MessageResolver,
    messages::MessageAggregator,
    path::{PropertyPath, Resolved, resolve},
    registry::{MetadataRegistry, TypeMetadata},
    rule::ValidationMessage,
    value::{Validatable, Value},
};

/// Non-fatal findings from one pass, reported alongside the message updates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassDiagnostic {
    /// A gate referenced a property already being gate-resolved in this
    /// pass; the gate was treated as vacuously satisfied.
    GateCycle { property: String, gate: String },
    /// A custom handler raised; its failure was recorded as a message on
    /// the property and the pass continued.
    HandlerFault { property: String, detail: String },
}

/// Result of one validation pass: which properties' message sets changed,
/// plus any diagnostics.
#[derive(Debug, Default)]
pub struct PassOutcome {
    pub changed: Vec<String>,
    pub diagnostics: Vec<PassDiagnostic>,
}

impl PassOutcome {
    fn absorb(&mut self, other: PassOutcome) {
        self.changed.extend(other.changed);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Pass-scoped state: the set of properties currently being gate-resolved,
/// used to break gate cycles.
#[derive(Default)]
struct Pass {
    in_progress: BTreeSet<String>,
    outcome: PassOutcome,
}

/// Orchestrates validation passes over a single object: consults the
/// metadata cache, applies conditional gating with cycle protection,
/// collects all failing rules per property, and swaps the results into the
/// [`MessageAggregator`].
pub struct ValidationEngine {
    registry: Arc<MetadataRegistry>,
    aggregator: MessageAggregator,
    resolver: Arc<dyn MessageResolver>,
}

impl ValidationEngine {
    /// Engine over the process-wide metadata registry.
    pub fn new(resolver: impl MessageResolver + 'static) -> Self {
        Self::with_registry(MetadataRegistry::global(), resolver)
    }

    /// Engine over a private registry (useful for tests and sandboxing).
    pub fn with_registry(
        registry: Arc<MetadataRegistry>,
        resolver: impl MessageResolver + 'static,
    ) -> Self {
        Self {
            registry,
            aggregator: MessageAggregator::new(),
            resolver: Arc::new(resolver),
        }
    }

    pub fn aggregator(&self) -> &MessageAggregator {
        &self.aggregator
    }

    /// Current messages for one property.
    pub fn messages(&self, property: &str) -> Arc<[ValidationMessage]> {
        self.aggregator.messages(property)
    }

    /// True iff no property currently has an Error-severity message.
    pub fn is_valid(&self) -> bool {
        self.aggregator.is_valid()
    }

    /// Subscribe to per-property "validation changed" notifications.
    pub fn subscribe(
        &self,
        listener: impl Fn(&str, &[ValidationMessage]) + Send + Sync + 'static,
    ) {
        self.aggregator.subscribe(listener);
    }

    /// Re-evaluate every rule attached to `property` and replace its
    /// message set.
    #[tracing::instrument(skip(self, obj))]
    pub fn validate_property(
        &self,
        obj: &dyn Validatable,
        property: &str,
    ) -> RulegateResult<PassOutcome> {
        let metadata = self.registry.metadata_for(obj)?;
        let mut pass = Pass::default();
        self.run_property(obj, &metadata, property, &mut pass)?;
        Ok(pass.outcome)
    }

    /// Validate every property with at least one rule, each as an
    /// independent pass. Order across unrelated properties is unspecified.
    #[tracing::instrument(skip(self, obj))]
    pub fn validate_object(&self, obj: &dyn Validatable) -> RulegateResult<PassOutcome> {
        let metadata = self.registry.metadata_for(obj)?;
        let mut outcome = PassOutcome::default();
        let properties: Vec<String> = metadata.properties().map(str::to_string).collect();
        for property in properties {
            let mut pass = Pass::default();
            self.run_property(obj, &metadata, &property, &mut pass)?;
            outcome.absorb(pass.outcome);
        }
        Ok(outcome)
    }

    /// The consumed change-notification contract: the host signals that
    /// `property` was written, and the engine re-validates it plus,
    /// transitively, every property whose gate references it.
    #[tracing::instrument(skip(self, obj))]
    pub fn property_changed(
        &self,
        obj: &dyn Validatable,
        property: &str,
    ) -> RulegateResult<PassOutcome> {
        let metadata = self.registry.metadata_for(obj)?;
        let mut outcome = PassOutcome::default();
        let mut visited = BTreeSet::new();
        let mut queue = vec![property.to_string()];

        while let Some(next) = queue.pop() {
            if !visited.insert(next.clone()) {
                continue;
            }
            if !metadata.rules_for(&next).is_empty() {
                let mut pass = Pass::default();
                self.run_property(obj, &metadata, &next, &mut pass)?;
                outcome.absorb(pass.outcome);
            }
            for dependent in metadata.gated_on(&next) {
                queue.push(dependent.clone());
            }
        }
        Ok(outcome)
    }

    fn run_property(
        &self,
        obj: &dyn Validatable,
        metadata: &TypeMetadata,
        property: &str,
        pass: &mut Pass,
    ) -> RulegateResult<()> {
        pass.in_progress.insert(property.to_string());

        let mut failing: Vec<ValidationMessage> = Vec::new();
        for (index, rule) in metadata.rules_for(property).iter().enumerate() {
            if let Some(gate) = &rule.gate
                && !self.gate_satisfied(obj, metadata, gate, property, pass)?
            {
                // Skipped entirely: a gated-out rule records neither pass
                // nor fail.
                continue;
            }

            match RuleEvaluator::evaluate(obj, rule, index, metadata, self.resolver.as_ref())? {
                Evaluation::Pass => {}
                Evaluation::Fail(message) => failing.push(message),
                Evaluation::Fault { message, detail } => {
                    failing.push(message);
                    pass.outcome.diagnostics.push(PassDiagnostic::HandlerFault {
                        property: property.to_string(),
                        detail,
                    });
                }
            }
        }

        if self.aggregator.replace(property, failing) {
            pass.outcome.changed.push(property.to_string());
        }
        pass.in_progress.remove(property);
        Ok(())
    }

    /// A gate holds when its path resolves, the gate property is currently
    /// valid, and, if the gate value is a boolean, that boolean is `true`.
    /// Single-segment gates are re-validated first so "currently valid"
    /// reflects the instant of evaluation; a revisit within the same pass is
    /// a cycle and the gate is treated as vacuously satisfied.
    fn gate_satisfied(
        &self,
        obj: &dyn Validatable,
        metadata: &TypeMetadata,
        gate: &PropertyPath,
        gated_property: &str,
        pass: &mut Pass,
    ) -> RulegateResult<bool> {
        if gate.is_local() && !metadata.rules_for(gate.root()).is_empty() {
            if pass.in_progress.contains(gate.root()) {
                tracing::warn!(
                    property = gated_property,
                    gate = %gate,
                    "gate cycle; treating gate as satisfied for this pass"
                );
                pass.outcome.diagnostics.push(PassDiagnostic::GateCycle {
                    property: gated_property.to_string(),
                    gate: gate.to_string(),
                });
                return Ok(true);
            }
            self.run_property(obj, metadata, gate.root(), pass)?;
        }

        match resolve(obj, gate)? {
            Resolved::Unresolved => Ok(false),
            Resolved::Value(Value::Bool(false)) => Ok(false),
            Resolved::Value(_) => {
                let gate_key = if gate.is_local() {
                    gate.root().to_string()
                } else {
                    gate.to_string()
                };
                Ok(!self.aggregator.has_error(&gate_key))
            }
        }
    }
}
