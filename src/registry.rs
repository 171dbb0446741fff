use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    error::{RulegateError, RulegateResult},
    rule::{RuleDefinition, RuleKind, ValidationMessage},
    value::{PropertyDescriptor, Validatable, Value},
};

/// What a custom handler receives: the current target value, the property's
/// descriptor, and the message the rule would produce on its own. The
/// handler's return value is authoritative: `None` passes, `Some` fails with
/// whatever message the handler built (often a tweak of `fallback`).
pub struct HandlerArgs<'a> {
    pub value: Value,
    pub descriptor: &'a PropertyDescriptor,
    pub fallback: &'a ValidationMessage,
}

pub type HandlerFn = Arc<dyn Fn(&HandlerArgs<'_>) -> Option<ValidationMessage> + Send + Sync>;

/// Collects a type's rule declarations and named handlers during the
/// one-time discovery pass. All configuration errors (duplicate handler
/// names, missing handlers, undeclared properties) are reported when the
/// builder is finished, before anything is cached.
pub struct RuleSetBuilder {
    type_name: String,
    declared: Vec<String>,
    rules: Vec<RuleDefinition>,
    handlers: HashMap<String, HandlerFn>,
    duplicate_handler: Option<String>,
}

impl RuleSetBuilder {
    fn new(type_name: &str, declared: Vec<&str>) -> Self {
        Self {
            type_name: type_name.to_string(),
            declared: declared.into_iter().map(str::to_string).collect(),
            rules: Vec::new(),
            handlers: HashMap::new(),
            duplicate_handler: None,
        }
    }

    pub fn rule(&mut self, rule: RuleDefinition) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn handler(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&HandlerArgs<'_>) -> Option<ValidationMessage> + Send + Sync + 'static,
    ) -> &mut Self {
        let name = name.into();
        if self.handlers.contains_key(&name) && self.duplicate_handler.is_none() {
            self.duplicate_handler = Some(name.clone());
        }
        self.handlers.insert(name, Arc::new(f));
        self
    }

    fn check_root(&self, path_root: &str, what: &str, rule: &RuleDefinition) -> RulegateResult<()> {
        if self.declared.iter().any(|p| p == path_root) {
            return Ok(());
        }
        Err(RulegateError::configuration(format!(
            "{what} of {} rule on '{}.{}' starts at '{path_root}', which is not a declared property",
            rule.kind.label(),
            self.type_name,
            rule.property
        )))
    }

    fn finish(self) -> RulegateResult<TypeMetadata> {
        if let Some(name) = self.duplicate_handler {
            return Err(RulegateError::configuration(format!(
                "type '{}' registers handler '{name}' more than once",
                self.type_name
            )));
        }

        let mut rules: BTreeMap<String, Vec<RuleDefinition>> = BTreeMap::new();
        let mut dependents: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for rule in &self.rules {
            if !self.declared.iter().any(|p| p == &rule.property) {
                return Err(RulegateError::configuration(format!(
                    "rule '{}' targets '{}', which is not a declared property of type '{}'",
                    rule.kind.label(),
                    rule.property,
                    self.type_name
                )));
            }
            if let RuleKind::Custom { handler } = &rule.kind
                && !self.handlers.contains_key(handler)
            {
                return Err(RulegateError::configuration(format!(
                    "rule on '{}' names handler '{handler}', which is not registered on type '{}'",
                    rule.property, self.type_name
                )));
            }
            if let RuleKind::NumberGreaterThan {
                operand: crate::rule::Operand::Path(path),
            } = &rule.kind
            {
                self.check_root(path.root(), "comparison path", rule)?;
            }
            if let Some(gate) = &rule.gate {
                // Deep segments through sub-objects are checked at
                // evaluation time; only the first hop is known statically.
                self.check_root(gate.root(), "gate path", rule)?;

                let gated = dependents.entry(gate.root().to_string()).or_default();
                if !gated.contains(&rule.property) {
                    gated.push(rule.property.clone());
                }
            }
        }

        for rule in self.rules {
            rules.entry(rule.property.clone()).or_default().push(rule);
        }

        let descriptors = rules
            .keys()
            .map(|p| {
                (
                    p.clone(),
                    PropertyDescriptor::new(p.clone(), self.type_name.clone()),
                )
            })
            .collect();

        Ok(TypeMetadata {
            type_name: self.type_name,
            rules,
            descriptors,
            handlers: self.handlers,
            dependents,
        })
    }
}

/// Immutable per-type rule table, built exactly once per type and shared.
pub struct TypeMetadata {
    type_name: String,
    rules: BTreeMap<String, Vec<RuleDefinition>>,
    descriptors: BTreeMap<String, PropertyDescriptor>,
    handlers: HashMap<String, HandlerFn>,
    dependents: BTreeMap<String, Vec<String>>,
}

impl std::fmt::Debug for TypeMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("type_name", &self.type_name)
            .field("rules", &self.rules)
            .field("descriptors", &self.descriptors)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("dependents", &self.dependents)
            .finish()
    }
}

impl TypeMetadata {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Ordered rule definitions for one property (declaration order).
    pub fn rules_for(&self, property: &str) -> &[RuleDefinition] {
        self.rules.get(property).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every property with at least one rule.
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn descriptor(&self, property: &str) -> Option<&PropertyDescriptor> {
        self.descriptors.get(property)
    }

    pub fn handler(&self, name: &str) -> Option<&HandlerFn> {
        self.handlers.get(name)
    }

    /// Properties whose gate path starts at `property`.
    pub fn gated_on(&self, property: &str) -> &[String] {
        self.dependents
            .get(property)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Process-scoped cache of [`TypeMetadata`], keyed by type name.
///
/// Discovery is single-flight: concurrent first callers for the same type
/// serialize on the write lock and all observe the one table the winner
/// built. After that the cache is read-only.
#[derive(Default)]
pub struct MetadataRegistry {
    types: RwLock<HashMap<String, Arc<TypeMetadata>>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by engines unless given a private one.
    pub fn global() -> Arc<MetadataRegistry> {
        static GLOBAL: OnceLock<Arc<MetadataRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(MetadataRegistry::new())))
    }

    fn read_types(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<TypeMetadata>>> {
        match self.types.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_types(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<TypeMetadata>>> {
        match self.types.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Cached table for the object's type, discovering it on first call by
    /// running the type's [`Validatable::configure`] hook.
    pub fn metadata_for(&self, obj: &dyn Validatable) -> RulegateResult<Arc<TypeMetadata>> {
        if let Some(meta) = self.read_types().get(obj.type_name()) {
            return Ok(Arc::clone(meta));
        }

        let mut types = self.write_types();
        // Double-check: another caller may have finished discovery while we
        // waited for the write lock.
        if let Some(meta) = types.get(obj.type_name()) {
            return Ok(Arc::clone(meta));
        }

        tracing::debug!(type_name = obj.type_name(), "discovering rule metadata");
        let mut builder = RuleSetBuilder::new(obj.type_name(), obj.field_names());
        obj.configure(&mut builder);
        let meta = Arc::new(builder.finish()?);
        types.insert(obj.type_name().to_string(), Arc::clone(&meta));
        Ok(meta)
    }

    /// Register a declarative rule table for the object's type (e.g. one
    /// loaded from JSON), instead of the type's `configure` hook. Installing
    /// over an already-discovered type is a configuration error.
    pub fn install(
        &self,
        obj: &dyn Validatable,
        configure: impl FnOnce(&mut RuleSetBuilder),
    ) -> RulegateResult<Arc<TypeMetadata>> {
        let mut types = self.write_types();
        if types.contains_key(obj.type_name()) {
            return Err(RulegateError::configuration(format!(
                "type '{}' already has discovered metadata",
                obj.type_name()
            )));
        }

        let mut builder = RuleSetBuilder::new(obj.type_name(), obj.field_names());
        configure(&mut builder);
        let meta = Arc::new(builder.finish()?);
        types.insert(obj.type_name().to_string(), Arc::clone(&meta));
        Ok(meta)
    }
}
