#![forbid(unsafe_code)]

pub mod dynamic;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod guide;
pub mod locale;
pub mod messages;
pub mod path;
pub mod registry;
pub mod rule;
pub mod value;

pub use dynamic::DynObject;
pub use engine::{PassDiagnostic, PassOutcome, ValidationEngine};
pub use error::{RulegateError, RulegateResult};
pub use evaluate::{Evaluation, RuleEvaluator};
pub use locale::{MapResolver, MessageResolver, NullResolver};
pub use messages::MessageAggregator;
pub use path::{PropertyPath, Resolved, resolve};
pub use registry::{HandlerArgs, HandlerFn, MetadataRegistry, RuleSetBuilder, TypeMetadata};
pub use rule::{Operand, RuleDefinition, RuleKind, Severity, ValidationMessage};
pub use value::{Field, PropertyDescriptor, Validatable, Value};
