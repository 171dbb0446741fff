//! # Rulegate guide (v0.1.0)
//!
//! This module is a standalone walkthrough of Rulegate's architecture and public API.
//! If you are looking for copy/paste commands, start with the repository `README.md`.
//! If you are implementing new features, start here.
//!
//! ---
//!
//! ## Core concepts
//!
//! - [`Validatable`](crate::Validatable): an instance under validation, with named scalar
//!   properties plus owned sub-objects
//! - [`RuleDefinition`](crate::RuleDefinition): one immutable check attached to a property
//! - [`MetadataRegistry`](crate::MetadataRegistry): the per-type rule table, discovered once
//!   and cached for the life of the process
//! - [`ValidationEngine`](crate::ValidationEngine): runs passes, applies gating, swaps
//!   message sets
//! - [`MessageAggregator`](crate::MessageAggregator): current messages per property,
//!   overall validity, change feed
//!
//! A validation pass is explicitly staged:
//!
//! 1. Look up the type's cached rules: [`MetadataRegistry::metadata_for`](crate::MetadataRegistry::metadata_for)
//! 2. Resolve gates and evaluate each rule: [`RuleEvaluator::evaluate`](crate::RuleEvaluator::evaluate)
//! 3. Replace the property's message set: [`MessageAggregator`](crate::MessageAggregator)
//!
//! Convenience wrappers for a whole pass live on the engine:
//! [`validate_property`](crate::ValidationEngine::validate_property),
//! [`validate_object`](crate::ValidationEngine::validate_object), and the reactive
//! [`property_changed`](crate::ValidationEngine::property_changed).
//!
//! ---
//!
//! ## "Discovery happens once" (and why)
//!
//! Rule declarations are type-level facts, not instance state. The first validation of a
//! type runs its [`configure`](crate::Validatable::configure) hook under the registry's
//! write lock, validates the declarations (missing handlers, duplicate handler names,
//! undeclared properties fail fast with a configuration error), and caches the resulting
//! [`TypeMetadata`](crate::TypeMetadata). Every later pass, from any thread, shares that
//! one immutable table. Nothing ever re-scans.
//!
//! ---
//!
//! ## Gates (Rulegate's conditional contract)
//!
//! A rule may carry a gate path. Before the rule runs, the engine re-validates the gate
//! property so "currently valid" means *now*, then checks:
//!
//! - the gate path resolves (an absent sub-object leaves the gate unsatisfiable)
//! - the gate property has no Error-severity message
//! - a boolean gate value is `true`
//!
//! An unsatisfied gate skips the rule entirely: no pass, no fail, no message. A gate that
//! loops back onto a property already being resolved in the same pass is treated as
//! vacuously satisfied and reported as a
//! [`PassDiagnostic::GateCycle`](crate::PassDiagnostic) instead of recursing forever.
//!
//! ---
//!
//! ## Declaring rules
//!
//! Rules can be declared in code, in the type's `configure` hook:
//!
//! ```
//! use rulegate::{Operand, RuleDefinition, RuleSetBuilder, Severity};
//!
//! fn configure(rules: &mut RuleSetBuilder) {
//!     rules
//!         .rule(RuleDefinition::has_value("Email").fallback("cannot be blank"))
//!         .rule(
//!             RuleDefinition::number_greater_than(
//!                 "CurrentBalance",
//!                 Operand::path("Account.MinimumBalance").unwrap(),
//!             )
//!             .severity(Severity::Warning)
//!             .gated_on("Account.IsOpen".parse().unwrap())
//!             .message_key("balance.minimum")
//!             .fallback("balance is below the account minimum"),
//!         );
//! }
//! ```
//!
//! or as a JSON table installed through
//! [`MetadataRegistry::install`](crate::MetadataRegistry::install); the CLI pairs such a
//! table with a JSON object snapshot via [`DynObject`](crate::DynObject).
//!
//! Failure text comes from the external [`MessageResolver`](crate::MessageResolver) by
//! message key; a miss falls back to the rule's literal text. Custom handlers registered
//! on the type decide pass/fail themselves, and their output message is authoritative.
