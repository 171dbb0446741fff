use std::fmt;
use std::str::FromStr;

use crate::{
    error::{RulegateError, RulegateResult},
    value::{Field, Validatable, Value},
};

/// A dotted sequence of property names reaching a value through owned
/// sub-objects, e.g. `"Account.MinimumBalance"`. Always non-empty.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    pub fn parse(s: &str) -> RulegateResult<Self> {
        let segments: Vec<String> = s.split('.').map(str::to_string).collect();
        if segments.iter().any(|seg| seg.trim().is_empty()) {
            return Err(RulegateError::path_resolution(format!(
                "path '{s}' must be non-empty dot-separated property names"
            )));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment: the property on the object under validation.
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    /// True when the path is a single property name (no sub-object hops).
    pub fn is_local(&self) -> bool {
        self.segments.len() == 1
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for PropertyPath {
    type Err = RulegateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PropertyPath {
    type Error = RulegateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PropertyPath> for String {
    fn from(p: PropertyPath) -> String {
        p.to_string()
    }
}

/// Outcome of resolving a path against a live object graph.
///
/// `Unresolved` means an intermediate sub-object slot was empty; callers
/// treat it as "condition not satisfiable", never as a crash.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved {
    Value(Value),
    Unresolved,
}

/// Walk `path` from `root`, reading owned sub-objects left to right.
///
/// An absent intermediate sub-object yields [`Resolved::Unresolved`]. A
/// segment that is not a declared property, navigation into a scalar, or a
/// path terminating on a sub-object are programmer errors and fail with
/// [`RulegateError::PathResolution`].
pub fn resolve(root: &dyn Validatable, path: &PropertyPath) -> RulegateResult<Resolved> {
    let (leaf, hops) = path
        .segments
        .split_last()
        .ok_or_else(|| RulegateError::path_resolution("empty path"))?;

    let mut current: &dyn Validatable = root;
    for seg in hops {
        match current.field(seg) {
            None => {
                return Err(RulegateError::path_resolution(format!(
                    "'{seg}' is not a property of type '{}' (path '{path}')",
                    current.type_name()
                )));
            }
            Some(Field::Value(_)) => {
                return Err(RulegateError::path_resolution(format!(
                    "'{seg}' on type '{}' is a scalar and cannot be navigated (path '{path}')",
                    current.type_name()
                )));
            }
            Some(Field::Object(None)) => return Ok(Resolved::Unresolved),
            Some(Field::Object(Some(sub))) => current = sub,
        }
    }

    match current.field(leaf) {
        None => Err(RulegateError::path_resolution(format!(
            "'{leaf}' is not a property of type '{}' (path '{path}')",
            current.type_name()
        ))),
        Some(Field::Value(v)) => Ok(Resolved::Value(v)),
        Some(Field::Object(None)) => Ok(Resolved::Unresolved),
        Some(Field::Object(Some(_))) => Err(RulegateError::path_resolution(format!(
            "path '{path}' ends on sub-object '{leaf}', not a scalar property"
        ))),
    }
}
