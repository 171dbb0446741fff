use std::collections::BTreeMap;

use crate::{
    error::{RulegateError, RulegateResult},
    value::{Field, Validatable, Value},
};

enum DynField {
    Value(Value),
    /// JSON `null`: an empty slot. Presents as an absent sub-object, which
    /// also reads as a null scalar wherever a value is expected.
    Absent,
    Object(DynObject),
}

/// A map-backed [`Validatable`] built from a JSON object snapshot, so a
/// declarative rule table and an object instance can both come from files.
/// Nested JSON objects become owned sub-objects named `Parent.Field`.
pub struct DynObject {
    type_name: String,
    fields: BTreeMap<String, DynField>,
}

impl DynObject {
    pub fn from_json(type_name: impl Into<String>, json: &serde_json::Value) -> RulegateResult<Self> {
        let type_name = type_name.into();
        let serde_json::Value::Object(map) = json else {
            return Err(RulegateError::configuration(format!(
                "snapshot for type '{type_name}' must be a JSON object"
            )));
        };

        let mut fields = BTreeMap::new();
        for (key, value) in map {
            let field = match value {
                serde_json::Value::Null => DynField::Absent,
                serde_json::Value::Bool(b) => DynField::Value(Value::Bool(*b)),
                serde_json::Value::Number(n) => {
                    let v = if let Some(i) = n.as_i64() {
                        Value::Int(i)
                    } else if let Some(f) = n.as_f64() {
                        Value::Float(f)
                    } else {
                        return Err(RulegateError::configuration(format!(
                            "field '{key}' of '{type_name}' holds an unrepresentable number"
                        )));
                    };
                    DynField::Value(v)
                }
                serde_json::Value::String(s) => DynField::Value(Value::Text(s.clone())),
                serde_json::Value::Object(_) => {
                    DynField::Object(Self::from_json(format!("{type_name}.{key}"), value)?)
                }
                serde_json::Value::Array(_) => {
                    return Err(RulegateError::configuration(format!(
                        "field '{key}' of '{type_name}' is an array; only scalars and sub-objects validate"
                    )));
                }
            };
            fields.insert(key.clone(), field);
        }
        Ok(Self { type_name, fields })
    }
}

impl Validatable for DynObject {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        match self.fields.get(name)? {
            DynField::Value(v) => Some(Field::Value(v.clone())),
            DynField::Absent => Some(Field::Object(None)),
            DynField::Object(obj) => Some(Field::Object(Some(obj))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{Resolved, resolve};

    fn user() -> DynObject {
        let json = serde_json::json!({
            "Email": "a@b.example",
            "CurrentBalance": 50,
            "Account": { "IsOpen": true, "MinimumBalance": 100.0 },
            "Nickname": null
        });
        DynObject::from_json("User", &json).unwrap()
    }

    #[test]
    fn scalars_and_sub_objects_resolve() {
        let user = user();
        assert_eq!(
            resolve(&user, &"CurrentBalance".parse().unwrap()).unwrap(),
            Resolved::Value(Value::Int(50))
        );
        assert_eq!(
            resolve(&user, &"Account.MinimumBalance".parse().unwrap()).unwrap(),
            Resolved::Value(Value::Float(100.0))
        );
        assert_eq!(
            resolve(&user, &"Account.IsOpen".parse().unwrap()).unwrap(),
            Resolved::Value(Value::Bool(true))
        );
    }

    #[test]
    fn null_fields_are_absent_slots() {
        let user = user();
        assert_eq!(
            resolve(&user, &"Nickname.Anything".parse().unwrap()).unwrap(),
            Resolved::Unresolved
        );
        assert!(matches!(user.field("Nickname"), Some(Field::Object(None))));
    }

    #[test]
    fn arrays_and_non_objects_are_rejected() {
        assert!(DynObject::from_json("T", &serde_json::json!([1, 2])).is_err());
        assert!(DynObject::from_json("T", &serde_json::json!({ "xs": [1] })).is_err());
    }
}
