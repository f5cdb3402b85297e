//! Instance decoding against a compiled model.
//!
//! Decoding is all-or-nothing per document: either the whole instance
//! conforms and a normalized copy comes back, or the deepest failing path
//! surfaces in a `ValidationError`. Unknown instance keys are ignored; the
//! decoded document contains exactly the model's fields, with defaults
//! filled for absent optional fields.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::model::{Bounds, Literal, ModelDef, TypeDesc};

/// Check an instance document against a model, discarding the decoded form.
pub fn validate(model: &ModelDef, instance: &Value) -> Result<(), ValidationError> {
    decode(model, instance).map(drop)
}

/// Decode an instance document against a model, producing a normalized copy.
pub fn decode(model: &ModelDef, instance: &Value) -> Result<Value, ValidationError> {
    decode_model(model, instance, "")
}

fn decode_model(model: &ModelDef, value: &Value, path: &str) -> Result<Value, ValidationError> {
    let Value::Object(entries) = value else {
        return Err(mismatch(path, &format!("object {}", model.name), value));
    };

    let mut out = Map::with_capacity(model.fields.len());
    for (name, field) in &model.fields {
        let field_path = join(path, name);
        match entries.get(name) {
            Some(v) => {
                out.insert(name.clone(), decode_value(&field.ty, v, &field_path)?);
            }
            None if field.required => {
                return Err(ValidationError::MissingRequired { path: field_path });
            }
            None => {
                // required XOR default: an optional field always has one
                out.insert(name.clone(), field.default.clone().unwrap_or(Value::Null));
            }
        }
    }
    Ok(Value::Object(out))
}

fn decode_value(ty: &TypeDesc, value: &Value, path: &str) -> Result<Value, ValidationError> {
    match ty {
        TypeDesc::Any => Ok(value.clone()),

        TypeDesc::String => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(mismatch(path, "string", value)),
        },

        TypeDesc::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(mismatch(path, "boolean", value)),
        },

        TypeDesc::Integer { bounds } => {
            let Some(x) = integral_value(value) else {
                return Err(mismatch(path, &ty.to_string(), value));
            };
            check_bounds(bounds, x, value, path)?;
            Ok(value.clone())
        }

        TypeDesc::Number { bounds } => {
            let Some(x) = value.as_f64() else {
                return Err(mismatch(path, &ty.to_string(), value));
            };
            check_bounds(bounds, x, value, path)?;
            Ok(value.clone())
        }

        TypeDesc::LiteralSet(permitted) => match as_literal(value, permitted) {
            Some(lit) if permitted.contains(&lit) => Ok(lit.to_value()),
            _ => Err(ValidationError::NotInLiteralSet {
                path: path.to_owned(),
                expected: ty.to_string(),
                found: value.clone(),
            }),
        },

        // First structurally-valid alternative wins, in declared order.
        TypeDesc::Union(alternatives) => {
            for alt in alternatives {
                if let Ok(decoded) = decode_value(alt, value, path) {
                    return Ok(decoded);
                }
            }
            Err(ValidationError::NoUnionMatch {
                path: path.to_owned(),
                expected: ty.to_string(),
                found: value.clone(),
            })
        }

        TypeDesc::Array(item) => match value {
            Value::Array(elements) => {
                let mut out = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    out.push(decode_value(item, element, &format!("{path}/{i}"))?);
                }
                Ok(Value::Array(out))
            }
            _ => Err(mismatch(path, &ty.to_string(), value)),
        },

        TypeDesc::Object(model) => decode_model(model, value, path),

        TypeDesc::DynamicMap { key_pattern, value: value_ty } => match value {
            Value::Object(entries) => {
                let mut out = Map::with_capacity(entries.len());
                for (key, entry) in entries {
                    if !key_pattern.is_match(key) {
                        return Err(ValidationError::KeyPatternMismatch {
                            path: path.to_owned(),
                            key: key.clone(),
                            pattern: key_pattern.as_str().to_owned(),
                        });
                    }
                    out.insert(key.clone(), decode_value(value_ty, entry, &join(path, key))?);
                }
                Ok(Value::Object(out))
            }
            _ => Err(mismatch(path, &ty.to_string(), value)),
        },

        TypeDesc::OpaqueObject => match value {
            Value::Object(_) => Ok(value.clone()),
            _ => Err(mismatch(path, "object", value)),
        },
    }
}

// ------------------------------- Helpers ---------------------------------- //

fn join(path: &str, key: &str) -> String {
    format!("{path}/{key}")
}

fn mismatch(path: &str, expected: &str, found: &Value) -> ValidationError {
    ValidationError::Mismatch {
        path: path.to_owned(),
        expected: expected.to_owned(),
        found: found.clone(),
    }
}

/// JSON number with no fractional part, as f64. Integer fields accept 5 and
/// 5.0 alike, never 5.5.
fn integral_value(value: &Value) -> Option<f64> {
    let x = value.as_f64()?;
    (x.fract() == 0.0).then_some(x)
}

fn check_bounds(
    bounds: &Bounds,
    x: f64,
    value: &Value,
    path: &str,
) -> Result<(), ValidationError> {
    if bounds.contains(x) {
        return Ok(());
    }
    Err(ValidationError::OutOfBounds {
        path: path.to_owned(),
        expected: bounds.to_string(),
        found: value.clone(),
    })
}

/// View an instance value as a literal of the set's kind. Stricter than the
/// compile-time coercion: the value must already arrive as that kind.
fn as_literal(value: &Value, permitted: &[Literal]) -> Option<Literal> {
    match permitted.first()? {
        Literal::Str(_) => value.as_str().map(|s| Literal::Str(s.to_owned())),
        Literal::Int(_) => integral_value(value).map(|x| Literal::Int(x as i64)),
        Literal::Num(_) => value.as_f64().map(|x| Literal::Num(x.into())),
        Literal::Bool(_) => value.as_bool().map(Literal::Bool),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_value;
    use serde_json::json;

    fn model_for(schema: Value) -> ModelDef {
        compile_value(&schema, "Root").unwrap()
    }

    #[test]
    fn boundary_values_pass_strict_outside_fails() {
        let model = model_for(json!({
            "properties": {
                "Area": { "type": "number", "minimum": 0, "maximum": 100 }
            }
        }));
        assert!(validate(&model, &json!({ "Area": 0 })).is_ok());
        assert!(validate(&model, &json!({ "Area": 100 })).is_ok());
        assert!(validate(&model, &json!({ "Area": 55.5 })).is_ok());

        let e = validate(&model, &json!({ "Area": -0.5 })).unwrap_err();
        assert!(matches!(e, ValidationError::OutOfBounds { .. }));
        assert_eq!(e.path(), "/Area");
        assert!(validate(&model, &json!({ "Area": 100.001 })).is_err());
    }

    #[test]
    fn exclusive_bounds_reject_equality() {
        let model = model_for(json!({
            "properties": {
                "Fraction": { "type": "number", "exclusiveMinimum": 0, "exclusiveMaximum": 1 }
            }
        }));
        assert!(validate(&model, &json!({ "Fraction": 0.5 })).is_ok());
        assert!(validate(&model, &json!({ "Fraction": 0 })).is_err());
        assert!(validate(&model, &json!({ "Fraction": 1 })).is_err());
    }

    #[test]
    fn integer_accepts_integral_float_rejects_fractional() {
        let model = model_for(json!({
            "properties": { "Count": { "type": "integer", "minimum": 1 } }
        }));
        assert!(validate(&model, &json!({ "Count": 3 })).is_ok());
        assert!(validate(&model, &json!({ "Count": 3.0 })).is_ok());

        let e = validate(&model, &json!({ "Count": 3.5 })).unwrap_err();
        assert!(matches!(e, ValidationError::Mismatch { .. }));
        assert!(validate(&model, &json!({ "Count": 0 })).is_err());
    }

    #[test]
    fn literal_set_membership() {
        let model = model_for(json!({
            "properties": {
                "Terrain": { "type": "string", "enum": ["Suburbs", "City", "Ocean"] }
            }
        }));
        assert!(validate(&model, &json!({ "Terrain": "City" })).is_ok());

        let e = validate(&model, &json!({ "Terrain": "Desert" })).unwrap_err();
        assert!(matches!(e, ValidationError::NotInLiteralSet { .. }));
        // wrong kind entirely
        assert!(validate(&model, &json!({ "Terrain": 3 })).is_err());
    }

    #[test]
    fn union_tries_alternatives_in_declared_order() {
        let model = model_for(json!({
            "properties": {
                "Setpoint": { "anyOf": [{ "type": "string" }, { "type": "integer" }] }
            }
        }));
        assert!(validate(&model, &json!({ "Setpoint": "abc" })).is_ok());
        assert!(validate(&model, &json!({ "Setpoint": 5 })).is_ok());

        let e = validate(&model, &json!({ "Setpoint": true })).unwrap_err();
        assert!(matches!(e, ValidationError::NoUnionMatch { .. }));
        assert_eq!(e.path(), "/Setpoint");
    }

    #[test]
    fn dynamic_map_keys_must_match_the_pattern() {
        let model = model_for(json!({
            "properties": {
                "Materials": {
                    "patternProperties": {
                        "^Name .*$": {
                            "type": "object",
                            "properties": { "X": { "type": "number" } }
                        }
                    }
                }
            }
        }));
        assert!(validate(&model, &json!({ "Materials": { "Name Foo": { "X": 1.0 } } })).is_ok());
        assert!(validate(&model, &json!({ "Materials": {} })).is_ok());

        let e = validate(&model, &json!({ "Materials": { "Other": { "X": 1.0 } } })).unwrap_err();
        match e {
            ValidationError::KeyPatternMismatch { key, pattern, .. } => {
                assert_eq!(key, "Other");
                assert_eq!(pattern, "^Name .*$");
            }
            other => panic!("expected key mismatch, got {other}"),
        }
    }

    #[test]
    fn missing_required_field_reports_its_path() {
        let model = model_for(json!({
            "properties": { "Version": { "type": "string" } },
            "required": ["Version"]
        }));
        let e = validate(&model, &json!({})).unwrap_err();
        match e {
            ValidationError::MissingRequired { path } => assert_eq!(path, "/Version"),
            other => panic!("expected missing required, got {other}"),
        }
    }

    #[test]
    fn deepest_failing_path_surfaces() {
        let model = model_for(json!({
            "properties": {
                "Zones": {
                    "patternProperties": {
                        "^Zone .*$": {
                            "type": "object",
                            "properties": { "Area": { "type": "number", "minimum": 0 } }
                        }
                    }
                }
            }
        }));
        let e = validate(&model, &json!({ "Zones": { "Zone 1": { "Area": -1 } } })).unwrap_err();
        assert_eq!(e.path(), "/Zones/Zone 1/Area");
    }

    #[test]
    fn decode_fills_defaults_and_drops_unknown_keys() {
        let model = model_for(json!({
            "properties": {
                "Version": { "type": "string" },
                "Terrain": { "type": "string", "default": "Suburbs" },
                "North Axis": { "type": "number" }
            },
            "required": ["Version"]
        }));
        let decoded = decode(
            &model,
            &json!({ "Version": "23.1", "Unrelated": true }),
        )
        .unwrap();
        assert_eq!(
            decoded,
            json!({ "Version": "23.1", "Terrain": "Suburbs", "North_Axis": null })
        );
    }

    #[test]
    fn decode_canonicalizes_literal_values() {
        // declared string with numeric enum source literals
        let model = model_for(json!({
            "properties": { "Speed": { "enum": [1, 2] } }
        }));
        let decoded = decode(&model, &json!({ "Speed": "2" })).unwrap();
        assert_eq!(decoded, json!({ "Speed": "2" }));
        // a raw number no longer matches the string-coerced set
        assert!(decode(&model, &json!({ "Speed": 2 })).is_err());
    }

    #[test]
    fn arrays_decode_per_element_with_indexed_paths() {
        let model = model_for(json!({
            "properties": {
                "Fractions": {
                    "type": "array",
                    "items": { "type": "number", "minimum": 0, "maximum": 1 }
                }
            }
        }));
        assert!(validate(&model, &json!({ "Fractions": [0, 0.5, 1] })).is_ok());
        let e = validate(&model, &json!({ "Fractions": [0.2, 1.5] })).unwrap_err();
        assert_eq!(e.path(), "/Fractions/1");
    }

    #[test]
    fn end_to_end_version_and_zones() {
        let model = model_for(json!({
            "properties": {
                "Version": { "type": "string" },
                "Zones": {
                    "patternProperties": {
                        "^Zone .*$": {
                            "type": "object",
                            "properties": { "Area": { "type": "number", "minimum": 0 } }
                        }
                    }
                }
            },
            "required": ["Version"]
        }));

        let version = &model.fields["Version"];
        assert!(version.required);
        assert!(matches!(version.ty, TypeDesc::String));
        let zones = &model.fields["Zones"];
        assert!(!zones.required);
        assert!(matches!(zones.ty, TypeDesc::DynamicMap { .. }));

        assert!(validate(
            &model,
            &json!({ "Version": "23.1", "Zones": { "Zone 1": { "Area": 12.5 } } })
        )
        .is_ok());

        let e = validate(&model, &json!({ "Zones": {} })).unwrap_err();
        assert!(matches!(e, ValidationError::MissingRequired { .. }));

        let e = validate(
            &model,
            &json!({ "Version": "23.1", "Zones": { "Zone 1": { "Area": -1 } } }),
        )
        .unwrap_err();
        assert!(matches!(e, ValidationError::OutOfBounds { .. }));
        assert_eq!(e.path(), "/Zones/Zone 1/Area");
    }
}
