//! Model → schema-shaped document export.
//!
//! Mirrors the input dialect closely enough that compiling the export of a
//! compiled model yields an equivalent model (field set, types, required
//! set). Field order, notes, and units round-trip.

use serde_json::{Map, Value};

use crate::compile::DIMENSIONLESS;
use crate::model::{Bounds, FieldDesc, Literal, ModelDef, TypeDesc};

/// Serialize a compiled model back into a schema-shaped JSON document.
pub fn export(model: &ModelDef) -> Value {
    Value::Object(export_model(model))
}

fn export_model(model: &ModelDef) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("type".into(), Value::from("object"));
    if let Some(doc) = &model.doc {
        out.insert("memo".into(), Value::from(doc.clone()));
    }

    let mut properties = Map::with_capacity(model.fields.len());
    let mut required: Vec<Value> = Vec::new();
    for (name, field) in &model.fields {
        properties.insert(name.clone(), Value::Object(export_field(field)));
        if field.required {
            required.push(Value::from(name.clone()));
        }
    }
    out.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        out.insert("required".into(), Value::Array(required));
    }
    if let Some(legacy) = &model.legacy {
        out.insert("legacy_idd".into(), legacy.clone());
    }
    out
}

fn export_field(field: &FieldDesc) -> Map<String, Value> {
    let mut out = export_type(&field.ty);
    if let Some(note) = &field.description {
        out.insert("note".into(), Value::from(note.clone()));
    }
    if field.units != DIMENSIONLESS {
        out.insert("units".into(), Value::from(field.units.clone()));
    }
    if let Some(default) = &field.default {
        if !default.is_null() {
            out.insert("default".into(), default.clone());
        }
    }
    out
}

fn export_type(ty: &TypeDesc) -> Map<String, Value> {
    let mut out = Map::new();
    match ty {
        TypeDesc::String => {
            out.insert("type".into(), Value::from("string"));
        }
        TypeDesc::Boolean => {
            out.insert("type".into(), Value::from("boolean"));
        }
        TypeDesc::Integer { bounds } => {
            out.insert("type".into(), Value::from("integer"));
            export_bounds(bounds, &mut out);
        }
        TypeDesc::Number { bounds } => {
            out.insert("type".into(), Value::from("number"));
            export_bounds(bounds, &mut out);
        }
        TypeDesc::LiteralSet(values) => {
            // kind is uniform across the set
            let kind = values.first().map(Literal::kind).unwrap_or("string");
            out.insert("type".into(), Value::from(kind));
            out.insert(
                "enum".into(),
                Value::Array(values.iter().map(Literal::to_value).collect()),
            );
        }
        TypeDesc::Union(alternatives) => {
            out.insert(
                "anyOf".into(),
                Value::Array(
                    alternatives
                        .iter()
                        .map(|alt| Value::Object(export_type(alt)))
                        .collect(),
                ),
            );
        }
        TypeDesc::Array(item) => {
            out.insert("type".into(), Value::from("array"));
            if !matches!(**item, TypeDesc::Any) {
                out.insert("items".into(), Value::Object(export_type(item)));
            }
        }
        TypeDesc::Object(model) => {
            out = export_model(model);
        }
        TypeDesc::DynamicMap { key_pattern, value } => {
            let mut patterns = Map::with_capacity(1);
            patterns.insert(
                key_pattern.as_str().to_owned(),
                Value::Object(export_type(value)),
            );
            out.insert("patternProperties".into(), Value::Object(patterns));
        }
        TypeDesc::OpaqueObject => {
            out.insert("type".into(), Value::from("object"));
        }
        // The dialect has no any-type spelling; null maps back to Any.
        TypeDesc::Any => {
            out.insert("type".into(), Value::from("null"));
        }
    }
    out
}

fn export_bounds(bounds: &Bounds, out: &mut Map<String, Value>) {
    if let Some(m) = bounds.minimum {
        out.insert("minimum".into(), num_value(m));
    }
    if let Some(m) = bounds.exclusive_minimum {
        out.insert("exclusiveMinimum".into(), num_value(m));
    }
    if let Some(m) = bounds.maximum {
        out.insert("maximum".into(), num_value(m));
    }
    if let Some(m) = bounds.exclusive_maximum {
        out.insert("exclusiveMaximum".into(), num_value(m));
    }
}

// Prefer emitting integers when exact.
fn num_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_value;
    use serde_json::json;

    #[test]
    fn round_trip_yields_an_equivalent_model() {
        let schema = json!({
            "memo": "building root",
            "properties": {
                "Version": { "type": "string" },
                "North Axis": { "type": "number", "minimum": 0, "maximum": 360, "units": "deg", "note": "degrees from true north" },
                "Terrain": { "type": "string", "enum": ["Suburbs", "City"] },
                "Setpoint": { "anyOf": [{ "type": "string" }, { "type": "integer", "minimum": 1 }] },
                "Zones": {
                    "patternProperties": {
                        "^Zone .*$": {
                            "type": "object",
                            "properties": { "Area": { "type": "number", "minimum": 0 } },
                            "required": ["Area"]
                        }
                    }
                }
            },
            "required": ["Version"]
        });

        let first = compile_value(&schema, "Idf").unwrap();
        let exported = export(&first);
        let second = compile_value(&exported, "Idf").unwrap();

        // equivalence via the export itself: same field set, types,
        // required set, metadata
        assert_eq!(exported, export(&second));
    }

    #[test]
    fn export_preserves_field_order_notes_and_units() {
        let schema = json!({
            "properties": {
                "Zed": { "type": "number", "units": "m" },
                "Alpha": { "type": "string", "note": "first by name, second by order" }
            }
        });
        let exported = export(&compile_value(&schema, "M").unwrap());

        let properties = exported["properties"].as_object().unwrap();
        let names: Vec<&str> = properties.keys().map(String::as_str).collect();
        assert_eq!(names, ["Zed", "Alpha"]);
        assert_eq!(properties["Zed"]["units"], json!("m"));
        assert_eq!(
            properties["Alpha"]["note"],
            json!("first by name, second by order")
        );
        // dimensionless stays implicit
        assert!(properties["Zed"].get("note").is_none());
        assert!(properties["Alpha"].get("units").is_none());
    }

    #[test]
    fn integral_bounds_export_as_integers() {
        let schema = json!({
            "properties": { "Count": { "type": "integer", "minimum": 0, "maximum": 10 } }
        });
        let exported = export(&compile_value(&schema, "M").unwrap());
        let count = &exported["properties"]["Count"];
        assert_eq!(count["minimum"], json!(0));
        assert_eq!(count["maximum"], json!(10));
    }

    #[test]
    fn dynamic_map_exports_its_pattern_and_value_schema() {
        let schema = json!({
            "properties": {
                "Zones": {
                    "patternProperties": {
                        "^Zone .*$": {
                            "type": "object",
                            "properties": { "Area": { "type": "number" } }
                        }
                    }
                }
            }
        });
        let exported = export(&compile_value(&schema, "M").unwrap());
        let zones = &exported["properties"]["Zones"];
        let value_schema = &zones["patternProperties"]["^Zone .*$"];
        assert_eq!(value_schema["type"], json!("object"));
        assert_eq!(
            value_schema["properties"]["Area"]["type"],
            json!("number")
        );
    }
}
