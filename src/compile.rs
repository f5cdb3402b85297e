//! Schema → model compiler.
//!
//! A single depth-first traversal: the assembler walks `properties`, the
//! resolver maps each node to a type descriptor, the pattern resolver
//! handles regex-keyed maps, and the extractor annotates every resolved
//! field with bounds/note/units/default. Purely functional over immutable
//! input; no I/O, no shared state across compilations.
//!
//! Dispatch precedence in the resolver is fixed and significant:
//! `anyOf` > `enum` > object-with-properties > array-with-items > numeric >
//! other. A node combining several of these resolves using only the
//! highest-priority branch.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::SchemaError;
use crate::model::{Bounds, FieldDesc, Literal, ModelDef, TypeDesc};
use crate::schema::SchemaNode;

// ------------------------------- Policy ---------------------------------- //

/// Hard ceiling on schema nesting. The target dialect sits far below this;
/// the guard exists so a malformed schema fails instead of overflowing.
pub const MAX_DEPTH: usize = 64;

/// Units attached to fields whose schema carries none.
pub const DIMENSIONLESS: &str = "dimensionless";

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W").unwrap());

// ---------------------------- Entry points -------------------------------- //

/// Compile a schema document into a named model definition.
pub fn compile(schema: &SchemaNode, model_name: &str) -> Result<ModelDef, SchemaError> {
    assemble(schema, model_name, 0)
}

/// Compile straight from an already-parsed JSON document.
pub fn compile_value(schema: &Value, model_name: &str) -> Result<ModelDef, SchemaError> {
    let node = SchemaNode::from_value(schema)?;
    compile(&node, model_name)
}

// ---------------------------- Model assembler ----------------------------- //

/// Drive the resolver over `properties` and emit the named model.
///
/// Field iteration order is document order and is preserved in the output;
/// downstream serialization depends on it.
pub fn assemble(node: &SchemaNode, model_name: &str, depth: usize) -> Result<ModelDef, SchemaError> {
    if depth > MAX_DEPTH {
        return Err(SchemaError::TooDeep {
            name: model_name.to_owned(),
            max: MAX_DEPTH,
        });
    }

    let name = sanitize(model_name)?;
    let mut fields = indexmap::IndexMap::with_capacity(node.properties.len());
    // sanitized name → original property name, for collision reporting
    let mut sources: HashMap<String, &str> = HashMap::with_capacity(node.properties.len());

    for (prop_name, prop_schema) in &node.properties {
        let field = if !prop_schema.pattern_properties.is_empty() {
            let (key_pattern, value) = resolve_pattern(prop_name, prop_schema, depth + 1)?;
            // Dynamic maps are never required; their metadata was consumed
            // by the sibling merge and lives on the value type.
            FieldDesc {
                ty: TypeDesc::DynamicMap {
                    key_pattern,
                    value: Box::new(value),
                },
                required: false,
                default: Some(Value::Null),
                description: None,
                units: DIMENSIONLESS.to_owned(),
            }
        } else {
            let required = node.required.iter().any(|r| r == prop_name);
            let ty = resolve(prop_schema, Some(prop_name), depth + 1)?;
            annotate(prop_schema, ty, required)
        };

        let key = sanitize(prop_name)?;
        if let Some(first) = sources.insert(key.clone(), prop_name) {
            return Err(SchemaError::IdentifierCollision {
                first: first.to_owned(),
                second: prop_name.clone(),
                sanitized: key,
            });
        }
        fields.insert(key, field);
    }

    Ok(ModelDef {
        name,
        fields,
        doc: node.memo.clone(),
        legacy: node.legacy_idd.clone(),
    })
}

/// Replace non-word characters with `_`, as the generated identifiers must
/// be addressable downstream. An all-special name is a schema defect.
pub fn sanitize(raw: &str) -> Result<String, SchemaError> {
    let out = NON_WORD.replace_all(raw, "_").into_owned();
    if out.is_empty() {
        return Err(SchemaError::EmptyIdentifier {
            raw: raw.to_owned(),
        });
    }
    Ok(out)
}

// --------------------------- Schema node resolver ------------------------- //

/// Resolve one schema node into a type descriptor.
///
/// `name_hint` names any nested model this node may produce; without a hint
/// an object node stays opaque.
pub fn resolve(
    node: &SchemaNode,
    name_hint: Option<&str>,
    depth: usize,
) -> Result<TypeDesc, SchemaError> {
    let context = name_hint.unwrap_or("<anonymous>");
    if depth > MAX_DEPTH {
        return Err(SchemaError::TooDeep {
            name: context.to_owned(),
            max: MAX_DEPTH,
        });
    }

    // 1) `anyOf` wins over every other key on the node.
    if let Some(alternatives) = &node.any_of {
        if alternatives.is_empty() {
            return Err(SchemaError::EmptyAnyOf {
                name: context.to_owned(),
            });
        }
        let resolved = alternatives
            .iter()
            .map(|alt| resolve(alt, None, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(TypeDesc::Union(resolved));
    }

    let json_type = node.json_type();

    // 2) `enum` shadows the plain primitive mapping for the declared type.
    if let Some(raw) = &node.enum_ {
        if raw.is_empty() {
            return Err(SchemaError::EmptyEnum {
                name: context.to_owned(),
            });
        }
        let values = raw
            .iter()
            .map(|v| coerce_literal(v, json_type, context))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(TypeDesc::LiteralSet(values));
    }

    match json_type {
        // 3) Nested object: a named model only with both properties and a hint.
        "object" => match name_hint {
            Some(hint) if !node.properties.is_empty() => {
                Ok(TypeDesc::Object(assemble(node, hint, depth + 1)?))
            }
            _ => Ok(TypeDesc::OpaqueObject),
        },

        // 4) Arrays: item objects with properties get a synthesized child name.
        "array" => match &node.items {
            Some(items) => {
                let item_hint = name_hint.and_then(|h| {
                    (items.json_type() == "object" && !items.properties.is_empty())
                        .then(|| format!("{h}_item"))
                });
                let item = resolve(items, item_hint.as_deref(), depth + 1)?;
                Ok(TypeDesc::Array(Box::new(item)))
            }
            None => Ok(TypeDesc::Array(Box::new(TypeDesc::Any))),
        },

        // 5) Numerics carry their bounds on the descriptor.
        "integer" => Ok(TypeDesc::Integer {
            bounds: bounds_of(node, context)?,
        }),
        "number" => Ok(TypeDesc::Number {
            bounds: bounds_of(node, context)?,
        }),

        "boolean" => Ok(TypeDesc::Boolean),
        "string" => Ok(TypeDesc::String),

        // `null` and anything unrecognized stay type-less.
        _ => Ok(TypeDesc::Any),
    }
}

// ------------------------ Pattern-properties resolver --------------------- //

/// Resolve a regex-keyed map field: the single `patternProperties` entry
/// plus any sibling keys on the enclosing field schema.
///
/// Sibling keys augment the value schema but never override keys it already
/// declares. Only the compiled pattern and the value type survive into the
/// model.
pub fn resolve_pattern(
    field_name: &str,
    node: &SchemaNode,
    depth: usize,
) -> Result<(Regex, TypeDesc), SchemaError> {
    let Some((pattern, value_schema)) = node.pattern_properties.first() else {
        return Err(SchemaError::NoPatternProperties {
            field: field_name.to_owned(),
        });
    };

    let key_pattern = Regex::new(pattern).map_err(|source| SchemaError::BadKeyPattern {
        field: field_name.to_owned(),
        pattern: pattern.clone(),
        source,
    })?;

    let mut merged = value_schema.clone();
    merged.merge_missing_from(node);

    let value = resolve(&merged, Some(field_name), depth)?;
    Ok((key_pattern, value))
}

// --------------------- Constraint & metadata extractor -------------------- //

/// Pull the four numeric bound keys off a node. Non-numeric bounds are
/// schema defects, never silently defaulted.
pub fn bounds_of(node: &SchemaNode, context: &str) -> Result<Bounds, SchemaError> {
    fn limit(
        raw: &Option<Value>,
        key: &'static str,
        context: &str,
    ) -> Result<Option<f64>, SchemaError> {
        match raw {
            None => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| SchemaError::NonNumericBound {
                name: context.to_owned(),
                key,
                value: v.clone(),
            }),
        }
    }

    Ok(Bounds {
        minimum: limit(&node.minimum, "minimum", context)?,
        exclusive_minimum: limit(&node.exclusive_minimum, "exclusiveMinimum", context)?,
        maximum: limit(&node.maximum, "maximum", context)?,
        exclusive_maximum: limit(&node.exclusive_maximum, "exclusiveMaximum", context)?,
    })
}

/// Combine a resolved type with the node's metadata into a field descriptor.
/// Required fields never carry a default; optional fields always do, falling
/// back to `null`.
pub fn annotate(node: &SchemaNode, ty: TypeDesc, required: bool) -> FieldDesc {
    let default = if required {
        None
    } else {
        Some(node.default.clone().unwrap_or(Value::Null))
    };
    FieldDesc {
        ty,
        required,
        default,
        description: node.note.clone(),
        units: node
            .units
            .clone()
            .unwrap_or_else(|| DIMENSIONLESS.to_owned()),
    }
}

/// Coerce one enum literal to the primitive kind implied by the declared
/// type. Unmapped types fall back to string coercion.
fn coerce_literal(value: &Value, json_type: &str, context: &str) -> Result<Literal, SchemaError> {
    let uncoercible = |kind: &'static str| SchemaError::UncoercibleLiteral {
        name: context.to_owned(),
        value: value.clone(),
        kind,
    };

    match json_type {
        "integer" => match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                        .map(|f| f as i64)
                })
                .map(Literal::Int)
                .ok_or_else(|| uncoercible("integer")),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Literal::Int)
                .map_err(|_| uncoercible("integer")),
            Value::Bool(b) => Ok(Literal::Int(*b as i64)),
            _ => Err(uncoercible("integer")),
        },
        "number" => match value {
            Value::Number(n) => n
                .as_f64()
                .map(|f| Literal::Num(f.into()))
                .ok_or_else(|| uncoercible("number")),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(|f| Literal::Num(f.into()))
                .map_err(|_| uncoercible("number")),
            Value::Bool(b) => Ok(Literal::Num(f64::from(*b as u8).into())),
            _ => Err(uncoercible("number")),
        },
        "boolean" => match value {
            Value::Bool(b) => Ok(Literal::Bool(*b)),
            _ => Err(uncoercible("boolean")),
        },
        // string, and the fallback for unmapped types
        _ => match value {
            Value::String(s) => Ok(Literal::Str(s.clone())),
            Value::Number(n) => Ok(Literal::Str(n.to_string())),
            Value::Bool(b) => Ok(Literal::Str(b.to_string())),
            _ => Err(uncoercible("string")),
        },
    }
}

// ------------------------------- Tests ------------------------------------ //
