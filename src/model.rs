// Compiled model types. The long-lived artifact consumers hold; nothing in
// here is mutated after assembly, so sharing a ModelDef by reference across
// threads needs no synchronization.

use std::fmt;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use regex::Regex;
use serde_json::Value;

/// Resolved type of one field.
#[derive(Debug, Clone)]
pub enum TypeDesc {
    String,
    Boolean,
    /// Bounds ride on the numeric descriptor itself so they survive when the
    /// field is later wrapped in `Array`/`Union`.
    Integer { bounds: Bounds },
    Number { bounds: Bounds },
    /// Closed enumeration; non-empty, all values the same kind.
    LiteralSet(Vec<Literal>),
    /// From `anyOf`; declared order is the decode tie-break.
    Union(Vec<TypeDesc>),
    Array(Box<TypeDesc>),
    /// Nested named model.
    Object(ModelDef),
    /// Keys are free-form strings constrained by `key_pattern`.
    DynamicMap {
        key_pattern: Regex,
        value: Box<TypeDesc>,
    },
    /// `type: object` with no usable property information: shape checked,
    /// contents opaque.
    OpaqueObject,
    /// Genuinely type-less schema node.
    Any,
}

/// Scalar literal after coercion to the declared type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Literal {
    Str(String),
    Int(i64),
    Num(OrderedFloat<f64>),
    Bool(bool),
}

impl Literal {
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Str(_) => "string",
            Literal::Int(_) => "integer",
            Literal::Num(_) => "number",
            Literal::Bool(_) => "boolean",
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Literal::Str(s) => Value::from(s.clone()),
            Literal::Int(i) => Value::from(*i),
            Literal::Num(n) => Value::from(n.0),
            Literal::Bool(b) => Value::from(*b),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "{s:?}"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Num(n) => write!(f, "{}", n.0),
            Literal::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Numeric range annotations; each limit independently present.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub minimum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
}

impl Bounds {
    pub fn is_empty(&self) -> bool {
        self.minimum.is_none()
            && self.exclusive_minimum.is_none()
            && self.maximum.is_none()
            && self.exclusive_maximum.is_none()
    }

    /// Inclusive limits admit equality; exclusive limits do not.
    pub fn contains(&self, x: f64) -> bool {
        if let Some(m) = self.minimum
            && !(x >= m)
        {
            return false;
        }
        if let Some(m) = self.exclusive_minimum
            && !(x > m)
        {
            return false;
        }
        if let Some(m) = self.maximum
            && !(x <= m)
        {
            return false;
        }
        if let Some(m) = self.exclusive_maximum
            && !(x < m)
        {
            return false;
        }
        true
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(4);
        if let Some(m) = self.minimum {
            parts.push(format!("minimum {m}"));
        }
        if let Some(m) = self.exclusive_minimum {
            parts.push(format!("exclusiveMinimum {m}"));
        }
        if let Some(m) = self.maximum {
            parts.push(format!("maximum {m}"));
        }
        if let Some(m) = self.exclusive_maximum {
            parts.push(format!("exclusiveMaximum {m}"));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Output of resolving one property.
///
/// Invariant: `required` XOR `default.is_some()`; an optional field always
/// carries a default, possibly `Value::Null`.
#[derive(Debug, Clone)]
pub struct FieldDesc {
    pub ty: TypeDesc,
    pub required: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// `"dimensionless"` when the schema is silent.
    pub units: String,
}

/// A compiled, named model: sanitized name plus ordered fields. Models form
/// a tree via `Object` and `DynamicMap` descriptors; the source dialect has
/// no `$ref`, so cycles cannot occur.
#[derive(Debug, Clone)]
pub struct ModelDef {
    pub name: String,
    /// Keyed by sanitized field name, in schema document order.
    pub fields: IndexMap<String, FieldDesc>,
    /// Model-level doc text (`memo`).
    pub doc: Option<String>,
    /// Legacy-format blob carried through unchanged for downstream tooling.
    pub legacy: Option<Value>,
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::String => write!(f, "string"),
            TypeDesc::Boolean => write!(f, "boolean"),
            TypeDesc::Integer { bounds } if bounds.is_empty() => write!(f, "integer"),
            TypeDesc::Integer { bounds } => write!(f, "integer ({bounds})"),
            TypeDesc::Number { bounds } if bounds.is_empty() => write!(f, "number"),
            TypeDesc::Number { bounds } => write!(f, "number ({bounds})"),
            TypeDesc::LiteralSet(values) => {
                write!(f, "one of [")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            TypeDesc::Union(alternatives) => {
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{alt}")?;
                }
                Ok(())
            }
            TypeDesc::Array(item) => write!(f, "array of {item}"),
            TypeDesc::Object(model) => write!(f, "object {}", model.name),
            TypeDesc::DynamicMap { key_pattern, .. } => {
                write!(f, "map keyed by {}", key_pattern.as_str())
            }
            TypeDesc::OpaqueObject => write!(f, "object"),
            TypeDesc::Any => write!(f, "any"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_admit_inclusive_reject_exclusive_equality() {
        let b = Bounds {
            minimum: Some(0.0),
            exclusive_maximum: Some(10.0),
            ..Bounds::default()
        };
        assert!(b.contains(0.0));
        assert!(b.contains(9.999));
        assert!(!b.contains(-0.001));
        assert!(!b.contains(10.0));
    }

    #[test]
    fn display_renders_readable_expectations() {
        let ty = TypeDesc::Union(vec![
            TypeDesc::String,
            TypeDesc::Integer {
                bounds: Bounds {
                    minimum: Some(1.0),
                    ..Bounds::default()
                },
            },
        ]);
        assert_eq!(ty.to_string(), "string | integer (minimum 1)");
    }
}
