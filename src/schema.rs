//! The schema dialect subset consumed by the compiler.
//!
//! This is deliberately not a general JSON Schema representation: no `$ref`,
//! no `allOf`/`not`, no composition beyond `anyOf`. The field set mirrors
//! what the source format actually writes, including its custom metadata
//! keys (`note`, `units`, `memo`, `legacy_idd`). Unknown keys are ignored.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SchemaError;

/// One schema subtree. Immutable input, owned by the caller for the
/// duration of compilation and discarded afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaNode {
    /// Declared JSON type; absent means string.
    #[serde(rename = "type")]
    pub ty: Option<String>,

    /// Named child properties, in document order.
    pub properties: IndexMap<String, SchemaNode>,

    /// Regex-keyed child properties. Exactly one entry expected.
    #[serde(rename = "patternProperties")]
    pub pattern_properties: IndexMap<String, SchemaNode>,

    pub required: Vec<String>,

    /// Closed set of permitted literals. `Some([])` is malformed.
    #[serde(rename = "enum")]
    pub enum_: Option<Vec<Value>>,

    /// Union alternatives; order is significant for instance decoding.
    #[serde(rename = "anyOf")]
    pub any_of: Option<Vec<SchemaNode>>,

    pub items: Option<Box<SchemaNode>>,

    // Numeric bounds are kept raw here; the extractor rejects non-numbers.
    pub minimum: Option<Value>,
    #[serde(rename = "exclusiveMinimum")]
    pub exclusive_minimum: Option<Value>,
    pub maximum: Option<Value>,
    #[serde(rename = "exclusiveMaximum")]
    pub exclusive_maximum: Option<Value>,

    pub default: Option<Value>,

    /// Free-text field description.
    #[serde(alias = "description")]
    pub note: Option<String>,

    pub units: Option<String>,

    /// Model-level doc text.
    pub memo: Option<String>,

    /// Opaque legacy-format blob, carried through to the model unchanged.
    pub legacy_idd: Option<Value>,
}

impl SchemaNode {
    /// Declared JSON type, defaulting to string when absent.
    pub fn json_type(&self) -> &str {
        self.ty.as_deref().unwrap_or("string")
    }

    /// Deserialize a schema node out of an already-parsed JSON document.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        Ok(Self::deserialize(value)?)
    }

    /// Copy every key `outer` has and `self` lacks. Keys already present on
    /// `self` win; `patternProperties` itself never transfers.
    ///
    /// Used when a patternProperties value schema inherits shared metadata
    /// (note, units, type) written on its enclosing field schema.
    pub(crate) fn merge_missing_from(&mut self, outer: &SchemaNode) {
        fn fill<T: Clone>(slot: &mut Option<T>, from: &Option<T>) {
            if slot.is_none() {
                *slot = from.clone();
            }
        }
        fill(&mut self.ty, &outer.ty);
        fill(&mut self.enum_, &outer.enum_);
        fill(&mut self.any_of, &outer.any_of);
        fill(&mut self.items, &outer.items);
        fill(&mut self.minimum, &outer.minimum);
        fill(&mut self.exclusive_minimum, &outer.exclusive_minimum);
        fill(&mut self.maximum, &outer.maximum);
        fill(&mut self.exclusive_maximum, &outer.exclusive_maximum);
        fill(&mut self.default, &outer.default);
        fill(&mut self.note, &outer.note);
        fill(&mut self.units, &outer.units);
        fill(&mut self.memo, &outer.memo);
        fill(&mut self.legacy_idd, &outer.legacy_idd);

        if self.properties.is_empty() && !outer.properties.is_empty() {
            self.properties = outer.properties.clone();
        }
        if self.required.is_empty() && !outer.required.is_empty() {
            self.required = outer.required.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(v: Value) -> SchemaNode {
        SchemaNode::from_value(&v).unwrap()
    }

    #[test]
    fn missing_type_reads_as_string() {
        let n = node(json!({ "note": "free text" }));
        assert_eq!(n.json_type(), "string");
        assert_eq!(n.note.as_deref(), Some("free text"));
    }

    #[test]
    fn description_is_an_alias_for_note() {
        let n = node(json!({ "description": "aliased" }));
        assert_eq!(n.note.as_deref(), Some("aliased"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let n = node(json!({ "type": "number", "format": "double", "x-vendor": true }));
        assert_eq!(n.json_type(), "number");
    }

    #[test]
    fn property_order_is_document_order() {
        let n = node(json!({
            "properties": { "Zeta": {}, "Alpha": {}, "Mid": {} }
        }));
        let names: Vec<&str> = n.properties.keys().map(String::as_str).collect();
        assert_eq!(names, ["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn merge_fills_gaps_without_overriding() {
        let mut inner = node(json!({ "type": "number", "units": "m2" }));
        let outer = node(json!({ "type": "string", "note": "shared", "units": "W" }));
        inner.merge_missing_from(&outer);
        assert_eq!(inner.json_type(), "number");
        assert_eq!(inner.units.as_deref(), Some("m2"));
        assert_eq!(inner.note.as_deref(), Some("shared"));
    }
}
