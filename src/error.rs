//! Error types for schema compilation and instance validation.

use serde_json::Value;
use thiserror::Error;

/// The input schema document is malformed relative to the supported dialect.
/// Always fatal to the compile call that encountered it.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The document could not be deserialized into the schema shape at all.
    #[error("failed to deserialize schema document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no patternProperties found in `{field}`")]
    NoPatternProperties { field: String },

    #[error("invalid key pattern `{pattern}` on `{field}`: {source}")]
    BadKeyPattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// `minimum`/`exclusiveMinimum`/`maximum`/`exclusiveMaximum` must be numbers.
    #[error("non-numeric bound `{key}` on `{name}`: {value}")]
    NonNumericBound {
        name: String,
        key: &'static str,
        value: Value,
    },

    #[error("empty enum on `{name}`")]
    EmptyEnum { name: String },

    #[error("enum literal {value} on `{name}` is not coercible to {kind}")]
    UncoercibleLiteral {
        name: String,
        value: Value,
        kind: &'static str,
    },

    #[error("empty anyOf on `{name}`")]
    EmptyAnyOf { name: String },

    #[error("`{raw}` sanitizes to an empty identifier")]
    EmptyIdentifier { raw: String },

    /// Two distinct property names collapsed onto one sanitized identifier.
    #[error("properties `{first}` and `{second}` both sanitize to `{sanitized}`")]
    IdentifierCollision {
        first: String,
        second: String,
        sanitized: String,
    },

    #[error("schema nesting exceeds {max} levels at `{name}`")]
    TooDeep { name: String, max: usize },
}

/// An instance document fails to conform to a compiled model. Carries the
/// failing field path, a rendering of the expected type, and the offending
/// value. Decoding is all-or-nothing; these are never recovered from.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing required field at `{path}`")]
    MissingRequired { path: String },

    #[error("expected {expected} at `{path}`, got {found}")]
    Mismatch {
        path: String,
        expected: String,
        found: Value,
    },

    #[error("{found} at `{path}` is out of range: expected {expected}")]
    OutOfBounds {
        path: String,
        expected: String,
        found: Value,
    },

    #[error("{found} at `{path}` is not a permitted value: expected {expected}")]
    NotInLiteralSet {
        path: String,
        expected: String,
        found: Value,
    },

    #[error("key `{key}` at `{path}` does not match `{pattern}`")]
    KeyPatternMismatch {
        path: String,
        key: String,
        pattern: String,
    },

    /// Every union alternative was attempted, in declared order, and none matched.
    #[error("no alternative matched at `{path}`: expected {expected}, got {found}")]
    NoUnionMatch {
        path: String,
        expected: String,
        found: Value,
    },
}

impl ValidationError {
    /// The instance path the failure was detected at.
    pub fn path(&self) -> &str {
        match self {
            Self::MissingRequired { path }
            | Self::Mismatch { path, .. }
            | Self::OutOfBounds { path, .. }
            | Self::NotInLiteralSet { path, .. }
            | Self::KeyPatternMismatch { path, .. }
            | Self::NoUnionMatch { path, .. } => path,
        }
    }
}
