//! Schema-driven model compiler for epJSON-style configuration formats.
//!
//! [`compile`] turns a parsed schema document into a [`ModelDef`] tree;
//! [`validate`]/[`decode`] check instance documents against it; [`export`]
//! serializes the compiled model back into a schema-shaped document.

pub mod cli;
pub mod compile;
pub mod decode;
pub mod error;
pub mod export;
pub mod load;
pub mod model;
pub mod schema;

pub use compile::{compile, compile_value};
pub use decode::{decode, validate};
pub use error::{SchemaError, ValidationError};
pub use export::export;
pub use model::{FieldDesc, ModelDef, TypeDesc};
pub use schema::SchemaNode;
