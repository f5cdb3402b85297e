//! File loading for the CLI layer: read + parse with JSON-path error
//! context, and glob expansion for multi-file instance inputs. The core
//! compiler never touches the filesystem; everything I/O-shaped lives here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::schema::SchemaNode;

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(anyhow!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

pub fn read_schema(path: &Path) -> Result<SchemaNode> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file {}", path.display()))?;
    from_str_with_path(&source)
        .with_context(|| format!("failed to parse schema file {}", path.display()))
}

pub fn read_instance(path: &Path) -> Result<Value> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read instance file {}", path.display()))?;
    from_str_with_path(&source)
        .with_context(|| format!("failed to parse instance file {}", path.display()))
}

/// Expand a mix of literal paths and glob patterns into concrete paths.
/// A pattern that is explicitly a glob but matches nothing is an error.
pub fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_carry_the_json_path() {
        // `required` must be an array of strings
        let err = from_str_with_path::<SchemaNode>(r#"{ "required": [1] }"#).unwrap_err();
        assert!(err.to_string().contains("required[0]"));
    }

    #[test]
    fn literal_paths_pass_through_untouched() {
        let paths = resolve_file_path_patterns(["a.epJSON", "b.epJSON"]).unwrap();
        assert_eq!(paths, [PathBuf::from("a.epJSON"), PathBuf::from("b.epJSON")]);
    }

    #[test]
    fn globs_that_match_nothing_are_errors() {
        let err = resolve_file_path_patterns(["no/such/dir/*.epJSON"]).unwrap_err();
        assert!(err.to_string().contains("matched no files"));
    }
}
