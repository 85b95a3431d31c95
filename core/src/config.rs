//! File loading for criteria, items and rule sets.
//!
//! The format follows the file extension: `.json` (any case) is JSON,
//! everything else is YAML. Both go through [`DataValue`], so mapping order
//! from the file is preserved.
//!
//! # Example
//!
//! ```no_run
//! use itemmatch::config::{load_criteria, load_item};
//! use itemmatch::Strictness;
//!
//! let criteria = load_criteria("criteria.yaml", Strictness::Lenient)?;
//! let item = load_item("item.json")?;
//! println!("{}", criteria.evaluate(&item));
//! # Ok::<(), itemmatch::config::ConfigError>(())
//! ```

use crate::{Criteria, CriteriaError, DataValue, Item, RuleSet, RuleSetError, Strictness};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The criteria failed to compile.
    #[error(transparent)]
    Criteria(#[from] CriteriaError),

    /// The rule set failed to compile.
    #[error(transparent)]
    RuleSet(#[from] RuleSetError),
}

/// Source format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON (`.json`).
    Json,
    /// YAML (anything else, including `.yaml` and `.yml`).
    Yaml,
}

impl Format {
    /// Pick the format from a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::Json
        } else {
            Self::Yaml
        }
    }

    /// Parse text in this format.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] or [`ConfigError::Yaml`] on malformed input.
    pub fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, ConfigError> {
        Ok(match self {
            Self::Json => serde_json::from_str(content)?,
            Self::Yaml => serde_yaml::from_str(content)?,
        })
    }
}

/// Read and parse a file into any deserializable type.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, or a parse error.
pub fn load_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let format = Format::from_path(path);
    debug!(path = %path.display(), ?format, "loading configuration file");
    format.parse(&content)
}

/// Load and compile a criteria mapping.
///
/// # Errors
///
/// I/O and parse errors, plus [`ConfigError::Criteria`] when the document is
/// not a mapping or (in strict mode) a criterion is malformed.
pub fn load_criteria(path: impl AsRef<Path>, strictness: Strictness) -> Result<Criteria, ConfigError> {
    let source: DataValue = load_file(path)?;
    Ok(Criteria::from_value(&source, strictness)?)
}

/// Load an item snapshot.
///
/// # Errors
///
/// I/O and parse errors.
pub fn load_item(path: impl AsRef<Path>) -> Result<Item, ConfigError> {
    load_file(path)
}

/// Load and compile a `{ rules: { <name>: <criteria> } }` document.
///
/// # Errors
///
/// I/O and parse errors, plus [`ConfigError::RuleSet`] when the document is
/// malformed.
pub fn load_rule_set(path: impl AsRef<Path>, strictness: Strictness) -> Result<RuleSet, ConfigError> {
    let source: DataValue = load_file(path)?;
    Ok(RuleSet::from_value(&source, strictness)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ItemView;
    use std::fs;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("itemmatch-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.yml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a")), Format::Yaml);
    }

    #[test]
    fn test_load_yaml_criteria() {
        let path = write_temp("criteria.yaml", "material: diamond_*\ncustom-model-data: 7\n");
        let criteria = load_criteria(&path, Strictness::Strict).unwrap();
        assert_eq!(criteria.len(), 2);
    }

    #[test]
    fn test_load_json_criteria_keeps_order() {
        let path = write_temp("criteria.json", r#"{"nbt-value": {"b": "1", "a": "2"}}"#);
        let criteria = load_criteria(&path, Strictness::Strict).unwrap();
        assert_eq!(criteria.nbt_value().map(ToString::to_string).as_deref(), Some("b=1, a=2"));
    }

    #[test]
    fn test_strict_load_reports_criteria_error() {
        let path = write_temp("bad.yaml", "custom-model-data: seven\n");
        let err = load_criteria(&path, Strictness::Strict).unwrap_err();
        assert!(matches!(err, ConfigError::Criteria(_)));
        assert!(load_criteria(&path, Strictness::Lenient).is_ok());
    }

    #[test]
    fn test_load_item() {
        let path = write_temp("item.json", r#"{"material": "STONE", "custom-model-data": [3.5]}"#);
        let item = load_item(&path).unwrap();
        assert_eq!(item.identifier().as_deref(), Some("STONE"));
        assert_eq!(item.numeric_tag(), Some(&[3.5_f32][..]));
    }

    #[test]
    fn test_load_rule_set() {
        let path = write_temp("rules.yaml", "rules:\n  stone:\n    material: stone\n");
        let rules = load_rule_set(&path, Strictness::Strict).unwrap();
        assert_eq!(rules.first_match(&Item::new("STONE")), Some("stone"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_item("/nonexistent/itemmatch/item.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().starts_with("failed to read /nonexistent/itemmatch/item.yaml"));
    }

    #[test]
    fn test_parse_errors() {
        let path = write_temp("broken.json", "{not json");
        assert!(matches!(load_item(&path).unwrap_err(), ConfigError::Json(_)));
        let path = write_temp("broken.yaml", "a: [unclosed");
        assert!(matches!(load_item(&path).unwrap_err(), ConfigError::Yaml(_)));
    }
}
