//! Mapper configuration.
//!
//! Holds the settings a mapper is built with. The file form is YAML; every
//! key is optional.
//!
//! # Example YAML
//!
//! ```yaml
//! case_style: SNAKE_CASE
//! leftover_policy: written_only
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::naming::CaseStyle;

/// When a row cell counts as consumed, and so stays out of the leftovers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeftoverPolicy {
    /// Only cells whose value was actually written to a field.
    #[default]
    WrittenOnly,
    /// Every cell that resolved to a field, even when conversion produced
    /// no value.
    Matched,
}

/// Settings shared by [`RecordMapper`](crate::RecordMapper) and
/// [`RecordUnmapper`](crate::RecordUnmapper).
///
/// # Examples
///
/// ```
/// use rowbind_core::{CaseStyle, LeftoverPolicy, MapperConfig};
///
/// let config: MapperConfig = serde_yaml::from_str("case_style: KEBAB_CASE").unwrap();
/// assert_eq!(config.case_style, CaseStyle::KebabCase);
/// assert_eq!(config.leftover_policy, LeftoverPolicy::WrittenOnly);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Case convention of table column names.
    pub case_style: CaseStyle,
    /// Which cells are kept out of the leftover map.
    pub leftover_policy: LeftoverPolicy,
}

impl MapperConfig {
    pub fn new(case_style: CaseStyle) -> Self {
        Self {
            case_style,
            ..Self::default()
        }
    }

    pub fn with_leftover_policy(mut self, policy: LeftoverPolicy) -> Self {
        self.leftover_policy = policy;
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::MappingError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::MappingError::YamlError) if parsing
    /// fails (including an unknown case style).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::MappingError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::MappingError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MappingError;

    #[test]
    fn test_defaults() {
        let config = MapperConfig::default();
        assert_eq!(config.case_style, CaseStyle::SnakeCase);
        assert_eq!(config.leftover_policy, LeftoverPolicy::WrittenOnly);
    }

    #[test]
    fn test_deserialize_complete() {
        let yaml = r#"
case_style: SCREAMING_SNAKE_CASE
leftover_policy: matched
"#;
        let config: MapperConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.case_style, CaseStyle::ScreamingSnakeCase);
        assert_eq!(config.leftover_policy, LeftoverPolicy::Matched);
    }

    #[test]
    fn test_deserialize_empty_document() {
        let config: MapperConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, MapperConfig::default());
    }

    #[test]
    fn test_unknown_case_style_rejected() {
        assert!(serde_yaml::from_str::<MapperConfig>("case_style: PASCAL_CASE").is_err());
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapper.yml");

        let original = MapperConfig::new(CaseStyle::KebabCase)
            .with_leftover_policy(LeftoverPolicy::Matched);
        original.save(&path).unwrap();

        let loaded = MapperConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MapperConfig::load(dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, MappingError::IoError(_)));
    }
}
