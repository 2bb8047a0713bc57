//! Settings for the command-line front end, loaded from a TOML file.
//!
//! ```toml
//! [split]
//! bar_step = 2
//! beats_per_bar = 4
//!
//! [augment]
//! transformations = 3
//! seed = 7
//!
//! [categories]
//! sna = [38, 40]
//! kick = [35, 36]
//! ```
//!
//! Every section is optional. Without a `[categories]` section the built-in percussion table
//! is used.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{augment::CategoryTable, sequence::event::KeySet};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Category {category} lists note {key}, expected 0..=127")]
    InvalidNote { category: String, key: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Bars per window.
    pub bar_step: u32,
    /// Used when the file name does not start with a beats-per-bar token.
    pub beats_per_bar: Option<u32>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            bar_step: 1,
            beats_per_bar: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Transformed variants written per source file, besides the original.
    pub transformations: usize,
    pub seed: Option<u64>,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            transformations: 3,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpliceConfig {
    pub split: SplitConfig,
    pub augment: AugmentConfig,
    /// Category name to note identifiers. Empty means the built-in table.
    pub categories: BTreeMap<String, Vec<i64>>,
}

impl SpliceConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents, path)
    }

    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: SpliceConfig =
            toml::from_str(contents).map_err(|e: toml::de::Error| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.category_table()?;
        Ok(config)
    }

    /// The configured category table, or the built-in one when none is configured.
    pub fn category_table(&self) -> Result<CategoryTable, ConfigError> {
        if self.categories.is_empty() {
            return Ok(CategoryTable::default());
        }

        let mut table = CategoryTable::new();
        for (category, keys) in &self.categories {
            if let Some(&key) = keys.iter().find(|k| !(0..=127).contains(*k)) {
                return Err(ConfigError::InvalidNote {
                    category: category.clone(),
                    key,
                });
            }
            let set: KeySet = keys.iter().map(|&k| k as u8).collect();
            table.insert(category.clone(), set);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = SpliceConfig::parse("", Path::new("splice.toml")).unwrap();
        assert_eq!(config, SpliceConfig::default());
        assert_eq!(config.split.bar_step, 1);
        assert_eq!(config.augment.transformations, 3);
        assert_eq!(config.category_table().unwrap(), CategoryTable::default());
    }

    #[test]
    fn parses_sections() {
        let config = SpliceConfig::parse(
            r#"
            [split]
            bar_step = 2
            beats_per_bar = 3

            [augment]
            transformations = 5
            seed = 11

            [categories]
            sna = [38, 40]
            kick = [36]
            "#,
            Path::new("splice.toml"),
        )
        .unwrap();

        assert_eq!(config.split.bar_step, 2);
        assert_eq!(config.split.beats_per_bar, Some(3));
        assert_eq!(config.augment.transformations, 5);
        assert_eq!(config.augment.seed, Some(11));

        let table = config.category_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("sna"), Some(&KeySet::from_keys([38u8, 40]).unwrap()));
        assert_eq!(table.get("toms"), None);
    }

    #[test]
    fn rejects_invalid_notes() {
        let err = SpliceConfig::parse("[categories]\ncym = [49, 200]\n", Path::new("splice.toml"))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNote { ref category, key: 200 } if category == "cym"
        ));
    }

    #[test]
    fn reports_parse_errors_with_the_path() {
        let err = SpliceConfig::parse("[split]\nbar_step = \"two\"\n", Path::new("bad.toml"))
            .unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, Path::new("bad.toml")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splice.toml");
        fs::write(&path, "[augment]\ntransformations = 1\n").unwrap();
        assert_eq!(SpliceConfig::load(&path).unwrap().augment.transformations, 1);

        assert!(matches!(
            SpliceConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::FileRead { .. })
        ));
    }
}
