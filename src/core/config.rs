//! User configuration kept outside the storage repository

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::error::{KoodError, Result};

/// Persisted user state: selected board, external repositories, labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Board the CLI operates on when none is named
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_board_id: Option<String>,

    /// Boards stored in a repository other than the default storage
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_repos: BTreeMap<String, PathBuf>,

    /// Label name → display color
    pub labels: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            current_board_id: None,
            custom_repos: BTreeMap::new(),
            labels: default_labels(),
        }
    }
}

fn default_labels() -> BTreeMap<String, String> {
    [
        ("bug", "red"),
        ("feature", "green"),
        ("improvement", "cyan"),
        ("question", "magenta"),
        ("urgent", "yellow"),
    ]
    .into_iter()
    .map(|(label, color)| (label.to_string(), color.to_string()))
    .collect()
}

impl Config {
    /// Load the config file, falling back to defaults when it is missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yml::from_str(&contents).map_err(|e| KoodError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write the config file, replacing it atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_yml::to_string(self).map_err(|e| KoodError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        tracing::debug!(path = %path.display(), "saved config");
        Ok(())
    }

    /// Display color configured for `label`
    pub fn label_color(&self, label: &str) -> Option<&str> {
        self.labels.get(label).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = tempdir().unwrap();
        let config = Config::load(&tmp.path().join("config.yml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.label_color("bug"), Some("red"));
        assert_eq!(config.label_color("urgent"), Some("yellow"));
    }

    #[test]
    fn test_save_and_load() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.yml");

        let mut config = Config::default();
        config.current_board_id = Some("todo".to_string());
        config
            .custom_repos
            .insert("work".to_string(), PathBuf::from("/srv/work"));
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_keeps_default_labels() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yml");
        std::fs::write(&path, "current_board_id: todo\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.current_board_id.as_deref(), Some("todo"));
        assert_eq!(config.labels, default_labels());
    }

    #[test]
    fn test_malformed_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yml");
        std::fs::write(&path, "custom_repos: [oops\n").unwrap();

        assert!(matches!(
            Config::load(&path).unwrap_err(),
            KoodError::Config { .. }
        ));
    }
}
