//! Process settings with layered defaults
//!
//! Built-in defaults come from the platform directories, then environment
//! variables override them:
//!
//! | Variable       | Effect                                   |
//! |----------------|------------------------------------------|
//! | `KOOD_ROOT`    | storage repository location              |
//! | `KOOD_CONFIG`  | user config file location                |
//! | `KOOD_ENV`     | `test` selects the scratch storage dir   |
//! | `KOOD_EDITOR`  | editor command, wins over `EDITOR`       |
//! | `KOOD_REMOTE`  | default remote for pull/push/sync        |

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Remote used when none is configured
pub const DEFAULT_REMOTE: &str = "origin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Default storage repository
    pub storage_root: PathBuf,

    /// User config file (outside the repository)
    pub config_path: PathBuf,

    /// Editor command for `kood edit`, may include arguments
    pub editor: Option<String>,

    /// Remote for pull, push and sync
    pub remote: String,

    pub test_mode: bool,
}

impl Settings {
    /// Settings for an explicit storage root and config file
    pub fn new(storage_root: PathBuf, config_path: PathBuf) -> Self {
        Self {
            storage_root,
            config_path,
            editor: None,
            remote: DEFAULT_REMOTE.to_string(),
            test_mode: false,
        }
    }

    /// Load settings from the process environment
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings, reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let test_mode = var("KOOD_ENV").as_deref() == Some("test");
        let storage_dir = if test_mode { "teststorage" } else { "storage" };

        let storage_root = var("KOOD_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::data_dir().join(storage_dir));
        let config_path = var("KOOD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("config.yml"));

        Self {
            storage_root,
            config_path,
            editor: var("KOOD_EDITOR").or_else(|| var("EDITOR")),
            remote: var("KOOD_REMOTE").unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
            test_mode,
        }
    }

    fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "kood")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".kood"))
    }

    fn config_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "kood")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".kood"))
    }

    /// Editor command, if one is configured
    pub fn editor(&self) -> Option<&str> {
        self.editor.as_deref()
    }

    /// Run the editor on `file_path` and wait for it to exit
    pub fn run_editor(&self, file_path: &Path) -> std::io::Result<ExitStatus> {
        let editor = self.editor().unwrap_or_default();
        let parts: Vec<&str> = editor.split_whitespace().collect();

        let Some((cmd, args)) = parts.split_first() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no editor configured",
            ));
        };

        Command::new(cmd).args(args).arg(file_path).status()
    }
}
