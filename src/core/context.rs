//! Per-invocation context: settings, loaded config and the storage repository

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::git::Git;
use crate::core::settings::Settings;

/// Everything a command needs to reach its boards
#[derive(Debug, Clone)]
pub struct Context {
    settings: Settings,
    config: Config,
    repo: Git,
}

impl Context {
    /// Load the config and open (creating if needed) the storage repository
    pub fn open(settings: Settings) -> Result<Self> {
        let config = Config::load(&settings.config_path)?;
        let repo = Git::init_storage(&settings.storage_root)?;
        Ok(Self {
            settings,
            config,
            repo,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Default storage repository
    pub fn repo(&self) -> &Git {
        &self.repo
    }

    /// Repository holding `board_id`: its registered custom repository or
    /// the default storage
    pub fn repo_for(&self, board_id: &str) -> Git {
        match self.config.custom_repos.get(board_id) {
            Some(path) => Git::new(path),
            None => self.repo.clone(),
        }
    }

    /// Apply `f` to the config and save it if anything changed.
    /// Returns whether the file was written.
    pub fn update_config(&mut self, f: impl FnOnce(&mut Config)) -> Result<bool> {
        let before = self.config.clone();
        f(&mut self.config);
        if self.config == before {
            return Ok(false);
        }
        self.config.save(&self.settings.config_path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::scratch_context;

    #[test]
    fn test_open_creates_storage() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = tmp.path().join("storage");
        crate::core::testing::init_repo(&storage);

        let ctx = Context::open(Settings::new(storage, tmp.path().join("config.yml"))).unwrap();
        assert!(ctx.repo().is_repo());
        assert_eq!(ctx.config(), &Config::default());
    }

    #[test]
    fn test_update_config_saves_only_changes() {
        let (_tmp, mut ctx) = scratch_context();
        let path = ctx.settings().config_path.clone();

        assert!(!ctx.update_config(|_| {}).unwrap());
        assert!(!path.exists());

        assert!(ctx
            .update_config(|c| c.current_board_id = Some("todo".to_string()))
            .unwrap());
        assert_eq!(
            Config::load(&path).unwrap().current_board_id.as_deref(),
            Some("todo")
        );
    }

    #[test]
    fn test_repo_for_custom_board() {
        let (tmp, mut ctx) = scratch_context();
        let custom = tmp.path().join("custom");
        ctx.update_config(|c| {
            c.custom_repos.insert("work".to_string(), custom.clone());
        })
        .unwrap();

        assert_eq!(ctx.repo_for("work").root(), custom.as_path());
        assert_eq!(ctx.repo_for("home").root(), ctx.repo().root());
    }
}
