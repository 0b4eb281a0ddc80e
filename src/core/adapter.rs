//! Working-tree adapter: records as files on a git branch
//!
//! An adapter is bound to one branch and one directory of a repository.
//! Reads and writes happen in the shared working tree, so every call that
//! finds another branch checked out wraps itself in
//! [`with_stash_and_branch`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::core::error::Result;
use crate::core::git::Git;
use crate::core::transaction::with_stash_and_branch;
use crate::yaml::{decode, encode, Record};

/// Extension used when none is given
pub const DEFAULT_EXTENSION: &str = "yml";

/// Reads and writes records under one path prefix of one branch
#[derive(Debug, Clone)]
pub struct GitAdapter {
    git: Git,
    branch: String,
    path: Option<String>,
    extension: String,
}

impl GitAdapter {
    pub fn new(git: Git, branch: impl Into<String>) -> Self {
        Self {
            git,
            branch: branch.into(),
            path: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Store records under `path` instead of the branch root
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn git(&self) -> &Git {
        &self.git
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Repository-relative path of the record with `id`
    pub fn key(&self, id: &str) -> String {
        let file = format!("{}.{}", id, self.extension);
        match &self.path {
            Some(path) => format!("{}/{}", path, file),
            None => file,
        }
    }

    /// Absolute path of the record with `id` in the working tree
    pub fn file_path(&self, id: &str) -> PathBuf {
        self.git.root().join(self.key(id))
    }

    fn dir(&self) -> PathBuf {
        match &self.path {
            Some(path) => self.git.root().join(path),
            None => self.git.root().to_path_buf(),
        }
    }

    pub fn exists(&self, id: &str) -> Result<bool> {
        self.on_branch(|| Ok(self.file_path(id).is_file()))
    }

    pub fn read(&self, id: &str) -> Result<Option<Record>> {
        self.on_branch(|| self.read_here(id))
    }

    /// Write a record and commit it. A write that leaves the file unchanged
    /// creates no commit.
    pub fn write(&self, id: &str, record: &Record) -> Result<()> {
        self.on_branch(|| {
            self.write_here(id, record)?;
            let key = self.key(id);
            let path = Path::new(&key);
            self.git.stage_file(path)?;
            if self.git.has_staged_changes(path)? {
                self.git.commit_paths(&format!("Save {}", key), &[path])?;
                tracing::debug!(branch = %self.branch, key = %key, "committed record");
            }
            Ok(())
        })
    }

    /// Materialize a record in the working tree without committing it.
    ///
    /// The caller must already have the adapter's branch checked out.
    pub fn write_file(&self, id: &str, record: &Record) -> Result<PathBuf> {
        self.write_here(id, record)
    }

    /// Delete a record and commit the removal. Returns `false` when there
    /// was nothing to delete.
    pub fn delete(&self, id: &str) -> Result<bool> {
        self.on_branch(|| {
            let file = self.file_path(id);
            if !file.is_file() {
                return Ok(false);
            }

            let key = self.key(id);
            let path = Path::new(&key);
            self.git.remove_file(path)?;
            if file.exists() {
                fs::remove_file(&file)?;
            }
            if self.git.has_staged_changes(path)? {
                self.git.commit_paths(&format!("Delete {}", key), &[path])?;
                tracing::debug!(branch = %self.branch, key = %key, "deleted record");
            }
            Ok(true)
        })
    }

    /// Ids of every record under the prefix, sorted
    pub fn ids(&self) -> Result<Vec<String>> {
        self.on_branch(|| self.ids_here())
    }

    /// Every record under the prefix, sorted by id
    pub fn list(&self) -> Result<Vec<Record>> {
        self.on_branch(|| {
            let mut records = Vec::new();
            for id in self.ids_here()? {
                if let Some(record) = self.read_here(&id)? {
                    records.push(record);
                }
            }
            Ok(records)
        })
    }

    fn on_branch<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if self.git.is_on_branch(&self.branch)? {
            f()
        } else {
            with_stash_and_branch(&self.git, &self.branch, f)
        }
    }

    fn read_here(&self, id: &str) -> Result<Option<Record>> {
        let path = self.file_path(id);
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        let record = decode(&text).map_err(|e| e.in_file(&self.key(id)))?;
        Ok(Some(record))
    }

    fn write_here(&self, id: &str, record: &Record) -> Result<PathBuf> {
        let text = encode(record)?;
        let path = self.file_path(id);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.dir());
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(path)
    }

    fn ids_here(&self) -> Result<Vec<String>> {
        let dir = self.dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}
