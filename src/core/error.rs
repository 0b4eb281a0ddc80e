//! Error types shared by the storage core

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::git::GitError;
use crate::yaml::CodecError;

/// Result type used throughout the core
pub type Result<T, E = KoodError> = std::result::Result<T, E>;

/// Errors raised by stores, transactions and domain models
#[derive(Debug, Error, Diagnostic)]
pub enum KoodError {
    #[error("{kind} not found: {id}")]
    #[diagnostic(code(kood::not_found))]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} already exists: {id}")]
    #[diagnostic(code(kood::not_unique))]
    NotUnique { kind: &'static str, id: String },

    #[error("{matches} {kind}s match '{term}'")]
    #[diagnostic(
        code(kood::ambiguous),
        help("use more of the title or the id to narrow the match")
    )]
    MultipleDocumentsFound {
        kind: &'static str,
        term: String,
        matches: usize,
    },

    #[error("invalid {kind} {field}: {message}")]
    #[diagnostic(code(kood::validation))]
    Validation {
        kind: &'static str,
        field: &'static str,
        message: String,
    },

    #[error("no board is selected")]
    #[diagnostic(
        code(kood::no_current_board),
        help("create a board with `kood board <id>` or select one with `kood switch <id>`")
    )]
    NoCurrentBoard,

    #[error("could not check out {branch}: {message}")]
    #[diagnostic(code(kood::checkout))]
    Checkout { branch: String, message: String },

    #[error("HEAD is detached")]
    #[diagnostic(
        code(kood::detached_head),
        help("check out a branch in the storage repository before running kood")
    )]
    DetachedHead,

    #[error("invalid config file {}: {message}", path.display())]
    #[diagnostic(code(kood::config))]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    #[diagnostic(code(kood::git))]
    Git(#[from] GitError),

    #[error("I/O error: {0}")]
    #[diagnostic(code(kood::io))]
    Io(#[from] std::io::Error),
}

impl KoodError {
    /// Shorthand for a field validation failure
    pub fn validation(kind: &'static str, field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a missing record
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}
