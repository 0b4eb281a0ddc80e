//! Core module - git plumbing, storage and shared types

pub mod adapter;
pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod identity;
pub mod search;
pub mod settings;
pub mod store;
pub mod transaction;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::GitAdapter;
pub use config::Config;
pub use context::Context;
pub use error::{KoodError, Result};
pub use git::{Git, GitError, GitOutput};
pub use settings::Settings;
pub use store::{Change, Entity, Store, Tracked};
