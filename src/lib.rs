//! kood: kanban boards kept in git
//!
//! Every board lives on its own branch of a storage repository. Lists and
//! cards are plain YAML and Markdown files on that branch, committed on
//! every change.

pub mod cli;
pub mod core;
pub mod entities;
pub mod yaml;
