//! Command implementations

pub mod board;
pub mod card;
pub mod completions;
pub mod edit;
pub mod list;
pub mod switch;
pub mod sync;
