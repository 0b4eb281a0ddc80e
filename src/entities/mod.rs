//! Kanban entities stored on board branches

pub mod board;
pub mod card;
pub mod list;

pub use board::{Board, Member};
pub use card::{AttrValue, Card};
pub use list::List;
