//! List entity - an ordered column of cards on a board

use serde::{Deserialize, Serialize};

use crate::core::error::{KoodError, Result};
use crate::core::identity::validate_slug;
use crate::core::store::{Entity, Tracked};
use crate::entities::board::Board;

/// Directory of list records on a board branch
pub const PATH: &str = "lists";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: String,

    /// Ids of the list's cards, in the order they were added
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub card_ids: Vec<String>,
}

impl Entity for List {
    const KIND: &'static str = "list";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<()> {
        validate_slug(&self.id, &[])
            .map_err(|e| KoodError::validation(Self::KIND, "id", e.to_string()))
    }
}

impl List {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            card_ids: Vec::new(),
        }
    }
}

impl Tracked<Board> {
    /// Create a list and append it to the board
    pub fn create_list(&mut self, id: &str) -> Result<Tracked<List>> {
        let list = self.list_store().create(List::new(id))?;
        self.list_ids.push(list.id.clone());
        self.save()?;
        Ok(list)
    }

    pub fn get_list(&self, id: &str) -> Result<Option<Tracked<List>>> {
        self.list_store().get(id)
    }

    pub fn fetch_list(&self, id: &str) -> Result<Tracked<List>> {
        self.list_store().fetch(id)
    }

    /// Lists in board order; lists the board does not reference come last
    pub fn lists(&self) -> Result<Vec<Tracked<List>>> {
        let mut lists = self.list_store().all()?;
        lists.sort_by_key(|list| {
            self.list_ids
                .iter()
                .position(|id| *id == list.id)
                .unwrap_or(usize::MAX)
        });
        Ok(lists)
    }

    /// Destroy a list together with every card on it
    pub fn destroy_list(&mut self, id: &str) -> Result<()> {
        let list = self.fetch_list(id)?;
        let cards = self.card_store();
        for card in cards.all()? {
            if card.list_id == list.id {
                cards.destroy(&card.id)?;
            }
        }

        self.list_store().destroy(id)?;
        self.list_ids.retain(|l| l != id);
        self.save()?;
        tracing::debug!(board = %self.id, list = id, "destroyed list");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::scratch_context;

    fn board() -> (tempfile::TempDir, Tracked<Board>) {
        let (tmp, mut ctx) = scratch_context();
        let board = Board::create(&mut ctx, "foo", None).unwrap();
        (tmp, board)
    }

    #[test]
    fn test_create_list() {
        let (_tmp, mut board) = board();
        let list = board.create_list("todo").unwrap();

        assert_eq!(list.id, "todo");
        assert_eq!(board.list_ids, vec!["todo"]);
        assert_eq!(board.fetch_list("todo").unwrap().id, "todo");
        assert!(board.get_list("done").unwrap().is_none());
    }

    #[test]
    fn test_list_ids_are_unique_per_board() {
        let (_tmp, mut board) = board();
        board.create_list("todo").unwrap();

        let err = board.create_list("todo").unwrap_err();
        assert!(matches!(err, KoodError::NotUnique { kind: "list", .. }));
        assert_eq!(board.list_ids, vec!["todo"]);
        board.create_list("done").unwrap();
    }

    #[test]
    fn test_invalid_list_id() {
        let (_tmp, mut board) = board();
        let err = board.create_list("to do").unwrap_err();
        assert!(matches!(err, KoodError::Validation { kind: "list", field: "id", .. }));
        assert!(board.lists().unwrap().is_empty());
    }

    #[test]
    fn test_lists_follow_board_order() {
        let (_tmp, mut board) = board();
        for id in ["todo", "doing", "done"] {
            board.create_list(id).unwrap();
        }

        let ids: Vec<_> = board.lists().unwrap().iter().map(|l| l.id.clone()).collect();
        assert_eq!(ids, vec!["todo", "doing", "done"]);
    }

    #[test]
    fn test_destroy_list_cascades_to_cards() {
        let (_tmp, mut board) = board();
        board.create_list("todo").unwrap();
        board.create_list("done").unwrap();
        board.create_card("todo", "Write docs").unwrap();
        let kept = board.create_card("done", "Ship it").unwrap();

        board.destroy_list("todo").unwrap();

        assert_eq!(board.list_ids, vec!["done"]);
        assert!(board.get_list("todo").unwrap().is_none());
        let remaining: Vec<_> = board.cards().unwrap().iter().map(|c| c.id.clone()).collect();
        assert_eq!(remaining, vec![kept.id.clone()]);

        assert!(matches!(
            board.destroy_list("todo").unwrap_err(),
            KoodError::NotFound { kind: "list", .. }
        ));
    }
}
