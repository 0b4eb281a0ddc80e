//! Board entity - one git branch per board
//!
//! The branch is the board's lifetime container: creating a board creates
//! an orphan branch, deleting it deletes the branch. The board record itself
//! lives at `<board-id>.yml` on that branch and keeps the order of its lists.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::adapter::GitAdapter;
use crate::core::context::Context;
use crate::core::error::{KoodError, Result};
use crate::core::git::{Git, GitOutput, ANCHOR_BRANCH};
use crate::core::identity::validate_slug;
use crate::core::search::partial_pattern;
use crate::core::store::{Entity, Store, Tracked};
use crate::core::transaction::{checkout, with_stash, with_stash_and_branch};
use crate::entities::card::{self, Card};
use crate::entities::list::{self, List};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,

    /// External repository holding this board's branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_repo: Option<PathBuf>,

    /// Ids of the board's lists, in display order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list_ids: Vec<String>,

    /// Root of the repository the board was loaded from
    #[serde(skip)]
    root: PathBuf,
}

impl Entity for Board {
    const KIND: &'static str = "board";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<()> {
        validate_slug(&self.id, &[ANCHOR_BRANCH])
            .map_err(|e| KoodError::validation(Self::KIND, "id", e.to_string()))
    }
}

impl Board {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            custom_repo: None,
            list_ids: Vec::new(),
            root: PathBuf::new(),
        }
    }

    fn store(git: &Git, id: &str) -> Store<Board> {
        Store::new(GitAdapter::new(git.clone(), id))
    }

    /// Ids of every board in the default storage and registered custom
    /// repositories, sorted
    pub fn ids(ctx: &Context) -> Result<Vec<String>> {
        let mut ids: Vec<String> = ctx
            .repo()
            .branches()?
            .into_iter()
            .filter(|b| b != ANCHOR_BRANCH)
            .collect();

        for (id, path) in &ctx.config().custom_repos {
            if !ids.contains(id) && Git::new(path).branch_exists(id) {
                ids.push(id.clone());
            }
        }

        ids.sort();
        Ok(ids)
    }

    pub fn all(ctx: &Context) -> Result<Vec<Tracked<Board>>> {
        let mut boards = Vec::new();
        for id in Self::ids(ctx)? {
            if let Some(board) = Self::get(ctx, &id)? {
                boards.push(board);
            }
        }
        Ok(boards)
    }

    pub fn exists(ctx: &Context, id: &str) -> bool {
        id != ANCHOR_BRANCH && ctx.repo_for(id).branch_exists(id)
    }

    pub fn get(ctx: &Context, id: &str) -> Result<Option<Tracked<Board>>> {
        if !Self::exists(ctx, id) {
            return Ok(None);
        }

        let git = ctx.repo_for(id);
        let mut board = match Self::store(&git, id).get(id)? {
            Some(board) => board,
            None => Tracked::new(Board::new(id)),
        };
        board.root = git.root().to_path_buf();
        Ok(Some(board))
    }

    pub fn fetch(ctx: &Context, id: &str) -> Result<Tracked<Board>> {
        Self::get(ctx, id)?.ok_or_else(|| KoodError::not_found(Self::KIND, id))
    }

    /// Create a board, optionally inside an external repository.
    ///
    /// The first board that exists is selected automatically.
    pub fn create(ctx: &mut Context, id: &str, custom_repo: Option<&Path>) -> Result<Tracked<Board>> {
        let mut board = Board::new(id);
        board.validate()?;

        let git = match custom_repo {
            Some(path) => Git::init_storage(path)?,
            None => ctx.repo().clone(),
        };
        if Self::ids(ctx)?.iter().any(|b| b == id) || git.branch_exists(id) {
            return Err(KoodError::NotUnique {
                kind: Self::KIND,
                id: id.to_string(),
            });
        }

        git.create_orphan_branch(id, &format!("Create board {}", id))?;
        if custom_repo.is_some() {
            board.custom_repo = Some(git.root().to_path_buf());
        }
        board.root = git.root().to_path_buf();

        let board = match Self::store(&git, id).create(board) {
            Ok(board) => board,
            Err(e) => {
                if let Err(cleanup) = git.delete_branch(id) {
                    tracing::warn!(board = id, error = %cleanup, "could not remove branch of failed board");
                }
                return Err(e);
            }
        };

        if custom_repo.is_some() {
            let root = git.root().to_path_buf();
            ctx.update_config(|config| {
                config.custom_repos.insert(id.to_string(), root);
            })?;
        }

        if Self::ids(ctx)?.len() == 1 {
            board.select(ctx)?;
        }

        tracing::debug!(board = id, root = %git.root().display(), "created board");
        Ok(board)
    }

    /// The selected board, if any
    pub fn current(ctx: &Context) -> Result<Option<Tracked<Board>>> {
        match &ctx.config().current_board_id {
            Some(id) => Self::get(ctx, id),
            None => Ok(None),
        }
    }

    pub fn current_required(ctx: &Context) -> Result<Tracked<Board>> {
        Self::current(ctx)?.ok_or(KoodError::NoCurrentBoard)
    }

    /// Make this the current board
    pub fn select(&self, ctx: &mut Context) -> Result<()> {
        let id = self.id.clone();
        ctx.update_config(|config| config.current_board_id = Some(id))?;
        Ok(())
    }

    pub fn is_current(&self, ctx: &Context) -> bool {
        ctx.config().current_board_id.as_deref() == Some(self.id.as_str())
    }

    /// Delete the board's branch and forget it in the config
    pub fn delete(&self, ctx: &mut Context) -> Result<()> {
        let git = self.git();
        if git.is_on_branch(&self.id)? {
            with_stash(&git, || checkout(&git, ANCHOR_BRANCH))?;
        }
        git.delete_branch(&self.id)?;

        let id = self.id.clone();
        ctx.update_config(|config| {
            if config.current_board_id.as_deref() == Some(id.as_str()) {
                config.current_board_id = None;
            }
            config.custom_repos.remove(&id);
        })?;

        tracing::debug!(board = %self.id, "deleted board");
        Ok(())
    }

    /// Repository holding the board's branch
    pub fn git(&self) -> Git {
        Git::new(&self.root)
    }

    pub fn list_store(&self) -> Store<List> {
        Store::new(GitAdapter::new(self.git(), self.id.as_str()).with_path(list::PATH))
    }

    pub fn card_store(&self) -> Store<Card> {
        Store::new(
            GitAdapter::new(self.git(), self.id.as_str())
                .with_path(card::PATH)
                .with_extension(card::EXTENSION),
        )
    }

    /// Pull the board branch from `remote`
    pub fn pull(&self, remote: &str) -> Result<GitOutput> {
        let git = self.git();
        with_stash_and_branch(&git, &self.id, || Ok(git.pull(remote, &self.id)?))
    }

    /// Push the board branch to `remote`
    pub fn push(&self, remote: &str) -> Result<GitOutput> {
        let git = self.git();
        with_stash_and_branch(&git, &self.id, || Ok(git.push(remote, &self.id)?))
    }

    /// Pull, then push only if the pull succeeded
    pub fn sync(&self, remote: &str) -> Result<GitOutput> {
        sync_with(|| self.pull(remote), || self.push(remote))
    }

    /// Whether the board branch exists on `remote`
    pub fn is_published(&self, remote: &str) -> bool {
        self.git().remote_branch_exists(remote, &self.id)
    }

    /// Everyone who has committed to the board
    pub fn potential_members(&self) -> Result<Vec<Member>> {
        Ok(self
            .git()
            .authors(&self.id)?
            .into_iter()
            .map(|(name, email)| Member { name, email })
            .collect())
    }

    pub fn find_potential_member(&self, term: &str) -> Result<Option<Member>> {
        Member::find(&self.potential_members()?, term)
    }
}

impl Tracked<Board> {
    /// Run `f` with the board branch checked out, so every store call
    /// inside it works on the branch directly.
    pub fn with_context<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let git = self.git();
        let id = self.id.clone();
        with_stash_and_branch(&git, &id, || f(self))
    }

    /// Persist the board record if it changed
    pub fn save(&mut self) -> Result<bool> {
        let store = Board::store(&self.git(), &self.id);
        store.save(self)
    }
}

fn sync_with(
    pull: impl FnOnce() -> Result<GitOutput>,
    push: impl FnOnce() -> Result<GitOutput>,
) -> Result<GitOutput> {
    let pulled = pull()?;
    if pulled.exit_status() != 0 {
        tracing::debug!(status = pulled.exit_status(), "pull failed, not pushing");
        return Ok(pulled);
    }
    push()
}

/// A committer on a board, written as `Name <email>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub email: String,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

impl Member {
    /// The single member whose name or email matches `term`.
    ///
    /// Several partial matches narrow to exact ones; anything but one
    /// remaining candidate yields `None`.
    pub fn find(members: &[Member], term: &str) -> Result<Option<Member>> {
        let pattern = partial_pattern(term)?;
        let mut found: Vec<&Member> = members
            .iter()
            .filter(|m| pattern.is_match(&m.name) || pattern.is_match(&m.email))
            .collect();

        if found.len() > 1 {
            let needle = term.to_lowercase();
            found.retain(|m| m.name.to_lowercase() == needle || m.email.to_lowercase() == needle);
        }

        Ok(match found.as_slice() {
            [member] => Some((*member).clone()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{init_repo, run_git, scratch_context};
    use std::cell::Cell;

    fn output(code: i32) -> GitOutput {
        GitOutput {
            success: code == 0,
            stdout: String::new(),
            stderr: String::new(),
            code: Some(code),
        }
    }

    #[test]
    fn test_create_first_board_is_selected() {
        let (_tmp, mut ctx) = scratch_context();
        let board = Board::create(&mut ctx, "foo", None).unwrap();

        assert!(board.is_current(&ctx));
        assert_eq!(Board::ids(&ctx).unwrap(), vec!["foo"]);
        assert!(ctx.repo().is_on_branch(ANCHOR_BRANCH).unwrap());
        assert_eq!(Board::current_required(&ctx).unwrap().id, "foo");
    }

    #[test]
    fn test_second_board_is_not_selected() {
        let (_tmp, mut ctx) = scratch_context();
        Board::create(&mut ctx, "foo", None).unwrap();
        let bar = Board::create(&mut ctx, "bar", None).unwrap();

        assert!(!bar.is_current(&ctx));
        assert_eq!(ctx.config().current_board_id.as_deref(), Some("foo"));

        bar.select(&mut ctx).unwrap();
        assert_eq!(Board::current(&ctx).unwrap().unwrap().id, "bar");
        assert_eq!(Board::ids(&ctx).unwrap(), vec!["bar", "foo"]);
    }

    #[test]
    fn test_board_ids_are_unique() {
        let (_tmp, mut ctx) = scratch_context();
        Board::create(&mut ctx, "foo", None).unwrap();

        let err = Board::create(&mut ctx, "foo", None).unwrap_err();
        assert!(matches!(err, KoodError::NotUnique { kind: "board", .. }));
        Board::create(&mut ctx, "foo2", None).unwrap();
    }

    #[test]
    fn test_board_id_validation() {
        let (_tmp, mut ctx) = scratch_context();
        for id in ["foo:", "foo bar", "foo@bar", "master", "HEAD", "foo.", ""] {
            let err = Board::create(&mut ctx, id, None).unwrap_err();
            assert!(
                matches!(err, KoodError::Validation { field: "id", .. }),
                "{id:?} should be rejected"
            );
        }
        assert!(Board::ids(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_rejected_head_board_leaves_repo_usable() {
        let (_tmp, mut ctx) = scratch_context();
        let err = Board::create(&mut ctx, "HEAD", None).unwrap_err();
        assert!(matches!(err, KoodError::Validation { field: "id", .. }));
        assert!(!ctx.repo().branch_exists("HEAD"));

        let mut board = Board::create(&mut ctx, "foo", None).unwrap();
        board.create_list("todo").unwrap();
        assert_eq!(Board::ids(&ctx).unwrap(), vec!["foo"]);
        assert!(ctx.repo().is_on_branch(ANCHOR_BRANCH).unwrap());
    }

    #[test]
    fn test_get_missing_board() {
        let (_tmp, ctx) = scratch_context();
        assert!(Board::get(&ctx, "nope").unwrap().is_none());
        assert!(Board::get(&ctx, ANCHOR_BRANCH).unwrap().is_none());
        assert!(matches!(
            Board::fetch(&ctx, "nope").unwrap_err(),
            KoodError::NotFound { kind: "board", .. }
        ));
    }

    #[test]
    fn test_delete_current_board() {
        let (_tmp, mut ctx) = scratch_context();
        let board = Board::create(&mut ctx, "foo", None).unwrap();

        board.delete(&mut ctx).unwrap();
        assert!(ctx.config().current_board_id.is_none());
        assert!(Board::current(&ctx).unwrap().is_none());
        assert!(matches!(
            Board::current_required(&ctx).unwrap_err(),
            KoodError::NoCurrentBoard
        ));
        assert!(!ctx.repo().branch_exists("foo"));
    }

    #[test]
    fn test_delete_checked_out_board() {
        let (_tmp, mut ctx) = scratch_context();
        Board::create(&mut ctx, "foo", None).unwrap();
        let other = Board::create(&mut ctx, "bar", None).unwrap();
        ctx.repo().checkout("bar").unwrap();

        other.delete(&mut ctx).unwrap();
        assert!(ctx.repo().is_on_branch(ANCHOR_BRANCH).unwrap());
        assert_eq!(ctx.config().current_board_id.as_deref(), Some("foo"));
    }

    #[test]
    fn test_custom_repo_board() {
        let (tmp, mut ctx) = scratch_context();
        let external = tmp.path().join("external");
        init_repo(&external);

        let board = Board::create(&mut ctx, "work", Some(&external)).unwrap();
        let root = external.canonicalize().unwrap();
        assert_eq!(board.custom_repo.as_deref(), Some(root.as_path()));
        assert_eq!(ctx.config().custom_repos.get("work"), Some(&root));
        assert!(!ctx.repo().branch_exists("work"));

        let loaded = Board::fetch(&ctx, "work").unwrap();
        assert_eq!(loaded.git().root(), root.as_path());
        assert_eq!(Board::ids(&ctx).unwrap(), vec!["work"]);

        loaded.delete(&mut ctx).unwrap();
        assert!(ctx.config().custom_repos.is_empty());
        assert!(Board::ids(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_with_context_holds_branch() {
        let (_tmp, mut ctx) = scratch_context();
        let mut board = Board::create(&mut ctx, "foo", None).unwrap();

        let inside = board
            .with_context(|board| Ok(board.git().current_branch()?))
            .unwrap();
        assert_eq!(inside.as_deref(), Some("foo"));
        assert!(ctx.repo().is_on_branch(ANCHOR_BRANCH).unwrap());
    }

    #[test]
    fn test_board_record_round_trip() {
        let (_tmp, mut ctx) = scratch_context();
        let mut board = Board::create(&mut ctx, "foo", None).unwrap();
        board.list_ids.push("todo".to_string());
        assert!(board.save().unwrap());
        assert!(!board.save().unwrap());

        let loaded = Board::fetch(&ctx, "foo").unwrap();
        assert_eq!(loaded.list_ids, vec!["todo"]);
    }

    #[test]
    fn test_sync_does_not_push_after_failed_pull() {
        let pushed = Cell::new(false);
        let result = sync_with(
            || Ok(output(1)),
            || {
                pushed.set(true);
                Ok(output(0))
            },
        )
        .unwrap();
        assert_eq!(result.exit_status(), 1);
        assert!(!pushed.get());

        let result = sync_with(
            || Ok(output(0)),
            || {
                pushed.set(true);
                Ok(output(0))
            },
        )
        .unwrap();
        assert_eq!(result.exit_status(), 0);
        assert!(pushed.get());
    }

    #[test]
    fn test_push_pull_and_publish() {
        let (tmp, mut ctx) = scratch_context();
        let board = Board::create(&mut ctx, "foo", None).unwrap();

        let upstream = tmp.path().join("upstream.git");
        std::fs::create_dir_all(&upstream).unwrap();
        run_git(&upstream, &["init", "-q", "--bare"]);
        run_git(
            ctx.repo().root(),
            &["remote", "add", "origin", &upstream.to_string_lossy()],
        );

        assert!(!board.is_published("origin"));
        let pushed = board.push("origin").unwrap();
        assert!(pushed.success, "{}", pushed.stderr);
        assert!(board.is_published("origin"));

        let synced = board.sync("origin").unwrap();
        assert_eq!(synced.exit_status(), 0, "{}", synced.stderr);
        assert!(ctx.repo().is_on_branch(ANCHOR_BRANCH).unwrap());
    }

    #[test]
    fn test_sync_without_remote_reports_failure() {
        let (_tmp, mut ctx) = scratch_context();
        let board = Board::create(&mut ctx, "foo", None).unwrap();

        let result = board.sync("nowhere").unwrap();
        assert_ne!(result.exit_status(), 0);
        assert!(ctx.repo().is_on_branch(ANCHOR_BRANCH).unwrap());
    }

    #[test]
    fn test_potential_members() {
        let (_tmp, mut ctx) = scratch_context();
        let board = Board::create(&mut ctx, "foo", None).unwrap();

        let members = board.potential_members().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].to_string(), "Test User <test@example.com>");
        assert_eq!(
            board.find_potential_member("test user").unwrap(),
            Some(members[0].clone())
        );
        assert_eq!(board.find_potential_member("nobody").unwrap(), None);
    }

    #[test]
    fn test_member_find_narrows_to_exact() {
        let members = vec![
            Member {
                name: "Ann".to_string(),
                email: "ann@example.com".to_string(),
            },
            Member {
                name: "Anna".to_string(),
                email: "anna@example.com".to_string(),
            },
        ];

        assert_eq!(Member::find(&members, "ann").unwrap(), Some(members[0].clone()));
        assert_eq!(Member::find(&members, "anna@").unwrap(), Some(members[1].clone()));
        assert_eq!(Member::find(&members, "example").unwrap(), None);
    }
}
