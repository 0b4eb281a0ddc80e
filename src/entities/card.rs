//! Card entity - a front-matter document on a board branch
//!
//! Cards are stored as `cards/<id>.md`: typed attributes in the YAML
//! header, the description as the document body. Attributes the schema does
//! not know about live in the open `more` map.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{KoodError, Result};
use crate::core::identity::{new_card_id, short_id};
use crate::core::search::attribute_names;
use crate::core::store::{from_record, to_record, Entity, Store, Tracked};
use crate::core::transaction::{settle, with_stash_and_branch};
use crate::entities::board::{Board, Member};
use crate::entities::list::List;
use crate::yaml::decode;

/// Directory of card records on a board branch
pub const PATH: &str = "cards";

/// Card files are markdown documents with a YAML header
pub const EXTENSION: &str = "md";

/// Attributes searched when a card is named on the command line
pub const LOOKUP_ATTRIBUTES: &str = "id_or_title";

/// Typed attributes that only hold a list of strings
const LIST_ATTRIBUTES: [&str; 2] = ["participants", "labels"];

/// Typed attributes that hold a single value
const SCALAR_ATTRIBUTES: [&str; 4] = ["title", "content", "position", "date"];

/// Value of a user-defined attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    fn into_strings(self) -> Vec<String> {
        match self {
            AttrValue::List(items) => items.iter().map(AttrValue::to_string).collect(),
            AttrValue::Null => Vec::new(),
            other => vec![other.to_string()],
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Integer(i) => Some(*i as f64),
            AttrValue::Float(f) => Some(*f),
            AttrValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => Ok(()),
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Integer(i) => write!(f, "{}", i),
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::List(items) => {
                let items: Vec<String> = items.iter().map(AttrValue::to_string).collect();
                write!(f, "{}", items.join(", "))
            }
            AttrValue::Map(map) => {
                let pairs: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{}", pairs.join(", "))
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,

    pub list_id: String,

    pub title: String,

    /// Document body
    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    /// Manual ordering within the list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,

    #[serde(default = "now")]
    pub date: DateTime<Utc>,

    /// User-defined attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub more: BTreeMap<String, AttrValue>,
}

impl Entity for Card {
    const KIND: &'static str = "card";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(KoodError::validation(Self::KIND, "title", "must not be empty"));
        }
        if self.list_id.trim().is_empty() {
            return Err(KoodError::validation(Self::KIND, "list_id", "must not be empty"));
        }
        Ok(())
    }
}

impl Card {
    pub fn new(list_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: new_card_id(),
            list_id: list_id.into(),
            title: title.into(),
            content: String::new(),
            participants: Vec::new(),
            labels: Vec::new(),
            position: None,
            date: Utc::now(),
            more: BTreeMap::new(),
        }
    }

    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    /// Assign an attribute. Known attributes go to their typed field,
    /// everything else (including `id`, `list`, `list_id` and `more`) is
    /// stored as a user-defined attribute.
    pub fn set(&mut self, key: &str, value: AttrValue) -> Result<()> {
        match key {
            "title" => self.title = value.to_string(),
            "content" => self.content = value.to_string(),
            "participants" => self.participants = value.into_strings(),
            "labels" => self.labels = value.into_strings(),
            "position" => {
                let position = value
                    .as_f64()
                    .ok_or_else(|| KoodError::validation(Self::KIND, "position", "must be a number"))?;
                self.position = Some(position);
            }
            "date" => self.date = parse_date(&value.to_string())?,
            _ => {
                self.more.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    /// Clear an attribute. `title` and `date` cannot be cleared; for the
    /// reserved keys only a user-defined attribute of that name is removed.
    pub fn unset(&mut self, key: &str) {
        match key {
            "content" => self.content.clear(),
            "participants" => self.participants.clear(),
            "labels" => self.labels.clear(),
            "position" => self.position = None,
            "title" | "date" => {}
            _ => {
                self.more.remove(key);
            }
        }
    }

    /// Append to a list attribute. Participants are resolved against
    /// `members` so a partial name becomes `Name <email>`.
    pub fn add(&mut self, key: &str, values: &[String], members: &[Member]) -> Result<()> {
        match key {
            "participants" => {
                for value in values {
                    let participant = resolve_participant(value, members)?;
                    if !self.participants.contains(&participant) {
                        self.participants.push(participant);
                    }
                }
            }
            "labels" => {
                for value in values {
                    if !self.labels.contains(value) {
                        self.labels.push(value.clone());
                    }
                }
            }
            _ if SCALAR_ATTRIBUTES.contains(&key) => return Err(not_a_list(key)),
            _ => {
                let entry = self
                    .more
                    .entry(key.to_string())
                    .or_insert_with(|| AttrValue::List(Vec::new()));
                let added = values.iter().map(|v| AttrValue::from(v.as_str()));
                match entry {
                    AttrValue::List(items) => items.extend(added),
                    AttrValue::Map(_) => return Err(not_a_list(key)),
                    scalar => {
                        let mut items = if matches!(*scalar, AttrValue::Null) {
                            Vec::new()
                        } else {
                            vec![scalar.clone()]
                        };
                        items.extend(added);
                        *scalar = AttrValue::List(items);
                    }
                }
            }
        }
        Ok(())
    }

    /// Remove values from a list attribute
    pub fn remove(&mut self, key: &str, values: &[String], members: &[Member]) -> Result<()> {
        match key {
            "participants" => {
                for value in values {
                    let participant = resolve_participant(value, members)?;
                    self.participants
                        .retain(|p| *p != participant && p != value);
                }
            }
            "labels" => self.labels.retain(|l| !values.contains(l)),
            _ if SCALAR_ATTRIBUTES.contains(&key) => return Err(not_a_list(key)),
            _ => match self.more.get_mut(key) {
                Some(AttrValue::List(items)) => items.retain(|i| !values.contains(&i.to_string())),
                Some(_) => return Err(not_a_list(key)),
                None => {}
            },
        }
        Ok(())
    }

    /// Attributes worth showing beside title and body, in display order
    pub fn extra_attributes(&self) -> Vec<(String, String)> {
        let mut attributes = Vec::new();
        if !self.participants.is_empty() {
            attributes.push(("participants".to_string(), self.participants.join(", ")));
        }
        if !self.labels.is_empty() {
            attributes.push(("labels".to_string(), self.labels.join(", ")));
        }
        if let Some(position) = self.position {
            attributes.push(("position".to_string(), position.to_string()));
        }
        for (key, value) in &self.more {
            attributes.push((key.clone(), value.to_string()));
        }
        attributes
    }
}

fn resolve_participant(value: &str, members: &[Member]) -> Result<String> {
    Ok(Member::find(members, value)?
        .map(|member| member.to_string())
        .unwrap_or_else(|| value.to_string()))
}

fn not_a_list(key: &str) -> KoodError {
    let field = LIST_ATTRIBUTES
        .iter()
        .chain(SCALAR_ATTRIBUTES.iter())
        .find(|k| **k == key)
        .copied()
        .unwrap_or("more");
    KoodError::validation(Card::KIND, field, format!("'{}' is not a list attribute", key))
}

fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| KoodError::validation(Card::KIND, "date", "expected YYYY-MM-DD or RFC 3339"))
}

impl Tracked<Board> {
    pub fn cards(&self) -> Result<Vec<Tracked<Card>>> {
        self.card_store().all()
    }

    /// Cards of `list`: positioned cards first, then the list's own order
    pub fn cards_in(&self, list: &List) -> Result<Vec<Tracked<Card>>> {
        let rank = |card: &Card| {
            list.card_ids
                .iter()
                .position(|id| *id == card.id)
                .unwrap_or(usize::MAX)
        };

        let mut cards: Vec<Tracked<Card>> = self
            .cards()?
            .into_iter()
            .filter(|card| card.list_id == list.id)
            .collect();

        cards.sort_by(|a, b| match (a.position, b.position) {
            (Some(x), Some(y)) => x
                .partial_cmp(&y)
                .unwrap_or(Ordering::Equal)
                .then_with(|| rank(&**a).cmp(&rank(&**b))),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => rank(&**a).cmp(&rank(&**b)),
        });
        Ok(cards)
    }

    /// Create a card at the end of `list_id`
    pub fn create_card(&self, list_id: &str, title: &str) -> Result<Tracked<Card>> {
        let mut list = self.fetch_list(list_id)?;
        let card = self.card_store().create(Card::new(list_id, title))?;
        list.card_ids.push(card.id.clone());
        self.list_store().save(&mut list)?;
        Ok(card)
    }

    /// Find a card by a fragment of its id or title
    pub fn find_card(&self, term: &str, unique: bool) -> Result<Tracked<Card>> {
        self.card_store()
            .find_by_partial_attribute(&attribute_names(LOOKUP_ATTRIBUTES), term, unique)
    }

    pub fn find_cards(&self, term: &str) -> Result<Vec<Tracked<Card>>> {
        self.card_store()
            .find_all_by_partial_attribute(&attribute_names(LOOKUP_ATTRIBUTES), term)
    }

    /// Persist card changes. Returns whether anything was written.
    pub fn save_card(&self, card: &mut Tracked<Card>) -> Result<bool> {
        self.card_store().save(card)
    }

    /// Delete a card and detach it from its list
    pub fn destroy_card(&self, id: &str) -> Result<()> {
        let cards = self.card_store();
        let card = cards.fetch(id)?;
        if let Some(mut list) = self.get_list(&card.list_id)? {
            list.card_ids.retain(|c| c != id);
            self.list_store().save(&mut list)?;
        }
        cards.destroy(id)
    }

    /// Copy a card under a new id, into `list_id` or its own list
    pub fn copy_card(&self, card: &Card, list_id: Option<&str>) -> Result<Tracked<Card>> {
        let target = list_id.unwrap_or(&card.list_id);
        let mut list = self.fetch_list(target)?;

        let mut copy = card.clone();
        copy.id = new_card_id();
        copy.list_id = target.to_string();
        copy.date = Utc::now();

        let copy = self.card_store().create(copy)?;
        list.card_ids.push(copy.id.clone());
        self.list_store().save(&mut list)?;
        Ok(copy)
    }

    /// Round-trip a card through an external editor.
    ///
    /// The card file is written to the working tree and `editor` is called
    /// with its path; it returns whether the edit should be considered.
    /// The working tree is always hard-reset before the branch is restored.
    /// Returns whether a change was persisted.
    pub fn edit_card<F>(&self, card: &mut Tracked<Card>, editor: F) -> Result<bool>
    where
        F: FnOnce(&Path) -> bool,
    {
        let git = self.git();
        let store = self.card_store();
        with_stash_and_branch(&git, &self.id, || {
            let edited = edit_in_place(&store, card, editor);
            settle(edited, git.reset_hard().map_err(KoodError::from), "reset after edit")
        })
    }
}

fn edit_in_place<F>(store: &Store<Card>, card: &mut Tracked<Card>, editor: F) -> Result<bool>
where
    F: FnOnce(&Path) -> bool,
{
    let adapter = store.adapter();
    let path = adapter.write_file(&card.id, &to_record(&**card)?)?;
    if !editor(&path) {
        return Ok(false);
    }

    let text = fs::read_to_string(&path)?;
    let record = decode(&text).map_err(|e| e.in_file(&adapter.key(&card.id)))?;
    let mut edited: Card = from_record(record)?;
    edited.id = card.id.clone();
    edited.list_id = card.list_id.clone();

    **card = edited;
    store.save(card)
}
