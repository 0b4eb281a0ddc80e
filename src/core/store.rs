//! Typed entity storage with change tracking

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yml::Value;

use crate::core::adapter::GitAdapter;
use crate::core::error::{KoodError, Result};
use crate::core::search;
use crate::yaml::{CodecError, Record};

/// A record type kept in a [`Store`]
pub trait Entity: Serialize + DeserializeOwned + Clone {
    /// Human readable name used in errors ("board", "list", "card")
    const KIND: &'static str;

    /// Unique identifier, also the file stem
    fn id(&self) -> &str;

    /// Check field constraints before anything is written
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Serialize an entity into a record
pub fn to_record<T: Entity>(entity: &T) -> Result<Record> {
    let value = serde_yml::to_value(entity).map_err(|e| CodecError::new(e.to_string()))?;
    match value {
        Value::Mapping(record) => Ok(record),
        _ => Err(CodecError::new(format!("{} is not stored as a mapping", T::KIND)).into()),
    }
}

/// Deserialize an entity from a record
pub fn from_record<T: Entity>(record: Record) -> Result<T> {
    serde_yml::from_value(Value::Mapping(record))
        .map_err(|e| KoodError::from(CodecError::new(e.to_string())))
}

/// Old and new value of one attribute. `None` means absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// An entity together with the record it was last persisted as
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    entity: T,
    snapshot: Option<Record>,
}

impl<T: Entity> Tracked<T> {
    /// A value that has never been persisted
    pub fn new(entity: T) -> Self {
        Self {
            entity,
            snapshot: None,
        }
    }

    fn persisted(entity: T, snapshot: Record) -> Self {
        Self {
            entity,
            snapshot: Some(snapshot),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Attributes that differ from the last persisted state
    pub fn changes(&self) -> Result<BTreeMap<String, Change>> {
        let current = to_record(&self.entity)?;
        let empty = Record::new();
        let snapshot = self.snapshot.as_ref().unwrap_or(&empty);

        let mut changes = BTreeMap::new();
        for (key, new) in &current {
            let old = snapshot.get(key);
            if old != Some(new) {
                changes.insert(
                    key_name(key),
                    Change {
                        old: old.cloned(),
                        new: Some(new.clone()),
                    },
                );
            }
        }
        for (key, old) in snapshot {
            if !current.contains_key(key) {
                changes.insert(
                    key_name(key),
                    Change {
                        old: Some(old.clone()),
                        new: None,
                    },
                );
            }
        }
        Ok(changes)
    }

    pub fn is_changed(&self) -> Result<bool> {
        Ok(!self.changes()?.is_empty())
    }

    pub fn into_inner(self) -> T {
        self.entity
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entity
    }
}

impl<T> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.entity
    }
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// CRUD over the records of one adapter
#[derive(Debug, Clone)]
pub struct Store<T> {
    adapter: GitAdapter,
    marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Store<T> {
    pub fn new(adapter: GitAdapter) -> Self {
        Self {
            adapter,
            marker: PhantomData,
        }
    }

    pub fn adapter(&self) -> &GitAdapter {
        &self.adapter
    }

    pub fn ids(&self) -> Result<Vec<String>> {
        self.adapter.ids()
    }

    pub fn exists(&self, id: &str) -> Result<bool> {
        self.adapter.exists(id)
    }

    pub fn all(&self) -> Result<Vec<Tracked<T>>> {
        self.adapter.list()?.into_iter().map(hydrate).collect()
    }

    pub fn get(&self, id: &str) -> Result<Option<Tracked<T>>> {
        self.adapter.read(id)?.map(hydrate).transpose()
    }

    pub fn fetch(&self, id: &str) -> Result<Tracked<T>> {
        self.get(id)?.ok_or_else(|| KoodError::not_found(T::KIND, id))
    }

    /// Validate, check the id is free and write a new entity
    pub fn create(&self, entity: T) -> Result<Tracked<T>> {
        entity.validate()?;
        if self.exists(entity.id())? {
            return Err(KoodError::NotUnique {
                kind: T::KIND,
                id: entity.id().to_string(),
            });
        }

        let record = to_record(&entity)?;
        self.adapter.write(entity.id(), &record)?;
        tracing::debug!(kind = T::KIND, id = entity.id(), "created");
        Ok(Tracked::persisted(entity, record))
    }

    /// Persist `tracked` if it changed. Returns whether anything was written.
    pub fn save(&self, tracked: &mut Tracked<T>) -> Result<bool> {
        let record = to_record(&tracked.entity)?;
        if tracked.snapshot.as_ref() == Some(&record) {
            return Ok(false);
        }

        tracked.entity.validate()?;
        self.adapter.write(tracked.entity.id(), &record)?;
        tracked.snapshot = Some(record);
        Ok(true)
    }

    pub fn destroy(&self, id: &str) -> Result<()> {
        if !self.adapter.delete(id)? {
            return Err(KoodError::not_found(T::KIND, id));
        }
        tracing::debug!(kind = T::KIND, id, "destroyed");
        Ok(())
    }

    /// Every entity where one of `attributes` partially matches `term`
    pub fn find_all_by_partial_attribute(
        &self,
        attributes: &[&str],
        term: &str,
    ) -> Result<Vec<Tracked<T>>> {
        search::find_all_by_partial_attribute(self.all()?, attributes, term)
    }

    /// One entity matching `term`, see [`search::find_by_partial_attribute`]
    pub fn find_by_partial_attribute(
        &self,
        attributes: &[&str],
        term: &str,
        unique: bool,
    ) -> Result<Tracked<T>> {
        search::find_by_partial_attribute(self.all()?, attributes, term, unique)
    }
}

/// Build a tracked value whose snapshot is the entity's own serialization,
/// so formatting differences in the file never count as changes
fn hydrate<T: Entity>(record: Record) -> Result<Tracked<T>> {
    let entity: T = from_record(record)?;
    let snapshot = to_record(&entity)?;
    Ok(Tracked::persisted(entity, snapshot))
}
