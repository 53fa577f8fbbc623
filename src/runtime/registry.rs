//! # Object Registry
//!
//! Tracks every object the simulation has created, its label and its strong count.
//! Destroyed objects stay behind as tombstones so their label and liveness can still be queried.

use serde::Serialize;
use std::fmt;

use crate::error::{Result, SimError};

/// Identifier handed out by [`Registry::create`]. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ObjectRecord {
    pub label: String,
    pub strong_count: usize,
    pub live: bool,
}

#[derive(Debug, Default)]
pub struct Registry {
    objects: Vec<ObjectRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { objects: Vec::new() }
    }

    /// Register a new live object with a strong count of zero.
    pub fn create(&mut self, label: impl Into<String>) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(ObjectRecord {
            label: label.into(),
            strong_count: 0,
            live: true,
        });
        id
    }

    pub fn get(&self, id: ObjectId) -> Result<&ObjectRecord> {
        self.objects
            .get(id.0)
            .ok_or(SimError::UnknownObjectReference(id))
    }

    pub(crate) fn get_mut(&mut self, id: ObjectId) -> Result<&mut ObjectRecord> {
        self.objects
            .get_mut(id.0)
            .ok_or(SimError::UnknownObjectReference(id))
    }

    /// Like [`Registry::get`], but a tombstone is reported as unknown.
    pub fn live(&self, id: ObjectId) -> Result<&ObjectRecord> {
        match self.get(id)? {
            record if record.live => Ok(record),
            _ => Err(SimError::UnknownObjectReference(id)),
        }
    }

    pub fn is_live(&self, id: ObjectId) -> Result<bool> {
        Ok(self.get(id)?.live)
    }

    pub fn label(&self, id: ObjectId) -> Result<&str> {
        Ok(self.get(id)?.label.as_str())
    }

    pub fn strong_count(&self, id: ObjectId) -> Result<usize> {
        Ok(self.get(id)?.strong_count)
    }

    /// Live objects in creation order.
    pub fn live_objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, record)| record.live)
            .map(|(index, _)| ObjectId(index))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_starts_live_with_zero_count() {
        let mut registry = Registry::new();
        let id = registry.create("Dummy Dev");

        assert!(registry.is_live(id).unwrap());
        assert_eq!(registry.label(id).unwrap(), "Dummy Dev");
        assert_eq!(registry.strong_count(id).unwrap(), 0);
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut registry = Registry::new();
        let a = registry.create("a");
        let b = registry.create("b");

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unknown_id() {
        let registry = Registry::new();
        let missing = ObjectId(7);

        assert_eq!(
            registry.is_live(missing),
            Err(SimError::UnknownObjectReference(missing))
        );
        assert!(registry.label(missing).is_err());
    }

    #[test]
    fn test_queries_have_no_side_effects() {
        let mut registry = Registry::new();
        let id = registry.create("Swift");

        for _ in 0..3 {
            assert!(registry.is_live(id).unwrap());
            assert_eq!(registry.label(id).unwrap(), "Swift");
        }
        assert_eq!(registry.strong_count(id).unwrap(), 0);
    }

    #[test]
    fn test_tombstones_are_not_live() {
        let mut registry = Registry::new();
        let a = registry.create("a");
        let b = registry.create("b");
        registry.get_mut(a).unwrap().live = false;

        assert_eq!(registry.live_objects().collect::<Vec<_>>(), vec![b]);
        assert_eq!(registry.label(a).unwrap(), "a");
        assert!(registry.live(a).is_err());
    }
}
