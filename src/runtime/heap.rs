//! # Heap
//!
//! Owns the registry, the edge table and the event log. Every edge mutation goes through here so
//! strong counts always match the strong edges in the table.

use serde::Serialize;
use tracing::debug;

use super::edges::{EdgeTable, Holder, Reference};
use super::events::{Event, EventKind, EventLog, Observer};
use super::registry::{ObjectId, Registry};
use crate::error::{Result, SimError};

/// Counters for retain/release traffic.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeapStats {
    pub allocations: u64,
    pub retains: u64,
    pub releases: u64,
    pub deallocations: u64,
}

#[derive(Debug, Default)]
pub struct Heap {
    pub(crate) registry: Registry,
    pub(crate) edges: EdgeTable,
    pub(crate) log: EventLog,
    pub(crate) stats: HeapStats,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.log.subscribe(observer);
    }

    pub fn create(&mut self, label: impl Into<String>) -> ObjectId {
        let label = label.into();
        let id = self.registry.create(label.clone());
        self.stats.allocations += 1;
        debug!(object = %id, label = %label, "initialized");
        self.log.record(Event::initialized(label));
        id
    }

    pub fn is_live(&self, id: ObjectId) -> Result<bool> {
        self.registry.is_live(id)
    }

    pub fn label(&self, id: ObjectId) -> Result<&str> {
        self.registry.label(id)
    }

    pub fn strong_count(&self, id: ObjectId) -> Result<usize> {
        self.registry.strong_count(id)
    }

    pub fn set_strong(&mut self, holder: Holder, target: ObjectId) -> Result<()> {
        self.check_assignable(&holder, target)?;
        if self.edges.get(&holder) == Some(&Reference::Strong(target)) {
            return Ok(());
        }

        // Retain first: the old target may be the only owner of the new one.
        self.retain(target)?;
        let previous = self.edges.insert(holder, Reference::Strong(target));
        self.release_previous(previous)
    }

    pub fn set_weak(&mut self, holder: Holder, target: ObjectId) -> Result<()> {
        self.check_assignable(&holder, target)?;
        let previous = self.edges.insert(holder, Reference::Weak(Some(target)));
        self.release_previous(previous)
    }

    pub fn set_unowned(&mut self, holder: Holder, target: ObjectId) -> Result<()> {
        self.check_assignable(&holder, target)?;
        let previous = self.edges.insert(holder, Reference::Unowned(target));
        self.release_previous(previous)
    }

    /// Remove the strong edge in `holder`. Slots holding nothing, or a weak/unowned edge, are left alone.
    pub fn clear_strong(&mut self, holder: &Holder) -> Result<bool> {
        self.check_holder(holder)?;
        if matches!(self.edges.get(holder), Some(Reference::Strong(_))) {
            self.clear(holder)
        } else {
            Ok(false)
        }
    }

    /// Set the slot to nil, whatever kind of edge it holds.
    pub fn clear(&mut self, holder: &Holder) -> Result<bool> {
        self.check_holder(holder)?;
        match self.edges.remove(holder) {
            Some(reference) => {
                debug!(holder = %holder, kind = %reference.kind(), "cleared");
                self.release_previous(Some(reference))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Read the object a slot refers to.
    pub fn read(&self, holder: &Holder) -> Result<Option<ObjectId>> {
        self.check_holder(holder)?;
        match self.edges.get(holder) {
            None => Ok(None),
            Some(Reference::Strong(target)) => Ok(Some(*target)),
            Some(Reference::Weak(target)) => Ok(*target),
            Some(Reference::Unowned(target)) => {
                let record = self.registry.get(*target)?;
                if record.live {
                    Ok(Some(*target))
                } else {
                    Err(SimError::DanglingUnownedAccess {
                        holder: holder.clone(),
                        label: record.label.clone(),
                    })
                }
            }
        }
    }

    /// Clear every root variable, last declared first.
    pub fn end_scope(&mut self) -> Result<()> {
        let roots: Vec<String> = self.edges.roots().rev().map(str::to_string).collect();
        for name in roots {
            self.clear(&Holder::Root(name))?;
        }
        Ok(())
    }

    pub fn events(&self) -> &[Event] {
        self.log.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.log.take()
    }

    pub fn deinit_count(&self) -> usize {
        self.log.count(EventKind::Deinitialized)
    }

    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    pub fn live_objects(&self) -> Vec<ObjectId> {
        self.registry.live_objects().collect()
    }

    pub fn edges(&self) -> &EdgeTable {
        &self.edges
    }

    /// Field holders must belong to an object that still exists. Roots are always valid.
    fn check_holder(&self, holder: &Holder) -> Result<()> {
        match holder.owner() {
            Some(owner) => self.registry.get(owner).map(|_| ()),
            None => Ok(()),
        }
    }

    fn check_assignable(&self, holder: &Holder, target: ObjectId) -> Result<()> {
        if let Some(owner) = holder.owner() {
            self.registry.live(owner)?;
        }
        self.registry.live(target).map(|_| ())
    }

    fn release_previous(&mut self, previous: Option<Reference>) -> Result<()> {
        match previous.and_then(|reference| reference.strong_target()) {
            Some(old) => self.release(old),
            None => Ok(()),
        }
    }
}
