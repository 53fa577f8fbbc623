//! # Reference Edge Model
//!
//! Edges live in holder slots: a root variable of the scenario scope, or a named field of an object.
//! A slot holds at most one edge. This table only stores edges; count bookkeeping is done by the
//! heap so that every retain and release goes through one place.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::registry::ObjectId;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Holder {
    /// A local variable of the scenario scope.
    Root(String),
    /// A stored property of a live object.
    Field(ObjectId, String),
}

impl Holder {
    pub fn root(name: impl Into<String>) -> Self {
        Holder::Root(name.into())
    }

    pub fn field(owner: ObjectId, name: impl Into<String>) -> Self {
        Holder::Field(owner, name.into())
    }

    pub fn owner(&self) -> Option<ObjectId> {
        match self {
            Holder::Root(_) => None,
            Holder::Field(owner, _) => Some(*owner),
        }
    }

    fn slot_name(&self) -> &str {
        match self {
            Holder::Root(name) | Holder::Field(_, name) => name,
        }
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::Root(name) => write!(f, "{}", name),
            Holder::Field(owner, name) => write!(f, "{}.{}", owner, name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Strong,
    Weak,
    Unowned,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Strong => write!(f, "strong"),
            EdgeKind::Weak => write!(f, "weak"),
            EdgeKind::Unowned => write!(f, "unowned"),
        }
    }
}

/// The edge stored in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Strong(ObjectId),
    /// `None` once the target has been deinitialized.
    Weak(Option<ObjectId>),
    /// Never cleared, even after the target is gone.
    Unowned(ObjectId),
}

impl Reference {
    pub fn kind(&self) -> EdgeKind {
        match self {
            Reference::Strong(_) => EdgeKind::Strong,
            Reference::Weak(_) => EdgeKind::Weak,
            Reference::Unowned(_) => EdgeKind::Unowned,
        }
    }

    /// Target whose strong count this edge contributes to.
    pub fn strong_target(&self) -> Option<ObjectId> {
        match self {
            Reference::Strong(target) => Some(*target),
            _ => None,
        }
    }

    fn weak_target(&self) -> Option<ObjectId> {
        match self {
            Reference::Weak(target) => *target,
            _ => None,
        }
    }
}

type Slots = Vec<(String, Reference)>;

#[derive(Debug, Default)]
pub struct EdgeTable {
    /// Root variables in declaration order.
    roots: Slots,
    /// Fields per owner, in the order they were first assigned.
    fields: HashMap<ObjectId, Slots>,
    /// Reverse index: target -> holders observing it weakly.
    weak_observers: HashMap<ObjectId, BTreeSet<Holder>>,
}

impl EdgeTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self, holder: &Holder) -> Option<&Slots> {
        match holder {
            Holder::Root(_) => Some(&self.roots),
            Holder::Field(owner, _) => self.fields.get(owner),
        }
    }

    fn slots_mut(&mut self, holder: &Holder) -> &mut Slots {
        match holder {
            Holder::Root(_) => &mut self.roots,
            Holder::Field(owner, _) => self.fields.entry(*owner).or_default(),
        }
    }

    pub fn get(&self, holder: &Holder) -> Option<&Reference> {
        let name = holder.slot_name();
        self.slots(holder)?
            .iter()
            .find(|(slot, _)| slot == name)
            .map(|(_, reference)| reference)
    }

    /// Store `reference` in the slot, returning whatever it replaced.
    pub fn insert(&mut self, holder: Holder, reference: Reference) -> Option<Reference> {
        let previous = self.store(&holder, reference);

        if let Some(old) = previous.and_then(|old| old.weak_target()) {
            self.forget_observer(old, &holder);
        }
        if let Some(target) = reference.weak_target() {
            self.weak_observers.entry(target).or_default().insert(holder);
        }

        previous
    }

    fn store(&mut self, holder: &Holder, reference: Reference) -> Option<Reference> {
        let name = holder.slot_name();
        let slots = self.slots_mut(holder);
        match slots.iter_mut().find(|(slot, _)| slot == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, reference)),
            None => {
                slots.push((name.to_string(), reference));
                None
            }
        }
    }

    /// Empty the slot. Emptied slots lose their position.
    pub fn remove(&mut self, holder: &Holder) -> Option<Reference> {
        let name = holder.slot_name();
        let slots = match holder {
            Holder::Root(_) => &mut self.roots,
            Holder::Field(owner, _) => self.fields.get_mut(owner)?,
        };
        let position = slots.iter().position(|(slot, _)| slot == name)?;
        let (_, reference) = slots.remove(position);

        if let Some(target) = reference.weak_target() {
            self.forget_observer(target, holder);
        }
        Some(reference)
    }

    /// Detach every field of `owner`, in assignment order.
    pub fn take_fields(&mut self, owner: ObjectId) -> Slots {
        let slots = self.fields.remove(&owner).unwrap_or_default();
        for (name, reference) in &slots {
            if let Some(target) = reference.weak_target() {
                self.forget_observer(target, &Holder::Field(owner, name.clone()));
            }
        }
        slots
    }

    /// Flip every weak edge pointing at `target` to absent. Returns the holders that were cleared.
    pub fn clear_weak_observers(&mut self, target: ObjectId) -> Vec<Holder> {
        let observers = self.weak_observers.remove(&target).unwrap_or_default();
        let mut cleared = Vec::with_capacity(observers.len());
        for holder in observers {
            self.store(&holder, Reference::Weak(None));
            cleared.push(holder);
        }
        cleared
    }

    fn forget_observer(&mut self, target: ObjectId, holder: &Holder) {
        if let Some(observers) = self.weak_observers.get_mut(&target) {
            observers.remove(holder);
            if observers.is_empty() {
                self.weak_observers.remove(&target);
            }
        }
    }

    /// Root variable names in declaration order.
    pub fn roots(&self) -> impl DoubleEndedIterator<Item = &str> + '_ {
        self.roots.iter().map(|(name, _)| name.as_str())
    }

    pub fn fields_of(&self, owner: ObjectId) -> impl Iterator<Item = (&str, &Reference)> + '_ {
        self.fields
            .get(&owner)
            .into_iter()
            .flat_map(|slots| slots.iter().map(|(name, reference)| (name.as_str(), reference)))
    }

    /// Number of strong edges currently pointing at `target`.
    pub fn strong_edges_to(&self, target: ObjectId) -> usize {
        self.roots
            .iter()
            .chain(self.fields.values().flatten())
            .filter(|(_, reference)| reference.strong_target() == Some(target))
            .count()
    }
}
