//! # Deallocation Engine
//!
//! Strong count bookkeeping and destruction cascades.
//!
//! When a strong count reaches zero the object is deinitialized, its weak observers are flipped
//! to absent and its own fields are released, which may take further objects down with it.
//! Cascades are depth-first in field assignment order, driven by an explicit work stack.
//!
//! There is no cycle collector. Objects that keep each other alive through strong edges stay
//! live after every root is gone; that leak is the expected outcome, not an error.

use tracing::debug;

use super::edges::Holder;
use super::events::Event;
use super::heap::Heap;
use super::registry::ObjectId;
use crate::error::Result;

impl Heap {
    pub(crate) fn retain(&mut self, target: ObjectId) -> Result<()> {
        let record = self.registry.get_mut(target)?;
        record.strong_count += 1;
        self.stats.retains += 1;
        debug!(object = %target, count = record.strong_count, "retain");
        Ok(())
    }

    /// Drop one strong reference to `target` and resolve the resulting cascade fully.
    pub(crate) fn release(&mut self, target: ObjectId) -> Result<()> {
        let mut pending = vec![target];

        while let Some(id) = pending.pop() {
            let record = self.registry.get_mut(id)?;
            debug_assert!(record.strong_count > 0, "release of {} with no strong edges", id);
            record.strong_count = record.strong_count.saturating_sub(1);
            self.stats.releases += 1;
            debug!(object = %id, count = record.strong_count, "release");

            if record.strong_count == 0 && record.live {
                self.destroy(id, &mut pending)?;
            }
        }

        Ok(())
    }

    /// Deinitialize `id`, queueing its strong fields so the first assigned is released first.
    fn destroy(&mut self, id: ObjectId, pending: &mut Vec<ObjectId>) -> Result<()> {
        let record = self.registry.get_mut(id)?;
        record.live = false;
        let label = record.label.clone();
        self.stats.deallocations += 1;
        debug!(object = %id, label = %label, "deinitialized");
        self.log.record(Event::deinitialized(label));

        let cleared: Vec<Holder> = self.edges.clear_weak_observers(id);
        if !cleared.is_empty() {
            debug!(object = %id, observers = cleared.len(), "weak references cleared");
        }

        let fields = self.edges.take_fields(id);
        pending.extend(
            fields
                .iter()
                .rev()
                .filter_map(|(_, reference)| reference.strong_target()),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{EventKind, Heap, Holder};

    fn deinit_labels(heap: &Heap) -> Vec<String> {
        heap.events()
            .iter()
            .filter(|event| event.kind == EventKind::Deinitialized)
            .map(|event| event.label.clone())
            .collect()
    }

    #[test]
    fn test_cascade_is_depth_first() {
        // root -> a -> (a1, a2), root -> b
        let mut heap = Heap::new();
        let root = heap.create("root");
        let a = heap.create("a");
        let a1 = heap.create("a1");
        let a2 = heap.create("a2");
        let b = heap.create("b");
        heap.set_strong(Holder::root("top"), root).unwrap();
        heap.set_strong(Holder::field(root, "a"), a).unwrap();
        heap.set_strong(Holder::field(root, "b"), b).unwrap();
        heap.set_strong(Holder::field(a, "first"), a1).unwrap();
        heap.set_strong(Holder::field(a, "second"), a2).unwrap();

        heap.clear(&Holder::root("top")).unwrap();

        assert_eq!(deinit_labels(&heap), vec!["root", "a", "a1", "a2", "b"]);
    }

    #[test]
    fn test_shared_child_outlives_first_parent() {
        let mut heap = Heap::new();
        let left = heap.create("left");
        let right = heap.create("right");
        let shared = heap.create("shared");
        heap.set_strong(Holder::root("l"), left).unwrap();
        heap.set_strong(Holder::root("r"), right).unwrap();
        heap.set_strong(Holder::field(left, "child"), shared).unwrap();
        heap.set_strong(Holder::field(right, "child"), shared).unwrap();

        heap.clear(&Holder::root("l")).unwrap();
        assert!(heap.is_live(shared).unwrap());
        assert_eq!(heap.strong_count(shared).unwrap(), 1);

        heap.clear(&Holder::root("r")).unwrap();
        assert_eq!(deinit_labels(&heap), vec!["left", "right", "shared"]);
    }

    #[test]
    fn test_strong_cycle_leaks() {
        let mut heap = Heap::new();
        let dev = heap.create("Dev 1");
        let tech = heap.create("Swift");
        heap.set_strong(Holder::root("dev1"), dev).unwrap();
        heap.set_strong(Holder::root("tech1"), tech).unwrap();
        heap.set_strong(Holder::field(dev, "language"), tech).unwrap();
        heap.set_strong(Holder::field(tech, "dev"), dev).unwrap();

        heap.end_scope().unwrap();

        assert!(heap.is_live(dev).unwrap());
        assert!(heap.is_live(tech).unwrap());
        assert_eq!(heap.strong_count(dev).unwrap(), 1);
        assert_eq!(heap.deinit_count(), 0);
    }

    #[test]
    fn test_weak_observer_cleared_on_destroy() {
        let mut heap = Heap::new();
        let dev = heap.create("Dev 1");
        let tech = heap.create("Swift");
        heap.set_strong(Holder::root("dev1"), dev).unwrap();
        heap.set_strong(Holder::root("tech1"), tech).unwrap();
        heap.set_weak(Holder::field(tech, "dev"), dev).unwrap();

        heap.clear(&Holder::root("dev1")).unwrap();

        assert_eq!(heap.read(&Holder::field(tech, "dev")).unwrap(), None);
        assert!(heap.is_live(tech).unwrap());
    }

    #[test]
    fn test_self_strong_edge_keeps_object_alive() {
        let mut heap = Heap::new();
        let node = heap.create("node");
        heap.set_strong(Holder::root("n"), node).unwrap();
        heap.set_strong(Holder::field(node, "me"), node).unwrap();

        heap.clear(&Holder::root("n")).unwrap();
        assert!(heap.is_live(node).unwrap());

        heap.clear(&Holder::field(node, "me")).unwrap();
        assert!(!heap.is_live(node).unwrap());
        assert_eq!(heap.deinit_count(), 1);
    }

    #[test]
    fn test_long_chain_releases_without_recursion() {
        let mut heap = Heap::new();
        let head = heap.create("node 0");
        heap.set_strong(Holder::root("head"), head).unwrap();

        let mut previous = head;
        for index in 1..100_000 {
            let node = heap.create(format!("node {}", index));
            heap.set_strong(Holder::field(previous, "next"), node).unwrap();
            previous = node;
        }

        heap.clear(&Holder::root("head")).unwrap();

        assert_eq!(heap.deinit_count(), 100_000);
        assert!(heap.live_objects().is_empty());
        let labels = deinit_labels(&heap);
        assert_eq!(labels.first().map(String::as_str), Some("node 0"));
        assert_eq!(labels.last().map(String::as_str), Some("node 99999"));
    }
}
