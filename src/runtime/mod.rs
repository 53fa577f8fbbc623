//! # Runtime
//!
//! The simulated heap: object registry, reference edges, deallocation and the lifecycle event log.

pub mod dealloc;
pub mod edges;
pub mod events;
pub mod heap;
pub mod registry;

pub use edges::{EdgeKind, EdgeTable, Holder, Reference};
pub use events::{Event, EventKind, EventLog, Observer};
pub use heap::{Heap, HeapStats};
pub use registry::{ObjectId, ObjectRecord, Registry};
