//! # arcsim - Ownership Graph Simulator
//!
//! Simulates automatic reference counting over a small object graph with strong, weak and
//! unowned references, and records the order in which objects are initialized and deinitialized.
//!
//! ## Architecture
//!
//! - **Runtime**: object registry, reference edges, deallocation engine, event log
//! - **Scenarios**: the built-in ARC scenarios and the driver that runs them
//! - **Script**: user-written scenarios in JSON
//! - **Report**: text and JSON rendering
//!
//! There is deliberately no cycle collector: objects that hold each other strongly leak.

pub mod error;
pub mod report;
pub mod runtime;
pub mod scenarios;
pub mod script;

// Re-export commonly used types
pub use crate::error::{Result, SimError};
pub use crate::runtime::{EdgeKind, Event, EventKind, Heap, Holder, ObjectId};
pub use crate::scenarios::{Outcome, ScenarioDriver, ScenarioKind, ScenarioReport};
pub use crate::script::{Script, ScriptError};
