use thiserror::Error;

use crate::runtime::{Holder, ObjectId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// Read through an unowned edge after its target was deinitialized.
    #[error("Dangling unowned access: {holder} still points at deinitialized '{label}'")]
    DanglingUnownedAccess { holder: Holder, label: String },

    /// The id was never created, or names an object that can no longer take part in edges.
    #[error("Unknown object reference: {0}")]
    UnknownObjectReference(ObjectId),
}

pub type Result<T> = std::result::Result<T, SimError>;
