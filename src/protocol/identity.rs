//! Identity pairs
//!
//! A `NameIdPair` identifies publishers, subscribers and topics uniformly.
//! The name is human readable and need not be unique; the id is what the
//! broker keys everything on.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameIdPair {
    pub name: String,
    pub id: Uuid,
}

impl NameIdPair {
    pub fn new(name: impl Into<String>, id: Uuid) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    /// Pair the given name with a freshly generated id.
    pub fn generate(name: impl Into<String>) -> Self {
        Self::new(name, Uuid::new_v4())
    }
}

impl fmt::Display for NameIdPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
