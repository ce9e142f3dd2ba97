//! Parsed bulk-mutation statements.

use relmap_core::Value;
use relmap_query::Restriction;

/// A bulk DELETE against one entity hierarchy.
#[derive(Debug)]
pub struct BulkDelete {
    /// Target entity name
    pub entity_name: String,
    /// Optional WHERE restriction; `None` deletes every instance
    pub restriction: Option<Restriction>,
}

impl BulkDelete {
    /// Create a bulk delete.
    pub fn new(entity_name: impl Into<String>, restriction: Option<Restriction>) -> Self {
        Self {
            entity_name: entity_name.into(),
            restriction,
        }
    }
}

/// One SET assignment of a bulk update.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// Assigned attribute name
    pub attribute: String,
    /// Assigned value
    pub value: Value,
}

/// A bulk UPDATE against one entity hierarchy.
#[derive(Debug)]
pub struct BulkUpdate {
    /// Target entity name
    pub entity_name: String,
    /// SET assignments in statement order
    pub assignments: Vec<Assignment>,
    /// Optional WHERE restriction
    pub restriction: Option<Restriction>,
}

impl BulkUpdate {
    /// Create a bulk update.
    pub fn new(
        entity_name: impl Into<String>,
        assignments: Vec<Assignment>,
        restriction: Option<Restriction>,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            assignments,
            restriction,
        }
    }
}
