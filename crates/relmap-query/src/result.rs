//! Query-result and fetch descriptors.
//!
//! These describe the shape of what a statement produces - the target object
//! graph schema - independently of how rows are read. A `QueryResult` is a
//! root-level produced value; a `Fetch` is a path-relative child association
//! descriptor hanging off an entity or collection result. The descriptor
//! tree is acyclic by construction even when runtime object graphs are not.

use crate::selection::{SqlSelection, SqlSelectionGroup};
use relmap_core::{EntityMapping, NavigablePath};
use std::sync::Arc;

/// Group key for the row-id pseudo selection inside an entity result.
pub const ROW_ID_KEY: &str = "{row_id}";
/// Group key for the discriminator selection inside an entity result.
pub const DISCRIMINATOR_KEY: &str = "{discriminator}";

/// The closed set of result shapes a statement can produce.
#[derive(Debug)]
pub enum QueryResult {
    /// A single scalar value
    Scalar(ScalarResult),
    /// An embedded composite
    Composite(CompositeResult),
    /// An entity instance
    Entity(EntityResult),
    /// A collection of elements keyed by an owner
    Collection(CollectionResult),
    /// A dynamic instantiation (constructor projection)
    Instantiation(InstantiationResult),
}

impl QueryResult {
    /// Path of the produced value in the fetch graph.
    pub fn path(&self) -> &NavigablePath {
        match self {
            QueryResult::Scalar(r) => &r.path,
            QueryResult::Composite(r) => &r.path,
            QueryResult::Entity(r) => &r.path,
            QueryResult::Collection(r) => &r.path,
            QueryResult::Instantiation(r) => &r.path,
        }
    }

    /// The select-clause alias this result was requested under, if any.
    pub fn result_variable(&self) -> Option<&str> {
        match self {
            QueryResult::Scalar(r) => r.result_variable.as_deref(),
            QueryResult::Composite(r) => r.result_variable.as_deref(),
            QueryResult::Entity(r) => r.result_variable.as_deref(),
            QueryResult::Collection(r) => r.result_variable.as_deref(),
            QueryResult::Instantiation(r) => r.result_variable.as_deref(),
        }
    }
}

/// A scalar result: exactly one resolved selection.
#[derive(Debug)]
pub struct ScalarResult {
    pub path: NavigablePath,
    pub result_variable: Option<String>,
    pub selection: Arc<SqlSelection>,
}

/// A composite result: one selection per embeddable column, declared order.
#[derive(Debug)]
pub struct CompositeResult {
    pub path: NavigablePath,
    pub result_variable: Option<String>,
    pub selections: SqlSelectionGroup,
}

/// An entity result: the ordered attribute-to-selection-group map plus any
/// fetches hanging off it.
///
/// Group order is fixed and significant: identifier, row-id (if present),
/// discriminator (if present), then - only for non-shallow selections -
/// every other declared attribute in metamodel order.
#[derive(Debug)]
pub struct EntityResult {
    pub path: NavigablePath,
    pub result_variable: Option<String>,
    pub entity: Arc<EntityMapping>,
    pub shallow: bool,
    /// `(group key, selections)` in construction order. Keys are the
    /// identifier attribute name, [`ROW_ID_KEY`], [`DISCRIMINATOR_KEY`],
    /// and declared attribute names.
    pub groups: Vec<(String, SqlSelectionGroup)>,
    /// Child association fetches
    pub fetches: Vec<Fetch>,
}

impl EntityResult {
    /// The identifier selection group (always the first group).
    pub fn identifier_group(&self) -> &SqlSelectionGroup {
        &self.groups[0].1
    }

    /// Selection group for a given key, if present.
    pub fn group(&self, key: &str) -> Option<&SqlSelectionGroup> {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, group)| group)
    }

    /// Attach a child fetch.
    pub fn add_fetch(&mut self, fetch: Fetch) {
        self.fetches.push(fetch);
    }
}

/// A collection result: the owner-key selections plus the element shape.
#[derive(Debug)]
pub struct CollectionResult {
    pub path: NavigablePath,
    pub result_variable: Option<String>,
    /// Collection role: `<entity>.<attribute>`
    pub role: String,
    /// Selections for the owner key columns
    pub key_group: SqlSelectionGroup,
    /// Shape of one collection element
    pub element: Box<QueryResult>,
}

/// A dynamic instantiation result: a constructor target fed by arguments.
#[derive(Debug)]
pub struct InstantiationResult {
    pub path: NavigablePath,
    pub result_variable: Option<String>,
    /// Name of the instantiation target
    pub target: String,
    /// Argument results in constructor order
    pub arguments: Vec<QueryResult>,
}

/// When a fetched association is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTiming {
    /// Read from the current result set
    Immediate,
    /// Materialized later, outside this statement
    Delayed,
}

/// How a fetched association's data is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStyle {
    /// Joined into the owning statement
    Join,
    /// Loaded by a follow-up select
    Select,
}

/// A path-relative child association descriptor.
#[derive(Debug)]
pub struct Fetch {
    /// Path of the owning result (the fetch parent)
    pub parent_path: NavigablePath,
    /// Fetched attribute name
    pub attribute: String,
    pub timing: FetchTiming,
    pub style: FetchStyle,
    /// Whether the association may be absent in the row
    pub nullable: bool,
    /// Shape of the fetched value
    pub result: QueryResult,
}

impl Fetch {
    /// Create a fetch descriptor.
    pub fn new(
        parent_path: NavigablePath,
        attribute: impl Into<String>,
        timing: FetchTiming,
        style: FetchStyle,
        nullable: bool,
        result: QueryResult,
    ) -> Self {
        Self {
            parent_path,
            attribute: attribute.into(),
            timing,
            style,
            nullable,
            result,
        }
    }
}
