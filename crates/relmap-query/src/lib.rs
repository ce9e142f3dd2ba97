//! Select compilation and result-graph assembly for relmap.
//!
//! `relmap-query` is the **select compilation layer**. It turns domain-level
//! selected expressions into a deduplicated SQL select list plus a
//! `QueryResult`/`Fetch` descriptor tree, and reads executed result sets back
//! into value graphs.
//!
//! # Role In The Architecture
//!
//! - **Expression DSL**: `Expr` / `Restriction` build WHERE fragments safely.
//! - **Selection resolution**: `SqlSelectionResolver` dedupes SQL-level
//!   expressions into position-addressable `SqlSelection`s.
//! - **Selectables**: `Selectable` converts a selected path (basic, embedded,
//!   entity-valued) into a `QueryResult`.
//! - **Assembly**: `Assembler` materializes rows into the shape the
//!   descriptor tree describes, sharing entity instances across paths.
//!
//! The resulting statements execute through the `Connection` trait from
//! `relmap-core`.

pub mod assemble;
pub mod expr;
pub mod result;
pub mod selectable;
pub mod selection;

pub use assemble::{AssembledValue, Assembler, EntityInstance};
pub use expr::{BinaryOp, Expr, Restriction};
pub use result::{
    CollectionResult, CompositeResult, EntityResult, Fetch, FetchStyle, FetchTiming,
    InstantiationResult, QueryResult, ScalarResult,
};
pub use selectable::{ColumnReferenceSource, Selectable};
pub use selection::{
    ColumnReference, SelectClause, SqlSelectable, SqlSelection, SqlSelectionGroup,
    SqlSelectionResolver,
};
