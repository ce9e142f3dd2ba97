//! Core types and traits for the relmap query-compilation engine.
//!
//! This crate provides the foundational abstractions shared by the select
//! compilation layer and the bulk-mutation strategies:
//!
//! - Metamodel descriptors (`EntityMapping`, `AttributeMapping`, column and
//!   table mappings) describing how a domain model maps onto tables
//! - `Value` and `SqlType` for dynamically-typed parameters and results
//! - `Row` / `ResultSetAccess` for reading query results
//! - `Connection` trait for executing SQL
//! - `Dialect` with the capability flags the compilers gate on
//! - `Outcome` / `Cx` re-exports from asupersync for cancel-correct operations

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod connection;
pub mod dialect;
pub mod error;
pub mod metamodel;
pub mod path;
pub mod row;
pub mod types;
pub mod value;

pub use connection::Connection;
pub use dialect::Dialect;
pub use error::{CapabilityError, Error, MismatchError, QueryError, Result, TypeError};
pub use metamodel::{
    AttributeClassification, AttributeMapping, CollectionTableMapping, ColumnMapping,
    EntityMapping, EntityMappingBuilder, IdentifierMapping, TableMapping,
};
pub use path::NavigablePath;
pub use row::{BufferedResultSet, ColumnInfo, ResultSetAccess, Row, value_at};
pub use types::SqlType;
pub use value::Value;
