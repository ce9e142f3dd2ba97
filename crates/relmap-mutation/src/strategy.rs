//! The CTE-based mutation strategy.

use crate::cte::CteTable;
use crate::delete::CteDeleteHandler;
use crate::statement::{BulkDelete, BulkUpdate};
use crate::update::CteUpdateHandler;
use relmap_core::{Dialect, EntityMapping, Error, Result};
use std::sync::Arc;

/// Compiles bulk deletes/updates for one entity hierarchy into id-CTE
/// statement sequences.
///
/// Constructed once per entity type and typically cached for the lifetime
/// of the owning factory. After construction the instance never mutates -
/// its dialect capabilities are validated up front and its `CteTable` shape
/// is fixed - so it is safe to share across concurrent executions. All
/// per-execution state (id lists, parameter bindings) lives in the handlers.
#[derive(Debug)]
pub struct CteMutationStrategy {
    entity: Arc<EntityMapping>,
    dialect: Dialect,
    cte_table: CteTable,
}

impl CteMutationStrategy {
    /// Create a strategy for the given entity under the given dialect.
    ///
    /// Capability checks happen here, once, so a misconfigured dialect is
    /// rejected before any statement is ever handled - never lazily at
    /// execution time.
    pub fn new(entity: Arc<EntityMapping>, dialect: Dialect) -> Result<Self> {
        if !dialect.supports_non_query_cte() {
            return Err(Error::capability(dialect.name(), "non-query CTE"));
        }
        if !dialect.supports_values_list() {
            return Err(Error::capability(dialect.name(), "VALUES list"));
        }
        if !dialect.supports_row_value_in_list() {
            return Err(Error::capability(dialect.name(), "row-value IN list"));
        }

        let cte_table = CteTable::for_entity(&entity);
        Ok(Self {
            entity,
            dialect,
            cte_table,
        })
    }

    /// The configured entity mapping.
    pub fn entity(&self) -> &Arc<EntityMapping> {
        &self.entity
    }

    /// The active dialect.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The shared id-CTE shape.
    pub fn cte_table(&self) -> &CteTable {
        &self.cte_table
    }

    /// Bind a parsed bulk delete to this strategy.
    ///
    /// Fails before any SQL executes when the statement targets an entity
    /// that is neither the configured entity nor one of its subclasses.
    pub fn build_delete_handler(&self, statement: BulkDelete) -> Result<CteDeleteHandler<'_>> {
        self.check_target(&statement.entity_name)?;
        Ok(CteDeleteHandler::new(self, statement))
    }

    /// Bind a parsed bulk update to this strategy.
    ///
    /// The handler's `execute` is not implemented; binding still validates
    /// the target entity so misrouted statements fail the same way deletes
    /// do.
    pub fn build_update_handler(&self, statement: BulkUpdate) -> Result<CteUpdateHandler<'_>> {
        self.check_target(&statement.entity_name)?;
        Ok(CteUpdateHandler::new(self, statement))
    }

    fn check_target(&self, entity_name: &str) -> Result<()> {
        if self.entity.is_or_extends(entity_name) {
            Ok(())
        } else {
            Err(Error::mismatch(
                self.entity.entity_name.clone(),
                entity_name,
            ))
        }
    }
}
