//! CTE-based bulk update execution.

use crate::statement::BulkUpdate;
use crate::strategy::CteMutationStrategy;
use asupersync::{Cx, Outcome};
use relmap_core::{Connection, Error};

/// Executes one bulk update through a strategy's id CTE.
///
/// Binding validates the target entity, but execution is not implemented:
/// multi-table SET routing (deciding which hierarchy table each assignment
/// writes to) has not been built yet. Callers get a stable `Unimplemented`
/// error rather than a partially applied update.
#[derive(Debug)]
pub struct CteUpdateHandler<'a> {
    strategy: &'a CteMutationStrategy,
    statement: BulkUpdate,
}

impl<'a> CteUpdateHandler<'a> {
    pub(crate) fn new(strategy: &'a CteMutationStrategy, statement: BulkUpdate) -> Self {
        Self {
            strategy,
            statement,
        }
    }

    /// The bound statement.
    pub fn statement(&self) -> &BulkUpdate {
        &self.statement
    }

    /// Always fails with `Unimplemented`; no SQL is ever issued.
    pub async fn execute<C: Connection>(&self, _cx: &Cx, _connection: &C) -> Outcome<u64, Error> {
        tracing::debug!(
            entity = %self.strategy.entity().entity_name,
            "bulk update requested but not implemented"
        );
        Outcome::Err(Error::Unimplemented("CTE-based bulk update"))
    }
}
