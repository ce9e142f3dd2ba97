//! CTE-based bulk delete execution.

use crate::statement::BulkDelete;
use crate::strategy::CteMutationStrategy;
use asupersync::{Cx, Outcome};
use relmap_core::{Connection, Error, Value};
use tracing::debug;

/// Executes one bulk delete through a strategy's id CTE.
///
/// Execution is two-phase: first the matching identifiers are selected and
/// materialized, then one CTE-prefixed DELETE runs per physically owned
/// table against that frozen id set. Collection tables go first so no
/// foreign key to the hierarchy tables dangles mid-sequence.
#[derive(Debug)]
pub struct CteDeleteHandler<'a> {
    strategy: &'a CteMutationStrategy,
    statement: BulkDelete,
}

impl<'a> CteDeleteHandler<'a> {
    pub(crate) fn new(strategy: &'a CteMutationStrategy, statement: BulkDelete) -> Self {
        Self {
            strategy,
            statement,
        }
    }

    /// The id-selection query: identifier columns from the hierarchy root
    /// table, filtered by the statement's restriction.
    pub fn matching_ids_statement(&self) -> (String, Vec<Value>) {
        let entity = self.strategy.entity();
        let dialect = self.strategy.dialect();
        let columns: Vec<&str> = entity
            .identifier
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect();

        let mut sql = format!(
            "SELECT {} FROM {}",
            columns.join(", "),
            entity.identifier_table().name
        );
        let params = match &self.statement.restriction {
            Some(restriction) => {
                let (predicate, params) = restriction.build(dialect, 0);
                sql.push_str(" WHERE ");
                sql.push_str(&predicate);
                params
            }
            None => Vec::new(),
        };
        (sql, params)
    }

    /// The per-table DELETE statements for the given id rows, in execution
    /// order: collection tables first, then the hierarchy tables as the
    /// mapping orders them. Every statement carries the same CTE definition
    /// and therefore the same flattened id parameters.
    pub fn delete_plan(&self, ids: &[Vec<Value>]) -> Vec<(String, Vec<Value>)> {
        let entity = self.strategy.entity();
        let dialect = self.strategy.dialect();
        let cte = self.strategy.cte_table();

        let definition = cte.cte_definition(dialect, ids.len());
        let subquery = cte.cte_subquery();
        let params: Vec<Value> = ids.iter().flatten().cloned().collect();

        let mut plan = Vec::with_capacity(entity.collection_tables.len() + entity.tables.len());
        for collection in &entity.collection_tables {
            let key_columns: Vec<&str> = collection
                .key_columns
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            plan.push((
                format!(
                    "WITH {} DELETE FROM {} WHERE ({}) IN ({})",
                    definition,
                    collection.table,
                    key_columns.join(", "),
                    subquery
                ),
                params.clone(),
            ));
        }
        let id_columns: Vec<&str> = entity
            .identifier
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        for table in &entity.tables {
            plan.push((
                format!(
                    "WITH {} DELETE FROM {} WHERE ({}) IN ({})",
                    definition,
                    table.name,
                    id_columns.join(", "),
                    subquery
                ),
                params.clone(),
            ));
        }
        plan
    }

    /// Run the delete: select matching ids, then delete them from every
    /// owned table. Returns the number of matched entity instances, which
    /// may exceed the root-table rows affected when ids raced away between
    /// the select and the deletes.
    pub async fn execute<C: Connection>(&self, cx: &Cx, connection: &C) -> Outcome<u64, Error> {
        let (id_sql, id_params) = self.matching_ids_statement();
        debug!(entity = %self.strategy.entity().entity_name, sql = %id_sql, "selecting matching ids");

        let rows = match connection.query(cx, &id_sql, &id_params).await {
            Outcome::Ok(rows) => rows,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };
        if rows.is_empty() {
            debug!("no matching ids, skipping table deletes");
            return Outcome::Ok(0);
        }

        let width = self.strategy.entity().identifier.columns.len();
        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut id = Vec::with_capacity(width);
            for i in 0..width {
                match row.get(i) {
                    Some(value) => id.push(value.clone()),
                    None => {
                        return Outcome::Err(Error::query(format!(
                            "id row has {} values, expected {width}",
                            row.len()
                        )));
                    }
                }
            }
            ids.push(id);
        }

        let matched = ids.len() as u64;
        for (sql, params) in self.delete_plan(&ids) {
            debug!(sql = %sql, "executing table delete");
            match connection.execute(cx, &sql, &params).await {
                Outcome::Ok(_) => {}
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }
        }
        Outcome::Ok(matched)
    }
}
