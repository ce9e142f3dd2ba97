//! The `id_cte` pseudo-table.
//!
//! A non-exportable table shape (never DDL-generated) whose columns clone
//! the target entity's identifier columns under a `cte_` prefix. One
//! instance per strategy, reused across executions; only SQL text depends
//! on the per-execution row count.

use relmap_core::{Dialect, EntityMapping, SqlType};

/// Fixed name of the id CTE.
pub const CTE_TABLE_NAME: &str = "id_cte";

/// Alias for the inner VALUES table in the CTE definition.
const VALUES_ALIAS: &str = "relmap_id_list";

/// A `cte_`-prefixed clone of one identifier column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CteTableColumn {
    /// Clone name: `cte_<originalColumnName>`
    pub name: String,
    /// SQL type carried over from the source column
    pub sql_type: SqlType,
}

/// The id CTE's table shape.
#[derive(Debug, Clone)]
pub struct CteTable {
    columns: Vec<CteTableColumn>,
}

impl CteTable {
    /// Build the CTE shape for an entity's identifier columns.
    pub fn for_entity(entity: &EntityMapping) -> Self {
        let columns = entity
            .identifier
            .columns
            .iter()
            .map(|column| CteTableColumn {
                name: format!("cte_{}", column.name),
                sql_type: column.sql_type.clone(),
            })
            .collect();
        Self { columns }
    }

    /// The fixed CTE name.
    pub fn name(&self) -> &'static str {
        CTE_TABLE_NAME
    }

    /// The prefixed columns, in identifier order.
    pub fn columns(&self) -> &[CteTableColumn] {
        &self.columns
    }

    /// Render the CTE definition for `row_count` id rows:
    ///
    /// `id_cte (cte_a, cte_b) AS (SELECT * FROM (VALUES ($1, $2), ($3, $4))
    /// AS relmap_id_list)`
    ///
    /// One placeholder per identifier column per row, numbered row-major
    /// from 1, so parameter positions are fixed and precomputable; the same
    /// definition and binding is reused by every dependent statement.
    pub fn cte_definition(&self, dialect: Dialect, row_count: usize) -> String {
        let column_names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();

        let mut rows = Vec::with_capacity(row_count);
        for row in 0..row_count {
            let placeholders: Vec<String> = (0..self.columns.len())
                .map(|col| dialect.placeholder(row * self.columns.len() + col + 1))
                .collect();
            rows.push(format!("({})", placeholders.join(", ")));
        }

        format!(
            "{} ({}) AS (SELECT * FROM (VALUES {}) AS {})",
            CTE_TABLE_NAME,
            column_names.join(", "),
            rows.join(", "),
            VALUES_ALIAS
        )
    }

    /// Render the consuming subquery: `SELECT cte_a, cte_b FROM id_cte`.
    pub fn cte_subquery(&self) -> String {
        let column_names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        format!("SELECT {} FROM {}", column_names.join(", "), CTE_TABLE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relmap_core::{ColumnMapping, EntityMappingBuilder, IdentifierMapping, TableMapping};

    fn single_id_entity() -> CteTable {
        let entity = EntityMappingBuilder::new(
            "Person",
            TableMapping::new("PERSON", vec![ColumnMapping::new("id", SqlType::BigInt)]),
            IdentifierMapping::new("id", vec![ColumnMapping::new("id", SqlType::BigInt)]),
        )
        .build();
        CteTable::for_entity(&entity)
    }

    fn composite_id_entity() -> CteTable {
        let entity = EntityMappingBuilder::new(
            "Assignment",
            TableMapping::new(
                "ASSIGNMENT",
                vec![
                    ColumnMapping::new("a", SqlType::BigInt),
                    ColumnMapping::new("b", SqlType::BigInt),
                ],
            ),
            IdentifierMapping::new(
                "key",
                vec![
                    ColumnMapping::new("a", SqlType::BigInt),
                    ColumnMapping::new("b", SqlType::BigInt),
                ],
            ),
        )
        .build();
        CteTable::for_entity(&entity)
    }

    #[test]
    fn columns_are_prefixed_clones() {
        let table = composite_id_entity();
        assert_eq!(table.name(), "id_cte");
        assert_eq!(
            table.columns(),
            &[
                CteTableColumn {
                    name: "cte_a".to_string(),
                    sql_type: SqlType::BigInt,
                },
                CteTableColumn {
                    name: "cte_b".to_string(),
                    sql_type: SqlType::BigInt,
                },
            ]
        );
    }

    #[test]
    fn definition_single_column() {
        let table = single_id_entity();
        assert_eq!(
            table.cte_definition(Dialect::Postgres, 3),
            "id_cte (cte_id) AS (SELECT * FROM (VALUES ($1), ($2), ($3)) AS relmap_id_list)"
        );
    }

    #[test]
    fn definition_composite_numbers_placeholders_row_major() {
        let table = composite_id_entity();
        assert_eq!(
            table.cte_definition(Dialect::Postgres, 2),
            "id_cte (cte_a, cte_b) AS (SELECT * FROM (VALUES ($1, $2), ($3, $4)) AS relmap_id_list)"
        );
    }

    #[test]
    fn subquery_lists_prefixed_columns() {
        let table = composite_id_entity();
        assert_eq!(table.cte_subquery(), "SELECT cte_a, cte_b FROM id_cte");
    }
}
