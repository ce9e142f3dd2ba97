//! End-to-end bulk delete execution against a recording connection.

use asupersync::runtime::RuntimeBuilder;
use asupersync::{Cx, Outcome};
use relmap_core::{
    ColumnInfo, ColumnMapping, CollectionTableMapping, Connection, Dialect, EntityMapping,
    EntityMappingBuilder, Error, IdentifierMapping, Row, SqlType, TableMapping, Value,
};
use relmap_mutation::{BulkDelete, BulkUpdate, CteMutationStrategy};
use relmap_query::{Expr, Restriction};
use std::sync::{Arc, Mutex};

/// Connection double: answers the id query from a canned row list, records
/// every mutation statement, and can be told to fail the nth execute.
struct RecordingConnection {
    id_rows: Vec<Row>,
    fail_execute_at: Option<usize>,
    executed: Mutex<Vec<(String, Vec<Value>)>>,
    queried: Mutex<Vec<(String, Vec<Value>)>>,
}

impl RecordingConnection {
    fn with_ids(ids: &[i64]) -> Self {
        let columns = Arc::new(ColumnInfo::new(
            vec!["id".to_string()],
            vec![SqlType::BigInt],
        ));
        let id_rows = ids
            .iter()
            .map(|id| Row::new(Arc::clone(&columns), vec![Value::BigInt(*id)]))
            .collect();
        Self {
            id_rows,
            fail_execute_at: None,
            executed: Mutex::new(Vec::new()),
            queried: Mutex::new(Vec::new()),
        }
    }

    fn failing_at(mut self, call: usize) -> Self {
        self.fail_execute_at = Some(call);
        self
    }

    fn executed(&self) -> Vec<(String, Vec<Value>)> {
        self.executed.lock().expect("lock").clone()
    }

    fn queried(&self) -> Vec<(String, Vec<Value>)> {
        self.queried.lock().expect("lock").clone()
    }
}

impl Connection for RecordingConnection {
    async fn query(&self, _cx: &Cx, sql: &str, params: &[Value]) -> Outcome<Vec<Row>, Error> {
        self.queried
            .lock()
            .expect("lock")
            .push((sql.to_string(), params.to_vec()));
        Outcome::Ok(self.id_rows.clone())
    }

    async fn query_one(&self, cx: &Cx, sql: &str, params: &[Value]) -> Outcome<Option<Row>, Error> {
        match self.query(cx, sql, params).await {
            Outcome::Ok(rows) => Outcome::Ok(rows.into_iter().next()),
            Outcome::Err(e) => Outcome::Err(e),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    async fn execute(&self, _cx: &Cx, sql: &str, params: &[Value]) -> Outcome<u64, Error> {
        let mut executed = self.executed.lock().expect("lock");
        if self.fail_execute_at == Some(executed.len()) {
            return Outcome::Err(Error::query_with_sql("constraint violation", sql));
        }
        executed.push((sql.to_string(), params.to_vec()));
        Outcome::Ok(1)
    }
}

fn person() -> Arc<EntityMapping> {
    EntityMappingBuilder::new(
        "Person",
        TableMapping::new(
            "PERSON",
            vec![
                ColumnMapping::new("id", SqlType::BigInt),
                ColumnMapping::new("name", SqlType::VarChar(255)),
            ],
        ),
        IdentifierMapping::new("id", vec![ColumnMapping::new("id", SqlType::BigInt)]),
    )
    .build()
}

fn order_with_items() -> Arc<EntityMapping> {
    EntityMappingBuilder::new(
        "Order",
        TableMapping::new(
            "ORDER_TABLE",
            vec![
                ColumnMapping::new("id", SqlType::BigInt),
                ColumnMapping::new("status", SqlType::Text),
            ],
        ),
        IdentifierMapping::new("id", vec![ColumnMapping::new("id", SqlType::BigInt)]),
    )
    .collection_table(CollectionTableMapping::new(
        "Order.items",
        "ORDER_ITEMS",
        vec![ColumnMapping::new("order_id", SqlType::BigInt)],
    ))
    .build()
}

fn run<F: Future>(f: F) -> F::Output {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    rt.block_on(f)
}

#[test]
fn deletes_matched_ids_and_reports_match_count() {
    let strategy = CteMutationStrategy::new(person(), Dialect::Postgres).expect("strategy");
    let handler = strategy
        .build_delete_handler(BulkDelete::new(
            "Person",
            Some(Restriction::new(Expr::col("name").eq("gavin"))),
        ))
        .expect("handler");
    let conn = RecordingConnection::with_ids(&[1, 2, 3]);
    let cx = Cx::for_testing();

    let outcome = run(handler.execute(&cx, &conn));
    assert!(matches!(outcome, Outcome::Ok(3)));

    let queried = conn.queried();
    assert_eq!(queried.len(), 1);
    assert_eq!(queried[0].0, "SELECT id FROM PERSON WHERE \"name\" = $1");
    assert_eq!(queried[0].1, vec![Value::Text("gavin".to_string())]);

    let executed = conn.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(
        executed[0].0,
        "WITH id_cte (cte_id) AS (SELECT * FROM (VALUES ($1), ($2), ($3)) AS relmap_id_list) \
         DELETE FROM PERSON WHERE (id) IN (SELECT cte_id FROM id_cte)"
    );
    assert_eq!(
        executed[0].1,
        vec![Value::BigInt(1), Value::BigInt(2), Value::BigInt(3)]
    );
}

#[test]
fn collection_tables_are_cleared_before_entity_tables() {
    let strategy = CteMutationStrategy::new(order_with_items(), Dialect::Postgres).expect("strategy");
    let handler = strategy
        .build_delete_handler(BulkDelete::new("Order", None))
        .expect("handler");
    let conn = RecordingConnection::with_ids(&[7]);
    let cx = Cx::for_testing();

    let outcome = run(handler.execute(&cx, &conn));
    assert!(matches!(outcome, Outcome::Ok(1)));

    let executed = conn.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].0.contains("DELETE FROM ORDER_ITEMS WHERE (order_id) IN"));
    assert!(executed[1].0.contains("DELETE FROM ORDER_TABLE WHERE (id) IN"));
    assert_eq!(executed[0].1, executed[1].1);
}

#[test]
fn zero_matching_ids_skips_all_mutations() {
    let strategy = CteMutationStrategy::new(order_with_items(), Dialect::Postgres).expect("strategy");
    let handler = strategy
        .build_delete_handler(BulkDelete::new("Order", None))
        .expect("handler");
    let conn = RecordingConnection::with_ids(&[]);
    let cx = Cx::for_testing();

    let outcome = run(handler.execute(&cx, &conn));
    assert!(matches!(outcome, Outcome::Ok(0)));
    assert_eq!(conn.queried().len(), 1);
    assert!(conn.executed().is_empty());
}

#[test]
fn execute_failure_stops_the_statement_sequence() {
    let strategy = CteMutationStrategy::new(order_with_items(), Dialect::Postgres).expect("strategy");
    let handler = strategy
        .build_delete_handler(BulkDelete::new("Order", None))
        .expect("handler");
    // Collection-table delete succeeds, hierarchy-table delete fails.
    let conn = RecordingConnection::with_ids(&[1]).failing_at(1);
    let cx = Cx::for_testing();

    let outcome = run(handler.execute(&cx, &conn));
    assert!(matches!(outcome, Outcome::Err(Error::Query(_))));
    assert_eq!(conn.executed().len(), 1);
}

#[test]
fn incapable_dialect_is_rejected_before_any_sql() {
    let err = CteMutationStrategy::new(person(), Dialect::Mysql).unwrap_err();
    assert!(matches!(err, Error::Capability(_)));
}

#[test]
fn bulk_update_execution_is_unimplemented() {
    let strategy = CteMutationStrategy::new(person(), Dialect::Postgres).expect("strategy");
    let handler = strategy
        .build_update_handler(BulkUpdate::new("Person", Vec::new(), None))
        .expect("handler");
    let conn = RecordingConnection::with_ids(&[1]);
    let cx = Cx::for_testing();

    let outcome = run(handler.execute(&cx, &conn));
    assert!(matches!(
        outcome,
        Outcome::Err(Error::Unimplemented("CTE-based bulk update"))
    ));
    assert!(conn.queried().is_empty());
    assert!(conn.executed().is_empty());
}
