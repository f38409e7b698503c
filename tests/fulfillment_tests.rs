// tests/fulfillment_tests.rs
// Per-test table requirements and their cleanup

mod common;

use table_fixtures::fixtures::ColumnType;
use table_fixtures::{
    fulfill_immutable_tables, Backend, FixtureError, ImmutableTableRequirement, InMemoryQueryExecutor,
    MutableTableRequirement, MutableTableState, MutableTablesFulfiller, QueryExecutor, SqlTableManager,
    TableDefinition, TableHandle, TableNameGenerator, Value,
};

use common::{memory_dispatcher, nation, orders, DATABASE};

#[test]
fn cleanup_drops_exactly_the_created_tables() {
    let executor = InMemoryQueryExecutor::new(DATABASE).with_tables(["customer"]);
    let naming = TableNameGenerator::new();
    let mut dispatcher = memory_dispatcher(&executor, &naming);
    let mut fulfiller = MutableTablesFulfiller::new();

    let tables = fulfiller
        .fulfill(
            &mut dispatcher,
            &[
                MutableTableRequirement::new(orders(10)),
                MutableTableRequirement::new(nation(Backend::PostgresCopy)),
            ],
        )
        .unwrap();

    assert_eq!(tables.len(), 2);
    let orders_table = tables.name_in_database("orders").unwrap().to_string();
    let nation_table = tables.name_in_database("nation").unwrap().to_string();
    assert!(naming.is_mutable_table_name(&orders_table));
    assert_eq!(executor.row_count(&orders_table), Some(10));
    assert_eq!(executor.row_count(&nation_table), Some(3));
    assert_eq!(fulfiller.created().len(), 2);

    let failures = fulfiller.cleanup(&mut dispatcher);

    assert!(failures.is_empty());
    assert!(fulfiller.created().is_empty());
    assert_eq!(executor.table_names(), vec!["customer"]);
    let drops: Vec<String> = executor
        .statements()
        .into_iter()
        .filter(|s| s.starts_with("DROP"))
        .collect();
    // newest first
    assert_eq!(
        drops,
        vec![format!("DROP TABLE {nation_table}"), format!("DROP TABLE {orders_table}")]
    );
}

#[test]
fn failed_requirement_keeps_earlier_tables_for_cleanup() {
    let executor = InMemoryQueryExecutor::new(DATABASE);
    let naming = TableNameGenerator::new();
    let mut dispatcher = memory_dispatcher(&executor, &naming);
    let mut fulfiller = MutableTablesFulfiller::new();

    // a second manager for the same backend on another database makes the
    // last requirement ambiguous
    let other = InMemoryQueryExecutor::new("other");
    dispatcher
        .register(SqlTableManager::new(other.clone(), naming.clone()))
        .unwrap();

    let err = fulfiller
        .fulfill(
            &mut dispatcher,
            &[
                MutableTableRequirement::new(nation(Backend::PostgresCopy)),
                MutableTableRequirement::new(orders(1)),
            ],
        )
        .unwrap_err();

    assert!(matches!(err, FixtureError::AmbiguousTableManager { .. }));
    assert_eq!(fulfiller.created().len(), 1);
    assert_eq!(executor.table_names().len(), 1);

    assert!(fulfiller.cleanup(&mut dispatcher).is_empty());
    assert!(executor.table_names().is_empty());
    assert!(other.table_names().is_empty());
}

#[test]
fn states_control_how_far_a_table_is_materialized() {
    let executor = InMemoryQueryExecutor::new(DATABASE);
    let naming = TableNameGenerator::new();
    let mut dispatcher = memory_dispatcher(&executor, &naming);
    let mut fulfiller = MutableTablesFulfiller::new();

    let tables = fulfiller
        .fulfill(
            &mut dispatcher,
            &[
                MutableTableRequirement::new(orders(5))
                    .with_state(MutableTableState::Prepared)
                    .with_handle(TableHandle::new("prepared")),
                MutableTableRequirement::new(orders(5))
                    .with_state(MutableTableState::Created)
                    .with_handle(TableHandle::new("created")),
                MutableTableRequirement::new(orders(5)).with_handle(TableHandle::new("loaded")),
            ],
        )
        .unwrap();

    let prepared = tables.get("prepared").unwrap();
    assert_eq!(prepared.mutable_state(), Some(MutableTableState::Prepared));
    assert!(!executor.contains_table(prepared.name_in_database()));
    assert_eq!(executor.row_count(tables.name_in_database("created").unwrap()), Some(0));
    assert_eq!(executor.row_count(tables.name_in_database("loaded").unwrap()), Some(5));

    // the test creates the prepared table itself
    let mut connection = executor.clone();
    connection
        .execute(&format!("CREATE TABLE {} (id BIGINT)", prepared.name_in_database()))
        .unwrap();

    assert!(fulfiller.cleanup(&mut dispatcher).is_empty());
    assert!(executor.table_names().is_empty());
}

#[test]
fn prepared_table_never_created_shows_up_as_a_cleanup_failure() {
    let executor = InMemoryQueryExecutor::new(DATABASE);
    let naming = TableNameGenerator::new();
    let mut dispatcher = memory_dispatcher(&executor, &naming);
    let mut fulfiller = MutableTablesFulfiller::new();

    let tables = fulfiller
        .fulfill(
            &mut dispatcher,
            &[MutableTableRequirement::new(orders(0)).with_state(MutableTableState::Prepared)],
        )
        .unwrap();

    let failures = fulfiller.cleanup(&mut dispatcher);

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].table, tables.name_in_database("orders").unwrap());
}

#[test]
fn mutable_tables_live_in_the_handle_schema() {
    let executor = InMemoryQueryExecutor::new(DATABASE);
    let naming = TableNameGenerator::new();
    let mut dispatcher = memory_dispatcher(&executor, &naming);
    let mut fulfiller = MutableTablesFulfiller::new();

    let tables = fulfiller
        .fulfill(
            &mut dispatcher,
            &[MutableTableRequirement::new(orders(2)).with_handle(TableHandle::new("orders").in_schema("tpch"))],
        )
        .unwrap();

    let name = tables.name_in_database("orders").unwrap();
    assert!(name.starts_with("tpch.fixture_mut_orders_"));
    assert_eq!(executor.row_count(name), Some(2));

    // the sweep finds it through the catalog's schema column
    let reports = dispatcher.drop_all_mutable_tables().unwrap();
    assert_eq!(reports[0].dropped, vec![name.to_string()]);
}

#[test]
fn immutable_tables_are_created_once_and_reused() {
    let executor = InMemoryQueryExecutor::new(DATABASE);
    let naming = TableNameGenerator::new();
    let mut dispatcher = memory_dispatcher(&executor, &naming);
    let requirements = [ImmutableTableRequirement::new(nation(Backend::Sql))];

    let first = fulfill_immutable_tables(&mut dispatcher, &requirements).unwrap();
    let second = fulfill_immutable_tables(&mut dispatcher, &requirements).unwrap();

    let instance = second.get("nation").unwrap();
    assert!(!instance.is_mutable());
    assert_eq!(instance.name_in_database(), "nation");
    assert_eq!(first.name_in_database("nation"), Some("nation"));
    let creates = executor
        .statements()
        .iter()
        .filter(|s| s.starts_with("CREATE TABLE nation"))
        .count();
    assert_eq!(creates, 1);
    assert_eq!(executor.row_count("nation"), Some(3));
}

#[test]
fn sweep_leaves_immutable_tables_alone() {
    let executor = InMemoryQueryExecutor::new(DATABASE);
    let naming = TableNameGenerator::new();
    let mut dispatcher = memory_dispatcher(&executor, &naming);

    fulfill_immutable_tables(&mut dispatcher, &[ImmutableTableRequirement::new(nation(Backend::Sql))]).unwrap();
    MutableTablesFulfiller::new()
        .fulfill(&mut dispatcher, &[MutableTableRequirement::new(orders(1))])
        .unwrap();

    let reports = dispatcher.drop_all_mutable_tables().unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].dropped.len(), 1);
    assert_eq!(executor.table_names(), vec!["nation"]);
}

#[test]
fn immutable_name_in_mutable_convention_is_rejected() {
    let executor = InMemoryQueryExecutor::new(DATABASE);
    let naming = TableNameGenerator::new();
    let mut dispatcher = memory_dispatcher(&executor, &naming);
    let definition = TableDefinition::builder(naming.mutable_name_for("lookalike"))
        .column("id", ColumnType::Integer)
        .rows(vec![vec![Value::Int(1)]])
        .build()
        .unwrap();

    let err = fulfill_immutable_tables(&mut dispatcher, &[ImmutableTableRequirement::new(definition)]).unwrap_err();

    assert!(matches!(err, FixtureError::InvalidDefinition { .. }));
    assert!(executor.table_names().is_empty());
}
