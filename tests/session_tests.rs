//! Session behavior over the scripted in-memory driver
//!
//! These tests check what the session hands to the native driver:
//! - Parameter spelling per dialect and prefix overrides
//! - Logging hooks and their validation
//! - Timeouts, enlistment and connection lifetime
//! - Dispose when the driver misbehaves

use rust_data_access::backends::memory::{MemoryConnection, MemoryCursor, ResultSet, TxEvent};
use rust_data_access::core::error::DatabaseError;
use rust_data_access::core::materializer::{
    all_rows_async, first_row_async, last_row_async, paged_rows_async, single_row_async,
};
use rust_data_access::core::parameter::ParameterDirection;
use rust_data_access::core::query_builder::SelectBuilder;
use rust_data_access::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn session_with(kind: ConnectionKind, config: SessionConfig) -> (DatabaseSession<MemoryConnection>, rust_data_access::backends::MemoryProbe) {
    init_tracing();
    let connection = MemoryConnection::new(kind);
    let probe = connection.probe();
    let session = DatabaseSession::new(connection, Arc::new(DialectRegistry::new()), config)
        .expect("dialect is registered");
    (session, probe)
}

#[test]
fn test_parameters_follow_dialect_prefix() {
    let (mut session, probe) = session_with(ConnectionKind::Oracle, SessionConfig::default());
    let query = session
        .bind("SELECT * FROM emp WHERE dept = ? AND grade > ?", vec![10.into(), 3.into()])
        .unwrap();
    assert_eq!(query.text(), "SELECT * FROM emp WHERE dept = :p0 AND grade > :p1");

    session.query_rows(&query).unwrap();
    let executed = probe.executed();
    let names: Vec<&str> = executed[0].parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec![":p0", ":p1"]);
    assert_eq!(executed[0].parameters[1].value, DatabaseValue::Int(3));
}

#[test]
fn test_positional_dialect_keeps_question_marks() {
    let (mut session, probe) = session_with(ConnectionKind::MsSqlOdbc, SessionConfig::default());
    let query = session
        .bind("UPDATE t SET a = ? WHERE id = ?", vec!["x".into(), 1.into()])
        .unwrap();
    assert_eq!(query.text(), "UPDATE t SET a = ? WHERE id = ?");
    probe.push_affected(1);
    assert_eq!(session.execute_non_query(&query).unwrap(), 1);
    assert_eq!(probe.executed()[0].parameters.len(), 2);
}

#[test]
fn test_prefix_precedence() {
    let config = SessionConfig::default().with_parameter_prefix("$");
    let (mut session, probe) = session_with(ConnectionKind::MsSql, config);

    let bound = session.bind("SELECT ?", vec![1.into()]).unwrap();
    assert_eq!(bound.text(), "SELECT $p0");
    session.execute_scalar(&bound).unwrap();

    let described = CommandDescription::new("SELECT #id")
        .with_parameter_prefix("#")
        .param("id", 5);
    session.execute_scalar(&described).unwrap();

    // names that already carry the prefix are kept
    let prefixed = CommandDescription::new("SELECT $id").param("$id", 5);
    session.execute_scalar(&prefixed).unwrap();

    let executed = probe.executed();
    assert_eq!(executed[0].parameters[0].name, "$p0");
    assert_eq!(executed[1].parameters[0].name, "#id");
    assert_eq!(executed[2].parameters[0].name, "$id");
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Item {
    id: i64,
    name: String,
}

impl ColumnMapper for Item {
    fn table_map() -> &'static TableMap<Self> {
        static MAP: std::sync::OnceLock<TableMap<Item>> = std::sync::OnceLock::new();
        MAP.get_or_init(|| {
            TableMap::new("items")
                .with(PropertyMap::new("id", |i: &Item| i.id, |i, v| i.id = v).key().identity())
                .with(PropertyMap::new("name", |i: &Item| i.name.clone(), |i, v| i.name = v))
        })
    }
}

#[test]
fn test_session_prefix_reaches_generated_sql() {
    let config = SessionConfig::default().with_parameter_prefix(":");
    let (mut session, probe) = session_with(ConnectionKind::MsSql, config);
    let item = Item {
        id: 4,
        name: "bolt".to_string(),
    };

    session.insert(&item).unwrap();
    session.update(&item).unwrap();
    session.delete(&item).unwrap();
    probe.push_result(ResultSet::new(&["id", "name"]).row(vec![DatabaseValue::Long(4), "bolt".into()]));
    assert_eq!(session.find_by_key::<Item>(&[DatabaseValue::Long(4)]).unwrap(), Some(item));

    let select = session
        .select(&SelectBuilder::new("items").where_eq("name", "bolt"))
        .unwrap();
    session.query_rows(&select).unwrap();

    let executed = probe.executed();
    assert_eq!(executed.len(), 5);
    assert_eq!(executed[0].text, "INSERT INTO [items] ([name]) VALUES (:name)");
    for command in &executed {
        assert!(!command.text.contains('@'), "dialect prefix leaked into {}", command.text);
        for parameter in &command.parameters {
            assert!(parameter.name.starts_with(':'));
            assert!(
                command.text.contains(parameter.name.as_str()),
                "{} not in {}",
                parameter.name,
                command.text
            );
        }
    }
}

#[test]
fn test_unbound_outputs() {
    let strict = session_with(ConnectionKind::MsSql, SessionConfig::default()).0;
    assert!(matches!(
        strict.bind("EXEC usp ?, ?", vec![1.into()]),
        Err(DatabaseError::ParameterCountMismatch { placeholders: 2, parameters: 1 })
    ));

    let lenient = session_with(ConnectionKind::MsSql, SessionConfig::default().with_unbound_outputs(true)).0;
    let description = lenient.bind("EXEC usp ?, ?", vec![1.into()]).unwrap();
    let params = description.parameters();
    assert_eq!(params[0].direction, ParameterDirection::Input);
    assert_eq!(params[1].direction, ParameterDirection::Output);
    assert!(params[1].value_or_null().is_null());

    assert!(matches!(
        lenient.bind("SELECT ?", vec![1.into(), 2.into()]),
        Err(DatabaseError::ParameterCountMismatch { placeholders: 1, parameters: 2 })
    ));
}

#[test]
fn test_command_timeout_defaults_and_overrides() {
    let config = SessionConfig::default().with_command_timeout(Duration::from_secs(30));
    let (mut session, probe) = session_with(ConnectionKind::Postgres, config);

    session.execute_non_query(&CommandDescription::new("VACUUM")).unwrap();
    session
        .execute_non_query(&CommandDescription::new("VACUUM FULL").with_timeout(Duration::from_secs(5)))
        .unwrap();

    let executed = probe.executed();
    assert_eq!(executed[0].timeout, Some(Duration::from_secs(30)));
    assert_eq!(executed[1].timeout, Some(Duration::from_secs(5)));
}

#[test]
fn test_logging_hooks() {
    let config = SessionConfig::default()
        .with_log_before_execute(true)
        .with_log_after_build(true);
    let (mut session, _probe) = session_with(ConnectionKind::Sqlite, config);

    // enabled slots without callbacks refuse to build
    let err = session
        .execute_non_query(&CommandDescription::new("DELETE FROM t"))
        .unwrap_err();
    assert!(matches!(err, DatabaseError::MissingLogAction(_)));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let before = Arc::clone(&seen);
    session.set_before_execute_hook(move |description| {
        before.lock().unwrap().push(format!("before {}", description.text()));
    });
    let after = Arc::clone(&seen);
    session.set_after_build_hook(move |command| {
        let names: Vec<&str> = command.parameters().iter().map(|p| p.name.as_str()).collect();
        after.lock().unwrap().push(format!("after {} [{}]", command.text(), names.join(",")));
    });

    session
        .execute_non_query(&CommandDescription::new("DELETE FROM t WHERE id = @id").param("id", 1))
        .unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["before DELETE FROM t WHERE id = @id", "after DELETE FROM t WHERE id = @id [@id]"]
    );
}

#[test]
fn test_hooks_stay_quiet_when_disabled() {
    let (mut session, _probe) = session_with(ConnectionKind::Sqlite, SessionConfig::default());
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    session.set_before_execute_hook(move |_| *counter.lock().unwrap() += 1);

    session.execute_non_query(&CommandDescription::new("DELETE FROM t")).unwrap();
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[test]
fn test_open_failure_propagates_unchanged() {
    let (mut session, probe) = session_with(ConnectionKind::Sqlite, SessionConfig::default());
    probe.fail_next_open("SQLITE_CANTOPEN: unable to open database file");
    let err = session
        .execute_scalar(&CommandDescription::new("SELECT 1"))
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Driver(_)));
    assert_eq!(err.to_string(), "SQLITE_CANTOPEN: unable to open database file");
    assert!(probe.executed().is_empty());
}

#[test]
fn test_without_auto_open_commands_need_an_open_connection() {
    let config = SessionConfig::default().with_auto_open(false);
    let (mut session, probe) = session_with(ConnectionKind::Sqlite, config);
    let err = session
        .execute_scalar(&CommandDescription::new("SELECT 1"))
        .unwrap_err();
    assert!(matches!(err, DatabaseError::ConnectionError(_)));
    assert_eq!(probe.open_count(), 0);

    session.connection_mut().open().unwrap();
    session.execute_scalar(&CommandDescription::new("SELECT 1")).unwrap();
    assert!(probe.is_open());
}

#[test]
fn test_driver_error_closes_auto_opened_connection() {
    let (mut session, probe) = session_with(ConnectionKind::Sqlite, SessionConfig::default());
    probe.fail_next_execute("SQLITE_ERROR: no such table: t");
    let err = session
        .execute_non_query(&CommandDescription::new("DELETE FROM t"))
        .unwrap_err();
    assert_eq!(err.to_string(), "SQLITE_ERROR: no such table: t");
    assert!(!probe.is_open());
}

#[test]
fn test_cursors_are_closed_after_every_read() {
    let (mut session, probe) = session_with(ConnectionKind::Sqlite, SessionConfig::default());
    let set = ResultSet::new(&["id"])
        .row(vec![1.into()])
        .row(vec![2.into()])
        .row(vec![3.into()]);
    for _ in 0..3 {
        probe.push_result(set.clone());
    }
    let query = CommandDescription::new("SELECT id FROM t");

    let first = session.query_first(&query).unwrap();
    assert_eq!(first.get("id"), Some(&DatabaseValue::Int(1)));
    let err = session.query_single(&query).unwrap_err();
    assert!(matches!(err, DatabaseError::MultipleRows));
    let page = session.query_page(&query, PageInfo::from_skip_take(1, 1)).unwrap();
    assert_eq!(page[0].get("id"), Some(&DatabaseValue::Int(2)));

    assert!(probe.all_cursors_closed());
    // first stops after one row; single needs a second read; the page stops
    // once it holds `take` rows
    assert_eq!(probe.cursor_reads(), vec![1, 2, 2]);
}

#[test]
fn test_server_paging_and_count_use_dialect_templates() {
    let (mut session, probe) = session_with(ConnectionKind::MsSql, SessionConfig::default());
    probe.push_result(ResultSet::new(&["n"]).row(vec![DatabaseValue::Int(42)]));
    let query = CommandDescription::new("SELECT * FROM orders ORDER BY id;");

    assert_eq!(session.query_count(&query).unwrap(), 42);
    session
        .query_page_sql(&query, PageInfo::from_page_number(3, 10))
        .unwrap();

    let executed = probe.executed();
    assert_eq!(
        executed[0].text,
        "SELECT COUNT(*) FROM (SELECT * FROM orders ORDER BY id) T_COUNT"
    );
    assert_eq!(
        executed[1].text,
        "SELECT * FROM orders ORDER BY id OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
    );
}

#[test]
fn test_access_has_no_server_paging() {
    let (mut session, _probe) = session_with(ConnectionKind::Access, SessionConfig::default());
    let err = session
        .query_page_sql(&CommandDescription::new("SELECT * FROM t"), PageInfo::from_skip_take(0, 5))
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UnsupportedOperation(_)));
}

#[test]
fn test_dispose_reports_failure_and_still_closes() {
    let (mut session, probe) = session_with(ConnectionKind::Sqlite, SessionConfig::default());
    session.begin().unwrap();

    // the driver loses the transaction behind the session's back
    session.connection_mut().close().unwrap();
    session.connection_mut().open().unwrap();

    let err = session.close().unwrap_err();
    assert!(matches!(err, DatabaseError::TransactionError(_)));
    assert!(!probe.is_open());
    assert_eq!(probe.transactions(), vec![TxEvent::Begin(1)]);
}

#[test]
fn test_failed_commit_leaves_transaction_active() {
    let (mut session, probe) = session_with(ConnectionKind::Sqlite, SessionConfig::default());
    session.begin().unwrap();
    let token = session.transaction().unwrap();
    session.connection_mut().rollback_transaction(token).unwrap();

    assert!(session.commit().is_err());
    assert_eq!(session.state(), TransactionState::Active);
    drop(session);
    assert!(!probe.is_open());
}

#[test]
fn test_async_materializers_offload_the_cursor() {
    let set = ResultSet::new(&["id", "id"])
        .row(vec![1.into(), 10.into()])
        .row(vec![2.into(), 20.into()])
        .row(vec![3.into(), 30.into()]);

    tokio_test::block_on(async {
        let rows = all_rows_async(MemoryCursor::new(set.clone())).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].get("id_1"), Some(&DatabaseValue::Int(30)));
    });

    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let page = paged_rows_async(MemoryCursor::new(set.clone()), 1, 5).await.unwrap();
        assert_eq!(page.len(), 2);

        let err = single_row_async(MemoryCursor::new(set)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::MultipleRows));
    });
}

#[tokio::test]
async fn test_async_first_and_last_close_the_cursor() {
    let set = ResultSet::new(&["n"])
        .row(vec![1.into()])
        .row(vec![2.into()]);

    let cursor = MemoryCursor::new(set.clone());
    let closed = cursor.closed_flag();
    let first = tokio_test::assert_ok!(first_row_async(cursor).await);
    assert_eq!(first.get("n"), Some(&DatabaseValue::Int(1)));
    assert!(closed.load(std::sync::atomic::Ordering::SeqCst));

    let last = tokio_test::assert_ok!(last_row_async(MemoryCursor::new(set)).await);
    assert_eq!(last.get("n"), Some(&DatabaseValue::Int(2)));

    let empty = tokio_test::assert_ok!(first_row_async(MemoryCursor::new(ResultSet::new(&["n"]))).await);
    assert!(empty.is_empty());
}
